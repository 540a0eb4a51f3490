//! Host-side oracle
//!
//! Computes every value the statement re-derives, using native Pasta
//! arithmetic only, and packages the private assignment and public instance.

use crate::error::{CircuitError, Result};
use crate::field::{
    affine_xy, base_from_hex, base_to_hex, embed_scalar, point_from_xy, Base, Scalar,
};
use crate::gadgets::prf;
use crate::statement::{DoubleEncryptionCircuit, StatementLayout};
use ff::FromUniformBytes;
use group::{prime::PrimeCurveAffine, Curve, Group};
use halo2curves::pasta::{vesta, EqAffine};
use rand::{CryptoRng, RngCore};
use serde::{Deserialize, Serialize};

/// Uniform scalar from 64 bytes of randomness.
pub fn random_scalar<R: RngCore + CryptoRng>(rng: &mut R) -> Result<Scalar> {
    let mut bytes = [0u8; 64];
    rng.try_fill_bytes(&mut bytes)
        .map_err(|e| CircuitError::Witness(format!("randomness source failed: {}", e)))?;
    Ok(Scalar::from_uniform_bytes(&bytes))
}

/// Public values of one batch.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PublicInputs {
    pub h0: EqAffine,
    pub vk: EqAffine,
    pub bases: Vec<EqAffine>,
    pub group_ciphertexts: Vec<EqAffine>,
    pub field_ciphertexts: Vec<Base>,
}

impl PublicInputs {
    pub fn records(&self) -> usize {
        self.bases.len()
    }

    pub fn layout(&self) -> StatementLayout {
        StatementLayout::new(self.records())
    }

    /// Flattens into the instance column order.
    pub fn to_instance(&self) -> Vec<Base> {
        let mut instance = Vec::with_capacity(self.layout().instance_len());
        let points =
            [&self.h0, &self.vk].into_iter().chain(&self.bases).chain(&self.group_ciphertexts);
        for point in points {
            let (x, y) = affine_xy(point);
            instance.push(x);
            instance.push(y);
        }
        instance.extend_from_slice(&self.field_ciphertexts);
        instance
    }

    /// Inverse of [`PublicInputs::to_instance`]. Rejects columns whose
    /// length is not `4 + 5N` and coordinate pairs off the curve.
    pub fn from_instance(instance: &[Base]) -> Result<Self> {
        if instance.len() < 9 || (instance.len() - 4) % 5 != 0 {
            return Err(CircuitError::Encoding(format!(
                "instance length {} is not 4 + 5N for N >= 1",
                instance.len()
            )));
        }
        let layout = StatementLayout::new((instance.len() - 4) / 5);
        let point = |row: usize| {
            point_from_xy(instance[row], instance[row + 1]).ok_or_else(|| {
                CircuitError::Encoding(format!(
                    "instance rows {}..{} are not a curve point",
                    row,
                    row + 2
                ))
            })
        };

        let records = layout.records();
        Ok(Self {
            h0: point(layout.h0())?,
            vk: point(layout.vk())?,
            bases: (0..records).map(|i| point(layout.base(i))).collect::<Result<_>>()?,
            group_ciphertexts: (0..records)
                .map(|i| point(layout.group_ciphertext(i)))
                .collect::<Result<_>>()?,
            field_ciphertexts: instance[layout.field_ciphertext(0)..].to_vec(),
        })
    }

    pub fn to_hex(&self) -> Vec<String> {
        self.to_instance().iter().map(base_to_hex).collect()
    }

    pub fn from_hex(values: &[String]) -> Result<Self> {
        let instance = values.iter().map(|v| base_from_hex(v)).collect::<Result<Vec<_>>>()?;
        Self::from_instance(&instance)
    }
}

impl Serialize for PublicInputs {
    fn serialize<S: serde::Serializer>(
        &self,
        serializer: S,
    ) -> std::result::Result<S::Ok, S::Error> {
        self.to_hex().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for PublicInputs {
    fn deserialize<D: serde::Deserializer<'de>>(
        deserializer: D,
    ) -> std::result::Result<Self, D::Error> {
        let values = Vec::<String>::deserialize(deserializer)?;
        Self::from_hex(&values).map_err(serde::de::Error::custom)
    }
}

/// Private scalars of one batch together with the public values they imply.
#[derive(Clone, Debug)]
pub struct HostWitness {
    secret: Scalar,
    plaintexts: Vec<Scalar>,
    public: PublicInputs,
}

impl HostWitness {
    /// Deterministic construction with `H0 = h0_dlog·G` and
    /// `H[i] = base_dlogs[i]·G`.
    pub fn from_scalars(
        secret: Scalar,
        h0_dlog: Scalar,
        base_dlogs: &[Scalar],
        plaintexts: &[Scalar],
    ) -> Result<Self> {
        if plaintexts.is_empty() {
            return Err(CircuitError::Witness("batch must contain at least one record".into()));
        }
        if base_dlogs.len() != plaintexts.len() {
            return Err(CircuitError::Witness(format!(
                "{} bases for {} plaintexts",
                base_dlogs.len(),
                plaintexts.len()
            )));
        }

        let g = vesta::Point::generator();
        let h0 = (g * h0_dlog).to_affine();
        let vk = (h0.to_curve() * secret).to_affine();
        let key = embed_scalar(&secret);

        let mut bases = Vec::with_capacity(plaintexts.len());
        let mut group_ciphertexts = Vec::with_capacity(plaintexts.len());
        let mut field_ciphertexts = Vec::with_capacity(plaintexts.len());
        for (i, (dlog, x)) in base_dlogs.iter().zip(plaintexts).enumerate() {
            let h = g * dlog;
            bases.push(h.to_affine());
            group_ciphertexts.push((h * secret + g * x).to_affine());
            field_ciphertexts.push(embed_scalar(x) + prf(key, i as u64));
        }

        Ok(Self {
            secret,
            plaintexts: plaintexts.to_vec(),
            public: PublicInputs { h0, vk, bases, group_ciphertexts, field_ciphertexts },
        })
    }

    /// Samples a fresh batch: SK, H0, H[i] and X[i] all uniform.
    pub fn generate<R: RngCore + CryptoRng>(records: usize, rng: &mut R) -> Result<Self> {
        let secret = random_scalar(rng)?;
        let h0_dlog = random_scalar(rng)?;
        let base_dlogs = (0..records).map(|_| random_scalar(rng)).collect::<Result<Vec<_>>>()?;
        let plaintexts = (0..records).map(|_| random_scalar(rng)).collect::<Result<Vec<_>>>()?;
        Self::from_scalars(secret, h0_dlog, &base_dlogs, &plaintexts)
    }

    pub fn secret(&self) -> Scalar {
        self.secret
    }

    pub fn plaintexts(&self) -> &[Scalar] {
        &self.plaintexts
    }

    pub fn public(&self) -> &PublicInputs {
        &self.public
    }

    pub fn records(&self) -> usize {
        self.plaintexts.len()
    }

    /// The statement with this witness assigned.
    pub fn circuit(&self) -> DoubleEncryptionCircuit {
        DoubleEncryptionCircuit::new(
            embed_scalar(&self.secret),
            self.plaintexts.iter().map(embed_scalar).collect(),
        )
    }

    pub fn instance(&self) -> Vec<Base> {
        self.public.to_instance()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gadgets::add_affine;
    use ff::Field;
    use rand::{rngs::StdRng, SeedableRng};

    struct FailingRng;

    impl RngCore for FailingRng {
        fn next_u32(&mut self) -> u32 {
            0
        }

        fn next_u64(&mut self) -> u64 {
            0
        }

        fn fill_bytes(&mut self, dest: &mut [u8]) {
            dest.fill(0);
        }

        fn try_fill_bytes(&mut self, _dest: &mut [u8]) -> std::result::Result<(), rand::Error> {
            Err(rand::Error::new("entropy source unavailable"))
        }
    }

    impl CryptoRng for FailingRng {}

    #[test]
    fn test_fixed_scenario_values() {
        let g = vesta::Point::generator();
        let witness = HostWitness::from_scalars(
            Scalar::from(5),
            Scalar::from(11),
            &[Scalar::from(13)],
            &[Scalar::from(7)],
        )
        .unwrap();
        let public = witness.public();

        assert_eq!(public.vk, (g * Scalar::from(55)).to_affine());
        assert_eq!(public.group_ciphertexts[0], (g * Scalar::from(72)).to_affine());
        assert_eq!(public.field_ciphertexts[0], Base::from(7) + prf(Base::from(5), 0));
    }

    #[test]
    fn test_host_group_law_matches_chip_formulas() {
        let mut rng = StdRng::seed_from_u64(3);
        let witness = HostWitness::generate(2, &mut rng).unwrap();
        let g = vesta::Point::generator();

        for (i, x) in witness.plaintexts().iter().enumerate() {
            let t1 =
                affine_xy(&(witness.public().bases[i].to_curve() * witness.secret()).to_affine());
            let t2 = affine_xy(&(g * x).to_affine());
            assert_eq!(add_affine(t1, t2), affine_xy(&witness.public().group_ciphertexts[i]));
        }
    }

    #[test]
    fn test_instance_layout() {
        let mut rng = StdRng::seed_from_u64(4);
        let witness = HostWitness::generate(3, &mut rng).unwrap();
        let instance = witness.instance();
        let layout = witness.public().layout();

        assert_eq!(instance.len(), 19);
        assert_eq!(
            (instance[layout.vk()], instance[layout.vk() + 1]),
            affine_xy(&witness.public().vk)
        );
        assert_eq!(instance[layout.field_ciphertext(2)], witness.public().field_ciphertexts[2]);
    }

    #[test]
    fn test_instance_round_trip() {
        let mut rng = StdRng::seed_from_u64(5);
        let witness = HostWitness::generate(2, &mut rng).unwrap();
        let parsed = PublicInputs::from_instance(&witness.instance()).unwrap();
        assert_eq!(&parsed, witness.public());
    }

    #[test]
    fn test_json_round_trip() {
        let mut rng = StdRng::seed_from_u64(6);
        let witness = HostWitness::generate(1, &mut rng).unwrap();
        let json = serde_json::to_string(witness.public()).unwrap();
        let parsed: PublicInputs = serde_json::from_str(&json).unwrap();
        assert_eq!(&parsed, witness.public());
    }

    #[test]
    fn test_from_instance_rejects_bad_input() {
        assert!(PublicInputs::from_instance(&[Base::ZERO; 8]).is_err());
        assert!(PublicInputs::from_instance(&[Base::ONE; 9]).is_err());
        // all-zero points are identities, which are valid
        assert!(PublicInputs::from_instance(&[Base::ZERO; 9]).is_ok());
    }

    #[test]
    fn test_identity_points_allowed() {
        let public = PublicInputs::from_instance(&[Base::ZERO; 9]).unwrap();
        assert_eq!(public.h0, EqAffine::identity());
    }

    #[test]
    fn test_mismatched_lengths_rejected() {
        let err =
            HostWitness::from_scalars(Scalar::ONE, Scalar::ONE, &[Scalar::ONE], &[]).unwrap_err();
        assert!(matches!(err, CircuitError::Witness(_)));

        let err =
            HostWitness::from_scalars(Scalar::ONE, Scalar::ONE, &[], &[Scalar::ONE]).unwrap_err();
        assert!(matches!(err, CircuitError::Witness(_)));
    }

    #[test]
    fn test_randomness_failure_is_witness_error() {
        let err = HostWitness::generate(1, &mut FailingRng).unwrap_err();
        assert!(matches!(err, CircuitError::Witness(_)));
        assert!(err.to_string().contains("randomness source failed"));
    }

    #[test]
    fn test_generated_batches_differ() {
        let mut rng = StdRng::seed_from_u64(8);
        let a = HostWitness::generate(1, &mut rng).unwrap();
        let b = HostWitness::generate(1, &mut rng).unwrap();
        assert_ne!(a.secret(), b.secret());
        assert_ne!(a.public(), b.public());
    }
}
