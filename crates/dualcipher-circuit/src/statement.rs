//! The double-encryption statement
//!
//! Public instance column, in order:
//!
//! ```text
//! H0.x H0.y | VK.x VK.y | H[i].x H[i].y ... | CTP[i].x CTP[i].y ... | CT[i] ...
//! ```
//!
//! Private inputs are the secret `SK` and the plaintexts `X[i]`, each
//! range-checked to be a canonical Vesta scalar. The statement asserts
//!
//! - `VK = SK·H0`
//! - `CTP[i] = SK·H[i] + X[i]·G`
//! - `CT[i] = X[i] + PRF(SK, i)`

use crate::field::{Base, SCALAR_BOUND};
use crate::gadgets::{
    EccChip, EccConfig, PrfChip, PrfConfig, RangeCheckChip, RangeCheckConfig, PRF_ROWS,
};
use halo2_proofs::{
    circuit::{AssignedCell, Layouter, SimpleFloorPlanner, Value},
    plonk::{Advice, Circuit, Column, ConstraintSystem, Error, Fixed, Instance, Selector},
    poly::Rotation,
};
use serde::{Deserialize, Serialize};

/// Offsets of each public value in the instance column.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatementLayout {
    records: usize,
}

impl StatementLayout {
    pub fn new(records: usize) -> Self {
        Self { records }
    }

    pub fn records(&self) -> usize {
        self.records
    }

    pub fn h0(&self) -> usize {
        0
    }

    pub fn vk(&self) -> usize {
        2
    }

    pub fn base(&self, i: usize) -> usize {
        4 + 2 * i
    }

    pub fn group_ciphertext(&self, i: usize) -> usize {
        4 + 2 * self.records + 2 * i
    }

    pub fn field_ciphertext(&self, i: usize) -> usize {
        4 + 4 * self.records + i
    }

    pub fn instance_len(&self) -> usize {
        4 + 5 * self.records
    }
}

/// Row cost shared by every statement regardless of N: SK load and range
/// check, H0 load, `VK = SK·H0`.
fn fixed_rows() -> usize {
    let nbits = SCALAR_BOUND.num_bits();
    1 + RangeCheckChip::rows() + 1 + EccChip::variable_base_rows(nbits)
}

/// Row cost of one record.
fn record_rows() -> usize {
    let nbits = SCALAR_BOUND.num_bits();
    1 + RangeCheckChip::rows()
        + 1
        + EccChip::variable_base_rows(nbits)
        + EccChip::fixed_base_rows(nbits)
        + 2
        + PRF_ROWS
        + 1
}

/// Headroom for blinding rows and the constants column.
const ROW_MARGIN: usize = 128;

/// Smallest `k` whose `2^k` rows fit a statement over `records` records.
pub fn minimum_k(records: usize) -> u32 {
    let rows = fixed_rows() + records * record_rows() + ROW_MARGIN;
    usize::BITS - (rows - 1).leading_zeros()
}

#[derive(Clone, Debug)]
pub struct StatementConfig {
    advice: [Column<Advice>; 12],
    fixed: Vec<Column<Fixed>>,
    instance: Column<Instance>,
    range: RangeCheckConfig,
    ecc: EccConfig,
    prf: PrfConfig,
    s_pad: Selector,
}

/// Batch of N doubly-encrypted records under one secret.
#[derive(Clone, Debug)]
pub struct DoubleEncryptionCircuit {
    secret: Value<Base>,
    plaintexts: Vec<Value<Base>>,
}

impl DoubleEncryptionCircuit {
    /// Circuit with a concrete private assignment. Values are taken as-is;
    /// non-canonical scalars make the statement unsatisfiable.
    pub fn new(secret: Base, plaintexts: Vec<Base>) -> Self {
        Self {
            secret: Value::known(secret),
            plaintexts: plaintexts.into_iter().map(Value::known).collect(),
        }
    }

    /// Witness-free circuit for key generation and verification.
    pub fn unassigned(records: usize) -> Self {
        Self { secret: Value::unknown(), plaintexts: vec![Value::unknown(); records] }
    }

    pub fn records(&self) -> usize {
        self.plaintexts.len()
    }

    pub fn layout(&self) -> StatementLayout {
        StatementLayout::new(self.records())
    }

    fn load_private(
        &self,
        mut layouter: impl Layouter<Base>,
        column: Column<Advice>,
        value: Value<Base>,
    ) -> Result<AssignedCell<Base, Base>, Error> {
        layouter.assign_region(
            || "load private scalar",
            |mut region| region.assign_advice(|| "scalar", column, 0, || value),
        )
    }

    fn assign_pad(
        &self,
        mut layouter: impl Layouter<Base>,
        config: &StatementConfig,
        plaintext: &AssignedCell<Base, Base>,
        pad: &AssignedCell<Base, Base>,
    ) -> Result<AssignedCell<Base, Base>, Error> {
        layouter.assign_region(
            || "one-time pad",
            |mut region| {
                config.s_pad.enable(&mut region, 0)?;
                plaintext.copy_advice(|| "plaintext", &mut region, config.advice[0], 0)?;
                pad.copy_advice(|| "pad", &mut region, config.advice[1], 0)?;

                let ciphertext = plaintext.value().copied() + pad.value().copied();
                region.assign_advice(|| "ciphertext", config.advice[2], 0, || ciphertext)
            },
        )
    }
}

impl Circuit<Base> for DoubleEncryptionCircuit {
    type Config = StatementConfig;
    type FloorPlanner = SimpleFloorPlanner;

    fn without_witnesses(&self) -> Self {
        Self::unassigned(self.records())
    }

    fn configure(meta: &mut ConstraintSystem<Base>) -> Self::Config {
        let advice: [Column<Advice>; 12] = std::array::from_fn(|_| meta.advice_column());
        let instance = meta.instance_column();
        meta.enable_equality(instance);

        let constants = meta.fixed_column();
        meta.enable_constant(constants);

        let table = [meta.fixed_column(), meta.fixed_column()];
        let bound_bit = meta.fixed_column();
        let rc_a = [meta.fixed_column(), meta.fixed_column(), meta.fixed_column()];
        let rc_b = [meta.fixed_column(), meta.fixed_column(), meta.fixed_column()];

        let range = RangeCheckChip::configure(
            meta,
            [advice[0], advice[1], advice[2], advice[3]],
            bound_bit,
        );
        let ecc = EccChip::configure(meta, advice, table);
        let prf =
            PrfChip::configure(meta, [advice[0], advice[1], advice[2]], advice[3], rc_a, rc_b);

        let s_pad = meta.selector();
        meta.create_gate("one-time pad", |meta| {
            let s = meta.query_selector(s_pad);
            let plaintext = meta.query_advice(advice[0], Rotation::cur());
            let pad = meta.query_advice(advice[1], Rotation::cur());
            let ciphertext = meta.query_advice(advice[2], Rotation::cur());

            vec![s * (plaintext + pad - ciphertext)]
        });

        let fixed = [constants, table[0], table[1], bound_bit]
            .into_iter()
            .chain(rc_a)
            .chain(rc_b)
            .collect();

        StatementConfig { advice, fixed, instance, range, ecc, prf, s_pad }
    }

    fn synthesize(
        &self,
        config: Self::Config,
        mut layouter: impl Layouter<Base>,
    ) -> Result<(), Error> {
        let layout = self.layout();
        let range = RangeCheckChip::construct(config.range.clone());
        let ecc = EccChip::construct(config.ecc.clone());
        let prf = PrfChip::construct(config.prf.clone());

        let secret =
            self.load_private(layouter.namespace(|| "load sk"), config.advice[0], self.secret)?;
        let secret_bits = range.range_check(layouter.namespace(|| "range sk"), &secret)?;

        let h0 = ecc.witness_public_point(
            layouter.namespace(|| "load h0"),
            config.instance,
            layout.h0(),
        )?;
        let vk = ecc.variable_base_mul(layouter.namespace(|| "sk * h0"), &h0, &secret_bits)?;
        ecc.expose_public(layouter.namespace(|| "expose vk"), &vk, config.instance, layout.vk())?;

        for (i, plaintext) in self.plaintexts.iter().enumerate() {
            let x = self.load_private(
                layouter.namespace(|| format!("load x[{}]", i)),
                config.advice[0],
                *plaintext,
            )?;
            let x_bits = range.range_check(layouter.namespace(|| format!("range x[{}]", i)), &x)?;

            let h = ecc.witness_public_point(
                layouter.namespace(|| format!("load h[{}]", i)),
                config.instance,
                layout.base(i),
            )?;
            let t1 = ecc.variable_base_mul(
                layouter.namespace(|| format!("sk * h[{}]", i)),
                &h,
                &secret_bits,
            )?;
            let t2 = ecc.fixed_base_mul(layouter.namespace(|| format!("x[{}] * g", i)), &x_bits)?;
            let ctp = ecc.add(layouter.namespace(|| format!("ctp[{}]", i)), &t1, &t2)?;
            ecc.expose_public(
                layouter.namespace(|| format!("expose ctp[{}]", i)),
                &ctp,
                config.instance,
                layout.group_ciphertext(i),
            )?;

            let pad =
                prf.evaluate(layouter.namespace(|| format!("prf(sk, {})", i)), &secret, i as u64)?;
            let ct =
                self.assign_pad(layouter.namespace(|| format!("ct[{}]", i)), &config, &x, &pad)?;
            layouter.constrain_instance(ct.cell(), config.instance, layout.field_ciphertext(i))?;
        }

        Ok(())
    }
}

/// Shape of the compiled constraint system for a given N.
///
/// Column counts come from the statement's own configuration; degree and
/// row overheads are read back from the constraint system.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatementShape {
    pub records: usize,
    pub advice_columns: usize,
    pub fixed_columns: usize,
    pub instance_columns: usize,
    pub degree: usize,
    pub blinding_factors: usize,
    pub minimum_rows: usize,
    pub instance_len: usize,
    pub estimated_rows: usize,
    pub min_k: u32,
}

impl StatementShape {
    pub fn of(records: usize) -> Self {
        let mut cs = ConstraintSystem::<Base>::default();
        let config = DoubleEncryptionCircuit::configure(&mut cs);

        let layout = StatementLayout::new(records);
        Self {
            records,
            advice_columns: config.advice.len(),
            fixed_columns: config.fixed.len(),
            instance_columns: 1,
            degree: cs.degree(),
            blinding_factors: cs.blinding_factors(),
            minimum_rows: cs.minimum_rows(),
            instance_len: layout.instance_len(),
            estimated_rows: fixed_rows() + records * record_rows(),
            min_k: minimum_k(records),
        }
    }
}

/// Debug rendering of the pinned constraint system: column counts, every
/// gate polynomial, queries, the permutation and the constants columns.
/// Two compilations define the same constraints iff their renderings match.
pub fn pinned_constraint_system() -> String {
    let mut cs = ConstraintSystem::<Base>::default();
    DoubleEncryptionCircuit::configure(&mut cs);
    format!("{:?}", cs.pinned())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::field::{embed_scalar, Scalar};
    use crate::witness::HostWitness;
    use ff::Field;
    use halo2_proofs::dev::MockProver;

    fn fixed_witness() -> HostWitness {
        HostWitness::from_scalars(
            Scalar::from(5),
            Scalar::from(11),
            &[Scalar::from(13)],
            &[Scalar::from(7)],
        )
        .unwrap()
    }

    #[test]
    fn test_layout_offsets() {
        let layout = StatementLayout::new(3);
        assert_eq!(layout.h0(), 0);
        assert_eq!(layout.vk(), 2);
        assert_eq!(layout.base(0), 4);
        assert_eq!(layout.base(2), 8);
        assert_eq!(layout.group_ciphertext(0), 10);
        assert_eq!(layout.group_ciphertext(2), 14);
        assert_eq!(layout.field_ciphertext(0), 16);
        assert_eq!(layout.field_ciphertext(2), 18);
        assert_eq!(layout.instance_len(), 19);
    }

    #[test]
    fn test_minimum_k_grows_with_records() {
        assert_eq!(minimum_k(1), 11);
        assert!(minimum_k(2) >= minimum_k(1));
        assert!(minimum_k(8) > minimum_k(1));
    }

    #[test]
    fn test_without_witnesses_keeps_records() {
        let circuit = DoubleEncryptionCircuit::new(Base::ONE, vec![Base::ONE; 3]);
        assert_eq!(circuit.without_witnesses().records(), 3);
    }

    #[test]
    fn test_honest_witness_satisfies() {
        let witness = fixed_witness();
        let prover =
            MockProver::run(minimum_k(1), &witness.circuit(), vec![witness.instance()]).unwrap();
        assert_eq!(prover.verify(), Ok(()));
    }

    #[test]
    fn test_tampered_field_ciphertext_rejected() {
        let witness = fixed_witness();
        let layout = StatementLayout::new(1);
        let mut public = witness.instance();
        public[layout.field_ciphertext(0)] += Base::ONE;

        let prover = MockProver::run(minimum_k(1), &witness.circuit(), vec![public]).unwrap();
        assert!(prover.verify().is_err());
    }

    #[test]
    fn test_tampered_public_key_rejected() {
        let witness = fixed_witness();
        let layout = StatementLayout::new(1);
        let mut public = witness.instance();
        public[layout.vk() + 1] += Base::ONE;

        let prover = MockProver::run(minimum_k(1), &witness.circuit(), vec![public]).unwrap();
        assert!(prover.verify().is_err());
    }

    #[test]
    fn test_wrapped_plaintext_rejected() {
        // X + r is congruent to X as a scalar, so only the range check can catch it.
        let witness = fixed_witness();
        let wrapped = embed_scalar(&Scalar::from(7)) + SCALAR_BOUND.value() + Base::ONE;
        let circuit = DoubleEncryptionCircuit::new(embed_scalar(&witness.secret()), vec![wrapped]);

        let layout = StatementLayout::new(1);
        let mut public = witness.instance();
        public[layout.field_ciphertext(0)] += SCALAR_BOUND.value() + Base::ONE;

        let prover = MockProver::run(minimum_k(1), &circuit, vec![public]).unwrap();
        assert!(prover.verify().is_err());
    }

    #[test]
    fn test_shape_is_stable() {
        assert_eq!(StatementShape::of(2), StatementShape::of(2));

        let shape = StatementShape::of(1);
        assert_eq!(shape.advice_columns, 12);
        assert_eq!(shape.instance_columns, 1);
        assert_eq!(shape.fixed_columns, 10);
        assert_eq!(shape.instance_len, 9);
        assert!(shape.degree >= 4);
    }

    #[test]
    fn test_pinned_constraint_system_reports_columns() {
        let pinned = pinned_constraint_system();
        assert!(pinned.contains("num_advice_columns: 12"));
        assert!(pinned.contains("num_fixed_columns: 10"));
        assert!(pinned.contains("num_instance_columns: 1"));
    }

    #[test]
    fn test_estimated_rows_fit_minimum_k() {
        for records in [1, 2, 4] {
            let shape = StatementShape::of(records);
            assert!(
                shape.estimated_rows + shape.minimum_rows <= 1 << shape.min_k,
                "N = {}",
                records
            );
        }
    }
}
