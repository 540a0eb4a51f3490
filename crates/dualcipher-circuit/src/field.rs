//! Field and group plumbing for the Pasta two-field relationship
//!
//! The statement is arithmetised over the Vesta base field `Fq` and hosts
//! Vesta group arithmetic natively. Vesta scalars live in `Fp`, and since
//! `p < q` every canonical scalar has an injective representative in `Fq`.

use crate::error::{CircuitError, Result};
use ff::{Field, PrimeField};
use group::prime::PrimeCurveAffine;
use halo2_proofs::arithmetic::{Coordinates, CurveAffine};
use halo2curves::pasta::{EqAffine, Fp, Fq};
use once_cell::sync::Lazy;

/// Circuit field (F_outer).
pub type Base = Fq;

/// Scalar field of the hosted group (F_inner).
pub type Scalar = Fp;

/// Bit pattern of `r - 1` where `r` is the Vesta scalar modulus.
///
/// Every range check in a statement reads the same instance.
pub static SCALAR_BOUND: Lazy<ScalarBound> = Lazy::new(ScalarBound::new);

#[derive(Clone, Debug)]
pub struct ScalarBound {
    bits: Vec<bool>,
    value: Base,
}

impl ScalarBound {
    fn new() -> Self {
        let max = -Scalar::ONE;
        let le = le_bits(max.to_repr().as_ref(), 256);
        let nbits = le.iter().rposition(|b| *b).map_or(0, |i| i + 1);
        let bits = le[..nbits].iter().rev().copied().collect();

        Self { bits, value: embed_scalar(&max) }
    }

    /// Bits of `r - 1`, most significant first.
    pub fn bits(&self) -> &[bool] {
        &self.bits
    }

    pub fn num_bits(&self) -> usize {
        self.bits.len()
    }

    /// `r - 1` as an element of the circuit field.
    pub fn value(&self) -> Base {
        self.value
    }
}

/// Little-endian bits of a little-endian byte string, truncated to `n`.
pub(crate) fn le_bits(bytes: &[u8], n: usize) -> Vec<bool> {
    bytes.iter().flat_map(|byte| (0..8).map(move |i| (byte >> i) & 1 == 1)).take(n).collect()
}

/// The `n` low bits of `v` read as an integer, most significant first.
pub fn msb_bits(v: &Base, n: usize) -> Vec<bool> {
    let mut bits = le_bits(v.to_repr().as_ref(), n);
    bits.resize(n, false);
    bits.reverse();
    bits
}

/// Canonical embedding of a scalar into the circuit field.
pub fn embed_scalar(s: &Scalar) -> Base {
    let radix = Base::from(256);
    s.to_repr()
        .as_ref()
        .iter()
        .rev()
        .fold(Base::ZERO, |acc, byte| acc * radix + Base::from(u64::from(*byte)))
}

/// Inverse of [`embed_scalar`]; `None` when `v >= r`.
pub fn canonical_scalar(v: &Base) -> Option<Scalar> {
    let mut repr = <Scalar as PrimeField>::Repr::default();
    repr.as_mut().copy_from_slice(v.to_repr().as_ref());
    Option::from(Scalar::from_repr(repr))
}

/// Affine coordinates, with the identity mapped to `(0, 0)`.
pub fn affine_xy(p: &EqAffine) -> (Base, Base) {
    Option::<Coordinates<EqAffine>>::from(p.coordinates())
        .map_or((Base::ZERO, Base::ZERO), |c| (*c.x(), *c.y()))
}

/// Inverse of [`affine_xy`]; `None` for pairs off the curve.
pub fn point_from_xy(x: Base, y: Base) -> Option<EqAffine> {
    if x.is_zero_vartime() && y.is_zero_vartime() {
        return Some(EqAffine::identity());
    }
    Option::from(EqAffine::from_xy(x, y))
}

pub fn base_to_hex(v: &Base) -> String {
    format!("0x{}", hex::encode(v.to_repr()))
}

/// Parse a little-endian hex encoding produced by [`base_to_hex`].
pub fn base_from_hex(s: &str) -> Result<Base> {
    let bytes = hex::decode(s.strip_prefix("0x").unwrap_or(s))
        .map_err(|e| CircuitError::Encoding(e.to_string()))?;

    let mut repr = <Base as PrimeField>::Repr::default();
    if bytes.len() != repr.as_ref().len() {
        return Err(CircuitError::Encoding(format!(
            "expected {} bytes, got {}",
            repr.as_ref().len(),
            bytes.len()
        )));
    }
    repr.as_mut().copy_from_slice(&bytes);

    Option::<Base>::from(Base::from_repr(repr))
        .ok_or_else(|| CircuitError::Encoding(format!("{} is not a canonical field element", s)))
}
