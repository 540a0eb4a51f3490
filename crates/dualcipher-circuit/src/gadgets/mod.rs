//! Chips used by the double-encryption statement

pub mod ecc;
pub mod prf;
pub mod range;

pub use ecc::{add_affine, EccChip, EccConfig, EccPoint, GENERATOR_MULTIPLES};
pub use prf::{prf, PrfChip, PrfConfig, PRF_ROWS};
pub use range::{RangeCheckChip, RangeCheckConfig};
