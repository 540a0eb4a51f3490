//! dualcipher runtime
//!
//! Shared error handling and artifact types for the dualcipher toolkit.
//! Nothing here depends on a particular curve; field and group types live in
//! `dualcipher-circuit`.

pub mod error;
pub mod types;

pub use error::{DualCipherError, Result};
pub use types::{BatchConfig, ZkProof, MAX_K};
