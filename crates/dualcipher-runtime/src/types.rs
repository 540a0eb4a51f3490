//! Core types for the dualcipher toolkit
//!
//! Curve-agnostic data structures shared by the circuit crate and the CLI:
//! the opaque proof blob and the batch configuration.

use crate::error::{DualCipherError, Result};
use serde::{Deserialize, Serialize};

/// Largest circuit size parameter accepted by [`BatchConfig`]
pub const MAX_K: u32 = 24;

/// Represents a serialized halo2 proof
///
/// The bytes are produced by the proof system and treated as opaque
/// everywhere else.
///
/// # Examples
///
/// ```
/// use dualcipher_runtime::ZkProof;
///
/// let proof = ZkProof::new(vec![0u8; 64]);
/// assert_eq!(proof.size(), 64);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ZkProof {
    proof_data: Vec<u8>,
}

impl ZkProof {
    pub fn new(proof_data: Vec<u8>) -> Self {
        Self { proof_data }
    }

    pub fn size(&self) -> usize {
        self.proof_data.len()
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.proof_data
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.proof_data
    }

    pub fn to_hex(&self) -> String {
        hex::encode(&self.proof_data)
    }

    /// Parse a proof from a hex string, with or without a `0x` prefix.
    pub fn from_hex(s: &str) -> Result<Self> {
        let bytes = hex::decode(s.strip_prefix("0x").unwrap_or(s))
            .map_err(|e| DualCipherError::invalid_proof(e.to_string()))?;
        Ok(Self::new(bytes))
    }
}

/// Size parameters of one batch attestation
///
/// `records` is the number N of doubly-encrypted records; the circuit has
/// `2^k` rows.
///
/// # Examples
///
/// ```
/// use dualcipher_runtime::BatchConfig;
///
/// let config = BatchConfig::new(4, 13).unwrap();
/// assert_eq!(config.records(), 4);
/// assert_eq!(config.num_rows(), 8192);
/// ```
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(try_from = "RawBatchConfig")]
pub struct BatchConfig {
    records: usize,
    k: u32,
}

/// Unvalidated wire form of [`BatchConfig`].
#[derive(Deserialize)]
struct RawBatchConfig {
    records: usize,
    k: u32,
}

impl TryFrom<RawBatchConfig> for BatchConfig {
    type Error = DualCipherError;

    fn try_from(raw: RawBatchConfig) -> Result<Self> {
        Self::new(raw.records, raw.k)
    }
}

impl BatchConfig {
    pub fn new(records: usize, k: u32) -> Result<Self> {
        if records == 0 {
            return Err(DualCipherError::invalid_config("batch must contain at least one record"));
        }
        if k == 0 || k > MAX_K {
            return Err(DualCipherError::invalid_config(format!(
                "k={} outside supported range 1..={}",
                k, MAX_K
            )));
        }
        Ok(Self { records, k })
    }

    pub fn records(&self) -> usize {
        self.records
    }

    pub fn k(&self) -> u32 {
        self.k
    }

    /// Returns the number of rows in the circuit (2^k)
    pub fn num_rows(&self) -> usize {
        1 << self.k
    }

    /// Number of field elements in the public instance column: 4 + 5N
    pub fn num_public_inputs(&self) -> usize {
        4 + 5 * self.records
    }

    /// Number of private scalars: SK plus one plaintext per record
    pub fn num_private_witnesses(&self) -> usize {
        1 + self.records
    }
}
