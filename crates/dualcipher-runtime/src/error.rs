//! Error types for the dualcipher toolkit

use thiserror::Error;

/// Result type alias for dualcipher operations
pub type Result<T> = std::result::Result<T, DualCipherError>;

/// Terminal failure classes of a batch attestation run.
///
/// None of these are retried: a run either completes or aborts with one of them.
#[derive(Debug, Error)]
pub enum DualCipherError {
    /// Statement could not be compiled (gadget construction, key derivation)
    #[error("Build error: {0}")]
    BuildError(String),

    /// Host-side value generation failed (e.g. the randomness source)
    #[error("Witness error: {0}")]
    WitnessError(String),

    /// The assignment does not satisfy the statement
    #[error("Unsatisfied statement: {0}")]
    Unsatisfied(String),

    /// A well-formed proof was rejected by the verifier
    #[error("Verification failed: {0}")]
    VerificationFailed(String),

    /// Proof bytes could not be parsed or are empty
    #[error("Invalid proof: {0}")]
    InvalidProof(String),

    /// Serialization or deserialization error
    #[error("Serialization error: {0}")]
    SerializationError(String),

    /// I/O error wrapper
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// Invalid batch configuration parameters
    #[error("Invalid batch configuration: {0}")]
    InvalidConfig(String),
}

impl DualCipherError {
    pub fn build(msg: impl Into<String>) -> Self {
        Self::BuildError(msg.into())
    }

    pub fn witness(msg: impl Into<String>) -> Self {
        Self::WitnessError(msg.into())
    }

    pub fn unsatisfied(msg: impl Into<String>) -> Self {
        Self::Unsatisfied(msg.into())
    }

    pub fn verification_failed(msg: impl Into<String>) -> Self {
        Self::VerificationFailed(msg.into())
    }

    pub fn invalid_proof(msg: impl Into<String>) -> Self {
        Self::InvalidProof(msg.into())
    }

    pub fn serialization_error(msg: impl Into<String>) -> Self {
        Self::SerializationError(msg.into())
    }

    pub fn invalid_config(msg: impl Into<String>) -> Self {
        Self::InvalidConfig(msg.into())
    }
}
