//! Circuit crate error types

use dualcipher_runtime::DualCipherError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CircuitError {
    #[error("Synthesis error: {0}")]
    Synthesis(#[from] halo2_proofs::plonk::Error),

    #[error("Unsatisfied statement: {0}")]
    Unsatisfied(String),

    #[error("Witness error: {0}")]
    Witness(String),

    #[error("Invalid encoding: {0}")]
    Encoding(String),

    #[error("Prover not ready: {0}")]
    NotReady(&'static str),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Runtime(#[from] DualCipherError),
}

pub type Result<T> = std::result::Result<T, CircuitError>;

impl From<CircuitError> for DualCipherError {
    fn from(err: CircuitError) -> Self {
        match err {
            CircuitError::Synthesis(e) => DualCipherError::build(e.to_string()),
            CircuitError::NotReady(msg) => DualCipherError::build(msg),
            CircuitError::Unsatisfied(msg) => DualCipherError::unsatisfied(msg),
            CircuitError::Witness(msg) => DualCipherError::witness(msg),
            CircuitError::Encoding(msg) => DualCipherError::serialization_error(msg),
            CircuitError::Json(e) => DualCipherError::serialization_error(e.to_string()),
            CircuitError::Io(e) => DualCipherError::IoError(e),
            CircuitError::Runtime(e) => e,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classification() {
        let err: DualCipherError = CircuitError::Unsatisfied("gate".into()).into();
        assert!(matches!(err, DualCipherError::Unsatisfied(_)));

        let err: DualCipherError = CircuitError::Witness("rng".into()).into();
        assert!(matches!(err, DualCipherError::WitnessError(_)));

        let err: DualCipherError = CircuitError::from(halo2_proofs::plonk::Error::Synthesis).into();
        assert!(matches!(err, DualCipherError::BuildError(_)));

        let inner = DualCipherError::verification_failed("rejected");
        let err: DualCipherError = CircuitError::Runtime(inner).into();
        assert!(matches!(err, DualCipherError::VerificationFailed(_)));
    }
}
