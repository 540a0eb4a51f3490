//! Integration tests for error handling in dualcipher-runtime

use dualcipher_runtime::DualCipherError;

#[test]
fn test_build_error_message() {
    let error = DualCipherError::build("poseidon chip unavailable");

    let error_msg = error.to_string();
    assert!(error_msg.contains("Build error"));
    assert!(error_msg.contains("poseidon chip unavailable"));
}

#[test]
fn test_witness_error_message() {
    let error = DualCipherError::witness("randomness source failed");

    let error_msg = error.to_string();
    assert!(error_msg.contains("Witness error"));
    assert!(error_msg.contains("randomness source failed"));
}

#[test]
fn test_unsatisfied_and_verification_are_distinct() {
    let unsatisfied = DualCipherError::unsatisfied("range check");
    let rejected = DualCipherError::verification_failed("proof rejected");

    assert!(unsatisfied.to_string().starts_with("Unsatisfied statement"));
    assert!(rejected.to_string().starts_with("Verification failed"));
    assert!(matches!(unsatisfied, DualCipherError::Unsatisfied(_)));
    assert!(matches!(rejected, DualCipherError::VerificationFailed(_)));
}

#[test]
fn test_serialization_error_message() {
    let error = DualCipherError::serialization_error("invalid JSON format");

    let error_msg = error.to_string();
    assert!(error_msg.contains("Serialization error"));
    assert!(error_msg.contains("invalid JSON format"));
}

#[test]
fn test_io_error_conversion() {
    let io_error = std::io::Error::new(std::io::ErrorKind::NotFound, "params file not found");
    let error: DualCipherError = io_error.into();

    let error_msg = error.to_string();
    assert!(error_msg.contains("I/O error"));
    assert!(error_msg.contains("params file not found"));
}

#[test]
fn test_invalid_config_message() {
    let error = DualCipherError::invalid_config("k=40 outside supported range");
    assert!(error.to_string().contains("Invalid batch configuration"));
}

#[test]
fn test_error_debug_format() {
    let error = DualCipherError::invalid_proof("test");
    let debug_str = format!("{:?}", error);
    assert!(debug_str.contains("InvalidProof"));
}

#[test]
fn test_result_type_alias() {
    fn returns_result() -> dualcipher_runtime::Result<u32> {
        Ok(42)
    }

    assert_eq!(returns_result().unwrap(), 42);
}
