//! Proof-system driver
//!
//! Key management, native proving and the on-disk proof bundle.

pub mod keys;
pub mod native;

pub use keys::{KeyManager, KeyMetadata};
pub use native::{check_satisfied, NativeProver};

use crate::error::{CircuitError, Result};
use crate::witness::PublicInputs;
use dualcipher_runtime::{BatchConfig, ZkProof};
use serde::{Deserialize, Serialize};
use std::{fs, path::Path};

/// A proof together with everything needed to check it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProofBundle {
    pub records: usize,
    pub k: u32,
    pub proof: String,
    pub public_inputs: PublicInputs,
}

impl ProofBundle {
    pub fn new(config: BatchConfig, proof: &ZkProof, public_inputs: PublicInputs) -> Self {
        Self { records: config.records(), k: config.k(), proof: proof.to_hex(), public_inputs }
    }

    pub fn config(&self) -> Result<BatchConfig> {
        let config = BatchConfig::new(self.records, self.k)?;
        if self.public_inputs.records() != self.records {
            return Err(CircuitError::Encoding(format!(
                "bundle declares {} records but carries public inputs for {}",
                self.records,
                self.public_inputs.records()
            )));
        }
        Ok(config)
    }

    pub fn proof(&self) -> Result<ZkProof> {
        Ok(ZkProof::from_hex(&self.proof)?)
    }

    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        fs::write(path, serde_json::to_string_pretty(self)?)?;
        Ok(())
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::witness::HostWitness;
    use rand::{rngs::StdRng, SeedableRng};
    use tempfile::TempDir;

    fn bundle(records: usize) -> ProofBundle {
        let mut rng = StdRng::seed_from_u64(9);
        let witness = HostWitness::generate(records, &mut rng).unwrap();
        let config = BatchConfig::new(records, 12).unwrap();
        ProofBundle::new(config, &ZkProof::new(vec![1, 2, 3]), witness.public().clone())
    }

    #[test]
    fn test_bundle_save_load() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("bundle.json");

        let original = bundle(2);
        original.save(&path).unwrap();
        let loaded = ProofBundle::load(&path).unwrap();

        assert_eq!(loaded, original);
        assert_eq!(loaded.proof().unwrap(), ZkProof::new(vec![1, 2, 3]));
        assert_eq!(loaded.config().unwrap(), BatchConfig::new(2, 12).unwrap());
    }

    #[test]
    fn test_bundle_record_mismatch() {
        let mut b = bundle(1);
        b.records = 2;
        assert!(matches!(b.config(), Err(CircuitError::Encoding(_))));
    }

    #[test]
    fn test_bundle_bad_proof_hex() {
        let mut b = bundle(1);
        b.proof = "zz".into();
        assert!(matches!(b.proof(), Err(CircuitError::Runtime(_))));
    }

    #[test]
    fn test_bundle_load_missing_file() {
        let temp_dir = TempDir::new().unwrap();
        let err = ProofBundle::load(temp_dir.path().join("missing.json")).unwrap_err();
        assert!(matches!(err, CircuitError::Io(_)));
    }
}
