//! Proving and Verification Key Management
//!
//! IPA parameters are cached on disk per `k`. halo2_proofs 0.3 has no stable
//! key serialization, so proving and verifying keys are regenerated from the
//! statement each run and only their metadata is persisted.

use crate::error::Result;
use crate::field::Base;
use halo2_proofs::{
    plonk::{keygen_pk, keygen_vk, Circuit, ProvingKey, VerifyingKey},
    poly::commitment::Params,
};
use halo2curves::pasta::EpAffine;
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
};
use tracing::{debug, info, warn};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyMetadata {
    pub circuit_name: String,
    pub k: u32,
    pub records: usize,
    pub num_public_inputs: usize,
    pub num_private_witnesses: usize,
}

impl KeyMetadata {
    /// Metadata for a double-encryption statement over `records` records.
    pub fn for_batch(records: usize, k: u32) -> Self {
        Self {
            circuit_name: format!("double_encryption_n{}", records),
            k,
            records,
            num_public_inputs: 4 + 5 * records,
            num_private_witnesses: 1 + records,
        }
    }
}

pub struct KeyManager {
    cache_dir: PathBuf,
}

impl KeyManager {
    pub fn new<P: AsRef<Path>>(cache_dir: P) -> Result<Self> {
        let cache_dir = cache_dir.as_ref().to_path_buf();
        fs::create_dir_all(&cache_dir)?;

        Ok(Self { cache_dir })
    }

    pub fn cache_dir(&self) -> &Path {
        &self.cache_dir
    }

    pub fn params_path(&self, k: u32) -> PathBuf {
        self.cache_dir.join(format!("params_pallas_k{}.bin", k))
    }

    pub fn metadata_path(&self, circuit_name: &str, k: u32) -> PathBuf {
        self.cache_dir.join(format!("{}_k{}_metadata.json", circuit_name, k))
    }

    pub fn generate_params(&self, k: u32) -> Result<Params<EpAffine>> {
        let params_path = self.params_path(k);

        if params_path.exists() {
            debug!(k, path = ?params_path, "loading cached IPA parameters");
            return self.load_params(k);
        }

        info!(k, "generating IPA parameters");
        let params = Params::<EpAffine>::new(k);

        self.save_params(&params, k)?;

        Ok(params)
    }

    fn save_params(&self, params: &Params<EpAffine>, k: u32) -> Result<()> {
        let path = self.params_path(k);
        let mut file = fs::File::create(&path)?;

        params.write(&mut file)?;

        debug!(path = ?path, "saved IPA parameters");
        Ok(())
    }

    pub fn load_params(&self, k: u32) -> Result<Params<EpAffine>> {
        let path = self.params_path(k);
        let mut file = fs::File::open(&path)?;

        Ok(Params::<EpAffine>::read(&mut file)?)
    }

    pub fn generate_keys<C>(
        &self,
        circuit: &C,
        k: u32,
        metadata: &KeyMetadata,
    ) -> Result<(Params<EpAffine>, ProvingKey<EpAffine>, VerifyingKey<EpAffine>)>
    where
        C: Circuit<Base>,
    {
        let params = self.generate_params(k)?;

        info!(circuit = %metadata.circuit_name, k, "generating proving and verifying keys");

        let vk = keygen_vk(&params, circuit)?;
        let pk = keygen_pk(&params, vk.clone(), circuit)?;

        self.record_metadata(metadata)?;

        Ok((params, pk, vk))
    }

    /// Persists `metadata` unless an identical copy is already cached.
    /// Returns whether the file was written.
    fn record_metadata(&self, metadata: &KeyMetadata) -> Result<bool> {
        match self.load_metadata(&metadata.circuit_name, metadata.k) {
            Ok(cached) if cached == *metadata => {
                debug!(circuit = %metadata.circuit_name, "key metadata unchanged");
                return Ok(false);
            }
            Ok(cached) => {
                warn!(
                    circuit = %metadata.circuit_name,
                    cached_public_inputs = cached.num_public_inputs,
                    public_inputs = metadata.num_public_inputs,
                    "replacing stale key metadata"
                );
            }
            Err(_) => {}
        }

        self.save_metadata(metadata)?;
        Ok(true)
    }

    fn save_metadata(&self, metadata: &KeyMetadata) -> Result<()> {
        let meta_path = self.metadata_path(&metadata.circuit_name, metadata.k);

        let metadata_json = serde_json::to_string_pretty(metadata)?;
        fs::write(&meta_path, metadata_json)?;

        debug!(path = ?meta_path, "saved key metadata");

        Ok(())
    }

    pub fn load_metadata(&self, circuit_name: &str, k: u32) -> Result<KeyMetadata> {
        let meta_path = self.metadata_path(circuit_name, k);
        let content = fs::read_to_string(&meta_path)?;

        Ok(serde_json::from_str(&content)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CircuitError;
    use crate::statement::DoubleEncryptionCircuit;
    use tempfile::TempDir;

    #[test]
    fn test_key_manager_paths() {
        let temp_dir = TempDir::new().unwrap();
        let manager = KeyManager::new(temp_dir.path()).unwrap();

        assert_eq!(manager.params_path(10), temp_dir.path().join("params_pallas_k10.bin"));
        assert_eq!(
            manager.metadata_path("double_encryption_n1", 11),
            temp_dir.path().join("double_encryption_n1_k11_metadata.json")
        );
    }

    #[test]
    fn test_params_caching() {
        let temp_dir = TempDir::new().unwrap();
        let manager = KeyManager::new(temp_dir.path()).unwrap();

        let params = manager.generate_params(4).unwrap();
        assert_eq!(params.k(), 4);
        assert!(manager.params_path(4).exists());

        let cached = manager.generate_params(4).unwrap();
        assert_eq!(cached.k(), params.k());
    }

    #[test]
    fn test_load_nonexistent_params() {
        let temp_dir = TempDir::new().unwrap();
        let manager = KeyManager::new(temp_dir.path()).unwrap();

        assert!(matches!(manager.load_params(20), Err(CircuitError::Io(_))));
    }

    #[test]
    fn test_metadata_for_batch() {
        let metadata = KeyMetadata::for_batch(3, 13);
        assert_eq!(metadata.circuit_name, "double_encryption_n3");
        assert_eq!(metadata.num_public_inputs, 19);
        assert_eq!(metadata.num_private_witnesses, 4);
    }

    #[test]
    fn test_metadata_save_load() {
        let temp_dir = TempDir::new().unwrap();
        let manager = KeyManager::new(temp_dir.path()).unwrap();

        let metadata = KeyMetadata::for_batch(2, 12);
        manager.save_metadata(&metadata).unwrap();

        let loaded = manager.load_metadata(&metadata.circuit_name, 12).unwrap();
        assert_eq!(loaded, metadata);
    }

    #[test]
    fn test_stale_metadata_is_replaced() {
        let temp_dir = TempDir::new().unwrap();
        let manager = KeyManager::new(temp_dir.path()).unwrap();
        let metadata = KeyMetadata::for_batch(2, 12);

        assert!(manager.record_metadata(&metadata).unwrap());
        assert!(!manager.record_metadata(&metadata).unwrap());

        let stale = KeyMetadata { num_public_inputs: 14, ..metadata.clone() };
        manager.save_metadata(&stale).unwrap();

        assert!(manager.record_metadata(&metadata).unwrap());
        assert_eq!(manager.load_metadata(&metadata.circuit_name, 12).unwrap(), metadata);
    }

    #[test]
    fn test_load_nonexistent_metadata() {
        let temp_dir = TempDir::new().unwrap();
        let manager = KeyManager::new(temp_dir.path()).unwrap();

        assert!(manager.load_metadata("nonexistent", 10).is_err());
    }

    #[test]
    fn test_key_manager_cache_dir_creation() {
        let temp_dir = TempDir::new().unwrap();
        let cache_path = temp_dir.path().join("nested").join("cache");

        let manager = KeyManager::new(&cache_path).unwrap();
        assert!(cache_path.exists());
        assert_eq!(manager.cache_dir(), cache_path.as_path());
    }

    #[test]
    fn test_keygen_is_deterministic() {
        let temp_dir = TempDir::new().unwrap();
        let manager = KeyManager::new(temp_dir.path()).unwrap();
        let k = crate::statement::minimum_k(1);
        let metadata = KeyMetadata::for_batch(1, k);
        let circuit = DoubleEncryptionCircuit::unassigned(1);

        let (_, _, vk1) = manager.generate_keys(&circuit, k, &metadata).unwrap();
        let (_, _, vk2) = manager.generate_keys(&circuit, k, &metadata).unwrap();

        assert_eq!(format!("{:?}", vk1.pinned()), format!("{:?}", vk2.pinned()));
        assert!(manager.metadata_path(&metadata.circuit_name, k).exists());
    }
}
