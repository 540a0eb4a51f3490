//! Native Prover for the double-encryption statement
//!
//! Wraps key generation, proof creation and verification over the Pallas IPA
//! commitment scheme. Proofs are created with a Blake2b transcript.

use super::keys::{KeyManager, KeyMetadata};
use crate::error::{CircuitError, Result};
use crate::field::Base;
use dualcipher_runtime::ZkProof;
use halo2_proofs::{
    dev::MockProver,
    plonk::{create_proof, verify_proof, Circuit, ProvingKey, SingleVerifier, VerifyingKey},
    poly::commitment::Params,
    transcript::{Blake2bRead, Blake2bWrite, Challenge255},
};
use halo2curves::pasta::EpAffine;
use rand::rngs::OsRng;
use std::path::Path;
use tracing::{debug, info, warn};

/// Runs the circuit against `public_inputs` without producing a proof and
/// reports the first failed constraint.
pub fn check_satisfied<C: Circuit<Base>>(
    circuit: &C,
    k: u32,
    public_inputs: &[Vec<Base>],
) -> Result<()> {
    let prover = MockProver::run(k, circuit, public_inputs.to_vec())?;
    prover.verify().map_err(|failures| {
        let first = failures.first().map(|f| f.to_string()).unwrap_or_default();
        CircuitError::Unsatisfied(format!(
            "{} failed constraint(s); first: {}",
            failures.len(),
            first
        ))
    })
}

pub struct NativeProver<C: Circuit<Base>> {
    circuit: C,
    k: u32,
    key_manager: KeyManager,
    check_witness: bool,
    proving_key: Option<ProvingKey<EpAffine>>,
    verifying_key: Option<VerifyingKey<EpAffine>>,
    params: Option<Params<EpAffine>>,
}

impl<C: Circuit<Base>> NativeProver<C> {
    pub fn new(circuit: C, k: u32) -> Result<Self> {
        let cache_dir = std::env::current_dir()?.join(".dualcipher_cache");
        Self::with_cache_dir(circuit, k, cache_dir)
    }

    pub fn with_cache_dir<P: AsRef<Path>>(circuit: C, k: u32, cache_dir: P) -> Result<Self> {
        let key_manager = KeyManager::new(cache_dir)?;

        Ok(Self {
            circuit,
            k,
            key_manager,
            check_witness: true,
            proving_key: None,
            verifying_key: None,
            params: None,
        })
    }

    /// Skip the constraint check that otherwise precedes every proof.
    pub fn without_witness_check(mut self) -> Self {
        self.check_witness = false;
        self
    }

    pub fn k(&self) -> u32 {
        self.k
    }

    pub fn circuit(&self) -> &C {
        &self.circuit
    }

    pub fn setup(&mut self, metadata: &KeyMetadata) -> Result<()> {
        let (params, pk, vk) = self.key_manager.generate_keys(&self.circuit, self.k, metadata)?;

        self.params = Some(params);
        self.proving_key = Some(pk);
        self.verifying_key = Some(vk);

        Ok(())
    }

    pub fn generate_proof(&self, public_inputs: &[Vec<Base>]) -> Result<ZkProof> {
        let pk = self
            .proving_key
            .as_ref()
            .ok_or(CircuitError::NotReady("proving key not loaded; call setup() first"))?;
        let params = self
            .params
            .as_ref()
            .ok_or(CircuitError::NotReady("parameters not loaded; call setup() first"))?;

        if self.check_witness {
            check_satisfied(&self.circuit, self.k, public_inputs)?;
            debug!("witness satisfies all constraints");
        }

        let mut transcript = Blake2bWrite::<_, EpAffine, Challenge255<_>>::init(vec![]);

        let instances: Vec<&[Base]> = public_inputs.iter().map(|v| v.as_slice()).collect();
        let instances_slice: &[&[Base]] = &instances;

        create_proof(
            params,
            pk,
            std::slice::from_ref(&self.circuit),
            &[instances_slice],
            OsRng,
            &mut transcript,
        )?;

        let proof = ZkProof::new(transcript.finalize());
        info!(bytes = proof.size(), "proof created");
        Ok(proof)
    }

    /// `Ok(false)` when the proof does not check against `public_inputs`.
    pub fn verify_proof(&self, proof: &ZkProof, public_inputs: &[Vec<Base>]) -> Result<bool> {
        let vk = self
            .verifying_key
            .as_ref()
            .ok_or(CircuitError::NotReady("verifying key not loaded; call setup() first"))?;
        let params = self
            .params
            .as_ref()
            .ok_or(CircuitError::NotReady("parameters not loaded; call setup() first"))?;

        let mut transcript = Blake2bRead::<_, EpAffine, Challenge255<_>>::init(proof.as_bytes());

        let instances: Vec<&[Base]> = public_inputs.iter().map(|v| v.as_slice()).collect();
        let instances_slice: &[&[Base]] = &instances;

        let strategy = SingleVerifier::new(params);

        match verify_proof(params, vk, strategy, &[instances_slice], &mut transcript) {
            Ok(_) => Ok(true),
            Err(e) => {
                warn!(error = ?e, "proof rejected");
                Ok(false)
            }
        }
    }

    pub fn proving_key(&self) -> Option<&ProvingKey<EpAffine>> {
        self.proving_key.as_ref()
    }

    pub fn verifying_key(&self) -> Option<&VerifyingKey<EpAffine>> {
        self.verifying_key.as_ref()
    }
}
