//! dualcipher circuit
//!
//! A halo2 statement proving that a batch of records was doubly encrypted
//! under one secret key `SK`:
//!
//! - a group ciphertext `CTP[i] = SK·H[i] + X[i]·G` on Vesta, and
//! - a field ciphertext `CT[i] = X[i] + PRF(SK, i)` over the Vesta base field,
//!
//! together with `VK = SK·H0`, where `SK` and every `X[i]` are proven to be
//! canonical Vesta scalars.
//!
//! The statement is arithmetised over `Fq`, the field Vesta's coordinates
//! live in, so group arithmetic is native. [`witness::HostWitness`] computes
//! the same values with ordinary Pasta arithmetic and is the oracle the
//! circuit is tested against.
//!
//! # Example
//!
//! ```no_run
//! use dualcipher_circuit::{minimum_k, HostWitness, KeyMetadata, NativeProver};
//! use rand::rngs::OsRng;
//!
//! let witness = HostWitness::generate(1, &mut OsRng)?;
//! let k = minimum_k(1);
//!
//! let mut prover = NativeProver::new(witness.circuit(), k)?;
//! prover.setup(&KeyMetadata::for_batch(1, k))?;
//!
//! let public = vec![witness.instance()];
//! let proof = prover.generate_proof(&public)?;
//! assert!(prover.verify_proof(&proof, &public)?);
//! # Ok::<(), dualcipher_circuit::CircuitError>(())
//! ```

pub mod error;
pub mod field;
pub mod gadgets;
pub mod prover;
pub mod statement;
pub mod witness;

pub use error::{CircuitError, Result};
pub use field::{Base, Scalar, SCALAR_BOUND};
pub use prover::{check_satisfied, KeyManager, KeyMetadata, NativeProver, ProofBundle};
pub use statement::{
    minimum_k, pinned_constraint_system, DoubleEncryptionCircuit, StatementLayout, StatementShape,
};
pub use witness::{random_scalar, HostWitness, PublicInputs};
