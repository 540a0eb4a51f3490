//! dualcipher CLI
//!
//! Prove and verify that a batch of records was doubly encrypted under one
//! secret key.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use dualcipher_circuit::{
    minimum_k, DoubleEncryptionCircuit, HostWitness, KeyMetadata, NativeProver, ProofBundle,
    StatementLayout, StatementShape,
};
use dualcipher_runtime::{BatchConfig, DualCipherError, ZkProof};
use rand::rngs::OsRng;
use std::{
    path::{Path, PathBuf},
    time::Instant,
};
use tracing::{debug, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "dualcipher")]
#[command(
    about = "Zero-knowledge proofs for batches of doubly-encrypted records",
    long_about = None
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Sample a fresh batch, prove it and write a proof bundle
    Prove {
        /// Number of records in the batch
        #[arg(short = 'n', long, default_value = "1")]
        records: usize,

        /// Circuit parameter k (size = 2^k); derived from the batch size when omitted
        #[arg(short, long)]
        k: Option<u32>,

        /// Output file for the proof bundle
        #[arg(short, long, default_value = "bundle.json")]
        output: PathBuf,

        /// Cache directory for IPA parameters
        #[arg(long, default_value = ".dualcipher_cache")]
        cache_dir: PathBuf,
    },

    /// Verify a proof bundle
    Verify {
        /// Path to the proof bundle
        #[arg(short, long)]
        bundle: PathBuf,

        /// Cache directory for IPA parameters
        #[arg(long, default_value = ".dualcipher_cache")]
        cache_dir: PathBuf,
    },

    /// Sample, prove and verify in one go, reporting per-phase timings
    Run {
        /// Number of records in the batch
        #[arg(short = 'n', long, default_value = "1")]
        records: usize,

        /// Circuit parameter k (size = 2^k); derived from the batch size when omitted
        #[arg(short, long)]
        k: Option<u32>,

        /// Cache directory for IPA parameters
        #[arg(long, default_value = ".dualcipher_cache")]
        cache_dir: PathBuf,
    },

    /// Show the public-input layout and circuit shape for a batch size
    Info {
        /// Number of records in the batch
        #[arg(short = 'n', long, default_value = "1")]
        records: usize,

        /// Print the circuit shape as JSON
        #[arg(long)]
        json: bool,
    },
}

fn batch_config(records: usize, k: Option<u32>) -> Result<BatchConfig> {
    let k = k.unwrap_or_else(|| minimum_k(records));
    if k < minimum_k(records) {
        warn!(k, minimum = minimum_k(records), "k is below the estimated minimum for this batch");
    }
    BatchConfig::new(records, k).context("Invalid batch configuration")
}

fn setup_prover(
    circuit: DoubleEncryptionCircuit,
    config: BatchConfig,
    cache_dir: &Path,
) -> Result<NativeProver<DoubleEncryptionCircuit>> {
    let mut prover = NativeProver::with_cache_dir(circuit, config.k(), cache_dir)
        .map_err(DualCipherError::from)
        .context(format!("Failed to open cache directory {:?}", cache_dir))?;
    prover
        .setup(&KeyMetadata::for_batch(config.records(), config.k()))
        .map_err(DualCipherError::from)
        .context("Failed to generate keys")?;
    Ok(prover)
}

fn prove(config: BatchConfig, cache_dir: &Path) -> Result<(HostWitness, ZkProof)> {
    println!("🎲 Sampling {} record(s)...", config.records());
    let witness = HostWitness::generate(config.records(), &mut OsRng)
        .map_err(DualCipherError::from)
        .context("Failed to generate witness")?;

    println!("🔑 Setting up prover with k={}...", config.k());
    let prover = setup_prover(witness.circuit(), config, cache_dir)?;

    println!("📊 Generating proof...");
    let proof = prover
        .generate_proof(&[witness.instance()])
        .map_err(DualCipherError::from)
        .context("Failed to create proof")?;

    Ok((witness, proof))
}

fn prove_command(config: BatchConfig, output: &Path, cache_dir: &Path) -> Result<()> {
    let (witness, proof) = prove(config, cache_dir)?;

    println!("💾 Saving bundle to {:?}...", output);
    ProofBundle::new(config, &proof, witness.public().clone())
        .save(output)
        .map_err(DualCipherError::from)
        .context(format!("Failed to write bundle to {:?}", output))?;

    println!("✅ Proof generated successfully!");
    println!("   Records: {}", config.records());
    println!("   Size: {} bytes", proof.size());
    println!("   Output: {:?}", output);

    Ok(())
}

fn verify_command(bundle_path: &Path, cache_dir: &Path) -> Result<()> {
    println!("🔧 Loading proof bundle...");
    let bundle = ProofBundle::load(bundle_path)
        .map_err(DualCipherError::from)
        .context(format!("Failed to read bundle file: {:?}", bundle_path))?;
    let config = bundle.config().map_err(DualCipherError::from).context("Malformed bundle")?;
    let proof = bundle.proof().map_err(DualCipherError::from).context("Malformed bundle")?;

    println!("🔑 Setting up verifier with k={}...", config.k());
    let verifier =
        setup_prover(DoubleEncryptionCircuit::unassigned(config.records()), config, cache_dir)?;

    println!("🔍 Verifying proof...");
    let is_valid = verifier
        .verify_proof(&proof, &[bundle.public_inputs.to_instance()])
        .map_err(DualCipherError::from)?;

    if is_valid {
        println!("✅ Proof is VALID!");
        Ok(())
    } else {
        println!("❌ Proof is INVALID!");
        Err(DualCipherError::verification_failed("proof does not match the bundle's public inputs")
            .into())
    }
}

fn run_command(config: BatchConfig, cache_dir: &Path) -> Result<()> {
    let shape = StatementShape::of(config.records());

    let start = Instant::now();
    let witness = HostWitness::generate(config.records(), &mut OsRng)
        .map_err(DualCipherError::from)
        .context("Failed to generate witness")?;
    let sample_time = start.elapsed();

    let start = Instant::now();
    let prover = setup_prover(witness.circuit(), config, cache_dir)?;
    let setup_time = start.elapsed();

    let public_inputs = vec![witness.instance()];

    let start = Instant::now();
    let proof = prover
        .generate_proof(&public_inputs)
        .map_err(DualCipherError::from)
        .context("Failed to create proof")?;
    let prove_time = start.elapsed();

    let start = Instant::now();
    let is_valid = prover.verify_proof(&proof, &public_inputs).map_err(DualCipherError::from)?;
    let verify_time = start.elapsed();

    println!("📋 Double encryption, {} record(s), k={}", config.records(), config.k());
    println!("   Constraint degree: {}", shape.degree);
    println!("   Estimated rows: {} of {}", shape.estimated_rows, config.num_rows());
    println!("   Sample: {:?}", sample_time);
    println!("   Setup: {:?}", setup_time);
    println!("   Prove: {:?}", prove_time);
    println!("   Verify: {:?}", verify_time);
    println!("   Proof size: {} bytes", proof.size());

    if !is_valid {
        return Err(DualCipherError::verification_failed("freshly generated proof rejected").into());
    }
    println!("✅ Proof verified successfully!");
    Ok(())
}

fn info_command(records: usize, json: bool) -> Result<()> {
    let shape = StatementShape::of(records);
    if json {
        println!("{}", serde_json::to_string_pretty(&shape)?);
        return Ok(());
    }

    let layout = StatementLayout::new(records);
    println!("📋 Statement: double encryption");
    println!("   Records: {}", records);
    println!("   Private witnesses: {} (SK, X[0..{}))", records + 1, records);
    println!("   Public inputs: {}", layout.instance_len());
    println!("     H0        rows {}..{}", layout.h0(), layout.h0() + 2);
    println!("     VK        rows {}..{}", layout.vk(), layout.vk() + 2);
    println!("     H[i]      rows {}..{}", layout.base(0), layout.group_ciphertext(0));
    println!("     CTP[i]    rows {}..{}", layout.group_ciphertext(0), layout.field_ciphertext(0));
    println!("     CT[i]     rows {}..{}", layout.field_ciphertext(0), layout.instance_len());
    println!("   Advice columns: {}", shape.advice_columns);
    println!("   Fixed columns: {}", shape.fixed_columns);
    println!("   Constraint degree: {}", shape.degree);
    println!("   Reserved rows: {}", shape.minimum_rows);
    println!("   Estimated rows: {}", shape.estimated_rows);
    println!("   Minimum k: {}", shape.min_k);

    Ok(())
}

fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_target(false)
        .init();
}

fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();

    match cli.command {
        Commands::Prove { records, k, output, cache_dir } => {
            println!("🚀 dualcipher prover");
            println!();
            let config = batch_config(records, k)?;
            debug!(?config, "proving");
            prove_command(config, &output, &cache_dir)?;
        }
        Commands::Verify { bundle, cache_dir } => {
            println!("🔍 dualcipher verifier");
            println!();
            verify_command(&bundle, &cache_dir)?;
        }
        Commands::Run { records, k, cache_dir } => {
            let config = batch_config(records, k)?;
            run_command(config, &cache_dir)?;
        }
        Commands::Info { records, json } => {
            batch_config(records, None)?;
            info_command(records, json)?;
        }
    }

    Ok(())
}
