use criterion::{black_box, criterion_group, criterion_main, Criterion};
use dualcipher_circuit::{minimum_k, HostWitness, KeyMetadata, NativeProver};
use halo2_proofs::dev::MockProver;
use rand::{rngs::StdRng, SeedableRng};
use tempfile::TempDir;

fn benchmark_single_record(c: &mut Criterion) {
    let mut rng = StdRng::seed_from_u64(1);
    let witness = HostWitness::generate(1, &mut rng).unwrap();
    let k = minimum_k(1);
    let public_inputs = vec![witness.instance()];

    let temp_dir = TempDir::new().unwrap();
    let mut prover = NativeProver::with_cache_dir(witness.circuit(), k, temp_dir.path())
        .unwrap()
        .without_witness_check();
    prover.setup(&KeyMetadata::for_batch(1, k)).unwrap();

    let mut group = c.benchmark_group("double_encryption_n1");
    group.sample_size(10);

    group.bench_function("prove", |b| {
        b.iter(|| black_box(prover.generate_proof(black_box(&public_inputs)).unwrap()));
    });

    let proof = prover.generate_proof(&public_inputs).unwrap();

    group.bench_function("verify", |b| {
        b.iter(|| black_box(prover.verify_proof(black_box(&proof), &public_inputs).unwrap()));
    });

    group.finish();
}

fn benchmark_record_scaling(c: &mut Criterion) {
    let mut group = c.benchmark_group("record_scaling");
    group.sample_size(10);

    for records in [1, 2, 4] {
        let mut rng = StdRng::seed_from_u64(records as u64);
        let witness = HostWitness::generate(records, &mut rng).unwrap();
        let circuit = witness.circuit();
        let public_inputs = witness.instance();
        let k = minimum_k(records);

        group.bench_function(format!("records_{}", records), |b| {
            b.iter(|| {
                let prover = MockProver::run(
                    black_box(k),
                    black_box(&circuit),
                    black_box(vec![public_inputs.clone()]),
                )
                .unwrap();
                black_box(prover.verify())
            });
        });
    }

    group.finish();
}

criterion_group!(benches, benchmark_single_record, benchmark_record_scaling);
criterion_main!(benches);
