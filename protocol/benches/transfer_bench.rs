// Vault benchmarks.
//
// Covers canonical message construction, dual-signature verification per
// signing scheme and prehash, and the full transfer commit path with and
// without a persistent store.

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};

use cold_storage_protocol::config::EngineConfig;
use cold_storage_protocol::crypto::{HashAlgorithm, SigningAlgorithm, VaultKeypair};
use cold_storage_protocol::storage::VaultDb;
use cold_storage_protocol::vault::{
    Amount, DomainTag, DualSignature, TransferIntent, TransferRequest, VaultEngine,
};

fn intent(sequence_number: u64) -> TransferIntent {
    TransferIntent {
        sender: "0x179b6b1cb6755e31".parse().unwrap(),
        recipient: "0x01cf0e2f2f715450".parse().unwrap(),
        amount: Amount::from_units(500_000_000),
        sequence_number,
    }
}

fn bench_canonical_message(c: &mut Criterion) {
    let domain = DomainTag::user();
    let intent = intent(42);

    c.bench_function("vault/canonical_message", |b| {
        b.iter(|| intent.canonical_message(&domain));
    });
}

fn bench_verify_pair(c: &mut Criterion) {
    let mut group = c.benchmark_group("vault/verify_pair");
    let message = intent(0).canonical_message(&DomainTag::user());

    let cases = [
        (SigningAlgorithm::Ed25519, HashAlgorithm::Sha2_256),
        (SigningAlgorithm::Ed25519, HashAlgorithm::Blake3),
        (SigningAlgorithm::EcdsaP256, HashAlgorithm::Sha3_256),
    ];
    for (scheme, hash) in cases {
        let a = VaultKeypair::generate_with(scheme);
        let b = VaultKeypair::generate_with(scheme);
        let sig_a = a.sign(message.as_bytes(), hash).unwrap();
        let sig_b = b.sign(message.as_bytes(), hash).unwrap();
        let (key_a, key_b) = (a.public_key(), b.public_key());

        let id = BenchmarkId::new(scheme.to_string(), hash);
        group.bench_function(id, |bench| {
            bench.iter(|| {
                key_a.verify(message.as_bytes(), &sig_a)
                    && key_b.verify(message.as_bytes(), &sig_b)
            });
        });
    }

    group.finish();
}

/// Pre-signs `count` sequential one-unit transfers so the measured loop
/// only submits.
fn signed_batch(
    engine: &VaultEngine,
    a: &VaultKeypair,
    b: &VaultKeypair,
    count: u64,
) -> Vec<TransferRequest> {
    (0..count)
        .map(|seq| {
            let intent = TransferIntent {
                amount: Amount::from_units(1),
                ..intent(seq)
            };
            let message = engine.canonical_message(&intent);
            TransferRequest {
                sender: intent.sender,
                recipient: intent.recipient,
                amount: intent.amount,
                sequence_number: seq,
                signatures: DualSignature {
                    a: a.sign(message.as_bytes(), HashAlgorithm::Sha2_256).unwrap(),
                    b: b.sign(message.as_bytes(), HashAlgorithm::Sha2_256).unwrap(),
                },
            }
        })
        .collect()
}

fn fresh_engine(store: Option<VaultDb>) -> (VaultEngine, VaultKeypair, VaultKeypair) {
    let engine = match store {
        Some(db) => VaultEngine::with_store(EngineConfig::default(), db).unwrap(),
        None => VaultEngine::new(EngineConfig::default()),
    };
    let (a, b) = (VaultKeypair::generate(), VaultKeypair::generate());
    let TransferIntent { sender, recipient, .. } = intent(0);
    engine
        .setup(sender, a.public_key().as_bytes(), b.public_key().as_bytes())
        .unwrap();
    engine
        .setup(
            recipient,
            VaultKeypair::generate().public_key().as_bytes(),
            VaultKeypair::generate().public_key().as_bytes(),
        )
        .unwrap();
    engine.deposit(sender, Amount::from_units(u64::MAX / 2)).unwrap();
    (engine, a, b)
}

fn bench_transfer_commit(c: &mut Criterion) {
    let mut group = c.benchmark_group("vault/transfer_commit");
    const BATCH: u64 = 100;
    group.throughput(Throughput::Elements(BATCH));

    group.bench_function("in_memory", |bench| {
        bench.iter_batched(
            || {
                let (engine, a, b) = fresh_engine(None);
                let batch = signed_batch(&engine, &a, &b, BATCH);
                (engine, batch)
            },
            |(engine, batch)| {
                for request in &batch {
                    engine.transfer(request).unwrap();
                }
            },
            criterion::BatchSize::LargeInput,
        );
    });

    group.bench_function("sled_temporary", |bench| {
        bench.iter_batched(
            || {
                let db = VaultDb::open_temporary().unwrap();
                let (engine, a, b) = fresh_engine(Some(db));
                let batch = signed_batch(&engine, &a, &b, BATCH);
                (engine, batch)
            },
            |(engine, batch)| {
                for request in &batch {
                    engine.transfer(request).unwrap();
                }
            },
            criterion::BatchSize::LargeInput,
        );
    });

    group.finish();
}

criterion_group!(
    benches,
    bench_canonical_message,
    bench_verify_pair,
    bench_transfer_commit,
);
criterion_main!(benches);
