use criterion::{criterion_group, criterion_main, Criterion};
use cc_core::ChunkId;
use cc_storage::{VectorEntry, VectorEntryMeta, VectorFilters, VectorStore};

/// Cosine k-NN over 50K vectors at 384 dimensions.
fn bench_vector_knn(c: &mut Criterion) {
    let dimension = 384;
    let num_vectors = 50_000;

    let mut store = VectorStore::new(dimension).unwrap();

    let entries: Vec<VectorEntry> = (0..num_vectors)
        .map(|i| {
            let vector: Vec<f32> = (0..dimension)
                .map(|d| ((i * 7 + d * 13) as f32).sin())
                .collect();
            VectorEntry {
                meta: VectorEntryMeta {
                    chunk_id: ChunkId::new_random(),
                    relative_path: format!("src/mod_{}.service.ts", i / 100),
                    framework: Some("nestjs".to_string()),
                    component_type: Some("service".to_string()),
                    layer: Some("backend".to_string()),
                    language: Some("typescript".to_string()),
                },
                vector,
            }
        })
        .collect();
    store.upsert(entries).unwrap();

    let query: Vec<f32> = (0..dimension).map(|d| ((42 * 7 + d * 13) as f32).sin()).collect();

    let mut group = c.benchmark_group("vector_knn");
    group.bench_function("cosine_knn_k10_50k_384d", |b| {
        b.iter(|| {
            let _ = store.cosine_knn(&query, 10, &VectorFilters::default());
        });
    });
    group.bench_function("cosine_knn_k50_50k_384d", |b| {
        b.iter(|| {
            let _ = store.cosine_knn(&query, 50, &VectorFilters::default());
        });
    });
    group.finish();
}

criterion_group!(benches, bench_vector_knn);
criterion_main!(benches);
