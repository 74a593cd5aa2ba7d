//! Benchmarks for the clustering and postprocessing stages on synthetic data.
//!
//! The dataset is generated from a fixed seed so runs are comparable.

use std::hint::black_box;

use criterion::{criterion_group, criterion_main, Criterion};
use glyphbook::{
    cluster::cluster,
    config::ClusterConfig,
    postprocess::{deduplicate, postprocess},
    test_support::random_dataset,
    Backend, Bitmap, Kernel,
};

fn bench_clustering(c: &mut Criterion) {
    let dataset = random_dataset(4096, 7);
    println!("\n=== Clustering {} x {} ===", dataset.len(), dataset.dim());

    let mut group = c.benchmark_group("cluster");
    group.sample_size(10);
    for backend in [Backend::MiniBatch, Backend::Flat] {
        let config = ClusterConfig {
            clusters: 64,
            backend,
            iterations: 5,
            seed: Some(1),
            ..ClusterConfig::default()
        };
        group.bench_function(backend.to_string(), |b| {
            b.iter(|| black_box(cluster(black_box(&dataset), &config)))
        });
    }
    group.finish();
}

fn bench_postprocess(c: &mut Criterion) {
    let dataset = random_dataset(5120, 11);
    let centroids: Vec<Bitmap> = dataset
        .rows()
        .filter_map(|row| Bitmap::from_cells(row).ok())
        .collect();
    let kernel = Kernel::gaussian();

    c.bench_function("smooth_and_dedup_5120", |b| {
        b.iter(|| black_box(postprocess(black_box(&centroids), &kernel)))
    });
    c.bench_function("dedup_only_5120", |b| {
        b.iter(|| black_box(deduplicate(black_box(centroids.iter().copied()))))
    });
}

criterion_group!(benches, bench_clustering, bench_postprocess);
criterion_main!(benches);
