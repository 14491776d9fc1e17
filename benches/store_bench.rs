// Benchmark core store operations: bulk insert, degree lookup, dedup passes.

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};

use hypergraph_core::store::Hypergraph;
use hypergraph_core::types::Provenance;

fn star_graph(leaves: usize) -> Hypergraph {
    let mut g = Hypergraph::new();
    for i in 0..leaves {
        let leaf = format!("leaf_{i}");
        g.add_edge(&["hub"], "link", &[&leaf], Provenance::default(), 1.0);
    }
    g
}

fn bench_bulk_insert_edges(c: &mut Criterion) {
    let mut group = c.benchmark_group("store_insert_edges");
    for count in [100, 1_000, 5_000] {
        group.bench_with_input(BenchmarkId::new("count", count), &count, |b, &n| {
            b.iter(|| {
                let mut g = Hypergraph::new();
                for i in 0..n {
                    let leaf = format!("leaf_{i}");
                    g.add_edge(&["hub"], "link", &[&leaf], Provenance::default(), 1.0);
                }
                g
            });
        });
    }
    group.finish();
}

fn bench_degree_lookup(c: &mut Criterion) {
    let g = star_graph(5_000);
    let hub = hypergraph_core::normalize::normalize_id("hub");
    c.bench_function("store_degree_lookup", |b| {
        b.iter(|| g.degree(&hub));
    });
}

fn bench_merge_duplicate_edges(c: &mut Criterion) {
    c.bench_function("store_merge_duplicate_edges", |b| {
        b.iter_batched(
            || {
                let mut g = Hypergraph::new();
                for _ in 0..2_000 {
                    g.add_edge(&["a"], "r", &["b"], Provenance::default(), 1.0);
                }
                g
            },
            |mut g| g.merge_duplicate_edges(),
            criterion::BatchSize::LargeInput,
        );
    });
}

criterion_group!(benches, bench_bulk_insert_edges, bench_degree_lookup, bench_merge_duplicate_edges);
criterion_main!(benches);
