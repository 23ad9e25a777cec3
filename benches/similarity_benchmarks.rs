use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use orggraph::graph::{similarity, GraphStore, PropertyMap};
use orggraph::{NodeLabel, SimilarityBasis};

/// `size` companies spread over 50 categories and 10 sectors
fn populated_store(size: usize) -> GraphStore {
    let mut store = GraphStore::new();
    for i in 0..size {
        let company = store
            .merge_node(NodeLabel::Company, &format!("Company{}", i))
            .unwrap();
        let category = store
            .merge_node(NodeLabel::ProductCategory, &format!("Category{}", i % 50))
            .unwrap();
        store
            .merge_edge(company, category, "OFFERS", PropertyMap::new())
            .unwrap();
        if let Some(node) = store.get_node_mut(company) {
            node.set_property("sector", format!("Sector{}", i % 10));
        }
    }
    store
}

/// Benchmark natural-key merges, half of them hitting existing nodes
fn bench_merge_node(c: &mut Criterion) {
    let mut group = c.benchmark_group("merge_node");

    for size in [100, 1000, 10_000].iter() {
        group.bench_with_input(BenchmarkId::from_parameter(size), size, |b, &size| {
            b.iter(|| {
                let mut store = GraphStore::new();
                for i in 0..size {
                    store
                        .merge_node(NodeLabel::Company, &format!("Company{}", i % (size / 2)))
                        .unwrap();
                }
            });
        });
    }
    group.finish();
}

/// Benchmark a full prune + derive pass per basis
fn bench_derive_similarity(c: &mut Criterion) {
    let mut group = c.benchmark_group("derive_similarity");

    for size in [100, 500, 1000].iter() {
        for basis in SimilarityBasis::ALL {
            let id = BenchmarkId::new(basis.as_str(), size);
            group.bench_with_input(id, size, |b, &size| {
                let mut store = populated_store(size);
                b.iter(|| {
                    similarity::prune_similar(&mut store, basis).unwrap();
                    similarity::derive_similar(&mut store, basis).unwrap();
                });
            });
        }
    }
    group.finish();
}

criterion_group!(benches, bench_merge_node, bench_derive_similarity);
criterion_main!(benches);
