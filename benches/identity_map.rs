//! Performance benchmarks for the identity map and hydration paths
//!
//! Measures:
//! - Raw registry registration and lookup
//! - Cold finds (full hydrate chain) versus warm finds (registry hit)
//! - Lazy children iteration
//!
//! Run with: cargo bench

use criterion::{black_box, criterion_group, criterion_main, BatchSize, Criterion};
use document_manager::{
    config::DocumentManagerConfig,
    document::Document,
    manager::DocumentManager,
    metadata::{Behavior, DocumentMapping, FieldMapping},
    options::Options,
    registry::DocumentRegistry,
    storage::{MemorySession, Node, Session},
};
use std::sync::Arc;

const PAGES: usize = 200;

fn config() -> DocumentManagerConfig {
    DocumentManagerConfig::default().with_mapping(
        DocumentMapping::new("page", "PageDocument", "sulu:page")
            .with_behaviors([Behavior::Uuid, Behavior::Parent, Behavior::Children, Behavior::AutoName])
            .with_field("title", FieldMapping::default()),
    )
}

/// A flushed manager with `PAGES` pages below `/cmf/bench`.
fn setup_manager() -> DocumentManager {
    let manager = DocumentManager::new(Arc::new(MemorySession::new()), config()).unwrap();
    for idx in 0..PAGES {
        let page = manager.create("page").unwrap();
        page.set("title", format!("Page {idx}")).unwrap();
        manager
            .persist(
                &page,
                "en",
                Options::default()
                    .with_parent_path("/cmf/bench")
                    .with_auto_create(true),
            )
            .unwrap();
    }
    manager.flush().unwrap();
    manager.clear().unwrap();
    manager
}

fn bench_registry(c: &mut Criterion) {
    let session: Arc<dyn Session> = Arc::new(MemorySession::new());
    let root = Node::new(session.clone(), session.root_identifier());
    let nodes: Vec<Node> = (0..PAGES)
        .map(|idx| root.add_node(&format!("node-{idx}")).unwrap())
        .collect();

    c.bench_function("registry_register_and_lookup", |b| {
        b.iter_batched(
            || {
                nodes
                    .iter()
                    .map(|node| (Document::new("PageDocument"), node.clone()))
                    .collect::<Vec<_>>()
            },
            |pairs| {
                let mut registry = DocumentRegistry::new();
                for (document, node) in pairs.iter() {
                    registry.register_document(document, node, "en");
                }
                for (document, node) in pairs.iter() {
                    black_box(registry.get_document_for_node(node).unwrap());
                    black_box(registry.get_node_for_document(document).unwrap());
                }
            },
            BatchSize::SmallInput,
        )
    });
}

fn bench_finds(c: &mut Criterion) {
    let manager = setup_manager();

    c.bench_function("find_cold", |b| {
        b.iter(|| {
            manager.clear().unwrap();
            black_box(
                manager
                    .find("/cmf/bench/page-100", "en", Options::default())
                    .unwrap(),
            )
        })
    });

    manager.find("/cmf/bench/page-100", "en", Options::default()).unwrap();
    c.bench_function("find_warm", |b| {
        b.iter(|| {
            black_box(
                manager
                    .find("/cmf/bench/page-100", "en", Options::default())
                    .unwrap(),
            )
        })
    });
}

fn bench_children(c: &mut Criterion) {
    let manager = setup_manager();

    c.bench_function("iterate_children_lazily", |b| {
        b.iter(|| {
            manager.clear().unwrap();
            let bench = manager.find("/cmf/bench", "en", Options::default()).unwrap();
            let children = manager
                .inspector()
                .get_children(&bench, &Options::default())
                .unwrap();
            black_box(children.to_vec().unwrap().len())
        })
    });
}

// Benchmark group configuration
criterion_group! {
    name = benches;
    config = Criterion::default()
        .sample_size(50)
        .measurement_time(std::time::Duration::from_secs(5));
    targets =
        bench_registry,
        bench_finds,
        bench_children
}

criterion_main!(benches);
