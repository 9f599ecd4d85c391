use std::collections::BTreeSet;
use std::sync::atomic::Ordering;
use std::sync::{Arc, Once};

use hugegraph::import::CounterProgress;
use hugegraph::source::{MemorySourceBuilder, PropValue};
use hugegraph::types::{PropId, TypeId};
use hugegraph::{
    Dir, GraphFactory, HugeGraph, IdMap, ImportOptions, LoadDirection, MemorySource, Result,
};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use tracing_subscriber::EnvFilter;

const WEIGHT: PropId = PropId(1);
const NUM_THREADS: usize = 8;
const DIRECTIONS: [LoadDirection; 4] = [
    LoadDirection::Outgoing,
    LoadDirection::Incoming,
    LoadDirection::Both,
    LoadDirection::Undirected,
];

fn init_tracing() {
    static INIT: Once = Once::new();
    INIT.call_once(|| {
        let filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new("hugegraph=debug"));
        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .with_ansi(false)
            .try_init();
    });
}

fn random_graph(seed: u64, nodes: u64, edges: usize) -> (MemorySource, Vec<(u64, u64)>) {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let mut builder = MemorySourceBuilder::new();
    for node in 0..nodes {
        builder.add_node(node);
    }
    let mut pairs = Vec::with_capacity(edges);
    for _ in 0..edges {
        let start = rng.gen_range(0..nodes);
        let end = rng.gen_range(0..nodes);
        let weight = PropValue::Float(rng.gen_range(0..4) as f64);
        builder.add_relationship(start, end, TypeId(0), vec![(WEIGHT, weight)]);
        pairs.push((start, end));
    }
    (builder.build(), pairs)
}

fn options(direction: LoadDirection, workers: usize) -> ImportOptions {
    ImportOptions::new()
        .concurrency(workers)
        .direction(direction)
        .weight(WEIGHT, 1.0)
        .page_shifts(4, 3)
}

fn import(source: &MemorySource, nodes: u64, options: ImportOptions) -> Result<HugeGraph> {
    GraphFactory::new(source, options).build(IdMap::from_original_ids(0..nodes))
}

fn snapshot(graph: &HugeGraph, dir: Dir) -> Vec<Vec<(u64, f64)>> {
    (0..graph.node_count())
        .map(|node| {
            let mut entries = Vec::new();
            graph.for_each_relationship(node, dir, |target, weight| entries.push((target, weight)));
            entries
        })
        .collect()
}

#[test]
fn worker_count_does_not_change_the_graph() -> Result<()> {
    init_tracing();
    let nodes = 300;
    let (source, _) = random_graph(0x5eed, nodes, 4_000);
    for direction in DIRECTIONS {
        let single = import(&source, nodes, options(direction, 1))?;
        let parallel = import(&source, nodes, options(direction, NUM_THREADS))?;
        for dir in [Dir::Out, Dir::In, Dir::Both] {
            assert_eq!(
                snapshot(&single, dir),
                snapshot(&parallel, dir),
                "{direction:?} {dir:?}"
            );
        }
        assert_eq!(single.weights().len(), parallel.weights().len());
    }
    Ok(())
}

#[test]
fn random_graph_matches_reference_adjacency() -> Result<()> {
    let nodes = 200;
    let (source, pairs) = random_graph(42, nodes, 3_000);
    let mut out = vec![BTreeSet::new(); nodes as usize];
    let mut inc = vec![BTreeSet::new(); nodes as usize];
    for &(start, end) in &pairs {
        out[start as usize].insert(end);
        inc[end as usize].insert(start);
    }

    let graph = import(&source, nodes, options(LoadDirection::Both, NUM_THREADS))?;
    let merged = import(&source, nodes, options(LoadDirection::Undirected, NUM_THREADS))?;
    for node in 0..nodes {
        let expected_out: Vec<u64> = out[node as usize].iter().copied().collect();
        let expected_in: Vec<u64> = inc[node as usize].iter().copied().collect();
        let expected_merged: Vec<u64> = out[node as usize]
            .union(&inc[node as usize])
            .copied()
            .collect();
        assert_eq!(graph.neighbors(node, Dir::Out).collect::<Vec<_>>(), expected_out);
        assert_eq!(graph.neighbors(node, Dir::In).collect::<Vec<_>>(), expected_in);
        assert_eq!(
            merged.neighbors(node, Dir::Both).collect::<Vec<_>>(),
            expected_merged
        );
        assert_eq!(merged.degree(node, Dir::Out), expected_merged.len());
    }
    Ok(())
}

#[test]
fn complete_graph_imports_every_pair() -> Result<()> {
    let nodes = 50u64;
    let mut builder = MemorySource::builder();
    for start in 0..nodes {
        for end in 0..nodes {
            if start != end {
                builder.add_relationship(start, end, TypeId(0), Vec::new());
            }
        }
    }
    let source = builder.build();
    let progress = Arc::new(CounterProgress::default());
    let graph = GraphFactory::new(&source, options(LoadDirection::Both, NUM_THREADS))
        .with_progress(progress.clone())
        .build(IdMap::from_original_ids(0..nodes))?;

    for node in 0..nodes {
        let expected: Vec<u64> = (0..nodes).filter(|&other| other != node).collect();
        assert_eq!(graph.neighbors(node, Dir::Out).collect::<Vec<_>>(), expected);
        assert_eq!(graph.neighbors(node, Dir::In).collect::<Vec<_>>(), expected);
    }
    assert_eq!(
        progress.relationships.load(Ordering::Relaxed),
        2 * nodes * (nodes - 1)
    );
    assert_eq!(progress.nodes.load(Ordering::Relaxed), nodes);
    Ok(())
}

#[test]
fn conflicting_undirected_weights_resolve_deterministically() -> Result<()> {
    init_tracing();
    let mut builder = MemorySource::builder();
    for round in 0..20 {
        builder.add_relationship(0, 1, TypeId(0), vec![(WEIGHT, PropValue::Int(round))]);
        builder.add_relationship(1, 0, TypeId(0), vec![(WEIGHT, PropValue::Int(100 + round))]);
    }
    let source = builder.build();

    let expected = import(&source, 2, options(LoadDirection::Undirected, 1))?.weight(0, 1);
    // node 0 scans incoming (1 -> 0) before outgoing (0 -> 1), so the last outgoing value wins
    assert_eq!(expected, 19.0);
    for _ in 0..16 {
        let graph = import(&source, 2, options(LoadDirection::Undirected, NUM_THREADS))?;
        assert_eq!(graph.weight(0, 1), expected);
        assert_eq!(graph.weight(1, 0), expected);
        assert_eq!(graph.weights().len(), 1);
    }
    Ok(())
}

#[test]
fn records_spanning_pages_decode_intact() -> Result<()> {
    // the hub record is far longer than one 8-byte page
    let mut builder = MemorySource::builder();
    let spokes: Vec<u64> = (1..=64).map(|i| i * 997).collect();
    for &spoke in &spokes {
        builder.add_relationship(0, spoke, TypeId(0), Vec::new());
    }
    let source = builder.build();
    let id_map = IdMap::from_original_ids(std::iter::once(0).chain(spokes.iter().rev().copied()));
    let options = ImportOptions::new()
        .concurrency(4)
        .direction(LoadDirection::Undirected)
        .page_shifts(3, 3);
    let graph = GraphFactory::new(&source, options).build(id_map)?;

    let hub: Vec<u64> = graph.neighbors(0, Dir::Both).collect();
    assert_eq!(hub, (1..=64).collect::<Vec<u64>>());
    let originals: BTreeSet<u64> = hub.iter().map(|&n| graph.to_original(n)).collect();
    assert_eq!(originals, spokes.iter().copied().collect());
    for spoke in 1..=64 {
        assert_eq!(graph.neighbors(spoke, Dir::Both).collect::<Vec<_>>(), vec![0]);
    }
    Ok(())
}
