//! Path cover construction tests

use graphmin_lib::{
    path_cover, Handle, HandleGraph, PathCoverError, PathIndexBuilder, PathName, VectorGraph,
};
use std::collections::HashMap;

/// A path-index builder that records everything it is given.
#[derive(Default)]
struct RecordingBuilder {
    paths: Vec<Vec<u64>>,
    bidirectional: Vec<bool>,
    names: Vec<PathName>,
    metadata_added: bool,
    finished: bool,
    samples: Option<usize>,
    contigs: Option<usize>,
    haplotypes: Option<usize>,
}

impl PathIndexBuilder for RecordingBuilder {
    fn insert(&mut self, path: &[u64], bidirectional: bool) {
        assert!(!self.finished, "insert after finish");
        self.paths.push(path.to_vec());
        self.bidirectional.push(bidirectional);
    }

    fn add_metadata(&mut self) {
        self.metadata_added = true;
    }

    fn add_path(&mut self, name: PathName) {
        self.names.push(name);
    }

    fn set_samples(&mut self, samples: usize) {
        self.samples = Some(samples);
    }

    fn set_contigs(&mut self, contigs: usize) {
        self.contigs = Some(contigs);
    }

    fn set_haplotypes(&mut self, haplotypes: usize) {
        self.haplotypes = Some(haplotypes);
    }

    fn finish(&mut self) {
        self.finished = true;
    }
}

impl RecordingBuilder {
    fn node_coverage(&self) -> HashMap<u64, usize> {
        let mut coverage = HashMap::new();
        for path in &self.paths {
            for &packed in path {
                *coverage.entry(Handle::from_packed(packed).id()).or_insert(0) += 1;
            }
        }
        coverage
    }
}

fn chain(len: u64) -> VectorGraph {
    let mut graph = VectorGraph::new();
    for id in 1..len {
        graph.add_edge(Handle::forward(id), Handle::forward(id + 1));
    }
    graph
}

fn is_edge<G: HandleGraph>(graph: &G, from: Handle, to: Handle) -> bool {
    let mut found = false;
    graph.follow_edges(from, false, |next| {
        if next == to {
            found = true;
        }
    });
    found
}

fn assert_valid_walks<G: HandleGraph>(graph: &G, builder: &RecordingBuilder) {
    for path in &builder.paths {
        for pair in path.windows(2) {
            let from = Handle::from_packed(pair[0]);
            let to = Handle::from_packed(pair[1]);
            assert!(is_edge(graph, from, to), "{:?} -> {:?} is not an edge", from, to);
        }
    }
}

//-----------------------------------------------------------------------------

#[test]
fn linear_chain_cover() {
    let graph = chain(5);
    let mut builder = RecordingBuilder::default();
    path_cover(&graph, &mut builder, 2, 2, None).unwrap();

    // Both paths walk the whole chain forward.
    let expected: Vec<u64> = (1..=5).map(|id| Handle::forward(id).packed()).collect();
    assert_eq!(builder.paths, vec![expected.clone(), expected]);
    assert!(builder.bidirectional.iter().all(|&flag| flag));

    // Every node is covered exactly twice.
    let coverage = builder.node_coverage();
    for id in 1..=5 {
        assert_eq!(coverage.get(&id), Some(&2), "wrong coverage for node {}", id);
    }

    assert!(builder.metadata_added);
    assert!(builder.finished);
    assert_eq!(builder.samples, Some(2));
    assert_eq!(builder.contigs, Some(1));
    assert_eq!(builder.haplotypes, Some(2));
    assert_eq!(
        builder.names,
        vec![
            PathName { sample: 0, contig: 0, phase: 0, count: 0 },
            PathName { sample: 1, contig: 0, phase: 0, count: 0 },
        ]
    );
}

#[test]
fn diamond_alternates_branches() {
    // 1 -> {2, 3} -> 4: the second path takes the uncovered branch.
    let mut graph = VectorGraph::new();
    graph.add_edge(Handle::forward(1), Handle::forward(2));
    graph.add_edge(Handle::forward(1), Handle::forward(3));
    graph.add_edge(Handle::forward(2), Handle::forward(4));
    graph.add_edge(Handle::forward(3), Handle::forward(4));

    let mut builder = RecordingBuilder::default();
    path_cover(&graph, &mut builder, 2, 3, None).unwrap();

    let first: Vec<u64> = [1, 2, 4].iter().map(|&id| Handle::forward(id).packed()).collect();
    let second: Vec<u64> = [1, 3, 4].iter().map(|&id| Handle::forward(id).packed()).collect();
    assert_eq!(builder.paths, vec![first, second]);
    assert_valid_walks(&graph, &builder);

    let coverage = builder.node_coverage();
    for id in 1..=4 {
        assert!(coverage.get(&id).copied().unwrap_or(0) >= 1, "node {} left uncovered", id);
    }
}

#[test]
fn multiple_components() {
    let mut graph = chain(3);
    graph.add_edge(Handle::forward(10), Handle::forward(11));

    let mut builder = RecordingBuilder::default();
    path_cover(&graph, &mut builder, 3, 2, None).unwrap();

    assert_eq!(builder.paths.len(), 6);
    assert_eq!(builder.contigs, Some(2));
    assert_eq!(builder.samples, Some(3));
    assert_eq!(builder.haplotypes, Some(3));
    assert_valid_walks(&graph, &builder);

    // Path names number samples within each contig.
    let contig_of: Vec<u64> = builder.names.iter().map(|name| name.contig).collect();
    assert_eq!(contig_of, vec![0, 0, 0, 1, 1, 1]);
    let sample_of: Vec<u64> = builder.names.iter().map(|name| name.sample).collect();
    assert_eq!(sample_of, vec![0, 1, 2, 0, 1, 2]);
}

#[test]
fn cycle_cover_spans_component() {
    // 1 -> 2 -> 3 -> 1: a path can reach every node even without a source.
    let mut graph = VectorGraph::new();
    graph.add_edge(Handle::forward(1), Handle::forward(2));
    graph.add_edge(Handle::forward(2), Handle::forward(3));
    graph.add_edge(Handle::forward(3), Handle::forward(1));

    let mut builder = RecordingBuilder::default();
    path_cover(&graph, &mut builder, 2, 2, None).unwrap();

    assert_eq!(builder.paths.len(), 2);
    for path in &builder.paths {
        assert_eq!(path.len(), 3, "path does not span the cycle");
    }
    assert_valid_walks(&graph, &builder);
}

#[test]
fn window_length_too_short() {
    let graph = chain(5);
    let mut builder = RecordingBuilder::default();
    let result = path_cover(&graph, &mut builder, 2, 1, None);
    assert_eq!(result, Err(PathCoverError::WindowLength(1)));

    // The builder is left untouched.
    assert!(!builder.metadata_added);
    assert!(!builder.finished);
    assert!(builder.paths.is_empty());
}

#[test]
fn trivial_inputs() {
    // An empty graph and a zero path count succeed without output.
    let mut builder = RecordingBuilder::default();
    path_cover(&VectorGraph::new(), &mut builder, 2, 2, None).unwrap();
    assert!(!builder.finished);
    assert!(builder.paths.is_empty());

    let graph = chain(5);
    path_cover(&graph, &mut builder, 0, 2, None).unwrap();
    assert!(!builder.finished);
    assert!(builder.paths.is_empty());
}

#[test]
fn cancellation_at_component_boundary() {
    let mut graph = chain(3);
    graph.add_edge(Handle::forward(10), Handle::forward(11));

    let mut builder = RecordingBuilder::default();
    let mut seen = Vec::new();
    let mut progress = |component: usize, total: usize| {
        seen.push((component, total));
        component == 0
    };
    path_cover(&graph, &mut builder, 2, 2, Some(&mut progress)).unwrap();

    // Only the first component was covered, and the builder was finished.
    assert_eq!(seen, vec![(0, 2), (1, 2)]);
    assert_eq!(builder.paths.len(), 2);
    assert_eq!(builder.contigs, Some(1));
    assert!(builder.finished);
}

#[test]
fn coverage_stays_balanced_on_a_chain() {
    let graph = chain(8);
    let mut builder = RecordingBuilder::default();
    path_cover(&graph, &mut builder, 4, 3, None).unwrap();

    let coverage = builder.node_coverage();
    let max = coverage.values().copied().max().unwrap_or(0);
    let min = coverage.values().copied().min().unwrap_or(0);
    assert_eq!(coverage.len(), 8, "some node was never covered");
    assert!(max - min <= 1, "coverage spread {}..{} is not uniform", min, max);
    assert_valid_walks(&graph, &builder);
}
