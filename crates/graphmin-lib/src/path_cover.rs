//! Greedy path cover construction
//!
//! [`generic_path_cover`] synthesizes `n` paths through every
//! weakly-connected component of a bidirected graph, extending each path
//! from a least-covered seed so that nodes, and windows of `k` consecutive
//! nodes, are visited as uniformly as the topology allows. The paths are
//! streamed into an external path-index builder together with naming
//! metadata.
//!
//! The scoring policy is pluggable through the [`Coverage`] trait:
//! [`SimpleCoverage`] counts plain traversals, and reference-aware policies
//! can substitute their own counters without touching the walk logic.

use crate::constants::PATH_COVER_MIN_K;
use crate::graph::{weakly_connected_components, Handle, HandleGraph};
use ahash::AHashMap;
use std::cmp::Ordering;
use std::collections::VecDeque;
use thiserror::Error;
use tracing::{debug, error, info};

/// Error type for path cover construction.
///
/// On error the external builder is left untouched, so the caller holds an
/// empty path index.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PathCoverError {
    /// The window length is too short to form node windows
    #[error("window length ({0}) must be at least {PATH_COVER_MIN_K}")]
    WindowLength(usize),
    /// The graph contains a non-positive node id
    #[error("minimum node id ({0}) must be positive")]
    MinimumNodeId(u64),
}

/// Structured name of a generated path: sample, contig, phase, and count.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PathName {
    /// Sample number, one per generated path within a component.
    pub sample: u64,
    /// Contig number; one weakly-connected component per contig.
    pub contig: u64,
    /// Phase number; always 0 for generated covers.
    pub phase: u64,
    /// Running count; always 0 for generated covers.
    pub count: u64,
}

/// The sink receiving generated paths.
///
/// This is the construction surface of an external path index. Nodes are
/// encoded as `(id << 1) | is_reverse`, the packed form of [`Handle`].
pub trait PathIndexBuilder {
    /// Insert a path of encoded oriented nodes. With `bidirectional` set,
    /// the path stands for itself and its reverse complement.
    fn insert(&mut self, path: &[u64], bidirectional: bool);

    /// Prepare the metadata section before any path is named.
    fn add_metadata(&mut self);

    /// Record the structured name of the most recently inserted path.
    fn add_path(&mut self, name: PathName);

    /// Set the number of samples in the metadata.
    fn set_samples(&mut self, samples: usize);

    /// Set the number of contigs in the metadata.
    fn set_contigs(&mut self, contigs: usize);

    /// Set the number of haplotypes in the metadata.
    fn set_haplotypes(&mut self, haplotypes: usize);

    /// Finish construction; no further insertions may follow.
    fn finish(&mut self);
}

/// Scoring policy for seed selection and path extension.
///
/// The planner keeps one `Value` per node and one per canonical window and
/// always extends toward the candidate the policy gives priority to.
pub trait Coverage {
    /// Counter carried per node and per window.
    type Value: Copy + Eq;

    /// The coverage of something never visited.
    fn no_coverage() -> Self::Value;

    /// A coverage no candidate can have; loses against every real value.
    fn worst_coverage() -> Self::Value;

    /// Should a candidate with coverage `a` be chosen over one with `b`?
    fn give_priority(a: &Self::Value, b: &Self::Value) -> bool;

    /// Account for one more traversal.
    fn increase_coverage(value: &mut Self::Value);

    /// Index of node `id` in an array sorted by node id.
    ///
    /// # Panics
    /// Panics if `id` is not present; the planner only queries nodes of the
    /// component it is covering.
    fn find_first(array: &[(u64, Self::Value)], id: u64) -> usize {
        match array.binary_search_by_key(&id, |entry| entry.0) {
            Ok(at) => at,
            Err(_) => panic!("node {} missing from the coverage array", id),
        }
    }
}

/// Plain traversal counters: the best candidate is the least covered one.
#[derive(Debug)]
pub enum SimpleCoverage {}

impl Coverage for SimpleCoverage {
    type Value = usize;

    fn no_coverage() -> usize {
        0
    }

    fn worst_coverage() -> usize {
        usize::MAX
    }

    fn give_priority(a: &usize, b: &usize) -> bool {
        a < b
    }

    fn increase_coverage(value: &mut usize) {
        *value += 1;
    }
}

// Reverse complement of an oriented node sequence: reversed, each handle
// flipped.
fn reverse_complement_window(window: &[Handle]) -> Vec<Handle> {
    window.iter().rev().map(|handle| handle.flip()).collect()
}

// The lexicographically smaller of a window and its reverse complement,
// compared by packed handle values. A window and its reverse complement
// name the same stretch of sequence.
fn canonical_window(forward: Vec<Handle>) -> Vec<Handle> {
    let reverse = reverse_complement_window(&forward);
    if forward <= reverse {
        forward
    } else {
        reverse
    }
}

// Canonical window covering the last k-1 path nodes plus a successor.
fn forward_window(path: &VecDeque<Handle>, successor: Handle, k: usize) -> Vec<Handle> {
    let mut window: Vec<Handle> = Vec::with_capacity(k);
    window.extend(path.iter().skip(path.len() + 1 - k).copied());
    window.push(successor);
    canonical_window(window)
}

// Canonical window covering a predecessor plus the first k-1 path nodes.
fn backward_window(path: &VecDeque<Handle>, predecessor: Handle, k: usize) -> Vec<Handle> {
    let mut window: Vec<Handle> = Vec::with_capacity(k);
    window.push(predecessor);
    window.extend(path.iter().take(k - 1).copied());
    canonical_window(window)
}

fn window_coverage<C: Coverage>(
    map: &AHashMap<Vec<Handle>, C::Value>,
    window: &[Handle],
) -> C::Value {
    map.get(window).copied().unwrap_or_else(C::no_coverage)
}

/// Generate a path cover with the [`SimpleCoverage`] policy.
///
/// See [`generic_path_cover`] for the semantics.
pub fn path_cover<G: HandleGraph, B: PathIndexBuilder>(
    graph: &G,
    builder: &mut B,
    n: usize,
    k: usize,
    progress: Option<&mut dyn FnMut(usize, usize) -> bool>,
) -> Result<(), PathCoverError> {
    generic_path_cover::<SimpleCoverage, G, B>(graph, builder, n, k, progress)
}

/// Generate `n` paths per weakly-connected component of `graph`, scoring
/// extensions with the coverage policy `C`, and stream them into `builder`.
///
/// Every path starts at a node with minimal coverage (ties to the smallest
/// id) and grows in both directions, choosing the least-covered extension:
/// by node coverage while the path is shorter than `k - 1` nodes, by
/// canonical `k`-window coverage afterwards. A path stops when neither end
/// extends or the path spans its whole component.
///
/// Paths are named `(sample, contig, 0, 0)` where `contig` numbers the
/// components; after the last component the builder is finished and its
/// metadata set to `n` samples, `n` haplotypes, and one contig per
/// processed component.
///
/// The optional `progress` callback runs before each component with
/// `(component_index, component_total)`; returning `false` cancels the
/// remaining components. The builder is still finished in that case.
///
/// # Errors
/// Fails without touching the builder if `k < PATH_COVER_MIN_K` or a node
/// id is not positive. An empty graph and `n == 0` succeed trivially.
pub fn generic_path_cover<C, G, B>(
    graph: &G,
    builder: &mut B,
    n: usize,
    k: usize,
    mut progress: Option<&mut dyn FnMut(usize, usize) -> bool>,
) -> Result<(), PathCoverError>
where
    C: Coverage,
    G: HandleGraph,
    B: PathIndexBuilder,
{
    // Sanity checks.
    if graph.node_count() == 0 || n == 0 {
        return Ok(());
    }
    if k < PATH_COVER_MIN_K {
        error!(
            "path_cover: window length ({}) must be at least {}",
            k, PATH_COVER_MIN_K
        );
        return Err(PathCoverError::WindowLength(k));
    }
    let min_id = graph.min_node_id();
    if min_id < 1 {
        error!("path_cover: minimum node id ({}) must be positive", min_id);
        return Err(PathCoverError::MinimumNodeId(min_id));
    }

    let components = weakly_connected_components(graph);
    builder.add_metadata();

    let mut processed = 0;
    for (contig, component) in components.iter().enumerate() {
        if let Some(callback) = progress.as_deref_mut() {
            if !callback(contig, components.len()) {
                debug!(component = contig, "path cover cancelled");
                break;
            }
        }
        info!(
            component = contig + 1,
            total = components.len(),
            nodes = component.len(),
            "processing component"
        );
        cover_component::<C, G, B>(graph, builder, component, n, k, contig);
        processed += 1;
    }

    // Finish the construction and add basic metadata: n samples with each
    // component as a separate contig.
    builder.finish();
    builder.set_samples(n);
    builder.set_contigs(processed);
    builder.set_haplotypes(n);
    Ok(())
}

// Generate the n paths of one component and hand them to the builder.
fn cover_component<C, G, B>(
    graph: &G,
    builder: &mut B,
    component: &[u64],
    n: usize,
    k: usize,
    contig: usize,
) where
    C: Coverage,
    G: HandleGraph,
    B: PathIndexBuilder,
{
    let mut node_coverage: Vec<(u64, C::Value)> = component
        .iter()
        .map(|&id| (id, C::no_coverage()))
        .collect();
    node_coverage.sort_unstable_by_key(|entry| entry.0);
    // A window and its reverse complement share one counter.
    let mut path_coverage: AHashMap<Vec<Handle>, C::Value> = AHashMap::new();

    for sample in 0..n {
        // Seed with a least-covered node, ties to the smallest id, then
        // restore id order for binary-search lookups.
        node_coverage.sort_unstable_by(|a, b| {
            if C::give_priority(&a.1, &b.1) {
                Ordering::Less
            } else if C::give_priority(&b.1, &a.1) {
                Ordering::Greater
            } else {
                a.0.cmp(&b.0)
            }
        });
        let mut path: VecDeque<Handle> = VecDeque::new();
        path.push_back(Handle::forward(node_coverage[0].0));
        C::increase_coverage(&mut node_coverage[0].1);
        node_coverage.sort_unstable_by_key(|entry| entry.0);

        extend_path::<C, G>(graph, &mut path, &mut node_coverage, &mut path_coverage, k);

        let encoded: Vec<u64> = path.iter().map(|handle| handle.packed()).collect();
        builder.insert(&encoded, true);
        builder.add_path(PathName {
            sample: sample as u64,
            contig: contig as u64,
            phase: 0,
            count: 0,
        });
    }
}

// Grow a seeded path in both directions until neither end extends or the
// path spans the component.
fn extend_path<C, G>(
    graph: &G,
    path: &mut VecDeque<Handle>,
    node_coverage: &mut [(u64, C::Value)],
    path_coverage: &mut AHashMap<Vec<Handle>, C::Value>,
    k: usize,
) where
    C: Coverage,
    G: HandleGraph,
{
    let mut forward_success = true;
    let mut backward_success = true;
    while (forward_success || backward_success) && path.len() < node_coverage.len() {
        // Extend forward.
        forward_success = false;
        let mut best: Option<(C::Value, Handle)> = None;
        if let Some(&back) = path.back() {
            graph.follow_edges(back, false, |next| {
                forward_success = true;
                let coverage = if path.len() + 1 < k {
                    node_coverage[C::find_first(node_coverage, next.id())].1
                } else {
                    window_coverage::<C>(path_coverage, &forward_window(path, next, k))
                };
                if best
                    .as_ref()
                    .map_or(true, |(best_coverage, _)| C::give_priority(&coverage, best_coverage))
                {
                    best = Some((coverage, next));
                }
            });
        }
        if forward_success {
            if let Some((_, chosen)) = best {
                if path.len() + 1 >= k {
                    let window = forward_window(path, chosen, k);
                    C::increase_coverage(
                        path_coverage.entry(window).or_insert_with(C::no_coverage),
                    );
                }
                let at = C::find_first(node_coverage, chosen.id());
                C::increase_coverage(&mut node_coverage[at].1);
                path.push_back(chosen);
                if path.len() >= node_coverage.len() {
                    break;
                }
            }
        }

        // Extend backward.
        backward_success = false;
        let mut best: Option<(C::Value, Handle)> = None;
        if let Some(&front) = path.front() {
            graph.follow_edges(front, true, |prev| {
                backward_success = true;
                let coverage = if path.len() + 1 < k {
                    node_coverage[C::find_first(node_coverage, prev.id())].1
                } else {
                    window_coverage::<C>(path_coverage, &backward_window(path, prev, k))
                };
                if best
                    .as_ref()
                    .map_or(true, |(best_coverage, _)| C::give_priority(&coverage, best_coverage))
                {
                    best = Some((coverage, prev));
                }
            });
        }
        if backward_success {
            if let Some((_, chosen)) = best {
                if path.len() + 1 >= k {
                    let window = backward_window(path, chosen, k);
                    C::increase_coverage(
                        path_coverage.entry(window).or_insert_with(C::no_coverage),
                    );
                }
                let at = C::find_first(node_coverage, chosen.id());
                C::increase_coverage(&mut node_coverage[at].1);
                path.push_front(chosen);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reverse_complement_window() {
        let window = vec![Handle::forward(1), Handle::new(2, true), Handle::forward(3)];
        let reverse = reverse_complement_window(&window);
        assert_eq!(
            reverse,
            vec![Handle::new(3, true), Handle::forward(2), Handle::new(1, true)]
        );
        assert_eq!(reverse_complement_window(&reverse), window);
    }

    #[test]
    fn test_canonical_window_is_orientation_symmetric() {
        let window = vec![Handle::forward(5), Handle::new(2, true), Handle::forward(9)];
        let reverse = reverse_complement_window(&window);
        assert_eq!(canonical_window(window.clone()), canonical_window(reverse));
    }

    #[test]
    fn test_forward_and_backward_windows_agree() {
        // Appending x to [a, b] and prepending a to [b, x] describe the
        // same three nodes.
        let a = Handle::forward(1);
        let b = Handle::forward(2);
        let x = Handle::forward(3);
        let path_forward: VecDeque<Handle> = [a, b].into_iter().collect();
        let path_backward: VecDeque<Handle> = [b, x].into_iter().collect();
        assert_eq!(
            forward_window(&path_forward, x, 3),
            backward_window(&path_backward, a, 3)
        );
    }

    #[test]
    fn test_simple_coverage_policy() {
        assert_eq!(SimpleCoverage::no_coverage(), 0);
        assert!(SimpleCoverage::give_priority(&1, &2));
        assert!(!SimpleCoverage::give_priority(&2, &2));
        assert!(SimpleCoverage::give_priority(&0, &SimpleCoverage::worst_coverage()));
        let mut value = SimpleCoverage::no_coverage();
        SimpleCoverage::increase_coverage(&mut value);
        assert_eq!(value, 1);
    }

    #[test]
    fn test_find_first() {
        let array: Vec<(u64, usize)> = vec![(2, 0), (5, 3), (9, 1)];
        assert_eq!(SimpleCoverage::find_first(&array, 2), 0);
        assert_eq!(SimpleCoverage::find_first(&array, 5), 1);
        assert_eq!(SimpleCoverage::find_first(&array, 9), 2);
    }

    #[test]
    #[should_panic(expected = "missing from the coverage array")]
    fn test_find_first_missing_node() {
        let array: Vec<(u64, usize)> = vec![(2, 0)];
        SimpleCoverage::find_first(&array, 3);
    }
}
