// graphmin: minimizer indexing and path covers for bidirected sequence graphs
//
// A Rust implementation of canonical minimizer extraction, a
// position-valued minimizer hash table, and greedy path cover
// construction over handle graphs.

#![doc = include_str!("../README.md")]
#![warn(missing_docs)]

pub mod constants;
pub mod encoding;
pub mod hasher;
pub mod kmer;
pub mod minimizer;
pub mod position;
pub mod index;
pub mod serialization;
pub mod graph;
pub mod path_cover;

// Re-export common types at crate root
pub use graph::{weakly_connected_components, Handle, HandleGraph, VectorGraph};
pub use index::MinimizerIndex;
pub use kmer::Key64;
pub use minimizer::{Minimizer, MinimizerIter};
pub use path_cover::{
    generic_path_cover, path_cover, Coverage, PathCoverError, PathIndexBuilder, PathName,
    SimpleCoverage,
};
pub use position::{Position, NO_VALUE, OFF_BITS, OFF_MASK};
pub use serialization::FormatError;

/// Version information
pub fn version() -> (u8, u8, u8) {
    constants::VERSION
}
