//! Constants and configuration for graphmin
//!
//! This module defines compile-time constants used throughout the library:
//! kmer limits, default index parameters, hash table sizing, and path cover
//! parameters.

/// Number of bits used to pack one nucleotide.
pub const PACK_WIDTH: usize = 2;

/// Mask for a single packed nucleotide.
pub const PACK_MASK: u64 = 0b11;

/// Maximum kmer length a 64-bit key can hold.
///
/// 31 bases use 62 bits, leaving the all-ones value free to serve as the
/// missing-key sentinel.
pub const KMER_MAX_LENGTH: usize = 31;

/// Default kmer length for the minimizer index.
pub const DEFAULT_KMER_LENGTH: usize = 29;

/// Default window length (in kmers) for the minimizer index.
pub const DEFAULT_WINDOW_LENGTH: usize = 11;

/// Initial capacity of the minimizer index hash table. Must be a power of two.
pub const INITIAL_CAPACITY: usize = 1024;

/// Maximum load factor of the hash table; exceeding it triggers a rehash.
pub const MAX_LOAD_FACTOR: f64 = 0.77;

/// Minimum window length for path cover construction.
pub const PATH_COVER_MIN_K: usize = 2;

/// Default number of paths generated per graph component.
pub const PATH_COVER_DEFAULT_N: usize = 16;

/// Default window length (in nodes) for path cover construction.
pub const PATH_COVER_DEFAULT_K: usize = 4;

/// Version number
pub const VERSION: (u8, u8, u8) = (0, 1, 0);

/// Check that a kmer length can be packed into a 64-bit key.
#[inline]
pub const fn is_valid_k(k: usize) -> bool {
    k >= 1 && k <= KMER_MAX_LENGTH
}

/// Mask covering the low `2 * k` bits of a packed kmer.
#[inline]
pub const fn kmer_mask(k: usize) -> u64 {
    if k >= 32 {
        u64::MAX
    } else {
        (1u64 << (PACK_WIDTH * k)) - 1
    }
}
