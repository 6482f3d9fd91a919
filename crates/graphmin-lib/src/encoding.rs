//! DNA nucleotide encoding
//!
//! This module implements the 2-bit encoding scheme for DNA nucleotides:
//!
//! - A (65/97)  -> 0
//! - C (67/99)  -> 1
//! - G (71/103) -> 2
//! - T (84/116) -> 3
//!
//! The complement of a packed base is `3 - base`, so reverse complements
//! can be computed without a table. Any byte outside {A,C,G,T} (case
//! insensitive) is invalid; during streaming extraction an invalid byte
//! resets the kmer accumulator rather than raising an error.

use thiserror::Error;

/// Error type for encoding operations
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EncodingError {
    /// The input byte is not a valid DNA base (A/C/G/T)
    #[error("Invalid DNA base: {0:?}")]
    InvalidBase(u8),
    /// The input sequence is empty or longer than the key can hold
    #[error("Kmer length {0} out of range (1 to {max})", max = crate::constants::KMER_MAX_LENGTH)]
    LengthOutOfRange(usize),
}

/// Encode a single DNA nucleotide to 2 bits.
///
/// Returns `None` for bytes outside {A,C,G,T} (case insensitive).
#[inline]
pub const fn encode_base(base: u8) -> Option<u8> {
    match base {
        b'A' | b'a' => Some(0),
        b'C' | b'c' => Some(1),
        b'G' | b'g' => Some(2),
        b'T' | b't' => Some(3),
        _ => None,
    }
}

/// Decode a 2-bit value to a DNA nucleotide (uppercase).
#[inline]
pub const fn decode_base(bits: u8) -> u8 {
    match bits & 0b11 {
        0 => b'A',
        1 => b'C',
        2 => b'G',
        _ => b'T',
    }
}

/// Get the complement of an encoded DNA base.
#[inline]
pub const fn complement_base(bits: u8) -> u8 {
    3 - (bits & 0b11)
}

/// Reverse complement of a byte sequence.
///
/// Invalid bytes are passed through unchanged, so a sequence with embedded
/// gap characters keeps its shape under double reversal.
pub fn reverse_complement(sequence: &[u8]) -> Vec<u8> {
    sequence
        .iter()
        .rev()
        .map(|&c| match encode_base(c) {
            Some(bits) => decode_base(complement_base(bits)),
            None => c,
        })
        .collect()
}
