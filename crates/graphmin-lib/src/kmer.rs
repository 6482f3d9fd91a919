//! Packed kmer keys
//!
//! A [`Key64`] packs up to 31 bases into a `u64`, two bits per base
//! (A=0, C=1, G=2, T=3). The all-ones value is reserved as the
//! missing-key sentinel, which is why the capacity is 31 bases rather
//! than 32.
//!
//! During sequence streaming a key is built incrementally: [`Key64::forward`]
//! appends a base at the low end, while [`Key64::reverse`] maintains the
//! reverse complement of the same window in a companion key by inserting
//! the complemented base at the high end. An invalid byte clears both
//! accumulators, so a kmer is usable only once `k` consecutive valid bases
//! have been seen.

use crate::constants::{is_valid_k, kmer_mask, PACK_MASK, PACK_WIDTH};
use crate::encoding::{decode_base, encode_base, EncodingError};
use crate::hasher::wang_hash_64;
use std::fmt;

/// A 2-bit packed kmer of up to [`KMER_MAX_LENGTH`](crate::constants::KMER_MAX_LENGTH) bases.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Key64(u64);

impl Key64 {
    /// Sentinel for a missing or invalid key.
    #[inline]
    pub const fn no_key() -> Self {
        Key64(u64::MAX)
    }

    /// Create a key from its packed representation.
    #[inline]
    pub const fn from_packed(packed: u64) -> Self {
        Key64(packed)
    }

    /// The packed representation.
    #[inline]
    pub const fn packed(self) -> u64 {
        self.0
    }

    /// Hash of the packed representation; also the minimizer comparison order.
    #[inline]
    pub const fn hash(self) -> u64 {
        wang_hash_64(self.0)
    }

    /// Append a base at the low end of a forward-strand accumulator.
    ///
    /// A valid byte shifts the window left within `2 * k` bits and bumps
    /// `valid_chars`; an invalid byte clears the accumulator and the counter.
    #[inline]
    pub fn forward(&mut self, k: usize, byte: u8, valid_chars: &mut usize) {
        match encode_base(byte) {
            Some(code) => {
                self.0 = ((self.0 << PACK_WIDTH) | code as u64) & kmer_mask(k);
                *valid_chars += 1;
            }
            None => {
                self.0 = 0;
                *valid_chars = 0;
            }
        }
    }

    /// Update a reverse-complement accumulator with the same byte.
    ///
    /// The complemented base enters at the high end, so this key always
    /// holds the reverse complement of the window tracked by [`forward`].
    ///
    /// [`forward`]: Key64::forward
    #[inline]
    pub fn reverse(&mut self, k: usize, byte: u8) {
        match encode_base(byte) {
            Some(code) => {
                self.0 = (self.0 >> PACK_WIDTH)
                    | ((PACK_MASK - code as u64) << ((k - 1) * PACK_WIDTH));
            }
            None => {
                self.0 = 0;
            }
        }
    }

    /// Pack a complete sequence into a key.
    ///
    /// # Errors
    /// Fails if the sequence is empty, longer than
    /// [`KMER_MAX_LENGTH`](crate::constants::KMER_MAX_LENGTH),
    /// or contains a byte outside {A,C,G,T}.
    pub fn from_sequence(sequence: &[u8]) -> Result<Self, EncodingError> {
        if !is_valid_k(sequence.len()) {
            return Err(EncodingError::LengthOutOfRange(sequence.len()));
        }
        let mut packed = 0u64;
        for &byte in sequence {
            let code = encode_base(byte).ok_or(EncodingError::InvalidBase(byte))?;
            packed = (packed << PACK_WIDTH) | code as u64;
        }
        Ok(Key64(packed))
    }

    /// Decode the low `k` bases back into a byte sequence.
    pub fn decode(self, k: usize) -> Vec<u8> {
        assert!(is_valid_k(k), "kmer length {} out of range", k);
        let mut result = vec![0u8; k];
        for (i, slot) in result.iter_mut().rev().enumerate() {
            *slot = decode_base(((self.0 >> (i * PACK_WIDTH)) & PACK_MASK) as u8);
        }
        result
    }
}

impl fmt::Display for Key64 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#x}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::KMER_MAX_LENGTH;

    #[test]
    fn test_from_sequence() {
        // AAT: A=0, A=0, T=3
        assert_eq!(Key64::from_sequence(b"AAT").unwrap().packed(), 3);
        // TCG: T=3, C=1, G=2
        assert_eq!(Key64::from_sequence(b"TCG").unwrap().packed(), 3 * 16 + 4 + 2);
        // Case insensitive.
        assert_eq!(
            Key64::from_sequence(b"acgt").unwrap(),
            Key64::from_sequence(b"ACGT").unwrap()
        );
    }

    #[test]
    fn test_from_sequence_errors() {
        assert_eq!(
            Key64::from_sequence(b"ACGN"),
            Err(EncodingError::InvalidBase(b'N'))
        );
        assert_eq!(
            Key64::from_sequence(b""),
            Err(EncodingError::LengthOutOfRange(0))
        );
        let too_long = [b'A'; 32];
        assert_eq!(
            Key64::from_sequence(&too_long),
            Err(EncodingError::LengthOutOfRange(32))
        );
    }

    #[test]
    fn test_decode_roundtrip() {
        for seq in [&b"AAT"[..], b"TCG", b"ACGTACGT", b"TTTTTTTTTTTTTTTTTTTTTTTTTTTTTTT"] {
            let key = Key64::from_sequence(seq).unwrap();
            assert_eq!(key.decode(seq.len()), seq);
        }
    }

    #[test]
    fn test_forward_accumulator() {
        let k = 3;
        let mut key = Key64::default();
        let mut valid = 0;
        for &c in b"AAT" {
            key.forward(k, c, &mut valid);
        }
        assert_eq!(valid, 3);
        assert_eq!(key, Key64::from_sequence(b"AAT").unwrap());

        // The window slides: appending G drops the leading A.
        key.forward(k, b'G', &mut valid);
        assert_eq!(key, Key64::from_sequence(b"ATG").unwrap());
    }

    #[test]
    fn test_forward_reset_on_invalid() {
        let k = 3;
        let mut key = Key64::default();
        let mut valid = 0;
        for &c in b"AC" {
            key.forward(k, c, &mut valid);
        }
        key.forward(k, b'x', &mut valid);
        assert_eq!(valid, 0);
        assert_eq!(key.packed(), 0);
    }

    #[test]
    fn test_reverse_accumulator() {
        let k = 3;
        let mut forward = Key64::default();
        let mut reverse = Key64::default();
        let mut valid = 0;
        for &c in b"AAT" {
            forward.forward(k, c, &mut valid);
            reverse.reverse(k, c);
        }
        // Reverse complement of AAT is ATT.
        assert_eq!(reverse, Key64::from_sequence(b"ATT").unwrap());

        // Still in sync after the window slides.
        forward.forward(k, b'G', &mut valid);
        reverse.reverse(k, b'G');
        assert_eq!(forward, Key64::from_sequence(b"ATG").unwrap());
        assert_eq!(reverse, Key64::from_sequence(b"CAT").unwrap());
    }

    #[test]
    fn test_no_key_is_not_a_kmer() {
        // No 31-base kmer occupies more than 62 bits.
        let all_t = Key64::from_sequence(&[b'T'; KMER_MAX_LENGTH]).unwrap();
        assert_ne!(all_t, Key64::no_key());
        assert!(all_t.packed() < Key64::no_key().packed());
    }
}
