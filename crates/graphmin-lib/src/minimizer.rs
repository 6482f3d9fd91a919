//! Minimizer records and sliding-window extraction
//!
//! A minimizer is the kmer with the smallest hash among the `w` consecutive
//! kmers of a window, taken in canonical orientation: each window position
//! contributes either the forward kmer or its reverse complement, whichever
//! hashes lower. [`MinimizerIter`] streams a byte sequence and lazily emits
//! one record per window, suppressing repeats when the same occurrence stays
//! minimal across several windows.
//!
//! Offsets are reported in the canonical reading direction: a forward
//! minimizer carries the offset of its first base, a reverse-complement
//! minimizer the offset of its last base (where the reverse-strand reading
//! starts). Records stream in window order; the reported offsets of
//! reverse-complement records can locally lag an orientation change, and
//! [`MinimizerIndex::minimizers`](crate::index::MinimizerIndex::minimizers)
//! restores strict offset order with a stable sort.

use crate::kmer::Key64;
use std::cmp::Ordering;
use std::collections::VecDeque;

/// A minimizer occurrence: canonical key, its hash, offset, and orientation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Minimizer {
    /// Canonical packed kmer.
    pub key: Key64,
    /// Cached hash of the key; the comparison order for window minima.
    pub hash: u64,
    /// Offset of the occurrence in the source sequence.
    pub offset: usize,
    /// True if the canonical form is the reverse complement.
    pub is_reverse: bool,
}

impl Minimizer {
    /// Create a record for a key, computing its hash.
    #[inline]
    pub fn new(key: Key64, offset: usize, is_reverse: bool) -> Self {
        Minimizer {
            key,
            hash: key.hash(),
            offset,
            is_reverse,
        }
    }
}

impl PartialOrd for Minimizer {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Minimizer {
    fn cmp(&self, other: &Self) -> Ordering {
        self.hash
            .cmp(&other.hash)
            .then_with(|| self.key.cmp(&other.key))
            .then_with(|| self.offset.cmp(&other.offset))
    }
}

/// Lazy minimizer extraction over a byte sequence.
///
/// The iterator maintains a monotone queue of window candidates ordered by
/// increasing hash, so the front is always the minimum of the current
/// window. Candidates are kept with their start offsets; the reverse-strand
/// offset adjustment happens only when a record is emitted.
pub struct MinimizerIter<'a> {
    sequence: &'a [u8],
    k: usize,
    w: usize,
    // Next byte to process.
    next_char: usize,
    // Start offset of the next kmer to complete.
    start_pos: usize,
    valid_chars: usize,
    forward_key: Key64,
    reverse_key: Key64,
    buffer: VecDeque<Minimizer>,
    // Raw (offset, is_reverse) of the last emission, for duplicate suppression.
    last: Option<(usize, bool)>,
}

impl<'a> MinimizerIter<'a> {
    /// Start extraction with kmer length `k` and window length `w` kmers.
    pub fn new(sequence: &'a [u8], k: usize, w: usize) -> Self {
        assert!(
            crate::constants::is_valid_k(k),
            "kmer length {} out of range",
            k
        );
        assert!(w >= 1, "window length must be positive");
        MinimizerIter {
            sequence,
            k,
            w,
            next_char: 0,
            start_pos: 0,
            valid_chars: 0,
            forward_key: Key64::default(),
            reverse_key: Key64::default(),
            buffer: VecDeque::new(),
            last: None,
        }
    }

    /// Window length in bases: the span of `w` consecutive kmers.
    #[inline]
    fn window_bp(&self) -> usize {
        self.k + self.w - 1
    }

    // Insert the canonical candidate for the kmer starting at start_pos,
    // keeping the queue hashes strictly increasing from front to back.
    // Equal-hash candidates are retained so the leftmost stays at the front.
    fn push_candidate(&mut self) {
        let forward_hash = self.forward_key.hash();
        let reverse_hash = self.reverse_key.hash();
        let candidate = if reverse_hash < forward_hash {
            Minimizer {
                key: self.reverse_key,
                hash: reverse_hash,
                offset: self.start_pos,
                is_reverse: true,
            }
        } else {
            Minimizer {
                key: self.forward_key,
                hash: forward_hash,
                offset: self.start_pos,
                is_reverse: false,
            }
        };
        while self
            .buffer
            .back()
            .is_some_and(|back| back.hash > candidate.hash)
        {
            self.buffer.pop_back();
        }
        self.buffer.push_back(candidate);
    }

    // Drop front candidates that have left the window ending at start_pos.
    fn evict_expired(&mut self) {
        while self
            .buffer
            .front()
            .is_some_and(|front| front.offset + self.w <= self.start_pos)
        {
            self.buffer.pop_front();
        }
    }
}

impl<'a> Iterator for MinimizerIter<'a> {
    type Item = Minimizer;

    fn next(&mut self) -> Option<Minimizer> {
        if self.sequence.len() < self.window_bp() {
            return None;
        }
        while self.next_char < self.sequence.len() {
            let byte = self.sequence[self.next_char];
            self.forward_key.forward(self.k, byte, &mut self.valid_chars);
            self.reverse_key.reverse(self.k, byte);

            self.evict_expired();
            if self.valid_chars >= self.k {
                self.push_candidate();
            }

            self.next_char += 1;
            if self.next_char >= self.k {
                self.start_pos += 1;
            }

            if self.next_char >= self.window_bp() {
                if let Some(front) = self.buffer.front().copied() {
                    if self.last != Some((front.offset, front.is_reverse)) {
                        self.last = Some((front.offset, front.is_reverse));
                        let offset = if front.is_reverse {
                            front.offset + self.k - 1
                        } else {
                            front.offset
                        };
                        return Some(Minimizer { offset, ..front });
                    }
                }
            }
        }
        None
    }
}

/// The single smallest minimizer of a sequence, at its leftmost occurrence.
///
/// Returns `None` if the sequence contains no complete kmer of `k` valid
/// bases.
pub fn single_minimizer(sequence: &[u8], k: usize) -> Option<Minimizer> {
    assert!(
        crate::constants::is_valid_k(k),
        "kmer length {} out of range",
        k
    );
    let mut forward_key = Key64::default();
    let mut reverse_key = Key64::default();
    let mut valid_chars = 0;
    let mut best: Option<Minimizer> = None;
    for (i, &byte) in sequence.iter().enumerate() {
        forward_key.forward(k, byte, &mut valid_chars);
        reverse_key.reverse(k, byte);
        if valid_chars < k {
            continue;
        }
        let offset = i + 1 - k;
        let forward_hash = forward_key.hash();
        let reverse_hash = reverse_key.hash();
        let candidate = if reverse_hash < forward_hash {
            Minimizer {
                key: reverse_key,
                hash: reverse_hash,
                offset,
                is_reverse: true,
            }
        } else {
            Minimizer {
                key: forward_key,
                hash: forward_hash,
                offset,
                is_reverse: false,
            }
        };
        // Strict comparison keeps the leftmost occurrence on ties.
        if best.as_ref().map_or(true, |b| candidate.hash < b.hash) {
            best = Some(candidate);
        }
    }
    best.map(|m| {
        if m.is_reverse {
            Minimizer {
                offset: m.offset + k - 1,
                ..m
            }
        } else {
            m
        }
    })
}
