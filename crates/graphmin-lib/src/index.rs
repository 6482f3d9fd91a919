//! The minimizer index
//!
//! [`MinimizerIndex`] maps canonical kmer keys to the graph positions where
//! their occurrences start. It is an open-addressing hash table with
//! power-of-two capacity and linear probing, sized so that most keys carry
//! a single position stored inline in the cell. Keys with several
//! occurrences point into an arena of sorted position lists instead; the
//! arena is addressed by index rather than by pointer, so rehashing and
//! serialization move cells without touching the lists.
//!
//! Construction is single-threaded. Once built, the index is read-only and
//! lookups may run concurrently from any number of threads.

use crate::constants::{
    is_valid_k, DEFAULT_KMER_LENGTH, DEFAULT_WINDOW_LENGTH, INITIAL_CAPACITY, MAX_LOAD_FACTOR,
};
use crate::kmer::Key64;
use crate::minimizer::{single_minimizer, Minimizer, MinimizerIter};
use crate::position::{Position, NO_VALUE, OFF_BITS};
use crate::serialization::{read_u64, write_u64, FormatError, IndexHeader};
use std::io::{self, Read, Write};
use tracing::debug;

/// One slot of the hash table.
///
/// The common case stores the single position of a key inline; a key seen
/// at several positions is promoted to a cell referencing the value-list
/// arena.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Cell {
    Empty,
    Single { key: Key64, pos: u64 },
    Multi { key: Key64, list: usize },
}

/// A hash table from canonical kmers to sets of packed graph positions.
#[derive(Clone, Debug)]
pub struct MinimizerIndex {
    k: usize,
    w: usize,
    keys: usize,
    values: usize,
    unique: usize,
    max_keys: usize,
    cells: Vec<Cell>,
    lists: Vec<Vec<u64>>,
}

impl MinimizerIndex {
    /// Create an empty index with the default parameters.
    pub fn new() -> Self {
        Self::with_parameters(DEFAULT_KMER_LENGTH, DEFAULT_WINDOW_LENGTH)
    }

    /// Create an empty index for kmer length `k` and window length `w`.
    ///
    /// # Panics
    /// Panics if `k` does not fit a 64-bit key or `w` is zero.
    pub fn with_parameters(k: usize, w: usize) -> Self {
        assert!(is_valid_k(k), "kmer length {} out of range", k);
        assert!(w >= 1, "window length must be positive");
        MinimizerIndex {
            k,
            w,
            keys: 0,
            values: 0,
            unique: 0,
            max_keys: (INITIAL_CAPACITY as f64 * MAX_LOAD_FACTOR) as usize,
            cells: vec![Cell::Empty; INITIAL_CAPACITY],
            lists: Vec::new(),
        }
    }

    /// Kmer length.
    #[inline]
    pub fn k(&self) -> usize {
        self.k
    }

    /// Window length in kmers.
    #[inline]
    pub fn w(&self) -> usize {
        self.w
    }

    /// Number of distinct keys in the index.
    #[inline]
    pub fn size(&self) -> usize {
        self.keys
    }

    /// Total number of stored positions.
    #[inline]
    pub fn values(&self) -> usize {
        self.values
    }

    /// Number of keys with exactly one position.
    #[inline]
    pub fn unique_keys(&self) -> usize {
        self.unique
    }

    /// Number of keys the table accepts before the next rehash.
    #[inline]
    pub fn max_keys(&self) -> usize {
        self.max_keys
    }

    /// Current slot count of the hash table.
    #[inline]
    pub fn capacity(&self) -> usize {
        self.cells.len()
    }

    /// All minimizers of a sequence, in non-decreasing offset order.
    pub fn minimizers(&self, sequence: &[u8]) -> Vec<Minimizer> {
        let mut result: Vec<Minimizer> = MinimizerIter::new(sequence, self.k, self.w).collect();
        // Emission order can locally disagree with reported offsets around
        // orientation changes; the stable sort keeps window order otherwise.
        result.sort_by_key(|minimizer| minimizer.offset);
        result
    }

    /// The smallest minimizer of a sequence at its leftmost occurrence, or
    /// `None` if the sequence has no complete kmer.
    pub fn minimizer(&self, sequence: &[u8]) -> Option<Minimizer> {
        single_minimizer(sequence, self.k)
    }

    /// Insert a position for a minimizer.
    ///
    /// Inserting the missing key or the missing value is a no-op, as is a
    /// duplicate `(key, position)` pair. The table rehashes automatically
    /// when the key count passes the load threshold.
    pub fn insert(&mut self, minimizer: &Minimizer, pos: Position) {
        if minimizer.key == Key64::no_key() {
            return;
        }
        let packed = pos.encode();
        if packed == NO_VALUE {
            return;
        }

        let slot = self.find_slot(minimizer.key, minimizer.hash);
        match self.cells[slot] {
            Cell::Empty => {
                self.cells[slot] = Cell::Single {
                    key: minimizer.key,
                    pos: packed,
                };
                self.keys += 1;
                self.values += 1;
                self.unique += 1;
                if self.keys > self.max_keys {
                    self.rehash();
                }
            }
            Cell::Single { pos: existing, key } => {
                if existing != packed {
                    let list = if existing < packed {
                        vec![existing, packed]
                    } else {
                        vec![packed, existing]
                    };
                    self.cells[slot] = Cell::Multi {
                        key,
                        list: self.lists.len(),
                    };
                    self.lists.push(list);
                    self.values += 1;
                    self.unique -= 1;
                }
            }
            Cell::Multi { list, .. } => {
                let values = &mut self.lists[list];
                if let Err(at) = values.binary_search(&packed) {
                    values.insert(at, packed);
                    self.values += 1;
                }
            }
        }
    }

    /// The positions associated with a minimizer, in ascending packed order.
    pub fn find(&self, minimizer: &Minimizer) -> Vec<Position> {
        if minimizer.key == Key64::no_key() {
            return Vec::new();
        }
        let slot = self.find_slot(minimizer.key, minimizer.hash);
        match &self.cells[slot] {
            Cell::Empty => Vec::new(),
            Cell::Single { pos, .. } => vec![Position::decode(*pos)],
            Cell::Multi { list, .. } => self.lists[*list]
                .iter()
                .map(|&packed| Position::decode(packed))
                .collect(),
        }
    }

    /// Exchange the contents of two indexes.
    pub fn swap(&mut self, other: &mut Self) {
        std::mem::swap(self, other);
    }

    // Probe for a key: the slot holding it, or the first empty slot on its
    // probe path. The load factor bound keeps the table from filling up.
    fn find_slot(&self, key: Key64, hash: u64) -> usize {
        let mask = self.cells.len() - 1;
        let mut slot = (hash as usize) & mask;
        loop {
            match &self.cells[slot] {
                Cell::Empty => return slot,
                Cell::Single { key: occupant, .. } | Cell::Multi { key: occupant, .. } => {
                    if *occupant == key {
                        return slot;
                    }
                }
            }
            slot = (slot + 1) & mask;
        }
    }

    // Double the capacity and re-probe every occupied cell. Value lists
    // stay in place; only the cells that reference them move.
    fn rehash(&mut self) {
        let new_capacity = self.cells.len() * 2;
        debug!(
            capacity = new_capacity,
            keys = self.keys,
            "rehashing minimizer index"
        );
        let old_cells = std::mem::replace(&mut self.cells, vec![Cell::Empty; new_capacity]);
        self.max_keys = (new_capacity as f64 * MAX_LOAD_FACTOR) as usize;
        for cell in old_cells {
            let key = match cell {
                Cell::Empty => continue,
                Cell::Single { key, .. } | Cell::Multi { key, .. } => key,
            };
            let slot = self.find_slot(key, key.hash());
            self.cells[slot] = cell;
        }
    }

    // The positions of the cell in `slot`, as packed values.
    fn cell_values(&self, slot: usize) -> &[u64] {
        match &self.cells[slot] {
            Cell::Empty => &[],
            Cell::Single { pos, .. } => std::slice::from_ref(pos),
            Cell::Multi { list, .. } => &self.lists[*list],
        }
    }

    /// Serialize to a byte sink.
    ///
    /// The layout is described in [`crate::serialization`]; all integers
    /// are little-endian.
    pub fn serialize<W: Write>(&self, writer: &mut W) -> io::Result<()> {
        let header = IndexHeader {
            k: self.k as u64,
            w: self.w as u64,
            capacity: self.cells.len() as u64,
            keys: self.keys as u64,
            values: self.values as u64,
            unique_keys: self.unique as u64,
            off_bits: OFF_BITS as u64,
        };
        header.write(writer)?;

        for cell in &self.cells {
            let (key, payload, shape) = match cell {
                Cell::Empty => (Key64::no_key(), 0u64, 0u8),
                Cell::Single { key, pos } => (*key, *pos, 1u8),
                Cell::Multi { key, list } => (*key, *list as u64, 2u8),
            };
            write_u64(writer, key.packed())?;
            write_u64(writer, payload)?;
            writer.write_all(&[shape])?;
        }

        write_u64(writer, self.lists.len() as u64)?;
        for list in &self.lists {
            write_u64(writer, list.len() as u64)?;
            for &packed in list {
                write_u64(writer, packed)?;
            }
        }
        Ok(())
    }

    /// Deserialize an index from a byte source.
    ///
    /// # Errors
    /// Fails on I/O errors, wrong magic bytes, an unsupported version, or
    /// data inconsistent with the header. No index is constructed on
    /// failure.
    pub fn deserialize<R: Read>(reader: &mut R) -> Result<Self, FormatError> {
        let header = IndexHeader::read(reader)?;
        let capacity = header.capacity as usize;
        let max_keys = (capacity as f64 * MAX_LOAD_FACTOR) as usize;
        if header.keys as usize > max_keys {
            return Err(FormatError::Corrupt("hash table over the load threshold"));
        }

        let mut cells = Vec::with_capacity(capacity);
        let mut singles = 0usize;
        let mut multis = 0usize;
        for _ in 0..capacity {
            let key = Key64::from_packed(read_u64(reader)?);
            let payload = read_u64(reader)?;
            let mut shape = [0u8; 1];
            reader.read_exact(&mut shape)?;
            let cell = match shape[0] {
                0 => Cell::Empty,
                1 => {
                    singles += 1;
                    Cell::Single { key, pos: payload }
                }
                2 => {
                    multis += 1;
                    Cell::Multi {
                        key,
                        list: payload as usize,
                    }
                }
                _ => return Err(FormatError::Corrupt("unknown cell shape")),
            };
            if !matches!(cell, Cell::Empty) && key == Key64::no_key() {
                return Err(FormatError::Corrupt("occupied cell with the missing key"));
            }
            cells.push(cell);
        }
        if singles + multis != header.keys as usize || singles != header.unique_keys as usize {
            return Err(FormatError::Corrupt("cell shapes disagree with the header"));
        }

        let list_count = read_u64(reader)? as usize;
        let mut lists = Vec::with_capacity(list_count);
        let mut total_values = singles;
        for _ in 0..list_count {
            let len = read_u64(reader)? as usize;
            if len < 2 {
                return Err(FormatError::Corrupt("multi-value list below two entries"));
            }
            let mut list = Vec::with_capacity(len);
            for _ in 0..len {
                list.push(read_u64(reader)?);
            }
            if !list.windows(2).all(|pair| pair[0] < pair[1]) {
                return Err(FormatError::Corrupt("value list not sorted"));
            }
            total_values += len;
            lists.push(list);
        }
        if total_values != header.values as usize {
            return Err(FormatError::Corrupt("value count disagrees with the header"));
        }
        for cell in &cells {
            if let Cell::Multi { list, .. } = cell {
                if *list >= lists.len() {
                    return Err(FormatError::Corrupt("value list reference out of range"));
                }
            }
        }

        Ok(MinimizerIndex {
            k: header.k as usize,
            w: header.w as usize,
            keys: header.keys as usize,
            values: header.values as usize,
            unique: header.unique_keys as usize,
            max_keys,
            cells,
            lists,
        })
    }
}

impl Default for MinimizerIndex {
    fn default() -> Self {
        Self::new()
    }
}

impl PartialEq for MinimizerIndex {
    /// Structural equality: same parameters and the same key-to-positions
    /// mapping. Capacity and slot layout are not part of identity, so an
    /// index equals a rehashed copy of itself.
    fn eq(&self, other: &Self) -> bool {
        if self.k != other.k
            || self.w != other.w
            || self.keys != other.keys
            || self.values != other.values
            || self.unique != other.unique
        {
            return false;
        }
        for (slot, cell) in self.cells.iter().enumerate() {
            let key = match cell {
                Cell::Empty => continue,
                Cell::Single { key, .. } | Cell::Multi { key, .. } => *key,
            };
            let other_slot = other.find_slot(key, key.hash());
            if self.cell_values(slot) != other.cell_values(other_slot) {
                return false;
            }
        }
        true
    }
}

impl Eq for MinimizerIndex {}
