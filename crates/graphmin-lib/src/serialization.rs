//! Byte-stream serialization support for the minimizer index
//!
//! The on-disk format uses little-endian fixed-width integers throughout,
//! so serialized indexes are portable across machines regardless of host
//! endianness.
//!
//! # File format
//!
//! ```text
//! IndexHeader
//!   ├─ magic: "GMIN" (4 bytes)
//!   ├─ version: u32
//!   ├─ k, w: u64
//!   ├─ capacity, keys, values, unique_keys: u64
//!   └─ off_bits: u64
//! Cells ([capacity] entries, in slot order):
//!   ├─ key: u64
//!   ├─ payload: u64      (packed position, or value-list index)
//!   └─ shape: u8         (0 empty, 1 singleton, 2 multi)
//! Value lists:
//!   ├─ count: u64
//!   └─ per list: length u64, then length packed positions
//! ```
//!
//! Writing the cells in slot order restores the exact probe layout on
//! load, so a deserialized index answers queries without re-probing.

use crate::position::OFF_BITS;
use std::io::{self, Read, Write};
use thiserror::Error;

/// Magic bytes identifying a serialized minimizer index.
pub const MAGIC: [u8; 4] = *b"GMIN";

/// Current file format version.
pub const FORMAT_VERSION: u32 = 1;

/// Error type for deserialization failures.
///
/// A failed load never yields a partially-built index; the target is
/// simply not constructed.
#[derive(Error, Debug)]
pub enum FormatError {
    /// Underlying I/O failure
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    /// The stream does not start with the index magic bytes
    #[error("Invalid magic bytes: expected {MAGIC:?}, found {0:?}")]
    BadMagic([u8; 4]),
    /// The format version is not supported by this build
    #[error("Unsupported format version {0} (expected {FORMAT_VERSION})")]
    UnsupportedVersion(u32),
    /// Structural inconsistency in the decoded data
    #[error("Corrupt index: {0}")]
    Corrupt(&'static str),
}

/// Write a little-endian `u64`.
#[inline]
pub fn write_u64<W: Write>(writer: &mut W, value: u64) -> io::Result<()> {
    writer.write_all(&value.to_le_bytes())
}

/// Read a little-endian `u64`.
#[inline]
pub fn read_u64<R: Read>(reader: &mut R) -> io::Result<u64> {
    let mut bytes = [0u8; 8];
    reader.read_exact(&mut bytes)?;
    Ok(u64::from_le_bytes(bytes))
}

/// Write a little-endian `u32`.
#[inline]
pub fn write_u32<W: Write>(writer: &mut W, value: u32) -> io::Result<()> {
    writer.write_all(&value.to_le_bytes())
}

/// Read a little-endian `u32`.
#[inline]
pub fn read_u32<R: Read>(reader: &mut R) -> io::Result<u32> {
    let mut bytes = [0u8; 4];
    reader.read_exact(&mut bytes)?;
    Ok(u32::from_le_bytes(bytes))
}

/// Header of a serialized minimizer index.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct IndexHeader {
    /// Kmer length
    pub k: u64,
    /// Window length in kmers
    pub w: u64,
    /// Hash table capacity (power of two)
    pub capacity: u64,
    /// Number of distinct keys
    pub keys: u64,
    /// Total number of stored positions
    pub values: u64,
    /// Number of keys with exactly one position
    pub unique_keys: u64,
    /// Offset width of the position codec at write time
    pub off_bits: u64,
}

impl IndexHeader {
    /// Write the header, magic and version first.
    pub fn write<W: Write>(&self, writer: &mut W) -> io::Result<()> {
        writer.write_all(&MAGIC)?;
        write_u32(writer, FORMAT_VERSION)?;
        write_u64(writer, self.k)?;
        write_u64(writer, self.w)?;
        write_u64(writer, self.capacity)?;
        write_u64(writer, self.keys)?;
        write_u64(writer, self.values)?;
        write_u64(writer, self.unique_keys)?;
        write_u64(writer, self.off_bits)?;
        Ok(())
    }

    /// Read and validate a header.
    ///
    /// # Errors
    /// Fails on I/O errors, wrong magic bytes, an unsupported version, or
    /// a header whose fields cannot describe a valid index.
    pub fn read<R: Read>(reader: &mut R) -> Result<Self, FormatError> {
        let mut magic = [0u8; 4];
        reader.read_exact(&mut magic)?;
        if magic != MAGIC {
            return Err(FormatError::BadMagic(magic));
        }
        let version = read_u32(reader)?;
        if version != FORMAT_VERSION {
            return Err(FormatError::UnsupportedVersion(version));
        }
        let header = IndexHeader {
            k: read_u64(reader)?,
            w: read_u64(reader)?,
            capacity: read_u64(reader)?,
            keys: read_u64(reader)?,
            values: read_u64(reader)?,
            unique_keys: read_u64(reader)?,
            off_bits: read_u64(reader)?,
        };
        header.validate()?;
        Ok(header)
    }

    fn validate(&self) -> Result<(), FormatError> {
        if self.off_bits != OFF_BITS as u64 {
            return Err(FormatError::Corrupt("position offset width mismatch"));
        }
        if self.capacity == 0 || !self.capacity.is_power_of_two() {
            return Err(FormatError::Corrupt("capacity is not a power of two"));
        }
        if self.keys > self.capacity {
            return Err(FormatError::Corrupt("more keys than slots"));
        }
        if self.unique_keys > self.keys || self.values < self.keys {
            return Err(FormatError::Corrupt("inconsistent key and value counts"));
        }
        if !crate::constants::is_valid_k(self.k as usize) || self.w == 0 {
            return Err(FormatError::Corrupt("invalid index parameters"));
        }
        Ok(())
    }
}
