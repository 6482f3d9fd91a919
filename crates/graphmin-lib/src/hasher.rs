//! Fixed integer hashing for kmer keys
//!
//! Minimizer comparison order and hash table placement both use the same
//! 64-bit multiply/xor-shift mixing function (Thomas Wang's 64-bit hash).
//! The function is a bijection on `u64`, so two keys hash equal only when
//! they are equal. It is deliberately not seeded: serialized indexes built
//! on different machines must agree on which kmer of a window is minimal.

/// Thomas Wang's 64-bit integer hash.
#[inline]
pub const fn wang_hash_64(mut key: u64) -> u64 {
    key = (!key).wrapping_add(key << 21);
    key ^= key >> 24;
    key = key.wrapping_add(key << 3).wrapping_add(key << 8);
    key ^= key >> 14;
    key = key.wrapping_add(key << 2).wrapping_add(key << 4);
    key ^= key >> 28;
    key = key.wrapping_add(key << 31);
    key
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deterministic() {
        let value = 0x1234_5678_9abc_def0u64;
        assert_eq!(wang_hash_64(value), wang_hash_64(value));
    }

    #[test]
    fn test_distinct_inputs_distinct_outputs() {
        // The mix is invertible, so nearby inputs cannot collide.
        for i in 0..64u64 {
            assert_ne!(wang_hash_64(i), wang_hash_64(i + 1));
        }
    }

    #[test]
    fn test_known_3mer_order() {
        // Packed 3-mers (A=0 C=1 G=2 T=3) sort in this order under the hash.
        // Window minima in the extraction tests depend on this ordering.
        let order = [
            b"AAT", b"TGT", b"TTG", b"TAT", b"ATA", b"TCG", b"ATT", b"ACA",
            b"GAA", b"ACT", b"TAC", b"CGA", b"CAA", b"GTA", b"TTC", b"AGT",
        ];
        let pack = |s: &[u8; 3]| -> u64 {
            s.iter().fold(0u64, |acc, &c| {
                (acc << 2) | crate::encoding::encode_base(c).unwrap() as u64
            })
        };
        for pair in order.windows(2) {
            assert!(
                wang_hash_64(pack(pair[0])) < wang_hash_64(pack(pair[1])),
                "{} should hash below {}",
                std::str::from_utf8(pair[0]).unwrap(),
                std::str::from_utf8(pair[1]).unwrap()
            );
        }
    }
}
