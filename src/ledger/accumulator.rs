//! Per-block state hash accumulator
//!
//! Every ledger mutation is folded into a SHA-256 digest in call order:
//!
//! ```text
//! tag (1 = set, 2 = delete) | key length (u32 LE) | key | value length (u32 LE) | value
//! ```
//!
//! The digest is seeded with the previous block's state hash, so the final
//! hash commits to the whole chain of blocks. A block without mutations
//! keeps the previous hash.

use sha2::{Digest, Sha256};

/// 32-byte state commitment
pub type StateHash = [u8; 32];

/// Hash of the empty chain.
pub const GENESIS_HASH: StateHash = [0u8; 32];

const TAG_SET: u8 = 1;
const TAG_DELETE: u8 = 2;

/// Running digest over one block's mutations.
#[derive(Clone)]
pub struct HashAccumulator {
    hasher: Sha256,
    seed: StateHash,
    updates: u64,
}

impl HashAccumulator {
    pub fn new(seed: StateHash) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(seed);
        Self {
            hasher,
            seed,
            updates: 0,
        }
    }

    pub fn record_set(&mut self, key: &[u8], value: &[u8]) {
        self.feed(TAG_SET, key, value);
    }

    pub fn record_delete(&mut self, key: &[u8]) {
        self.feed(TAG_DELETE, key, &[]);
    }

    fn feed(&mut self, tag: u8, key: &[u8], value: &[u8]) {
        self.hasher.update([tag]);
        self.hasher.update((key.len() as u32).to_le_bytes());
        self.hasher.update(key);
        self.hasher.update((value.len() as u32).to_le_bytes());
        self.hasher.update(value);
        self.updates += 1;
    }

    /// Number of mutations folded in so far.
    pub fn updates(&self) -> u64 {
        self.updates
    }

    pub fn seed(&self) -> StateHash {
        self.seed
    }

    /// Digest of everything recorded so far. Does not consume the accumulator.
    pub fn finalize(&self) -> StateHash {
        if self.updates == 0 {
            return self.seed;
        }
        self.hasher.clone().finalize().into()
    }
}

impl std::fmt::Debug for HashAccumulator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HashAccumulator")
            .field("updates", &self.updates)
            .finish()
    }
}

/// Lowercase hex rendering for logs and query output.
pub fn to_hex(hash: &[u8]) -> String {
    hash.iter().map(|b| format!("{:02x}", b)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_block_keeps_seed() {
        let seed = [7u8; 32];
        assert_eq!(HashAccumulator::new(seed).finalize(), seed);
    }

    #[test]
    fn test_same_sequence_same_hash() {
        let mut a = HashAccumulator::new(GENESIS_HASH);
        let mut b = HashAccumulator::new(GENESIS_HASH);
        for acc in [&mut a, &mut b] {
            acc.record_set(b"k1", b"v1");
            acc.record_delete(b"k2");
        }
        assert_eq!(a.finalize(), b.finalize());
        assert_eq!(a.updates(), 2);
    }

    #[test]
    fn test_order_matters() {
        let mut a = HashAccumulator::new(GENESIS_HASH);
        a.record_set(b"k1", b"v1");
        a.record_set(b"k2", b"v2");

        let mut b = HashAccumulator::new(GENESIS_HASH);
        b.record_set(b"k2", b"v2");
        b.record_set(b"k1", b"v1");

        assert_ne!(a.finalize(), b.finalize());
    }

    #[test]
    fn test_set_empty_differs_from_delete() {
        let mut a = HashAccumulator::new(GENESIS_HASH);
        a.record_set(b"k", b"");
        let mut b = HashAccumulator::new(GENESIS_HASH);
        b.record_delete(b"k");
        assert_ne!(a.finalize(), b.finalize());
    }

    #[test]
    fn test_length_prefix_prevents_ambiguity() {
        let mut a = HashAccumulator::new(GENESIS_HASH);
        a.record_set(b"ab", b"c");
        let mut b = HashAccumulator::new(GENESIS_HASH);
        b.record_set(b"a", b"bc");
        assert_ne!(a.finalize(), b.finalize());
    }

    #[test]
    fn test_seed_chains_blocks() {
        let mut a = HashAccumulator::new([1u8; 32]);
        a.record_set(b"k", b"v");
        let mut b = HashAccumulator::new([2u8; 32]);
        b.record_set(b"k", b"v");
        assert_ne!(a.finalize(), b.finalize());
    }

    #[test]
    fn test_hex() {
        assert_eq!(to_hex(&[0x00, 0xab, 0x10]), "00ab10");
    }
}
