//! Durable checkpoint consumed by the consensus engine
//!
//! The `(height, state_hash)` pair of the last committed block is stored at
//! a reserved key inside the same batch as the block's mutations, so it can
//! never disagree with the state it describes.

use serde::Serialize;

use super::accumulator::{to_hex, StateHash, GENESIS_HASH};
use crate::codec::{Canonical, CodecResult, Decoder, Encoder};

/// Reserved key. Never produced by `keys::compose`, which always inserts a separator.
pub const CHECKPOINT_KEY: &[u8] = b"__checkpoint";

/// Last committed block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Checkpoint {
    pub height: u64,
    pub state_hash: StateHash,
}

impl Checkpoint {
    pub fn genesis() -> Self {
        Self {
            height: 0,
            state_hash: GENESIS_HASH,
        }
    }

    pub fn state_hash_hex(&self) -> String {
        to_hex(&self.state_hash)
    }

    pub fn view(&self) -> CheckpointView {
        CheckpointView {
            height: self.height,
            state_hash: self.state_hash_hex(),
        }
    }
}

impl Canonical for Checkpoint {
    fn encode(&self, enc: &mut Encoder) {
        enc.put_u64(self.height);
        enc.put_bytes(&self.state_hash);
    }

    fn decode(dec: &mut Decoder<'_>) -> CodecResult<Self> {
        let height = dec.get_u64()?;
        let raw = dec.get_bytes()?;
        let mut state_hash = [0u8; 32];
        if raw.len() != state_hash.len() {
            return Err(crate::codec::CodecError::UnexpectedEof {
                needed: state_hash.len(),
                remaining: raw.len(),
            });
        }
        state_hash.copy_from_slice(&raw);
        Ok(Self { height, state_hash })
    }
}

/// JSON shape for queries and the CLI.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct CheckpointView {
    pub height: u64,
    pub state_hash: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::{from_canonical_bytes, to_canonical_bytes};

    #[test]
    fn test_checkpoint_roundtrip() {
        let cp = Checkpoint {
            height: 42,
            state_hash: [9u8; 32],
        };
        let decoded: Checkpoint = from_canonical_bytes(&to_canonical_bytes(&cp)).unwrap();
        assert_eq!(decoded, cp);
    }

    #[test]
    fn test_genesis() {
        let cp = Checkpoint::genesis();
        assert_eq!(cp.height, 0);
        assert_eq!(cp.view().state_hash, "0".repeat(64));
    }
}
