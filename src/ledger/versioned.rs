//! Versioned keys
//!
//! A versioned key keeps its history next to the current layout:
//!
//! ```text
//! key|versions   -> VersionIndex (heights, strictly increasing)
//! key|<height>   -> value written at that height
//! ```
//!
//! Several writes at the same height collapse to one index entry; the
//! snapshot under `key|<height>` is simply overwritten.

use crate::codec::{Canonical, CodecResult, Decoder, Encoder};
use crate::storage::StorageResult;

use super::keys;
use super::Ledger;

/// Heights at which a versioned key was written, oldest first.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VersionIndex {
    heights: Vec<u64>,
}

impl VersionIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn heights(&self) -> &[u64] {
        &self.heights
    }

    pub fn latest(&self) -> Option<u64> {
        self.heights.last().copied()
    }

    /// Appends `height` unless it is already the newest entry.
    ///
    /// Returns whether the index changed.
    pub fn record(&mut self, height: u64) -> bool {
        if self.heights.last() == Some(&height) {
            return false;
        }
        self.heights.push(height);
        true
    }

    /// Newest height at or below `height`. `0` means the newest overall.
    pub fn resolve(&self, height: u64) -> Option<u64> {
        if height == 0 {
            return self.latest();
        }
        self.heights.iter().rev().find(|h| **h <= height).copied()
    }
}

impl Canonical for VersionIndex {
    fn encode(&self, enc: &mut Encoder) {
        enc.put_seq(&self.heights, |enc, h| enc.put_u64(*h));
    }

    fn decode(dec: &mut Decoder<'_>) -> CodecResult<Self> {
        let heights = dec.get_seq(|dec| dec.get_u64())?;
        Ok(Self { heights })
    }
}

impl Ledger {
    /// Writes `value` as the current block's version of `key`.
    ///
    /// The index write (if any) is hashed before the snapshot write.
    pub fn set_versioned(&mut self, key: &[u8], value: Vec<u8>) -> StorageResult<()> {
        let height = self.height();
        let index_key = keys::versions_key(key);

        let mut index = self.version_index(key, false)?;
        if index.record(height) {
            self.put_record(&index_key, &index);
        }

        self.put(&keys::version_key(key, height), value);
        Ok(())
    }

    /// Canonical-record convenience over [`Ledger::set_versioned`].
    pub fn set_versioned_record<T: Canonical>(&mut self, key: &[u8], record: &T) -> StorageResult<()> {
        self.set_versioned(key, crate::codec::to_canonical_bytes(record))
    }

    /// Value of `key` as of `height` (`0` = latest).
    ///
    /// No version at or below `height` is `Ok(None)`.
    pub fn get_versioned(
        &self,
        key: &[u8],
        height: u64,
        committed: bool,
    ) -> StorageResult<Option<Vec<u8>>> {
        let index = self.version_index(key, committed)?;
        match index.resolve(height) {
            Some(found) => self.get(&keys::version_key(key, found), committed),
            None => Ok(None),
        }
    }

    pub fn get_versioned_record<T: Canonical>(
        &self,
        key: &[u8],
        height: u64,
        committed: bool,
    ) -> StorageResult<Option<T>> {
        let index = self.version_index(key, committed)?;
        let Some(found) = index.resolve(height) else {
            return Ok(None);
        };
        let version_key = keys::version_key(key, found);
        match self.get(&version_key, committed)? {
            Some(bytes) => super::decode_record(&version_key, &bytes).map(Some),
            None => Ok(None),
        }
    }

    /// True if any version of `key` exists in the chosen view.
    pub fn has_versioned(&self, key: &[u8], committed: bool) -> StorageResult<bool> {
        self.has(&keys::versions_key(key), committed)
    }

    /// The height index of `key`; empty if the key was never written.
    pub fn version_index(&self, key: &[u8], committed: bool) -> StorageResult<VersionIndex> {
        Ok(self
            .get_record::<VersionIndex>(&keys::versions_key(key), committed)?
            .unwrap_or_default())
    }
}
