//! State snapshots for rewind and run-ahead

use xxhash_rust::xxh3::Xxh3;

/// Copy of a state buffer at a point in time
///
/// The definition is not part of the snapshot; restoring requires a handle
/// built from the same definition. The xxHash3 checksum guards against
/// restoring a buffer that was modified after capture.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StateSnapshot {
    data: Vec<u8>,
    checksum: u64,
}

impl StateSnapshot {
    pub(crate) fn capture(state: &[u8]) -> Self {
        let data = state.to_vec();
        let checksum = Self::compute_checksum(&data);
        Self { data, checksum }
    }

    /// Rebuild a snapshot from stored bytes and checksum
    pub fn from_parts(data: Vec<u8>, checksum: u64) -> Self {
        Self { data, checksum }
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn checksum(&self) -> u64 {
        self.checksum
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Check the stored checksum against the data
    pub fn verify(&self) -> bool {
        Self::compute_checksum(&self.data) == self.checksum
    }

    fn compute_checksum(data: &[u8]) -> u64 {
        let mut hasher = Xxh3::new();
        hasher.update(data);
        hasher.digest()
    }
}
