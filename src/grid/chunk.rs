use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// A committed chunk. A chunk is read and written in its entirety, this is
/// necessary since the chunk can be compressed and filtered.
///
/// Chunks are identified and ordered by their offset in the variable.
#[derive(Debug, Eq, Clone, Serialize, Deserialize)]
pub struct Chunk {
    /// Coordinates of the first element of the chunk.
    pub offset: Vec<usize>,

    /// Address of the chunk in the file.
    pub addr: u64,

    /// Chunk size in bytes (storage size)
    pub size: u64,
}

impl Ord for Chunk {
    fn cmp(&self, other: &Self) -> Ordering {
        self.offset.cmp(&other.offset)
    }
}

impl PartialOrd for Chunk {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for Chunk {
    fn eq(&self, other: &Self) -> bool {
        self.offset == other.offset
    }
}
