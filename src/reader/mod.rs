//! Reading committed chunks from an open file.

pub mod cache;
pub(crate) mod chunk;

pub use cache::{ChunkCache, CACHE_SZ};

/// Chunk source of a file open for reading or appending.
pub(crate) type Backing = std::cell::RefCell<ChunkCache<std::fs::File>>;
