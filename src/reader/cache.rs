use std::io::{Read, Seek};
use std::sync::Arc;

use lru::LruCache;

use super::chunk::read_chunk;
use crate::filters::Filters;
use crate::grid::chunk::Chunk;
use crate::Result;

/// Default budget for decoded chunks kept in memory by a reader.
pub const CACHE_SZ: usize = 32 * 1024 * 1024;

/// Decoded chunks of an open file, keyed by their address and bounded by the
/// total number of decoded bytes.
#[derive(Debug)]
pub struct ChunkCache<R: Read + Seek> {
    fd: R,
    cache: LruCache<u64, Arc<Vec<u8>>>,
    capacity: usize,
    used: usize,
}

impl<R: Read + Seek> ChunkCache<R> {
    pub fn new(fd: R, capacity: usize) -> ChunkCache<R> {
        ChunkCache {
            fd,
            cache: LruCache::unbounded(),
            capacity,
            used: 0,
        }
    }

    /// Decoded bytes of `chunk`, read from the file if not already cached.
    pub fn fetch(
        &mut self,
        chunk: &Chunk,
        filters: &Filters,
        chunk_sz: usize,
        dsz: usize,
    ) -> Result<Arc<Vec<u8>>> {
        if let Some(cache) = self.cache.get(&chunk.addr) {
            return Ok(Arc::clone(cache));
        }

        let decoded = Arc::new(read_chunk(
            &mut self.fd,
            chunk.addr,
            chunk.size,
            chunk_sz,
            dsz,
            filters,
        )?);

        log::trace!(
            "chunk {:?} read at {} ({} -> {} bytes)",
            chunk.offset,
            chunk.addr,
            chunk.size,
            chunk_sz
        );

        self.used += decoded.len();
        self.cache.put(chunk.addr, Arc::clone(&decoded));

        while self.used > self.capacity {
            match self.cache.pop_lru() {
                Some((_, evicted)) => self.used -= evicted.len(),
                None => break,
            }
        }

        Ok(decoded)
    }

    /// Number of decoded bytes currently held.
    pub fn used(&self) -> usize {
        self.used
    }
}
