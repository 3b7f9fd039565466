//! Filters applied to chunks on their way to and from storage.
//!
//! Chunks are shuffled (optional) and then compressed (optional) when written,
//! and the inverse in reverse order when read.

pub mod gzip;
pub mod quantize;
pub mod shuffle;

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Filter pipeline of a variable.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Filters {
    /// zlib compression level.
    pub deflate: Option<u8>,
    pub shuffle: bool,
}

impl Filters {
    /// Encode a chunk of little endian elements of size `dsz`.
    pub fn encode(&self, chunk: Vec<u8>, dsz: usize) -> Result<Vec<u8>> {
        let chunk = if self.shuffle && dsz > 1 {
            shuffle::shuffle_bytes(&chunk, dsz)
        } else {
            chunk
        };

        match self.deflate {
            Some(level) => gzip::compress(&chunk, level),
            None => Ok(chunk),
        }
    }

    /// Decode a stored chunk, `chunk_sz` is the decoded size in bytes.
    pub fn decode(&self, stored: Vec<u8>, chunk_sz: usize, dsz: usize) -> Result<Vec<u8>> {
        let chunk = if self.deflate.is_some() {
            let mut out = vec![0; chunk_sz];
            gzip::decompress(&stored, &mut out)?;
            out
        } else {
            stored
        };

        if chunk.len() != chunk_sz {
            return Err(Error::Corrupt(format!(
                "chunk is {} bytes, expected {chunk_sz}",
                chunk.len()
            )));
        }

        if self.shuffle && dsz > 1 {
            Ok(shuffle::unshuffle_bytes(&chunk, dsz))
        } else {
            Ok(chunk)
        }
    }
}
