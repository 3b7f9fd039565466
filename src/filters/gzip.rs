use libdeflater::{CompressionLvl, Compressor, Decompressor};

use crate::{Error, Result};

/// Compress a slice of `u8`s as a zlib stream.
pub fn compress(src: &[u8], level: u8) -> Result<Vec<u8>> {
    let lvl = CompressionLvl::new(level as i32)
        .map_err(|_| Error::InvalidOption(format!("zlib level {level}")))?;
    let mut c = Compressor::new(lvl);

    let mut out = vec![0; c.zlib_compress_bound(src.len())];
    let n = c
        .zlib_compress(src, &mut out)
        .map_err(|_| Error::Corrupt("could not compress chunk".into()))?;
    out.truncate(n);

    Ok(out)
}

/// Helper to decompress a zlib compressed slice of `u8`s to another buffer of `u8`s.
pub fn decompress(compressed: &[u8], out: &mut [u8]) -> Result<usize> {
    let mut de = Decompressor::new();
    let n = de
        .zlib_decompress(compressed, out)
        .map_err(|_| Error::Corrupt("could not decompress chunk".into()))?;

    if n != out.len() {
        return Err(Error::Corrupt(format!(
            "decompressed chunk is {} bytes, expected {}",
            n,
            out.len()
        )));
    }

    Ok(n)
}
