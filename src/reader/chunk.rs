use std::io::{Read, Seek, SeekFrom};

use crate::filters::Filters;
use crate::Result;

/// Read a stored chunk of `size` bytes at `addr` and run it back through the
/// filter pipeline. `chunk_sz` is the decoded size of the chunk in bytes.
pub(crate) fn read_chunk<F>(
    fd: &mut F,
    addr: u64,
    size: u64,
    chunk_sz: usize,
    dsz: usize,
    filters: &Filters,
) -> Result<Vec<u8>>
where
    F: Read + Seek,
{
    debug_assert!(dsz < 16); // unlikely data-size

    let mut stored: Vec<u8> = vec![0; size as usize];

    fd.seek(SeekFrom::Start(addr))?;
    fd.read_exact(&mut stored)?;

    filters.decode(stored, chunk_sz, dsz)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::encode;
    use crate::Error;
    use std::io::Cursor;

    #[test]
    fn read_at_address() {
        let filters = Filters {
            deflate: Some(4),
            shuffle: true,
        };
        let values: Vec<f32> = (0..64).map(|v| v as f32 * 0.5).collect();
        let stored = filters.encode(encode(&values), 4).unwrap();

        let mut buf = vec![0xaa; 24];
        buf.extend_from_slice(&stored);

        let chunk = read_chunk(
            &mut Cursor::new(buf),
            24,
            stored.len() as u64,
            64 * 4,
            4,
            &filters,
        )
        .unwrap();
        assert_eq!(chunk, encode(&values));
    }

    #[test]
    fn short_chunk_is_corrupt() {
        let filters = Filters::default();
        let buf = vec![0u8; 32];

        assert!(matches!(
            read_chunk(&mut Cursor::new(buf), 0, 16, 32, 4, &filters),
            Err(Error::Corrupt(_))
        ));
    }
}
