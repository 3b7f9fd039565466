//! On-disk layout.
//!
//! ```text
//! 0        4        8               16              24
//! +--------+--------+---------------+---------------+------------------+---------+
//! | "GFIX" | ver u32| header_addr   | header_len    | chunk blobs ...  | header  |
//! +--------+--------+---------------+---------------+------------------+---------+
//! ```
//!
//! All integers are little endian. The header is the `bincode` serialized
//! schema, attributes and chunk indices of every group. New chunks and a new
//! header are always written after existing data, and the superblock is
//! updated last.

use std::fs;
use std::io::{Read, Seek, SeekFrom, Write};

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use serde::{Deserialize, Serialize};

use crate::grid::chunk::Chunk;
use crate::group::GroupData;
use crate::{Error, Result};

pub const MAGIC: &[u8; 4] = b"GFIX";
pub const VERSION: u32 = 1;

/// Size of the superblock, also the address of the first chunk.
pub const SUPERBLOCK_SZ: u64 = 24;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Superblock {
    pub header_addr: u64,
    pub header_len: u64,
}

impl Superblock {
    pub fn read<R: Read + Seek>(fd: &mut R) -> Result<Superblock> {
        fd.seek(SeekFrom::Start(0))?;

        let mut magic = [0u8; 4];
        fd.read_exact(&mut magic)?;
        if &magic != MAGIC {
            return Err(Error::Corrupt("not a gridfix file (bad magic)".into()));
        }

        let version = fd.read_u32::<LittleEndian>()?;
        if version != VERSION {
            return Err(Error::Corrupt(format!("unsupported format version {version}")));
        }

        Ok(Superblock {
            header_addr: fd.read_u64::<LittleEndian>()?,
            header_len: fd.read_u64::<LittleEndian>()?,
        })
    }

    /// Write the superblock with a single write so that a reader never sees
    /// a header address without its length.
    pub fn write<W: Write + Seek>(&self, fd: &mut W) -> Result<()> {
        let mut buf = [0u8; SUPERBLOCK_SZ as usize];
        {
            let mut w = &mut buf[..];
            w.write_all(MAGIC)?;
            w.write_u32::<LittleEndian>(VERSION)?;
            w.write_u64::<LittleEndian>(self.header_addr)?;
            w.write_u64::<LittleEndian>(self.header_len)?;
        }

        fd.seek(SeekFrom::Start(0))?;
        fd.write_all(&buf)?;

        Ok(())
    }
}

/// Everything but the chunk blobs.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub(crate) struct Header {
    pub root: GroupData,
    pub groups: Vec<GroupData>,
}

impl Header {
    pub fn all_groups(&self) -> impl Iterator<Item = &GroupData> {
        std::iter::once(&self.root).chain(self.groups.iter())
    }

    pub fn all_groups_mut(&mut self) -> impl Iterator<Item = &mut GroupData> {
        std::iter::once(&mut self.root).chain(self.groups.iter_mut())
    }

    pub fn has_pending(&self) -> bool {
        self.all_groups().any(|g| g.has_pending())
    }

    /// Read the header of a file.
    pub fn read<R: Read + Seek>(fd: &mut R) -> Result<Header> {
        let sb = Superblock::read(fd)?;

        let len = fd.seek(SeekFrom::End(0))?;
        if sb.header_addr < SUPERBLOCK_SZ || sb.header_addr.saturating_add(sb.header_len) > len {
            return Err(Error::Corrupt(format!(
                "header at {}+{} is outside of file ({len} bytes)",
                sb.header_addr, sb.header_len
            )));
        }

        fd.seek(SeekFrom::Start(sb.header_addr))?;
        let mut buf = vec![0u8; sb.header_len as usize];
        fd.read_exact(&mut buf)?;

        let header: Header = bincode::deserialize(&buf)?;
        for g in header.all_groups() {
            g.validate()?;
        }

        log::debug!(
            "header: {} bytes at {}, {} groups",
            sb.header_len,
            sb.header_addr,
            header.groups.len()
        );

        Ok(header)
    }

    /// Write pending chunks starting at `start`, followed by the header, and
    /// finally point the superblock at the new header. The file is synced
    /// before and after the superblock is written.
    ///
    /// `finish` runs once the file is complete. The chunk indices are only
    /// updated and the pending chunks dropped if everything succeeds.
    pub fn commit<F>(&mut self, fd: &mut fs::File, start: u64, finish: F) -> Result<()>
    where
        F: FnOnce() -> Result<()>,
    {
        let start = start.max(SUPERBLOCK_SZ);
        let mut addr = fd.seek(SeekFrom::Start(start))?;

        let mut written: Vec<(usize, usize, Chunk)> = Vec::new();

        for (gi, g) in self.all_groups().enumerate() {
            for (vi, v) in g.variables.iter().enumerate() {
                let dsz = v.dtype.dsize();

                for (offset, chunk) in v.grid.pending() {
                    let stored = v.grid.filters.encode(chunk.clone(), dsz)?;
                    fd.write_all(&stored)?;

                    written.push((
                        gi,
                        vi,
                        Chunk {
                            offset: offset.clone(),
                            addr,
                            size: stored.len() as u64,
                        },
                    ));
                    addr += stored.len() as u64;
                }
            }
        }

        log::debug!("wrote {} chunks, {} bytes", written.len(), addr - start);

        // Install the new chunks, keeping the previous indices around in case
        // the header can not be written.
        let previous: Vec<Vec<Vec<Chunk>>> = self
            .all_groups()
            .map(|g| g.variables.iter().map(|v| v.grid.chunks().to_vec()).collect())
            .collect();

        for (gi, vi, chunk) in written {
            if let Some(g) = self.all_groups_mut().nth(gi) {
                g.variables[vi].grid.install(chunk);
            }
        }

        let result = self.write_header(fd, addr).and_then(|_| finish());

        match result {
            Ok(()) => {
                for g in self.all_groups_mut() {
                    for v in &mut g.variables {
                        v.grid.clear_pending();
                    }
                }
                Ok(())
            }
            Err(e) => {
                for (g, chunks) in self.all_groups_mut().zip(previous) {
                    for (v, chunks) in g.variables.iter_mut().zip(chunks) {
                        v.grid.replace_index(chunks);
                    }
                }
                Err(e)
            }
        }
    }

    fn write_header(&self, fd: &mut fs::File, addr: u64) -> Result<()> {
        let buf = bincode::serialize(self)?;

        fd.seek(SeekFrom::Start(addr))?;
        fd.write_all(&buf)?;
        fd.sync_data()?;

        Superblock {
            header_addr: addr,
            header_len: buf.len() as u64,
        }
        .write(fd)?;
        fd.sync_all()?;

        log::debug!("header: {} bytes at {}", buf.len(), addr);

        Ok(())
    }
}
