//! An open file and its lifecycle.
//!
//! A file is `Writable` after [`create`] or [`append`], `Readable` after
//! [`open`], and `Closed` after [`File::close`]. Writers hold an exclusive
//! lock on the path, a sidecar `<path>.lock` file, until the file is closed
//! or dropped.

use std::cell::RefCell;
use std::ffi::OsString;
use std::fmt;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use crate::attribute::AttrValue;
use crate::format::Header;
use crate::group::{Group, GroupData, GroupMut};
use crate::reader::{Backing, ChunkCache, CACHE_SZ};
use crate::{Error, Result};

/// Options for opening a file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Options {
    /// Upper bound of decoded chunk bytes kept in memory.
    pub chunk_cache_bytes: usize,
}

impl Default for Options {
    fn default() -> Self {
        Options {
            chunk_cache_bytes: CACHE_SZ,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum State {
    Writable,
    Readable,
    Closed,
}

/// Path with a suffix appended to the file name, e.g. `a.gfx.lock`.
fn sidecar(path: &Path, suffix: &str) -> PathBuf {
    let mut p = OsString::from(path.as_os_str());
    p.push(suffix);
    PathBuf::from(p)
}

/// Exclusive write lock on a path, released when dropped.
#[derive(Debug)]
struct Lock {
    path: PathBuf,
}

impl Lock {
    fn acquire(path: &Path) -> Result<Lock> {
        let lock = sidecar(path, ".lock");

        let mut fd = match fs::OpenOptions::new().write(true).create_new(true).open(&lock) {
            Ok(fd) => fd,
            Err(e) if e.kind() == io::ErrorKind::AlreadyExists => {
                return Err(Error::LockHeld(path.to_path_buf()))
            }
            Err(e) => return Err(e.into()),
        };
        writeln!(fd, "{}", std::process::id())?;

        log::debug!("locked {lock:?}");

        Ok(Lock { path: lock })
    }
}

impl Drop for Lock {
    fn drop(&mut self) {
        if let Err(e) = fs::remove_file(&self.path) {
            log::warn!("could not remove lock {:?}: {e}", self.path);
        } else {
            log::debug!("unlocked {:?}", self.path);
        }
    }
}

#[derive(Debug)]
enum Writer {
    /// Build a new file next to `path` and move it into place on close.
    Create,
    /// Append to the existing file after `end`.
    Append { end: u64 },
}

#[derive(Debug)]
enum Inner {
    Closed,
    Open {
        header: Header,
        source: Option<Backing>,
        writer: Option<(Writer, Lock)>,
    },
}

/// A file open for reading or writing.
///
/// ```no_run
/// let mut f = gridfix::create("sample.gfx")?;
/// f.add_attribute("description", "bogus example script")?;
///
/// let mut g = f.add_group("Temp_data")?;
/// g.add_dimension("lon", 28)?;
/// g.add_unlimited_dimension("time")?;
/// g.add_variable::<f32>("Temperature", &["time", "lon"])?;
///
/// f.close()?;
/// # Ok::<(), gridfix::Error>(())
/// ```
#[derive(Debug)]
pub struct File {
    path: PathBuf,
    inner: Inner,
}

/// Create a new file at `path`, replacing any existing file when closed.
pub fn create<P: AsRef<Path>>(path: P) -> Result<File> {
    let path = path.as_ref().to_path_buf();
    let lock = Lock::acquire(&path)?;

    log::debug!("creating {path:?}");

    Ok(File {
        path,
        inner: Inner::Open {
            header: Header::default(),
            source: None,
            writer: Some((Writer::Create, lock)),
        },
    })
}

/// Open an existing file for reading.
pub fn open<P: AsRef<Path>>(path: P) -> Result<File> {
    open_with(path, Options::default())
}

pub fn open_with<P: AsRef<Path>>(path: P, options: Options) -> Result<File> {
    let path = path.as_ref().to_path_buf();
    let (header, source, _) = load(&path, &options)?;

    Ok(File {
        path,
        inner: Inner::Open {
            header,
            source: Some(source),
            writer: None,
        },
    })
}

/// Open an existing file for writing. Existing chunks are never rewritten,
/// new chunks and the new header are appended on close.
pub fn append<P: AsRef<Path>>(path: P) -> Result<File> {
    append_with(path, Options::default())
}

pub fn append_with<P: AsRef<Path>>(path: P, options: Options) -> Result<File> {
    let path = path.as_ref().to_path_buf();
    let lock = Lock::acquire(&path)?;
    let (header, source, end) = load(&path, &options)?;

    Ok(File {
        path,
        inner: Inner::Open {
            header,
            source: Some(source),
            writer: Some((Writer::Append { end }, lock)),
        },
    })
}

fn load(path: &Path, options: &Options) -> Result<(Header, Backing, u64)> {
    let mut fd = fs::File::open(path)?;
    let header = Header::read(&mut fd)?;
    let end = fd.metadata()?.len();

    log::debug!("opened {path:?} ({end} bytes)");

    Ok((
        header,
        RefCell::new(ChunkCache::new(fd, options.chunk_cache_bytes)),
        end,
    ))
}

impl File {
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn state(&self) -> State {
        match &self.inner {
            Inner::Closed => State::Closed,
            Inner::Open { writer: Some(_), .. } => State::Writable,
            Inner::Open { writer: None, .. } => State::Readable,
        }
    }

    fn contents(&self) -> Result<(&Header, Option<&Backing>)> {
        match &self.inner {
            Inner::Closed => Err(Error::FileNotOpen),
            Inner::Open { header, source, .. } => Ok((header, source.as_ref())),
        }
    }

    fn contents_mut(&mut self) -> Result<(&mut Header, Option<&Backing>)> {
        match &mut self.inner {
            Inner::Closed => Err(Error::FileNotOpen),
            Inner::Open { writer: None, .. } => Err(Error::ReadOnly),
            Inner::Open { header, source, .. } => Ok((header, source.as_ref())),
        }
    }

    /// Decoded chunk bytes currently held in the chunk cache.
    pub fn cached_bytes(&self) -> usize {
        match &self.inner {
            Inner::Open {
                source: Some(source),
                ..
            } => source.borrow().used(),
            _ => 0,
        }
    }

    /// The unnamed root group.
    pub fn root(&self) -> Result<Group<'_>> {
        let (header, source) = self.contents()?;
        Ok(Group::new(&header.root, source))
    }

    pub fn root_mut(&mut self) -> Result<GroupMut<'_>> {
        let (header, source) = self.contents_mut()?;
        Ok(GroupMut::new(&mut header.root, source))
    }

    /// Named groups in the order they were added.
    pub fn groups(&self) -> Result<impl Iterator<Item = Group<'_>>> {
        let (header, source) = self.contents()?;
        Ok(header.groups.iter().map(move |g| Group::new(g, source)))
    }

    pub fn group(&self, name: &str) -> Result<Option<Group<'_>>> {
        let (header, source) = self.contents()?;
        Ok(header
            .groups
            .iter()
            .find(|g| g.name == name)
            .map(|g| Group::new(g, source)))
    }

    pub fn group_names(&self) -> Result<Vec<&str>> {
        let (header, _) = self.contents()?;
        Ok(header.groups.iter().map(|g| g.name.as_str()).collect())
    }

    pub fn group_mut(&mut self, name: &str) -> Result<Option<GroupMut<'_>>> {
        let (header, source) = self.contents_mut()?;
        Ok(header
            .groups
            .iter_mut()
            .find(|g| g.name == name)
            .map(|g| GroupMut::new(g, source)))
    }

    /// Add a named group below the root.
    pub fn add_group(&mut self, name: &str) -> Result<GroupMut<'_>> {
        let (header, source) = self.contents_mut()?;

        // The root group is the unnamed one.
        if name.is_empty() || header.groups.iter().any(|g| g.name == name) {
            return Err(Error::DuplicateName(name.to_string()));
        }

        header.groups.push(GroupData::new(name));
        log::debug!("group `{name}`");

        let last = header.groups.len() - 1;
        Ok(GroupMut::new(&mut header.groups[last], source))
    }

    /// Set a global attribute, replacing any previous value.
    pub fn add_attribute<V: Into<AttrValue>>(&mut self, name: &str, value: V) -> Result<()> {
        self.root_mut()?.add_attribute(name, value)
    }

    pub fn attribute(&self, name: &str) -> Result<&AttrValue> {
        self.root()?.attribute(name)
    }

    pub fn attribute_names(&self) -> Result<Vec<&str>> {
        Ok(self.root()?.attribute_names())
    }

    /// Close the file. A writable file is persisted and its lock released.
    /// Closing a closed file does nothing.
    ///
    /// If persisting fails the file stays writable with its changes intact.
    pub fn close(&mut self) -> Result<()> {
        if let Inner::Open {
            header,
            writer: Some((writer, _)),
            ..
        } = &mut self.inner
        {
            match *writer {
                Writer::Create => {
                    let tmp = sidecar(&self.path, ".tmp");
                    let mut fd = fs::OpenOptions::new()
                        .read(true)
                        .write(true)
                        .create(true)
                        .truncate(true)
                        .open(&tmp)?;

                    let path = &self.path;
                    let result = header.commit(&mut fd, 0, || Ok(fs::rename(&tmp, path)?));
                    drop(fd);

                    if let Err(e) = result {
                        fs::remove_file(&tmp).ok();
                        return Err(e);
                    }
                }
                Writer::Append { end } => {
                    let mut fd = fs::OpenOptions::new().write(true).open(&self.path)?;
                    header.commit(&mut fd, end, || Ok(()))?;
                }
            }

            log::debug!("closed {:?}", self.path);
        }

        self.inner = Inner::Closed;
        Ok(())
    }
}

impl Drop for File {
    fn drop(&mut self) {
        if let Inner::Open {
            header,
            writer: Some(_),
            ..
        } = &self.inner
        {
            if header.has_pending() {
                log::warn!("{:?}: dropped without close, discarding changes", self.path);
            } else {
                log::debug!("{:?}: dropped without close", self.path);
            }
        }
    }
}

impl fmt::Display for File {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let Ok(root) = self.root() else {
            return writeln!(f, "{:?}: closed", self.path);
        };

        writeln!(f, "gridfix {} {{", self.path.display())?;
        write!(f, "{root}")?;

        for g in self.groups().into_iter().flatten() {
            writeln!(f, "\ngroup: {} {{", g.name())?;
            write!(f, "{g}")?;
            writeln!(f, "}} // group {}", g.name())?;
        }

        writeln!(f, "}}")
    }
}
