//! # GRIDFIX
//!
//! A self-describing, chunked file for multi-dimensional scientific arrays.
//!
//! A file holds named [dimensions](Dimension), typed [variables](Variable)
//! laid out over them and free-form [attributes](AttrValue), organized in an
//! unnamed root group and one level of named [groups](Group). Every variable
//! is stored as a regular grid of chunks which are optionally shuffled and
//! zlib compressed. Reading a slice only loads the chunks it overlaps, and
//! one dimension per group may be unlimited so that records can be appended
//! without rewriting earlier data.
//!
//! A file is `Writable` (after [create] or [append]), `Readable` (after
//! [open]) or `Closed`. Writers take an exclusive lock on the path and
//! persist their changes on [`File::close`].
//!
//! ## Usage
//!
//! ```
//! use gridfix::prelude::*;
//! use ndarray::{arr1, s};
//!
//! # let dir = tempfile::tempdir().unwrap();
//! # let path = dir.path().join("sample.gfx");
//! let mut f = gridfix::create(&path)?;
//! f.add_attribute("description", "bogus example script")?;
//!
//! let mut g = f.add_group("Temp_data")?;
//! g.add_dimension("lon", 3)?;
//! g.add_unlimited_dimension("time")?;
//!
//! let mut t = g.add_variable_with_options(
//!     "Temperature",
//!     Datatype::F32,
//!     &["time", "lon"],
//!     VariableOptions::new().zlib().least_significant_digit(1),
//! )?;
//! t.put(s![0, ..], arr1(&[280.0_f32, 281.5, 283.25]).view())?;
//! f.close()?;
//!
//! let f = gridfix::open(&path)?;
//! let t = f.group("Temp_data")?.unwrap().variable("Temperature").unwrap();
//! assert_eq!(t.shape(), [1, 3]);
//! let row = t.values::<f32, _>(s![0, ..])?;
//! assert_eq!(row.iter().copied().collect::<Vec<_>>(), [280.0, 281.5, 283.25]);
//! assert_eq!(f.attribute("description")?.as_str(), Some("bogus example script"));
//! # Ok::<(), gridfix::Error>(())
//! ```

pub mod attribute;
pub mod dimension;
pub mod error;
pub mod extent;
pub mod file;
pub mod filters;
pub(crate) mod format;
pub mod grid;
pub mod group;
pub mod reader;
pub mod types;
pub mod variable;

pub use attribute::{AttrValue, Attributes};
pub use dimension::Dimension;
pub use error::{Error, Result};
pub use extent::{Extent, Extents};
pub use file::{append, append_with, create, open, open_with, File, Options, State};
pub use group::{Group, GroupMut};
pub use types::{Datatype, Element};
pub use variable::{Variable, VariableMut, VariableOptions};

pub mod prelude {
    pub use super::{
        AttrValue, Datatype, Dimension, Element, Error, Extent, Extents, File, Group, GroupMut,
        Options, State, Variable, VariableMut, VariableOptions,
    };
}
