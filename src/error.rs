//! Errors returned by all operations on a file, its groups and variables.

use std::path::PathBuf;

use crate::types::Datatype;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("name `{0}` already exists")]
    DuplicateName(String),

    #[error("dimension `{name}`: invalid length {len}")]
    InvalidLength { name: String, len: usize },

    #[error("dimension `{0}`: group already has an unlimited dimension")]
    TooManyUnlimited(String),

    #[error("unknown dimension `{0}`")]
    UnknownDimension(String),

    #[error("unsupported element type `{0}`")]
    UnsupportedType(String),

    #[error("element type mismatch: variable is {expected}, requested {found}")]
    TypeMismatch { expected: Datatype, found: Datatype },

    #[error("invalid option: {0}")]
    InvalidOption(String),

    #[error("selector has {found} axes, variable has {expected}")]
    SelectorRank { expected: usize, found: usize },

    #[error("invalid selector: {0}")]
    InvalidSelector(String),

    #[error("shape mismatch: selection is {expected:?}, values are {found:?}")]
    ShapeMismatch {
        expected: Vec<usize>,
        found: Vec<usize>,
    },

    #[error("axis {axis}: {end} is out of range for length {len}")]
    OutOfRange { axis: usize, end: usize, len: usize },

    #[error("attribute `{0}` not found")]
    AttributeNotFound(String),

    #[error("file is not open")]
    FileNotOpen,

    #[error("file is open read-only")]
    ReadOnly,

    #[error("{0}: file is locked by another writer")]
    LockHeld(PathBuf),

    #[error("corrupt file: {0}")]
    Corrupt(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl From<bincode::Error> for Error {
    fn from(e: bincode::Error) -> Self {
        Error::Corrupt(format!("header: {e}"))
    }
}

impl From<std::convert::Infallible> for Error {
    fn from(e: std::convert::Infallible) -> Self {
        match e {}
    }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
