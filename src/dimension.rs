use serde::{Deserialize, Serialize};

/// Maximum number of unlimited dimensions in one group.
pub const MAX_UNLIMITED_DIMENSIONS: usize = 1;

/// A named axis of a group.
///
/// For an unlimited dimension `len` is the current length: the highest index
/// written through any variable using it, plus one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dimension {
    pub(crate) name: String,
    pub(crate) len: usize,
    pub(crate) unlimited: bool,
}

impl Dimension {
    pub(crate) fn fixed(name: &str, len: usize) -> Dimension {
        Dimension {
            name: name.to_string(),
            len,
            unlimited: false,
        }
    }

    pub(crate) fn unlimited(name: &str) -> Dimension {
        Dimension {
            name: name.to_string(),
            len: 0,
            unlimited: true,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn is_unlimited(&self) -> bool {
        self.unlimited
    }

    pub(crate) fn grow(&mut self, len: usize) {
        debug_assert!(self.unlimited);
        self.len = self.len.max(len);
    }
}
