//! Attributes: named metadata values on the file, a group or a variable.
//!
//! An attribute is a text, a list of texts, or a scalar or vector of any
//! element type. Names are kept in insertion order; setting an existing name
//! replaces its value in place.

use std::fmt;

use itertools::Itertools;
use serde::{Deserialize, Serialize};

use crate::{Error, Result};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum AttrValue {
    Str(String),
    Strs(Vec<String>),
    I8(i8),
    U8(u8),
    I16(i16),
    U16(u16),
    I32(i32),
    U32(u32),
    I64(i64),
    U64(u64),
    F32(f32),
    F64(f64),
    I8s(Vec<i8>),
    U8s(Vec<u8>),
    I16s(Vec<i16>),
    U16s(Vec<u16>),
    I32s(Vec<i32>),
    U32s(Vec<u32>),
    I64s(Vec<i64>),
    U64s(Vec<u64>),
    F32s(Vec<f32>),
    F64s(Vec<f64>),
}

impl AttrValue {
    /// The value as text, if it is text.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            AttrValue::Str(s) => Some(s),
            _ => None,
        }
    }
}

macro_rules! impl_attr_from {
    ($t:ty, $scalar:ident, $vector:ident) => {
        impl From<$t> for AttrValue {
            fn from(v: $t) -> Self {
                AttrValue::$scalar(v)
            }
        }

        impl From<Vec<$t>> for AttrValue {
            fn from(v: Vec<$t>) -> Self {
                AttrValue::$vector(v)
            }
        }

        impl From<&[$t]> for AttrValue {
            fn from(v: &[$t]) -> Self {
                AttrValue::$vector(v.to_vec())
            }
        }
    };
}

impl_attr_from!(i8, I8, I8s);
impl_attr_from!(u8, U8, U8s);
impl_attr_from!(i16, I16, I16s);
impl_attr_from!(u16, U16, U16s);
impl_attr_from!(i32, I32, I32s);
impl_attr_from!(u32, U32, U32s);
impl_attr_from!(i64, I64, I64s);
impl_attr_from!(u64, U64, U64s);
impl_attr_from!(f32, F32, F32s);
impl_attr_from!(f64, F64, F64s);

impl From<&str> for AttrValue {
    fn from(s: &str) -> Self {
        AttrValue::Str(s.to_string())
    }
}

impl From<String> for AttrValue {
    fn from(s: String) -> Self {
        AttrValue::Str(s)
    }
}

impl From<Vec<String>> for AttrValue {
    fn from(v: Vec<String>) -> Self {
        AttrValue::Strs(v)
    }
}

impl From<&[&str]> for AttrValue {
    fn from(v: &[&str]) -> Self {
        AttrValue::Strs(v.iter().map(|s| s.to_string()).collect())
    }
}

impl fmt::Display for AttrValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        use AttrValue::*;

        match self {
            Str(s) => write!(f, "{s:?}"),
            Strs(v) => write!(f, "{}", v.iter().map(|s| format!("{s:?}")).join(", ")),
            I8(v) => write!(f, "{v}b"),
            U8(v) => write!(f, "{v}ub"),
            I16(v) => write!(f, "{v}s"),
            U16(v) => write!(f, "{v}us"),
            I32(v) => write!(f, "{v}"),
            U32(v) => write!(f, "{v}u"),
            I64(v) => write!(f, "{v}ll"),
            U64(v) => write!(f, "{v}ull"),
            F32(v) => write!(f, "{v}f"),
            F64(v) => write!(f, "{v}"),
            I8s(v) => write!(f, "{}", v.iter().map(|v| format!("{v}b")).join(", ")),
            U8s(v) => write!(f, "{}", v.iter().map(|v| format!("{v}ub")).join(", ")),
            I16s(v) => write!(f, "{}", v.iter().map(|v| format!("{v}s")).join(", ")),
            U16s(v) => write!(f, "{}", v.iter().map(|v| format!("{v}us")).join(", ")),
            I32s(v) => write!(f, "{}", v.iter().join(", ")),
            U32s(v) => write!(f, "{}", v.iter().map(|v| format!("{v}u")).join(", ")),
            I64s(v) => write!(f, "{}", v.iter().map(|v| format!("{v}ll")).join(", ")),
            U64s(v) => write!(f, "{}", v.iter().map(|v| format!("{v}ull")).join(", ")),
            F32s(v) => write!(f, "{}", v.iter().map(|v| format!("{v}f")).join(", ")),
            F64s(v) => write!(f, "{}", v.iter().join(", ")),
        }
    }
}

/// Ordered attribute map of a single target.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Attributes {
    entries: Vec<(String, AttrValue)>,
}

impl Attributes {
    pub(crate) fn put(&mut self, name: &str, value: AttrValue) {
        match self.entries.iter_mut().find(|(n, _)| n == name) {
            Some((_, v)) => *v = value,
            None => self.entries.push((name.to_string(), value)),
        }
    }

    pub fn get(&self, name: &str) -> Result<&AttrValue> {
        self.entries
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v)
            .ok_or_else(|| Error::AttributeNotFound(name.to_string()))
    }

    pub fn names(&self) -> Vec<&str> {
        self.entries.iter().map(|(n, _)| n.as_str()).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &AttrValue)> {
        self.entries.iter().map(|(n, v)| (n.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
