use std::fmt;
use std::str::FromStr;

use byteorder::{ByteOrder, LittleEndian};
use serde::{Deserialize, Serialize};

use crate::Error;

/// Element type of a variable.
#[derive(Debug, PartialEq, Eq, Serialize, Deserialize, Clone, Copy)]
pub enum Datatype {
    I8,
    U8,
    I16,
    U16,
    I32,
    U32,
    I64,
    U64,
    F32,
    F64,
}

impl Datatype {
    /// Size of one element in bytes.
    pub fn dsize(&self) -> usize {
        use Datatype::*;

        match self {
            I8 | U8 => 1,
            I16 | U16 => 2,
            I32 | U32 | F32 => 4,
            I64 | U64 | F64 => 8,
        }
    }

    pub fn is_float(&self) -> bool {
        matches!(self, Datatype::F32 | Datatype::F64)
    }

    /// Short type code, e.g. `f4` for a 32 bit float.
    pub fn code(&self) -> &'static str {
        use Datatype::*;

        match self {
            I8 => "i1",
            U8 => "u1",
            I16 => "i2",
            U16 => "u2",
            I32 => "i4",
            U32 => "u4",
            I64 => "i8",
            U64 => "u8",
            F32 => "f4",
            F64 => "f8",
        }
    }

    /// Name used when dumping a schema.
    pub fn cdl_name(&self) -> &'static str {
        use Datatype::*;

        match self {
            I8 => "byte",
            U8 => "ubyte",
            I16 => "short",
            U16 => "ushort",
            I32 => "int",
            U32 => "uint",
            I64 => "int64",
            U64 => "uint64",
            F32 => "float",
            F64 => "double",
        }
    }
}

impl fmt::Display for Datatype {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for Datatype {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        use Datatype::*;

        Ok(match s {
            "i1" | "b" | "byte" => I8,
            "u1" | "B" | "ubyte" => U8,
            "i2" | "short" => I16,
            "u2" | "ushort" => U16,
            "i4" | "int" => I32,
            "u4" | "uint" => U32,
            "i8" | "int64" => I64,
            "u8" | "uint64" => U64,
            "f4" | "float" => F32,
            "f8" | "double" => F64,
            _ => return Err(Error::UnsupportedType(s.to_string())),
        })
    }
}

/// A value type that can be stored in a variable.
///
/// Values are stored little endian regardless of the host.
pub trait Element: Copy + PartialEq + fmt::Debug + Send + Sync + 'static {
    const DATATYPE: Datatype;

    /// Value read back for elements that were never written.
    const FILL: Self;

    fn read_le(src: &[u8], dst: &mut [Self]);

    fn write_le(src: &[Self], dst: &mut [u8]);

    /// Round to `2^bits` steps. Only meaningful for floats.
    fn quantize(self, _scale: f64) -> Self {
        self
    }
}

impl Element for u8 {
    const DATATYPE: Datatype = Datatype::U8;
    const FILL: Self = 255;

    fn read_le(src: &[u8], dst: &mut [Self]) {
        dst.copy_from_slice(src);
    }

    fn write_le(src: &[Self], dst: &mut [u8]) {
        dst.copy_from_slice(src);
    }
}

impl Element for i8 {
    const DATATYPE: Datatype = Datatype::I8;
    const FILL: Self = -127;

    fn read_le(src: &[u8], dst: &mut [Self]) {
        for (d, s) in dst.iter_mut().zip(src) {
            *d = *s as i8;
        }
    }

    fn write_le(src: &[Self], dst: &mut [u8]) {
        for (d, s) in dst.iter_mut().zip(src) {
            *d = *s as u8;
        }
    }
}

macro_rules! impl_element {
    ($t:ty, $dtype:ident, $fill:expr, $read:ident, $write:ident) => {
        impl Element for $t {
            const DATATYPE: Datatype = Datatype::$dtype;
            const FILL: Self = $fill;

            fn read_le(src: &[u8], dst: &mut [Self]) {
                LittleEndian::$read(src, dst);
            }

            fn write_le(src: &[Self], dst: &mut [u8]) {
                LittleEndian::$write(src, dst);
            }
        }
    };
    (float $t:ty, $dtype:ident, $fill:expr, $read:ident, $write:ident) => {
        impl Element for $t {
            const DATATYPE: Datatype = Datatype::$dtype;
            const FILL: Self = $fill;

            fn read_le(src: &[u8], dst: &mut [Self]) {
                LittleEndian::$read(src, dst);
            }

            fn write_le(src: &[Self], dst: &mut [u8]) {
                LittleEndian::$write(src, dst);
            }

            fn quantize(self, scale: f64) -> Self {
                if self.is_finite() {
                    ((self as f64 * scale).round_ties_even() / scale) as $t
                } else {
                    self
                }
            }
        }
    };
}

impl_element!(i16, I16, -32767, read_i16_into, write_i16_into);
impl_element!(u16, U16, 65535, read_u16_into, write_u16_into);
impl_element!(i32, I32, -2147483647, read_i32_into, write_i32_into);
impl_element!(u32, U32, 4294967295, read_u32_into, write_u32_into);
impl_element!(i64, I64, -9223372036854775806, read_i64_into, write_i64_into);
impl_element!(u64, U64, 18446744073709551614, read_u64_into, write_u64_into);
impl_element!(float f32, F32, 9.969_209_968_386_869e36, read_f32_into, write_f32_into);
impl_element!(float f64, F64, 9.969_209_968_386_869e36, read_f64_into, write_f64_into);

/// Decode a little endian buffer into values.
pub(crate) fn decode<T: Element>(bytes: &[u8]) -> Vec<T> {
    debug_assert_eq!(bytes.len() % T::DATATYPE.dsize(), 0);

    let mut values = vec![T::FILL; bytes.len() / T::DATATYPE.dsize()];
    T::read_le(bytes, &mut values);
    values
}

/// Encode values as a little endian buffer.
pub(crate) fn encode<T: Element>(values: &[T]) -> Vec<u8> {
    let mut bytes = vec![0; values.len() * T::DATATYPE.dsize()];
    T::write_le(values, &mut bytes);
    bytes
}
