//! Base types and the encoding of field values.

use alloc::{
    string::{String, ToString},
    vec::Vec,
};

use thiserror::Error;

/// A FIT base type.
///
/// The discriminant of each variant is its wire code, as written in
/// definition records.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BaseType {
    Enum = 0x00,
    Sint8 = 0x01,
    Uint8 = 0x02,
    Sint16 = 0x83,
    Uint16 = 0x84,
    Sint32 = 0x85,
    Uint32 = 0x86,
    String = 0x07,
    Float32 = 0x88,
    Float64 = 0x89,
    Uint8z = 0x0A,
    Uint16z = 0x8B,
    Uint32z = 0x8C,
    Byte = 0x0D,
    Sint64 = 0x8E,
    Uint64 = 0x8F,
    Uint64z = 0x90,
}

impl BaseType {
    /// The wire code of this base type.
    pub const fn code(self) -> u8 {
        self as u8
    }

    /// The base type for a wire code, if known.
    pub const fn from_code(code: u8) -> Option<Self> {
        Some(match code {
            0x00 => Self::Enum,
            0x01 => Self::Sint8,
            0x02 => Self::Uint8,
            0x83 => Self::Sint16,
            0x84 => Self::Uint16,
            0x85 => Self::Sint32,
            0x86 => Self::Uint32,
            0x07 => Self::String,
            0x88 => Self::Float32,
            0x89 => Self::Float64,
            0x0A => Self::Uint8z,
            0x8B => Self::Uint16z,
            0x8C => Self::Uint32z,
            0x0D => Self::Byte,
            0x8E => Self::Sint64,
            0x8F => Self::Uint64,
            0x90 => Self::Uint64z,
            _ => return None,
        })
    }

    /// Width in bytes of a single element of this base type.
    ///
    /// Strings and byte arrays are sized per field, so their element is one
    /// byte.
    pub const fn width(self) -> u8 {
        match self {
            Self::Enum | Self::Sint8 | Self::Uint8 | Self::Uint8z => 1,
            Self::String | Self::Byte => 1,
            Self::Sint16 | Self::Uint16 | Self::Uint16z => 2,
            Self::Sint32 | Self::Uint32 | Self::Uint32z | Self::Float32 => 4,
            Self::Sint64 | Self::Uint64 | Self::Uint64z | Self::Float64 => 8,
        }
    }

    /// Whether a field of this base type is a sequence of bytes rather than
    /// an array of numbers.
    pub const fn is_bytes(self) -> bool {
        matches!(self, Self::String | Self::Byte)
    }

    /// Bit pattern of the 'invalid' marker value, in the low bytes.
    const fn invalid(self) -> u64 {
        match self {
            Self::Enum | Self::Uint8 | Self::Byte => 0xFF,
            Self::Sint8 => 0x7F,
            Self::Sint16 => 0x7FFF,
            Self::Uint16 => 0xFFFF,
            Self::Sint32 => 0x7FFF_FFFF,
            Self::Uint32 | Self::Float32 => 0xFFFF_FFFF,
            Self::Sint64 => 0x7FFF_FFFF_FFFF_FFFF,
            Self::Uint64 | Self::Float64 => u64::MAX,
            Self::String | Self::Uint8z | Self::Uint16z | Self::Uint32z | Self::Uint64z => 0,
        }
    }

    /// Encode a value as exactly `size` bytes, appending them to `out`.
    ///
    /// `size` must be a non-zero multiple of [`Self::width`]. Numeric fields
    /// wider than one element expect an [`Value::Array`] of exactly
    /// `size / width` items. Multi-byte numbers are written big-endian.
    ///
    /// On error, `out` may hold a partial encoding and should be discarded.
    pub fn encode(self, value: &Value, size: u8, out: &mut Vec<u8>) -> Result<(), ValueError> {
        debug_assert!(size != 0 && size % self.width() == 0);

        match self {
            Self::String => {
                let text = match value {
                    Value::Invalid => String::new(),
                    Value::Text(s) => s.clone(),
                    Value::Unsigned(x) => x.to_string(),
                    Value::Signed(x) => x.to_string(),
                    Value::Float(x) => x.to_string(),
                    _ => Err(self.mismatch(value))?,
                };
                put_padded(out, text.as_bytes(), size, 0);
            }
            Self::Byte => match value {
                Value::Invalid => put_padded(out, &[], size, 0xFF),
                Value::Bytes(b) => put_padded(out, b, size, 0),
                _ => Err(self.mismatch(value))?,
            },
            _ => {
                let count = usize::from(size / self.width());

                match value {
                    Value::Invalid => {
                        for _ in 0..count {
                            self.put_invalid(out);
                        }
                    }
                    Value::Array(items) => {
                        if items.len() != count {
                            Err(ValueError::Shape {
                                expected: count,
                                found: items.len(),
                            })?;
                        }
                        for item in items {
                            self.put_scalar(item, out)?;
                        }
                    }
                    Value::Bytes(b) if matches!(self, Self::Enum | Self::Uint8 | Self::Uint8z) => {
                        if b.len() != count {
                            Err(ValueError::Shape {
                                expected: count,
                                found: b.len(),
                            })?;
                        }
                        out.extend_from_slice(b);
                    }
                    _ if count != 1 => Err(ValueError::Shape {
                        expected: count,
                        found: 1,
                    })?,
                    _ => self.put_scalar(value, out)?,
                }
            }
        }

        Ok(())
    }

    fn put_invalid(self, out: &mut Vec<u8>) {
        let width = usize::from(self.width());
        out.extend_from_slice(&self.invalid().to_be_bytes()[8 - width..]);
    }

    fn put_scalar(self, value: &Value, out: &mut Vec<u8>) -> Result<(), ValueError> {
        match (self, value) {
            (_, Value::Invalid) => self.put_invalid(out),

            (Self::Enum | Self::Uint8 | Self::Uint8z, _) => out.push(self.integer::<u8>(value)?),
            (Self::Uint16 | Self::Uint16z, _) => {
                out.extend_from_slice(&self.integer::<u16>(value)?.to_be_bytes())
            }
            (Self::Uint32 | Self::Uint32z, _) => {
                out.extend_from_slice(&self.integer::<u32>(value)?.to_be_bytes())
            }
            (Self::Uint64 | Self::Uint64z, _) => {
                out.extend_from_slice(&self.integer::<u64>(value)?.to_be_bytes())
            }

            (Self::Sint8, _) => out.extend_from_slice(&self.integer::<i8>(value)?.to_be_bytes()),
            (Self::Sint16, _) => out.extend_from_slice(&self.integer::<i16>(value)?.to_be_bytes()),
            (Self::Sint32, _) => out.extend_from_slice(&self.integer::<i32>(value)?.to_be_bytes()),
            (Self::Sint64, _) => out.extend_from_slice(&self.integer::<i64>(value)?.to_be_bytes()),

            (Self::Float32, Value::Float(x)) => out.extend_from_slice(&(*x as f32).to_be_bytes()),
            (Self::Float64, Value::Float(x)) => out.extend_from_slice(&x.to_be_bytes()),

            _ => Err(self.mismatch(value))?,
        }

        Ok(())
    }

    /// Convert an integer value into the primitive backing this base type.
    fn integer<T: TryFrom<u64> + TryFrom<i64>>(self, value: &Value) -> Result<T, ValueError> {
        let converted = match *value {
            Value::Unsigned(x) => <T as TryFrom<u64>>::try_from(x).ok(),
            Value::Signed(x) => <T as TryFrom<i64>>::try_from(x).ok(),
            _ => Err(self.mismatch(value))?,
        };

        converted.ok_or(ValueError::OutOfRange(self))
    }

    fn mismatch(self, value: &Value) -> ValueError {
        ValueError::Mismatch {
            base_type: self,
            found: value.kind(),
        }
    }
}

/// Append bytes, truncated or padded with `fill` to exactly `size` bytes.
fn put_padded(out: &mut Vec<u8>, bytes: &[u8], size: u8, fill: u8) {
    let size = usize::from(size);
    let taken = bytes.len().min(size);

    out.extend_from_slice(&bytes[..taken]);
    out.resize(out.len() + size - taken, fill);
}

/// An error encoding a value.
#[derive(Debug, Error, PartialEq)]
pub enum ValueError {
    /// Wrong number of array elements.
    #[error("Expected {expected} elements, found {found}.")]
    Shape { expected: usize, found: usize },
    /// Value cannot be represented by the base type.
    #[error("Cannot encode {found} as {base_type:?}.")]
    Mismatch {
        base_type: BaseType,
        found: &'static str,
    },
    /// Integer does not fit the base type.
    #[error("Value out of range for {0:?}.")]
    OutOfRange(BaseType),
}

/// A field value, prior to encoding.
///
/// Integer values are range-checked against the field's base type when
/// encoded, never truncated.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// The base type's 'invalid' marker, for fields with no known value.
    Invalid,
    Unsigned(u64),
    Signed(i64),
    Float(f64),
    Text(String),
    Bytes(Vec<u8>),
    Array(Vec<Value>),
}

impl Value {
    fn kind(&self) -> &'static str {
        match self {
            Self::Invalid => "invalid",
            Self::Unsigned(_) => "unsigned integer",
            Self::Signed(_) => "signed integer",
            Self::Float(_) => "float",
            Self::Text(_) => "text",
            Self::Bytes(_) => "bytes",
            Self::Array(_) => "array",
        }
    }
}

macro_rules! value_from {
    ($variant:ident, $into:ty, $($t:ty),*) => {
        $(
            impl From<$t> for Value {
                fn from(x: $t) -> Self {
                    Self::$variant(<$into>::from(x))
                }
            }

            impl From<Vec<$t>> for Value {
                fn from(x: Vec<$t>) -> Self {
                    Self::Array(x.into_iter().map(Self::from).collect())
                }
            }
        )*
    };
}

value_from!(Unsigned, u64, u16, u32, u64);
value_from!(Signed, i64, i8, i16, i32, i64);
value_from!(Float, f64, f32, f64);

impl From<u8> for Value {
    fn from(x: u8) -> Self {
        Self::Unsigned(x.into())
    }
}

impl From<Vec<u8>> for Value {
    fn from(x: Vec<u8>) -> Self {
        Self::Bytes(x)
    }
}

impl From<&[u8]> for Value {
    fn from(x: &[u8]) -> Self {
        Self::Bytes(x.to_vec())
    }
}

impl From<String> for Value {
    fn from(x: String) -> Self {
        Self::Text(x)
    }
}

impl From<&str> for Value {
    fn from(x: &str) -> Self {
        Self::Text(x.into())
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(x: Option<T>) -> Self {
        x.map_or(Self::Invalid, Into::into)
    }
}

#[cfg(test)]
mod tests {
    use alloc::{vec, vec::Vec};

    use super::*;

    fn encode(base_type: BaseType, value: impl Into<Value>, size: u8) -> Result<Vec<u8>, ValueError> {
        let mut out = Vec::new();
        base_type.encode(&value.into(), size, &mut out)?;
        Ok(out)
    }

    #[test]
    fn codes_round_trip() {
        for code in 0..=u8::MAX {
            if let Some(base_type) = BaseType::from_code(code) {
                assert_eq!(base_type.code(), code);
            }
        }
        assert_eq!(BaseType::from_code(0x8C), Some(BaseType::Uint32z));
        assert_eq!(BaseType::from_code(0x03), None);
    }

    #[test]
    fn scalars_are_big_endian() {
        assert_eq!(encode(BaseType::Enum, 1u8, 1), Ok(vec![0x01]));
        assert_eq!(encode(BaseType::Uint16, 0x000Fu16, 2), Ok(vec![0x00, 0x0F]));
        assert_eq!(encode(BaseType::Uint32z, 12345u32, 4), Ok(vec![0x00, 0x00, 0x30, 0x39]));
        assert_eq!(encode(BaseType::Sint16, -2i16, 2), Ok(vec![0xFF, 0xFE]));
        assert_eq!(
            encode(BaseType::Uint64, 1u64, 8),
            Ok(vec![0, 0, 0, 0, 0, 0, 0, 1])
        );
        assert_eq!(encode(BaseType::Float32, 1.0f32, 4), Ok(vec![0x3F, 0x80, 0x00, 0x00]));
        assert_eq!(
            encode(BaseType::Float64, -2.0f64, 8),
            Ok(vec![0xC0, 0, 0, 0, 0, 0, 0, 0])
        );
    }

    #[test]
    fn integers_are_range_checked() {
        assert_eq!(
            encode(BaseType::Uint8, 256u32, 1),
            Err(ValueError::OutOfRange(BaseType::Uint8))
        );
        assert_eq!(
            encode(BaseType::Uint16, -1i32, 2),
            Err(ValueError::OutOfRange(BaseType::Uint16))
        );
        assert_eq!(encode(BaseType::Sint8, 127u8, 1), Ok(vec![0x7F]));
        assert_eq!(encode(BaseType::Uint32, 7i64, 4), Ok(vec![0, 0, 0, 7]));
    }

    #[test]
    fn kinds_do_not_mix() {
        assert_eq!(
            encode(BaseType::Uint16, 1.5f64, 2),
            Err(ValueError::Mismatch {
                base_type: BaseType::Uint16,
                found: "float"
            })
        );
        assert_eq!(
            encode(BaseType::Float32, 1u32, 4),
            Err(ValueError::Mismatch {
                base_type: BaseType::Float32,
                found: "unsigned integer"
            })
        );
        assert_eq!(
            encode(BaseType::String, vec![1u8, 2], 4),
            Err(ValueError::Mismatch {
                base_type: BaseType::String,
                found: "bytes"
            })
        );
    }

    #[test]
    fn strings_are_padded_and_truncated() {
        assert_eq!(encode(BaseType::String, "TEST", 7), Ok(b"TEST\0\0\0".to_vec()));
        assert_eq!(encode(BaseType::String, "Morning Ride", 7), Ok(b"Morning".to_vec()));
        assert_eq!(encode(BaseType::String, 42u32, 4), Ok(b"42\0\0".to_vec()));
    }

    #[test]
    fn bytes_are_padded_and_truncated() {
        assert_eq!(encode(BaseType::Byte, vec![1u8, 2], 3), Ok(vec![1, 2, 0]));
        assert_eq!(encode(BaseType::Byte, vec![1u8, 2, 3, 4], 3), Ok(vec![1, 2, 3]));
    }

    #[test]
    fn arrays() {
        assert_eq!(
            encode(BaseType::Uint16, vec![0u16, 1, 2], 6),
            Ok(vec![0, 0, 0, 1, 0, 2])
        );
        assert_eq!(
            encode(BaseType::Uint16, 7u16, 6),
            Err(ValueError::Shape {
                expected: 3,
                found: 1
            })
        );
        assert_eq!(
            encode(BaseType::Uint16, vec![0u16, 1], 6),
            Err(ValueError::Shape {
                expected: 3,
                found: 2
            })
        );
        assert_eq!(encode(BaseType::Uint8, vec![4u8, 5], 2), Ok(vec![4, 5]));
        assert_eq!(encode(BaseType::Uint32, vec![9u32], 4), Ok(vec![0, 0, 0, 9]));
    }

    #[test]
    fn invalid_markers() {
        assert_eq!(encode(BaseType::Uint8, Value::Invalid, 1), Ok(vec![0xFF]));
        assert_eq!(encode(BaseType::Sint16, Value::Invalid, 2), Ok(vec![0x7F, 0xFF]));
        assert_eq!(encode(BaseType::Uint32z, Value::Invalid, 4), Ok(vec![0; 4]));
        assert_eq!(
            encode(BaseType::Uint16, Value::Invalid, 4),
            Ok(vec![0xFF; 4])
        );
        assert_eq!(encode(BaseType::String, None::<&str>, 3), Ok(vec![0; 3]));
        assert_eq!(encode(BaseType::Byte, Value::Invalid, 2), Ok(vec![0xFF; 2]));
    }
}
