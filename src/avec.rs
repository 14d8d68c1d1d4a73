//! Convenience interfaces for encoding whole documents.
//!
//! The encoders in this module own their output. Each writes a provisional
//! document header on construction, appends records as they are supplied,
//! and on [`finish`](buffer::Encoder::finish) rewrites the header with the
//! final record length and appends the document checksum.
//!
//! Use [`buffer::Encoder`] to build a document in memory, or
//! [`writer::Encoder`] to write one to a seekable sink such as a file.
//!
//! Message schemas can be written by hand (see [`crate::schema`]), or derived
//! from a struct with the [`ToRecord`](macro@ToRecord) macro.

pub mod buffer;
#[cfg(feature = "std")]
pub mod writer;

pub use buffer::Encoder as BufferEncoder;
#[cfg(feature = "std")]
pub use writer::Encoder as WriterEncoder;

use crate::{
    sans::header::{DocumentHeader, PROFILE_VERSION, PROTOCOL_VERSION},
    schema::{MessageSchema, SchemaError, Values},
};

/// Document header fields written by an encoder.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Config {
    pub protocol_version: u8,
    pub profile_version: u16,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            protocol_version: PROTOCOL_VERSION,
            profile_version: PROFILE_VERSION,
        }
    }
}

impl Config {
    fn header(&self, data_size: u32) -> DocumentHeader {
        DocumentHeader {
            protocol_version: self.protocol_version,
            profile_version: self.profile_version,
            data_size,
        }
    }
}

/// Extend a record section length by a record, if it still fits the header.
fn grow(data_size: u32, len: usize) -> Option<u32> {
    u32::try_from(len)
        .ok()
        .and_then(|len| data_size.checked_add(len))
}

/// Derive [`ToRecord`] for a struct representing a single message.
///
/// _Requires Cargo feature `derive`._
///
/// # Example
///
/// Add the `message` attribute to the struct, giving its global and local
/// message numbers. Then add the `field(N, T)` attribute to each encoded
/// struct field, where `N` is the field number and `T` the base type (as
/// named by the protocol, such as `uint16` or `uint32z`). Fields are encoded
/// in declaration order.
///
/// ```
/// #[derive(Debug, ToRecord)]
/// #[message(global = 0, local = 0)]
/// struct FileId {
///     #[field(0, enum)]
///     type_: u8,
///     #[field(1, uint16)]
///     manufacturer: u16,
///     #[field(3, uint32z)]
///     serial_number: Option<u32>,
/// }
/// ```
///
/// Strings, byte arrays, and numeric arrays take a size in bytes.
///
/// ```
/// #[derive(Debug, ToRecord)]
/// #[message(global = 165, local = 3)]
/// struct AccelerometerData {
///     #[field(1, uint16, size = 60)]
///     sample_time_offset: Vec<u16>,
///     #[field(8, string, size = 16)]
///     name: String,
/// }
/// ```
///
/// Field values are cloned into a [`Value`](crate::sans::data::Value), so
/// each field type must implement [`Clone`] and `Into<Value>`. An `Option`
/// holding `None` encodes the base type's 'invalid' marker.
#[cfg(feature = "derive")]
pub use cassette_derive::ToRecord;

/// Describe a single message and supply its values.
///
/// See the [`ToRecord`](macro@ToRecord) derive macro for an automatic
/// implementation of this trait.
pub trait ToRecord {
    /// Build the schema shared by every value of this type.
    fn schema() -> Result<MessageSchema, SchemaError>;

    /// Collect the field values of this message.
    fn values(&self) -> Values;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn grow_stops_at_header_limit() {
        assert_eq!(grow(0, 18), Some(18));
        assert_eq!(grow(u32::MAX - 1, 1), Some(u32::MAX));
        assert_eq!(grow(u32::MAX, 1), None);
    }
}
