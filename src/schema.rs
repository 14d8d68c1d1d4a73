//! Message schemas, and the definition and data records they encode.
//!
//! A [`MessageSchema`] is an ordered list of named fields bound to a global
//! message number and a local message number. It is built once, explicitly,
//! and then used to encode any number of records:
//!
//! ```
//! let file_id = MessageSchema::builder(0, 0)
//!     .field("type", 0, BaseType::Enum)
//!     .field("manufacturer", 1, BaseType::Uint16)
//!     .field("product", 2, BaseType::Uint16)
//!     .field("serial_number", 3, BaseType::Uint32z)
//!     .build()?;
//!
//! let definition = file_id.definition();
//! let data = file_id.data(
//!     &Values::new()
//!         .with("type", 1u8)
//!         .with("manufacturer", 0x000Fu16)
//!         .with("product", 1u16)
//!         .with("serial_number", 12345u32),
//! )?;
//! ```
//!
//! Values are always written in schema order, regardless of the order in
//! which they were supplied.

use alloc::{
    collections::{BTreeMap, BTreeSet},
    string::String,
    vec::Vec,
};

use thiserror::Error;

use crate::sans::{
    data::{BaseType, Value, ValueError},
    definition::{FieldDefinition, encode_definition},
    header::{RecordKind, record_header},
};

/// An error constructing a schema, or overriding its field sizes.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SchemaError {
    /// Two fields share a name.
    #[error("Duplicate field name `{0}`.")]
    DuplicateField(String),
    /// More fields than a definition record can hold.
    #[error("Too many fields ({0}).")]
    TooManyFields(usize),
    /// Local message numbers range from 0 to 15.
    #[error("Local message number out of range ({0}).")]
    LocalMessage(u8),
    /// Size is zero, or not a multiple of the base type width.
    #[error("Size {size} is not a positive multiple of the {base_type:?} width.")]
    InvalidSize { base_type: BaseType, size: u8 },
    /// Array does not fit a single-byte size.
    #[error("Array of {len} {base_type:?} elements is too large.")]
    ArrayLength { base_type: BaseType, len: u8 },
    /// Size override names a field not in the schema.
    #[error("Unknown field `{0}`.")]
    UnknownField(String),
}

/// An error encoding a data record. No bytes are produced on error.
#[derive(Debug, Error, PartialEq)]
pub enum RecordError {
    /// No value was supplied for a field of the schema.
    #[error("Missing value for field `{0}`.")]
    MissingField(String),
    /// A value was supplied for a field not in the schema.
    #[error("Unknown field `{0}`.")]
    UnknownField(String),
    /// A value does not fit its field.
    #[error("Cannot encode field `{field}`: {source}")]
    Encoding { field: String, source: ValueError },
    /// Size overrides do not fit the schema.
    #[error("Invalid size override: {0}")]
    Schema(#[from] SchemaError),
}

fn check_size(base_type: BaseType, size: u8) -> Result<u8, SchemaError> {
    if size == 0 || size % base_type.width() != 0 {
        Err(SchemaError::InvalidSize { base_type, size })?;
    }

    Ok(size)
}

/// A single field of a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldSchema {
    number: u8,
    base_type: BaseType,
    size: u8,
}

impl FieldSchema {
    /// A field holding one element of its base type.
    ///
    /// Strings and byte arrays hold a single byte; use [`Self::sized`] for
    /// longer ones.
    pub const fn new(number: u8, base_type: BaseType) -> Self {
        Self {
            number,
            base_type,
            size: base_type.width(),
        }
    }

    /// A field of an explicit size in bytes, which must be a multiple of the
    /// base type width.
    pub fn sized(number: u8, base_type: BaseType, size: u8) -> Result<Self, SchemaError> {
        Ok(Self {
            number,
            base_type,
            size: check_size(base_type, size)?,
        })
    }

    /// A field holding `len` elements of its base type.
    pub fn array(number: u8, base_type: BaseType, len: u8) -> Result<Self, SchemaError> {
        let size = len
            .checked_mul(base_type.width())
            .ok_or(SchemaError::ArrayLength { base_type, len })?;

        Self::sized(number, base_type, size)
    }

    /// The protocol-assigned field number.
    pub const fn number(&self) -> u8 {
        self.number
    }

    pub const fn base_type(&self) -> BaseType {
        self.base_type
    }

    /// Declared size in bytes.
    pub const fn size(&self) -> u8 {
        self.size
    }

    const fn definition(&self, size: u8) -> FieldDefinition {
        FieldDefinition {
            number: self.number,
            size,
            base_type: self.base_type,
        }
    }
}

/// The layout of a message: its numbers and an ordered list of named fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageSchema {
    global: u16,
    local: u8,
    fields: Vec<(String, FieldSchema)>,
}

impl MessageSchema {
    /// Begin building a schema for a global message number, bound to a local
    /// message number (0 to 15).
    pub fn builder(global: u16, local: u8) -> MessageSchemaBuilder {
        MessageSchemaBuilder {
            global,
            local,
            fields: Vec::new(),
        }
    }

    pub const fn global(&self) -> u16 {
        self.global
    }

    pub const fn local(&self) -> u8 {
        self.local
    }

    /// Fields in schema order.
    pub fn fields(&self) -> impl ExactSizeIterator<Item = (&str, &FieldSchema)> {
        self.fields.iter().map(|(name, field)| (name.as_str(), field))
    }

    /// Look up a field by name.
    pub fn field(&self, name: &str) -> Option<&FieldSchema> {
        self.fields
            .iter()
            .find_map(|(n, field)| (n == name).then_some(field))
    }

    /// Encode a definition record for this schema.
    pub fn definition(&self) -> Vec<u8> {
        let fields = self.fields.iter().map(|(_, f)| f.definition(f.size));

        let mut out = Vec::new();
        encode_definition(self.local, self.global, fields, &mut out);
        out
    }

    /// Encode a definition record with some fields resized.
    ///
    /// The schema itself is unchanged: overrides apply to this record only.
    /// Data records following it should be encoded with [`Self::data_with`]
    /// and the same overrides.
    pub fn definition_with(&self, overrides: &SizeOverrides) -> Result<Vec<u8>, SchemaError> {
        let sizes = self.sizes(overrides)?;
        let fields = self
            .fields
            .iter()
            .zip(sizes)
            .map(|((_, f), size)| f.definition(size));

        let mut out = Vec::new();
        encode_definition(self.local, self.global, fields, &mut out);
        Ok(out)
    }

    /// Encode a data record holding a value for every field of this schema.
    pub fn data(&self, values: &Values) -> Result<Vec<u8>, RecordError> {
        self.encode_data(values, self.fields.iter().map(|(_, f)| f.size))
    }

    /// Encode a data record with some fields resized, matching a definition
    /// from [`Self::definition_with`].
    pub fn data_with(
        &self,
        values: &Values,
        overrides: &SizeOverrides,
    ) -> Result<Vec<u8>, RecordError> {
        let sizes = self.sizes(overrides)?;
        self.encode_data(values, sizes)
    }

    /// Effective field sizes, in schema order.
    fn sizes(&self, overrides: &SizeOverrides) -> Result<Vec<u8>, SchemaError> {
        if let Some(name) = overrides.names().find(|n| self.field(n).is_none()) {
            Err(SchemaError::UnknownField(name.into()))?;
        }

        self.fields
            .iter()
            .map(|(name, field)| match overrides.get(name) {
                Some(size) => check_size(field.base_type, size),
                None => Ok(field.size),
            })
            .collect()
    }

    fn encode_data(
        &self,
        values: &Values,
        sizes: impl IntoIterator<Item = u8>,
    ) -> Result<Vec<u8>, RecordError> {
        if let Some((name, _)) = self.fields.iter().find(|(n, _)| values.get(n).is_none()) {
            Err(RecordError::MissingField(name.clone()))?;
        }

        if let Some(name) = values.names().find(|n| self.field(n).is_none()) {
            Err(RecordError::UnknownField(name.into()))?;
        }

        let mut out = Vec::new();
        out.push(record_header(self.local, RecordKind::Data));

        for ((name, field), size) in self.fields.iter().zip(sizes) {
            let value = values
                .get(name)
                .ok_or_else(|| RecordError::MissingField(name.clone()))?;

            field
                .base_type
                .encode(value, size, &mut out)
                .map_err(|source| RecordError::Encoding {
                    field: name.clone(),
                    source,
                })?;
        }

        Ok(out)
    }
}

/// Builder for a [`MessageSchema`].
///
/// Field errors are collected and reported by [`Self::build`].
#[derive(Debug, Clone)]
pub struct MessageSchemaBuilder {
    global: u16,
    local: u8,
    fields: Vec<(String, Result<FieldSchema, SchemaError>)>,
}

impl MessageSchemaBuilder {
    /// Append a field holding one element of its base type.
    pub fn field(self, name: impl Into<String>, number: u8, base_type: BaseType) -> Self {
        self.push(name, FieldSchema::new(number, base_type))
    }

    /// Append a field of an explicit size in bytes.
    pub fn sized_field(
        mut self,
        name: impl Into<String>,
        number: u8,
        base_type: BaseType,
        size: u8,
    ) -> Self {
        let field = FieldSchema::sized(number, base_type, size);
        self.fields.push((name.into(), field));
        self
    }

    /// Append a field holding `len` elements of its base type.
    pub fn array_field(
        mut self,
        name: impl Into<String>,
        number: u8,
        base_type: BaseType,
        len: u8,
    ) -> Self {
        let field = FieldSchema::array(number, base_type, len);
        self.fields.push((name.into(), field));
        self
    }

    /// Append a prepared field.
    pub fn push(mut self, name: impl Into<String>, field: FieldSchema) -> Self {
        self.fields.push((name.into(), Ok(field)));
        self
    }

    pub fn build(self) -> Result<MessageSchema, SchemaError> {
        if self.local > 15 {
            Err(SchemaError::LocalMessage(self.local))?;
        }

        if self.fields.len() > usize::from(u8::MAX) {
            Err(SchemaError::TooManyFields(self.fields.len()))?;
        }

        let mut names = BTreeSet::new();
        let fields = self
            .fields
            .into_iter()
            .map(|(name, field)| -> Result<_, SchemaError> {
                let field = field?;
                if !names.insert(name.clone()) {
                    Err(SchemaError::DuplicateField(name.clone()))?;
                }
                Ok((name, field))
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(MessageSchema {
            global: self.global,
            local: self.local,
            fields,
        })
    }
}

/// Values for the fields of one data record, by field name.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Values(BTreeMap<String, Value>);

impl Values {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a value, replacing any earlier one for the same field.
    pub fn with(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert(name, value);
        self
    }

    /// Add a value, returning any earlier one for the same field.
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        self.0.insert(name.into(), value.into())
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.0.get(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for Values {
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        Self(
            iter.into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }
}

/// Replacement sizes in bytes for some fields of a schema, by field name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SizeOverrides(BTreeMap<String, u8>);

impl SizeOverrides {
    pub fn new() -> Self {
        Self::default()
    }

    /// Resize a field, replacing any earlier override for it.
    pub fn with(mut self, name: impl Into<String>, size: u8) -> Self {
        self.0.insert(name.into(), size);
        self
    }

    pub fn get(&self, name: &str) -> Option<u8> {
        self.0.get(name).copied()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use alloc::{string::ToString, vec, vec::Vec};

    use super::*;

    fn file_id() -> MessageSchema {
        MessageSchema::builder(0, 0)
            .field("type", 0, BaseType::Enum)
            .field("manufacturer", 1, BaseType::Uint16)
            .field("product", 2, BaseType::Uint16)
            .field("serial_number", 3, BaseType::Uint32z)
            .build()
            .unwrap()
    }

    fn accelerometer() -> MessageSchema {
        MessageSchema::builder(165, 3)
            .array_field("sample_time_offset", 1, BaseType::Uint16, 30)
            .build()
            .unwrap()
    }

    #[test]
    fn rejects_bad_schemas() {
        assert_eq!(
            MessageSchema::builder(0, 16).build(),
            Err(SchemaError::LocalMessage(16))
        );

        assert_eq!(
            MessageSchema::builder(0, 0)
                .field("type", 0, BaseType::Enum)
                .field("type", 1, BaseType::Uint16)
                .build(),
            Err(SchemaError::DuplicateField("type".into()))
        );

        assert_eq!(
            MessageSchema::builder(0, 0)
                .sized_field("samples", 1, BaseType::Uint16, 5)
                .build(),
            Err(SchemaError::InvalidSize {
                base_type: BaseType::Uint16,
                size: 5
            })
        );

        assert_eq!(
            FieldSchema::sized(1, BaseType::String, 0),
            Err(SchemaError::InvalidSize {
                base_type: BaseType::String,
                size: 0
            })
        );

        assert_eq!(
            FieldSchema::array(1, BaseType::Uint32, 64),
            Err(SchemaError::ArrayLength {
                base_type: BaseType::Uint32,
                len: 64
            })
        );

        let mut builder = MessageSchema::builder(0, 0);
        for i in 0..256 {
            builder = builder.field(i.to_string(), 0, BaseType::Uint8);
        }
        assert_eq!(builder.build(), Err(SchemaError::TooManyFields(256)));
    }

    #[test]
    fn field_sizes() {
        assert_eq!(FieldSchema::new(0, BaseType::Uint32).size(), 4);
        assert_eq!(FieldSchema::new(0, BaseType::String).size(), 1);
        assert_eq!(FieldSchema::array(0, BaseType::Uint16, 30).unwrap().size(), 60);
        assert_eq!(FieldSchema::sized(8, BaseType::String, 20).unwrap().size(), 20);
    }

    #[test]
    fn definition() {
        assert_eq!(
            file_id().definition(),
            b"\x40\x00\x01\x00\x00\x04\x00\x01\x00\x01\x02\x84\x02\x02\x84\x03\x04\x8c"
        );
    }

    #[test]
    fn override_is_scoped_to_one_definition() {
        let schema = accelerometer();
        let before = schema.clone();

        let overrides = SizeOverrides::new().with("sample_time_offset", 6);
        assert_eq!(
            schema.definition_with(&overrides).unwrap(),
            b"\x43\x00\x01\x00\xa5\x01\x01\x06\x84"
        );

        assert_eq!(schema, before);
        assert_eq!(schema.definition(), b"\x43\x00\x01\x00\xa5\x01\x01\x3c\x84");
    }

    #[test]
    fn rejects_bad_overrides() {
        let schema = accelerometer();

        assert_eq!(
            schema.definition_with(&SizeOverrides::new().with("samples", 6)),
            Err(SchemaError::UnknownField("samples".into()))
        );
        assert_eq!(
            schema.definition_with(&SizeOverrides::new().with("sample_time_offset", 7)),
            Err(SchemaError::InvalidSize {
                base_type: BaseType::Uint16,
                size: 7
            })
        );
    }

    #[test]
    fn data_follows_schema_order() {
        let values = Values::new()
            .with("serial_number", 12345u32)
            .with("product", 1u16)
            .with("type", 1u8)
            .with("manufacturer", 0x000Fu16);

        assert_eq!(
            file_id().data(&values).unwrap(),
            b"\x00\x01\x00\x0f\x00\x01\x00\x00\x30\x39"
        );
    }

    #[test]
    fn data_with_overrides() {
        let schema = accelerometer();
        let overrides = SizeOverrides::new().with("sample_time_offset", 6);
        let values = Values::new().with("sample_time_offset", vec![0u16, 1, 2]);

        assert_eq!(
            schema.data_with(&values, &overrides).unwrap(),
            b"\x03\x00\x00\x00\x01\x00\x02"
        );

        // Without the override, the array is too short for the declared size.
        assert_eq!(
            schema.data(&values),
            Err(RecordError::Encoding {
                field: "sample_time_offset".into(),
                source: ValueError::Shape {
                    expected: 30,
                    found: 3
                }
            })
        );
    }

    #[test]
    fn missing_field() {
        let values: Values = [("type", 1u32), ("manufacturer", 15), ("product", 1)]
            .into_iter()
            .collect();

        assert_eq!(
            file_id().data(&values),
            Err(RecordError::MissingField("serial_number".into()))
        );
    }

    #[test]
    fn missing_field_takes_precedence() {
        let values = Values::new()
            .with("type", "not a number")
            .with("manufacturer", 15u16);

        assert_eq!(
            file_id().data(&values),
            Err(RecordError::MissingField("product".into()))
        );
    }

    #[test]
    fn unknown_field() {
        let values = Values::new()
            .with("type", 1u8)
            .with("manufacturer", 15u16)
            .with("product", 1u16)
            .with("serial_number", 1u32)
            .with("product_name", "TEST");

        assert_eq!(
            file_id().data(&values),
            Err(RecordError::UnknownField("product_name".into()))
        );
    }

    #[test]
    fn encoding_error_names_field() {
        let values = Values::new()
            .with("type", 300u32)
            .with("manufacturer", 15u16)
            .with("product", 1u16)
            .with("serial_number", 1u32);

        assert_eq!(
            file_id().data(&values),
            Err(RecordError::Encoding {
                field: "type".into(),
                source: ValueError::OutOfRange(BaseType::Enum)
            })
        );
    }

    #[test]
    fn invalid_values() {
        let values: Values = file_id()
            .fields()
            .map(|(name, _)| (name, Value::Invalid))
            .collect();

        let data: Vec<u8> = file_id().data(&values).unwrap();
        assert_eq!(data, b"\x00\xff\xff\xff\xff\xff\x00\x00\x00\x00");
    }
}
