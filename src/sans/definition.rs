//! Encoding of definition records.

use alloc::vec::Vec;

use zerocopy::{IntoBytes, byteorder::big_endian};

use super::{
    data::BaseType,
    header::{RecordKind, record_header},
};

/// Architecture byte marking multi-byte values as big-endian.
const BIG_ENDIAN: u8 = 1;

/// One field of a definition record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldDefinition {
    /// The protocol-assigned field number within its message.
    pub number: u8,
    /// Size of the field's value in bytes.
    pub size: u8,
    pub base_type: BaseType,
}

/// Append a definition record binding a local message number to a global
/// message and its fields.
///
/// Fields are written in iteration order. At most 255 fields fit a record.
pub fn encode_definition<I>(local: u8, global: u16, fields: I, out: &mut Vec<u8>)
where
    I: IntoIterator<Item = FieldDefinition>,
    I::IntoIter: ExactSizeIterator,
{
    #[repr(C, packed)]
    #[derive(IntoBytes)]
    struct DefinitionMessage {
        record_header: u8,
        reserved: u8,
        architecture: u8,
        global_message: big_endian::U16,
        fields: u8,
    }

    #[repr(C, packed)]
    #[derive(IntoBytes)]
    struct FieldHeader {
        field: u8,
        size: u8,
        base_type: u8,
    }

    let fields = fields.into_iter();
    debug_assert!(fields.len() <= usize::from(u8::MAX));

    let message: [u8; 6] = zerocopy::transmute!(DefinitionMessage {
        record_header: record_header(local, RecordKind::Definition),
        reserved: 0,
        architecture: BIG_ENDIAN,
        global_message: big_endian::U16::new(global),
        fields: fields.len() as u8,
    });

    out.reserve(message.len() + 3 * fields.len());
    out.extend_from_slice(&message);

    for field in fields {
        let field: [u8; 3] = zerocopy::transmute!(FieldHeader {
            field: field.number,
            size: field.size,
            base_type: field.base_type.code(),
        });
        out.extend_from_slice(&field);
    }
}
