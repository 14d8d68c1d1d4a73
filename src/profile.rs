//! A handful of message schemas from the FIT profile.
//!
//! Each constructor returns the full field list for its message, bound to the
//! given local message number. Since a data record needs a value for every
//! field of its schema, applications writing only some fields should build a
//! narrower schema with [`MessageSchema::builder`] and the global numbers in
//! [`global`].

use crate::{
    sans::data::BaseType,
    schema::{MessageSchema, MessageSchemaBuilder, SchemaError},
};

/// Global message numbers.
pub mod global {
    pub const FILE_ID: u16 = 0;
    pub const LAP: u16 = 19;
    pub const RECORD: u16 = 20;
    pub const SEGMENT_LAP: u16 = 142;
    pub const TIMESTAMP_CORRELATION: u16 = 162;
    pub const ACCELEROMETER_DATA: u16 = 165;
}

/// Seconds from the Unix epoch to the FIT epoch (1989-12-31 00:00 UTC).
pub const FIT_EPOCH: u64 = 631_065_600;

/// Convert seconds since the Unix epoch to a FIT `date_time`, if the instant
/// is representable.
pub fn timestamp_from_unix(seconds: u64) -> Option<u32> {
    seconds
        .checked_sub(FIT_EPOCH)
        .and_then(|s| u32::try_from(s).ok())
}

pub fn file_id(local: u8) -> Result<MessageSchema, SchemaError> {
    MessageSchema::builder(global::FILE_ID, local)
        .field("type", 0, BaseType::Enum)
        .field("manufacturer", 1, BaseType::Uint16)
        .field("product", 2, BaseType::Uint16)
        .field("serial_number", 3, BaseType::Uint32z)
        .field("time_created", 4, BaseType::Uint32)
        .field("number", 5, BaseType::Uint16)
        .sized_field("product_name", 8, BaseType::String, 20)
        .build()
}

fn lap_fields(builder: MessageSchemaBuilder) -> MessageSchemaBuilder {
    builder
        .field("message_index", 254, BaseType::Uint16)
        .field("timestamp", 253, BaseType::Uint32)
        .field("event", 0, BaseType::Enum)
        .field("event_type", 1, BaseType::Enum)
        .field("start_time", 2, BaseType::Uint32)
        .field("start_position_lat", 3, BaseType::Sint32)
        .field("start_position_long", 4, BaseType::Sint32)
        .field("end_position_lat", 5, BaseType::Sint32)
        .field("end_position_long", 6, BaseType::Sint32)
        .field("total_elapsed_time", 7, BaseType::Uint32)
        .field("total_timer_time", 8, BaseType::Uint32)
        .field("total_distance", 9, BaseType::Uint32)
}

pub fn lap(local: u8) -> Result<MessageSchema, SchemaError> {
    lap_fields(MessageSchema::builder(global::LAP, local)).build()
}

/// A periodic sample of position and sensor readings.
pub fn record(local: u8) -> Result<MessageSchema, SchemaError> {
    MessageSchema::builder(global::RECORD, local)
        .field("timestamp", 253, BaseType::Uint32)
        .field("position_lat", 0, BaseType::Sint32)
        .field("position_long", 1, BaseType::Sint32)
        .field("altitude", 2, BaseType::Uint16)
        .field("heart_rate", 3, BaseType::Uint8)
        .field("cadence", 4, BaseType::Uint8)
        .field("distance", 5, BaseType::Uint32)
        .field("speed", 6, BaseType::Uint16)
        .field("power", 7, BaseType::Uint16)
        .sized_field("compressed_speed_distance", 8, BaseType::Byte, 3)
        .field("grade", 9, BaseType::Sint16)
        .build()
}

pub fn segment_lap(local: u8) -> Result<MessageSchema, SchemaError> {
    lap_fields(MessageSchema::builder(global::SEGMENT_LAP, local))
        .sized_field("name", 29, BaseType::String, 16)
        .build()
}

pub fn timestamp_correlation(local: u8) -> Result<MessageSchema, SchemaError> {
    MessageSchema::builder(global::TIMESTAMP_CORRELATION, local)
        .field("timestamp", 253, BaseType::Uint32)
        .field("fractional_timestamp", 0, BaseType::Uint16)
        .field("system_timestamp", 1, BaseType::Uint32)
        .field("fractional_system_timestamp", 2, BaseType::Uint16)
        .field("local_timestamp", 3, BaseType::Uint32)
        .field("timestamp_ms", 4, BaseType::Uint16)
        .field("system_timestamp_ms", 5, BaseType::Uint16)
        .build()
}

/// Accelerometer sample offsets, holding up to `samples` offsets in
/// milliseconds. Partial buffers are written by overriding the field size.
pub fn accelerometer_data(local: u8, samples: u8) -> Result<MessageSchema, SchemaError> {
    MessageSchema::builder(global::ACCELEROMETER_DATA, local)
        .array_field("sample_time_offset", 1, BaseType::Uint16, samples)
        .build()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn schemas_build() {
        assert_eq!(file_id(0).unwrap().fields().len(), 7);
        assert_eq!(lap(2).unwrap().fields().len(), 12);
        assert_eq!(record(1).unwrap().fields().len(), 11);
        assert_eq!(segment_lap(2).unwrap().fields().len(), 13);
        assert_eq!(timestamp_correlation(0).unwrap().fields().len(), 7);

        let accel = accelerometer_data(3, 30).unwrap();
        assert_eq!(accel.field("sample_time_offset").unwrap().size(), 60);
    }

    #[test]
    fn local_message_is_checked() {
        assert_eq!(record(16), Err(SchemaError::LocalMessage(16)));
    }

    #[test]
    fn timestamps() {
        assert_eq!(timestamp_from_unix(FIT_EPOCH), Some(0));
        assert_eq!(timestamp_from_unix(1_000_000_000), Some(368_934_400));
        assert_eq!(timestamp_from_unix(0), None);
        assert_eq!(timestamp_from_unix(FIT_EPOCH + u64::from(u32::MAX) + 1), None);
    }
}
