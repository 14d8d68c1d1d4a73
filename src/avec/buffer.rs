//! Buffer-based encoder implementation.

use alloc::vec::Vec;

use thiserror::Error;
use tracing::{debug, trace};

use crate::{
    sans::{check::compute_crc, header::HEADER_SIZE},
    schema::{MessageSchema, RecordError, SchemaError, SizeOverrides, Values},
};

use super::{Config, grow};

/// Errors occurring while encoding to a buffer.
#[derive(Debug, Error, PartialEq)]
pub enum Error {
    /// Record section would exceed the length a header can declare.
    #[error("Record section exceeds the maximum data size.")]
    DataSize,
    /// A data record could not be encoded.
    #[error("Invalid record: {0}")]
    Record(#[from] RecordError),
    /// Size overrides do not fit their schema.
    #[error("Invalid schema: {0}")]
    Schema(#[from] SchemaError),
}

/// Encode a document into an owned buffer.
///
/// This type is also re-exported as `cassette::avec::BufferEncoder`.
#[derive(Debug)]
pub struct Encoder {
    buffer: Vec<u8>,
    config: Config,
    data_size: u32,
}

impl Default for Encoder {
    fn default() -> Self {
        Self::new()
    }
}

impl Encoder {
    /// Begin a document with the default header configuration.
    pub fn new() -> Self {
        Self::with_config(Config::default())
    }

    /// Begin a document, writing a provisional header.
    pub fn with_config(config: Config) -> Self {
        Self {
            buffer: config.header(0).encode().to_vec(),
            config,
            data_size: 0,
        }
    }

    /// Append a definition record for a schema.
    pub fn definition(&mut self, schema: &MessageSchema) -> Result<(), Error> {
        trace!(global = schema.global(), local = schema.local(), "Defining message.");
        self.record(&schema.definition())
    }

    /// Append a definition record for a schema, with some fields resized.
    pub fn definition_with(
        &mut self,
        schema: &MessageSchema,
        overrides: &SizeOverrides,
    ) -> Result<(), Error> {
        trace!(global = schema.global(), local = schema.local(), "Redefining message.");
        self.record(&schema.definition_with(overrides)?)
    }

    /// Append a data record. Nothing is appended if the values do not fit
    /// the schema.
    pub fn data(&mut self, schema: &MessageSchema, values: &Values) -> Result<(), Error> {
        self.record(&schema.data(values)?)
    }

    /// Append a data record, with some fields resized.
    pub fn data_with(
        &mut self,
        schema: &MessageSchema,
        values: &Values,
        overrides: &SizeOverrides,
    ) -> Result<(), Error> {
        self.record(&schema.data_with(values, overrides)?)
    }

    /// Append an encoded record as-is.
    pub fn record(&mut self, r: &[u8]) -> Result<(), Error> {
        let data_size = grow(self.data_size, r.len()).ok_or(Error::DataSize)?;

        self.buffer.extend_from_slice(r);
        self.data_size = data_size;

        trace!(size = r.len(), data_size, "Appended record.");
        Ok(())
    }

    /// Number of record bytes appended so far.
    pub fn data_size(&self) -> u32 {
        self.data_size
    }

    /// The document so far, including its provisional header.
    pub fn as_slice(&self) -> &[u8] {
        &self.buffer
    }

    /// Complete the document, returning its bytes.
    ///
    /// The header is rewritten with the final record length, then a checksum
    /// of the header and records is appended.
    pub fn finish(self) -> Vec<u8> {
        let Self {
            mut buffer,
            config,
            data_size,
        } = self;

        buffer[..usize::from(HEADER_SIZE)].copy_from_slice(&config.header(data_size).encode());

        let crc = compute_crc(0, &buffer);
        buffer.extend_from_slice(&crc.to_le_bytes());

        debug!(data_size, crc, "Finished document.");
        buffer
    }
}
