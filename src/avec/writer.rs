//! Writer-based encoder implementation.
//!
//! _Requires Cargo feature `std`._

use std::io::{self, Read, Seek, SeekFrom, Write};

use thiserror::Error;
use tracing::{debug, trace};

use crate::{
    sans::{check::Crc, header::HEADER_SIZE},
    schema::{MessageSchema, RecordError, SchemaError, SizeOverrides, Values},
};

use super::{Config, grow};

/// Errors occurring while encoding to a writer.
#[derive(Debug, Error)]
pub enum Error {
    /// An error from the supplied sink.
    #[error(transparent)]
    Io(#[from] io::Error),
    /// The supplied sink cannot seek, so the header cannot be rewritten.
    #[error("Sink does not support seeking: {0}.")]
    Unseekable(io::Error),
    /// An earlier write failed, leaving the document in an unknown state.
    #[error("Encoder is unusable after a failed write.")]
    Poisoned,
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

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Open,
    Poisoned,
}

/// Encode a document into a seekable sink.
///
/// The document begins at the sink's position when the encoder is created.
/// Completing a document rewrites its header and reads it back to compute the
/// checksum, so the sink must support reading, writing, and seeking (for
/// example, a [`std::fs::File`] opened for both, or a [`std::io::Cursor`]).
///
/// This type is also re-exported as `cassette::avec::WriterEncoder`.
#[derive(Debug)]
pub struct Encoder<W> {
    sink: W,
    config: Config,
    start: u64,
    data_size: u32,
    state: State,
}

impl<W: Read + Write + Seek> Encoder<W> {
    /// Begin a document with the default header configuration.
    pub fn new(sink: W) -> Result<Self, Error> {
        Self::with_config(sink, Config::default())
    }

    /// Begin a document, writing a provisional header.
    pub fn with_config(mut sink: W, config: Config) -> Result<Self, Error> {
        let start = sink.stream_position().map_err(Error::Unseekable)?;
        sink.write_all(&config.header(0).encode())?;

        Ok(Self {
            sink,
            config,
            start,
            data_size: 0,
            state: State::Open,
        })
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

    /// Append a data record. Nothing is written if the values do not fit the
    /// schema.
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
        if self.state == State::Poisoned {
            Err(Error::Poisoned)?;
        }

        let data_size = grow(self.data_size, r.len()).ok_or(Error::DataSize)?;

        if let Err(err) = self.sink.write_all(r) {
            self.state = State::Poisoned;
            Err(err)?;
        }
        self.data_size = data_size;

        trace!(size = r.len(), data_size, "Appended record.");
        Ok(())
    }

    /// Number of record bytes appended so far.
    pub fn data_size(&self) -> u32 {
        self.data_size
    }

    /// Borrow the underlying sink.
    pub fn get_ref(&self) -> &W {
        &self.sink
    }

    /// Complete the document, returning the sink.
    ///
    /// The header is rewritten in place with the final record length, then
    /// the header and records are read back into a fresh checksum, which is
    /// appended after the last record.
    pub fn finish(mut self) -> Result<W, Error> {
        if self.state == State::Poisoned {
            Err(Error::Poisoned)?;
        }

        let header = self.config.header(self.data_size).encode();
        let end = self.start + u64::from(HEADER_SIZE) + u64::from(self.data_size);

        self.seek(self.start)?;
        self.sink.write_all(&header)?;

        self.seek(self.start)?;
        let crc = self.read_crc(end - self.start)?;

        self.seek(end)?;
        self.sink.write_all(&crc.to_le_bytes())?;
        self.sink.flush()?;

        debug!(data_size = self.data_size, crc, "Finished document.");
        Ok(self.sink)
    }

    fn seek(&mut self, offset: u64) -> Result<(), Error> {
        self.sink
            .seek(SeekFrom::Start(offset))
            .map_err(Error::Unseekable)?;
        Ok(())
    }

    /// Read a number of bytes from the sink into a fresh checksum.
    fn read_crc(&mut self, mut remaining: u64) -> Result<u16, Error> {
        let mut crc = Crc::new();
        let mut buf = [0; 4096];

        while remaining != 0 {
            let n = remaining.min(buf.len() as u64) as usize;
            self.sink.read_exact(&mut buf[..n])?;
            crc.update(&buf[..n]);
            remaining -= n as u64;
        }

        Ok(crc.value())
    }
}
