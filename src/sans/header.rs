//! Document and record headers.

use tartan_bitfield::bitfield;
use zerocopy::{IntoBytes, byteorder::little_endian};

use super::check::compute_crc;

/// Length of an encoded document header, including its checksum.
pub const HEADER_SIZE: u8 = 14;

/// Protocol version written when none is configured.
pub const PROTOCOL_VERSION: u8 = 0x10;

/// Profile version written when none is configured.
pub const PROFILE_VERSION: u16 = 0x081C;

/// The header opening a document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DocumentHeader {
    pub protocol_version: u8,
    pub profile_version: u16,
    /// Number of record bytes following the header.
    pub data_size: u32,
}

impl DocumentHeader {
    /// Encode the header, followed by its own little-endian checksum.
    pub fn encode(&self) -> [u8; HEADER_SIZE as usize] {
        #[repr(C, packed)]
        #[derive(IntoBytes)]
        struct FileHeader {
            header_size: u8,
            protocol_version: u8,
            profile_version: little_endian::U16,
            data_size: little_endian::U32,
            data_type: [u8; 4],
        }

        let header: [u8; 12] = zerocopy::transmute!(FileHeader {
            header_size: HEADER_SIZE,
            protocol_version: self.protocol_version,
            profile_version: little_endian::U16::new(self.profile_version),
            data_size: little_endian::U32::new(self.data_size),
            data_type: *b".FIT",
        });

        let crc = compute_crc(0, &header);

        let mut r = [0; HEADER_SIZE as usize];
        r[..12].copy_from_slice(&header);
        r[12..].copy_from_slice(&crc.to_le_bytes());
        r
    }
}

/// The kind of record following a record header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordKind {
    Definition,
    Data,
}

/// Encode a normal record header for a local message number (0 to 15).
pub fn record_header(local: u8, kind: RecordKind) -> u8 {
    debug_assert!(local < 16);

    bitfield! {
        struct NormalHeader(u8) {
            [0..4] local_message: u8,
            [6] is_definition,
        }
    }

    let mut header = NormalHeader(0);
    header.set_local_message(local);
    header.set_is_definition(kind == RecordKind::Definition);

    header.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn provisional_header() {
        let header = DocumentHeader {
            protocol_version: PROTOCOL_VERSION,
            profile_version: PROFILE_VERSION,
            data_size: 0,
        };

        assert_eq!(
            header.encode(),
            *b"\x0e\x10\x1c\x08\x00\x00\x00\x00.FIT\xc5\xef"
        );
    }

    #[test]
    fn data_size_is_little_endian() {
        let header = DocumentHeader {
            protocol_version: PROTOCOL_VERSION,
            profile_version: PROFILE_VERSION,
            data_size: 18,
        };

        assert_eq!(
            header.encode(),
            *b"\x0e\x10\x1c\x08\x12\x00\x00\x00.FIT\x45\x3a"
        );
    }

    #[test]
    fn record_headers() {
        assert_eq!(record_header(0, RecordKind::Definition), 0x40);
        assert_eq!(record_header(3, RecordKind::Definition), 0x43);
        assert_eq!(record_header(0, RecordKind::Data), 0x00);
        assert_eq!(record_header(15, RecordKind::Data), 0x0F);
    }
}
