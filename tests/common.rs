#![allow(dead_code)]

//! A minimal document walker, checking framing and splitting records.

use cassette::sans::check::compute_crc;

#[derive(Debug, PartialEq)]
pub enum Record {
    Definition {
        local: u8,
        global: u16,
        /// Field number, size, and base type code of each field.
        fields: Vec<(u8, u8, u8)>,
    },
    Data {
        local: u8,
        bytes: Vec<u8>,
    },
}

#[derive(Debug)]
pub struct Document {
    pub data_size: u32,
    pub records: Vec<Record>,
}

/// Split a document into records, asserting its header, length, and checks.
pub fn walk(document: &[u8]) -> Document {
    assert_eq!(document[0], 14, "header size");
    assert_eq!(&document[8..12], b".FIT");
    assert_eq!(compute_crc(0, &document[..14]), 0, "header check");

    let data_size = u32::from_le_bytes(document[4..8].try_into().unwrap());
    let end = 14 + data_size as usize;

    assert_eq!(document.len(), end + 2, "document length");
    assert_eq!(compute_crc(0, document), 0, "document check");

    // Data record lengths, by local message number.
    let mut lengths: [Option<usize>; 16] = Default::default();
    let mut records = vec![];
    let mut i = 14;

    while i < end {
        let header = document[i];
        let local = header & 0x0F;
        i += 1;

        if header & 0x40 != 0 {
            assert_eq!(document[i], 0, "reserved");
            assert_eq!(document[i + 1], 1, "architecture");
            let global = u16::from_be_bytes([document[i + 2], document[i + 3]]);
            let count = document[i + 4] as usize;
            i += 5;

            let fields: Vec<_> = document[i..i + 3 * count]
                .chunks(3)
                .map(|f| (f[0], f[1], f[2]))
                .collect();
            i += 3 * count;

            lengths[local as usize] = Some(fields.iter().map(|f| f.1 as usize).sum());
            records.push(Record::Definition {
                local,
                global,
                fields,
            });
        } else {
            let len = lengths[local as usize].expect("data record before its definition");
            records.push(Record::Data {
                local,
                bytes: document[i..i + len].to_vec(),
            });
            i += len;
        }
    }

    assert_eq!(i, end, "records overrun the data size");

    Document { data_size, records }
}
