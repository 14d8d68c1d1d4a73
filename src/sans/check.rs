//! Helpers for computing cyclic redundancy checks.

const CRC_TABLE: [u16; 16] = [
    0x0000, 0xCC01, 0xD801, 0x1400, 0xF001, 0x3C00, 0x2800, 0xE401, 0xA001, 0x6C00, 0x7800,
    0xB401, 0x5000, 0x9C01, 0x8801, 0x4400,
];

/// Accumulate a slice of bytes into a cyclic redundancy check value.
///
/// Accumulation is incremental: folding `a` and then `b` into a value gives
/// the same result as folding `a` and `b` concatenated. Checksums over a
/// fresh region start from zero.
pub fn compute_crc(init: u16, r: &[u8]) -> u16 {
    r.iter().fold(init, |acc, b| crc_byte(acc, *b))
}

/// Accumulate a single byte into a cyclic redundancy check value, low nibble
/// first.
const fn crc_byte(crc: u16, b: u8) -> u16 {
    let crc = crc_nibble(crc, b & 0xF);
    crc_nibble(crc, (b >> 4) & 0xF)
}

const fn crc_nibble(crc: u16, n: u8) -> u16 {
    let tmp = CRC_TABLE[(crc & 0xF) as usize];
    let crc = (crc >> 4) & 0x0FFF;
    crc ^ tmp ^ CRC_TABLE[n as usize]
}

/// A running cyclic redundancy check over one region of a document.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Crc(u16);

impl Crc {
    /// Start a check over a fresh region.
    pub const fn new() -> Self {
        Self(0)
    }

    /// Fold bytes into the check.
    pub fn update(&mut self, r: &[u8]) {
        self.0 = compute_crc(self.0, r);
    }

    /// The check value for every byte folded in so far.
    pub const fn value(&self) -> u16 {
        self.0
    }
}
