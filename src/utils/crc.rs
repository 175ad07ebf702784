//! CRC-32/MPEG-2 as used by PSI sections (ITU-T H.222.0 annex A).
//!
//! Polynomial 0x04C11DB7, initial value 0xFFFFFFFF, no reflection and no
//! final XOR.

const POLY: u32 = 0x04C1_1DB7;

const TABLE: [u32; 256] = build_table();

const fn build_table() -> [u32; 256] {
    let mut table = [0u32; 256];
    let mut i = 0;
    while i < 256 {
        let mut crc = (i as u32) << 24;
        let mut bit = 0;
        while bit < 8 {
            crc = if crc & 0x8000_0000 != 0 { (crc << 1) ^ POLY } else { crc << 1 };
            bit += 1;
        }
        table[i] = crc;
        i += 1;
    }
    table
}

/// Table-driven CRC-32/MPEG-2 calculator.
#[derive(Debug, Clone, Copy, Default)]
pub struct Crc32Mpeg2;

impl Crc32Mpeg2 {
    /// Returns the checksum of `data`.
    ///
    /// ```
    /// use h264ts::utils::Crc32Mpeg2;
    ///
    /// assert_eq!(Crc32Mpeg2::checksum(&[0x01, 0x01]), 0xD66F_B816);
    /// ```
    pub fn checksum(data: &[u8]) -> u32 {
        data.iter().fold(0xFFFF_FFFF, |crc, &byte| {
            let index = ((crc >> 24) ^ byte as u32) & 0xFF;
            (crc << 8) ^ TABLE[index as usize]
        })
    }
}
