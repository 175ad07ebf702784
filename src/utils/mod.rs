//! Small helpers shared by the container writers.

/// CRC calculation for PSI tables
pub mod crc;

pub use crc::Crc32Mpeg2;
