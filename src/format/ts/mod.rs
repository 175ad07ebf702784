//! # MPEG Transport Stream (TS) output
//!
//! Writes elementary streams as an MPEG-2 transport stream:
//!
//! - PAT/PMT generation with CRC32
//! - PES framing, including segmentation of payloads over 64 KiB
//! - 188-byte packetization with continuity counters, PCR and stuffing
//! - File, UDP and TCP sinks
//!
//! ## Example Usage
//!
//! ```rust
//! use bytes::BytesMut;
//! use h264ts::av::{CodecParameters, CodecType, Packet, Rational};
//! use h264ts::format::ts::{TsMuxer, TS_PACKET_SIZE};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let mut muxer = TsMuxer::new();
//! muxer.add_stream(CodecParameters {
//!     codec_type: CodecType::H264,
//!     bit_rate: 2_000_000,
//!     width: 1280,
//!     height: 720,
//!     time_base: Rational::from_fps(30),
//!     extra_data: Vec::new(),
//! })?;
//!
//! let mut output = BytesMut::new();
//! muxer.write_tables(&mut output)?;
//! muxer.write_packet(&Packet::new(vec![0u8; 1024]).with_pts(0), &mut output)?;
//! assert_eq!(output.len() % TS_PACKET_SIZE, 0);
//! # Ok(())
//! # }
//! ```

/// TS muxer and output context
pub mod muxer;

/// PES header synthesis
pub mod pes;

/// Output destinations
pub mod sink;

/// Core TS types and constants
pub mod types;

pub use muxer::{TsContainer, TsMuxer, TsOutput};
pub use pes::{PesHeader, PesStreamType, MAX_PES_PACKET_LEN};
pub use sink::{Destination, Sink};
pub use types::{TSHeader, PID_PAT, PID_PMT, STREAM_TYPE_H264, TS_PACKET_SIZE};
