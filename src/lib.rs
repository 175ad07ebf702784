#![cfg_attr(docsrs, feature(doc_cfg))]
#![deny(rustdoc::missing_crate_level_docs)]

//! # h264ts - H.264 to MPEG-TS streaming
//!
//! `h264ts` writes H.264 video into an MPEG transport stream on a file, UDP
//! or TCP destination. Video can arrive already encoded, as raw pictures for
//! an injected encoder, or in a foreign encoding that is decoded and
//! re-encoded on the way.
//!
//! ## Features
//!
//! - Keyframe classification straight from start-code bytes
//! - Out-of-band elementary stream header (SPS/PPS) injection
//! - Microsecond to stream time base rescaling with exact rounding
//! - Native MPEG-TS writer: PAT/PMT, PES framing, PCR, continuity counters
//! - TOML and environment based configuration
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use h264ts::{StreamerConfig, StreamingSession};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = StreamerConfig::load()?;
//!     let mut session = StreamingSession::from_config(config);
//!     session.open().await?;
//!
//!     let data = std::fs::read("input.h264")?;
//!     for (i, unit) in h264ts::codec::h264::split_access_units(&data).into_iter().enumerate() {
//!         session.stream_encoded_data(unit, i as i64 * 1_000_000 / 30).await?;
//!     }
//!
//!     session.close().await?;
//!     Ok(())
//! }
//! ```
//!
//! ## Module Overview
//!
//! - `av`: packets, raw frames, codec parameters and time bases
//! - `codec`: H.264 bitstream helpers and the encoder/decoder traits
//! - `format`: container traits and the MPEG-TS writer
//! - `session`: the streaming session state machine
//! - `config`: session configuration
//! - `error`: error type and result alias

/// Audio/Video base types and utilities
pub mod av;

/// Codec helpers and engine traits
pub mod codec;

/// Configuration module
pub mod config;

/// Error types and utilities
pub mod error;

/// Container formats
pub mod format;

/// Streaming session
pub mod session;

/// Common utilities and helper functions
pub mod utils;

pub use config::StreamerConfig;
pub use error::{Result, StreamerError};
pub use session::{SessionState, StreamingSession};
