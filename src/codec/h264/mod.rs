//! # H.264/AVC bitstream helpers
//!
//! Only what the streaming path needs: keyframe classification of a raw
//! payload and Annex B framing for the command-line driver.
//!
//! ```rust
//! use h264ts::codec::h264::is_keyframe;
//!
//! let idr = [0x00, 0x00, 0x01, 0x65, 0x88, 0x84, 0x00];
//! assert!(is_keyframe(&idr));
//! ```

/// Annex B start-code framing and access-unit grouping
pub mod annexb;
/// Keyframe detection from start-code bytes
pub mod keyframe;
/// NAL unit type definitions
pub mod types;

#[doc(inline)]
pub use annexb::{split_access_units, split_nal_units};
#[doc(inline)]
pub use keyframe::is_keyframe;
pub use types::NALUnitType;
