//! Core audio/video types shared by the codec and container layers.

mod frame;
mod packet;
pub mod rational;

pub use frame::VideoFrame;
pub use packet::Packet;
pub use rational::{rescale_q, Rational};

/// Elementary stream codecs the output side knows how to describe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CodecType {
    H264,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum PixelFormat {
    /// Planar YUV 4:2:0, 12bpp.
    #[default]
    Yuv420p,
}

/// Parameters describing one elementary stream inside a container.
#[derive(Debug, Clone, PartialEq)]
pub struct CodecParameters {
    pub codec_type: CodecType,
    pub bit_rate: u64,
    pub width: u32,
    pub height: u32,
    pub time_base: Rational,
    pub extra_data: Vec<u8>,
}
