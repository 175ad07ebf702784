use crate::av::{CodecType, Packet, PixelFormat, Rational, VideoFrame};
use crate::error::Result;
use async_trait::async_trait;

/// Outcome of asking a codec for its next output.
///
/// `NeedsInput` and `EndOfStream` are normal terminations of a drain loop,
/// not errors.
#[derive(Debug, Clone, PartialEq)]
pub enum Drain<T> {
    Ready(T),
    NeedsInput,
    EndOfStream,
}

/// Settings an encoder is opened with.
#[derive(Debug, Clone, PartialEq)]
pub struct EncoderConfig {
    pub codec_type: CodecType,
    pub bit_rate: u64,
    pub width: u32,
    pub height: u32,
    pub time_base: Rational,
    /// Distance between forced keyframes.
    pub gop_size: u32,
    pub max_b_frames: u32,
    pub pixel_format: PixelFormat,
    /// Emit parameter sets out of band instead of in the bitstream.
    pub global_header: bool,
}

#[async_trait]
pub trait VideoEncoder: Send {
    /// Submits one raw picture for compression.
    async fn send_frame(&mut self, frame: &VideoFrame) -> Result<()>;

    /// Signals that no more pictures follow so buffered output can be flushed.
    async fn send_eof(&mut self) -> Result<()> {
        Ok(())
    }

    /// Returns the next compressed packet, if one is ready.
    async fn receive_packet(&mut self) -> Result<Drain<Packet>>;

    fn close(&mut self);
}

#[async_trait]
pub trait VideoDecoder: Send {
    /// Submits one compressed packet for decompression.
    async fn send_packet(&mut self, packet: &Packet) -> Result<()>;

    /// Returns the next decoded picture, if one is ready.
    async fn receive_frame(&mut self) -> Result<Drain<VideoFrame>>;

    fn close(&mut self);
}

/// Locates and opens encoders and decoders.
///
/// Implementations wrap whatever actually compresses video: a hardware
/// encoder, a foreign library binding, or a test double.
pub trait CodecEngine: Send + Sync {
    fn open_encoder(&self, config: &EncoderConfig) -> Result<Box<dyn VideoEncoder>>;

    fn open_decoder(&self, codec_type: CodecType) -> Result<Box<dyn VideoDecoder>>;
}
