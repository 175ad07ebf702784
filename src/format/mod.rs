use crate::av::{CodecParameters, Packet, Rational};
use crate::Result;

pub mod ts;

/// Container format name understood by [`ts::TsContainer`].
pub const FORMAT_MPEGTS: &str = "mpegts";

/// Capabilities of an output format that change how a session drives it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FormatFlags {
    /// The format does its own I/O (or none); `open_io`/`close_io` are skipped.
    pub no_file: bool,
    /// Codec parameter sets belong in the container header, not the bitstream.
    pub global_header: bool,
}

/// Handle to a stream created on an output context.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StreamInfo {
    pub index: usize,
    pub time_base: Rational,
}

/// An allocated output context for one destination.
///
/// Call order: `add_stream`*, `open_io` (unless [`FormatFlags::no_file`]),
/// `write_header`, `write_packet`*, `write_trailer`, `close_io`.
#[async_trait::async_trait]
pub trait Muxer: Send {
    fn flags(&self) -> FormatFlags;

    /// Declares an elementary stream; must precede `write_header`.
    fn add_stream(&mut self, params: CodecParameters) -> Result<StreamInfo>;

    /// Opens the destination for writing.
    async fn open_io(&mut self) -> Result<()>;

    /// Write stream header information
    async fn write_header(&mut self) -> Result<()>;

    /// Writes one packet, letting the muxer interleave it with other streams.
    ///
    /// Timestamps are in the time base of the packet's stream.
    async fn write_packet(&mut self, packet: &Packet) -> Result<()>;

    /// Write stream trailer information
    async fn write_trailer(&mut self) -> Result<()>;

    /// Closes the destination opened by `open_io`.
    async fn close_io(&mut self) -> Result<()>;
}

/// Allocates output contexts by format name.
pub trait ContainerEngine: Send + Sync {
    fn alloc_muxer(&self, format: &str, destination: &str) -> Result<Box<dyn Muxer>>;
}

pub use self::ts::{TsContainer, TsMuxer, TsOutput};
