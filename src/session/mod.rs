//! # Streaming session
//!
//! [`StreamingSession`] turns caller-supplied H.264 data into an MPEG-TS
//! stream. Three inputs are accepted:
//!
//! - already encoded access units ([`StreamingSession::stream_encoded_data`])
//! - raw pictures compressed by an injected encoder ([`StreamingSession::stream_frame`])
//! - foreign encodings decoded and re-encoded ([`StreamingSession::stream_reencode_data`])
//!
//! ## Example
//!
//! ```rust,no_run
//! use h264ts::StreamingSession;
//!
//! #[tokio::main]
//! async fn main() -> h264ts::Result<()> {
//!     let mut session = StreamingSession::new("udp://127.0.0.1:5000", 1280, 720, 30);
//!     session.open().await?;
//!
//!     // SPS and PPS, sent in front of the first access unit
//!     session.register_es_header(&[0x00, 0x00, 0x00, 0x01, 0x67, 0x42, 0x00, 0x1f]);
//!
//!     let access_unit = vec![0x00, 0x00, 0x00, 0x01, 0x65, 0x88, 0x84, 0x00];
//!     session.stream_encoded_data(access_unit, 0).await?;
//!
//!     session.close().await
//! }
//! ```

mod diagnostics;
mod es_header;
mod wrap;

pub use diagnostics::{Diagnostics, LogDiagnostics, RecordingDiagnostics};
pub use es_header::EsHeaderBuffer;
pub use wrap::wrap_packet;

use crate::av::{CodecParameters, CodecType, Packet, PixelFormat, VideoFrame};
use crate::codec::{CodecEngine, Drain, EncoderConfig, VideoDecoder, VideoEncoder};
use crate::config::StreamerConfig;
use crate::error::{Result, StreamerError};
use crate::format::{ContainerEngine, Muxer, StreamInfo, TsContainer, FORMAT_MPEGTS};
use bytes::Bytes;
use std::sync::Arc;

/// Size of the zeroed extradata block attached to the output stream.
pub const INPUT_PADDING_SIZE: usize = 64;

/// Lifecycle position of a [`StreamingSession`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// No output context; only `open` does anything.
    Closed,
    /// Header written, codecs not yet initialized.
    Opened,
    /// Open, with both encoder and decoder available.
    CodecReady,
}

struct Output {
    muxer: Box<dyn Muxer>,
    stream: StreamInfo,
    io_opened: bool,
}

/// One H.264 video stream written to an MPEG-TS destination.
///
/// Await [`StreamingSession::close`] before dropping an open session: drop
/// cannot run async I/O, so it writes no trailer and anything still buffered
/// by the destination is lost.
pub struct StreamingSession {
    encoder: Option<Box<dyn VideoEncoder>>,
    decoder: Option<Box<dyn VideoDecoder>>,
    output: Option<Output>,
    config: StreamerConfig,
    container: Arc<dyn ContainerEngine>,
    codecs: Option<Arc<dyn CodecEngine>>,
    diagnostics: Arc<dyn Diagnostics>,
    es_header: EsHeaderBuffer,
}

impl StreamingSession {
    /// Creates a closed session writing to the native MPEG-TS output.
    ///
    /// # Arguments
    ///
    /// * `destination` - File path, `udp://host:port` or `tcp://host:port`
    /// * `width`, `height` - Picture size advertised for the video stream
    /// * `fps` - Integer frame rate; the stream time base is `1/fps`
    ///
    /// Bit rate, GOP size and B-frames keep their [`StreamerConfig`] defaults.
    pub fn new(destination: impl Into<String>, width: u32, height: u32, fps: u32) -> Self {
        Self::from_config(StreamerConfig::new(destination, width, height, fps))
    }

    /// Creates a closed session from a full configuration.
    ///
    /// The configuration is validated by [`Self::open`], not here.
    pub fn from_config(config: StreamerConfig) -> Self {
        Self {
            encoder: None,
            decoder: None,
            output: None,
            config,
            container: Arc::new(TsContainer),
            codecs: None,
            diagnostics: Arc::new(LogDiagnostics),
            es_header: EsHeaderBuffer::new(),
        }
    }

    /// Replaces the native MPEG-TS writer.
    pub fn with_container_engine(mut self, container: Arc<dyn ContainerEngine>) -> Self {
        self.container = container;
        self
    }

    /// Provides the encoder/decoder factory used by [`Self::initialize_codec`].
    pub fn with_codec_engine(mut self, codecs: Arc<dyn CodecEngine>) -> Self {
        self.codecs = Some(codecs);
        self
    }

    /// Routes failure messages to `diagnostics` instead of the `log` facade.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use h264ts::session::RecordingDiagnostics;
    /// use h264ts::StreamingSession;
    /// use std::sync::Arc;
    ///
    /// let recorder = RecordingDiagnostics::new();
    /// let session = StreamingSession::new("out.ts", 320, 240, 30)
    ///     .with_diagnostics(Arc::new(recorder.clone()));
    /// assert!(recorder.is_empty());
    /// # drop(session);
    /// ```
    pub fn with_diagnostics(mut self, diagnostics: Arc<dyn Diagnostics>) -> Self {
        self.diagnostics = diagnostics;
        self
    }

    /// Parameters the session was created with.
    pub fn config(&self) -> &StreamerConfig {
        &self.config
    }

    /// Current lifecycle position, derived from the resources held.
    pub fn state(&self) -> SessionState {
        match (&self.output, &self.encoder, &self.decoder) {
            (None, _, _) => SessionState::Closed,
            (Some(_), Some(_), Some(_)) => SessionState::CodecReady,
            (Some(_), _, _) => SessionState::Opened,
        }
    }

    /// Descriptor of the video stream, while open.
    pub fn stream_info(&self) -> Option<StreamInfo> {
        self.output.as_ref().map(|output| output.stream)
    }

    /// Whether the first encoded payload has gone out, closing the header latch.
    pub fn es_header_sent(&self) -> bool {
        self.es_header.is_sent()
    }

    /// Allocates the output context, adds the video stream, opens the
    /// destination and writes the container header.
    pub async fn open(&mut self) -> Result<()> {
        if self.output.is_some() {
            return Err(self.report("Cannot open session", StreamerError::AlreadyOpen));
        }
        self.config
            .validate()
            .map_err(|e| self.report("Invalid session configuration", e))?;

        let mut muxer = self
            .container
            .alloc_muxer(FORMAT_MPEGTS, &self.config.destination)
            .map_err(|e| self.report("Cannot allocate output context", e))?;

        let stream = muxer
            .add_stream(CodecParameters {
                codec_type: CodecType::H264,
                bit_rate: self.config.bit_rate,
                width: self.config.width,
                height: self.config.height,
                time_base: self.config.time_base(),
                extra_data: vec![0; INPUT_PADDING_SIZE],
            })
            .map_err(|e| self.report("Unable to create output stream", e))?;

        let io_opened = !muxer.flags().no_file;
        if io_opened {
            let opened = muxer.open_io().await;
            opened.map_err(|e| self.report("Cannot open URL for output", e))?;
        }

        if let Err(e) = muxer.write_header().await {
            if io_opened {
                if let Err(close_err) = muxer.close_io().await {
                    log::warn!("closing output after failed header: {}", close_err);
                }
            }
            return Err(self.report("Failed to write header", e));
        }

        log::debug!(
            "opened {} ({}x{} @ {} fps)",
            self.config.destination,
            self.config.width,
            self.config.height,
            self.config.fps
        );
        self.output = Some(Output {
            muxer,
            stream,
            io_opened,
        });
        Ok(())
    }

    /// Creates whichever of encoder and decoder does not exist yet.
    pub async fn initialize_codec(&mut self) -> Result<()> {
        if self.encoder.is_some() && self.decoder.is_some() {
            return Ok(());
        }

        let global_header = match &self.output {
            Some(output) => output.muxer.flags().global_header,
            None => return Err(self.report("Cannot initialize codec", StreamerError::NotOpen)),
        };
        let codecs = match &self.codecs {
            Some(codecs) => Arc::clone(codecs),
            None => {
                return Err(self.report(
                    "Cannot find encoder",
                    StreamerError::Codec("no codec engine available for H.264".into()),
                ))
            }
        };

        if self.encoder.is_none() {
            let config = EncoderConfig {
                codec_type: CodecType::H264,
                bit_rate: self.config.bit_rate,
                width: self.config.width,
                height: self.config.height,
                time_base: self.config.time_base(),
                gop_size: self.config.gop_size,
                max_b_frames: self.config.max_b_frames,
                pixel_format: PixelFormat::Yuv420p,
                global_header,
            };
            let encoder = codecs
                .open_encoder(&config)
                .map_err(|e| self.report("Cannot open encoder", e))?;
            self.encoder = Some(encoder);
        }

        if self.decoder.is_none() {
            let decoder = codecs
                .open_decoder(CodecType::H264)
                .map_err(|e| self.report("Cannot open decoder", e))?;
            self.decoder = Some(decoder);
        }

        log::debug!("codecs ready for {}", self.config.destination);
        Ok(())
    }

    /// Appends bytes to the header sent in front of the first encoded payload.
    ///
    /// Typically SPS and PPS with their start codes. Bytes registered after
    /// the first [`Self::stream_encoded_data`] call are never sent.
    pub fn register_es_header(&mut self, header: &[u8]) {
        self.es_header.append(header);
    }

    /// Writes one already encoded payload.
    ///
    /// # Arguments
    ///
    /// * `data` - One access unit in Annex B form; shared, not copied, unless
    ///   the registered header has to be prepended
    /// * `timestamp_micros` - Presentation time in microseconds, rescaled to
    ///   the stream time base
    pub async fn stream_encoded_data(
        &mut self,
        data: impl Into<Bytes>,
        timestamp_micros: i64,
    ) -> Result<()> {
        let stream = match self.stream_info() {
            Some(stream) => stream,
            None => return Err(self.report("Cannot stream encoded data", StreamerError::NotOpen)),
        };

        let payload = self.es_header.prepare(data.into());
        let packet = wrap_packet(payload, timestamp_micros, &stream);
        let written = self.write_packet(&packet).await;
        written.map_err(|e| self.report("Error writing encoded data", e))
    }

    /// Encodes `frame` and writes every packet the encoder has ready.
    ///
    /// Fails with [`StreamerError::CodecNotInitialized`] before
    /// [`Self::initialize_codec`]. An encoder error while draining fails the
    /// call; the session stays usable.
    pub async fn stream_frame(&mut self, frame: &VideoFrame) -> Result<()> {
        let sent = match self.encoder.as_mut() {
            Some(encoder) => encoder.send_frame(frame).await,
            None => {
                return Err(self.report("Must initialize codec", StreamerError::CodecNotInitialized))
            }
        };
        sent.map_err(|e| self.report("Error sending a frame for encoding", e))?;

        self.drain_encoder().await
    }

    /// Decodes `data` and streams each resulting picture through the encoder.
    ///
    /// Stops at the first picture that cannot be streamed.
    pub async fn stream_reencode_data(
        &mut self,
        data: impl Into<Bytes>,
        timestamp_micros: i64,
    ) -> Result<()> {
        let stream = match (self.stream_info(), self.decoder.is_some()) {
            (_, false) => {
                return Err(self.report("Must initialize codec", StreamerError::CodecNotInitialized))
            }
            (None, true) => {
                return Err(self.report("Cannot re-encode data", StreamerError::NotOpen))
            }
            (Some(stream), true) => stream,
        };

        let packet = wrap_packet(data.into(), timestamp_micros, &stream);
        let sent = match self.decoder.as_mut() {
            Some(decoder) => decoder.send_packet(&packet).await,
            None => return Err(StreamerError::CodecNotInitialized),
        };
        sent.map_err(|e| self.report("Error sending a packet for decoding", e))?;

        loop {
            let received = match self.decoder.as_mut() {
                Some(decoder) => decoder.receive_frame().await,
                None => return Err(StreamerError::CodecNotInitialized),
            };
            match received {
                Ok(Drain::Ready(frame)) => self.stream_frame(&frame).await?,
                Ok(Drain::NeedsInput) | Ok(Drain::EndOfStream) => return Ok(()),
                Err(e) => return Err(self.report("Error during decoding", e)),
            }
        }
    }

    /// Flushes the encoder, writes the trailer and releases encoder,
    /// decoder, destination and output context in that order.
    pub async fn close(&mut self) -> Result<()> {
        if self.output.is_none() {
            log::debug!("close on a session that is not open");
            return Ok(());
        }

        if let Some(encoder) = self.encoder.as_mut() {
            let flushed = encoder.send_eof().await;
            match flushed {
                Ok(()) => {
                    if let Err(e) = self.drain_encoder().await {
                        log::warn!("encoder flush incomplete: {}", e);
                    }
                }
                Err(e) => log::warn!("encoder flush failed: {}", e),
            }
        }

        let mut result = match self.output.as_mut() {
            Some(output) => output.muxer.write_trailer().await,
            None => Ok(()),
        };

        if let Some(mut encoder) = self.encoder.take() {
            encoder.close();
        }
        if let Some(mut decoder) = self.decoder.take() {
            decoder.close();
        }

        if let Some(mut output) = self.output.take() {
            if output.io_opened {
                let closed = output.muxer.close_io().await;
                result = result.and(closed);
            }
        }

        match result {
            Ok(()) => {
                log::debug!("closed {}", self.config.destination);
                Ok(())
            }
            Err(e) => Err(self.report("Error closing output", e)),
        }
    }

    async fn drain_encoder(&mut self) -> Result<()> {
        loop {
            let received = match self.encoder.as_mut() {
                Some(encoder) => encoder.receive_packet().await,
                None => return Ok(()),
            };
            match received {
                Ok(Drain::Ready(packet)) => {
                    let stream = self.stream_info().ok_or(StreamerError::NotOpen);
                    let stream = stream.map_err(|e| self.report("Cannot write encoded frame", e))?;
                    let packet = packet.with_stream_index(stream.index);
                    let written = self.write_packet(&packet).await;
                    written.map_err(|e| self.report("Error writing encoded frame", e))?;
                }
                Ok(Drain::NeedsInput) | Ok(Drain::EndOfStream) => return Ok(()),
                Err(e) => return Err(self.report("Error during encoding", e)),
            }
        }
    }

    async fn write_packet(&mut self, packet: &Packet) -> Result<()> {
        match self.output.as_mut() {
            Some(output) => output.muxer.write_packet(packet).await,
            None => Err(StreamerError::NotOpen),
        }
    }

    fn report(&self, context: &str, err: StreamerError) -> StreamerError {
        self.diagnostics.report(&format!("{context}: {err}"));
        err
    }
}

impl Drop for StreamingSession {
    fn drop(&mut self) {
        if self.output.is_some() {
            self.diagnostics.report(&format!(
                "session for {} dropped while open; trailer not written and buffered output discarded",
                self.config.destination
            ));
        }
        if let Some(mut encoder) = self.encoder.take() {
            encoder.close();
        }
        if let Some(mut decoder) = self.decoder.take() {
            decoder.close();
        }
    }
}
