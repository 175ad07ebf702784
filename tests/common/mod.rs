#![allow(dead_code)]

use async_trait::async_trait;
use h264ts::av::{CodecParameters, CodecType, Packet, VideoFrame};
use h264ts::codec::{CodecEngine, Drain, EncoderConfig, VideoDecoder, VideoEncoder};
use h264ts::format::{ContainerEngine, FormatFlags, Muxer, StreamInfo};
use h264ts::{Result, StreamerError};
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

/// Everything a [`RecordingMuxer`] was asked to do, in order.
#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    Alloc { format: String, destination: String },
    AddStream(CodecParameters),
    OpenIo,
    Header,
    Packet(Packet),
    Trailer,
    CloseIo,
}

#[derive(Debug, Clone, Default)]
pub struct EventLog(Arc<Mutex<Vec<Event>>>);

impl EventLog {
    pub fn push(&self, event: Event) {
        self.0.lock().push(event);
    }

    pub fn events(&self) -> Vec<Event> {
        self.0.lock().clone()
    }

    pub fn packets(&self) -> Vec<Packet> {
        self.0
            .lock()
            .iter()
            .filter_map(|e| match e {
                Event::Packet(p) => Some(p.clone()),
                _ => None,
            })
            .collect()
    }

    pub fn count(&self, event: &Event) -> usize {
        self.0.lock().iter().filter(|e| *e == event).count()
    }
}

/// Container engine whose muxers only record what they receive.
#[derive(Debug, Clone, Default)]
pub struct RecordingContainer {
    pub log: EventLog,
    pub flags: FormatFlags,
    pub fail_header: bool,
    pub fail_writes: bool,
}

impl ContainerEngine for RecordingContainer {
    fn alloc_muxer(&self, format: &str, destination: &str) -> Result<Box<dyn Muxer>> {
        self.log.push(Event::Alloc {
            format: format.to_string(),
            destination: destination.to_string(),
        });
        Ok(Box::new(RecordingMuxer {
            log: self.log.clone(),
            flags: self.flags,
            fail_header: self.fail_header,
            fail_writes: self.fail_writes,
            streams: 0,
        }))
    }
}

pub struct RecordingMuxer {
    log: EventLog,
    flags: FormatFlags,
    fail_header: bool,
    fail_writes: bool,
    streams: usize,
}

#[async_trait]
impl Muxer for RecordingMuxer {
    fn flags(&self) -> FormatFlags {
        self.flags
    }

    fn add_stream(&mut self, params: CodecParameters) -> Result<StreamInfo> {
        let info = StreamInfo {
            index: self.streams,
            time_base: params.time_base,
        };
        self.streams += 1;
        self.log.push(Event::AddStream(params));
        Ok(info)
    }

    async fn open_io(&mut self) -> Result<()> {
        self.log.push(Event::OpenIo);
        Ok(())
    }

    async fn write_header(&mut self) -> Result<()> {
        if self.fail_header {
            return Err(StreamerError::Format("header rejected".into()));
        }
        self.log.push(Event::Header);
        Ok(())
    }

    async fn write_packet(&mut self, packet: &Packet) -> Result<()> {
        if self.fail_writes {
            return Err(StreamerError::Format("write rejected".into()));
        }
        self.log.push(Event::Packet(packet.clone()));
        Ok(())
    }

    async fn write_trailer(&mut self) -> Result<()> {
        self.log.push(Event::Trailer);
        Ok(())
    }

    async fn close_io(&mut self) -> Result<()> {
        self.log.push(Event::CloseIo);
        Ok(())
    }
}

/// Codec engine producing pass-through stubs; counts how often each is opened.
#[derive(Debug, Default)]
pub struct StubCodecs {
    pub encoders_opened: AtomicUsize,
    pub decoders_opened: AtomicUsize,
    pub encoder_configs: Mutex<Vec<EncoderConfig>>,
    /// Frames the encoder holds back before emitting, like B-frame reordering.
    pub encoder_delay: usize,
    /// Frames produced for every packet sent to the decoder.
    pub frames_per_packet: usize,
    pub missing_encoder: bool,
    /// While set, `receive_packet` fails without consuming anything.
    pub encoder_fault: Arc<AtomicBool>,
    /// While set, `receive_frame` fails and drops the queued frames.
    pub decoder_fault: Arc<AtomicBool>,
    pub frames_encoded: Arc<AtomicUsize>,
}

impl StubCodecs {
    pub fn new() -> Self {
        Self {
            frames_per_packet: 1,
            ..Self::default()
        }
    }

    pub fn encoders_opened(&self) -> usize {
        self.encoders_opened.load(Ordering::SeqCst)
    }

    pub fn decoders_opened(&self) -> usize {
        self.decoders_opened.load(Ordering::SeqCst)
    }

    pub fn frames_encoded(&self) -> usize {
        self.frames_encoded.load(Ordering::SeqCst)
    }

    pub fn set_encoder_fault(&self, fault: bool) {
        self.encoder_fault.store(fault, Ordering::SeqCst);
    }

    pub fn set_decoder_fault(&self, fault: bool) {
        self.decoder_fault.store(fault, Ordering::SeqCst);
    }
}

impl CodecEngine for StubCodecs {
    fn open_encoder(&self, config: &EncoderConfig) -> Result<Box<dyn VideoEncoder>> {
        if self.missing_encoder {
            return Err(StreamerError::Codec("Cannot find encoder".into()));
        }
        self.encoders_opened.fetch_add(1, Ordering::SeqCst);
        self.encoder_configs.lock().push(config.clone());
        Ok(Box::new(StubEncoder {
            gop_size: config.gop_size.max(1) as usize,
            delay: self.encoder_delay,
            sent: 0,
            pending: VecDeque::new(),
            eof: false,
            fault: self.encoder_fault.clone(),
            encoded: self.frames_encoded.clone(),
        }))
    }

    fn open_decoder(&self, codec_type: CodecType) -> Result<Box<dyn VideoDecoder>> {
        if codec_type != CodecType::H264 {
            return Err(StreamerError::Codec(format!("no decoder for {:?}", codec_type)));
        }
        self.decoders_opened.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(StubDecoder {
            frames_per_packet: self.frames_per_packet,
            pending: VecDeque::new(),
            fault: self.decoder_fault.clone(),
        }))
    }
}

/// Emits one Annex B access unit per frame: IDR every `gop_size` frames.
pub struct StubEncoder {
    gop_size: usize,
    delay: usize,
    sent: usize,
    pending: VecDeque<Packet>,
    eof: bool,
    fault: Arc<AtomicBool>,
    encoded: Arc<AtomicUsize>,
}

#[async_trait]
impl VideoEncoder for StubEncoder {
    async fn send_frame(&mut self, frame: &VideoFrame) -> Result<()> {
        if self.eof {
            return Err(StreamerError::Codec("frame after end of stream".into()));
        }
        let is_key = self.sent % self.gop_size == 0;
        let nal = if is_key { 0x65 } else { 0x41 };
        let mut data = vec![0x00, 0x00, 0x00, 0x01, nal, 0x88, 0x84, 0x00];
        data.extend_from_slice(&frame.planes[0][..frame.planes[0].len().min(16)]);

        let mut packet = Packet::new(data).with_key_flag(is_key);
        if let Some(pts) = frame.pts {
            packet = packet.with_pts(pts);
        }
        self.pending.push_back(packet);
        self.sent += 1;
        self.encoded.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn send_eof(&mut self) -> Result<()> {
        self.eof = true;
        Ok(())
    }

    async fn receive_packet(&mut self) -> Result<Drain<Packet>> {
        if self.fault.load(Ordering::SeqCst) {
            return Err(StreamerError::Codec("encoder fault".into()));
        }
        if self.pending.len() > self.delay || (self.eof && !self.pending.is_empty()) {
            if let Some(packet) = self.pending.pop_front() {
                return Ok(Drain::Ready(packet));
            }
        }
        if self.eof {
            Ok(Drain::EndOfStream)
        } else {
            Ok(Drain::NeedsInput)
        }
    }

    fn close(&mut self) {
        self.pending.clear();
    }
}

pub struct StubDecoder {
    frames_per_packet: usize,
    pending: VecDeque<VideoFrame>,
    fault: Arc<AtomicBool>,
}

#[async_trait]
impl VideoDecoder for StubDecoder {
    async fn send_packet(&mut self, packet: &Packet) -> Result<()> {
        if packet.is_empty() {
            return Err(StreamerError::InvalidData("empty packet".into()));
        }
        for n in 0..self.frames_per_packet {
            let mut frame = VideoFrame::yuv420p(320, 240);
            if let Some(pts) = packet.pts {
                frame = frame.with_pts(pts + n as i64);
            }
            self.pending.push_back(frame);
        }
        Ok(())
    }

    async fn receive_frame(&mut self) -> Result<Drain<VideoFrame>> {
        if self.fault.load(Ordering::SeqCst) {
            self.pending.clear();
            return Err(StreamerError::Codec("decoder fault".into()));
        }
        Ok(match self.pending.pop_front() {
            Some(frame) => Drain::Ready(frame),
            None => Drain::NeedsInput,
        })
    }

    fn close(&mut self) {
        self.pending.clear();
    }
}
