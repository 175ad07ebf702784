use super::pes::{PesHeader, PesStreamType};
use super::sink::{Destination, Sink};
use super::types::*;
use crate::av::{rescale_q, CodecParameters, Packet, Rational};
use crate::error::{Result, StreamerError};
use crate::format::{ContainerEngine, FormatFlags, Muxer, StreamInfo, FORMAT_MPEGTS};
use async_trait::async_trait;
use bytes::{BufMut, BytesMut};

/// Minimum distance between two PCRs on the PCR PID: 40 ms at 90 kHz.
const PCR_INTERVAL: u64 = 3_600;
/// Added to every PTS and DTS so both stay 1.4 s ahead of the PCR.
const PTS_OFFSET: u64 = 126_000;

#[derive(Debug)]
struct TsStream {
    params: CodecParameters,
    pid: u16,
    stream_id: PesStreamType,
    continuity_counter: u8,
}

impl TsStream {
    fn next_continuity_counter(&mut self) -> u8 {
        let counter = self.continuity_counter;
        self.continuity_counter = (counter + 1) & 0x0F;
        counter
    }
}

/// Packetizes elementary stream packets into 188-byte transport packets.
///
/// One program, PMT on [`PID_PMT`], elementary streams on consecutive PIDs
/// from [`PID_FIRST_ELEMENTARY`], PCR carried by the first stream. PAT and
/// PMT are repeated in front of every keyframe.
#[derive(Debug, Default)]
pub struct TsMuxer {
    streams: Vec<TsStream>,
    pat_continuity: u8,
    pmt_continuity: u8,
    /// Highest 90 kHz timestamp seen so far; drives the PCR.
    clock: Option<u64>,
    last_pcr: Option<u64>,
}

impl TsMuxer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_stream(&mut self, params: CodecParameters) -> Result<StreamInfo> {
        if !params.time_base.is_valid() {
            return Err(StreamerError::InvalidData(format!(
                "invalid time base {}",
                params.time_base
            )));
        }

        let index = self.streams.len();
        let info = StreamInfo {
            index,
            time_base: params.time_base,
        };
        self.streams.push(TsStream {
            params,
            pid: PID_FIRST_ELEMENTARY + index as u16,
            stream_id: PesStreamType::Video,
            continuity_counter: 0,
        });
        Ok(info)
    }

    /// Appends one PAT and one PMT packet to `out`.
    pub fn write_tables(&mut self, out: &mut BytesMut) -> Result<()> {
        let first = self
            .streams
            .first()
            .ok_or_else(|| StreamerError::Format("no streams to describe".into()))?;

        let pat = PAT {
            entries: vec![PATEntry {
                program_number: PROGRAM_NUMBER,
                program_map_pid: PID_PMT,
            }],
        };
        let pmt = PMT {
            pcr_pid: first.pid,
            elementary_stream_infos: self
                .streams
                .iter()
                .map(|s| ElementaryStreamInfo {
                    stream_type: stream_type_for(s.params.codec_type),
                    elementary_pid: s.pid,
                })
                .collect(),
        };

        out.extend_from_slice(&psi_packet(PID_PAT, self.pat_continuity, &pat.section())?);
        self.pat_continuity = (self.pat_continuity + 1) & 0x0F;
        out.extend_from_slice(&psi_packet(PID_PMT, self.pmt_continuity, &pmt.section())?);
        self.pmt_continuity = (self.pmt_continuity + 1) & 0x0F;
        Ok(())
    }

    /// Appends the transport packets carrying `packet` to `out`.
    ///
    /// Payloads larger than one PES packet can declare are split across
    /// several; only the first carries the timestamps. A DTS is written when
    /// it differs from the PTS.
    pub fn write_packet(&mut self, packet: &Packet, out: &mut BytesMut) -> Result<()> {
        let index = packet.stream_index;
        let (time_base, stream_id) = match self.streams.get(index) {
            Some(stream) => (stream.params.time_base, stream.stream_id),
            None => {
                return Err(StreamerError::InvalidData(format!(
                    "packet for unknown stream {index}"
                )))
            }
        };

        let pts = packet.pts.map(|pts| to_mpeg_clock(pts, time_base));
        let dts = packet.dts.map(|dts| to_mpeg_clock(dts, time_base));
        let clock = dts.or(pts);
        if let Some(clock) = clock {
            self.clock = Some(self.clock.map_or(clock, |c| c.max(clock)));
        }

        if packet.is_key {
            self.write_tables(out)?;
        }

        let pcr = match (index, self.clock) {
            (0, Some(clock)) if self.last_pcr.map_or(true, |last| clock >= last + PCR_INTERVAL) => {
                self.last_pcr = Some(clock);
                Some(clock)
            }
            _ => None,
        };

        let mut remaining: &[u8] = &packet.data;
        let mut first = true;
        loop {
            let header = match (first, pts, dts) {
                (true, Some(pts), Some(dts)) => PesHeader::build_with_dts(
                    stream_id,
                    remaining.len(),
                    pts + PTS_OFFSET,
                    dts + PTS_OFFSET,
                ),
                (true, pts, _) => {
                    PesHeader::build(stream_id, remaining.len(), pts.map(|p| p + PTS_OFFSET))
                }
                (false, _, _) => PesHeader::build(stream_id, remaining.len(), None),
            };
            let (chunk, rest) = remaining.split_at(header.payload_included);

            let mut pes = BytesMut::with_capacity(header.len() + chunk.len());
            pes.extend_from_slice(&header.bytes);
            pes.extend_from_slice(chunk);

            if first {
                self.write_pes(out, index, &pes, pcr, packet.is_key);
            } else {
                self.write_pes(out, index, &pes, None, false);
            }

            remaining = rest;
            first = false;
            if remaining.is_empty() {
                break;
            }
        }
        Ok(())
    }

    /// Spreads one PES packet over as many transport packets as needed,
    /// stuffing the last one through its adaptation field.
    fn write_pes(
        &mut self,
        out: &mut BytesMut,
        index: usize,
        pes: &[u8],
        pcr: Option<u64>,
        random_access: bool,
    ) {
        let stream = &mut self.streams[index];
        let mut remaining = pes;
        let mut first = true;

        while !remaining.is_empty() {
            // adaptation field body, without its length byte
            let mut adaptation = BytesMut::new();
            let mut has_adaptation = false;
            if first && (pcr.is_some() || random_access) {
                let mut flags = 0u8;
                if random_access {
                    flags |= 0x40;
                }
                if pcr.is_some() {
                    flags |= 0x10;
                }
                adaptation.put_u8(flags);
                if let Some(pcr) = pcr {
                    write_pcr(&mut adaptation, pcr, 0);
                }
                has_adaptation = true;
            }

            let used = if has_adaptation { 1 + adaptation.len() } else { 0 };
            let capacity = TS_PAYLOAD_SIZE - used;
            if remaining.len() < capacity {
                let mut stuffing = capacity - remaining.len();
                if !has_adaptation {
                    has_adaptation = true;
                    stuffing -= 1;
                    if stuffing > 0 {
                        adaptation.put_u8(0x00);
                        stuffing -= 1;
                    }
                }
                adaptation.put_bytes(0xFF, stuffing);
            }

            let used = if has_adaptation { 1 + adaptation.len() } else { 0 };
            let chunk = remaining.len().min(TS_PAYLOAD_SIZE - used);

            let mut header = TSHeader::new(stream.pid, stream.next_continuity_counter());
            header.payload_unit_start = first;
            header.adaptation_field_exists = has_adaptation;
            header.write_to(out);
            if has_adaptation {
                out.put_u8(adaptation.len() as u8);
                out.extend_from_slice(&adaptation);
            }
            out.extend_from_slice(&remaining[..chunk]);

            remaining = &remaining[chunk..];
            first = false;
        }
    }
}

fn to_mpeg_clock(ts: i64, time_base: Rational) -> u64 {
    rescale_q(ts, time_base, Rational::MPEG_90K).max(0) as u64
}

/// MPEG-TS output context writing to a file, UDP or TCP destination.
#[derive(Debug)]
pub struct TsOutput {
    destination: Destination,
    muxer: TsMuxer,
    sink: Option<Sink>,
    buffer: BytesMut,
    header_written: bool,
}

impl TsOutput {
    pub fn new(destination: Destination) -> Self {
        Self {
            destination,
            muxer: TsMuxer::new(),
            sink: None,
            buffer: BytesMut::with_capacity(64 * TS_PACKET_SIZE),
            header_written: false,
        }
    }

    async fn drain_buffer(&mut self) -> Result<()> {
        let sink = self
            .sink
            .as_mut()
            .ok_or_else(|| StreamerError::Format("output I/O is not open".into()))?;
        let result = sink.write_all(&self.buffer).await;
        self.buffer.clear();
        result
    }
}

#[async_trait]
impl Muxer for TsOutput {
    fn flags(&self) -> FormatFlags {
        FormatFlags::default()
    }

    fn add_stream(&mut self, params: CodecParameters) -> Result<StreamInfo> {
        if self.header_written {
            return Err(StreamerError::Format(
                "streams cannot be added after the header".into(),
            ));
        }
        self.muxer.add_stream(params)
    }

    async fn open_io(&mut self) -> Result<()> {
        self.sink = Some(Sink::open(&self.destination).await?);
        log::debug!("opened {:?} for output", self.destination);
        Ok(())
    }

    async fn write_header(&mut self) -> Result<()> {
        self.muxer.write_tables(&mut self.buffer)?;
        self.drain_buffer().await?;
        self.header_written = true;
        Ok(())
    }

    async fn write_packet(&mut self, packet: &Packet) -> Result<()> {
        if !self.header_written {
            return Err(StreamerError::Format("header has not been written".into()));
        }
        self.muxer.write_packet(packet, &mut self.buffer)?;
        self.drain_buffer().await
    }

    async fn write_trailer(&mut self) -> Result<()> {
        // transport streams have no trailer; push out what is buffered
        let sink = self
            .sink
            .as_mut()
            .ok_or_else(|| StreamerError::Format("output I/O is not open".into()))?;
        sink.flush().await
    }

    async fn close_io(&mut self) -> Result<()> {
        if let Some(sink) = self.sink.take() {
            sink.close().await?;
        }
        Ok(())
    }
}

/// Container engine producing [`TsOutput`] contexts.
#[derive(Debug, Clone, Copy, Default)]
pub struct TsContainer;

impl ContainerEngine for TsContainer {
    fn alloc_muxer(&self, format: &str, destination: &str) -> Result<Box<dyn Muxer>> {
        match format {
            FORMAT_MPEGTS | "ts" => {
                let destination = Destination::parse(destination)?;
                Ok(Box::new(TsOutput::new(destination)))
            }
            other => Err(StreamerError::Format(format!("unknown output format: {other}"))),
        }
    }
}
