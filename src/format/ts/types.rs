use crate::av::CodecType;
use crate::error::{Result, StreamerError};
use crate::utils::Crc32Mpeg2;
use bytes::{BufMut, BytesMut};

// PIDs
pub const PID_PAT: u16 = 0x0000;
pub const PID_PMT: u16 = 0x1000;
pub const PID_FIRST_ELEMENTARY: u16 = 0x0100;

// Table IDs
pub const TABLE_ID_PAT: u8 = 0x00;
pub const TABLE_ID_PMT: u8 = 0x02;
pub const TRANSPORT_STREAM_ID: u16 = 1;
pub const PROGRAM_NUMBER: u16 = 1;

// Elementary Stream Types
pub const STREAM_TYPE_H264: u8 = 0x1b;

// Constants
pub const SYNC_BYTE: u8 = 0x47;
pub const TS_PACKET_SIZE: usize = 188;
pub const TS_HEADER_SIZE: usize = 4;
pub const TS_PAYLOAD_SIZE: usize = TS_PACKET_SIZE - TS_HEADER_SIZE;

pub fn stream_type_for(codec: CodecType) -> u8 {
    match codec {
        CodecType::H264 => STREAM_TYPE_H264,
    }
}

#[derive(Debug, Clone)]
pub struct PATEntry {
    pub program_number: u16,
    pub program_map_pid: u16,
}

#[derive(Debug, Clone, Default)]
pub struct PAT {
    pub entries: Vec<PATEntry>,
}

impl PAT {
    /// Serializes the complete section: table header, entries and CRC.
    pub fn section(&self) -> BytesMut {
        let mut body = BytesMut::new();
        for entry in &self.entries {
            body.put_u16(entry.program_number);
            body.put_u16(entry.program_map_pid & 0x1fff | 7 << 13);
        }
        finish_section(TABLE_ID_PAT, TRANSPORT_STREAM_ID, &body)
    }
}

#[derive(Debug, Clone)]
pub struct ElementaryStreamInfo {
    pub stream_type: u8,
    pub elementary_pid: u16,
}

#[derive(Debug, Clone, Default)]
pub struct PMT {
    pub pcr_pid: u16,
    pub elementary_stream_infos: Vec<ElementaryStreamInfo>,
}

impl PMT {
    pub fn section(&self) -> BytesMut {
        let mut body = BytesMut::new();
        body.put_u16(self.pcr_pid & 0x1fff | 7 << 13);
        // no program descriptors
        body.put_u16(0xf << 12);
        for info in &self.elementary_stream_infos {
            body.put_u8(info.stream_type);
            body.put_u16(info.elementary_pid & 0x1fff | 7 << 13);
            body.put_u16(0xf << 12);
        }
        finish_section(TABLE_ID_PMT, PROGRAM_NUMBER, &body)
    }
}

/// Wraps a PSI table body with the long-form section header and CRC32.
fn finish_section(table_id: u8, table_id_extension: u16, body: &[u8]) -> BytesMut {
    // 5 bytes of header after the length field, body, 4 bytes of CRC
    let section_length = 5 + body.len() + 4;

    let mut section = BytesMut::with_capacity(3 + section_length);
    section.put_u8(table_id);
    section.put_u16(0xB000 | (section_length as u16 & 0x3FF));
    section.put_u16(table_id_extension);
    // version 0, current_next_indicator 1
    section.put_u8(0xC1);
    section.put_u8(0);
    section.put_u8(0);
    section.put_slice(body);

    let crc = Crc32Mpeg2::checksum(&section);
    section.put_u32(crc);
    section
}

#[derive(Debug, Clone)]
pub struct TSHeader {
    pub payload_unit_start: bool,
    pub pid: u16,
    pub adaptation_field_exists: bool,
    pub contains_payload: bool,
    pub continuity_counter: u8,
}

impl TSHeader {
    pub fn new(pid: u16, continuity_counter: u8) -> Self {
        Self {
            payload_unit_start: false,
            pid,
            adaptation_field_exists: false,
            contains_payload: true,
            continuity_counter,
        }
    }

    pub fn write_to(&self, buf: &mut BytesMut) {
        buf.put_u8(SYNC_BYTE);

        let mut b1 = ((self.pid >> 8) & 0x1f) as u8;
        if self.payload_unit_start {
            b1 |= 0x40;
        }
        buf.put_u8(b1);
        buf.put_u8((self.pid & 0xff) as u8);

        let mut b3 = self.continuity_counter & 0x0f;
        if self.adaptation_field_exists {
            b3 |= 0x20;
        }
        if self.contains_payload {
            b3 |= 0x10;
        }
        buf.put_u8(b3);
    }
}

/// Encodes a program clock reference from its 90 kHz base and 27 MHz
/// extension into the 6-byte adaptation field layout.
pub fn write_pcr(buf: &mut BytesMut, base: u64, extension: u16) {
    let pcr = (base & 0x1_FFFF_FFFF) << 15 | 0x3f << 9 | (extension as u64 & 0x1ff);
    buf.put_u32((pcr >> 16) as u32);
    buf.put_u16((pcr & 0xFFFF) as u16);
}

/// Builds one PSI packet carrying `section` on `pid`.
pub fn psi_packet(pid: u16, continuity_counter: u8, section: &[u8]) -> Result<BytesMut> {
    // pointer field takes one byte of payload
    if section.len() > TS_PAYLOAD_SIZE - 1 {
        return Err(StreamerError::Format(format!(
            "PSI section of {} bytes does not fit one packet",
            section.len()
        )));
    }

    let mut buf = BytesMut::with_capacity(TS_PACKET_SIZE);
    let mut header = TSHeader::new(pid, continuity_counter);
    header.payload_unit_start = true;
    header.write_to(&mut buf);
    buf.put_u8(0);
    buf.put_slice(section);
    buf.put_bytes(0xFF, TS_PACKET_SIZE - buf.len());
    Ok(buf)
}
