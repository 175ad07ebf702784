use bytes::{BufMut, Bytes, BytesMut};

/// Largest value the 16-bit `PES_packet_length` field can declare.
pub const MAX_PES_PACKET_LEN: usize = 65535;

/// Bytes preceding the `PES_packet_length` count: start code, stream id and
/// the length field itself.
const PES_PREFIX_LEN: usize = 6;
const HEADER_LEN_NO_PTS: usize = 9;
const HEADER_LEN_PTS: usize = 14;
const HEADER_LEN_PTS_DTS: usize = 19;

/// `stream_id` values for the two elementary stream kinds carried.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum PesStreamType {
    Audio = 0xC0,
    Video = 0xE0,
}

/// A synthesized PES header together with how much payload it covers.
///
/// Payloads too large for one PES packet are carried by several; each header
/// declares only `payload_included` bytes of the remaining payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PesHeader {
    pub bytes: Bytes,
    pub payload_included: usize,
}

impl PesHeader {
    /// Builds the header for a payload of `payload_size` bytes.
    ///
    /// Layout: `00 00 01 <stream_id> <length:16> 84`, followed by `00 00`
    /// without a timestamp or `80 05 <pts:5>` with one. The declared length
    /// counts the header bytes after the length field plus the included
    /// payload, clamped to [`MAX_PES_PACKET_LEN`].
    pub fn build(stream_type: PesStreamType, payload_size: usize, pts: Option<u64>) -> Self {
        Self::assemble(stream_type, payload_size, pts, None)
    }

    /// Like [`PesHeader::build`], for a packet decoded at `dts` and presented
    /// at `pts`.
    ///
    /// When the two differ the header carries both (`C0 0A <pts:5> <dts:5>`);
    /// otherwise it is identical to the PTS-only form.
    pub fn build_with_dts(
        stream_type: PesStreamType,
        payload_size: usize,
        pts: u64,
        dts: u64,
    ) -> Self {
        let dts = (dts != pts).then_some(dts);
        Self::assemble(stream_type, payload_size, Some(pts), dts)
    }

    fn assemble(
        stream_type: PesStreamType,
        payload_size: usize,
        pts: Option<u64>,
        dts: Option<u64>,
    ) -> Self {
        let header_len = match (pts, dts) {
            (Some(_), Some(_)) => HEADER_LEN_PTS_DTS,
            (Some(_), None) => HEADER_LEN_PTS,
            (None, _) => HEADER_LEN_NO_PTS,
        };
        let extension_len = header_len - PES_PREFIX_LEN;

        let declared = (payload_size + extension_len).min(MAX_PES_PACKET_LEN);
        let payload_included = declared - extension_len;

        let mut buf = BytesMut::with_capacity(header_len);
        buf.put_slice(&[0x00, 0x00, 0x01]);
        buf.put_u8(stream_type as u8);
        buf.put_u16(declared as u16);
        // marker bits '10', data_alignment_indicator
        buf.put_u8(0x84);

        match (pts, dts) {
            (None, _) => {
                buf.put_u8(0x00);
                buf.put_u8(0x00);
            }
            (Some(pts), None) => {
                // PTS only, 5 bytes of header data
                buf.put_u8(0x80);
                buf.put_u8(5);
                write_timestamp(&mut buf, 0x20, pts);
            }
            (Some(pts), Some(dts)) => {
                buf.put_u8(0xC0);
                buf.put_u8(10);
                write_timestamp(&mut buf, 0x30, pts);
                write_timestamp(&mut buf, 0x10, dts);
            }
        }

        Self {
            bytes: buf.freeze(),
            payload_included,
        }
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

/// Writes a 33-bit timestamp as `prefix|ts[32..30]|1`, `ts[29..15]|1`,
/// `ts[14..0]|1`.
fn write_timestamp(buf: &mut BytesMut, prefix: u8, ts: u64) {
    let ts = ts & 0x1_FFFF_FFFF;
    buf.put_u8(prefix | (((ts >> 30) & 0x07) << 1) as u8 | 0x01);
    buf.put_u8(((ts >> 22) & 0xFF) as u8);
    buf.put_u8(((((ts >> 15) & 0x7F) << 1) | 0x01) as u8);
    buf.put_u8(((ts >> 7) & 0xFF) as u8);
    buf.put_u8((((ts & 0x7F) << 1) | 0x01) as u8);
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use quickcheck_macros::quickcheck;

    fn read_timestamp(b: &[u8]) -> u64 {
        ((b[0] as u64 >> 1) & 0x07) << 30
            | (b[1] as u64) << 22
            | (b[2] as u64 >> 1) << 15
            | (b[3] as u64) << 7
            | (b[4] as u64 >> 1)
    }

    #[test]
    fn test_header_without_pts() {
        let header = PesHeader::build(PesStreamType::Video, 100, None);
        assert_eq!(
            &header.bytes[..],
            &[0x00, 0x00, 0x01, 0xE0, 0x00, 103, 0x84, 0x00, 0x00]
        );
        assert_eq!(header.payload_included, 100);
    }

    #[test]
    fn test_header_with_pts() {
        let header = PesHeader::build(PesStreamType::Audio, 100, Some(90_000));
        assert_eq!(header.len(), 14);
        assert_eq!(&header.bytes[..4], &[0x00, 0x00, 0x01, 0xC0]);
        assert_eq!(u16::from_be_bytes([header.bytes[4], header.bytes[5]]), 108);
        assert_eq!(&header.bytes[6..9], &[0x84, 0x80, 0x05]);
        assert_eq!(&header.bytes[9..], &[0x21, 0x00, 0x05, 0xBF, 0x21]);
        assert_eq!(header.payload_included, 100);
    }

    #[test]
    fn test_header_with_pts_and_dts() {
        let header = PesHeader::build_with_dts(PesStreamType::Video, 100, 93_000, 90_000);
        assert_eq!(header.len(), 19);
        assert_eq!(u16::from_be_bytes([header.bytes[4], header.bytes[5]]), 113);
        assert_eq!(&header.bytes[6..9], &[0x84, 0xC0, 0x0A]);
        assert_eq!(header.bytes[9] & 0xF1, 0x31);
        assert_eq!(read_timestamp(&header.bytes[9..14]), 93_000);
        assert_eq!(&header.bytes[14..], &[0x11, 0x00, 0x05, 0xBF, 0x21]);
        assert_eq!(header.payload_included, 100);
    }

    #[test]
    fn test_equal_dts_is_omitted() {
        assert_eq!(
            PesHeader::build_with_dts(PesStreamType::Video, 100, 90_000, 90_000),
            PesHeader::build(PesStreamType::Video, 100, Some(90_000))
        );
    }

    #[test]
    fn test_truncates_to_max_packet_length() {
        let header = PesHeader::build(PesStreamType::Video, 200_000, Some(0));
        assert_eq!(header.len(), 14);
        assert_eq!(&header.bytes[4..6], &[0xFF, 0xFF]);
        assert_eq!(header.payload_included, MAX_PES_PACKET_LEN - 8);

        let header = PesHeader::build(PesStreamType::Video, 200_000, None);
        assert_eq!(header.len(), 9);
        assert_eq!(header.payload_included, MAX_PES_PACKET_LEN - 3);

        let header = PesHeader::build_with_dts(PesStreamType::Video, 200_000, 1, 0);
        assert_eq!(header.len(), 19);
        assert_eq!(header.payload_included, MAX_PES_PACKET_LEN - 13);
    }

    #[test]
    fn test_exact_boundary() {
        let header = PesHeader::build(PesStreamType::Video, MAX_PES_PACKET_LEN - 8, Some(0));
        assert_eq!(&header.bytes[4..6], &[0xFF, 0xFF]);
        assert_eq!(header.payload_included, MAX_PES_PACKET_LEN - 8);
    }

    #[test]
    fn test_empty_payload() {
        let header = PesHeader::build(PesStreamType::Video, 0, None);
        assert_eq!(&header.bytes[4..6], &[0x00, 0x03]);
        assert_eq!(header.payload_included, 0);
    }

    #[test]
    fn test_pts_wraps_at_33_bits() {
        let header = PesHeader::build(PesStreamType::Video, 10, Some(1 << 33));
        assert_eq!(&header.bytes[9..], &[0x21, 0x00, 0x01, 0x00, 0x01]);
    }

    #[quickcheck]
    fn prop_declared_length_is_bounded(size: u32, pts: Option<u64>) -> bool {
        let header = PesHeader::build(PesStreamType::Video, size as usize, pts);
        let declared = u16::from_be_bytes([header.bytes[4], header.bytes[5]]) as usize;
        let extension = header.len() - 6;
        declared <= MAX_PES_PACKET_LEN
            && header.payload_included == declared - extension
            && header.payload_included <= size as usize
    }

    #[quickcheck]
    fn prop_pts_fields_carry_markers(pts: u64) -> bool {
        let header = PesHeader::build(PesStreamType::Video, 1, Some(pts));
        let ts = &header.bytes[9..];
        ts[0] & 0xF1 == 0x21
            && ts[2] & 0x01 == 0x01
            && ts[4] & 0x01 == 0x01
            && read_timestamp(ts) == pts & 0x1_FFFF_FFFF
    }

    #[quickcheck]
    fn prop_dts_follows_pts(pts: u64, dts: u64) -> bool {
        let header = PesHeader::build_with_dts(PesStreamType::Video, 1, pts, dts);
        if pts == dts {
            return header.len() == 14;
        }
        let ts = &header.bytes[9..];
        header.len() == 19
            && ts[0] & 0xF1 == 0x31
            && ts[5] & 0xF1 == 0x11
            && read_timestamp(&ts[..5]) == pts & 0x1_FFFF_FFFF
            && read_timestamp(&ts[5..]) == dts & 0x1_FFFF_FFFF
    }
}
