use crate::av::{rescale_q, Packet, Rational};
use crate::codec::is_keyframe;
use crate::format::StreamInfo;
use bytes::Bytes;

/// Builds the packet for one payload bound to `stream`.
///
/// The keyframe flag comes from the payload bytes, the timestamp is rescaled
/// from microseconds into the stream time base and the DTS is left unknown.
pub fn wrap_packet(payload: Bytes, timestamp_micros: i64, stream: &StreamInfo) -> Packet {
    let is_key = is_keyframe(&payload);
    let pts = rescale_q(timestamp_micros, Rational::MICROSECONDS, stream.time_base);
    Packet::new(payload)
        .with_pts(pts)
        .with_stream_index(stream.index)
        .with_key_flag(is_key)
}
