//! Keyframe classification straight from bitstream bytes.
//!
//! Only the first start code of a buffer is inspected. Two syntaxes are
//! recognised:
//!
//! ```text
//! 00 00 01 B6 xx ...   MPEG-4 Part 2 VOP, keyframe when (xx >> 6) == 0 (I-VOP)
//! 00 00 01 65 ...      H.264 NAL, nal_ref_idc = 3, nal_unit_type = 5 (IDR slice)
//! ```
//!
//! The start code may also begin at offset 1 whatever the first byte is, which
//! covers four-byte start codes (`00 00 00 01 ...`).

const START_CODE: [u8; 3] = [0x00, 0x00, 0x01];
const VOP_START: u8 = 0xB6;
const IDR_NAL_HEADER: u8 = 0x65;
const MIN_LEN: usize = 7;

/// Returns `true` when `data` starts with an I-VOP or an IDR slice.
///
/// Buffers of six bytes or fewer are never keyframes.
pub fn is_keyframe(data: &[u8]) -> bool {
    if data.len() < MIN_LEN {
        return false;
    }

    let offset = if data[..3] == START_CODE {
        3
    } else if data[1..4] == START_CODE {
        4
    } else {
        return false;
    };

    match data[offset] {
        VOP_START => (data[offset + 1] & 0xC0) >> 6 == 0,
        IDR_NAL_HEADER => true,
        _ => false,
    }
}
