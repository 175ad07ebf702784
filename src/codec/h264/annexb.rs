//! Annex B byte-stream framing.
//!
//! Splits an elementary stream on `00 00 01` / `00 00 00 01` start codes and
//! regroups the NAL units into access units. No slice header beyond the first
//! bit is read.

use super::types::NALUnitType;
use bytes::{Bytes, BytesMut};

/// Returns every NAL unit in `data`, each still prefixed by its start code.
///
/// Bytes before the first start code are dropped, as are start codes with no
/// NAL header after them.
pub fn split_nal_units(data: &[u8]) -> Vec<&[u8]> {
    let mut starts = Vec::new();
    let mut i = 0;
    while i + 3 <= data.len() {
        if data[i] == 0x00 && data[i + 1] == 0x00 && data[i + 2] == 0x01 {
            let start = if i > 0 && data[i - 1] == 0x00 { i - 1 } else { i };
            starts.push((start, i + 3));
            i += 3;
        } else {
            i += 1;
        }
    }

    let mut units = Vec::with_capacity(starts.len());
    for (n, &(start, header)) in starts.iter().enumerate() {
        let end = starts.get(n + 1).map_or(data.len(), |&(next, _)| next);
        if header < end {
            units.push(&data[start..end]);
        }
    }
    units
}

fn header_offset(nal: &[u8]) -> usize {
    if nal[2] == 0x01 { 3 } else { 4 }
}

/// Groups NAL units into access units, one per coded picture.
///
/// Parameter sets, SEI and delimiters attach to the picture that follows
/// them. A new picture starts at a slice whose `first_mb_in_slice` is zero.
pub fn split_access_units(data: &[u8]) -> Vec<Bytes> {
    let mut units = Vec::new();
    let mut current = BytesMut::new();
    let mut has_slice = false;

    for nal in split_nal_units(data) {
        let offset = header_offset(nal);
        let nal_type = NALUnitType::from_header(nal[offset]);

        // ue(v) zero is a single `1` bit
        let first_slice = matches!(
            nal_type,
            NALUnitType::CodedSliceNonIDR
                | NALUnitType::CodedSliceIDR
                | NALUnitType::CodedSliceDataPartitionA
        ) && nal.get(offset + 1).is_some_and(|b| b & 0x80 != 0);

        if has_slice && (nal_type.starts_access_unit() || first_slice) {
            units.push(current.split().freeze());
            has_slice = false;
        }

        current.extend_from_slice(nal);
        has_slice |= nal_type.is_vcl();
    }

    if !current.is_empty() {
        units.push(current.freeze());
    }
    units
}
