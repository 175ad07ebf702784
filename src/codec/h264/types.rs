/// `nal_unit_type` values of the H.264 NAL header (low five bits).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NALUnitType {
    Unspecified = 0,
    CodedSliceNonIDR = 1,
    CodedSliceDataPartitionA = 2,
    CodedSliceDataPartitionB = 3,
    CodedSliceDataPartitionC = 4,
    CodedSliceIDR = 5,
    SEI = 6,
    SPS = 7,
    PPS = 8,
    AccessUnitDelimiter = 9,
    EndOfSequence = 10,
    EndOfStream = 11,
    FillerData = 12,
}

impl NALUnitType {
    pub fn from_header(header: u8) -> Self {
        Self::from(header & 0x1F)
    }

    /// Slice data (video coding layer) as opposed to parameter sets and SEI.
    pub fn is_vcl(&self) -> bool {
        matches!(
            self,
            NALUnitType::CodedSliceNonIDR
                | NALUnitType::CodedSliceDataPartitionA
                | NALUnitType::CodedSliceDataPartitionB
                | NALUnitType::CodedSliceDataPartitionC
                | NALUnitType::CodedSliceIDR
        )
    }

    /// NAL types that always open a new access unit when they follow a slice.
    pub fn starts_access_unit(&self) -> bool {
        matches!(
            self,
            NALUnitType::AccessUnitDelimiter
                | NALUnitType::SPS
                | NALUnitType::PPS
                | NALUnitType::SEI
        )
    }
}

impl From<u8> for NALUnitType {
    fn from(value: u8) -> Self {
        match value {
            1 => NALUnitType::CodedSliceNonIDR,
            2 => NALUnitType::CodedSliceDataPartitionA,
            3 => NALUnitType::CodedSliceDataPartitionB,
            4 => NALUnitType::CodedSliceDataPartitionC,
            5 => NALUnitType::CodedSliceIDR,
            6 => NALUnitType::SEI,
            7 => NALUnitType::SPS,
            8 => NALUnitType::PPS,
            9 => NALUnitType::AccessUnitDelimiter,
            10 => NALUnitType::EndOfSequence,
            11 => NALUnitType::EndOfStream,
            12 => NALUnitType::FillerData,
            _ => NALUnitType::Unspecified,
        }
    }
}
