use super::PixelFormat;

/// A raw, uncompressed picture handed to an encoder or produced by a decoder.
#[derive(Debug, Clone, PartialEq)]
pub struct VideoFrame {
    /// One entry per plane (Y, U, V for planar YUV 4:2:0).
    pub planes: Vec<Vec<u8>>,
    pub width: u32,
    pub height: u32,
    pub pixel_format: PixelFormat,
    /// Presentation timestamp in the owning codec's time base.
    pub pts: Option<i64>,
}

impl VideoFrame {
    pub fn new(width: u32, height: u32, pixel_format: PixelFormat, planes: Vec<Vec<u8>>) -> Self {
        Self {
            planes,
            width,
            height,
            pixel_format,
            pts: None,
        }
    }

    /// Allocates a zeroed YUV 4:2:0 planar picture.
    pub fn yuv420p(width: u32, height: u32) -> Self {
        let luma = (width * height) as usize;
        let chroma = (width.div_ceil(2) * height.div_ceil(2)) as usize;
        Self::new(
            width,
            height,
            PixelFormat::Yuv420p,
            vec![vec![0; luma], vec![0; chroma], vec![0; chroma]],
        )
    }

    pub fn with_pts(mut self, pts: i64) -> Self {
        self.pts = Some(pts);
        self
    }
}
