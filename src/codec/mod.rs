mod engine;
pub mod h264;

pub use engine::{CodecEngine, Drain, EncoderConfig, VideoDecoder, VideoEncoder};
pub use h264::is_keyframe;
