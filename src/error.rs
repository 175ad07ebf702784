use thiserror::Error;

#[derive(Error, Debug)]
pub enum StreamerError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("codec error: {0}")]
    Codec(String),

    #[error("format error: {0}")]
    Format(String),

    #[error("invalid data: {0}")]
    InvalidData(String),

    #[error("config error: {0}")]
    Config(String),

    /// `stream_frame`/`stream_reencode_data` before `initialize_codec`.
    #[error("codec not initialized")]
    CodecNotInitialized,

    #[error("session is not open")]
    NotOpen,

    #[error("session is already open")]
    AlreadyOpen,
}

pub type Result<T> = std::result::Result<T, StreamerError>;
