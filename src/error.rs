use thiserror::Error;

#[derive(Debug, Error)]
pub enum EmicError {
    #[error("serial port: {0}")]
    Serial(#[from] serialport::Error),
    #[error("i/o: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid {0}: {1}")]
    InvalidArgument(&'static str, String),
    #[error("unsupported link option: {0}")]
    Unsupported(&'static str),
    #[error("link is not open")]
    NotOpen,
}

pub type Result<T> = std::result::Result<T, EmicError>;
