use std::num::ParseIntError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum VdkError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("unsupported input: {0}")]
    UnsupportedInput(String),

    #[error("out of memory")]
    OutOfMemory,

    #[error("non-compliant bitstream: {0}")]
    NonCompliantBitstream(String),

    #[error("invalid data: {0}")]
    InvalidData(String),

    #[error("xml error: {0}")]
    Xml(String),

    #[error("config error: {0}")]
    Config(String),

    #[error("parse int error: {0}")]
    ParseInt(#[from] ParseIntError),
}

impl VdkError {
    /// True when the offending packet was dropped and the stream can keep going.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            VdkError::NonCompliantBitstream(_) | VdkError::InvalidData(_)
        )
    }
}

impl From<std::collections::TryReserveError> for VdkError {
    fn from(_: std::collections::TryReserveError) -> Self {
        VdkError::OutOfMemory
    }
}

pub type Result<T> = std::result::Result<T, VdkError>;
