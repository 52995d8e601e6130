use thiserror::Error;

use crate::MessageFormat;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PduError {
    #[error("empty PDU")]
    Empty,

    #[error("truncated {field}: expected {needed} bytes, got {available}")]
    Truncated {
        field: &'static str,
        needed: usize,
        available: usize,
    },

    #[error("unsupported message type indicator {0:#04b}")]
    UnsupportedMessageType(u8),

    #[error("unsupported PDU format: {0}")]
    UnsupportedFormat(MessageFormat),

    #[error("unknown PDU format: {0}")]
    UnknownFormat(String),

    #[error("compressed user data is not supported")]
    CompressedText,

    #[error("invalid user data header: {0}")]
    InvalidHeader(String),
}

pub type Result<T> = std::result::Result<T, PduError>;
