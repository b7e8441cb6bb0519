use thiserror::Error;

/// Errors that can occur during TS parsing
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TsError {
    #[error("Invalid sync byte: expected 0x47, got 0x{0:02x}")]
    InvalidSyncByte(u8),

    #[error("Insufficient data: expected at least {expected} bytes, got {actual}")]
    InsufficientData { expected: usize, actual: usize },

    #[error("Missing PES start code")]
    MissingPesStartCode,

    #[error("Invalid PES header: {0}")]
    InvalidPesHeader(String),

    #[error("No PES packet with a presentation timestamp found")]
    NoTimestamp,
}
