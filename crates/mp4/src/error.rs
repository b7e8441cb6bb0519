use thiserror::Error;

use crate::header::FourCC;

/// Errors that can occur during MP4 box parsing
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Mp4Error {
    #[error("Insufficient data: expected at least {expected} bytes, got {actual}")]
    InsufficientData { expected: usize, actual: usize },

    #[error("Invalid size {size} for box '{box_type}'")]
    InvalidBoxSize { box_type: FourCC, size: u64 },

    #[error("Unsupported version {version} of box '{box_type}'")]
    UnsupportedVersion { box_type: FourCC, version: u8 },
}
