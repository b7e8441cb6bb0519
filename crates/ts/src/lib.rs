//! Transport Stream (TS) packet and PES header parsing
//!
//! This crate provides bounds-checked parsing of MPEG-TS packet headers and
//! of the PES headers they carry, enough to recover the presentation
//! timestamp of the first elementary stream packet in a segment prefix.

pub mod error;
pub mod packet;
pub mod pes;

pub use error::TsError;
pub use packet::{AdaptationFieldControl, PID_NULL, SYNC_BYTE, TS_PACKET_SIZE, TsPacket, packets};
pub use pes::{PES_START_CODE, PesHeader, TS_TIMESCALE, decode_timestamp, first_pts};

/// Result type for TS parsing operations
pub type Result<T> = std::result::Result<T, TsError>;
