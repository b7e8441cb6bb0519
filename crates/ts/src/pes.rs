//! PES (Packetized Elementary Stream) header parsing.

use tracing::trace;

use crate::packet::packets;
use crate::{Result, TsError};

/// Every PES packet starts with this prefix
pub const PES_START_CODE: [u8; 3] = [0x00, 0x00, 0x01];

/// Fixed clock rate of PTS/DTS values
pub const TS_TIMESCALE: u32 = 90_000;

// start code (3) + stream id (1) + packet length (2)
const PES_FIXED_HEADER_SIZE: usize = 6;
// marker/flags (2) + header data length (1)
const PES_OPTIONAL_HEADER_SIZE: usize = 3;
const TIMESTAMP_SIZE: usize = 5;

const STREAM_ID_PROGRAM_STREAM_MAP: u8 = 0xBC;
const STREAM_ID_PADDING: u8 = 0xBE;
const STREAM_ID_PRIVATE_STREAM_2: u8 = 0xBF;
const STREAM_ID_ECM: u8 = 0xF0;
const STREAM_ID_EMM: u8 = 0xF1;
const STREAM_ID_DSMCC: u8 = 0xF2;
const STREAM_ID_H222_TYPE_E: u8 = 0xF8;
const STREAM_ID_DIRECTORY: u8 = 0xFF;

/// The fields of a PES header needed for timing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PesHeader {
    pub stream_id: u8,
    /// Declared PES packet length, 0 for unbounded video packets
    pub packet_length: u16,
    pub pts: Option<u64>,
    pub dts: Option<u64>,
}

impl PesHeader {
    /// Parse a PES header from the start of a packet payload.
    pub fn parse(payload: &[u8]) -> Result<Self> {
        if payload.len() < PES_FIXED_HEADER_SIZE {
            return Err(TsError::InsufficientData {
                expected: PES_FIXED_HEADER_SIZE,
                actual: payload.len(),
            });
        }
        if payload[..3] != PES_START_CODE {
            return Err(TsError::MissingPesStartCode);
        }

        let stream_id = payload[3];
        let packet_length = u16::from_be_bytes([payload[4], payload[5]]);

        let mut header = PesHeader {
            stream_id,
            packet_length,
            pts: None,
            dts: None,
        };
        if !has_optional_header(stream_id) {
            return Ok(header);
        }

        let optional = &payload[PES_FIXED_HEADER_SIZE..];
        if optional.len() < PES_OPTIONAL_HEADER_SIZE {
            return Err(TsError::InsufficientData {
                expected: PES_FIXED_HEADER_SIZE + PES_OPTIONAL_HEADER_SIZE,
                actual: payload.len(),
            });
        }
        if optional[0] & 0xC0 != 0x80 {
            return Err(TsError::InvalidPesHeader(format!(
                "bad marker bits 0x{:02x}",
                optional[0]
            )));
        }

        let pts_dts_flags = (optional[1] >> 6) & 0x03;
        let header_data_length = optional[2] as usize;
        let fields = &optional[PES_OPTIONAL_HEADER_SIZE..];
        if fields.len() < header_data_length.min(2 * TIMESTAMP_SIZE) {
            return Err(TsError::InsufficientData {
                expected: PES_FIXED_HEADER_SIZE + PES_OPTIONAL_HEADER_SIZE + header_data_length,
                actual: payload.len(),
            });
        }

        match pts_dts_flags {
            0b10 => {
                header.pts = Some(read_timestamp(fields, 0, header_data_length)?);
            }
            0b11 => {
                header.pts = Some(read_timestamp(fields, 0, header_data_length)?);
                header.dts = Some(read_timestamp(fields, TIMESTAMP_SIZE, header_data_length)?);
            }
            0b01 => {
                return Err(TsError::InvalidPesHeader(
                    "forbidden PTS_DTS_flags value 01".to_string(),
                ));
            }
            _ => {}
        }

        Ok(header)
    }

    pub fn is_video(&self) -> bool {
        (0xE0..=0xEF).contains(&self.stream_id)
    }

    pub fn is_audio(&self) -> bool {
        (0xC0..=0xDF).contains(&self.stream_id)
    }
}

fn has_optional_header(stream_id: u8) -> bool {
    !matches!(
        stream_id,
        STREAM_ID_PROGRAM_STREAM_MAP
            | STREAM_ID_PADDING
            | STREAM_ID_PRIVATE_STREAM_2
            | STREAM_ID_ECM
            | STREAM_ID_EMM
            | STREAM_ID_DSMCC
            | STREAM_ID_H222_TYPE_E
            | STREAM_ID_DIRECTORY
    )
}

fn read_timestamp(fields: &[u8], offset: usize, header_data_length: usize) -> Result<u64> {
    let end = offset + TIMESTAMP_SIZE;
    if end > header_data_length || end > fields.len() {
        return Err(TsError::InsufficientData {
            expected: end,
            actual: fields.len().min(header_data_length),
        });
    }
    let mut raw = [0u8; TIMESTAMP_SIZE];
    raw.copy_from_slice(&fields[offset..end]);
    Ok(decode_timestamp(&raw))
}

/// Decode a 33-bit PTS/DTS value from its 5-byte marker-bit encoding.
///
/// Layout: `xxxx TTT1 | TTTTTTTT | TTTTTTT1 | TTTTTTTT | TTTTTTT1`
pub fn decode_timestamp(bytes: &[u8; 5]) -> u64 {
    (((bytes[0] as u64) >> 1) & 0x07) << 30
        | (bytes[1] as u64) << 22
        | ((bytes[2] as u64) >> 1) << 15
        | (bytes[3] as u64) << 7
        | (bytes[4] as u64) >> 1
}

/// Find the PTS of the first PES packet in a TS byte prefix.
///
/// Video PES packets are preferred; when the prefix carries no video PES
/// with a timestamp (audio-only renditions), the first timestamped PES of
/// any kind is used.
pub fn first_pts(data: &[u8]) -> Result<u64> {
    let mut fallback = None;

    for packet in packets(data) {
        let packet = match packet {
            Ok(packet) => packet,
            // A damaged tail does not invalidate what was already seen.
            Err(e) if fallback.is_some() => {
                trace!(error = %e, "Stopping TS scan at unparsable packet");
                break;
            }
            Err(e) => return Err(e),
        };
        // Transport-level scrambling hides the PES header
        if !packet.payload_unit_start_indicator || packet.scrambled {
            continue;
        }
        let Some(payload) = packet.payload else {
            continue;
        };
        if !payload.starts_with(&PES_START_CODE) {
            continue;
        }

        let header = match PesHeader::parse(payload) {
            Ok(header) => header,
            // The prefix may end inside the header of a later PES.
            Err(e) if fallback.is_some() => {
                trace!(error = %e, "Stopping TS scan at truncated PES header");
                break;
            }
            Err(e) => return Err(e),
        };
        let Some(pts) = header.pts else {
            continue;
        };
        trace!(pid = packet.pid, stream_id = header.stream_id, pts, "Found PES timestamp");
        if header.is_video() {
            return Ok(pts);
        }
        fallback.get_or_insert(pts);
    }

    fallback.ok_or(TsError::NoTimestamp)
}
