use crate::{Result, TsError};

/// Null packets carry stuffing only
pub const PID_NULL: u16 = 0x1FFF;

/// Size of a single transport stream packet
pub const TS_PACKET_SIZE: usize = 188;

/// First byte of every transport stream packet
pub const SYNC_BYTE: u8 = 0x47;

const HEADER_SIZE: usize = 4;

/// What follows the 4-byte packet header
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdaptationFieldControl {
    Reserved,
    PayloadOnly,
    AdaptationOnly,
    AdaptationAndPayload,
}

impl AdaptationFieldControl {
    fn from_bits(bits: u8) -> Self {
        match bits & 0x03 {
            0b01 => Self::PayloadOnly,
            0b10 => Self::AdaptationOnly,
            0b11 => Self::AdaptationAndPayload,
            _ => Self::Reserved,
        }
    }

    pub fn has_adaptation_field(self) -> bool {
        matches!(self, Self::AdaptationOnly | Self::AdaptationAndPayload)
    }

    pub fn has_payload(self) -> bool {
        matches!(self, Self::PayloadOnly | Self::AdaptationAndPayload)
    }
}

/// View over one transport stream packet.
///
/// Only the header fields needed to locate PES starts are decoded. A packet
/// may be shorter than [`TS_PACKET_SIZE`] when it is the last one of a
/// partial read; its payload then ends where the buffer ends.
#[derive(Debug, Clone, Copy)]
pub struct TsPacket<'a> {
    pub pid: u16,
    /// Set on the packet carrying the first byte of a PES packet
    pub payload_unit_start_indicator: bool,
    pub scrambled: bool,
    pub adaptation_field_control: AdaptationFieldControl,
    pub payload: Option<&'a [u8]>,
}

impl<'a> TsPacket<'a> {
    /// Read the packet at the start of `data`, looking at no more than
    /// [`TS_PACKET_SIZE`] bytes.
    pub fn parse(data: &'a [u8]) -> Result<Self> {
        let data = &data[..data.len().min(TS_PACKET_SIZE)];
        let [sync, flags_pid, pid_low, control, body @ ..] = data else {
            return Err(TsError::InsufficientData {
                expected: HEADER_SIZE,
                actual: data.len(),
            });
        };
        if *sync != SYNC_BYTE {
            return Err(TsError::InvalidSyncByte(*sync));
        }

        let adaptation_field_control = AdaptationFieldControl::from_bits(control >> 4);
        let mut body = body;
        if adaptation_field_control.has_adaptation_field() {
            let Some((&length, rest)) = body.split_first() else {
                return Err(TsError::InsufficientData {
                    expected: HEADER_SIZE + 1,
                    actual: data.len(),
                });
            };
            let length = length as usize;
            if length > rest.len() {
                return Err(TsError::InsufficientData {
                    expected: HEADER_SIZE + 1 + length,
                    actual: data.len(),
                });
            }
            body = &rest[length..];
        }

        let payload = (adaptation_field_control.has_payload() && !body.is_empty()).then_some(body);

        Ok(TsPacket {
            pid: u16::from_be_bytes([flags_pid & 0x1F, *pid_low]),
            payload_unit_start_indicator: flags_pid & 0x40 != 0,
            scrambled: control & 0xC0 != 0,
            adaptation_field_control,
            payload,
        })
    }
}

/// Walk the 188-byte aligned packets of `data`.
///
/// The last packet may be truncated. Iteration ends with the first packet
/// that fails to parse, yielding its error.
pub fn packets(data: &[u8]) -> impl Iterator<Item = Result<TsPacket<'_>>> {
    let mut failed = false;
    data.chunks(TS_PACKET_SIZE).map_while(move |chunk| {
        if failed {
            return None;
        }
        let packet = TsPacket::parse(chunk);
        failed = packet.is_err();
        Some(packet)
    })
}
