//! Segment container sniffing.
//!
//! Looks at the first bytes of a media segment to find out which container
//! it uses and at which media time it starts.

use std::fmt::Display;

use tracing::debug;

use crate::HlsError;

/// Timescale assumed when an MP4 segment carries no `mdhd`
pub const DEFAULT_MP4_TIMESCALE: u32 = 90_000;

/// Number of bytes fetched from the start of a segment for sniffing
pub const DEFAULT_SNIFF_BYTE_BUDGET: u64 = 2048;

/// The container a segment is stored in
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContainerKind {
    /// Fragmented MP4
    Mp4,
    /// MPEG Transport Stream
    Ts,
}

impl Display for ContainerKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ContainerKind::Mp4 => write!(f, "mp4"),
            ContainerKind::Ts => write!(f, "ts"),
        }
    }
}

impl ContainerKind {
    /// Classify a segment prefix. MP4 is checked first.
    pub fn detect(prefix: &[u8]) -> Option<Self> {
        if mp4::looks_like_box(prefix) {
            Some(ContainerKind::Mp4)
        } else if prefix.first() == Some(&ts::SYNC_BYTE) {
            Some(ContainerKind::Ts)
        } else {
            None
        }
    }
}

/// Media time at which a segment starts
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SegmentStartTime {
    pub container: ContainerKind,
    pub base_time: u64,
    pub timescale: u32,
}

impl SegmentStartTime {
    pub fn seconds(&self) -> f64 {
        self.base_time as f64 / self.timescale as f64
    }
}

fn start_time_error(e: impl Display) -> HlsError {
    HlsError::CouldNotParseSegmentStartTime(e.to_string())
}

/// Determine the start time of a segment from its first bytes.
///
/// For MP4 the timescale comes from `init` when given, otherwise from a
/// `moov` inside the prefix itself (self-initialising segments), otherwise
/// [`DEFAULT_MP4_TIMESCALE`]. TS timestamps always use a 90 kHz clock.
pub fn sniff_start_time(
    segment_prefix: &[u8],
    init: Option<&[u8]>,
) -> Result<SegmentStartTime, HlsError> {
    let container = ContainerKind::detect(segment_prefix).ok_or(HlsError::UnrecognizedContainer)?;

    let start = match container {
        ContainerKind::Mp4 => {
            let base_time = mp4::base_media_decode_time(segment_prefix)
                .map_err(start_time_error)?
                .ok_or_else(|| start_time_error("no tfdt box in segment prefix"))?;
            let timescale = mp4::timescale(init.unwrap_or(segment_prefix))
                .map_err(start_time_error)?
                .unwrap_or(DEFAULT_MP4_TIMESCALE);
            SegmentStartTime {
                container,
                base_time,
                timescale,
            }
        }
        ContainerKind::Ts => SegmentStartTime {
            container,
            base_time: ts::first_pts(segment_prefix).map_err(start_time_error)?,
            timescale: ts::TS_TIMESCALE,
        },
    };

    debug!(
        container = %start.container,
        base_time = start.base_time,
        timescale = start.timescale,
        "Sniffed segment start time"
    );
    Ok(start)
}
