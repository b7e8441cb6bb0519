//! Payload decoders for the timing boxes.

use byteorder::{BigEndian, ByteOrder};
use tracing::debug;

use crate::header::FourCC;
use crate::walk::find_box;
use crate::{Mp4Error, Result};

const FULL_BOX_HEADER_SIZE: usize = 4;

fn ensure_len(data: &[u8], expected: usize) -> Result<()> {
    if data.len() < expected {
        return Err(Mp4Error::InsufficientData {
            expected,
            actual: data.len(),
        });
    }
    Ok(())
}

/// `tfdt`: Track Fragment Base Media Decode Time
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TrackFragmentDecodeTime {
    pub version: u8,
    pub base_media_decode_time: u64,
}

impl TrackFragmentDecodeTime {
    pub fn parse(payload: &[u8]) -> Result<Self> {
        ensure_len(payload, FULL_BOX_HEADER_SIZE)?;
        let version = payload[0];
        let body = &payload[FULL_BOX_HEADER_SIZE..];

        let base_media_decode_time = match version {
            0 => {
                ensure_len(body, 4)?;
                BigEndian::read_u32(body) as u64
            }
            1 => {
                ensure_len(body, 8)?;
                BigEndian::read_u64(body)
            }
            version => {
                return Err(Mp4Error::UnsupportedVersion {
                    box_type: FourCC::TFDT,
                    version,
                });
            }
        };

        Ok(Self {
            version,
            base_media_decode_time,
        })
    }
}

/// `mdhd`: Media Header
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MediaHeader {
    pub version: u8,
    pub timescale: u32,
    pub duration: u64,
}

impl MediaHeader {
    pub fn parse(payload: &[u8]) -> Result<Self> {
        ensure_len(payload, FULL_BOX_HEADER_SIZE)?;
        let version = payload[0];
        let body = &payload[FULL_BOX_HEADER_SIZE..];

        // creation_time and modification_time precede the timescale
        let (timescale, duration) = match version {
            0 => {
                ensure_len(body, 16)?;
                (
                    BigEndian::read_u32(&body[8..12]),
                    BigEndian::read_u32(&body[12..16]) as u64,
                )
            }
            1 => {
                ensure_len(body, 28)?;
                (
                    BigEndian::read_u32(&body[16..20]),
                    BigEndian::read_u64(&body[20..28]),
                )
            }
            version => {
                return Err(Mp4Error::UnsupportedVersion {
                    box_type: FourCC::MDHD,
                    version,
                });
            }
        };

        Ok(Self {
            version,
            timescale,
            duration,
        })
    }
}

/// Read `moof > traf > tfdt` from a media segment prefix.
///
/// Returns `Ok(None)` when the prefix holds no such box.
pub fn base_media_decode_time(segment: &[u8]) -> Result<Option<u64>> {
    let Some(payload) = find_box(segment, &[FourCC::MOOF, FourCC::TRAF, FourCC::TFDT])? else {
        return Ok(None);
    };
    let tfdt = TrackFragmentDecodeTime::parse(payload)?;
    debug!(
        version = tfdt.version,
        base_media_decode_time = tfdt.base_media_decode_time,
        "Parsed tfdt"
    );
    Ok(Some(tfdt.base_media_decode_time))
}

/// Read the first track's timescale from `moov > trak > mdia > mdhd`.
///
/// A zero timescale is treated as absent.
pub fn timescale(init: &[u8]) -> Result<Option<u32>> {
    let Some(payload) = find_box(
        init,
        &[FourCC::MOOV, FourCC::TRAK, FourCC::MDIA, FourCC::MDHD],
    )?
    else {
        return Ok(None);
    };
    let mdhd = MediaHeader::parse(payload)?;
    debug!(version = mdhd.version, timescale = mdhd.timescale, "Parsed mdhd");
    Ok((mdhd.timescale != 0).then_some(mdhd.timescale))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_box(box_type: &[u8; 4], payload: &[u8]) -> Vec<u8> {
        let mut out = ((payload.len() + 8) as u32).to_be_bytes().to_vec();
        out.extend_from_slice(box_type);
        out.extend_from_slice(payload);
        out
    }

    fn tfdt_v1(time: u64) -> Vec<u8> {
        let mut payload = vec![1, 0, 0, 0];
        payload.extend_from_slice(&time.to_be_bytes());
        make_box(b"tfdt", &payload)
    }

    fn mdhd_v0(timescale: u32) -> Vec<u8> {
        let mut payload = vec![0; 12];
        payload.extend_from_slice(&timescale.to_be_bytes());
        payload.extend_from_slice(&[0, 0, 0, 0, 0x55, 0xc4, 0, 0]);
        make_box(b"mdhd", &payload)
    }

    #[test]
    fn test_tfdt_versions() {
        let v0 = TrackFragmentDecodeTime::parse(&[0, 0, 0, 0, 0, 0, 0x07, 0xd0]).unwrap();
        assert_eq!(v0.base_media_decode_time, 2000);

        let v1 = TrackFragmentDecodeTime::parse(&tfdt_v1(655_360)[8..]).unwrap();
        assert_eq!(v1.version, 1);
        assert_eq!(v1.base_media_decode_time, 655_360);

        assert!(matches!(
            TrackFragmentDecodeTime::parse(&[2, 0, 0, 0, 0, 0, 0, 0]),
            Err(Mp4Error::UnsupportedVersion { version: 2, .. })
        ));
    }

    #[test]
    fn test_truncated_tfdt() {
        assert!(matches!(
            TrackFragmentDecodeTime::parse(&[1, 0, 0, 0, 0, 0]),
            Err(Mp4Error::InsufficientData { expected: 8, actual: 2 })
        ));
    }

    #[test]
    fn test_base_media_decode_time_from_segment() {
        let traf = make_box(b"traf", &tfdt_v1(2000));
        let mut segment = make_box(b"moof", &traf);
        segment.extend(make_box(b"mdat", &[0; 32]));

        assert_eq!(base_media_decode_time(&segment).unwrap(), Some(2000));
        assert_eq!(base_media_decode_time(&make_box(b"mdat", &[])).unwrap(), None);
    }

    #[test]
    fn test_timescale_from_init() {
        let mdia = make_box(b"mdia", &mdhd_v0(1000));
        let trak = make_box(b"trak", &mdia);
        let mut init = make_box(b"ftyp", b"iso6");
        init.extend(make_box(b"moov", &trak));

        assert_eq!(timescale(&init).unwrap(), Some(1000));
        assert_eq!(timescale(&make_box(b"ftyp", b"iso6")).unwrap(), None);
    }

    #[test]
    fn test_mdhd_version_1() {
        let mut payload = vec![1, 0, 0, 0];
        payload.extend_from_slice(&[0; 16]);
        payload.extend_from_slice(&48_000u32.to_be_bytes());
        payload.extend_from_slice(&96_000u64.to_be_bytes());
        let mdhd = MediaHeader::parse(&payload).unwrap();
        assert_eq!(mdhd.timescale, 48_000);
        assert_eq!(mdhd.duration, 96_000);
    }
}
