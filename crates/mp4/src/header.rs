use std::fmt;

use byteorder::{BigEndian, ByteOrder};

use crate::{Mp4Error, Result};

/// Four-character box type code
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct FourCC(pub [u8; 4]);

impl FourCC {
    pub const FTYP: FourCC = FourCC(*b"ftyp");
    pub const STYP: FourCC = FourCC(*b"styp");
    pub const SIDX: FourCC = FourCC(*b"sidx");
    pub const MOOV: FourCC = FourCC(*b"moov");
    pub const TRAK: FourCC = FourCC(*b"trak");
    pub const MDIA: FourCC = FourCC(*b"mdia");
    pub const MDHD: FourCC = FourCC(*b"mdhd");
    pub const MOOF: FourCC = FourCC(*b"moof");
    pub const TRAF: FourCC = FourCC(*b"traf");
    pub const TFDT: FourCC = FourCC(*b"tfdt");
    pub const MDAT: FourCC = FourCC(*b"mdat");
    pub const UUID: FourCC = FourCC(*b"uuid");

    /// True when every byte is printable ASCII, as all registered box types are.
    pub fn is_printable(&self) -> bool {
        self.0.iter().all(|b| b.is_ascii_graphic() || *b == b' ')
    }
}

impl fmt::Display for FourCC {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for b in self.0 {
            let c = if b.is_ascii_graphic() || b == b' ' {
                b as char
            } else {
                '?'
            };
            write!(f, "{c}")?;
        }
        Ok(())
    }
}

impl fmt::Debug for FourCC {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "FourCC({self})")
    }
}

/// A parsed box header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BoxHeader {
    pub box_type: FourCC,
    /// Total box size including the header, `None` when the box extends to
    /// the end of its container.
    pub size: Option<u64>,
    /// 8, 16 for a 64-bit `largesize`, plus 16 more for `uuid` boxes
    pub header_size: usize,
}

impl BoxHeader {
    pub const MIN_SIZE: usize = 8;

    /// Parse the header at the start of `data`.
    pub fn parse(data: &[u8]) -> Result<Self> {
        if data.len() < Self::MIN_SIZE {
            return Err(Mp4Error::InsufficientData {
                expected: Self::MIN_SIZE,
                actual: data.len(),
            });
        }

        let size32 = BigEndian::read_u32(&data[0..4]);
        let box_type = FourCC([data[4], data[5], data[6], data[7]]);
        let mut header_size = Self::MIN_SIZE;

        let size = match size32 {
            0 => None,
            1 => {
                if data.len() < 16 {
                    return Err(Mp4Error::InsufficientData {
                        expected: 16,
                        actual: data.len(),
                    });
                }
                header_size = 16;
                Some(BigEndian::read_u64(&data[8..16]))
            }
            n => Some(n as u64),
        };

        if box_type == FourCC::UUID {
            header_size += 16;
        }

        if let Some(size) = size
            && size < header_size as u64
        {
            return Err(Mp4Error::InvalidBoxSize { box_type, size });
        }

        Ok(BoxHeader {
            box_type,
            size,
            header_size,
        })
    }

    /// Size of the payload following the header, if bounded
    pub fn payload_size(&self) -> Option<u64> {
        self.size.map(|size| size - self.header_size as u64)
    }
}

/// Cheap check that `data` starts with something shaped like a box header.
pub fn looks_like_box(data: &[u8]) -> bool {
    if data.len() < BoxHeader::MIN_SIZE {
        return false;
    }
    let size = BigEndian::read_u32(&data[0..4]);
    let box_type = FourCC([data[4], data[5], data[6], data[7]]);
    (size == 0 || size == 1 || size >= BoxHeader::MIN_SIZE as u32) && box_type.is_printable()
}
