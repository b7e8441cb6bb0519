use tracing::trace;

use crate::header::{BoxHeader, FourCC};
use crate::Result;

/// Iterator over sibling boxes in a byte slice.
///
/// A box whose declared size runs past the end of the slice yields the bytes
/// that are available, so a prefix of a segment can still be walked. A tail
/// too short to hold a header ends the iteration.
pub struct BoxIter<'a> {
    data: &'a [u8],
    offset: usize,
    failed: bool,
}

impl<'a> BoxIter<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self {
            data,
            offset: 0,
            failed: false,
        }
    }
}

impl<'a> Iterator for BoxIter<'a> {
    type Item = Result<(BoxHeader, &'a [u8])>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None;
        }
        let remaining = &self.data[self.offset..];
        if remaining.len() < BoxHeader::MIN_SIZE {
            return None;
        }

        let header = match BoxHeader::parse(remaining) {
            Ok(header) => header,
            Err(e) => {
                self.failed = true;
                return Some(Err(e));
            }
        };
        if header.header_size > remaining.len() {
            return None;
        }

        let end = match header.size {
            Some(size) => usize::try_from(size)
                .unwrap_or(usize::MAX)
                .min(remaining.len()),
            None => remaining.len(),
        };
        let payload = &remaining[header.header_size..end];
        trace!(
            box_type = %header.box_type,
            size = ?header.size,
            available = payload.len(),
            "Walked box"
        );

        self.offset += end;
        Some(Ok((header, payload)))
    }
}

/// Find the payload of the first box reached by following `path` through
/// nested container boxes, e.g. `[moof, traf, tfdt]`.
pub fn find_box<'a>(data: &'a [u8], path: &[FourCC]) -> Result<Option<&'a [u8]>> {
    let Some((first, rest)) = path.split_first() else {
        return Ok(Some(data));
    };

    for entry in BoxIter::new(data) {
        let (header, payload) = entry?;
        if header.box_type != *first {
            continue;
        }
        if let Some(found) = find_box(payload, rest)? {
            return Ok(Some(found));
        }
    }
    Ok(None)
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

    #[test]
    fn test_iterates_siblings() {
        let mut data = make_box(b"styp", b"msdh");
        data.extend(make_box(b"moof", &[]));
        let types: Vec<_> = BoxIter::new(&data)
            .map(|entry| entry.unwrap().0.box_type)
            .collect();
        assert_eq!(types, vec![FourCC::STYP, FourCC::MOOF]);
    }

    #[test]
    fn test_truncated_box_yields_available_bytes() {
        let data = make_box(b"mdat", &[1, 2, 3, 4, 5, 6]);
        let (header, payload) = BoxIter::new(&data[..11]).next().unwrap().unwrap();
        assert_eq!(header.size, Some(14));
        assert_eq!(payload, &[1, 2, 3]);
    }

    #[test]
    fn test_find_nested_box() {
        let tfdt = make_box(b"tfdt", &[0, 0, 0, 0, 0, 0, 0x07, 0xd0]);
        let traf = make_box(b"traf", &[make_box(b"tfhd", &[0; 8]), tfdt].concat());
        let moof = make_box(b"moof", &[make_box(b"mfhd", &[0; 8]), traf].concat());

        let payload = find_box(&moof, &[FourCC::MOOF, FourCC::TRAF, FourCC::TFDT])
            .unwrap()
            .unwrap();
        assert_eq!(payload, &[0, 0, 0, 0, 0, 0, 0x07, 0xd0]);
        assert_eq!(find_box(&moof, &[FourCC::MOOV]).unwrap(), None);
    }

    #[test]
    fn test_invalid_box_size_is_an_error() {
        let data = [0x00, 0x00, 0x00, 0x02, b'm', b'o', b'o', b'f'];
        assert!(find_box(&data, &[FourCC::MOOF]).is_err());
    }
}
