//! Test helpers: an in-memory transport and segment fixtures.

use std::collections::HashMap;

use async_trait::async_trait;
use bytes::Bytes;
use parking_lot::Mutex;

use crate::ManifestError;
use crate::net::{FetchRequest, FetchResponse, RequestMethod, Transport};

/// Initialize tracing for tests
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .with_test_writer()
        .try_init();
}

/// Transport serving canned responses from memory.
///
/// Unknown URIs answer with HTTP 404. HEAD requests return the configured
/// headers with an empty body. Byte ranges are honoured and clamped to the
/// resource size.
#[derive(Default)]
pub struct FakeTransport {
    resources: HashMap<String, Bytes>,
    headers: HashMap<String, HashMap<String, String>>,
    requests: Mutex<Vec<FetchRequest>>,
}

impl FakeTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_text(self, uri: &str, text: &str) -> Self {
        self.with_data(uri, text.as_bytes().to_vec())
    }

    pub fn with_data(mut self, uri: &str, data: impl Into<Bytes>) -> Self {
        self.resources.insert(uri.to_string(), data.into());
        self
    }

    pub fn with_header(mut self, uri: &str, name: &str, value: &str) -> Self {
        self.headers
            .entry(uri.to_string())
            .or_default()
            .insert(name.to_ascii_lowercase(), value.to_string());
        self
    }

    /// Every request seen so far, in order
    pub fn requests(&self) -> Vec<FetchRequest> {
        self.requests.lock().clone()
    }

    pub fn request_count(&self, uri: &str, method: RequestMethod) -> usize {
        self.requests
            .lock()
            .iter()
            .filter(|request| request.uri == uri && request.method == method)
            .count()
    }
}

#[async_trait]
impl Transport for FakeTransport {
    async fn fetch(&self, request: FetchRequest) -> Result<FetchResponse, ManifestError> {
        self.requests.lock().push(request.clone());

        let headers = self.headers.get(&request.uri).cloned().unwrap_or_default();
        let not_found = || ManifestError::HttpStatus {
            uri: request.uri.clone(),
            status: 404,
        };

        let data = match request.method {
            RequestMethod::Head => {
                if !self.resources.contains_key(&request.uri) && headers.is_empty() {
                    return Err(not_found());
                }
                Bytes::new()
            }
            RequestMethod::Get => {
                let data = self.resources.get(&request.uri).ok_or_else(not_found)?;
                match request.byte_range {
                    Some(range) => {
                        let len = data.len() as u64;
                        let start = range.start.min(len) as usize;
                        let end = range.end.saturating_add(1).min(len) as usize;
                        data.slice(start..end)
                    }
                    None => data.clone(),
                }
            }
        };

        Ok(FetchResponse {
            uri: request.uri.clone(),
            data,
            headers,
        })
    }
}

/// `moov > trak > mdia > mdhd` with a version 0 mdhd and a timescale of 1000
pub const INIT_SEGMENT: [u8; 48] = [
    0x00, 0x00, 0x00, 0x30, b'm', b'o', b'o', b'v', // moov
    0x00, 0x00, 0x00, 0x28, b't', b'r', b'a', b'k', // trak
    0x00, 0x00, 0x00, 0x20, b'm', b'd', b'i', b'a', // mdia
    0x00, 0x00, 0x00, 0x18, b'm', b'd', b'h', b'd', // mdhd
    0x00, 0x00, 0x00, 0x00, // version and flags
    0x00, 0x00, 0x00, 0x00, // creation time
    0x00, 0x00, 0x00, 0x00, // modification time
    0x00, 0x00, 0x03, 0xe8, // timescale (1000)
];

/// `moof > traf > tfdt` (version 1) followed by an empty `mdat`
pub fn mp4_segment(base_media_decode_time: u64) -> Vec<u8> {
    let mut data = vec![
        0x00, 0x00, 0x00, 0x24, b'm', b'o', b'o', b'f', // moof
        0x00, 0x00, 0x00, 0x1c, b't', b'r', b'a', b'f', // traf
        0x00, 0x00, 0x00, 0x14, b't', b'f', b'd', b't', // tfdt
        0x01, 0x00, 0x00, 0x00, // version 1
    ];
    data.extend_from_slice(&base_media_decode_time.to_be_bytes());
    data.extend_from_slice(&[0x00, 0x00, 0x00, 0x08, b'm', b'd', b'a', b't']);
    data
}

/// One 188-byte TS packet starting a video PES with the given PTS
pub fn ts_segment(pts: u64) -> Vec<u8> {
    let mut data = vec![0xffu8; 188];
    data[..14].copy_from_slice(&[
        0x47, 0x41, 0x01, 0x10, // sync, PUSI, PID 257, payload only
        0x00, 0x00, 0x01, 0xe0, // PES start code, video stream 0
        0x00, 0x00, // PES packet length
        0x80, 0x80, 0x05, // marker bits, PTS only, header data length
        0x21 | ((pts >> 29) & 0x0e) as u8,
    ]);
    data[14] = (pts >> 22) as u8;
    data[15] = (((pts >> 14) & 0xfe) | 0x01) as u8;
    data[16] = (pts >> 7) as u8;
    data[17] = (((pts << 1) & 0xfe) | 0x01) as u8;
    data
}

#[test]
fn test_ts_segment_fixture() {
    assert_eq!(&ts_segment(180_000)[13..18], &[0x21, 0x00, 0x0b, 0x7e, 0x41]);
}
