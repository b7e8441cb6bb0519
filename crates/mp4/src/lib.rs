//! ISO Base Media File Format (fragmented MP4) box parsing
//!
//! Only the subset needed to place a fragment on a timeline is covered: box
//! headers, walking nested container boxes, and decoding the `tfdt` and
//! `mdhd` payloads. All functions operate on byte slices that may be a
//! truncated prefix of a larger resource.

pub mod boxes;
pub mod error;
pub mod header;
pub mod walk;

pub use boxes::{MediaHeader, TrackFragmentDecodeTime, base_media_decode_time, timescale};
pub use error::Mp4Error;
pub use header::{BoxHeader, FourCC, looks_like_box};
pub use walk::{BoxIter, find_box};

/// Result type for MP4 parsing operations
pub type Result<T> = std::result::Result<T, Mp4Error>;
