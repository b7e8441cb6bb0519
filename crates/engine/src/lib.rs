//! # Manifest Engine
//!
//! Parses HLS master and media playlists into a presentation graph of
//! periods, variants and streams that a player can render from.
//!
//! ## Features
//!
//! - Rendition group expansion with shared, deduplicated streams
//! - Segment timelines with byte-range support
//! - Mime type and codec inference
//! - Stream start times sniffed from fMP4 and MPEG-TS segments
//! - DRM key system extraction
//! - Pluggable transport, with a reqwest implementation

pub mod builder;
pub mod config;
pub mod error;
pub mod hls;
pub mod model;
pub mod net;

#[cfg(test)]
mod test_utils;

pub use builder::ManifestConfigBuilder;
pub use config::{ManifestConfig, RetryParameters};
pub use error::ManifestError;
pub use crate::hls::{HlsParser, ManifestEvent, PlayerInterface, TimelineRegion};
pub use model::{
    DrmInfo, InitData, InitSegmentReference, Manifest, Period, PresentationTimeline,
    SegmentIndex, SegmentReference, Stream, StreamAttributes, Variant,
};
pub use net::{FetchRequest, FetchResponse, HttpTransport, RequestMethod, Transport, create_client};
