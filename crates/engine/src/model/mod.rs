//! The presentation graph produced by a parse.

mod manifest;
pub(crate) mod timeline;

pub use manifest::{
    DrmInfo, InitData, InitSegmentReference, Manifest, Period, SegmentIndex, SegmentReference,
    Stream, StreamAttributes, Variant,
};
pub use timeline::PresentationTimeline;
