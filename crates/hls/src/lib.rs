// HLS (HTTP Live Streaming) playlist handling without I/O
pub mod byte_range;
pub mod codecs;
pub mod error;
pub mod language;
pub mod lexer;
pub mod resolution;
pub mod sniff;
pub mod tag;
pub mod validate;

// Export common types for ease of use
pub use byte_range::ByteRange;
pub use codecs::{ContentType, TextKind};
pub use error::{HlsError, Severity};
pub use lexer::lex;
pub use resolution::Resolution;
pub use sniff::{ContainerKind, SegmentStartTime, sniff_start_time};
pub use tag::{Attribute, LexedTag, Tag, TagName};
