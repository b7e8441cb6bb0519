//! HLS playlist parsing on top of a [`Transport`](crate::net::Transport).

pub mod drm;
mod master;
mod media_playlist;
mod parser;
pub mod player;
mod stream_cache;

pub use parser::HlsParser;
pub use player::{ManifestEvent, PlayerInterface, TimelineRegion};
