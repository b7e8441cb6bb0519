use std::sync::Arc;

use hls::{ByteRange, ContentType, Resolution, TextKind};
use parking_lot::RwLock;
use serde::ser::SerializeSeq;
use serde::{Serialize, Serializer};

use super::PresentationTimeline;

/// Parsed presentation
#[derive(Debug, Clone, Serialize)]
pub struct Manifest {
    pub presentation_timeline: PresentationTimeline,
    /// Always exactly one period for HLS
    pub periods: Vec<Period>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Period {
    pub start_time: f64,
    pub variants: Vec<Variant>,
    pub text_streams: Vec<Arc<Stream>>,
}

/// A playable combination of one video and/or one audio stream
#[derive(Debug, Clone, Serialize)]
pub struct Variant {
    pub id: u32,
    pub bandwidth: u64,
    pub language: String,
    pub primary: bool,
    pub video: Option<Arc<Stream>>,
    pub audio: Option<Arc<Stream>>,
    pub encrypted: bool,
    pub drm_infos: Vec<DrmInfo>,
}

impl Variant {
    /// Video and audio streams of this variant
    pub fn streams(&self) -> impl Iterator<Item = &Arc<Stream>> {
        self.video.iter().chain(self.audio.iter())
    }
}

/// Descriptive attributes of a stream taken from the master playlist
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct StreamAttributes {
    pub language: String,
    pub label: Option<String>,
    pub frame_rate: Option<f64>,
    pub resolution: Option<Resolution>,
    pub channels_count: Option<u32>,
    pub kind: Option<TextKind>,
    pub primary: bool,
}

/// One media playlist
#[derive(Debug, Serialize)]
pub struct Stream {
    pub id: u32,
    /// Resolved media playlist URI
    pub uri: String,
    pub content_type: ContentType,
    pub mime_type: String,
    pub codecs: String,
    #[serde(flatten)]
    pub attributes: StreamAttributes,
    /// Media time at which the first segment starts, in seconds
    pub presentation_time_offset: f64,
    pub init_segment: Option<InitSegmentReference>,
    pub segment_index: SegmentIndex,
    pub drm_infos: Vec<DrmInfo>,
    pub encrypted: bool,
    /// Declared `EXT-X-MEDIA-SEQUENCE` of the first segment
    pub media_sequence: u64,
    pub target_duration: Option<f64>,
    /// The playlist is neither VOD nor ended
    pub live: bool,
}

impl Stream {
    /// Sum of declared segment durations
    pub fn duration(&self) -> f64 {
        self.segment_index
            .snapshot()
            .last()
            .map(|last| last.end_time)
            .unwrap_or_default()
    }

    pub fn language(&self) -> &str {
        &self.attributes.language
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InitSegmentReference {
    /// Equivalent locations, tried in order
    pub uris: Vec<String>,
    pub byte_range: Option<ByteRange>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SegmentReference {
    pub position: u64,
    pub start_time: f64,
    pub end_time: f64,
    pub uris: Vec<String>,
    pub byte_range: Option<ByteRange>,
}

impl SegmentReference {
    pub fn duration(&self) -> f64 {
        self.end_time - self.start_time
    }
}

/// Ordered segment timeline of a stream.
///
/// Readers take a snapshot; updates replace the whole timeline at once, so a
/// reader never sees a partially updated sequence.
#[derive(Debug, Default)]
pub struct SegmentIndex {
    references: RwLock<Arc<Vec<SegmentReference>>>,
}

impl SegmentIndex {
    pub fn new(references: Vec<SegmentReference>) -> Self {
        Self {
            references: RwLock::new(Arc::new(references)),
        }
    }

    pub fn snapshot(&self) -> Arc<Vec<SegmentReference>> {
        self.references.read().clone()
    }

    pub fn replace(&self, references: Vec<SegmentReference>) {
        *self.references.write() = Arc::new(references);
    }

    pub fn len(&self) -> usize {
        self.references.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.references.read().is_empty()
    }

    /// Reference at `position`
    pub fn get(&self, position: u64) -> Option<SegmentReference> {
        let references = self.snapshot();
        let first = references.first()?.position;
        let idx = usize::try_from(position.checked_sub(first)?).ok()?;
        references.get(idx).cloned()
    }

    /// Longest segment duration, 0 for an empty index
    pub fn max_segment_duration(&self) -> f64 {
        self.snapshot()
            .iter()
            .map(SegmentReference::duration)
            .fold(0.0, f64::max)
    }

    /// Position of the segment containing `time`
    pub fn find(&self, time: f64) -> Option<u64> {
        let references = self.snapshot();
        references
            .iter()
            .find(|reference| time >= reference.start_time && time < reference.end_time)
            .map(|reference| reference.position)
    }
}

impl Serialize for SegmentIndex {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let references = self.snapshot();
        let mut seq = serializer.serialize_seq(Some(references.len()))?;
        for reference in references.iter() {
            seq.serialize_element(reference)?;
        }
        seq.end()
    }
}

/// Key system information extracted from key tags
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DrmInfo {
    pub key_system: String,
    /// Key or licence URI when the key tag does not inline its data
    pub license_server_uri: Option<String>,
    pub init_data: Vec<InitData>,
    /// Lower-case hex key ids
    pub key_ids: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InitData {
    /// Box type of the data, e.g. `cenc`
    pub init_data_type: String,
    #[serde(serialize_with = "serialize_hex")]
    pub data: Vec<u8>,
    pub key_id: Option<String>,
}

fn serialize_hex<S: Serializer>(data: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&hex::encode(data))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reference(position: u64, start_time: f64, end_time: f64) -> SegmentReference {
        SegmentReference {
            position,
            start_time,
            end_time,
            uris: vec![format!("https://cdn.example.com/seg{position}.ts")],
            byte_range: None,
        }
    }

    #[test]
    fn test_segment_index_lookup() {
        let index = SegmentIndex::new(vec![reference(0, 0.0, 5.0), reference(1, 5.0, 10.0)]);
        assert_eq!(index.len(), 2);
        assert_eq!(index.get(1).unwrap().start_time, 5.0);
        assert!(index.get(2).is_none());
        assert_eq!(index.find(4.99), Some(0));
        assert_eq!(index.find(5.0), Some(1));
        assert_eq!(index.find(10.0), None);
    }

    #[test]
    fn test_max_segment_duration() {
        let index = SegmentIndex::new(vec![reference(0, 0.0, 5.0), reference(1, 5.0, 10.5)]);
        assert_eq!(index.max_segment_duration(), 5.5);
        assert_eq!(SegmentIndex::default().max_segment_duration(), 0.0);
    }

    #[test]
    fn test_replace_keeps_old_snapshots() {
        let index = SegmentIndex::new(vec![reference(0, 0.0, 5.0)]);
        let before = index.snapshot();
        index.replace(vec![reference(1, 5.0, 10.0), reference(2, 10.0, 15.0)]);

        assert_eq!(before.len(), 1);
        assert_eq!(index.len(), 2);
        assert!(index.get(0).is_none());
        assert_eq!(index.get(2).unwrap().end_time, 15.0);
    }
}
