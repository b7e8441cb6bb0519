//! Media playlist to [`Stream`].

use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};

use hls::codecs::{mime_from_manifest, mime_from_response};
use hls::validate::{require_attribute, require_header, require_tag};
use hls::{
    ByteRange, ContentType, HlsError, LexedTag, SegmentStartTime, Tag, TagName, lex,
    sniff_start_time,
};
use tracing::{debug, trace};
use url::Url;

use super::drm::extract_drm_infos;
use crate::ManifestError;
use crate::config::ManifestConfig;
use crate::model::{InitSegmentReference, SegmentIndex, SegmentReference, Stream, StreamAttributes};
use crate::net::{FetchRequest, Transport};

const PLAYLIST_TYPE_VOD: &str = "VOD";

/// Resolve a playlist reference against the playlist it appears in.
pub(crate) fn resolve_uri(base: &Url, uri: &str) -> Result<Url, ManifestError> {
    base.join(uri.trim())
        .map_err(|e| ManifestError::InvalidUri(format!("{uri}: {e}")))
}

/// The segment timeline and playlist-level tags of one media playlist
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct MediaPlaylist {
    pub segments: Vec<SegmentReference>,
    pub init_segment: Option<InitSegmentReference>,
    pub keys: Vec<Tag>,
    pub media_sequence: u64,
    pub target_duration: Option<f64>,
    pub live: bool,
}

fn parse_segment_duration(tag: &Tag) -> Result<f64, HlsError> {
    let value = tag.value().unwrap_or_default();
    let duration = value.split(',').next().unwrap_or_default().trim();
    match duration.parse::<f64>() {
        Ok(duration) if duration.is_finite() && duration > 0.0 => Ok(duration),
        _ => Err(HlsError::invalid_value(tag.name.as_str(), value)),
    }
}

impl MediaPlaylist {
    /// Fold the lexed tags into a segment timeline.
    ///
    /// Start times are the running sum of declared `EXTINF` durations from 0,
    /// positions are 0-based from the first segment of the playlist.
    pub(crate) fn parse(text: &str, base: &Url) -> Result<Self, ManifestError> {
        let tags = lex(text);
        require_header(&tags)?;

        let mut segments = Vec::new();
        let mut init_segment = None;
        let mut keys = Vec::new();
        let mut media_sequence = 0;
        let mut target_duration = None;
        let mut vod = false;
        let mut ended = false;

        let mut segment_tags_start = 0;
        let mut pending_range: Option<ByteRange> = None;
        let mut next_range_start = 0;
        let mut start_time = 0.0;

        for (index, LexedTag { tag, uri }) in tags.iter().enumerate() {
            match &tag.name {
                TagName::PlaylistType => {
                    vod |= tag.value().map(str::trim) == Some(PLAYLIST_TYPE_VOD);
                }
                TagName::EndList => ended = true,
                TagName::TargetDuration => target_duration = Some(tag.parse_value::<f64>()?),
                TagName::MediaSequence => media_sequence = tag.parse_value::<u64>()?,
                TagName::Map => {
                    if init_segment.is_some() {
                        return Err(HlsError::MultipleMediaInitSectionsFound.into());
                    }
                    let map_uri = require_attribute(tag, "URI")?;
                    let byte_range = tag
                        .attribute("BYTERANGE")
                        .map(|value| ByteRange::parse(value, 0))
                        .transpose()?;
                    init_segment = Some(InitSegmentReference {
                        uris: vec![resolve_uri(base, map_uri)?.to_string()],
                        byte_range,
                    });
                }
                TagName::Key => keys.push(tag.clone()),
                TagName::ByteRange => {
                    let value = tag.value().unwrap_or_default();
                    pending_range = Some(ByteRange::parse(value, next_range_start)?);
                }
                _ => {}
            }

            let Some(uri) = uri else {
                continue;
            };
            // Tags since the previous URI line describe this segment
            let segment_tags = &tags[segment_tags_start..=index];
            segment_tags_start = index + 1;
            let duration = parse_segment_duration(require_tag(segment_tags, &TagName::Inf)?)?;
            let byte_range = pending_range.take();
            if let Some(range) = byte_range {
                next_range_start = range.next_start();
            }

            segments.push(SegmentReference {
                position: segments.len() as u64,
                start_time,
                end_time: start_time + duration,
                uris: vec![resolve_uri(base, uri)?.to_string()],
                byte_range,
            });
            start_time += duration;
        }

        Ok(Self {
            segments,
            init_segment,
            keys,
            media_sequence,
            target_duration,
            live: !(vod || ended),
        })
    }
}

/// What the master playlist knows about a stream before it is fetched
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct StreamRequest {
    pub uri: Url,
    pub content_type: ContentType,
    /// Codecs recorded on the stream
    pub codecs: String,
    /// Codecs the master playlist declared, empty when none were declared.
    /// Only these take part in mime type inference.
    pub declared_codecs: String,
    pub attributes: StreamAttributes,
}

fn default_mime_type(content_type: ContentType) -> &'static str {
    match content_type {
        ContentType::Video => "video/mp4",
        ContentType::Audio => "audio/mp4",
        ContentType::Text => "text/vtt",
    }
}

/// Fetches media playlists and turns them into [`Stream`]s
#[derive(Clone)]
pub(crate) struct StreamBuilder {
    transport: Arc<dyn Transport>,
    config: Arc<ManifestConfig>,
    next_id: Arc<AtomicU32>,
}

impl StreamBuilder {
    pub(crate) fn new(transport: Arc<dyn Transport>, config: Arc<ManifestConfig>) -> Self {
        Self {
            transport,
            config,
            next_id: Arc::new(AtomicU32::new(0)),
        }
    }

    pub(crate) async fn build(&self, request: StreamRequest) -> Result<Arc<Stream>, ManifestError> {
        let response = self
            .transport
            .fetch(FetchRequest::get(request.uri.as_str()))
            .await?;
        let base = Url::parse(&response.uri).unwrap_or_else(|_| request.uri.clone());
        let text = String::from_utf8_lossy(&response.data);
        let playlist = MediaPlaylist::parse(&text, &base)?;

        let mime_type = self.guess_mime_type(&request, &playlist).await?;

        let drm_infos = if self.config.ignore_drm_info {
            Vec::new()
        } else {
            extract_drm_infos(playlist.keys.iter(), &base)?
        };

        let presentation_time_offset = match playlist.segments.first() {
            Some(first) if request.content_type != ContentType::Text => self
                .sniff(playlist.init_segment.as_ref(), first)
                .await?
                .seconds(),
            _ => 0.0,
        };

        let stream = Stream {
            id: self.next_id.fetch_add(1, Ordering::Relaxed),
            uri: request.uri.to_string(),
            content_type: request.content_type,
            mime_type,
            codecs: request.codecs,
            attributes: request.attributes,
            presentation_time_offset,
            init_segment: playlist.init_segment,
            encrypted: !drm_infos.is_empty(),
            drm_infos,
            media_sequence: playlist.media_sequence,
            target_duration: playlist.target_duration,
            live: playlist.live,
            segment_index: SegmentIndex::new(playlist.segments),
        };

        debug!(
            uri = %stream.uri,
            content_type = %stream.content_type,
            mime_type = %stream.mime_type,
            segments = stream.segment_index.len(),
            live = stream.live,
            presentation_time_offset = stream.presentation_time_offset,
            "Built stream"
        );
        Ok(Arc::new(stream))
    }

    /// Mime type from the playlist, or from a HEAD request for the first
    /// segment when nothing in the playlist determines it.
    async fn guess_mime_type(
        &self,
        request: &StreamRequest,
        playlist: &MediaPlaylist,
    ) -> Result<String, ManifestError> {
        let Some(first_uri) = playlist
            .segments
            .first()
            .and_then(|segment| segment.uris.first())
        else {
            let mime = mime_from_manifest(request.content_type, &request.declared_codecs, "")?;
            return Ok(mime.unwrap_or_else(|| default_mime_type(request.content_type).to_string()));
        };

        if let Some(mime) =
            mime_from_manifest(request.content_type, &request.declared_codecs, first_uri)?
        {
            return Ok(mime);
        }

        trace!(uri = %first_uri, "Requesting segment headers for mime type");
        let response = self.transport.fetch(FetchRequest::head(first_uri)).await?;
        Ok(mime_from_response(
            request.content_type,
            first_uri,
            response.content_type(),
        )?)
    }

    /// Read the start time of the first segment from a prefix of its bytes.
    ///
    /// The init segment and the prefix are fetched concurrently.
    async fn sniff(
        &self,
        init_segment: Option<&InitSegmentReference>,
        first: &SegmentReference,
    ) -> Result<SegmentStartTime, ManifestError> {
        let segment_uri = first
            .uris
            .first()
            .ok_or_else(|| ManifestError::Internal("segment without URI".to_string()))?;
        let start = first.byte_range.map_or(0, |range| range.start);
        let prefix_range = ByteRange::from_length(start, self.config.sniff_byte_budget).map(
            |range| match first.byte_range {
                Some(segment_range) => ByteRange::new(range.start, range.end.min(segment_range.end)),
                None => range,
            },
        );

        let segment_fetch = self
            .transport
            .fetch(FetchRequest::get(segment_uri).with_byte_range(prefix_range));
        let init_fetch = async {
            let Some(init) = init_segment else {
                return Ok::<_, ManifestError>(None);
            };
            let init_uri = init
                .uris
                .first()
                .ok_or_else(|| ManifestError::Internal("init segment without URI".to_string()))?;
            self.transport
                .fetch(FetchRequest::get(init_uri).with_byte_range(init.byte_range))
                .await
                .map(Some)
        };

        let (segment, init) = tokio::try_join!(segment_fetch, init_fetch)?;
        Ok(sniff_start_time(
            &segment.data,
            init.as_ref().map(|response| response.data.as_ref()),
        )?)
    }
}
