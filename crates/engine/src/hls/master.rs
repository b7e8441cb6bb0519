//! Master playlist to [`Manifest`].
//!
//! Variants and renditions are validated up front, every stream they
//! reference is built concurrently through the [`StreamCache`], and rendition
//! groups are then expanded into one [`Variant`] per combination.

use std::collections::HashMap;
use std::sync::Arc;

use futures::future::try_join_all;
use hls::codecs::{codec_content_type, codecs_for_type};
use hls::language::{UNDETERMINED, normalize};
use hls::validate::{require_attribute, require_header};
use hls::{ContentType, HlsError, LexedTag, Resolution, Tag, TagName, TextKind, lex};
use tracing::{debug, info, warn};
use url::Url;

use super::drm::merge_drm_infos;
use super::media_playlist::{StreamRequest, resolve_uri};
use super::player::PlayerInterface;
use super::stream_cache::StreamCache;
use crate::ManifestError;
use crate::config::ManifestConfig;
use crate::model::timeline::{StreamTiming, TimelineOptions};
use crate::model::{Manifest, Period, PresentationTimeline, Stream, StreamAttributes, Variant};

const TYPE_AUDIO: &str = "AUDIO";
const TYPE_VIDEO: &str = "VIDEO";
const TYPE_SUBTITLES: &str = "SUBTITLES";
const TYPE_CLOSED_CAPTIONS: &str = "CLOSED-CAPTIONS";

fn group_type_name(content_type: ContentType) -> &'static str {
    match content_type {
        ContentType::Video => TYPE_VIDEO,
        ContentType::Audio => TYPE_AUDIO,
        ContentType::Text => TYPE_SUBTITLES,
    }
}

/// An `EXT-X-MEDIA` tag with a playlist of its own
#[derive(Debug, Clone, PartialEq)]
struct Rendition {
    content_type: ContentType,
    group_id: String,
    uri: Url,
    language: String,
    name: Option<String>,
    channels_count: Option<u32>,
    primary: bool,
}

/// An `EXT-X-STREAM-INF` tag and its URI
#[derive(Debug, Clone, PartialEq)]
struct VariantTag {
    bandwidth: u64,
    codecs: Vec<String>,
    resolution: Option<Resolution>,
    frame_rate: Option<f64>,
    uri: Url,
    audio_group: Option<String>,
    video_group: Option<String>,
    subtitles_group: Option<String>,
}

impl VariantTag {
    /// Declared codecs that belong to `content_type`
    fn codecs_of_type(&self, content_type: ContentType) -> Vec<&str> {
        self.codecs
            .iter()
            .map(String::as_str)
            .filter(|codec| codec_content_type(codec) == Some(content_type))
            .collect()
    }

    /// Declared codecs that are not text codecs
    fn media_codecs(&self) -> Vec<&str> {
        self.codecs
            .iter()
            .map(String::as_str)
            .filter(|codec| codec_content_type(codec) != Some(ContentType::Text))
            .collect()
    }

    fn group(&self, content_type: ContentType) -> Option<&str> {
        match content_type {
            ContentType::Video => self.video_group.as_deref(),
            ContentType::Audio => self.audio_group.as_deref(),
            ContentType::Text => self.subtitles_group.as_deref(),
        }
    }
}

fn parse_channels(tag: &Tag) -> Result<Option<u32>, HlsError> {
    tag.attribute("CHANNELS")
        .map(|value| {
            value
                .split('/')
                .next()
                .unwrap_or_default()
                .trim()
                .parse::<u32>()
                .map_err(|_| HlsError::invalid_value("CHANNELS", value))
        })
        .transpose()
}

/// Validated content of a master playlist
#[derive(Debug, Clone, Default, PartialEq)]
struct MasterPlaylist {
    variants: Vec<VariantTag>,
    renditions: Vec<Rendition>,
}

impl MasterPlaylist {
    /// Lex and validate a master playlist. Nothing is fetched here, so a
    /// structural error fails the parse before any network traffic.
    fn parse(text: &str, base: &Url) -> Result<Self, ManifestError> {
        let tags = lex(text);
        require_header(&tags)?;

        let mut master = MasterPlaylist::default();
        for LexedTag { tag, uri } in &tags {
            match &tag.name {
                TagName::StreamInf => {
                    master.variants.push(Self::parse_variant(tag, uri.as_deref(), base)?);
                }
                TagName::Media => {
                    if let Some(rendition) = Self::parse_rendition(tag, base)? {
                        master.renditions.push(rendition);
                    }
                }
                _ => {}
            }
        }

        debug!(
            variants = master.variants.len(),
            renditions = master.renditions.len(),
            "Parsed master playlist"
        );
        Ok(master)
    }

    fn parse_variant(tag: &Tag, uri: Option<&str>, base: &Url) -> Result<VariantTag, ManifestError> {
        let bandwidth = require_attribute(tag, "BANDWIDTH")?;
        let bandwidth = bandwidth
            .trim()
            .parse::<u64>()
            .map_err(|_| HlsError::invalid_value("BANDWIDTH", bandwidth))?;
        let uri = uri.ok_or_else(|| HlsError::RequiredAttributeMissing("URI".to_string()))?;

        Ok(VariantTag {
            bandwidth,
            codecs: tag.list("CODECS").into_iter().map(str::to_string).collect(),
            resolution: tag.parse_attribute::<Resolution>("RESOLUTION")?,
            frame_rate: tag.parse_attribute::<f64>("FRAME-RATE")?,
            uri: resolve_uri(base, uri)?,
            audio_group: tag.attribute(TYPE_AUDIO).map(str::to_string),
            video_group: tag.attribute(TYPE_VIDEO).map(str::to_string),
            subtitles_group: tag.attribute(TYPE_SUBTITLES).map(str::to_string),
        })
    }

    /// `None` for closed captions, which are carried inside the video.
    fn parse_rendition(tag: &Tag, base: &Url) -> Result<Option<Rendition>, ManifestError> {
        let media_type = require_attribute(tag, "TYPE")?;
        let group_id = require_attribute(tag, "GROUP-ID")?;
        let content_type = match media_type {
            TYPE_AUDIO => ContentType::Audio,
            TYPE_VIDEO => ContentType::Video,
            TYPE_SUBTITLES => ContentType::Text,
            TYPE_CLOSED_CAPTIONS => return Ok(None),
            other => return Err(HlsError::invalid_value("TYPE", other).into()),
        };
        let uri = require_attribute(tag, "URI")?;

        Ok(Some(Rendition {
            content_type,
            group_id: group_id.to_string(),
            uri: resolve_uri(base, uri)?,
            language: normalize(tag.attribute("LANGUAGE").unwrap_or_default()),
            name: tag.attribute("NAME").map(str::to_string),
            channels_count: parse_channels(tag)?,
            primary: tag.attribute("DEFAULT") == Some("YES"),
        }))
    }

    fn group(&self, content_type: ContentType, group_id: &str) -> Vec<&Rendition> {
        self.renditions
            .iter()
            .filter(|r| r.content_type == content_type && r.group_id == group_id)
            .collect()
    }
}

/// Streams of one variant tag, as indices into the request list
#[derive(Debug, Default)]
struct VariantPlan {
    bandwidth: u64,
    video: Vec<usize>,
    audio: Vec<usize>,
}

fn push_request(requests: &mut Vec<StreamRequest>, request: StreamRequest) -> usize {
    requests.push(request);
    requests.len() - 1
}

fn non_empty_join(parts: &[&str]) -> String {
    parts
        .iter()
        .filter(|part| !part.is_empty())
        .copied()
        .collect::<Vec<_>>()
        .join(",")
}

/// Codecs to record when none were declared for `content_type`
fn stored_codecs(content_type: ContentType, declared: &str) -> String {
    if declared.is_empty() {
        content_type.default_codec().unwrap_or_default().to_string()
    } else {
        declared.to_string()
    }
}

fn undetermined_to_none(language: &str) -> Option<&str> {
    (language != UNDETERMINED).then_some(language)
}

/// Builds the presentation graph of one parse
pub(crate) struct ManifestBuilder<'a> {
    cache: StreamCache,
    config: &'a ManifestConfig,
    interface: &'a PlayerInterface,
}

impl<'a> ManifestBuilder<'a> {
    pub(crate) fn new(
        cache: StreamCache,
        config: &'a ManifestConfig,
        interface: &'a PlayerInterface,
    ) -> Self {
        Self {
            cache,
            config,
            interface,
        }
    }

    pub(crate) async fn build(&self, text: &str, base: &Url) -> Result<Manifest, ManifestError> {
        let master = MasterPlaylist::parse(text, base)?;

        let mut requests = Vec::new();
        let mut plans = Vec::with_capacity(master.variants.len());
        let mut text_codecs: HashMap<&str, String> = HashMap::new();
        for variant in &master.variants {
            plans.push(self.plan_variant(&master, variant, &mut requests)?);
            if let Some(group_id) = variant.group(ContentType::Text) {
                self.resolve_group(&master, ContentType::Text, Some(group_id));
                let codecs = variant.codecs_of_type(ContentType::Text).join(",");
                if !codecs.is_empty() {
                    text_codecs.entry(group_id).or_insert(codecs);
                }
            }
        }

        let text_start = requests.len();
        for rendition in master
            .renditions
            .iter()
            .filter(|r| r.content_type == ContentType::Text)
        {
            let declared = text_codecs
                .get(rendition.group_id.as_str())
                .cloned()
                .unwrap_or_default();
            requests.push(StreamRequest {
                uri: rendition.uri.clone(),
                content_type: ContentType::Text,
                codecs: declared.clone(),
                declared_codecs: declared,
                attributes: StreamAttributes {
                    language: rendition.language.clone(),
                    label: rendition.name.clone(),
                    kind: Some(TextKind::Subtitle),
                    primary: rendition.primary,
                    ..Default::default()
                },
            });
        }

        debug!(requests = requests.len(), "Building streams");
        let streams = try_join_all(
            requests
                .into_iter()
                .map(|request| self.cache.get_or_build(request)),
        )
        .await?;

        let variants = self.expand_variants(&plans, &streams);

        let mut text_streams: Vec<Arc<Stream>> = Vec::new();
        for stream in &streams[text_start..] {
            if !text_streams.iter().any(|s| Arc::ptr_eq(s, stream)) {
                text_streams.push(stream.clone());
            }
        }

        let presentation_timeline = self.timeline(&variants);

        let mut period = Period {
            start_time: 0.0,
            variants,
            text_streams,
        };
        (self.interface.filter_new_period)(&mut period);
        let mut periods = vec![period];
        (self.interface.filter_all_periods)(&mut periods);

        info!(
            live = presentation_timeline.is_live,
            duration = presentation_timeline.duration(),
            variants = periods.iter().map(|p| p.variants.len()).sum::<usize>(),
            text_streams = periods.iter().map(|p| p.text_streams.len()).sum::<usize>(),
            "Manifest ready"
        );
        Ok(Manifest {
            presentation_timeline,
            periods,
        })
    }

    /// Renditions of a referenced group. A reference to a group that does
    /// not exist is reported to the host and treated as no reference.
    fn resolve_group<'m>(
        &self,
        master: &'m MasterPlaylist,
        content_type: ContentType,
        group_id: Option<&str>,
    ) -> Vec<&'m Rendition> {
        let Some(group_id) = group_id else {
            return Vec::new();
        };
        let renditions = master.group(content_type, group_id);
        if renditions.is_empty() {
            let error = HlsError::UnknownRenditionGroup {
                group_type: group_type_name(content_type).to_string(),
                group_id: group_id.to_string(),
            };
            warn!(error = %error, "Ignoring rendition group reference");
            (self.interface.on_error)(&ManifestError::Hls(error));
        }
        renditions
    }

    fn plan_variant(
        &self,
        master: &MasterPlaylist,
        variant: &VariantTag,
        requests: &mut Vec<StreamRequest>,
    ) -> Result<VariantPlan, ManifestError> {
        let audio_group = self.resolve_group(master, ContentType::Audio, variant.audio_group.as_deref());
        let video_group = self.resolve_group(master, ContentType::Video, variant.video_group.as_deref());
        let media_codecs = variant.media_codecs();

        // The inline URI is audio when the video comes from a group, or when
        // only audio codecs are declared; otherwise it is (possibly muxed) video.
        let inline_type = if !video_group.is_empty() {
            ContentType::Audio
        } else if !variant.codecs_of_type(ContentType::Video).is_empty() {
            ContentType::Video
        } else if !variant.codecs_of_type(ContentType::Audio).is_empty() {
            ContentType::Audio
        } else {
            ContentType::Video
        };

        let mut plan = VariantPlan {
            bandwidth: variant.bandwidth,
            ..Default::default()
        };

        match inline_type {
            ContentType::Video => {
                let video_codecs = codecs_for_type(ContentType::Video, &media_codecs)?;
                let (declared, codecs) = if audio_group.is_empty() {
                    let audio_codecs = variant.codecs_of_type(ContentType::Audio).join(",");
                    let declared = non_empty_join(&[&video_codecs, &audio_codecs]);
                    let codecs = if declared.is_empty() {
                        non_empty_join(&[
                            ContentType::Video.default_codec().unwrap_or_default(),
                            ContentType::Audio.default_codec().unwrap_or_default(),
                        ])
                    } else {
                        declared.clone()
                    };
                    (declared, codecs)
                } else {
                    let codecs = stored_codecs(ContentType::Video, &video_codecs);
                    (video_codecs, codecs)
                };
                plan.video.push(push_request(
                    requests,
                    StreamRequest {
                        uri: variant.uri.clone(),
                        content_type: ContentType::Video,
                        codecs,
                        declared_codecs: declared,
                        attributes: StreamAttributes {
                            language: UNDETERMINED.to_string(),
                            resolution: variant.resolution,
                            frame_rate: variant.frame_rate,
                            ..Default::default()
                        },
                    },
                ));
            }
            // Audio variants with an audio group take their audio from the group.
            _ if !audio_group.is_empty() => {}
            _ => {
                let declared = codecs_for_type(ContentType::Audio, &media_codecs)?;
                plan.audio.push(push_request(
                    requests,
                    StreamRequest {
                        uri: variant.uri.clone(),
                        content_type: ContentType::Audio,
                        codecs: stored_codecs(ContentType::Audio, &declared),
                        declared_codecs: declared,
                        attributes: StreamAttributes {
                            language: UNDETERMINED.to_string(),
                            ..Default::default()
                        },
                    },
                ));
            }
        }

        let audio_codecs = variant.codecs_of_type(ContentType::Audio).join(",");
        for rendition in audio_group {
            plan.audio.push(push_request(
                requests,
                StreamRequest {
                    uri: rendition.uri.clone(),
                    content_type: ContentType::Audio,
                    codecs: stored_codecs(ContentType::Audio, &audio_codecs),
                    declared_codecs: audio_codecs.clone(),
                    attributes: StreamAttributes {
                        language: rendition.language.clone(),
                        label: rendition.name.clone(),
                        channels_count: rendition.channels_count,
                        primary: rendition.primary,
                        ..Default::default()
                    },
                },
            ));
        }

        let video_codecs = variant.codecs_of_type(ContentType::Video).join(",");
        for rendition in video_group {
            plan.video.push(push_request(
                requests,
                StreamRequest {
                    uri: rendition.uri.clone(),
                    content_type: ContentType::Video,
                    codecs: stored_codecs(ContentType::Video, &video_codecs),
                    declared_codecs: video_codecs.clone(),
                    attributes: StreamAttributes {
                        language: rendition.language.clone(),
                        label: rendition.name.clone(),
                        resolution: variant.resolution,
                        frame_rate: variant.frame_rate,
                        primary: rendition.primary,
                        ..Default::default()
                    },
                },
            ));
        }

        Ok(plan)
    }

    /// One variant per (video, audio) combination of every plan
    fn expand_variants(&self, plans: &[VariantPlan], streams: &[Arc<Stream>]) -> Vec<Variant> {
        let options = |indices: &[usize]| -> Vec<Option<Arc<Stream>>> {
            if indices.is_empty() {
                vec![None]
            } else {
                indices.iter().map(|&i| streams.get(i).cloned()).collect()
            }
        };

        let mut variants = Vec::new();
        for plan in plans {
            let videos = options(&plan.video);
            let audios = options(&plan.audio);
            for video in &videos {
                for audio in &audios {
                    if video.is_none() && audio.is_none() {
                        continue;
                    }

                    let mut drm_infos = Vec::new();
                    for stream in video.iter().chain(audio.iter()) {
                        merge_drm_infos(&mut drm_infos, &stream.drm_infos);
                    }
                    let language = audio
                        .as_ref()
                        .and_then(|a| undetermined_to_none(a.language()))
                        .or_else(|| video.as_ref().and_then(|v| undetermined_to_none(v.language())))
                        .unwrap_or(UNDETERMINED)
                        .to_string();
                    let primary = video.iter().chain(audio.iter()).any(|s| s.attributes.primary);

                    variants.push(Variant {
                        id: variants.len() as u32,
                        bandwidth: plan.bandwidth,
                        language,
                        primary,
                        video: video.clone(),
                        audio: audio.clone(),
                        encrypted: !drm_infos.is_empty(),
                        drm_infos,
                    });
                }
            }
        }
        variants
    }

    /// Timeline over the distinct audio and video streams used by variants
    fn timeline(&self, variants: &[Variant]) -> PresentationTimeline {
        let mut used: Vec<&Arc<Stream>> = Vec::new();
        for stream in variants.iter().flat_map(Variant::streams) {
            if !used.iter().any(|s| Arc::ptr_eq(s, stream)) {
                used.push(stream);
            }
        }

        let timings: Vec<StreamTiming> = used
            .iter()
            .map(|stream| StreamTiming {
                presentation_time_offset: stream.presentation_time_offset,
                duration: stream.duration(),
                target_duration: stream.target_duration,
                max_segment_duration: stream.segment_index.max_segment_duration(),
                live: stream.live,
            })
            .collect();

        PresentationTimeline::from_streams(
            &timings,
            TimelineOptions {
                availability_window_override: self.config.availability_window_override,
                default_presentation_delay: self.config.default_presentation_delay,
            },
        )
    }
}
