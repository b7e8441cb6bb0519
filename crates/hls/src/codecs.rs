//! Codec and mime type tables.

use std::fmt;

use serde::Serialize;

use crate::HlsError;
use crate::validate::unambiguous_or_fail;

/// Codec used for a video stream when the variant declares none
pub const DEFAULT_VIDEO_CODEC: &str = "avc1.42E01E";
/// Codec used for an audio stream when the variant declares none
pub const DEFAULT_AUDIO_CODEC: &str = "mp4a.40.2";

const VIDEO_CODEC_PREFIXES: &[&str] = &[
    "avc1", "avc3", "hev1", "hvc1", "dvh1", "dvhe", "vp09", "vp9", "vp8", "av01", "mp4v",
];
const AUDIO_CODEC_PREFIXES: &[&str] = &["mp4a", "ac-3", "ec-3", "ac-4", "opus", "flac", "mp3"];
const TEXT_CODEC_PREFIXES: &[&str] = &["vtt", "wvtt", "stpp"];

/// Kind of media carried by a stream
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentType {
    Video,
    Audio,
    Text,
}

impl ContentType {
    fn codec_prefixes(self) -> &'static [&'static str] {
        match self {
            ContentType::Video => VIDEO_CODEC_PREFIXES,
            ContentType::Audio => AUDIO_CODEC_PREFIXES,
            ContentType::Text => TEXT_CODEC_PREFIXES,
        }
    }

    pub fn default_codec(self) -> Option<&'static str> {
        match self {
            ContentType::Video => Some(DEFAULT_VIDEO_CODEC),
            ContentType::Audio => Some(DEFAULT_AUDIO_CODEC),
            ContentType::Text => None,
        }
    }
}

impl fmt::Display for ContentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ContentType::Video => write!(f, "video"),
            ContentType::Audio => write!(f, "audio"),
            ContentType::Text => write!(f, "text"),
        }
    }
}

/// Kind of a text stream
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TextKind {
    Subtitle,
    Caption,
}

/// The content type a single codec string belongs to, if known.
pub fn codec_content_type(codec: &str) -> Option<ContentType> {
    let codec = codec.trim().to_ascii_lowercase();
    [ContentType::Video, ContentType::Audio, ContentType::Text]
        .into_iter()
        .find(|content_type| {
            content_type
                .codec_prefixes()
                .iter()
                .any(|prefix| codec.starts_with(prefix))
        })
}

/// Select the codecs of `codecs` that belong to `content_type`.
///
/// An empty declaration yields an empty string. A non-empty declaration with
/// nothing for `content_type` fails with `CouldNotGuessCodecs` carrying the
/// whole list.
pub fn codecs_for_type(content_type: ContentType, codecs: &[&str]) -> Result<String, HlsError> {
    if codecs.is_empty() {
        return Ok(String::new());
    }
    let matching: Vec<&str> = codecs
        .iter()
        .copied()
        .filter(|codec| codec_content_type(codec) == Some(content_type))
        .collect();
    if matching.is_empty() {
        return Err(HlsError::CouldNotGuessCodecs(
            codecs.iter().map(|codec| codec.to_string()).collect(),
        ));
    }
    Ok(matching.join(","))
}

fn mime_for_codec(content_type: ContentType, codec: &str) -> Option<&'static str> {
    if codec_content_type(codec) != Some(content_type) {
        return None;
    }
    match content_type {
        ContentType::Video => Some("video/mp4"),
        ContentType::Audio => Some("audio/mp4"),
        ContentType::Text if codec.eq_ignore_ascii_case("vtt") => Some("text/vtt"),
        ContentType::Text => Some("application/mp4"),
    }
}

/// Mime type implied by a codec string for `content_type`.
///
/// Codecs that point at different containers are an error.
pub fn mime_for_codecs(content_type: ContentType, codecs: &str) -> Result<Option<String>, HlsError> {
    let list: Vec<&str> = codecs
        .split(',')
        .map(str::trim)
        .filter(|codec| !codec.is_empty())
        .collect();
    let mime = unambiguous_or_fail(
        list.iter()
            .filter_map(|codec| mime_for_codec(content_type, codec)),
        || HlsError::CouldNotGuessCodecs(list.iter().map(|codec| codec.to_string()).collect()),
    )?;
    Ok(mime.map(str::to_string))
}

/// Lower-cased extension of the last path segment, ignoring query and fragment.
pub fn extension(uri: &str) -> String {
    let path = uri.split(['?', '#']).next().unwrap_or_default();
    let file = path.rsplit('/').next().unwrap_or_default();
    match file.rsplit_once('.') {
        Some((_, ext)) => ext.to_ascii_lowercase(),
        None => String::new(),
    }
}

/// Extensions that name a specific container, regardless of codecs.
fn container_mime_for_extension(content_type: ContentType, ext: &str) -> Option<&'static str> {
    match (content_type, ext) {
        (ContentType::Video | ContentType::Audio, "ts") => Some("video/mp2t"),
        (ContentType::Audio, "aac") => Some("audio/aac"),
        (ContentType::Audio, "ac3") => Some("audio/ac3"),
        (ContentType::Audio, "ec3") => Some("audio/ec3"),
        (ContentType::Audio, "mp3") => Some("audio/mpeg"),
        (ContentType::Text, "vtt" | "webvtt") => Some("text/vtt"),
        (ContentType::Text, "ttml") => Some("application/ttml+xml"),
        _ => None,
    }
}

/// Fallback extension table
pub fn mime_for_extension(content_type: ContentType, ext: &str) -> Option<&'static str> {
    container_mime_for_extension(content_type, ext).or(match (content_type, ext) {
        (ContentType::Video, "mp4" | "m4s" | "m4f" | "m4v" | "cmfv") => Some("video/mp4"),
        (ContentType::Audio, "mp4" | "m4s" | "m4f" | "m4a" | "cmfa") => Some("audio/mp4"),
        (ContentType::Text, "mp4" | "m4s" | "m4f" | "cmft") => Some("application/mp4"),
        _ => None,
    })
}

/// Strip parameters such as `; codecs=...` from a `Content-Type` value.
pub fn strip_content_type_params(header: &str) -> Option<String> {
    let mime = header.split(';').next().unwrap_or_default().trim();
    (!mime.is_empty()).then(|| mime.to_ascii_lowercase())
}

/// Mime type derivable from the playlist alone.
///
/// `codecs` are the declared codecs for `content_type` (empty when none were
/// declared). `Ok(None)` means the segment's `Content-Type` must be
/// consulted, see [`mime_from_response`].
pub fn mime_from_manifest(
    content_type: ContentType,
    codecs: &str,
    segment_uri: &str,
) -> Result<Option<String>, HlsError> {
    let ext = extension(segment_uri);
    if let Some(mime) = container_mime_for_extension(content_type, &ext) {
        return Ok(Some(mime.to_string()));
    }
    if let Some(mime) = mime_for_codecs(content_type, codecs)? {
        return Ok(Some(mime));
    }
    if content_type == ContentType::Text {
        return Ok(mime_for_extension(content_type, &ext).map(str::to_string));
    }
    Ok(None)
}

/// Mime type once the segment's `Content-Type` header (if any) is known.
pub fn mime_from_response(
    content_type: ContentType,
    segment_uri: &str,
    content_type_header: Option<&str>,
) -> Result<String, HlsError> {
    if let Some(mime) = content_type_header.and_then(strip_content_type_params) {
        return Ok(mime);
    }
    let ext = extension(segment_uri);
    mime_for_extension(content_type, &ext)
        .map(str::to_string)
        .ok_or(HlsError::CouldNotGuessMimeType(ext))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codec_content_type() {
        assert_eq!(codec_content_type("avc1.4d401f"), Some(ContentType::Video));
        assert_eq!(codec_content_type("mp4a.40.2"), Some(ContentType::Audio));
        assert_eq!(codec_content_type("fLaC"), Some(ContentType::Audio));
        assert_eq!(codec_content_type("stpp.TTML.im1t"), Some(ContentType::Text));
        assert_eq!(codec_content_type("aaa"), None);
    }

    #[test]
    fn test_codecs_for_type() {
        let codecs = ["avc1", "mp4a", "vtt"];
        assert_eq!(codecs_for_type(ContentType::Video, &codecs).unwrap(), "avc1");
        assert_eq!(codecs_for_type(ContentType::Audio, &codecs).unwrap(), "mp4a");
        assert_eq!(codecs_for_type(ContentType::Text, &codecs).unwrap(), "vtt");
        assert_eq!(codecs_for_type(ContentType::Video, &[]).unwrap(), "");
        assert_eq!(
            codecs_for_type(ContentType::Video, &["aaa", "bbb"]).unwrap_err(),
            HlsError::CouldNotGuessCodecs(vec!["aaa".into(), "bbb".into()])
        );
    }

    #[test]
    fn test_extension() {
        assert_eq!(extension("test:/main.mp4"), "mp4");
        assert_eq!(extension("https://a.b/c/main.MP4?foo=bar"), "mp4");
        assert_eq!(extension("https://a.b/c.d/main"), "");
        assert_eq!(extension("seg.ts#frag"), "ts");
    }

    #[test]
    fn test_mime_from_codecs() {
        assert_eq!(
            mime_from_manifest(ContentType::Video, "avc1", "test:/main.test").unwrap(),
            Some("video/mp4".to_string())
        );
        assert_eq!(
            mime_from_manifest(ContentType::Text, "stpp.TTML.im1t", "main.mp4").unwrap(),
            Some("application/mp4".to_string())
        );
        assert_eq!(
            mime_from_manifest(ContentType::Text, "vtt", "main.foo").unwrap(),
            Some("text/vtt".to_string())
        );
        assert!(mime_from_manifest(ContentType::Text, "vtt,wvtt", "main.foo").is_err());
    }

    #[test]
    fn test_container_extension_wins_over_codecs() {
        assert_eq!(
            mime_from_manifest(ContentType::Video, "avc1.42E01E", "seg0.ts").unwrap(),
            Some("video/mp2t".to_string())
        );
    }

    #[test]
    fn test_codecless_av_needs_response() {
        assert_eq!(
            mime_from_manifest(ContentType::Video, "", "main.mp4").unwrap(),
            None
        );
        assert_eq!(
            mime_from_manifest(ContentType::Text, "", "main.vtt").unwrap(),
            Some("text/vtt".to_string())
        );
    }

    #[test]
    fn test_mime_from_response() {
        assert_eq!(
            mime_from_response(ContentType::Video, "main.test", Some("video/mp4; foo=bar")).unwrap(),
            "video/mp4"
        );
        assert_eq!(
            mime_from_response(ContentType::Audio, "main.mp4?foo=bar", None).unwrap(),
            "audio/mp4"
        );
        assert_eq!(
            mime_from_response(ContentType::Video, "main.exe", Some("")).unwrap_err(),
            HlsError::CouldNotGuessMimeType("exe".into())
        );
    }
}
