use std::fmt;
use std::str::FromStr;

use crate::HlsError;

/// Playlist tag names understood by the builders.
///
/// Tags outside this set are kept as [`TagName::Other`] so that callers can
/// still inspect them.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TagName {
    ExtM3u,
    Version,
    StreamInf,
    IFrameStreamInf,
    Media,
    Key,
    SessionKey,
    Map,
    Inf,
    ByteRange,
    PlaylistType,
    TargetDuration,
    MediaSequence,
    EndList,
    Discontinuity,
    ProgramDateTime,
    Start,
    /// Placeholder for a URI line that follows no tag
    Anonymous,
    Other(String),
}

impl TagName {
    pub fn as_str(&self) -> &str {
        match self {
            TagName::ExtM3u => "EXTM3U",
            TagName::Version => "EXT-X-VERSION",
            TagName::StreamInf => "EXT-X-STREAM-INF",
            TagName::IFrameStreamInf => "EXT-X-I-FRAME-STREAM-INF",
            TagName::Media => "EXT-X-MEDIA",
            TagName::Key => "EXT-X-KEY",
            TagName::SessionKey => "EXT-X-SESSION-KEY",
            TagName::Map => "EXT-X-MAP",
            TagName::Inf => "EXTINF",
            TagName::ByteRange => "EXT-X-BYTERANGE",
            TagName::PlaylistType => "EXT-X-PLAYLIST-TYPE",
            TagName::TargetDuration => "EXT-X-TARGETDURATION",
            TagName::MediaSequence => "EXT-X-MEDIA-SEQUENCE",
            TagName::EndList => "EXT-X-ENDLIST",
            TagName::Discontinuity => "EXT-X-DISCONTINUITY",
            TagName::ProgramDateTime => "EXT-X-PROGRAM-DATE-TIME",
            TagName::Start => "EXT-X-START",
            TagName::Anonymous => "",
            TagName::Other(name) => name,
        }
    }

    pub fn parse(name: &str) -> Self {
        match name {
            "EXTM3U" => TagName::ExtM3u,
            "EXT-X-VERSION" => TagName::Version,
            "EXT-X-STREAM-INF" => TagName::StreamInf,
            "EXT-X-I-FRAME-STREAM-INF" => TagName::IFrameStreamInf,
            "EXT-X-MEDIA" => TagName::Media,
            "EXT-X-KEY" => TagName::Key,
            "EXT-X-SESSION-KEY" => TagName::SessionKey,
            "EXT-X-MAP" => TagName::Map,
            "EXTINF" => TagName::Inf,
            "EXT-X-BYTERANGE" => TagName::ByteRange,
            "EXT-X-PLAYLIST-TYPE" => TagName::PlaylistType,
            "EXT-X-TARGETDURATION" => TagName::TargetDuration,
            "EXT-X-MEDIA-SEQUENCE" => TagName::MediaSequence,
            "EXT-X-ENDLIST" => TagName::EndList,
            "EXT-X-DISCONTINUITY" => TagName::Discontinuity,
            "EXT-X-PROGRAM-DATE-TIME" => TagName::ProgramDateTime,
            "EXT-X-START" => TagName::Start,
            other => TagName::Other(other.to_string()),
        }
    }
}

impl fmt::Display for TagName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One `NAME=VALUE` pair of an attribute list
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attribute {
    pub name: String,
    /// Value with surrounding quotes removed
    pub value: String,
    pub quoted: bool,
}

/// A lexed tag: its name plus either an attribute list or a bare value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tag {
    pub name: TagName,
    pub attributes: Vec<Attribute>,
    pub value: Option<String>,
}

impl Tag {
    pub fn new(name: TagName) -> Self {
        Self {
            name,
            attributes: Vec::new(),
            value: None,
        }
    }

    pub fn is(&self, name: &TagName) -> bool {
        &self.name == name
    }

    /// Value of the first attribute called `name`
    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|attr| attr.name == name)
            .map(|attr| attr.value.as_str())
    }

    /// The attribute split as a comma separated list, e.g. `CODECS`.
    pub fn list(&self, name: &str) -> Vec<&str> {
        self.attribute(name)
            .map(|value| {
                value
                    .split(',')
                    .map(str::trim)
                    .filter(|item| !item.is_empty())
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Parse an optional attribute, failing if present but malformed.
    pub fn parse_attribute<T: FromStr>(&self, name: &str) -> Result<Option<T>, HlsError> {
        self.attribute(name)
            .map(|value| {
                value
                    .trim()
                    .parse::<T>()
                    .map_err(|_| HlsError::invalid_value(name, value))
            })
            .transpose()
    }

    pub fn value(&self) -> Option<&str> {
        self.value.as_deref()
    }

    /// Parse the bare value, failing if absent or malformed.
    pub fn parse_value<T: FromStr>(&self) -> Result<T, HlsError> {
        let value = self.value().unwrap_or_default().trim();
        value
            .parse::<T>()
            .map_err(|_| HlsError::invalid_value(self.name.as_str(), value))
    }
}

/// A tag together with the URI line that followed it, if any.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LexedTag {
    pub tag: Tag,
    pub uri: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stream_inf() -> Tag {
        Tag {
            name: TagName::StreamInf,
            attributes: vec![
                Attribute {
                    name: "BANDWIDTH".into(),
                    value: "200".into(),
                    quoted: false,
                },
                Attribute {
                    name: "CODECS".into(),
                    value: "avc1, mp4a,".into(),
                    quoted: true,
                },
            ],
            value: None,
        }
    }

    #[test]
    fn test_tag_name_roundtrip() {
        assert_eq!(TagName::parse("EXT-X-MAP"), TagName::Map);
        assert_eq!(TagName::Map.as_str(), "EXT-X-MAP");
        assert_eq!(
            TagName::parse("EXT-X-SKIP"),
            TagName::Other("EXT-X-SKIP".to_string())
        );
    }

    #[test]
    fn test_list_attribute() {
        assert_eq!(stream_inf().list("CODECS"), vec!["avc1", "mp4a"]);
        assert!(stream_inf().list("AUDIO").is_empty());
    }

    #[test]
    fn test_parse_attribute() {
        let tag = stream_inf();
        assert_eq!(tag.parse_attribute::<u64>("BANDWIDTH").unwrap(), Some(200));
        assert_eq!(tag.parse_attribute::<u64>("AVERAGE-BANDWIDTH").unwrap(), None);
        assert_eq!(
            tag.parse_attribute::<u64>("CODECS").unwrap_err(),
            HlsError::InvalidAttributeValue {
                name: "CODECS".into(),
                value: "avc1, mp4a,".into()
            }
        );
    }
}
