//! Structural checks shared by the playlist builders.

use crate::HlsError;
use crate::tag::{LexedTag, Tag, TagName};

/// Return the first tag called `name`, or fail with `RequiredTagMissing`.
pub fn require_tag<'a>(tags: &'a [LexedTag], name: &TagName) -> Result<&'a Tag, HlsError> {
    tags.iter()
        .map(|lexed| &lexed.tag)
        .find(|tag| tag.is(name))
        .ok_or_else(|| HlsError::RequiredTagMissing(name.to_string()))
}

/// Return the value of `name` on `tag`, or fail with `RequiredAttributeMissing`.
pub fn require_attribute<'a>(tag: &'a Tag, name: &str) -> Result<&'a str, HlsError> {
    tag.attribute(name)
        .ok_or_else(|| HlsError::RequiredAttributeMissing(name.to_string()))
}

/// A playlist must open with `#EXTM3U`.
pub fn require_header(tags: &[LexedTag]) -> Result<(), HlsError> {
    match tags.first() {
        Some(first) if first.tag.is(&TagName::ExtM3u) => Ok(()),
        _ => Err(HlsError::RequiredTagMissing(TagName::ExtM3u.to_string())),
    }
}

/// Collapse candidates that must all agree into a single value.
///
/// Duplicates are fine; two distinct values fail with `on_conflict`, and no
/// values at all yield `None`.
pub fn unambiguous_or_fail<T, I, F>(candidates: I, on_conflict: F) -> Result<Option<T>, HlsError>
where
    T: PartialEq,
    I: IntoIterator<Item = T>,
    F: FnOnce() -> HlsError,
{
    let mut chosen: Option<T> = None;
    for candidate in candidates {
        match &chosen {
            None => chosen = Some(candidate),
            Some(existing) if *existing == candidate => {}
            Some(_) => return Err(on_conflict()),
        }
    }
    Ok(chosen)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lex;

    #[test]
    fn test_require_tag() {
        let tags = lex("#EXTM3U\n#EXT-X-TARGETDURATION:5\n");
        assert!(require_tag(&tags, &TagName::TargetDuration).is_ok());
        assert_eq!(
            require_tag(&tags, &TagName::Inf).unwrap_err(),
            HlsError::RequiredTagMissing("EXTINF".into())
        );
    }

    #[test]
    fn test_require_attribute() {
        let tags = lex("#EXT-X-STREAM-INF:CODECS=\"avc1\"\nvideo");
        assert_eq!(
            require_attribute(&tags[0].tag, "BANDWIDTH").unwrap_err(),
            HlsError::RequiredAttributeMissing("BANDWIDTH".into())
        );
        assert_eq!(require_attribute(&tags[0].tag, "CODECS").unwrap(), "avc1");
    }

    #[test]
    fn test_require_header() {
        assert!(require_header(&lex("#EXTM3U\n#EXTINF:5,\na.ts")).is_ok());
        assert_eq!(
            require_header(&lex("#EXTINF:5,\na.ts")).unwrap_err(),
            HlsError::RequiredTagMissing("EXTM3U".into())
        );
    }

    #[test]
    fn test_unambiguous_or_fail() {
        let conflict = || HlsError::CouldNotGuessCodecs(vec![]);
        assert_eq!(
            unambiguous_or_fail(["video/mp4", "video/mp4"], conflict).unwrap(),
            Some("video/mp4")
        );
        assert_eq!(unambiguous_or_fail(Vec::<&str>::new(), conflict).unwrap(), None);
        assert!(unambiguous_or_fail(["text/vtt", "application/mp4"], conflict).is_err());
    }
}
