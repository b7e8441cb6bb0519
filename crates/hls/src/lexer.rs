//! Line lexer for playlist text.

use memchr::memchr;
use tracing::trace;

use crate::tag::{Attribute, LexedTag, Tag, TagName};

const TAG_PREFIX: &str = "#EXT";

/// Split playlist text into tags in source order.
///
/// Lines starting with `#EXT` are tags, other `#` lines are comments, and
/// any other non-blank line is a URI. A URI is attached to the closest
/// preceding tag that does not already carry one; a URI with no such tag
/// gets a [`TagName::Anonymous`] entry of its own.
///
/// Malformed attribute lists are split on a best-effort basis and never
/// rejected.
pub fn lex(text: &str) -> Vec<LexedTag> {
    let mut lexed: Vec<LexedTag> = Vec::new();

    for line in text.lines() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        if line.starts_with(TAG_PREFIX) {
            lexed.push(LexedTag {
                tag: parse_tag(&line[1..]),
                uri: None,
            });
            continue;
        }
        if line.starts_with('#') {
            trace!(comment = line, "Skipping comment line");
            continue;
        }

        match lexed.last_mut() {
            Some(last) if last.uri.is_none() && last.tag.name != TagName::ExtM3u => {
                last.uri = Some(line.to_string());
            }
            _ => lexed.push(LexedTag {
                tag: Tag::new(TagName::Anonymous),
                uri: Some(line.to_string()),
            }),
        }
    }

    lexed
}

/// Parse a tag line with its leading `#` removed.
fn parse_tag(line: &str) -> Tag {
    let (name, rest) = match memchr(b':', line.as_bytes()) {
        Some(idx) => (&line[..idx], Some(&line[idx + 1..])),
        None => (line, None),
    };

    let mut tag = Tag::new(TagName::parse(name.trim()));
    let Some(rest) = rest else {
        return tag;
    };

    if looks_like_attribute_list(rest) {
        tag.attributes = parse_attribute_list(rest);
    } else {
        tag.value = Some(rest.to_string());
    }
    tag
}

/// True when the text starts with `NAME=` where NAME is an attribute name.
fn looks_like_attribute_list(text: &str) -> bool {
    let Some(eq) = memchr(b'=', text.as_bytes()) else {
        return false;
    };
    let name = &text[..eq];
    !name.is_empty()
        && name
            .bytes()
            .all(|b| b.is_ascii_uppercase() || b.is_ascii_digit() || b == b'-')
}

fn parse_attribute_list(text: &str) -> Vec<Attribute> {
    let mut attributes = Vec::new();
    let mut rest = text;

    while !rest.is_empty() {
        let Some(eq) = memchr(b'=', rest.as_bytes()) else {
            trace!(fragment = rest, "Dropping attribute without value");
            break;
        };
        let name = rest[..eq].trim().trim_start_matches(',').trim().to_string();
        rest = &rest[eq + 1..];

        let (value, quoted) = if let Some(quoted_rest) = rest.strip_prefix('"') {
            match memchr(b'"', quoted_rest.as_bytes()) {
                Some(end) => {
                    let value = &quoted_rest[..end];
                    rest = &quoted_rest[end + 1..];
                    (value, true)
                }
                // Unterminated quote: take everything left
                None => {
                    let value = quoted_rest;
                    rest = "";
                    (value, true)
                }
            }
        } else {
            let end = memchr(b',', rest.as_bytes()).unwrap_or(rest.len());
            let value = &rest[..end];
            rest = &rest[end..];
            (value.trim(), false)
        };

        // Skip the separator and anything up to it after a quoted value
        rest = match memchr(b',', rest.as_bytes()) {
            Some(comma) => &rest[comma + 1..],
            None => "",
        };

        if !name.is_empty() {
            attributes.push(Attribute {
                name,
                value: value.to_string(),
                quoted,
            });
        }
    }

    attributes
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lex_master_playlist() {
        let text = "#EXTM3U\n\
            #EXT-X-MEDIA:TYPE=AUDIO,GROUP-ID=\"aud1\",LANGUAGE=\"eng\",URI=\"audio.m3u8\"\n\
            #EXT-X-STREAM-INF:BANDWIDTH=200,CODECS=\"avc1,mp4a\",RESOLUTION=960x540,AUDIO=\"aud1\"\n\
            video.m3u8\n";
        let lexed = lex(text);
        assert_eq!(lexed.len(), 3);
        assert_eq!(lexed[0].tag.name, TagName::ExtM3u);
        assert_eq!(lexed[1].tag.attribute("GROUP-ID"), Some("aud1"));
        assert_eq!(lexed[1].uri, None);

        let variant = &lexed[2];
        assert_eq!(variant.tag.name, TagName::StreamInf);
        assert_eq!(variant.tag.attribute("CODECS"), Some("avc1,mp4a"));
        assert_eq!(variant.tag.list("CODECS"), vec!["avc1", "mp4a"]);
        assert_eq!(variant.tag.attribute("RESOLUTION"), Some("960x540"));
        assert_eq!(variant.uri.as_deref(), Some("video.m3u8"));
    }

    #[test]
    fn test_bare_values() {
        let lexed = lex("#EXTM3U\n#EXTINF:5,title\n#EXT-X-BYTERANGE:121090@616\nmain.mp4\n#EXT-X-ENDLIST");
        assert_eq!(lexed[1].tag.value(), Some("5,title"));
        assert_eq!(lexed[1].uri, None);
        assert_eq!(lexed[2].tag.value(), Some("121090@616"));
        assert_eq!(lexed[2].uri.as_deref(), Some("main.mp4"));
        assert_eq!(lexed[3].tag.name, TagName::EndList);
        assert!(lexed[3].tag.value.is_none());
    }

    #[test]
    fn test_comments_and_blank_lines_are_skipped() {
        let lexed = lex("#EXTM3U\n\n# a comment\n#EXTINF:5,\n\r\nmain.mp4\r\n");
        assert_eq!(lexed.len(), 2);
        assert_eq!(lexed[1].uri.as_deref(), Some("main.mp4"));
    }

    #[test]
    fn test_orphan_uri() {
        let lexed = lex("#EXTM3U\nfirst.ts\n#EXTINF:5,\nsecond.ts\nthird.ts");
        assert_eq!(lexed.len(), 4);
        assert_eq!(lexed[1].tag.name, TagName::Anonymous);
        assert_eq!(lexed[1].uri.as_deref(), Some("first.ts"));
        assert_eq!(lexed[3].tag.name, TagName::Anonymous);
    }

    #[test]
    fn test_data_uri_with_commas() {
        let lexed = lex(
            "#EXT-X-KEY:METHOD=SAMPLE-AES-CTR,KEYFORMAT=\"urn:uuid:edef8ba9-79d6-4ace-a3c8-27dcd51d21ed\",URI=\"data:text/plain;base64,AAAA\"",
        );
        let key = &lexed[0].tag;
        assert_eq!(key.attribute("METHOD"), Some("SAMPLE-AES-CTR"));
        assert_eq!(key.attribute("URI"), Some("data:text/plain;base64,AAAA"));
    }

    #[test]
    fn test_malformed_attributes_are_tolerated() {
        let lexed = lex("#EXT-X-MEDIA:TYPE=AUDIO,,GROUP-ID=\"a\"x,NAME=\"unterminated");
        let tag = &lexed[0].tag;
        assert_eq!(tag.attribute("TYPE"), Some("AUDIO"));
        assert_eq!(tag.attribute("GROUP-ID"), Some("a"));
        assert_eq!(tag.attribute("NAME"), Some("unterminated"));
    }

    #[test]
    fn test_unknown_tag_kept() {
        let lexed = lex("#EXT-X-INDEPENDENT-SEGMENTS");
        assert_eq!(
            lexed[0].tag.name,
            TagName::Other("EXT-X-INDEPENDENT-SEGMENTS".into())
        );
    }
}
