//! Key tag to [`DrmInfo`] extraction.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use hls::validate::require_attribute;
use hls::{HlsError, Tag};
use tracing::debug;
use url::Url;

use crate::model::{DrmInfo, InitData};

const WIDEVINE_KEY_FORMAT: &str = "urn:uuid:edef8ba9-79d6-4ace-a3c8-27dcd51d21ed";
const PLAYREADY_KEY_FORMAT: &str = "urn:uuid:9a04f079-9840-4286-ab92-e65be0885f95";
const CLEARKEY_KEY_FORMAT: &str = "urn:uuid:1077efec-c0b2-4d02-ace3-3c1e52e2fb4b";
const FAIRPLAY_KEY_FORMAT: &str = "com.apple.streamingkeydelivery";

const METHOD_NONE: &str = "NONE";
const CENC_INIT_DATA_TYPE: &str = "cenc";

/// Key system identifier for a `KEYFORMAT`, unknown formats map to themselves.
pub fn key_system_for_format(key_format: &str) -> String {
    let normalized = key_format.trim().to_ascii_lowercase();
    match normalized.as_str() {
        WIDEVINE_KEY_FORMAT => "com.widevine.alpha".to_string(),
        PLAYREADY_KEY_FORMAT => "com.microsoft.playready".to_string(),
        CLEARKEY_KEY_FORMAT => "org.w3.clearkey".to_string(),
        FAIRPLAY_KEY_FORMAT => "com.apple.fps".to_string(),
        _ => key_format.trim().to_string(),
    }
}

/// Decode the payload of a `data:` URI.
fn decode_data_uri(uri: &str) -> Result<Vec<u8>, HlsError> {
    let invalid = || HlsError::InvalidDataUri(uri.to_string());
    let rest = uri.strip_prefix("data:").ok_or_else(invalid)?;
    let (header, payload) = rest.split_once(',').ok_or_else(invalid)?;
    if header
        .split(';')
        .any(|param| param.trim().eq_ignore_ascii_case("base64"))
    {
        STANDARD.decode(payload.trim()).map_err(|_| invalid())
    } else {
        Ok(payload.as_bytes().to_vec())
    }
}

/// Normalize a `KEYID` attribute to lower-case hex without a `0x` prefix.
fn parse_key_id(value: &str) -> Result<String, HlsError> {
    let trimmed = value.trim();
    let hex_digits = trimmed
        .strip_prefix("0x")
        .or_else(|| trimmed.strip_prefix("0X"))
        .unwrap_or(trimmed);
    hex::decode(hex_digits)
        .map(hex::encode)
        .map_err(|_| HlsError::InvalidAttributeValue {
            name: "KEYID".to_string(),
            value: value.to_string(),
        })
}

/// Build the [`DrmInfo`] for one key tag.
///
/// `METHOD=NONE` yields `None`. Any other method requires `KEYFORMAT` and
/// `URI`. A `data:` URI becomes `cenc` init data, any other URI is kept as
/// the licence URI, resolved against `base`.
pub fn drm_info_from_key(tag: &Tag, base: &Url) -> Result<Option<DrmInfo>, HlsError> {
    let method = require_attribute(tag, "METHOD")?;
    if method == METHOD_NONE {
        return Ok(None);
    }

    let key_format = require_attribute(tag, "KEYFORMAT")?;
    let uri = require_attribute(tag, "URI")?;
    let key_id = tag.attribute("KEYID").map(parse_key_id).transpose()?;
    let key_system = key_system_for_format(key_format);

    let drm_info = if uri.starts_with("data:") {
        DrmInfo {
            key_system,
            license_server_uri: None,
            init_data: vec![InitData {
                init_data_type: CENC_INIT_DATA_TYPE.to_string(),
                data: decode_data_uri(uri)?,
                key_id: key_id.clone(),
            }],
            key_ids: key_id.into_iter().collect(),
        }
    } else {
        let resolved = base.join(uri).map_err(|_| HlsError::InvalidAttributeValue {
            name: "URI".to_string(),
            value: uri.to_string(),
        })?;
        DrmInfo {
            key_system,
            license_server_uri: Some(resolved.to_string()),
            init_data: Vec::new(),
            key_ids: key_id.into_iter().collect(),
        }
    };

    debug!(
        method,
        key_system = %drm_info.key_system,
        init_data = drm_info.init_data.len(),
        "Extracted DRM info"
    );
    Ok(Some(drm_info))
}

/// DrmInfos for all key tags of a playlist, without duplicates.
pub fn extract_drm_infos<'a>(
    keys: impl IntoIterator<Item = &'a Tag>,
    base: &Url,
) -> Result<Vec<DrmInfo>, HlsError> {
    let mut drm_infos: Vec<DrmInfo> = Vec::new();
    for key in keys {
        if let Some(info) = drm_info_from_key(key, base)?
            && !drm_infos.contains(&info)
        {
            drm_infos.push(info);
        }
    }
    Ok(drm_infos)
}

/// Append the entries of `extra` missing from `target`.
pub(crate) fn merge_drm_infos(target: &mut Vec<DrmInfo>, extra: &[DrmInfo]) {
    for info in extra {
        if !target.contains(info) {
            target.push(info.clone());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hls::lex;

    fn key_tag(line: &str) -> Tag {
        lex(line).remove(0).tag
    }

    fn base() -> Url {
        Url::parse("https://cdn.example.com/hls/video.m3u8").unwrap()
    }

    #[test]
    fn test_widevine_data_uri() {
        let tag = key_tag(
            "#EXT-X-KEY:METHOD=SAMPLE-AES-CTR,KEYFORMAT=\"urn:uuid:edef8ba9-79d6-4ace-a3c8-27dcd51d21ed\",KEYID=0X0123456789ABCDEF0123456789ABCDEF,URI=\"data:text/plain;base64,dGVzdA==\"",
        );
        let info = drm_info_from_key(&tag, &base()).unwrap().unwrap();
        assert_eq!(info.key_system, "com.widevine.alpha");
        assert_eq!(info.license_server_uri, None);
        assert_eq!(info.init_data.len(), 1);
        assert_eq!(info.init_data[0].init_data_type, "cenc");
        assert_eq!(info.init_data[0].data, b"test");
        assert_eq!(info.key_ids, vec!["0123456789abcdef0123456789abcdef"]);
    }

    #[test]
    fn test_method_none() {
        let tag = key_tag("#EXT-X-KEY:METHOD=NONE");
        assert_eq!(drm_info_from_key(&tag, &base()).unwrap(), None);
    }

    #[test]
    fn test_missing_keyformat() {
        let tag = key_tag("#EXT-X-KEY:METHOD=AES-128,URI=\"key.bin\"");
        assert_eq!(
            drm_info_from_key(&tag, &base()).unwrap_err(),
            HlsError::RequiredAttributeMissing("KEYFORMAT".into())
        );
    }

    #[test]
    fn test_licence_uri_is_resolved() {
        let tag = key_tag(
            "#EXT-X-KEY:METHOD=SAMPLE-AES,KEYFORMAT=\"com.apple.streamingkeydelivery\",URI=\"skd://key-1\"",
        );
        let info = drm_info_from_key(&tag, &base()).unwrap().unwrap();
        assert_eq!(info.key_system, "com.apple.fps");
        assert_eq!(info.license_server_uri.as_deref(), Some("skd://key-1"));
        assert!(info.init_data.is_empty());
    }

    #[test]
    fn test_unknown_key_format_is_carried_through() {
        assert_eq!(key_system_for_format("urn:uuid:ffff"), "urn:uuid:ffff");
        assert_eq!(
            key_system_for_format("URN:UUID:9A04F079-9840-4286-AB92-E65BE0885F95"),
            "com.microsoft.playready"
        );
    }

    #[test]
    fn test_invalid_data_uri() {
        let tag = key_tag(
            "#EXT-X-KEY:METHOD=SAMPLE-AES,KEYFORMAT=\"identity\",URI=\"data:text/plain;base64,***\"",
        );
        assert!(matches!(
            drm_info_from_key(&tag, &base()),
            Err(HlsError::InvalidDataUri(_))
        ));
    }

    #[test]
    fn test_duplicate_keys_are_merged() {
        let line = "#EXT-X-KEY:METHOD=SAMPLE-AES,KEYFORMAT=\"identity\",URI=\"key.bin\"";
        let tags = [key_tag(line), key_tag(line)];
        let infos = extract_drm_infos(tags.iter(), &base()).unwrap();
        assert_eq!(infos.len(), 1);
        assert_eq!(
            infos[0].license_server_uri.as_deref(),
            Some("https://cdn.example.com/hls/key.bin")
        );
    }
}
