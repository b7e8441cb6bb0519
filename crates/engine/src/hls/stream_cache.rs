//! Per-parse stream deduplication.

use std::sync::Arc;

use hls::ContentType;
use moka::future::Cache;
use tracing::trace;

use super::media_playlist::{StreamBuilder, StreamRequest};
use crate::ManifestError;
use crate::model::Stream;

/// Streams are shared per content type and resolved playlist URI
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct StreamKey {
    content_type: ContentType,
    uri: String,
}

/// Collapses concurrent builds of the same stream into one.
///
/// The first request for a key decides the stream's attributes; every later
/// or concurrent request for that key receives the same `Arc<Stream>`. A
/// failed build is handed to every waiter and not cached.
pub(crate) struct StreamCache {
    builder: StreamBuilder,
    streams: Cache<StreamKey, Arc<Stream>>,
}

impl StreamCache {
    pub(crate) fn new(builder: StreamBuilder) -> Self {
        Self {
            builder,
            streams: Cache::builder().build(),
        }
    }

    pub(crate) async fn get_or_build(
        &self,
        request: StreamRequest,
    ) -> Result<Arc<Stream>, ManifestError> {
        let key = StreamKey {
            content_type: request.content_type,
            uri: request.uri.to_string(),
        };
        trace!(uri = %key.uri, content_type = %key.content_type, "Requesting stream");

        let builder = self.builder.clone();
        self.streams
            .try_get_with(key, async move { builder.build(request).await })
            .await
            .map_err(Arc::unwrap_or_clone)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ManifestConfig;
    use crate::model::StreamAttributes;
    use crate::net::RequestMethod;
    use crate::test_utils::{FakeTransport, ts_segment};
    use futures::future::join_all;
    use url::Url;

    const PLAYLIST_URI: &str = "https://cdn.example.com/main.m3u8";

    fn request(content_type: ContentType) -> StreamRequest {
        StreamRequest {
            uri: Url::parse(PLAYLIST_URI).unwrap(),
            content_type,
            codecs: String::new(),
            declared_codecs: String::new(),
            attributes: StreamAttributes::default(),
        }
    }

    fn cache() -> (StreamCache, Arc<FakeTransport>) {
        let transport = Arc::new(
            FakeTransport::new()
                .with_text(PLAYLIST_URI, "#EXTM3U\n#EXTINF:5,\nseg.ts\n#EXT-X-ENDLIST\n")
                .with_data("https://cdn.example.com/seg.ts", ts_segment(0)),
        );
        let builder = StreamBuilder::new(transport.clone(), Arc::new(ManifestConfig::default()));
        (StreamCache::new(builder), transport)
    }

    #[tokio::test]
    async fn test_concurrent_requests_share_one_build() {
        let (cache, transport) = cache();

        let streams = join_all((0..4).map(|_| cache.get_or_build(request(ContentType::Video)))).await;
        let streams: Vec<Arc<Stream>> = streams.into_iter().map(Result::unwrap).collect();

        assert!(streams.iter().all(|s| Arc::ptr_eq(s, &streams[0])));
        assert_eq!(transport.request_count(PLAYLIST_URI, RequestMethod::Get), 1);
    }

    #[tokio::test]
    async fn test_content_type_is_part_of_the_key() {
        let (cache, transport) = cache();

        let video = cache.get_or_build(request(ContentType::Video)).await.unwrap();
        let audio = cache.get_or_build(request(ContentType::Audio)).await.unwrap();

        assert!(!Arc::ptr_eq(&video, &audio));
        assert_eq!(audio.content_type, ContentType::Audio);
        assert_eq!(transport.request_count(PLAYLIST_URI, RequestMethod::Get), 2);
    }

    #[tokio::test]
    async fn test_failures_reach_every_waiter() {
        let builder = StreamBuilder::new(
            Arc::new(FakeTransport::new()),
            Arc::new(ManifestConfig::default()),
        );
        let cache = StreamCache::new(builder);

        let results =
            join_all((0..2).map(|_| cache.get_or_build(request(ContentType::Video)))).await;
        for result in results {
            assert!(matches!(
                result,
                Err(ManifestError::HttpStatus { status: 404, .. })
            ));
        }
    }
}
