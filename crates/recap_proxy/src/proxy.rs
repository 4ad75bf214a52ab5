use recap_cache::{CacheKey, DiskStore, StoreError};
use recap_config::RecapConfig;
use tracing::{debug, info, instrument};

use crate::classify::{RequestKind, classify};
use crate::token::unpack_url;
use crate::upstream::UpstreamClient;

/// Stateless-per-request record/replay handler.
///
/// The only state shared across requests is the disk store and the reusable
/// upstream client; there is no in-memory cache and no locking. Concurrent
/// misses for the same fingerprint may both fetch and both write, which
/// converges because identical requests record identical bytes.
pub struct Proxy {
    store: DiskStore,
    client: UpstreamClient,
}

impl Proxy {
    pub fn new(cfg: &RecapConfig) -> anyhow::Result<Self> {
        let store = DiskStore::open(cfg.cache().dir())?;
        let client = UpstreamClient::new(cfg.upstream())?;
        Ok(Self::with_parts(store, client))
    }

    pub fn with_parts(store: DiskStore, client: UpstreamClient) -> Self {
        Self { store, client }
    }

    pub fn store(&self) -> &DiskStore {
        &self.store
    }

    /// Serve one request: replay from disk on a hit, record on a miss.
    ///
    /// `path` is the request path with its leading slash and without the
    /// query string; the remainder of the path is the URL token naming the
    /// upstream. Returns the raw body bytes to answer with.
    #[instrument(skip(self, body), fields(%path))]
    pub async fn serve(
        &self,
        path: &str,
        query: &str,
        content_type: Option<&str>,
        body: &[u8],
    ) -> anyhow::Result<Vec<u8>> {
        let token = path.strip_prefix('/').unwrap_or(path);
        let kind = classify(content_type, body, query);

        let fingerprint = CacheKey {
            path: token,
            params: kind.key_params(),
        }
        .fingerprint();

        debug!(
            target: "recap::proxy",
            kind = kind.name(),
            %fingerprint,
            "Classified request"
        );

        match self.store.get(&fingerprint).await {
            Ok(bytes) => {
                info!(
                    target: "recap::proxy",
                    %fingerprint,
                    len = bytes.len(),
                    "Replaying recorded response"
                );
                return Ok(bytes);
            }
            Err(StoreError::NotFound) => {}
            Err(e) => return Err(e.into()),
        }

        // Miss: recover the upstream URL and make the real call. For GET the
        // original query string rides along with the token.
        let url = if matches!(kind, RequestKind::Query(_)) && !query.is_empty() {
            unpack_url(&format!("{token}?{query}"))?
        } else {
            unpack_url(token)?
        };

        let bytes = self.client.fetch(&url, &kind).await?;
        self.store.put(&fingerprint, &bytes).await?;

        info!(
            target: "recap::proxy",
            %fingerprint,
            %url,
            len = bytes.len(),
            "Recorded upstream response"
        );

        Ok(bytes)
    }
}

#[cfg(test)]
mod tests {
    use recap_cache::{CacheKey, DiskStore, KeyParams};
    use recap_config::UpstreamConfig;

    use super::Proxy;
    use crate::upstream::UpstreamClient;

    fn proxy_with_store(dir: &std::path::Path) -> Proxy {
        let store = DiskStore::open(dir).expect("open store");
        let client = UpstreamClient::new(&UpstreamConfig::default()).expect("client");
        Proxy::with_parts(store, client)
    }

    #[tokio::test]
    async fn hit_is_served_without_any_network_call() {
        let dir = tempfile::tempdir().expect("tempdir");
        let proxy = proxy_with_store(dir.path());

        // Pre-record the entry the same way serve() derives it.
        let pairs = vec![("id".to_string(), "5".to_string())];
        let fp = CacheKey {
            path: "http%3A/example.com/data",
            params: KeyParams::Query(&pairs),
        }
        .fingerprint();
        proxy.store().put(&fp, b"recorded").await.expect("put");

        // example.com is never contacted; a network attempt against it from
        // the test environment would fail the request.
        let bytes = proxy
            .serve("/http%3A/example.com/data", "id=5", None, b"")
            .await
            .expect("hit");
        assert_eq!(bytes, b"recorded");
    }

    #[tokio::test]
    async fn miss_with_undecodable_target_fails() {
        let dir = tempfile::tempdir().expect("tempdir");
        let proxy = proxy_with_store(dir.path());

        // "not-a-scheme" unpacks to "not-a-scheme//", which no client accepts.
        let result = proxy.serve("/not-a-scheme", "", None, b"").await;
        assert!(result.is_err());
    }
}
