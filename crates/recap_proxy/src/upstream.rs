use std::time::Duration;

use recap_config::UpstreamConfig;
use tracing::{debug, info};

use crate::classify::RequestKind;

/// Thin wrapper around the real HTTP client used on cache misses.
pub struct UpstreamClient {
    client: reqwest::Client,
}

impl UpstreamClient {
    pub fn new(cfg: &UpstreamConfig) -> anyhow::Result<Self> {
        let mut builder = reqwest::Client::builder();
        if cfg.connect_timeout_secs() > 0 {
            builder = builder.connect_timeout(Duration::from_secs(cfg.connect_timeout_secs()));
        }
        Ok(Self {
            client: builder.build()?,
        })
    }

    /// Issue the equivalent real call and return the raw response body.
    ///
    /// The upstream status code is NOT checked: whatever body the upstream
    /// answers with is what gets recorded and replayed, including error
    /// pages. A network failure propagates to the caller; there is no retry.
    pub async fn fetch(&self, url: &str, kind: &RequestKind) -> anyhow::Result<Vec<u8>> {
        info!(
            target: "recap::upstream",
            %url,
            kind = kind.name(),
            "Fetching from upstream"
        );

        let response = match kind {
            RequestKind::Query(_) => self.client.get(url).send().await?,
            RequestKind::RawBody(body) => self.client.post(url).body(body.clone()).send().await?,
            RequestKind::Json(body) => {
                self.client
                    .post(url)
                    .header("Content-Type", "application/json")
                    .body(body.clone())
                    .send()
                    .await?
            }
            RequestKind::Form(pairs) => self.client.post(url).form(pairs).send().await?,
        };

        let status = response.status();
        let bytes = response.bytes().await?;
        debug!(
            target: "recap::upstream",
            %url,
            status = status.as_u16(),
            len = bytes.len(),
            "Upstream responded"
        );

        Ok(bytes.to_vec())
    }
}
