//! Size estimation for remote items

use async_trait::async_trait;
use reqwest::header::CONTENT_LENGTH;

/// Estimates the byte size of a remote resource without downloading it
///
/// Resolution never fails: any problem yields a fallback estimate, since the
/// size only feeds archive packing.
#[async_trait]
pub trait SizeResolver: Send + Sync {
    /// Estimated size of the resource at `url`
    async fn resolve(&self, url: &str) -> u64;
}

/// [`SizeResolver`] issuing a single `HEAD` request per item
pub struct HttpSizeResolver {
    client: reqwest::Client,
    fallback_bytes: u64,
}

impl HttpSizeResolver {
    /// Create a resolver that answers `fallback_bytes` whenever the lookup is inconclusive
    pub fn new(client: reqwest::Client, fallback_bytes: u64) -> Self {
        Self {
            client,
            fallback_bytes,
        }
    }
}

#[async_trait]
impl SizeResolver for HttpSizeResolver {
    async fn resolve(&self, url: &str) -> u64 {
        let response = match self.client.head(url).send().await {
            Ok(response) => response,
            Err(e) => {
                tracing::debug!(url = %url, error = %e, "Size lookup failed, using fallback");
                return self.fallback_bytes;
            }
        };

        if !response.status().is_success() {
            tracing::debug!(
                url = %url,
                status = %response.status(),
                "Size lookup rejected, using fallback"
            );
            return self.fallback_bytes;
        }

        // Read the header directly; the body of a HEAD response is always empty
        let length = response
            .headers()
            .get(CONTENT_LENGTH)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.trim().parse::<u64>().ok())
            .filter(|&len| len > 0);

        match length {
            Some(len) => len,
            None => {
                tracing::debug!(url = %url, "No usable Content-Length, using fallback");
                self.fallback_bytes
            }
        }
    }
}
