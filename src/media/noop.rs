//! Link resolver used when yt-dlp is unavailable

use super::traits::{DirectLink, LinkResolver, MediaInfo};
use async_trait::async_trait;

const UNAVAILABLE: &str = "Resolving page links requires the yt-dlp binary. \
     Configure tools.ytdlp_path in config or ensure yt-dlp is in PATH.";

/// Resolver that refuses every request with [`crate::Error::NotSupported`]
///
/// Direct file links keep working without it; only page links that need
/// extraction are affected.
pub struct NoOpLinkResolver;

#[async_trait]
impl LinkResolver for NoOpLinkResolver {
    async fn resolve(&self, _url: &str) -> crate::Result<DirectLink> {
        Err(crate::Error::NotSupported(UNAVAILABLE.into()))
    }

    async fn info(&self, _url: &str) -> crate::Result<MediaInfo> {
        Err(crate::Error::NotSupported(UNAVAILABLE.into()))
    }

    fn name(&self) -> &'static str {
        "noop"
    }
}

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;
    use crate::Error;

    #[tokio::test]
    async fn every_request_is_not_supported() {
        let resolver = NoOpLinkResolver;

        let resolved = resolver.resolve("https://video.test/watch?v=1").await;
        assert!(matches!(resolved, Err(Error::NotSupported(ref m)) if m.contains("yt-dlp")));

        let info = resolver.info("https://video.test/watch?v=1").await;
        assert!(matches!(info, Err(Error::NotSupported(_))));

        assert_eq!(resolver.name(), "noop");
    }
}
