//! Resolving video page links into direct file URLs
//!
//! Links that already point at a file go straight into a collection. Links
//! to a video page (YouTube and the like) are first handed to a
//! [`LinkResolver`], normally [`YtDlpResolver`]. When yt-dlp is neither
//! configured nor on `PATH`, [`NoOpLinkResolver`] takes its place and the
//! resolve endpoint answers "not supported".

mod noop;
mod traits;
mod ytdlp;

pub use noop::NoOpLinkResolver;
pub use traits::{DirectLink, LinkResolver, MediaFormat, MediaInfo};
pub use ytdlp::YtDlpResolver;

use crate::config::ToolsConfig;
use std::sync::Arc;

/// Pick the link resolver described by `tools`
///
/// An explicit `ytdlp_path` wins; otherwise `PATH` is searched when
/// `search_path` is set.
pub fn resolver_from_config(tools: &ToolsConfig) -> Arc<dyn LinkResolver> {
    let resolver: Arc<dyn LinkResolver> = if let Some(ref path) = tools.ytdlp_path {
        Arc::new(YtDlpResolver::new(path.clone(), tools.ytdlp_timeout))
    } else if tools.search_path {
        YtDlpResolver::from_path(tools.ytdlp_timeout)
            .map(|r| Arc::new(r) as Arc<dyn LinkResolver>)
            .unwrap_or_else(|| Arc::new(NoOpLinkResolver))
    } else {
        Arc::new(NoOpLinkResolver)
    };

    tracing::info!(link_resolver = resolver.name(), "Link resolver initialized");
    resolver
}
