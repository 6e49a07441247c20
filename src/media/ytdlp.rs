//! Link resolution through the external yt-dlp binary

use super::traits::{DirectLink, LinkResolver, MediaFormat, MediaInfo};
use crate::utils::sanitize_filename;
use crate::{Error, Result};
use async_trait::async_trait;
use serde::Deserialize;
use std::path::PathBuf;
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;

/// Format selectors tried in order until one yields a direct URL
const FORMAT_FALLBACKS: &[&str] = &[
    "best[ext=mp4]/best",
    "bestvideo[ext=mp4]+bestaudio[ext=m4a]/best",
    "best",
];

/// Output template for the suggested filename
const FILENAME_TEMPLATE: &str = "%(title)s.%(ext)s";

const DEFAULT_FILENAME: &str = "video.mp4";

/// Formats listed by [`LinkResolver::info`]
const MAX_LISTED_FORMATS: usize = 10;

/// Resolver that runs `yt-dlp`
///
/// Every invocation passes the link as a single argument after `--`, so
/// nothing in it is interpreted by a shell or as an option.
///
/// # Examples
///
/// ```no_run
/// use reelzip::media::{LinkResolver, YtDlpResolver};
/// use std::time::Duration;
///
/// # #[tokio::main]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let resolver = YtDlpResolver::from_path(Duration::from_secs(60))
///     .expect("yt-dlp not found in PATH");
///
/// let link = resolver.resolve("https://www.youtube.com/watch?v=abc").await?;
/// println!("{} -> {}", link.filename, link.direct_url);
/// # Ok(())
/// # }
/// ```
pub struct YtDlpResolver {
    binary_path: PathBuf,
    timeout: Duration,
}

impl YtDlpResolver {
    /// Create a resolver with an explicit binary path
    pub fn new(binary_path: PathBuf, timeout: Duration) -> Self {
        Self {
            binary_path,
            timeout,
        }
    }

    /// Attempt to find yt-dlp in PATH
    pub fn from_path(timeout: Duration) -> Option<Self> {
        which::which("yt-dlp")
            .ok()
            .map(|path| Self::new(path, timeout))
    }

    /// Run yt-dlp with `args` followed by the link, returning stdout
    async fn run(&self, args: &[&str], url: &str) -> Result<String> {
        let mut command = Command::new(&self.binary_path);
        command
            .args(args)
            .arg("--no-warnings")
            .arg("--")
            .arg(url)
            .stdin(Stdio::null())
            .kill_on_drop(true);

        let output = tokio::time::timeout(self.timeout, command.output())
            .await
            .map_err(|_| {
                Error::ExternalTool(format!(
                    "yt-dlp timed out after {}s",
                    self.timeout.as_secs_f32()
                ))
            })?
            .map_err(|e| Error::ExternalTool(format!("Failed to execute yt-dlp: {}", e)))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(Error::ExternalTool(format!(
                "yt-dlp exited with {}: {}",
                output.status,
                stderr.trim()
            )));
        }

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }

    async fn direct_url(&self, url: &str) -> Result<String> {
        let mut last_error = None;

        for &format in FORMAT_FALLBACKS {
            match self.run(&["-f", format, "-g"], url).await {
                Ok(stdout) => {
                    // Merged formats print one URL per stream; the first is the video
                    if let Some(direct) = stdout
                        .lines()
                        .map(str::trim)
                        .find(|line| !line.is_empty())
                        .filter(|line| line.starts_with("http"))
                    {
                        return Ok(direct.to_string());
                    }
                    last_error = Some(Error::ExternalTool(format!(
                        "yt-dlp printed no URL for format {}",
                        format
                    )));
                }
                Err(e) => {
                    tracing::debug!(url, format, error = %e, "Format selector failed, trying next");
                    last_error = Some(e);
                }
            }
        }

        Err(last_error.unwrap_or_else(|| Error::ExternalTool("no format selectors".into())))
    }

    async fn filename(&self, url: &str) -> String {
        match self.run(&["--get-filename", "-o", FILENAME_TEMPLATE], url).await {
            Ok(stdout) => stdout
                .lines()
                .next()
                .map(sanitize_filename)
                .filter(|name| !name.is_empty())
                .unwrap_or_else(|| DEFAULT_FILENAME.to_string()),
            Err(e) => {
                tracing::debug!(url, error = %e, "Could not read title, using default filename");
                DEFAULT_FILENAME.to_string()
            }
        }
    }
}

#[async_trait]
impl LinkResolver for YtDlpResolver {
    async fn resolve(&self, url: &str) -> Result<DirectLink> {
        let direct_url = self.direct_url(url).await?;
        let filename = self.filename(url).await;

        tracing::info!(url, direct_url = %direct_url, filename = %filename, "Resolved page link");

        Ok(DirectLink {
            direct_url,
            filename,
            original_url: url.to_string(),
        })
    }

    async fn info(&self, url: &str) -> Result<MediaInfo> {
        let stdout = self.run(&["--dump-json"], url).await?;

        // Playlists print one document per entry; describe the first
        let document = stdout
            .lines()
            .find(|line| !line.trim().is_empty())
            .ok_or_else(|| Error::ExternalTool("yt-dlp printed no metadata".into()))?;
        let raw: RawInfo = serde_json::from_str(document)
            .map_err(|e| Error::ExternalTool(format!("Unreadable yt-dlp metadata: {}", e)))?;

        Ok(raw.into())
    }

    fn name(&self) -> &'static str {
        "yt-dlp"
    }
}

/// The subset of `--dump-json` output that is passed on
#[derive(Deserialize)]
struct RawInfo {
    title: Option<String>,
    duration: Option<f64>,
    thumbnail: Option<String>,
    #[serde(default)]
    formats: Vec<RawFormat>,
}

#[derive(Deserialize)]
struct RawFormat {
    #[serde(default)]
    format_id: String,
    ext: Option<String>,
    resolution: Option<String>,
    width: Option<u64>,
    height: Option<u64>,
    filesize: Option<u64>,
}

impl From<RawInfo> for MediaInfo {
    fn from(raw: RawInfo) -> Self {
        Self {
            title: raw.title,
            duration: raw.duration,
            thumbnail: raw.thumbnail,
            formats: raw
                .formats
                .into_iter()
                .take(MAX_LISTED_FORMATS)
                .map(|f| MediaFormat {
                    resolution: f.resolution.or_else(|| match (f.width, f.height) {
                        (Some(width), Some(height)) => Some(format!("{width}x{height}")),
                        _ => None,
                    }),
                    format_id: f.format_id,
                    ext: f.ext,
                    filesize: f.filesize,
                })
                .collect(),
        }
    }
}

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_path_matches_which() {
        let found = YtDlpResolver::from_path(Duration::from_secs(1)).is_some();
        assert_eq!(found, which::which("yt-dlp").is_ok());
    }

    #[test]
    fn test_info_conversion_fills_resolution_and_caps_formats() {
        let formats: Vec<serde_json::Value> = (0..15)
            .map(|i| serde_json::json!({"format_id": i.to_string(), "ext": "mp4", "width": 640, "height": 360}))
            .collect();
        let raw: RawInfo = serde_json::from_value(serde_json::json!({
            "title": "Clip",
            "duration": 12.5,
            "formats": formats,
        }))
        .unwrap();

        let info = MediaInfo::from(raw);
        assert_eq!(info.title.as_deref(), Some("Clip"));
        assert!(info.thumbnail.is_none());
        assert_eq!(info.formats.len(), MAX_LISTED_FORMATS);
        assert_eq!(info.formats[0].resolution.as_deref(), Some("640x360"));
        assert_eq!(info.formats[9].format_id, "9");
    }

    #[tokio::test]
    async fn test_missing_binary_is_external_tool_error() {
        let resolver = YtDlpResolver::new(
            PathBuf::from("/nonexistent/reelzip-yt-dlp"),
            Duration::from_secs(5),
        );

        let result = resolver.info("https://video.test/watch?v=1").await;
        assert!(matches!(result, Err(Error::ExternalTool(ref m)) if m.contains("Failed to execute")));
    }

    #[cfg(unix)]
    mod stub {
        use super::*;
        use std::os::unix::fs::PermissionsExt;
        use std::path::Path;
        use tempfile::TempDir;

        /// Write an executable shell script standing in for yt-dlp
        ///
        /// Each invocation appends its arguments, one per line, to `args.log`.
        fn stub_binary(dir: &TempDir, body: &str) -> PathBuf {
            let path = dir.path().join("yt-dlp");
            let log = dir.path().join("args.log");
            let script = format!(
                "#!/bin/sh\nprintf '%s\\n' \"$@\" '--end--' >> '{}'\n{}\n",
                log.display(),
                body
            );
            std::fs::write(&path, script).unwrap();
            std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
            path
        }

        /// Argument lists of every recorded invocation
        fn invocations(dir: &Path) -> Vec<Vec<String>> {
            let log = std::fs::read_to_string(dir.join("args.log")).unwrap();
            log.split("--end--\n")
                .filter(|call| !call.is_empty())
                .map(|call| call.lines().map(str::to_string).collect())
                .collect()
        }

        const RESOLVING_STUB: &str = r#"case "$*" in
  *--get-filename*) echo 'Clip: "Part 1".mp4' ;;
  *"best[ext=mp4]/best"*) echo 'no such format' >&2; exit 1 ;;
  *) echo 'https://cdn.test/video.mp4'; echo 'https://cdn.test/audio.m4a' ;;
esac"#;

        #[tokio::test]
        async fn test_resolve_falls_back_through_formats() {
            let dir = TempDir::new().unwrap();
            let resolver =
                YtDlpResolver::new(stub_binary(&dir, RESOLVING_STUB), Duration::from_secs(10));

            let link = resolver
                .resolve("https://video.test/watch?v=1")
                .await
                .unwrap();

            assert_eq!(
                link,
                DirectLink {
                    direct_url: "https://cdn.test/video.mp4".into(),
                    filename: "Clip_ _Part 1_.mp4".into(),
                    original_url: "https://video.test/watch?v=1".into(),
                }
            );

            let calls = invocations(dir.path());
            assert_eq!(calls.len(), 3);
            assert_eq!(calls[0][..2], ["-f", "best[ext=mp4]/best"]);
            assert_eq!(calls[1][..2], ["-f", "bestvideo[ext=mp4]+bestaudio[ext=m4a]/best"]);
            assert_eq!(calls[2][0], "--get-filename");
        }

        #[tokio::test]
        async fn test_link_is_passed_as_one_literal_argument() {
            let dir = TempDir::new().unwrap();
            let resolver =
                YtDlpResolver::new(stub_binary(&dir, RESOLVING_STUB), Duration::from_secs(10));
            let url = "https://video.test/watch?v=1&x=\"$(touch pwned)\";rm -rf x";

            resolver.resolve(url).await.unwrap();

            for call in invocations(dir.path()) {
                let separator = call.iter().position(|arg| arg == "--").unwrap();
                assert_eq!(call[separator + 1..], [url.to_string()]);
            }
            assert!(!dir.path().join("pwned").exists());
            assert!(!Path::new("pwned").exists());
        }

        #[tokio::test]
        async fn test_resolve_fails_when_no_format_yields_a_url() {
            let dir = TempDir::new().unwrap();
            let binary = stub_binary(&dir, "echo 'ERROR: Unsupported URL' >&2\nexit 1");
            let resolver = YtDlpResolver::new(binary, Duration::from_secs(10));

            let err = resolver
                .resolve("https://video.test/page")
                .await
                .unwrap_err();

            assert!(matches!(err, Error::ExternalTool(ref m) if m.contains("Unsupported URL")));
            assert_eq!(invocations(dir.path()).len(), FORMAT_FALLBACKS.len());
        }

        #[tokio::test]
        async fn test_filename_defaults_when_title_lookup_fails() {
            let dir = TempDir::new().unwrap();
            let binary = stub_binary(
                &dir,
                r#"case "$*" in
  *--get-filename*) exit 1 ;;
  *) echo 'https://cdn.test/video.mp4' ;;
esac"#,
            );
            let resolver = YtDlpResolver::new(binary, Duration::from_secs(10));

            let link = resolver.resolve("https://video.test/watch").await.unwrap();
            assert_eq!(link.filename, DEFAULT_FILENAME);
        }

        #[tokio::test]
        async fn test_info_reads_first_json_document() {
            let dir = TempDir::new().unwrap();
            let binary = stub_binary(
                &dir,
                r#"echo '{"title":"First","duration":3,"thumbnail":"https://img.test/1.jpg","formats":[{"format_id":"18","ext":"mp4","resolution":"640x360","filesize":1000}]}'
echo '{"title":"Second"}'"#,
            );
            let resolver = YtDlpResolver::new(binary, Duration::from_secs(10));

            let info = resolver.info("https://video.test/list").await.unwrap();

            assert_eq!(info.title.as_deref(), Some("First"));
            assert_eq!(info.duration, Some(3.0));
            assert_eq!(
                info.formats,
                vec![MediaFormat {
                    format_id: "18".into(),
                    ext: Some("mp4".into()),
                    resolution: Some("640x360".into()),
                    filesize: Some(1000),
                }]
            );
            assert_eq!(invocations(dir.path())[0][0], "--dump-json");
        }

        #[tokio::test]
        async fn test_slow_binary_times_out() {
            let dir = TempDir::new().unwrap();
            let binary = stub_binary(&dir, "sleep 5");
            let resolver = YtDlpResolver::new(binary, Duration::from_millis(200));

            let started = std::time::Instant::now();
            let err = resolver.info("https://video.test/slow").await.unwrap_err();

            assert!(matches!(err, Error::ExternalTool(ref m) if m.contains("timed out")));
            assert!(started.elapsed() < Duration::from_secs(4));
        }
    }
}
