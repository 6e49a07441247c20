//! Configuration types for reelzip

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::{net::SocketAddr, path::PathBuf, time::Duration};
use utoipa::ToSchema;

/// Main configuration for the archive service
///
/// Fields are organized into logical sub-configs:
/// - [`storage`](StorageConfig) - where archives land and how they are exposed
/// - [`archive`](ArchiveConfig) - packing and compression policy
/// - [`retention`](RetentionConfig) - sweep cadence and maximum ages
/// - [`persistence`](PersistenceConfig) - collection database
/// - [`server`](ServerIntegrationConfig) - HTTP API
/// - [`tools`](ToolsConfig) - external binaries
#[derive(Clone, Debug, Default, Serialize, Deserialize, ToSchema)]
pub struct Config {
    /// Archive storage settings
    #[serde(default)]
    pub storage: StorageConfig,

    /// Archive packing policy
    #[serde(default)]
    pub archive: ArchiveConfig,

    /// Retention sweep settings
    #[serde(default)]
    pub retention: RetentionConfig,

    /// Data storage
    #[serde(default)]
    pub persistence: PersistenceConfig,

    /// API and external server integration
    #[serde(default)]
    pub server: ServerIntegrationConfig,

    /// External tools
    #[serde(default)]
    pub tools: ToolsConfig,
}

impl Config {
    /// Load configuration from a JSON file. Missing fields take their defaults.
    pub async fn from_file(path: &std::path::Path) -> Result<Self> {
        let raw = tokio::fs::read_to_string(path).await.map_err(|e| Error::Config {
            message: format!("failed to read config file '{}': {}", path.display(), e),
            key: None,
        })?;

        let config: Config = serde_json::from_str(&raw).map_err(|e| Error::Config {
            message: format!("failed to parse config file '{}': {}", path.display(), e),
            key: None,
        })?;

        config.validate()?;
        Ok(config)
    }

    /// Reject settings the pipeline cannot work with
    pub fn validate(&self) -> Result<()> {
        if self.archive.part_ceiling_bytes == 0 {
            return Err(Error::Config {
                message: "part ceiling must be greater than zero".to_string(),
                key: Some("archive.part_ceiling_bytes".to_string()),
            });
        }
        if self.archive.fallback_size_bytes == 0 {
            return Err(Error::Config {
                message: "fallback size estimate must be greater than zero".to_string(),
                key: Some("archive.fallback_size_bytes".to_string()),
            });
        }
        if self.retention.sweep_interval.is_zero() {
            return Err(Error::Config {
                message: "sweep interval must be greater than zero".to_string(),
                key: Some("retention.sweep_interval".to_string()),
            });
        }
        validate_public_path(&self.storage.public_path)?;
        if self.tools.ytdlp_timeout.is_zero() {
            return Err(Error::Config {
                message: "yt-dlp timeout must be greater than zero".to_string(),
                key: Some("tools.ytdlp_timeout".to_string()),
            });
        }
        Ok(())
    }

    /// Directory archives are written to
    pub fn download_dir(&self) -> &PathBuf {
        &self.storage.download_dir
    }
}

/// First path segments owned by API, page and documentation routes
const RESERVED_SEGMENTS: &[&str] = &["api", "api-docs", "swagger-ui", "d", "health"];

/// The archive directory is nested into the router under this path, so it must
/// be a plain prefix that no other route claims
fn validate_public_path(path: &str) -> Result<()> {
    let invalid = |message: String| Error::Config {
        message,
        key: Some("storage.public_path".to_string()),
    };

    let Some(rest) = path.strip_prefix('/') else {
        return Err(invalid(format!("public path '{path}' must start with '/'")));
    };
    if rest.is_empty() || rest.ends_with('/') {
        return Err(invalid(format!(
            "public path '{path}' must name a directory below '/' without a trailing '/'"
        )));
    }
    if rest
        .split('/')
        .any(|segment| segment.is_empty() || segment.starts_with(':') || segment.starts_with('*'))
    {
        return Err(invalid(format!(
            "public path '{path}' must consist of literal, non-empty segments"
        )));
    }

    let first = rest.split('/').next().unwrap_or_default();
    if let Some(reserved) = RESERVED_SEGMENTS.iter().find(|r| **r == first) {
        return Err(invalid(format!(
            "public path '{path}' overlaps the /{reserved} routes"
        )));
    }
    Ok(())
}

/// Where finished archives are stored and how they are addressed publicly
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct StorageConfig {
    /// Archive directory (default: "./downloads")
    #[serde(default = "default_download_dir")]
    pub download_dir: PathBuf,

    /// URL path prefix the archive directory is served under (default: "/downloads")
    #[serde(default = "default_public_path")]
    pub public_path: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            download_dir: default_download_dir(),
            public_path: default_public_path(),
        }
    }
}

/// Packing policy for archive parts
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct ArchiveConfig {
    /// Target maximum cumulative estimated size per archive (default: 100 GiB)
    ///
    /// This is a soft packing target: a single item larger than the ceiling
    /// still gets an archive of its own.
    #[serde(default = "default_part_ceiling")]
    pub part_ceiling_bytes: u64,

    /// Size assumed for an item whose length cannot be determined (default: 300 MiB)
    #[serde(default = "default_fallback_size")]
    pub fallback_size_bytes: u64,

    /// Compression applied to archive entries
    #[serde(default)]
    pub compression: ArchiveCompression,
}

impl Default for ArchiveConfig {
    fn default() -> Self {
        Self {
            part_ceiling_bytes: default_part_ceiling(),
            fallback_size_bytes: default_fallback_size(),
            compression: ArchiveCompression::default(),
        }
    }
}

/// Compression method for archive entries
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum ArchiveCompression {
    /// No compression (video containers are already compressed)
    #[default]
    Stored,
    /// Deflate
    Deflated,
}

impl ArchiveCompression {
    pub(crate) fn method(self) -> zip::CompressionMethod {
        match self {
            ArchiveCompression::Stored => zip::CompressionMethod::Stored,
            ArchiveCompression::Deflated => zip::CompressionMethod::Deflated,
        }
    }
}

/// Retention sweep for archives and collections
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct RetentionConfig {
    /// Time between sweeps (default: 5 minutes)
    #[serde(default = "default_sweep_interval", with = "duration_serde")]
    #[schema(value_type = u64)]
    pub sweep_interval: Duration,

    /// Archives older than this are deleted (default: 30 minutes)
    #[serde(default = "default_artifact_max_age", with = "duration_serde")]
    #[schema(value_type = u64)]
    pub artifact_max_age: Duration,

    /// Collections older than this are deleted (default: 1 hour)
    #[serde(default = "default_collection_max_age", with = "duration_serde")]
    #[schema(value_type = u64)]
    pub collection_max_age: Duration,
}

impl Default for RetentionConfig {
    fn default() -> Self {
        Self {
            sweep_interval: default_sweep_interval(),
            artifact_max_age: default_artifact_max_age(),
            collection_max_age: default_collection_max_age(),
        }
    }
}

/// Data storage configuration
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct PersistenceConfig {
    /// Database path (default: "./reelzip.db")
    #[serde(default = "default_database_path")]
    pub database_path: PathBuf,
}

impl Default for PersistenceConfig {
    fn default() -> Self {
        Self {
            database_path: default_database_path(),
        }
    }
}

/// External tool configuration
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct ToolsConfig {
    /// Path to yt-dlp executable (auto-detected if None)
    #[serde(default)]
    pub ytdlp_path: Option<PathBuf>,

    /// Whether to search PATH for external binaries if explicit paths not set (default: true)
    #[serde(default = "default_true")]
    pub search_path: bool,

    /// Time allowed for one yt-dlp invocation (default: 60 seconds)
    #[serde(default = "default_ytdlp_timeout", with = "duration_serde")]
    #[schema(value_type = u64)]
    pub ytdlp_timeout: Duration,
}

impl Default for ToolsConfig {
    fn default() -> Self {
        Self {
            ytdlp_path: None,
            search_path: true,
            ytdlp_timeout: default_ytdlp_timeout(),
        }
    }
}

/// API and external server integration configuration
#[derive(Clone, Debug, Default, Serialize, Deserialize, ToSchema)]
pub struct ServerIntegrationConfig {
    /// REST API configuration
    #[serde(default)]
    pub api: ApiConfig,
}

/// REST API configuration
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct ApiConfig {
    /// Address to bind to (default: 0.0.0.0:3000)
    #[serde(default = "default_bind_address")]
    #[schema(value_type = String)]
    pub bind_address: SocketAddr,

    /// Enable CORS for browser access (default: true)
    #[serde(default = "default_true")]
    pub cors_enabled: bool,

    /// Allowed CORS origins (default: ["*"])
    #[serde(default = "default_cors_origins")]
    pub cors_origins: Vec<String>,

    /// Directory holding the static front-end, including `d.html` (default: "./static")
    #[serde(default = "default_static_dir")]
    pub static_dir: PathBuf,

    /// Maximum accepted request body size (default: 10 MiB)
    #[serde(default = "default_body_limit")]
    pub body_limit_bytes: usize,

    /// Enable Swagger UI at /swagger-ui (default: true)
    #[serde(default = "default_true")]
    pub swagger_ui: bool,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            bind_address: default_bind_address(),
            cors_enabled: true,
            cors_origins: default_cors_origins(),
            static_dir: default_static_dir(),
            body_limit_bytes: default_body_limit(),
            swagger_ui: true,
        }
    }
}

// Default value functions
fn default_download_dir() -> PathBuf {
    PathBuf::from("downloads")
}

fn default_public_path() -> String {
    "/downloads".to_string()
}

fn default_part_ceiling() -> u64 {
    100 * 1024 * 1024 * 1024 // 100 GiB
}

fn default_fallback_size() -> u64 {
    300 * 1024 * 1024 // 300 MiB
}

fn default_sweep_interval() -> Duration {
    Duration::from_secs(5 * 60)
}

fn default_artifact_max_age() -> Duration {
    Duration::from_secs(30 * 60)
}

fn default_collection_max_age() -> Duration {
    Duration::from_secs(60 * 60)
}

fn default_ytdlp_timeout() -> Duration {
    Duration::from_secs(60)
}

fn default_database_path() -> PathBuf {
    PathBuf::from("reelzip.db")
}

fn default_bind_address() -> SocketAddr {
    SocketAddr::from(([0, 0, 0, 0], 3000))
}

fn default_true() -> bool {
    true
}

fn default_cors_origins() -> Vec<String> {
    vec!["*".into()]
}

fn default_static_dir() -> PathBuf {
    PathBuf::from("static")
}

fn default_body_limit() -> usize {
    10 * 1024 * 1024
}

// Duration serialization helper
mod duration_serde {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_u64(duration.as_secs())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let secs = u64::deserialize(deserializer)?;
        Ok(Duration::from_secs(secs))
    }
}
