//! reelzip - serve collections of remote videos as size-bounded zip archives.

use clap::Parser;
use reelzip::{Config, Service};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Command line and environment overrides, applied on top of the config file
#[derive(Debug, Parser)]
#[command(name = "reelzip", version, about)]
struct Cli {
    /// JSON configuration file; built-in defaults are used when omitted
    #[arg(short, long, env = "REELZIP_CONFIG")]
    config: Option<PathBuf>,

    /// Port to listen on (keeps the configured bind host)
    #[arg(short, long, env = "PORT")]
    port: Option<u16>,

    /// SQLite database file
    #[arg(long, env = "DATABASE_PATH")]
    database_path: Option<PathBuf>,

    /// Directory finished archives are written to
    #[arg(long, env = "DOWNLOAD_DIR")]
    download_dir: Option<PathBuf>,

    /// Directory holding the static front-end
    #[arg(long, env = "STATIC_DIR")]
    static_dir: Option<PathBuf>,
}

impl Cli {
    async fn load_config(&self) -> reelzip::Result<Config> {
        let mut config = match &self.config {
            Some(path) => Config::from_file(path).await?,
            None => Config::default(),
        };

        if let Some(port) = self.port {
            config.server.api.bind_address.set_port(port);
        }
        if let Some(path) = &self.database_path {
            config.persistence.database_path = path.clone();
        }
        if let Some(dir) = &self.download_dir {
            config.storage.download_dir = dir.clone();
        }
        if let Some(dir) = &self.static_dir {
            config.server.api.static_dir = dir.clone();
        }

        config.validate()?;
        Ok(config)
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load .env file if present (before anything else)
    let _ = dotenvy::dotenv();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "reelzip=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();
    let config = cli.load_config().await?;

    let service = Service::new(config).await?;
    reelzip::run_with_shutdown(service).await?;

    Ok(())
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_definition_is_consistent() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }

    #[tokio::test]
    async fn overrides_apply_on_top_of_defaults() {
        let cli = Cli::parse_from([
            "reelzip",
            "--port",
            "8080",
            "--database-path",
            "/tmp/x.db",
            "--download-dir",
            "/tmp/archives",
        ]);

        let config = cli.load_config().await.unwrap();

        assert_eq!(config.server.api.bind_address.port(), 8080);
        assert_eq!(config.persistence.database_path, PathBuf::from("/tmp/x.db"));
        assert_eq!(config.storage.download_dir, PathBuf::from("/tmp/archives"));
        assert_eq!(config.server.api.static_dir, PathBuf::from("static"));
    }
}
