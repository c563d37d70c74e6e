//! Tollgate Web Server

use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use tollgate_core::{init_logging, AuthConfig, LogFormat, LoggingConfig};
use tollgate_web::{TollgateServer, WebConfig};
use tracing::info;

/// Tollgate - credential verification and signed session tokens over HTTP
#[derive(Parser)]
#[command(name = "tollgate-web")]
#[command(version)]
struct Args {
    /// Server host to bind to (overrides TOLLGATE_HOST)
    #[arg(long)]
    host: Option<String>,

    /// Server port to listen on (overrides TOLLGATE_PORT)
    #[arg(short, long)]
    port: Option<u16>,

    /// TOML file with auth settings; environment variables are used otherwise
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Log level (error, warn, info, debug, trace)
    #[arg(long, default_value = "info")]
    log_level: String,

    /// Log output format (json, pretty, compact)
    #[arg(long, default_value = "pretty")]
    log_format: LogFormat,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let args = Args::parse();

    let logging = LoggingConfig::default()
        .with_level(args.log_level)
        .with_format(args.log_format);
    init_logging(&logging).map_err(|e| anyhow::anyhow!("failed to initialize logging: {}", e))?;

    let auth = match &args.config {
        Some(path) => AuthConfig::from_file(path)
            .with_context(|| format!("failed to load {}", path.display()))?,
        None => AuthConfig::from_env().context("failed to load auth configuration")?,
    };

    let mut config = WebConfig::from_env_with(auth);
    if let Some(host) = args.host {
        config.host = host;
    }
    if let Some(port) = args.port {
        config.port = port;
    }

    info!(address = %config.address(), "Starting tollgate");

    let server = TollgateServer::new(config)
        .await
        .context("failed to build server")?;
    server.start().await.context("server failed")?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_args_parsing() {
        let args = Args::parse_from(["tollgate-web"]);
        assert!(args.host.is_none());
        assert!(args.port.is_none());
        assert_eq!(args.log_format, LogFormat::Pretty);

        let args = Args::parse_from([
            "tollgate-web",
            "--host",
            "0.0.0.0",
            "--port",
            "3000",
            "--log-format",
            "json",
        ]);
        assert_eq!(args.host.as_deref(), Some("0.0.0.0"));
        assert_eq!(args.port, Some(3000));
        assert_eq!(args.log_format, LogFormat::Json);
    }
}
