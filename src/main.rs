//! axum-base application server.
//!
//! # Architecture Overview
//!
//! ```text
//!     Client Request
//!     ──────────────▶ ┌──────────────────────────────────────────────┐
//!                     │ middleware: request id, trace, cors, timeout, │
//!                     │ body limit, metrics, ip / user rate limits    │
//!                     └──────────────────────┬───────────────────────┘
//!                                            ▼
//!                     ┌──────────────────────────────────────────────┐
//!                     │ api handlers ── security (jwt, argon2)        │
//!                     └──────────────────────┬───────────────────────┘
//!                                            ▼
//!                     ┌──────────────┐   ┌────────┐   ┌─────────────┐
//!                     │ db (sqlx Any)│   │ redis  │   │ OTLP export │
//!                     └──────────────┘   └────────┘   └─────────────┘
//! ```

use std::path::PathBuf;

use clap::Parser;

use axum_base::config::AppConfig;
use axum_base::lifecycle::{spawn_signal_handler, Application, Shutdown};

#[derive(Parser)]
#[command(name = "axum-base")]
#[command(about = "Backend starter service", long_about = None)]
struct Cli {
    /// TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Listener port, overrides configuration
    #[arg(long)]
    port: Option<u16>,

    /// Bind address, overrides configuration
    #[arg(long)]
    host: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let mut config = AppConfig::load(cli.config.as_deref())?;
    if let Some(port) = cli.port {
        config.server.port = port;
    }
    if let Some(host) = cli.host {
        config.server.bind_address = host;
    }

    let app = Application::build(config).await?;

    let shutdown = Shutdown::new();
    spawn_signal_handler(shutdown.clone());

    app.run(shutdown).await?;
    Ok(())
}
