//! # sigfa-api binary
//!
//! `sigfa-api serve` starts the HTTP service. Without `DATABASE_URL` it runs
//! on an empty in-memory catalog, which is only useful for development.

use std::net::SocketAddr;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use sigfa_api::catalog::MemoryCatalog;
use sigfa_api::config::{AppConfig, ServeArgs};
use sigfa_api::db::init_pool;
use sigfa_api::state::AppState;

#[derive(Debug, Parser)]
#[command(name = "sigfa-api", version, about = "Weak-signals company monitor API")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Run the HTTP service.
    Serve(ServeArgs),
}

fn init_tracing(json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

async fn serve(args: ServeArgs) -> anyhow::Result<()> {
    let config = AppConfig::try_from(&args).context("invalid configuration")?;

    let state = match args.database_url.as_deref() {
        Some(url) => {
            let pool = init_pool(url)
                .await
                .context("failed to connect to the database")?;
            tracing::info!("catalog backed by Postgres");
            AppState::postgres(pool, config)
        }
        None => {
            tracing::warn!("DATABASE_URL not set, serving an empty in-memory catalog");
            AppState::in_memory(MemoryCatalog::new(), config)
        }
    };

    let app = sigfa_api::app(state);
    let addr = SocketAddr::from(([0, 0, 0, 0], args.port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    tracing::info!(%addr, "sigfa-api listening");
    axum::serve(listener, app).await.context("server error")?;
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    match cli.command {
        Command::Serve(args) => {
            init_tracing(args.log_json);
            serve(args).await
        }
    }
}
