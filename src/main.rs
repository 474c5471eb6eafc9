mod config;
mod export;
mod modules;
mod web;

use std::{net::SocketAddr, path::PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use dotenvy::dotenv;
use tokio::net::TcpListener;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use crate::{config::AppConfig, web::AppState};

/// Backend for the РУЛЬ+ driving school site.
#[derive(Parser, Debug)]
#[command(author, version)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the HTTP server (default).
    Serve,
    /// Write the public API as static JSON files plus an `.htaccess` rewrite map.
    ExportStatic {
        #[arg(long, env = "EXPORT_DIR", default_value = "dist")]
        out: PathBuf,
    },
}

#[tokio::main]
async fn main() {
    dotenv().ok();
    init_tracing();

    let cli = Cli::parse();
    if let Err(err) = app_main(cli).await {
        error!(?err, "application error");
        std::process::exit(1);
    }
}

async fn app_main(cli: Cli) -> Result<()> {
    match cli.command.unwrap_or(Command::Serve) {
        Command::Serve => serve().await,
        Command::ExportStatic { out } => {
            export::export_static(&out)
                .await
                .with_context(|| format!("static export to {} failed", out.display()))?;
            Ok(())
        }
    }
}

async fn serve() -> Result<()> {
    let config = AppConfig::from_env()?;
    let port = config.port;
    let state = AppState::new(config).await?;

    let app = web::router::build_router(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    info!(%addr, "listening");

    let listener = TcpListener::bind(addr)
        .await
        .context("failed to bind listener")?;
    axum::serve(listener, app).await.context("server error")?;

    Ok(())
}

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .compact()
        .init();
}
