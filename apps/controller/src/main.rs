//! camctl controller entry point.

mod app;
mod config;
mod power;

use camctl_link::LinkServer;
use tracing_subscriber::filter::{LevelFilter, Targets};
use tracing_subscriber::prelude::*;
use tracing_subscriber::{EnvFilter, fmt};

fn main() -> anyhow::Result<()> {
    // Configuration first: the remote log layer depends on it.
    let config = config::Config::load()?;
    config.validate()?;

    let server = LinkServer::new(config.server_config());
    let remote_level = config.remote_level()?;
    let sink = server.log_sink();

    // The link's own chatter stays off the wire below INFO so that
    // sending a log line never produces another one.
    let remote_filter = Targets::new()
        .with_default(remote_level)
        .with_target("camctl_link", remote_level.min(LevelFilter::INFO));

    tracing_subscriber::registry()
        .with(
            fmt::layer().with_filter(
                EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
            ),
        )
        .with(
            fmt::layer()
                .with_ansi(false)
                .with_writer(move || sink.clone())
                .with_filter(remote_filter),
        )
        .init();

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        port = config.port,
        download_folder = %config.download_folder.display(),
        "starting camctl controller"
    );

    let rt = tokio::runtime::Runtime::new()?;
    rt.block_on(app::run(config, server))?;

    tracing::info!("controller shut down cleanly");
    Ok(())
}
