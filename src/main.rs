//! Binary entrypoint for the slideshow server.
//!
//! Delegates all logic to the library crate; this file only wires the shared
//! state to the background tasks and the HTTP server.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;

use slideshow_server::tasks::{advance, config_watch};
use slideshow_server::{SlideshowState, logging, web};

#[derive(Debug, Parser)]
#[command(
    name = "slideshow-server",
    version,
    about = "Serve a folder of images as a timed slideshow"
)]
struct Args {
    /// Path to the JSON (or YAML) config file
    #[arg(short, long, value_name = "FILE", default_value = "config.json")]
    config: PathBuf,
    /// Address the HTTP server listens on
    #[arg(long, value_name = "ADDR", default_value = "127.0.0.1:8080")]
    bind: SocketAddr,
    /// How often to check the config file for changes (e.g. "1s", "500ms")
    #[arg(long, value_name = "DURATION", default_value = "1s", value_parser = humantime::parse_duration)]
    poll_interval: Duration,
}

#[tokio::main]
async fn main() -> Result<()> {
    logging::init();
    let Args {
        config,
        bind,
        poll_interval,
    } = Args::parse();

    let state = Arc::new(SlideshowState::new());
    let mut watcher = config_watch::ConfigWatcher::new(config.clone(), state.clone(), poll_interval);
    match watcher.prime() {
        Ok(count) => tracing::info!(count, config = %config.display(), "initial configuration loaded"),
        Err(err) => tracing::warn!(error = %err, "starting without images; waiting for a valid config"),
    }

    let cancel = CancellationToken::new();
    {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if let Err(err) = tokio::signal::ctrl_c().await {
                tracing::warn!("ctrl-c handler failed: {err}");
                return;
            }
            tracing::info!("ctrl-c received; initiating shutdown");
            cancel.cancel();
        });
    }

    let mut tasks: JoinSet<Result<()>> = JoinSet::new();

    // Advance scheduler (blocking thread parked on the state's condvar)
    tasks.spawn_blocking({
        let state = state.clone();
        move || {
            advance::run(&state);
            Ok(())
        }
    });

    // Wake the scheduler once shutdown starts
    tasks.spawn({
        let state = state.clone();
        let cancel = cancel.clone();
        async move {
            cancel.cancelled().await;
            state.close();
            Ok(())
        }
    });

    // Config watcher
    tasks.spawn({
        let cancel = cancel.clone();
        async move { watcher.run(cancel).await.context("config watcher failed") }
    });

    // HTTP server
    tasks.spawn({
        let state = state.clone();
        let cancel = cancel.clone();
        async move {
            web::serve(state, bind, cancel)
                .await
                .context("web server failed")
        }
    });

    // Any task ending brings the rest down.
    while let Some(res) = tasks.join_next().await {
        match res {
            Ok(Ok(())) => {}
            Ok(Err(e)) => tracing::error!("task error: {e:?}"),
            Err(e) => tracing::error!("join error: {e}"),
        }
        cancel.cancel();
    }

    Ok(())
}
