//! Echo Recorder: record a clip, send it to an echo server, play the echo
//! back at normal or fast speed.

mod app;
mod app_command;
mod config;
mod error;
mod status_view;

pub(crate) use {
    app::App,
    app_command::AppCommand,
    error::{AppError, Result as AppResult},
    status_view::StatusView,
};

use crate::config::Config;

use std::{panic::Location, sync::Arc, time::Duration};

use echo_recorder_core::{
    ArtifactStore, CpalCapture, HttpEchoTransport, RodioPlayback, SessionController,
};
use error_location::ErrorLocation;
use tokio::{io::BufReader, task::LocalSet};
use tracing::{error, info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

const DEFAULT_LOG_FILTER: &str = "echo_recorder=debug,echo_recorder_core=debug";
const LOG_FILE_PREFIX: &str = "echo-recorder.log";
const SHUTDOWN_GRACE: Duration = Duration::from_millis(250);

/// Application entry point.
fn main() {
    // Dropping the guard flushes buffered log lines.
    let _log_guard = init_tracing();

    let config = match Config::load() {
        Ok(c) => c,
        Err(e) => {
            error!("Failed to load config: {:?}", e);
            eprintln!("Failed to load config: {}", e);
            std::process::exit(1);
        }
    };

    if let Err(e) = config.validate() {
        error!("Config validation failed: {:?}", e);
        eprintln!("{}", e);
        std::process::exit(1);
    }

    let runtime = match tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
    {
        Ok(rt) => rt,
        Err(e) => {
            error!("Failed to create tokio runtime: {:?}", e);
            std::process::exit(1);
        }
    };

    // The session controller holds !Send device handles, so it runs on a
    // LocalSet driven from this thread.
    let local = LocalSet::new();
    let result = local.block_on(&runtime, run(config));
    drop(local);

    // A pending stdin read cannot be cancelled; don't wait on it.
    runtime.shutdown_timeout(SHUTDOWN_GRACE);

    if let Err(e) = result {
        error!(error = ?e, "Echo Recorder failed");
        eprintln!("{}", e);
        std::process::exit(1);
    }
}

/// Logs go to a daily rolling file so they never interleave with the
/// console status lines. Falls back to stderr when no data directory exists.
fn init_tracing() -> Option<WorkerGuard> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));

    match Config::log_dir() {
        Ok(log_dir) => {
            let appender = tracing_appender::rolling::daily(log_dir, LOG_FILE_PREFIX);
            let (writer, guard) = tracing_appender::non_blocking(appender);
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_writer(writer)
                .with_ansi(false)
                .init();
            Some(guard)
        }
        Err(_) => {
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_writer(std::io::stderr)
                .init();
            warn!("No data directory, logging to stderr");
            None
        }
    }
}

async fn run(config: Config) -> AppResult<()> {
    let store = ArtifactStore::open(config.artifact_dir()?)?;
    let transport = HttpEchoTransport::new(&config.server.base_url, config.server.timeout())?
        .with_settle_delay(config.server.settle_delay());

    let controller = SessionController::new(
        Box::new(CpalCapture::new()),
        Box::new(RodioPlayback::new()),
        Arc::new(transport),
        store,
        config.playback.initial_rate()?,
    );

    let app = App::new(
        controller.handle(),
        controller.subscribe(),
        config.playback.fast_rate()?,
        tokio::io::stdout(),
    );

    let session = tokio::task::spawn_local(controller.run());

    let interrupt = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = ?e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    app.run(BufReader::new(tokio::io::stdin()), interrupt).await?;

    session.await.map_err(|e| AppError::TaskFailed {
        reason: e.to_string(),
        location: ErrorLocation::from(Location::caller()),
    })?;

    info!("Echo Recorder shut down successfully");

    Ok(())
}
