//! Logging setup for the SoleMate host.
//!
//! Production writes JSON to a daily rolling file and compact lines to
//! stdout. Development writes pretty, colored stdout with span events.
//! The level comes from `RUST_LOG`, then `SOLEMATE_LOG_LEVEL`, then `info`.
//! `SOLEMATE_LOG_DIR` overrides where production log files go.

use std::path::PathBuf;
use std::sync::OnceLock;

use anyhow::Context;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

const LOG_DIR_ENV: &str = "SOLEMATE_LOG_DIR";

/// Guards for the non-blocking writers; dropping one stops its worker.
static FILE_GUARD: OnceLock<WorkerGuard> = OnceLock::new();
static STDOUT_GUARD: OnceLock<WorkerGuard> = OnceLock::new();

/// Installs the global subscriber.
///
/// `is_production` comes from `server.production` in the configuration.
///
/// # Errors
///
/// Returns an error if the level filter cannot be parsed or a subscriber
/// is already installed.
pub fn init(is_production: bool) -> anyhow::Result<()> {
    let log_level = std::env::var("SOLEMATE_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());

    let env_filter = filter(&log_level)?;

    if is_production {
        init_production(env_filter)?;
    } else {
        init_development(env_filter)?;
    }

    Ok(())
}

fn filter(fallback: &str) -> anyhow::Result<EnvFilter> {
    Ok(EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new(fallback))?)
}

fn init_production(env_filter: EnvFilter) -> anyhow::Result<()> {
    let log_dir = std::env::var_os(LOG_DIR_ENV).map_or_else(log_directory, PathBuf::from);
    std::fs::create_dir_all(&log_dir)
        .with_context(|| format!("creating log directory {}", log_dir.display()))?;

    let file_appender = RollingFileAppender::new(Rotation::DAILY, &log_dir, "solemate");

    let (non_blocking_file, file_guard) = tracing_appender::non_blocking(file_appender);
    let (non_blocking_stdout, stdout_guard) = tracing_appender::non_blocking(std::io::stdout());

    let file_layer = tracing_subscriber::fmt::layer()
        .json()
        .with_writer(non_blocking_file)
        .with_target(true)
        .with_thread_ids(true)
        .with_file(true)
        .with_line_number(true);

    let stdout_layer = tracing_subscriber::fmt::layer()
        .compact()
        .with_writer(non_blocking_stdout)
        .with_target(true)
        .with_ansi(false);

    tracing_subscriber::registry()
        .with(env_filter)
        .with(file_layer)
        .with(stdout_layer)
        .try_init()?;

    let _ = FILE_GUARD.set(file_guard);
    let _ = STDOUT_GUARD.set(stdout_guard);

    tracing::info!(log_dir = %log_dir.display(), "Production logging enabled");
    Ok(())
}

fn init_development(env_filter: EnvFilter) -> anyhow::Result<()> {
    let stdout_layer = tracing_subscriber::fmt::layer()
        .pretty()
        .with_target(true)
        .with_thread_ids(false)
        .with_file(true)
        .with_line_number(true)
        .with_span_events(FmtSpan::NEW | FmtSpan::CLOSE);

    tracing_subscriber::registry()
        .with(env_filter)
        .with(stdout_layer)
        .try_init()?;
    Ok(())
}

/// `/var/log/solemate` on Linux, otherwise a `logs` folder in the platform data directory.
fn log_directory() -> PathBuf {
    #[cfg(target_os = "linux")]
    {
        PathBuf::from("/var/log/solemate")
    }
    #[cfg(not(target_os = "linux"))]
    {
        directories::ProjectDirs::from("", "", "solemate")
            .map(|dirs| dirs.data_dir().join("logs"))
            .unwrap_or_else(|| PathBuf::from("./logs"))
    }
}
