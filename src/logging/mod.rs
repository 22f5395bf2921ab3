/*!
 * Logging Module
 * Subscriber set-up: rolling files plus console, JSON in production.
 */
pub mod middleware;

use std::io;
use std::path::PathBuf;
use tracing_appender::{non_blocking, non_blocking::WorkerGuard, rolling};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

/// Background writer guards; log lines are flushed when these drop, so the
/// caller keeps them for the life of the process.
pub struct LogGuards {
    _guards: Vec<WorkerGuard>,
}

fn log_dir() -> PathBuf {
    std::env::var("LOG_DIR")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("logs"))
}

fn default_filter(log_level: &str) -> String {
    format!(
        "portfolio_cms={},tower_http=debug,axum=info,sqlx=warn",
        log_level
    )
}

/// Initialize the logging system
pub fn init() -> LogGuards {
    let environment = std::env::var("ENVIRONMENT").unwrap_or_else(|_| "development".to_string());
    let is_production = environment == "production";

    let dir = log_dir();
    if let Err(e) = std::fs::create_dir_all(&dir) {
        eprintln!("could not create log directory {}: {}", dir.display(), e);
    }

    let (file_writer, file_guard) = non_blocking(rolling::daily(&dir, "app.log"));
    let (error_writer, error_guard) = non_blocking(rolling::daily(&dir, "error.log"));
    let (console_writer, console_guard) = non_blocking(io::stdout());

    let log_level = std::env::var("LOG_LEVEL").unwrap_or_else(|_| {
        if is_production {
            "info".to_string()
        } else {
            "debug".to_string()
        }
    });

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_filter(&log_level)));

    let error_layer = fmt::layer()
        .json()
        .with_writer(error_writer)
        .with_target(true)
        .with_file(true)
        .with_line_number(true)
        .with_filter(tracing_subscriber::filter::LevelFilter::ERROR);

    // Errors always go to their own file, whatever the format elsewhere.
    let subscriber = tracing_subscriber::registry()
        .with(env_filter)
        .with(error_layer);

    if is_production {
        let file_layer = fmt::layer()
            .json()
            .with_writer(file_writer)
            .with_target(true)
            .with_thread_ids(true)
            .with_file(true)
            .with_line_number(true);

        let console_layer = fmt::layer()
            .json()
            .with_writer(console_writer)
            .with_target(false);

        subscriber.with(file_layer).with(console_layer).init();
    } else {
        let file_layer = fmt::layer()
            .with_writer(file_writer)
            .with_target(true)
            .with_file(true)
            .with_line_number(true)
            .with_ansi(false);

        let console_layer = fmt::layer()
            .with_writer(console_writer)
            .with_target(true)
            .pretty();

        subscriber.with(file_layer).with(console_layer).init();
    }

    tracing::info!(
        environment = %environment,
        log_dir = %dir.display(),
        "Logging initialized"
    );

    LogGuards {
        _guards: vec![file_guard, error_guard, console_guard],
    }
}
