//! Logging configuration for the binary.
//!
//! Logs go to stderr so command output on stdout stays clean. The daemon can
//! additionally write to a file through a non-blocking appender. `RUST_LOG`
//! overrides the computed filter.

use std::path::Path;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, layer::SubscriberExt, registry::LookupSpan, Layer, util::SubscriberInitExt, EnvFilter};

/// Filter directive used when `RUST_LOG` is not set.
pub fn filter_directive(verbose: bool, default_level: &str) -> String {
    if verbose {
        "info,focus_coach=debug".to_string()
    } else {
        default_level.to_string()
    }
}

fn build_filter(verbose: bool, default_level: &str) -> EnvFilter {
    EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(filter_directive(verbose, default_level)))
}

fn stderr_layer<S>() -> impl Layer<S>
where
    S: tracing::Subscriber + for<'a> LookupSpan<'a>,
{
    fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false)
        .without_time()
}

/// Installs the global subscriber.
///
/// Returns a `WorkerGuard` that must be held for the program lifetime when a
/// log file is used, so buffered lines are flushed on exit.
pub fn init(verbose: bool, default_level: &str, log_file: Option<&Path>) -> Option<WorkerGuard> {
    let Some(log_file) = log_file else {
        let _ = tracing_subscriber::registry()
            .with(stderr_layer())
            .with(build_filter(verbose, default_level))
            .try_init();
        return None;
    };

    let directory = log_file
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    let Some(file_name) = log_file.file_name() else {
        eprintln!("Invalid log file path {:?}, logging to stderr only", log_file);
        return init(verbose, default_level, None);
    };

    if let Err(e) = std::fs::create_dir_all(directory) {
        eprintln!(
            "Failed to create log directory {:?}: {}, logging to stderr only",
            directory, e
        );
        return init(verbose, default_level, None);
    }

    let appender = tracing_appender::rolling::never(directory, file_name);
    let (non_blocking, guard) = tracing_appender::non_blocking(appender);

    let file_layer = fmt::layer()
        .with_writer(non_blocking)
        .with_ansi(false)
        .with_target(true);

    let _ = tracing_subscriber::registry()
        .with(file_layer)
        .with(stderr_layer())
        .with(build_filter(verbose, default_level))
        .try_init();

    tracing::info!(log_file = ?log_file, "File logging enabled");
    Some(guard)
}
