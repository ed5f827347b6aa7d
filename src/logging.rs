use std::fs;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Console logging plus a daily-rotated JSON log file under `logs/`.
/// `RUST_LOG` overrides the default crate-level filter.
pub fn init_logging() {
    let _ = fs::create_dir_all("logs");

    let file_appender = tracing_appender::rolling::daily("logs", "pipeline.log");
    let (file_writer, guard) = tracing_appender::non_blocking(file_appender);

    let filter = EnvFilter::from_default_env()
        .add_directive("sanctions_pipeline=info".parse().unwrap());

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().json().with_writer(file_writer))
        .with(fmt::layer().with_writer(std::io::stdout))
        .init();

    // The guard must outlive the process for the file layer to flush
    std::mem::forget(guard);
}
