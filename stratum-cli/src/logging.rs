//! CLI logging initialization
//!
//! Per-phase log control on top of `tracing-subscriber`.

use crate::config::LogConfig;
use std::io;
use tracing_subscriber::{
    filter::Targets, fmt, layer::SubscriberExt, util::SubscriberInitExt, Layer,
};

/// Log output format
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LogFormat {
    /// Colored, multi-line (development)
    Pretty,
    /// Compact single-line
    Compact,
    /// JSON (tool integration)
    Json,
}

impl LogFormat {
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "pretty" => Some(LogFormat::Pretty),
            "compact" => Some(LogFormat::Compact),
            "json" => Some(LogFormat::Json),
            _ => None,
        }
    }
}

/// Initialize the log system with the given format and per-phase levels.
pub fn init(log_config: &LogConfig, format: LogFormat) {
    let targets = Targets::new()
        .with_default(log_config.global)
        .with_target("stratum::parse", log_config.level_for("stratum::parse"))
        .with_target("stratum::pipeline", log_config.level_for("stratum::pipeline"))
        .with_target("stratum::stage", log_config.level_for("stratum::stage"))
        .with_target("stratum::print", log_config.level_for("stratum::print"));

    let stderr_layer = create_format_layer(format, io::stderr).with_filter(targets);
    tracing_subscriber::registry().with(stderr_layer).init();
}

/// Create formatter layer based on format
fn create_format_layer<W, F>(
    format: LogFormat,
    make_writer: F,
) -> impl Layer<tracing_subscriber::Registry>
where
    W: io::Write + Send + Sync + 'static,
    F: Fn() -> W + Send + Sync + 'static,
{
    match format {
        LogFormat::Pretty => fmt::layer()
            .pretty()
            .with_target(true)
            .with_timer(fmt::time::time())
            .with_writer(make_writer)
            .boxed(),
        LogFormat::Compact => fmt::layer()
            .compact()
            .with_target(false)
            .without_time()
            .with_writer(make_writer)
            .boxed(),
        LogFormat::Json => fmt::layer()
            .json()
            .with_target(true)
            .with_timer(fmt::time::time())
            .with_writer(make_writer)
            .boxed(),
    }
}
