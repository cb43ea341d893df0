//! Structured logging for cb-core.
//!
//! - stdout is reserved for command payloads (tables or JSON)
//! - stderr receives all log output (human or JSONL)

pub mod config;

pub use config::{LogConfig, LogFormat, LogLevel};

use std::io::IsTerminal;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

/// Build the event filter: an explicit `RUST_LOG` directive wins, otherwise
/// the configured level applies to the inference crates.
pub fn build_filter(config: &LogConfig) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| default_filter(config.level))
}

fn default_filter(level: LogLevel) -> EnvFilter {
    EnvFilter::new(format!("cb_core={level},cb_math={level}"))
}

/// Initialize the logging subsystem.
///
/// Must be called once at startup before any logging occurs. A second call
/// leaves the first subscriber in place.
pub fn init_logging(config: &LogConfig) {
    let filter = build_filter(config);

    let result = match config.format {
        LogFormat::Human => {
            let use_ansi = std::io::stderr().is_terminal();
            let fmt_layer = fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false)
                .with_ansi(use_ansi);

            if config.timestamps {
                tracing_subscriber::registry()
                    .with(filter)
                    .with(fmt_layer)
                    .try_init()
            } else {
                tracing_subscriber::registry()
                    .with(filter)
                    .with(fmt_layer.without_time())
                    .try_init()
            }
        }
        LogFormat::Jsonl => {
            let jsonl_layer = fmt::layer()
                .json()
                .with_writer(std::io::stderr);
            tracing_subscriber::registry()
                .with(filter)
                .with(jsonl_layer)
                .try_init()
        }
    };

    if let Err(err) = result {
        tracing::debug!(error = %err, "logging already initialized");
    }
}

/// Initialize logging from the environment alone.
pub fn init_default_logging() {
    init_logging(&LogConfig::from_env(None, None));
}
