//! stderr diagnostics for the CLI.
//!
//! `--log-level` sets the default verbosity. A non-empty `RUST_LOG` replaces
//! it entirely, which allows per-crate directives such as
//! `tagform_core=trace`.

use clap::ValueEnum;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

#[derive(Copy, Clone, Debug, ValueEnum)]
pub enum LogFormat {
    Text,
    Json,
}

#[derive(Copy, Clone, Debug, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<LogLevel> for LevelFilter {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Error => LevelFilter::ERROR,
            LogLevel::Warn => LevelFilter::WARN,
            LogLevel::Info => LevelFilter::INFO,
            LogLevel::Debug => LevelFilter::DEBUG,
            LogLevel::Trace => LevelFilter::TRACE,
        }
    }
}

/// Filter built from `rust_log`, falling back to `level` when it holds no
/// directives. Malformed directives are dropped.
pub fn env_filter(level: LogLevel, rust_log: Option<&str>) -> EnvFilter {
    EnvFilter::builder()
        .with_default_directive(LevelFilter::from(level).into())
        .parse_lossy(rust_log.unwrap_or_default())
}

pub fn init_logging(format: LogFormat, level: LogLevel) {
    let rust_log = std::env::var(EnvFilter::DEFAULT_ENV).ok();
    let filter = env_filter(level, rust_log.as_deref());
    let builder = tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(filter)
        .with_ansi(false)
        .with_target(rust_log.is_some());

    let installed = match format {
        LogFormat::Text => builder.try_init(),
        LogFormat::Json => builder.json().try_init(),
    };
    if installed.is_err() {
        eprintln!("warning: a global tracing subscriber is already installed");
    }
}
