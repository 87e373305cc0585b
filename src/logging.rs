//! stderr logging through `tracing_subscriber`. The engine logs through the `log` facade;
//! `tracing_log` forwards those records into the subscriber.

use tracing::level_filters::LevelFilter;
use tracing_log::{AsLog, LogTracer};
use tracing_subscriber::EnvFilter;

/// Overrides the `-v` level with full filter directives, e.g. `sanitizer.matcher=trace`.
const FILTER_ENV: &str = "TAGSAFE_LOG";

#[derive(Debug)]
pub enum LoggingError {
    Filter(tracing_subscriber::filter::ParseError),
    Bridge(tracing_log::log::SetLoggerError),
    Subscriber(tracing::subscriber::SetGlobalDefaultError),
}

impl std::fmt::Display for LoggingError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LoggingError::Filter(err) => write!(f, "invalid {FILTER_ENV}: {err}"),
            LoggingError::Bridge(err) => write!(f, "cannot bridge log records: {err}"),
            LoggingError::Subscriber(err) => write!(f, "cannot install subscriber: {err}"),
        }
    }
}

impl std::error::Error for LoggingError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            LoggingError::Filter(err) => Some(err),
            LoggingError::Bridge(err) => Some(err),
            LoggingError::Subscriber(err) => Some(err),
        }
    }
}

/// `-v` count to level: none = warn, then info, debug, trace.
pub fn level_for(verbosity: u8) -> LevelFilter {
    match verbosity {
        0 => LevelFilter::WARN,
        1 => LevelFilter::INFO,
        2 => LevelFilter::DEBUG,
        _ => LevelFilter::TRACE,
    }
}

fn build_filter(level: LevelFilter, directives: Option<&str>) -> Result<EnvFilter, LoggingError> {
    match directives {
        Some(directives) => EnvFilter::try_new(directives).map_err(LoggingError::Filter),
        None => Ok(EnvFilter::default().add_directive(level.into())),
    }
}

pub fn init(verbosity: u8) -> Result<(), LoggingError> {
    let directives = std::env::var(FILTER_ENV).ok();
    let filter = build_filter(level_for(verbosity), directives.as_deref())?;
    // `log` macros below the bridge level are skipped before any record is built.
    let bridge_level = filter.max_level_hint().unwrap_or(LevelFilter::TRACE);
    LogTracer::init_with_filter(bridge_level.as_log()).map_err(LoggingError::Bridge)?;

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(true)
        .without_time()
        .finish();
    tracing::subscriber::set_global_default(subscriber).map_err(LoggingError::Subscriber)
}
