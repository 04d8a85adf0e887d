use std::str::FromStr;

use once_cell::sync::OnceCell;
use tracing::Level;
use tracing_subscriber::fmt;
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::EnvFilter;

use crate::error::{Error, Result};

static INSTALLED: OnceCell<()> = OnceCell::new();

/// Configuration for the logging system
#[derive(Debug, Clone)]
pub struct LoggingConfig {
    /// The log level to use
    pub level: Level,
    /// Whether to enable JSON formatting
    pub json: bool,
    /// Whether to include file and line information
    pub file_info: bool,
    /// Whether to log spans
    pub log_spans: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        LoggingConfig {
            level: Level::INFO,
            json: false,
            file_info: false,
            log_spans: false,
        }
    }
}

impl LoggingConfig {
    /// Create a new logging configuration at the given level
    pub fn new(level: Level) -> Self {
        LoggingConfig {
            level,
            ..Default::default()
        }
    }

    /// Enable JSON formatting
    pub fn with_json(mut self) -> Self {
        self.json = true;
        self
    }

    /// Enable file and line information in logs
    pub fn with_file_info(mut self) -> Self {
        self.file_info = true;
        self
    }

    /// Enable span logging
    pub fn with_spans(mut self) -> Self {
        self.log_spans = true;
        self
    }
}

/// Install a global tracing subscriber with the provided configuration.
/// Idempotent: later calls after a successful install are no-ops.
pub fn setup_logging(config: LoggingConfig) -> Result<()> {
    INSTALLED.get_or_try_init(|| {
        let filter = EnvFilter::from_default_env().add_directive(config.level.into());

        let span_events = if config.log_spans {
            FmtSpan::ACTIVE
        } else {
            FmtSpan::NONE
        };

        let mut subscriber = fmt::Subscriber::builder()
            .with_env_filter(filter)
            .with_span_events(span_events);

        if config.file_info {
            subscriber = subscriber.with_file(true).with_line_number(true);
        }

        let result = if config.json {
            subscriber.with_writer(std::io::stdout).json().try_init()
        } else {
            subscriber.try_init()
        };
        result.map_err(|e| Error::Config(format!("failed to install subscriber: {}", e)))
    })?;
    Ok(())
}

/// Parse a log level from a string
pub fn parse_log_level(level: &str) -> Result<Level> {
    Level::from_str(level).map_err(|_| Error::Config(format!("Invalid log level: {}", level)))
}
