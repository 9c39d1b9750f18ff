//! Structured logging setup.

use thiserror::Error;
use tracing_subscriber::EnvFilter;

/// Errors raised while configuring logging.
#[derive(Debug, Error)]
pub enum LoggingError {
    /// The global subscriber was already installed.
    #[error("failed to install global tracing subscriber: {0}")]
    AlreadyInitialized(#[from] tracing_subscriber::util::TryInitError),
}

/// Result type for logging setup.
pub type LoggingResult<T> = Result<T, LoggingError>;

/// Output format for log lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    /// Single-line, human-readable.
    Compact,
    /// Multi-line, human-readable, with source location.
    Pretty,
    /// Newline-delimited JSON, machine-readable.
    Json,
}

impl LogFormat {
    /// Parses a format name, defaulting to [`LogFormat::Compact`] on anything
    /// unrecognized rather than failing startup over a typo.
    pub fn parse(name: &str) -> Self {
        match name.to_ascii_lowercase().as_str() {
            "json" => Self::Json,
            "pretty" => Self::Pretty,
            _ => Self::Compact,
        }
    }
}

/// Installs the global `tracing` subscriber for the process.
///
/// `level` seeds an [`EnvFilter`]; if `RUST_LOG` is set it wins, matching
/// the convention every other `tracing`-based binary in this family uses.
pub fn init(level: &str, format: LogFormat) -> LoggingResult<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    match format {
        LogFormat::Compact => builder.try_init()?,
        LogFormat::Pretty => builder.pretty().try_init()?,
        LogFormat::Json => builder.json().try_init()?,
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_format_falls_back_to_compact() {
        assert_eq!(LogFormat::parse("whatever"), LogFormat::Compact);
    }

    #[test]
    fn recognizes_json_and_pretty() {
        assert_eq!(LogFormat::parse("JSON"), LogFormat::Json);
        assert_eq!(LogFormat::parse("pretty"), LogFormat::Pretty);
    }
}
