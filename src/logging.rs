// ABOUTME: Logging configuration and tracing-subscriber setup for the ruck tracker
// ABOUTME: Selects JSON, pretty, or compact output and quiets noisy HTTP dependencies
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Ruck Tracker Contributors

//! Structured logging setup
//!
//! Logs go to stderr so command output on stdout stays machine readable.

use anyhow::Result;
use ruck_core::constants::service_names;
use std::env;
use std::io;
use tracing::{info, Level};
use tracing_subscriber::{
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
    EnvFilter,
};

/// Logging configuration
#[derive(Debug, Clone)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,
    /// Output format
    pub format: LogFormat,
    /// Include source file and line numbers
    pub include_location: bool,
    /// Include span open/close events
    pub include_spans: bool,
    /// Service name for structured logging
    pub service_name: String,
    /// Service version
    pub service_version: String,
}

/// Log output format options
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    /// `JSON` lines for log shipping
    Json,
    /// Multi-line human readable output
    Pretty,
    /// Single-line output
    Compact,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".into(),
            format: LogFormat::Compact,
            include_location: false,
            include_spans: false,
            service_name: service_names::RUCK_TRACKER.into(),
            service_version: env!("CARGO_PKG_VERSION").to_owned(),
        }
    }
}

impl LoggingConfig {
    /// Create logging configuration from environment variables
    #[must_use]
    pub fn from_env() -> Self {
        let format = match env::var("LOG_FORMAT").as_deref() {
            Ok("json") => LogFormat::Json,
            Ok("pretty") => LogFormat::Pretty,
            _ => LogFormat::Compact,
        };

        Self {
            level: env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
            format,
            include_location: env::var("LOG_INCLUDE_LOCATION").is_ok(),
            include_spans: env::var("LOG_INCLUDE_SPANS").is_ok(),
            ..Self::default()
        }
    }

    /// Override the level, e.g. from a `--verbose` flag
    #[must_use]
    pub fn with_level(mut self, level: impl Into<String>) -> Self {
        self.level = level.into();
        self
    }

    fn filter(&self) -> EnvFilter {
        let directive = |d: &str, fallback: Level| {
            d.parse().unwrap_or_else(|_| fallback.into())
        };
        EnvFilter::new(&self.level)
            // Noise reduction applies even when RUST_LOG is set
            .add_directive(directive("hyper=warn", Level::WARN))
            .add_directive(directive("hyper_util=warn", Level::WARN))
            .add_directive(directive("reqwest=warn", Level::WARN))
            .add_directive(directive("rustls=warn", Level::WARN))
    }

    /// Initialize the global tracing subscriber
    ///
    /// # Errors
    ///
    /// Returns an error if a global subscriber is already installed
    pub fn init(&self) -> Result<()> {
        let registry = tracing_subscriber::registry().with(self.filter());
        let span_events = if self.include_spans {
            FmtSpan::NEW | FmtSpan::CLOSE
        } else {
            FmtSpan::NONE
        };

        match self.format {
            LogFormat::Json => {
                let layer = fmt::layer()
                    .with_file(self.include_location)
                    .with_line_number(self.include_location)
                    .with_target(true)
                    .with_writer(io::stderr)
                    .with_span_events(span_events)
                    .json();
                registry.with(layer).try_init()?;
            }
            LogFormat::Pretty => {
                let layer = fmt::layer()
                    .pretty()
                    .with_file(self.include_location)
                    .with_line_number(self.include_location)
                    .with_writer(io::stderr)
                    .with_span_events(span_events);
                registry.with(layer).try_init()?;
            }
            LogFormat::Compact => {
                let layer = fmt::layer()
                    .compact()
                    .with_target(false)
                    .with_writer(io::stderr)
                    .with_span_events(FmtSpan::NONE);
                registry.with(layer).try_init()?;
            }
        }

        info!(
            service.name = %self.service_name,
            service.version = %self.service_version,
            log.level = %self.level,
            log.format = ?self.format,
            "Logging initialized"
        );
        Ok(())
    }
}

/// Initialize logging from environment
///
/// # Errors
///
/// Returns an error if logging initialization fails
pub fn init_from_env() -> Result<()> {
    LoggingConfig::from_env().init()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex, PoisonError};
    use tracing::subscriber::with_default;

    #[derive(Clone, Default)]
    struct Captured(Arc<Mutex<Vec<u8>>>);

    impl io::Write for Captured {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_pretty_format_renders_fields() {
        let captured = Captured::default();
        let writer = captured.clone();
        let subscriber = tracing_subscriber::registry().with(
            fmt::layer()
                .pretty()
                .with_ansi(false)
                .with_writer(move || writer.clone()),
        );

        with_default(subscriber, || info!(session_id = "ruck-1", "Pretty output"));

        let bytes = captured.0.lock().unwrap_or_else(PoisonError::into_inner).clone();
        let text = String::from_utf8(bytes).unwrap();
        assert!(text.contains("Pretty output"));
        assert!(text.contains("ruck-1"));
    }

    #[test]
    fn test_default_is_compact_info() {
        let config = LoggingConfig::default();
        assert_eq!(config.format, LogFormat::Compact);
        assert_eq!(config.level, "info");
        assert_eq!(config.service_name, "ruck-tracker");
    }

    #[test]
    fn test_filter_accepts_module_directives() {
        let config = LoggingConfig::default().with_level("ruck_tracker=debug,warn");
        let rendered = config.filter().to_string();
        assert!(rendered.contains("reqwest=warn"));
        assert!(rendered.contains("ruck_tracker=debug"));
    }
}
