//! Integration tests for logging system

use bridge_traits::time::{ConsoleLogger, LogLevel};
use core_runtime::logging::{
    init_logging, redact_if_sensitive, strip_path, LogFormat, LoggingConfig,
};
use std::sync::Arc;

#[test]
fn test_init_logging_only_once() {
    let config = LoggingConfig::default()
        .with_format(LogFormat::Compact)
        .with_level(LogLevel::Debug)
        .with_logger_sink(Arc::new(ConsoleLogger::default()));

    assert!(init_logging(config.clone()).is_ok());
    tracing::info!(content_id = "a", "cached chart");

    // The global subscriber is already installed.
    assert!(init_logging(config).is_err());
}

#[test]
fn test_pii_redaction_secrets() {
    assert_eq!(redact_if_sensitive("token", "abc"), "[REDACTED]");
    assert_eq!(redact_if_sensitive("password", "hunter2"), "[REDACTED]");
    assert_eq!(redact_if_sensitive("bpm", "120"), "120");
}

#[test]
fn test_path_stripping() {
    assert_eq!(strip_path("/srv/cache/a.pdf"), "a.pdf");
    assert_eq!(strip_path("relative/lyrics.txt"), "lyrics.txt");
}
