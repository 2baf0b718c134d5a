//! Structured progress records emitted by migration operations.
//!
//! The core only produces [`LogRecord`]s; how they are rendered (emoji,
//! colour, a browser console) is up to the [`LogSink`] the caller installs.

use std::fmt;

use tracing::{error, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Severity {
    Plan,
    Info,
    Success,
    Ok,
    Error,
    Warning,
    Separator,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Severity::Plan => "plan",
            Severity::Info => "info",
            Severity::Success => "success",
            Severity::Ok => "ok",
            Severity::Error => "error",
            Severity::Warning => "warning",
            Severity::Separator => "separator",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogRecord {
    pub repository: String,
    pub operation: String,
    pub severity: Severity,
    pub message: String,
}

pub trait LogSink: Send + Sync {
    fn record(&self, record: &LogRecord);
}

/// Forwards records to `tracing` with the record fields attached.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl LogSink for TracingSink {
    fn record(&self, record: &LogRecord) {
        let LogRecord {
            repository,
            operation,
            severity,
            message,
        } = record;
        match severity {
            Severity::Error => error!(%repository, %operation, %severity, "{message}"),
            Severity::Warning => warn!(%repository, %operation, %severity, "{message}"),
            Severity::Separator => {}
            _ => info!(%repository, %operation, %severity, "{message}"),
        }
    }
}
