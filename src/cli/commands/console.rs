use crate::migration::{LogRecord, LogSink, Severity, TracingSink};

/// Prints migration records for a person at a terminal. Records that go to
/// stdout are also forwarded to `tracing`; errors and warnings are printed to
/// stderr only, where the log subscriber would repeat them.
#[derive(Debug, Default)]
pub struct ConsoleSink {
    forward: TracingSink,
}

impl ConsoleSink {
    pub fn new() -> Self {
        Self::default()
    }
}

fn emoji(severity: Severity) -> Option<&'static str> {
    match severity {
        Severity::Plan => Some("🌐"),
        Severity::Info => Some("ℹ️ "),
        Severity::Success => Some("✅"),
        Severity::Ok => Some("🆗"),
        Severity::Error => Some("❌"),
        Severity::Warning => Some("⚠️"),
        Severity::Separator => None,
    }
}

/// `[owner/repo] [operation] <emoji> message`, or an empty line for separators.
pub fn render(record: &LogRecord) -> String {
    match emoji(record.severity) {
        Some(emoji) => format!(
            "[{}] [{}] {} {}",
            record.repository, record.operation, emoji, record.message
        ),
        None => String::new(),
    }
}

fn is_diagnostic(severity: Severity) -> bool {
    matches!(severity, Severity::Error | Severity::Warning)
}

impl LogSink for ConsoleSink {
    fn record(&self, record: &LogRecord) {
        let line = render(record);
        if is_diagnostic(record.severity) {
            eprintln!("{line}");
        } else {
            self.forward.record(record);
            println!("{line}");
        }
    }
}
