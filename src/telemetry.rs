use anyhow::Result;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};
use uuid::Uuid;

/// Initialize tracing to stderr so stdout stays the migration log.
/// `RUST_LOG` takes precedence over the configured `level`.
pub fn init_telemetry(level: &str, json: bool) -> Result<()> {
    let filter = EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new(level))?;
    let registry = tracing_subscriber::registry().with(filter);
    let fmt = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false);

    if json {
        registry
            .with(fmt.json().with_current_span(true).with_span_list(true))
            .try_init()?;
    } else {
        registry.with(fmt).try_init()?;
    }

    tracing::debug!("main-branch telemetry initialized");
    Ok(())
}

/// Generate a correlation ID for linking the diagnostics of one run
pub fn generate_correlation_id() -> String {
    Uuid::new_v4().to_string()
}

/// Create the root span for one CLI invocation
pub fn create_run_span(operation: &str, repository: &str, correlation_id: &str) -> tracing::Span {
    tracing::info_span!(
        "main_branch_run",
        operation = operation,
        repository = repository,
        correlation.id = correlation_id,
    )
}
