use std::error::Error;

/// Sink for the status lines emitted while provisioning.
///
/// The default implementation forwards to `tracing`; tests swap in a
/// recorder to assert on the exact sequence of messages.
pub trait Reporter: Send + Sync {
    fn info(&self, message: &str);

    fn warn(&self, message: &str);

    /// Report a failure together with its underlying cause.
    fn error(&self, message: &str, cause: &(dyn Error + 'static));
}

#[derive(Debug, Default, Clone, Copy)]
pub struct TracingReporter;

impl Reporter for TracingReporter {
    fn info(&self, message: &str) {
        tracing::info!("{}", message);
    }

    fn warn(&self, message: &str) {
        tracing::warn!("{}", message);
    }

    fn error(&self, message: &str, cause: &(dyn Error + 'static)) {
        tracing::error!(error = %cause, "{}", message);
    }
}
