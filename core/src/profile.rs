use std::time::Instant;

/// Scope guard that reports how long an operation took when dropped.
///
/// ```
/// use search_core::LogDuration;
/// let _guard = LogDuration::new("rebuild");
/// ```
pub struct LogDuration {
    operation: String,
    start: Instant,
}

impl LogDuration {
    pub fn new(operation: impl Into<String>) -> Self {
        Self { operation: operation.into(), start: Instant::now() }
    }
}

impl Drop for LogDuration {
    fn drop(&mut self) {
        let elapsed = self.start.elapsed();
        tracing::info!(operation = %self.operation, elapsed_ms = elapsed.as_millis() as u64, "operation finished");
    }
}

/// Time the rest of the enclosing scope: `log_duration!("remove all");`
#[macro_export]
macro_rules! log_duration {
    ($name:expr) => {
        let _log_duration_guard = $crate::LogDuration::new($name);
    };
}
