//! Spans and timing helpers.

use std::time::{Duration, Instant};
use tracing::{info_span, Span};

/// Span covering one hook invocation.
pub fn hook_span(kind: &str, session_id: &str) -> Span {
    info_span!("hook", kind = %kind, session_id = %session_id)
}

/// Span covering a maintenance command (flush, cleanup, report).
pub fn command_span(name: &str) -> Span {
    info_span!("command", name = %name)
}

/// Timing utility for operations.
pub struct Timer {
    start: Instant,
    operation: &'static str,
}

impl Timer {
    /// Start a new timer.
    pub fn start(operation: &'static str) -> Self {
        Self {
            start: Instant::now(),
            operation,
        }
    }

    /// Complete the timer and record duration.
    pub fn finish(self) -> Duration {
        let duration = self.start.elapsed();
        tracing::debug!(
            operation = %self.operation,
            duration_ms = duration.as_secs_f64() * 1000.0,
            "operation completed"
        );
        duration
    }
}

/// Macro for timing a block of code.
#[macro_export]
macro_rules! timed {
    ($name:expr, $body:expr) => {{
        let _timer = $crate::spans::Timer::start($name);
        let result = $body;
        _timer.finish();
        result
    }};
}

#[cfg(test)]
mod tests {
    use super::*;
    use tracing_subscriber::EnvFilter;

    fn with_subscriber<F>(f: F)
    where
        F: FnOnce(),
    {
        let subscriber = tracing_subscriber::fmt()
            .with_test_writer()
            .with_env_filter(EnvFilter::new("trace"))
            .finish();

        tracing::subscriber::with_default(subscriber, f);
    }

    #[test]
    fn test_hook_span_nesting() {
        with_subscriber(|| {
            let hook = hook_span("pre-tool-use", "s1");
            let _outer = hook.enter();
            let cmd = command_span("flush");
            let _inner = cmd.enter();
            tracing::info!("nested");
            assert!(!Span::current().is_disabled());
        });
    }

    #[test]
    fn test_timer_measures_elapsed() {
        let timer = Timer::start("sleep");
        std::thread::sleep(Duration::from_millis(5));
        assert!(timer.finish() >= Duration::from_millis(5));
    }

    #[test]
    fn test_timed_macro_returns_value() {
        with_subscriber(|| {
            let result = crate::timed!("macro_test", { 21 * 2 });
            assert_eq!(result, 42);
        });
    }
}
