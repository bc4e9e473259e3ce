//! Component-scoped logging on top of the `log` facade.
//!
//! The library never installs a logger itself; the host picks the backend
//! and every record carries the component name as its target.

use std::fmt::Display;

/// Log a debug message for a component
#[macro_export]
macro_rules! log_debug {
    ($component:expr, $($arg:tt)*) => {
        $crate::__log::debug!(target: $component, $($arg)*)
    };
}

/// Log a warning message for a component
#[macro_export]
macro_rules! log_warn {
    ($component:expr, $($arg:tt)*) => {
        $crate::__log::warn!(target: $component, $($arg)*)
    };
}

/// Logger struct for scoped logging
#[derive(Debug, Clone)]
pub struct Logger {
    component: &'static str,
}

impl Logger {
    /// Create a new logger for a specific component
    pub const fn new(component: &'static str) -> Self {
        Self { component }
    }

    pub fn component(&self) -> &'static str {
        self.component
    }

    pub fn debug(&self, message: impl Display) {
        log::debug!(target: self.component, "{}", message);
    }

    pub fn info(&self, message: impl Display) {
        log::info!(target: self.component, "{}", message);
    }

    pub fn warn(&self, message: impl Display) {
        log::warn!(target: self.component, "{}", message);
    }

    /// Log an error with additional context
    pub fn error_with_context(&self, message: impl Display, error: &dyn std::error::Error) {
        log::error!(target: self.component, "{}: {}", message, error);
    }

    /// Time an operation; the elapsed milliseconds are logged at debug level.
    pub fn time<F, R>(&self, operation: &str, f: F) -> R
    where
        F: FnOnce() -> R,
    {
        let start = std::time::Instant::now();
        let result = f();
        let duration = start.elapsed();

        log::debug!(
            target: self.component,
            "{} completed in {:.2}ms",
            operation,
            duration.as_secs_f64() * 1000.0
        );

        result
    }
}
