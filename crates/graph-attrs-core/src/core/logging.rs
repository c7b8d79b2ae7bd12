//! Logging utilities
//!
//! Thin macros over the `tracing` crate so call sites across the store and
//! the formula subsystem log through one place. The macros resolve `tracing`
//! through this crate, so downstream users do not need their own dependency.

/// Logging macros with a clean API
pub mod logging {

    /// Info level logging - general information messages
    #[macro_export]
    macro_rules! log_info {
        ($($arg:tt)*) => {{
            $crate::tracing::info!($($arg)*);
        }};
    }

    /// Warning level logging - potentially problematic situations
    #[macro_export]
    macro_rules! log_warn {
        ($($arg:tt)*) => {{
            $crate::tracing::warn!($($arg)*);
        }};
    }

    /// Error level logging - error conditions
    #[macro_export]
    macro_rules! log_error {
        ($($arg:tt)*) => {{
            $crate::tracing::error!($($arg)*);
        }};
    }

    /// Debug level logging - detailed information for debugging
    #[macro_export]
    macro_rules! log_debug {
        ($($arg:tt)*) => {{
            $crate::tracing::debug!($($arg)*);
        }};
    }

    /// Trace level logging - per-step evaluation detail
    #[macro_export]
    macro_rules! log_trace {
        ($($arg:tt)*) => {{
            $crate::tracing::trace!($($arg)*);
        }};
    }
}
