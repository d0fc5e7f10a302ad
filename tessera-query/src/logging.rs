//! Logging setup for Tessera.
//!
//! The library itself only emits `tracing` events. Applications install a
//! subscriber of their own or call [`init`] (behind the `tracing-subscriber`
//! feature), which is driven by environment variables:
//!
//! - `TESSERA_DEBUG=true|1|yes` - Enable debug logging
//! - `TESSERA_LOG_LEVEL=trace|debug|info|warn|error` - Set a specific level
//! - `TESSERA_LOG_FORMAT=json|pretty|compact` - Output format (default: json)
//!
//! ```rust,no_run
//! use tessera_query::logging;
//!
//! // Call once at startup
//! logging::init();
//! ```
//!
//! Planner operations are logged at `debug`, or at `info` when
//! `log_operations` is enabled in the planner configuration. Per-document
//! filter decisions are logged at `trace`.

use std::env;
use std::sync::Once;

static INIT: Once = Once::new();

const DEBUG_VAR: &str = "TESSERA_DEBUG";
const LEVEL_VAR: &str = "TESSERA_LOG_LEVEL";
const FORMAT_VAR: &str = "TESSERA_LOG_FORMAT";

/// Output format of the installed subscriber.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    /// One JSON object per event.
    Json,
    /// Multi-line human readable output.
    Pretty,
    /// Single-line human readable output.
    Compact,
}

impl LogFormat {
    fn parse(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "pretty" => Self::Pretty,
            "compact" => Self::Compact,
            _ => Self::Json,
        }
    }

    /// Format name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Json => "json",
            Self::Pretty => "pretty",
            Self::Compact => "compact",
        }
    }
}

fn parse_level(s: &str) -> Option<&'static str> {
    match s.to_lowercase().as_str() {
        "trace" => Some("trace"),
        "debug" => Some("debug"),
        "info" => Some("info"),
        "warn" => Some("warn"),
        "error" => Some("error"),
        _ => None,
    }
}

/// Check if debug logging is enabled via `TESSERA_DEBUG`.
#[inline]
pub fn is_debug_enabled() -> bool {
    env::var(DEBUG_VAR)
        .map(|v| matches!(v.to_lowercase().as_str(), "true" | "1" | "yes"))
        .unwrap_or(false)
}

/// The configured log level.
///
/// `TESSERA_LOG_LEVEL` wins when it names a valid level; otherwise the
/// level is "debug" with `TESSERA_DEBUG` set and "warn" without.
pub fn log_level() -> &'static str {
    env::var(LEVEL_VAR)
        .ok()
        .and_then(|l| parse_level(&l))
        .unwrap_or(if is_debug_enabled() { "debug" } else { "warn" })
}

/// The configured output format.
pub fn log_format() -> LogFormat {
    env::var(FORMAT_VAR)
        .map(|f| LogFormat::parse(&f))
        .unwrap_or(LogFormat::Json)
}

/// Directive string for the crates of this workspace at one level.
pub fn filter_directive(level: &str) -> String {
    ["tessera", "tessera_query", "tessera_memory"]
        .iter()
        .map(|krate| format!("{}={}", krate, level))
        .collect::<Vec<_>>()
        .join(",")
}

/// Install the global subscriber once.
///
/// Does nothing unless `TESSERA_DEBUG` or `TESSERA_LOG_LEVEL` is set, or
/// when the `tracing-subscriber` feature is off.
pub fn init() {
    INIT.call_once(|| {
        if !is_debug_enabled() && env::var(LEVEL_VAR).is_err() {
            return;
        }

        #[cfg(feature = "tracing-subscriber")]
        {
            use tracing_subscriber::{EnvFilter, fmt, prelude::*};

            let level = log_level();
            let filter = EnvFilter::try_new(filter_directive(level))
                .unwrap_or_else(|_| EnvFilter::new("warn"));
            let registry = tracing_subscriber::registry().with(filter);

            // A subscriber installed by the host application takes precedence.
            let installed = match log_format() {
                LogFormat::Json => registry.with(fmt::layer().json()).try_init(),
                LogFormat::Compact => registry.with(fmt::layer().compact()).try_init(),
                LogFormat::Pretty => registry.with(fmt::layer().pretty()).try_init(),
            };

            if installed.is_ok() {
                tracing::info!(level, format = log_format().as_str(), "tessera logging initialized");
            }
        }
    });
}

/// Debug-level event emitted only when `TESSERA_DEBUG` is enabled.
#[macro_export]
macro_rules! tessera_debug {
    ($($arg:tt)*) => {
        if $crate::logging::is_debug_enabled() {
            ::tracing::debug!($($arg)*);
        }
    };
}

/// Trace-level event emitted only when `TESSERA_DEBUG` is enabled.
#[macro_export]
macro_rules! tessera_trace {
    ($($arg:tt)*) => {
        if $crate::logging::is_debug_enabled() {
            ::tracing::trace!($($arg)*);
        }
    };
}
