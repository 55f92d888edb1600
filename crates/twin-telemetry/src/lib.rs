//! # Twin Telemetry
//!
//! Logging bootstrap for the device twin crates.
//!
//! The twin core only emits `tracing` events; nothing is printed until the
//! application installs a subscriber. This crate installs one from
//! environment configuration.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use twin_telemetry::{init_logging, TelemetryConfig};
//!
//! fn main() {
//!     let config = TelemetryConfig::from_env();
//!     init_logging(&config).expect("Failed to init logging");
//! }
//! ```
//!
//! ## Environment Variables
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `OTEL_SERVICE_NAME` | `device-twin` | Service name on the startup event |
//! | `TWIN_LOG_LEVEL` / `RUST_LOG` | `info` | Log level filter |
//! | `TWIN_CONSOLE_OUTPUT` | `true` | Write events to stdout |
//! | `TWIN_JSON_LOGS` | `false` | JSON formatted events |

mod config;

pub use config::{TelemetryConfig, DEFAULT_LOG_LEVEL, DEFAULT_SERVICE_NAME};

#[doc(hidden)]
pub use tracing;

use thiserror::Error;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Telemetry initialization errors
#[derive(Error, Debug)]
pub enum TelemetryError {
    #[error("Invalid log filter {filter:?}: {reason}")]
    Filter { filter: String, reason: String },

    #[error("Failed to install subscriber: {0}")]
    Init(String),
}

/// Parse the configured level into an `EnvFilter`.
pub fn build_filter(config: &TelemetryConfig) -> Result<EnvFilter, TelemetryError> {
    EnvFilter::try_new(&config.log_level).map_err(|e| TelemetryError::Filter {
        filter: config.log_level.clone(),
        reason: e.to_string(),
    })
}

/// Install the global subscriber.
///
/// Fails if the filter does not parse or a global subscriber is already set.
pub fn init_logging(config: &TelemetryConfig) -> Result<(), TelemetryError> {
    let env_filter = build_filter(config)?;

    if !config.console_output {
        tracing_subscriber::registry()
            .with(env_filter)
            .try_init()
            .map_err(|e| TelemetryError::Init(e.to_string()))?;
    } else if config.json_logs {
        let json_layer = tracing_subscriber::fmt::layer()
            .json()
            .with_target(true)
            .with_thread_ids(true)
            .with_file(true)
            .with_line_number(true);

        tracing_subscriber::registry()
            .with(env_filter)
            .with(json_layer)
            .try_init()
            .map_err(|e| TelemetryError::Init(e.to_string()))?;
    } else {
        let fmt_layer = tracing_subscriber::fmt::layer()
            .with_target(true)
            .with_thread_ids(false)
            .with_file(false)
            .with_line_number(false)
            .with_ansi(true);

        tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt_layer)
            .try_init()
            .map_err(|e| TelemetryError::Init(e.to_string()))?;
    }

    tracing::info!(
        service = %config.service_name,
        level = %config.log_level,
        json = config.json_logs,
        "Logging initialized"
    );
    Ok(())
}

/// Log an event about one twin section with a consistent `section` field.
///
/// Expands through this crate's `tracing` re-export, so callers need no
/// `tracing` dependency of their own.
///
/// # Example
///
/// ```rust,ignore
/// log_twin_event!(debug, ChangeKind::Desired, "merged update", keys = 3);
/// ```
#[macro_export]
macro_rules! log_twin_event {
    ($level:ident, $section:expr, $msg:expr $(, $($field:tt)*)?) => {
        $crate::tracing::$level!(
            section = %$section,
            $($($field)*,)?
            $msg
        )
    };
}
