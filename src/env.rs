//! Environment variable names read by [`crate::config::LoggerOptions::from_env`].
//!
//! These are purely helpers for services that configure logging from the
//! environment instead of a settings file.

/// Environment name stamped on every entry, e.g. `Production`.
pub const LUMBERJACK_ENVIRONMENT_NAME_ENV: &str = "LUMBERJACK_ENVIRONMENT_NAME";

/// Directory the channel files are written to.
pub const LUMBERJACK_LOG_LOCATION_ENV: &str = "LUMBERJACK_LOG_LOCATION";

/// `true` to write diagnostic entries.
pub const LUMBERJACK_ENABLE_DIAGNOSTICS_ENV: &str = "LUMBERJACK_ENABLE_DIAGNOSTICS";

/// Optional event collector base URL.
pub const LUMBERJACK_EVENT_COLLECTOR_ENV: &str = "LUMBERJACK_EVENT_COLLECTOR";

/// Event collector token, required with the URL.
pub const LUMBERJACK_EVENT_COLLECTOR_TOKEN_ENV: &str = "LUMBERJACK_EVENT_COLLECTOR_TOKEN";

/// `true` to copy identity claims into the context.
pub const LUMBERJACK_ADD_CLAIMS_ENV: &str = "LUMBERJACK_ADD_CLAIMS";

/// `true` to copy session keys into the context.
pub const LUMBERJACK_ADD_SESSION_ENV: &str = "LUMBERJACK_ADD_SESSION";

/// Product name override.
pub const LUMBERJACK_PRODUCT_ENV: &str = "LUMBERJACK_PRODUCT";

/// Read an environment variable or fall back to a provided default.
pub fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}
