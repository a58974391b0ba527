use crate::env::{
    env_or, LUMBERJACK_ADD_CLAIMS_ENV, LUMBERJACK_ADD_SESSION_ENV, LUMBERJACK_ENABLE_DIAGNOSTICS_ENV,
    LUMBERJACK_ENVIRONMENT_NAME_ENV, LUMBERJACK_EVENT_COLLECTOR_ENV,
    LUMBERJACK_EVENT_COLLECTOR_TOKEN_ENV, LUMBERJACK_LOG_LOCATION_ENV, LUMBERJACK_PRODUCT_ENV,
};
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Settings section read by [`LoggerOptions::from_json_str`] by default.
pub const DEFAULT_SECTION: &str = "BITS.Logger";

/// Logging configuration, as found in a service's settings document.
///
/// Field names are PascalCase to match existing settings files:
///
/// ```json
/// { "BITS.Logger": { "EnvironmentName": "Prod", "LogLocation": "/var/log/orders",
///                    "EnableDiagnostics": false, "AddClaims": true } }
/// ```
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(rename_all = "PascalCase")]
pub struct LoggerOptions {
    #[serde(default)]
    pub environment_name: String,
    #[serde(default)]
    pub log_location: PathBuf,
    #[serde(default)]
    pub enable_diagnostics: bool,
    /// Base URL of the HTTP event collector. When set, channels are
    /// written there instead of to local files.
    #[serde(default)]
    pub event_collector: Option<String>,
    #[serde(default)]
    pub event_collector_token: Option<String>,
    #[serde(default)]
    pub add_claims: bool,
    #[serde(default)]
    pub add_session: bool,
    /// Product name stamped on every entry.
    #[serde(default = "default_product")]
    pub product: String,
}

fn default_product() -> String {
    env!("CARGO_PKG_NAME").to_string()
}

impl Default for LoggerOptions {
    fn default() -> Self {
        Self {
            environment_name: String::new(),
            log_location: PathBuf::new(),
            enable_diagnostics: false,
            event_collector: None,
            event_collector_token: None,
            add_claims: false,
            add_session: false,
            product: default_product(),
        }
    }
}

/// Error raised when logging configuration is missing or invalid.
///
/// Always fatal: the logger cannot be constructed without valid options.
#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    #[error("configuration section `{0}` not found")]
    MissingSection(String),

    #[error("failed to read configuration: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse configuration: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("invalid `{field}`: {reason}")]
    Invalid { field: &'static str, reason: String },
}

impl LoggerOptions {
    /// Parse the [`DEFAULT_SECTION`] of a JSON settings document.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        Self::from_json_section(json, DEFAULT_SECTION)
    }

    /// Parse a named top-level section of a JSON settings document and
    /// validate it.
    pub fn from_json_section(json: &str, section: &str) -> Result<Self, ConfigError> {
        let mut root: serde_json::Value = serde_json::from_str(json)?;
        let value = root
            .get_mut(section)
            .map(serde_json::Value::take)
            .ok_or_else(|| ConfigError::MissingSection(section.to_string()))?;
        let options: LoggerOptions = serde_json::from_value(value)?;
        options.validate()?;
        Ok(options)
    }

    /// Read and parse a JSON settings file.
    pub fn load_json_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json_str(&content)
    }

    /// Build options from `LUMBERJACK_*` environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        let optional = |key: &str| std::env::var(key).ok().filter(|v| !v.is_empty());
        let options = LoggerOptions {
            environment_name: env_or(LUMBERJACK_ENVIRONMENT_NAME_ENV, ""),
            log_location: PathBuf::from(env_or(LUMBERJACK_LOG_LOCATION_ENV, "")),
            enable_diagnostics: parse_flag(LUMBERJACK_ENABLE_DIAGNOSTICS_ENV)?,
            event_collector: optional(LUMBERJACK_EVENT_COLLECTOR_ENV),
            event_collector_token: optional(LUMBERJACK_EVENT_COLLECTOR_TOKEN_ENV),
            add_claims: parse_flag(LUMBERJACK_ADD_CLAIMS_ENV)?,
            add_session: parse_flag(LUMBERJACK_ADD_SESSION_ENV)?,
            product: env_or(LUMBERJACK_PRODUCT_ENV, env!("CARGO_PKG_NAME")),
        };
        options.validate()?;
        Ok(options)
    }

    /// Check the options are usable for building channel sinks.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.log_location.as_os_str().is_empty() {
            return Err(ConfigError::Invalid {
                field: "LogLocation",
                reason: "must not be empty".to_string(),
            });
        }

        if let Some(address) = &self.event_collector {
            let parsed = url::Url::parse(address).map_err(|e| ConfigError::Invalid {
                field: "EventCollector",
                reason: e.to_string(),
            })?;
            if !matches!(parsed.scheme(), "http" | "https") {
                return Err(ConfigError::Invalid {
                    field: "EventCollector",
                    reason: format!("unsupported scheme `{}`", parsed.scheme()),
                });
            }
            if self.event_collector_token.as_deref().map_or(true, str::is_empty) {
                return Err(ConfigError::Invalid {
                    field: "EventCollectorToken",
                    reason: "required when EventCollector is set".to_string(),
                });
            }
        }

        Ok(())
    }
}

fn parse_flag(key: &str) -> Result<bool, ConfigError> {
    match env_or(key, "false").to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" => Ok(true),
        "0" | "false" | "no" | "" => Ok(false),
        other => Err(ConfigError::Invalid {
            field: "flag",
            reason: format!("{} has non-boolean value `{}`", key, other),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_default_section() {
        let json = r#"{
            "Logging": { "LogLevel": "Information" },
            "BITS.Logger": {
                "EnvironmentName": "Prod",
                "LogLocation": "/var/log/orders",
                "EnableDiagnostics": true,
                "AddClaims": true
            }
        }"#;
        let options = LoggerOptions::from_json_str(json).unwrap();
        assert_eq!(options.environment_name, "Prod");
        assert_eq!(options.log_location, PathBuf::from("/var/log/orders"));
        assert!(options.enable_diagnostics);
        assert!(options.add_claims);
        assert!(!options.add_session);
        assert_eq!(options.event_collector, None);
        assert_eq!(options.product, "lumberjack");
    }

    #[test]
    fn missing_section_is_fatal() {
        let err = LoggerOptions::from_json_str(r#"{ "Other": {} }"#).unwrap_err();
        assert!(matches!(err, ConfigError::MissingSection(s) if s == "BITS.Logger"));
    }

    #[test]
    fn empty_log_location_is_rejected() {
        let err = LoggerOptions::from_json_str(r#"{ "BITS.Logger": { "EnvironmentName": "Dev" } }"#)
            .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { field: "LogLocation", .. }));
    }

    #[test]
    fn malformed_json_is_a_parse_error() {
        let err = LoggerOptions::from_json_str("{ not json").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn collector_requires_url_and_token() {
        let base = LoggerOptions {
            log_location: PathBuf::from("logs"),
            ..Default::default()
        };

        let bad_url = LoggerOptions {
            event_collector: Some("not a url".to_string()),
            event_collector_token: Some("t".to_string()),
            ..base.clone()
        };
        assert!(matches!(
            bad_url.validate(),
            Err(ConfigError::Invalid { field: "EventCollector", .. })
        ));

        let bad_scheme = LoggerOptions {
            event_collector: Some("ftp://collector".to_string()),
            event_collector_token: Some("t".to_string()),
            ..base.clone()
        };
        assert!(bad_scheme.validate().is_err());

        let no_token = LoggerOptions {
            event_collector: Some("https://collector:8088".to_string()),
            ..base.clone()
        };
        assert!(matches!(
            no_token.validate(),
            Err(ConfigError::Invalid { field: "EventCollectorToken", .. })
        ));

        let ok = LoggerOptions {
            event_collector: Some("https://collector:8088".to_string()),
            event_collector_token: Some("t".to_string()),
            ..base
        };
        assert!(ok.validate().is_ok());
    }

    #[test]
    fn reads_environment_variables() {
        std::env::set_var(LUMBERJACK_LOG_LOCATION_ENV, "/tmp/lumberjack-env-test");
        std::env::set_var(LUMBERJACK_ENVIRONMENT_NAME_ENV, "Staging");
        std::env::set_var(LUMBERJACK_ENABLE_DIAGNOSTICS_ENV, "TRUE");
        std::env::set_var(LUMBERJACK_ADD_CLAIMS_ENV, "maybe");
        assert!(matches!(
            LoggerOptions::from_env(),
            Err(ConfigError::Invalid { field: "flag", .. })
        ));

        std::env::set_var(LUMBERJACK_ADD_CLAIMS_ENV, "1");
        let options = LoggerOptions::from_env().unwrap();
        assert_eq!(options.environment_name, "Staging");
        assert_eq!(options.log_location, PathBuf::from("/tmp/lumberjack-env-test"));
        assert!(options.enable_diagnostics);
        assert!(options.add_claims);
        assert!(!options.add_session);

        for key in [
            LUMBERJACK_LOG_LOCATION_ENV,
            LUMBERJACK_ENVIRONMENT_NAME_ENV,
            LUMBERJACK_ENABLE_DIAGNOSTICS_ENV,
            LUMBERJACK_ADD_CLAIMS_ENV,
        ] {
            std::env::remove_var(key);
        }
    }
}
