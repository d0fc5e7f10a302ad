//! Configuration file parsing for `tessera.toml`.
//!
//! ```toml
//! [planner]
//! id_field = "id"
//! log_operations = true
//!
//! [collation]
//! default = "sensitive"
//!
//! [collation.overrides]
//! "email" = "insensitive"
//!
//! [environments.test.planner]
//! log_operations = false
//! ```
//!
//! Values of the form `${VAR_NAME}` are replaced with environment variables
//! before parsing; unknown variables are left as written.

use std::collections::HashMap;
use std::path::Path;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::collation::Collation;
use crate::error::QueryError;
use crate::planner::PlannerConfig;

/// Result type for configuration loading.
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Errors raised while loading configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// The file could not be read.
    #[error("failed to read config file {path}: {source}")]
    Io {
        /// Path of the file.
        path: String,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The file is not valid TOML for this schema.
    #[error("invalid config: {source}")]
    Toml {
        /// Underlying parse error.
        #[from]
        source: toml::de::Error,
    },

    /// The environment variable pattern failed to compile.
    #[error("invalid interpolation pattern: {0}")]
    Pattern(String),

    /// The requested environment is not declared.
    #[error("unknown environment: {0}")]
    UnknownEnvironment(String),
}

impl From<ConfigError> for QueryError {
    fn from(err: ConfigError) -> Self {
        QueryError::configuration(err.to_string()).with_source(err)
    }
}

/// Main configuration structure for `tessera.toml`.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct TesseraConfig {
    /// Planner settings.
    #[serde(default)]
    pub planner: PlannerSettings,

    /// Collation defaults.
    #[serde(default)]
    pub collation: CollationSettings,

    /// Environment-specific overrides.
    #[serde(default)]
    pub environments: HashMap<String, EnvironmentOverride>,
}

impl TesseraConfig {
    /// Load configuration from a file path.
    pub fn from_file(path: impl AsRef<Path>) -> ConfigResult<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.display().to_string(),
            source: e,
        })?;

        Self::parse(&content)
    }

    /// Parse configuration from a TOML string.
    pub fn parse(content: &str) -> ConfigResult<Self> {
        let expanded = expand_env_vars(content)?;
        Ok(toml::from_str(&expanded)?)
    }

    /// Apply environment-specific overrides.
    pub fn with_environment(mut self, env: &str) -> ConfigResult<Self> {
        let overrides = self
            .environments
            .remove(env)
            .ok_or_else(|| ConfigError::UnknownEnvironment(env.to_string()))?;

        if let Some(planner) = overrides.planner {
            if let Some(id_field) = planner.id_field {
                self.planner.id_field = id_field;
            }
            if let Some(log_operations) = planner.log_operations {
                self.planner.log_operations = log_operations;
            }
        }
        if let Some(collation) = overrides.collation {
            if collation.default.is_some() {
                self.collation.default = collation.default;
            }
            self.collation.overrides.extend(collation.overrides);
        }
        Ok(self)
    }

    /// Build the planner configuration.
    pub fn planner_config(&self) -> PlannerConfig {
        PlannerConfig::new()
            .id_field(self.planner.id_field.as_str())
            .log_operations(self.planner.log_operations)
            .collation(self.collation.clone())
    }
}

/// `[planner]` section.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct PlannerSettings {
    /// Field holding record ids.
    #[serde(default = "default_id_field")]
    pub id_field: String,

    /// Log every executed operation at info level.
    #[serde(default)]
    pub log_operations: bool,
}

impl Default for PlannerSettings {
    fn default() -> Self {
        Self {
            id_field: default_id_field(),
            log_operations: false,
        }
    }
}

fn default_id_field() -> String {
    "id".to_string()
}

/// `[collation]` section.
///
/// Paths without an override and without a configured default fall back to
/// what the driver reports.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct CollationSettings {
    /// Collation for every path without an override.
    #[serde(default)]
    pub default: Option<Collation>,

    /// Per-path overrides keyed by dotted path.
    #[serde(default)]
    pub overrides: IndexMap<String, Collation>,
}

impl CollationSettings {
    /// The configured collation for a path, if any.
    pub fn lookup(&self, path: &str) -> Option<Collation> {
        self.overrides.get(path).copied().or(self.default)
    }

    /// Add an override.
    pub fn with_override(mut self, path: impl Into<String>, collation: Collation) -> Self {
        self.overrides.insert(path.into(), collation);
        self
    }
}

/// Environment-specific configuration overrides.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct EnvironmentOverride {
    /// Planner overrides.
    pub planner: Option<PlannerOverride>,

    /// Collation overrides; `default` replaces, `overrides` are merged.
    pub collation: Option<CollationSettings>,
}

/// Planner configuration overrides.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct PlannerOverride {
    /// Override id_field.
    pub id_field: Option<String>,

    /// Override log_operations.
    pub log_operations: Option<bool>,
}

/// Expand environment variables in the format `${VAR_NAME}`.
fn expand_env_vars(content: &str) -> ConfigResult<String> {
    let re = regex_lite::Regex::new(r"\$\{([^}]+)\}")
        .map_err(|e| ConfigError::Pattern(e.to_string()))?;

    let mut result = content.to_string();
    for cap in re.captures_iter(content) {
        let var_name = &cap[1];
        let full_match = &cap[0];

        if let Ok(value) = std::env::var(var_name) {
            result = result.replace(full_match, &value);
        }
    }

    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;

    #[test]
    fn test_default_config() {
        let config = TesseraConfig::default();
        assert_eq!(config.planner.id_field, "id");
        assert!(!config.planner.log_operations);
        assert_eq!(config.collation.lookup("name"), None);
    }

    #[test]
    fn test_parse_collation_section() {
        let toml = r#"
            [collation]
            default = "insensitive"

            [collation.overrides]
            "code" = "sensitive"
        "#;

        let config = TesseraConfig::parse(toml).unwrap();
        assert_eq!(config.collation.lookup("name"), Some(Collation::CaseInsensitive));
        assert_eq!(config.collation.lookup("code"), Some(Collation::CaseSensitive));
    }

    #[test]
    fn test_unknown_fields_rejected() {
        let err = TesseraConfig::parse("[planner]\nid = \"_id\"\n").unwrap_err();
        assert!(matches!(err, ConfigError::Toml { .. }));

        let err: QueryError = err.into();
        assert_eq!(err.code, ErrorCode::InvalidConfiguration);
    }

    #[test]
    fn test_environment_override() {
        let toml = r#"
            [planner]
            id_field = "id"

            [environments.mongo.planner]
            id_field = "_id"
            log_operations = true

            [environments.mongo.collation.overrides]
            "email" = "insensitive"
        "#;

        let config = TesseraConfig::parse(toml)
            .unwrap()
            .with_environment("mongo")
            .unwrap();
        assert_eq!(config.planner.id_field, "_id");
        assert!(config.planner.log_operations);
        assert_eq!(config.collation.lookup("email"), Some(Collation::CaseInsensitive));

        let err = TesseraConfig::default().with_environment("prod").unwrap_err();
        assert!(matches!(err, ConfigError::UnknownEnvironment(_)));
    }

    #[test]
    fn test_env_var_expansion() {
        // SAFETY: This test uses a variable name no other test touches.
        unsafe {
            std::env::set_var("TESSERA_TEST_ID_FIELD", "uid");
        }
        let expanded = expand_env_vars("id_field = \"${TESSERA_TEST_ID_FIELD}\"").unwrap();
        assert_eq!(expanded, "id_field = \"uid\"");
        let untouched = expand_env_vars("x = \"${TESSERA_TEST_UNDEFINED_VAR}\"").unwrap();
        assert_eq!(untouched, "x = \"${TESSERA_TEST_UNDEFINED_VAR}\"");
        unsafe {
            std::env::remove_var("TESSERA_TEST_ID_FIELD");
        }
    }
}
