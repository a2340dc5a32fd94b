//! Editor configuration.
//!
//! [`EditorConfig`] can be built in code or loaded from JSON; missing fields
//! fall back to the defaults below.

use crate::error::ConfigError;
use log::warn;
use serde::{Deserialize, Serialize};

/// Default maximum vertical distance between two nodes for them to count as
/// being on the same level.
pub const DEFAULT_LEVEL_TOLERANCE: f32 = 15.0;

/// Default delay before the post-commit highlight is cleared.
pub const DEFAULT_RESET_DELAY_MS: u64 = 1000;

/// How edges are judged to lie on a computed path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PathMembership {
    /// Both endpoints are members of the path's node set (legacy behavior).
    #[default]
    NodeSet,
    /// The endpoints are consecutive nodes of the path.
    Adjacent,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EditorConfig {
    /// Maximum |Δy| between flow endpoints. `None` disables the check.
    pub level_tolerance: Option<f32>,

    /// Delay before provisional highlighting is cleared after a flow commits.
    pub reset_delay_ms: u64,

    /// Edge membership rule used when highlighting a path.
    pub path_membership: PathMembership,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            level_tolerance: Some(DEFAULT_LEVEL_TOLERANCE),
            reset_delay_ms: DEFAULT_RESET_DELAY_MS,
            path_membership: PathMembership::NodeSet,
        }
    }
}

impl EditorConfig {
    /// Parse a configuration from JSON and validate it.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(tolerance) = self.level_tolerance {
            if !tolerance.is_finite() || tolerance < 0.0 {
                return Err(ConfigError::InvalidLevelTolerance(tolerance));
            }
        }
        Ok(())
    }

    /// Replace an invalid level tolerance with the default.
    ///
    /// Configs built in code skip [`from_json`](Self::from_json); a negative or
    /// non-finite tolerance would otherwise reject every connection.
    pub fn sanitized(self) -> Self {
        match self.validate() {
            Ok(()) => self,
            Err(err) => {
                warn!("config: {}; using {}", err, DEFAULT_LEVEL_TOLERANCE);
                Self {
                    level_tolerance: Some(DEFAULT_LEVEL_TOLERANCE),
                    ..self
                }
            }
        }
    }

    pub fn reset_delay(&self) -> std::time::Duration {
        std::time::Duration::from_millis(self.reset_delay_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = EditorConfig::default();
        assert_eq!(config.level_tolerance, Some(15.0));
        assert_eq!(config.reset_delay_ms, 1000);
        assert_eq!(config.path_membership, PathMembership::NodeSet);
    }

    #[test]
    fn test_from_json_partial_uses_defaults() {
        let config = EditorConfig::from_json(r#"{"path_membership":"adjacent"}"#).unwrap();
        assert_eq!(config.path_membership, PathMembership::Adjacent);
        assert_eq!(config.level_tolerance, Some(15.0));
    }

    #[test]
    fn test_from_json_null_tolerance_disables_check() {
        let config = EditorConfig::from_json(r#"{"level_tolerance":null}"#).unwrap();
        assert_eq!(config.level_tolerance, None);
    }

    #[test]
    fn test_from_json_rejects_negative_tolerance() {
        let err = EditorConfig::from_json(r#"{"level_tolerance":-1.0}"#).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidLevelTolerance(_)));
    }

    #[test]
    fn test_from_json_rejects_garbage() {
        assert!(matches!(
            EditorConfig::from_json("not json"),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn test_sanitized_replaces_invalid_tolerance() {
        let config = EditorConfig {
            level_tolerance: Some(f32::NAN),
            reset_delay_ms: 250,
            ..EditorConfig::default()
        }
        .sanitized();

        assert_eq!(config.level_tolerance, Some(DEFAULT_LEVEL_TOLERANCE));
        assert_eq!(config.reset_delay_ms, 250);
    }

    #[test]
    fn test_sanitized_keeps_valid_config() {
        let config = EditorConfig {
            level_tolerance: None,
            ..EditorConfig::default()
        };
        assert_eq!(config.clone().sanitized(), config);
    }

    #[test]
    fn test_reset_delay() {
        assert_eq!(
            EditorConfig::default().reset_delay(),
            std::time::Duration::from_secs(1)
        );
    }
}
