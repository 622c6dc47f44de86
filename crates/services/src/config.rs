use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::{ConfigError, TrainingError};

pub const DEFAULT_SESSION_LENGTH: u32 = 15;
pub const MAX_SESSION_LENGTH: u32 = 200;
pub const RECENT_SESSIONS_LIMIT: usize = 10;

const ENV_DEFAULT_LENGTH: &str = "VOCAB_DEFAULT_SESSION_LENGTH";
const ENV_MAX_LENGTH: &str = "VOCAB_MAX_SESSION_LENGTH";
const ENV_RECENT_SESSIONS: &str = "VOCAB_RECENT_SESSIONS";

/// Tunables for session sizing and statistics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrainingConfig {
    default_session_length: u32,
    max_session_length: u32,
    recent_sessions_limit: usize,
}

impl Default for TrainingConfig {
    fn default() -> Self {
        Self {
            default_session_length: DEFAULT_SESSION_LENGTH,
            max_session_length: MAX_SESSION_LENGTH,
            recent_sessions_limit: RECENT_SESSIONS_LIMIT,
        }
    }
}

impl TrainingConfig {
    /// # Errors
    ///
    /// Returns `ConfigError` if the default length is zero or above the maximum,
    /// or if the recent sessions limit is zero.
    pub fn new(
        default_session_length: u32,
        max_session_length: u32,
        recent_sessions_limit: usize,
    ) -> Result<Self, ConfigError> {
        if default_session_length == 0 {
            return Err(ConfigError::ZeroDefaultLength);
        }
        if default_session_length > max_session_length {
            return Err(ConfigError::DefaultExceedsMax {
                default: default_session_length,
                max: max_session_length,
            });
        }
        if recent_sessions_limit == 0 {
            return Err(ConfigError::ZeroRecentLimit);
        }
        Ok(Self {
            default_session_length,
            max_session_length,
            recent_sessions_limit,
        })
    }

    /// Read overrides from `VOCAB_*` environment variables.
    ///
    /// Unparseable values and invalid combinations are logged and replaced by defaults.
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`TrainingConfig::from_env`], reading values through `lookup`.
    #[must_use]
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        let default_length = parse_var(&lookup, ENV_DEFAULT_LENGTH, defaults.default_session_length);
        let max_length = parse_var(&lookup, ENV_MAX_LENGTH, defaults.max_session_length);
        let recent = parse_var(&lookup, ENV_RECENT_SESSIONS, defaults.recent_sessions_limit);

        Self::new(default_length, max_length, recent).unwrap_or_else(|err| {
            warn!(error = %err, "ignoring training config overrides");
            defaults
        })
    }

    #[must_use]
    pub fn default_session_length(&self) -> u32 {
        self.default_session_length
    }

    #[must_use]
    pub fn max_session_length(&self) -> u32 {
        self.max_session_length
    }

    #[must_use]
    pub fn recent_sessions_limit(&self) -> usize {
        self.recent_sessions_limit
    }

    /// Resolve a requested session length, falling back to the default.
    ///
    /// # Errors
    ///
    /// Returns `TrainingError::InvalidArgument` for zero or above the maximum.
    pub fn resolve_length(&self, requested: Option<u32>) -> Result<u32, TrainingError> {
        let length = requested.unwrap_or(self.default_session_length);
        if length == 0 || length > self.max_session_length {
            return Err(TrainingError::InvalidArgument(format!(
                "session length must be between 1 and {}, got {length}",
                self.max_session_length
            )));
        }
        Ok(length)
    }
}

fn parse_var<T>(lookup: &impl Fn(&str) -> Option<String>, key: &str, fallback: T) -> T
where
    T: std::str::FromStr + Copy,
{
    let Some(raw) = lookup(key) else {
        return fallback;
    };
    if let Ok(value) = raw.trim().parse() {
        value
    } else {
        warn!(key, value = %raw, "unparseable config value; using default");
        fallback
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_match_documented_values() {
        let config = TrainingConfig::default();
        assert_eq!(config.default_session_length(), 15);
        assert_eq!(config.max_session_length(), 200);
        assert_eq!(config.recent_sessions_limit(), 10);
    }

    #[test]
    fn new_rejects_inconsistent_values() {
        assert_eq!(
            TrainingConfig::new(0, 10, 5).unwrap_err(),
            ConfigError::ZeroDefaultLength
        );
        assert_eq!(
            TrainingConfig::new(20, 10, 5).unwrap_err(),
            ConfigError::DefaultExceedsMax {
                default: 20,
                max: 10
            }
        );
        assert_eq!(
            TrainingConfig::new(5, 10, 0).unwrap_err(),
            ConfigError::ZeroRecentLimit
        );
    }

    #[test]
    fn resolve_length_uses_default_and_enforces_bounds() {
        let config = TrainingConfig::default();
        assert_eq!(config.resolve_length(None).unwrap(), 15);
        assert_eq!(config.resolve_length(Some(1)).unwrap(), 1);
        assert_eq!(config.resolve_length(Some(200)).unwrap(), 200);
        assert!(matches!(
            config.resolve_length(Some(0)),
            Err(TrainingError::InvalidArgument(_))
        ));
        assert!(matches!(
            config.resolve_length(Some(201)),
            Err(TrainingError::InvalidArgument(_))
        ));
    }

    #[test]
    fn lookup_overrides_and_falls_back() {
        let config = TrainingConfig::from_lookup(lookup_from(&[
            (ENV_DEFAULT_LENGTH, " 30 "),
            (ENV_RECENT_SESSIONS, "nope"),
        ]));
        assert_eq!(config.default_session_length(), 30);
        assert_eq!(config.max_session_length(), 200);
        assert_eq!(config.recent_sessions_limit(), 10);
    }

    #[test]
    fn invalid_combination_reverts_to_defaults() {
        let config = TrainingConfig::from_lookup(lookup_from(&[
            (ENV_DEFAULT_LENGTH, "50"),
            (ENV_MAX_LENGTH, "20"),
        ]));
        assert_eq!(config, TrainingConfig::default());
    }
}
