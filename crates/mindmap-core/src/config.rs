//! Runtime settings for the generation loop.
//!
//! Values come from the process environment (a `.env` file is loaded by the
//! CLI before this runs). Backend-specific settings live with the backends.

use serde::{Deserialize, Serialize};

use crate::domain::ConfigError;
use crate::orchestrator::DEFAULT_MAX_ATTEMPTS;

/// Environment variable holding the attempt budget.
pub const MAX_RETRY_ENV: &str = "MINDMAP_GENERATE_MAX_RETRY";

/// Settings consumed by the orchestrator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    /// Maximum generate-validate cycles per run.
    pub max_retry: u32,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            max_retry: DEFAULT_MAX_ATTEMPTS,
        }
    }
}

impl Settings {
    /// Load settings from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load settings through an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut settings = Settings::default();

        if let Some(raw) = lookup(MAX_RETRY_ENV) {
            settings.max_retry = parse_max_retry(&raw)?;
        }

        Ok(settings)
    }
}

/// Parse a positive attempt budget.
pub fn parse_max_retry(raw: &str) -> Result<u32, ConfigError> {
    let invalid = |reason: &str| ConfigError::InvalidValue {
        key: MAX_RETRY_ENV.to_string(),
        value: raw.to_string(),
        reason: reason.to_string(),
    };

    match raw.trim().parse::<u32>() {
        Ok(0) => Err(invalid("must be at least 1")),
        Ok(n) => Ok(n),
        Err(_) => Err(invalid("expected a positive integer")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_default_is_three() {
        let settings = Settings::from_lookup(lookup_from(&[])).unwrap();
        assert_eq!(settings.max_retry, 3);
    }

    #[test]
    fn test_reads_max_retry() {
        let settings = Settings::from_lookup(lookup_from(&[(MAX_RETRY_ENV, " 5 ")])).unwrap();
        assert_eq!(settings.max_retry, 5);
    }

    #[test]
    fn test_rejects_zero_and_garbage() {
        assert!(Settings::from_lookup(lookup_from(&[(MAX_RETRY_ENV, "0")])).is_err());
        let err = Settings::from_lookup(lookup_from(&[(MAX_RETRY_ENV, "three")])).unwrap_err();
        assert!(err.to_string().contains("expected a positive integer"));
    }
}
