//! Session state machine configuration.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Default storage key for the session token.
pub const DEFAULT_TOKEN_KEY: &str = "auth_token";

/// Marker persisted when the backend issues no token of its own.
pub const DEFAULT_SESSION_MARKER: &str = "true";

/// Default text of the capability-unavailable notice.
pub const DEFAULT_CAPABILITY_NOTICE: &str =
    "Please check the network or whether the server address is reachable";

/// Configuration error.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid configuration: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("Invalid configuration: {0} must not be empty")]
    Empty(&'static str),
}

/// Tunables for the session state machine.
///
/// # Example
///
/// ```
/// use tv_session_core::SessionConfig;
///
/// let config = SessionConfig::default()
///     .with_token_key("tv_token")
///     .with_drop_stale_results(false);
/// assert_eq!(config.token_key, "tv_token");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SessionConfig {
    /// Storage key holding the session token.
    pub token_key: String,
    /// Value persisted after a login that returned no token.
    pub session_marker: String,
    /// Ignore the outcome of a status check once a newer one has started.
    pub drop_stale_results: bool,
    /// Text shown when the backend has no usable storage mode.
    pub capability_notice: String,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            token_key: DEFAULT_TOKEN_KEY.to_string(),
            session_marker: DEFAULT_SESSION_MARKER.to_string(),
            drop_stale_results: true,
            capability_notice: DEFAULT_CAPABILITY_NOTICE.to_string(),
        }
    }
}

impl SessionConfig {
    /// Create a config with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a JSON document; missing fields take their defaults.
    ///
    /// # Errors
    /// Returns error if the JSON is malformed or a key field is empty.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Check invariants that serde cannot express.
    ///
    /// # Errors
    /// Returns error if the token key or session marker is empty.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.token_key.is_empty() {
            return Err(ConfigError::Empty("tokenKey"));
        }
        if self.session_marker.is_empty() {
            return Err(ConfigError::Empty("sessionMarker"));
        }
        Ok(())
    }

    /// Set the token storage key.
    #[must_use]
    pub fn with_token_key(mut self, key: impl Into<String>) -> Self {
        self.token_key = key.into();
        self
    }

    /// Set the marker persisted for token-less logins.
    #[must_use]
    pub fn with_session_marker(mut self, marker: impl Into<String>) -> Self {
        self.session_marker = marker.into();
        self
    }

    /// Set whether stale status checks are ignored.
    #[must_use]
    pub fn with_drop_stale_results(mut self, enabled: bool) -> Self {
        self.drop_stale_results = enabled;
        self
    }

    /// Set the capability-unavailable notice text.
    #[must_use]
    pub fn with_capability_notice(mut self, text: impl Into<String>) -> Self {
        self.capability_notice = text.into();
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = SessionConfig::default();
        assert_eq!(config.token_key, "auth_token");
        assert_eq!(config.session_marker, "true");
        assert!(config.drop_stale_results);
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let config = SessionConfig::from_json_str(r#"{"dropStaleResults": false}"#).unwrap();
        assert!(!config.drop_stale_results);
        assert_eq!(config.token_key, DEFAULT_TOKEN_KEY);
    }

    #[test]
    fn test_empty_token_key_rejected() {
        let err = SessionConfig::from_json_str(r#"{"tokenKey": ""}"#).unwrap_err();
        assert!(matches!(err, ConfigError::Empty("tokenKey")));
    }

    #[test]
    fn test_malformed_json_rejected() {
        assert!(matches!(
            SessionConfig::from_json_str("{"),
            Err(ConfigError::Parse(_))
        ));
    }
}
