//! Engine configuration.
//!
//! [`EngineConfig`] collects every tunable of a session. It deserializes from
//! JSON with per-field defaults, so a config file only needs the keys it
//! changes:
//!
//! ```
//! use threadfold::EngineConfig;
//!
//! let config = EngineConfig::from_json_str(r#"{ "keep_latest": 12 }"#).unwrap();
//! assert_eq!(config.keep_latest, 12);
//! assert!(config.scroll_continuity);
//! ```

use serde::{Deserialize, Serialize};

use crate::conversation::IdentityConfig;
use crate::window::DEFAULT_KEEP_LATEST;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Entries left attached by a collapse. Default: `20`.
    pub keep_latest: usize,
    /// Conversation identity precedence.
    pub identity: IdentityConfig,
    /// Correct the scroll position after a restore. Default: `true`.
    pub scroll_continuity: bool,
    /// Mount the engine's controls when the session starts. Default: `true`.
    pub mount_controls: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            keep_latest: DEFAULT_KEEP_LATEST,
            identity: IdentityConfig::default(),
            scroll_continuity: true,
            mount_controls: true,
        }
    }
}

impl EngineConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_keep_latest(mut self, keep_latest: usize) -> Self {
        self.keep_latest = keep_latest;
        self
    }

    pub fn with_identity(mut self, identity: IdentityConfig) -> Self {
        self.identity = identity;
        self
    }

    pub fn without_scroll_continuity(mut self) -> Self {
        self.scroll_continuity = false;
        self
    }

    pub fn without_controls(mut self) -> Self {
        self.mount_controls = false;
        self
    }

    /// Parse a JSON config. Missing keys take their defaults.
    pub fn from_json_str(json: &str) -> Result<Self, String> {
        serde_json::from_str(json).map_err(|e| format!("invalid engine config: {e}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::conversation::IdentitySource;

    #[test]
    fn defaults() {
        let config = EngineConfig::default();
        assert_eq!(config.keep_latest, 20);
        assert!(config.scroll_continuity);
        assert!(config.mount_controls);
        assert!(!config.identity.include_query);
    }

    #[test]
    fn partial_json_keeps_defaults() {
        let config = EngineConfig::from_json_str(
            r#"{ "identity": { "precedence": ["path_segment", "path"], "include_query": true } }"#,
        )
        .unwrap();
        assert_eq!(config.keep_latest, 20);
        assert_eq!(
            config.identity.precedence,
            vec![IdentitySource::PathSegment, IdentitySource::Path]
        );
        assert!(config.identity.include_query);
        assert_eq!(config.identity.path_markers, IdentityConfig::default().path_markers);
    }

    #[test]
    fn invalid_json_is_reported() {
        let err = EngineConfig::from_json_str("{ keep_latest: }").unwrap_err();
        assert!(err.starts_with("invalid engine config"));
    }
}
