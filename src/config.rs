//! Engine configuration

use serde::{Deserialize, Serialize};

/// Configuration for a `ScriptCore`
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CoreConfig {
    /// Version documents must declare to pass validation.
    ///
    /// `None` means "the highest registered migration number".
    pub current_version: Option<u64>,

    /// Report collections with no registered resource type as errors
    pub reject_unknown_collections: bool,
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            current_version: None,
            reject_unknown_collections: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_config_fills_defaults() {
        let config: CoreConfig = serde_json::from_str(r#"{ "current_version": 44 }"#).unwrap();
        assert_eq!(config.current_version, Some(44));
        assert!(config.reject_unknown_collections);
    }
}
