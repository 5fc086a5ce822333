//! Persisted app settings.

use serde::{Deserialize, Serialize};

/// Settings stored under the `settings_v1` key.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Settings {
    /// Whether the client should play haptic feedback on record/stop
    #[serde(default = "default_haptics")]
    pub haptics_enabled: bool,
}

fn default_haptics() -> bool {
    true
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            haptics_enabled: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let settings = Settings::default();
        assert!(settings.haptics_enabled);

        // Empty object deserializes to defaults
        let parsed: Settings = serde_json::from_str("{}").unwrap();
        assert!(parsed.haptics_enabled);
    }

    #[test]
    fn test_camel_case_key() {
        let json = serde_json::to_string(&Settings {
            haptics_enabled: false,
        })
        .unwrap();
        assert!(json.contains("hapticsEnabled"));
    }
}
