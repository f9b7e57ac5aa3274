//! Application settings model

use serde::{Deserialize, Serialize};

/// Sentinel id of the singleton settings row
pub const SETTINGS_ID: &str = "settings";

/// Theme mode options
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ThemeMode {
    /// Light theme
    Light,
    /// Dark theme
    Dark,
    /// Follow system preference
    #[default]
    System,
}

/// Application settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
#[allow(clippy::struct_excessive_bools)]
pub struct Settings {
    /// Theme mode
    pub theme: ThemeMode,
    pub enable_offline_mode: bool,
    pub enable_browser_notifications: bool,
    pub enable_telegram_notifications: bool,
    pub telegram_token: Option<String>,
    pub telegram_chat_id: Option<String>,
    /// Suggest due dates while typing a task title
    pub auto_suggest_due_dates: bool,
    pub show_confetti: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            theme: ThemeMode::System,
            enable_offline_mode: true,
            enable_browser_notifications: false,
            enable_telegram_notifications: false,
            telegram_token: None,
            telegram_chat_id: None,
            auto_suggest_due_dates: true,
            show_confetti: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_settings_default() {
        let settings = Settings::default();
        assert_eq!(settings.theme, ThemeMode::System);
        assert!(settings.enable_offline_mode);
        assert!(!settings.enable_telegram_notifications);
    }

    #[test]
    fn test_missing_fields_fall_back_to_defaults() {
        let settings: Settings = serde_json::from_str(r#"{"theme":"dark"}"#).unwrap();
        assert_eq!(settings.theme, ThemeMode::Dark);
        assert!(settings.show_confetti);
    }
}
