use clap::ValueEnum;
use daytask_core::db::SettingsRepository;
use daytask_core::models::Settings;

use crate::cli::{SettingKey, SettingsCommands, ThemeArg};
use crate::commands::common::{normalize_content, CliWorkspace};
use crate::error::CliError;

pub async fn run_settings(
    command: SettingsCommands,
    workspace: &CliWorkspace,
) -> Result<(), CliError> {
    match command {
        SettingsCommands::Show { json } => {
            let settings = workspace.settings().load().await?;
            if json {
                println!("{}", serde_json::to_string_pretty(&settings)?);
            } else {
                for line in format_settings_lines(&settings) {
                    println!("{line}");
                }
            }
            Ok(())
        }
        SettingsCommands::Set { key, value } => {
            let mut settings = workspace.settings().load().await?;
            apply_setting(&mut settings, key, &value)?;
            workspace.settings().save(&settings).await?;
            println!("Saved");
            Ok(())
        }
    }
}

pub fn apply_setting(settings: &mut Settings, key: SettingKey, value: &str) -> Result<(), CliError> {
    match key {
        SettingKey::Theme => {
            let theme = ThemeArg::from_str(value.trim(), true)
                .map_err(|message| invalid(key, message))?;
            settings.theme = theme.into();
        }
        SettingKey::OfflineMode => settings.enable_offline_mode = parse_flag(key, value)?,
        SettingKey::BrowserNotifications => {
            settings.enable_browser_notifications = parse_flag(key, value)?;
        }
        SettingKey::TelegramNotifications => {
            settings.enable_telegram_notifications = parse_flag(key, value)?;
        }
        SettingKey::TelegramToken => settings.telegram_token = normalize_content(value),
        SettingKey::TelegramChatId => settings.telegram_chat_id = normalize_content(value),
        SettingKey::AutoSuggestDueDates => {
            settings.auto_suggest_due_dates = parse_flag(key, value)?;
        }
        SettingKey::ShowConfetti => settings.show_confetti = parse_flag(key, value)?,
    }
    Ok(())
}

fn parse_flag(key: SettingKey, value: &str) -> Result<bool, CliError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "on" | "yes" | "1" => Ok(true),
        "false" | "off" | "no" | "0" => Ok(false),
        other => Err(invalid(key, format!("expected on/off, got '{other}'"))),
    }
}

fn invalid(key: SettingKey, message: String) -> CliError {
    CliError::InvalidSetting {
        key: key_name(key),
        message,
    }
}

fn key_name(key: SettingKey) -> String {
    key.to_possible_value()
        .map_or_else(|| format!("{key:?}"), |value| value.get_name().to_string())
}

pub fn format_settings_lines(settings: &Settings) -> Vec<String> {
    let on_off = |flag: bool| if flag { "on" } else { "off" };
    vec![
        format!("theme                    {:?}", settings.theme).to_lowercase(),
        format!("offline-mode             {}", on_off(settings.enable_offline_mode)),
        format!(
            "browser-notifications    {}",
            on_off(settings.enable_browser_notifications)
        ),
        format!(
            "telegram-notifications   {}",
            on_off(settings.enable_telegram_notifications)
        ),
        format!(
            "telegram-token           {}",
            if settings.telegram_token.is_some() { "(set)" } else { "(unset)" }
        ),
        format!(
            "telegram-chat-id         {}",
            settings.telegram_chat_id.as_deref().unwrap_or("(unset)")
        ),
        format!(
            "auto-suggest-due-dates   {}",
            on_off(settings.auto_suggest_due_dates)
        ),
        format!("show-confetti            {}", on_off(settings.show_confetti)),
    ]
}
