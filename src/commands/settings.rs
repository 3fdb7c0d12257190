//! 设置命令

use serde::Serialize;

use paperize_core::models::SettingKey;
use paperize_core::{AppError, CommandError, SettingsStore};

use crate::AppState;

/// 一项设置及其生效值
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SettingEntry {
    pub key: String,
    pub value: Option<String>,
}

fn parse_key(name: &str) -> Result<SettingKey, CommandError> {
    SettingKey::from_name(name)
        .ok_or_else(|| AppError::Config(format!("未知的设置项: {}", name)).into())
}

/// 读取设置（未保存时为默认值）
pub fn get_setting(state: &AppState, key: &str) -> Result<SettingEntry, CommandError> {
    let key = parse_key(key)?;
    Ok(SettingEntry {
        key: key.as_str().to_string(),
        value: state.core.settings.get_string(key),
    })
}

/// 写入设置
pub fn set_setting(state: &AppState, key: &str, value: &str) -> Result<(), CommandError> {
    let key = parse_key(key)?;
    state.core.settings.put_string(key, value)?;
    tracing::info!("设置 {} = {}", key.as_str(), value);
    Ok(())
}

/// 列出全部设置
pub fn list_settings(state: &AppState) -> Vec<SettingEntry> {
    state
        .core
        .settings
        .list()
        .into_iter()
        .map(|(key, value)| SettingEntry {
            key: key.as_str().to_string(),
            value,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_get_falls_back_to_default() {
        let tmp = TempDir::new().unwrap();
        let state = AppState::with_data_dir(tmp.path().to_path_buf()).unwrap();

        let entry = get_setting(&state, "home_interval_minutes").unwrap();
        assert_eq!(entry.value.as_deref(), Some("15"));
        assert_eq!(get_setting(&state, "home_album_name").unwrap().value, None);
    }

    #[test]
    fn test_set_persists_across_reopen() {
        let tmp = TempDir::new().unwrap();
        {
            let state = AppState::with_data_dir(tmp.path().to_path_buf()).unwrap();
            set_setting(&state, "lock_scaling_mode", "fit").unwrap();
        }

        let state = AppState::with_data_dir(tmp.path().to_path_buf()).unwrap();
        let entry = get_setting(&state, "lock_scaling_mode").unwrap();
        assert_eq!(entry.value.as_deref(), Some("fit"));
    }

    #[test]
    fn test_unknown_key_is_rejected() {
        let tmp = TempDir::new().unwrap();
        let state = AppState::with_data_dir(tmp.path().to_path_buf()).unwrap();

        assert_eq!(get_setting(&state, "theme").unwrap_err().code, "E_CONFIG");
        assert_eq!(set_setting(&state, "theme", "dark").unwrap_err().code, "E_CONFIG");
        assert_eq!(list_settings(&state).len(), SettingKey::ALL.len());
    }
}
