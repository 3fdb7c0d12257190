//! 触发命令

use paperize_core::models::{RotationMode, SettingKey, Trigger, TriggerParams};
use paperize_core::services::load_intervals;
use paperize_core::{AppError, CommandError, Outcome, SettingsStore};

use crate::AppState;

/// 命令行提供的触发参数覆盖
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TriggerOverrides {
    pub home_interval: Option<u32>,
    pub lock_interval: Option<u32>,
    pub separate: Option<bool>,
    pub mode: RotationMode,
}

impl TriggerOverrides {
    /// 只保留投递模式，间隔与分开调度取设置中的值
    pub fn without_intervals(&self) -> Self {
        Self {
            mode: self.mode,
            ..Self::default()
        }
    }
}

/// 组装触发参数：先写回覆盖值，再从设置读取
pub fn trigger_params(
    state: &AppState,
    overrides: &TriggerOverrides,
) -> Result<TriggerParams, CommandError> {
    let settings = state.core.settings.as_ref();

    let intervals = [
        (SettingKey::HomeIntervalMinutes, overrides.home_interval),
        (SettingKey::LockIntervalMinutes, overrides.lock_interval),
    ];
    for (key, value) in intervals {
        match value {
            Some(0) => {
                return Err(AppError::Config(format!("{} 必须大于 0", key.as_str())).into());
            }
            Some(minutes) => settings.put_int(key, i64::from(minutes))?,
            None => {}
        }
    }
    if let Some(separate) = overrides.separate {
        settings.put_bool(SettingKey::ScheduleSeparately, separate)?;
    }

    let (home, lock, separate) = load_intervals(settings);
    Ok(TriggerParams {
        home_interval_minutes: home,
        lock_interval_minutes: lock,
        schedule_separately: separate,
        mode: overrides.mode,
    })
}

/// 在当前线程处理一次触发
pub fn run_trigger(
    state: &AppState,
    trigger: Trigger,
    params: TriggerParams,
) -> Result<Vec<Outcome>, CommandError> {
    Ok(state.core.process_now(trigger, params)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_overrides_are_persisted() {
        let tmp = TempDir::new().unwrap();
        let state = AppState::with_data_dir(tmp.path().to_path_buf()).unwrap();

        let params = trigger_params(
            &state,
            &TriggerOverrides {
                home_interval: Some(30),
                separate: Some(true),
                mode: RotationMode::Lock,
                ..Default::default()
            },
        )
        .unwrap();

        assert_eq!(params.home_interval_minutes, 30);
        assert_eq!(params.lock_interval_minutes, 15);
        assert!(params.schedule_separately);
        assert_eq!(params.mode, RotationMode::Lock);

        let again = trigger_params(&state, &TriggerOverrides::default()).unwrap();
        assert_eq!(again.home_interval_minutes, 30);
        assert!(again.schedule_separately);
    }

    #[test]
    fn test_zero_interval_is_rejected() {
        let tmp = TempDir::new().unwrap();
        let state = AppState::with_data_dir(tmp.path().to_path_buf()).unwrap();

        let err = trigger_params(
            &state,
            &TriggerOverrides {
                lock_interval: Some(0),
                ..Default::default()
            },
        )
        .unwrap_err();
        assert_eq!(err.code, "E_CONFIG");
    }

    #[test]
    fn test_start_without_configuration_is_inactive() {
        let tmp = TempDir::new().unwrap();
        let state = AppState::with_data_dir(tmp.path().to_path_buf()).unwrap();

        let outcomes = run_trigger(&state, Trigger::Start, TriggerParams::default()).unwrap();
        assert_eq!(outcomes, vec![Outcome::Inactive]);
    }

    #[test]
    fn test_start_with_unselected_album_reports_incomplete() {
        let tmp = TempDir::new().unwrap();
        let state = AppState::with_data_dir(tmp.path().to_path_buf()).unwrap();
        let s = &state.core.settings;
        s.put_bool(SettingKey::EnableChanger, true).unwrap();
        s.put_bool(SettingKey::EnableHomeWallpaper, true).unwrap();
        s.put_string(SettingKey::HomeAlbumName, "missing").unwrap();

        let err = run_trigger(&state, Trigger::Start, TriggerParams::default()).unwrap_err();
        assert_eq!(err.code, "E_CONFIG_INCOMPLETE");
    }
}
