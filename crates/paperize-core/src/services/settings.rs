//! 轮换设置存储
//!
//! 键值形式的持久化设置：每次写入立即落盘（临时文件 + 重命名）。

use std::collections::BTreeMap;
use std::fs;
use std::path::PathBuf;
use std::sync::Mutex;

use crate::models::{
    DisplaySize, RotationConfig, ScalingMode, SettingKey, Target, TransformOptions,
    DEFAULT_FOLLOW_UP_DELAY_SECS, DEFAULT_INTERVAL_MINUTES, MAX_DISPLAY_EDGE,
    MAX_FOLLOW_UP_DELAY_SECS,
};
use crate::paths::PathProvider;
use crate::utils::error::{AppError, AppResult};

/// 类型化的键值设置存储
pub trait SettingsStore: Send + Sync {
    /// 已保存的原始值（不含默认值）
    fn get_raw(&self, key: SettingKey) -> Option<String>;

    fn put_string(&self, key: SettingKey, value: &str) -> AppResult<()>;

    fn remove(&self, key: SettingKey) -> AppResult<()>;

    /// 已保存的值，否则为键的默认值
    fn get_string(&self, key: SettingKey) -> Option<String> {
        self.get_raw(key)
            .or_else(|| key.default_value().map(str::to_string))
    }

    fn get_bool(&self, key: SettingKey) -> bool {
        self.get_string(key)
            .map(|v| matches!(v.trim(), "true" | "1"))
            .unwrap_or(false)
    }

    fn get_int(&self, key: SettingKey) -> i64 {
        let parsed = self.get_raw(key).and_then(|v| v.trim().parse::<i64>().ok());
        parsed
            .or_else(|| key.default_value().and_then(|v| v.parse().ok()))
            .unwrap_or(0)
    }

    fn put_bool(&self, key: SettingKey, value: bool) -> AppResult<()> {
        self.put_string(key, if value { "true" } else { "false" })
    }

    fn put_int(&self, key: SettingKey, value: i64) -> AppResult<()> {
        self.put_string(key, &value.to_string())
    }

    /// 写入或删除可选值
    fn put_optional(&self, key: SettingKey, value: Option<&str>) -> AppResult<()> {
        match value {
            Some(v) => self.put_string(key, v),
            None => self.remove(key),
        }
    }
}

/// JSON 文件设置存储
pub struct JsonSettingsStore {
    /// None 表示仅内存（用于测试）
    path: Option<PathBuf>,
    values: Mutex<BTreeMap<String, String>>,
}

impl JsonSettingsStore {
    /// 使用 PathProvider 打开设置存储
    pub fn new(provider: &dyn PathProvider) -> AppResult<Self> {
        Self::open(provider.settings_path())
    }

    /// 打开指定路径的设置文件；文件不存在时从空设置开始
    pub fn open(path: PathBuf) -> AppResult<Self> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .map_err(|e| AppError::Config(format!("无法创建配置目录: {}", e)))?;
        }

        let values = if path.exists() {
            let content = fs::read_to_string(&path)
                .map_err(|e| AppError::Config(format!("无法读取设置文件: {}", e)))?;
            let values: BTreeMap<String, String> = serde_json::from_str(&content)
                .map_err(|e| AppError::Config(format!("设置文件格式错误: {}", e)))?;
            tracing::info!("成功加载设置: {:?}", path);
            values
        } else {
            tracing::info!("设置文件不存在，使用默认设置");
            BTreeMap::new()
        };

        Ok(Self {
            path: Some(path),
            values: Mutex::new(values),
        })
    }

    /// 不落盘的设置存储
    pub fn in_memory() -> Self {
        Self {
            path: None,
            values: Mutex::new(BTreeMap::new()),
        }
    }

    pub fn path(&self) -> Option<&PathBuf> {
        self.path.as_ref()
    }

    /// 全部键及其生效值
    pub fn list(&self) -> Vec<(SettingKey, Option<String>)> {
        SettingKey::ALL
            .iter()
            .map(|key| (*key, self.get_string(*key)))
            .collect()
    }

    fn lock(&self) -> AppResult<std::sync::MutexGuard<'_, BTreeMap<String, String>>> {
        self.values
            .lock()
            .map_err(|e| AppError::Config(format!("设置锁已损坏: {}", e)))
    }

    fn persist(&self, values: &BTreeMap<String, String>) -> AppResult<()> {
        let Some(path) = &self.path else {
            return Ok(());
        };

        let content = serde_json::to_string_pretty(values)
            .map_err(|e| AppError::Config(format!("无法序列化设置: {}", e)))?;

        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, content)
            .map_err(|e| AppError::Config(format!("无法保存设置文件: {}", e)))?;
        fs::rename(&tmp, path)
            .map_err(|e| AppError::Config(format!("无法保存设置文件: {}", e)))?;

        tracing::debug!("成功保存设置: {:?}", path);
        Ok(())
    }
}

impl SettingsStore for JsonSettingsStore {
    fn get_raw(&self, key: SettingKey) -> Option<String> {
        let values = self.lock().ok()?;
        values.get(key.as_str()).cloned()
    }

    fn put_string(&self, key: SettingKey, value: &str) -> AppResult<()> {
        let mut values = self.lock()?;
        values.insert(key.as_str().to_string(), value.to_string());
        self.persist(&values)
    }

    fn remove(&self, key: SettingKey) -> AppResult<()> {
        let mut values = self.lock()?;
        if values.remove(key.as_str()).is_some() {
            self.persist(&values)?;
        }
        Ok(())
    }
}

fn percent(store: &dyn SettingsStore, key: SettingKey) -> u8 {
    store.get_int(key).clamp(0, 100) as u8
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

fn load_transform(store: &dyn SettingsStore, target: Target, display: DisplaySize) -> TransformOptions {
    let pick = |home, lock| SettingKey::for_target(target, home, lock);

    let scaling_mode = store
        .get_string(pick(SettingKey::HomeScalingMode, SettingKey::LockScalingMode))
        .and_then(|v| ScalingMode::from_str(&v))
        .unwrap_or_default();

    TransformOptions {
        scaling_mode,
        darken: store.get_bool(pick(SettingKey::HomeDarken, SettingKey::LockDarken)),
        darken_percent: percent(
            store,
            pick(SettingKey::HomeDarkenPercentage, SettingKey::LockDarkenPercentage),
        ),
        blur: store.get_bool(pick(SettingKey::HomeBlur, SettingKey::LockBlur)),
        blur_percent: percent(
            store,
            pick(SettingKey::HomeBlurPercentage, SettingKey::LockBlurPercentage),
        ),
        display,
    }
}

/// 屏幕尺寸：非正数取默认值，超出上限时截断
fn display_edge(store: &dyn SettingsStore, key: SettingKey, fallback: u32) -> u32 {
    u32::try_from(store.get_int(key))
        .ok()
        .filter(|v| *v > 0)
        .map_or(fallback, |v| v.min(MAX_DISPLAY_EDGE))
}

/// 一次性读取本次触发所需的全部配置
pub fn load_rotation_config(store: &dyn SettingsStore) -> RotationConfig {
    let defaults = DisplaySize::default();
    let display = DisplaySize {
        width: display_edge(store, SettingKey::DisplayWidth, defaults.width),
        height: display_edge(store, SettingKey::DisplayHeight, defaults.height),
    };
    let follow_up_delay_secs = u64::try_from(store.get_int(SettingKey::FollowUpDelaySeconds))
        .unwrap_or(DEFAULT_FOLLOW_UP_DELAY_SECS)
        .min(MAX_FOLLOW_UP_DELAY_SECS);

    RotationConfig {
        enabled: store.get_bool(SettingKey::EnableChanger),
        set_home: store.get_bool(SettingKey::EnableHomeWallpaper),
        set_lock: store.get_bool(SettingKey::EnableLockWallpaper),
        home_album_name: non_empty(store.get_string(SettingKey::HomeAlbumName)),
        lock_album_name: non_empty(store.get_string(SettingKey::LockAlbumName)),
        home_transform: load_transform(store, Target::Home, display),
        lock_transform: load_transform(store, Target::Lock, display),
        follow_up_delay_secs,
    }
}

/// 从设置读取触发参数中的间隔部分（宿主发出触发时使用）
pub fn load_intervals(store: &dyn SettingsStore) -> (u32, u32, bool) {
    let interval = |key| {
        u32::try_from(store.get_int(key))
            .ok()
            .filter(|v| *v > 0)
            .unwrap_or(DEFAULT_INTERVAL_MINUTES)
    };
    (
        interval(SettingKey::HomeIntervalMinutes),
        interval(SettingKey::LockIntervalMinutes),
        store.get_bool(SettingKey::ScheduleSeparately),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_defaults_when_unset() {
        let store = JsonSettingsStore::in_memory();
        assert!(!store.get_bool(SettingKey::EnableChanger));
        assert_eq!(store.get_int(SettingKey::HomeIntervalMinutes), 15);
        assert_eq!(store.get_int(SettingKey::LockDarkenPercentage), 100);
        assert_eq!(store.get_string(SettingKey::CurrentHomeWallpaper), None);

        let config = load_rotation_config(&store);
        assert!(!config.is_active());
        assert_eq!(config.home_transform, TransformOptions::default());
        assert_eq!(config.follow_up_delay_secs, DEFAULT_FOLLOW_UP_DELAY_SECS);
    }

    #[test]
    fn test_write_through_and_reload() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("Config").join("settings.json");

        let store = JsonSettingsStore::open(path.clone()).unwrap();
        store.put_bool(SettingKey::EnableChanger, true).unwrap();
        store.put_string(SettingKey::LockScalingMode, "fit").unwrap();
        store.put_int(SettingKey::LockBlurPercentage, 250).unwrap();
        store.put_string(SettingKey::HomeAlbumName, "风景").unwrap();
        drop(store);

        let reloaded = JsonSettingsStore::open(path).unwrap();
        let config = load_rotation_config(&reloaded);
        assert!(config.enabled);
        assert_eq!(config.lock_transform.scaling_mode, ScalingMode::Fit);
        // 百分比被限制在 0..=100
        assert_eq!(config.lock_transform.blur_percent, 100);
        assert_eq!(config.album_name(Target::Home), Some("风景"));
        assert_eq!(config.album_name(Target::Lock), None);
    }

    #[test]
    fn test_put_optional_removes() {
        let store = JsonSettingsStore::in_memory();
        store
            .put_optional(SettingKey::NextHomeWallpaper, Some("/a.jpg"))
            .unwrap();
        assert_eq!(store.get_raw(SettingKey::NextHomeWallpaper).as_deref(), Some("/a.jpg"));
        store.put_optional(SettingKey::NextHomeWallpaper, None).unwrap();
        assert_eq!(store.get_raw(SettingKey::NextHomeWallpaper), None);
    }

    #[test]
    fn test_out_of_range_numbers_are_clamped() {
        let store = JsonSettingsStore::in_memory();
        store.put_int(SettingKey::FollowUpDelaySeconds, i64::MAX).unwrap();
        store.put_int(SettingKey::DisplayWidth, i64::from(u32::MAX) + 7).unwrap();
        store.put_int(SettingKey::DisplayHeight, -3).unwrap();

        let config = load_rotation_config(&store);
        assert_eq!(config.follow_up_delay_secs, MAX_FOLLOW_UP_DELAY_SECS);
        assert_eq!(config.home_transform.display.width, MAX_DISPLAY_EDGE);
        assert_eq!(
            config.home_transform.display.height,
            DisplaySize::default().height
        );

        store.put_int(SettingKey::FollowUpDelaySeconds, -1).unwrap();
        assert_eq!(
            load_rotation_config(&store).follow_up_delay_secs,
            DEFAULT_FOLLOW_UP_DELAY_SECS
        );
    }

    #[test]
    fn test_invalid_values_fall_back() {
        let store = JsonSettingsStore::in_memory();
        store.put_string(SettingKey::HomeIntervalMinutes, "soon").unwrap();
        store.put_string(SettingKey::HomeScalingMode, "tile").unwrap();

        let (home, lock, separate) = load_intervals(&store);
        assert_eq!((home, lock, separate), (15, 15, false));
        assert_eq!(
            load_rotation_config(&store).home_transform.scaling_mode,
            ScalingMode::Fill
        );
    }
}
