//! 轮换设置数据模型

use serde::{Deserialize, Serialize};

use super::Target;

/// 默认轮换间隔（分钟）
pub const DEFAULT_INTERVAL_MINUTES: u32 = 15;
/// 跨目标后续触发的默认延迟（秒）
pub const DEFAULT_FOLLOW_UP_DELAY_SECS: u64 = 15;
/// 后续触发延迟上限（秒）
pub const MAX_FOLLOW_UP_DELAY_SECS: u64 = 24 * 60 * 60;
/// 渲染画布单边上限（像素）
pub const MAX_DISPLAY_EDGE: u32 = 16_384;

/// 设置键
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SettingKey {
    /// 总开关
    EnableChanger,
    EnableHomeWallpaper,
    EnableLockWallpaper,
    /// 主屏 / 锁屏分开调度
    ScheduleSeparately,
    HomeIntervalMinutes,
    LockIntervalMinutes,
    HomeScalingMode,
    LockScalingMode,
    HomeDarken,
    LockDarken,
    /// 保留亮度百分比（100 = 不变暗）
    HomeDarkenPercentage,
    LockDarkenPercentage,
    HomeBlur,
    LockBlur,
    HomeBlurPercentage,
    LockBlurPercentage,
    HomeAlbumName,
    LockAlbumName,
    CurrentHomeWallpaper,
    CurrentLockWallpaper,
    NextHomeWallpaper,
    NextLockWallpaper,
    LastSetTime,
    NextSetTime,
    HomeNextSetTime,
    LockNextSetTime,
    DisplayWidth,
    DisplayHeight,
    FollowUpDelaySeconds,
}

impl SettingKey {
    pub const ALL: &'static [SettingKey] = &[
        SettingKey::EnableChanger,
        SettingKey::EnableHomeWallpaper,
        SettingKey::EnableLockWallpaper,
        SettingKey::ScheduleSeparately,
        SettingKey::HomeIntervalMinutes,
        SettingKey::LockIntervalMinutes,
        SettingKey::HomeScalingMode,
        SettingKey::LockScalingMode,
        SettingKey::HomeDarken,
        SettingKey::LockDarken,
        SettingKey::HomeDarkenPercentage,
        SettingKey::LockDarkenPercentage,
        SettingKey::HomeBlur,
        SettingKey::LockBlur,
        SettingKey::HomeBlurPercentage,
        SettingKey::LockBlurPercentage,
        SettingKey::HomeAlbumName,
        SettingKey::LockAlbumName,
        SettingKey::CurrentHomeWallpaper,
        SettingKey::CurrentLockWallpaper,
        SettingKey::NextHomeWallpaper,
        SettingKey::NextLockWallpaper,
        SettingKey::LastSetTime,
        SettingKey::NextSetTime,
        SettingKey::HomeNextSetTime,
        SettingKey::LockNextSetTime,
        SettingKey::DisplayWidth,
        SettingKey::DisplayHeight,
        SettingKey::FollowUpDelaySeconds,
    ];

    /// 持久化时使用的键名
    pub fn as_str(&self) -> &'static str {
        match self {
            SettingKey::EnableChanger => "enable_changer",
            SettingKey::EnableHomeWallpaper => "enable_home_wallpaper",
            SettingKey::EnableLockWallpaper => "enable_lock_wallpaper",
            SettingKey::ScheduleSeparately => "schedule_separately",
            SettingKey::HomeIntervalMinutes => "home_interval_minutes",
            SettingKey::LockIntervalMinutes => "lock_interval_minutes",
            SettingKey::HomeScalingMode => "home_scaling_mode",
            SettingKey::LockScalingMode => "lock_scaling_mode",
            SettingKey::HomeDarken => "home_darken",
            SettingKey::LockDarken => "lock_darken",
            SettingKey::HomeDarkenPercentage => "home_darken_percentage",
            SettingKey::LockDarkenPercentage => "lock_darken_percentage",
            SettingKey::HomeBlur => "home_blur",
            SettingKey::LockBlur => "lock_blur",
            SettingKey::HomeBlurPercentage => "home_blur_percentage",
            SettingKey::LockBlurPercentage => "lock_blur_percentage",
            SettingKey::HomeAlbumName => "home_album_name",
            SettingKey::LockAlbumName => "lock_album_name",
            SettingKey::CurrentHomeWallpaper => "current_home_wallpaper",
            SettingKey::CurrentLockWallpaper => "current_lock_wallpaper",
            SettingKey::NextHomeWallpaper => "next_home_wallpaper",
            SettingKey::NextLockWallpaper => "next_lock_wallpaper",
            SettingKey::LastSetTime => "last_set_time",
            SettingKey::NextSetTime => "next_set_time",
            SettingKey::HomeNextSetTime => "home_next_set_time",
            SettingKey::LockNextSetTime => "lock_next_set_time",
            SettingKey::DisplayWidth => "display_width",
            SettingKey::DisplayHeight => "display_height",
            SettingKey::FollowUpDelaySeconds => "follow_up_delay_seconds",
        }
    }

    /// 未设置时的默认值；指针与时间类键没有默认值
    pub fn default_value(&self) -> Option<&'static str> {
        match self {
            SettingKey::EnableChanger
            | SettingKey::EnableHomeWallpaper
            | SettingKey::EnableLockWallpaper
            | SettingKey::ScheduleSeparately
            | SettingKey::HomeDarken
            | SettingKey::LockDarken
            | SettingKey::HomeBlur
            | SettingKey::LockBlur => Some("false"),
            SettingKey::HomeIntervalMinutes | SettingKey::LockIntervalMinutes => Some("15"),
            SettingKey::HomeScalingMode | SettingKey::LockScalingMode => Some("fill"),
            SettingKey::HomeDarkenPercentage | SettingKey::LockDarkenPercentage => Some("100"),
            SettingKey::HomeBlurPercentage | SettingKey::LockBlurPercentage => Some("0"),
            SettingKey::DisplayWidth => Some("1080"),
            SettingKey::DisplayHeight => Some("2400"),
            SettingKey::FollowUpDelaySeconds => Some("15"),
            SettingKey::HomeAlbumName
            | SettingKey::LockAlbumName
            | SettingKey::CurrentHomeWallpaper
            | SettingKey::CurrentLockWallpaper
            | SettingKey::NextHomeWallpaper
            | SettingKey::NextLockWallpaper
            | SettingKey::LastSetTime
            | SettingKey::NextSetTime
            | SettingKey::HomeNextSetTime
            | SettingKey::LockNextSetTime => None,
        }
    }

    /// 从键名解析
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|k| k.as_str() == name)
    }

    /// 按目标选择成对的键
    pub fn for_target(target: Target, home: SettingKey, lock: SettingKey) -> SettingKey {
        match target {
            Target::Home => home,
            Target::Lock => lock,
        }
    }
}

/// 缩放模式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ScalingMode {
    /// 等比放大铺满并居中裁剪
    #[default]
    Fill,
    /// 等比缩放完整显示，空白处填黑
    Fit,
    /// 拉伸到屏幕尺寸
    Stretch,
    /// 不缩放
    None,
}

impl ScalingMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ScalingMode::Fill => "fill",
            ScalingMode::Fit => "fit",
            ScalingMode::Stretch => "stretch",
            ScalingMode::None => "none",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "fill" => Some(ScalingMode::Fill),
            "fit" => Some(ScalingMode::Fit),
            "stretch" => Some(ScalingMode::Stretch),
            "none" => Some(ScalingMode::None),
            _ => None,
        }
    }
}

/// 屏幕尺寸
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DisplaySize {
    pub width: u32,
    pub height: u32,
}

impl Default for DisplaySize {
    fn default() -> Self {
        Self {
            width: 1080,
            height: 2400,
        }
    }
}

/// 单个目标的显示变换选项
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransformOptions {
    pub scaling_mode: ScalingMode,
    pub darken: bool,
    pub darken_percent: u8,
    pub blur: bool,
    pub blur_percent: u8,
    pub display: DisplaySize,
}

impl Default for TransformOptions {
    fn default() -> Self {
        Self {
            scaling_mode: ScalingMode::Fill,
            darken: false,
            darken_percent: 100,
            blur: false,
            blur_percent: 0,
            display: DisplaySize::default(),
        }
    }
}

/// 一次触发所需的全部轮换配置（每次调用时从设置中读取）
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RotationConfig {
    pub enabled: bool,
    pub set_home: bool,
    pub set_lock: bool,
    pub home_album_name: Option<String>,
    pub lock_album_name: Option<String>,
    pub home_transform: TransformOptions,
    pub lock_transform: TransformOptions,
    pub follow_up_delay_secs: u64,
}

impl RotationConfig {
    pub fn is_active(&self) -> bool {
        self.enabled && (self.set_home || self.set_lock)
    }

    pub fn transform(&self, target: Target) -> &TransformOptions {
        match target {
            Target::Home => &self.home_transform,
            Target::Lock => &self.lock_transform,
        }
    }

    pub fn album_name(&self, target: Target) -> Option<&str> {
        match target {
            Target::Home => self.home_album_name.as_deref(),
            Target::Lock => self.lock_album_name.as_deref(),
        }
    }

    pub fn is_enabled(&self, target: Target) -> bool {
        match target {
            Target::Home => self.set_home,
            Target::Lock => self.set_lock,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_setting_key_names_round_trip() {
        for key in SettingKey::ALL {
            assert_eq!(SettingKey::from_name(key.as_str()), Some(*key));
        }
        assert_eq!(SettingKey::from_name("nope"), None);
    }

    #[test]
    fn test_scaling_mode_parse() {
        assert_eq!(ScalingMode::from_str("FIT"), Some(ScalingMode::Fit));
        assert_eq!(ScalingMode::from_str("tile"), None);
        assert_eq!(ScalingMode::default(), ScalingMode::Fill);
    }

    #[test]
    fn test_default_transform_is_identity() {
        let t = TransformOptions::default();
        assert!(!t.darken);
        assert_eq!(t.darken_percent, 100);
        assert!(!t.blur);
    }
}
