//! Paperize 数据模型模块
//!
//! 包含所有数据结构定义

pub mod album;
pub mod selected;
pub mod settings;
pub mod trigger;

// 重新导出常用类型
pub use album::{
    wallpaper_key, Album, AlbumWithCount, AlbumWithWallpaper, CreateAlbum, Folder, Wallpaper,
};
pub use selected::SelectedAlbum;
pub use settings::{
    DisplaySize, RotationConfig, ScalingMode, SettingKey, TransformOptions,
    DEFAULT_FOLLOW_UP_DELAY_SECS, DEFAULT_INTERVAL_MINUTES, MAX_DISPLAY_EDGE,
    MAX_FOLLOW_UP_DELAY_SECS,
};
pub use trigger::{RotationMode, Target, Trigger, TriggerJob, TriggerParams};

use chrono::{Local, NaiveDateTime};

/// 持久化时间格式（ISO 8601，本地时间）
pub const TIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";
/// 通知中展示的时间格式
pub const DISPLAY_TIME_FORMAT: &str = "%Y-%m-%d %H:%M";

/// 当前本地时间
pub fn local_now() -> NaiveDateTime {
    Local::now().naive_local()
}

/// 获取当前 ISO 8601 时间字符串
pub fn now_iso8601() -> String {
    format_time(&local_now())
}

pub fn format_time(time: &NaiveDateTime) -> String {
    time.format(TIME_FORMAT).to_string()
}

pub fn format_display_time(time: &NaiveDateTime) -> String {
    time.format(DISPLAY_TIME_FORMAT).to_string()
}

/// 解析持久化的时间；格式不对时返回 None
pub fn parse_time(value: &str) -> Option<NaiveDateTime> {
    NaiveDateTime::parse_from_str(value, TIME_FORMAT).ok()
}
