//! 触发信号数据模型

use serde::{Deserialize, Serialize};

use super::settings::DEFAULT_INTERVAL_MINUTES;

/// 轮换目标
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Target {
    Home,
    Lock,
}

impl Target {
    pub const BOTH: [Target; 2] = [Target::Home, Target::Lock];

    pub fn as_str(&self) -> &'static str {
        match self {
            Target::Home => "home",
            Target::Lock => "lock",
        }
    }

    pub fn other(&self) -> Target {
        match self {
            Target::Home => Target::Lock,
            Target::Lock => Target::Home,
        }
    }
}

impl std::fmt::Display for Target {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 外部触发信号
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Trigger {
    /// 首次装载 / 定时到期：轮换壁纸
    Start,
    /// 间隔变更后重新装载，不更换壁纸
    Requeue,
    /// 以当前变换设置重新应用当前壁纸
    Update,
    /// 运行相册刷新
    Refresh,
}

impl Trigger {
    pub fn as_str(&self) -> &'static str {
        match self {
            Trigger::Start => "start",
            Trigger::Requeue => "requeue",
            Trigger::Update => "update",
            Trigger::Refresh => "refresh",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "start" => Some(Trigger::Start),
            "requeue" => Some(Trigger::Requeue),
            "update" => Some(Trigger::Update),
            "refresh" => Some(Trigger::Refresh),
            _ => None,
        }
    }
}

/// 轮换模式标签，决定触发信号由哪个目标的 worker 处理
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum RotationMode {
    /// 主屏 + 锁屏共用一个调度
    #[default]
    Combined,
    Home,
    Lock,
}

impl RotationMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            RotationMode::Combined => "combined",
            RotationMode::Home => "home",
            RotationMode::Lock => "lock",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "combined" => Some(RotationMode::Combined),
            "home" => Some(RotationMode::Home),
            "lock" => Some(RotationMode::Lock),
            _ => None,
        }
    }

    /// 处理该模式的 worker
    pub fn target(&self) -> Target {
        match self {
            RotationMode::Combined | RotationMode::Home => Target::Home,
            RotationMode::Lock => Target::Lock,
        }
    }

    pub fn for_target(target: Target) -> Self {
        match target {
            Target::Home => RotationMode::Home,
            Target::Lock => RotationMode::Lock,
        }
    }
}

/// 每个触发信号携带的参数（逐次传递，不保存在进程级状态中）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TriggerParams {
    pub home_interval_minutes: u32,
    pub lock_interval_minutes: u32,
    pub schedule_separately: bool,
    pub mode: RotationMode,
}

impl Default for TriggerParams {
    fn default() -> Self {
        Self {
            home_interval_minutes: DEFAULT_INTERVAL_MINUTES,
            lock_interval_minutes: DEFAULT_INTERVAL_MINUTES,
            schedule_separately: false,
            mode: RotationMode::default(),
        }
    }
}

impl TriggerParams {
    pub fn interval_minutes(&self, target: Target) -> u32 {
        match target {
            Target::Home => self.home_interval_minutes,
            Target::Lock => self.lock_interval_minutes,
        }
    }

    pub fn intervals_differ(&self) -> bool {
        self.home_interval_minutes != self.lock_interval_minutes
    }

    /// 同一参数，改投给另一个模式
    pub fn with_mode(&self, mode: RotationMode) -> Self {
        Self { mode, ..*self }
    }
}

/// 投递给 worker 的一次触发
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TriggerJob {
    pub trigger: Trigger,
    pub params: TriggerParams,
}

impl TriggerJob {
    pub fn new(trigger: Trigger, params: TriggerParams) -> Self {
        Self { trigger, params }
    }

    pub fn target(&self) -> Target {
        self.params.mode.target()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mode_routing() {
        assert_eq!(RotationMode::Combined.target(), Target::Home);
        assert_eq!(RotationMode::Home.target(), Target::Home);
        assert_eq!(RotationMode::Lock.target(), Target::Lock);
    }

    #[test]
    fn test_trigger_parse() {
        assert_eq!(Trigger::from_str("Refresh"), Some(Trigger::Refresh));
        assert_eq!(Trigger::from_str("reboot"), None);
    }

    #[test]
    fn test_params_intervals() {
        let params = TriggerParams {
            home_interval_minutes: 30,
            lock_interval_minutes: 60,
            schedule_separately: true,
            mode: RotationMode::Lock,
        };
        assert!(params.intervals_differ());
        assert_eq!(params.interval_minutes(Target::Lock), 60);
        assert_eq!(params.with_mode(RotationMode::Home).mode, RotationMode::Home);
        assert_eq!(Target::Home.other(), Target::Lock);
    }
}
