//! 命令行参数定义

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use paperize_core::models::{RotationMode, Trigger};

#[derive(Parser, Debug)]
#[command(name = "paperize")]
#[command(version)]
#[command(about = "Paperize 壁纸轮换工具", long_about = None)]
pub struct Cli {
    /// 数据目录（默认为系统数据目录下的 Paperize）
    #[arg(long = "data-dir", global = true)]
    pub data_dir: Option<PathBuf>,

    /// 输出调试日志
    #[arg(short = 'v', long = "verbose", global = true, default_value_t = false)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// 相册管理
    #[command(subcommand)]
    Album(AlbumCommands),

    /// 选中相册作为主屏 / 锁屏的轮换来源（不指定目标时两者都选）
    Select(SelectArgs),

    /// 取消全部选中并关闭轮换
    Deselect,

    /// 轮换设置
    #[command(subcommand)]
    Settings(SettingsCommands),

    /// 在当前进程中处理一次触发
    Trigger(TriggerArgs),

    /// 常驻运行：启动工作线程并装载轮换
    Run(RunArgs),

    /// 数据库统计
    Stats,
}

#[derive(Subcommand, Debug)]
pub enum AlbumCommands {
    /// 创建相册
    Create {
        name: String,
        /// 显示名（默认与相册名相同）
        #[arg(long = "display-name")]
        display_name: Option<String>,
    },
    /// 向相册添加图片文件
    Add {
        album: String,
        #[arg(required = true)]
        paths: Vec<PathBuf>,
    },
    /// 向相册添加文件夹
    AddFolder {
        album: String,
        folder: PathBuf,
        /// 递归扫描子目录
        #[arg(long, default_value_t = false)]
        recursive: bool,
    },
    /// 列出全部相册
    List,
    /// 删除相册
    Delete { name: String },
}

#[derive(Args, Debug)]
pub struct SelectArgs {
    pub album: String,

    /// 作为主屏来源
    #[arg(long, default_value_t = false)]
    pub home: bool,

    /// 作为锁屏来源
    #[arg(long, default_value_t = false)]
    pub lock: bool,
}

#[derive(Subcommand, Debug)]
pub enum SettingsCommands {
    /// 读取设置
    Get { key: String },
    /// 写入设置
    Set { key: String, value: String },
    /// 列出全部设置及生效值
    List,
}

#[derive(Args, Debug)]
pub struct TriggerArgs {
    #[arg(value_enum)]
    pub trigger: TriggerKind,

    #[command(flatten)]
    pub options: TriggerOptions,
}

#[derive(Args, Debug)]
pub struct RunArgs {
    #[command(flatten)]
    pub options: TriggerOptions,

    /// 不从标准输入读取触发，一直运行直到进程被终止
    #[arg(long = "no-stdin", default_value_t = false)]
    pub no_stdin: bool,
}

/// 触发参数；提供的间隔与分开调度标志会写回设置
#[derive(Args, Debug, Clone, Default)]
pub struct TriggerOptions {
    /// 主屏间隔（分钟）
    #[arg(long = "home-interval")]
    pub home_interval: Option<u32>,

    /// 锁屏间隔（分钟）
    #[arg(long = "lock-interval")]
    pub lock_interval: Option<u32>,

    /// 主屏与锁屏分开调度（`--separate false` 关闭）
    #[arg(long, num_args = 0..=1, default_missing_value = "true")]
    pub separate: Option<bool>,

    /// 触发投递给哪个目标
    #[arg(long, value_enum, default_value_t = ModeArg::Combined)]
    pub mode: ModeArg,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum TriggerKind {
    Start,
    Requeue,
    Update,
    Refresh,
}

impl From<TriggerKind> for Trigger {
    fn from(kind: TriggerKind) -> Self {
        match kind {
            TriggerKind::Start => Trigger::Start,
            TriggerKind::Requeue => Trigger::Requeue,
            TriggerKind::Update => Trigger::Update,
            TriggerKind::Refresh => Trigger::Refresh,
        }
    }
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ModeArg {
    #[default]
    Combined,
    Home,
    Lock,
}

impl From<ModeArg> for RotationMode {
    fn from(mode: ModeArg) -> Self {
        match mode {
            ModeArg::Combined => RotationMode::Combined,
            ModeArg::Home => RotationMode::Home,
            ModeArg::Lock => RotationMode::Lock,
        }
    }
}
