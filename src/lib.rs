//! Paperize - 壁纸轮换工具
//!
//! 基于 paperize-core 的命令行宿主：管理相册、选中与设置，发送触发，
//! 或常驻运行轮换工作线程。

pub mod cli;
pub mod commands;
pub mod logging;

use std::io::{self, BufRead};
use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use serde::Serialize;

use paperize_core::models::Trigger;
use paperize_core::{
    AppResult, DefaultPathProvider, LoggingEventSink, PaperizeCore, SharedPathProvider,
};

use cli::{AlbumCommands, Cli, Commands, SettingsCommands, TriggerOptions};
use commands::TriggerOverrides;

/// 应用程序状态
pub struct AppState {
    pub core: PaperizeCore,
}

impl AppState {
    pub fn with_provider(path_provider: SharedPathProvider) -> AppResult<Self> {
        let core = PaperizeCore::new(path_provider, Arc::new(LoggingEventSink))?;
        Ok(Self { core })
    }

    pub fn with_data_dir(data_dir: PathBuf) -> AppResult<Self> {
        Self::with_provider(Arc::new(DefaultPathProvider::with_base_dir(data_dir)))
    }
}

impl From<&TriggerOptions> for TriggerOverrides {
    fn from(options: &TriggerOptions) -> Self {
        Self {
            home_interval: options.home_interval,
            lock_interval: options.lock_interval,
            separate: options.separate,
            mode: options.mode.into(),
        }
    }
}

fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

pub fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let path_provider: SharedPathProvider = match &cli.data_dir {
        Some(dir) => Arc::new(DefaultPathProvider::with_base_dir(dir.clone())),
        None => Arc::new(DefaultPathProvider::new()),
    };

    // 初始化日志系统
    let _guard = logging::init_logging(&path_provider.logs_dir(), cli.verbose)?;

    tracing::info!("Paperize 启动中...");
    tracing::info!("数据目录: {:?}", path_provider.app_data_dir());

    let state = AppState::with_provider(path_provider)?;

    match cli.command {
        Commands::Album(cmd) => match cmd {
            AlbumCommands::Create { name, display_name } => {
                print_json(&commands::create_album(&state, name, display_name)?)?;
            }
            AlbumCommands::Add { album, paths } => {
                let added = commands::add_wallpapers(&state, &album, &paths)?;
                println!("已添加 {} 张壁纸", added);
            }
            AlbumCommands::AddFolder {
                album,
                folder,
                recursive,
            } => {
                print_json(&commands::add_folder(&state, &album, &folder, recursive)?)?;
            }
            AlbumCommands::List => print_json(&commands::list_albums(&state)?)?,
            AlbumCommands::Delete { name } => {
                if !commands::delete_album(&state, &name)? {
                    anyhow::bail!("相册不存在: {}", name);
                }
            }
        },
        Commands::Select(args) => {
            let selected = commands::select_album(&state, &args.album, args.home, args.lock)?;
            println!(
                "已选中相册 {} ({} 张壁纸)",
                selected.name(),
                selected.wallpapers.len()
            );
        }
        Commands::Deselect => commands::deselect_all(&state)?,
        Commands::Settings(cmd) => match cmd {
            SettingsCommands::Get { key } => print_json(&commands::get_setting(&state, &key)?)?,
            SettingsCommands::Set { key, value } => commands::set_setting(&state, &key, &value)?,
            SettingsCommands::List => print_json(&commands::list_settings(&state))?,
        },
        Commands::Trigger(args) => {
            let params = commands::trigger_params(&state, &TriggerOverrides::from(&args.options))?;
            for outcome in commands::run_trigger(&state, args.trigger.into(), params)? {
                println!("{:?}", outcome);
            }
        }
        Commands::Run(args) => run_daemon(&state, &args.options, args.no_stdin)?,
        Commands::Stats => print_json(&state.core.db.stats()?)?,
    }

    Ok(())
}

/// 常驻运行：启动工作线程并装载 `start`
///
/// 标准输入的每一行是一个触发名（start / requeue / update / refresh），
/// `quit` 或输入结束时退出。
fn run_daemon(state: &AppState, options: &TriggerOptions, no_stdin: bool) -> anyhow::Result<()> {
    let overrides = TriggerOverrides::from(options);
    let core = &state.core;

    core.start()?;
    core.dispatch(Trigger::Start, commands::trigger_params(state, &overrides)?)?;
    tracing::info!("Paperize 已开始运行");

    if no_stdin {
        loop {
            std::thread::park();
        }
    }

    for line in io::stdin().lock().lines() {
        let line = line?;
        let input = line.trim();
        if input.is_empty() {
            continue;
        }
        if matches!(input, "quit" | "exit") {
            break;
        }

        match Trigger::from_str(input) {
            Some(trigger) => {
                // 每次都从设置重新读取间隔
                let params = commands::trigger_params(state, &overrides.without_intervals())?;
                core.dispatch(trigger, params)?;
            }
            None => eprintln!("未知触发: {}", input),
        }
    }

    core.shutdown();
    tracing::info!("Paperize 已退出");
    Ok(())
}
