//! 日志初始化
//!
//! 终端输出 + 按天滚动的日志文件。`RUST_LOG` 可覆盖默认级别。

use std::path::Path;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// 日志文件名前缀
pub const LOG_FILE_PREFIX: &str = "paperize.log";

/// 初始化日志系统；返回的 guard 需要在进程结束前一直持有
pub fn init_logging(logs_dir: &Path, verbose: bool) -> anyhow::Result<WorkerGuard> {
    std::fs::create_dir_all(logs_dir)?;

    let file_appender = tracing_appender::rolling::daily(logs_dir, LOG_FILE_PREFIX);
    let (file_writer, guard) = tracing_appender::non_blocking(file_appender);

    let default_level = if verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(fmt::layer().with_ansi(false).with_writer(file_writer))
        .try_init()?;

    Ok(guard)
}
