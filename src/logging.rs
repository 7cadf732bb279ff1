//! 日志初始化
//!
//! 所有状态行同时写入配置的日志文件（追加）和 stderr。
//! 过滤级别由 `RUST_LOG` 控制，默认 `info`。

use std::fs::{File, OpenOptions};
use std::path::Path;
use std::sync::Mutex;

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// 以追加模式打开日志文件，不存在则创建
pub fn open_log_file(path: &Path) -> std::io::Result<File> {
    OpenOptions::new().create(true).append(true).open(path)
}

/// 初始化全局 tracing subscriber，只能调用一次
pub fn init(log_file: &Path) -> std::io::Result<()> {
    let file = open_log_file(log_file)?;
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .with_writer(Mutex::new(file))
                .with_ansi(false)
                .with_target(false),
        )
        .with(fmt::layer().with_writer(std::io::stderr).compact())
        .init();

    Ok(())
}
