//! File logging setup.
//!
//! The terminal is in raw mode and stdout carries the frame, so logs only ever
//! go to a file. Filtering follows `RUST_LOG` (default `debug`):
//! - `RUST_LOG=bview=trace` - every key and frame
//! - `RUST_LOG=bview::terminal=debug` - resize handling only

use std::path::Path;

use anyhow::{Context, Result};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{EnvFilter, Layer, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// ログファイルへの出力を初期化する
///
/// 戻り値のガードを保持している間だけログが書き出される。
pub fn init(path: &Path) -> Result<WorkerGuard> {
    let dir = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    let file_name = path
        .file_name()
        .with_context(|| format!("log path has no file name: {}", path.display()))?;

    std::fs::create_dir_all(dir)
        .with_context(|| format!("could not create log directory {}", dir.display()))?;

    let appender = tracing_appender::rolling::never(dir, file_name);
    let (writer, guard) = tracing_appender::non_blocking(appender);

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug"));
    let file_layer = fmt::layer()
        .with_writer(writer)
        .with_ansi(false)
        .with_target(true)
        .with_line_number(true)
        .with_filter(filter);

    tracing_subscriber::registry()
        .with(file_layer)
        .try_init()
        .context("could not install log subscriber")?;

    Ok(guard)
}
