use std::io;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use clap::{Parser, ValueEnum, error::ErrorKind};
use tracing::{error, info};

use bview::app::Viewer;
use bview::buffer::ByteSource;
use bview::terminal::{GeometryCell, RawTerminal, restore_on_panic};
use bview::ui::ViewMode;
use bview::{Result, ViewerError, logging};

/// Terminal viewer for binary files
#[derive(Parser, Debug)]
#[command(name = "bview")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// File to view
    #[arg(value_name = "FILE")]
    file: PathBuf,

    /// Display mode on startup
    #[arg(short, long, value_enum, default_value_t = StartMode::Hex)]
    mode: StartMode,

    /// Write a debug log to this file
    #[arg(long, value_name = "PATH", env = "BVIEW_LOG")]
    log_file: Option<PathBuf>,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum StartMode {
    Hex,
    Formatted,
    Char,
}

impl From<StartMode> for ViewMode {
    fn from(mode: StartMode) -> Self {
        match mode {
            StartMode::Hex => ViewMode::Hex,
            StartMode::Formatted => ViewMode::FormattedChar,
            StartMode::Char => ViewMode::Char,
        }
    }
}

fn main() -> ExitCode {
    let args = match Args::try_parse() {
        Ok(args) => args,
        Err(e) if e.kind() == ErrorKind::MissingRequiredArgument => {
            report(&ViewerError::ArgumentMissing);
            return ExitCode::FAILURE;
        }
        Err(e) => e.exit(),
    };

    let _log_guard = match args.log_file.as_deref().map(logging::init).transpose() {
        Ok(guard) => guard,
        Err(e) => {
            eprintln!("Warning: Could not initialize file logging: {:#}", e);
            None
        }
    };

    restore_on_panic();

    match run(&args) {
        Ok(()) => {
            info!("exited normally");
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!(error = %e, "exited with error");
            report(&e);
            ExitCode::FAILURE
        }
    }
}

/// ビューアを実行する
///
/// 端末の復元とファイルのクローズはどの経路でも試みる。
/// 復元の失敗は報告するだけで、終了ステータスは変えない。
fn run(args: &Args) -> Result<()> {
    let source = ByteSource::open(&args.file)?;

    let geometry = Arc::new(GeometryCell::default());
    let mut terminal = RawTerminal::new(Arc::clone(&geometry));
    let keys = terminal.enter_raw()?;

    let mut viewer = Viewer::new(source, keys, io::stdout(), geometry, args.mode.into());
    let result = viewer.run();

    if terminal.is_raw() {
        if let Err(e) = terminal.exit_raw() {
            report(&e);
        }
    }
    drop(viewer.into_source());

    result
}

/// 診断メッセージを1行出力
fn report(e: &ViewerError) {
    eprintln!("ERROR: {}", e);
}
