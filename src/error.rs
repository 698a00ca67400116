use std::io;

use thiserror::Error;

/// ビューアのエラー種別
///
/// 表示文字列は診断メッセージとしてそのまま stderr に出力される。
#[derive(Debug, Error)]
pub enum ViewerError {
    #[error("Argument missing!")]
    ArgumentMissing,

    #[error("Could not open file!")]
    FileOpenFailed(#[source] io::Error),

    #[error("Could not set up resize handler!")]
    SignalSetupFailed(#[source] io::Error),

    #[error("Could not raise initial resize event!")]
    SignalRaiseFailed,

    #[error("Could not get terminal size!")]
    GeometryQueryFailed,

    #[error("Could not get terminal initial state!")]
    TerminalStateCaptureFailed(#[source] io::Error),

    #[error("Could not set terminal raw state!")]
    TerminalStateApplyFailed(#[source] io::Error),

    #[error("Could not restore terminal initial state!")]
    TerminalStateRestoreFailed(#[source] io::Error),

    #[error("Could not read!")]
    ReadFailed(#[source] io::Error),

    #[error("Could not seek in file!")]
    SeekFailed(#[source] io::Error),

    #[error("Could not switch display mode!")]
    ModeSwitchFailed(#[source] Box<ViewerError>),

    #[error("Could not write to terminal!")]
    WriteFailed(#[source] io::Error),
}

pub type Result<T> = std::result::Result<T, ViewerError>;
