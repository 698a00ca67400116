use std::io::{self, IsTerminal};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crossterm::terminal::{disable_raw_mode, enable_raw_mode, is_raw_mode_enabled};
use tracing::{debug, info, warn};

use super::input::{EventPump, PumpEvent, pump_events};
use super::{GeometryCell, ResizeHandler};
use crate::error::{Result, ViewerError};

/// 合成リサイズの到着を待つ時間
const RAISE_TIMEOUT: Duration = Duration::from_secs(2);

/// 端末の入力モード
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RawState {
    #[default]
    Cooked,
    Raw,
}

/// 端末の raw モードとリサイズ処理を管理する
///
/// raw モード前の端末設定は crossterm が最初の `enable_raw_mode` で一度だけ保存し、
/// `disable_raw_mode` はその値に戻す。
pub struct RawTerminal {
    state: RawState,
    geometry: Arc<GeometryCell>,
    stop: Arc<AtomicBool>,
    pump: Option<JoinHandle<()>>,
}

impl RawTerminal {
    pub fn new(geometry: Arc<GeometryCell>) -> Self {
        Self {
            state: RawState::Cooked,
            geometry,
            stop: Arc::new(AtomicBool::new(false)),
            pump: None,
        }
    }

    pub fn is_raw(&self) -> bool {
        self.state == RawState::Raw
    }

    pub fn geometry(&self) -> &Arc<GeometryCell> {
        &self.geometry
    }

    /// raw モードに入る
    ///
    /// リサイズハンドラを登録（入力スレッドを起動）し、合成リサイズで端末サイズを
    /// 取得してから端末設定を切り替える。途中で失敗した場合は入力スレッドを止める。
    pub fn enter_raw(&mut self) -> Result<EventPump> {
        let result = self.try_enter_raw();
        if result.is_err() {
            self.stop_pump();
        }
        result
    }

    fn try_enter_raw(&mut self) -> Result<EventPump> {
        let handler = Arc::new(ResizeHandler::new(Arc::clone(&self.geometry)));
        let (tx, rx) = mpsc::channel();

        self.stop.store(false, Ordering::Release);
        let pump = thread::Builder::new()
            .name("bview-input".to_string())
            .spawn({
                let handler = Arc::clone(&handler);
                let stop = Arc::clone(&self.stop);
                move || pump_events(handler, tx, stop)
            })
            .map_err(ViewerError::SignalSetupFailed)?;
        self.pump = Some(pump);

        match rx.recv_timeout(RAISE_TIMEOUT) {
            Ok(PumpEvent::Resized) => {}
            _ => return Err(ViewerError::SignalRaiseFailed),
        }
        if handler.last_failed() {
            return Err(ViewerError::GeometryQueryFailed);
        }

        capture_initial_state()?;
        enable_raw_mode().map_err(ViewerError::TerminalStateApplyFailed)?;
        self.state = RawState::Raw;

        let geometry = self.geometry.load();
        info!(rows = geometry.rows, cols = geometry.cols, "entered raw mode");
        Ok(EventPump::new(rx))
    }

    /// raw モード前の端末設定に戻す
    pub fn exit_raw(&mut self) -> Result<()> {
        self.stop_pump();
        disable_raw_mode().map_err(ViewerError::TerminalStateRestoreFailed)?;
        self.state = RawState::Cooked;
        info!("left raw mode");
        Ok(())
    }

    fn stop_pump(&mut self) {
        self.stop.store(true, Ordering::Release);
        if let Some(pump) = self.pump.take() {
            if pump.join().is_err() {
                warn!("input thread panicked");
            }
        }
    }
}

impl Drop for RawTerminal {
    fn drop(&mut self) {
        if self.is_raw() {
            if let Err(e) = self.exit_raw() {
                warn!(error = %e, "could not restore terminal on drop");
            }
        } else {
            self.stop_pump();
        }
    }
}

/// パニック時にも端末を raw モード前の設定に戻すフックを登録する
///
/// release ビルドは `panic = "abort"` なので `Drop` による復元は走らない。
/// 既存のフックはそのまま後で呼ぶ。
pub fn restore_on_panic() {
    chain_panic_hook(|| {
        if let Err(e) = disable_raw_mode() {
            eprintln!("ERROR: Could not restore terminal initial state! ({})", e);
        }
    });
}

fn chain_panic_hook(restore: impl Fn() + Send + Sync + 'static) {
    let previous = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        restore();
        previous(info);
    }));
}

/// raw モード前の設定を保存できる状態か確認する
fn capture_initial_state() -> Result<()> {
    if !io::stdin().is_terminal() {
        return Err(ViewerError::TerminalStateCaptureFailed(io::Error::new(
            io::ErrorKind::Unsupported,
            "stdin is not a terminal",
        )));
    }
    // crossterm が保存済みの設定を持っていれば二重保存になる（tty の実際の状態は見ていない）
    if is_raw_mode_enabled().map_err(ViewerError::TerminalStateCaptureFailed)? {
        return Err(ViewerError::TerminalStateCaptureFailed(io::Error::new(
            io::ErrorKind::AlreadyExists,
            "initial terminal state already captured",
        )));
    }
    debug!("initial terminal state available");
    Ok(())
}
