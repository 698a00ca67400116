use std::io;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{Receiver, RecvTimeoutError, Sender};
use std::time::Duration;

use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use tracing::{debug, trace};

use super::ResizeHandler;
use crate::error::{Result, ViewerError};

/// キー入力を待つ最大時間
pub const INPUT_TIMEOUT: Duration = Duration::from_millis(100);

/// メインループに届く入力
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Input {
    /// 1キー分のバイト
    Key(u8),
    /// 端末サイズが変わった
    Resized,
    /// タイムアウトまで何も来なかった
    Idle,
}

/// 入力の供給元
pub trait KeySource {
    /// 次の入力を1つ取り出す（最大でもタイムアウト分しか待たない）
    fn next_input(&mut self) -> Result<Input>;
}

/// キーイベントを1バイトに変換
///
/// Ctrl+英字は制御文字、ASCII 文字はそのまま。押下以外や変換できないキーは `None`。
pub fn key_byte(key: KeyEvent) -> Option<u8> {
    if key.kind != KeyEventKind::Press {
        return None;
    }
    let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);

    match key.code {
        KeyCode::Char(ch) if ch.is_ascii() => {
            let byte = ch as u8;
            if ctrl && byte.is_ascii_alphabetic() {
                Some(byte.to_ascii_lowercase() & 0x1f)
            } else {
                Some(byte)
            }
        }
        // 非 ASCII 文字は UTF-8 の先頭バイトだけを渡す
        KeyCode::Char(ch) => {
            let mut buf = [0u8; 4];
            ch.encode_utf8(&mut buf).as_bytes().first().copied()
        }
        KeyCode::Enter => Some(b'\r'),
        KeyCode::Tab => Some(b'\t'),
        KeyCode::Backspace => Some(0x7f),
        KeyCode::Esc => Some(0x1b),
        _ => None,
    }
}

/// 入力スレッドからメインループへのメッセージ
#[derive(Debug)]
pub(super) enum PumpEvent {
    Key(u8),
    Resized,
    Failed(io::Error),
}

/// 入力スレッドの受信側
pub struct EventPump {
    rx: Receiver<PumpEvent>,
    timeout: Duration,
}

impl EventPump {
    pub(super) fn new(rx: Receiver<PumpEvent>) -> Self {
        Self {
            rx,
            timeout: INPUT_TIMEOUT,
        }
    }
}

impl KeySource for EventPump {
    fn next_input(&mut self) -> Result<Input> {
        match self.rx.recv_timeout(self.timeout) {
            Ok(PumpEvent::Key(byte)) => Ok(Input::Key(byte)),
            Ok(PumpEvent::Resized) => Ok(Input::Resized),
            Ok(PumpEvent::Failed(e)) => Err(ViewerError::ReadFailed(e)),
            Err(RecvTimeoutError::Timeout) => Ok(Input::Idle),
            Err(RecvTimeoutError::Disconnected) => Err(ViewerError::ReadFailed(io::Error::new(
                io::ErrorKind::BrokenPipe,
                "input thread stopped",
            ))),
        }
    }
}

/// 入力スレッド本体
///
/// 最初に合成リサイズ（現在サイズの問い合わせ）を処理して `Resized` を送る。
/// 以降は端末イベントを読み、リサイズはハンドラに、キーはメインループに渡す。
pub(super) fn pump_events(handler: Arc<ResizeHandler>, tx: Sender<PumpEvent>, stop: Arc<AtomicBool>) {
    handler.handle(crossterm::terminal::size());
    if tx.send(PumpEvent::Resized).is_err() {
        return;
    }

    while !stop.load(Ordering::Acquire) {
        let event = match event::poll(INPUT_TIMEOUT) {
            Ok(true) => event::read(),
            Ok(false) => continue,
            Err(e) => Err(e),
        };

        let message = match event {
            Ok(Event::Key(key)) => match key_byte(key) {
                Some(byte) => PumpEvent::Key(byte),
                None => continue,
            },
            // 稼働中のリサイズ失敗は無視（サイズは前回のまま）
            Ok(Event::Resize(cols, rows)) => {
                if !handler.handle(Ok((cols, rows))) {
                    continue;
                }
                PumpEvent::Resized
            }
            Ok(_) => continue,
            Err(e) => {
                debug!(error = %e, "terminal event read failed");
                let _ = tx.send(PumpEvent::Failed(e));
                break;
            }
        };

        trace!(?message, "input event");
        if tx.send(message).is_err() {
            break;
        }
    }
    debug!("input thread finished");
}
