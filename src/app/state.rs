use std::io::{Read, Seek, Write};
use std::sync::Arc;

use tracing::{debug, error, trace};

use super::{Command, LoopState};
use crate::buffer::ByteSource;
use crate::error::{Result, ViewerError};
use crate::terminal::{Geometry, GeometryCell, Input, KeySource};
use crate::ui::{ModeCursors, ViewMode, render_frame};

/// ビューアのセッション状態
///
/// バイトソース・入力・出力・端末サイズをまとめて持ち、メインループを回す。
/// 端末サイズはリサイズハンドラが書き込むセルから毎回読み直す。
pub struct Viewer<R, K, W> {
    /// 表示中のバイトソース
    source: ByteSource<R>,
    /// 入力元
    keys: K,
    /// 描画先
    out: W,
    /// 最新の端末サイズ
    geometry: Arc<GeometryCell>,
    /// アクティブな表示モード
    active: ViewMode,
    /// 非アクティブなモードのカーソル位置
    cursors: ModeCursors,
}

impl<R, K, W> Viewer<R, K, W>
where
    R: Read + Seek,
    K: KeySource,
    W: Write,
{
    pub fn new(
        source: ByteSource<R>,
        keys: K,
        out: W,
        geometry: Arc<GeometryCell>,
        mode: ViewMode,
    ) -> Self {
        Self {
            source,
            keys,
            out,
            geometry,
            active: mode,
            cursors: ModeCursors::default(),
        }
    }

    /// アクティブな表示モード
    pub fn active_mode(&self) -> ViewMode {
        self.active
    }

    /// 現在のファイルオフセット
    pub fn offset(&mut self) -> Result<u64> {
        self.source.tell()
    }

    pub fn output(&self) -> &W {
        &self.out
    }

    /// バイトソースを取り出す（終了処理用）
    pub fn into_source(self) -> ByteSource<R> {
        self.source
    }

    fn geometry(&self) -> Geometry {
        self.geometry.load()
    }

    /// アクティブモードの1行あたりのバイト数
    fn row_width(&self) -> i64 {
        self.active.row_width(self.geometry().cols) as i64
    }

    /// メインループ
    ///
    /// 最初に一度描画し、以降は状態が変わった入力の後だけ再描画する。
    /// 終了キーで `Ok`、途中のエラーはそのまま返す。
    pub fn run(&mut self) -> Result<()> {
        let mut state = LoopState::Acting;
        while state.is_running() {
            if state == LoopState::Acting {
                self.redraw()?;
            }
            state = self.next_state().inspect_err(|e| {
                error!(error = %e, "viewer loop stopped");
            })?;
        }
        debug!("quit requested");
        Ok(())
    }

    fn next_state(&mut self) -> Result<LoopState> {
        match self.keys.next_input()? {
            Input::Key(byte) => self.process_key(byte),
            Input::Resized => Ok(LoopState::Acting),
            Input::Idle => Ok(LoopState::Ignoring),
        }
    }

    /// フレームを描画
    pub fn redraw(&mut self) -> Result<()> {
        let geometry = self.geometry();
        render_frame(&mut self.source, self.active, geometry, &mut self.out)?;
        Ok(())
    }

    /// 1バイトの入力を処理して次の状態を返す
    pub fn process_key(&mut self, byte: u8) -> Result<LoopState> {
        let width = self.row_width();
        let command = Command::from_byte(byte);
        trace!(byte, ?command, "key");

        match command {
            Command::Quit => Ok(LoopState::Quit),
            Command::RowUp => {
                self.source.seek_relative(-width)?;
                Ok(LoopState::Acting)
            }
            Command::RowDown => {
                self.advance_row(width)?;
                Ok(LoopState::Acting)
            }
            Command::PageUp => {
                let rows = i64::from(self.geometry().rows);
                self.source.seek_relative(-(rows * width))?;
                Ok(LoopState::Acting)
            }
            Command::PageDown => {
                for _ in 0..self.geometry().rows {
                    if !self.advance_row(width)? {
                        break;
                    }
                }
                Ok(LoopState::Acting)
            }
            Command::SwitchMode(mode) if mode == self.active => Ok(LoopState::Ignoring),
            Command::SwitchMode(mode) => {
                self.switch_mode(mode)
                    .map_err(|e| ViewerError::ModeSwitchFailed(Box::new(e)))?;
                Ok(LoopState::Acting)
            }
            Command::None => Ok(LoopState::Ignoring),
        }
    }

    /// 末尾を越えなければ1行進める。進めたかどうかを返す
    fn advance_row(&mut self, width: i64) -> Result<bool> {
        if self.source.would_exceed_end(width)? {
            return Ok(false);
        }
        self.source.seek_relative(width)?;
        Ok(true)
    }

    /// 表示モードを切り替える
    ///
    /// 現在のオフセットを切り替え前のモードのカーソルに保存し、
    /// 切り替え先のカーソル位置へシークする。
    fn switch_mode(&mut self, mode: ViewMode) -> Result<()> {
        let offset = self.source.tell()?;
        self.cursors.set(self.active.cursor_slot(), offset);

        let target = self.cursors.get(mode.cursor_slot());
        self.source.seek_absolute(target)?;
        debug!(from = self.active.name(), to = mode.name(), offset, target, "switched mode");
        self.active = mode;
        Ok(())
    }
}
