mod state;

pub use state::Viewer;

use crate::ui::ViewMode;

/// Ctrl+キー のバイト値
pub const fn ctrl_key(key: u8) -> u8 {
    key & 0x1f
}

const KEY_QUIT: u8 = ctrl_key(b'q');
const KEY_CHAR_MODE: u8 = ctrl_key(b'c');

/// 1キー処理後のループ状態
///
/// エラーは `Err` として返るので、ここには含めない。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopState {
    /// 状態が変わったので再描画する
    Acting,
    /// 何も変わっていない
    Ignoring,
    /// 終了
    Quit,
}

impl LoopState {
    /// ループを続けるか
    pub fn is_running(self) -> bool {
        matches!(self, LoopState::Acting | LoopState::Ignoring)
    }
}

/// キー入力から解釈したコマンド
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Quit,
    /// 1行戻る
    RowUp,
    /// 1行進む（末尾を越えない場合のみ）
    RowDown,
    /// 1画面戻る
    PageUp,
    /// 1画面進む（末尾の手前で止まる）
    PageDown,
    SwitchMode(ViewMode),
    None,
}

impl Command {
    /// 入力バイトからコマンドに変換
    pub fn from_byte(byte: u8) -> Self {
        match byte {
            KEY_QUIT => Command::Quit,
            b'w' | b'W' => Command::RowUp,
            b's' | b'S' => Command::RowDown,
            b'a' | b'A' => Command::PageUp,
            b'd' | b'D' => Command::PageDown,
            b'h' | b'H' => Command::SwitchMode(ViewMode::Hex),
            b'c' | b'C' => Command::SwitchMode(ViewMode::FormattedChar),
            KEY_CHAR_MODE => Command::SwitchMode(ViewMode::Char),
            _ => Command::None,
        }
    }
}
