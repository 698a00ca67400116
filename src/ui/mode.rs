use std::io::{Read, Seek};

use crate::buffer::ByteSource;
use crate::error::Result;

/// 表示モード
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ViewMode {
    /// 2桁の16進数をスペース区切りで表示
    #[default]
    Hex,
    /// 1バイト3桁幅のセルに文字を表示（HEX表示と桁が揃う）
    FormattedChar,
    /// 1バイト1文字で詰めて表示
    Char,
}

/// モードが保持するカーソルの置き場所
///
/// Hex と FormattedChar は同じカーソルを共有し、Char は独立している。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CursorSlot {
    Shared,
    Char,
}

impl ViewMode {
    pub const ALL: [ViewMode; 3] = [ViewMode::Hex, ViewMode::FormattedChar, ViewMode::Char];

    /// ステータス表示・ログ用の短い名前
    pub fn name(self) -> &'static str {
        match self {
            ViewMode::Hex => "HEX",
            ViewMode::FormattedChar => "FMT",
            ViewMode::Char => "CHR",
        }
    }

    /// 端末の桁数から1行あたりのバイト数を求める
    pub fn row_width(self, cols: u16) -> usize {
        match self {
            ViewMode::Hex | ViewMode::FormattedChar => cols as usize / 3,
            ViewMode::Char => cols as usize,
        }
    }

    pub fn cursor_slot(self) -> CursorSlot {
        match self {
            ViewMode::Hex | ViewMode::FormattedChar => CursorSlot::Shared,
            ViewMode::Char => CursorSlot::Char,
        }
    }

    /// バイト列を表示用に整形して `out` に追加
    pub fn format_into(self, bytes: &[u8], out: &mut String) {
        match self {
            ViewMode::Hex => {
                for (i, &byte) in bytes.iter().enumerate() {
                    if i > 0 {
                        out.push(' ');
                    }
                    out.push(HEX_DIGITS[usize::from(byte >> 4)] as char);
                    out.push(HEX_DIGITS[usize::from(byte & 0x0f)] as char);
                }
            }
            ViewMode::FormattedChar => {
                for (i, &byte) in bytes.iter().enumerate() {
                    if i > 0 {
                        out.push(' ');
                    }
                    out.push(' ');
                    out.push(display_char(byte));
                }
            }
            ViewMode::Char => out.extend(bytes.iter().map(|&b| display_char(b))),
        }
    }

    /// ソースから最大 `count` バイト読み、整形して `out` に追加する
    ///
    /// 戻り値は消費したバイト数。EOF なら 0 で `out` は変わらない。
    pub fn render_run<R: Read + Seek>(
        self,
        source: &mut ByteSource<R>,
        count: usize,
        out: &mut String,
    ) -> Result<usize> {
        let mut bytes = Vec::with_capacity(count);
        let read = source.read_into(count, &mut bytes)?;
        self.format_into(&bytes, out);
        Ok(read)
    }
}

const HEX_DIGITS: &[u8; 16] = b"0123456789ABCDEF";

/// 表示可能な ASCII はそのまま、それ以外は '.'
fn display_char(byte: u8) -> char {
    if byte.is_ascii_graphic() || byte == b' ' {
        byte as char
    } else {
        '.'
    }
}

/// モードごとのカーソル位置
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ModeCursors {
    shared: u64,
    char: u64,
}

impl ModeCursors {
    pub fn get(&self, slot: CursorSlot) -> u64 {
        match slot {
            CursorSlot::Shared => self.shared,
            CursorSlot::Char => self.char,
        }
    }

    pub fn set(&mut self, slot: CursorSlot, offset: u64) {
        match slot {
            CursorSlot::Shared => self.shared = offset,
            CursorSlot::Char => self.char = offset,
        }
    }
}
