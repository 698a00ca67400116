use std::io::{Read, Seek, Write};

use crossterm::{
    cursor::{Hide, MoveTo, Show},
    queue,
    style::Print,
    terminal::{Clear, ClearType},
};
use tracing::trace;

use super::ViewMode;
use crate::buffer::ByteSource;
use crate::error::{Result, ViewerError};
use crate::terminal::Geometry;

/// 1画面分のフレームを描画する
///
/// 各行はアクティブモードで整形し、行末を消去する。フレーム全体を組み立ててから
/// 一度の書き込みで出力する。読み進めたバイトは描画後に巻き戻すので、
/// ソースのオフセットは変わらない。戻り値は描画に使ったバイト数。
pub fn render_frame<R, W>(
    source: &mut ByteSource<R>,
    mode: ViewMode,
    geometry: Geometry,
    out: &mut W,
) -> Result<usize>
where
    R: Read + Seek,
    W: Write,
{
    let width = mode.row_width(geometry.cols);
    let mut frame: Vec<u8> = Vec::new();

    queue!(frame, Hide, MoveTo(0, 0)).map_err(ViewerError::WriteFailed)?;

    let consumed = source.peek(|source| {
        let mut total = 0;
        let mut row = String::new();
        for y in 0..geometry.rows {
            row.clear();
            total += mode.render_run(source, width, &mut row)?;
            queue!(frame, Print(&row), Clear(ClearType::UntilNewLine))
                .map_err(ViewerError::WriteFailed)?;
            if y + 1 < geometry.rows {
                queue!(frame, Print("\r\n")).map_err(ViewerError::WriteFailed)?;
            }
        }
        Ok(total)
    })?;

    queue!(frame, MoveTo(0, 0), Show).map_err(ViewerError::WriteFailed)?;

    out.write_all(&frame).map_err(ViewerError::WriteFailed)?;
    out.flush().map_err(ViewerError::WriteFailed)?;

    trace!(mode = mode.name(), rows = geometry.rows, width, consumed, "frame drawn");
    Ok(consumed)
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use super::*;

    const HIDE: &str = "\x1b[?25l";
    const SHOW: &str = "\x1b[?25h";
    const HOME: &str = "\x1b[1;1H";
    const ERASE: &str = "\x1b[K";

    fn draw(data: &[u8], start: u64, mode: ViewMode, geometry: Geometry) -> (String, usize, u64) {
        let mut src = ByteSource::new(Cursor::new(data.to_vec())).unwrap();
        src.seek_absolute(start).unwrap();
        let mut out = Vec::new();
        let consumed = render_frame(&mut src, mode, geometry, &mut out).unwrap();
        let offset = src.tell().unwrap();
        (String::from_utf8(out).unwrap(), consumed, offset)
    }

    #[test]
    fn single_row_frame() {
        let (out, consumed, offset) =
            draw(b"ABCDEFGHIJ", 0, ViewMode::Hex, Geometry::new(1, 30));
        assert_eq!(
            out,
            format!("{HIDE}{HOME}41 42 43 44 45 46 47 48 49 4A{ERASE}{HOME}{SHOW}")
        );
        assert_eq!(consumed, 10);
        assert_eq!(offset, 0);
    }

    #[test]
    fn rows_past_eof_are_blank() {
        let (out, consumed, _) = draw(b"ABCDEFGHIJ", 0, ViewMode::Char, Geometry::new(3, 4));
        assert_eq!(
            out,
            format!("{HIDE}{HOME}ABCD{ERASE}\r\nEFGH{ERASE}\r\nIJ{ERASE}{HOME}{SHOW}")
        );
        assert_eq!(consumed, 10);

        let (out, _, _) = draw(b"AB", 0, ViewMode::Char, Geometry::new(3, 4));
        assert_eq!(
            out,
            format!("{HIDE}{HOME}AB{ERASE}\r\n{ERASE}\r\n{ERASE}{HOME}{SHOW}")
        );
    }

    #[test]
    fn frame_does_not_move_offset() {
        let data: Vec<u8> = (0..=255).collect();
        for mode in ViewMode::ALL {
            let (_, consumed, offset) = draw(&data, 37, mode, Geometry::new(5, 24));
            assert_eq!(offset, 37);
            assert_eq!(consumed, (mode.row_width(24) * 5).min(256 - 37));
        }
    }

    #[test]
    fn zero_rows_only_moves_cursor() {
        let (out, consumed, _) = draw(b"ABC", 0, ViewMode::Hex, Geometry::new(0, 30));
        assert_eq!(out, format!("{HIDE}{HOME}{HOME}{SHOW}"));
        assert_eq!(consumed, 0);
    }
}
