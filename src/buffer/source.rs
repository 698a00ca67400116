use std::fs::File;
use std::io::{Read, Seek, SeekFrom};
use std::path::Path;

use tracing::{debug, warn};

use crate::error::{Result, ViewerError};

/// ランダムアクセス可能なバイト列ソース
///
/// 長さはオープン時に一度だけ求めてキャッシュする。
/// オフセットは内部リーダーのシーク位置そのもの。
pub struct ByteSource<R> {
    /// 読み込み元
    inner: R,
    /// 全体の長さ（バイト）
    len: u64,
}

impl ByteSource<File> {
    /// ファイルを読み取り専用で開く
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path).map_err(ViewerError::FileOpenFailed)?;
        let source = Self::new(file)?;
        debug!(path = %path.display(), len = source.len, "opened byte source");
        Ok(source)
    }
}

impl<R: Read + Seek> ByteSource<R> {
    /// リーダーから作成（末尾へのシークで長さを求め、先頭に戻す）
    pub fn new(mut inner: R) -> Result<Self> {
        let len = inner
            .seek(SeekFrom::End(0))
            .map_err(ViewerError::FileOpenFailed)?;
        inner
            .seek(SeekFrom::Start(0))
            .map_err(ViewerError::FileOpenFailed)?;
        Ok(Self { inner, len })
    }

    /// データの長さを取得
    pub fn len(&self) -> u64 {
        self.len
    }

    /// データが空かどうか
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// 現在のオフセットを取得
    pub fn tell(&mut self) -> Result<u64> {
        self.inner.stream_position().map_err(ViewerError::SeekFailed)
    }

    /// 絶対位置へシーク
    pub fn seek_absolute(&mut self, offset: u64) -> Result<()> {
        self.inner
            .seek(SeekFrom::Start(offset))
            .map_err(ViewerError::SeekFailed)?;
        Ok(())
    }

    /// 相対シーク
    ///
    /// シークに失敗した場合は先頭（オフセット 0）に移動して成功扱いにする。
    /// 前方へのシーク失敗でも先頭に戻る点は既知の癖として残している。
    pub fn seek_relative(&mut self, delta: i64) -> Result<()> {
        if let Err(e) = self.inner.seek(SeekFrom::Current(delta)) {
            warn!(delta, error = %e, "relative seek failed, clamping to start");
            self.seek_absolute(0)?;
        }
        Ok(())
    }

    /// `delta` 進めるとオフセットが末尾以上になるかを調べる
    ///
    /// 実際にシークして確認した後 `-delta` で戻すので、成功時はオフセット不変。
    pub fn would_exceed_end(&mut self, delta: i64) -> Result<bool> {
        let advanced = self
            .inner
            .seek(SeekFrom::Current(delta))
            .map_err(ViewerError::SeekFailed)?;
        let exceeds = advanced >= self.len;
        self.inner
            .seek(SeekFrom::Current(-delta))
            .map_err(ViewerError::SeekFailed)?;
        Ok(exceeds)
    }

    /// 現在位置から最大 `count` バイトを `buf` の末尾に追加する
    ///
    /// 戻り値は実際に読めたバイト数。EOF による短い読み込みはエラーではない。
    pub fn read_into(&mut self, count: usize, buf: &mut Vec<u8>) -> Result<usize> {
        let before = buf.len();
        self.inner
            .by_ref()
            .take(count as u64)
            .read_to_end(buf)
            .map_err(ViewerError::ReadFailed)?;
        Ok(buf.len() - before)
    }

    /// オフセットを確定させずに読む
    ///
    /// `f` の中でどれだけ読み進めても、終了後は呼び出し前の位置に戻る。
    pub fn peek<T>(&mut self, f: impl FnOnce(&mut Self) -> Result<T>) -> Result<T> {
        let start = self.tell()?;
        let result = f(self);
        self.seek_absolute(start)?;
        result
    }
}

#[cfg(test)]
mod tests {
    use std::io::{Cursor, Write};

    use super::*;

    fn source(len: usize) -> ByteSource<Cursor<Vec<u8>>> {
        let data = (0..len).map(|i| i as u8).collect();
        ByteSource::new(Cursor::new(data)).unwrap()
    }

    #[test]
    fn new_caches_length_and_starts_at_zero() {
        let mut src = source(42);
        assert_eq!(src.len(), 42);
        assert!(!src.is_empty());
        assert_eq!(src.tell().unwrap(), 0);
    }

    #[test]
    fn open_reads_file_length() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"hello world").unwrap();
        file.flush().unwrap();

        let mut src = ByteSource::open(file.path()).unwrap();
        assert_eq!(src.len(), 11);
        assert_eq!(src.tell().unwrap(), 0);
    }

    #[test]
    fn open_missing_file_fails() {
        let dir = tempfile::tempdir().unwrap();
        let err = ByteSource::open(dir.path().join("missing.bin")).err().unwrap();
        assert!(matches!(err, ViewerError::FileOpenFailed(_)));
    }

    #[test]
    fn seek_relative_moves_both_ways() {
        let mut src = source(100);
        src.seek_relative(30).unwrap();
        assert_eq!(src.tell().unwrap(), 30);
        src.seek_relative(-10).unwrap();
        assert_eq!(src.tell().unwrap(), 20);
    }

    #[test]
    fn seek_relative_before_start_clamps_to_zero() {
        let mut src = source(100);
        src.seek_absolute(15).unwrap();
        src.seek_relative(-40).unwrap();
        assert_eq!(src.tell().unwrap(), 0);
    }

    #[test]
    fn would_exceed_end_keeps_offset() {
        let mut src = source(25);
        src.seek_absolute(10).unwrap();

        assert!(!src.would_exceed_end(10).unwrap());
        assert_eq!(src.tell().unwrap(), 10);

        assert!(src.would_exceed_end(15).unwrap());
        assert_eq!(src.tell().unwrap(), 10);

        assert!(src.would_exceed_end(100).unwrap());
        assert_eq!(src.tell().unwrap(), 10);
    }

    #[test]
    fn would_exceed_end_failure_keeps_offset() {
        let mut src = source(25);
        src.seek_absolute(5).unwrap();
        let err = src.would_exceed_end(-10).unwrap_err();
        assert!(matches!(err, ViewerError::SeekFailed(_)));
        assert_eq!(src.tell().unwrap(), 5);
    }

    #[test]
    fn read_into_appends_and_stops_at_eof() {
        let mut src = source(10);
        let mut buf = vec![0xAA];

        assert_eq!(src.read_into(4, &mut buf).unwrap(), 4);
        assert_eq!(buf, [0xAA, 0, 1, 2, 3]);
        assert_eq!(src.tell().unwrap(), 4);

        assert_eq!(src.read_into(100, &mut buf).unwrap(), 6);
        assert_eq!(src.tell().unwrap(), 10);

        assert_eq!(src.read_into(5, &mut buf).unwrap(), 0);
        assert_eq!(buf.len(), 11);
    }

    #[test]
    fn peek_restores_offset() {
        let mut src = source(50);
        src.seek_absolute(7).unwrap();

        let read = src
            .peek(|s| {
                let mut buf = Vec::new();
                s.read_into(30, &mut buf)
            })
            .unwrap();
        assert_eq!(read, 30);
        assert_eq!(src.tell().unwrap(), 7);
    }

    #[test]
    fn peek_restores_offset_on_error() {
        let mut src = source(50);
        src.seek_absolute(20).unwrap();

        let result: Result<()> = src.peek(|s| {
            s.seek_absolute(45)?;
            Err(ViewerError::SignalRaiseFailed)
        });
        assert!(result.is_err());
        assert_eq!(src.tell().unwrap(), 20);
    }
}
