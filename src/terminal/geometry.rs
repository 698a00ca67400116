use std::io;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};

use tracing::{debug, warn};

/// 端末サイズ（行数・桁数）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Geometry {
    pub rows: u16,
    pub cols: u16,
}

impl Geometry {
    pub fn new(rows: u16, cols: u16) -> Self {
        Self { rows, cols }
    }

    /// 行数・桁数ともに 1 以上か
    pub fn is_valid(self) -> bool {
        self.rows > 0 && self.cols > 0
    }

    fn pack(self) -> u32 {
        (u32::from(self.rows) << 16) | u32::from(self.cols)
    }

    fn unpack(bits: u32) -> Self {
        Self {
            rows: (bits >> 16) as u16,
            cols: bits as u16,
        }
    }
}

/// 最新の端末サイズを保持する単一スロット
///
/// 書き込みはリサイズハンドラのみ、読み出しはメインループのみ。
/// 値全体を一度に置き換えるのでロックは不要。
#[derive(Debug, Default)]
pub struct GeometryCell(AtomicU32);

impl GeometryCell {
    pub fn new(geometry: Geometry) -> Self {
        Self(AtomicU32::new(geometry.pack()))
    }

    pub fn store(&self, geometry: Geometry) {
        self.0.store(geometry.pack(), Ordering::Release);
    }

    pub fn load(&self) -> Geometry {
        Geometry::unpack(self.0.load(Ordering::Acquire))
    }
}

/// リサイズイベントのハンドラ
///
/// サイズ取得に成功すれば `GeometryCell` を更新し、失敗すれば
/// 「直近のリサイズ失敗」フラグを立てる。フラグを見るのは初期化時だけ。
#[derive(Debug)]
pub struct ResizeHandler {
    geometry: Arc<GeometryCell>,
    failed: AtomicBool,
}

impl ResizeHandler {
    pub fn new(geometry: Arc<GeometryCell>) -> Self {
        Self {
            geometry,
            failed: AtomicBool::new(false),
        }
    }

    /// サイズ問い合わせの結果を反映する（crossterm と同じ `(cols, rows)` 順）
    ///
    /// 戻り値は更新できたかどうか。
    pub fn handle(&self, size: io::Result<(u16, u16)>) -> bool {
        match size.map(|(cols, rows)| Geometry::new(rows, cols)) {
            Ok(geometry) if geometry.is_valid() => {
                self.geometry.store(geometry);
                self.failed.store(false, Ordering::Release);
                debug!(rows = geometry.rows, cols = geometry.cols, "terminal resized");
                true
            }
            Ok(Geometry { rows, cols }) => {
                warn!(rows, cols, "terminal reported empty size");
                self.failed.store(true, Ordering::Release);
                false
            }
            Err(e) => {
                warn!(error = %e, "could not query terminal size");
                self.failed.store(true, Ordering::Release);
                false
            }
        }
    }

    /// 直近のリサイズが失敗したか
    pub fn last_failed(&self) -> bool {
        self.failed.load(Ordering::Acquire)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cell_round_trips_extremes() {
        let cell = GeometryCell::default();
        assert_eq!(cell.load(), Geometry::new(0, 0));

        cell.store(Geometry::new(u16::MAX, 1));
        assert_eq!(cell.load(), Geometry::new(u16::MAX, 1));

        cell.store(Geometry::new(24, 80));
        assert_eq!(cell.load(), Geometry::new(24, 80));
    }

    #[test]
    fn handler_updates_geometry() {
        let cell = Arc::new(GeometryCell::default());
        let handler = ResizeHandler::new(Arc::clone(&cell));

        assert!(handler.handle(Ok((60, 20))));
        assert_eq!(cell.load(), Geometry::new(20, 60));
        assert!(!handler.last_failed());
    }

    #[test]
    fn handler_failure_keeps_previous_geometry() {
        let cell = Arc::new(GeometryCell::new(Geometry::new(24, 80)));
        let handler = ResizeHandler::new(Arc::clone(&cell));

        assert!(!handler.handle(Ok((0, 24))));
        assert!(handler.last_failed());
        assert_eq!(cell.load(), Geometry::new(24, 80));

        assert!(!handler.handle(Err(io::Error::other("no tty"))));
        assert!(handler.last_failed());

        assert!(handler.handle(Ok((100, 30))));
        assert!(!handler.last_failed());
        assert_eq!(cell.load(), Geometry::new(30, 100));
    }

    #[test]
    fn validity() {
        assert!(Geometry::new(1, 1).is_valid());
        assert!(!Geometry::new(0, 80).is_valid());
        assert!(!Geometry::default().is_valid());
    }
}
