//! 探索状態の定義

/// 探索状態
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ScanPhase {
    /// ステータス行先頭の "HTTP/d.d" を照合中 (照合済みバイト数)
    StatusPrefix { matched: usize },
    /// ヘッダーブロック終端 (CRLFCRLF) を探索中
    Block,
    /// 完了
    Done,
}
