/// ヘッダーブロック探索の設定
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseOptions {
    /// 1 つのヘッダーブロックの最大サイズ (デフォルト: 64KB)
    ///
    /// 超えた場合はヘッダーブロックなしとして扱う。
    pub max_head_size: usize,
    /// 1xx / 3xx のヘッダーブロックに続くヘッダーブロックを読み進めるか (デフォルト: true)
    ///
    /// 100 Continue やリダイレクト追跡で複数のヘッダーブロックが連続する場合、
    /// 最後のブロックをレスポンスのヘッダーとして採用する。
    pub follow_interim_responses: bool,
}

impl Default for ParseOptions {
    fn default() -> Self {
        Self {
            max_head_size: 64 * 1024, // 64KB
            follow_interim_responses: true,
        }
    }
}

impl ParseOptions {
    /// 制限なしの設定を作成
    pub fn unlimited() -> Self {
        Self {
            max_head_size: usize::MAX,
            follow_interim_responses: true,
        }
    }
}

/// 一時ファイルで元ファイルを置き換える方法
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReplaceMode {
    /// 元ファイルを削除してから一時ファイルをリネームする
    ///
    /// 削除とリネームの間でプロセスが落ちると元のパスにファイルが存在しなくなる。
    #[default]
    DeleteThenRename,
    /// 一時ファイルを元ファイルの上にリネームする (削除しない)
    RenameOver,
}

/// ダウンロードファイル書き換えの設定
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RewriteOptions {
    /// コピー時のチャンクサイズ (デフォルト: 4KB)
    pub copy_chunk_size: usize,
    /// 一時ファイルの接尾辞 (デフォルト: ".tmp")
    pub temp_suffix: String,
    /// 書き換え後に設定するパーミッション (デフォルト: 0o755)
    ///
    /// `None` の場合は変更しない。設定の失敗は無視する。
    pub permissions: Option<u32>,
    /// 置き換え方法
    pub replace: ReplaceMode,
}

impl Default for RewriteOptions {
    fn default() -> Self {
        Self {
            copy_chunk_size: 4 * 1024, // 4KB
            temp_suffix: ".tmp".to_string(),
            permissions: Some(0o755),
            replace: ReplaceMode::DeleteThenRename,
        }
    }
}
