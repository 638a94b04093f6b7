//! ヘッダーブロック

use super::field::parse_field_line;
use super::status::StatusLine;
use crate::header_map::HeaderMap;

/// ヘッダーブロックの終端
pub(crate) const HEAD_TERMINATOR: &[u8; 4] = b"\r\n\r\n";

/// 擬似ヘッダー: プロトコルバージョン
pub const HTTP_VERSION_HEADER: &str = "Http-Version";
/// 擬似ヘッダー: ステータスコード
pub const STATUS_CODE_HEADER: &str = "Status-Code";
/// 擬似ヘッダー: "<コード> <理由句>"
pub const STATUS_HEADER: &str = "Status";

/// 見つかったヘッダーブロック
///
/// `raw` は終端の CRLFCRLF を含む。`body_offset` はソース先頭からボディ開始位置までの
/// バイト数で、読み飛ばした中間レスポンスのブロックがあればその分も含む。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeaderBlock {
    raw: Vec<u8>,
    body_offset: usize,
}

impl HeaderBlock {
    pub(crate) fn new(raw: Vec<u8>, body_offset: usize) -> Self {
        Self { raw, body_offset }
    }

    /// 終端を含むブロックのバイト列
    pub fn as_bytes(&self) -> &[u8] {
        &self.raw
    }

    /// 終端を含むブロックのバイト数
    pub fn len(&self) -> usize {
        self.raw.len()
    }

    /// ブロックが空か確認
    pub fn is_empty(&self) -> bool {
        self.raw.is_empty()
    }

    /// ボディの開始位置
    pub fn body_offset(&self) -> usize {
        self.body_offset
    }

    /// 終端を除いた各行 (CRLF 区切り)
    ///
    /// UTF-8 として不正なバイトは U+FFFD に置き換える。
    pub fn lines(&self) -> Vec<String> {
        let raw = self
            .raw
            .strip_suffix(HEAD_TERMINATOR.as_slice())
            .unwrap_or(&self.raw);
        String::from_utf8_lossy(raw)
            .split("\r\n")
            .map(str::to_string)
            .collect()
    }

    /// 先頭行をステータス行としてパース
    pub fn status_line(&self) -> Option<StatusLine> {
        let end = self
            .raw
            .windows(2)
            .position(|w| w == b"\r\n")
            .unwrap_or(self.raw.len());
        StatusLine::parse(&String::from_utf8_lossy(&self.raw[..end]))
    }

    /// ステータス行とヘッダーをパース
    ///
    /// 先頭行は形式に合うかどうかに関係なくステータス行として扱う。
    /// ステータス行が合えば `Http-Version` / `Status-Code` / `Status` を
    /// ヘッダーマップにも入れる。形式に合わないヘッダー行は読み飛ばす。
    pub fn parse(&self) -> (Option<StatusLine>, HeaderMap) {
        let lines = self.lines();
        let mut headers = HeaderMap::new();

        let mut iter = lines.iter();
        let status = iter.next().and_then(|line| StatusLine::parse(line));
        if let Some(status) = &status {
            headers.insert(HTTP_VERSION_HEADER, status.version());
            headers.insert(STATUS_CODE_HEADER, status.code());
            headers.insert(STATUS_HEADER, &status.status());
        }

        for line in iter {
            match parse_field_line(line) {
                Some((name, value)) => {
                    headers.insert(name, value);
                }
                None => tracing::debug!(line = %line, "skipping malformed header line"),
            }
        }

        (status, headers)
    }
}
