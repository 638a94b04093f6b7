//! ステータス行パース
//!
//! `HTTP/<d.d> <3 桁のコード> <理由句>` の形式のみ受け付ける。
//! 形式に合わない場合は `None` を返す (エラーにはしない)。

/// パース済みステータス行
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusLine {
    /// プロトコルバージョン (例: "1.1")
    version: String,
    /// ステータスコード (例: "200")
    code: String,
    /// 理由句 (例: "OK")
    reason: String,
}

impl StatusLine {
    /// ステータス行をパース
    ///
    /// 行末の CRLF は取り除いてから渡すこと。
    /// 理由句は省略可能 (`HTTP/1.1 204` も受け付ける)。
    ///
    /// # 例
    ///
    /// ```rust
    /// use shiguredo_raw_response::StatusLine;
    ///
    /// let status = StatusLine::parse("HTTP/1.1 404 Not Found").unwrap();
    /// assert_eq!(status.version(), "1.1");
    /// assert_eq!(status.code(), "404");
    /// assert_eq!(status.reason(), "Not Found");
    /// assert_eq!(status.status(), "404 Not Found");
    ///
    /// assert!(StatusLine::parse("ICY 200 OK").is_none());
    /// ```
    pub fn parse(line: &str) -> Option<Self> {
        let rest = line.strip_prefix("HTTP/")?;

        let bytes = rest.as_bytes();
        if bytes.len() < 3
            || !bytes[0].is_ascii_digit()
            || bytes[1] != b'.'
            || !bytes[2].is_ascii_digit()
        {
            return None;
        }
        let (version, rest) = rest.split_at(3);

        let rest = skip_separator(rest)?;
        let bytes = rest.as_bytes();
        if bytes.len() < 3 || !bytes[..3].iter().all(u8::is_ascii_digit) {
            return None;
        }
        let (code, rest) = rest.split_at(3);

        let reason = if rest.is_empty() {
            ""
        } else {
            skip_separator(rest)?
        };

        Some(Self {
            version: version.to_string(),
            code: code.to_string(),
            reason: reason.to_string(),
        })
    }

    /// プロトコルバージョンを取得 (例: "1.1")
    pub fn version(&self) -> &str {
        &self.version
    }

    /// ステータスコードを文字列で取得 (例: "200")
    pub fn code(&self) -> &str {
        &self.code
    }

    /// ステータスコードを数値で取得
    pub fn status_code(&self) -> u16 {
        // parse() で 3 桁の数字であることを確認済み
        self.code.parse().unwrap_or(0)
    }

    /// 理由句を取得 (例: "OK")
    pub fn reason(&self) -> &str {
        &self.reason
    }

    /// "<コード> <理由句>" 形式の文字列を取得
    ///
    /// 理由句が空の場合はコードのみ。
    pub fn status(&self) -> String {
        if self.reason.is_empty() {
            self.code.clone()
        } else {
            format!("{} {}", self.code, self.reason)
        }
    }

    /// ステータスコードが情報レスポンス (1xx) か確認
    pub fn is_informational(&self) -> bool {
        (100..200).contains(&self.status_code())
    }

    /// ステータスコードがリダイレクト (3xx) か確認
    pub fn is_redirect(&self) -> bool {
        (300..400).contains(&self.status_code())
    }
}

/// 区切りの空白 1 文字を読み飛ばす
fn skip_separator(s: &str) -> Option<&str> {
    let first = *s.as_bytes().first()?;
    if first.is_ascii_whitespace() {
        Some(&s[1..])
    } else {
        None
    }
}
