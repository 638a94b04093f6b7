//! Content-Type 値のパース
//!
//! レスポンスヘッダーと HTML の `<meta http-equiv="Content-Type">` の両方で使う。
//! どちらも壊れた値が多いため、パラメータ部分は読めるものだけ拾い、
//! 不正なパラメータは読み飛ばす。
//!
//! ```rust
//! use shiguredo_raw_response::content_type::ContentType;
//!
//! let ct = ContentType::parse("text/html; charset=Shift_JIS").unwrap();
//! assert_eq!(ct.mime_type(), "text/html");
//! assert_eq!(ct.charset(), Some("Shift_JIS"));
//! ```

use core::fmt;

/// Content-Type パースエラー
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContentTypeError {
    /// 空の Content-Type
    Empty,
    /// 不正なメディアタイプ形式
    InvalidMediaType,
}

impl fmt::Display for ContentTypeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ContentTypeError::Empty => write!(f, "empty Content-Type"),
            ContentTypeError::InvalidMediaType => write!(f, "invalid media type"),
        }
    }
}

impl std::error::Error for ContentTypeError {}

/// パース済み Content-Type
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentType {
    /// メディアタイプ (小文字, 例: "text")
    media_type: String,
    /// サブタイプ (小文字, 例: "html")
    subtype: String,
    /// パラメータ (小文字の name, 値はそのまま)
    parameters: Vec<(String, String)>,
}

impl ContentType {
    /// Content-Type 文字列をパース
    pub fn parse(input: &str) -> Result<Self, ContentTypeError> {
        let input = input.trim();
        if input.is_empty() {
            return Err(ContentTypeError::Empty);
        }

        let (media, rest) = match input.split_once(';') {
            Some((media, rest)) => (media.trim(), rest),
            None => (input, ""),
        };
        let (media_type, subtype) = media
            .split_once('/')
            .map(|(t, s)| (t.trim(), s.trim()))
            .ok_or(ContentTypeError::InvalidMediaType)?;
        if !is_valid_token(media_type) || !is_valid_token(subtype) {
            return Err(ContentTypeError::InvalidMediaType);
        }

        Ok(Self {
            media_type: media_type.to_ascii_lowercase(),
            subtype: subtype.to_ascii_lowercase(),
            parameters: parse_parameters(rest),
        })
    }

    /// メディアタイプを取得 (例: "text")
    pub fn media_type(&self) -> &str {
        &self.media_type
    }

    /// サブタイプを取得 (例: "html")
    pub fn subtype(&self) -> &str {
        &self.subtype
    }

    /// 完全なメディアタイプを取得 (例: "text/html")
    pub fn mime_type(&self) -> String {
        format!("{}/{}", self.media_type, self.subtype)
    }

    /// パラメータを取得 (名前は大文字小文字を区別しない)
    pub fn parameter(&self, name: &str) -> Option<&str> {
        self.parameters
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// charset パラメータを取得
    pub fn charset(&self) -> Option<&str> {
        self.parameter("charset").filter(|v| !v.is_empty())
    }

    /// text/* かどうか
    pub fn is_text(&self) -> bool {
        self.media_type == "text"
    }

    /// text/html または application/xhtml+xml かどうか
    pub fn is_html(&self) -> bool {
        (self.media_type == "text" && self.subtype == "html")
            || (self.media_type == "application" && self.subtype == "xhtml+xml")
    }
}

impl fmt::Display for ContentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.media_type, self.subtype)?;
        for (name, value) in &self.parameters {
            write!(f, "; {}={}", name, value)?;
        }
        Ok(())
    }
}

/// `; name=value` の並びをパース
///
/// `=` のないパラメータや名前が不正なパラメータは読み飛ばす。
fn parse_parameters(input: &str) -> Vec<(String, String)> {
    let mut parameters = Vec::new();
    let mut rest = input;

    loop {
        rest = rest.trim_start_matches(|c: char| c == ';' || c.is_whitespace());
        if rest.is_empty() {
            break;
        }

        let Some(eq) = rest.find(['=', ';']).filter(|&i| rest.as_bytes()[i] == b'=') else {
            // '=' がない: 次の ';' まで読み飛ばす
            rest = rest.find(';').map_or("", |i| &rest[i..]);
            continue;
        };
        let name = rest[..eq].trim();
        rest = rest[eq + 1..].trim_start();

        let value = if let Some(quoted) = rest.strip_prefix('"') {
            let (value, remaining) = parse_quoted(quoted);
            rest = remaining;
            value
        } else {
            let end = rest
                .find(|c: char| c == ';' || c.is_whitespace())
                .unwrap_or(rest.len());
            let value = rest[..end].to_string();
            rest = &rest[end..];
            value
        };

        if is_valid_token(name) {
            parameters.push((name.to_ascii_lowercase(), value));
        }
    }

    parameters
}

/// 引用符付き文字列をパース (開き引用符の直後から)
///
/// 閉じ引用符がない場合は末尾までを値とする。
fn parse_quoted(input: &str) -> (String, &str) {
    let mut value = String::new();
    let mut escaped = false;
    for (i, c) in input.char_indices() {
        if escaped {
            value.push(c);
            escaped = false;
        } else if c == '\\' {
            escaped = true;
        } else if c == '"' {
            return (value, &input[i + 1..]);
        } else {
            value.push(c);
        }
    }
    (value, "")
}

fn is_valid_token(s: &str) -> bool {
    !s.is_empty() && s.bytes().all(is_token_char)
}

/// RFC 9110 のトークン文字
fn is_token_char(b: u8) -> bool {
    matches!(b,
        b'!' | b'#' | b'$' | b'%' | b'&' | b'\'' | b'*' | b'+' | b'-' | b'.' |
        b'0'..=b'9' | b'A'..=b'Z' | b'^' | b'_' | b'`' | b'a'..=b'z' | b'|' | b'~'
    )
}
