//! ボディの文字コード変換
//!
//! 変換そのものは `encoding_rs` に任せる。ここで行うのは変換元 charset の推定
//! (HTML の `<meta>` 宣言の簡易走査) とエラーの整理のみで、HTML のパースはしない。

use std::borrow::Cow;

use encoding_rs::Encoding;

use crate::content_type::ContentType;
use crate::error::{Error, Result};

/// HTML の `<meta>` から charset 宣言を探す
///
/// 次の 2 形式を先頭から順に調べ、最初に見つかったものを返す。
///
/// - `<meta http-equiv="Content-Type" content="text/html; charset=...">`
/// - `<meta charset="...">`
///
/// # 例
///
/// ```rust
/// use shiguredo_raw_response::charset::detect_meta_charset;
///
/// let html = br#"<html><head><meta http-equiv="Content-Type" content="text/html; charset=windows-1250"></head></html>"#;
/// assert_eq!(detect_meta_charset(html).as_deref(), Some("windows-1250"));
/// ```
pub fn detect_meta_charset(body: &[u8]) -> Option<String> {
    // ASCII 部分は lossy 変換しても位置と値が変わらない
    let text = String::from_utf8_lossy(body);
    let lower = text.to_ascii_lowercase();

    let mut from = 0;
    while let Some(pos) = lower[from..].find("<meta") {
        let start = from + pos + "<meta".len();
        let end = lower[start..]
            .find('>')
            .map_or(lower.len(), |i| start + i);
        from = end;

        // "<metadata" 等を除外
        if !text[start..end]
            .chars()
            .next()
            .is_some_and(|c| c.is_ascii_whitespace() || c == '/')
        {
            continue;
        }

        let attributes = parse_attributes(&text[start..end]);
        if let Some(charset) = meta_charset(&attributes) {
            return Some(charset);
        }
    }
    None
}

fn meta_charset(attributes: &[(String, String)]) -> Option<String> {
    let attr = |name: &str| {
        attributes
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.trim())
    };

    if let Some(charset) = attr("charset").filter(|v| !v.is_empty()) {
        return Some(charset.to_string());
    }
    if attr("http-equiv").is_some_and(|v| v.eq_ignore_ascii_case("content-type")) {
        let content = ContentType::parse(attr("content")?).ok()?;
        return content.charset().map(str::to_string);
    }
    None
}

/// タグ内の属性を (名前, 値) として取り出す
///
/// 値は二重引用符、単一引用符、引用符なしのいずれでもよい。値のない属性は空文字列。
fn parse_attributes(tag: &str) -> Vec<(String, String)> {
    let bytes = tag.as_bytes();
    let mut attributes = Vec::new();
    let mut i = 0;

    while i < bytes.len() {
        while i < bytes.len() && (bytes[i].is_ascii_whitespace() || bytes[i] == b'/') {
            i += 1;
        }
        let name_start = i;
        while i < bytes.len() && !bytes[i].is_ascii_whitespace() && !b"=/".contains(&bytes[i]) {
            i += 1;
        }
        let name = &tag[name_start..i];

        while i < bytes.len() && bytes[i].is_ascii_whitespace() {
            i += 1;
        }
        let mut value = "";
        if i < bytes.len() && bytes[i] == b'=' {
            i += 1;
            while i < bytes.len() && bytes[i].is_ascii_whitespace() {
                i += 1;
            }
            if i < bytes.len() && (bytes[i] == b'"' || bytes[i] == b'\'') {
                let quote = bytes[i];
                let value_start = i + 1;
                let value_end = bytes[value_start..]
                    .iter()
                    .position(|&b| b == quote)
                    .map_or(bytes.len(), |p| value_start + p);
                value = &tag[value_start..value_end];
                i = (value_end + 1).min(bytes.len());
            } else {
                let value_start = i;
                while i < bytes.len() && !bytes[i].is_ascii_whitespace() {
                    i += 1;
                }
                value = &tag[value_start..i];
            }
        }

        if name.is_empty() {
            // 名前なしの "=" 等: 1 バイト進めて読み飛ばす
            i = i.max(name_start + 1);
            continue;
        }
        attributes.push((name.to_string(), value.to_string()));
    }

    attributes
}

/// バイト列を `from` から `to` へ変換
///
/// 次の場合は [`Error::CharsetConversion`]:
///
/// - どちらかの charset が不明
/// - `to` が出力に使えない charset (UTF-16, replacement)
/// - 入力が `from` として不正なバイト列を含む
/// - `to` で表現できない文字を含む
pub fn transcode<'a>(input: &'a [u8], from: &str, to: &str) -> Result<Cow<'a, [u8]>> {
    let failure = |reason: &str| Error::CharsetConversion {
        from: from.to_string(),
        to: to.to_string(),
        reason: reason.to_string(),
    };

    let source = Encoding::for_label_no_replacement(from.trim().as_bytes())
        .ok_or_else(|| failure("unknown source charset"))?;
    let target = Encoding::for_label_no_replacement(to.trim().as_bytes())
        .ok_or_else(|| failure("unknown target charset"))?;
    if target.output_encoding() != target {
        return Err(failure("target charset cannot be encoded"));
    }

    if source == target {
        // 同じ charset でも不正なバイト列は検出する
        return match source.decode_without_bom_handling_and_without_replacement(input) {
            Some(_) => Ok(Cow::Borrowed(input)),
            None => Err(failure("invalid byte sequence")),
        };
    }

    let text = source
        .decode_without_bom_handling_and_without_replacement(input)
        .ok_or_else(|| failure("invalid byte sequence"))?;
    let (encoded, _, unmappable) = target.encode(&text);
    if unmappable {
        return Err(failure("unmappable character"));
    }
    Ok(Cow::Owned(encoded.into_owned()))
}
