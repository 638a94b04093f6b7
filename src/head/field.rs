//! ヘッダー行パース

/// `<name>: <value>` 形式のヘッダー行をパース
///
/// 最初の「コロン + 空白 1 文字」で名前と値に分割する。値はその後ろ全部で、
/// 前後の空白は削らない。形式に合わない行と名前が空の行は `None`。
pub fn parse_field_line(line: &str) -> Option<(&str, &str)> {
    let bytes = line.as_bytes();
    let pos = line
        .match_indices(':')
        .map(|(i, _)| i)
        .find(|&i| bytes.get(i + 1).is_some_and(u8::is_ascii_whitespace))?;

    let name = &line[..pos];
    if name.is_empty() {
        return None;
    }
    Some((name, &line[pos + 2..]))
}
