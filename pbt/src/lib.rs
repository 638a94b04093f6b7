//! PBT テスト共通ユーティリティ

use proptest::prelude::*;

// ========================================
// ステータス行生成
// ========================================

/// プロトコルバージョン: d.d
pub fn http_version() -> impl Strategy<Value = String> {
    prop_oneof![
        Just("1.0".to_string()),
        Just("1.1".to_string()),
        "[0-9]\\.[0-9]".prop_map(|s| s),
    ]
}

/// 最終レスポンスのステータスコード (1xx / 3xx 以外)
pub fn final_status_code() -> impl Strategy<Value = u16> {
    prop_oneof![200u16..=299, 400u16..=599]
}

/// 理由句 (空でもよい)
pub fn reason_phrase() -> impl Strategy<Value = String> {
    prop_oneof![
        Just("OK".to_string()),
        Just("Not Found".to_string()),
        "[A-Za-z][A-Za-z ]{0,31}".prop_map(|s| s),
    ]
}

// ========================================
// ヘッダー生成
// ========================================

/// ヘッダー名
pub fn header_name() -> impl Strategy<Value = String> {
    "[A-Za-z][A-Za-z0-9-]{0,31}".prop_map(|s| s)
}

/// ヘッダー値 (CR/LF を含まない)
pub fn header_value() -> impl Strategy<Value = String> {
    "[!-~]([ !-~]{0,62}[!-~])?".prop_map(|s| s)
}

/// ヘッダー (名前, 値) の並び
pub fn headers() -> impl Strategy<Value = Vec<(String, String)>> {
    proptest::collection::vec((header_name(), header_value()), 0..16)
}

/// ペイロード (任意のバイト列)
pub fn payload() -> impl Strategy<Value = Vec<u8>> {
    proptest::collection::vec(any::<u8>(), 0..4096)
}

/// ヘッダーブロックを組み立てる
pub fn build_head(version: &str, code: u16, reason: &str, headers: &[(String, String)]) -> Vec<u8> {
    let mut head = format!("HTTP/{} {} {}\r\n", version, code, reason);
    for (name, value) in headers {
        head.push_str(&format!("{}: {}\r\n", name, value));
    }
    head.push_str("\r\n");
    head.into_bytes()
}
