use std::fmt;
use std::io;

use crate::fs::FileLocation;

/// レスポンス処理エラー
///
/// ステータス行やヘッダー行が壊れている場合、ヘッダーブロックが見つからない場合は
/// エラーにならない。エラーになるのはファイル操作と文字コード変換の失敗のみ。
#[derive(Debug)]
pub enum Error {
    /// ファイルを開けない
    FileOpen { location: FileLocation, source: io::Error },
    /// 開いたファイルの読み込みに失敗
    FileRead { location: FileLocation, source: io::Error },
    /// 一時ファイルの作成または書き込みに失敗
    FileWrite { location: FileLocation, source: io::Error },
    /// 元ファイルの削除に失敗
    ///
    /// この時点で一時ファイルは正しいペイロードを保持しており、元ファイルも残っている。
    FileDelete {
        location: FileLocation,
        temp: FileLocation,
        source: io::Error,
    },
    /// 一時ファイルのリネームに失敗
    ///
    /// `ReplaceMode::DeleteThenRename` では元ファイルは既に削除済みで、
    /// 一時ファイルだけが残っている。
    FileRename {
        from: FileLocation,
        to: FileLocation,
        source: io::Error,
    },
    /// 文字コード変換に失敗
    CharsetConversion {
        from: String,
        to: String,
        reason: String,
    },
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::FileOpen { location, source } => {
                write!(f, "failed to open file '{}': {}", location, source)
            }
            Error::FileRead { location, source } => {
                write!(f, "failed to read file '{}': {}", location, source)
            }
            Error::FileWrite { location, source } => {
                write!(f, "failed to write file '{}': {}", location, source)
            }
            Error::FileDelete {
                location,
                temp,
                source,
            } => write!(
                f,
                "failed to delete file '{}' (payload kept in '{}'): {}",
                location, temp, source
            ),
            Error::FileRename { from, to, source } => {
                write!(f, "failed to rename '{}' to '{}': {}", from, to, source)
            }
            Error::CharsetConversion { from, to, reason } => {
                write!(
                    f,
                    "charset conversion from {} to {} failed: {}",
                    from, to, reason
                )
            }
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::FileOpen { source, .. }
            | Error::FileRead { source, .. }
            | Error::FileWrite { source, .. }
            | Error::FileDelete { source, .. }
            | Error::FileRename { source, .. } => Some(source),
            Error::CharsetConversion { .. } => None,
        }
    }
}

impl Error {
    /// 失敗したファイル操作の対象を取得
    pub fn location(&self) -> Option<&FileLocation> {
        match self {
            Error::FileOpen { location, .. }
            | Error::FileRead { location, .. }
            | Error::FileWrite { location, .. }
            | Error::FileDelete { location, .. } => Some(location),
            Error::FileRename { from, .. } => Some(from),
            Error::CharsetConversion { .. } => None,
        }
    }
}

/// Result 型エイリアス
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as _;

    #[test]
    fn test_display_includes_paths() {
        let err = Error::FileRename {
            from: FileLocation::local("/tmp/a.bin.tmp"),
            to: FileLocation::local("/tmp/a.bin"),
            source: io::Error::new(io::ErrorKind::PermissionDenied, "denied"),
        };
        let msg = err.to_string();
        assert!(msg.contains("file:///tmp/a.bin.tmp"));
        assert!(msg.contains("file:///tmp/a.bin"));
        assert!(err.source().is_some());
    }

    #[test]
    fn test_charset_error_has_no_source() {
        let err = Error::CharsetConversion {
            from: "x-unknown".to_string(),
            to: "UTF-8".to_string(),
            reason: "unknown charset".to_string(),
        };
        assert!(err.source().is_none());
        assert!(err.location().is_none());
        assert_eq!(
            err.to_string(),
            "charset conversion from x-unknown to UTF-8 failed: unknown charset"
        );
    }
}
