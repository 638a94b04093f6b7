//! # shiguredo_raw_response
//!
//! HTTP 通信で受け取った生のバイト列から、ステータス行・ヘッダー・ボディを取り出すライブラリ
//!
//! ## 特徴
//!
//! - **2 つの受け渡し方法**: メモリ上のレスポンスと、転送中にファイルへ直接書き込まれた
//!   レスポンス (ヘッダーブロック込み) の両方を扱う
//! - **寛容なパース**: ステータス行やヘッダー行が壊れていても失敗しない
//! - **安全な書き換え**: ダウンロードファイルのヘッダーブロックを一時ファイル経由で除去する
//!
//! ## 使い方
//!
//! ### メモリ上のレスポンス
//!
//! ```rust
//! use shiguredo_raw_response::Response;
//!
//! let response = Response::parse(b"HTTP/1.1 200 OK\r\nContent-Type: text/html\r\n\r\nhello");
//! assert_eq!(response.header("Status"), Some("200 OK"));
//! assert_eq!(response.header("Content-Type"), Some("text/html"));
//! assert_eq!(response.text(), "hello");
//! ```
//!
//! ### ダウンロードファイル
//!
//! ```rust,no_run
//! use std::io::Read;
//! use shiguredo_raw_response::{FileLocation, Response, TransferInfo};
//!
//! let mut transfer = TransferInfo::download(FileLocation::local("/tmp/archive.zip"));
//! let response = Response::from_transfer(&[], &mut transfer)?;
//! println!("{:?}", response.header("Content-Length"));
//!
//! let mut file = response.open_file()?;
//! let mut payload = Vec::new();
//! file.read_to_end(&mut payload).expect("read");
//! response.close_file(file);
//! # Ok::<(), shiguredo_raw_response::Error>(())
//! ```

pub mod charset;
pub mod content_type;
mod error;
mod fs;
mod head;
mod header_map;
mod options;
mod response;
mod rewrite;
mod transfer;

pub use error::{Error, Result};
pub use fs::{FileLocation, FileSystem, LOCAL_SCHEME, LocalFileSystem, ReadSeek};
pub use head::{
    HTTP_VERSION_HEADER, HeadScanner, HeaderBlock, READ_CHUNK_SIZE, STATUS_CODE_HEADER,
    STATUS_HEADER, ScanProgress, StatusLine, locate, locate_in_reader, parse_field_line,
};
pub use header_map::HeaderMap;
pub use options::{ParseOptions, ReplaceMode, RewriteOptions};
pub use response::{Body, DownloadedFile, Response, ResponseParser};
pub use rewrite::{FileRewriter, RewriteOutcome};
pub use transfer::{DeliveryMode, Transfer, TransferInfo};
