//! ヘッダーブロックの探索とパース
//!
//! ## 使い方
//!
//! ### バッファ全体から探す
//!
//! ```rust
//! use shiguredo_raw_response::{ParseOptions, locate};
//!
//! let raw = b"HTTP/1.1 200 OK\r\nContent-Type: text/plain\r\n\r\nhello";
//! let block = locate(raw, &ParseOptions::default()).unwrap();
//!
//! let (status, headers) = block.parse();
//! assert_eq!(status.unwrap().code(), "200");
//! assert_eq!(headers.get("Content-Type"), Some("text/plain"));
//! assert_eq!(&raw[block.body_offset()..], b"hello");
//! ```
//!
//! ### ストリームから探す
//!
//! ```rust
//! use std::io::Cursor;
//! use shiguredo_raw_response::{ParseOptions, locate_in_reader};
//!
//! let mut reader = Cursor::new(b"HTTP/1.1 200 OK\r\n\r\npayload".to_vec());
//! let block = locate_in_reader(&mut reader, &ParseOptions::default())
//!     .unwrap()
//!     .unwrap();
//! assert_eq!(block.body_offset(), 19);
//! ```

mod block;
mod field;
mod phase;
mod scanner;
mod status;

pub use block::{HTTP_VERSION_HEADER, HeaderBlock, STATUS_CODE_HEADER, STATUS_HEADER};
pub use field::parse_field_line;
pub use scanner::{HeadScanner, READ_CHUNK_SIZE, ScanProgress, locate, locate_in_reader};
pub use status::StatusLine;
