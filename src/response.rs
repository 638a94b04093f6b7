use std::borrow::Cow;
use std::fmt;
use std::io::{self, Read, Seek, SeekFrom, Write};
use std::sync::Arc;

use crate::charset::{detect_meta_charset, transcode};
use crate::content_type::ContentType;
use crate::error::{Error, Result};
use crate::fs::{FileLocation, FileSystem, ReadSeek};
use crate::head::{HeaderBlock, StatusLine, locate};
use crate::header_map::HeaderMap;
use crate::options::{ParseOptions, RewriteOptions};
use crate::rewrite::{FileRewriter, RewriteOutcome};
use crate::transfer::{DeliveryMode, Transfer};

/// レスポンスボディ
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Body {
    /// メモリ上のボディ
    Memory(Vec<u8>),
    /// ヘッダーブロック除去済みのダウンロードファイル
    File(FileLocation),
}

impl Body {
    /// メモリ上のボディのバイト列を取得
    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            Body::Memory(bytes) => Some(bytes),
            Body::File(_) => None,
        }
    }

    /// ダウンロードファイルの位置を取得
    pub fn location(&self) -> Option<&FileLocation> {
        match self {
            Body::Memory(_) => None,
            Body::File(location) => Some(location),
        }
    }

    /// ファイルに保存されたボディか確認
    pub fn is_file(&self) -> bool {
        matches!(self, Body::File(_))
    }
}

/// ダウンロードファイルへのアクセス情報
#[derive(Debug, Clone)]
struct Download {
    location: FileLocation,
    fs: Arc<dyn FileSystem>,
}

/// レスポンスのパーサー
///
/// 探索と書き換えの設定を保持する。設定が不要なら [`Response::parse`] /
/// [`Response::from_transfer`] を使う。
#[derive(Debug, Clone, Default)]
pub struct ResponseParser {
    parse_options: ParseOptions,
    rewrite_options: RewriteOptions,
}

impl ResponseParser {
    /// デフォルト設定で作成
    pub fn new() -> Self {
        Self::default()
    }

    /// 探索の設定 (ビルダーパターン)
    pub fn parse_options(mut self, options: ParseOptions) -> Self {
        self.parse_options = options;
        self
    }

    /// 書き換えの設定 (ビルダーパターン)
    pub fn rewrite_options(mut self, options: RewriteOptions) -> Self {
        self.rewrite_options = options;
        self
    }

    /// メモリ上のレスポンスをパース
    ///
    /// 失敗しない。ヘッダーブロックが見つからない場合は全体をボディとし、
    /// ヘッダーは空になる。
    pub fn parse_buffer(&self, raw: &[u8]) -> Response {
        let (status, headers, body) = match locate(raw, &self.parse_options) {
            Some(head) => {
                let (status, headers) = head.parse();
                (status, headers, raw[head.body_offset()..].to_vec())
            }
            None => {
                tracing::debug!(len = raw.len(), "no header block in buffer");
                (None, HeaderMap::new(), raw.to_vec())
            }
        };

        Response {
            status,
            headers,
            body: Body::Memory(body),
            download: None,
            parser: self.clone(),
        }
    }

    /// ダウンロードファイルをパースし、ヘッダーブロックを除去する
    ///
    /// `transfer_handle` は転送中の書き込みハンドルで、除去の前に閉じる。
    /// ヘッダーブロックが見つからない場合はファイルを変更せず、ヘッダーは空になる。
    pub fn parse_download(
        &self,
        location: FileLocation,
        transfer_handle: Option<Box<dyn Write>>,
        fs: Arc<dyn FileSystem>,
    ) -> Result<Response> {
        let mut response = Response {
            status: None,
            headers: HeaderMap::new(),
            body: Body::File(location.clone()),
            download: Some(Download { location, fs }),
            parser: self.clone(),
        };
        response.strip_with_handle(transfer_handle)?;
        Ok(response)
    }

    /// 転送層の情報に従ってパース
    ///
    /// `DeliveryMode::Buffer` の場合は `raw` をパースし、
    /// `DeliveryMode::Download` の場合は `raw` を使わずダウンロードファイルをパースする。
    pub fn parse_transfer<T: Transfer + ?Sized>(
        &self,
        raw: &[u8],
        transfer: &mut T,
    ) -> Result<Response> {
        match transfer.delivery_mode() {
            DeliveryMode::Buffer => Ok(self.parse_buffer(raw)),
            DeliveryMode::Download(location) => {
                let handle = transfer.take_download_handle();
                self.parse_download(location, handle, transfer.file_system())
            }
        }
    }
}

/// パース済みレスポンス
#[derive(Debug, Clone)]
pub struct Response {
    status: Option<StatusLine>,
    headers: HeaderMap,
    body: Body,
    download: Option<Download>,
    parser: ResponseParser,
}

impl Response {
    /// メモリ上のレスポンスをデフォルト設定でパース
    ///
    /// # 例
    ///
    /// ```rust
    /// use shiguredo_raw_response::Response;
    ///
    /// let response = Response::parse(b"HTTP/1.1 200 OK\r\nContent-Type: text/html\r\n\r\nhello");
    /// assert_eq!(response.header("Http-Version"), Some("1.1"));
    /// assert_eq!(response.header("Status-Code"), Some("200"));
    /// assert_eq!(response.header("Status"), Some("200 OK"));
    /// assert_eq!(response.header("Content-Type"), Some("text/html"));
    /// assert_eq!(response.to_string(), "hello");
    /// ```
    pub fn parse(raw: &[u8]) -> Self {
        ResponseParser::new().parse_buffer(raw)
    }

    /// 転送層の情報に従ってデフォルト設定でパース
    pub fn from_transfer<T: Transfer + ?Sized>(raw: &[u8], transfer: &mut T) -> Result<Self> {
        ResponseParser::new().parse_transfer(raw, transfer)
    }

    /// ボディを取得
    pub fn body(&self) -> &Body {
        &self.body
    }

    /// ヘッダーを取得
    ///
    /// ステータス行があれば `Http-Version` / `Status-Code` / `Status` も含む。
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// ヘッダーを取得 (大文字小文字を区別する)
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name)
    }

    /// ステータス行を取得
    pub fn status_line(&self) -> Option<&StatusLine> {
        self.status.as_ref()
    }

    /// ステータスコードを取得
    pub fn status_code(&self) -> Option<u16> {
        self.status.as_ref().map(StatusLine::status_code)
    }

    /// ステータスコードが情報レスポンス (1xx) か確認
    pub fn is_informational(&self) -> bool {
        self.status_in(100..200)
    }

    /// ステータスコードが成功 (2xx) か確認
    pub fn is_success(&self) -> bool {
        self.status_in(200..300)
    }

    /// ステータスコードがリダイレクト (3xx) か確認
    pub fn is_redirect(&self) -> bool {
        self.status_in(300..400)
    }

    /// ステータスコードがクライアントエラー (4xx) か確認
    pub fn is_client_error(&self) -> bool {
        self.status_in(400..500)
    }

    /// ステータスコードがサーバーエラー (5xx) か確認
    pub fn is_server_error(&self) -> bool {
        self.status_in(500..600)
    }

    fn status_in(&self, range: std::ops::Range<u16>) -> bool {
        self.status_code().is_some_and(|code| range.contains(&code))
    }

    /// Content-Type ヘッダーをパースして取得 (名前の大文字小文字を区別しない)
    pub fn content_type(&self) -> Option<ContentType> {
        self.headers
            .get_ignore_case("Content-Type")
            .and_then(|v| ContentType::parse(v).ok())
    }

    /// ダウンロードファイルの位置を取得
    pub fn download_location(&self) -> Option<&FileLocation> {
        self.download.as_ref().map(|d| &d.location)
    }

    /// ボディを文字列として取得
    ///
    /// UTF-8 として不正なバイトは U+FFFD に置き換える。
    /// ダウンロードファイルのボディは読み込まないため空文字列を返す
    /// ([`Response::open_file`] で読む)。
    pub fn text(&self) -> Cow<'_, str> {
        match &self.body {
            Body::Memory(bytes) => String::from_utf8_lossy(bytes),
            Body::File(_) => Cow::Borrowed(""),
        }
    }

    /// ダウンロードファイルを読み込み用に開く
    pub fn open_file(&self) -> Result<DownloadedFile> {
        let download = self.download.as_ref().ok_or_else(|| Error::FileOpen {
            location: FileLocation::new("", ""),
            source: io::Error::new(io::ErrorKind::NotFound, "response has no downloaded file"),
        })?;
        let inner = download
            .fs
            .open_read(&download.location)
            .map_err(|source| Error::FileOpen {
                location: download.location.clone(),
                source,
            })?;
        Ok(DownloadedFile {
            location: download.location.clone(),
            inner,
        })
    }

    /// [`Response::open_file`] で開いたハンドルを閉じる
    pub fn close_file(&self, file: DownloadedFile) {
        file.close();
    }

    /// ダウンロードファイルのヘッダーブロック除去をやり直す
    ///
    /// ヘッダーブロックが見つかった場合はステータス行とヘッダーを置き換える。
    /// メモリ上のレスポンスでは何もしない。
    pub fn strip_download_headers(&mut self) -> Result<RewriteOutcome> {
        self.strip_with_handle(None)
    }

    fn strip_with_handle(
        &mut self,
        transfer_handle: Option<Box<dyn Write>>,
    ) -> Result<RewriteOutcome> {
        let Some(download) = &self.download else {
            tracing::debug!("response body is not a downloaded file");
            return Ok(RewriteOutcome::NoHeaderBlock);
        };

        let rewriter = FileRewriter::with_options(
            download.fs.clone(),
            self.parser.parse_options.clone(),
            self.parser.rewrite_options.clone(),
        );
        let outcome = rewriter.strip(&download.location, transfer_handle)?;
        if let RewriteOutcome::Stripped { head, .. } = &outcome {
            self.apply_head(head);
        }
        Ok(outcome)
    }

    fn apply_head(&mut self, head: &HeaderBlock) {
        let (status, headers) = head.parse();
        self.status = status;
        self.headers = headers;
    }

    /// ボディの文字コードを変換する
    ///
    /// `from` を省略した場合は、ボディ内の `<meta>` の charset 宣言、
    /// Content-Type ヘッダーの charset の順に探す。
    /// ダウンロードファイルのボディは変換できない。
    pub fn convert_encoding(&mut self, to: &str, from: Option<&str>) -> Result<()> {
        let Body::Memory(bytes) = &self.body else {
            return Err(Error::CharsetConversion {
                from: from.unwrap_or_default().to_string(),
                to: to.to_string(),
                reason: "body is a downloaded file".to_string(),
            });
        };

        let from = match from {
            Some(from) => from.to_string(),
            None => self.detect_charset(bytes).ok_or_else(|| Error::CharsetConversion {
                from: String::new(),
                to: to.to_string(),
                reason: "source charset not declared".to_string(),
            })?,
        };

        let converted = transcode(bytes, &from, to)?.into_owned();
        tracing::debug!(%from, %to, len = converted.len(), "body converted");
        self.body = Body::Memory(converted);
        Ok(())
    }

    fn detect_charset(&self, bytes: &[u8]) -> Option<String> {
        detect_meta_charset(bytes).or_else(|| {
            self.content_type()
                .and_then(|ct| ct.charset().map(str::to_string))
        })
    }
}

impl fmt::Display for Response {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text())
    }
}

/// 開いたダウンロードファイル
///
/// drop で閉じる。
pub struct DownloadedFile {
    location: FileLocation,
    inner: Box<dyn ReadSeek>,
}

impl DownloadedFile {
    /// ファイルの位置
    pub fn location(&self) -> &FileLocation {
        &self.location
    }

    /// 閉じる
    pub fn close(self) {
        drop(self);
    }
}

impl fmt::Debug for DownloadedFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DownloadedFile")
            .field("location", &self.location)
            .finish_non_exhaustive()
    }
}

impl Read for DownloadedFile {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.inner.read(buf)
    }
}

impl Seek for DownloadedFile {
    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        self.inner.seek(pos)
    }
}
