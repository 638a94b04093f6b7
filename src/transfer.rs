//! 転送層とのインターフェース
//!
//! HTTP リクエストを実行する側 (転送層) はこのクレートの外にある。
//! レスポンスのパースに必要なのは、受け渡し方法とダウンロード先の情報だけなので、
//! それを [`Transfer`] として切り出している。

use std::fmt;
use std::io::Write;
use std::sync::Arc;

use crate::fs::{FileLocation, FileSystem, LocalFileSystem};

/// レスポンスの受け渡し方法
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeliveryMode {
    /// レスポンス全体がメモリ上にある
    Buffer,
    /// 転送中にファイルへ直接書き込まれた (ヘッダーブロックも含む)
    Download(FileLocation),
}

/// 転送層が提供する情報
pub trait Transfer {
    /// 受け渡し方法
    fn delivery_mode(&self) -> DeliveryMode;

    /// 転送中に使っていた書き込みハンドルを引き取る
    ///
    /// 所有権ごと渡され、ヘッダー除去の前に閉じられる。
    fn take_download_handle(&mut self) -> Option<Box<dyn Write>> {
        None
    }

    /// ダウンロードファイルにアクセスするファイルシステム
    fn file_system(&self) -> Arc<dyn FileSystem> {
        Arc::new(LocalFileSystem)
    }
}

/// 単純な [`Transfer`] 実装
///
/// 転送層が独自の型を持たない場合やテストで使う。
pub struct TransferInfo {
    mode: DeliveryMode,
    handle: Option<Box<dyn Write>>,
    fs: Arc<dyn FileSystem>,
}

impl TransferInfo {
    /// メモリ上のレスポンス
    pub fn buffer() -> Self {
        Self {
            mode: DeliveryMode::Buffer,
            handle: None,
            fs: Arc::new(LocalFileSystem),
        }
    }

    /// ファイルへダウンロードされたレスポンス
    pub fn download(location: FileLocation) -> Self {
        Self {
            mode: DeliveryMode::Download(location),
            handle: None,
            fs: Arc::new(LocalFileSystem),
        }
    }

    /// 転送中の書き込みハンドルを設定
    pub fn with_handle(mut self, handle: Box<dyn Write>) -> Self {
        self.handle = Some(handle);
        self
    }

    /// ファイルシステムを設定
    pub fn with_file_system(mut self, fs: Arc<dyn FileSystem>) -> Self {
        self.fs = fs;
        self
    }
}

impl fmt::Debug for TransferInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TransferInfo")
            .field("mode", &self.mode)
            .field("handle", &self.handle.is_some())
            .field("fs", &self.fs)
            .finish()
    }
}

impl Transfer for TransferInfo {
    fn delivery_mode(&self) -> DeliveryMode {
        self.mode.clone()
    }

    fn take_download_handle(&mut self) -> Option<Box<dyn Write>> {
        self.handle.take()
    }

    fn file_system(&self) -> Arc<dyn FileSystem> {
        self.fs.clone()
    }
}
