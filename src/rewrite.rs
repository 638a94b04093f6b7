//! ダウンロードファイルからのヘッダーブロック除去
//!
//! 転送中にファイルへ直接書き込まれたレスポンスは先頭にヘッダーブロックを含む。
//! [`FileRewriter`] はヘッダーブロックの後ろだけを `<path>.tmp` へコピーし、
//! 元ファイルと置き換える。
//!
//! ## 失敗時に残るファイル
//!
//! | 失敗した段階 | エラー | 残るファイル |
//! |---|---|---|
//! | 元ファイルを開く | `FileOpen` | 元ファイル (未変更) |
//! | 一時ファイル作成 | `FileWrite` | 元ファイル (未変更) |
//! | コピー | `FileRead` / `FileWrite` | 元ファイル (未変更) |
//! | 元ファイル削除 | `FileDelete` | 元ファイル (未変更) と一時ファイル (ペイロード) |
//! | リネーム | `FileRename` | 一時ファイル (ペイロード) のみ |
//!
//! `ReplaceMode::DeleteThenRename` では削除とリネームの間にプロセスが落ちると、
//! 元のパスにファイルがない状態になる。ペイロードは一時ファイルに残っている。
//! `ReplaceMode::RenameOver` はこの区間を持たない。
//!
//! 処理中に同じパスを他から読み書きしないこと (呼び出し側でパス単位に直列化する)。

use std::io::{self, BufReader, Read, Seek, SeekFrom, Write};
use std::sync::Arc;

use crate::error::{Error, Result};
use crate::fs::{FileLocation, FileSystem};
use crate::head::{HeaderBlock, locate_in_reader};
use crate::options::{ParseOptions, ReplaceMode, RewriteOptions};

/// 書き換え結果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RewriteOutcome {
    /// ヘッダーブロックを除去した
    Stripped {
        /// 除去したヘッダーブロック
        head: HeaderBlock,
        /// 残したペイロードのバイト数
        payload_len: u64,
    },
    /// ヘッダーブロックが見つからなかった (ファイルは変更していない)
    NoHeaderBlock,
}

/// ダウンロードファイル書き換え
#[derive(Debug, Clone)]
pub struct FileRewriter {
    fs: Arc<dyn FileSystem>,
    parse_options: ParseOptions,
    options: RewriteOptions,
}

/// コピー中の失敗箇所
enum CopyError {
    Read(io::Error),
    Write(io::Error),
}

impl FileRewriter {
    /// デフォルト設定で作成
    pub fn new(fs: Arc<dyn FileSystem>) -> Self {
        Self::with_options(fs, ParseOptions::default(), RewriteOptions::default())
    }

    /// 設定付きで作成
    pub fn with_options(
        fs: Arc<dyn FileSystem>,
        parse_options: ParseOptions,
        options: RewriteOptions,
    ) -> Self {
        Self {
            fs,
            parse_options,
            options,
        }
    }

    /// 書き換え設定を取得
    pub fn options(&self) -> &RewriteOptions {
        &self.options
    }

    /// ファイル先頭のヘッダーブロックを除去する
    ///
    /// `transfer_handle` は転送層が書き込みに使っていたハンドルで、最初に閉じる。
    /// 閉じる際のエラーは無視する。
    pub fn strip(
        &self,
        location: &FileLocation,
        transfer_handle: Option<Box<dyn Write>>,
    ) -> Result<RewriteOutcome> {
        close_transfer_handle(location, transfer_handle);

        let source = self
            .fs
            .open_read(location)
            .map_err(|source| Error::FileOpen {
                location: location.clone(),
                source,
            })?;
        let mut reader = BufReader::new(source);

        let read_error = |source: io::Error| Error::FileRead {
            location: location.clone(),
            source,
        };

        let Some(head) = locate_in_reader(&mut reader, &self.parse_options).map_err(read_error)?
        else {
            tracing::debug!(%location, "no header block found, file left unchanged");
            return Ok(RewriteOutcome::NoHeaderBlock);
        };
        tracing::debug!(
            %location,
            head_len = head.len(),
            body_offset = head.body_offset(),
            "header block located"
        );

        reader
            .seek(SeekFrom::Start(head.body_offset() as u64))
            .map_err(read_error)?;

        let temp = location.with_suffix(&self.options.temp_suffix);
        let mut writer = self.fs.create(&temp).map_err(|source| Error::FileWrite {
            location: temp.clone(),
            source,
        })?;

        let copied = copy_chunks(&mut reader, &mut writer, self.options.copy_chunk_size);
        drop(reader);
        drop(writer);
        let payload_len = match copied {
            Ok(n) => n,
            Err(e) => {
                self.discard_temp(&temp);
                return Err(match e {
                    CopyError::Read(source) => Error::FileRead {
                        location: location.clone(),
                        source,
                    },
                    CopyError::Write(source) => Error::FileWrite {
                        location: temp,
                        source,
                    },
                });
            }
        };

        self.replace(location, &temp)?;

        if let Some(mode) = self.options.permissions {
            if let Err(e) = self.fs.set_permissions(location, mode) {
                tracing::warn!(%location, mode, error = %e, "failed to set permissions");
            }
        }

        tracing::debug!(%location, payload_len, "header block stripped");
        Ok(RewriteOutcome::Stripped { head, payload_len })
    }

    fn replace(&self, location: &FileLocation, temp: &FileLocation) -> Result<()> {
        let rename = || {
            self.fs
                .rename(temp, location)
                .map_err(|source| Error::FileRename {
                    from: temp.clone(),
                    to: location.clone(),
                    source,
                })
        };

        match self.options.replace {
            ReplaceMode::DeleteThenRename => {
                self.fs
                    .remove(location)
                    .map_err(|source| Error::FileDelete {
                        location: location.clone(),
                        temp: temp.clone(),
                        source,
                    })?;
                rename()
            }
            ReplaceMode::RenameOver => rename(),
        }
    }

    fn discard_temp(&self, temp: &FileLocation) {
        if let Err(e) = self.fs.remove(temp) {
            tracing::warn!(location = %temp, error = %e, "failed to remove temporary file");
        }
    }
}

/// 転送層のハンドルを閉じる (失敗しても続行する)
fn close_transfer_handle(location: &FileLocation, handle: Option<Box<dyn Write>>) {
    if let Some(mut handle) = handle {
        if let Err(e) = handle.flush() {
            tracing::warn!(%location, error = %e, "failed to flush transfer handle");
        }
    }
}

fn copy_chunks<R: Read, W: Write>(
    reader: &mut R,
    writer: &mut W,
    chunk_size: usize,
) -> std::result::Result<u64, CopyError> {
    let mut buf = vec![0u8; chunk_size.max(1)];
    let mut total = 0u64;
    loop {
        let n = match reader.read(&mut buf) {
            Ok(0) => break,
            Ok(n) => n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(CopyError::Read(e)),
        };
        writer.write_all(&buf[..n]).map_err(CopyError::Write)?;
        total += n as u64;
    }
    writer.flush().map_err(CopyError::Write)?;
    Ok(total)
}
