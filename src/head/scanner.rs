//! ヘッダーブロック探索 (Sans I/O)
//!
//! 1 バイトずつ状態遷移するため、データをどのような単位で投入しても結果は同じになる。
//! 終端 CRLFCRLF は直近 4 バイトの窓で検出するので、探索はソース長に対して線形。

use std::io::{self, BufRead};

use super::block::{HEAD_TERMINATOR, HeaderBlock};
use super::phase::ScanPhase;
use crate::options::ParseOptions;

/// ステータス行先頭 "HTTP/d.d" のバイト数
const STATUS_PREFIX_LEN: usize = 8;

/// [`locate_in_reader`] が 1 回に投入する最大バイト数
pub const READ_CHUNK_SIZE: usize = 8192;

/// 探索の進捗
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanProgress {
    /// 追加データが必要
    Continue,
    /// 結果が確定した (`finish()` で取得する)
    Complete,
}

/// ヘッダーブロック探索器
///
/// ソースの先頭が `HTTP/d.d` (HTTP は大文字小文字を区別しない) で始まり、
/// その後に CRLFCRLF が現れた場合にヘッダーブロックとみなす。
/// 先頭が合わない時点で探索を打ち切る。
///
/// # 例
///
/// ```rust
/// use shiguredo_raw_response::{HeadScanner, ParseOptions, ScanProgress};
///
/// let mut scanner = HeadScanner::new(ParseOptions::default());
/// assert_eq!(scanner.feed(b"HTTP/1.1 200 OK\r\n"), ScanProgress::Continue);
/// assert_eq!(scanner.feed(b"\r\nbody"), ScanProgress::Complete);
///
/// let block = scanner.finish().unwrap();
/// assert_eq!(block.body_offset(), 19);
/// ```
#[derive(Debug)]
pub struct HeadScanner {
    options: ParseOptions,
    phase: ScanPhase,
    /// 投入済みバイト数
    consumed: usize,
    /// 探索中のブロック
    block: Vec<u8>,
    /// 直近 4 バイト
    window: [u8; 4],
    /// 確定したブロック
    found: Option<HeaderBlock>,
    /// 読み飛ばし候補の中間レスポンスブロック
    interim: Option<HeaderBlock>,
}

impl HeadScanner {
    /// 新しい探索器を作成
    pub fn new(options: ParseOptions) -> Self {
        Self {
            options,
            phase: ScanPhase::StatusPrefix { matched: 0 },
            consumed: 0,
            block: Vec::new(),
            window: [0; 4],
            found: None,
            interim: None,
        }
    }

    /// 投入済みバイト数
    pub fn consumed(&self) -> usize {
        self.consumed
    }

    /// 結果が確定したか
    pub fn is_complete(&self) -> bool {
        self.phase == ScanPhase::Done
    }

    /// データを投入
    ///
    /// 結果が確定した後に投入したデータは無視する。
    pub fn feed(&mut self, data: &[u8]) -> ScanProgress {
        for &b in data {
            match self.phase {
                ScanPhase::Done => break,
                ScanPhase::StatusPrefix { matched } => {
                    if !status_prefix_matches(matched, b) {
                        self.give_up();
                        break;
                    }
                    self.push(b);
                    self.phase = if matched + 1 == STATUS_PREFIX_LEN {
                        ScanPhase::Block
                    } else {
                        ScanPhase::StatusPrefix {
                            matched: matched + 1,
                        }
                    };
                }
                ScanPhase::Block => {
                    self.push(b);
                    if self.block.len() > self.options.max_head_size {
                        tracing::debug!(
                            limit = self.options.max_head_size,
                            "header block exceeds size limit"
                        );
                        self.give_up();
                        break;
                    }
                    if &self.window == HEAD_TERMINATOR {
                        self.complete_block();
                    }
                }
            }
        }

        if self.is_complete() {
            ScanProgress::Complete
        } else {
            ScanProgress::Continue
        }
    }

    /// 探索を終了して結果を取得
    ///
    /// ソース終端で呼んだ場合、最後に完了した中間レスポンスブロックがあればそれを返す。
    pub fn finish(self) -> Option<HeaderBlock> {
        self.found.or(self.interim)
    }

    fn push(&mut self, b: u8) {
        self.block.push(b);
        self.consumed += 1;
        self.window.rotate_left(1);
        self.window[3] = b;
    }

    fn complete_block(&mut self) {
        let head = HeaderBlock::new(std::mem::take(&mut self.block), self.consumed);
        self.window = [0; 4];

        let interim = self.options.follow_interim_responses
            && head
                .status_line()
                .is_some_and(|s| s.is_informational() || s.is_redirect());
        if interim {
            tracing::debug!(offset = self.consumed, "skipping interim header block");
            self.interim = Some(head);
            self.phase = ScanPhase::StatusPrefix { matched: 0 };
        } else {
            self.found = Some(head);
            self.phase = ScanPhase::Done;
        }
    }

    /// 現在のブロックを捨てて探索を終える
    fn give_up(&mut self) {
        self.block.clear();
        self.phase = ScanPhase::Done;
    }
}

fn status_prefix_matches(pos: usize, b: u8) -> bool {
    match pos {
        0..=3 => b.eq_ignore_ascii_case(&b"HTTP"[pos]),
        4 => b == b'/',
        5 | 7 => b.is_ascii_digit(),
        6 => b == b'.',
        _ => false,
    }
}

/// バッファ全体からヘッダーブロックを探す
pub fn locate(buf: &[u8], options: &ParseOptions) -> Option<HeaderBlock> {
    let mut scanner = HeadScanner::new(options.clone());
    scanner.feed(buf);
    scanner.finish()
}

/// リーダーから 1 行ずつ読みながらヘッダーブロックを探す
///
/// 結果が確定した時点で読み込みをやめる。1 回に投入するのは改行までか
/// [`READ_CHUNK_SIZE`] バイトまでなので、改行を含まない巨大なファイルでも
/// 読み込む量は `max_head_size + READ_CHUNK_SIZE` 程度に収まる。
/// リーダーの読み込み位置は探索した分だけ進むので、ボディを読む場合は
/// `body_offset()` にシークし直すこと。
pub fn locate_in_reader<R: BufRead>(
    reader: &mut R,
    options: &ParseOptions,
) -> io::Result<Option<HeaderBlock>> {
    let mut scanner = HeadScanner::new(options.clone());
    loop {
        let buf = match reader.fill_buf() {
            Ok(buf) => buf,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        };
        if buf.is_empty() {
            break;
        }
        let limit = buf.len().min(READ_CHUNK_SIZE);
        let n = buf[..limit]
            .iter()
            .position(|&b| b == b'\n')
            .map_or(limit, |i| i + 1);
        let progress = scanner.feed(&buf[..n]);
        reader.consume(n);
        if progress == ScanProgress::Complete {
            break;
        }
    }
    Ok(scanner.finish())
}
