//! ダウンロードファイルのヘッダーブロック除去テスト
//!
//! 実ファイルを一時ディレクトリに作り、失敗を注入する FileSystem で各段階の
//! 失敗時に残るファイルを確認する。

use std::io::{self, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use shiguredo_raw_response::{
    Error, FileLocation, FileRewriter, FileSystem, LocalFileSystem, ParseOptions, ReadSeek,
    ReplaceMode, Response, ResponseParser, RewriteOptions, RewriteOutcome, TransferInfo,
};

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

const HEAD: &[u8] = b"HTTP/1.1 200 OK\r\nContent-Type: application/octet-stream\r\nContent-Length: 6\r\n\r\n";
const PAYLOAD: &[u8] = b"\x00\xffPK\r\n";

fn write_download(dir: &Path, name: &str) -> PathBuf {
    let path = dir.join(name);
    let mut data = HEAD.to_vec();
    data.extend_from_slice(PAYLOAD);
    std::fs::write(&path, data).unwrap();
    path
}

fn tmp_path(path: &Path) -> PathBuf {
    let mut p = path.as_os_str().to_owned();
    p.push(".tmp");
    PathBuf::from(p)
}

/// 指定した操作を失敗させる FileSystem
#[derive(Debug, Default)]
struct FaultyFileSystem {
    fail_create: bool,
    fail_write: bool,
    fail_remove: bool,
    fail_rename: bool,
    fail_permissions: bool,
    calls: Mutex<Vec<String>>,
}

impl FaultyFileSystem {
    fn record(&self, call: &str) {
        self.calls.lock().unwrap().push(call.to_string());
    }

    fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

fn injected() -> io::Error {
    io::Error::new(io::ErrorKind::PermissionDenied, "injected failure")
}

/// 書き込みが常に失敗するライター
struct BrokenWriter;

impl Write for BrokenWriter {
    fn write(&mut self, _buf: &[u8]) -> io::Result<usize> {
        Err(io::Error::new(io::ErrorKind::StorageFull, "disk full"))
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl FileSystem for FaultyFileSystem {
    fn open_read(&self, location: &FileLocation) -> io::Result<Box<dyn ReadSeek>> {
        self.record("open_read");
        LocalFileSystem.open_read(location)
    }

    fn create(&self, location: &FileLocation) -> io::Result<Box<dyn Write>> {
        self.record("create");
        if self.fail_create {
            return Err(injected());
        }
        let file = LocalFileSystem.create(location)?;
        if self.fail_write {
            drop(file);
            return Ok(Box::new(BrokenWriter));
        }
        Ok(file)
    }

    fn remove(&self, location: &FileLocation) -> io::Result<()> {
        self.record("remove");
        if self.fail_remove {
            return Err(injected());
        }
        LocalFileSystem.remove(location)
    }

    fn rename(&self, from: &FileLocation, to: &FileLocation) -> io::Result<()> {
        self.record("rename");
        if self.fail_rename {
            return Err(injected());
        }
        LocalFileSystem.rename(from, to)
    }

    fn set_permissions(&self, location: &FileLocation, mode: u32) -> io::Result<()> {
        self.record("set_permissions");
        if self.fail_permissions {
            return Err(injected());
        }
        LocalFileSystem.set_permissions(location, mode)
    }
}

#[test]
fn strip_round_trip() {
    init_tracing();
    let dir = tempfile::tempdir().unwrap();
    let path = write_download(dir.path(), "payload.bin");

    let mut transfer = TransferInfo::download(FileLocation::local(&path));
    let response = Response::from_transfer(b"ignored", &mut transfer).unwrap();

    assert_eq!(response.header("Status"), Some("200 OK"));
    assert_eq!(response.header("Content-Length"), Some("6"));
    assert!(response.body().is_file());
    assert_eq!(response.text(), "");
    assert_eq!(std::fs::read(&path).unwrap(), PAYLOAD);
    assert!(!tmp_path(&path).exists());

    let mut file = response.open_file().unwrap();
    let mut buf = Vec::new();
    file.read_to_end(&mut buf).unwrap();
    assert_eq!(buf.len(), PAYLOAD.len());
    assert_eq!(buf, PAYLOAD);

    file.seek(SeekFrom::Start(2)).unwrap();
    let mut rest = Vec::new();
    file.read_to_end(&mut rest).unwrap();
    assert_eq!(rest, b"PK\r\n");
    response.close_file(file);
}

#[test]
fn strip_is_idempotent() {
    init_tracing();
    let dir = tempfile::tempdir().unwrap();
    let path = write_download(dir.path(), "twice.bin");
    let mut transfer = TransferInfo::download(FileLocation::local(&path));
    let mut response = Response::from_transfer(&[], &mut transfer).unwrap();
    assert_eq!(std::fs::read(&path).unwrap(), PAYLOAD);

    let outcome = response.strip_download_headers().unwrap();
    assert_eq!(outcome, RewriteOutcome::NoHeaderBlock);
    assert_eq!(std::fs::read(&path).unwrap(), PAYLOAD);
    // 見つからなかった場合は既存のヘッダーを保持する
    assert_eq!(response.header("Status-Code"), Some("200"));
    assert!(!tmp_path(&path).exists());
}

#[test]
fn download_without_header_block() {
    init_tracing();
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("raw.txt");
    std::fs::write(&path, b"no headers here\r\n\r\nHTTP/1.1 200 OK\r\n\r\n").unwrap();

    let mut transfer = TransferInfo::download(FileLocation::local(&path));
    let response = Response::from_transfer(&[], &mut transfer).unwrap();
    assert!(response.headers().is_empty());
    assert_eq!(
        std::fs::read(&path).unwrap(),
        b"no headers here\r\n\r\nHTTP/1.1 200 OK\r\n\r\n"
    );
}

#[test]
fn download_with_transfer_handle() {
    init_tracing();
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("streamed.bin");
    let mut handle = io::BufWriter::new(std::fs::File::create(&path).unwrap());
    handle.write_all(HEAD).unwrap();
    handle.write_all(PAYLOAD).unwrap();
    // BufWriter の中身はハンドルを閉じる時に書き出される

    let mut transfer =
        TransferInfo::download(FileLocation::local(&path)).with_handle(Box::new(handle));
    let response = Response::from_transfer(&[], &mut transfer).unwrap();
    assert_eq!(response.status_code(), Some(200));
    assert_eq!(std::fs::read(&path).unwrap(), PAYLOAD);
}

#[test]
fn download_with_interim_block() {
    init_tracing();
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("continue.bin");
    let mut data = b"HTTP/1.1 100 Continue\r\n\r\n".to_vec();
    data.extend_from_slice(HEAD);
    data.extend_from_slice(PAYLOAD);
    std::fs::write(&path, data).unwrap();

    let mut transfer = TransferInfo::download(FileLocation::local(&path));
    let response = Response::from_transfer(&[], &mut transfer).unwrap();
    assert_eq!(response.header("Status"), Some("200 OK"));
    assert_eq!(std::fs::read(&path).unwrap(), PAYLOAD);
}

#[test]
fn open_missing_file() {
    init_tracing();
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("missing.bin");
    let mut transfer = TransferInfo::download(FileLocation::local(&path));
    let err = Response::from_transfer(&[], &mut transfer).unwrap_err();
    assert!(matches!(err, Error::FileOpen { .. }));
}

#[test]
fn open_file_after_removal() {
    init_tracing();
    let dir = tempfile::tempdir().unwrap();
    let path = write_download(dir.path(), "gone.bin");
    let mut transfer = TransferInfo::download(FileLocation::local(&path));
    let response = Response::from_transfer(&[], &mut transfer).unwrap();
    std::fs::remove_file(&path).unwrap();
    assert!(matches!(response.open_file(), Err(Error::FileOpen { .. })));
}

#[test]
fn create_failure() {
    init_tracing();
    let dir = tempfile::tempdir().unwrap();
    let path = write_download(dir.path(), "create.bin");
    let fs = Arc::new(FaultyFileSystem {
        fail_create: true,
        ..Default::default()
    });

    let err = FileRewriter::new(fs)
        .strip(&FileLocation::local(&path), None)
        .unwrap_err();
    match err {
        Error::FileWrite { location, .. } => assert_eq!(location.path(), tmp_path(&path)),
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(std::fs::read(&path).unwrap().len(), HEAD.len() + PAYLOAD.len());
    assert!(!tmp_path(&path).exists());
}

#[test]
fn write_failure_removes_temp() {
    init_tracing();
    let dir = tempfile::tempdir().unwrap();
    let path = write_download(dir.path(), "write.bin");
    let fs = Arc::new(FaultyFileSystem {
        fail_write: true,
        ..Default::default()
    });

    let err = FileRewriter::new(fs.clone())
        .strip(&FileLocation::local(&path), None)
        .unwrap_err();
    assert!(matches!(err, Error::FileWrite { .. }));
    assert!(path.exists());
    assert!(!tmp_path(&path).exists());
    assert_eq!(fs.calls(), vec!["open_read", "create", "remove"]);
}

#[test]
fn delete_failure_keeps_both_files() {
    init_tracing();
    let dir = tempfile::tempdir().unwrap();
    let path = write_download(dir.path(), "delete.bin");
    let fs = Arc::new(FaultyFileSystem {
        fail_remove: true,
        ..Default::default()
    });

    let err = FileRewriter::new(fs)
        .strip(&FileLocation::local(&path), None)
        .unwrap_err();
    match &err {
        Error::FileDelete { location, temp, .. } => {
            assert_eq!(location.path(), path);
            assert_eq!(temp.path(), tmp_path(&path));
        }
        other => panic!("unexpected error: {other}"),
    }

    let original = std::fs::read(&path).unwrap();
    assert!(original.starts_with(HEAD));
    assert_eq!(std::fs::read(tmp_path(&path)).unwrap(), PAYLOAD);
}

#[test]
fn rename_failure_keeps_only_temp() {
    init_tracing();
    let dir = tempfile::tempdir().unwrap();
    let path = write_download(dir.path(), "rename.bin");
    let fs = Arc::new(FaultyFileSystem {
        fail_rename: true,
        ..Default::default()
    });

    let err = FileRewriter::new(fs)
        .strip(&FileLocation::local(&path), None)
        .unwrap_err();
    assert!(matches!(err, Error::FileRename { .. }));
    assert!(!path.exists());
    assert_eq!(std::fs::read(tmp_path(&path)).unwrap(), PAYLOAD);
}

#[test]
fn rename_over_skips_delete() {
    init_tracing();
    let dir = tempfile::tempdir().unwrap();
    let path = write_download(dir.path(), "over.bin");
    let fs = Arc::new(FaultyFileSystem {
        fail_remove: true,
        ..Default::default()
    });
    let options = RewriteOptions {
        replace: ReplaceMode::RenameOver,
        ..RewriteOptions::default()
    };

    let outcome = FileRewriter::with_options(fs.clone(), ParseOptions::default(), options)
        .strip(&FileLocation::local(&path), None)
        .unwrap();
    assert!(matches!(outcome, RewriteOutcome::Stripped { payload_len: 6, .. }));
    assert_eq!(std::fs::read(&path).unwrap(), PAYLOAD);
    assert!(!fs.calls().contains(&"remove".to_string()));
}

#[test]
fn permission_failure_is_ignored() {
    init_tracing();
    let dir = tempfile::tempdir().unwrap();
    let path = write_download(dir.path(), "perm.bin");
    let fs = Arc::new(FaultyFileSystem {
        fail_permissions: true,
        ..Default::default()
    });

    let outcome = FileRewriter::new(fs.clone())
        .strip(&FileLocation::local(&path), None)
        .unwrap();
    assert!(matches!(outcome, RewriteOutcome::Stripped { .. }));
    assert_eq!(
        fs.calls(),
        vec!["open_read", "create", "remove", "rename", "set_permissions"]
    );
}

#[cfg(unix)]
#[test]
fn permissions_are_applied() {
    use std::os::unix::fs::PermissionsExt;

    init_tracing();
    let dir = tempfile::tempdir().unwrap();
    let path = write_download(dir.path(), "mode.bin");
    let options = RewriteOptions {
        permissions: Some(0o640),
        ..RewriteOptions::default()
    };
    let parser = ResponseParser::new().rewrite_options(options);
    parser
        .parse_download(FileLocation::local(&path), None, Arc::new(LocalFileSystem))
        .unwrap();

    let mode = std::fs::metadata(&path).unwrap().permissions().mode();
    assert_eq!(mode & 0o777, 0o640);
}

/// `vfs` スキームをディレクトリにマップする FileSystem
#[derive(Debug)]
struct RootedFileSystem {
    root: PathBuf,
}

impl RootedFileSystem {
    fn map(&self, location: &FileLocation) -> io::Result<FileLocation> {
        if location.scheme() != "vfs" {
            return Err(io::Error::new(io::ErrorKind::Unsupported, "not vfs"));
        }
        Ok(FileLocation::local(self.root.join(location.path())))
    }
}

impl FileSystem for RootedFileSystem {
    fn open_read(&self, location: &FileLocation) -> io::Result<Box<dyn ReadSeek>> {
        LocalFileSystem.open_read(&self.map(location)?)
    }

    fn create(&self, location: &FileLocation) -> io::Result<Box<dyn Write>> {
        LocalFileSystem.create(&self.map(location)?)
    }

    fn remove(&self, location: &FileLocation) -> io::Result<()> {
        LocalFileSystem.remove(&self.map(location)?)
    }

    fn rename(&self, from: &FileLocation, to: &FileLocation) -> io::Result<()> {
        LocalFileSystem.rename(&self.map(from)?, &self.map(to)?)
    }

    fn set_permissions(&self, location: &FileLocation, mode: u32) -> io::Result<()> {
        LocalFileSystem.set_permissions(&self.map(location)?, mode)
    }
}

#[test]
fn virtual_file_system_scheme() {
    init_tracing();
    let dir = tempfile::tempdir().unwrap();
    write_download(dir.path(), "virtual.bin");

    let fs = Arc::new(RootedFileSystem {
        root: dir.path().to_path_buf(),
    });
    let location = FileLocation::new("vfs", "virtual.bin");
    let mut transfer = TransferInfo::download(location.clone()).with_file_system(fs);
    let response = Response::from_transfer(&[], &mut transfer).unwrap();

    assert_eq!(response.download_location(), Some(&location));
    assert_eq!(
        std::fs::read(dir.path().join("virtual.bin")).unwrap(),
        PAYLOAD
    );

    let mut buf = Vec::new();
    response.open_file().unwrap().read_to_end(&mut buf).unwrap();
    assert_eq!(buf, PAYLOAD);
}

#[test]
fn large_payload_is_copied_in_chunks() {
    init_tracing();
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("large.bin");
    let payload: Vec<u8> = (0..200_000u32).map(|i| (i % 251) as u8).collect();
    let mut data = HEAD.to_vec();
    data.extend_from_slice(&payload);
    std::fs::write(&path, data).unwrap();

    let options = RewriteOptions {
        copy_chunk_size: 1000,
        ..RewriteOptions::default()
    };
    let outcome = FileRewriter::with_options(
        Arc::new(LocalFileSystem),
        ParseOptions::default(),
        options,
    )
    .strip(&FileLocation::local(&path), None)
    .unwrap();
    assert!(matches!(outcome, RewriteOutcome::Stripped { payload_len: 200_000, .. }));
    assert_eq!(std::fs::read(&path).unwrap(), payload);
}
