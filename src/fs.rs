//! ファイルアクセスの抽象化
//!
//! ダウンロードファイルはアクセススキーム (`file` 等) とパスの組で指定する。
//! 実際の読み書きは [`FileSystem`] 実装が行うため、仮想ファイルシステムや
//! 障害注入用のラッパーに差し替えられる。

use std::fmt;
use std::fs::{self, File, OpenOptions};
use std::io::{self, Read, Seek, Write};
use std::path::{Path, PathBuf};

/// ローカルファイルシステムのスキーム
pub const LOCAL_SCHEME: &str = "file";

/// スキーム付きのファイル位置
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FileLocation {
    scheme: String,
    path: PathBuf,
}

impl FileLocation {
    /// スキームとパスから作成
    pub fn new(scheme: &str, path: impl Into<PathBuf>) -> Self {
        Self {
            scheme: scheme.to_string(),
            path: path.into(),
        }
    }

    /// ローカルファイルシステム上の位置を作成
    pub fn local(path: impl Into<PathBuf>) -> Self {
        Self::new(LOCAL_SCHEME, path)
    }

    /// アクセススキームを取得
    pub fn scheme(&self) -> &str {
        &self.scheme
    }

    /// パスを取得
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// パス末尾に接尾辞を付けた兄弟ファイルの位置を作成 (例: `<path>.tmp`)
    pub fn with_suffix(&self, suffix: &str) -> Self {
        let mut path = self.path.clone().into_os_string();
        path.push(suffix);
        Self {
            scheme: self.scheme.clone(),
            path: PathBuf::from(path),
        }
    }
}

impl fmt::Display for FileLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}://{}", self.scheme, self.path.display())
    }
}

/// 読み込み + シーク可能なハンドル
pub trait ReadSeek: Read + Seek {}

impl<T: Read + Seek> ReadSeek for T {}

/// ファイル操作の抽象
///
/// 同じパスへの並行アクセスは呼び出し側で直列化すること。
pub trait FileSystem: fmt::Debug {
    /// バイナリ読み込み用に開く
    fn open_read(&self, location: &FileLocation) -> io::Result<Box<dyn ReadSeek>>;

    /// バイナリ書き込み用に作成 (既存ファイルは切り詰める)
    fn create(&self, location: &FileLocation) -> io::Result<Box<dyn Write>>;

    /// 削除
    fn remove(&self, location: &FileLocation) -> io::Result<()>;

    /// リネーム
    ///
    /// 同一ディレクトリ内のリネームはアトミックであることを前提とする。
    fn rename(&self, from: &FileLocation, to: &FileLocation) -> io::Result<()>;

    /// パーミッションを設定
    fn set_permissions(&self, location: &FileLocation, mode: u32) -> io::Result<()>;
}

/// ローカルディスク上の [`FileSystem`]
///
/// `file` スキームと空スキームのみ受け付ける。
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalFileSystem;

impl LocalFileSystem {
    fn resolve<'a>(&self, location: &'a FileLocation) -> io::Result<&'a Path> {
        if location.scheme().is_empty() || location.scheme().eq_ignore_ascii_case(LOCAL_SCHEME)
        {
            Ok(location.path())
        } else {
            Err(io::Error::new(
                io::ErrorKind::Unsupported,
                format!("unsupported scheme: {}", location.scheme()),
            ))
        }
    }
}

impl FileSystem for LocalFileSystem {
    fn open_read(&self, location: &FileLocation) -> io::Result<Box<dyn ReadSeek>> {
        let file = File::open(self.resolve(location)?)?;
        Ok(Box::new(file))
    }

    fn create(&self, location: &FileLocation) -> io::Result<Box<dyn Write>> {
        let file = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .open(self.resolve(location)?)?;
        Ok(Box::new(file))
    }

    fn remove(&self, location: &FileLocation) -> io::Result<()> {
        fs::remove_file(self.resolve(location)?)
    }

    fn rename(&self, from: &FileLocation, to: &FileLocation) -> io::Result<()> {
        fs::rename(self.resolve(from)?, self.resolve(to)?)
    }

    #[cfg(unix)]
    fn set_permissions(&self, location: &FileLocation, mode: u32) -> io::Result<()> {
        use std::os::unix::fs::PermissionsExt;
        fs::set_permissions(self.resolve(location)?, fs::Permissions::from_mode(mode))
    }

    #[cfg(not(unix))]
    fn set_permissions(&self, location: &FileLocation, _mode: u32) -> io::Result<()> {
        // Unix 以外ではモードビットを持たない
        self.resolve(location).map(|_| ())
    }
}
