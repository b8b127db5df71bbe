//! ファイルシステム抽象化
//!
//! インストーラとマネージャが使用するファイルシステム操作の抽象化レイヤー。
//! テスト時に MockFs を注入してファイル操作をモック化できる。

use crate::error::{AomError, Result};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// ファイル種別
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FsFileType {
    File,
    Dir,
    Symlink,
}

/// ファイルシステム抽象化のための独自 DirEntry
#[derive(Debug, Clone)]
pub struct FsDirEntry {
    pub path: PathBuf,
    pub file_type: FsFileType,
}

impl FsDirEntry {
    /// エントリ名（最後のパス要素）
    pub fn name(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default()
    }

    /// ディレクトリかどうか
    pub fn is_dir(&self) -> bool {
        self.file_type == FsFileType::Dir
    }

    /// ファイルかどうか
    pub fn is_file(&self) -> bool {
        self.file_type == FsFileType::File
    }
}

/// ファイルシステム操作を抽象化するトレイト
///
/// 本番コードでは RealFs を使用する。
pub trait FileSystem: Send + Sync {
    /// ファイルをコピー
    ///
    /// - 宛先が存在すれば上書き
    /// - 親ディレクトリは自動作成
    fn copy_file(&self, src: &Path, dst: &Path) -> Result<()>;

    /// ディレクトリを再帰的にコピー
    ///
    /// - 宛先ディレクトリにマージ（既存ファイルは上書き）
    /// - 同一/子孫パスへのコピーは Err
    fn copy_dir(&self, src: &Path, dst: &Path) -> Result<()>;

    /// ファイルまたはディレクトリを削除
    ///
    /// - ファイルなら削除、ディレクトリなら再帰削除
    /// - 存在しない場合は Ok(())
    fn remove(&self, path: &Path) -> Result<()>;

    /// ファイルまたはディレクトリを移動（リネーム）
    ///
    /// - 同一ファイルシステム内でのリネーム
    fn rename(&self, src: &Path, dst: &Path) -> Result<()>;

    /// パスが存在するか
    fn exists(&self, path: &Path) -> bool;

    /// ディレクトリかどうか
    fn is_dir(&self, path: &Path) -> bool;

    /// ディレクトリを再帰的に作成
    fn create_dir_all(&self, path: &Path) -> Result<()>;

    /// ディレクトリ内のエントリを取得
    ///
    /// - 順序は未定義
    /// - シンボリックリンクは追従しない
    /// - 引数がディレクトリでない場合は Err
    fn read_dir(&self, path: &Path) -> Result<Vec<FsDirEntry>>;
}

/// 本番用ファイルシステム実装
pub struct RealFs;

impl FileSystem for RealFs {
    fn copy_file(&self, src: &Path, dst: &Path) -> Result<()> {
        if let Some(parent) = dst.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::copy(src, dst)?;
        Ok(())
    }

    fn copy_dir(&self, src: &Path, dst: &Path) -> Result<()> {
        // 同一/子孫パスチェック
        if let (Ok(src_canonical), Ok(dst_canonical)) = (src.canonicalize(), dst.canonicalize()) {
            if dst_canonical.starts_with(&src_canonical) {
                return Err(AomError::Io(std::io::Error::new(
                    std::io::ErrorKind::InvalidInput,
                    "Cannot copy directory into itself or its subdirectory",
                )));
            }
        }

        std::fs::create_dir_all(dst)?;
        for entry in WalkDir::new(src).min_depth(1).follow_links(true) {
            let entry = entry.map_err(|e| {
                AomError::Io(
                    e.into_io_error()
                        .unwrap_or_else(|| std::io::Error::other("directory loop detected")),
                )
            })?;
            let relative = entry
                .path()
                .strip_prefix(src)
                .map_err(|e| AomError::Io(std::io::Error::other(e.to_string())))?;
            let target = dst.join(relative);

            if entry.file_type().is_dir() {
                std::fs::create_dir_all(&target)?;
            } else {
                std::fs::copy(entry.path(), &target)?;
            }
        }
        Ok(())
    }

    fn remove(&self, path: &Path) -> Result<()> {
        let metadata = match path.symlink_metadata() {
            Ok(m) => m,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(()),
            Err(e) => return Err(e.into()),
        };
        if metadata.is_dir() {
            std::fs::remove_dir_all(path)?;
        } else {
            std::fs::remove_file(path)?;
        }
        Ok(())
    }

    fn rename(&self, src: &Path, dst: &Path) -> Result<()> {
        std::fs::rename(src, dst)?;
        Ok(())
    }

    fn exists(&self, path: &Path) -> bool {
        path.exists()
    }

    fn is_dir(&self, path: &Path) -> bool {
        path.is_dir()
    }

    fn create_dir_all(&self, path: &Path) -> Result<()> {
        std::fs::create_dir_all(path)?;
        Ok(())
    }

    fn read_dir(&self, path: &Path) -> Result<Vec<FsDirEntry>> {
        let mut entries = Vec::new();
        for entry in std::fs::read_dir(path)? {
            let entry = entry?;
            let metadata = entry.path().symlink_metadata()?;
            let file_type = if metadata.is_symlink() {
                FsFileType::Symlink
            } else if metadata.is_dir() {
                FsFileType::Dir
            } else {
                FsFileType::File
            };
            entries.push(FsDirEntry {
                path: entry.path(),
                file_type,
            });
        }
        Ok(entries)
    }
}

#[cfg(test)]
pub mod mock;

#[cfg(test)]
#[path = "fs_test.rs"]
mod tests;
