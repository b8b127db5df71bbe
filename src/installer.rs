//! ペイロードのアドオンディレクトリへの配置
//!
//! ペイロード直下にマニフェスト（`*.toc`）があれば全体を1つのアドオンとして、
//! なければ直下の各エントリをそれぞれ独立したアドオンフォルダとして配置する。
//!
//! コピーはまずアドオンディレクトリ内のステージング領域に行い、
//! 完了後に各フォルダを既存のものと入れ替える。

use crate::error::{AomError, Result};
use crate::fs::{FileSystem, FsDirEntry};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tracing::debug;

/// 配置対象から除外するVCSメタデータ
const VCS_ENTRIES: &[&str] = &[".git", ".gitlab", ".svn", ".hg"];

const STAGING_PREFIX: &str = ".aom-staging";

static STAGING_COUNTER: AtomicUsize = AtomicUsize::new(0);

/// 配置結果
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Placement {
    /// アドオンディレクトリ直下に作成したフォルダ名
    pub folders: Vec<String>,
}

/// インストーラ
#[derive(Clone)]
pub struct Installer {
    fs: Arc<dyn FileSystem>,
    manifest_extension: String,
}

impl Installer {
    pub fn new(fs: Arc<dyn FileSystem>, manifest_extension: impl Into<String>) -> Self {
        Self {
            fs,
            manifest_extension: manifest_extension.into(),
        }
    }

    /// ペイロードを `addons_dir` に配置
    ///
    /// `fallback_name` は単一アドオンとして配置する場合のフォルダ名。
    pub fn place(&self, payload: &Path, addons_dir: &Path, fallback_name: &str) -> Result<Placement> {
        let entries = self.payload_entries(payload)?;
        if entries.is_empty() {
            return Err(AomError::install(payload, "payload contains no files"));
        }

        self.fs
            .create_dir_all(addons_dir)
            .map_err(|e| AomError::install(addons_dir, e))?;
        let staging = Staging::create(self.fs.clone(), addons_dir)?;

        let folders = if self.has_manifest(&entries) {
            validate_folder_name(fallback_name, addons_dir)?;
            debug!(folder = fallback_name, "manifest found, placing as a single addon");
            let root = staging.path.join(fallback_name);
            self.fs
                .create_dir_all(&root)
                .map_err(|e| AomError::install(&root, e))?;
            for entry in &entries {
                self.copy_entry(entry, &root.join(entry.name()))?;
            }
            vec![fallback_name.to_string()]
        } else {
            debug!(count = entries.len(), "no manifest, placing each entry as an addon");
            for entry in &entries {
                self.copy_entry(entry, &staging.path.join(entry.name()))?;
            }
            entries.iter().map(FsDirEntry::name).collect()
        };

        for folder in &folders {
            let dest = addons_dir.join(folder);
            self.fs.remove(&dest).map_err(|e| AomError::install(&dest, e))?;
            self.fs
                .rename(&staging.path.join(folder), &dest)
                .map_err(|e| AomError::install(&dest, e))?;
        }

        Ok(Placement { folders })
    }

    /// VCSメタデータを除いたペイロード直下のエントリ（名前順）
    fn payload_entries(&self, payload: &Path) -> Result<Vec<FsDirEntry>> {
        let mut entries: Vec<FsDirEntry> = self
            .fs
            .read_dir(payload)
            .map_err(|e| AomError::install(payload, e))?
            .into_iter()
            .filter(|entry| !VCS_ENTRIES.contains(&entry.name().as_str()))
            .collect();
        entries.sort_by_key(FsDirEntry::name);
        Ok(entries)
    }

    fn has_manifest(&self, entries: &[FsDirEntry]) -> bool {
        entries.iter().any(|entry| {
            !entry.is_dir()
                && entry
                    .path
                    .extension()
                    .is_some_and(|ext| ext.to_string_lossy().eq_ignore_ascii_case(&self.manifest_extension))
        })
    }

    fn copy_entry(&self, entry: &FsDirEntry, dest: &Path) -> Result<()> {
        let result = if self.fs.is_dir(&entry.path) {
            self.fs.copy_dir(&entry.path, dest)
        } else {
            self.fs.copy_file(&entry.path, dest)
        };
        result.map_err(|e| AomError::install(dest, e))
    }
}

/// フォルダ名が単一のパス要素であることを確認
fn validate_folder_name(name: &str, addons_dir: &Path) -> Result<()> {
    let invalid = name.is_empty()
        || name == "."
        || name == ".."
        || name.contains(['/', '\\'])
        || name.starts_with(STAGING_PREFIX);
    if invalid {
        return Err(AomError::install(
            addons_dir.join(name),
            format!("'{}' is not a valid addon folder name", name),
        ));
    }
    Ok(())
}

/// ステージング領域（Drop 時に削除）
struct Staging {
    fs: Arc<dyn FileSystem>,
    path: PathBuf,
}

impl Staging {
    fn create(fs: Arc<dyn FileSystem>, addons_dir: &Path) -> Result<Self> {
        let n = STAGING_COUNTER.fetch_add(1, Ordering::Relaxed);
        let path = addons_dir.join(format!("{}-{}-{}", STAGING_PREFIX, std::process::id(), n));
        fs.create_dir_all(&path)
            .map_err(|e| AomError::install(&path, e))?;
        Ok(Self { fs, path })
    }
}

impl Drop for Staging {
    fn drop(&mut self) {
        if let Err(e) = self.fs.remove(&self.path) {
            debug!(path = %self.path.display(), error = %e, "failed to remove staging directory");
        }
    }
}

#[cfg(test)]
#[path = "installer_test.rs"]
mod tests;
