//! zipアーカイブの展開

use crate::error::{AomError, Result};
use std::fs;
use std::io;
use std::path::{Component as PathComponent, Path, PathBuf};
use zip::ZipArchive;

/// zipアーカイブを `dest` に展開し、書き出したファイル数を返す
///
/// - `\` 区切りのエントリは `/` に正規化する
/// - `..` や絶対パスを含むエントリ（zip-slip）があればエラー
/// - シンボリックリンクのエントリは展開しない
pub fn extract_zip(archive_path: &Path, dest: &Path) -> Result<usize> {
    let file = fs::File::open(archive_path).map_err(extraction)?;
    let mut zip = ZipArchive::new(io::BufReader::new(file)).map_err(extraction)?;
    fs::create_dir_all(dest).map_err(extraction)?;

    let mut files_extracted = 0usize;

    for i in 0..zip.len() {
        let mut entry = zip.by_index(i).map_err(extraction)?;

        // バックスラッシュをスラッシュに正規化（Windows由来のzip対応）
        let normalized = entry.name().replace('\\', "/");
        let relative = safe_relative_path(&normalized).ok_or_else(|| {
            AomError::Extraction(format!("unsafe entry path in archive: {}", entry.name()))
        })?;

        // 空のパス（ルートディレクトリ）はスキップ
        if relative.as_os_str().is_empty() {
            continue;
        }

        #[cfg(unix)]
        {
            if let Some(mode) = entry.unix_mode() {
                // S_IFLNK = 0o120000
                if (mode & 0o170000) == 0o120000 {
                    continue;
                }
            }
        }

        let target = dest.join(&relative);
        if entry.is_dir() || normalized.ends_with('/') {
            fs::create_dir_all(&target).map_err(extraction)?;
            continue;
        }

        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent).map_err(extraction)?;
        }
        let mut out = fs::File::create(&target).map_err(extraction)?;
        io::copy(&mut entry, &mut out).map_err(extraction)?;
        files_extracted += 1;
    }

    Ok(files_extracted)
}

/// Normal コンポーネントのみからなる相対パスに変換（それ以外は None）
fn safe_relative_path(name: &str) -> Option<PathBuf> {
    let path = Path::new(name);
    let mut result = PathBuf::new();
    for component in path.components() {
        match component {
            PathComponent::Normal(part) => result.push(part),
            PathComponent::CurDir => {}
            _ => return None,
        }
    }
    Some(result)
}

fn extraction(e: impl std::fmt::Display) -> AomError {
    AomError::Extraction(e.to_string())
}
