//! テスト用モックファイルシステム

use super::*;
use std::collections::{HashMap, HashSet};
use std::sync::RwLock;

/// テスト用モックファイルシステム
///
/// パス文字列をキーとしたフラットなマップで木構造を表現する。
/// ファイル追加時は親ディレクトリも自動で登録される。
pub struct MockFs {
    files: RwLock<HashMap<String, MockFile>>,
    /// 削除時に失敗させるパス
    failing_removals: RwLock<HashSet<String>>,
}

#[derive(Clone)]
struct MockFile {
    content: Vec<u8>,
    file_type: FsFileType,
}

fn key(path: &Path) -> String {
    let s = path.to_string_lossy().to_string();
    if s.len() > 1 {
        s.trim_end_matches('/').to_string()
    } else {
        s
    }
}

fn is_within(candidate: &str, root: &str) -> bool {
    candidate == root
        || candidate
            .strip_prefix(root)
            .is_some_and(|rest| rest.starts_with('/') || root.ends_with('/'))
}

impl MockFs {
    pub fn new() -> Self {
        Self {
            files: RwLock::new(HashMap::new()),
            failing_removals: RwLock::new(HashSet::new()),
        }
    }

    /// ファイルを追加
    pub fn add_file(&self, path: &str, content: &str) {
        self.insert_parents(Path::new(path));
        self.files.write().unwrap().insert(
            key(Path::new(path)),
            MockFile {
                content: content.as_bytes().to_vec(),
                file_type: FsFileType::File,
            },
        );
    }

    /// ディレクトリを追加
    pub fn add_dir(&self, path: &str) {
        self.insert_parents(Path::new(path));
        self.files.write().unwrap().insert(
            key(Path::new(path)),
            MockFile {
                content: Vec::new(),
                file_type: FsFileType::Dir,
            },
        );
    }

    /// 指定パスの削除を失敗させる
    pub fn fail_removal_of(&self, path: &str) {
        self.failing_removals
            .write()
            .unwrap()
            .insert(key(Path::new(path)));
    }

    /// ファイル内容を取得
    pub fn read(&self, path: &str) -> Option<String> {
        self.files
            .read()
            .unwrap()
            .get(&key(Path::new(path)))
            .map(|f| String::from_utf8_lossy(&f.content).to_string())
    }

    /// 登録済みパス数
    pub fn len(&self) -> usize {
        self.files.read().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn insert_parents(&self, path: &Path) {
        let mut files = self.files.write().unwrap();
        for ancestor in path.ancestors().skip(1) {
            let k = key(ancestor);
            if k.is_empty() {
                continue;
            }
            files.entry(k).or_insert(MockFile {
                content: Vec::new(),
                file_type: FsFileType::Dir,
            });
        }
    }

    fn not_found() -> AomError {
        std::io::Error::new(std::io::ErrorKind::NotFound, "not found").into()
    }
}

impl Default for MockFs {
    fn default() -> Self {
        Self::new()
    }
}

impl FileSystem for MockFs {
    fn copy_file(&self, src: &Path, dst: &Path) -> Result<()> {
        let content = {
            let files = self.files.read().unwrap();
            files.get(&key(src)).ok_or_else(Self::not_found)?.content.clone()
        };

        self.insert_parents(dst);
        self.files.write().unwrap().insert(
            key(dst),
            MockFile {
                content,
                file_type: FsFileType::File,
            },
        );
        Ok(())
    }

    fn copy_dir(&self, src: &Path, dst: &Path) -> Result<()> {
        let src_str = key(src);
        let dst_str = key(dst);

        // 同一/子孫パスチェック
        if is_within(&dst_str, &src_str) {
            return Err(AomError::Io(std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                "Cannot copy directory into itself or its subdirectory",
            )));
        }

        let entries_to_copy: Vec<_> = {
            let files = self.files.read().unwrap();
            if !files.contains_key(&src_str) {
                return Err(Self::not_found());
            }
            files
                .iter()
                .filter(|(path, _)| is_within(path, &src_str))
                .map(|(path, file)| {
                    let relative = &path[src_str.len()..];
                    (format!("{}{}", dst_str, relative), file.clone())
                })
                .collect()
        };

        self.insert_parents(dst);
        let mut files = self.files.write().unwrap();
        for (new_path, file) in entries_to_copy {
            files.insert(new_path, file);
        }
        Ok(())
    }

    fn remove(&self, path: &Path) -> Result<()> {
        let path_str = key(path);
        if self.failing_removals.read().unwrap().contains(&path_str) {
            return Err(std::io::Error::new(
                std::io::ErrorKind::PermissionDenied,
                "permission denied",
            )
            .into());
        }

        // パス配下のすべてのエントリを削除（再帰削除）
        self.files
            .write()
            .unwrap()
            .retain(|k, _| !is_within(k, &path_str));
        Ok(())
    }

    fn rename(&self, src: &Path, dst: &Path) -> Result<()> {
        let src_str = key(src);
        let dst_str = key(dst);

        let mut files = self.files.write().unwrap();
        if !files.contains_key(&src_str) {
            return Err(Self::not_found());
        }
        let moved: Vec<_> = files
            .keys()
            .filter(|k| is_within(k, &src_str))
            .cloned()
            .collect();
        for old in moved {
            if let Some(file) = files.remove(&old) {
                let new_key = format!("{}{}", dst_str, &old[src_str.len()..]);
                files.insert(new_key, file);
            }
        }
        Ok(())
    }

    fn exists(&self, path: &Path) -> bool {
        self.files.read().unwrap().contains_key(&key(path))
    }

    fn is_dir(&self, path: &Path) -> bool {
        self.files
            .read()
            .unwrap()
            .get(&key(path))
            .map(|f| f.file_type == FsFileType::Dir)
            .unwrap_or(false)
    }

    fn create_dir_all(&self, path: &Path) -> Result<()> {
        self.add_dir(&path.to_string_lossy());
        Ok(())
    }

    fn read_dir(&self, path: &Path) -> Result<Vec<FsDirEntry>> {
        let path_str = key(path);
        let files = self.files.read().unwrap();

        match files.get(&path_str) {
            Some(file) if file.file_type != FsFileType::Dir => {
                return Err(AomError::Io(std::io::Error::new(
                    std::io::ErrorKind::NotADirectory,
                    "Not a directory",
                )));
            }
            None => return Err(Self::not_found()),
            _ => {}
        }

        let prefix = if path_str.ends_with('/') {
            path_str.clone()
        } else {
            format!("{}/", path_str)
        };

        let entries = files
            .iter()
            .filter(|(k, _)| {
                k.strip_prefix(&prefix)
                    .is_some_and(|rest| !rest.is_empty() && !rest.contains('/'))
            })
            .map(|(k, v)| FsDirEntry {
                path: PathBuf::from(k),
                file_type: v.file_type,
            })
            .collect();

        Ok(entries)
    }
}
