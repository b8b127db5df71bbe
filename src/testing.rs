//! テスト用の共通ヘルパーとフェイク実装

use crate::error::{AomError, Result};
use crate::git::{Commit, GitClient, RepoHandle};
use crate::http::{HttpFetcher, HttpResponse};
use std::collections::HashMap;
use std::future::Future;
use std::io::Write;
use std::path::Path;
use std::pin::Pin;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;
use zip::write::SimpleFileOptions;

/// テスト用zipアーカイブを作成
pub fn write_test_archive(path: &Path, entries: &[(&str, &str)]) {
    let file = std::fs::File::create(path).unwrap();
    let mut zip = zip::ZipWriter::new(file);
    let options = SimpleFileOptions::default();
    for (name, content) in entries {
        zip.start_file(*name, options).unwrap();
        zip.write_all(content.as_bytes()).unwrap();
    }
    zip.finish().unwrap();
}

/// テスト用zipアーカイブをバイト列で作成
pub fn test_archive_bytes(entries: &[(&str, &str)]) -> Vec<u8> {
    let dir = tempfile::TempDir::new().unwrap();
    let path = dir.path().join("payload.zip");
    write_test_archive(&path, entries);
    std::fs::read(path).unwrap()
}

/// URLごとに固定レスポンスを返す HttpFetcher
///
/// 登録されていないURLは 404 を返す。
#[derive(Default)]
pub struct FakeHttp {
    responses: Mutex<HashMap<String, Vec<(u16, Vec<u8>)>>>,
    calls: Mutex<Vec<String>>,
    delay: Option<Duration>,
}

impl FakeHttp {
    pub fn new() -> Self {
        Self::default()
    }

    /// レスポンスを登録（同じURLに複数登録した場合は順に返し、最後の1件を繰り返す）
    pub fn respond(self, url: &str, status: u16, body: impl Into<Vec<u8>>) -> Self {
        self.responses
            .lock()
            .unwrap()
            .entry(url.to_string())
            .or_default()
            .push((status, body.into()));
        self
    }

    /// 各レスポンスを返す前に待機する（並行実行の割り込みを起こすため）
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// 指定URLへのリクエスト回数
    pub fn calls_to(&self, url: &str) -> usize {
        self.calls.lock().unwrap().iter().filter(|u| *u == url).count()
    }

    pub fn total_calls(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

impl HttpFetcher for FakeHttp {
    fn get<'a>(
        &'a self,
        url: &'a str,
    ) -> Pin<Box<dyn Future<Output = Result<HttpResponse>> + Send + 'a>> {
        Box::pin(async move {
            self.calls.lock().unwrap().push(url.to_string());
            if let Some(delay) = self.delay {
                tokio::time::sleep(delay).await;
            }
            let mut responses = self.responses.lock().unwrap();
            let (status, body) = match responses.get_mut(url) {
                Some(queue) if queue.len() > 1 => queue.remove(0),
                Some(queue) if !queue.is_empty() => queue[0].clone(),
                _ => (404, b"not found".to_vec()),
            };
            Ok(HttpResponse { status, body })
        })
    }
}

/// クローン時に固定のファイルを書き出す GitClient
pub struct FakeGit {
    files: Vec<(String, String)>,
    sha: String,
    branch: Option<String>,
    fail_clone: bool,
    clones: AtomicUsize,
}

impl FakeGit {
    pub fn new(sha: &str) -> Self {
        Self {
            files: Vec::new(),
            sha: sha.to_string(),
            branch: Some("master".to_string()),
            fail_clone: false,
            clones: AtomicUsize::new(0),
        }
    }

    /// クローン結果に含めるファイルを追加
    pub fn with_file(mut self, path: &str, content: &str) -> Self {
        self.files.push((path.to_string(), content.to_string()));
        self
    }

    /// デフォルトブランチ（None なら検出失敗）
    pub fn with_branch(mut self, branch: Option<&str>) -> Self {
        self.branch = branch.map(String::from);
        self
    }

    pub fn failing(mut self) -> Self {
        self.fail_clone = true;
        self
    }

    pub fn clone_count(&self) -> usize {
        self.clones.load(Ordering::SeqCst)
    }
}

impl GitClient for FakeGit {
    fn clone_repo<'a>(
        &'a self,
        url: &'a str,
        dest: &'a Path,
    ) -> Pin<Box<dyn Future<Output = Result<RepoHandle>> + Send + 'a>> {
        Box::pin(async move {
            self.clones.fetch_add(1, Ordering::SeqCst);
            if self.fail_clone {
                return Err(AomError::Clone {
                    url: url.to_string(),
                    reason: "repository not found".to_string(),
                });
            }
            for (path, content) in &self.files {
                let target = dest.join(path);
                if let Some(parent) = target.parent() {
                    std::fs::create_dir_all(parent)?;
                }
                std::fs::write(target, content)?;
            }
            Ok(RepoHandle {
                dir: dest.to_path_buf(),
            })
        })
    }

    fn latest_commit<'a>(
        &'a self,
        _repo: &'a RepoHandle,
    ) -> Pin<Box<dyn Future<Output = Result<Commit>> + Send + 'a>> {
        Box::pin(async move {
            Ok(Commit {
                sha: self.sha.clone(),
            })
        })
    }

    fn default_branch<'a>(
        &'a self,
        url: &'a str,
    ) -> Pin<Box<dyn Future<Output = Result<String>> + Send + 'a>> {
        Box::pin(async move {
            self.branch.clone().ok_or_else(|| AomError::Resolution {
                identifier: url.to_string(),
                reason: "remote did not advertise a HEAD symref".to_string(),
            })
        })
    }
}
