//! ペイロード取得
//!
//! 解決結果からローカルのファイルツリー（一時ディレクトリ）を用意する。
//! 一時ディレクトリ・一時ファイルは Drop 時に削除されるため、
//! 成功・失敗どちらの経路でも後始末が保証される。

use crate::archive;
use crate::error::{AomError, Result};
use crate::git::{GitClient, RepoHandle};
use crate::http::{self, HttpFetcher};
use crate::resolver::{Locator, Resolution};
use std::io::Write;
use std::path::Path;
use std::sync::Arc;
use tempfile::{NamedTempFile, TempDir};
use tracing::debug;

const SCRATCH_PREFIX: &str = "aom-";

/// 取得済みペイロード（Drop 時に削除される一時ディレクトリ）
#[derive(Debug)]
pub struct PayloadTree {
    dir: TempDir,
}

impl PayloadTree {
    /// 新しい空の一時ディレクトリを作成
    pub fn scratch(kind: &str) -> Result<Self> {
        let dir = tempfile::Builder::new()
            .prefix(&format!("{}{}-", SCRATCH_PREFIX, kind))
            .tempdir()?;
        Ok(Self { dir })
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }
}

/// リポジトリを新しい一時ディレクトリにクローン
pub async fn clone_into_scratch(
    git: &dyn GitClient,
    url: &str,
) -> Result<(PayloadTree, RepoHandle)> {
    let tree = PayloadTree::scratch("git")?;
    debug!(url, dir = %tree.path().display(), "cloning");
    let repo = git.clone_repo(url, tree.path()).await?;
    Ok((tree, repo))
}

/// ペイロード取得器
pub struct Acquirer {
    http: Arc<dyn HttpFetcher>,
    git: Option<Arc<dyn GitClient>>,
    retries: u32,
}

impl Acquirer {
    pub fn new(http: Arc<dyn HttpFetcher>, git: Option<Arc<dyn GitClient>>, retries: u32) -> Self {
        Self { http, git, retries }
    }

    /// 解決結果からペイロードを取得
    ///
    /// - 解決時にクローン済みならそれを再利用
    /// - リポジトリならクローン
    /// - アーカイブならダウンロードして展開
    pub async fn acquire(&self, resolution: Resolution) -> Result<PayloadTree> {
        if let Some(payload) = resolution.payload {
            debug!(locator = resolution.locator.as_str(), "reusing cloned payload");
            return Ok(payload);
        }

        match &resolution.locator {
            Locator::Repository(url) => {
                let git = self.git.as_deref().ok_or_else(|| {
                    AomError::UnsupportedPlatform(
                        "git executable not found; git based addons are unavailable".to_string(),
                    )
                })?;
                let (tree, _repo) = clone_into_scratch(git, url).await?;
                Ok(tree)
            }
            Locator::Archive(url) => self.download_and_extract(url).await,
        }
    }

    async fn download_and_extract(&self, url: &str) -> Result<PayloadTree> {
        let bytes = http::with_retry(|| http::download_ok(self.http.as_ref(), url), self.retries)
            .await
            .map_err(|e| e.into_download(url))?;
        debug!(url, size = bytes.len(), "downloaded archive");

        let mut archive_file = tempfile::Builder::new()
            .prefix(&format!("{}archive-", SCRATCH_PREFIX))
            .suffix(".zip")
            .tempfile()
            .map_err(|e| AomError::from(e).into_download(url))?;
        archive_file
            .write_all(&bytes)
            .and_then(|_| archive_file.flush())
            .map_err(|e| AomError::from(e).into_download(url))?;

        let tree = PayloadTree::scratch("archive")?;
        extract_in_background(archive_file, tree).await
    }
}

/// zip展開はブロッキング処理のため専用スレッドで実行
async fn extract_in_background(archive_file: NamedTempFile, tree: PayloadTree) -> Result<PayloadTree> {
    tokio::task::spawn_blocking(move || -> Result<PayloadTree> {
        let count = archive::extract_zip(archive_file.path(), tree.path())?;
        debug!(files = count, "extracted archive");
        Ok(tree)
    })
    .await
    .map_err(|e| AomError::Extraction(e.to_string()))?
}

#[cfg(test)]
#[path = "payload_test.rs"]
mod tests;
