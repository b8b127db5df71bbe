//! gitクライアント
//!
//! `git` 実行ファイルの有無は起動時に検出し、存在しない環境では
//! `Option::None` として扱う（git系の解決は UnsupportedPlatform で失敗する）。

use crate::error::{AomError, Result};
use std::future::Future;
use std::path::{Path, PathBuf};
use std::pin::Pin;
use std::process::Stdio;
use tokio::process::Command;
use tracing::debug;

/// コミット
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Commit {
    pub sha: String,
}

/// クローン済みリポジトリ
#[derive(Debug, Clone)]
pub struct RepoHandle {
    pub dir: PathBuf,
}

/// gitクライアント trait
pub trait GitClient: Send + Sync {
    /// リポジトリを `dest` にクローン（`dest` は空ディレクトリ）
    fn clone_repo<'a>(
        &'a self,
        url: &'a str,
        dest: &'a Path,
    ) -> Pin<Box<dyn Future<Output = Result<RepoHandle>> + Send + 'a>>;

    /// チェックアウト中（デフォルトブランチ）の最新コミットを取得
    fn latest_commit<'a>(
        &'a self,
        repo: &'a RepoHandle,
    ) -> Pin<Box<dyn Future<Output = Result<Commit>> + Send + 'a>>;

    /// リモートのデフォルトブランチ名を取得
    fn default_branch<'a>(
        &'a self,
        url: &'a str,
    ) -> Pin<Box<dyn Future<Output = Result<String>> + Send + 'a>>;
}

/// `git` コマンドによる GitClient 実装
#[derive(Debug, Clone)]
pub struct CommandGit {
    program: PathBuf,
}

impl CommandGit {
    /// `git --version` が成功する場合のみクライアントを返す
    pub fn detect() -> Option<Self> {
        Self::detect_program("git")
    }

    fn detect_program(program: &str) -> Option<Self> {
        std::process::Command::new(program)
            .arg("--version")
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .ok()
            .filter(|s| s.success())
            .map(|_| Self {
                program: PathBuf::from(program),
            })
    }

    async fn run(&self, args: &[&str], cwd: Option<&Path>) -> std::result::Result<String, String> {
        let mut cmd = Command::new(&self.program);
        cmd.args(args)
            .env("GIT_TERMINAL_PROMPT", "0")
            .stdin(Stdio::null())
            .kill_on_drop(true);
        if let Some(dir) = cwd {
            cmd.current_dir(dir);
        }

        debug!(?args, "git");
        let output = cmd.output().await.map_err(|e| e.to_string())?;
        if output.status.success() {
            Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
        } else {
            Err(String::from_utf8_lossy(&output.stderr).trim().to_string())
        }
    }
}

impl GitClient for CommandGit {
    fn clone_repo<'a>(
        &'a self,
        url: &'a str,
        dest: &'a Path,
    ) -> Pin<Box<dyn Future<Output = Result<RepoHandle>> + Send + 'a>> {
        Box::pin(async move {
            let dest_str = dest.to_string_lossy();
            self.run(
                &["clone", "--depth", "1", "--quiet", "--", url, &dest_str],
                None,
            )
            .await
            .map_err(|reason| AomError::Clone {
                url: url.to_string(),
                reason,
            })?;

            Ok(RepoHandle {
                dir: dest.to_path_buf(),
            })
        })
    }

    fn latest_commit<'a>(
        &'a self,
        repo: &'a RepoHandle,
    ) -> Pin<Box<dyn Future<Output = Result<Commit>> + Send + 'a>> {
        Box::pin(async move {
            let sha = self
                .run(&["rev-parse", "HEAD"], Some(&repo.dir))
                .await
                .map_err(|reason| AomError::Clone {
                    url: repo.dir.display().to_string(),
                    reason,
                })?;
            Ok(Commit { sha })
        })
    }

    fn default_branch<'a>(
        &'a self,
        url: &'a str,
    ) -> Pin<Box<dyn Future<Output = Result<String>> + Send + 'a>> {
        Box::pin(async move {
            let output = self
                .run(&["ls-remote", "--symref", "--", url, "HEAD"], None)
                .await
                .map_err(|reason| AomError::Resolution {
                    identifier: url.to_string(),
                    reason,
                })?;

            parse_symref(&output).ok_or_else(|| AomError::Resolution {
                identifier: url.to_string(),
                reason: "remote did not advertise a HEAD symref".to_string(),
            })
        })
    }
}

/// `git ls-remote --symref <url> HEAD` の出力からブランチ名を取得
///
/// 例: `ref: refs/heads/main\tHEAD`
fn parse_symref(output: &str) -> Option<String> {
    output.lines().find_map(|line| {
        let rest = line.strip_prefix("ref:")?;
        let (reference, target) = rest.trim().split_once('\t')?;
        if target.trim() != "HEAD" {
            return None;
        }
        reference
            .trim()
            .strip_prefix("refs/heads/")
            .filter(|b| !b.is_empty())
            .map(String::from)
    })
}
