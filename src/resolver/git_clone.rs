//! クローンによる解決
//!
//! クローン結果はそのままペイロードとして再利用する。

use super::{Locator, Resolution};
use crate::error::Result;
use crate::git::GitClient;
use crate::payload;

pub(super) async fn resolve(git: &dyn GitClient, url: &str) -> Result<Resolution> {
    let (tree, repo) = payload::clone_into_scratch(git, url).await?;
    let commit = git.latest_commit(&repo).await?;

    Ok(Resolution {
        locator: Locator::Repository(url.to_string()),
        version: commit.sha,
        payload: Some(tree),
    })
}
