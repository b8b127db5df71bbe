//! gitブラウザのHTMLからの解決
//!
//! `{repo}/tree/{branch}` ページの `last-commit` 要素内の最初のリンクから
//! 最新コミットのIDを取り出す。クローン不要で軽量に確認できる。

use super::{Locator, Resolution};
use crate::error::{AomError, Result};
use crate::git::GitClient;
use crate::http::{self, HttpFetcher};
use regex::Regex;
use tracing::{debug, warn};

const LAST_COMMIT_CLASS: &str = "last-commit";

/// リモートのデフォルトブランチを検出（失敗時は設定値にフォールバック）
pub(super) async fn discover_branch(
    git: Option<&dyn GitClient>,
    url: &str,
    fallback: &str,
) -> String {
    let Some(git) = git else {
        warn!(url, branch = fallback, "git is unavailable, using fallback branch");
        return fallback.to_string();
    };

    match git.default_branch(url).await {
        Ok(branch) => {
            debug!(url, %branch, "discovered default branch");
            branch
        }
        Err(e) => {
            warn!(url, branch = fallback, error = %e, "could not discover default branch, using fallback");
            fallback.to_string()
        }
    }
}

pub(super) async fn resolve(
    fetcher: &dyn HttpFetcher,
    url: &str,
    branch: &str,
    retries: u32,
) -> Result<Resolution> {
    let page = tree_page_url(url, branch);
    let body = http::with_retry(|| http::fetch_ok(fetcher, &page), retries).await?;
    let html = String::from_utf8_lossy(&body);

    let version = scrape_last_commit(&html).map_err(|reason| AomError::Resolution {
        identifier: url.to_string(),
        reason: format!("{} ({})", reason, page),
    })?;

    Ok(Resolution {
        locator: Locator::Repository(url.to_string()),
        version,
        payload: None,
    })
}

/// `https://host/owner/repo.git` → `https://host/owner/repo/tree/{branch}`
fn tree_page_url(url: &str, branch: &str) -> String {
    let base = url.trim_end_matches('/');
    let base = base.strip_suffix(".git").unwrap_or(base);
    format!("{}/tree/{}", base, branch)
}

/// HTMLから最新コミットIDを取り出す
fn scrape_last_commit(html: &str) -> std::result::Result<String, String> {
    let body = last_commit_element(html)?
        .ok_or_else(|| format!("no '{}' element found", LAST_COMMIT_CLASS))?;

    let href = first_link(body)?.ok_or_else(|| format!("no link inside '{}'", LAST_COMMIT_CLASS))?;

    trailing_segment(&href).ok_or_else(|| format!("commit link '{}' has no trailing segment", href))
}

fn compile(pattern: &str) -> std::result::Result<Regex, String> {
    Regex::new(pattern).map_err(|e| e.to_string())
}

/// class属性に `last-commit` を含む最初の要素の中身
fn last_commit_element(html: &str) -> std::result::Result<Option<&str>, String> {
    let open_tag = compile(r#"(?is)<([a-z][a-z0-9-]*)\b[^>]*?\bclass\s*=\s*(?:"([^"]*)"|'([^']*)')[^>]*>"#)?;

    for caps in open_tag.captures_iter(html) {
        let classes = caps.get(2).or_else(|| caps.get(3)).map_or("", |m| m.as_str());
        if !classes.split_whitespace().any(|c| c == LAST_COMMIT_CLASS) {
            continue;
        }
        let (Some(whole), Some(tag)) = (caps.get(0), caps.get(1)) else {
            continue;
        };
        if whole.as_str().ends_with("/>") {
            return Ok(Some(""));
        }
        return element_body(html, tag.as_str(), whole.end()).map(Some);
    }
    Ok(None)
}

/// `start` から対応する閉じタグまでの範囲（ネストした同名タグを考慮）
fn element_body<'h>(html: &'h str, tag: &str, start: usize) -> std::result::Result<&'h str, String> {
    let tags = compile(&format!(r"(?i)<(/?){}\b[^>]*>", regex::escape(tag)))?;
    let rest = &html[start..];

    let mut depth = 1usize;
    for caps in tags.captures_iter(rest) {
        let Some(whole) = caps.get(0) else { continue };
        let closing = caps.get(1).is_some_and(|m| !m.as_str().is_empty());
        if closing {
            depth -= 1;
            if depth == 0 {
                return Ok(&rest[..whole.start()]);
            }
        } else if !whole.as_str().ends_with("/>") {
            depth += 1;
        }
    }
    // 閉じタグがない壊れたHTMLは末尾までを対象とする
    Ok(rest)
}

fn first_link(fragment: &str) -> std::result::Result<Option<String>, String> {
    let anchor = compile(r#"(?is)<a\b[^>]*?\bhref\s*=\s*(?:"([^"]*)"|'([^']*)')"#)?;
    Ok(anchor
        .captures(fragment)
        .and_then(|caps| caps.get(1).or_else(|| caps.get(2)))
        .map(|m| m.as_str().to_string()))
}

/// リンクの末尾のパス要素（クエリ・フラグメントは除去）
fn trailing_segment(href: &str) -> Option<String> {
    let path = href.split(['?', '#']).next()?;
    let segment = path.trim_end_matches('/').rsplit('/').next()?.trim();
    if segment.is_empty() {
        None
    } else {
        Some(segment.to_string())
    }
}
