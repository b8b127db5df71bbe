//! アドオン識別子の分類
//!
//! 識別子の形式から解決戦略を決定する。
//!
//! ## 対応フォーマット
//!
//! - `Ace3` - カタログのスラッグ
//! - `https://git.tukui.org/elvui/elvui.git` - スクレイピング対象ホストのgit URL
//! - `https://example.com/owner/addon.git` - 汎用git URL（クローンで解決）
//! - `ssh://git@host/owner/addon` - SSH URL
//! - `git@host:owner/addon.git` - SCP形式

use crate::error::{AomError, Result};
use crate::platform::Platform;

/// 解決戦略ごとに分類されたアドオンソース
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Source {
    /// カタログAPIで解決
    Catalog { slug: String },
    /// gitブラウザのHTMLから最新コミットを取得
    GitScrape { url: String },
    /// リポジトリをクローンしてHEADを取得
    GitClone { url: String },
}

/// ソースロケータの種別
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LocatorKind {
    /// scheme:// 形式
    Url,
    /// SCP形式 (git@host:path)
    Scp,
    /// スラッグ
    Plain,
}

fn locator_kind(input: &str) -> LocatorKind {
    if input.contains("://") {
        LocatorKind::Url
    } else if input.starts_with("git@") && input.contains(':') {
        LocatorKind::Scp
    } else {
        LocatorKind::Plain
    }
}

impl Source {
    /// プラットフォームと識別子から解決戦略を決定
    pub fn classify(platform: Platform, identifier: &str, scrape_hosts: &[String]) -> Result<Self> {
        let identifier = identifier.trim();
        let invalid = |reason: &str| AomError::Resolution {
            identifier: identifier.to_string(),
            reason: reason.to_string(),
        };

        match platform {
            Platform::Catalog => {
                if identifier.is_empty() || identifier.contains(['/', '\\']) {
                    return Err(invalid("catalog identifiers must be plain addon names"));
                }
                Ok(Source::Catalog {
                    slug: identifier.to_string(),
                })
            }
            Platform::Git => {
                if git_name(identifier).is_none() {
                    return Err(invalid("not a git repository locator"));
                }
                let url = identifier.to_string();
                let scrape = host_of(identifier)
                    .map(|host| scrape_hosts.iter().any(|h| host_matches(&host, h)))
                    .unwrap_or(false);
                if scrape {
                    Ok(Source::GitScrape { url })
                } else {
                    Ok(Source::GitClone { url })
                }
            }
        }
    }

    /// 元の識別子
    pub fn identifier(&self) -> &str {
        match self {
            Source::Catalog { slug } => slug,
            Source::GitScrape { url } | Source::GitClone { url } => url,
        }
    }

    pub fn platform(&self) -> Platform {
        match self {
            Source::Catalog { .. } => Platform::Catalog,
            Source::GitScrape { .. } | Source::GitClone { .. } => Platform::Git,
        }
    }

    /// 単一アドオンとして配置する際のフォルダ名
    pub fn fallback_name(&self) -> String {
        match self {
            Source::Catalog { slug } => slug.clone(),
            Source::GitScrape { url } | Source::GitClone { url } => {
                git_name(url).unwrap_or_else(|| url.clone())
            }
        }
    }
}

/// 識別子の形式からプラットフォームを推定
///
/// URL、SCP形式、`.git` で終わるものは git、それ以外はカタログ。
pub fn infer_platform(identifier: &str) -> Platform {
    let identifier = identifier.trim();
    match locator_kind(identifier) {
        LocatorKind::Url | LocatorKind::Scp => Platform::Git,
        LocatorKind::Plain if identifier.ends_with(".git") => Platform::Git,
        LocatorKind::Plain => Platform::Catalog,
    }
}

/// git URLからリポジトリ名を取得（`.git` サフィックスは除去）
pub fn git_name(url: &str) -> Option<String> {
    let path = match locator_kind(url) {
        LocatorKind::Url => url.split_once("://").map(|(_, rest)| rest)?.split_once('/')?.1,
        LocatorKind::Scp => url.split_once(':')?.1,
        LocatorKind::Plain => url,
    };

    let last = path
        .split(['?', '#'])
        .next()?
        .trim_end_matches('/')
        .rsplit('/')
        .next()?;
    let name = last.strip_suffix(".git").unwrap_or(last).trim();

    if name.is_empty() || name == "." || name == ".." {
        None
    } else {
        Some(name.to_string())
    }
}

/// git URLからホスト名を取得（ユーザー名とポートは除去）
pub fn host_of(url: &str) -> Option<String> {
    let authority = match locator_kind(url) {
        LocatorKind::Url => {
            let rest = url.split_once("://")?.1;
            rest.split('/').next()?
        }
        LocatorKind::Scp => url.split_once(':')?.0,
        LocatorKind::Plain => return None,
    };

    let host = authority.rsplit_once('@').map(|(_, h)| h).unwrap_or(authority);
    let host = host.split(':').next()?.to_ascii_lowercase();
    if host.is_empty() {
        None
    } else {
        Some(host)
    }
}

/// ホストがパターンに一致するか（完全一致またはサブドメイン）
fn host_matches(host: &str, pattern: &str) -> bool {
    let pattern = pattern.trim().to_ascii_lowercase();
    !pattern.is_empty() && (host == pattern || host.ends_with(&format!(".{}", pattern)))
}

#[cfg(test)]
#[path = "source_test.rs"]
mod tests;

#[cfg(test)]
#[path = "source_proptests.rs"]
mod proptests;
