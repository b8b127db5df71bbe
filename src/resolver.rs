//! プラットフォーム別のバージョン解決
//!
//! `Source` の種別ごとに解決戦略を切り替える。
//!
//! - カタログ: HTTP API から最新版のダウンロードURLとバージョンを取得
//! - gitスクレイプ: gitブラウザのHTMLから最新コミットを取得
//! - gitクローン: リポジトリをクローンしてHEADのコミットを取得

mod catalog;
mod git_clone;
mod git_scrape;

use crate::config::Settings;
use crate::error::{AomError, Result};
use crate::git::GitClient;
use crate::http::HttpFetcher;
use crate::payload::PayloadTree;
use crate::source::Source;
use std::sync::Arc;
use tracing::debug;

/// ペイロードの取得元
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Locator {
    /// zipアーカイブのダウンロードURL
    Archive(String),
    /// クローン対象のリポジトリURL
    Repository(String),
}

impl Locator {
    pub fn as_str(&self) -> &str {
        match self {
            Locator::Archive(url) | Locator::Repository(url) => url,
        }
    }
}

/// 解決結果
#[derive(Debug)]
pub struct Resolution {
    pub locator: Locator,
    pub version: String,
    /// 解決の過程で取得済みのペイロード（gitクローン時のみ）
    pub payload: Option<PayloadTree>,
}

/// バージョン解決器
pub struct Resolver {
    http: Arc<dyn HttpFetcher>,
    git: Option<Arc<dyn GitClient>>,
    catalog_url: Option<String>,
    fallback_branch: String,
    retries: u32,
}

impl Resolver {
    pub fn new(
        http: Arc<dyn HttpFetcher>,
        git: Option<Arc<dyn GitClient>>,
        settings: &Settings,
    ) -> Self {
        Self {
            http,
            git,
            catalog_url: settings.catalog_url.clone(),
            fallback_branch: settings.fallback_branch.clone(),
            retries: settings.retries,
        }
    }

    /// ソースを解決する
    ///
    /// `version_hint` はカタログのみ使用し、git系では無視する。
    pub async fn resolve(&self, source: &Source, version_hint: Option<&str>) -> Result<Resolution> {
        debug!(identifier = source.identifier(), platform = %source.platform(), "resolving");

        let resolution = match source {
            Source::Catalog { slug } => {
                let base = self.catalog_url.as_deref().ok_or_else(|| {
                    AomError::UnsupportedPlatform(
                        "catalog is not configured (set catalog_url or AOM_CATALOG_URL)"
                            .to_string(),
                    )
                })?;
                catalog::resolve(self.http.as_ref(), base, slug, version_hint, self.retries).await
            }
            Source::GitScrape { url } => {
                let branch = git_scrape::discover_branch(
                    self.git.as_deref(),
                    url,
                    &self.fallback_branch,
                )
                .await;
                git_scrape::resolve(self.http.as_ref(), url, &branch, self.retries).await
            }
            Source::GitClone { url } => {
                let git = self.git.as_deref().ok_or_else(|| {
                    AomError::UnsupportedPlatform(
                        "git executable not found; git based addons are unavailable".to_string(),
                    )
                })?;
                git_clone::resolve(git, url).await
            }
        };

        let resolution = resolution.map_err(|e| e.into_resolution(source.identifier()))?;
        debug!(
            identifier = source.identifier(),
            version = %resolution.version,
            locator = resolution.locator.as_str(),
            "resolved"
        );
        Ok(resolution)
    }
}

#[cfg(test)]
#[path = "resolver_test.rs"]
mod tests;
