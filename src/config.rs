//! 設定ファイルとHTTP設定
//!
//! 優先順位: CLI引数 > 環境変数 > 設定ファイル > デフォルト値

use crate::env::{self, EnvVar};
use crate::error::{AomError, Result};
use reqwest::Client;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// ストアファイル名（アドオンディレクトリ直下）
pub const DEFAULT_STORE_FILE: &str = ".aom-addons.json";

/// HTTP設定
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    /// タイムアウト（秒）
    pub timeout_secs: Option<u64>,
    /// User-Agent
    pub user_agent: String,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout_secs: Some(30),
            user_agent: "aom-cli".to_string(),
        }
    }
}

impl HttpConfig {
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_secs.map(Duration::from_secs)
    }

    /// reqwest::Client を構築
    pub fn build_client(&self) -> Result<Client> {
        let mut builder = Client::builder().user_agent(&self.user_agent);

        if let Some(timeout) = self.timeout() {
            builder = builder.timeout(timeout);
        }

        Ok(builder.build()?)
    }
}

/// 設定ファイル（config.toml）の内容
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
struct SettingsFile {
    addons_dir: Option<PathBuf>,
    store_path: Option<PathBuf>,
    catalog_url: Option<String>,
    manifest_extension: Option<String>,
    scrape_hosts: Option<Vec<String>>,
    fallback_branch: Option<String>,
    concurrency: Option<usize>,
    retries: Option<u32>,
    http: HttpConfig,
}

/// 解決済みの実行時設定
#[derive(Debug, Clone)]
pub struct Settings {
    /// インストール先のアドオンディレクトリ
    pub addons_dir: PathBuf,
    /// ストアファイルのパス
    pub store_path: PathBuf,
    /// カタログAPIのベースURL（未設定ならカタログは使用不可）
    pub catalog_url: Option<String>,
    /// マニフェストファイルの拡張子（ドットなし）
    pub manifest_extension: String,
    /// HTMLスクレイピングでバージョンを取得するgitホスト
    pub scrape_hosts: Vec<String>,
    /// デフォルトブランチを検出できない場合に使うブランチ名
    pub fallback_branch: String,
    /// 一括チェック時の同時リクエスト数
    pub concurrency: usize,
    /// 一時的な失敗のリトライ回数
    pub retries: u32,
    pub http: HttpConfig,
}

impl Settings {
    /// デフォルト値で設定を作成
    pub fn new(addons_dir: impl Into<PathBuf>) -> Self {
        let addons_dir = addons_dir.into();
        Self {
            store_path: addons_dir.join(DEFAULT_STORE_FILE),
            addons_dir,
            catalog_url: None,
            manifest_extension: "toc".to_string(),
            scrape_hosts: vec!["git.tukui.org".to_string()],
            fallback_branch: "master".to_string(),
            concurrency: 4,
            retries: 3,
            http: HttpConfig::default(),
        }
    }

    /// カタログURLを設定
    pub fn with_catalog_url(mut self, url: impl Into<String>) -> Self {
        self.catalog_url = Some(url.into());
        self
    }

    /// ストアパスを設定
    pub fn with_store_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.store_path = path.into();
        self
    }

    /// 設定を読み込む
    ///
    /// `config_path` 未指定時は `AOM_CONFIG`、次に `~/.aom/config.toml` を探す。
    /// ファイルが存在しない場合はデフォルト値を使う。
    pub fn load(config_path: Option<&Path>, addons_dir: Option<&Path>) -> Result<Self> {
        let path = config_path
            .map(Path::to_path_buf)
            .or_else(|| EnvVar::get_path(env::CONFIG_VAR))
            .or_else(default_config_path);

        let file = match path {
            Some(p) if p.exists() => {
                let content = std::fs::read_to_string(&p)?;
                parse_settings_file(&content)
                    .map_err(|e| AomError::Config(format!("{}: {}", p.display(), e)))?
            }
            _ => SettingsFile::default(),
        };

        Self::resolve(
            file,
            addons_dir.map(Path::to_path_buf),
            EnvVar::get_path(env::ADDONS_DIR_VAR),
            EnvVar::get(env::CATALOG_URL_VAR),
        )
    }

    fn resolve(
        file: SettingsFile,
        cli_addons_dir: Option<PathBuf>,
        env_addons_dir: Option<PathBuf>,
        env_catalog_url: Option<String>,
    ) -> Result<Self> {
        let addons_dir = cli_addons_dir
            .or(env_addons_dir)
            .or(file.addons_dir)
            .ok_or_else(|| {
                AomError::Config(
                    "addons directory is not set (use --addons-dir, AOM_ADDONS_DIR or addons_dir in config.toml)"
                        .to_string(),
                )
            })?;

        let mut settings = Settings::new(addons_dir);
        if let Some(store_path) = file.store_path {
            settings.store_path = store_path;
        }
        settings.catalog_url = env_catalog_url
            .or(file.catalog_url)
            .map(|u| u.trim_end_matches('/').to_string());
        if let Some(ext) = file.manifest_extension {
            settings.manifest_extension = ext.trim_start_matches('.').to_string();
        }
        if let Some(hosts) = file.scrape_hosts {
            settings.scrape_hosts = hosts;
        }
        if let Some(branch) = file.fallback_branch {
            settings.fallback_branch = branch;
        }
        if let Some(concurrency) = file.concurrency {
            if concurrency == 0 {
                return Err(AomError::Config("concurrency must be at least 1".to_string()));
            }
            settings.concurrency = concurrency;
        }
        if let Some(retries) = file.retries {
            settings.retries = retries;
        }
        settings.http = file.http;

        Ok(settings)
    }
}

fn default_config_path() -> Option<PathBuf> {
    dirs::home_dir().map(|h| h.join(".aom").join("config.toml"))
}

fn parse_settings_file(content: &str) -> std::result::Result<SettingsFile, toml::de::Error> {
    toml::from_str(content)
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
