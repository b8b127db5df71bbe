use std::path::PathBuf;
use thiserror::Error;

/// AOM統一エラー型
#[derive(Debug, Error)]
pub enum AomError {
    #[error("Could not resolve '{identifier}': {reason}")]
    Resolution { identifier: String, reason: String },

    #[error("Unsupported platform: {0}")]
    UnsupportedPlatform(String),

    #[error("Failed to clone {url}: {reason}")]
    Clone { url: String, reason: String },

    #[error("Failed to download {url}: {reason}")]
    Download { url: String, reason: String },

    #[error("Failed to extract archive: {0}")]
    Extraction(String),

    #[error("Failed to install into {path:?}: {reason}")]
    Install { path: PathBuf, reason: String },

    #[error("Addon store {path:?} is corrupt: {reason}")]
    StoreCorrupt { path: PathBuf, reason: String },

    #[error("Addon not found: {0}")]
    NotFound(String),

    #[error("HTTP {status} from {url}: {message}")]
    HttpStatus {
        url: String,
        status: u16,
        message: String,
    },

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Zip extraction error: {0}")]
    Zip(#[from] zip::result::ZipError),

    #[error("Config error: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, AomError>;

impl AomError {
    /// リトライ可能なエラーかどうか
    pub fn is_retryable(&self) -> bool {
        match self {
            AomError::Network(_) => true,
            AomError::HttpStatus {
                status, message, ..
            } => {
                // 5xx と 429 はリトライ可能、403 はレート制限の場合のみ
                (500..600).contains(status)
                    || *status == 429
                    || (*status == 403 && message.to_lowercase().contains("rate limit"))
            }
            _ => false,
        }
    }

    /// 解決エラーに変換（既に分類済みのエラーはそのまま）
    pub fn into_resolution(self, identifier: &str) -> Self {
        match self {
            e @ (AomError::Resolution { .. }
            | AomError::UnsupportedPlatform(_)
            | AomError::Clone { .. }) => e,
            other => AomError::Resolution {
                identifier: identifier.to_string(),
                reason: other.to_string(),
            },
        }
    }

    /// ダウンロードエラーに変換
    pub fn into_download(self, url: &str) -> Self {
        match self {
            e @ AomError::Download { .. } => e,
            other => AomError::Download {
                url: url.to_string(),
                reason: other.to_string(),
            },
        }
    }

    /// インストールエラーを生成
    pub fn install(path: impl Into<PathBuf>, reason: impl std::fmt::Display) -> Self {
        AomError::Install {
            path: path.into(),
            reason: reason.to_string(),
        }
    }
}
