//! 配布プラットフォーム種別

use serde::{Deserialize, Serialize};

/// アドオンの配布プラットフォーム
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    /// Webカタログ（旧名 "curse" も読み込み可）
    #[serde(alias = "curse")]
    Catalog,
    /// gitリポジトリ
    Git,
}

impl Platform {
    pub fn as_str(&self) -> &'static str {
        match self {
            Platform::Catalog => "catalog",
            Platform::Git => "git",
        }
    }
}

impl std::fmt::Display for Platform {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
