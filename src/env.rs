use std::path::PathBuf;

/// 設定ファイルパスを上書きする環境変数
pub const CONFIG_VAR: &str = "AOM_CONFIG";
/// アドオンディレクトリを上書きする環境変数
pub const ADDONS_DIR_VAR: &str = "AOM_ADDONS_DIR";
/// カタログURLを上書きする環境変数
pub const CATALOG_URL_VAR: &str = "AOM_CATALOG_URL";
/// ログフィルタ
pub const LOG_VAR: &str = "AOM_LOG";

/// 環境変数ユーティリティ
pub struct EnvVar;

impl EnvVar {
    /// 環境変数を取得（空文字列・空白のみはNoneとして扱う）
    pub fn get(key: &str) -> Option<String> {
        std::env::var(key)
            .ok()
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
    }

    /// 環境変数をパスとして取得
    pub fn get_path(key: &str) -> Option<PathBuf> {
        Self::get(key).map(PathBuf::from)
    }
}
