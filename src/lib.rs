//! aom: アドオンマネージャ
//!
//! 複数の配布プラットフォーム（Webカタログ・gitリポジトリ）からアドオンの
//! 最新版を解決し、ダウンロード・展開・配置して、インストール状態を記録する。

pub mod archive;
pub mod config;
pub mod env;
pub mod error;
pub mod fs;
pub mod git;
pub mod http;
pub mod installer;
pub mod manager;
pub mod payload;
pub mod platform;
pub mod resolver;
pub mod source;
pub mod store;

#[cfg(test)]
pub(crate) mod testing;

pub use error::{AomError, Result};
pub use manager::{BatchCheck, CheckFailure, Manager, UpdateCheck};
pub use platform::Platform;
pub use store::AddonRecord;
