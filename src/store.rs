//! インストール済みアドオンの記録
//!
//! アドオン名 → `AddonRecord` の対応を JSON ファイルで永続化する。
//!
//! ```json
//! {
//!   "addons": {
//!     "Ace3": { "platform": "catalog", "version": "924908", "folders": ["Ace3"] }
//!   }
//! }
//! ```

use crate::error::{AomError, Result};
use crate::platform::Platform;
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

/// インストール済みアドオンの記録
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddonRecord {
    pub platform: Platform,
    /// 不透明なバージョントークン（等価比較のみ）
    #[serde(deserialize_with = "deserialize_version")]
    pub version: String,
    /// アドオンディレクトリ直下に配置したフォルダ
    #[serde(default, deserialize_with = "deserialize_folders")]
    pub folders: Vec<String>,
    /// インストール日時（RFC3339形式）
    #[serde(
        default,
        rename = "installedAt",
        skip_serializing_if = "Option::is_none"
    )]
    pub installed_at: Option<String>,
}

/// バージョン（文字列または数値）を文字列として読み込む
///
/// 古い記録では `0` や `924908` のような数値で保存されている。
pub(crate) fn deserialize_version<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawVersion {
        Text(String),
        Unsigned(u64),
        Signed(i64),
    }

    Ok(match RawVersion::deserialize(deserializer)? {
        RawVersion::Text(s) => s,
        RawVersion::Unsigned(n) => n.to_string(),
        RawVersion::Signed(n) => n.to_string(),
    })
}

/// `null` のフォルダ一覧を空として読み込む
fn deserialize_folders<'de, D>(deserializer: D) -> std::result::Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Vec<String>>::deserialize(deserializer)?.unwrap_or_default())
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct StoreFile {
    #[serde(default)]
    addons: BTreeMap<String, AddonRecord>,
}

/// アドオン記録のストア
#[derive(Debug)]
pub struct AddonStore {
    path: PathBuf,
    addons: BTreeMap<String, AddonRecord>,
}

impl AddonStore {
    /// ストアファイルを読み込む
    ///
    /// ファイルが存在しないか空なら空のストア、壊れていれば `StoreCorrupt`。
    pub fn load(path: &Path) -> Result<Self> {
        let content = match fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => String::new(),
            Err(e) => return Err(e.into()),
        };

        let file = if content.trim().is_empty() {
            StoreFile::default()
        } else {
            serde_json::from_str::<StoreFile>(&content).map_err(|e| AomError::StoreCorrupt {
                path: path.to_path_buf(),
                reason: e.to_string(),
            })?
        };

        Ok(Self {
            path: path.to_path_buf(),
            addons: file.addons,
        })
    }

    /// ストア全体をアトミックに書き込む
    ///
    /// 同一ディレクトリに一時ファイルを作成し、persist() でリネームする。
    pub fn save(&self) -> Result<()> {
        let dir = match self.path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
            _ => PathBuf::from("."),
        };
        fs::create_dir_all(&dir)?;

        let file = StoreFile {
            addons: self.addons.clone(),
        };
        let json = serde_json::to_string_pretty(&file)?;

        let mut temp_file = NamedTempFile::new_in(&dir)?;
        temp_file.write_all(json.as_bytes())?;
        temp_file.flush()?;
        temp_file.persist(&self.path).map_err(|e| e.error)?;
        Ok(())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn get(&self, name: &str) -> Option<&AddonRecord> {
        self.addons.get(name)
    }

    /// 記録を追加（既存の記録は置き換える）
    pub fn put(&mut self, name: impl Into<String>, record: AddonRecord) {
        self.addons.insert(name.into(), record);
    }

    pub fn remove(&mut self, name: &str) -> Option<AddonRecord> {
        self.addons.remove(name)
    }

    /// 記録済みのアドオン名（名前順）
    pub fn names(&self) -> Vec<String> {
        self.addons.keys().cloned().collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &AddonRecord)> {
        self.addons.iter()
    }

    pub fn len(&self) -> usize {
        self.addons.len()
    }

    pub fn is_empty(&self) -> bool {
        self.addons.is_empty()
    }
}

#[cfg(test)]
#[path = "store_test.rs"]
mod tests;
