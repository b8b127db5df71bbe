//! アドオン管理のファサード
//!
//! 解決 → 取得 → 配置 → 記録 のパイプラインと、記録に基づく更新確認を提供する。
//!
//! 同じアドオンに対する変更操作はアドオン名ごとのロックで直列化し、
//! ストアの読み込み・変更・保存は単一の書き込みロックの下で行う。

use crate::config::Settings;
use crate::error::{AomError, Result};
use crate::fs::{FileSystem, RealFs};
use crate::git::{CommandGit, GitClient};
use crate::http::{HttpFetcher, ReqwestFetcher};
use crate::installer::{Installer, Placement};
use crate::payload::{Acquirer, PayloadTree};
use crate::platform::Platform;
use crate::resolver::Resolver;
use crate::source::Source;
use crate::store::{AddonRecord, AddonStore};
use chrono::Utc;
use futures::stream::{self, StreamExt};
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info, info_span, warn, Instrument};

/// 更新確認の結果
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdateCheck {
    pub name: String,
    /// 記録がないか、記録と異なるバージョンが見つかった
    pub is_new: bool,
    pub platform: Platform,
    pub locator: String,
    pub version: String,
    pub installed_version: Option<String>,
}

/// 個別の確認失敗
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckFailure {
    pub name: String,
    pub error: String,
}

/// 一括確認の結果
#[derive(Debug, Clone, Default)]
pub struct BatchCheck {
    /// 新しいバージョンがあるもの（名前順）
    pub available: Vec<UpdateCheck>,
    /// 確認に失敗したもの（名前順）
    pub failed: Vec<CheckFailure>,
    /// 確認対象の数
    pub checked: usize,
}

impl BatchCheck {
    /// 最新であることを確認できた数
    pub fn up_to_date(&self) -> usize {
        self.checked - self.available.len() - self.failed.len()
    }
}

/// アドオンマネージャ
pub struct Manager {
    settings: Settings,
    resolver: Resolver,
    acquirer: Acquirer,
    installer: Installer,
    fs: Arc<dyn FileSystem>,
    name_locks: Mutex<HashMap<String, Arc<Mutex<()>>>>,
    store_lock: Mutex<()>,
}

impl Manager {
    pub fn new(
        settings: Settings,
        http: Arc<dyn HttpFetcher>,
        git: Option<Arc<dyn GitClient>>,
        fs: Arc<dyn FileSystem>,
    ) -> Self {
        let resolver = Resolver::new(http.clone(), git.clone(), &settings);
        let acquirer = Acquirer::new(http, git, settings.retries);
        let installer = Installer::new(fs.clone(), settings.manifest_extension.clone());
        Self {
            settings,
            resolver,
            acquirer,
            installer,
            fs,
            name_locks: Mutex::new(HashMap::new()),
            store_lock: Mutex::new(()),
        }
    }

    /// 本番用の実装（reqwest / git コマンド / 実ファイルシステム）で構築
    pub fn from_settings(settings: Settings) -> Result<Self> {
        let http: Arc<dyn HttpFetcher> = Arc::new(ReqwestFetcher::new(&settings.http)?);
        let git = CommandGit::detect().map(|g| Arc::new(g) as Arc<dyn GitClient>);
        if git.is_none() {
            debug!("git executable not found, git based addons are unavailable");
        }
        Ok(Self::new(settings, http, git, Arc::new(RealFs)))
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// アドオンをインストール（既にあれば置き換え）
    pub async fn install(
        &self,
        platform: Platform,
        name: &str,
        version_hint: Option<&str>,
    ) -> Result<AddonRecord> {
        let source = Source::classify(platform, name, &self.settings.scrape_hosts)?;
        let key = source.identifier().to_string();
        let lock = self.name_lock(&key).await;
        let _guard = lock.lock().await;

        async {
            // 壊れたストアには書き込まない
            AddonStore::load(&self.settings.store_path)?;

            let resolution = self.resolver.resolve(&source, version_hint).await?;
            let version = resolution.version.clone();
            let payload = self.acquirer.acquire(resolution).await?;
            let placement = self.place(payload, source.fallback_name()).await?;

            let record = AddonRecord {
                platform,
                version,
                folders: placement.folders,
                installed_at: Some(Utc::now().format("%Y-%m-%dT%H:%M:%SZ").to_string()),
            };

            let _store_guard = self.store_lock.lock().await;
            let mut store = AddonStore::load(&self.settings.store_path)?;
            if let Some(previous) = store.get(&key) {
                self.remove_stale_folders(&store, &key, previous, &record.folders);
            }
            store.put(key.as_str(), record.clone());
            store.save()?;

            info!(version = %record.version, folders = ?record.folders, "installed");
            Ok::<_, AomError>(record)
        }
        .instrument(info_span!("install", addon = %key, %platform))
        .await
    }

    /// アドオンをアンインストールし、削除した記録を返す
    pub async fn uninstall(&self, name: &str) -> Result<AddonRecord> {
        // install と同じく前後の空白を除いた識別子で引く
        let name = name.trim();
        let lock = self.name_lock(name).await;
        let _guard = lock.lock().await;
        let _store_guard = self.store_lock.lock().await;

        let span = info_span!("uninstall", addon = %name);
        let _enter = span.enter();

        let mut store = AddonStore::load(&self.settings.store_path)?;
        let record = store
            .get(name)
            .cloned()
            .ok_or_else(|| AomError::NotFound(name.to_string()))?;

        for folder in &record.folders {
            let path = self.folder_path(folder)?;
            self.fs
                .remove(&path)
                .map_err(|e| AomError::install(&path, e))?;
            debug!(path = %path.display(), "removed folder");
        }

        store.remove(name);
        store.save()?;
        info!("uninstalled");
        Ok(record)
    }

    /// 更新を確認
    ///
    /// `platform` 未指定時は記録のプラットフォームを使う。
    pub async fn check_update(&self, name: &str, platform: Option<Platform>) -> Result<UpdateCheck> {
        let name = name.trim();
        let store = AddonStore::load(&self.settings.store_path)?;
        let record = store.get(name);

        let platform = platform
            .or(record.map(|r| r.platform))
            .ok_or_else(|| AomError::NotFound(name.to_string()))?;
        let installed_version = record.map(|r| r.version.clone());

        self.check(name, platform, installed_version).await
    }

    /// 記録済みの全アドオンの更新を確認
    ///
    /// 個別の失敗は `failed` に記録し、他の確認は継続する。
    pub async fn check_all_updates(&self) -> Result<BatchCheck> {
        let store = AddonStore::load(&self.settings.store_path)?;
        let targets: Vec<(String, Platform, String)> = store
            .iter()
            .map(|(name, record)| (name.clone(), record.platform, record.version.clone()))
            .collect();
        let checked = targets.len();

        let results: Vec<(String, Result<UpdateCheck>)> = stream::iter(targets)
            .map(|(name, platform, version)| async move {
                let result = self.check(&name, platform, Some(version)).await;
                (name, result)
            })
            .buffer_unordered(self.settings.concurrency.max(1))
            .collect()
            .await;

        let mut batch = BatchCheck {
            checked,
            ..Default::default()
        };
        for (name, result) in results {
            match result {
                Ok(check) if check.is_new => batch.available.push(check),
                Ok(_) => {}
                Err(e) => {
                    warn!(addon = %name, error = %e, "update check failed");
                    batch.failed.push(CheckFailure {
                        name,
                        error: e.to_string(),
                    });
                }
            }
        }
        batch.available.sort_by(|a, b| a.name.cmp(&b.name));
        batch.failed.sort_by(|a, b| a.name.cmp(&b.name));

        info!(
            checked,
            available = batch.available.len(),
            failed = batch.failed.len(),
            "checked all addons"
        );
        Ok(batch)
    }

    /// 記録済みのアドオン一覧（名前順）
    pub fn list(&self) -> Result<Vec<(String, AddonRecord)>> {
        let store = AddonStore::load(&self.settings.store_path)?;
        Ok(store
            .iter()
            .map(|(name, record)| (name.clone(), record.clone()))
            .collect())
    }

    async fn check(
        &self,
        name: &str,
        platform: Platform,
        installed_version: Option<String>,
    ) -> Result<UpdateCheck> {
        let source = Source::classify(platform, name, &self.settings.scrape_hosts)?;
        let resolution = self
            .resolver
            .resolve(&source, None)
            .instrument(info_span!("check", addon = %name, %platform))
            .await?;

        let is_new = installed_version.as_deref() != Some(resolution.version.as_str());
        debug!(
            addon = %name,
            installed = ?installed_version,
            latest = %resolution.version,
            is_new,
            "checked"
        );

        Ok(UpdateCheck {
            name: name.to_string(),
            is_new,
            platform,
            locator: resolution.locator.as_str().to_string(),
            version: resolution.version,
            installed_version,
        })
    }

    /// 配置はブロッキングI/Oのため専用スレッドで実行（ペイロードはここで破棄される）
    async fn place(&self, payload: PayloadTree, fallback_name: String) -> Result<Placement> {
        let installer = self.installer.clone();
        let addons_dir = self.settings.addons_dir.clone();
        tokio::task::spawn_blocking(move || {
            installer.place(payload.path(), &addons_dir, &fallback_name)
        })
        .await
        .map_err(|e| AomError::install(&self.settings.addons_dir, e))?
    }

    /// 再インストールで不要になった旧フォルダを削除（他のアドオンが使用中のものは残す）
    fn remove_stale_folders(
        &self,
        store: &AddonStore,
        name: &str,
        previous: &AddonRecord,
        current: &[String],
    ) {
        let stale = previous
            .folders
            .iter()
            .filter(|f| !current.contains(*f))
            .filter(|f| {
                !store
                    .iter()
                    .any(|(other, record)| other != name && record.folders.contains(*f))
            });

        for folder in stale {
            let result = self.folder_path(folder).and_then(|path| self.fs.remove(&path));
            match result {
                Ok(()) => debug!(folder = %folder, "removed stale folder"),
                Err(e) => warn!(folder = %folder, error = %e, "failed to remove stale folder"),
            }
        }
    }

    /// 記録されたフォルダ名をアドオンディレクトリ内のパスに変換
    fn folder_path(&self, folder: &str) -> Result<std::path::PathBuf> {
        let single_component = !folder.is_empty()
            && folder != "."
            && folder != ".."
            && !folder.contains(['/', '\\'])
            && !Path::new(folder).is_absolute();
        if !single_component {
            return Err(AomError::install(
                self.settings.addons_dir.join(folder),
                format!("recorded folder '{}' is outside the addons directory", folder),
            ));
        }
        Ok(self.settings.addons_dir.join(folder))
    }

    async fn name_lock(&self, name: &str) -> Arc<Mutex<()>> {
        self.name_locks
            .lock()
            .await
            .entry(name.to_string())
            .or_default()
            .clone()
    }
}

#[cfg(test)]
#[path = "manager_test.rs"]
mod tests;
