//! カタログAPIによる解決
//!
//! `GET {base}/addons/{slug}[?version={hint}]` が返すJSON:
//!
//! ```json
//! { "downloadUrl": "https://cdn.example/Ace3-r924908.zip", "version": "924908" }
//! ```

use super::{Locator, Resolution};
use crate::error::{AomError, Result};
use crate::http::{self, HttpFetcher};
use crate::store::deserialize_version;
use reqwest::Url;
use serde::Deserialize;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CatalogAddon {
    download_url: String,
    #[serde(deserialize_with = "deserialize_version")]
    version: String,
}

pub(super) async fn resolve(
    fetcher: &dyn HttpFetcher,
    base_url: &str,
    slug: &str,
    version_hint: Option<&str>,
    retries: u32,
) -> Result<Resolution> {
    let endpoint = endpoint(base_url, slug, version_hint)?;
    let body = http::with_retry(|| http::fetch_ok(fetcher, &endpoint), retries).await?;
    let addon = parse_addon(&body).map_err(|reason| AomError::Resolution {
        identifier: slug.to_string(),
        reason,
    })?;

    Ok(Resolution {
        locator: Locator::Archive(addon.download_url),
        version: addon.version,
        payload: None,
    })
}

/// APIのURLを組み立てる（スラッグとヒントはエンコードする）
fn endpoint(base_url: &str, slug: &str, version_hint: Option<&str>) -> Result<String> {
    let invalid = |reason: String| AomError::Config(format!("invalid catalog_url {}: {}", base_url, reason));

    let mut url = Url::parse(base_url.trim_end_matches('/')).map_err(|e| invalid(e.to_string()))?;
    url.path_segments_mut()
        .map_err(|_| invalid("cannot be a base URL".to_string()))?
        .pop_if_empty()
        .push("addons")
        .push(slug);
    if let Some(hint) = version_hint.filter(|h| !h.is_empty()) {
        url.query_pairs_mut().append_pair("version", hint);
    }
    Ok(url.to_string())
}

fn parse_addon(body: &[u8]) -> std::result::Result<CatalogAddon, String> {
    let addon: CatalogAddon =
        serde_json::from_slice(body).map_err(|e| format!("invalid catalog response: {}", e))?;
    if addon.download_url.trim().is_empty() {
        return Err("catalog response has an empty downloadUrl".to_string());
    }
    if addon.version.trim().is_empty() {
        return Err("catalog response has an empty version".to_string());
    }
    Ok(addon)
}
