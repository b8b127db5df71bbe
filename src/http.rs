//! 共通HTTPヘルパー

use crate::config::HttpConfig;
use crate::error::{AomError, Result};
use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};
use reqwest::Client;
use std::future::Future;
use std::pin::Pin;
use std::time::Duration;
use tracing::{debug, warn};

/// HTTPレスポンス（ステータスと本文）
#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub status: u16,
    pub body: Vec<u8>,
}

impl HttpResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// 本文をUTF-8文字列として取得（不正なバイトは置換）
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).to_string()
    }
}

/// HTTP GET の抽象化
///
/// 通信エラーのみ Err を返し、ステータスコードに関わらずレスポンスは Ok で返す。
pub trait HttpFetcher: Send + Sync {
    fn get<'a>(
        &'a self,
        url: &'a str,
    ) -> Pin<Box<dyn Future<Output = Result<HttpResponse>> + Send + 'a>>;

    /// アーカイブなど大きな本文の取得（実装によっては進捗を表示する）
    fn download<'a>(
        &'a self,
        url: &'a str,
    ) -> Pin<Box<dyn Future<Output = Result<HttpResponse>> + Send + 'a>> {
        self.get(url)
    }
}

/// Content-Length から事前確保する本文バッファの上限
const MAX_PREALLOC: u64 = 8 * 1024 * 1024;

/// reqwest による HttpFetcher 実装
pub struct ReqwestFetcher {
    http: Client,
}

impl ReqwestFetcher {
    pub fn new(config: &HttpConfig) -> Result<Self> {
        Ok(Self {
            http: config.build_client()?,
        })
    }

    async fn fetch(&self, url: &str, show_progress: bool) -> Result<HttpResponse> {
        debug!(url, "GET");
        let mut response = self.http.get(url).send().await?;
        let status = response.status().as_u16();

        let total_size = response.content_length().unwrap_or(0);
        let pb = show_progress.then(|| progress_bar(total_size));

        // 宣言サイズは信用せず、上限までしか事前確保しない
        let mut body = Vec::with_capacity(total_size.min(MAX_PREALLOC) as usize);
        while let Some(chunk) = response.chunk().await? {
            if let Some(pb) = &pb {
                pb.inc(chunk.len() as u64);
            }
            body.extend_from_slice(&chunk);
        }
        if let Some(pb) = pb {
            pb.finish_and_clear();
        }

        Ok(HttpResponse { status, body })
    }
}

impl HttpFetcher for ReqwestFetcher {
    fn get<'a>(
        &'a self,
        url: &'a str,
    ) -> Pin<Box<dyn Future<Output = Result<HttpResponse>> + Send + 'a>> {
        Box::pin(self.fetch(url, false))
    }

    fn download<'a>(
        &'a self,
        url: &'a str,
    ) -> Pin<Box<dyn Future<Output = Result<HttpResponse>> + Send + 'a>> {
        Box::pin(self.fetch(url, true))
    }
}

/// プログレスバーを生成（端末でなければ非表示）
fn progress_bar(total_size: u64) -> ProgressBar {
    let pb = if total_size > 0 {
        let pb = ProgressBar::new(total_size);
        if let Ok(style) = ProgressStyle::default_bar()
            .template("{spinner:.green} [{bar:40.cyan/blue}] {bytes}/{total_bytes} ({eta})")
        {
            pb.set_style(style.progress_chars("#>-"));
        }
        pb
    } else {
        let pb = ProgressBar::new_spinner();
        if let Ok(style) = ProgressStyle::default_spinner().template("{spinner:.green} Downloading...")
        {
            pb.set_style(style);
        }
        pb
    };
    pb.set_draw_target(ProgressDrawTarget::stderr());
    pb
}

/// GETして成功ステータスの本文を返す
///
/// 2xx 以外は `AomError::HttpStatus`。
pub async fn fetch_ok(fetcher: &dyn HttpFetcher, url: &str) -> Result<Vec<u8>> {
    success_body(url, fetcher.get(url).await?)
}

/// 進捗表示付きで取得し、成功ステータスの本文を返す
pub async fn download_ok(fetcher: &dyn HttpFetcher, url: &str) -> Result<Vec<u8>> {
    success_body(url, fetcher.download(url).await?)
}

fn success_body(url: &str, response: HttpResponse) -> Result<Vec<u8>> {
    if !response.is_success() {
        let message = response.text();
        return Err(AomError::HttpStatus {
            url: url.to_string(),
            status: response.status,
            message: message.chars().take(200).collect(),
        });
    }
    Ok(response.body)
}

/// リトライ可能なエラーかどうか
pub fn is_retriable_error(error: &AomError) -> bool {
    error.is_retryable()
}

/// 一時的な失敗を指数バックオフでリトライ
///
/// `max_retries` は初回を含まない追加試行回数。
pub async fn with_retry<T, F, Fut>(mut op: F, max_retries: u32) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let mut attempt = 0;
    loop {
        match op().await {
            Ok(value) => return Ok(value),
            Err(e) if attempt < max_retries && is_retriable_error(&e) => {
                attempt += 1;
                let delay = Duration::from_millis(200 * 2u64.pow(attempt - 1));
                warn!(attempt, error = %e, "transient failure, retrying in {:?}", delay);
                tokio::time::sleep(delay).await;
            }
            Err(e) => return Err(e),
        }
    }
}

#[cfg(test)]
#[path = "http_test.rs"]
mod tests;
