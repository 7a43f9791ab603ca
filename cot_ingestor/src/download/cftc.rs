use std::num::NonZeroU32;
use std::sync::Arc;

use async_trait::async_trait;
use governor::{Quota, RateLimiter};
use nonzero_ext::nonzero;
use reqwest::Client;
use snafu::ResultExt;
use tracing::{error, info, warn};

use crate::download::{
    ClientBuildSnafu, DownloadError, DownloaderConfig, ExhaustedSnafu, HttpSnafu, ReportSource,
    StatusSnafu, archive::extract_tabular_member, current_period_path, year_archive_path,
};
use crate::models::report::Variant;

type DirectLimiter = RateLimiter<
    governor::state::NotKeyed,
    governor::state::InMemoryState,
    governor::clock::DefaultClock,
>;

/// Downloads report files from the CFTC file server.
pub struct CftcDownloader {
    client: Client,
    config: DownloaderConfig,
    rate_limiter: Arc<DirectLimiter>,
}

impl CftcDownloader {
    /// Builds a downloader with its own HTTP client.
    pub fn new(config: DownloaderConfig) -> Result<Self, DownloadError> {
        let client = Client::builder()
            .timeout(config.timeout)
            .user_agent(config.user_agent.clone())
            .build()
            .context(ClientBuildSnafu)?;
        let rps = NonZeroU32::new(config.requests_per_second).unwrap_or(nonzero!(5u32));
        let rate_limiter = Arc::new(RateLimiter::direct(Quota::per_second(rps)));
        Ok(Self {
            client,
            config,
            rate_limiter,
        })
    }

    /// The active configuration.
    pub fn config(&self) -> &DownloaderConfig {
        &self.config
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.config.base_url.trim_end_matches('/'), path)
    }

    /// One GET, no retries.
    async fn get_once(&self, url: &str) -> Result<Vec<u8>, DownloadError> {
        self.rate_limiter.until_ready().await;

        let response = self.client.get(url).send().await.context(HttpSnafu { url })?;
        let status = response.status();
        if !status.is_success() {
            return StatusSnafu {
                url,
                status: status.as_u16(),
            }
            .fail();
        }
        let body = response.bytes().await.context(HttpSnafu { url })?;
        Ok(body.to_vec())
    }

    /// GET with retries; attempt `n` is followed by a `backoff * n` pause.
    async fn get(&self, url: &str) -> Result<Vec<u8>, DownloadError> {
        let attempts = self.config.retries.max(1);
        let mut attempt = 1;
        loop {
            match self.get_once(url).await {
                Ok(body) => return Ok(body),
                Err(e) if attempt < attempts && e.is_transient() => {
                    warn!(attempt, attempts, %url, error = %e, "download attempt failed");
                    tokio::time::sleep(self.config.backoff * attempt).await;
                    attempt += 1;
                }
                Err(e) => {
                    error!(attempts = attempt, %url, error = %e, "download failed");
                    return Err(e).context(ExhaustedSnafu {
                        url,
                        attempts: attempt,
                    });
                }
            }
        }
    }
}

#[async_trait]
impl ReportSource for CftcDownloader {
    async fn fetch_year_archive(&self, variant: Variant, year: i32) -> Result<String, DownloadError> {
        let url = self.url(&year_archive_path(variant).replace("{year}", &year.to_string()));
        info!(%variant, year, %url, "downloading yearly archive");
        let bytes = self.get(&url).await?;
        extract_tabular_member(&bytes)
    }

    async fn fetch_current_period(&self, variant: Variant) -> Result<String, DownloadError> {
        let url = self.url(current_period_path(variant));
        info!(%variant, %url, "downloading current week");
        let bytes = self.get(&url).await?;
        let text = String::from_utf8_lossy(&bytes).into_owned();
        info!(%variant, chars = text.len(), "current week downloaded");
        Ok(text)
    }
}
