//! Report source abstraction and the CFTC HTTP downloader.
//!
//! [`ReportSource`] is the seam the pipeline depends on. [`cftc::CftcDownloader`]
//! implements it against the public CFTC file server: yearly zip archives plus a
//! headerless current-week text file per variant.
//!
//! Transient failures (transport errors, timeouts, non-2xx statuses) are retried with
//! linear backoff. Archive problems are not retried.

pub mod archive;
pub mod cftc;

use std::time::Duration;

use async_trait::async_trait;
use snafu::{Backtrace, Snafu};

use crate::models::report::{ReportType, SubType, Variant};

/// Source of raw report text for a variant.
#[async_trait]
pub trait ReportSource: Send + Sync {
    /// Fetches the yearly archive for `year` and returns its tabular member as text.
    async fn fetch_year_archive(&self, variant: Variant, year: i32) -> Result<String, DownloadError>;

    /// Fetches the latest (possibly revised) period as headerless text.
    async fn fetch_current_period(&self, variant: Variant) -> Result<String, DownloadError>;
}

/// Errors that can occur while downloading report files.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum DownloadError {
    /// Failed to construct the HTTP client.
    #[snafu(display("Failed to build HTTP client: {source}"))]
    ClientBuild {
        source: reqwest::Error,
        backtrace: Backtrace,
    },

    /// Transport failure or timeout.
    #[snafu(display("Request to {url} failed: {source}"))]
    Http {
        url: String,
        source: reqwest::Error,
        backtrace: Backtrace,
    },

    /// The server answered with a non-success status.
    #[snafu(display("Request to {url} returned HTTP {status}"))]
    Status {
        url: String,
        status: u16,
        backtrace: Backtrace,
    },

    /// Every attempt failed.
    #[snafu(display("Giving up on {url} after {attempts} attempts: {source}"))]
    Exhausted {
        url: String,
        attempts: u32,
        #[snafu(source(from(DownloadError, Box::new)))]
        source: Box<DownloadError>,
    },

    /// The payload is not a readable zip archive.
    #[snafu(display("Bad archive: {source}"))]
    Archive {
        source: zip::result::ZipError,
        backtrace: Backtrace,
    },

    /// Reading an archive member failed.
    #[snafu(display("Failed to read archive member {name}: {source}"))]
    ArchiveRead {
        name: String,
        source: std::io::Error,
        backtrace: Backtrace,
    },

    /// The archive holds no `.txt` or `.csv` member.
    #[snafu(display("No tabular member in archive (members: {members:?})"))]
    NoTabularMember {
        members: Vec<String>,
        backtrace: Backtrace,
    },
}

impl DownloadError {
    /// Whether another attempt could succeed.
    pub fn is_transient(&self) -> bool {
        matches!(self, DownloadError::Http { .. } | DownloadError::Status { .. })
    }
}

/// Default CFTC file server.
pub const CFTC_BASE_URL: &str = "https://www.cftc.gov";

/// HTTP behaviour of the downloader.
#[derive(Debug, Clone)]
pub struct DownloaderConfig {
    /// Scheme and host the URL paths are appended to.
    pub base_url: String,
    /// Per-request timeout.
    pub timeout: Duration,
    /// Total attempts per URL.
    pub retries: u32,
    /// Backoff unit; attempt `n` waits `backoff * n` before the next one.
    pub backoff: Duration,
    /// User agent sent with every request.
    pub user_agent: String,
    /// Upper bound on outbound requests per second.
    pub requests_per_second: u32,
}

impl Default for DownloaderConfig {
    fn default() -> Self {
        Self {
            base_url: CFTC_BASE_URL.to_string(),
            timeout: Duration::from_secs(60),
            retries: 3,
            backoff: Duration::from_secs(2),
            user_agent: concat!("cot-sync/", env!("CARGO_PKG_VERSION")).to_string(),
            requests_per_second: 5,
        }
    }
}

/// URL path of the yearly archive, with a `{year}` placeholder.
pub fn year_archive_path(variant: Variant) -> &'static str {
    use ReportType::*;
    use SubType::*;
    match (variant.report_type, variant.sub_type) {
        (Legacy, FuturesOnly) => "/files/dea/history/deacot{year}.zip",
        (Legacy, Combined) => "/files/dea/history/deahistfo{year}.zip",
        (Disaggregated, FuturesOnly) => "/files/dea/history/fut_disagg_txt_{year}.zip",
        (Disaggregated, Combined) => "/files/dea/history/com_disagg_txt_{year}.zip",
        (FinancialFutures, FuturesOnly) => "/files/dea/history/fut_fin_txt_{year}.zip",
        (FinancialFutures, Combined) => "/files/dea/history/com_fin_txt_{year}.zip",
    }
}

/// URL path of the current-week file.
pub fn current_period_path(variant: Variant) -> &'static str {
    use ReportType::*;
    use SubType::*;
    match (variant.report_type, variant.sub_type) {
        (Legacy, FuturesOnly) => "/dea/newcot/deafut.txt",
        (Legacy, Combined) => "/dea/newcot/deacom.txt",
        (Disaggregated, FuturesOnly) => "/dea/newcot/f_disagg.txt",
        (Disaggregated, Combined) => "/dea/newcot/c_disagg.txt",
        (FinancialFutures, FuturesOnly) => "/dea/newcot/FinFutWk.txt",
        (FinancialFutures, Combined) => "/dea/newcot/FinComWk.txt",
    }
}

/// The `years` calendar years ending at `as_of_year`, oldest first.
pub fn expected_years(as_of_year: i32, years: u32) -> Vec<i32> {
    let years = i32::try_from(years.max(1)).unwrap_or(i32::MAX);
    ((as_of_year.saturating_sub(years) + 1)..=as_of_year).collect()
}
