//! End-to-end run: lock, ingest every variant, refresh prices once, export every
//! variant, unlock.
//!
//! Failures are contained per variant and per step and reported in the
//! [`RunSummary`]. Only lock faults and setup errors (opening the store) end a run
//! early with an error.

mod cancel;
pub mod lock;

use std::collections::BTreeSet;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::Context;
use chrono::{DateTime, Datelike, Utc};
use cot_ingestor::download::cftc::CftcDownloader;
use cot_ingestor::download::{expected_years, DownloadError, ReportSource};
use cot_ingestor::models::report::{ReportType, SubType, Variant};
use cot_ingestor::parse::{parse_archive, parse_current_period};
use cot_ingestor::providers::yahoo::YahooProvider;
use futures::stream::{self, StreamExt};
use serde::Serialize;
use tracing::{debug, error, info, warn};

use crate::analytics::Calculator;
use crate::config::SyncConfig;
use crate::export::Exporter;
use crate::prices::{PriceCache, PriceData, PriceService};
use crate::store::CotStore;

pub use cancel::CancelToken;
pub use lock::{LockError, LockGuard, LockOutcome, PipelineLock};

pub const DEFAULT_DOWNLOAD_WORKERS: usize = 4;
pub const DEFAULT_YEARS: u32 = 5;

/// Caller-controlled switches for one run.
#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    /// Delete each selected variant before ingesting it again from scratch.
    pub force_reload: bool,
    pub report_type: Option<ReportType>,
    pub sub_type: Option<SubType>,
    /// Use prices cached in memory or stored by an earlier run; fetch only if
    /// neither has anything fresh.
    pub skip_prices: bool,
    /// Newest archive year to consider; the current UTC year when unset.
    pub as_of_year: Option<i32>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", content = "reason", rename_all = "snake_case")]
pub enum StepStatus {
    Succeeded,
    Skipped(String),
    Failed(String),
}

impl StepStatus {
    pub fn is_failed(&self) -> bool {
        matches!(self, StepStatus::Failed(_))
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct VariantOutcome {
    pub variant: Variant,
    pub ingest: StepStatus,
    /// Years already in the ledger.
    pub years_skipped: Vec<i32>,
    pub years_ingested: Vec<i32>,
    /// Years whose download or parse produced nothing storable; retried next run.
    pub years_failed: Vec<i32>,
    pub current_rows: usize,
    pub export: StepStatus,
    pub markets_exported: usize,
}

impl VariantOutcome {
    fn new(variant: Variant) -> Self {
        Self {
            variant,
            ingest: StepStatus::Skipped("not started".into()),
            years_skipped: Vec::new(),
            years_ingested: Vec::new(),
            years_failed: Vec::new(),
            current_rows: 0,
            export: StepStatus::Skipped("not started".into()),
            markets_exported: 0,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub started_at: DateTime<Utc>,
    pub elapsed: Duration,
    pub cancelled: bool,
    pub variants: Vec<VariantOutcome>,
    pub prices: StepStatus,
    /// Markets with price bars attached.
    pub price_markets: usize,
}

impl RunSummary {
    pub fn failed_variants(&self) -> impl Iterator<Item = &VariantOutcome> {
        self.variants
            .iter()
            .filter(|v| v.ingest.is_failed() || v.export.is_failed())
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "result", rename_all = "snake_case")]
pub enum RunResult {
    Completed(RunSummary),
    /// `pid` is `None` when the holder's marker could not be read.
    AlreadyRunning { pid: Option<u32> },
}

pub struct Pipeline {
    source: Arc<dyn ReportSource>,
    prices: PriceService,
    exporter: Exporter,
    db_path: String,
    lock_path: PathBuf,
    years: u32,
    download_workers: usize,
}

impl Pipeline {
    pub fn new(
        source: Arc<dyn ReportSource>,
        prices: PriceService,
        exporter: Exporter,
        db_path: impl Into<String>,
        lock_path: impl Into<PathBuf>,
    ) -> Self {
        Self {
            source,
            prices,
            exporter,
            db_path: db_path.into(),
            lock_path: lock_path.into(),
            years: DEFAULT_YEARS,
            download_workers: DEFAULT_DOWNLOAD_WORKERS,
        }
    }

    /// Wires the HTTP downloader, the Yahoo provider and the exporter from config.
    pub fn from_config(config: &SyncConfig) -> anyhow::Result<Self> {
        let downloader = CftcDownloader::new(config.download.downloader_config())
            .context("building report downloader")?;
        let provider = YahooProvider::new(
            config.prices.base_url.clone(),
            Duration::from_secs(config.prices.timeout_secs),
        )
        .context("building price provider")?;
        let cache = PriceCache::new(chrono::Duration::hours(config.prices.cache_ttl_hours));
        let prices = PriceService::new(Arc::new(provider), Arc::new(cache))
            .with_years(config.prices.years)
            .with_workers(config.prices.workers);
        let exporter = Exporter::new(
            config.output_dir.clone(),
            Calculator::new(config.analytics.clone()),
        );

        Ok(Self::new(
            Arc::new(downloader),
            prices,
            exporter,
            config.db_path.clone(),
            config.lock_path.clone(),
        )
        .with_years(config.download.years)
        .with_download_workers(config.download.workers))
    }

    /// Archive years kept per variant.
    pub fn with_years(mut self, years: u32) -> Self {
        self.years = years.max(1);
        self
    }

    pub fn with_download_workers(mut self, workers: usize) -> Self {
        self.download_workers = workers.max(1);
        self
    }

    pub fn price_service(&self) -> &PriceService {
        &self.prices
    }

    pub async fn run(&self, options: &RunOptions, cancel: &CancelToken) -> anyhow::Result<RunResult> {
        let started_at = Utc::now();
        let timer = Instant::now();

        let _guard = match PipelineLock::acquire(&self.lock_path)? {
            LockOutcome::Acquired(guard) => guard,
            LockOutcome::AlreadyRunning { pid } => return Ok(RunResult::AlreadyRunning { pid }),
        };

        let mut store = CotStore::open(&self.db_path)?;
        let variants = Variant::selected(options.report_type, options.sub_type);
        let as_of_year = options.as_of_year.unwrap_or_else(|| Utc::now().year());
        info!(
            variants = variants.len(),
            force = options.force_reload,
            skip_prices = options.skip_prices,
            as_of_year,
            "pipeline starting"
        );

        let mut outcomes = Vec::with_capacity(variants.len());
        for &variant in &variants {
            if cancel.is_cancelled() {
                break;
            }
            outcomes.push(
                self.ingest_variant(&mut store, variant, options, as_of_year, cancel)
                    .await,
            );
        }

        let (prices, price_data) = if cancel.is_cancelled() {
            (StepStatus::Skipped("cancelled".into()), PriceData::new())
        } else {
            self.refresh_prices(&mut store, &variants, options.skip_prices)
                .await
        };

        for outcome in &mut outcomes {
            if cancel.is_cancelled() {
                outcome.export = StepStatus::Skipped("cancelled".into());
                continue;
            }
            match self
                .exporter
                .export_variant(&mut store, outcome.variant, &price_data)
            {
                Ok(summary) => {
                    outcome.export = StepStatus::Succeeded;
                    outcome.markets_exported = summary.markets;
                }
                Err(err) => {
                    error!(variant = %outcome.variant, error = %format!("{err:#}"), "export failed");
                    outcome.export = StepStatus::Failed(format!("{err:#}"));
                }
            }
        }

        let summary = RunSummary {
            started_at,
            elapsed: timer.elapsed(),
            cancelled: cancel.is_cancelled(),
            variants: outcomes,
            prices,
            price_markets: price_data.len(),
        };
        info!(
            elapsed_ms = summary.elapsed.as_millis() as u64,
            cancelled = summary.cancelled,
            failed = summary.failed_variants().count(),
            "pipeline complete"
        );
        Ok(RunResult::Completed(summary))
    }

    async fn ingest_variant(
        &self,
        store: &mut CotStore,
        variant: Variant,
        options: &RunOptions,
        as_of_year: i32,
        cancel: &CancelToken,
    ) -> VariantOutcome {
        info!(
            %variant,
            report = variant.report_type.display_name(),
            subtype = variant.sub_type.display_name(),
            "processing variant"
        );
        let mut outcome = VariantOutcome::new(variant);
        let result = self
            .ingest(store, variant, options, as_of_year, cancel, &mut outcome)
            .await;
        outcome.ingest = match result {
            Ok(()) if cancel.is_cancelled() => StepStatus::Skipped("cancelled".into()),
            Ok(()) => StepStatus::Succeeded,
            Err(err) => {
                error!(%variant, error = %format!("{err:#}"), "ingest failed");
                StepStatus::Failed(format!("{err:#}"))
            }
        };
        outcome
    }

    async fn ingest(
        &self,
        store: &mut CotStore,
        variant: Variant,
        options: &RunOptions,
        as_of_year: i32,
        cancel: &CancelToken,
        outcome: &mut VariantOutcome,
    ) -> anyhow::Result<()> {
        let done: BTreeSet<i32> = if options.force_reload {
            let removed = store.delete_variant(variant)?;
            info!(%variant, removed, "forced reload, variant cleared");
            BTreeSet::new()
        } else {
            store.ingested_years(variant)?
        };

        let (skipped, missing): (Vec<i32>, Vec<i32>) = expected_years(as_of_year, self.years)
            .into_iter()
            .partition(|y| done.contains(y));
        if !skipped.is_empty() {
            info!(%variant, years = ?skipped, "skipping already ingested years");
        }
        outcome.years_skipped = skipped;

        let mut downloads = self.download_years(variant, missing, cancel).await;
        downloads.sort_by_key(|(year, _)| *year);

        for (year, result) in downloads {
            if cancel.is_cancelled() {
                return Ok(());
            }
            let text = match result {
                Some(Ok(text)) => text,
                Some(Err(err)) => {
                    warn!(%variant, year, error = %err, "year download failed, skipping");
                    outcome.years_failed.push(year);
                    continue;
                }
                None => continue,
            };
            let records = parse_archive(&text, variant);
            if records.is_empty() {
                warn!(%variant, year, "archive produced no rows");
                outcome.years_failed.push(year);
                continue;
            }
            let stored = store
                .upsert(&records)
                .with_context(|| format!("storing {variant} {year}"))?;
            store.record_year_ingested(variant, year, stored)?;
            info!(%variant, year, rows = stored, "year stored");
            outcome.years_ingested.push(year);
        }

        if cancel.is_cancelled() {
            return Ok(());
        }
        match self.source.fetch_current_period(variant).await {
            Ok(text) => {
                let records = parse_current_period(&text, variant);
                if !records.is_empty() {
                    outcome.current_rows = store
                        .upsert(&records)
                        .with_context(|| format!("storing {variant} current period"))?;
                    info!(%variant, rows = outcome.current_rows, "current period stored");
                }
            }
            Err(err) => warn!(%variant, error = %err, "current period download failed"),
        }

        let stats = store.get_variant_stats(Some(variant.report_type), Some(variant.sub_type))?;
        info!(
            %variant,
            records = stats.total_records,
            markets = stats.total_markets,
            first = ?stats.first_date,
            last = ?stats.last_date,
            "variant ingested"
        );
        Ok(())
    }

    /// Downloads `years` concurrently. `None` marks a year not started because the
    /// run was cancelled.
    async fn download_years(
        &self,
        variant: Variant,
        years: Vec<i32>,
        cancel: &CancelToken,
    ) -> Vec<(i32, Option<Result<String, DownloadError>>)> {
        let source = &self.source;
        stream::iter(years)
            .map(|year| async move {
                if cancel.is_cancelled() {
                    return (year, None);
                }
                (year, Some(source.fetch_year_archive(variant, year).await))
            })
            .buffer_unordered(self.download_workers)
            .collect()
            .await
    }

    async fn refresh_prices(
        &self,
        store: &mut CotStore,
        variants: &[Variant],
        skip_prices: bool,
    ) -> (StepStatus, PriceData) {
        let mut codes: Vec<String> = Vec::new();
        for &variant in variants {
            match store.get_all_markets_for_variant(variant) {
                Ok(markets) => codes.extend(markets.into_iter().map(|m| m.code)),
                Err(err) => warn!(%variant, error = %format!("{err:#}"), "listing markets failed"),
            }
        }
        codes.sort();
        codes.dedup();
        if codes.is_empty() {
            return (StepStatus::Skipped("no markets".into()), PriceData::new());
        }

        if skip_prices {
            self.restore_prices(store, &codes);
            let cached = self.prices.cached(&codes);
            info!(markets = cached.len(), "using cached prices");
            if !cached.is_empty() {
                return (StepStatus::Skipped("using cached prices".into()), cached);
            }
            info!("price cache empty, fetching");
        }
        let data = self.prices.refresh_all(&codes).await;
        let fetched_at = self.prices.cache().now();
        if let Err(err) = store.save_prices(&data, fetched_at) {
            warn!(error = %format!("{err:#}"), "storing prices failed");
        }
        (StepStatus::Succeeded, data)
    }

    /// Loads prices stored by earlier runs into the cache, keeping their fetch times
    /// so expired bars stay expired.
    fn restore_prices(&self, store: &mut CotStore, codes: &[String]) {
        let missing: Vec<String> = codes
            .iter()
            .filter(|code| self.prices.cache().get(code).is_none())
            .cloned()
            .collect();
        match store.load_prices(&missing) {
            Ok(stored) => {
                let restored = stored.len();
                for (code, entry) in stored {
                    self.prices.cache().put_at(code, entry.bars, entry.fetched_at);
                }
                debug!(restored, "restored stored prices");
            }
            Err(err) => warn!(error = %format!("{err:#}"), "loading stored prices failed"),
        }
    }
}
