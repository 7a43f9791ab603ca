//! JSON artifact exporter.
//!
//! For each variant the exporter writes:
//!
//! - `markets_{rt}_{st}.json`: market metadata list
//! - `screener_{rt}_{st}.json`: one row per market from its newest period
//! - `groups_{rt}.json`: group definitions for the report type
//! - `market_{code}_{rt}_{st}.json`: full detail per market
//!
//! Files are written to a temp file in the output directory and persisted over the
//! target, so a reader never sees a half-written document.

pub mod categories;
pub mod payload;

use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::Context;
use cot_ingestor::models::report::{ReportType, Variant};
use serde::Serialize;
use tempfile::NamedTempFile;
use tracing::{debug, info, warn};

use crate::analytics::Calculator;
use crate::prices::PriceData;
use crate::store::CotStore;

pub use payload::{build_market_payload, MarketDetail, MarketMeta, MarketPayload, ScreenerRow};

/// Markets loaded from the store per round trip.
const PAGE_SIZE: usize = 100;
const PROGRESS_EVERY: usize = 20;

/// Counts from one variant export.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ExportSummary {
    pub markets: usize,
    pub screener_rows: usize,
    /// Markets whose detail file could not be written.
    pub failed: usize,
}

pub struct Exporter {
    output_dir: PathBuf,
    calculator: Calculator,
}

impl Exporter {
    pub fn new(output_dir: impl Into<PathBuf>, calculator: Calculator) -> Self {
        Self {
            output_dir: output_dir.into(),
            calculator,
        }
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Exports every market of `variant`, attaching bars from `prices` where present.
    pub fn export_variant(
        &self,
        store: &mut CotStore,
        variant: Variant,
        prices: &PriceData,
    ) -> anyhow::Result<ExportSummary> {
        std::fs::create_dir_all(&self.output_dir)
            .with_context(|| format!("creating {}", self.output_dir.display()))?;

        let markets = store.get_all_markets_for_variant(variant)?;
        let total = markets.len();
        if total == 0 {
            warn!(%variant, "no markets to export");
        } else {
            info!(%variant, markets = total, "exporting");
        }

        let rt = variant.report_type.code();
        let st = variant.sub_type.code();
        let mut summary = ExportSummary::default();
        let mut market_list = Vec::new();
        let mut screener_rows = Vec::new();
        let mut seen = 0usize;

        for chunk in markets.chunks(PAGE_SIZE) {
            let page = store.get_series_for_markets(variant, chunk)?;
            for series in page {
                seen += 1;
                let code = &series.market.code;
                let bars = prices.get(code).map(Vec::as_slice);
                let Some(payload) = build_market_payload(
                    &self.calculator,
                    &series.market,
                    variant,
                    &series.records,
                    bars,
                ) else {
                    continue;
                };

                let file = format!("market_{}_{rt}_{st}.json", sanitize_code(code));
                if let Err(err) = self.write_json(&file, &payload.detail) {
                    warn!(%variant, code = %code, error = %err, "market export failed");
                    summary.failed += 1;
                    continue;
                }
                market_list.push(payload.detail.market);
                screener_rows.push(payload.screener);

                if seen % PROGRESS_EVERY == 0 {
                    info!(%variant, "{seen}/{total} markets done");
                }
            }
        }

        self.write_json(&format!("markets_{rt}_{st}.json"), &market_list)?;
        self.write_json(&format!("screener_{rt}_{st}.json"), &screener_rows)?;
        self.write_groups(variant.report_type)?;

        summary.markets = market_list.len();
        summary.screener_rows = screener_rows.len();
        info!(
            %variant,
            markets = summary.markets,
            screener_rows = summary.screener_rows,
            failed = summary.failed,
            "export done"
        );
        Ok(summary)
    }

    /// Writes `groups_{rt}.json`.
    pub fn write_groups(&self, report_type: ReportType) -> anyhow::Result<()> {
        self.write_json(&format!("groups_{}.json", report_type.code()), report_type.groups())
    }

    fn write_json<T: Serialize + ?Sized>(&self, file_name: &str, value: &T) -> anyhow::Result<()> {
        let path = self.output_dir.join(file_name);
        let body = serde_json::to_vec(value).context("serializing artifact")?;

        let mut tmp = NamedTempFile::new_in(&self.output_dir)
            .with_context(|| format!("creating temp file in {}", self.output_dir.display()))?;
        tmp.write_all(&body)
            .with_context(|| format!("writing {}", tmp.path().display()))?;
        tmp.as_file().sync_all()?;
        tmp.persist(&path)
            .with_context(|| format!("replacing {}", path.display()))?;

        debug!(path = %path.display(), bytes = body.len(), "wrote artifact");
        Ok(())
    }
}

/// Maps a market code onto a safe file-name fragment.
pub fn sanitize_code(code: &str) -> String {
    code.chars()
        .map(|c| match c {
            'a'..='z' | 'A'..='Z' | '0'..='9' | '-' | '_' | '+' => c,
            _ => '_',
        })
        .collect()
}
