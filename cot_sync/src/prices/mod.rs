//! Daily price bars for report markets.
//!
//! Markets map to instrument tickers through a [`TickerMap`]; several markets may share
//! one ticker, which is fetched once and fanned back out. Results land in a
//! [`PriceCache`] so read paths and `--skip-prices` runs avoid network calls.

mod cache;

use std::sync::Arc;

use chrono::{Duration, NaiveDate, Utc};
use cot_ingestor::models::price::PriceBar;
use cot_ingestor::providers::tickers::TickerMap;
use cot_ingestor::providers::PriceProvider;
use futures::stream::{self, StreamExt};
use indexmap::IndexMap;
use tracing::{info, warn};

pub use cache::{Clock, PriceCache, DEFAULT_TTL_HOURS};

/// Bars by market code.
pub type PriceData = IndexMap<String, Vec<PriceBar>>;

pub const DEFAULT_PRICE_YEARS: u32 = 3;
pub const DEFAULT_PRICE_WORKERS: usize = 8;

pub struct PriceService {
    provider: Arc<dyn PriceProvider>,
    tickers: TickerMap,
    cache: Arc<PriceCache>,
    years: u32,
    workers: usize,
}

impl PriceService {
    pub fn new(provider: Arc<dyn PriceProvider>, cache: Arc<PriceCache>) -> Self {
        Self {
            provider,
            tickers: TickerMap::default(),
            cache,
            years: DEFAULT_PRICE_YEARS,
            workers: DEFAULT_PRICE_WORKERS,
        }
    }

    pub fn with_tickers(mut self, tickers: TickerMap) -> Self {
        self.tickers = tickers;
        self
    }

    /// Lookback in years.
    pub fn with_years(mut self, years: u32) -> Self {
        self.years = years.max(1);
        self
    }

    /// Concurrent ticker fetches.
    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers.max(1);
        self
    }

    pub fn cache(&self) -> &Arc<PriceCache> {
        &self.cache
    }

    fn window(&self) -> (NaiveDate, NaiveDate) {
        let end = Utc::now().date_naive();
        let start = end - Duration::days(i64::from(self.years) * 365 + 30);
        (start, end)
    }

    /// Fetches fresh bars for every mapped code and refreshes the cache.
    ///
    /// Codes without a ticker, tickers that fail, and tickers with no bars are left
    /// out of the result.
    pub async fn refresh_all(&self, codes: &[String]) -> PriceData {
        let grouped = self.tickers.group_by_ticker(codes.iter().map(String::as_str));
        let eligible: usize = grouped.values().map(Vec::len).sum();
        info!(
            markets = eligible,
            requested = codes.len(),
            tickers = grouped.len(),
            "fetching prices"
        );

        let (start, end) = self.window();
        let provider = &self.provider;
        let fetched: Vec<_> = stream::iter(grouped)
            .map(|(ticker, markets)| async move {
                let result = provider.fetch_daily(&ticker, start, end).await;
                (ticker, markets, result)
            })
            .buffer_unordered(self.workers)
            .collect()
            .await;

        let mut data = PriceData::new();
        for (ticker, markets, result) in fetched {
            match result {
                Ok(bars) if bars.is_empty() => {
                    warn!(%ticker, "no price data");
                }
                Ok(bars) => {
                    for code in markets {
                        self.cache.put(code.clone(), bars.clone());
                        data.insert(code, bars.clone());
                    }
                }
                Err(err) => {
                    warn!(%ticker, error = %err, "price fetch failed");
                }
            }
        }
        // Keep the caller's code order regardless of completion order.
        data.sort_by_cached_key(|code, _| codes.iter().position(|c| c == code));

        info!(markets = data.len(), eligible, "prices done");
        data
    }

    /// Fresh cached bars for `codes`, without network calls.
    pub fn cached(&self, codes: &[String]) -> PriceData {
        self.cache.get_many(codes.iter().map(String::as_str))
    }
}
