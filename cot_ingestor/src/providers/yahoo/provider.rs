use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate};
use reqwest::Client;
use snafu::{OptionExt, ResultExt};
use tracing::{debug, info, warn};

use crate::models::price::PriceBar;
use crate::providers::{
    ApiSnafu, ClientBuildSnafu, FormatSnafu, PriceProvider, ProviderError, ProviderInitError,
    ReqwestSnafu, StatusSnafu,
    yahoo::response::{ChartData, ChartResponse},
};

/// Default chart API host.
pub const YAHOO_BASE_URL: &str = "https://query2.finance.yahoo.com";

pub struct YahooProvider {
    client: Client,
    base_url: String,
}

impl YahooProvider {
    /// Creates a provider against `base_url` (use [`YAHOO_BASE_URL`] in production).
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, ProviderInitError> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent("Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36")
            .build()
            .context(ClientBuildSnafu)?;
        Ok(Self {
            client,
            base_url: base_url.into(),
        })
    }

    fn chart_url(&self, ticker: &str) -> String {
        format!(
            "{}/v8/finance/chart/{ticker}",
            self.base_url.trim_end_matches('/')
        )
    }
}

#[async_trait]
impl PriceProvider for YahooProvider {
    async fn fetch_daily(
        &self,
        ticker: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<PriceBar>, ProviderError> {
        let period1 = start.and_time(chrono::NaiveTime::MIN).and_utc().timestamp();
        let period2 = end
            .succ_opt()
            .unwrap_or(end)
            .and_time(chrono::NaiveTime::MIN)
            .and_utc()
            .timestamp();

        let url = self.chart_url(ticker);
        debug!(%url, ticker, "requesting chart");
        let response = self
            .client
            .get(&url)
            .query(&[
                ("period1", period1.to_string()),
                ("period2", period2.to_string()),
                ("interval", "1d".to_string()),
            ])
            .send()
            .await
            .context(ReqwestSnafu)?;

        if !response.status().is_success() {
            return StatusSnafu {
                ticker,
                status: response.status().as_u16(),
            }
            .fail();
        }

        let chart = response.json::<ChartResponse>().await.context(ReqwestSnafu)?;
        let bars = parse_chart(ticker, chart)?;
        info!(ticker, bars = bars.len(), "daily bars");
        Ok(bars)
    }
}

fn parse_chart(ticker: &str, resp: ChartResponse) -> Result<Vec<PriceBar>, ProviderError> {
    if let Some(err) = resp.chart.error {
        return ApiSnafu {
            message: format!("{ticker}: {}: {}", err.code, err.description),
        }
        .fail();
    }
    let data: ChartData = resp
        .chart
        .result
        .and_then(|r| r.into_iter().next())
        .context(FormatSnafu {
            message: "empty result with no error",
        })?;

    let Some(timestamps) = data.timestamp else {
        warn!(ticker, "chart has no timestamps");
        return Ok(Vec::new());
    };
    let quote = data
        .indicators
        .quote
        .into_iter()
        .next()
        .context(FormatSnafu {
            message: "no quote data",
        })?;

    let mut bars = Vec::with_capacity(timestamps.len());
    for (i, &ts) in timestamps.iter().enumerate() {
        let date = DateTime::from_timestamp(ts, 0)
            .map(|dt| dt.date_naive())
            .context(FormatSnafu {
                message: format!("invalid timestamp: {ts}"),
            })?;
        let field = |v: &Vec<Option<f64>>| v.get(i).copied().flatten();
        // Holidays come back as all-null rows.
        let (Some(open), Some(high), Some(low), Some(close)) = (
            field(&quote.open),
            field(&quote.high),
            field(&quote.low),
            field(&quote.close),
        ) else {
            continue;
        };
        bars.push(PriceBar {
            date,
            open: round4(open),
            high: round4(high),
            low: round4(low),
            close: round4(close),
            volume: quote.volume.get(i).copied().flatten().unwrap_or(0),
        });
    }
    Ok(bars)
}

/// Four-decimal rounding of the exact stored value.
fn round4(v: f64) -> f64 {
    format!("{v:.4}").parse().unwrap_or(v)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chart(json: serde_json::Value) -> ChartResponse {
        serde_json::from_value(json).unwrap()
    }

    #[test]
    fn null_rows_are_skipped_and_prices_rounded() {
        let resp = chart(serde_json::json!({
            "chart": {
                "result": [{
                    "timestamp": [1704412800, 1704499200, 1704758400],
                    "indicators": {"quote": [{
                        "open": [2040.123456, null, 2050.0],
                        "high": [2050.0, null, 2060.0],
                        "low": [2030.0, null, 2045.0],
                        "close": [2045.55556, null, 2055.0],
                        "volume": [1200, null, null]
                    }]}
                }],
                "error": null
            }
        }));
        let bars = parse_chart("GC=F", resp).unwrap();
        assert_eq!(bars.len(), 2);
        assert_eq!(bars[0].date, NaiveDate::from_ymd_opt(2024, 1, 5).unwrap());
        assert_eq!(bars[0].open, 2040.1235);
        assert_eq!(bars[0].close, 2045.5556);
        assert_eq!(bars[1].volume, 0);
    }

    #[test]
    fn api_error_is_reported() {
        let resp = chart(serde_json::json!({
            "chart": {"result": null, "error": {"code": "Not Found", "description": "No data found"}}
        }));
        let err = parse_chart("XX=F", resp).unwrap_err();
        assert!(matches!(err, ProviderError::Api { .. }));
        assert!(err.to_string().contains("Not Found"));
    }
}
