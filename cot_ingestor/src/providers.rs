//! Provider abstraction for external price data.
//!
//! This module defines the [`PriceProvider`] trait, a unified interface for fetching
//! daily bars for an instrument ticker. Report markets are linked to tickers through
//! [`tickers::TickerMap`]; a market without a mapping simply gets no prices.
//!
//! The trait is designed for async usage and supports dynamic dispatch
//! (`dyn PriceProvider`) so callers and tests can swap the source.
//!
//! # Example
//!
//! ```rust
//! use async_trait::async_trait;
//! use chrono::NaiveDate;
//! use cot_ingestor::models::price::PriceBar;
//! use cot_ingestor::providers::{PriceProvider, ProviderError};
//!
//! struct NoPrices;
//!
//! #[async_trait]
//! impl PriceProvider for NoPrices {
//!     async fn fetch_daily(
//!         &self,
//!         _ticker: &str,
//!         _start: NaiveDate,
//!         _end: NaiveDate,
//!     ) -> Result<Vec<PriceBar>, ProviderError> {
//!         Ok(vec![])
//!     }
//! }
//! ```

pub mod tickers;
pub mod yahoo;

use async_trait::async_trait;
use chrono::NaiveDate;
use snafu::{Backtrace, Snafu};

use crate::models::price::PriceBar;

/// Trait for fetching daily bars from a price source.
#[async_trait]
pub trait PriceProvider: Send + Sync {
    /// Fetches daily bars for `ticker` between `start` and `end` inclusive.
    ///
    /// # Returns
    ///
    /// * `Ok(Vec<PriceBar>)` - Bars sorted oldest first. May be empty.
    /// * `Err(ProviderError)` - If the request fails or the response is unusable.
    async fn fetch_daily(
        &self,
        ticker: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<PriceBar>, ProviderError>;
}

/// Errors that can occur during the creation of a provider instance
#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum ProviderInitError {
    /// failed to init reqwest client
    #[snafu(display("Failed to build HTTP client: {source}"))]
    ClientBuild {
        source: reqwest::Error,
        backtrace: Backtrace,
    },
}

/// Errors that can occur within a `PriceProvider` implementation.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum ProviderError {
    /// An error during an API request (e.g., network failure, timeout).
    #[snafu(display("API request failed: {source}"))]
    Reqwest {
        source: reqwest::Error,
        backtrace: Backtrace,
    },

    /// The provider answered with a non-success status.
    #[snafu(display("API returned HTTP {status} for {ticker}"))]
    Status {
        ticker: String,
        status: u16,
        backtrace: Backtrace,
    },

    /// The provider's API returned a specific error message (e.g., unknown symbol).
    #[snafu(display("API error: {message}"))]
    Api {
        message: String,
        backtrace: Backtrace,
    },

    /// The response did not have the expected shape.
    #[snafu(display("Unexpected response format: {message}"))]
    Format {
        message: String,
        backtrace: Backtrace,
    },
}
