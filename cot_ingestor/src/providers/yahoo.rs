//! Yahoo Finance v8 chart API.

pub mod provider;
pub mod response;

pub use provider::{YAHOO_BASE_URL, YahooProvider};
