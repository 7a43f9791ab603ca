//! Stateless edge of the COT pipeline: report models, the CFTC downloader, the
//! report parser, and external price providers.

pub mod download;
pub mod models;
pub mod parse;
pub mod providers;
