//! Storage, analytics, export and orchestration for CFTC Commitments of Traders data.
//!
//! [`pipeline::Pipeline`] runs the full sync; [`service::ReadService`] answers queries
//! from the same store with the same shapes as the exported artifacts.

pub mod analytics;
pub mod config;
pub mod db;
pub mod export;
pub mod models;
pub mod pipeline;
pub mod prices;
pub mod schema;
pub mod service;
pub mod store;
