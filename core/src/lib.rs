//! Risk aggregation for spending anomaly dashboards.
//!
//! Reads per-transaction anomaly scores, derives risk fields and writes
//! the seven flat tables the dashboards render from.

pub mod aggregate;
pub mod calendar;
pub mod config;
pub mod derive;
pub mod error;
pub mod export;
pub mod feature_importance;
pub mod filter;
pub mod ingest;
pub mod pipeline;
pub mod record;
pub mod risk;
pub mod rng;
pub mod tables;
pub mod types;
