//! Tygia Library
//!
//! Exchange rate and gold price aggregation for Vietnamese banks and gold dealers

pub mod config;
pub mod logging;
pub mod rates;
pub mod report;
pub mod types;

#[cfg(feature = "api")]
pub mod api;
