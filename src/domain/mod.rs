//! Core domain types and logic.

pub mod num;
pub mod error;
pub mod ohlcv;
pub mod series;
pub mod indicator;
pub mod indicator_helpers;
pub mod context;
pub mod position;
pub mod record;
pub mod valuation;
pub mod metrics;
pub mod config_validation;

#[cfg(test)]
pub(crate) mod test_util;
