//! Per-bar returns of a trading record.
//!
//! Each bar inside a position (after the entry bar up to its exit) gets the
//! return from the previous price to its holding-cost-adjusted close. The
//! holding cost is spread evenly over the held bars. Returns of short
//! positions are negated. Bars outside every position have a zero return.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use tracing::debug;

use super::{add_cost, end_index, exit_price};
use crate::domain::error::BarstreamError;
use crate::domain::num::{Num, NumFactory};
use crate::domain::record::TradingRecord;
use crate::domain::series::BarSeries;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReturnType {
    /// `ln(new/old)`
    #[default]
    Log,
    /// `new/old − 1`
    Arithmetic,
}

impl ReturnType {
    /// Return of moving from `old` to `new`; zero when `old` is zero.
    pub fn calculate<N: Num, F: NumFactory<Num = N>>(self, new: N, old: N, factory: &F) -> N {
        if old.is_zero() {
            return factory.zero();
        }
        let ratio = new / old;
        match self {
            ReturnType::Log => ratio.ln(),
            ReturnType::Arithmetic => ratio - factory.one(),
        }
    }
}

impl FromStr for ReturnType {
    type Err = BarstreamError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "log" => Ok(ReturnType::Log),
            "arithmetic" => Ok(ReturnType::Arithmetic),
            other => Err(BarstreamError::invalid_parameter(
                "return_type",
                format!("expected 'log' or 'arithmetic', got '{other}'"),
            )),
        }
    }
}

impl fmt::Display for ReturnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReturnType::Log => write!(f, "log"),
            ReturnType::Arithmetic => write!(f, "arithmetic"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Returns<F: NumFactory> {
    values: BTreeMap<DateTime<Utc>, F::Num>,
    return_type: ReturnType,
    factory: F,
}

impl<F: NumFactory> Returns<F> {
    pub fn new(
        series: &BarSeries<F::Num>,
        record: &TradingRecord<F::Num>,
        return_type: ReturnType,
        factory: F,
    ) -> Self {
        match series.end_index() {
            Some(end) => Self::up_to(series, record, end, return_type, factory),
            None => Self {
                values: BTreeMap::new(),
                return_type,
                factory,
            },
        }
    }

    /// Returns of `record` over `series[..=final_index]`.
    pub fn up_to(
        series: &BarSeries<F::Num>,
        record: &TradingRecord<F::Num>,
        final_index: usize,
        return_type: ReturnType,
        factory: F,
    ) -> Self {
        let mut returns = Self {
            values: BTreeMap::new(),
            return_type,
            factory,
        };
        let Some(series_end) = series.end_index() else {
            return returns;
        };
        let final_index = final_index.min(series_end);

        for position in record.positions() {
            let entry = position.entry();
            if entry.index >= final_index {
                continue;
            }
            let end = end_index(position, final_index);
            let periods = end - entry.index;
            if periods == 0 {
                continue;
            }
            let long = position.is_long();
            let average_cost =
                position.holding_cost(end, &factory) / factory.from_count(periods);

            let mut last_price = entry.net_price;
            for bar in &series.bars()[entry.index + 1..end] {
                let price = add_cost(bar.close, average_cost, long);
                returns.add(bar.end, returns.directed(price, last_price, long));
                last_price = bar.close;
            }
            let last = &series.bars()[end];
            let exit = add_cost(exit_price(position, end, last.close), average_cost, long);
            returns.add(last.end, returns.directed(exit, last_price, long));
        }
        debug!(
            points = returns.values.len(),
            return_type = %return_type,
            "returns computed"
        );
        returns
    }

    /// Return recorded at exactly `time`, zero when nothing was recorded.
    pub fn value_at(&self, time: DateTime<Utc>) -> F::Num {
        self.values
            .get(&time)
            .copied()
            .unwrap_or_else(|| self.factory.zero())
    }

    pub fn values(&self) -> &BTreeMap<DateTime<Utc>, F::Num> {
        &self.values
    }

    pub fn return_type(&self) -> ReturnType {
        self.return_type
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Return per bar of `series`, zero outside positions.
    pub fn per_bar(&self, series: &BarSeries<F::Num>) -> Vec<F::Num> {
        series.bars().iter().map(|b| self.value_at(b.end)).collect()
    }

    fn directed(&self, new: F::Num, old: F::Num, long: bool) -> F::Num {
        let r = self.return_type.calculate(new, old, &self.factory);
        if long { r } else { self.factory.zero() - r }
    }

    fn add(&mut self, time: DateTime<Utc>, value: F::Num) {
        self.values
            .entry(time)
            .and_modify(|v| *v = *v + value)
            .or_insert(value);
    }
}
