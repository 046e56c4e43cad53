//! Per-bar cash flow of a trading record.
//!
//! For every position the bars after entry up to exit (or the valuation end
//! for an open position) each get a contribution: the value at entry times
//! the ratio of the cost-adjusted close to the net entry price. The exit bar
//! uses the net exit price and the full holding cost. Contributions landing
//! on the same timestamp are summed.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use tracing::debug;

use super::{add_cost, end_index, exit_price, price_ratio};
use crate::domain::num::NumFactory;
use crate::domain::record::TradingRecord;
use crate::domain::series::BarSeries;

#[derive(Debug, Clone)]
pub struct CashFlow<F: NumFactory> {
    values: BTreeMap<DateTime<Utc>, F::Num>,
    factory: F,
}

impl<F: NumFactory> CashFlow<F> {
    /// Values `record` over the whole of `series`.
    pub fn new(series: &BarSeries<F::Num>, record: &TradingRecord<F::Num>, factory: F) -> Self {
        match series.end_index() {
            Some(end) => Self::up_to(series, record, end, factory),
            None => Self {
                values: BTreeMap::new(),
                factory,
            },
        }
    }

    /// Values `record` over `series[..=final_index]`.
    pub fn up_to(
        series: &BarSeries<F::Num>,
        record: &TradingRecord<F::Num>,
        final_index: usize,
        factory: F,
    ) -> Self {
        let mut flow = Self {
            values: BTreeMap::new(),
            factory,
        };
        let Some(series_end) = series.end_index() else {
            return flow;
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
            let holding = position.holding_cost(end, &factory);
            let per_bar = holding / factory.from_count(periods);
            let base = series
                .bar(entry.index)
                .map_or(factory.one(), |b| flow.value_before(b.end));

            let mut contributions = Vec::with_capacity(periods);
            for bar in &series.bars()[entry.index + 1..end] {
                let price = add_cost(bar.close, per_bar, long);
                let ratio = price_ratio(long, entry.net_price, price, &factory);
                contributions.push((bar.end, base * ratio));
            }
            let last = &series.bars()[end];
            let exit = add_cost(exit_price(position, end, last.close), holding, long);
            let ratio = price_ratio(long, entry.net_price, exit, &factory);
            contributions.push((last.end, base * ratio));

            for (time, value) in contributions {
                flow.values
                    .entry(time)
                    .and_modify(|v| *v = *v + value)
                    .or_insert(value);
            }
        }
        debug!(points = flow.values.len(), "cash flow computed");
        flow
    }

    /// Value recorded at exactly `time`, or one when nothing was recorded.
    pub fn value_at(&self, time: DateTime<Utc>) -> F::Num {
        self.values
            .get(&time)
            .copied()
            .unwrap_or_else(|| self.factory.one())
    }

    /// Recorded values in time order.
    pub fn values(&self) -> &BTreeMap<DateTime<Utc>, F::Num> {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Value per bar of `series`, one where nothing was recorded.
    pub fn per_bar(&self, series: &BarSeries<F::Num>) -> Vec<F::Num> {
        series.bars().iter().map(|b| self.value_at(b.end)).collect()
    }

    /// Adds `other` into this flow, summing values on shared timestamps.
    /// Used to combine the flows of several records.
    pub fn merge(&mut self, other: &CashFlow<F>) {
        for (&time, &value) in &other.values {
            self.values
                .entry(time)
                .and_modify(|v| *v = *v + value)
                .or_insert(value);
        }
    }

    /// Latest value recorded at or before `time`, one if none. Sequential
    /// positions chain on this.
    fn value_before(&self, time: DateTime<Utc>) -> F::Num {
        self.values
            .range(..=time)
            .next_back()
            .map_or_else(|| self.factory.one(), |(_, v)| *v)
    }
}
