//! Realized cash flow: the record's value at position boundaries only.
//!
//! A point is recorded at each entry (the value carried into the position)
//! and each exit (that value times the realized ratio). Between points the
//! value is interpolated linearly over elapsed time; outside them it is
//! clamped to the nearest boundary.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use tracing::debug;

use crate::domain::num::{Num, NumFactory};
use crate::domain::position::Position;
use crate::domain::record::TradingRecord;
use crate::domain::series::BarSeries;

#[derive(Debug, Clone)]
pub struct RealizedCashFlow<F: NumFactory> {
    points: BTreeMap<DateTime<Utc>, F::Num>,
    factory: F,
}

impl<F: NumFactory> RealizedCashFlow<F> {
    /// Values `record` with open positions marked at the last bar of
    /// `series`.
    pub fn new(series: &BarSeries<F::Num>, record: &TradingRecord<F::Num>, factory: F) -> Self {
        let evaluation = series
            .end_index()
            .and_then(|i| series.bar(i).map(|b| (b.end, i)));
        Self::build(record, evaluation, factory)
    }

    /// Values `record` with open positions marked at `time`, the end of
    /// bar `index`.
    pub fn at(
        record: &TradingRecord<F::Num>,
        time: DateTime<Utc>,
        index: usize,
        factory: F,
    ) -> Self {
        Self::build(record, Some((time, index)), factory)
    }

    fn build(
        record: &TradingRecord<F::Num>,
        evaluation: Option<(DateTime<Utc>, usize)>,
        factory: F,
    ) -> Self {
        let mut flow = Self {
            points: BTreeMap::new(),
            factory,
        };
        for position in record.positions() {
            let entry = position.entry();
            let base = flow.carried_value(entry.time);
            flow.points.entry(entry.time).or_insert(base);

            match (position.exit(), evaluation) {
                (Some(exit), _) => {
                    let ratio = realized_ratio(position, exit.net_price, &factory);
                    flow.points.insert(exit.time, base * ratio);
                }
                (None, Some((time, index))) if time > entry.time => {
                    let holding = position.holding_cost(index, &factory);
                    let marked = if position.is_long() {
                        entry.net_price - holding
                    } else {
                        entry.net_price + holding
                    };
                    let ratio = realized_ratio(position, marked, &factory);
                    flow.points.insert(time, base * ratio);
                }
                (None, _) => {}
            }
        }
        debug!(points = flow.points.len(), "realized cash flow computed");
        flow
    }

    /// Value at `time`: interpolated between the surrounding points, the
    /// boundary value outside them, one when nothing was recorded.
    pub fn value_at(&self, time: DateTime<Utc>) -> F::Num {
        let before = self.points.range(..=time).next_back();
        let after = self.points.range(time..).next();
        match (before, after) {
            (None, None) => self.factory.one(),
            (Some((_, v)), None) | (None, Some((_, v))) => *v,
            (Some((&t0, &v0)), Some((&t1, &v1))) => {
                if t0 == t1 {
                    return v0;
                }
                let elapsed = (time - t0).num_milliseconds().unsigned_abs() as usize;
                let span = (t1 - t0).num_milliseconds().unsigned_abs() as usize;
                if span == 0 {
                    return v0;
                }
                let f = &self.factory;
                v0 + (v1 - v0) * f.from_count(elapsed) / f.from_count(span)
            }
        }
    }

    /// Recorded boundary points in time order.
    pub fn points(&self) -> &BTreeMap<DateTime<Utc>, F::Num> {
        &self.points
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Latest recorded value at or before `time`, one if none.
    fn carried_value(&self, time: DateTime<Utc>) -> F::Num {
        self.points
            .range(..=time)
            .next_back()
            .map_or_else(|| self.factory.one(), |(_, v)| *v)
    }
}

/// Long: `exit/entry`. Short: `1 + (entry − exit)/entry`. One for a zero
/// entry price.
fn realized_ratio<N: Num, F: NumFactory<Num = N>>(
    position: &Position<N>,
    exit: N,
    factory: &F,
) -> N {
    let entry = position.entry().net_price;
    if entry.is_zero() {
        return factory.one();
    }
    if position.is_long() {
        exit / entry
    } else {
        factory.one() + (entry - exit) / entry
    }
}
