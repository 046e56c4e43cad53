//! Ordered bar storage read by the valuation engine.

use chrono::{DateTime, Utc};
use tracing::{debug, warn};

use super::num::Num;
use super::ohlcv::Bar;

/// Bars of one instrument and timeframe with strictly increasing end times.
#[derive(Debug, Clone)]
pub struct BarSeries<N> {
    name: String,
    bars: Vec<Bar<N>>,
}

impl<N: Num> BarSeries<N> {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            bars: Vec::new(),
        }
    }

    /// Builds a series, dropping bars that do not advance the end time.
    pub fn from_bars(name: impl Into<String>, bars: impl IntoIterator<Item = Bar<N>>) -> Self {
        let mut series = Self::new(name);
        for bar in bars {
            series.add_bar(bar);
        }
        debug!(name = %series.name, bars = series.len(), "bar series built");
        series
    }

    /// Appends a bar. Returns `false` and leaves the series untouched when
    /// the bar's end time is not after the last stored one.
    pub fn add_bar(&mut self, bar: Bar<N>) -> bool {
        if let Some(last) = self.bars.last() {
            if bar.end <= last.end {
                warn!(
                    name = %self.name,
                    last = %last.end,
                    got = %bar.end,
                    "ignoring bar that does not advance the series"
                );
                return false;
            }
        }
        self.bars.push(bar);
        true
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn len(&self) -> usize {
        self.bars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    pub fn bar(&self, index: usize) -> Option<&Bar<N>> {
        self.bars.get(index)
    }

    pub fn bars(&self) -> &[Bar<N>] {
        &self.bars
    }

    pub fn last(&self) -> Option<&Bar<N>> {
        self.bars.last()
    }

    /// Index of the last bar, `None` for an empty series.
    pub fn end_index(&self) -> Option<usize> {
        self.bars.len().checked_sub(1)
    }

    /// Index of the bar whose end time equals `time`.
    pub fn index_of(&self, time: DateTime<Utc>) -> Option<usize> {
        self.bars.binary_search_by_key(&time, |b| b.end).ok()
    }
}
