//! Source indicators reading a value straight off each bar.

use std::fmt;

use crate::domain::indicator::{BarClock, Indicator};
use crate::domain::num::{Num, NumFactory};
use crate::domain::ohlcv::Bar;

/// Which bar field a [`PriceIndicator`] extracts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PriceSource {
    Open,
    High,
    Low,
    Close,
    Volume,
    /// (high + low + close) / 3
    Typical,
    /// (high + low) / 2
    Median,
}

impl fmt::Display for PriceSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PriceSource::Open => "Open",
            PriceSource::High => "High",
            PriceSource::Low => "Low",
            PriceSource::Close => "Close",
            PriceSource::Volume => "Volume",
            PriceSource::Typical => "Typical",
            PriceSource::Median => "Median",
        };
        f.write_str(name)
    }
}

/// Reports one field of the latest bar.
#[derive(Debug, Clone)]
pub struct PriceIndicator<N> {
    source: PriceSource,
    three: N,
    two: N,
    clock: BarClock,
    current: N,
}

impl<N: Num> PriceIndicator<N> {
    pub fn new<F: NumFactory<Num = N>>(source: PriceSource, factory: &F) -> Self {
        Self {
            source,
            three: factory.value_of(3.0),
            two: factory.two(),
            clock: BarClock::default(),
            current: factory.zero(),
        }
    }

    pub fn close<F: NumFactory<Num = N>>(factory: &F) -> Self {
        Self::new(PriceSource::Close, factory)
    }

    pub fn source(&self) -> PriceSource {
        self.source
    }

    fn extract(&self, bar: &Bar<N>) -> N {
        match self.source {
            PriceSource::Open => bar.open,
            PriceSource::High => bar.high,
            PriceSource::Low => bar.low,
            PriceSource::Close => bar.close,
            PriceSource::Volume => bar.volume,
            PriceSource::Typical => (bar.high + bar.low + bar.close) / self.three,
            PriceSource::Median => (bar.high + bar.low) / self.two,
        }
    }
}

impl<N: Num> Indicator<N> for PriceIndicator<N> {
    type Output = N;

    fn advance(&mut self, bar: &Bar<N>) {
        if self.clock.admit(bar) {
            self.current = self.extract(bar);
        }
    }

    fn value(&self) -> N {
        self.current
    }

    fn is_stable(&self) -> bool {
        self.clock.seen() > 0
    }
}

/// A fixed value, stable from construction.
#[derive(Debug, Clone, Copy)]
pub struct ConstantIndicator<N> {
    value: N,
}

impl<N: Num> ConstantIndicator<N> {
    pub fn new(value: N) -> Self {
        Self { value }
    }
}

impl<N: Num> Indicator<N> for ConstantIndicator<N> {
    type Output = N;

    fn advance(&mut self, _bar: &Bar<N>) {}

    fn value(&self) -> N {
        self.value
    }

    fn is_stable(&self) -> bool {
        true
    }
}
