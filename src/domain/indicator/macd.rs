//! MACD (Moving Average Convergence Divergence).
//!
//! MACD Line = EMA(short) - EMA(long), both over one shared input.
//! Signal Line = EMA(signal) of the MACD line, built with [`signal_line`].
//! Histogram = MACD Line - Signal Line.

use std::rc::Rc;

use crate::domain::error::BarstreamError;
use crate::domain::indicator::ema::Ema;
use crate::domain::indicator::{BarClock, Indicator, NumericRef};
use crate::domain::num::{Num, NumFactory};
use crate::domain::ohlcv::Bar;

pub const DEFAULT_SHORT: usize = 12;
pub const DEFAULT_LONG: usize = 26;
pub const DEFAULT_SIGNAL: usize = 9;

pub struct Macd<N: Num> {
    short: Ema<N>,
    long: Ema<N>,
    clock: BarClock,
    current: N,
}

impl<N: Num> Macd<N> {
    pub fn new<F: NumFactory<Num = N>>(
        input: NumericRef<N>,
        short: usize,
        long: usize,
        factory: &F,
    ) -> Result<Self, BarstreamError> {
        if short >= long {
            return Err(BarstreamError::invalid_parameter(
                "MACD",
                format!("short period {short} must be below long period {long}"),
            ));
        }
        Ok(Self {
            short: Ema::new(Rc::clone(&input), short, factory)?,
            long: Ema::new(input, long, factory)?,
            clock: BarClock::default(),
            current: factory.zero(),
        })
    }

    pub fn with_defaults<F: NumFactory<Num = N>>(
        input: NumericRef<N>,
        factory: &F,
    ) -> Result<Self, BarstreamError> {
        Self::new(input, DEFAULT_SHORT, DEFAULT_LONG, factory)
    }
}

impl<N: Num> Indicator<N> for Macd<N> {
    type Output = N;

    fn advance(&mut self, bar: &Bar<N>) {
        if !self.clock.admit(bar) {
            return;
        }
        self.short.advance(bar);
        self.long.advance(bar);
        self.current = self.short.value() - self.long.value();
    }

    fn value(&self) -> N {
        self.current
    }

    fn is_stable(&self) -> bool {
        self.long.is_stable()
    }
}

/// EMA of a MACD line shared through `macd`.
pub fn signal_line<N: Num, F: NumFactory<Num = N>>(
    macd: NumericRef<N>,
    length: usize,
    factory: &F,
) -> Result<Ema<N>, BarstreamError> {
    Ema::new(macd, length, factory)
}

/// MACD line minus its signal line.
pub struct MacdHistogram<N: Num> {
    macd: NumericRef<N>,
    signal: Ema<N>,
    clock: BarClock,
    current: N,
}

impl<N: Num> MacdHistogram<N> {
    pub fn new<F: NumFactory<Num = N>>(
        macd: NumericRef<N>,
        signal: usize,
        factory: &F,
    ) -> Result<Self, BarstreamError> {
        Ok(Self {
            signal: signal_line(Rc::clone(&macd), signal, factory)?,
            macd,
            clock: BarClock::default(),
            current: factory.zero(),
        })
    }
}

impl<N: Num> Indicator<N> for MacdHistogram<N> {
    type Output = N;

    fn advance(&mut self, bar: &Bar<N>) {
        if !self.clock.admit(bar) {
            return;
        }
        self.signal.advance(bar);
        self.current = self.macd.borrow().value() - self.signal.value();
    }

    fn value(&self) -> N {
        self.current
    }

    fn is_stable(&self) -> bool {
        self.macd.borrow().is_stable() && self.signal.is_stable()
    }
}
