//! Smoothed (Wilder) moving average, exposed as `MMA(n)`.
//!
//! The first output is the simple average of the first n inputs; after
//! that MMA[i] = MMA[i-1] + (P[i] - MMA[i-1]) / n. Before the seed is
//! complete the value is the average of the inputs seen so far.

use crate::domain::error::{BarstreamError, require_window};
use crate::domain::indicator::{BarClock, Indicator, NumericRef, pull};
use crate::domain::num::{Num, NumFactory};
use crate::domain::ohlcv::Bar;

pub struct WilderMa<N: Num> {
    input: NumericRef<N>,
    length: usize,
    length_n: N,
    seed_sum: N,
    one: N,
    seen: N,
    clock: BarClock,
    current: N,
}

impl<N: Num> WilderMa<N> {
    pub fn new<F: NumFactory<Num = N>>(
        input: NumericRef<N>,
        length: usize,
        factory: &F,
    ) -> Result<Self, BarstreamError> {
        let length = require_window("MMA", length)?;
        Ok(Self {
            input,
            length,
            length_n: factory.from_count(length),
            seed_sum: factory.zero(),
            one: factory.one(),
            seen: factory.zero(),
            clock: BarClock::default(),
            current: factory.zero(),
        })
    }
}

impl<N: Num> Indicator<N> for WilderMa<N> {
    type Output = N;

    fn advance(&mut self, bar: &Bar<N>) {
        if !self.clock.admit(bar) {
            return;
        }
        let value = pull(&self.input, bar);
        if self.clock.seen() <= self.length {
            self.seed_sum = self.seed_sum + value;
            self.seen = self.seen + self.one;
            self.current = self.seed_sum / self.seen;
        } else {
            self.current = self.current + (value - self.current) / self.length_n;
        }
    }

    fn value(&self) -> N {
        self.current
    }

    fn is_stable(&self) -> bool {
        self.clock.seen() >= self.length
    }
}
