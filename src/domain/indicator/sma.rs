//! Simple Moving Average.
//!
//! SMA(n) = (P[i-n+1] + ... + P[i]) / n, maintained with a running sum.
//! Reports zero until the window holds n values, and NaN while a NaN input
//! is inside the window.

use crate::domain::error::{BarstreamError, require_window};
use crate::domain::indicator::ring_buffer::RingBuffer;
use crate::domain::indicator::{BarClock, Indicator, NanTally, NumericRef, pull};
use crate::domain::num::{Num, NumFactory};
use crate::domain::ohlcv::Bar;

pub struct Sma<N: Num> {
    input: NumericRef<N>,
    window: RingBuffer<N>,
    sum: N,
    nans: NanTally<N>,
    length: N,
    zero: N,
    clock: BarClock,
    current: N,
}

impl<N: Num> Sma<N> {
    pub fn new<F: NumFactory<Num = N>>(
        input: NumericRef<N>,
        length: usize,
        factory: &F,
    ) -> Result<Self, BarstreamError> {
        let length = require_window("SMA", length)?;
        Ok(Self {
            input,
            window: RingBuffer::new(length),
            sum: factory.zero(),
            nans: NanTally::new(),
            length: factory.from_count(length),
            zero: factory.zero(),
            clock: BarClock::default(),
            current: factory.zero(),
        })
    }
}

impl<N: Num> Indicator<N> for Sma<N> {
    type Output = N;

    fn advance(&mut self, bar: &Bar<N>) {
        if !self.clock.admit(bar) {
            return;
        }
        let value = pull(&self.input, bar);
        self.sum = self.sum + self.nans.enter(value, self.zero);
        if let Some(old) = self.window.push(value) {
            self.sum = self.sum - self.nans.leave(old, self.zero);
        }
        self.current = if self.window.is_full() {
            self.nans.mask(self.sum / self.length)
        } else {
            self.zero
        };
    }

    fn value(&self) -> N {
        self.current
    }

    fn is_stable(&self) -> bool {
        self.window.is_full()
    }
}
