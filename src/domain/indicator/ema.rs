//! Exponential Moving Average.
//!
//! k = 2/(n+1); EMA[0] = P[0], then EMA[i] = EMA[i-1] + k*(P[i] - EMA[i-1]).
//! Values are produced from the first bar; the indicator is stable once n
//! bars have been seen.

use crate::domain::error::{BarstreamError, require_window};
use crate::domain::indicator::{BarClock, Indicator, NumericRef, pull};
use crate::domain::num::{Num, NumFactory};
use crate::domain::ohlcv::Bar;

pub struct Ema<N: Num> {
    input: NumericRef<N>,
    length: usize,
    multiplier: N,
    clock: BarClock,
    current: N,
}

impl<N: Num> Ema<N> {
    pub fn new<F: NumFactory<Num = N>>(
        input: NumericRef<N>,
        length: usize,
        factory: &F,
    ) -> Result<Self, BarstreamError> {
        let length = require_window("EMA", length)?;
        Ok(Self {
            input,
            length,
            multiplier: factory.two() / (factory.from_count(length) + factory.one()),
            clock: BarClock::default(),
            current: factory.zero(),
        })
    }

    pub fn length(&self) -> usize {
        self.length
    }
}

impl<N: Num> Indicator<N> for Ema<N> {
    type Output = N;

    fn advance(&mut self, bar: &Bar<N>) {
        if !self.clock.admit(bar) {
            return;
        }
        let value = pull(&self.input, bar);
        self.current = if self.clock.seen() == 1 {
            value
        } else {
            self.current + self.multiplier * (value - self.current)
        };
    }

    fn value(&self) -> N {
        self.current
    }

    fn is_stable(&self) -> bool {
        self.clock.seen() >= self.length
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::num::DoubleFactory;
    use crate::domain::test_util::{assert_approx, bar, bars, close_ref};

    fn ema(length: usize) -> Ema<f64> {
        Ema::new(close_ref(), length, &DoubleFactory).unwrap()
    }

    #[test]
    fn ema_zero_period_is_invalid() {
        assert!(Ema::new(close_ref(), 0, &DoubleFactory).is_err());
    }

    #[test]
    fn ema_seeds_with_first_value() {
        let mut ema = ema(3);
        ema.advance(&bar(10.0, 1));
        assert_eq!(ema.value(), 10.0);
        assert!(!ema.is_stable());
    }

    #[test]
    fn ema_recursion() {
        let mut ema = ema(3);
        for b in bars(&[10.0, 20.0, 30.0]) {
            ema.advance(&b);
        }
        // k = 0.5: 10 -> 15 -> 22.5
        assert_approx!(ema.value(), 22.5);
        assert!(ema.is_stable());
    }

    #[test]
    fn ema_constant_input() {
        let mut ema = ema(5);
        for b in bars(&[42.0; 10]) {
            ema.advance(&b);
        }
        assert_approx!(ema.value(), 42.0);
    }

    #[test]
    fn ema_ignores_repeated_bar() {
        let mut ema = ema(3);
        ema.advance(&bar(10.0, 1));
        ema.advance(&bar(10.0, 2));
        ema.advance(&bar(99.0, 2));
        assert_approx!(ema.value(), 10.0);
    }
}
