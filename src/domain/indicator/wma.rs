//! Weighted Moving Average.
//!
//! WMA(n) = (1*P[i-n+1] + 2*P[i-n+2] + ... + n*P[i]) / (n*(n+1)/2)
//!
//! The weighted sum slides in O(1): adding `n*P[i]` and subtracting the
//! plain window sum shifts every weight down by one, which drops the
//! value leaving the window. NaN inputs count as zero in both sums and the
//! result is NaN while one is inside the window. Reports zero until the
//! window holds n values.

use crate::domain::error::{BarstreamError, require_window};
use crate::domain::indicator::ring_buffer::RingBuffer;
use crate::domain::indicator::{BarClock, Indicator, NanTally, NumericRef, pull};
use crate::domain::num::{Num, NumFactory};
use crate::domain::ohlcv::Bar;

pub struct Wma<N: Num> {
    input: NumericRef<N>,
    window: RingBuffer<N>,
    weighted_sum: N,
    window_sum: N,
    nans: NanTally<N>,
    /// Weight of the next value pushed while filling; `n` once full.
    next_weight: N,
    one: N,
    divisor: N,
    zero: N,
    clock: BarClock,
    current: N,
}

impl<N: Num> Wma<N> {
    pub fn new<F: NumFactory<Num = N>>(
        input: NumericRef<N>,
        length: usize,
        factory: &F,
    ) -> Result<Self, BarstreamError> {
        let length = require_window("WMA", length)?;
        Ok(Self {
            input,
            window: RingBuffer::new(length),
            weighted_sum: factory.zero(),
            window_sum: factory.zero(),
            nans: NanTally::new(),
            next_weight: factory.one(),
            one: factory.one(),
            divisor: factory.from_count(length * (length + 1) / 2),
            zero: factory.zero(),
            clock: BarClock::default(),
            current: factory.zero(),
        })
    }
}

impl<N: Num> Indicator<N> for Wma<N> {
    type Output = N;

    fn advance(&mut self, bar: &Bar<N>) {
        if !self.clock.admit(bar) {
            return;
        }
        let raw = pull(&self.input, bar);
        let value = self.nans.enter(raw, self.zero);

        if self.window.is_full() {
            self.weighted_sum = self.weighted_sum + self.next_weight * value - self.window_sum;
        } else {
            self.weighted_sum = self.weighted_sum + self.next_weight * value;
        }
        self.window_sum = self.window_sum + value;
        if let Some(old) = self.window.push(raw) {
            self.window_sum = self.window_sum - self.nans.leave(old, self.zero);
        }

        if self.window.is_full() {
            self.current = self.nans.mask(self.weighted_sum / self.divisor);
        } else {
            self.next_weight = self.next_weight + self.one;
            self.current = self.zero;
        }
    }

    fn value(&self) -> N {
        self.current
    }

    fn is_stable(&self) -> bool {
        self.window.is_full()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::num::DoubleFactory;
    use crate::domain::test_util::{assert_approx, bars, close_ref};
    use proptest::prelude::*;

    fn feed(length: usize, closes: &[f64]) -> Vec<f64> {
        let mut wma = Wma::new(close_ref(), length, &DoubleFactory).unwrap();
        bars(closes)
            .iter()
            .map(|b| {
                wma.advance(b);
                wma.value()
            })
            .collect()
    }

    #[test]
    fn wma_zero_period_is_invalid() {
        assert!(Wma::new(close_ref(), 0, &DoubleFactory).is_err());
    }

    #[test]
    fn wma_warmup_is_zero() {
        let out = feed(3, &[10.0, 20.0, 30.0, 40.0, 50.0]);
        assert_eq!(out[0], 0.0);
        assert_eq!(out[1], 0.0);
        assert!(out[2] > 0.0);
    }

    #[test]
    fn wma_period_1() {
        let out = feed(1, &[10.0, 20.0, 30.0]);
        assert_eq!(out, vec![10.0, 20.0, 30.0]);
    }

    #[test]
    fn wma_basic_calculation() {
        let out = feed(3, &[10.0, 20.0, 30.0]);
        let expected = (1.0 * 10.0 + 2.0 * 20.0 + 3.0 * 30.0) / 6.0;
        assert_approx!(out[2], expected);
    }

    #[test]
    fn wma_sliding_window() {
        let out = feed(3, &[10.0, 20.0, 30.0, 40.0, 15.0]);
        assert_approx!(out[3], (20.0 + 2.0 * 30.0 + 3.0 * 40.0) / 6.0);
        assert_approx!(out[4], (30.0 + 2.0 * 40.0 + 3.0 * 15.0) / 6.0);
    }

    #[test]
    fn wma_equal_prices() {
        let out = feed(4, &[100.0; 6]);
        for v in &out[3..] {
            assert_approx!(*v, 100.0);
        }
    }

    #[test]
    fn wma_matches_direct_formula() {
        let closes = [3.0, 7.5, 1.25, 9.0, 4.0, 6.5, 2.0, 8.0, 5.5];
        let length = 4;
        let out = feed(length, &closes);
        for i in (length - 1)..closes.len() {
            let window = &closes[i + 1 - length..=i];
            let expected: f64 = window
                .iter()
                .enumerate()
                .map(|(w, v)| (w + 1) as f64 * v)
                .sum::<f64>()
                / 10.0;
            assert_approx!(out[i], expected);
        }
    }

    #[test]
    fn wma_recovers_after_nan() {
        let out = feed(2, &[1.0, f64::NAN, 2.0, 3.0, 4.0, 5.0]);
        assert!(out[1].is_nan());
        assert!(out[2].is_nan());
        assert_approx!(out[3], (2.0 + 2.0 * 3.0) / 3.0);
        assert_approx!(out[5], (4.0 + 2.0 * 5.0) / 3.0);
    }

    proptest! {
        #[test]
        fn wma_matches_weighted_window(
            closes in proptest::collection::vec(
                prop_oneof![9 => -1_000.0..1_000.0f64, 1 => Just(f64::NAN)],
                1..60,
            ),
            length in 1usize..10,
        ) {
            let out = feed(length, &closes);
            let divisor = (length * (length + 1) / 2) as f64;
            for i in (length - 1)..closes.len() {
                let window = &closes[i + 1 - length..=i];
                if window.iter().any(|v| v.is_nan()) {
                    prop_assert!(out[i].is_nan(), "bar {i}: got {}", out[i]);
                } else {
                    let expected = window
                        .iter()
                        .enumerate()
                        .map(|(w, v)| (w + 1) as f64 * v)
                        .sum::<f64>()
                        / divisor;
                    prop_assert!((out[i] - expected).abs() < 1e-6, "bar {i}");
                }
            }
        }
    }
}
