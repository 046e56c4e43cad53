//! Sum of the last n input values, NaN while the window holds a NaN.

use crate::domain::error::{BarstreamError, require_window};
use crate::domain::indicator::ring_buffer::RingBuffer;
use crate::domain::indicator::{BarClock, Indicator, NanTally, NumericRef, pull};
use crate::domain::num::{Num, NumFactory};
use crate::domain::ohlcv::Bar;

/// Running sum with trailing eviction. While the window fills, the value is
/// the sum of everything seen so far.
pub struct RunningTotal<N: Num> {
    input: NumericRef<N>,
    window: RingBuffer<N>,
    sum: N,
    nans: NanTally<N>,
    zero: N,
    clock: BarClock,
}

impl<N: Num> RunningTotal<N> {
    pub fn new<F: NumFactory<Num = N>>(
        input: NumericRef<N>,
        length: usize,
        factory: &F,
    ) -> Result<Self, BarstreamError> {
        let length = require_window("RUNNING_TOTAL", length)?;
        Ok(Self {
            input,
            window: RingBuffer::new(length),
            sum: factory.zero(),
            nans: NanTally::new(),
            zero: factory.zero(),
            clock: BarClock::default(),
        })
    }
}

impl<N: Num> Indicator<N> for RunningTotal<N> {
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
    }

    fn value(&self) -> N {
        self.nans.mask(self.sum)
    }

    fn is_stable(&self) -> bool {
        self.window.is_full()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::num::DoubleFactory;
    use crate::domain::test_util::{bar, bars, close_ref};
    use proptest::prelude::*;

    #[test]
    fn sums_trailing_window() {
        let mut total = RunningTotal::new(close_ref(), 3, &DoubleFactory).unwrap();
        let out: Vec<f64> = bars(&[1.0, 2.0, 3.0, 4.0, 10.0])
            .iter()
            .map(|b| {
                total.advance(b);
                total.value()
            })
            .collect();
        assert_eq!(out, vec![1.0, 3.0, 6.0, 9.0, 17.0]);
        assert!(total.is_stable());
    }

    #[test]
    fn each_bar_contributes_once() {
        let mut total = RunningTotal::new(close_ref(), 5, &DoubleFactory).unwrap();
        for _ in 0..3 {
            total.advance(&bar(2.0, 1));
        }
        total.advance(&bar(3.0, 2));
        assert_eq!(total.value(), 5.0);
        assert!(!total.is_stable());
    }

    #[test]
    fn zero_window_rejected() {
        assert!(RunningTotal::new(close_ref(), 0, &DoubleFactory).is_err());
    }

    #[test]
    fn recovers_once_nan_leaves() {
        let mut total = RunningTotal::new(close_ref(), 2, &DoubleFactory).unwrap();
        let out: Vec<f64> = bars(&[1.0, f64::NAN, 2.0, 3.0, 4.0, 5.0])
            .iter()
            .map(|b| {
                total.advance(b);
                total.value()
            })
            .collect();
        assert!(out[1].is_nan());
        assert!(out[2].is_nan());
        assert_eq!(out[3..], [5.0, 7.0, 9.0]);
    }

    proptest! {
        #[test]
        fn matches_trailing_sum(
            closes in proptest::collection::vec(
                prop_oneof![9 => -1_000.0..1_000.0f64, 1 => Just(f64::NAN)],
                1..60,
            ),
            length in 1usize..10,
        ) {
            let mut total = RunningTotal::new(close_ref(), length, &DoubleFactory).unwrap();
            for (i, b) in bars(&closes).iter().enumerate() {
                total.advance(b);
                let window = &closes[(i + 1).saturating_sub(length)..=i];
                if window.iter().any(|v| v.is_nan()) {
                    prop_assert!(total.value().is_nan(), "bar {i}: got {}", total.value());
                } else {
                    let sum = window.iter().sum::<f64>();
                    prop_assert!((total.value() - sum).abs() < 1e-6, "bar {i}");
                }
            }
        }
    }
}
