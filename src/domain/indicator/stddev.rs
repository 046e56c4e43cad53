//! Standard Deviation indicator.
//!
//! Population standard deviation over n input values, the square root of
//! [`Variance`]. Shares the variance's partial-window behaviour.

use crate::domain::error::BarstreamError;
use crate::domain::indicator::covariance::Variance;
use crate::domain::indicator::{Indicator, NumericRef};
use crate::domain::num::{Num, NumFactory};
use crate::domain::ohlcv::Bar;

pub struct StandardDeviation<N: Num> {
    variance: Variance<N>,
    zero: N,
}

impl<N: Num> StandardDeviation<N> {
    pub fn new<F: NumFactory<Num = N>>(
        input: NumericRef<N>,
        length: usize,
        factory: &F,
    ) -> Result<Self, BarstreamError> {
        Ok(Self {
            variance: Variance::new(input, length, factory)?,
            zero: factory.zero(),
        })
    }
}

impl<N: Num> Indicator<N> for StandardDeviation<N> {
    type Output = N;

    fn advance(&mut self, bar: &Bar<N>) {
        self.variance.advance(bar);
    }

    fn value(&self) -> N {
        let variance = self.variance.value();
        if variance.is_nan() {
            return variance;
        }
        // rounding can leave a flat window marginally negative
        variance.max(self.zero).sqrt()
    }

    fn is_stable(&self) -> bool {
        self.variance.is_stable()
    }
}
