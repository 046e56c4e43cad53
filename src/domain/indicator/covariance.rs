//! Incremental covariance, variance and correlation over a trailing window.
//!
//! Covariance keeps the raw `(x, y)` pairs plus running `Σx`, `Σy`, `Σxy`
//! and reports `Σxy/n − (Σx/n)(Σy/n)` with `n` the number of pairs held, so
//! the value is defined (though unstable) before the window fills. A pair
//! with a NaN side stays out of the sums and the result is NaN while it is
//! inside the window.

use std::collections::VecDeque;
use std::rc::Rc;

use crate::domain::error::{BarstreamError, require_window};
use crate::domain::indicator::{BarClock, Indicator, NanTally, NumericRef, pull};
use crate::domain::num::{Num, NumFactory};
use crate::domain::ohlcv::Bar;

pub struct Covariance<N: Num> {
    first: NumericRef<N>,
    second: NumericRef<N>,
    length: usize,
    pairs: VecDeque<(N, N)>,
    sum_x: N,
    sum_y: N,
    sum_xy: N,
    count: N,
    nans: NanTally<N>,
    one: N,
    zero: N,
    clock: BarClock,
    current: N,
}

impl<N: Num> Covariance<N> {
    pub fn new<F: NumFactory<Num = N>>(
        first: NumericRef<N>,
        second: NumericRef<N>,
        length: usize,
        factory: &F,
    ) -> Result<Self, BarstreamError> {
        let length = require_window("COVARIANCE", length)?;
        Ok(Self {
            first,
            second,
            length,
            pairs: VecDeque::with_capacity(length + 1),
            sum_x: factory.zero(),
            sum_y: factory.zero(),
            sum_xy: factory.zero(),
            count: factory.zero(),
            nans: NanTally::new(),
            one: factory.one(),
            zero: factory.zero(),
            clock: BarClock::default(),
            current: factory.zero(),
        })
    }
}

impl<N: Num> Indicator<N> for Covariance<N> {
    type Output = N;

    fn advance(&mut self, bar: &Bar<N>) {
        if !self.clock.admit(bar) {
            return;
        }
        let x = pull(&self.first, bar);
        // variance passes the same input twice; it is already advanced
        let y = if Rc::ptr_eq(&self.first, &self.second) {
            x
        } else {
            pull(&self.second, bar)
        };

        self.pairs.push_back((x, y));
        let side = nan_side(x, y);
        self.nans.enter(side, self.zero);
        if !side.is_nan() {
            self.sum_x = self.sum_x + x;
            self.sum_y = self.sum_y + y;
            self.sum_xy = self.sum_xy + x * y;
        }
        self.count = self.count + self.one;

        if self.pairs.len() > self.length {
            if let Some((ox, oy)) = self.pairs.pop_front() {
                if !nan_side(ox, oy).is_nan() {
                    self.sum_x = self.sum_x - ox;
                    self.sum_y = self.sum_y - oy;
                    self.sum_xy = self.sum_xy - ox * oy;
                }
                self.nans.leave(nan_side(ox, oy), self.zero);
                self.count = self.count - self.one;
            }
        }

        let n = self.count;
        self.current = self
            .nans
            .mask(self.sum_xy / n - (self.sum_x / n) * (self.sum_y / n));
    }

    fn value(&self) -> N {
        self.current
    }

    fn is_stable(&self) -> bool {
        self.pairs.len() >= self.length
    }
}

/// `x` when it is NaN, otherwise `y`: NaN exactly when either side is.
#[inline]
fn nan_side<N: Num>(x: N, y: N) -> N {
    if x.is_nan() { x } else { y }
}

/// Population variance: the covariance of an input with itself.
pub struct Variance<N: Num>(Covariance<N>);

impl<N: Num> Variance<N> {
    pub fn new<F: NumFactory<Num = N>>(
        input: NumericRef<N>,
        length: usize,
        factory: &F,
    ) -> Result<Self, BarstreamError> {
        let length = require_window("VARIANCE", length)?;
        Covariance::new(Rc::clone(&input), input, length, factory).map(Self)
    }
}

impl<N: Num> Indicator<N> for Variance<N> {
    type Output = N;

    fn advance(&mut self, bar: &Bar<N>) {
        self.0.advance(bar);
    }

    fn value(&self) -> N {
        self.0.value()
    }

    fn is_stable(&self) -> bool {
        self.0.is_stable()
    }
}

/// Pearson correlation: `cov(x, y) / (σx · σy)`, zero when either input
/// has no dispersion over the window.
pub struct Correlation<N: Num> {
    covariance: Covariance<N>,
    variance_x: Variance<N>,
    variance_y: Variance<N>,
    zero: N,
    clock: BarClock,
    current: N,
}

impl<N: Num> Correlation<N> {
    pub fn new<F: NumFactory<Num = N>>(
        first: NumericRef<N>,
        second: NumericRef<N>,
        length: usize,
        factory: &F,
    ) -> Result<Self, BarstreamError> {
        let length = require_window("CORRELATION", length)?;
        Ok(Self {
            covariance: Covariance::new(Rc::clone(&first), Rc::clone(&second), length, factory)?,
            variance_x: Variance::new(first, length, factory)?,
            variance_y: Variance::new(second, length, factory)?,
            zero: factory.zero(),
            clock: BarClock::default(),
            current: factory.zero(),
        })
    }
}

impl<N: Num> Indicator<N> for Correlation<N> {
    type Output = N;

    fn advance(&mut self, bar: &Bar<N>) {
        if !self.clock.admit(bar) {
            return;
        }
        self.covariance.advance(bar);
        self.variance_x.advance(bar);
        self.variance_y.advance(bar);

        let covariance = self.covariance.value();
        let denominator = (self.variance_x.value() * self.variance_y.value()).sqrt();
        self.current = if covariance.is_nan() {
            covariance
        } else if denominator.is_zero() || denominator.is_nan() {
            self.zero
        } else {
            covariance / denominator
        };
    }

    fn value(&self) -> N {
        self.current
    }

    fn is_stable(&self) -> bool {
        self.covariance.is_stable()
    }
}
