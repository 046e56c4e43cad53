//! Directional movement family: TR, ATR, +DM/−DM, +DI/−DI, DX and ADX.
//!
//! All smoothing uses [`WilderMa`]. Sub-indicators read by several
//! consumers (ATR inside DX, DX inside ADX) sit behind [`NumericRef`] handles, so each
//! is advanced once per bar no matter how many consumers read it.

use crate::domain::error::BarstreamError;
use crate::domain::indicator::wilder::WilderMa;
use crate::domain::indicator::{BarClock, Indicator, NumericRef, pull, shared};
use crate::domain::num::{Num, NumFactory};
use crate::domain::ohlcv::Bar;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Plus,
    Minus,
}

/// `max(high − low, |high − prevClose|, |prevClose − low|)`; the first bar
/// has no previous close and reports `high − low`.
pub struct TrueRange<N: Num> {
    prev_close: Option<N>,
    clock: BarClock,
    current: N,
}

impl<N: Num> TrueRange<N> {
    pub fn new<F: NumFactory<Num = N>>(factory: &F) -> Self {
        Self {
            prev_close: None,
            clock: BarClock::default(),
            current: factory.zero(),
        }
    }
}

impl<N: Num> Indicator<N> for TrueRange<N> {
    type Output = N;

    fn advance(&mut self, bar: &Bar<N>) {
        if !self.clock.admit(bar) {
            return;
        }
        self.current = match self.prev_close {
            Some(prev) => bar.true_range(prev),
            None => (bar.high - bar.low).abs(),
        };
        self.prev_close = Some(bar.close);
    }

    fn value(&self) -> N {
        self.current
    }

    fn is_stable(&self) -> bool {
        self.clock.seen() > 0
    }
}

/// Average true range: Wilder smoothing of [`TrueRange`].
pub struct Atr<N: Num> {
    smoothed: WilderMa<N>,
}

impl<N: Num> Atr<N> {
    pub fn new<F: NumFactory<Num = N>>(length: usize, factory: &F) -> Result<Self, BarstreamError> {
        let tr: NumericRef<N> = shared(TrueRange::new(factory));
        Ok(Self {
            smoothed: WilderMa::new(tr, length, factory)?,
        })
    }
}

impl<N: Num> Indicator<N> for Atr<N> {
    type Output = N;

    fn advance(&mut self, bar: &Bar<N>) {
        self.smoothed.advance(bar);
    }

    fn value(&self) -> N {
        self.smoothed.value()
    }

    fn is_stable(&self) -> bool {
        self.smoothed.is_stable()
    }
}

/// +DM or −DM of a single bar.
///
/// With `up = high − prevHigh` and `down = prevLow − low`, +DM is `up` when
/// `up > down` and `up > 0`, otherwise zero; −DM mirrors it. The first bar
/// reports zero.
pub struct DirectionalMovement<N: Num> {
    direction: Direction,
    prev: Option<(N, N)>,
    zero: N,
    clock: BarClock,
    current: N,
}

impl<N: Num> DirectionalMovement<N> {
    pub fn new<F: NumFactory<Num = N>>(direction: Direction, factory: &F) -> Self {
        Self {
            direction,
            prev: None,
            zero: factory.zero(),
            clock: BarClock::default(),
            current: factory.zero(),
        }
    }

    pub fn plus<F: NumFactory<Num = N>>(factory: &F) -> Self {
        Self::new(Direction::Plus, factory)
    }

    pub fn minus<F: NumFactory<Num = N>>(factory: &F) -> Self {
        Self::new(Direction::Minus, factory)
    }
}

impl<N: Num> Indicator<N> for DirectionalMovement<N> {
    type Output = N;

    fn advance(&mut self, bar: &Bar<N>) {
        if !self.clock.admit(bar) {
            return;
        }
        self.current = match self.prev {
            None => self.zero,
            Some((prev_high, prev_low)) => {
                let up = bar.high - prev_high;
                let down = prev_low - bar.low;
                let (own, other) = match self.direction {
                    Direction::Plus => (up, down),
                    Direction::Minus => (down, up),
                };
                if own > other && own > self.zero {
                    own
                } else {
                    self.zero
                }
            }
        };
        self.prev = Some((bar.high, bar.low));
    }

    fn value(&self) -> N {
        self.current
    }

    fn is_stable(&self) -> bool {
        self.prev.is_some()
    }
}

/// +DI or −DI: smoothed directional movement over ATR, scaled by 100.
/// Zero while ATR is zero.
pub struct DirectionalIndicator<N: Num> {
    movement: WilderMa<N>,
    atr: NumericRef<N>,
    hundred: N,
    zero: N,
    clock: BarClock,
    current: N,
}

impl<N: Num> DirectionalIndicator<N> {
    pub fn new<F: NumFactory<Num = N>>(
        direction: Direction,
        length: usize,
        factory: &F,
    ) -> Result<Self, BarstreamError> {
        let atr: NumericRef<N> = shared(Atr::new(length, factory)?);
        Self::with_atr(direction, atr, length, factory)
    }

    /// Reads an existing ATR of the same length instead of building one.
    pub fn with_atr<F: NumFactory<Num = N>>(
        direction: Direction,
        atr: NumericRef<N>,
        length: usize,
        factory: &F,
    ) -> Result<Self, BarstreamError> {
        let movement: NumericRef<N> = shared(DirectionalMovement::new(direction, factory));
        Ok(Self {
            movement: WilderMa::new(movement, length, factory)?,
            atr,
            hundred: factory.hundred(),
            zero: factory.zero(),
            clock: BarClock::default(),
            current: factory.zero(),
        })
    }
}

impl<N: Num> Indicator<N> for DirectionalIndicator<N> {
    type Output = N;

    fn advance(&mut self, bar: &Bar<N>) {
        if !self.clock.admit(bar) {
            return;
        }
        self.movement.advance(bar);
        let atr = pull(&self.atr, bar);
        self.current = if atr.is_zero() {
            self.zero
        } else {
            self.movement.value() / atr * self.hundred
        };
    }

    fn value(&self) -> N {
        self.current
    }

    fn is_stable(&self) -> bool {
        self.movement.is_stable() && self.atr.borrow().is_stable()
    }
}

/// `100 · |+DI − −DI| / (+DI + −DI)`, zero when both lines are zero.
pub struct Dx<N: Num> {
    plus: DirectionalIndicator<N>,
    minus: DirectionalIndicator<N>,
    hundred: N,
    zero: N,
    clock: BarClock,
    current: N,
}

impl<N: Num> Dx<N> {
    pub fn new<F: NumFactory<Num = N>>(length: usize, factory: &F) -> Result<Self, BarstreamError> {
        let atr: NumericRef<N> = shared(Atr::new(length, factory)?);
        Ok(Self {
            plus: DirectionalIndicator::with_atr(Direction::Plus, atr.clone(), length, factory)?,
            minus: DirectionalIndicator::with_atr(Direction::Minus, atr, length, factory)?,
            hundred: factory.hundred(),
            zero: factory.zero(),
            clock: BarClock::default(),
            current: factory.zero(),
        })
    }
}

impl<N: Num> Indicator<N> for Dx<N> {
    type Output = N;

    fn advance(&mut self, bar: &Bar<N>) {
        if !self.clock.admit(bar) {
            return;
        }
        self.plus.advance(bar);
        self.minus.advance(bar);
        let (plus, minus) = (self.plus.value(), self.minus.value());
        let total = plus + minus;
        self.current = if total.is_zero() {
            self.zero
        } else {
            self.hundred * (plus - minus).abs() / total
        };
    }

    fn value(&self) -> N {
        self.current
    }

    fn is_stable(&self) -> bool {
        self.plus.is_stable() && self.minus.is_stable()
    }
}

/// Average directional index: Wilder smoothing of [`Dx`].
///
/// Stable once `length` smoothed values have come from a stable DX, so the
/// seed never averages warm-up DX values.
pub struct Adx<N: Num> {
    smoothed: WilderMa<N>,
    dx: NumericRef<N>,
    length: usize,
    settled: usize,
    clock: BarClock,
}

impl<N: Num> Adx<N> {
    pub fn new<F: NumFactory<Num = N>>(length: usize, factory: &F) -> Result<Self, BarstreamError> {
        let dx: NumericRef<N> = shared(Dx::new(length, factory)?);
        Ok(Self {
            smoothed: WilderMa::new(dx.clone(), length, factory)?,
            dx,
            length,
            settled: 0,
            clock: BarClock::default(),
        })
    }
}

impl<N: Num> Indicator<N> for Adx<N> {
    type Output = N;

    fn advance(&mut self, bar: &Bar<N>) {
        if !self.clock.admit(bar) {
            return;
        }
        self.smoothed.advance(bar);
        if self.dx.borrow().is_stable() {
            self.settled += 1;
        }
    }

    fn value(&self) -> N {
        self.smoothed.value()
    }

    fn is_stable(&self) -> bool {
        self.settled >= self.length
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::num::DoubleFactory;
    use crate::domain::test_util::{assert_approx, ohlc};

    fn feed<I: Indicator<f64, Output = f64>>(ind: &mut I, rows: &[(f64, f64, f64)]) -> Vec<f64> {
        rows.iter()
            .enumerate()
            .map(|(i, &(h, l, c))| {
                ind.advance(&ohlc(c, h, l, c, i as i64 + 1));
                ind.value()
            })
            .collect()
    }

    const ROWS: [(f64, f64, f64); 6] = [
        (10.0, 8.0, 9.0),
        (12.0, 9.0, 11.0),
        (11.5, 10.0, 10.5),
        (11.0, 7.0, 8.0),
        (13.0, 8.5, 12.5),
        (14.0, 12.0, 13.0),
    ];

    #[test]
    fn true_range_uses_previous_close() {
        let mut tr = TrueRange::new(&DoubleFactory);
        let out = feed(&mut tr, &ROWS);
        assert_approx!(out[0], 2.0);
        assert_approx!(out[1], 3.0);
        assert_approx!(out[3], 4.0);
        // prev close 8 below the bar: high - prevClose wins
        assert_approx!(out[4], 5.0);
    }

    #[test]
    fn identical_bars_have_no_directional_movement() {
        let rows = [(10.0, 8.0, 9.0), (10.0, 8.0, 9.0)];
        let plus = feed(&mut DirectionalMovement::plus(&DoubleFactory), &rows);
        let minus = feed(&mut DirectionalMovement::minus(&DoubleFactory), &rows);
        assert_eq!(plus[1], 0.0);
        assert_eq!(minus[1], 0.0);
    }

    #[test]
    fn directional_movement_picks_dominant_side() {
        let plus = feed(&mut DirectionalMovement::plus(&DoubleFactory), &ROWS);
        let minus = feed(&mut DirectionalMovement::minus(&DoubleFactory), &ROWS);
        assert_eq!(plus[0], 0.0);
        // up 2, down -1
        assert_eq!(plus[1], 2.0);
        assert_eq!(minus[1], 0.0);
        // up -0.5, down -1: neither positive
        assert_eq!(plus[2], 0.0);
        assert_eq!(minus[2], 0.0);
        // up -0.5, down 3
        assert_eq!(minus[3], 3.0);
        // up 2, down -1.5
        assert_eq!(plus[4], 2.0);
    }

    #[test]
    fn atr_smooths_true_range() {
        let mut atr = Atr::new(3, &DoubleFactory).unwrap();
        let out = feed(&mut atr, &ROWS);
        // TR: 2, 3, 1.5, 4, 5, 1.5
        assert_approx!(out[2], 6.5 / 3.0);
        assert_approx!(out[3], 6.5 / 3.0 + (4.0 - 6.5 / 3.0) / 3.0);
        assert!(atr.is_stable());
    }

    #[test]
    fn plus_di_is_smoothed_dm_over_atr() {
        let mut di = DirectionalIndicator::new(Direction::Plus, 3, &DoubleFactory).unwrap();
        let out = feed(&mut di, &ROWS);
        // +DM: 0, 2, 0 -> seed 2/3; TR seed 6.5/3
        assert_approx!(out[2], (2.0 / 3.0) / (6.5 / 3.0) * 100.0);
    }

    #[test]
    fn dx_is_zero_without_movement() {
        let flat = [(10.0, 8.0, 9.0); 4];
        let mut dx = Dx::new(2, &DoubleFactory).unwrap();
        let out = feed(&mut dx, &flat);
        assert!(out.iter().all(|v| *v == 0.0));
    }

    #[test]
    fn dx_of_pure_uptrend_is_hundred() {
        let rising: Vec<(f64, f64, f64)> = (0..6)
            .map(|i| {
                let base = 10.0 + i as f64;
                (base + 1.0, base, base + 0.5)
            })
            .collect();
        let mut dx = Dx::new(3, &DoubleFactory).unwrap();
        let out = feed(&mut dx, &rising);
        assert_approx!(out[5], 100.0);
    }

    #[test]
    fn adx_stable_after_smoothing_stable_dx() {
        let mut adx = Adx::new(2, &DoubleFactory).unwrap();
        feed(&mut adx, &ROWS[..2]);
        assert!(!adx.is_stable());
        let mut adx = Adx::new(2, &DoubleFactory).unwrap();
        feed(&mut adx, &ROWS[..3]);
        assert!(adx.is_stable());

        let mut adx = Adx::new(3, &DoubleFactory).unwrap();
        feed(&mut adx, &ROWS[..4]);
        assert!(!adx.is_stable());
        let mut adx = Adx::new(3, &DoubleFactory).unwrap();
        feed(&mut adx, &ROWS[..5]);
        assert!(adx.is_stable());
    }

    #[test]
    fn adx_repeated_bar_does_not_advance_warmup() {
        let mut adx = Adx::new(2, &DoubleFactory).unwrap();
        for (i, &(h, l, c)) in ROWS[..2].iter().enumerate() {
            let b = ohlc(c, h, l, c, i as i64 + 1);
            adx.advance(&b);
            adx.advance(&b);
        }
        assert!(!adx.is_stable());
    }

    #[test]
    fn zero_length_rejected() {
        assert!(Atr::<f64>::new(0, &DoubleFactory).is_err());
        assert!(Adx::<f64>::new(0, &DoubleFactory).is_err());
    }
}
