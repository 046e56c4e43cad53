//! Boolean crossing signal between two numeric indicators.

use crate::domain::indicator::{BarClock, Indicator, NumericRef, pull};
use crate::domain::num::Num;
use crate::domain::ohlcv::Bar;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CrossDirection {
    /// `first` moves from at-or-below `second` to strictly above it.
    Up,
    /// `first` moves from at-or-above `second` to strictly below it.
    Down,
}

/// True on the bar where `first` crosses `second` in the given direction.
///
/// Bars where the two are equal do not reset the comparison, so a touch
/// followed by a break still counts as one cross.
pub struct Cross<N: Num> {
    first: NumericRef<N>,
    second: NumericRef<N>,
    direction: CrossDirection,
    /// Side of the last bar where the inputs differed.
    last_above: Option<bool>,
    clock: BarClock,
    current: bool,
}

impl<N: Num> Cross<N> {
    pub fn new(first: NumericRef<N>, second: NumericRef<N>, direction: CrossDirection) -> Self {
        Self {
            first,
            second,
            direction,
            last_above: None,
            clock: BarClock::default(),
            current: false,
        }
    }

    pub fn up(first: NumericRef<N>, second: NumericRef<N>) -> Self {
        Self::new(first, second, CrossDirection::Up)
    }

    pub fn down(first: NumericRef<N>, second: NumericRef<N>) -> Self {
        Self::new(first, second, CrossDirection::Down)
    }
}

impl<N: Num> Indicator<N> for Cross<N> {
    type Output = bool;

    fn advance(&mut self, bar: &Bar<N>) {
        if !self.clock.admit(bar) {
            return;
        }
        let a = pull(&self.first, bar);
        let b = pull(&self.second, bar);

        let side = if a > b {
            Some(true)
        } else if a < b {
            Some(false)
        } else {
            None
        };

        self.current = match (self.direction, self.last_above, side) {
            (CrossDirection::Up, Some(false), Some(true)) => true,
            (CrossDirection::Down, Some(true), Some(false)) => true,
            _ => false,
        };
        if side.is_some() {
            self.last_above = side;
        }
    }

    fn value(&self) -> bool {
        self.current
    }

    fn is_stable(&self) -> bool {
        self.first.borrow().is_stable() && self.second.borrow().is_stable()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::test_util::{bars, close_ref, constant_ref};

    fn signals(direction: CrossDirection, closes: &[f64], level: f64) -> Vec<bool> {
        let mut cross = Cross::new(close_ref(), constant_ref(level), direction);
        bars(closes)
            .iter()
            .map(|b| {
                cross.advance(b);
                cross.value()
            })
            .collect()
    }

    #[test]
    fn crosses_up_once() {
        let out = signals(CrossDirection::Up, &[8.0, 9.0, 11.0, 12.0], 10.0);
        assert_eq!(out, vec![false, false, true, false]);
    }

    #[test]
    fn crosses_down() {
        let out = signals(CrossDirection::Down, &[12.0, 9.0, 8.0, 11.0, 7.0], 10.0);
        assert_eq!(out, vec![false, true, false, false, true]);
    }

    #[test]
    fn touch_then_break_counts() {
        let out = signals(CrossDirection::Up, &[9.0, 10.0, 11.0], 10.0);
        assert_eq!(out, vec![false, false, true]);
    }

    #[test]
    fn starting_above_is_not_a_cross() {
        let out = signals(CrossDirection::Up, &[11.0, 12.0], 10.0);
        assert_eq!(out, vec![false, false]);
    }

    #[test]
    fn nan_bar_keeps_last_side() {
        let out = signals(CrossDirection::Up, &[9.0, f64::NAN, 11.0], 10.0);
        // NaN compares neither above nor below and keeps the last side
        assert_eq!(out, vec![false, false, true]);
    }
}
