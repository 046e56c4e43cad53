//! Rolling highest/lowest value over the last *n* bars.
//!
//! A ring buffer keeps the raw window; a deque of buffer slots keeps the
//! candidates that can still become the extremum, best at the front. Each
//! value enters and leaves the deque at most once, so updates are amortised
//! O(1) and the query is a front read.

use std::collections::VecDeque;

use crate::domain::error::{BarstreamError, require_window};
use crate::domain::indicator::ring_buffer::RingBuffer;
use crate::domain::indicator::{BarClock, Indicator, NumericRef, pull};
use crate::domain::num::Num;
use crate::domain::ohlcv::Bar;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Extremum {
    Highest,
    Lowest,
}

impl Extremum {
    /// `true` when `stored` can never beat `incoming` for the rest of the
    /// window.
    #[inline]
    fn dominated<N: Num>(self, stored: N, incoming: N) -> bool {
        match self {
            Extremum::Highest => stored <= incoming,
            Extremum::Lowest => stored >= incoming,
        }
    }
}

/// Highest or lowest input value over a trailing window.
///
/// NaN inputs occupy their window slot but never become candidates. When
/// every value in the window is NaN the result is NaN.
pub struct RollingExtremum<N: Num> {
    input: NumericRef<N>,
    kind: Extremum,
    window: RingBuffer<N>,
    candidates: VecDeque<usize>,
    clock: BarClock,
    current: N,
}

impl<N: Num> RollingExtremum<N> {
    pub fn new(input: NumericRef<N>, kind: Extremum, length: usize) -> Result<Self, BarstreamError> {
        let name = match kind {
            Extremum::Highest => "HIGHEST",
            Extremum::Lowest => "LOWEST",
        };
        let length = require_window(name, length)?;
        let current = input.borrow().value();
        Ok(Self {
            input,
            kind,
            window: RingBuffer::new(length),
            candidates: VecDeque::with_capacity(length),
            clock: BarClock::default(),
            current,
        })
    }

    pub fn highest(input: NumericRef<N>, length: usize) -> Result<Self, BarstreamError> {
        Self::new(input, Extremum::Highest, length)
    }

    pub fn lowest(input: NumericRef<N>, length: usize) -> Result<Self, BarstreamError> {
        Self::new(input, Extremum::Lowest, length)
    }

    fn push(&mut self, value: N) -> N {
        let slot = self.window.next_slot();

        if self.window.is_full() && self.candidates.front() == Some(&slot) {
            self.candidates.pop_front();
        }
        self.window.push(value);

        if !value.is_nan() {
            while let Some(&back) = self.candidates.back() {
                if self.kind.dominated(self.window.slot(back), value) {
                    self.candidates.pop_back();
                } else {
                    break;
                }
            }
            self.candidates.push_back(slot);
        }

        match self.candidates.front() {
            Some(&best) => self.window.slot(best),
            None => value,
        }
    }
}

impl<N: Num> Indicator<N> for RollingExtremum<N> {
    type Output = N;

    fn advance(&mut self, bar: &Bar<N>) {
        if !self.clock.admit(bar) {
            return;
        }
        let value = pull(&self.input, bar);
        self.current = self.push(value);
    }

    fn value(&self) -> N {
        self.current
    }

    fn is_stable(&self) -> bool {
        self.window.is_full()
    }
}
