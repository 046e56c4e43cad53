//! Streaming indicator contract and implementations.
//!
//! Every indicator advances one bar at a time through [`Indicator::advance`]
//! and reports its last value and readiness. Indicators that read other
//! indicators hold them through shared handles ([`NumericRef`],
//! [`BooleanRef`]) and advance them explicitly before computing; the
//! per-indicator [`BarClock`] turns repeated deliveries of the same bar into
//! no-ops, so an input shared by several composites is updated exactly once
//! per bar.
//!
//! This module also provides:
//! - `IndicatorHandle`: tagged numeric/boolean handle stored by contexts
//! - `IndicatorOutput`: a value read from either kind of handle
//! - `IndicatorType`: indicator identity + parameters, parsed from text

pub mod covariance;
pub mod cross;
pub mod directional;
pub mod ema;
pub mod extremum;
pub mod macd;
pub mod price;
pub mod ring_buffer;
pub mod running_total;
pub mod sma;
pub mod stddev;
pub mod wilder;
pub mod wma;

use chrono::{DateTime, Utc};
use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;
use std::str::FromStr;
use tracing::trace;

use crate::domain::error::BarstreamError;
use crate::domain::num::Num;
use crate::domain::ohlcv::Bar;

/// A computation advanced one bar at a time.
pub trait Indicator<N: Num> {
    /// `N` for numeric indicators, `bool` for signals.
    type Output: Copy + fmt::Debug;

    /// Advances internal state by one bar. Calling it again with a bar whose
    /// begin time is not after the last processed one does nothing.
    fn advance(&mut self, bar: &Bar<N>);

    /// Last computed value. May be a warm-up artifact until
    /// [`is_stable`](Indicator::is_stable) reports `true`.
    fn value(&self) -> Self::Output;

    /// Whether enough bars have been observed for the value to be meaningful.
    fn is_stable(&self) -> bool;
}

/// Shared, non-owning reference to a numeric indicator.
pub type NumericRef<N> = Rc<RefCell<dyn Indicator<N, Output = N>>>;

/// Shared, non-owning reference to a boolean indicator.
pub type BooleanRef<N> = Rc<RefCell<dyn Indicator<N, Output = bool>>>;

/// Wraps an indicator so it can be handed to several consumers.
///
/// The returned `Rc<RefCell<I>>` coerces to [`NumericRef`] or [`BooleanRef`]
/// while the caller keeps the concrete type for inspection.
pub fn shared<I>(indicator: I) -> Rc<RefCell<I>> {
    Rc::new(RefCell::new(indicator))
}

/// Advances `input` and returns its fresh value.
#[inline]
pub(crate) fn pull<N: Num>(input: &NumericRef<N>, bar: &Bar<N>) -> N {
    let mut input = input.borrow_mut();
    input.advance(bar);
    input.value()
}

/// Remembers the begin time of the last processed bar.
#[derive(Debug, Clone, Default)]
pub struct BarClock {
    last_begin: Option<DateTime<Utc>>,
    seen: usize,
}

impl BarClock {
    /// Returns `true` (and records the bar) when `bar` starts after the last
    /// admitted one.
    #[inline]
    pub fn admit<N>(&mut self, bar: &Bar<N>) -> bool {
        if self.last_begin.is_some_and(|t| bar.begin <= t) {
            trace!(begin = %bar.begin, "bar already processed");
            return false;
        }
        self.last_begin = Some(bar.begin);
        self.seen += 1;
        true
    }

    /// Number of distinct bars admitted so far.
    pub fn seen(&self) -> usize {
        self.seen
    }

    pub fn last_begin(&self) -> Option<DateTime<Utc>> {
        self.last_begin
    }
}

/// Counts the NaN inputs currently inside a window so running sums only ever
/// accumulate real values.
#[derive(Debug, Clone, Copy)]
pub(crate) struct NanTally<N> {
    held: usize,
    nan: Option<N>,
}

impl<N: Num> NanTally<N> {
    pub(crate) fn new() -> Self {
        Self { held: 0, nan: None }
    }

    /// Records `value` entering the window; returns what to add to a sum.
    #[inline]
    pub(crate) fn enter(&mut self, value: N, zero: N) -> N {
        if value.is_nan() {
            self.held += 1;
            self.nan = Some(value);
            zero
        } else {
            value
        }
    }

    /// Records `value` leaving the window; returns what to subtract.
    #[inline]
    pub(crate) fn leave(&mut self, value: N, zero: N) -> N {
        if value.is_nan() {
            self.held = self.held.saturating_sub(1);
            zero
        } else {
            value
        }
    }

    /// NaN while one is held, `value` otherwise.
    #[inline]
    pub(crate) fn mask(&self, value: N) -> N {
        match self.nan {
            Some(nan) if self.held > 0 => nan,
            _ => value,
        }
    }
}

/// A registered indicator of either output kind.
pub enum IndicatorHandle<N: Num> {
    Numeric(NumericRef<N>),
    Boolean(BooleanRef<N>),
}

impl<N: Num> Clone for IndicatorHandle<N> {
    fn clone(&self) -> Self {
        match self {
            IndicatorHandle::Numeric(r) => IndicatorHandle::Numeric(Rc::clone(r)),
            IndicatorHandle::Boolean(r) => IndicatorHandle::Boolean(Rc::clone(r)),
        }
    }
}

impl<N: Num> fmt::Debug for IndicatorHandle<N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IndicatorHandle::Numeric(_) => write!(f, "Numeric({})", self.output()),
            IndicatorHandle::Boolean(_) => write!(f, "Boolean({})", self.output()),
        }
    }
}

impl<N: Num> IndicatorHandle<N> {
    pub fn numeric<I>(indicator: I) -> Self
    where
        I: Indicator<N, Output = N> + 'static,
    {
        IndicatorHandle::Numeric(shared(indicator))
    }

    pub fn boolean<I>(indicator: I) -> Self
    where
        I: Indicator<N, Output = bool> + 'static,
    {
        IndicatorHandle::Boolean(shared(indicator))
    }

    pub fn advance(&self, bar: &Bar<N>) {
        match self {
            IndicatorHandle::Numeric(r) => r.borrow_mut().advance(bar),
            IndicatorHandle::Boolean(r) => r.borrow_mut().advance(bar),
        }
    }

    pub fn is_stable(&self) -> bool {
        match self {
            IndicatorHandle::Numeric(r) => r.borrow().is_stable(),
            IndicatorHandle::Boolean(r) => r.borrow().is_stable(),
        }
    }

    pub fn output(&self) -> IndicatorOutput<N> {
        match self {
            IndicatorHandle::Numeric(r) => IndicatorOutput::Numeric(r.borrow().value()),
            IndicatorHandle::Boolean(r) => IndicatorOutput::Boolean(r.borrow().value()),
        }
    }

    /// The numeric reference, for wiring into composites.
    pub fn as_numeric(&self) -> Option<NumericRef<N>> {
        match self {
            IndicatorHandle::Numeric(r) => Some(Rc::clone(r)),
            IndicatorHandle::Boolean(_) => None,
        }
    }

    pub fn as_boolean(&self) -> Option<BooleanRef<N>> {
        match self {
            IndicatorHandle::Boolean(r) => Some(Rc::clone(r)),
            IndicatorHandle::Numeric(_) => None,
        }
    }
}

impl<N: Num> From<NumericRef<N>> for IndicatorHandle<N> {
    fn from(r: NumericRef<N>) -> Self {
        IndicatorHandle::Numeric(r)
    }
}

impl<N: Num> From<BooleanRef<N>> for IndicatorHandle<N> {
    fn from(r: BooleanRef<N>) -> Self {
        IndicatorHandle::Boolean(r)
    }
}

/// A value read from an [`IndicatorHandle`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum IndicatorOutput<N> {
    Numeric(N),
    Boolean(bool),
}

impl<N: Num> IndicatorOutput<N> {
    pub fn as_numeric(self) -> Option<N> {
        match self {
            IndicatorOutput::Numeric(v) => Some(v),
            IndicatorOutput::Boolean(_) => None,
        }
    }

    pub fn as_boolean(self) -> Option<bool> {
        match self {
            IndicatorOutput::Boolean(v) => Some(v),
            IndicatorOutput::Numeric(_) => None,
        }
    }
}

impl<N: Num> fmt::Display for IndicatorOutput<N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IndicatorOutput::Numeric(v) => write!(f, "{}", v),
            IndicatorOutput::Boolean(v) => write!(f, "{}", v),
        }
    }
}

/// Indicator identity and parameters as written in configuration.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum IndicatorType {
    Open,
    High,
    Low,
    Close,
    Volume,
    Typical,
    Sma(usize),
    Ema(usize),
    Wma(usize),
    Mma(usize),
    Highest(usize),
    Lowest(usize),
    Variance(usize),
    Stddev(usize),
    RunningTotal(usize),
    TrueRange,
    Atr(usize),
    PlusDm,
    MinusDm,
    PlusDi(usize),
    MinusDi(usize),
    Dx(usize),
    Adx(usize),
    Macd { short: usize, long: usize },
}

impl fmt::Display for IndicatorType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IndicatorType::Open => write!(f, "OPEN"),
            IndicatorType::High => write!(f, "HIGH"),
            IndicatorType::Low => write!(f, "LOW"),
            IndicatorType::Close => write!(f, "CLOSE"),
            IndicatorType::Volume => write!(f, "VOLUME"),
            IndicatorType::Typical => write!(f, "TYPICAL"),
            IndicatorType::Sma(period) => write!(f, "SMA({})", period),
            IndicatorType::Ema(period) => write!(f, "EMA({})", period),
            IndicatorType::Wma(period) => write!(f, "WMA({})", period),
            IndicatorType::Mma(period) => write!(f, "MMA({})", period),
            IndicatorType::Highest(period) => write!(f, "HIGHEST({})", period),
            IndicatorType::Lowest(period) => write!(f, "LOWEST({})", period),
            IndicatorType::Variance(period) => write!(f, "VARIANCE({})", period),
            IndicatorType::Stddev(period) => write!(f, "STDDEV({})", period),
            IndicatorType::RunningTotal(period) => write!(f, "RUNNING_TOTAL({})", period),
            IndicatorType::TrueRange => write!(f, "TR"),
            IndicatorType::Atr(period) => write!(f, "ATR({})", period),
            IndicatorType::PlusDm => write!(f, "PLUS_DM"),
            IndicatorType::MinusDm => write!(f, "MINUS_DM"),
            IndicatorType::PlusDi(period) => write!(f, "PLUS_DI({})", period),
            IndicatorType::MinusDi(period) => write!(f, "MINUS_DI({})", period),
            IndicatorType::Dx(period) => write!(f, "DX({})", period),
            IndicatorType::Adx(period) => write!(f, "ADX({})", period),
            IndicatorType::Macd { short, long } => write!(f, "MACD({},{})", short, long),
        }
    }
}

impl FromStr for IndicatorType {
    type Err = BarstreamError;

    /// Parses `NAME` or `NAME(arg, ...)`, case-insensitive.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let text = s.trim();
        let syntax = |reason: &str| BarstreamError::IndicatorSyntax {
            spec: text.to_string(),
            reason: reason.to_string(),
        };

        let (name, args) = match text.find('(') {
            Some(open) => {
                let inner = text[open + 1..]
                    .strip_suffix(')')
                    .ok_or_else(|| syntax("missing closing parenthesis"))?;
                let args = inner
                    .split(',')
                    .map(|a| {
                        a.trim()
                            .parse::<usize>()
                            .map_err(|_| syntax("arguments must be non-negative integers"))
                    })
                    .collect::<Result<Vec<_>, _>>()?;
                (text[..open].trim().to_uppercase(), args)
            }
            None => (text.to_uppercase(), Vec::new()),
        };

        let arity = |expected: usize| {
            if args.len() == expected {
                Ok(())
            } else {
                Err(syntax(&format!("expected {expected} argument(s), got {}", args.len())))
            }
        };

        match name.as_str() {
            "OPEN" => arity(0).map(|_| IndicatorType::Open),
            "HIGH" => arity(0).map(|_| IndicatorType::High),
            "LOW" => arity(0).map(|_| IndicatorType::Low),
            "CLOSE" => arity(0).map(|_| IndicatorType::Close),
            "VOLUME" => arity(0).map(|_| IndicatorType::Volume),
            "TYPICAL" => arity(0).map(|_| IndicatorType::Typical),
            "TR" => arity(0).map(|_| IndicatorType::TrueRange),
            "PLUS_DM" => arity(0).map(|_| IndicatorType::PlusDm),
            "MINUS_DM" => arity(0).map(|_| IndicatorType::MinusDm),
            "SMA" => arity(1).map(|_| IndicatorType::Sma(args[0])),
            "EMA" => arity(1).map(|_| IndicatorType::Ema(args[0])),
            "WMA" => arity(1).map(|_| IndicatorType::Wma(args[0])),
            "MMA" => arity(1).map(|_| IndicatorType::Mma(args[0])),
            "HIGHEST" => arity(1).map(|_| IndicatorType::Highest(args[0])),
            "LOWEST" => arity(1).map(|_| IndicatorType::Lowest(args[0])),
            "VARIANCE" => arity(1).map(|_| IndicatorType::Variance(args[0])),
            "STDDEV" => arity(1).map(|_| IndicatorType::Stddev(args[0])),
            "RUNNING_TOTAL" => arity(1).map(|_| IndicatorType::RunningTotal(args[0])),
            "ATR" => arity(1).map(|_| IndicatorType::Atr(args[0])),
            "PLUS_DI" => arity(1).map(|_| IndicatorType::PlusDi(args[0])),
            "MINUS_DI" => arity(1).map(|_| IndicatorType::MinusDi(args[0])),
            "DX" => arity(1).map(|_| IndicatorType::Dx(args[0])),
            "ADX" => arity(1).map(|_| IndicatorType::Adx(args[0])),
            "MACD" => arity(2).map(|_| IndicatorType::Macd {
                short: args[0],
                long: args[1],
            }),
            _ => Err(BarstreamError::UnknownIndicator {
                spec: text.to_string(),
            }),
        }
    }
}
