// src/domain/test_util.rs

use chrono::{DateTime, TimeDelta, Utc};

use super::indicator::price::{ConstantIndicator, PriceIndicator};
use super::indicator::{NumericRef, shared};
use super::num::{DecimalFactory, DoubleFactory, NumFactory};
use rust_decimal::Decimal;
use super::ohlcv::Bar;

/// Asserts that two `f64` values agree to within `1e-9` (absolute).
macro_rules! assert_approx {
    ($actual:expr, $expected:expr) => {{
        let (a, e): (f64, f64) = ($actual, $expected);
        assert!(
            (a - e).abs() < 1e-9,
            "assert_approx failed: actual={a}, expected={e}, diff={}",
            (a - e).abs(),
        );
    }};
}

pub(crate) use assert_approx;

/// End time of the one-minute bar with sequence number `minute`.
pub fn at(minute: i64) -> DateTime<Utc> {
    DateTime::from_timestamp(minute * 60, 0).unwrap()
}

/// One-minute bar ending at `minute` with all prices equal to `close`.
pub fn bar(close: f64, minute: i64) -> Bar<f64> {
    ohlc(close, close, close, close, minute)
}

pub fn ohlc(open: f64, high: f64, low: f64, close: f64, minute: i64) -> Bar<f64> {
    Bar::from_f64(
        &DoubleFactory,
        at(minute),
        TimeDelta::minutes(1),
        open,
        high,
        low,
        close,
        1_000.0,
    )
}

/// Bars ending at minutes 1, 2, 3, ... with the given closes.
pub fn bars(closes: &[f64]) -> Vec<Bar<f64>> {
    closes
        .iter()
        .enumerate()
        .map(|(i, &c)| bar(c, i as i64 + 1))
        .collect()
}

/// Shared close-price input for composite tests.
pub fn close_ref() -> NumericRef<f64> {
    shared(PriceIndicator::close(&DoubleFactory))
}

/// Shared constant input.
pub fn constant_ref(value: f64) -> NumericRef<f64> {
    shared(ConstantIndicator::new(value))
}

/// One-minute `Decimal` bar ending at `minute`; `close` is parsed exactly.
pub fn decimal_bar(close: &str, minute: i64) -> Bar<Decimal> {
    let f = DecimalFactory;
    let price = f.parse(close).unwrap();
    Bar {
        begin: at(minute - 1),
        end: at(minute),
        open: price,
        high: price,
        low: price,
        close: price,
        volume: f.zero(),
        trades: 0,
    }
}
