//! Time-indexed valuation of a trading record over a bar series.
//!
//! - [`CashFlow`]: per-bar value of the record, summed across positions
//! - [`RealizedCashFlow`]: value at entry/exit boundaries, interpolated
//! - [`Returns`]: per-bar log or arithmetic returns inside positions

pub mod cash_flow;
pub mod realized;
pub mod returns;

pub use cash_flow::CashFlow;
pub use realized::RealizedCashFlow;
pub use returns::{ReturnType, Returns};

use crate::domain::num::{Num, NumFactory};
use crate::domain::position::Position;

/// Last bar a position contributes to when valuing up to `final_index`:
/// its exit bar when closed, otherwise `final_index`.
pub(crate) fn end_index<N: Num>(position: &Position<N>, final_index: usize) -> usize {
    match position.exit() {
        Some(exit) => exit.index.min(final_index),
        None => final_index,
    }
}

/// Price after holding cost: lowered for longs, raised for shorts.
pub(crate) fn add_cost<N: Num>(price: N, cost: N, long: bool) -> N {
    if long { price - cost } else { price + cost }
}

/// Value ratio of moving from `entry` to `price`: `price/entry` for longs,
/// `2 − price/entry` for shorts. One when `entry` is zero.
pub(crate) fn price_ratio<N: Num, F: NumFactory<Num = N>>(
    long: bool,
    entry: N,
    price: N,
    factory: &F,
) -> N {
    if entry.is_zero() {
        return factory.one();
    }
    let ratio = price / entry;
    if long { ratio } else { factory.two() - ratio }
}

/// Exit-side price of `position` at bar `end` before holding costs: the net
/// exit price when the position closes on that bar, otherwise `close`.
pub(crate) fn exit_price<N: Num>(position: &Position<N>, end: usize, close: N) -> N {
    match position.exit() {
        Some(exit) if exit.index == end => exit.net_price,
        _ => close,
    }
}
