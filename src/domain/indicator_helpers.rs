//! Builds indicator graphs from [`IndicatorType`] descriptions.
//!
//! Windowed indicators read the bar close unless the type names its own
//! source (the directional family reads the whole bar).

use crate::domain::error::BarstreamError;
use crate::domain::indicator::covariance::Variance;
use crate::domain::indicator::directional::{
    Adx, Atr, Direction, DirectionalIndicator, DirectionalMovement, Dx, TrueRange,
};
use crate::domain::indicator::ema::Ema;
use crate::domain::indicator::extremum::RollingExtremum;
use crate::domain::indicator::macd::Macd;
use crate::domain::indicator::price::{PriceIndicator, PriceSource};
use crate::domain::indicator::running_total::RunningTotal;
use crate::domain::indicator::sma::Sma;
use crate::domain::indicator::stddev::StandardDeviation;
use crate::domain::indicator::wilder::WilderMa;
use crate::domain::indicator::wma::Wma;
use crate::domain::indicator::{IndicatorHandle, IndicatorType, NumericRef, shared};
use crate::domain::num::{Num, NumFactory};

/// Shared close-price source for `factory`'s representation.
pub fn close_price<N: Num, F: NumFactory<Num = N>>(factory: &F) -> NumericRef<N> {
    shared(PriceIndicator::close(factory))
}

/// Constructs the indicator described by `kind`.
pub fn build_indicator<N: Num, F: NumFactory<Num = N>>(
    kind: &IndicatorType,
    factory: &F,
) -> Result<IndicatorHandle<N>, BarstreamError> {
    let price = |source: PriceSource| IndicatorHandle::numeric(PriceIndicator::new(source, factory));

    let handle = match *kind {
        IndicatorType::Open => price(PriceSource::Open),
        IndicatorType::High => price(PriceSource::High),
        IndicatorType::Low => price(PriceSource::Low),
        IndicatorType::Close => price(PriceSource::Close),
        IndicatorType::Volume => price(PriceSource::Volume),
        IndicatorType::Typical => price(PriceSource::Typical),
        IndicatorType::Sma(n) => IndicatorHandle::numeric(Sma::new(close_price(factory), n, factory)?),
        IndicatorType::Ema(n) => IndicatorHandle::numeric(Ema::new(close_price(factory), n, factory)?),
        IndicatorType::Wma(n) => IndicatorHandle::numeric(Wma::new(close_price(factory), n, factory)?),
        IndicatorType::Mma(n) => {
            IndicatorHandle::numeric(WilderMa::new(close_price(factory), n, factory)?)
        }
        IndicatorType::Highest(n) => {
            IndicatorHandle::numeric(RollingExtremum::highest(close_price(factory), n)?)
        }
        IndicatorType::Lowest(n) => {
            IndicatorHandle::numeric(RollingExtremum::lowest(close_price(factory), n)?)
        }
        IndicatorType::Variance(n) => {
            IndicatorHandle::numeric(Variance::new(close_price(factory), n, factory)?)
        }
        IndicatorType::Stddev(n) => {
            IndicatorHandle::numeric(StandardDeviation::new(close_price(factory), n, factory)?)
        }
        IndicatorType::RunningTotal(n) => {
            IndicatorHandle::numeric(RunningTotal::new(close_price(factory), n, factory)?)
        }
        IndicatorType::TrueRange => IndicatorHandle::numeric(TrueRange::new(factory)),
        IndicatorType::Atr(n) => IndicatorHandle::numeric(Atr::new(n, factory)?),
        IndicatorType::PlusDm => IndicatorHandle::numeric(DirectionalMovement::plus(factory)),
        IndicatorType::MinusDm => IndicatorHandle::numeric(DirectionalMovement::minus(factory)),
        IndicatorType::PlusDi(n) => {
            IndicatorHandle::numeric(DirectionalIndicator::new(Direction::Plus, n, factory)?)
        }
        IndicatorType::MinusDi(n) => {
            IndicatorHandle::numeric(DirectionalIndicator::new(Direction::Minus, n, factory)?)
        }
        IndicatorType::Dx(n) => IndicatorHandle::numeric(Dx::new(n, factory)?),
        IndicatorType::Adx(n) => IndicatorHandle::numeric(Adx::new(n, factory)?),
        IndicatorType::Macd { short, long } => {
            IndicatorHandle::numeric(Macd::new(close_price(factory), short, long, factory)?)
        }
    };
    Ok(handle)
}

/// Parses `spec` and builds the indicator in one step.
pub fn parse_indicator<N: Num, F: NumFactory<Num = N>>(
    spec: &str,
    factory: &F,
) -> Result<IndicatorHandle<N>, BarstreamError> {
    let kind: IndicatorType = spec.parse()?;
    build_indicator(&kind, factory)
}
