//! OHLCV bar representation.

use chrono::{DateTime, TimeDelta, Utc};

use super::num::{Num, NumFactory};

/// One closed (or in-progress) interval of market data.
#[derive(Debug, Clone, PartialEq)]
pub struct Bar<N> {
    pub begin: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub open: N,
    pub high: N,
    pub low: N,
    pub close: N,
    pub volume: N,
    pub trades: u64,
}

impl<N: Num> Bar<N> {
    /// Builds a bar from `f64` prices through the given factory.
    #[allow(clippy::too_many_arguments)]
    pub fn from_f64<F: NumFactory<Num = N>>(
        factory: &F,
        end: DateTime<Utc>,
        period: TimeDelta,
        open: f64,
        high: f64,
        low: f64,
        close: f64,
        volume: f64,
    ) -> Self {
        Bar {
            begin: end - period,
            end,
            open: factory.value_of(open),
            high: factory.value_of(high),
            low: factory.value_of(low),
            close: factory.value_of(close),
            volume: factory.value_of(volume),
            trades: 0,
        }
    }

    pub fn period(&self) -> TimeDelta {
        self.end - self.begin
    }

    /// (high + low + close) / 3
    pub fn typical_price<F: NumFactory<Num = N>>(&self, factory: &F) -> N {
        (self.high + self.low + self.close) / factory.value_of(3.0)
    }

    /// (high + low) / 2
    pub fn median_price<F: NumFactory<Num = N>>(&self, factory: &F) -> N {
        (self.high + self.low) / factory.two()
    }

    /// max(high - low, |high - prev_close|, |low - prev_close|)
    pub fn true_range(&self, prev_close: N) -> N {
        let hl = (self.high - self.low).abs();
        let hc = (self.high - prev_close).abs();
        let lc = (prev_close - self.low).abs();
        hl.max(hc).max(lc)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::num::DoubleFactory;

    fn sample_bar() -> Bar<f64> {
        Bar::from_f64(
            &DoubleFactory,
            DateTime::from_timestamp(86_400, 0).unwrap(),
            TimeDelta::days(1),
            100.0,
            110.0,
            90.0,
            105.0,
            50_000.0,
        )
    }

    #[test]
    fn begin_is_end_minus_period() {
        let bar = sample_bar();
        assert_eq!(bar.begin, DateTime::from_timestamp(0, 0).unwrap());
        assert_eq!(bar.period(), TimeDelta::days(1));
    }

    #[test]
    fn typical_price() {
        let bar = sample_bar();
        // (110 + 90 + 105) / 3 = 101.666...
        let expected = (110.0 + 90.0 + 105.0) / 3.0;
        assert!((bar.typical_price(&DoubleFactory) - expected).abs() < f64::EPSILON);
    }

    #[test]
    fn median_price() {
        assert_eq!(sample_bar().median_price(&DoubleFactory), 100.0);
    }

    #[test]
    fn true_range_hl_dominates() {
        let bar = sample_bar();
        // high-low=20, |high-100|=10, |low-100|=10 → 20
        assert!((bar.true_range(100.0) - 20.0).abs() < f64::EPSILON);
    }

    #[test]
    fn true_range_gap_up() {
        let bar = sample_bar();
        // high-low=20, |110-70|=40, |90-70|=20 → 40
        assert!((bar.true_range(70.0) - 40.0).abs() < f64::EPSILON);
    }

    #[test]
    fn true_range_gap_down() {
        let bar = sample_bar();
        // high-low=20, |110-130|=20, |90-130|=40 → 40
        assert!((bar.true_range(130.0) - 40.0).abs() < f64::EPSILON);
    }
}
