//! Summary statistics over the valuation of a trading record.

use crate::domain::num::{Num, NumFactory};
use crate::domain::record::TradingRecord;
use crate::domain::series::BarSeries;
use crate::domain::valuation::{CashFlow, Returns};

#[derive(Debug, Clone, PartialEq)]
pub struct Metrics {
    /// Final value of the cash flow, starting from one.
    pub gross_return: f64,
    /// Largest peak-to-trough fall of the cash flow, as a fraction of the
    /// peak.
    pub max_drawdown: f64,
    /// Longest run of bars spent below a previous peak.
    pub max_drawdown_duration: usize,
    /// Mean over standard deviation of the per-bar returns.
    pub sharpe_ratio: f64,
    /// Like `sharpe_ratio` but only penalising negative returns.
    pub sortino_ratio: f64,
    pub positions: usize,
    pub positions_won: usize,
    pub positions_lost: usize,
    pub positions_breakeven: usize,
    pub win_rate: f64,
    /// Mean number of bars between entry and exit of closed positions.
    pub average_holding_bars: f64,
}

impl Metrics {
    pub fn compute<F: NumFactory>(
        series: &BarSeries<F::Num>,
        record: &TradingRecord<F::Num>,
        cash_flow: &CashFlow<F>,
        returns: &Returns<F>,
        factory: F,
    ) -> Self {
        let equity = equity_curve(series, cash_flow);
        let gross_return = equity.last().copied().unwrap_or(1.0);
        let (max_drawdown, max_drawdown_duration) = compute_drawdown(&equity);

        let per_bar: Vec<f64> = returns
            .per_bar(series)
            .into_iter()
            .map(Num::to_f64)
            .collect();
        let (sharpe_ratio, sortino_ratio) = compute_risk_adjusted(&per_bar);

        let one = factory.one();
        let mut positions_won = 0usize;
        let mut positions_lost = 0usize;
        let mut positions_breakeven = 0usize;
        let mut total_bars = 0usize;
        for position in record.closed_positions() {
            match position.gross_ratio(&factory) {
                Some(ratio) if ratio > one => positions_won += 1,
                Some(ratio) if ratio < one => positions_lost += 1,
                _ => positions_breakeven += 1,
            }
            if let Some(exit) = position.exit() {
                total_bars += exit.index - position.entry().index;
            }
        }

        let positions = record.position_count();
        let win_rate = if positions > 0 {
            positions_won as f64 / positions as f64
        } else {
            0.0
        };
        let average_holding_bars = if positions > 0 {
            total_bars as f64 / positions as f64
        } else {
            0.0
        };

        Metrics {
            gross_return,
            max_drawdown,
            max_drawdown_duration,
            sharpe_ratio,
            sortino_ratio,
            positions,
            positions_won,
            positions_lost,
            positions_breakeven,
            win_rate,
            average_holding_bars,
        }
    }
}

/// Cash flow per bar, carrying the last recorded value over bars where
/// nothing was recorded.
fn equity_curve<F: NumFactory>(series: &BarSeries<F::Num>, cash_flow: &CashFlow<F>) -> Vec<f64> {
    let mut current = 1.0;
    series
        .bars()
        .iter()
        .map(|bar| {
            if let Some(value) = cash_flow.values().get(&bar.end) {
                current = value.to_f64();
            }
            current
        })
        .collect()
}

fn compute_drawdown(equity: &[f64]) -> (f64, usize) {
    let Some(&first) = equity.first() else {
        return (0.0, 0);
    };

    let mut peak = first;
    let mut max_dd = 0.0_f64;
    let mut max_dd_duration = 0usize;
    let mut current_dd_duration = 0usize;

    for &value in equity {
        if value >= peak {
            peak = value;
            current_dd_duration = 0;
        } else if peak > 0.0 {
            let dd = (peak - value) / peak;
            if dd > max_dd {
                max_dd = dd;
            }
            current_dd_duration += 1;
            if current_dd_duration > max_dd_duration {
                max_dd_duration = current_dd_duration;
            }
        }
    }

    (max_dd, max_dd_duration)
}

fn compute_risk_adjusted(returns: &[f64]) -> (f64, f64) {
    if returns.len() < 2 {
        return (0.0, 0.0);
    }

    let n = returns.len() as f64;
    let mean: f64 = returns.iter().sum::<f64>() / n;

    let variance: f64 = returns.iter().map(|r| (r - mean).powi(2)).sum::<f64>() / n;
    let stddev = variance.sqrt();

    let sharpe = if stddev > 0.0 { mean / stddev } else { 0.0 };

    let downside: f64 = returns
        .iter()
        .filter(|&&r| r < 0.0)
        .map(|r| r.powi(2))
        .sum::<f64>()
        / n;
    let downside_stddev = downside.sqrt();

    let sortino = if downside_stddev > 0.0 {
        mean / downside_stddev
    } else {
        0.0
    };

    (sharpe, sortino)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::num::DoubleFactory;
    use crate::domain::test_util::bars;
    use crate::domain::valuation::ReturnType;

    const F: DoubleFactory = DoubleFactory;

    fn compute(closes: &[f64], trades: &[usize]) -> Metrics {
        let series = BarSeries::from_bars("T", bars(closes));
        let mut record = TradingRecord::long();
        for &i in trades {
            let bar = series.bar(i).unwrap();
            record.operate(i, bar.end, bar.close, 1.0, &F).unwrap();
        }
        let cash_flow = CashFlow::new(&series, &record, F);
        let returns = Returns::new(&series, &record, ReturnType::Arithmetic, F);
        Metrics::compute(&series, &record, &cash_flow, &returns, F)
    }

    #[test]
    fn metrics_empty_record() {
        let metrics = compute(&[1.0, 2.0, 3.0], &[]);
        assert!((metrics.gross_return - 1.0).abs() < f64::EPSILON);
        assert_eq!(metrics.positions, 0);
        assert!((metrics.win_rate - 0.0).abs() < f64::EPSILON);
        assert!((metrics.sharpe_ratio - 0.0).abs() < f64::EPSILON);
    }

    #[test]
    fn metrics_gross_return_carries_past_exit() {
        let metrics = compute(&[100.0, 110.0, 120.0, 90.0], &[0, 2]);
        assert!((metrics.gross_return - 1.2).abs() < 1e-9);
    }

    #[test]
    fn metrics_counts_wins_and_losses() {
        let metrics = compute(&[10.0, 12.0, 12.0, 9.0, 9.0, 9.0], &[0, 1, 2, 3, 4, 5]);
        assert_eq!(metrics.positions, 3);
        assert_eq!(metrics.positions_won, 1);
        assert_eq!(metrics.positions_lost, 1);
        assert_eq!(metrics.positions_breakeven, 1);
        assert!((metrics.win_rate - 1.0 / 3.0).abs() < 1e-9);
        assert!((metrics.average_holding_bars - 1.0).abs() < 1e-9);
    }

    #[test]
    fn metrics_max_drawdown() {
        let (dd, _) = compute_drawdown(&[100.0, 110.0, 90.0, 95.0, 80.0, 100.0]);
        assert!((dd - (110.0 - 80.0) / 110.0).abs() < 1e-9);
    }

    #[test]
    fn metrics_max_drawdown_duration() {
        let (_, duration) = compute_drawdown(&[100.0, 110.0, 100.0, 90.0, 85.0, 95.0]);
        assert_eq!(duration, 4);
    }

    #[test]
    fn metrics_sharpe_positive_for_rising_prices() {
        let closes: Vec<f64> = (0..20).map(|i| 100.0 + i as f64 + (i % 3) as f64).collect();
        let metrics = compute(&closes, &[0, 19]);
        assert!(metrics.sharpe_ratio > 0.0);
        assert!(metrics.sortino_ratio.is_finite());
    }
}
