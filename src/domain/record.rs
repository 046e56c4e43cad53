//! Trading record: closed positions plus at most one open position.

use chrono::{DateTime, Utc};
use tracing::debug;

use crate::domain::error::BarstreamError;
use crate::domain::num::{Num, NumFactory};
use crate::domain::position::{HoldingCostModel, Position, Trade, TradeKind, TransactionCostModel};
use crate::domain::series::BarSeries;

/// Bar indices of one position as read from a positions file. `exit_index`
/// is `None` for a position still open at the end of the data.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PositionSpan {
    pub entry_index: usize,
    pub exit_index: Option<usize>,
}

#[derive(Debug, Clone)]
pub struct TradingRecord<N: Num> {
    starting_kind: TradeKind,
    closed: Vec<Position<N>>,
    current: Option<Position<N>>,
    transaction_cost_model: TransactionCostModel<N>,
    holding_cost_model: HoldingCostModel<N>,
    last_index: Option<usize>,
}

impl<N: Num> TradingRecord<N> {
    /// Record whose positions open with `starting_kind` trades: `Buy` for
    /// long-only, `Sell` for short-only.
    pub fn new(
        starting_kind: TradeKind,
        transaction_cost_model: TransactionCostModel<N>,
        holding_cost_model: HoldingCostModel<N>,
    ) -> Self {
        Self {
            starting_kind,
            closed: Vec::new(),
            current: None,
            transaction_cost_model,
            holding_cost_model,
            last_index: None,
        }
    }

    /// Long-first record without any costs.
    pub fn long() -> Self {
        Self::new(TradeKind::Buy, TransactionCostModel::Zero, HoldingCostModel::Zero)
    }

    pub fn short() -> Self {
        Self::new(TradeKind::Sell, TransactionCostModel::Zero, HoldingCostModel::Zero)
    }

    pub fn starting_kind(&self) -> TradeKind {
        self.starting_kind
    }

    pub fn transaction_cost_model(&self) -> TransactionCostModel<N> {
        self.transaction_cost_model
    }

    pub fn holding_cost_model(&self) -> HoldingCostModel<N> {
        self.holding_cost_model
    }

    /// Opens a position. Returns `false` if one is already open.
    pub fn enter<F: NumFactory<Num = N>>(
        &mut self,
        index: usize,
        time: DateTime<Utc>,
        price: N,
        amount: N,
        factory: &F,
    ) -> Result<bool, BarstreamError> {
        if self.current.is_some() {
            return Ok(false);
        }
        self.check_index(index)?;
        let trade = self.trade(self.starting_kind, index, time, price, amount, factory);
        debug!(index, kind = ?trade.kind, price = %trade.price, "entering position");
        self.current = Some(Position::open(trade, self.holding_cost_model));
        self.last_index = Some(index);
        Ok(true)
    }

    /// Closes the open position. Returns `false` if nothing is open.
    pub fn exit<F: NumFactory<Num = N>>(
        &mut self,
        index: usize,
        time: DateTime<Utc>,
        price: N,
        amount: N,
        factory: &F,
    ) -> Result<bool, BarstreamError> {
        if self.current.is_none() {
            return Ok(false);
        }
        self.check_index(index)?;
        let trade = self.trade(self.starting_kind.complement(), index, time, price, amount, factory);
        let Some(position) = self.current.as_mut() else {
            return Ok(false);
        };
        debug!(index, price = %trade.price, "exiting position");
        position.close(trade)?;
        if let Some(position) = self.current.take() {
            self.closed.push(position);
        }
        self.last_index = Some(index);
        Ok(true)
    }

    /// Enters when flat, exits when a position is open.
    pub fn operate<F: NumFactory<Num = N>>(
        &mut self,
        index: usize,
        time: DateTime<Utc>,
        price: N,
        amount: N,
        factory: &F,
    ) -> Result<(), BarstreamError> {
        if self.current.is_some() {
            self.exit(index, time, price, amount, factory)?;
        } else {
            self.enter(index, time, price, amount, factory)?;
        }
        Ok(())
    }

    /// Trades one unit at the close of each span's entry and exit bars.
    pub fn replay<F: NumFactory<Num = N>>(
        &mut self,
        series: &BarSeries<N>,
        spans: &[PositionSpan],
        factory: &F,
    ) -> Result<(), BarstreamError> {
        for span in spans {
            let indices = std::iter::once(span.entry_index).chain(span.exit_index);
            for index in indices {
                let bar = series.bar(index).ok_or_else(|| {
                    let reason = format!(
                        "bar {index} is outside the {} bars of {}",
                        series.len(),
                        series.name()
                    );
                    BarstreamError::invalid_parameter("index", reason)
                })?;
                self.operate(index, bar.end, bar.close, factory.one(), factory)?;
            }
        }
        debug!(positions = self.position_count(), open = !self.is_closed(), "record replayed");
        Ok(())
    }

    pub fn closed_positions(&self) -> &[Position<N>] {
        &self.closed
    }

    pub fn current_position(&self) -> Option<&Position<N>> {
        self.current.as_ref()
    }

    /// Closed positions followed by the open one, if any.
    pub fn positions(&self) -> impl Iterator<Item = &Position<N>> + '_ {
        self.closed.iter().chain(self.current.iter())
    }

    pub fn is_closed(&self) -> bool {
        self.current.is_none()
    }

    pub fn position_count(&self) -> usize {
        self.closed.len()
    }

    pub fn last_trade_index(&self) -> Option<usize> {
        self.last_index
    }

    fn check_index(&self, index: usize) -> Result<(), BarstreamError> {
        match self.last_index {
            Some(last) if index <= last => Err(BarstreamError::invalid_parameter(
                "index",
                format!("trade at bar {index} does not follow the previous trade at bar {last}"),
            )),
            _ => Ok(()),
        }
    }

    fn trade<F: NumFactory<Num = N>>(
        &self,
        kind: TradeKind,
        index: usize,
        time: DateTime<Utc>,
        price: N,
        amount: N,
        factory: &F,
    ) -> Trade<N> {
        Trade::new(kind, index, time, price, amount, &self.transaction_cost_model, factory)
    }
}
