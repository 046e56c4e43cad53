//! Trades, positions and the cost models applied to them.

use chrono::{DateTime, Utc};

use crate::domain::error::BarstreamError;
use crate::domain::num::{Num, NumFactory};

/// Direction of a single trade.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TradeKind {
    Buy,
    Sell,
}

impl TradeKind {
    pub fn complement(self) -> Self {
        match self {
            TradeKind::Buy => TradeKind::Sell,
            TradeKind::Sell => TradeKind::Buy,
        }
    }
}

/// Fee charged when a trade executes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TransactionCostModel<N> {
    Zero,
    /// Fraction of the traded value, e.g. `0.001` for 10 bp.
    Linear { fee_per_trade: N },
}

impl<N: Num> TransactionCostModel<N> {
    pub fn linear(fee_per_trade: N) -> Result<Self, BarstreamError> {
        if fee_per_trade.is_negative() || fee_per_trade.is_nan() {
            return Err(BarstreamError::invalid_parameter(
                "transaction_fee",
                "fee must be a non-negative number",
            ));
        }
        Ok(TransactionCostModel::Linear { fee_per_trade })
    }

    /// Total cost of trading `amount` units at `price`.
    pub fn cost<F: NumFactory<Num = N>>(&self, price: N, amount: N, factory: &F) -> N {
        match *self {
            TransactionCostModel::Zero => factory.zero(),
            TransactionCostModel::Linear { fee_per_trade } => price * amount * fee_per_trade,
        }
    }
}

/// Cost of keeping a position open.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum HoldingCostModel<N> {
    Zero,
    /// Borrowing fee per bar, charged on short positions only, as a
    /// fraction of the entry value.
    LinearBorrowing { fee_per_period: N },
}

impl<N: Num> HoldingCostModel<N> {
    pub fn linear_borrowing(fee_per_period: N) -> Result<Self, BarstreamError> {
        if fee_per_period.is_negative() || fee_per_period.is_nan() {
            return Err(BarstreamError::invalid_parameter(
                "borrowing_fee",
                "fee must be a non-negative number",
            ));
        }
        Ok(HoldingCostModel::LinearBorrowing { fee_per_period })
    }
}

/// One executed order.
#[derive(Debug, Clone, PartialEq)]
pub struct Trade<N> {
    pub kind: TradeKind,
    /// Bar index the trade executed on.
    pub index: usize,
    pub time: DateTime<Utc>,
    /// Execution price per asset.
    pub price: N,
    /// Price per asset after transaction costs: higher for buys, lower for
    /// sells.
    pub net_price: N,
    pub amount: N,
    pub cost: N,
}

impl<N: Num> Trade<N> {
    #[allow(clippy::too_many_arguments)]
    pub fn new<F: NumFactory<Num = N>>(
        kind: TradeKind,
        index: usize,
        time: DateTime<Utc>,
        price: N,
        amount: N,
        cost_model: &TransactionCostModel<N>,
        factory: &F,
    ) -> Self {
        let cost = cost_model.cost(price, amount, factory);
        let per_asset = if amount.is_zero() {
            factory.zero()
        } else {
            cost / amount
        };
        let net_price = match kind {
            TradeKind::Buy => price + per_asset,
            TradeKind::Sell => price - per_asset,
        };
        Self {
            kind,
            index,
            time,
            price,
            net_price,
            amount,
            cost,
        }
    }

    /// Traded value at the execution price.
    pub fn value(&self) -> N {
        self.price * self.amount
    }

    pub fn is_buy(&self) -> bool {
        self.kind == TradeKind::Buy
    }
}

/// An entry trade and, once closed, the opposite exit trade.
#[derive(Debug, Clone, PartialEq)]
pub struct Position<N> {
    entry: Trade<N>,
    exit: Option<Trade<N>>,
    holding_cost_model: HoldingCostModel<N>,
}

impl<N: Num> Position<N> {
    pub fn open(entry: Trade<N>, holding_cost_model: HoldingCostModel<N>) -> Self {
        Self {
            entry,
            exit: None,
            holding_cost_model,
        }
    }

    /// Records the exit. Fails if the position is already closed, the exit
    /// has the same direction as the entry or precedes it.
    pub fn close(&mut self, exit: Trade<N>) -> Result<(), BarstreamError> {
        if self.exit.is_some() {
            return Err(BarstreamError::invalid_parameter("exit", "position already closed"));
        }
        if exit.kind == self.entry.kind {
            return Err(BarstreamError::invalid_parameter(
                "exit",
                "exit must trade in the opposite direction",
            ));
        }
        if exit.index < self.entry.index {
            return Err(BarstreamError::invalid_parameter(
                "exit",
                format!("exit bar {} precedes entry bar {}", exit.index, self.entry.index),
            ));
        }
        self.exit = Some(exit);
        Ok(())
    }

    pub fn entry(&self) -> &Trade<N> {
        &self.entry
    }

    pub fn exit(&self) -> Option<&Trade<N>> {
        self.exit.as_ref()
    }

    pub fn is_open(&self) -> bool {
        self.exit.is_none()
    }

    pub fn is_closed(&self) -> bool {
        self.exit.is_some()
    }

    pub fn is_long(&self) -> bool {
        self.entry.is_buy()
    }

    pub fn holding_cost_model(&self) -> HoldingCostModel<N> {
        self.holding_cost_model
    }

    /// Accumulated holding cost up to the exit, or up to `final_index` while
    /// the position is open.
    pub fn holding_cost<F: NumFactory<Num = N>>(&self, final_index: usize, factory: &F) -> N {
        match self.holding_cost_model {
            HoldingCostModel::Zero => factory.zero(),
            HoldingCostModel::LinearBorrowing { fee_per_period } => {
                if self.is_long() {
                    return factory.zero();
                }
                let last = self.exit.as_ref().map_or(final_index, |t| t.index);
                let periods = last.saturating_sub(self.entry.index);
                self.entry.value() * fee_per_period * factory.from_count(periods)
            }
        }
    }

    /// Entry-to-exit price ratio after costs: above one for a profitable
    /// position. `None` while open or when the entry price is zero.
    pub fn gross_ratio<F: NumFactory<Num = N>>(&self, factory: &F) -> Option<N> {
        let exit = self.exit.as_ref()?;
        let entry = self.entry.net_price;
        if entry.is_zero() {
            return None;
        }
        let ratio = exit.net_price / entry;
        Some(if self.is_long() {
            ratio
        } else {
            factory.two() - ratio
        })
    }
}
