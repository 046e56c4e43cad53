//! Data access port trait.

use crate::domain::error::BarstreamError;
use crate::domain::num::NumFactory;
use crate::domain::record::PositionSpan;
use crate::domain::series::BarSeries;

pub trait DataPort {
    /// Loads the bar stream, converting prices through `factory`.
    fn load_bars<F: NumFactory>(&self, factory: &F) -> Result<BarSeries<F::Num>, BarstreamError>;

    /// Loads position spans. Empty when the source has none.
    fn load_positions(&self) -> Result<Vec<PositionSpan>, BarstreamError>;
}
