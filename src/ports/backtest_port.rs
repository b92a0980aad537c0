//! External backtester seam. The store only keeps the metric snapshot of
//! what a backtester returns.

use crate::domain::error::KumoError;
use crate::domain::metrics::BacktestResult;
use crate::domain::stored_strategy::StoredStrategy;

pub trait BacktestPort {
    fn run(&self, strategy: &StoredStrategy) -> Result<BacktestResult, KumoError>;
}
