//! Backtest metric snapshots and the result shape produced by an external
//! backtester.

use serde::{Deserialize, Serialize};

/// Summary snapshot stored on a strategy record. Opaque to the store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BacktestMetrics {
    pub win_rate: f64,
    pub total_trades: u32,
    pub profit_factor: f64,
    pub sharpe_ratio: f64,
    pub max_drawdown: f64,
    pub avg_win: f64,
    pub avg_loss: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TradeSide {
    Long,
    Short,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BacktestTrade {
    pub id: u64,
    pub entry_time: String,
    pub exit_time: String,
    #[serde(rename = "type")]
    pub side: TradeSide,
    pub entry_price: f64,
    pub exit_price: f64,
    pub size: f64,
    pub profit: f64,
    pub profit_percent: f64,
    #[serde(default)]
    pub pips: f64,
    /// Seconds.
    #[serde(default)]
    pub duration: u64,
    #[serde(default)]
    pub entry_reason: String,
    #[serde(default)]
    pub exit_reason: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EquityPoint {
    pub time: String,
    pub equity: f64,
    pub drawdown: f64,
}

/// Full metric set reported by a backtest run. Fields the backtester omits
/// default to zero.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ResultMetrics {
    pub total_trades: u32,
    pub winning_trades: u32,
    pub losing_trades: u32,
    pub win_rate: f64,
    pub total_profit: f64,
    pub total_loss: f64,
    pub net_profit: f64,
    pub profit_factor: f64,
    pub average_win: f64,
    pub average_loss: f64,
    pub largest_win: f64,
    pub largest_loss: f64,
    pub sharpe_ratio: f64,
    pub sortino_ratio: f64,
    pub calmar_ratio: f64,
    pub max_drawdown: f64,
    pub max_drawdown_percent: f64,
    pub expectancy: f64,
    pub initial_balance: f64,
    pub final_balance: f64,
    pub return_percent: f64,
}

impl ResultMetrics {
    pub fn snapshot(&self) -> BacktestMetrics {
        BacktestMetrics {
            win_rate: self.win_rate,
            total_trades: self.total_trades,
            profit_factor: self.profit_factor,
            sharpe_ratio: self.sharpe_ratio,
            max_drawdown: self.max_drawdown,
            avg_win: self.average_win,
            avg_loss: self.average_loss,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BacktestResult {
    pub success: bool,
    pub strategy_name: String,
    pub symbol: String,
    pub timeframe: String,
    pub start_date: String,
    pub end_date: String,
    pub metrics: ResultMetrics,
    #[serde(default)]
    pub trades: Vec<BacktestTrade>,
    #[serde(default)]
    pub equity_curve: Vec<EquityPoint>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}
