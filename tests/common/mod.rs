#![allow(dead_code)]

use chrono::{DateTime, Duration, TimeZone, Utc};
use kumo::adapters::memory_storage::MemoryStorage;
use kumo::domain::action::{ParameterMap, ParameterValue};
use kumo::domain::error::{KumoError, ValidationError};
use kumo::domain::metrics::{BacktestMetrics, BacktestResult, EquityPoint, ResultMetrics};
use kumo::domain::risk::{
    BreakevenConfig, PositionSizingConfig, PositionSizingType, StopLossConfig, StopLossType,
    TakeProfitConfig, TakeProfitType,
};
use kumo::domain::store::StrategyStore;
use kumo::domain::strategy::{
    BlockType, ComparisonValue, ConfiguredIndicator, Strategy, StrategyAction, StrategyBlock,
    StrategyRule,
};
use kumo::domain::stored_strategy::{StoredStrategy, StrategyDraft, StrategyStatus};
use kumo::domain::variable::{NumericValue, StrategyVariable, VariableReference};
use kumo::ports::backtest_port::BacktestPort;
use kumo::ports::clock_port::Clock;
use kumo::ports::codegen_port::{CodeGenPort, TargetLanguage};
use std::cell::{Cell, RefCell};
use std::rc::Rc;

pub const T0_MILLIS: i64 = 1_700_000_000_000;

pub fn at_millis(millis: i64) -> DateTime<Utc> {
    Utc.timestamp_millis_opt(millis).unwrap()
}

/// Clock shared with the test so it can be moved between calls.
#[derive(Clone)]
pub struct ManualClock(Rc<Cell<i64>>);

impl ManualClock {
    pub fn new(millis: i64) -> Self {
        Self(Rc::new(Cell::new(millis)))
    }

    pub fn advance(&self, by: Duration) {
        self.0.set(self.0.get() + by.num_milliseconds());
    }

    pub fn set(&self, millis: i64) {
        self.0.set(millis);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        at_millis(self.0.get())
    }
}

pub fn memory_store() -> (StrategyStore<MemoryStorage>, ManualClock) {
    let clock = ManualClock::new(T0_MILLIS);
    let store = StrategyStore::with_clock(MemoryStorage::new(), Box::new(clock.clone()));
    (store, clock)
}

pub fn params(entries: &[(&str, ParameterValue)]) -> ParameterMap {
    entries
        .iter()
        .map(|(k, v)| (k.to_string(), v.clone()))
        .collect()
}

pub fn num(v: f64) -> ParameterValue {
    ParameterValue::Numeric(NumericValue::Literal(v))
}

pub fn var(name: &str) -> ParameterValue {
    ParameterValue::Numeric(NumericValue::variable(name))
}

pub fn text(v: &str) -> ParameterValue {
    ParameterValue::Text(v.to_string())
}

pub fn indicator(name: &str, parameters: ParameterMap) -> ConfiguredIndicator {
    ConfiguredIndicator {
        indicator: name.to_string(),
        parameters,
        label: None,
    }
}

pub fn block(id: &str, kind: BlockType, rules: Vec<StrategyRule>, actions: Vec<StrategyAction>) -> StrategyBlock {
    StrategyBlock {
        id: id.to_string(),
        kind,
        name: id.to_string(),
        rules,
        actions,
        enabled: true,
    }
}

/// RSI mean-reversion document referencing three variables.
pub fn rsi_strategy() -> Strategy {
    let mut s = Strategy::new("RSI Reversal", "1h");
    s.description = Some("Buy oversold, exit overbought".to_string());
    s.variables = vec![
        StrategyVariable::new("RSI_PERIOD", 14.0).with_range(7.0, 21.0, 7.0),
        StrategyVariable::new("RSI_LOW", 30.0).with_range(20.0, 30.0, 5.0),
        StrategyVariable::new("SL", 20.0),
    ];
    s.position_sizing = Some(PositionSizingConfig {
        kind: PositionSizingType::RiskPercent,
        value: NumericValue::Literal(1.0),
    });
    s.entry_blocks = vec![block(
        "entry-1",
        BlockType::Entry,
        vec![StrategyRule {
            id: "r1".to_string(),
            indicator: indicator("rsi", params(&[("period", var("RSI_PERIOD"))])),
            condition: "less_than".to_string(),
            comparison_value: ComparisonValue::Variable {
                variable_reference: VariableReference::named("RSI_LOW"),
            },
            logical_operator: None,
        }],
        vec![StrategyAction {
            id: "a1".to_string(),
            action: "buy_market".to_string(),
            parameters: ParameterMap::new(),
        }],
    )];
    s.exit_blocks = vec![block(
        "exit-1",
        BlockType::Exit,
        vec![StrategyRule {
            id: "r2".to_string(),
            indicator: indicator("rsi", params(&[("period", num(14.0))])),
            condition: "greater_than".to_string(),
            comparison_value: ComparisonValue::Number { numeric_value: 70.0 },
            logical_operator: None,
        }],
        vec![StrategyAction {
            id: "a2".to_string(),
            action: "modify_position".to_string(),
            parameters: params(&[("action", text("partial_close")), ("percentage", num(50.0))]),
        }],
    )];
    s.stop_loss = Some(StopLossConfig {
        enabled: true,
        kind: StopLossType::Pips,
        value: Some(NumericValue::variable("SL")),
    });
    s.take_profit = Some(TakeProfitConfig {
        enabled: true,
        kind: TakeProfitType::Ratio,
        value: Some(NumericValue::Literal(2.0)),
    });
    s.breakeven = Some(BreakevenConfig {
        enabled: false,
        trigger: None,
        offset: None,
    });
    s
}

pub fn draft(name: &str) -> StrategyDraft {
    StrategyDraft::testing(Strategy::new(name, "4h"))
}

pub fn sample_metrics() -> BacktestMetrics {
    BacktestMetrics {
        win_rate: 58.0,
        total_trades: 42,
        profit_factor: 1.7,
        sharpe_ratio: 1.3,
        max_drawdown: 9.5,
        avg_win: 120.0,
        avg_loss: -70.0,
    }
}

/// Backtester fake returning canned metrics and recording what it ran.
pub struct MockBacktester {
    pub metrics: ResultMetrics,
    pub fail_with: Option<String>,
    pub runs: RefCell<Vec<u64>>,
}

impl MockBacktester {
    pub fn new(metrics: ResultMetrics) -> Self {
        Self {
            metrics,
            fail_with: None,
            runs: RefCell::new(Vec::new()),
        }
    }

    pub fn failing(reason: &str) -> Self {
        Self {
            fail_with: Some(reason.to_string()),
            ..Self::new(ResultMetrics::default())
        }
    }
}

impl BacktestPort for MockBacktester {
    fn run(&self, strategy: &StoredStrategy) -> Result<BacktestResult, KumoError> {
        self.runs.borrow_mut().push(strategy.id);
        Ok(BacktestResult {
            success: self.fail_with.is_none(),
            strategy_name: strategy.name().to_string(),
            symbol: "EURUSD".to_string(),
            timeframe: strategy.strategy.timeframe.clone(),
            start_date: "2024-01-01".to_string(),
            end_date: "2024-06-30".to_string(),
            metrics: self.metrics.clone(),
            trades: Vec::new(),
            equity_curve: vec![EquityPoint {
                time: "2024-01-01".to_string(),
                equity: 10_000.0,
                drawdown: 0.0,
            }],
            error: self.fail_with.clone(),
        })
    }
}

/// Code generator fake: emits a one-line header naming the language.
pub struct HeaderCodeGen;

impl CodeGenPort for HeaderCodeGen {
    fn generate(&self, strategy: &StoredStrategy, language: TargetLanguage) -> Result<String, KumoError> {
        if strategy.status == StrategyStatus::Archived {
            return Err(vec![ValidationError::new("status", "archived strategy")].into());
        }
        Ok(format!("// {} for {}\n", strategy.name(), language))
    }
}
