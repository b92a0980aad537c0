//! Persisted strategy aggregate: identity, lifecycle status, timestamps and
//! the optional backtest snapshot around a [`Strategy`] document.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

use crate::domain::metrics::BacktestMetrics;
use crate::domain::risk::{
    BreakevenConfig, PositionSizingConfig, StopLossConfig, TakeProfitConfig, TrailingStopConfig,
};
use crate::domain::strategy::{Strategy, StrategyBlock};
use crate::domain::variable::StrategyVariable;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StrategyStatus {
    Active,
    Testing,
    Paused,
    Archived,
}

impl StrategyStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            StrategyStatus::Active => "active",
            StrategyStatus::Testing => "testing",
            StrategyStatus::Paused => "paused",
            StrategyStatus::Archived => "archived",
        }
    }
}

impl fmt::Display for StrategyStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StrategyStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "active" => Ok(StrategyStatus::Active),
            "testing" => Ok(StrategyStatus::Testing),
            "paused" => Ok(StrategyStatus::Paused),
            "archived" => Ok(StrategyStatus::Archived),
            other => Err(format!(
                "unknown status '{other}', expected active, testing, paused or archived"
            )),
        }
    }
}

/// Everything a caller supplies to create a record; the store assigns the rest.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StrategyDraft {
    #[serde(flatten)]
    pub strategy: Strategy,
    pub status: StrategyStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub backtest_metrics: Option<BacktestMetrics>,
}

impl StrategyDraft {
    /// New, untrusted draft: `testing` status, no metrics.
    pub fn testing(strategy: Strategy) -> Self {
        Self {
            strategy,
            status: StrategyStatus::Testing,
            backtest_metrics: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredStrategy {
    pub id: u64,
    #[serde(flatten)]
    pub strategy: Strategy,
    pub status: StrategyStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub backtest_metrics: Option<BacktestMetrics>,
}

impl StoredStrategy {
    pub fn from_draft(draft: StrategyDraft, id: u64, now: DateTime<Utc>) -> Self {
        Self {
            id,
            strategy: draft.strategy,
            status: draft.status,
            created_at: now,
            updated_at: now,
            backtest_metrics: draft.backtest_metrics,
        }
    }

    pub fn name(&self) -> &str {
        &self.strategy.name
    }

    /// Shallow merge of `patch` over this record. Supplied nested values
    /// replace the existing ones whole. `id` and `createdAt` are untouched;
    /// the caller sets `updatedAt`.
    pub fn apply(&mut self, patch: StrategyPatch) {
        let StrategyPatch {
            name,
            description,
            timeframe,
            position_sizing,
            variables,
            entry_blocks,
            exit_blocks,
            stop_loss,
            take_profit,
            trailing_stop,
            breakeven,
            status,
            backtest_metrics,
        } = patch;
        let s = &mut self.strategy;

        if let Some(v) = name {
            s.name = v;
        }
        if let Some(v) = description {
            s.description = v;
        }
        if let Some(v) = timeframe {
            s.timeframe = v;
        }
        if let Some(v) = position_sizing {
            s.position_sizing = v;
        }
        if let Some(v) = variables {
            s.variables = v;
        }
        if let Some(v) = entry_blocks {
            s.entry_blocks = v;
        }
        if let Some(v) = exit_blocks {
            s.exit_blocks = v;
        }
        if let Some(v) = stop_loss {
            s.stop_loss = v;
        }
        if let Some(v) = take_profit {
            s.take_profit = v;
        }
        if let Some(v) = trailing_stop {
            s.trailing_stop = v;
        }
        if let Some(v) = breakeven {
            s.breakeven = v;
        }
        if let Some(v) = status {
            self.status = v;
        }
        if let Some(v) = backtest_metrics {
            self.backtest_metrics = v;
        }
    }
}

/// Caller-overridable fields of a stored record.
///
/// Outer `None` leaves a field alone. For optional fields, `Some(None)`
/// clears it. Identity and timestamps are not representable here, so a patch
/// parsed from an untrusted payload cannot touch them.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StrategyPatch {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "present")]
    pub description: Option<Option<String>>,
    #[serde(default)]
    pub timeframe: Option<String>,
    #[serde(default, deserialize_with = "present")]
    pub position_sizing: Option<Option<PositionSizingConfig>>,
    #[serde(default)]
    pub variables: Option<Vec<StrategyVariable>>,
    #[serde(default)]
    pub entry_blocks: Option<Vec<StrategyBlock>>,
    #[serde(default)]
    pub exit_blocks: Option<Vec<StrategyBlock>>,
    #[serde(default, deserialize_with = "present")]
    pub stop_loss: Option<Option<StopLossConfig>>,
    #[serde(default, deserialize_with = "present")]
    pub take_profit: Option<Option<TakeProfitConfig>>,
    #[serde(default, deserialize_with = "present")]
    pub trailing_stop: Option<Option<TrailingStopConfig>>,
    #[serde(default, deserialize_with = "present")]
    pub breakeven: Option<Option<BreakevenConfig>>,
    #[serde(default)]
    pub status: Option<StrategyStatus>,
    #[serde(default, deserialize_with = "present")]
    pub backtest_metrics: Option<Option<BacktestMetrics>>,
}

impl StrategyPatch {
    pub fn status(status: StrategyStatus) -> Self {
        Self {
            status: Some(status),
            ..Self::default()
        }
    }

    pub fn metrics(metrics: Option<BacktestMetrics>) -> Self {
        Self {
            backtest_metrics: Some(metrics),
            ..Self::default()
        }
    }
}

// A key that is present maps to `Some(..)`, so an explicit `null` clears the
// field while an absent key leaves it alone.
fn present<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::risk::StopLossType;
    use crate::domain::variable::NumericValue;
    use chrono::TimeZone;

    fn ts(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(secs, 0).unwrap()
    }

    fn metrics() -> BacktestMetrics {
        BacktestMetrics {
            win_rate: 60.0,
            total_trades: 10,
            profit_factor: 1.5,
            sharpe_ratio: 1.2,
            max_drawdown: 8.0,
            avg_win: 50.0,
            avg_loss: -30.0,
        }
    }

    fn record() -> StoredStrategy {
        let mut strategy = Strategy::new("Base", "1h");
        strategy.description = Some("desc".into());
        StoredStrategy::from_draft(
            StrategyDraft {
                strategy,
                status: StrategyStatus::Active,
                backtest_metrics: Some(metrics()),
            },
            7,
            ts(1_000),
        )
    }

    #[test]
    fn status_parses_case_insensitively() {
        assert_eq!("Paused".parse::<StrategyStatus>().unwrap(), StrategyStatus::Paused);
        assert!("deleted".parse::<StrategyStatus>().is_err());
        assert_eq!(StrategyStatus::Archived.to_string(), "archived");
    }

    #[test]
    fn stored_record_flattens_document() {
        let json = serde_json::to_value(record()).unwrap();
        assert_eq!(json["id"], 7);
        assert_eq!(json["name"], "Base");
        assert_eq!(json["status"], "active");
        assert!(json["createdAt"].as_str().unwrap().starts_with("1970-01-01T00:16:40"));
        assert_eq!(json["backtestMetrics"]["winRate"], 60.0);
    }

    #[test]
    fn stored_record_round_trips() {
        let original = record();
        let text = serde_json::to_string(&original).unwrap();
        let back: StoredStrategy = serde_json::from_str(&text).unwrap();
        assert_eq!(back, original);
    }

    #[test]
    fn apply_replaces_only_supplied_fields() {
        let mut r = record();
        r.apply(StrategyPatch {
            name: Some("Renamed".into()),
            stop_loss: Some(Some(StopLossConfig {
                enabled: true,
                kind: StopLossType::Pips,
                value: Some(NumericValue::Literal(20.0)),
            })),
            ..StrategyPatch::default()
        });
        assert_eq!(r.name(), "Renamed");
        assert_eq!(r.strategy.description.as_deref(), Some("desc"));
        assert!(r.strategy.stop_loss.is_some());
        assert_eq!(r.status, StrategyStatus::Active);
        assert_eq!(r.id, 7);
    }

    #[test]
    fn metrics_patch_can_clear() {
        let mut r = record();
        r.apply(StrategyPatch::metrics(None));
        assert!(r.backtest_metrics.is_none());
    }

    #[test]
    fn patch_json_distinguishes_absent_and_null() {
        let patch: StrategyPatch =
            serde_json::from_str(r#"{"description": null, "status": "paused"}"#).unwrap();
        assert_eq!(patch.description, Some(None));
        assert_eq!(patch.stop_loss, None);
        assert_eq!(patch.status, Some(StrategyStatus::Paused));
    }

    #[test]
    fn patch_json_ignores_identity_fields() {
        let patch: StrategyPatch = serde_json::from_str(
            r#"{"id": 1, "createdAt": "2000-01-01T00:00:00Z", "name": "X"}"#,
        )
        .unwrap();
        let mut r = record();
        r.apply(patch);
        assert_eq!(r.id, 7);
        assert_eq!(r.created_at, ts(1_000));
        assert_eq!(r.name(), "X");
    }
}
