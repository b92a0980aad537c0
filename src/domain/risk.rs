//! Risk module configurations: stop-loss, take-profit, trailing-stop,
//! breakeven and position sizing.
//!
//! Each module is independent. A disabled module is always valid; an enabled
//! one must carry every value it needs, and variable references must resolve
//! against the owning document's variables.

use serde::{Deserialize, Serialize};

use crate::domain::error::{KumoError, ValidationError};
use crate::domain::variable::{NumericValue, StrategyVariable};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StopLossType {
    Pips,
    Points,
    Percentage,
    Price,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TakeProfitType {
    Pips,
    Points,
    Percentage,
    Price,
    Ratio,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PositionSizingType {
    FixedLots,
    PercentBalance,
    RiskPercent,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StopLossConfig {
    pub enabled: bool,
    #[serde(rename = "type")]
    pub kind: StopLossType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<NumericValue>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TakeProfitConfig {
    pub enabled: bool,
    #[serde(rename = "type")]
    pub kind: TakeProfitType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<NumericValue>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrailingStopConfig {
    pub enabled: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub distance: Option<NumericValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub step: Option<NumericValue>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BreakevenConfig {
    pub enabled: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trigger: Option<NumericValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub offset: Option<NumericValue>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PositionSizingConfig {
    #[serde(rename = "type")]
    pub kind: PositionSizingType,
    pub value: NumericValue,
}

/// A resolved numeric field of a risk module.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ResolvedField {
    pub field: &'static str,
    pub value: f64,
}

/// Shared shape of every risk module: an enabled flag plus named numeric
/// fields that may be literals or variable references.
pub trait RiskModule {
    /// Document key of the module, e.g. `stopLoss`.
    fn key(&self) -> &'static str;

    fn is_enabled(&self) -> bool;

    /// Unit the values are expressed in, when the module declares one.
    fn unit(&self) -> Option<&'static str> {
        None
    }

    fn fields(&self) -> Vec<(&'static str, Option<&NumericValue>)>;

    /// Collect violations; keys are relative to the module (`value`, `distance`).
    fn validate(&self, variables: &[StrategyVariable]) -> Vec<ValidationError> {
        if !self.is_enabled() {
            return Vec::new();
        }
        let mut errors = Vec::new();
        for (field, value) in self.fields() {
            let Some(value) = value else {
                errors.push(ValidationError::new(field, "required when enabled"));
                continue;
            };
            match value.resolve(variables) {
                Ok(v) if v < 0.0 => {
                    errors.push(ValidationError::new(field, format!("{v} must be non-negative")));
                }
                Ok(_) => {}
                Err(e) => errors.push(ValidationError::new(field, e.to_string())),
            }
        }
        errors
    }

    /// Resolve every field. `None` for a disabled module; the first unresolved
    /// reference or missing value aborts.
    fn resolve(&self, variables: &[StrategyVariable]) -> Result<Option<Vec<ResolvedField>>, KumoError> {
        if !self.is_enabled() {
            return Ok(None);
        }
        self.fields()
            .into_iter()
            .map(|(field, value)| -> Result<ResolvedField, KumoError> {
                let value = value.ok_or_else(|| {
                    KumoError::from(vec![ValidationError::new(
                        format!("{}.{field}", self.key()),
                        "required when enabled",
                    )])
                })?;
                Ok(ResolvedField {
                    field,
                    value: value.resolve(variables)?,
                })
            })
            .collect::<Result<Vec<_>, KumoError>>()
            .map(Some)
    }
}

impl StopLossType {
    pub fn as_str(self) -> &'static str {
        match self {
            StopLossType::Pips => "pips",
            StopLossType::Points => "points",
            StopLossType::Percentage => "percentage",
            StopLossType::Price => "price",
        }
    }
}

impl TakeProfitType {
    pub fn as_str(self) -> &'static str {
        match self {
            TakeProfitType::Pips => "pips",
            TakeProfitType::Points => "points",
            TakeProfitType::Percentage => "percentage",
            TakeProfitType::Price => "price",
            TakeProfitType::Ratio => "ratio",
        }
    }
}

impl RiskModule for StopLossConfig {
    fn key(&self) -> &'static str {
        "stopLoss"
    }
    fn is_enabled(&self) -> bool {
        self.enabled
    }
    fn unit(&self) -> Option<&'static str> {
        Some(self.kind.as_str())
    }
    fn fields(&self) -> Vec<(&'static str, Option<&NumericValue>)> {
        vec![("value", self.value.as_ref())]
    }
}

impl RiskModule for TakeProfitConfig {
    fn key(&self) -> &'static str {
        "takeProfit"
    }
    fn is_enabled(&self) -> bool {
        self.enabled
    }
    fn unit(&self) -> Option<&'static str> {
        Some(self.kind.as_str())
    }
    fn fields(&self) -> Vec<(&'static str, Option<&NumericValue>)> {
        vec![("value", self.value.as_ref())]
    }
}

impl RiskModule for TrailingStopConfig {
    fn key(&self) -> &'static str {
        "trailingStop"
    }
    fn is_enabled(&self) -> bool {
        self.enabled
    }
    fn fields(&self) -> Vec<(&'static str, Option<&NumericValue>)> {
        vec![("distance", self.distance.as_ref()), ("step", self.step.as_ref())]
    }
}

impl RiskModule for BreakevenConfig {
    fn key(&self) -> &'static str {
        "breakeven"
    }
    fn is_enabled(&self) -> bool {
        self.enabled
    }
    fn fields(&self) -> Vec<(&'static str, Option<&NumericValue>)> {
        vec![("trigger", self.trigger.as_ref()), ("offset", self.offset.as_ref())]
    }
}

// Position sizing has no on/off switch; it applies whenever present.
impl RiskModule for PositionSizingConfig {
    fn key(&self) -> &'static str {
        "positionSizing"
    }
    fn is_enabled(&self) -> bool {
        true
    }
    fn fields(&self) -> Vec<(&'static str, Option<&NumericValue>)> {
        vec![("value", Some(&self.value))]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vars() -> Vec<StrategyVariable> {
        vec![StrategyVariable::new("SL", 25.0), StrategyVariable::new("Neg", -1.0)]
    }

    #[test]
    fn disabled_module_without_value_is_valid() {
        let sl = StopLossConfig {
            enabled: false,
            kind: StopLossType::Pips,
            value: None,
        };
        assert!(sl.validate(&[]).is_empty());
        assert_eq!(sl.resolve(&[]).unwrap(), None);
    }

    #[test]
    fn disabled_module_ignores_dangling_reference() {
        let tp = TakeProfitConfig {
            enabled: false,
            kind: TakeProfitType::Ratio,
            value: Some(NumericValue::variable("Missing")),
        };
        assert!(tp.validate(&[]).is_empty());
    }

    #[test]
    fn enabled_module_requires_value() {
        let sl = StopLossConfig {
            enabled: true,
            kind: StopLossType::Percentage,
            value: None,
        };
        let errors = sl.validate(&[]);
        assert_eq!(errors, vec![ValidationError::new("value", "required when enabled")]);
        assert!(matches!(sl.resolve(&[]), Err(KumoError::Validation(_))));
    }

    #[test]
    fn enabled_module_resolves_reference() {
        let sl = StopLossConfig {
            enabled: true,
            kind: StopLossType::Pips,
            value: Some(NumericValue::variable("SL")),
        };
        assert!(sl.validate(&vars()).is_empty());
        let resolved = sl.resolve(&vars()).unwrap().unwrap();
        assert_eq!(resolved, vec![ResolvedField { field: "value", value: 25.0 }]);
        assert_eq!(sl.unit(), Some("pips"));
    }

    #[test]
    fn unresolved_reference_propagates_from_resolve() {
        let trailing = TrailingStopConfig {
            enabled: true,
            distance: Some(NumericValue::Literal(15.0)),
            step: Some(NumericValue::variable("Nope")),
        };
        match trailing.resolve(&vars()) {
            Err(KumoError::UnresolvedVariable { name }) => assert_eq!(name, "Nope"),
            other => panic!("expected UnresolvedVariable, got {other:?}"),
        }
        let errors = trailing.validate(&vars());
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].parameter_key, "step");
    }

    #[test]
    fn trailing_stop_collects_both_fields() {
        let trailing = TrailingStopConfig {
            enabled: true,
            distance: None,
            step: Some(NumericValue::variable("Neg")),
        };
        let keys: Vec<String> = trailing
            .validate(&vars())
            .into_iter()
            .map(|e| e.parameter_key)
            .collect();
        assert_eq!(keys, vec!["distance", "step"]);
    }

    #[test]
    fn wire_shape_matches_document_layout() {
        let tp: TakeProfitConfig = serde_json::from_str(
            r#"{"enabled":true,"type":"ratio","value":{"type":"variable","variableName":"RR"}}"#,
        )
        .unwrap();
        assert_eq!(tp.kind, TakeProfitType::Ratio);
        assert_eq!(tp.value.as_ref().and_then(|v| v.variable_name()), Some("RR"));

        let sizing: PositionSizingConfig =
            serde_json::from_str(r#"{"type":"percent_balance","value":2}"#).unwrap();
        assert_eq!(sizing.kind, PositionSizingType::PercentBalance);
    }

    #[test]
    fn stop_loss_rejects_ratio_type() {
        let parsed = serde_json::from_str::<StopLossConfig>(r#"{"enabled":true,"type":"ratio","value":2}"#);
        assert!(parsed.is_err());
    }
}
