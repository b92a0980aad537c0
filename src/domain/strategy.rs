//! Strategy document: rule blocks, risk modules and the variable catalog.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::domain::action::{self, ParameterMap, ParameterValue};
use crate::domain::condition::{self, LogicalOperatorKind};
use crate::domain::error::ValidationError;
use crate::domain::risk::{
    BreakevenConfig, PositionSizingConfig, RiskModule, StopLossConfig, TakeProfitConfig,
    TrailingStopConfig,
};
use crate::domain::variable::{self, NumericValue, StrategyVariable, VariableReference};

pub const TIMEFRAMES: &[&str] = &["1m", "5m", "15m", "30m", "1h", "4h", "1d", "1w", "1M"];

/// An indicator instance with its parameters, e.g. `rsi` with `period = 14`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConfiguredIndicator {
    pub indicator: String,
    #[serde(default)]
    pub parameters: ParameterMap,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
}

/// Right-hand side of a rule comparison.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ComparisonValue {
    Number {
        #[serde(rename = "numericValue")]
        numeric_value: f64,
    },
    Variable {
        #[serde(rename = "variableReference")]
        variable_reference: VariableReference,
    },
    Indicator {
        #[serde(rename = "indicatorValue")]
        indicator_value: ConfiguredIndicator,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StrategyRule {
    pub id: String,
    pub indicator: ConfiguredIndicator,
    pub condition: String,
    pub comparison_value: ComparisonValue,
    /// Joins this rule to the next one in the block.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub logical_operator: Option<LogicalOperatorKind>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StrategyAction {
    pub id: String,
    pub action: String,
    #[serde(default)]
    pub parameters: ParameterMap,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BlockType {
    Entry,
    Exit,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StrategyBlock {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: BlockType,
    pub name: String,
    #[serde(default)]
    pub rules: Vec<StrategyRule>,
    #[serde(default)]
    pub actions: Vec<StrategyAction>,
    pub enabled: bool,
}

/// The user-authored part of a strategy, without identity or lifecycle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Strategy {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub timeframe: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position_sizing: Option<PositionSizingConfig>,
    #[serde(default)]
    pub variables: Vec<StrategyVariable>,
    #[serde(default)]
    pub entry_blocks: Vec<StrategyBlock>,
    #[serde(default)]
    pub exit_blocks: Vec<StrategyBlock>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stop_loss: Option<StopLossConfig>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub take_profit: Option<TakeProfitConfig>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trailing_stop: Option<TrailingStopConfig>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub breakeven: Option<BreakevenConfig>,
}

impl Strategy {
    pub fn new(name: impl Into<String>, timeframe: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: None,
            timeframe: timeframe.into(),
            position_sizing: None,
            variables: Vec::new(),
            entry_blocks: Vec::new(),
            exit_blocks: Vec::new(),
            stop_loss: None,
            take_profit: None,
            trailing_stop: None,
            breakeven: None,
        }
    }

    /// Configured risk modules, in document order.
    pub fn risk_modules(&self) -> Vec<&dyn RiskModule> {
        let mut modules: Vec<&dyn RiskModule> = Vec::new();
        if let Some(m) = &self.position_sizing {
            modules.push(m);
        }
        if let Some(m) = &self.stop_loss {
            modules.push(m);
        }
        if let Some(m) = &self.take_profit {
            modules.push(m);
        }
        if let Some(m) = &self.trailing_stop {
            modules.push(m);
        }
        if let Some(m) = &self.breakeven {
            modules.push(m);
        }
        modules
    }

    /// Every variable name referenced anywhere in the document.
    pub fn variable_references(&self) -> BTreeSet<String> {
        let mut names = BTreeSet::new();
        for module in self.risk_modules() {
            for (_, value) in module.fields() {
                if let Some(name) = value.and_then(NumericValue::variable_name) {
                    names.insert(name.to_string());
                }
            }
        }
        for block in self.entry_blocks.iter().chain(&self.exit_blocks) {
            for rule in &block.rules {
                collect_parameter_refs(&rule.indicator.parameters, &mut names);
                match &rule.comparison_value {
                    ComparisonValue::Variable { variable_reference } => {
                        names.insert(variable_reference.variable_name.clone());
                    }
                    ComparisonValue::Indicator { indicator_value } => {
                        collect_parameter_refs(&indicator_value.parameters, &mut names);
                    }
                    ComparisonValue::Number { .. } => {}
                }
            }
            for action in &block.actions {
                collect_parameter_refs(&action.parameters, &mut names);
            }
        }
        names
    }

    /// Check the whole document, collecting every violation keyed by its path.
    pub fn validate(&self) -> Vec<ValidationError> {
        let mut errors = Vec::new();

        if self.name.trim().is_empty() {
            errors.push(ValidationError::new("name", "must not be empty"));
        }
        if !TIMEFRAMES.contains(&self.timeframe.as_str()) {
            errors.push(ValidationError::new(
                "timeframe",
                format!("unknown timeframe '{}'", self.timeframe),
            ));
        }

        errors.extend(variable::validate_variables(&self.variables));

        for (i, block) in self.entry_blocks.iter().enumerate() {
            self.validate_block(block, BlockType::Entry, &format!("entryBlocks[{i}]"), &mut errors);
        }
        for (i, block) in self.exit_blocks.iter().enumerate() {
            self.validate_block(block, BlockType::Exit, &format!("exitBlocks[{i}]"), &mut errors);
        }

        for module in self.risk_modules() {
            errors.extend(
                module
                    .validate(&self.variables)
                    .into_iter()
                    .map(|e| e.nested(module.key())),
            );
        }

        errors
    }

    fn validate_block(
        &self,
        block: &StrategyBlock,
        expected: BlockType,
        path: &str,
        errors: &mut Vec<ValidationError>,
    ) {
        if block.kind != expected {
            errors.push(ValidationError::new(
                format!("{path}.type"),
                format!("expected {expected:?} block").to_lowercase(),
            ));
        }

        for (j, rule) in block.rules.iter().enumerate() {
            let rule_path = format!("{path}.rules[{j}]");
            if let Err(e) = condition::find_condition(&rule.condition) {
                errors.push(ValidationError::new(format!("{rule_path}.condition"), e.to_string()));
            }
            self.check_parameter_refs(
                &rule.indicator.parameters,
                &format!("{rule_path}.indicator.parameters"),
                errors,
            );
            match &rule.comparison_value {
                ComparisonValue::Variable { variable_reference } => {
                    let value = NumericValue::Reference(variable_reference.clone());
                    if let Err(e) = value.resolve(&self.variables) {
                        errors.push(ValidationError::new(
                            format!("{rule_path}.comparisonValue"),
                            e.to_string(),
                        ));
                    }
                }
                ComparisonValue::Indicator { indicator_value } => self.check_parameter_refs(
                    &indicator_value.parameters,
                    &format!("{rule_path}.comparisonValue.parameters"),
                    errors,
                ),
                ComparisonValue::Number { .. } => {}
            }
        }

        for (j, act) in block.actions.iter().enumerate() {
            let action_path = format!("{path}.actions[{j}]");
            errors.extend(
                action::validate_action(&act.action, &act.parameters, &self.variables)
                    .into_iter()
                    .map(|e| e.nested(&action_path)),
            );
        }
    }

    fn check_parameter_refs(&self, params: &ParameterMap, path: &str, errors: &mut Vec<ValidationError>) {
        for (key, value) in params {
            if let ParameterValue::Numeric(n) = value {
                if let Err(e) = n.resolve(&self.variables) {
                    errors.push(ValidationError::new(format!("{path}.{key}"), e.to_string()));
                }
            }
        }
    }
}

fn collect_parameter_refs(params: &ParameterMap, names: &mut BTreeSet<String>) {
    for value in params.values() {
        if let ParameterValue::Numeric(NumericValue::Reference(r)) = value {
            names.insert(r.variable_name.clone());
        }
    }
}
