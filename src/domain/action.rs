//! Action catalog: entry, exit and management operations with their
//! parameter schemas, and validation of instantiated parameter maps.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::domain::error::{KumoError, ValidationError};
use crate::domain::variable::{NumericValue, StrategyVariable};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActionCategoryKind {
    Entry,
    Exit,
    Management,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ParameterType {
    Number,
    Select,
    Boolean,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(untagged)]
pub enum DefaultValue {
    Number(f64),
    Text(&'static str),
    Flag(bool),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SelectOption {
    pub value: &'static str,
    pub label: &'static str,
}

/// Schema for one configurable action parameter.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ActionParameter {
    pub key: &'static str,
    pub label: &'static str,
    #[serde(rename = "type")]
    pub kind: ParameterType,
    pub required: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_value: Option<DefaultValue>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unit: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub step: Option<f64>,
    #[serde(skip_serializing_if = "<[SelectOption]>::is_empty")]
    pub options: &'static [SelectOption],
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Action {
    pub value: &'static str,
    pub label: &'static str,
    pub icon: &'static str,
    pub description: &'static str,
    pub category: ActionCategoryKind,
    #[serde(skip_serializing_if = "<[ActionParameter]>::is_empty")]
    pub parameters: &'static [ActionParameter],
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ActionCategory {
    pub name: &'static str,
    pub value: ActionCategoryKind,
    pub actions: &'static [Action],
}

/// A supplied parameter value inside a strategy's instantiated action.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ParameterValue {
    Flag(bool),
    Numeric(NumericValue),
    Text(String),
}

pub type ParameterMap = BTreeMap<String, ParameterValue>;

const fn simple(
    value: &'static str,
    label: &'static str,
    icon: &'static str,
    description: &'static str,
    category: ActionCategoryKind,
) -> Action {
    Action {
        value,
        label,
        icon,
        description,
        category,
        parameters: &[],
    }
}

static MODIFY_POSITION_PARAMS: &[ActionParameter] = &[
    ActionParameter {
        key: "action",
        label: "Action",
        kind: ParameterType::Select,
        required: true,
        default_value: Some(DefaultValue::Text("partial_close")),
        unit: None,
        min: None,
        max: None,
        step: None,
        options: &[
            SelectOption {
                value: "partial_close",
                label: "Partial close",
            },
            SelectOption {
                value: "scale_in",
                label: "Scale in",
            },
            SelectOption {
                value: "scale_out",
                label: "Scale out",
            },
        ],
    },
    ActionParameter {
        key: "percentage",
        label: "Percentage",
        kind: ParameterType::Number,
        required: true,
        default_value: Some(DefaultValue::Number(50.0)),
        unit: Some("%"),
        min: Some(1.0),
        max: Some(100.0),
        step: Some(1.0),
        options: &[],
    },
];

pub static ACTION_CATEGORIES: &[ActionCategory] = &[
    ActionCategory {
        name: "Entry actions",
        value: ActionCategoryKind::Entry,
        actions: &[
            simple("buy_market", "Buy at market", "📈", "Open a long position at the current market price", ActionCategoryKind::Entry),
            simple("sell_market", "Sell at market", "📉", "Open a short position at the current market price", ActionCategoryKind::Entry),
            simple("buy_limit", "Buy limit", "🎯", "Limit buy order at a given price", ActionCategoryKind::Entry),
            simple("sell_limit", "Sell limit", "🎯", "Limit sell order at a given price", ActionCategoryKind::Entry),
            simple("buy_stop", "Buy stop", "⏸️", "Stop buy order above the current price", ActionCategoryKind::Entry),
            simple("sell_stop", "Sell stop", "⏸️", "Stop sell order below the current price", ActionCategoryKind::Entry),
        ],
    },
    ActionCategory {
        name: "Exit actions",
        value: ActionCategoryKind::Exit,
        actions: &[
            simple("close_position", "Close position", "✖️", "Close every open position", ActionCategoryKind::Exit),
            simple("close_buy", "Close longs", "⬇️", "Close long positions only", ActionCategoryKind::Exit),
            simple("close_sell", "Close shorts", "⬆️", "Close short positions only", ActionCategoryKind::Exit),
            simple("partial_close", "Partial close", "⚖️", "Close a percentage of the position", ActionCategoryKind::Exit),
        ],
    },
    ActionCategory {
        name: "Risk management",
        value: ActionCategoryKind::Management,
        actions: &[Action {
            value: "modify_position",
            label: "Modify position",
            icon: "⚙️",
            description: "Adjust position size or parameters",
            category: ActionCategoryKind::Management,
            parameters: MODIFY_POSITION_PARAMS,
        }],
    },
];

/// Every action, category order first, then action order within the category.
pub fn list_actions() -> Vec<&'static Action> {
    ACTION_CATEGORIES
        .iter()
        .flat_map(|category| category.actions.iter())
        .collect()
}

pub fn find_action(key: &str) -> Result<&'static Action, KumoError> {
    ACTION_CATEGORIES
        .iter()
        .flat_map(|category| category.actions.iter())
        .find(|a| a.value == key)
        .ok_or_else(|| KumoError::CatalogNotFound {
            kind: "action",
            key: key.to_string(),
        })
}

impl Action {
    /// Check a supplied parameter map against this action's schema.
    ///
    /// Every violation is collected; keys not declared by the schema are left
    /// alone.
    pub fn validate_parameters(
        &self,
        params: &ParameterMap,
        variables: &[StrategyVariable],
    ) -> Vec<ValidationError> {
        self.parameters
            .iter()
            .filter_map(|schema| match params.get(schema.key) {
                None if schema.required => {
                    Some(ValidationError::new(schema.key, "required parameter is missing"))
                }
                None => None,
                Some(value) => check_parameter(schema, value, variables)
                    .err()
                    .map(|reason| ValidationError::new(schema.key, reason)),
            })
            .collect()
    }
}

fn check_parameter(
    schema: &ActionParameter,
    value: &ParameterValue,
    variables: &[StrategyVariable],
) -> Result<(), String> {
    match (schema.kind, value) {
        (ParameterType::Number, ParameterValue::Numeric(n)) => {
            let resolved = n.resolve(variables).map_err(|e| e.to_string())?;
            if let Some(min) = schema.min {
                if resolved < min {
                    return Err(format!("{resolved} is below minimum {min}"));
                }
            }
            if let Some(max) = schema.max {
                if resolved > max {
                    return Err(format!("{resolved} exceeds maximum {max}"));
                }
            }
            Ok(())
        }
        (ParameterType::Select, ParameterValue::Text(s)) => {
            if schema.options.iter().any(|o| o.value == s.as_str()) {
                Ok(())
            } else {
                let allowed: Vec<&str> = schema.options.iter().map(|o| o.value).collect();
                Err(format!("'{s}' is not one of: {}", allowed.join(", ")))
            }
        }
        (ParameterType::Boolean, ParameterValue::Flag(_)) => Ok(()),
        (ParameterType::Number, _) => Err("expected a number or variable reference".into()),
        (ParameterType::Select, _) => Err("expected one of the listed options".into()),
        (ParameterType::Boolean, _) => Err("expected true or false".into()),
    }
}

/// Look up `key` in the catalog and validate `params` against it.
pub fn validate_action(
    key: &str,
    params: &ParameterMap,
    variables: &[StrategyVariable],
) -> Vec<ValidationError> {
    match find_action(key) {
        Ok(action) => action.validate_parameters(params, variables),
        Err(e) => vec![ValidationError::new("action", e.to_string())],
    }
}
