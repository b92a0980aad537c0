//! Comparison conditions and logical operators available to strategy rules.

use serde::{Deserialize, Serialize};

use crate::domain::error::KumoError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Condition {
    pub value: &'static str,
    pub label: &'static str,
    pub symbol: &'static str,
    pub description: &'static str,
}

pub static CONDITIONS: &[Condition] = &[
    Condition {
        value: "greater_than",
        label: "Greater than",
        symbol: ">",
        description: "Indicator is above the comparison value",
    },
    Condition {
        value: "less_than",
        label: "Less than",
        symbol: "<",
        description: "Indicator is below the comparison value",
    },
    Condition {
        value: "equal_to",
        label: "Equal to",
        symbol: "=",
        description: "Indicator equals the comparison value",
    },
    Condition {
        value: "greater_or_equal",
        label: "Greater or equal",
        symbol: "≥",
        description: "Indicator is at or above the comparison value",
    },
    Condition {
        value: "less_or_equal",
        label: "Less or equal",
        symbol: "≤",
        description: "Indicator is at or below the comparison value",
    },
    Condition {
        value: "crosses_above",
        label: "Crosses above",
        symbol: "↗",
        description: "Indicator crosses above the value or indicator",
    },
    Condition {
        value: "crosses_below",
        label: "Crosses below",
        symbol: "↘",
        description: "Indicator crosses below the value or indicator",
    },
    Condition {
        value: "between",
        label: "Between",
        symbol: "⇔",
        description: "Indicator lies between two values",
    },
    Condition {
        value: "outside",
        label: "Outside",
        symbol: "⇎",
        description: "Indicator lies outside two values",
    },
];

/// How a rule is joined to the next one in its block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogicalOperatorKind {
    And,
    Or,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct LogicalOperator {
    pub value: LogicalOperatorKind,
    pub label: &'static str,
    pub symbol: &'static str,
}

pub static LOGICAL_OPERATORS: &[LogicalOperator] = &[
    LogicalOperator {
        value: LogicalOperatorKind::And,
        label: "AND",
        symbol: "∧",
    },
    LogicalOperator {
        value: LogicalOperatorKind::Or,
        label: "OR",
        symbol: "∨",
    },
];

pub fn list_conditions() -> &'static [Condition] {
    CONDITIONS
}

pub fn find_condition(key: &str) -> Result<&'static Condition, KumoError> {
    CONDITIONS
        .iter()
        .find(|c| c.value == key)
        .ok_or_else(|| KumoError::CatalogNotFound {
            kind: "condition",
            key: key.to_string(),
        })
}
