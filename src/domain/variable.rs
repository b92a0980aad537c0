//! Numeric values that are either literals or references to named strategy
//! variables, and their resolution against a variable catalog.

use std::collections::HashSet;

use serde::{Deserialize, Deserializer, Serialize};

use crate::domain::error::{KumoError, ValidationError};

/// A named, optimizable value owned by one strategy document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StrategyVariable {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub name: String,
    pub value: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub step: Option<f64>,
    #[serde(default = "enabled_by_default")]
    pub enabled: bool,
}

fn enabled_by_default() -> bool {
    true
}

impl StrategyVariable {
    pub fn new(name: impl Into<String>, value: f64) -> Self {
        Self {
            id: None,
            name: name.into(),
            value,
            description: None,
            min: None,
            max: None,
            step: None,
            enabled: true,
        }
    }

    pub fn with_range(mut self, min: f64, max: f64, step: f64) -> Self {
        self.min = Some(min);
        self.max = Some(max);
        self.step = Some(step);
        self
    }
}

/// Points a numeric parameter at a variable by exact name.
///
/// Serialized as `{"type": "variable", "variableName": "..."}`.
/// Reading requires the `type` tag, so an untagged or differently tagged
/// object is not mistaken for a reference.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename = "variable", rename_all = "camelCase")]
pub struct VariableReference {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub variable_id: Option<String>,
    pub variable_name: String,
}

#[derive(Deserialize)]
#[serde(tag = "type")]
enum TaggedReference {
    #[serde(rename = "variable", rename_all = "camelCase")]
    Variable {
        #[serde(default)]
        variable_id: Option<String>,
        variable_name: String,
    },
}

impl<'de> Deserialize<'de> for VariableReference {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let TaggedReference::Variable {
            variable_id,
            variable_name,
        } = TaggedReference::deserialize(deserializer)?;
        Ok(Self {
            variable_id,
            variable_name,
        })
    }
}

impl VariableReference {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            variable_id: None,
            variable_name: name.into(),
        }
    }
}

/// Either a raw number or a reference into the owning document's variables.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum NumericValue {
    Literal(f64),
    Reference(VariableReference),
}

impl NumericValue {
    pub fn variable(name: impl Into<String>) -> Self {
        NumericValue::Reference(VariableReference::named(name))
    }

    pub fn variable_name(&self) -> Option<&str> {
        match self {
            NumericValue::Literal(_) => None,
            NumericValue::Reference(r) => Some(&r.variable_name),
        }
    }

    pub fn resolve(&self, variables: &[StrategyVariable]) -> Result<f64, KumoError> {
        resolve(self, variables)
    }
}

impl From<f64> for NumericValue {
    fn from(value: f64) -> Self {
        NumericValue::Literal(value)
    }
}

/// Resolve a value against a variable catalog.
///
/// Lookup is exact and case-sensitive. A missing variable is an error, never a
/// default of zero.
pub fn resolve(value: &NumericValue, variables: &[StrategyVariable]) -> Result<f64, KumoError> {
    match value {
        NumericValue::Literal(v) => Ok(*v),
        NumericValue::Reference(r) => variables
            .iter()
            .find(|v| v.name == r.variable_name)
            .map(|v| v.value)
            .ok_or_else(|| KumoError::UnresolvedVariable {
                name: r.variable_name.clone(),
            }),
    }
}

/// Check a variable catalog: names present and unique, optimization ranges sane.
pub fn validate_variables(variables: &[StrategyVariable]) -> Vec<ValidationError> {
    let mut errors = Vec::new();
    let mut seen = HashSet::new();

    for (i, var) in variables.iter().enumerate() {
        let key = format!("variables[{i}]");
        if var.name.trim().is_empty() {
            errors.push(ValidationError::new(format!("{key}.name"), "must not be empty"));
        } else if !seen.insert(var.name.as_str()) {
            errors.push(ValidationError::new(
                format!("{key}.name"),
                format!("duplicate variable name '{}'", var.name),
            ));
        }
        if let (Some(min), Some(max)) = (var.min, var.max) {
            if min > max {
                errors.push(ValidationError::new(
                    format!("{key}.min"),
                    format!("min {min} is greater than max {max}"),
                ));
            }
        }
        if matches!(var.step, Some(step) if step <= 0.0) {
            errors.push(ValidationError::new(format!("{key}.step"), "must be positive"));
        }
    }

    errors
}
