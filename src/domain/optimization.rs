//! Parameter sweeps over a strategy's variable ranges.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::domain::variable::StrategyVariable;

/// One variable's sweep range, inclusive of both ends.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VariableRange {
    pub variable_name: String,
    pub min: f64,
    pub max: f64,
    pub step: f64,
}

impl VariableRange {
    /// Number of grid points in `[min, max]`. Zero for an empty, degenerate or
    /// non-finite range; saturates at `u64::MAX`.
    pub fn steps(&self) -> u64 {
        let finite = self.min.is_finite() && self.max.is_finite() && self.step.is_finite();
        if !finite || self.step <= 0.0 || self.max < self.min {
            return 0;
        }
        let intervals = ((self.max - self.min) / self.step).floor();
        if !intervals.is_finite() || intervals >= u64::MAX as f64 {
            return u64::MAX;
        }
        (intervals as u64).saturating_add(1)
    }

    fn values(&self) -> impl Iterator<Item = f64> + '_ {
        (0..self.steps()).map(move |i| self.min + i as f64 * self.step)
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OptimizationConfig {
    pub variables: Vec<VariableRange>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_combinations: Option<usize>,
}

impl OptimizationConfig {
    /// Build a sweep over every enabled variable that declares a full range.
    pub fn from_variables(variables: &[StrategyVariable]) -> Self {
        let variables = variables
            .iter()
            .filter(|v| v.enabled)
            .filter_map(|v| match (v.min, v.max, v.step) {
                (Some(min), Some(max), Some(step)) => Some(VariableRange {
                    variable_name: v.name.clone(),
                    min,
                    max,
                    step,
                }),
                _ => None,
            })
            .collect();
        Self {
            variables,
            max_combinations: None,
        }
    }
}

pub type Combination = BTreeMap<String, f64>;

/// Total grid size without materializing it.
pub fn count_combinations(config: &OptimizationConfig) -> u64 {
    config
        .variables
        .iter()
        .map(VariableRange::steps)
        .fold(1u64, |acc, n| acc.saturating_mul(n))
}

/// Cartesian product of every range, first variable outermost.
pub fn generate_combinations(config: &OptimizationConfig) -> Vec<Combination> {
    let limit = config.max_combinations.unwrap_or(usize::MAX);
    let mut out = Vec::new();
    let mut current = Combination::new();
    expand(&config.variables, 0, &mut current, &mut out, limit);
    out
}

fn expand(
    ranges: &[VariableRange],
    index: usize,
    current: &mut Combination,
    out: &mut Vec<Combination>,
    limit: usize,
) {
    if out.len() >= limit {
        return;
    }
    let Some(range) = ranges.get(index) else {
        out.push(current.clone());
        return;
    };
    for value in range.values() {
        current.insert(range.variable_name.clone(), value);
        expand(ranges, index + 1, current, out, limit);
        if out.len() >= limit {
            break;
        }
    }
    current.remove(&range.variable_name);
}

/// Copy of `variables` with the values named in `combination` overridden.
pub fn apply_combination(
    variables: &[StrategyVariable],
    combination: &Combination,
) -> Vec<StrategyVariable> {
    variables
        .iter()
        .map(|v| {
            let mut v = v.clone();
            if let Some(value) = combination.get(&v.name) {
                v.value = *value;
            }
            v
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn range(name: &str, min: f64, max: f64, step: f64) -> VariableRange {
        VariableRange {
            variable_name: name.into(),
            min,
            max,
            step,
        }
    }

    #[test]
    fn count_multiplies_steps() {
        let config = OptimizationConfig {
            variables: vec![range("A", 10.0, 20.0, 1.0), range("B", 20.0, 35.0, 5.0)],
            max_combinations: None,
        };
        assert_eq!(count_combinations(&config), 11 * 4);
    }

    #[test]
    fn empty_config_has_single_empty_combination() {
        let config = OptimizationConfig::default();
        assert_eq!(count_combinations(&config), 1);
        let combos = generate_combinations(&config);
        assert_eq!(combos.len(), 1);
        assert!(combos[0].is_empty());
    }

    #[test]
    fn generate_orders_first_variable_outermost() {
        let config = OptimizationConfig {
            variables: vec![range("A", 1.0, 2.0, 1.0), range("B", 0.5, 1.0, 0.5)],
            max_combinations: None,
        };
        let combos = generate_combinations(&config);
        assert_eq!(combos.len(), 4);
        assert_relative_eq!(combos[0]["A"], 1.0);
        assert_relative_eq!(combos[0]["B"], 0.5);
        assert_relative_eq!(combos[1]["A"], 1.0);
        assert_relative_eq!(combos[1]["B"], 1.0);
        assert_relative_eq!(combos[3]["A"], 2.0);
    }

    #[test]
    fn generate_respects_limit() {
        let config = OptimizationConfig {
            variables: vec![range("A", 1.0, 100.0, 1.0), range("B", 1.0, 100.0, 1.0)],
            max_combinations: Some(7),
        };
        assert_eq!(generate_combinations(&config).len(), 7);
    }

    #[test]
    fn inverted_range_yields_nothing() {
        let config = OptimizationConfig {
            variables: vec![range("A", 5.0, 1.0, 1.0)],
            max_combinations: None,
        };
        assert_eq!(count_combinations(&config), 0);
        assert!(generate_combinations(&config).is_empty());
    }

    #[test]
    fn from_variables_skips_disabled_and_unranged() {
        let mut disabled = StrategyVariable::new("Off", 1.0).with_range(1.0, 2.0, 1.0);
        disabled.enabled = false;
        let vars = vec![
            StrategyVariable::new("Period", 14.0).with_range(10.0, 20.0, 2.0),
            StrategyVariable::new("Plain", 3.0),
            disabled,
        ];
        let config = OptimizationConfig::from_variables(&vars);
        assert_eq!(config.variables.len(), 1);
        assert_eq!(config.variables[0].variable_name, "Period");
        assert_eq!(count_combinations(&config), 6);
    }

    #[test]
    fn apply_combination_overrides_named_values_only() {
        let vars = vec![StrategyVariable::new("A", 1.0), StrategyVariable::new("B", 2.0)];
        let combo = Combination::from([("A".to_string(), 9.0)]);
        let applied = apply_combination(&vars, &combo);
        assert_relative_eq!(applied[0].value, 9.0);
        assert_relative_eq!(applied[1].value, 2.0);
        assert_relative_eq!(vars[0].value, 1.0);
    }

    #[test]
    fn huge_range_count_saturates() {
        let config = OptimizationConfig {
            variables: vec![range("A", 0.0, 1e20, 1.0), range("B", 0.0, 10.0, 1.0)],
            max_combinations: None,
        };
        assert_eq!(config.variables[0].steps(), u64::MAX);
        assert_eq!(range("C", 0.0, 10.0, 1e-320).steps(), u64::MAX);
        assert_eq!(count_combinations(&config), u64::MAX);
    }

    #[test]
    fn non_finite_range_has_no_steps() {
        assert_eq!(range("A", 0.0, f64::INFINITY, 1.0).steps(), 0);
        assert_eq!(range("A", 0.0, 10.0, f64::NAN).steps(), 0);
    }

    #[test]
    fn limit_applies_without_materializing_huge_range() {
        let config = OptimizationConfig {
            variables: vec![range("A", 0.0, 1e12, 1.0), range("B", 0.0, 1e12, 1.0)],
            max_combinations: Some(2),
        };
        let combos = generate_combinations(&config);
        assert_eq!(combos.len(), 2);
        assert_relative_eq!(combos[1]["A"], 0.0);
        assert_relative_eq!(combos[1]["B"], 1.0);
    }
}
