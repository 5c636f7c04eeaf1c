use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::error::LoanScenarioError;
use crate::evaluator::{evaluate, LoanConfiguration, LoanResult};
use crate::types::*;
use crate::LoanScenarioResult;

/// Upper bound on sweep points per axis.
const MAX_SWEEP_POINTS: usize = 1000;

/// Loan parameter that can be swept.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LoanVariable {
    Price,
    DownPayment,
    AnnualRatePct,
    TermYears,
    InsuranceRatePct,
}

/// Loan figure read off each grid cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LoanMetric {
    BasePayment,
    TotalPayment,
    TotalCost,
    TotalInterest,
}

impl LoanVariable {
    fn current(&self, config: &LoanConfiguration) -> Decimal {
        match self {
            LoanVariable::Price => config.price,
            LoanVariable::DownPayment => config.down_payment,
            LoanVariable::AnnualRatePct => config.annual_rate_pct,
            LoanVariable::TermYears => Decimal::from(config.term_years),
            LoanVariable::InsuranceRatePct => config.insurance_rate_pct,
        }
    }

    fn apply(&self, config: &mut LoanConfiguration, value: Decimal) -> LoanScenarioResult<()> {
        match self {
            LoanVariable::Price => config.price = value,
            LoanVariable::DownPayment => config.down_payment = value,
            LoanVariable::AnnualRatePct => config.annual_rate_pct = value,
            LoanVariable::InsuranceRatePct => config.insurance_rate_pct = value,
            LoanVariable::TermYears => {
                if !value.fract().is_zero() {
                    return Err(LoanScenarioError::invalid(
                        "term_years",
                        format!("Term must be a whole number of years, got {value}"),
                    ));
                }
                config.term_years = value.to_u32().ok_or_else(|| {
                    LoanScenarioError::invalid("term_years", format!("Term out of range: {value}"))
                })?;
            }
        }
        Ok(())
    }
}

impl LoanMetric {
    pub fn read(&self, result: &LoanResult) -> Money {
        match self {
            LoanMetric::BasePayment => result.base_payment,
            LoanMetric::TotalPayment => result.total_payment,
            LoanMetric::TotalCost => result.total_cost,
            LoanMetric::TotalInterest => result.total_interest,
        }
    }
}

/// Sweep settings for one axis.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SensitivityVariable {
    pub variable: LoanVariable,
    pub min: Decimal,
    pub max: Decimal,
    pub step: Decimal,
}

/// Input for 2-way loan sensitivity analysis
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoanSensitivityInput {
    /// Base case configuration; swept fields are overridden per cell
    pub base: LoanConfiguration,
    pub variable_1: SensitivityVariable,
    pub variable_2: SensitivityVariable,
    pub metric: LoanMetric,
}

/// Output of 2-way sensitivity analysis
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SensitivityOutput {
    pub variable_1: LoanVariable,
    pub variable_2: LoanVariable,
    pub variable_1_values: Vec<Decimal>,
    pub variable_2_values: Vec<Decimal>,
    pub metric: LoanMetric,
    /// Matrix[i][j] = metric when variable_1 = variable_1_values[i], variable_2 = variable_2_values[j]
    pub matrix: Vec<Vec<Decimal>>,
    /// Metric of the base configuration itself
    pub base_case_value: Decimal,
    /// Grid cell closest to the base configuration (row, col)
    pub base_case_position: (usize, usize),
}

/// Generate the sweep values for a sensitivity variable from min to max with step.
fn generate_sweep_values(var: &SensitivityVariable) -> LoanScenarioResult<Vec<Decimal>> {
    let field = format!("variable:{:?}", var.variable);
    if var.step <= Decimal::ZERO {
        return Err(LoanScenarioError::invalid(&field, "Step must be positive"));
    }
    if var.min > var.max {
        return Err(LoanScenarioError::invalid(&field, "Min must be <= max"));
    }

    let mut values = Vec::new();
    let mut current = var.min;
    while current <= var.max {
        if values.len() == MAX_SWEEP_POINTS {
            return Err(LoanScenarioError::invalid(
                &field,
                format!("Sweep exceeds {MAX_SWEEP_POINTS} points"),
            ));
        }
        values.push(current);
        current = match current.checked_add(var.step) {
            Some(next) => next,
            None => break,
        };
    }
    // Ensure max is included if step doesn't land exactly on it
    if let Some(&last) = values.last() {
        if last < var.max {
            values.push(var.max);
        }
    }

    Ok(values)
}

/// Find the closest index to a target value in a sorted list.
fn closest_index(values: &[Decimal], target: Decimal) -> usize {
    values
        .iter()
        .enumerate()
        .min_by_key(|(_, v)| (**v - target).abs())
        .map(|(i, _)| i)
        .unwrap_or(0)
}

/// Evaluate `eval_fn` over every (v1, v2) pair; failed cells are zero with a warning.
pub fn evaluate_grid<F>(
    v1_values: &[Decimal],
    v2_values: &[Decimal],
    eval_fn: F,
) -> (Vec<Vec<Decimal>>, Vec<String>)
where
    F: Fn(Decimal, Decimal) -> LoanScenarioResult<Decimal>,
{
    let mut warnings = Vec::new();
    let mut matrix = Vec::with_capacity(v1_values.len());

    for v1 in v1_values {
        let mut row = Vec::with_capacity(v2_values.len());
        for v2 in v2_values {
            match eval_fn(*v1, *v2) {
                Ok(val) => row.push(val),
                Err(e) => {
                    warnings.push(format!("Evaluation failed at ({v1}, {v2}): {e}"));
                    row.push(Decimal::ZERO);
                }
            }
        }
        matrix.push(row);
    }

    (matrix, warnings)
}

/// Sweep two loan parameters and tabulate the chosen metric.
pub fn loan_sensitivity(
    input: &LoanSensitivityInput,
) -> LoanScenarioResult<ComputationOutput<SensitivityOutput>> {
    let start = Instant::now();

    if input.variable_1.variable == input.variable_2.variable {
        return Err(LoanScenarioError::invalid(
            "variable_2",
            "Sensitivity variables must differ",
        ));
    }

    let base_result = evaluate(&input.base)?;
    let base_case_value = input.metric.read(&base_result);

    let v1_values = generate_sweep_values(&input.variable_1)?;
    let v2_values = generate_sweep_values(&input.variable_2)?;

    let (matrix, warnings) = evaluate_grid(&v1_values, &v2_values, |v1, v2| {
        let mut config = input.base.clone();
        input.variable_1.variable.apply(&mut config, v1)?;
        input.variable_2.variable.apply(&mut config, v2)?;
        Ok(input.metric.read(&evaluate(&config)?))
    });

    let base_row = closest_index(&v1_values, input.variable_1.variable.current(&input.base));
    let base_col = closest_index(&v2_values, input.variable_2.variable.current(&input.base));

    let output = SensitivityOutput {
        variable_1: input.variable_1.variable,
        variable_2: input.variable_2.variable,
        variable_1_values: v1_values,
        variable_2_values: v2_values,
        metric: input.metric,
        matrix,
        base_case_value,
        base_case_position: (base_row, base_col),
    };

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "2-Way Loan Sensitivity Analysis",
        &serde_json::json!({
            "variable_1": input.variable_1.variable,
            "variable_2": input.variable_2.variable,
            "metric": input.metric,
        }),
        warnings,
        elapsed,
        output,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn sample_input() -> LoanSensitivityInput {
        LoanSensitivityInput {
            base: LoanConfiguration {
                label: None,
                price: dec!(350000),
                down_payment: dec!(52500),
                annual_rate_pct: dec!(4.2),
                term_years: 25,
                insurance_rate_pct: dec!(0.36),
            },
            variable_1: SensitivityVariable {
                variable: LoanVariable::AnnualRatePct,
                min: dec!(3.0),
                max: dec!(5.0),
                step: dec!(0.4),
            },
            variable_2: SensitivityVariable {
                variable: LoanVariable::TermYears,
                min: dec!(15),
                max: dec!(30),
                step: dec!(5),
            },
            metric: LoanMetric::TotalCost,
        }
    }

    #[test]
    fn test_rate_term_grid() {
        let result = loan_sensitivity(&sample_input()).unwrap();
        let out = &result.result;

        // 3.0, 3.4, 3.8, 4.2, 4.6, 5.0
        assert_eq!(out.variable_1_values.len(), 6);
        // 15, 20, 25, 30
        assert_eq!(out.variable_2_values.len(), 4);
        assert_eq!(out.base_case_position, (3, 2));
        assert_eq!(out.matrix[3][2], out.base_case_value);
        assert!(result.warnings.is_empty());

        // Total cost rises with the rate and with the term
        for j in 0..out.variable_2_values.len() {
            for i in 0..out.variable_1_values.len() - 1 {
                assert!(out.matrix[i][j] < out.matrix[i + 1][j]);
            }
        }
        for i in 0..out.variable_1_values.len() {
            for j in 0..out.variable_2_values.len() - 1 {
                assert!(out.matrix[i][j] < out.matrix[i][j + 1]);
            }
        }
    }

    #[test]
    fn test_fractional_term_becomes_warning() {
        let mut input = sample_input();
        input.variable_2 = SensitivityVariable {
            variable: LoanVariable::TermYears,
            min: dec!(20),
            max: dec!(21),
            step: dec!(0.5),
        };
        let result = loan_sensitivity(&input).unwrap();
        // 20.5 is rejected in every row
        assert_eq!(result.warnings.len(), 6);
        assert_eq!(result.result.matrix[0][1], Decimal::ZERO);
    }

    #[test]
    fn test_overflowing_rate_cells_become_warnings() {
        let mut input = sample_input();
        input.variable_1 = SensitivityVariable {
            variable: LoanVariable::AnnualRatePct,
            min: dec!(100),
            max: dec!(1000),
            step: dec!(900),
        };
        input.variable_2 = SensitivityVariable {
            variable: LoanVariable::TermYears,
            min: dec!(30),
            max: dec!(30),
            step: dec!(1),
        };
        let result = loan_sensitivity(&input).unwrap();
        let out = &result.result;
        assert_eq!(out.variable_1_values, vec![dec!(100), dec!(1000)]);
        assert!(out.matrix[0][0] > Decimal::ZERO);
        // 1000% over 360 months overflows the compounding factor
        assert_eq!(out.matrix[1][0], Decimal::ZERO);
        assert_eq!(result.warnings.len(), 1);
        assert!(result.warnings[0].contains("annual_rate_pct"));
    }

    #[test]
    fn test_sweep_stops_at_decimal_range() {
        let var = SensitivityVariable {
            variable: LoanVariable::Price,
            min: Decimal::MAX - dec!(1),
            max: Decimal::MAX,
            step: dec!(1),
        };
        let vals = generate_sweep_values(&var).unwrap();
        assert_eq!(vals, vec![Decimal::MAX - dec!(1), Decimal::MAX]);
    }

    #[test]
    fn test_sweep_with_non_exact_step() {
        let var = SensitivityVariable {
            variable: LoanVariable::DownPayment,
            min: dec!(0),
            max: dec!(1),
            step: dec!(0.3),
        };
        let vals = generate_sweep_values(&var).unwrap();
        // 0, 0.3, 0.6, 0.9, 1.0 (max appended)
        assert_eq!(vals.len(), 5);
        assert_eq!(*vals.last().unwrap(), dec!(1));
    }

    #[test]
    fn test_invalid_step() {
        let mut input = sample_input();
        input.variable_1.step = Decimal::ZERO;
        assert!(loan_sensitivity(&input).is_err());
    }

    #[test]
    fn test_same_variable_rejected() {
        let mut input = sample_input();
        input.variable_2.variable = LoanVariable::AnnualRatePct;
        assert!(loan_sensitivity(&input).is_err());
    }

    #[test]
    fn test_sweep_point_cap() {
        let var = SensitivityVariable {
            variable: LoanVariable::Price,
            min: dec!(0),
            max: dec!(1000000),
            step: dec!(1),
        };
        assert!(generate_sweep_values(&var).is_err());
    }
}
