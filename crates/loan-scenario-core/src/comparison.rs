//! Comparison layer: relative metrics between evaluated loan scenarios.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::error::LoanScenarioError;
use crate::evaluator::{evaluate, LoanConfiguration, LoanResult};
use crate::types::{with_metadata, ComputationOutput, Money};
use crate::LoanScenarioResult;

/// Differences of an alternative scenario against a reference.
///
/// Deltas are `alternative - reference`; savings are the negated deltas so a
/// cheaper alternative shows a positive saving.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComparisonDelta {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reference_label: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alternative_label: Option<String>,
    pub monthly_delta: Money,
    pub total_delta: Money,
    pub interest_delta: Money,
    pub monthly_savings: Money,
    pub total_savings: Money,
    /// Additional down payment of the alternative over the reference.
    pub extra_capital: Money,
    /// Percentage return on `extra_capital`, when the alternative put more money down.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub return_on_extra_capital: Option<Decimal>,
}

impl ComparisonDelta {
    /// Return on an arbitrary amount of extra capital for this delta.
    pub fn return_on(&self, extra_capital: Money) -> Decimal {
        return_on_extra_capital(self.total_delta, extra_capital)
    }
}

/// `-total_delta / extra_capital * 100`, or zero without extra capital.
pub fn return_on_extra_capital(total_delta: Money, extra_capital: Money) -> Decimal {
    if extra_capital <= Decimal::ZERO {
        return Decimal::ZERO;
    }
    -total_delta / extra_capital * dec!(100)
}

/// Compare one alternative against a reference scenario.
pub fn compare(reference: &LoanResult, alternative: &LoanResult) -> ComparisonDelta {
    let monthly_delta = alternative.total_payment - reference.total_payment;
    let total_delta = alternative.total_cost - reference.total_cost;
    let extra_capital = alternative.down_payment - reference.down_payment;

    ComparisonDelta {
        reference_label: reference.label.clone(),
        alternative_label: alternative.label.clone(),
        monthly_delta,
        total_delta,
        interest_delta: alternative.total_interest - reference.total_interest,
        monthly_savings: -monthly_delta,
        total_savings: -total_delta,
        extra_capital,
        return_on_extra_capital: (extra_capital > Decimal::ZERO)
            .then(|| return_on_extra_capital(total_delta, extra_capital)),
    }
}

/// Compare each alternative independently against the same reference.
pub fn compare_many(reference: &LoanResult, alternatives: &[LoanResult]) -> Vec<ComparisonDelta> {
    alternatives
        .iter()
        .map(|alt| compare(reference, alt))
        .collect()
}

// ---------------------------------------------------------------------------
// Configuration-level comparison
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComparisonInput {
    pub reference: LoanConfiguration,
    pub alternatives: Vec<LoanConfiguration>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComparisonOutput {
    pub reference: LoanResult,
    pub alternatives: Vec<LoanResult>,
    pub deltas: Vec<ComparisonDelta>,
    /// Label (or position) of the alternative with the lowest total cost.
    pub cheapest: String,
}

/// Evaluate a reference and its alternatives, then diff each against the reference.
pub fn compare_configurations(
    input: &ComparisonInput,
) -> LoanScenarioResult<ComputationOutput<ComparisonOutput>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    if input.alternatives.is_empty() {
        return Err(LoanScenarioError::InsufficientData(
            "At least one alternative scenario required".into(),
        ));
    }

    let reference = evaluate(&input.reference)?;
    let alternatives = input
        .alternatives
        .iter()
        .map(evaluate)
        .collect::<LoanScenarioResult<Vec<_>>>()?;

    for (i, alt) in alternatives.iter().enumerate() {
        if alt.price != reference.price {
            warnings.push(format!(
                "{}: price {} differs from reference price {}",
                scenario_name(alt, i + 1),
                alt.price,
                reference.price
            ));
        }
    }

    let deltas = compare_many(&reference, &alternatives);

    let cheapest = std::iter::once((0, &reference))
        .chain(alternatives.iter().enumerate().map(|(i, r)| (i + 1, r)))
        .min_by(|a, b| a.1.total_cost.cmp(&b.1.total_cost))
        .map(|(i, r)| scenario_name(r, i))
        .unwrap_or_default();

    let output = ComparisonOutput {
        reference,
        alternatives,
        deltas,
        cheapest,
    };

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Loan Scenario Comparison (alternative minus reference)",
        &serde_json::json!({
            "reference": input.reference.label,
            "alternatives": input.alternatives.len(),
        }),
        warnings,
        elapsed,
        output,
    ))
}

fn scenario_name(result: &LoanResult, position: usize) -> String {
    match &result.label {
        Some(label) => label.clone(),
        None if position == 0 => "reference".into(),
        None => format!("alternative {position}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn config(down_payment: Decimal, rate: Decimal, years: u32) -> LoanConfiguration {
        LoanConfiguration {
            label: None,
            price: dec!(350000),
            down_payment,
            annual_rate_pct: rate,
            term_years: years,
            insurance_rate_pct: dec!(0.36),
        }
    }

    #[test]
    fn test_compare_identical_is_zero() {
        let a = evaluate(&config(dec!(52500), dec!(4.2), 25)).unwrap();
        let delta = compare(&a, &a);
        assert_eq!(delta.monthly_delta, Decimal::ZERO);
        assert_eq!(delta.total_delta, Decimal::ZERO);
        assert_eq!(delta.extra_capital, Decimal::ZERO);
        assert_eq!(delta.return_on_extra_capital, None);
    }

    #[test]
    fn test_extra_down_payment_return() {
        let reference = evaluate(&config(dec!(52500), dec!(4.2), 25)).unwrap();
        let alternative = evaluate(&config(dec!(82500), dec!(4.2), 25)).unwrap();
        let delta = compare(&reference, &alternative);

        assert!(delta.total_delta < Decimal::ZERO);
        assert_eq!(delta.extra_capital, dec!(30000));
        let expected =
            (reference.total_cost - alternative.total_cost) / dec!(30000) * dec!(100);
        assert_eq!(delta.return_on_extra_capital, Some(expected));
        // (507781.02 - 456576.21) / 30000 * 100 ≈ 170.68%
        assert!((expected - dec!(170.68)).abs() < dec!(0.01));
    }

    #[test]
    fn test_return_guard_on_zero_capital() {
        assert_eq!(return_on_extra_capital(dec!(-5000), Decimal::ZERO), Decimal::ZERO);
        assert_eq!(return_on_extra_capital(dec!(-5000), dec!(-10)), Decimal::ZERO);
        assert_eq!(return_on_extra_capital(dec!(-5000), dec!(10000)), dec!(50));
    }

    #[test]
    fn test_compare_configurations_picks_cheapest() {
        let mut shorter = config(dec!(52500), dec!(3.8), 20);
        shorter.label = Some("Shorter".into());
        let input = ComparisonInput {
            reference: config(dec!(52500), dec!(4.2), 25),
            alternatives: vec![shorter],
        };
        let out = compare_configurations(&input).unwrap();
        assert_eq!(out.result.deltas.len(), 1);
        assert_eq!(out.result.cheapest, "Shorter");
        assert!(out.result.deltas[0].monthly_delta > Decimal::ZERO);
    }

    #[test]
    fn test_compare_configurations_requires_alternatives() {
        let input = ComparisonInput {
            reference: config(dec!(52500), dec!(4.2), 25),
            alternatives: vec![],
        };
        assert!(matches!(
            compare_configurations(&input),
            Err(LoanScenarioError::InsufficientData(_))
        ));
    }
}
