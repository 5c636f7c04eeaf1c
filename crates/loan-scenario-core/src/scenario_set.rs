//! Three-strategy analysis around a reference loan.
//!
//! Starting from a reference configuration, builds two alternatives: the same
//! loan with a larger down payment, and the same down payment with a different
//! rate and term. Both are compared with the reference.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::comparison::{compare, ComparisonDelta};
use crate::error::LoanScenarioError;
use crate::evaluator::{evaluate, LoanConfiguration, LoanResult};
use crate::guidance::{affordability, Affordability, DownPaymentGuidance};
use crate::schedule::generate_schedule;
use crate::types::{with_metadata, ComputationOutput, Money, Percent};
use crate::LoanScenarioResult;

pub const REFERENCE_LABEL: &str = "Reference";
pub const EXTRA_DOWN_LABEL: &str = "Extra down payment";
pub const ALTERNATIVE_TERMS_LABEL: &str = "Alternative rate/term";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScenarioSetInput {
    pub price: Money,
    pub down_payment: Money,
    pub annual_rate_pct: Percent,
    pub term_years: u32,
    #[serde(default)]
    pub insurance_rate_pct: Percent,
    /// Contribution added to the down payment in the second scenario.
    pub additional_down_payment: Money,
    /// Rate used by the third scenario.
    pub alternative_rate_pct: Percent,
    /// Term used by the third scenario.
    pub alternative_term_years: u32,
}

/// One evaluated strategy of the set.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StrategyOutcome {
    pub result: LoanResult,
    /// Periods needed to clear the balance.
    pub periods_to_payoff: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScenarioSetOutput {
    pub reference: StrategyOutcome,
    pub extra_down_payment: StrategyOutcome,
    pub alternative_terms: StrategyOutcome,
    pub extra_down_payment_delta: ComparisonDelta,
    pub alternative_terms_delta: ComparisonDelta,
    /// Income required for the reference payment.
    pub affordability: Affordability,
}

impl ScenarioSetInput {
    pub fn reference(&self) -> LoanConfiguration {
        LoanConfiguration {
            label: Some(REFERENCE_LABEL.into()),
            price: self.price,
            down_payment: self.down_payment,
            annual_rate_pct: self.annual_rate_pct,
            term_years: self.term_years,
            insurance_rate_pct: self.insurance_rate_pct,
        }
    }

    pub fn extra_down_payment(&self) -> LoanConfiguration {
        LoanConfiguration {
            label: Some(EXTRA_DOWN_LABEL.into()),
            down_payment: self.down_payment + self.additional_down_payment,
            ..self.reference()
        }
    }

    pub fn alternative_terms(&self) -> LoanConfiguration {
        LoanConfiguration {
            label: Some(ALTERNATIVE_TERMS_LABEL.into()),
            annual_rate_pct: self.alternative_rate_pct,
            term_years: self.alternative_term_years,
            ..self.reference()
        }
    }
}

/// Evaluate and compare the reference, extra-down-payment and alternative-terms strategies.
pub fn analyze_scenario_set(
    input: &ScenarioSetInput,
) -> LoanScenarioResult<ComputationOutput<ScenarioSetOutput>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    if input.additional_down_payment < Decimal::ZERO {
        return Err(LoanScenarioError::invalid(
            "additional_down_payment",
            "Additional down payment cannot be negative",
        ));
    }

    let guidance = DownPaymentGuidance::for_price(input.price);
    if input.price > Decimal::ZERO && !guidance.contains(input.down_payment) {
        warnings.push(format!(
            "Down payment {} outside suggested range {}-{}",
            input.down_payment, guidance.minimum, guidance.maximum
        ));
    }
    if input.additional_down_payment > guidance.max_additional {
        warnings.push(format!(
            "Additional down payment {} exceeds suggested ceiling {}",
            input.additional_down_payment, guidance.max_additional
        ));
    }
    if input.additional_down_payment.is_zero() {
        warnings.push("No additional down payment: second strategy equals the reference".into());
    }

    let reference = outcome(evaluate(&input.reference())?)?;
    let extra_down_payment = outcome(evaluate(&input.extra_down_payment())?)?;
    let alternative_terms = outcome(evaluate(&input.alternative_terms())?)?;

    let extra_down_payment_delta = compare(&reference.result, &extra_down_payment.result);
    let alternative_terms_delta = compare(&reference.result, &alternative_terms.result);
    let affordability = affordability(&reference.result)?;

    let output = ScenarioSetOutput {
        reference,
        extra_down_payment,
        alternative_terms,
        extra_down_payment_delta,
        alternative_terms_delta,
        affordability,
    };

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Loan Strategy Comparison (reference, extra down payment, alternative rate/term)",
        &serde_json::json!({
            "price": input.price.to_string(),
            "down_payment": input.down_payment.to_string(),
            "additional_down_payment": input.additional_down_payment.to_string(),
            "annual_rate_pct": input.annual_rate_pct.to_string(),
            "alternative_rate_pct": input.alternative_rate_pct.to_string(),
            "term_years": input.term_years,
            "alternative_term_years": input.alternative_term_years,
        }),
        warnings,
        elapsed,
        output,
    ))
}

fn outcome(result: LoanResult) -> LoanScenarioResult<StrategyOutcome> {
    let periods_to_payoff = generate_schedule(&result)?.count() as u32;
    Ok(StrategyOutcome {
        result,
        periods_to_payoff,
    })
}
