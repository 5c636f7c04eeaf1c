//! Scenario evaluator: turns a loan configuration into its payment breakdown.
//!
//! The periodic payment follows the standard annuity formula with an explicit
//! zero-interest branch. Borrower insurance is a flat premium charged on the
//! original loan amount, not on the declining balance. All arithmetic stays in
//! `rust_decimal::Decimal`; whole-unit rounding only happens in [`LoanDisplay`].

use rust_decimal::Decimal;
use rust_decimal::MathematicalOps;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::time::Instant;
use tracing::debug;

use crate::error::LoanScenarioError;
use crate::types::{round_currency, with_metadata, ComputationOutput, Money, Percent, Rate};
use crate::LoanScenarioResult;

/// Payment periods per year (monthly schedule).
pub const PERIODS_PER_YEAR: u32 = 12;

const HUNDRED: Decimal = dec!(100);

// ---------------------------------------------------------------------------
// Input / output types
// ---------------------------------------------------------------------------

/// Parameters of a single loan scenario.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoanConfiguration {
    /// Optional scenario name used to label results and schedules.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    /// Purchase price of the property.
    pub price: Money,
    /// Personal contribution paid up front.
    pub down_payment: Money,
    /// Nominal annual interest rate in percent (4.2 = 4.2%).
    pub annual_rate_pct: Percent,
    /// Loan term in whole years.
    pub term_years: u32,
    /// Annual borrower insurance rate in percent of the original loan amount.
    #[serde(default)]
    pub insurance_rate_pct: Percent,
}

/// Whole-unit figures for presentation, each rounded from the precise value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoanDisplay {
    pub base_payment: Money,
    pub insurance_payment: Money,
    pub total_payment: Money,
    pub total_cost: Money,
    pub total_interest: Money,
}

/// Evaluated loan scenario.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoanResult {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    pub price: Money,
    pub down_payment: Money,
    pub annual_rate_pct: Percent,
    pub term_years: u32,
    pub insurance_rate_pct: Percent,
    /// price - down_payment
    pub loan_amount: Money,
    /// Monthly rate as a decimal.
    pub periodic_rate: Rate,
    /// Number of monthly payments.
    pub periods: u32,
    /// Principal + interest per period.
    pub base_payment: Money,
    /// Flat insurance premium per period.
    pub insurance_payment: Money,
    pub total_payment: Money,
    /// total_payment * periods
    pub total_cost: Money,
    /// total_cost - loan_amount (insurance included)
    pub total_interest: Money,
    pub display: LoanDisplay,
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Check the preconditions of [`evaluate`].
pub fn validate(config: &LoanConfiguration) -> LoanScenarioResult<()> {
    if config.price <= Decimal::ZERO {
        return Err(LoanScenarioError::invalid(
            "price",
            "Price must be positive",
        ));
    }
    if config.down_payment < Decimal::ZERO {
        return Err(LoanScenarioError::invalid(
            "down_payment",
            "Down payment cannot be negative",
        ));
    }
    if config.down_payment >= config.price {
        return Err(LoanScenarioError::invalid(
            "down_payment",
            "Down payment must be less than the price",
        ));
    }
    if config.annual_rate_pct < Decimal::ZERO {
        return Err(LoanScenarioError::invalid(
            "annual_rate_pct",
            "Interest rate cannot be negative",
        ));
    }
    if config.term_years == 0 {
        return Err(LoanScenarioError::invalid(
            "term_years",
            "Term must be at least 1 year",
        ));
    }
    if config.insurance_rate_pct < Decimal::ZERO {
        return Err(LoanScenarioError::invalid(
            "insurance_rate_pct",
            "Insurance rate cannot be negative",
        ));
    }
    Ok(())
}

/// Evaluate a loan configuration into its payment breakdown and totals.
pub fn evaluate(config: &LoanConfiguration) -> LoanScenarioResult<LoanResult> {
    validate(config)?;

    let loan_amount = config.price - config.down_payment;
    let periodic_rate = config.annual_rate_pct / HUNDRED / Decimal::from(PERIODS_PER_YEAR);
    let periods = config
        .term_years
        .checked_mul(PERIODS_PER_YEAR)
        .ok_or_else(|| LoanScenarioError::invalid("term_years", "Term is too long"))?;

    let base_payment = annuity_payment(loan_amount, periodic_rate, periods)?;
    let insurance_payment = loan_amount
        .checked_mul(config.insurance_rate_pct)
        .map(|premium| premium / HUNDRED / Decimal::from(PERIODS_PER_YEAR))
        .ok_or_else(|| {
            LoanScenarioError::invalid("insurance_rate_pct", "Insurance premium overflows")
        })?;
    let total_payment = base_payment
        .checked_add(insurance_payment)
        .ok_or_else(|| LoanScenarioError::invalid("price", "Total payment overflows"))?;
    let total_cost = total_payment
        .checked_mul(Decimal::from(periods))
        .ok_or_else(|| {
            LoanScenarioError::invalid("price", "Loan amount and term overflow the total cost")
        })?;
    let total_interest = total_cost - loan_amount;

    debug!(
        label = config.label.as_deref().unwrap_or("-"),
        %loan_amount,
        %periodic_rate,
        periods,
        %base_payment,
        "evaluated loan scenario"
    );

    Ok(LoanResult {
        label: config.label.clone(),
        price: config.price,
        down_payment: config.down_payment,
        annual_rate_pct: config.annual_rate_pct,
        term_years: config.term_years,
        insurance_rate_pct: config.insurance_rate_pct,
        loan_amount,
        periodic_rate,
        periods,
        base_payment,
        insurance_payment,
        total_payment,
        total_cost,
        total_interest,
        display: LoanDisplay {
            base_payment: round_currency(base_payment),
            insurance_payment: round_currency(insurance_payment),
            total_payment: round_currency(total_payment),
            total_cost: round_currency(total_cost),
            total_interest: round_currency(total_interest),
        },
    })
}

/// Evaluate a loan configuration and wrap it in the standard output envelope.
pub fn analyze_loan(
    config: &LoanConfiguration,
) -> LoanScenarioResult<ComputationOutput<LoanResult>> {
    let start = Instant::now();
    let result = evaluate(config)?;

    let mut warnings = Vec::new();
    if result.periodic_rate.is_zero() {
        warnings.push("Zero interest rate: payment is the loan amount spread evenly".into());
    }

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Annuity Loan Evaluation (flat insurance on original amount)",
        &serde_json::json!({
            "price": config.price.to_string(),
            "down_payment": config.down_payment.to_string(),
            "annual_rate_pct": config.annual_rate_pct.to_string(),
            "term_years": config.term_years,
            "insurance_rate_pct": config.insurance_rate_pct.to_string(),
            "periods_per_year": PERIODS_PER_YEAR,
        }),
        warnings,
        elapsed,
        result,
    ))
}

// ---------------------------------------------------------------------------
// Internals
// ---------------------------------------------------------------------------

/// Constant payment repaying `loan_amount` over `periods` at `rate` per period.
fn annuity_payment(loan_amount: Money, rate: Rate, periods: u32) -> LoanScenarioResult<Money> {
    let n = Decimal::from(periods);
    if rate.is_zero() {
        return Ok(loan_amount / n);
    }

    let growth = (Decimal::ONE + rate)
        .checked_powi(i64::from(periods))
        .ok_or_else(|| {
            LoanScenarioError::invalid(
                "annual_rate_pct",
                "Rate and term overflow the compounding factor",
            )
        })?;
    let denominator = growth - Decimal::ONE;

    // Rate below Decimal resolution: (1+r)^n collapsed to 1.
    if denominator.is_zero() {
        return Ok(loan_amount / n);
    }

    // rate * growth / (growth - 1) stays close to `rate`, so scale the loan last.
    let factor = rate
        .checked_mul(growth)
        .and_then(|scaled| scaled.checked_div(denominator))
        .ok_or_else(|| {
            LoanScenarioError::invalid(
                "annual_rate_pct",
                "Rate and term overflow the compounding factor",
            )
        })?;
    loan_amount
        .checked_mul(factor)
        .ok_or_else(|| LoanScenarioError::invalid("price", "Loan amount overflows the payment"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn reference_config() -> LoanConfiguration {
        LoanConfiguration {
            label: Some("Reference".into()),
            price: dec!(350000),
            down_payment: dec!(52500),
            annual_rate_pct: dec!(4.2),
            term_years: 25,
            insurance_rate_pct: dec!(0.36),
        }
    }

    #[test]
    fn test_reference_scenario() {
        let result = evaluate(&reference_config()).unwrap();
        assert_eq!(result.loan_amount, dec!(297500));
        assert_eq!(result.periodic_rate, dec!(0.0035));
        assert_eq!(result.periods, 300);
        // 297500 * 0.0035 * 1.0035^300 / (1.0035^300 - 1) ≈ 1603.35
        assert!((result.base_payment - dec!(1603.3534)).abs() < dec!(0.001));
        assert_eq!(result.insurance_payment, dec!(89.25));
        assert_eq!(result.display.base_payment, dec!(1603));
        assert_eq!(result.display.insurance_payment, dec!(89));
        assert_eq!(result.display.total_payment, dec!(1693));
        assert_eq!(result.display.total_cost, dec!(507781));
        assert!(result.total_cost > result.loan_amount);
        assert_eq!(result.label.as_deref(), Some("Reference"));
    }

    #[test]
    fn test_zero_rate_branch() {
        let mut config = reference_config();
        config.annual_rate_pct = Decimal::ZERO;
        let result = evaluate(&config).unwrap();
        assert_eq!(result.base_payment, dec!(297500) / dec!(300));
        assert!((result.base_payment * dec!(300) - dec!(297500)).abs() < dec!(0.000001));
    }

    #[test]
    fn test_totals_are_consistent() {
        let result = evaluate(&reference_config()).unwrap();
        assert_eq!(
            result.total_payment,
            result.base_payment + result.insurance_payment
        );
        assert_eq!(result.total_cost, result.total_payment * dec!(300));
        assert_eq!(result.total_interest, result.total_cost - result.loan_amount);
    }

    #[test]
    fn test_no_insurance() {
        let mut config = reference_config();
        config.insurance_rate_pct = Decimal::ZERO;
        let result = evaluate(&config).unwrap();
        assert_eq!(result.insurance_payment, Decimal::ZERO);
        assert_eq!(result.total_payment, result.base_payment);
    }

    #[test]
    fn test_down_payment_equal_to_price_rejected() {
        let mut config = reference_config();
        config.down_payment = config.price;
        let err = evaluate(&config).unwrap_err();
        assert!(matches!(
            err,
            LoanScenarioError::InvalidConfiguration { ref field, .. } if field == "down_payment"
        ));
    }

    #[test]
    fn test_non_positive_price_rejected() {
        let mut config = reference_config();
        config.price = Decimal::ZERO;
        config.down_payment = Decimal::ZERO;
        assert!(evaluate(&config).is_err());
    }

    #[test]
    fn test_negative_rate_rejected() {
        let mut config = reference_config();
        config.annual_rate_pct = dec!(-0.5);
        assert!(evaluate(&config).is_err());
    }

    #[test]
    fn test_zero_term_rejected() {
        let mut config = reference_config();
        config.term_years = 0;
        assert!(evaluate(&config).is_err());
    }

    #[test]
    fn test_negative_insurance_rejected() {
        let mut config = reference_config();
        config.insurance_rate_pct = dec!(-0.1);
        assert!(evaluate(&config).is_err());
    }

    #[test]
    fn test_compounding_overflow_is_invalid_configuration() {
        let mut config = reference_config();
        config.annual_rate_pct = dec!(1000);
        config.term_years = 30;
        let err = evaluate(&config).unwrap_err();
        assert!(matches!(
            err,
            LoanScenarioError::InvalidConfiguration { ref field, .. } if field == "annual_rate_pct"
        ));
    }

    #[test]
    fn test_high_rate_payment_does_not_overflow() {
        // (1.19)^360 is about 1.5e27: loan * rate * growth would exceed Decimal::MAX
        let config = LoanConfiguration {
            label: None,
            price: dec!(297500),
            down_payment: Decimal::ZERO,
            annual_rate_pct: dec!(228),
            term_years: 30,
            insurance_rate_pct: Decimal::ZERO,
        };
        let result = evaluate(&config).unwrap();
        assert_eq!(result.periodic_rate, dec!(0.19));
        // Payment tends to the interest-only amount 297500 * 0.19
        assert!((result.base_payment - dec!(56525)).abs() < dec!(0.01));
        assert_eq!(result.total_cost, result.total_payment * dec!(360));
    }

    #[test]
    fn test_huge_price_is_invalid_configuration() {
        let config = LoanConfiguration {
            label: None,
            price: Decimal::MAX,
            down_payment: Decimal::ZERO,
            annual_rate_pct: dec!(4.2),
            term_years: 25,
            insurance_rate_pct: Decimal::ZERO,
        };
        let err = evaluate(&config).unwrap_err();
        assert!(matches!(
            err,
            LoanScenarioError::InvalidConfiguration { ref field, .. } if field == "price"
        ));
    }

    #[test]
    fn test_huge_insurance_rate_is_invalid_configuration() {
        let mut config = reference_config();
        config.insurance_rate_pct = Decimal::MAX;
        assert!(matches!(
            evaluate(&config).unwrap_err(),
            LoanScenarioError::InvalidConfiguration { .. }
        ));
    }

    #[test]
    fn test_analyze_loan_envelope() {
        let out = analyze_loan(&reference_config()).unwrap();
        assert!(out.warnings.is_empty());
        assert_eq!(out.result.periods, 300);
        assert_eq!(out.assumptions["term_years"], 25);
    }
}
