//! Budget guidance heuristics.
//!
//! Presentation policy kept apart from the evaluator: budget tier tags,
//! suggested down payment bands and the income needed to stay under common
//! debt-to-income ceilings. Thresholds are in the same currency units as the
//! price.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::error::LoanScenarioError;
use crate::evaluator::LoanResult;
use crate::types::{round_currency, with_metadata, ComputationOutput, Money, Rate};
use crate::LoanScenarioResult;

pub const STARTER_CEILING: Money = dec!(200000);
pub const FAMILY_CEILING: Money = dec!(400000);
pub const PREMIUM_CEILING: Money = dec!(800000);

pub const MIN_DOWN_PAYMENT_SHARE: Rate = dec!(0.10);
pub const SUGGESTED_DOWN_PAYMENT_SHARE: Rate = dec!(0.15);
pub const MAX_DOWN_PAYMENT_SHARE: Rate = dec!(0.40);
pub const MAX_ADDITIONAL_SHARE: Rate = dec!(0.15);
const DEFAULT_ADDITIONAL_CAP: Money = dec!(30000);

/// Usual debt-to-income ceilings.
pub const DEBT_RATIO_STANDARD: Rate = dec!(0.30);
pub const DEBT_RATIO_MAXIMUM: Rate = dec!(0.33);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BudgetTier {
    /// Studio or small flat, first-time buyers.
    Starter,
    /// House or large flat for a main family residence.
    Family,
    Premium,
    Luxury,
}

impl BudgetTier {
    pub fn from_price(price: Money) -> Self {
        if price <= STARTER_CEILING {
            BudgetTier::Starter
        } else if price <= FAMILY_CEILING {
            BudgetTier::Family
        } else if price <= PREMIUM_CEILING {
            BudgetTier::Premium
        } else {
            BudgetTier::Luxury
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            BudgetTier::Starter => "Studio or small flat: first-time buyer or rental investment",
            BudgetTier::Family => "House or large flat: main family residence",
            BudgetTier::Premium => "Premium budget: high-standard or large property",
            BudgetTier::Luxury => "Luxury budget: top-end property or rental portfolio",
        }
    }
}

/// Suggested down payment band for a price.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DownPaymentGuidance {
    pub minimum: Money,
    pub suggested: Money,
    pub maximum: Money,
    /// Ceiling for an extra contribution on top of the suggested one.
    pub max_additional: Money,
    pub default_additional: Money,
}

impl DownPaymentGuidance {
    pub fn for_price(price: Money) -> Self {
        let minimum = (price * MIN_DOWN_PAYMENT_SHARE).trunc();
        let maximum = (price * MAX_DOWN_PAYMENT_SHARE).trunc();
        let suggested = (price * SUGGESTED_DOWN_PAYMENT_SHARE).trunc().min(maximum);
        let max_additional = (price * MAX_ADDITIONAL_SHARE).trunc();
        let default_additional = DEFAULT_ADDITIONAL_CAP.min((max_additional / dec!(2)).trunc());
        DownPaymentGuidance {
            minimum,
            suggested,
            maximum,
            max_additional,
            default_additional,
        }
    }

    pub fn contains(&self, down_payment: Money) -> bool {
        down_payment >= self.minimum && down_payment <= self.maximum
    }
}

/// Net monthly income needed for a payment at each debt-to-income ceiling.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Affordability {
    pub total_payment: Money,
    pub income_at_standard_ratio: Money,
    pub income_at_maximum_ratio: Money,
}

/// Income needed so that `total_payment` is `debt_ratio` of it.
pub fn required_income(total_payment: Money, debt_ratio: Rate) -> LoanScenarioResult<Money> {
    if debt_ratio <= Decimal::ZERO || debt_ratio > Decimal::ONE {
        return Err(LoanScenarioError::invalid(
            "debt_ratio",
            "Debt ratio must be in (0, 1]",
        ));
    }
    Ok(total_payment / debt_ratio)
}

pub fn affordability(result: &LoanResult) -> LoanScenarioResult<Affordability> {
    Ok(Affordability {
        total_payment: result.total_payment,
        income_at_standard_ratio: required_income(result.total_payment, DEBT_RATIO_STANDARD)?,
        income_at_maximum_ratio: required_income(result.total_payment, DEBT_RATIO_MAXIMUM)?,
    })
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GuidanceOutput {
    pub price: Money,
    pub tier: BudgetTier,
    pub tier_description: String,
    pub down_payment: DownPaymentGuidance,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub affordability: Option<Affordability>,
}

/// Budget guidance for a price, with affordability when a loan is supplied.
pub fn assess(
    price: Money,
    loan: Option<&LoanResult>,
) -> LoanScenarioResult<ComputationOutput<GuidanceOutput>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    if price <= Decimal::ZERO {
        return Err(LoanScenarioError::invalid("price", "Price must be positive"));
    }

    let tier = BudgetTier::from_price(price);
    let down_payment = DownPaymentGuidance::for_price(price);

    let affordability = match loan {
        Some(result) => {
            if result.price != price {
                warnings.push(format!(
                    "Loan price {} differs from assessed price {price}",
                    result.price
                ));
            }
            if !down_payment.contains(result.down_payment) {
                warnings.push(format!(
                    "Down payment {} outside suggested range {}-{}",
                    round_currency(result.down_payment),
                    down_payment.minimum,
                    down_payment.maximum
                ));
            }
            Some(affordability(result)?)
        }
        None => None,
    };

    let output = GuidanceOutput {
        price,
        tier,
        tier_description: tier.description().into(),
        down_payment,
        affordability,
    };

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Budget Guidance Heuristics",
        &serde_json::json!({
            "tier_ceilings": [
                STARTER_CEILING.to_string(),
                FAMILY_CEILING.to_string(),
                PREMIUM_CEILING.to_string(),
            ],
            "debt_ratios": [
                DEBT_RATIO_STANDARD.to_string(),
                DEBT_RATIO_MAXIMUM.to_string(),
            ],
        }),
        warnings,
        elapsed,
        output,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::evaluator::{evaluate, LoanConfiguration};
    use rust_decimal_macros::dec;

    #[test]
    fn test_tier_boundaries() {
        assert_eq!(BudgetTier::from_price(dec!(200000)), BudgetTier::Starter);
        assert_eq!(BudgetTier::from_price(dec!(200001)), BudgetTier::Family);
        assert_eq!(BudgetTier::from_price(dec!(400000)), BudgetTier::Family);
        assert_eq!(BudgetTier::from_price(dec!(800000)), BudgetTier::Premium);
        assert_eq!(BudgetTier::from_price(dec!(1500000)), BudgetTier::Luxury);
    }

    #[test]
    fn test_down_payment_band() {
        let g = DownPaymentGuidance::for_price(dec!(350000));
        assert_eq!(g.minimum, dec!(35000));
        assert_eq!(g.suggested, dec!(52500));
        assert_eq!(g.maximum, dec!(140000));
        assert_eq!(g.max_additional, dec!(52500));
        assert_eq!(g.default_additional, dec!(26250));
    }

    #[test]
    fn test_default_additional_capped() {
        let g = DownPaymentGuidance::for_price(dec!(1000000));
        assert_eq!(g.default_additional, dec!(30000));
    }

    #[test]
    fn test_required_income() {
        assert_eq!(required_income(dec!(1500), dec!(0.30)).unwrap(), dec!(5000));
        assert!(required_income(dec!(1500), Decimal::ZERO).is_err());
        assert!(required_income(dec!(1500), dec!(1.5)).is_err());
    }

    #[test]
    fn test_assess_with_loan() {
        let loan = evaluate(&LoanConfiguration {
            label: None,
            price: dec!(350000),
            down_payment: dec!(20000),
            annual_rate_pct: dec!(4.2),
            term_years: 25,
            insurance_rate_pct: dec!(0.36),
        })
        .unwrap();
        let out = assess(dec!(350000), Some(&loan)).unwrap();
        assert_eq!(out.result.tier, BudgetTier::Family);
        // 20000 is below the 10% floor
        assert_eq!(out.warnings.len(), 1);
        let aff = out.result.affordability.unwrap();
        assert!(aff.income_at_standard_ratio > aff.income_at_maximum_ratio);
    }
}
