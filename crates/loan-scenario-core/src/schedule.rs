//! Amortisation schedule generation.
//!
//! [`generate_schedule`] returns a lazy iterator over the monthly periods of
//! an evaluated loan. Each period charges interest on the opening balance and
//! applies the rest of the base payment to principal. The sequence stops the
//! first period the balance is cleared, even before the nominal term ends.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::iter::FusedIterator;
use std::time::Instant;
use tracing::warn;

use crate::error::LoanScenarioError;
use crate::evaluator::LoanResult;
use crate::types::{with_metadata, ComputationOutput, Money};
use crate::LoanScenarioResult;

/// Share of the base payment below which a remaining balance counts as paid.
///
/// Only absorbs Decimal rounding residue; any real shortfall is far larger.
pub const PAYOFF_TOLERANCE: Decimal = dec!(0.000000001);

/// A single period of the amortisation schedule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AmortizationEntry {
    /// Scenario the entry belongs to.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    /// 1-based period index.
    pub period: u32,
    pub opening_balance: Money,
    /// Interest + principal paid this period (insurance excluded).
    pub payment: Money,
    pub interest: Money,
    pub principal: Money,
    pub insurance: Money,
    pub remaining_balance: Money,
}

/// Lazy period-by-period schedule for one [`LoanResult`].
///
/// Holds no state beyond the loan and the current period: cloning forks the
/// iterator at its position, and [`generate_schedule`] starts a fresh run.
#[derive(Debug, Clone)]
pub struct Schedule<'a> {
    result: &'a LoanResult,
    period: u32,
    remaining: Money,
    finished: bool,
}

impl<'a> Schedule<'a> {
    /// The loan this schedule amortises.
    pub fn result(&self) -> &'a LoanResult {
        self.result
    }

    /// Balance after the last emitted period.
    pub fn remaining_balance(&self) -> Money {
        self.remaining
    }
}

impl Iterator for Schedule<'_> {
    type Item = AmortizationEntry;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished || self.period >= self.result.periods {
            return None;
        }
        self.period += 1;

        let opening = self.remaining;
        let interest = opening * self.result.periodic_rate;
        let mut principal = self.result.base_payment - interest;
        let mut remaining = opening - principal;

        // Final period absorbs the residual so principal sums to the loan amount.
        if remaining <= self.result.base_payment * PAYOFF_TOLERANCE {
            principal = opening;
            remaining = Decimal::ZERO;
            self.finished = true;
        }
        self.remaining = remaining;

        Some(AmortizationEntry {
            label: self.result.label.clone(),
            period: self.period,
            opening_balance: opening,
            payment: principal + interest,
            interest,
            principal,
            insurance: self.result.insurance_payment,
            remaining_balance: remaining,
        })
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        if self.finished {
            return (0, Some(0));
        }
        let left = self.result.periods.saturating_sub(self.period) as usize;
        (left.min(1), Some(left))
    }
}

impl FusedIterator for Schedule<'_> {}

/// Start the amortisation schedule of an evaluated loan.
///
/// Fails with `NonConvergentSchedule` when the base payment does not cover
/// the first period's interest, since the balance would then never decrease.
pub fn generate_schedule(result: &LoanResult) -> LoanScenarioResult<Schedule<'_>> {
    if result.loan_amount < Decimal::ZERO {
        return Err(LoanScenarioError::invalid(
            "loan_amount",
            "Loan amount cannot be negative",
        ));
    }
    if result.periodic_rate < Decimal::ZERO {
        return Err(LoanScenarioError::invalid(
            "periodic_rate",
            "Periodic rate cannot be negative",
        ));
    }

    let first_interest = result.loan_amount * result.periodic_rate;
    if result.loan_amount > Decimal::ZERO && result.base_payment <= first_interest {
        warn!(
            base_payment = %result.base_payment,
            interest = %first_interest,
            "payment does not cover interest"
        );
        return Err(LoanScenarioError::NonConvergentSchedule {
            period: 1,
            remaining_balance: result.loan_amount,
        });
    }

    Ok(Schedule {
        result,
        period: 0,
        remaining: result.loan_amount,
        finished: result.loan_amount.is_zero(),
    })
}

// ---------------------------------------------------------------------------
// Collected schedule
// ---------------------------------------------------------------------------

/// Fully expanded schedule with totals.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScheduleOutput {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    pub entries: Vec<AmortizationEntry>,
    /// Periods actually needed to clear the balance.
    pub periods_elapsed: u32,
    /// Nominal number of periods of the loan.
    pub scheduled_periods: u32,
    pub total_principal: Money,
    pub total_interest: Money,
    pub total_insurance: Money,
    pub total_paid: Money,
}

/// Collect the schedule of a loan and total its components.
pub fn build_schedule(
    result: &LoanResult,
) -> LoanScenarioResult<ComputationOutput<ScheduleOutput>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    let schedule = generate_schedule(result)?;
    let entries: Vec<AmortizationEntry> = schedule.collect();

    if let Some(last) = entries.last() {
        if last.remaining_balance > Decimal::ZERO {
            return Err(LoanScenarioError::NonConvergentSchedule {
                period: last.period,
                remaining_balance: last.remaining_balance,
            });
        }
    }

    let periods_elapsed = entries.len() as u32;
    if periods_elapsed < result.periods && !entries.is_empty() {
        warnings.push(format!(
            "Balance cleared after {periods_elapsed} of {} periods",
            result.periods
        ));
    }

    let total_principal: Money = entries.iter().map(|e| e.principal).sum();
    let total_interest: Money = entries.iter().map(|e| e.interest).sum();
    let total_insurance: Money = entries.iter().map(|e| e.insurance).sum();

    let output = ScheduleOutput {
        label: result.label.clone(),
        entries,
        periods_elapsed,
        scheduled_periods: result.periods,
        total_principal,
        total_interest,
        total_insurance,
        total_paid: total_principal + total_interest + total_insurance,
    };

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Monthly Amortisation Schedule",
        &serde_json::json!({
            "loan_amount": result.loan_amount.to_string(),
            "periodic_rate": result.periodic_rate.to_string(),
            "base_payment": result.base_payment.to_string(),
            "periods": result.periods,
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

    fn small_loan() -> LoanResult {
        evaluate(&LoanConfiguration {
            label: Some("Small".into()),
            price: dec!(120000),
            down_payment: dec!(20000),
            annual_rate_pct: dec!(6),
            term_years: 10,
            insurance_rate_pct: Decimal::ZERO,
        })
        .unwrap()
    }

    #[test]
    fn test_first_period_split() {
        let result = small_loan();
        let first = generate_schedule(&result).unwrap().next().unwrap();
        assert_eq!(first.period, 1);
        assert_eq!(first.opening_balance, dec!(100000));
        // 100000 * 0.005
        assert_eq!(first.interest, dec!(500));
        assert_eq!(first.principal, result.base_payment - dec!(500));
        assert_eq!(first.label.as_deref(), Some("Small"));
    }

    #[test]
    fn test_schedule_clears_at_final_period() {
        let result = small_loan();
        let entries: Vec<_> = generate_schedule(&result).unwrap().collect();
        assert_eq!(entries.len(), 120);
        assert_eq!(entries.last().unwrap().remaining_balance, Decimal::ZERO);
    }

    #[test]
    fn test_tiny_loan_runs_full_term() {
        let result = evaluate(&LoanConfiguration {
            label: None,
            price: dec!(1),
            down_payment: Decimal::ZERO,
            annual_rate_pct: dec!(4.2),
            term_years: 30,
            insurance_rate_pct: Decimal::ZERO,
        })
        .unwrap();
        let entries: Vec<_> = generate_schedule(&result).unwrap().collect();
        assert_eq!(entries.len(), 360);

        let last = entries.last().unwrap();
        assert_eq!(last.remaining_balance, Decimal::ZERO);
        assert!((last.payment - result.base_payment).abs() < dec!(0.0000001));
        assert!(entries[358].remaining_balance > Decimal::ZERO);
    }

    #[test]
    fn test_schedule_is_restartable() {
        let result = small_loan();
        let a: Vec<_> = generate_schedule(&result).unwrap().collect();
        let b: Vec<_> = generate_schedule(&result).unwrap().collect();
        assert_eq!(a, b);
    }

    #[test]
    fn test_overpayment_stops_early() {
        let mut result = small_loan();
        result.base_payment = dec!(60000);
        let entries: Vec<_> = generate_schedule(&result).unwrap().collect();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[1].remaining_balance, Decimal::ZERO);

        let out = build_schedule(&result).unwrap();
        assert_eq!(out.result.periods_elapsed, 2);
        assert_eq!(out.warnings.len(), 1);
    }

    #[test]
    fn test_payment_below_interest_is_non_convergent() {
        let mut result = small_loan();
        result.base_payment = dec!(500);
        let err = generate_schedule(&result).unwrap_err();
        assert!(matches!(
            err,
            LoanScenarioError::NonConvergentSchedule { period: 1, .. }
        ));
    }

    #[test]
    fn test_underpayment_detected_at_term_end() {
        let mut result = small_loan();
        result.base_payment = dec!(600);
        let err = build_schedule(&result).unwrap_err();
        assert!(matches!(
            err,
            LoanScenarioError::NonConvergentSchedule { period: 120, .. }
        ));
    }

    #[test]
    fn test_build_schedule_totals() {
        let result = small_loan();
        let out = build_schedule(&result).unwrap();
        let sched = &out.result;
        assert!((sched.total_principal - dec!(100000)).abs() < dec!(0.000001));
        assert_eq!(sched.total_insurance, Decimal::ZERO);
        assert!((sched.total_interest - result.total_interest).abs() < dec!(0.01));
        assert!(out.warnings.is_empty());
    }
}
