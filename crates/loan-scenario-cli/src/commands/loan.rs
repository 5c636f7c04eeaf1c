use clap::Args;
use rust_decimal::Decimal;
use serde_json::Value;

use loan_scenario_core::evaluator::{self, LoanConfiguration};
use loan_scenario_core::schedule;

use crate::input;

/// Loan parameters shared by the single-loan commands
#[derive(Args, Debug, Clone)]
pub struct LoanArgs {
    /// Path to JSON/YAML input file (overrides individual flags)
    #[arg(long)]
    pub input: Option<String>,

    /// Purchase price
    #[arg(long)]
    pub price: Option<Decimal>,

    /// Down payment (personal contribution)
    #[arg(long, default_value = "0")]
    pub down_payment: Decimal,

    /// Annual interest rate in percent (e.g. 4.2)
    #[arg(long)]
    pub rate: Option<Decimal>,

    /// Loan term in years
    #[arg(long)]
    pub term_years: Option<u32>,

    /// Annual borrower insurance rate in percent of the loan amount
    #[arg(long, default_value = "0")]
    pub insurance_rate: Decimal,

    /// Scenario name
    #[arg(long)]
    pub label: Option<String>,
}

impl LoanArgs {
    /// Resolve the configuration from --input, piped stdin, or the flags.
    pub fn configuration(&self) -> Result<LoanConfiguration, Box<dyn std::error::Error>> {
        match self.supplied_configuration()? {
            Some(config) => Ok(config),
            None => self.flag_configuration(),
        }
    }

    /// Configuration from --input or piped stdin, if either was given.
    pub fn supplied_configuration(
        &self,
    ) -> Result<Option<LoanConfiguration>, Box<dyn std::error::Error>> {
        if let Some(ref path) = self.input {
            return Ok(Some(input::file::read_input(path)?));
        }
        if let Some(data) = input::stdin::read_stdin()? {
            return Ok(Some(serde_json::from_value(data)?));
        }
        Ok(None)
    }

    pub fn flag_configuration(&self) -> Result<LoanConfiguration, Box<dyn std::error::Error>> {
        let price = self.price.ok_or("--price is required (or provide --input)")?;
        let rate = self.rate.ok_or("--rate is required (or provide --input)")?;
        let term_years = self
            .term_years
            .ok_or("--term-years is required (or provide --input)")?;

        Ok(LoanConfiguration {
            label: self.label.clone(),
            price,
            down_payment: self.down_payment,
            annual_rate_pct: rate,
            term_years,
            insurance_rate_pct: self.insurance_rate,
        })
    }
}

/// Arguments for loan evaluation
#[derive(Args)]
pub struct EvaluateArgs {
    #[command(flatten)]
    pub loan: LoanArgs,
}

pub fn run_evaluate(args: EvaluateArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let config = args.loan.configuration()?;
    let result = evaluator::analyze_loan(&config)?;
    Ok(serde_json::to_value(result)?)
}

/// Arguments for the amortisation schedule
#[derive(Args)]
pub struct ScheduleArgs {
    #[command(flatten)]
    pub loan: LoanArgs,

    /// Keep only every n-th period (12 = one row per year); the final period is always kept
    #[arg(long, default_value_t = 1)]
    pub every: u32,

    /// Omit the period rows and print totals only
    #[arg(long)]
    pub summary: bool,
}

pub fn run_schedule(args: ScheduleArgs) -> Result<Value, Box<dyn std::error::Error>> {
    if args.every == 0 {
        return Err("--every must be at least 1".into());
    }

    let config = args.loan.configuration()?;
    let loan = evaluator::evaluate(&config)?;
    let mut result = schedule::build_schedule(&loan)?;

    let last_period = result.result.periods_elapsed;
    if args.summary {
        result.result.entries.clear();
    } else if args.every > 1 {
        result
            .result
            .entries
            .retain(|e| e.period % args.every == 0 || e.period == last_period);
    }

    Ok(serde_json::to_value(result)?)
}
