use clap::Args;
use rust_decimal::Decimal;
use serde_json::Value;

use loan_scenario_core::comparison::{self, ComparisonInput};
use loan_scenario_core::scenario_set::{self, ScenarioSetInput};

use crate::input;

/// Arguments for comparing loans
#[derive(Args)]
pub struct CompareArgs {
    /// Path to JSON/YAML file with `reference` and `alternatives` configurations
    #[arg(long)]
    pub input: Option<String>,
}

pub fn run_compare(args: CompareArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let cmp_input: ComparisonInput = if let Some(ref path) = args.input {
        input::file::read_input(path)?
    } else if let Some(data) = input::stdin::read_stdin()? {
        serde_json::from_value(data)?
    } else {
        return Err("--input <file.json> or stdin required for loan comparison".into());
    };
    let result = comparison::compare_configurations(&cmp_input)?;
    Ok(serde_json::to_value(result)?)
}

/// Arguments for the three-strategy analysis
#[derive(Args)]
pub struct ScenariosArgs {
    /// Path to JSON/YAML input file (overrides individual flags)
    #[arg(long)]
    pub input: Option<String>,

    /// Purchase price
    #[arg(long)]
    pub price: Option<Decimal>,

    /// Reference down payment
    #[arg(long)]
    pub down_payment: Option<Decimal>,

    /// Reference annual interest rate in percent
    #[arg(long)]
    pub rate: Option<Decimal>,

    /// Reference term in years
    #[arg(long, default_value_t = 25)]
    pub term_years: u32,

    /// Annual borrower insurance rate in percent
    #[arg(long, default_value = "0.36")]
    pub insurance_rate: Decimal,

    /// Extra down payment for the second strategy
    #[arg(long, default_value = "30000")]
    pub additional_down: Decimal,

    /// Annual rate in percent for the third strategy
    #[arg(long)]
    pub alt_rate: Option<Decimal>,

    /// Term in years for the third strategy
    #[arg(long, default_value_t = 20)]
    pub alt_term_years: u32,
}

pub fn run_scenarios(args: ScenariosArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let set_input: ScenarioSetInput = if let Some(ref path) = args.input {
        input::file::read_input(path)?
    } else if let Some(data) = input::stdin::read_stdin()? {
        serde_json::from_value(data)?
    } else {
        let price = args.price.ok_or("--price is required (or provide --input)")?;
        let down_payment = args
            .down_payment
            .ok_or("--down-payment is required (or provide --input)")?;
        let rate = args.rate.ok_or("--rate is required (or provide --input)")?;

        ScenarioSetInput {
            price,
            down_payment,
            annual_rate_pct: rate,
            term_years: args.term_years,
            insurance_rate_pct: args.insurance_rate,
            additional_down_payment: args.additional_down,
            alternative_rate_pct: args.alt_rate.unwrap_or(rate),
            alternative_term_years: args.alt_term_years,
        }
    };

    let result = scenario_set::analyze_scenario_set(&set_input)?;
    Ok(serde_json::to_value(result)?)
}
