use clap::Args;
use rust_decimal::Decimal;
use serde_json::Value;

use loan_scenario_core::evaluator::{self, LoanConfiguration};
use loan_scenario_core::guidance;

use super::loan::LoanArgs;

/// Arguments for budget guidance
#[derive(Args)]
pub struct GuidanceArgs {
    // Only --price is required; affordability needs --rate and --term-years
    #[command(flatten)]
    pub loan: LoanArgs,
}

pub fn run_guidance(args: GuidanceArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let supplied = args.loan.supplied_configuration()?;
    let (price, config) = guidance_target(&args.loan, supplied)?;

    let loan = match config {
        Some(ref config) => Some(evaluator::evaluate(config)?),
        None => None,
    };

    let result = guidance::assess(price, loan.as_ref())?;
    Ok(serde_json::to_value(result)?)
}

/// Price to assess and the loan to check it against.
///
/// A configuration from --input or stdin wins; otherwise the flags give a full
/// loan when --rate and --term-years are set, or a bare price.
fn guidance_target(
    args: &LoanArgs,
    supplied: Option<LoanConfiguration>,
) -> Result<(Decimal, Option<LoanConfiguration>), Box<dyn std::error::Error>> {
    if let Some(config) = supplied {
        return Ok((config.price, Some(config)));
    }
    if args.rate.is_some() && args.term_years.is_some() {
        let config = args.flag_configuration()?;
        return Ok((config.price, Some(config)));
    }
    let price = args
        .price
        .ok_or("--price is required (or provide --input or piped JSON)")?;
    Ok((price, None))
}
