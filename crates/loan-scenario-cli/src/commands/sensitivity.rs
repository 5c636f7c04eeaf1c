use clap::{Args, ValueEnum};
use rust_decimal::Decimal;
use serde_json::Value;

use loan_scenario_core::sensitivity::{
    self, LoanMetric, LoanSensitivityInput, LoanVariable, SensitivityVariable,
};

use super::loan::LoanArgs;
use crate::input;

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum MetricArg {
    BasePayment,
    TotalPayment,
    TotalCost,
    TotalInterest,
}

impl From<MetricArg> for LoanMetric {
    fn from(m: MetricArg) -> Self {
        match m {
            MetricArg::BasePayment => LoanMetric::BasePayment,
            MetricArg::TotalPayment => LoanMetric::TotalPayment,
            MetricArg::TotalCost => LoanMetric::TotalCost,
            MetricArg::TotalInterest => LoanMetric::TotalInterest,
        }
    }
}

/// Arguments for loan sensitivity analysis
#[derive(Args)]
pub struct SensitivityArgs {
    /// Path to JSON/YAML file with a full sensitivity input (overrides all flags)
    #[arg(long)]
    pub grid_input: Option<String>,

    /// First variable as name:min:max:step
    /// (e.g. "annual_rate_pct:3:5:0.25")
    #[arg(long)]
    pub var1: Option<String>,

    /// Second variable as name:min:max:step
    /// (e.g. "term_years:15:30:5")
    #[arg(long)]
    pub var2: Option<String>,

    /// Metric tabulated in each cell
    #[arg(long, value_enum, default_value = "total-cost")]
    pub metric: MetricArg,

    // Base case loan
    #[command(flatten)]
    pub loan: LoanArgs,
}

fn parse_sens_var(arg: &str) -> Result<SensitivityVariable, Box<dyn std::error::Error>> {
    let parts: Vec<&str> = arg.split(':').collect();
    if parts.len() != 4 {
        return Err(format!(
            "Sensitivity variable must be name:min:max:step, got '{}'",
            arg
        )
        .into());
    }
    let variable: LoanVariable = serde_json::from_value(Value::String(parts[0].to_string()))
        .map_err(|_| {
            format!(
                "Unknown variable '{}': expected price, down_payment, annual_rate_pct, term_years or insurance_rate_pct",
                parts[0]
            )
        })?;
    Ok(SensitivityVariable {
        variable,
        min: parts[1].parse::<Decimal>()?,
        max: parts[2].parse::<Decimal>()?,
        step: parts[3].parse::<Decimal>()?,
    })
}

pub fn run_sensitivity(args: SensitivityArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let sens_input: LoanSensitivityInput = if let Some(ref path) = args.grid_input {
        input::file::read_input(path)?
    } else {
        let var1 = args.var1.as_deref().ok_or("--var1 is required (or provide --grid-input)")?;
        let var2 = args.var2.as_deref().ok_or("--var2 is required (or provide --grid-input)")?;
        LoanSensitivityInput {
            base: args.loan.configuration()?,
            variable_1: parse_sens_var(var1)?,
            variable_2: parse_sens_var(var2)?,
            metric: args.metric.into(),
        }
    };

    let result = sensitivity::loan_sensitivity(&sens_input)?;
    Ok(serde_json::to_value(result)?)
}
