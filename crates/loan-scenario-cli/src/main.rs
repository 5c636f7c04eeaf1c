mod commands;
mod input;
mod output;

use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use std::process;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use commands::comparison::{CompareArgs, ScenariosArgs};
use commands::guidance::GuidanceArgs;
use commands::loan::{EvaluateArgs, ScheduleArgs};
use commands::sensitivity::SensitivityArgs;

/// Amortising loan scenario calculator
#[derive(Parser)]
#[command(
    name = "loansim",
    version,
    about = "Amortising loan scenario calculator",
    long_about = "Evaluate, amortise and compare mortgage scenarios with decimal precision. \
                  Supports payment breakdowns, monthly schedules, scenario comparison, \
                  the reference / extra down payment / alternative terms strategy set, \
                  rate and term sensitivity grids, and budget guidance."
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output format
    #[arg(long, default_value = "json", global = true)]
    output: OutputFormat,

    /// Log evaluation details to stderr (RUST_LOG overrides)
    #[arg(long, short, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Evaluate a loan: payment, insurance, total cost and interest
    Evaluate(EvaluateArgs),
    /// Month-by-month amortisation schedule
    Schedule(ScheduleArgs),
    /// Compare alternative loans against a reference loan
    Compare(CompareArgs),
    /// Reference vs extra down payment vs alternative rate/term
    Scenarios(ScenariosArgs),
    /// Two-way sensitivity grid over loan parameters
    Sensitivity(SensitivityArgs),
    /// Budget tier, suggested down payment and required income
    Guidance(GuidanceArgs),
    /// Print version information
    Version,
}

#[derive(Debug, Clone, ValueEnum)]
pub enum OutputFormat {
    Json,
    Table,
    Csv,
    Minimal,
}

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let result: Result<serde_json::Value, Box<dyn std::error::Error>> = match cli.command {
        Commands::Evaluate(args) => commands::loan::run_evaluate(args),
        Commands::Schedule(args) => commands::loan::run_schedule(args),
        Commands::Compare(args) => commands::comparison::run_compare(args),
        Commands::Scenarios(args) => commands::comparison::run_scenarios(args),
        Commands::Sensitivity(args) => commands::sensitivity::run_sensitivity(args),
        Commands::Guidance(args) => commands::guidance::run_guidance(args),
        Commands::Version => {
            println!("loansim {}", env!("CARGO_PKG_VERSION"));
            return;
        }
    };

    match result {
        Ok(value) => {
            output::format_output(&cli.output, &value);
            process::exit(0);
        }
        Err(e) => {
            tracing::debug!(error = %e, "command failed");
            eprintln!("{}: {}", "error".red().bold(), e);
            process::exit(1);
        }
    }
}
