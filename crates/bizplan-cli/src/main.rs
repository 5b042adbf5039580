mod commands;
mod input;
mod logging;
mod output;

use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use std::process;

use commands::plan::{PlArgs, TargetArgs};
use commands::scenarios::{MonteCarloArgs, ScenarioArgs, SensitivityArgs, TornadoArgs};
use commands::statements::StatementArgs;
use commands::store::PlanStoreArgs;
use commands::PlanArgs;

/// Small-business annual plan calculations
#[derive(Parser)]
#[command(
    name = "bizplan",
    version,
    about = "Small-business annual plan calculations",
    long_about = "Computes a small business's annual plan with decimal precision: \
                  P&L with break-even, target-income sales, monthly cash flow with NPV \
                  and payback, a balance-sheet estimate, scenarios and Monte Carlo. \
                  Set BIZPLAN_LOG (e.g. debug) for diagnostics on stderr."
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output format
    #[arg(long, default_value = "json", global = true)]
    output: OutputFormat,
}

#[derive(Subcommand)]
enum Commands {
    /// Compute the P&L snapshot
    Pl(PlArgs),
    /// Find the sales level that reaches the target ordinary income
    Target(TargetArgs),
    /// Monthly cash-flow projection with NPV and payback
    CashFlow(StatementArgs),
    /// Single-period balance-sheet estimate
    BalanceSheet(StatementArgs),
    /// Capex, loan and debt-service schedules
    Schedules(StatementArgs),
    /// Every statement for a plan document
    Report(PlanArgs),
    /// Validate a plan document
    Validate(PlanArgs),
    /// Compare preset scenarios, optionally with custom drivers
    Scenarios(ScenarioArgs),
    /// Rank drivers by their impact on a metric
    Tornado(TornadoArgs),
    /// Sweep one driver across a range
    Sensitivity(SensitivityArgs),
    /// Seeded Monte Carlo over driver distributions
    MonteCarlo(MonteCarloArgs),
    /// Save, load and list versioned plans
    Plan(PlanStoreArgs),
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

fn main() {
    let cli = Cli::parse();
    logging::init();

    let result: Result<serde_json::Value, Box<dyn std::error::Error>> = match cli.command {
        Commands::Pl(args) => commands::plan::run_pl(args),
        Commands::Target(args) => commands::plan::run_target(args),
        Commands::CashFlow(args) => commands::statements::run_cash_flow(args),
        Commands::BalanceSheet(args) => commands::statements::run_balance_sheet(args),
        Commands::Schedules(args) => commands::statements::run_schedules(args),
        Commands::Report(args) => commands::plan::run_report(args),
        Commands::Validate(args) => commands::plan::run_validate(args),
        Commands::Scenarios(args) => commands::scenarios::run_scenarios(args),
        Commands::Tornado(args) => commands::scenarios::run_tornado(args),
        Commands::Sensitivity(args) => commands::scenarios::run_sensitivity(args),
        Commands::MonteCarlo(args) => commands::scenarios::run_monte_carlo(args),
        Commands::Plan(args) => commands::store::run_plan_store(args),
        Commands::Version => {
            println!("bizplan {}", env!("CARGO_PKG_VERSION"));
            return;
        }
    };

    match result {
        Ok(value) => {
            output::format_output(&cli.output, &value);
            process::exit(0);
        }
        Err(e) => {
            eprintln!("{}: {}", "error".red().bold(), e);
            process::exit(1);
        }
    }
}
