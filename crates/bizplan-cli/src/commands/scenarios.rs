use clap::{Args, ValueEnum};
use rust_decimal::Decimal;
use serde_json::Value;
use std::time::Instant;

use bizplan_core::pl::plan_from_models;
use bizplan_core::scenarios::{
    self, compare_presets, evaluate_scenario, sensitivity_curve, tornado, Driver,
    MonteCarloConfig, ScenarioContext, ScenarioDrivers, ScenarioMetric, SensitivityInput,
};
use bizplan_core::types::with_metadata;

use super::PlanArgs;
use crate::input;

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum MetricArg {
    Sales,
    Gross,
    Ebit,
    Ord,
    Fcf,
    Dscr,
}

impl From<MetricArg> for ScenarioMetric {
    fn from(arg: MetricArg) -> Self {
        match arg {
            MetricArg::Sales => ScenarioMetric::Sales,
            MetricArg::Gross => ScenarioMetric::Gross,
            MetricArg::Ebit => ScenarioMetric::Ebit,
            MetricArg::Ord => ScenarioMetric::Ord,
            MetricArg::Fcf => ScenarioMetric::Fcf,
            MetricArg::Dscr => ScenarioMetric::Dscr,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum DriverArg {
    Customers,
    Price,
    Cost,
    Fixed,
}

impl From<DriverArg> for Driver {
    fn from(arg: DriverArg) -> Self {
        match arg {
            DriverArg::Customers => Driver::Customers,
            DriverArg::Price => Driver::Price,
            DriverArg::Cost => Driver::Cost,
            DriverArg::Fixed => Driver::Fixed,
        }
    }
}

/// Arguments for preset comparison and a custom driver scenario
#[derive(Args)]
#[command(allow_hyphen_values = true)]
pub struct ScenarioArgs {
    #[command(flatten)]
    pub plan: PlanArgs,

    /// Customer count change (e.g. 0.1 for +10%)
    #[arg(long)]
    pub customers: Option<Decimal>,

    /// Unit price change
    #[arg(long)]
    pub price: Option<Decimal>,

    /// Change applied to every COGS line
    #[arg(long)]
    pub cost: Option<Decimal>,

    /// Change applied to every OPEX line
    #[arg(long)]
    pub fixed: Option<Decimal>,
}

/// Arguments for the tornado chart
#[derive(Args)]
pub struct TornadoArgs {
    #[command(flatten)]
    pub plan: PlanArgs,

    /// Symmetric driver move (0.1 evaluates -10% and +10%)
    #[arg(long, default_value = "0.1")]
    pub magnitude: Decimal,

    #[arg(long, value_enum, default_value = "ord")]
    pub metric: MetricArg,
}

/// Arguments for a one-driver sensitivity sweep
#[derive(Args)]
pub struct SensitivityArgs {
    #[command(flatten)]
    pub plan: PlanArgs,

    #[arg(long, value_enum)]
    pub driver: DriverArg,

    /// Half-width of the sweep (0.2 sweeps -20% .. +20%)
    #[arg(long, default_value = "0.2")]
    pub range: Decimal,

    /// Odd number of sweep points
    #[arg(long, default_value_t = 9)]
    pub steps: u32,

    #[arg(long, value_enum, default_value = "ord")]
    pub metric: MetricArg,
}

/// Arguments for a Monte Carlo run
#[derive(Args)]
pub struct MonteCarloArgs {
    #[command(flatten)]
    pub plan: PlanArgs,

    /// JSON or YAML file with driver distributions
    #[arg(long)]
    pub config: Option<String>,

    /// Number of trials (overrides the config)
    #[arg(long)]
    pub trials: Option<u32>,

    /// Base seed (overrides the config)
    #[arg(long)]
    pub seed: Option<u64>,

    #[arg(long, value_enum)]
    pub metric: Option<MetricArg>,
}

pub fn run_scenarios(args: ScenarioArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let start = Instant::now();
    let doc = args.plan.load()?;
    let settings = &doc.settings;
    let plan = plan_from_models(&doc.bundle, settings.fte, settings.unit);
    let comparison = compare_presets(
        &plan,
        settings.target_ordinary_income,
        settings.solver_options(),
    );

    let custom = if args.customers.is_some()
        || args.price.is_some()
        || args.cost.is_some()
        || args.fixed.is_some()
    {
        let drivers = ScenarioDrivers {
            customers_change: args.customers.unwrap_or_default(),
            price_change: args.price.unwrap_or_default(),
            cost_change: args.cost.unwrap_or_default(),
            fixed_change: args.fixed.unwrap_or_default(),
        };
        let ctx = ScenarioContext::new(&plan, &doc.bundle);
        Some(serde_json::json!({
            "drivers": drivers,
            "metrics": evaluate_scenario(&ctx, &drivers),
        }))
    } else {
        None
    };

    let result = with_metadata(
        "Preset sales scenarios with a target-income column from bisection",
        &serde_json::json!({
            "target_ordinary_income": settings.target_ordinary_income.to_string(),
        }),
        comparison.warnings,
        start.elapsed().as_micros() as u64,
        serde_json::json!({
            "columns": comparison.columns,
            "custom": custom,
        }),
    );
    Ok(serde_json::to_value(result)?)
}

pub fn run_tornado(args: TornadoArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let start = Instant::now();
    let doc = args.plan.load()?;
    let plan = plan_from_models(&doc.bundle, doc.settings.fte, doc.settings.unit);
    let ctx = ScenarioContext::new(&plan, &doc.bundle);
    let metric: ScenarioMetric = args.metric.into();
    let bars = tornado(&ctx, args.magnitude, metric);

    let result = with_metadata(
        "One-at-a-time driver moves ranked by absolute impact",
        &serde_json::json!({ "magnitude": args.magnitude.to_string(), "metric": metric }),
        Vec::new(),
        start.elapsed().as_micros() as u64,
        serde_json::json!({ "bars": bars }),
    );
    Ok(serde_json::to_value(result)?)
}

pub fn run_sensitivity(args: SensitivityArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let doc = args.plan.load()?;
    let plan = plan_from_models(&doc.bundle, doc.settings.fte, doc.settings.unit);
    let ctx = ScenarioContext::new(&plan, &doc.bundle);
    let sens_input = SensitivityInput {
        driver: args.driver.into(),
        range: args.range,
        steps: args.steps,
        metric: args.metric.into(),
    };
    let curve = sensitivity_curve(&ctx, &sens_input)?;
    Ok(serde_json::to_value(curve)?)
}

pub fn run_monte_carlo(args: MonteCarloArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let doc = args.plan.load()?;
    let mut config: MonteCarloConfig = match args.config {
        Some(ref path) => input::file::read_document(path)?,
        None => serde_json::from_value(serde_json::json!({}))?,
    };
    if let Some(trials) = args.trials {
        config.trials = trials;
    }
    if let Some(seed) = args.seed {
        config.seed = seed;
    }
    if let Some(metric) = args.metric {
        config.metric = metric.into();
    }

    let plan = plan_from_models(&doc.bundle, doc.settings.fte, doc.settings.unit);
    let ctx = ScenarioContext::new(&plan, &doc.bundle);
    let result = scenarios::run_monte_carlo(&ctx, &config)?;
    Ok(serde_json::to_value(result)?)
}
