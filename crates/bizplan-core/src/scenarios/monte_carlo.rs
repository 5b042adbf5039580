use rand::rngs::StdRng;
use rand::Rng;
use rand::SeedableRng;
use rust_decimal::prelude::{FromPrimitive, ToPrimitive};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use statrs::distribution::{Normal, Triangular, Uniform};
use std::time::Instant;

use crate::batch::evaluate_batch;
use crate::error::PlanError;
use crate::scenarios::scenario::{
    evaluate_scenario, ScenarioContext, ScenarioDrivers, ScenarioMetric, ScenarioMetrics,
};
use crate::types::{with_metadata, ComputationOutput};
use crate::PlanResult;

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

const MAX_TRIALS: u32 = 1000;
const DRAW_LIMIT: f64 = 0.5;
const SEED_STRIDE: u64 = 0x9E37_79B9_7F4A_7C15;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DistributionKind {
    #[default]
    Normal,
    Triangular,
    Uniform,
}

/// Distribution of one driver's fractional change.
///
/// Triangular and uniform shapes are centred on `mean` with a spread
/// chosen to match `std` (`std * sqrt(6)` and `std * sqrt(3)`).
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct DriverDistribution {
    #[serde(default)]
    pub kind: DistributionKind,
    #[serde(default)]
    pub mean: f64,
    #[serde(default)]
    pub std: f64,
}

/// Top-level input for a plan Monte Carlo run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonteCarloConfig {
    /// Number of trials (1-1000)
    #[serde(default = "default_trials")]
    pub trials: u32,
    /// Base seed; each trial derives its own stream from it.
    #[serde(default)]
    pub seed: u64,
    #[serde(default)]
    pub customers: DriverDistribution,
    #[serde(default)]
    pub price: DriverDistribution,
    #[serde(default)]
    pub cost: DriverDistribution,
    #[serde(default)]
    pub fixed: DriverDistribution,
    /// Metric summarised across trials
    #[serde(default)]
    pub metric: ScenarioMetric,
}

fn default_trials() -> u32 {
    500
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct McTrial {
    pub trial: u32,
    pub drivers: ScenarioDrivers,
    pub metrics: ScenarioMetrics,
}

/// Percentile summary.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct McPercentiles {
    pub p5: f64,
    pub p10: f64,
    pub p25: f64,
    pub p50: f64,
    pub p75: f64,
    pub p90: f64,
    pub p95: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct McSummary {
    pub metric: ScenarioMetric,
    /// Trials with a finite metric value
    pub count: usize,
    pub mean: f64,
    pub std_dev: f64,
    pub min: f64,
    pub max: f64,
    pub percentiles: McPercentiles,
    pub probability_negative: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonteCarloOutput {
    pub trials: Vec<McTrial>,
    pub summary: Option<McSummary>,
}

// ---------------------------------------------------------------------------
// Sampling
// ---------------------------------------------------------------------------

fn sample(rng: &mut StdRng, field: &str, dist: &DriverDistribution) -> PlanResult<f64> {
    if !dist.mean.is_finite() || !dist.std.is_finite() {
        return Err(PlanError::InvalidInput {
            field: field.into(),
            reason: "Distribution parameters must be finite".into(),
        });
    }
    if dist.std <= 0.0 {
        return Ok(dist.mean.clamp(-DRAW_LIMIT, DRAW_LIMIT));
    }
    let draw = match dist.kind {
        DistributionKind::Normal => {
            let n = Normal::new(dist.mean, dist.std).map_err(|e| invalid_distribution(field, e))?;
            rng.sample(n)
        }
        DistributionKind::Triangular => {
            let spread = dist.std * 6f64.sqrt();
            let t = Triangular::new(dist.mean - spread, dist.mean + spread, dist.mean)
                .map_err(|e| invalid_distribution(field, e))?;
            rng.sample(t)
        }
        DistributionKind::Uniform => {
            let spread = dist.std * 3f64.sqrt();
            let u = Uniform::new(dist.mean - spread, dist.mean + spread)
                .map_err(|e| invalid_distribution(field, e))?;
            rng.sample(u)
        }
    };
    Ok(draw.clamp(-DRAW_LIMIT, DRAW_LIMIT))
}

fn invalid_distribution(field: &str, e: impl std::fmt::Display) -> PlanError {
    PlanError::InvalidInput {
        field: field.into(),
        reason: format!("Invalid distribution parameters: {e}"),
    }
}

fn to_decimal(value: f64) -> Decimal {
    Decimal::from_f64(value)
        .map(|d| d.round_dp(6))
        .unwrap_or(Decimal::ZERO)
}

/// Independent, reproducible stream per trial.
fn trial_seed(seed: u64, trial: u32) -> u64 {
    seed.wrapping_add((u64::from(trial) + 1).wrapping_mul(SEED_STRIDE))
}

fn draw_drivers(config: &MonteCarloConfig, trial: u32) -> PlanResult<ScenarioDrivers> {
    let mut rng = StdRng::seed_from_u64(trial_seed(config.seed, trial));
    Ok(ScenarioDrivers {
        customers_change: to_decimal(sample(&mut rng, "customers", &config.customers)?),
        price_change: to_decimal(sample(&mut rng, "price", &config.price)?),
        cost_change: to_decimal(sample(&mut rng, "cost", &config.cost)?),
        fixed_change: to_decimal(sample(&mut rng, "fixed", &config.fixed)?),
    })
}

// ---------------------------------------------------------------------------
// Statistics helpers
// ---------------------------------------------------------------------------

/// Compute the percentile value from a **sorted** slice using linear interpolation.
fn percentile_sorted(sorted: &[f64], p: f64) -> f64 {
    if sorted.is_empty() {
        return 0.0;
    }
    if sorted.len() == 1 {
        return sorted[0];
    }
    let rank = p / 100.0 * (sorted.len() - 1) as f64;
    let lower = rank.floor() as usize;
    let upper = rank.ceil() as usize;
    if lower == upper {
        sorted[lower]
    } else {
        let frac = rank - lower as f64;
        sorted[lower] * (1.0 - frac) + sorted[upper] * frac
    }
}

fn compute_statistics(values: &mut [f64], metric: ScenarioMetric) -> Option<McSummary> {
    if values.is_empty() {
        return None;
    }
    values.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
    let negative = values.iter().filter(|v| **v < 0.0).count() as f64;

    Some(McSummary {
        metric,
        count: values.len(),
        mean,
        std_dev: variance.sqrt(),
        min: values[0],
        max: values[values.len() - 1],
        percentiles: McPercentiles {
            p5: percentile_sorted(values, 5.0),
            p10: percentile_sorted(values, 10.0),
            p25: percentile_sorted(values, 25.0),
            p50: percentile_sorted(values, 50.0),
            p75: percentile_sorted(values, 75.0),
            p90: percentile_sorted(values, 90.0),
            p95: percentile_sorted(values, 95.0),
        },
        probability_negative: negative / n,
    })
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Samples driver changes per trial and evaluates every trial through the
/// batch entry point. The same config always reproduces the same trials.
pub fn run_monte_carlo(
    ctx: &ScenarioContext<'_>,
    config: &MonteCarloConfig,
) -> PlanResult<ComputationOutput<MonteCarloOutput>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    if config.trials == 0 || config.trials > MAX_TRIALS {
        return Err(PlanError::InvalidInput {
            field: "trials".into(),
            reason: format!("Must be between 1 and {MAX_TRIALS}"),
        });
    }

    let indices: Vec<u32> = (0..config.trials).collect();
    let drivers = indices
        .iter()
        .map(|i| draw_drivers(config, *i))
        .collect::<PlanResult<Vec<_>>>()?;
    let metrics = evaluate_batch(&drivers, |d| evaluate_scenario(ctx, d));

    let trials: Vec<McTrial> = indices
        .into_iter()
        .zip(drivers)
        .zip(metrics)
        .map(|((trial, drivers), metrics)| McTrial {
            trial,
            drivers,
            metrics,
        })
        .collect();

    let mut values: Vec<f64> = trials
        .iter()
        .filter_map(|t| config.metric.value(&t.metrics).finite())
        .filter_map(|v| v.to_f64())
        .collect();
    let undefined = trials.len() - values.len();
    if undefined > 0 {
        warnings.push(format!(
            "{undefined} of {} trials have an undefined {:?} and are excluded from statistics",
            trials.len(),
            config.metric
        ));
    }
    let summary = compute_statistics(&mut values, config.metric);
    tracing::debug!(trials = trials.len(), undefined, "monte carlo run finished");

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Plan Monte Carlo over sales and cost drivers",
        &serde_json::json!({
            "trials": config.trials,
            "seed": config.seed,
            "metric": config.metric,
            "draw_limit": DRAW_LIMIT,
        }),
        warnings,
        elapsed,
        MonteCarloOutput { trials, summary },
    ))
}
