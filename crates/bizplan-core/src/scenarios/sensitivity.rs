use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::error::PlanError;
use crate::scenarios::scenario::{evaluate_scenarios, Driver, ScenarioContext, ScenarioMetric};
use crate::types::{with_metadata, Amount, ComputationOutput, Rate};
use crate::PlanResult;

/// Input for a one-driver sensitivity sweep
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SensitivityInput {
    pub driver: Driver,
    /// Half-width of the sweep as a fraction (0.2 sweeps -20% .. +20%)
    pub range: Rate,
    /// Number of evenly spaced points, odd so the baseline is included
    #[serde(default = "default_steps")]
    pub steps: u32,
    #[serde(default)]
    pub metric: ScenarioMetric,
}

const MAX_STEPS: u32 = 1001;

fn default_steps() -> u32 {
    9
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SensitivityPoint {
    pub change: Rate,
    pub value: Amount,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SensitivityCurve {
    pub driver: Driver,
    pub metric: ScenarioMetric,
    pub points: Vec<SensitivityPoint>,
    /// Index of the zero-change point
    pub base_index: usize,
}

/// Evenly spaced values from `-range` to `+range`.
fn generate_sweep_values(range: Rate, steps: u32) -> PlanResult<Vec<Decimal>> {
    if range <= Decimal::ZERO {
        return Err(PlanError::InvalidInput {
            field: "range".into(),
            reason: "Range must be positive".into(),
        });
    }
    if steps < 3 || steps > MAX_STEPS || steps % 2 == 0 {
        return Err(PlanError::InvalidInput {
            field: "steps".into(),
            reason: format!("Steps must be an odd number between 3 and {MAX_STEPS}"),
        });
    }
    let step = range * dec!(2) / Decimal::from(steps - 1);
    let half = (steps / 2) as i64;
    Ok((-half..=half)
        .map(|i| step * Decimal::from(i))
        .collect())
}

/// Find the closest index to a target value in a sorted list.
fn closest_index(values: &[Decimal], target: Decimal) -> usize {
    values
        .iter()
        .enumerate()
        .min_by_key(|(_, v)| (**v - target).abs())
        .map(|(i, _)| i)
        .unwrap_or(0)
}

/// Sweeps one driver across its range and records the chosen metric.
pub fn sensitivity_curve(
    ctx: &ScenarioContext<'_>,
    input: &SensitivityInput,
) -> PlanResult<ComputationOutput<SensitivityCurve>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    let changes = generate_sweep_values(input.range, input.steps)?;
    let drivers: Vec<_> = changes.iter().map(|c| input.driver.drivers(*c)).collect();
    let results = evaluate_scenarios(ctx, &drivers);

    let points: Vec<SensitivityPoint> = changes
        .iter()
        .zip(results.iter())
        .map(|(change, m)| SensitivityPoint {
            change: *change,
            value: input.metric.value(m),
        })
        .collect();
    let undefined = points.iter().filter(|p| p.value.is_sentinel()).count();
    if undefined > 0 {
        warnings.push(format!("{undefined} sweep points have an undefined metric"));
    }

    let curve = SensitivityCurve {
        driver: input.driver,
        metric: input.metric,
        base_index: closest_index(&changes, Decimal::ZERO),
        points,
    };

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "One-driver sensitivity sweep",
        &serde_json::json!({
            "driver": input.driver,
            "range": input.range.to_string(),
            "steps": input.steps,
            "metric": input.metric,
        }),
        warnings,
        elapsed,
        curve,
    ))
}
