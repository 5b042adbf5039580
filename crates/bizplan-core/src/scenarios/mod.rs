pub mod scenario;
pub mod sensitivity;

#[cfg(feature = "monte_carlo")]
pub mod monte_carlo;

pub use scenario::{
    compare_presets, evaluate_scenario, evaluate_scenarios, tornado, with_gross_margin_step,
    Driver, Preset, PresetComparison, ScenarioColumn, ScenarioContext, ScenarioDrivers,
    ScenarioMetric, ScenarioMetrics, TornadoBar,
};
pub use sensitivity::{sensitivity_curve, SensitivityCurve, SensitivityInput, SensitivityPoint};

#[cfg(feature = "monte_carlo")]
pub use monte_carlo::{
    run_monte_carlo, DistributionKind, DriverDistribution, McSummary, McTrial, MonteCarloConfig,
    MonteCarloOutput,
};
