pub mod codes;
pub mod plan;
pub mod root_finder;
pub mod snapshot;
pub mod solver;

pub use codes::{LineCode, LineGroup};
pub use plan::{plan_from_models, LineRule, PlanModel, RateBase};
pub use root_finder::{solve_for_target_income, SolverOptions, TargetSolution};
pub use snapshot::ResultSnapshot;
pub use solver::{
    compute_plan, cost_structure, summarize_plan_metrics, AmountOverrides, CostStructure,
    PlanMetrics,
};
