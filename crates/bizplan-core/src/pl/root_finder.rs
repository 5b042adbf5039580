use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::pl::plan::PlanModel;
use crate::pl::snapshot::ResultSnapshot;
use crate::pl::solver::compute_plan;
use crate::types::Money;

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

pub const DEFAULT_MAX_ITERATIONS: u32 = 60;
pub const DEFAULT_TOLERANCE: Decimal = dec!(1000);

const EXPANSION_FACTOR: Decimal = dec!(1.6);
const EXPANSION_SEED: Decimal = dec!(1000000);
const EXPANSION_CEILING: Decimal = dec!(10000000000000);
const MAX_EXPANSIONS: u32 = 40;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SolverOptions {
    pub max_iterations: u32,
    /// Absolute tolerance on ordinary income
    pub tolerance: Money,
}

impl Default for SolverOptions {
    fn default() -> Self {
        Self {
            max_iterations: DEFAULT_MAX_ITERATIONS,
            tolerance: DEFAULT_TOLERANCE,
        }
    }
}

/// Sales level found for a target ordinary income, with its snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TargetSolution {
    pub sales: Money,
    pub snapshot: ResultSnapshot,
    pub iterations: u32,
    /// False when the iteration cap was hit; the result is then best-effort.
    pub converged: bool,
}

// ---------------------------------------------------------------------------
// Bisection
// ---------------------------------------------------------------------------

/// Finds sales such that ordinary income is within tolerance of `target`.
///
/// Ordinary income must be non-decreasing in sales over the searched range
/// (aggregate variable cost ratio below 1). This is not checked.
pub fn solve_for_target_income(
    plan: &PlanModel,
    target: Money,
    low: Money,
    high: Money,
    options: SolverOptions,
) -> TargetSolution {
    let ord_at = |sales: Decimal| compute_plan(plan, Some(sales), None).ordinary_income();
    let side = |value: Decimal| value - target;

    let mut lo = low.max(Decimal::ZERO);
    let mut hi = (low * dec!(1.5)).max(high);
    let mut f_lo = ord_at(lo);
    let mut f_hi = ord_at(hi);

    let mut expansions = 0;
    while same_side(side(f_lo), side(f_hi)) && hi < EXPANSION_CEILING && expansions < MAX_EXPANSIONS
    {
        hi = if hi > Decimal::ZERO {
            hi * EXPANSION_FACTOR
        } else {
            EXPANSION_SEED
        };
        f_hi = ord_at(hi);
        expansions += 1;
    }
    tracing::debug!(low = %lo, high = %hi, expansions, "target bracket established");

    for i in 0..options.max_iterations {
        let mid = (lo + hi) / dec!(2);
        let f_mid = ord_at(mid);
        if (f_mid - target).abs() <= options.tolerance {
            return TargetSolution {
                sales: mid,
                snapshot: compute_plan(plan, Some(mid), None),
                iterations: i + 1,
                converged: true,
            };
        }
        if !same_side(side(f_lo), side(f_mid)) {
            hi = mid;
            f_hi = f_mid;
        } else {
            lo = mid;
            f_lo = f_mid;
        }
    }

    let mid = (lo + hi) / dec!(2);
    tracing::warn!(
        target = %target,
        sales = %mid,
        last_high = %f_hi,
        "target income not reached within iteration cap, returning best effort"
    );
    TargetSolution {
        sales: mid,
        snapshot: compute_plan(plan, Some(mid), None),
        iterations: options.max_iterations,
        converged: false,
    }
}

/// Strictly on the same side of the target (a zero sign brackets).
fn same_side(a: Decimal, b: Decimal) -> bool {
    (a > Decimal::ZERO && b > Decimal::ZERO) || (a < Decimal::ZERO && b < Decimal::ZERO)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pl::codes::LineCode;
    use crate::pl::plan::RateBase;
    use crate::types::Unit;

    fn plan() -> PlanModel {
        let mut plan = PlanModel::new(dec!(1000000), dec!(10), Unit::Base);
        plan.set_rate(LineCode::CogsMat, dec!(0.30), RateBase::Sales);
        plan.set_amount(LineCode::OpexH, dec!(200000));
        plan
    }

    #[test]
    fn test_converges_within_tolerance() {
        let target = dec!(5000000);
        let sol = solve_for_target_income(
            &plan(),
            target,
            Decimal::ZERO,
            dec!(1000000),
            SolverOptions::default(),
        );
        assert!(sol.converged);
        assert!((sol.snapshot.ordinary_income() - target).abs() <= DEFAULT_TOLERANCE);
        // exact answer is (5,000,000 + 200,000) / 0.7
        assert!((sol.sales - dec!(7428571.43)).abs() < dec!(2000));
    }

    #[test]
    fn test_bracket_expands_from_zero_high() {
        let sol = solve_for_target_income(
            &plan(),
            dec!(100000),
            Decimal::ZERO,
            Decimal::ZERO,
            SolverOptions::default(),
        );
        assert!(sol.converged);
        assert!((sol.snapshot.ordinary_income() - dec!(100000)).abs() <= DEFAULT_TOLERANCE);
    }

    #[test]
    fn test_unreachable_target_returns_best_effort() {
        let options = SolverOptions {
            max_iterations: 5,
            tolerance: dec!(0.000001),
        };
        let sol = solve_for_target_income(&plan(), dec!(123456.789), dec!(0), dec!(10), options);
        assert!(!sol.converged);
        assert_eq!(sol.iterations, 5);
        assert_eq!(sol.snapshot.sales(), sol.sales);
    }
}
