use bizplan_core::pl::{
    compute_plan, plan_from_models, solve_for_target_income, AmountOverrides, LineCode, PlanModel,
    RateBase, SolverOptions,
};
use bizplan_core::types::{Amount, Unit};
use bizplan_core::FinanceBundle;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

fn reference_plan() -> PlanModel {
    let mut plan = PlanModel::new(dec!(1000000), dec!(10), Unit::Base);
    plan.set_rate(LineCode::CogsMat, dec!(0.30), RateBase::Sales);
    plan.set_amount(LineCode::OpexH, dec!(200000));
    plan
}

// ===========================================================================
// Snapshot
// ===========================================================================

#[test]
fn test_reference_plan_snapshot() {
    let snap = compute_plan(&reference_plan(), None, None);
    assert_eq!(snap.value(LineCode::CogsTtl), dec!(300000));
    assert_eq!(snap.gross(), dec!(700000));
    assert_eq!(snap.operating_profit(), dec!(500000));
    assert_eq!(snap.ordinary_income(), dec!(500000));
    assert_eq!(snap.value(LineCode::PcSales), dec!(100000));
    assert_eq!(
        snap.break_even_sales().round_dp(2),
        Amount::Finite(dec!(285714.29))
    );
}

#[test]
fn test_gross_linked_loop_settles() {
    let mut plan = PlanModel::new(dec!(1000000), dec!(1), Unit::Base);
    plan.set_rate(LineCode::CogsOutCon, dec!(0.01), RateBase::Gross);
    let snap = compute_plan(&plan, None, None);
    // gross = sales - 0.01 * gross
    let exact = dec!(1000000) / dec!(1.01);
    assert!(
        (snap.gross() - exact).abs() < dec!(0.001),
        "gross {} should settle at {}",
        snap.gross(),
        exact
    );
}

#[test]
fn test_degenerate_lines_are_sentinels() {
    let mut plan = PlanModel::new(dec!(1000), dec!(0), Unit::Base);
    plan.set_rate(LineCode::CogsMat, dec!(1), RateBase::Sales);
    plan.set_amount(LineCode::OpexH, dec!(50));
    let snap = compute_plan(&plan, None, None);
    assert_eq!(snap.break_even_sales(), Amount::Infinite);
    assert_eq!(snap.get(LineCode::Ldr), Amount::NotANumber);
    // headcount is floored rather than dividing by zero
    assert!(snap.get(LineCode::PcSales).finite().is_some());
}

#[test]
fn test_contribution_ratio_just_above_zero() {
    let mut plan = PlanModel::new(dec!(1000000), dec!(10), Unit::Base);
    plan.set_rate(LineCode::CogsMat, dec!(0.5), RateBase::Sales);
    plan.set_rate(LineCode::CogsLbr, dec!(0.4999999999999999999999999999), RateBase::Sales);
    plan.set_amount(LineCode::OpexH, dec!(1000000));
    let snap = compute_plan(&plan, None, None);
    assert_eq!(snap.break_even_sales(), Amount::Infinite);
    assert!(snap.ordinary_income() < Decimal::ZERO);
    assert_ne!(snap.get(LineCode::Ldr), Amount::NotANumber);
}

#[test]
fn test_gross_linked_ratios_summing_near_one() {
    let sales = dec!(1000000);
    let mut plan = PlanModel::new(sales, dec!(10), Unit::Base);
    plan.set_rate(LineCode::CogsOutCon, dec!(0.5), RateBase::Gross);
    plan.set_rate(LineCode::CogsOth, dec!(0.4999999999999999999999999999), RateBase::Gross);
    plan.set_amount(LineCode::OpexH, dec!(200000));
    let snap = compute_plan(&plan, None, None);
    assert_eq!(snap.sales(), sales);
    assert!(snap.gross() <= sales);
    assert!(snap.value(LineCode::CogsTtl) >= Decimal::ZERO);
    assert_eq!(
        snap.ordinary_income(),
        snap.gross() - snap.value(LineCode::OpexTtl)
    );
    assert_ne!(snap.break_even_sales(), Amount::NotANumber);
}

#[test]
fn test_amount_override_wins_over_rule() {
    let plan = reference_plan();
    let mut overrides = AmountOverrides::new();
    overrides.insert(LineCode::CogsMat, dec!(100000));
    let snap = compute_plan(&plan, Some(dec!(500000)), Some(&overrides));
    assert_eq!(snap.sales(), dec!(500000));
    assert_eq!(snap.gross(), dec!(400000));
    assert_eq!(snap.ordinary_income(), dec!(200000));
}

#[test]
fn test_cloned_plan_is_independent() {
    let base = reference_plan();
    let mut copy = base.clone();
    copy.set_amount(LineCode::OpexH, dec!(0));
    assert_eq!(compute_plan(&base, None, None).ordinary_income(), dec!(500000));
    assert_eq!(compute_plan(&copy, None, None).ordinary_income(), dec!(700000));
}

#[test]
fn test_ordinary_income_non_decreasing_in_sales() {
    let mut plan = reference_plan();
    plan.set_rate(LineCode::OpexAd, dec!(0.05), RateBase::Gross);
    let mut previous: Option<Decimal> = None;
    let mut sales = Decimal::ZERO;
    while sales <= dec!(10000000000000) {
        let ord = compute_plan(&plan, Some(sales), None).ordinary_income();
        if let Some(prev) = previous {
            assert!(ord >= prev, "ORD fell from {prev} to {ord} at sales {sales}");
        }
        previous = Some(ord);
        sales = if sales.is_zero() { dec!(1) } else { sales * dec!(10) };
    }
}

// ===========================================================================
// Root finder
// ===========================================================================

#[test]
fn test_target_reached_after_bracket_expansion() {
    let plan = reference_plan();
    let target = dec!(5000000);
    let solution = solve_for_target_income(
        &plan,
        target,
        Decimal::ZERO,
        dec!(1000000),
        SolverOptions::default(),
    );
    assert!(solution.converged);
    let ord = compute_plan(&plan, Some(solution.sales), None).ordinary_income();
    assert!((ord - target).abs() <= dec!(1000));
    assert_eq!(solution.snapshot.ordinary_income(), ord);
}

#[test]
fn test_unreachable_target_returns_best_effort() {
    let plan = reference_plan();
    let solution = solve_for_target_income(
        &plan,
        dec!(500001),
        Decimal::ZERO,
        dec!(2000000),
        SolverOptions {
            max_iterations: 2,
            tolerance: dec!(0.01),
        },
    );
    assert!(!solution.converged);
    assert_eq!(solution.iterations, 2);
    assert!(solution.sales > Decimal::ZERO);
}

// ===========================================================================
// Plan assembly
// ===========================================================================

#[test]
fn test_plan_from_empty_bundle_is_all_zero() {
    let plan = plan_from_models(&FinanceBundle::default(), dec!(20), Unit::Millions);
    let snap = compute_plan(&plan, None, None);
    assert_eq!(snap.sales(), Decimal::ZERO);
    assert_eq!(snap.ordinary_income(), Decimal::ZERO);
    assert_eq!(snap.break_even_sales(), Amount::ZERO);
}
