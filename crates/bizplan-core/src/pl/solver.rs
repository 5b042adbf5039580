use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::pl::codes::{LineCode, ALL_CODES, COGS_CODES, NOE_CODES, NOI_CODES, OPEX_CODES};
use crate::pl::plan::{LineRule, PlanModel, RateBase};
use crate::pl::snapshot::ResultSnapshot;
use crate::types::{Amount, Money, Rate};

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Fixed-point passes over the gross-profit / gross-linked-cost loop.
/// A fixed design constant, not a derived convergence bound.
pub const CIRCULAR_ITERATIONS: usize = 5;
pub const CONVERGENCE_THRESHOLD: Decimal = dec!(0.0001);

/// Per-line amounts that replace whatever the plan's rule would produce.
pub type AmountOverrides = BTreeMap<LineCode, Money>;

// ---------------------------------------------------------------------------
// Solver
// ---------------------------------------------------------------------------

/// Computes the full P&L snapshot for `plan`.
///
/// `sales_override` replaces the plan's base sales; `overrides` forces
/// individual line amounts. Degenerate ratios come back as sentinels.
pub fn compute_plan(
    plan: &PlanModel,
    sales_override: Option<Money>,
    overrides: Option<&AmountOverrides>,
) -> ResultSnapshot {
    let sales = sales_override.unwrap_or(plan.base_sales);
    let line = |code: LineCode, gross: Decimal| -> Decimal {
        line_amount(plan, code, gross, sales, overrides).max(Decimal::ZERO)
    };

    // Gross-linked COGS lines depend on gross profit, which depends on COGS.
    let mut gross_guess = sales;
    let mut passes = 0;
    for _ in 0..CIRCULAR_ITERATIONS {
        passes += 1;
        let cogs: Decimal = COGS_CODES.iter().map(|c| line(*c, gross_guess)).sum();
        let new_gross = sales - cogs;
        let converged = (new_gross - gross_guess).abs() < CONVERGENCE_THRESHOLD;
        gross_guess = new_gross;
        if converged {
            break;
        }
    }
    tracing::trace!(passes, gross = %gross_guess, "gross profit loop finished");

    let mut amounts: BTreeMap<LineCode, Amount> = BTreeMap::new();
    let mut put = |code: LineCode, value: Decimal| {
        amounts.insert(code, Amount::Finite(value));
    };
    put(LineCode::Rev, sales);

    let mut cogs_total = Decimal::ZERO;
    for code in COGS_CODES {
        let v = line(code, gross_guess);
        put(code, v);
        cogs_total += v;
    }
    let gross = sales - cogs_total;
    put(LineCode::CogsTtl, cogs_total);
    put(LineCode::Gross, gross);

    let mut opex_total = Decimal::ZERO;
    let mut people = Decimal::ZERO;
    for code in OPEX_CODES {
        let v = line(code, gross);
        if code == LineCode::OpexH {
            people = v;
        }
        put(code, v);
        opex_total += v;
    }
    let op = gross - opex_total;
    put(LineCode::OpexTtl, opex_total);
    put(LineCode::Op, op);

    let mut noi = Decimal::ZERO;
    for code in NOI_CODES {
        let v = line(code, gross);
        put(code, v);
        noi += v;
    }
    let mut noe = Decimal::ZERO;
    for code in NOE_CODES {
        let v = line(code, gross);
        put(code, v);
        noe += v;
    }
    let ord = op + noi - noe;
    put(LineCode::Ord, ord);

    let structure = classify_costs(plan, sales, gross);
    let fte = plan.fte();
    amounts.insert(LineCode::PcSales, Amount::ratio(sales, fte));
    amounts.insert(LineCode::PcGross, Amount::ratio(gross, fte));
    amounts.insert(LineCode::PcOrd, Amount::ratio(ord, fte));

    amounts.insert(LineCode::BeSales, structure.break_even());
    let ldr = if gross > Decimal::ZERO {
        Amount::ratio(people, gross)
    } else {
        Amount::NotANumber
    };
    amounts.insert(LineCode::Ldr, ldr);

    ResultSnapshot::from_amounts(amounts)
}

fn line_amount(
    plan: &PlanModel,
    code: LineCode,
    gross: Decimal,
    sales: Decimal,
    overrides: Option<&AmountOverrides>,
) -> Decimal {
    if let Some(v) = overrides.and_then(|o| o.get(&code)) {
        return *v;
    }
    match plan.rule(code) {
        None => Decimal::ZERO,
        Some(LineRule::Amount { value }) => *value,
        Some(LineRule::Rate { value, base }) => match base {
            RateBase::Sales => sales * value,
            RateBase::Gross => gross.max(Decimal::ZERO) * value,
            RateBase::Fixed => *value,
        },
    }
}

// ---------------------------------------------------------------------------
// Cost-volume-profit structure
// ---------------------------------------------------------------------------

/// Variable / fixed split used for break-even analysis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CostStructure {
    /// Aggregate variable cost as a share of sales
    pub variable_rate: Rate,
    pub fixed_cost: Money,
    pub contribution_ratio: Rate,
}

impl CostStructure {
    /// Fixed cost over contribution ratio; infinite when the ratio is not
    /// positive or so small the quotient overflows.
    pub fn break_even(&self) -> Amount {
        if self.contribution_ratio <= Decimal::ZERO {
            Amount::Infinite
        } else {
            Amount::ratio(self.fixed_cost, self.contribution_ratio)
        }
    }
}

fn classify_costs(plan: &PlanModel, sales: Decimal, gross: Decimal) -> CostStructure {
    let gross_ratio = if sales > Decimal::ZERO {
        gross / sales
    } else {
        Decimal::ZERO
    };
    let mut variable_cost = Decimal::ZERO;
    let mut fixed_cost = Decimal::ZERO;
    for (code, rule) in plan.rules() {
        if !code.is_input() {
            continue;
        }
        match *rule {
            LineRule::Rate {
                value,
                base: RateBase::Sales,
            } => variable_cost += sales * value,
            LineRule::Rate {
                value,
                base: RateBase::Gross,
            } => variable_cost += sales * value * gross_ratio,
            LineRule::Rate {
                value,
                base: RateBase::Fixed,
            }
            | LineRule::Amount { value } => fixed_cost += value,
        }
    }
    let variable_rate = if sales > Decimal::ZERO {
        variable_cost / sales
    } else {
        Decimal::ZERO
    };
    CostStructure {
        variable_rate,
        fixed_cost,
        contribution_ratio: Decimal::ONE - variable_rate,
    }
}

/// Variable rate and fixed cost of `plan` at the sales level of `snapshot`.
pub fn cost_structure(plan: &PlanModel, snapshot: &ResultSnapshot) -> CostStructure {
    classify_costs(plan, snapshot.sales(), snapshot.gross())
}

// ---------------------------------------------------------------------------
// Summary metrics
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanMetrics {
    pub sales: Money,
    pub gross: Money,
    pub op: Money,
    pub ord: Money,
    pub gross_margin: Amount,
    pub op_margin: Amount,
    pub ord_margin: Amount,
    pub cogs_ratio: Amount,
    pub opex_ratio: Amount,
    pub labor_ratio: Amount,
    pub breakeven: Amount,
}

/// Margins and cost ratios; each is NaN when its denominator is zero or a sentinel.
pub fn summarize_plan_metrics(snapshot: &ResultSnapshot) -> PlanMetrics {
    let ratio = |num: LineCode, den: LineCode| -> Amount {
        match (snapshot.get(num), snapshot.get(den)) {
            (Amount::Finite(n), Amount::Finite(d)) => Amount::ratio(n, d),
            _ => Amount::NotANumber,
        }
    };
    PlanMetrics {
        sales: snapshot.sales(),
        gross: snapshot.gross(),
        op: snapshot.operating_profit(),
        ord: snapshot.ordinary_income(),
        gross_margin: ratio(LineCode::Gross, LineCode::Rev),
        op_margin: ratio(LineCode::Op, LineCode::Rev),
        ord_margin: ratio(LineCode::Ord, LineCode::Rev),
        cogs_ratio: ratio(LineCode::CogsTtl, LineCode::Rev),
        opex_ratio: ratio(LineCode::OpexTtl, LineCode::Rev),
        labor_ratio: ratio(LineCode::OpexH, LineCode::Gross),
        breakeven: snapshot.break_even_sales(),
    }
}

/// Every line code in snapshot order with its amount, for tabular output.
pub fn snapshot_rows(snapshot: &ResultSnapshot) -> Vec<(LineCode, Amount)> {
    ALL_CODES.iter().map(|c| (*c, snapshot.get(*c))).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Unit;

    fn example_plan() -> PlanModel {
        let mut plan = PlanModel::new(dec!(1000000), dec!(10), Unit::Base);
        plan.set_rate(LineCode::CogsMat, dec!(0.30), RateBase::Sales);
        plan.set_amount(LineCode::OpexH, dec!(200000));
        plan
    }

    #[test]
    fn test_end_to_end_example() {
        let snap = compute_plan(&example_plan(), None, None);
        assert_eq!(snap.value(LineCode::CogsTtl), dec!(300000));
        assert_eq!(snap.gross(), dec!(700000));
        assert_eq!(snap.operating_profit(), dec!(500000));
        assert_eq!(snap.ordinary_income(), dec!(500000));
        assert_eq!(
            snap.break_even_sales().round_dp(2),
            Amount::Finite(dec!(285714.29))
        );
        assert_eq!(snap.value(LineCode::PcSales), dec!(100000));
    }

    #[test]
    fn test_gross_linked_cogs_converge() {
        let mut plan = PlanModel::new(dec!(1000), dec!(1), Unit::Base);
        plan.set_rate(LineCode::CogsMat, dec!(0.2), RateBase::Sales);
        plan.set_rate(LineCode::CogsOth, dec!(0.1), RateBase::Gross);
        let snap = compute_plan(&plan, None, None);
        // gross g = 800 - 0.1 g  =>  g = 727.27...
        let expected = dec!(800) / dec!(1.1);
        assert!((snap.gross() - expected).abs() < dec!(0.01));
    }

    #[test]
    fn test_overrides_replace_rules_and_are_floored() {
        let mut overrides = AmountOverrides::new();
        overrides.insert(LineCode::OpexH, dec!(50000));
        overrides.insert(LineCode::OpexAd, dec!(-10));
        let snap = compute_plan(&example_plan(), Some(dec!(2000000)), Some(&overrides));
        assert_eq!(snap.sales(), dec!(2000000));
        assert_eq!(snap.value(LineCode::OpexH), dec!(50000));
        assert_eq!(snap.value(LineCode::OpexAd), Decimal::ZERO);
        assert_eq!(snap.operating_profit(), dec!(1350000));
    }

    #[test]
    fn test_break_even_infinite_when_no_contribution() {
        let mut plan = PlanModel::new(dec!(1000), dec!(1), Unit::Base);
        plan.set_rate(LineCode::CogsMat, dec!(1), RateBase::Sales);
        plan.set_amount(LineCode::OpexH, dec!(10));
        let snap = compute_plan(&plan, None, None);
        assert_eq!(snap.break_even_sales(), Amount::Infinite);
        assert_eq!(snap.get(LineCode::Ldr), Amount::NotANumber);
    }

    #[test]
    fn test_break_even_overflow_is_infinite() {
        let cs = CostStructure {
            variable_rate: dec!(0.9999999999999999999999999999),
            fixed_cost: dec!(1000000),
            contribution_ratio: dec!(0.0000000000000000000000000001),
        };
        assert_eq!(cs.break_even(), Amount::Infinite);
    }

    #[test]
    fn test_zero_sales_metrics_are_nan() {
        let snap = compute_plan(&example_plan(), Some(Decimal::ZERO), None);
        let metrics = summarize_plan_metrics(&snap);
        assert_eq!(metrics.gross_margin, Amount::NotANumber);
        assert_eq!(metrics.labor_ratio, Amount::NotANumber);
        assert_eq!(metrics.ord, dec!(-200000));
    }

    #[test]
    fn test_cost_structure_matches_break_even() {
        let plan = example_plan();
        let snap = compute_plan(&plan, None, None);
        let cs = cost_structure(&plan, &snap);
        assert_eq!(cs.variable_rate, dec!(0.3));
        assert_eq!(cs.fixed_cost, dec!(200000));
        assert_eq!(cs.break_even(), snap.break_even_sales());
    }

    #[test]
    fn test_metrics_margins() {
        let metrics = summarize_plan_metrics(&compute_plan(&example_plan(), None, None));
        assert_eq!(metrics.gross_margin, Amount::Finite(dec!(0.7)));
        assert_eq!(metrics.op_margin, Amount::Finite(dec!(0.5)));
        assert_eq!(metrics.cogs_ratio, Amount::Finite(dec!(0.3)));
        assert_eq!(metrics.opex_ratio, Amount::Finite(dec!(0.2)));
    }
}
