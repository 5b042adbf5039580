use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::borrow::Cow;

use crate::batch::evaluate_batch;
use crate::cash_flow::{annual_cash_flow, free_cash_flow};
use crate::models::{CapexPlan, FinanceBundle, LoanSchedule, TaxPolicy};
use crate::pl::codes::{COGS_CODES, OPEX_CODES};
use crate::pl::{
    compute_plan, solve_for_target_income, LineRule, PlanModel, RateBase, ResultSnapshot,
    SolverOptions,
};
use crate::schedules::first_dscr;
use crate::types::{Amount, Money, Rate};

const GROSS_MARGIN_STEP: Rate = dec!(0.01);

// ---------------------------------------------------------------------------
// Drivers and metrics
// ---------------------------------------------------------------------------

/// Fractional changes applied to the baseline plan (0.1 = +10%).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScenarioDrivers {
    #[serde(default)]
    pub customers_change: Rate,
    #[serde(default)]
    pub price_change: Rate,
    /// Scales every COGS rule
    #[serde(default)]
    pub cost_change: Rate,
    /// Scales every OPEX rule
    #[serde(default)]
    pub fixed_change: Rate,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Driver {
    Customers,
    Price,
    Cost,
    Fixed,
}

impl Driver {
    pub const ALL: [Driver; 4] = [Driver::Customers, Driver::Price, Driver::Cost, Driver::Fixed];

    /// Drivers with only this one set to `change`.
    pub fn drivers(self, change: Rate) -> ScenarioDrivers {
        let mut d = ScenarioDrivers::default();
        match self {
            Driver::Customers => d.customers_change = change,
            Driver::Price => d.price_change = change,
            Driver::Cost => d.cost_change = change,
            Driver::Fixed => d.fixed_change = change,
        }
        d
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScenarioMetrics {
    pub sales: Money,
    pub gross: Money,
    /// Operating profit
    pub ebit: Money,
    pub ord: Money,
    pub fcf: Money,
    pub dscr: Amount,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScenarioMetric {
    Sales,
    Gross,
    Ebit,
    #[default]
    Ord,
    Fcf,
    Dscr,
}

impl ScenarioMetric {
    pub fn value(self, m: &ScenarioMetrics) -> Amount {
        match self {
            ScenarioMetric::Sales => Amount::Finite(m.sales),
            ScenarioMetric::Gross => Amount::Finite(m.gross),
            ScenarioMetric::Ebit => Amount::Finite(m.ebit),
            ScenarioMetric::Ord => Amount::Finite(m.ord),
            ScenarioMetric::Fcf => Amount::Finite(m.fcf),
            ScenarioMetric::Dscr => m.dscr,
        }
    }
}

// ---------------------------------------------------------------------------
// Evaluation
// ---------------------------------------------------------------------------

/// Borrowed baseline shared by every scenario evaluation.
#[derive(Debug, Clone, Copy)]
pub struct ScenarioContext<'a> {
    pub plan: &'a PlanModel,
    pub capex: &'a CapexPlan,
    pub loans: &'a LoanSchedule,
    pub tax: &'a TaxPolicy,
}

impl<'a> ScenarioContext<'a> {
    pub fn new(plan: &'a PlanModel, bundle: &'a FinanceBundle) -> Self {
        Self {
            plan,
            capex: &bundle.capex,
            loans: &bundle.loans,
            tax: &bundle.tax,
        }
    }

    fn metrics_for(&self, snapshot: &ResultSnapshot) -> ScenarioMetrics {
        let annual = annual_cash_flow(snapshot, self.capex, self.loans, self.tax);
        ScenarioMetrics {
            sales: snapshot.sales(),
            gross: snapshot.gross(),
            ebit: snapshot.operating_profit(),
            ord: snapshot.ordinary_income(),
            fcf: free_cash_flow(snapshot, self.capex, self.tax),
            dscr: first_dscr(annual.operating_before_interest, self.loans),
        }
    }
}

/// Applies the drivers to a view of the baseline and computes the metrics.
/// The baseline plan is cloned only when a cost driver is set.
pub fn evaluate_scenario(ctx: &ScenarioContext<'_>, drivers: &ScenarioDrivers) -> ScenarioMetrics {
    let mut plan = Cow::Borrowed(ctx.plan);
    if !drivers.cost_change.is_zero() {
        plan.to_mut()
            .scale_rules(&COGS_CODES, Decimal::ONE + drivers.cost_change);
    }
    if !drivers.fixed_change.is_zero() {
        plan.to_mut()
            .scale_rules(&OPEX_CODES, Decimal::ONE + drivers.fixed_change);
    }
    let sales = ctx.plan.base_sales
        * (Decimal::ONE + drivers.customers_change)
        * (Decimal::ONE + drivers.price_change);
    let snapshot = compute_plan(&plan, Some(sales), None);
    ctx.metrics_for(&snapshot)
}

/// Evaluates many driver sets through the batch entry point.
pub fn evaluate_scenarios(
    ctx: &ScenarioContext<'_>,
    drivers: &[ScenarioDrivers],
) -> Vec<ScenarioMetrics> {
    evaluate_batch(drivers, |d| evaluate_scenario(ctx, d))
}

// ---------------------------------------------------------------------------
// Preset comparison
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Preset {
    Target,
    SalesUp10,
    SalesDown5,
    SalesDown10,
    GrossMarginUp1pt,
    TargetOrdinaryIncome,
    BreakEven,
}

impl Preset {
    pub fn label(self) -> &'static str {
        match self {
            Preset::Target => "Target",
            Preset::SalesUp10 => "Sales +10%",
            Preset::SalesDown5 => "Sales -5%",
            Preset::SalesDown10 => "Sales -10%",
            Preset::GrossMarginUp1pt => "Gross margin +1pt",
            Preset::TargetOrdinaryIncome => "Target ordinary income",
            Preset::BreakEven => "Break-even sales",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScenarioColumn {
    pub preset: Preset,
    pub label: String,
    pub sales: Money,
    pub snapshot: ResultSnapshot,
}

impl ScenarioColumn {
    fn new(preset: Preset, snapshot: ResultSnapshot) -> Self {
        Self {
            preset,
            label: preset.label().to_string(),
            sales: snapshot.sales(),
            snapshot,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PresetComparison {
    pub columns: Vec<ScenarioColumn>,
    pub warnings: Vec<String>,
}

/// Copy of `plan` whose sales-based COGS rates are reduced in proportion
/// so the gross margin rises by one point.
pub fn with_gross_margin_step(plan: &PlanModel) -> PlanModel {
    let sales_rates: Vec<_> = COGS_CODES
        .iter()
        .filter_map(|c| match plan.rule(*c) {
            Some(LineRule::Rate {
                value,
                base: RateBase::Sales,
            }) => Some((*c, *value)),
            _ => None,
        })
        .collect();
    let total: Decimal = sales_rates.iter().map(|(_, v)| *v).sum();
    let mut adjusted = plan.clone();
    if total <= Decimal::ZERO {
        return adjusted;
    }
    for (code, rate) in sales_rates {
        let reduced = (rate - GROSS_MARGIN_STEP * rate / total).max(Decimal::ZERO);
        adjusted.set_rate(code, reduced, RateBase::Sales);
    }
    adjusted
}

/// The standard side-by-side plan variants.
pub fn compare_presets(
    plan: &PlanModel,
    target_ordinary_income: Money,
    options: SolverOptions,
) -> PresetComparison {
    let mut warnings = Vec::new();
    let base = plan.base_sales;
    let at = |sales: Money| compute_plan(plan, Some(sales), None);

    let target = at(base);
    let mut columns = vec![
        ScenarioColumn::new(Preset::Target, target.clone()),
        ScenarioColumn::new(Preset::SalesUp10, at(base * dec!(1.10))),
        ScenarioColumn::new(Preset::SalesDown5, at(base * dec!(0.95))),
        ScenarioColumn::new(Preset::SalesDown10, at(base * dec!(0.90))),
        ScenarioColumn::new(
            Preset::GrossMarginUp1pt,
            compute_plan(&with_gross_margin_step(plan), None, None),
        ),
    ];

    let solution = solve_for_target_income(
        plan,
        target_ordinary_income,
        Decimal::ZERO,
        base,
        options,
    );
    if !solution.converged {
        warnings.push(format!(
            "Target ordinary income {target_ordinary_income} not reached within {} iterations",
            options.max_iterations
        ));
    }
    columns.push(ScenarioColumn::new(
        Preset::TargetOrdinaryIncome,
        solution.snapshot,
    ));

    match target.break_even_sales() {
        Amount::Finite(be) => {
            columns.push(ScenarioColumn::new(
                Preset::BreakEven,
                at(be.max(Decimal::ZERO)),
            ));
        }
        _ => warnings.push("Break-even sales undefined: contribution ratio is not positive".into()),
    }

    PresetComparison { columns, warnings }
}

// ---------------------------------------------------------------------------
// Tornado
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TornadoBar {
    pub driver: Driver,
    /// Metric change at `-magnitude`
    pub low_delta: Amount,
    /// Metric change at `+magnitude`
    pub high_delta: Amount,
    /// Largest absolute change, zero when both sides are sentinels
    pub impact: Decimal,
}

/// One-at-a-time swings of every driver, largest impact first.
pub fn tornado(
    ctx: &ScenarioContext<'_>,
    magnitude: Rate,
    metric: ScenarioMetric,
) -> Vec<TornadoBar> {
    let base = metric.value(&evaluate_scenario(ctx, &ScenarioDrivers::default()));
    let mut cases = Vec::with_capacity(Driver::ALL.len() * 2);
    for d in Driver::ALL {
        cases.push(d.drivers(-magnitude));
        cases.push(d.drivers(magnitude));
    }
    let results = evaluate_scenarios(ctx, &cases);

    let delta = |value: Amount| match (value, base) {
        (Amount::Finite(v), Amount::Finite(b)) => Amount::Finite(v - b),
        _ => Amount::NotANumber,
    };
    let mut bars: Vec<TornadoBar> = Driver::ALL
        .iter()
        .zip(results.chunks(2))
        .map(|(driver, pair)| {
            let low_delta = delta(metric.value(&pair[0]));
            let high_delta = delta(metric.value(&pair[1]));
            let impact = low_delta.or_zero().abs().max(high_delta.or_zero().abs());
            TornadoBar {
                driver: *driver,
                low_delta,
                high_delta,
                impact,
            }
        })
        .collect();
    bars.sort_by(|a, b| b.impact.cmp(&a.impact));
    bars
}
