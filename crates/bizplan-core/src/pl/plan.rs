use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::models::FinanceBundle;
use crate::pl::codes::LineCode;
use crate::types::{Money, Rate, Unit};

const MIN_FTE: Decimal = dec!(0.0001);

// ---------------------------------------------------------------------------
// Line rules
// ---------------------------------------------------------------------------

/// What a rate-based line is multiplied by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RateBase {
    Sales,
    Gross,
    /// The rate value is used as-is and counted as a fixed cost.
    Fixed,
}

/// Computation rule for one input line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "method", rename_all = "snake_case")]
pub enum LineRule {
    Rate { value: Rate, base: RateBase },
    Amount { value: Money },
}

impl LineRule {
    pub fn value(&self) -> Decimal {
        match self {
            LineRule::Rate { value, .. } | LineRule::Amount { value } => *value,
        }
    }

    /// Same rule with its value multiplied by `factor`.
    pub fn scaled(&self, factor: Decimal) -> LineRule {
        match *self {
            LineRule::Rate { value, base } => LineRule::Rate {
                value: value * factor,
                base,
            },
            LineRule::Amount { value } => LineRule::Amount {
                value: value * factor,
            },
        }
    }
}

// ---------------------------------------------------------------------------
// Plan model
// ---------------------------------------------------------------------------

/// Per-line computation rules against a base sales figure.
///
/// Owned by a single computation. `Clone` yields an independent copy, so
/// scenario code perturbs clones and leaves the baseline untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanModel {
    pub base_sales: Money,
    fte: Decimal,
    pub unit: Unit,
    rules: BTreeMap<LineCode, LineRule>,
}

impl PlanModel {
    /// Headcount is floored at 0.0001 so per-head metrics never divide by zero.
    pub fn new(base_sales: Money, fte: Decimal, unit: Unit) -> Self {
        Self {
            base_sales,
            fte: fte.max(MIN_FTE),
            unit,
            rules: BTreeMap::new(),
        }
    }

    pub fn fte(&self) -> Decimal {
        self.fte
    }

    pub fn set_rate(&mut self, code: LineCode, rate: Rate, base: RateBase) {
        self.rules.insert(code, LineRule::Rate { value: rate, base });
    }

    pub fn set_amount(&mut self, code: LineCode, amount: Money) {
        self.rules.insert(code, LineRule::Amount { value: amount });
    }

    /// Accumulates into an existing amount rule, or replaces any other rule.
    pub fn add_amount(&mut self, code: LineCode, amount: Money) {
        match self.rules.get_mut(&code) {
            Some(LineRule::Amount { value }) => *value += amount,
            _ => self.set_amount(code, amount),
        }
    }

    pub fn rule(&self, code: LineCode) -> Option<&LineRule> {
        self.rules.get(&code)
    }

    pub fn rules(&self) -> impl Iterator<Item = (LineCode, &LineRule)> {
        self.rules.iter().map(|(c, r)| (*c, r))
    }

    /// Multiplies the value of every rule on `codes` by `factor`.
    pub fn scale_rules(&mut self, codes: &[LineCode], factor: Decimal) {
        for code in codes {
            if let Some(rule) = self.rules.get_mut(code) {
                *rule = rule.scaled(factor);
            }
        }
    }
}

/// Builds the line-item plan from validated input records.
///
/// Unknown codes are skipped with a warning; `validate_bundle` rejects
/// them before this point in normal use.
pub fn plan_from_models(bundle: &FinanceBundle, fte: Decimal, unit: Unit) -> PlanModel {
    let mut plan = PlanModel::new(bundle.sales.annual_total(), fte, unit);
    let costs = &bundle.costs;

    for (key, ratio) in &costs.variable_ratios {
        if let Some(code) = input_code(key) {
            plan.set_rate(code, *ratio, RateBase::Sales);
        }
    }
    for (key, ratio) in &costs.gross_linked_ratios {
        if let Some(code) = input_code(key) {
            plan.set_rate(code, *ratio, RateBase::Gross);
        }
    }
    for amounts in [
        &costs.fixed_costs,
        &costs.non_operating_income,
        &costs.non_operating_expenses,
    ] {
        for (key, amount) in amounts {
            if let Some(code) = input_code(key) {
                plan.add_amount(code, *amount);
            }
        }
    }

    let depreciation = bundle.capex.annual_depreciation();
    if depreciation > Decimal::ZERO {
        plan.add_amount(LineCode::OpexDep, depreciation);
    }
    let interest = crate::schedules::annual_interest(&bundle.loans);
    if interest > Decimal::ZERO {
        plan.add_amount(LineCode::NoeInt, interest);
    }

    tracing::debug!(
        base_sales = %plan.base_sales,
        rules = plan.rules.len(),
        "line-item plan built"
    );
    plan
}

fn input_code(key: &str) -> Option<LineCode> {
    match key.parse::<LineCode>() {
        Ok(code) if code.is_input() => Some(code),
        _ => {
            tracing::warn!(code = key, "ignoring cost line that is not an input code");
            None
        }
    }
}
