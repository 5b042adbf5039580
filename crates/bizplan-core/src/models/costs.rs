use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::models::range::EstimateRange;
use crate::pl::codes::{LineCode, COGS_CODES, NOE_CODES, NOI_CODES, OPEX_CODES};
use crate::types::{Money, Rate};
use crate::validation::IssueCollector;

/// Cost structure keyed by line code (`COGS_MAT`, `OPEX_H`, ...).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CostPlan {
    /// Ratios of sales.
    #[serde(default)]
    pub variable_ratios: BTreeMap<String, Rate>,
    /// Ratios of gross profit.
    #[serde(default)]
    pub gross_linked_ratios: BTreeMap<String, Rate>,
    #[serde(default)]
    pub fixed_costs: BTreeMap<String, Money>,
    #[serde(default)]
    pub non_operating_income: BTreeMap<String, Money>,
    #[serde(default)]
    pub non_operating_expenses: BTreeMap<String, Money>,
    /// Optional low/typical/high profile per line: a ratio for COGS
    /// lines, an amount for everything else.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub range_profiles: BTreeMap<String, EstimateRange>,
}

/// Range totals grouped the way the plan is read.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RangeTotals {
    pub variable: EstimateRange,
    pub fixed: EstimateRange,
    pub non_operating: EstimateRange,
}

impl CostPlan {
    pub fn aggregate_range_totals(&self, sales: Money) -> RangeTotals {
        let mut totals = RangeTotals {
            variable: EstimateRange::zero(),
            fixed: EstimateRange::zero(),
            non_operating: EstimateRange::zero(),
        };
        for (key, range) in &self.range_profiles {
            let Ok(code) = key.parse::<LineCode>() else {
                continue;
            };
            if COGS_CODES.contains(&code) {
                totals.variable = totals.variable + range.scaled(sales);
            } else if OPEX_CODES.contains(&code) {
                totals.fixed = totals.fixed + *range;
            } else if NOI_CODES.contains(&code) || NOE_CODES.contains(&code) {
                totals.non_operating = totals.non_operating + *range;
            }
        }
        totals
    }

    pub fn validate(&self) -> IssueCollector {
        let mut issues = IssueCollector::new();
        for (label, ratios) in [
            ("variable_ratios", &self.variable_ratios),
            ("gross_linked_ratios", &self.gross_linked_ratios),
        ] {
            for (code, ratio) in ratios {
                let field = format!("costs.{label}.{code}");
                check_code(&mut issues, &field, code);
                issues.check_range(&field, *ratio, Decimal::ZERO, Decimal::ONE);
            }
        }
        for (label, amounts) in [
            ("fixed_costs", &self.fixed_costs),
            ("non_operating_income", &self.non_operating_income),
            ("non_operating_expenses", &self.non_operating_expenses),
        ] {
            for (code, amount) in amounts {
                let field = format!("costs.{label}.{code}");
                check_code(&mut issues, &field, code);
                issues.check_non_negative(&field, *amount);
            }
        }
        for code in self.range_profiles.keys() {
            check_code(&mut issues, &format!("costs.range_profiles.{code}"), code);
        }
        issues
    }
}

fn check_code(issues: &mut IssueCollector, field: &str, code: &str) {
    match code.parse::<LineCode>() {
        Ok(c) if c.is_input() => {}
        Ok(c) => issues.push(field, format!("'{c}' is a derived line and cannot carry a cost")),
        Err(e) => issues.push(field, e.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_aggregate_range_totals() {
        let mut plan = CostPlan::default();
        plan.range_profiles.insert(
            "COGS_MAT".into(),
            EstimateRange::new(dec!(0.10), dec!(0.20), dec!(0.30)),
        );
        plan.range_profiles.insert(
            "OPEX_H".into(),
            EstimateRange::new(dec!(100000), dec!(120000), dec!(150000)),
        );
        plan.range_profiles.insert(
            "NOE_INT".into(),
            EstimateRange::new(dec!(10000), dec!(12000), dec!(15000)),
        );

        let totals = plan.aggregate_range_totals(dec!(1000000));
        assert_eq!(totals.variable.minimum, dec!(100000));
        assert_eq!(totals.variable.typical, dec!(200000));
        assert_eq!(totals.variable.maximum, dec!(300000));
        assert_eq!(totals.fixed.minimum, dec!(100000));
        assert_eq!(totals.non_operating.typical, dec!(12000));

        let negative = plan.aggregate_range_totals(dec!(-100));
        assert_eq!(negative.variable, EstimateRange::zero());
    }

    #[test]
    fn test_out_of_range_ratio_and_negative_amount_rejected() {
        let mut plan = CostPlan::default();
        plan.variable_ratios.insert("COGS_MAT".into(), dec!(1.01));
        plan.gross_linked_ratios.insert("OPEX_H".into(), dec!(-0.1));
        plan.fixed_costs.insert("OPEX_AD".into(), dec!(-5));
        let issues = plan.validate().into_issues();
        assert_eq!(issues.len(), 3);
    }

    #[test]
    fn test_unknown_and_derived_codes_rejected() {
        let mut plan = CostPlan::default();
        plan.fixed_costs.insert("OPEX_K".into(), dec!(5));
        plan.fixed_costs.insert("GROSS".into(), dec!(5));
        let issues = plan.validate().into_issues();
        let fields: Vec<&str> = issues.iter().map(|i| i.field.as_str()).collect();
        assert_eq!(fields, vec!["costs.fixed_costs.GROSS", "costs.fixed_costs.OPEX_K"]);
    }
}
