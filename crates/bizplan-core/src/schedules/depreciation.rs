use serde::{Deserialize, Serialize};

use crate::models::CapexPlan;
use crate::types::Money;

/// One lump-sum capital outlay.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CapexPayment {
    pub name: String,
    pub year: u32,
    pub month: u32,
    pub absolute_month: u32,
    pub amount: Money,
}

/// Aggregate depreciation facts plus the payment schedule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DepreciationSummary {
    pub annual_depreciation: Money,
    pub total_investment: Money,
    pub payments: Vec<CapexPayment>,
}

/// Payment schedule: each item is paid in full in its start month of year 1.
/// Only the depreciation expense is spread over the useful life.
pub fn depreciation_schedule(capex: &CapexPlan) -> Vec<CapexPayment> {
    capex
        .items
        .iter()
        .map(|item| CapexPayment {
            name: item.name.clone(),
            year: 1,
            month: item.start_month,
            absolute_month: item.start_month,
            amount: item.amount,
        })
        .collect()
}

pub fn depreciation_summary(capex: &CapexPlan) -> DepreciationSummary {
    DepreciationSummary {
        annual_depreciation: capex.annual_depreciation(),
        total_investment: capex.total_investment(),
        payments: depreciation_schedule(capex),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::CapexItem;
    use rust_decimal_macros::dec;

    #[test]
    fn test_one_lump_sum_per_item() {
        let capex = CapexPlan {
            items: vec![
                CapexItem {
                    name: "Oven".into(),
                    amount: dec!(600000),
                    start_month: 3,
                    useful_life_years: 6,
                },
                CapexItem {
                    name: "POS".into(),
                    amount: dec!(120000),
                    start_month: 9,
                    useful_life_years: 4,
                },
            ],
        };
        let summary = depreciation_summary(&capex);
        assert_eq!(summary.annual_depreciation, dec!(130000));
        assert_eq!(summary.total_investment, dec!(720000));
        assert_eq!(summary.payments.len(), 2);
        assert_eq!(summary.payments[1].absolute_month, 9);
        assert_eq!(summary.payments[1].year, 1);
        assert_eq!(summary.payments[1].amount, dec!(120000));
    }
}
