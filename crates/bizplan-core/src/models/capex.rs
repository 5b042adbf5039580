use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::types::Money;
use crate::validation::IssueCollector;

/// A single capital expenditure, paid as a lump sum and depreciated
/// straight-line with no salvage value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CapexItem {
    pub name: String,
    /// Purchase amount (must be positive)
    pub amount: Money,
    /// Month of year 1 in which the outlay happens (1-12)
    pub start_month: u32,
    /// Useful life in whole years (1-20)
    pub useful_life_years: u32,
}

impl CapexItem {
    pub fn annual_depreciation(&self) -> Money {
        if self.useful_life_years == 0 {
            return Decimal::ZERO;
        }
        self.amount / Decimal::from(self.useful_life_years)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CapexPlan {
    #[serde(default)]
    pub items: Vec<CapexItem>,
}

impl CapexPlan {
    pub fn annual_depreciation(&self) -> Money {
        self.items.iter().map(CapexItem::annual_depreciation).sum()
    }

    pub fn total_investment(&self) -> Money {
        self.items.iter().map(|i| i.amount).sum()
    }

    pub fn validate(&self) -> IssueCollector {
        let mut issues = IssueCollector::new();
        for (i, item) in self.items.iter().enumerate() {
            let path = format!("capex.items.{i}");
            if item.name.trim().is_empty() {
                issues.push(format!("{path}.name"), "name must not be empty");
            }
            issues.check_positive(&format!("{path}.amount"), item.amount);
            issues.check_int_range(&format!("{path}.start_month"), item.start_month, 1, 12);
            issues.check_int_range(
                &format!("{path}.useful_life_years"),
                item.useful_life_years,
                1,
                20,
            );
        }
        issues
    }
}
