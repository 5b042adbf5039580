use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

use crate::models::range::EstimateRange;
use crate::types::Money;
use crate::validation::IssueCollector;

pub const MONTHS_PER_YEAR: usize = 12;

/// Calendar months 1..=12 of a single plan year.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonthlySeries {
    pub amounts: Vec<Money>,
}

impl MonthlySeries {
    pub fn new(amounts: Vec<Money>) -> Self {
        Self { amounts }
    }

    pub fn flat(amount: Money) -> Self {
        Self::new(vec![amount; MONTHS_PER_YEAR])
    }

    pub fn total(&self) -> Money {
        self.amounts.iter().sum()
    }

    /// Amount for calendar month `month` (1-based); zero outside the series.
    pub fn month(&self, month: u32) -> Money {
        month
            .checked_sub(1)
            .and_then(|i| self.amounts.get(i as usize))
            .copied()
            .unwrap_or(Decimal::ZERO)
    }
}

/// Monthly sales for one product sold through one channel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SalesItem {
    pub channel: String,
    pub product: String,
    #[serde(default)]
    pub monthly: MonthlySeries,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub customers: Option<Decimal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unit_price: Option<Money>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub purchase_frequency: Option<Decimal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub revenue_range: Option<EstimateRange>,
}

impl SalesItem {
    pub fn new(channel: &str, product: &str, monthly: MonthlySeries) -> Self {
        Self {
            channel: channel.to_string(),
            product: product.to_string(),
            monthly,
            customers: None,
            unit_price: None,
            purchase_frequency: None,
            revenue_range: None,
        }
    }

    pub fn annual_total(&self) -> Money {
        self.monthly.total()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SalesPlan {
    #[serde(default)]
    pub items: Vec<SalesItem>,
}

/// Aggregated sales drivers across every line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssumptionSummary {
    pub total_sales: Money,
    pub total_customers: Decimal,
    pub total_transactions: Decimal,
    pub avg_unit_price: Money,
    pub avg_frequency: Decimal,
    pub range_min_total: Money,
    pub range_typical_total: Money,
    pub range_max_total: Money,
}

impl SalesPlan {
    pub fn total_by_month(&self) -> BTreeMap<u32, Money> {
        let mut totals: BTreeMap<u32, Money> =
            (1..=MONTHS_PER_YEAR as u32).map(|m| (m, Decimal::ZERO)).collect();
        for item in &self.items {
            for (month, total) in totals.iter_mut() {
                *total += item.monthly.month(*month);
            }
        }
        totals
    }

    pub fn annual_total(&self) -> Money {
        self.items.iter().map(SalesItem::annual_total).sum()
    }

    pub fn channels(&self) -> Vec<String> {
        let set: BTreeSet<&str> = self.items.iter().map(|i| i.channel.as_str()).collect();
        set.into_iter().map(str::to_string).collect()
    }

    pub fn products(&self) -> Vec<String> {
        let set: BTreeSet<&str> = self.items.iter().map(|i| i.product.as_str()).collect();
        set.into_iter().map(str::to_string).collect()
    }

    pub fn assumption_summary(&self) -> AssumptionSummary {
        let mut total_customers = Decimal::ZERO;
        let mut total_transactions = Decimal::ZERO;
        let mut priced_volume = Decimal::ZERO;
        let mut range = EstimateRange::zero();

        for item in &self.items {
            let customers = item.customers.unwrap_or(Decimal::ZERO);
            let frequency = item.purchase_frequency.unwrap_or(Decimal::ZERO);
            total_customers += customers;
            let transactions = customers * frequency;
            total_transactions += transactions;
            priced_volume += transactions * item.unit_price.unwrap_or(Decimal::ZERO);
            range = range
                + item
                    .revenue_range
                    .unwrap_or_else(|| EstimateRange::point(item.annual_total()));
        }

        let total_sales = self.annual_total();
        let avg_unit_price = if total_transactions.is_zero() {
            Decimal::ZERO
        } else {
            priced_volume / total_transactions
        };
        let avg_frequency = if total_customers.is_zero() {
            Decimal::ZERO
        } else {
            total_transactions / total_customers
        };

        AssumptionSummary {
            total_sales,
            total_customers,
            total_transactions,
            avg_unit_price,
            avg_frequency,
            range_min_total: range.minimum,
            range_typical_total: range.typical,
            range_max_total: range.maximum,
        }
    }

    pub fn validate(&self) -> IssueCollector {
        let mut issues = IssueCollector::new();
        for (i, item) in self.items.iter().enumerate() {
            let path = format!("sales.items.{i}");
            if item.channel.trim().is_empty() {
                issues.push(format!("{path}.channel"), "channel must not be empty");
            }
            if item.product.trim().is_empty() {
                issues.push(format!("{path}.product"), "product must not be empty");
            }
            if item.monthly.amounts.len() != MONTHS_PER_YEAR {
                issues.push(
                    format!("{path}.monthly.amounts"),
                    format!(
                        "monthly series must contain exactly {MONTHS_PER_YEAR} values, got {}",
                        item.monthly.amounts.len()
                    ),
                );
            }
            for (m, amount) in item.monthly.amounts.iter().enumerate() {
                issues.check_non_negative(&format!("{path}.monthly.amounts.{m}"), *amount);
            }
            if let Some(customers) = item.customers {
                issues.check_non_negative(&format!("{path}.customers"), customers);
            }
            if let Some(price) = item.unit_price {
                issues.check_non_negative(&format!("{path}.unit_price"), price);
            }
            if let Some(freq) = item.purchase_frequency {
                issues.check_non_negative(&format!("{path}.purchase_frequency"), freq);
            }
        }
        issues
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn item(channel: &str, product: &str, monthly: Money) -> SalesItem {
        SalesItem::new(channel, product, MonthlySeries::flat(monthly))
    }

    #[test]
    fn test_annual_and_monthly_totals() {
        let plan = SalesPlan {
            items: vec![item("Online", "A", dec!(10)), item("Retail", "B", dec!(20))],
        };
        assert_eq!(plan.annual_total(), dec!(360));
        let by_month = plan.total_by_month();
        assert_eq!(by_month.len(), 12);
        assert_eq!(by_month[&1], dec!(30));
        assert_eq!(by_month[&12], dec!(30));
    }

    #[test]
    fn test_channels_and_products_are_sorted_and_distinct() {
        let plan = SalesPlan {
            items: vec![
                item("Retail", "B", dec!(1)),
                item("Online", "A", dec!(1)),
                item("Online", "B", dec!(1)),
            ],
        };
        assert_eq!(plan.channels(), vec!["Online", "Retail"]);
        assert_eq!(plan.products(), vec!["A", "B"]);
    }

    #[test]
    fn test_assumption_summary_aggregates_ranges() {
        let mut one = item("Online", "Subscription", dec!(10));
        one.customers = Some(dec!(100));
        one.unit_price = Some(dec!(50));
        one.purchase_frequency = Some(dec!(2));
        one.revenue_range = Some(EstimateRange::new(dec!(100), dec!(120), dec!(140)));
        let mut two = item("Retail", "Hardware", dec!(20));
        two.customers = Some(dec!(50));
        two.unit_price = Some(dec!(100));
        two.purchase_frequency = Some(dec!(1));
        two.revenue_range = Some(EstimateRange::new(dec!(200), dec!(220), dec!(260)));

        let summary = SalesPlan { items: vec![one, two] }.assumption_summary();
        assert_eq!(summary.total_sales, dec!(360));
        assert_eq!(summary.total_customers, dec!(150));
        assert_eq!(summary.total_transactions, dec!(250));
        assert_eq!(summary.avg_unit_price, dec!(60));
        assert_eq!(summary.avg_frequency, dec!(250) / dec!(150));
        assert_eq!(summary.range_min_total, dec!(300));
        assert_eq!(summary.range_typical_total, dec!(340));
        assert_eq!(summary.range_max_total, dec!(400));
    }

    #[test]
    fn test_short_series_is_rejected() {
        let plan = SalesPlan {
            items: vec![SalesItem::new(
                "Online",
                "A",
                MonthlySeries::new(vec![dec!(1); 13]),
            )],
        };
        let issues = plan.validate().into_issues();
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].field, "sales.items.0.monthly.amounts");
    }
}
