use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::types::{Money, Rate};
use crate::validation::IssueCollector;

/// Flat-rate tax assumptions. No jurisdiction-specific brackets.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaxPolicy {
    /// Corporate income tax on ordinary income (0 to 0.55)
    #[serde(default = "default_corporate")]
    pub corporate_tax_rate: Rate,
    /// Business / local tax on ordinary income (0 to 0.15)
    #[serde(default = "default_business")]
    pub business_tax_rate: Rate,
    /// Consumption (VAT-style) tax (0 to 0.20)
    #[serde(default = "default_consumption")]
    pub consumption_tax_rate: Rate,
    /// Share of net income paid out (0 to 1)
    #[serde(default)]
    pub dividend_payout_ratio: Rate,
}

fn default_corporate() -> Rate {
    dec!(0.30)
}

fn default_business() -> Rate {
    dec!(0.05)
}

fn default_consumption() -> Rate {
    dec!(0.10)
}

impl Default for TaxPolicy {
    fn default() -> Self {
        Self {
            corporate_tax_rate: default_corporate(),
            business_tax_rate: default_business(),
            consumption_tax_rate: default_consumption(),
            dividend_payout_ratio: Decimal::ZERO,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct IncomeTaxComponents {
    pub corporate: Money,
    pub business: Money,
    pub total: Money,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConsumptionTaxBalance {
    pub output: Money,
    pub input: Money,
    pub net: Money,
}

impl TaxPolicy {
    /// Income taxes on ordinary income; all zero for a loss.
    pub fn income_tax_components(&self, ordinary_income: Money) -> IncomeTaxComponents {
        if ordinary_income <= Decimal::ZERO {
            return IncomeTaxComponents {
                corporate: Decimal::ZERO,
                business: Decimal::ZERO,
                total: Decimal::ZERO,
            };
        }
        let corporate = ordinary_income * self.corporate_tax_rate;
        let business = ordinary_income * self.business_tax_rate;
        IncomeTaxComponents {
            corporate,
            business,
            total: corporate + business,
        }
    }

    pub fn effective_tax(&self, ordinary_income: Money) -> Money {
        self.income_tax_components(ordinary_income).total
    }

    pub fn consumption_tax_balance(
        &self,
        sales: Money,
        taxable_expenses: Money,
    ) -> ConsumptionTaxBalance {
        let output = sales.max(Decimal::ZERO) * self.consumption_tax_rate;
        let input = taxable_expenses.max(Decimal::ZERO) * self.consumption_tax_rate;
        ConsumptionTaxBalance {
            output,
            input,
            net: output - input,
        }
    }

    pub fn projected_dividend(&self, net_income: Money) -> Money {
        if net_income <= Decimal::ZERO {
            return Decimal::ZERO;
        }
        net_income * self.dividend_payout_ratio
    }

    pub fn validate(&self) -> IssueCollector {
        let mut issues = IssueCollector::new();
        issues.check_range(
            "tax.corporate_tax_rate",
            self.corporate_tax_rate,
            Decimal::ZERO,
            dec!(0.55),
        );
        issues.check_range(
            "tax.business_tax_rate",
            self.business_tax_rate,
            Decimal::ZERO,
            dec!(0.15),
        );
        issues.check_range(
            "tax.consumption_tax_rate",
            self.consumption_tax_rate,
            Decimal::ZERO,
            dec!(0.20),
        );
        issues.check_range(
            "tax.dividend_payout_ratio",
            self.dividend_payout_ratio,
            Decimal::ZERO,
            Decimal::ONE,
        );
        issues
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_income_tax_components() {
        let tax = TaxPolicy::default();
        let c = tax.income_tax_components(dec!(1000000));
        assert_eq!(c.corporate, dec!(300000));
        assert_eq!(c.business, dec!(50000));
        assert_eq!(c.total, dec!(350000));
        assert_eq!(tax.effective_tax(dec!(-5)), Decimal::ZERO);
    }

    #[test]
    fn test_consumption_tax_balance() {
        let tax = TaxPolicy::default();
        let b = tax.consumption_tax_balance(dec!(1000), dec!(400));
        assert_eq!(b.output, dec!(100));
        assert_eq!(b.input, dec!(40));
        assert_eq!(b.net, dec!(60));
    }

    #[test]
    fn test_dividend_only_on_profit() {
        let tax = TaxPolicy {
            dividend_payout_ratio: dec!(0.25),
            ..TaxPolicy::default()
        };
        assert_eq!(tax.projected_dividend(dec!(400)), dec!(100));
        assert_eq!(tax.projected_dividend(dec!(-400)), Decimal::ZERO);
    }

    #[test]
    fn test_missing_fields_take_defaults() {
        let tax: TaxPolicy = serde_json::from_str(r#"{"corporate_tax_rate":"0.25"}"#).unwrap();
        assert_eq!(tax.corporate_tax_rate, dec!(0.25));
        assert_eq!(tax.business_tax_rate, dec!(0.05));
        assert_eq!(tax.consumption_tax_rate, dec!(0.10));
    }
}
