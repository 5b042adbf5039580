use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::types::{Money, Rate};
use crate::validation::IssueCollector;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RepaymentType {
    /// Same principal every month, interest on the declining balance.
    #[default]
    EqualPrincipal,
    /// Interest only, full balance repaid in the final month.
    InterestOnly,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoanItem {
    pub name: String,
    /// Amount drawn (must be positive)
    pub principal: Money,
    /// Annual interest rate (0 to 0.20)
    pub interest_rate: Rate,
    /// Term in months (1-600)
    pub term_months: u32,
    /// First repayment month of year 1 (1-12)
    pub start_month: u32,
    #[serde(default)]
    pub repayment_type: RepaymentType,
}

impl LoanItem {
    pub fn end_month(&self) -> u32 {
        self.start_month + self.term_months.saturating_sub(1)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LoanSchedule {
    #[serde(default)]
    pub loans: Vec<LoanItem>,
}

impl LoanSchedule {
    pub fn total_principal(&self) -> Money {
        self.loans.iter().map(|l| l.principal).sum()
    }

    /// Principal-weighted average annual rate; zero without loans.
    pub fn weighted_average_rate(&self) -> Rate {
        let total = self.total_principal();
        if total <= Decimal::ZERO {
            return Decimal::ZERO;
        }
        let weighted: Decimal = self
            .loans
            .iter()
            .map(|l| l.principal * l.interest_rate)
            .sum();
        weighted / total
    }

    pub fn validate(&self) -> IssueCollector {
        let mut issues = IssueCollector::new();
        for (i, loan) in self.loans.iter().enumerate() {
            let path = format!("loans.loans.{i}");
            if loan.name.trim().is_empty() {
                issues.push(format!("{path}.name"), "name must not be empty");
            }
            issues.check_positive(&format!("{path}.principal"), loan.principal);
            issues.check_range(
                &format!("{path}.interest_rate"),
                loan.interest_rate,
                Decimal::ZERO,
                dec!(0.20),
            );
            issues.check_int_range(&format!("{path}.term_months"), loan.term_months, 1, 600);
            issues.check_int_range(&format!("{path}.start_month"), loan.start_month, 1, 12);
        }
        issues
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn loan(principal: Money, rate: Rate) -> LoanItem {
        LoanItem {
            name: "Bank".into(),
            principal,
            interest_rate: rate,
            term_months: 60,
            start_month: 1,
            repayment_type: RepaymentType::EqualPrincipal,
        }
    }

    #[test]
    fn test_weighted_average_rate() {
        let schedule = LoanSchedule {
            loans: vec![loan(dec!(300000), dec!(0.02)), loan(dec!(100000), dec!(0.06))],
        };
        assert_eq!(schedule.weighted_average_rate(), dec!(0.03));
        assert_eq!(LoanSchedule::default().weighted_average_rate(), Decimal::ZERO);
    }

    #[test]
    fn test_rate_and_term_limits() {
        let mut bad = loan(dec!(1000), dec!(0.25));
        bad.term_months = 0;
        let issues = LoanSchedule { loans: vec![bad] }.validate().into_issues();
        let fields: Vec<&str> = issues.iter().map(|i| i.field.as_str()).collect();
        assert_eq!(
            fields,
            vec!["loans.loans.0.interest_rate", "loans.loans.0.term_months"]
        );
    }

    #[test]
    fn test_repayment_type_serde() {
        let json = serde_json::to_string(&RepaymentType::InterestOnly).unwrap();
        assert_eq!(json, "\"interest_only\"");
    }
}
