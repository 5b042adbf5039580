use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::balance_sheet::WorkingCapital;
use crate::models::FinanceBundle;
use crate::pl::root_finder::{SolverOptions, DEFAULT_MAX_ITERATIONS, DEFAULT_TOLERANCE};
use crate::types::{Money, Rate, Unit};
use crate::validation::{bundle_issues, IssueCollector};
use crate::PlanResult;

/// Run settings that sit next to the input models in a plan document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlanSettings {
    /// Full-time-equivalent headcount for per-employee metrics
    pub fte: Decimal,
    pub unit: Unit,
    /// Annual discount rate; falls back to the loan rate, then 5%
    #[serde(skip_serializing_if = "Option::is_none")]
    pub discount_rate: Option<Rate>,
    pub target_ordinary_income: Money,
    pub max_iterations: u32,
    pub tolerance: Money,
    /// Receivable, inventory and payable days for the balance sheet
    #[serde(skip_serializing_if = "Option::is_none")]
    pub working_capital: Option<WorkingCapital>,
}

impl Default for PlanSettings {
    fn default() -> Self {
        Self {
            fte: dec!(20),
            unit: Unit::Millions,
            discount_rate: None,
            target_ordinary_income: dec!(50000000),
            max_iterations: DEFAULT_MAX_ITERATIONS,
            tolerance: DEFAULT_TOLERANCE,
            working_capital: None,
        }
    }
}

impl PlanSettings {
    pub fn solver_options(&self) -> SolverOptions {
        SolverOptions {
            max_iterations: self.max_iterations,
            tolerance: self.tolerance,
        }
    }

    pub fn validate(&self, issues: &mut IssueCollector) {
        issues.check_non_negative("settings.fte", self.fte);
        if let Some(rate) = self.discount_rate {
            if rate <= dec!(-1) {
                issues.push("settings.discount_rate", "Discount rate must exceed -100%");
            }
        }
        if self.max_iterations == 0 {
            issues.push("settings.max_iterations", "Must be at least 1");
        }
        issues.check_positive("settings.tolerance", self.tolerance);
        if let Some(terms) = &self.working_capital {
            terms.validate("settings.working_capital", issues);
        }
    }
}

/// A complete plan document: settings plus the five input models.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PlanInput {
    #[serde(default)]
    pub settings: PlanSettings,
    #[serde(flatten)]
    pub bundle: FinanceBundle,
}

impl PlanInput {
    pub fn from_json(json: &str) -> PlanResult<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Settings and all five models, every issue reported at once.
    pub fn validate(&self) -> PlanResult<()> {
        let mut issues = bundle_issues(&self.bundle);
        self.settings.validate(&mut issues);
        if !issues.is_empty() {
            tracing::warn!("plan document rejected");
        }
        issues.finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_defaults_fill_missing_settings() {
        let input = PlanInput::from_json(r#"{"settings": {"fte": "5"}}"#).unwrap();
        assert_eq!(input.settings.fte, dec!(5));
        assert_eq!(input.settings.unit, Unit::Millions);
        assert_eq!(input.settings.target_ordinary_income, dec!(50000000));
        assert_eq!(input.settings.max_iterations, 60);
        assert!(input.bundle.sales.items.is_empty());
        assert_eq!(input.settings.working_capital, None);
    }

    #[test]
    fn test_partial_working_capital_terms_use_defaults() {
        let input =
            PlanInput::from_json(r#"{"settings": {"working_capital": {"receivable_days": "60"}}}"#)
                .unwrap();
        let terms = input.settings.working_capital.unwrap();
        assert_eq!(terms.receivable_days, dec!(60));
        assert_eq!(terms.inventory_days, dec!(30));
        assert_eq!(terms.payable_days, dec!(25));
    }

    #[test]
    fn test_invalid_settings_reported() {
        let settings = PlanSettings {
            discount_rate: Some(dec!(-1)),
            max_iterations: 0,
            tolerance: Decimal::ZERO,
            ..PlanSettings::default()
        };
        let mut issues = IssueCollector::new();
        settings.validate(&mut issues);
        assert_eq!(issues.into_issues().len(), 3);
    }
}
