use rust_decimal::Decimal;

use crate::error::{PlanError, ValidationIssue};
use crate::models::FinanceBundle;
use crate::PlanResult;

/// Collects issues for one input record under a dotted path prefix.
#[derive(Debug, Default)]
pub struct IssueCollector {
    issues: Vec<ValidationIssue>,
}

impl IssueCollector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.issues.push(ValidationIssue::new(field, message));
    }

    pub fn check_range(&mut self, field: &str, value: Decimal, min: Decimal, max: Decimal) {
        if value < min || value > max {
            self.push(
                field,
                format!("value must lie in [{min}, {max}], got {value}"),
            );
        }
    }

    pub fn check_positive(&mut self, field: &str, value: Decimal) {
        if value <= Decimal::ZERO {
            self.push(field, format!("value must be positive, got {value}"));
        }
    }

    pub fn check_non_negative(&mut self, field: &str, value: Decimal) {
        if value < Decimal::ZERO {
            self.push(field, format!("value must be non-negative, got {value}"));
        }
    }

    pub fn check_int_range(&mut self, field: &str, value: u32, min: u32, max: u32) {
        if value < min || value > max {
            self.push(
                field,
                format!("value must lie in [{min}, {max}], got {value}"),
            );
        }
    }

    pub fn extend(&mut self, other: IssueCollector) {
        self.issues.extend(other.issues);
    }

    pub fn is_empty(&self) -> bool {
        self.issues.is_empty()
    }

    pub fn into_issues(self) -> Vec<ValidationIssue> {
        self.issues
    }

    /// `Ok(())` when nothing was collected, otherwise a validation error.
    pub fn finish(self) -> PlanResult<()> {
        if self.issues.is_empty() {
            Ok(())
        } else {
            Err(PlanError::Validation(self.issues))
        }
    }
}

/// Issues from all five input records.
pub fn bundle_issues(bundle: &FinanceBundle) -> IssueCollector {
    let mut issues = IssueCollector::new();
    issues.extend(bundle.sales.validate());
    issues.extend(bundle.costs.validate());
    issues.extend(bundle.capex.validate());
    issues.extend(bundle.loans.validate());
    issues.extend(bundle.tax.validate());
    issues
}

/// Validate all five input records, reporting every issue at once.
pub fn validate_bundle(bundle: &FinanceBundle) -> PlanResult<()> {
    let issues = bundle_issues(bundle);
    if !issues.is_empty() {
        tracing::warn!(issues = issues.issues.len(), "plan input rejected");
    }
    issues.finish()
}
