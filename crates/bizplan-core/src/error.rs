use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A single rejected input field, addressed by a dotted path
/// such as `loans.loans.0.principal`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationIssue {
    pub field: String,
    pub message: String,
}

impl ValidationIssue {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

impl std::fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] {}", self.field, self.message)
    }
}

#[derive(Debug, Error)]
pub enum PlanError {
    #[error("Invalid input for {field}: {reason}")]
    InvalidInput { field: String, reason: String },

    #[error("Validation failed:\n{}", collect_error_messages(.0))]
    Validation(Vec<ValidationIssue>),

    #[error("Insufficient data: {0}")]
    InsufficientData(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<serde_json::Error> for PlanError {
    fn from(e: serde_json::Error) -> Self {
        PlanError::SerializationError(e.to_string())
    }
}

/// One `[field] message` line per issue.
pub fn collect_error_messages(issues: &[ValidationIssue]) -> String {
    issues
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_error_lists_every_issue() {
        let err = PlanError::Validation(vec![
            ValidationIssue::new("costs.variable_ratios.COGS_MAT", "ratio must lie in [0, 1]"),
            ValidationIssue::new("tax.corporate_tax_rate", "rate must lie in [0, 0.55]"),
        ]);
        let text = err.to_string();
        assert!(text.contains("[costs.variable_ratios.COGS_MAT] ratio must lie in [0, 1]"));
        assert!(text.contains("[tax.corporate_tax_rate]"));
    }
}
