pub mod error;
pub mod time_value;
pub mod types;
pub mod validation;

pub mod models;
pub mod pl;
pub mod schedules;

pub mod balance_sheet;
pub mod batch;
pub mod cash_flow;

pub mod config;
pub mod formatting;
pub mod report;
pub mod store;

#[cfg(feature = "scenarios")]
pub mod scenarios;

pub use config::{PlanInput, PlanSettings};
pub use error::{PlanError, ValidationIssue};
pub use models::FinanceBundle;
pub use types::*;

/// Standard result type for all plan operations
pub type PlanResult<T> = Result<T, PlanError>;
