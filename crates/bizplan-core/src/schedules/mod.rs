pub mod amortization;
pub mod depreciation;

pub use amortization::{
    amortization_schedule, annual_interest, debt_service_by_year, dscr_series, first_dscr,
    loan_schedule, outstanding_principal, AmortizationEntry, DebtService,
};
pub use depreciation::{depreciation_schedule, depreciation_summary, CapexPayment, DepreciationSummary};
