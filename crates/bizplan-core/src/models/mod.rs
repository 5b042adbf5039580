pub mod capex;
pub mod costs;
pub mod loans;
pub mod range;
pub mod sales;
pub mod tax;

use serde::{Deserialize, Serialize};

pub use capex::{CapexItem, CapexPlan};
pub use costs::{CostPlan, RangeTotals};
pub use loans::{LoanItem, LoanSchedule, RepaymentType};
pub use range::EstimateRange;
pub use sales::{AssumptionSummary, MonthlySeries, SalesItem, SalesPlan, MONTHS_PER_YEAR};
pub use tax::{ConsumptionTaxBalance, IncomeTaxComponents, TaxPolicy};

/// The five input records of a plan, validated together.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FinanceBundle {
    #[serde(default)]
    pub sales: SalesPlan,
    #[serde(default)]
    pub costs: CostPlan,
    #[serde(default)]
    pub capex: CapexPlan,
    #[serde(default)]
    pub loans: LoanSchedule,
    #[serde(default)]
    pub tax: TaxPolicy,
}
