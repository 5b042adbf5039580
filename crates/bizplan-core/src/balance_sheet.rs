use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::models::{CapexPlan, LoanSchedule, TaxPolicy};
use crate::pl::{LineCode, ResultSnapshot};
use crate::schedules::outstanding_principal;
use crate::types::{Amount, Money};
use crate::validation::IssueCollector;

const DAYS_PER_YEAR: Decimal = dec!(365);

// ---------------------------------------------------------------------------
// Input
// ---------------------------------------------------------------------------

/// Trade working-capital terms, in days of annual sales or cost of goods.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkingCapital {
    /// Days of sales outstanding (0-365)
    pub receivable_days: Decimal,
    /// Days of cost of goods held as stock (0-365)
    pub inventory_days: Decimal,
    /// Days of cost of goods owed to suppliers (0-365)
    pub payable_days: Decimal,
}

impl Default for WorkingCapital {
    fn default() -> Self {
        Self {
            receivable_days: dec!(45),
            inventory_days: dec!(30),
            payable_days: dec!(25),
        }
    }
}

impl WorkingCapital {
    pub fn validate(&self, path: &str, issues: &mut IssueCollector) {
        let days = [
            ("receivable_days", self.receivable_days),
            ("inventory_days", self.inventory_days),
            ("payable_days", self.payable_days),
        ];
        for (name, value) in days {
            issues.check_range(&format!("{path}.{name}"), value, Decimal::ZERO, DAYS_PER_YEAR);
        }
    }
}

// ---------------------------------------------------------------------------
// Output structs
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Assets {
    /// Retained earnings of the year, floored at zero
    pub cash: Money,
    pub receivables: Money,
    pub inventory: Money,
    pub net_fixed_assets: Money,
    pub total: Money,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LiabilitiesAndEquity {
    pub accounts_payable: Money,
    pub interest_bearing_debt: Money,
    /// Plug: total assets minus payables and debt
    pub equity: Money,
    pub total: Money,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BalanceSheetMetrics {
    pub net_income: Money,
    pub equity_ratio: Amount,
    pub roe: Amount,
    /// Receivables plus inventory less payables
    pub working_capital: Money,
    /// Terms used, absent when working capital was not modelled
    #[serde(skip_serializing_if = "Option::is_none")]
    pub working_capital_terms: Option<WorkingCapital>,
}

/// Single-period balance sheet derived from the plan year.
///
/// This is an approximation, not a ledger: equity is whatever makes the
/// two sides equal, so the sheet balances by construction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BalanceSheetSnapshot {
    pub assets: Assets,
    pub liabilities: LiabilitiesAndEquity,
    pub metrics: BalanceSheetMetrics,
}

impl BalanceSheetSnapshot {
    pub fn is_balanced(&self) -> bool {
        self.assets.total == self.liabilities.total
    }
}

// ---------------------------------------------------------------------------
// Estimator
// ---------------------------------------------------------------------------

/// `days` worth of an annual flow in whole cents; zero when the flow is
/// not positive.
fn days_of(annual: Money, days: Decimal) -> Money {
    if annual > Decimal::ZERO {
        (annual * days / DAYS_PER_YEAR).round_dp(2)
    } else {
        Decimal::ZERO
    }
}

/// Balance sheet at the end of the plan year. Without `working_capital`
/// the trade items are zero and the sheet holds only cash, fixed assets,
/// debt and equity.
pub fn generate_balance_sheet(
    snapshot: &ResultSnapshot,
    capex: &CapexPlan,
    loans: &LoanSchedule,
    tax: &TaxPolicy,
    working_capital: Option<&WorkingCapital>,
) -> BalanceSheetSnapshot {
    let ord = snapshot.ordinary_income();
    let net_income = ord - tax.effective_tax(ord);

    let cash = net_income.max(Decimal::ZERO);
    let net_fixed_assets =
        (capex.total_investment() - capex.annual_depreciation()).max(Decimal::ZERO);

    let (receivables, inventory, accounts_payable) = match working_capital {
        Some(terms) => {
            let cogs = snapshot.value(LineCode::CogsTtl);
            (
                days_of(snapshot.sales(), terms.receivable_days),
                days_of(cogs, terms.inventory_days),
                days_of(cogs, terms.payable_days),
            )
        }
        None => (Decimal::ZERO, Decimal::ZERO, Decimal::ZERO),
    };
    let total_assets = cash + receivables + inventory + net_fixed_assets;

    let debt = outstanding_principal(loans);
    let equity = total_assets - accounts_payable - debt;

    let equity_ratio = if total_assets > Decimal::ZERO {
        Amount::ratio(equity, total_assets)
    } else {
        Amount::NotANumber
    };
    let roe = if equity > Decimal::ZERO {
        Amount::ratio(net_income, equity)
    } else {
        Amount::NotANumber
    };

    BalanceSheetSnapshot {
        assets: Assets {
            cash,
            receivables,
            inventory,
            net_fixed_assets,
            total: total_assets,
        },
        liabilities: LiabilitiesAndEquity {
            accounts_payable,
            interest_bearing_debt: debt,
            equity,
            total: accounts_payable + debt + equity,
        },
        metrics: BalanceSheetMetrics {
            net_income,
            equity_ratio,
            roe,
            working_capital: receivables + inventory - accounts_payable,
            working_capital_terms: working_capital.copied(),
        },
    }
}
