use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::models::{LoanItem, LoanSchedule, RepaymentType};
use crate::types::{Amount, Money};

const MONTHS: Decimal = dec!(12);

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// One month of one loan.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AmortizationEntry {
    pub loan_name: String,
    pub year: u32,
    /// Calendar month within `year` (1-12)
    pub month: u32,
    pub absolute_month: u32,
    pub interest: Money,
    pub principal: Money,
    /// Outstanding balance after this month's principal
    pub balance: Money,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DebtService {
    pub interest: Money,
    pub principal: Money,
    pub total: Money,
}

// ---------------------------------------------------------------------------
// Schedules
// ---------------------------------------------------------------------------

/// Monthly schedule of a single loan from its start month through its term.
pub fn loan_schedule(loan: &LoanItem) -> Vec<AmortizationEntry> {
    let monthly_rate = loan.interest_rate / MONTHS;
    let term = loan.term_months.max(1);
    let level_principal = loan.principal / Decimal::from(term);
    let mut balance = loan.principal;
    let mut entries = Vec::with_capacity(term as usize);

    for period in 1..=term {
        let absolute_month = loan.start_month + period - 1;
        let interest = balance * monthly_rate;
        let scheduled = match loan.repayment_type {
            _ if period == term => balance,
            RepaymentType::EqualPrincipal => level_principal,
            RepaymentType::InterestOnly => Decimal::ZERO,
        };
        let principal = scheduled.min(balance).max(Decimal::ZERO);
        balance -= principal;
        entries.push(AmortizationEntry {
            loan_name: loan.name.clone(),
            year: (absolute_month - 1) / 12 + 1,
            month: (absolute_month - 1) % 12 + 1,
            absolute_month,
            interest,
            principal,
            balance,
        });
    }
    entries
}

/// Every loan's schedule, concatenated in loan order.
pub fn amortization_schedule(loans: &LoanSchedule) -> Vec<AmortizationEntry> {
    let entries: Vec<AmortizationEntry> = loans.loans.iter().flat_map(loan_schedule).collect();
    tracing::debug!(
        loans = loans.loans.len(),
        entries = entries.len(),
        "amortization schedule generated"
    );
    entries
}

/// Year-1 scheduled interest across all loans.
pub fn annual_interest(loans: &LoanSchedule) -> Money {
    amortization_schedule(loans)
        .iter()
        .filter(|e| e.year == 1)
        .map(|e| e.interest)
        .sum()
}

/// Balance remaining after the year-1 schedule, summed across loans.
pub fn outstanding_principal(loans: &LoanSchedule) -> Money {
    loans
        .loans
        .iter()
        .map(|loan| {
            let schedule = loan_schedule(loan);
            let repaid: Decimal = schedule
                .iter()
                .filter(|e| e.year == 1)
                .map(|e| e.principal)
                .sum();
            loan.principal - repaid
        })
        .sum()
}

/// Interest and principal grouped by plan year.
pub fn debt_service_by_year(loans: &LoanSchedule) -> BTreeMap<u32, DebtService> {
    let mut by_year: BTreeMap<u32, DebtService> = BTreeMap::new();
    for entry in amortization_schedule(loans) {
        let slot = by_year.entry(entry.year).or_default();
        slot.interest += entry.interest;
        slot.principal += entry.principal;
        slot.total += entry.interest + entry.principal;
    }
    by_year
}

// ---------------------------------------------------------------------------
// Debt service coverage
// ---------------------------------------------------------------------------

fn coverage(operating_cash_flow: Money, service: Money) -> Amount {
    if operating_cash_flow <= Decimal::ZERO || service <= Decimal::ZERO {
        Amount::NotANumber
    } else {
        Amount::ratio(operating_cash_flow, service)
    }
}

/// DSCR for every year with scheduled debt service, at a constant annual
/// operating cash flow (before interest).
pub fn dscr_series(operating_cash_flow: Money, loans: &LoanSchedule) -> Vec<(u32, Amount)> {
    debt_service_by_year(loans)
        .into_iter()
        .map(|(year, ds)| (year, coverage(operating_cash_flow, ds.total)))
        .collect()
}

/// DSCR of the first year with positive debt service; NaN without debt.
pub fn first_dscr(operating_cash_flow: Money, loans: &LoanSchedule) -> Amount {
    debt_service_by_year(loans)
        .values()
        .find(|ds| ds.total > Decimal::ZERO)
        .map(|ds| coverage(operating_cash_flow, ds.total))
        .unwrap_or(Amount::NotANumber)
}
