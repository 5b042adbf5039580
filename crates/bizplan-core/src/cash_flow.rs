use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::models::{CapexPlan, IncomeTaxComponents, LoanSchedule, TaxPolicy};
use crate::pl::ResultSnapshot;
use crate::schedules::{
    amortization_schedule, depreciation_schedule, AmortizationEntry, CapexPayment,
};
use crate::time_value::{monthly_rate, npv, payback_months};
use crate::types::{Money, Rate};

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

const MIN_HORIZON_MONTHS: u32 = 12;
const DEFAULT_HORIZON_MONTHS: u32 = 120;
const FALLBACK_DISCOUNT_RATE: Rate = dec!(0.05);
const MONTHS: Decimal = dec!(12);

// ---------------------------------------------------------------------------
// Output structs
// ---------------------------------------------------------------------------

/// Current-year cash flow statement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnnualCashFlow {
    /// Ordinary income + depreciation - income taxes
    pub operating: Money,
    /// Operating cash flow with year-1 loan interest added back
    pub operating_before_interest: Money,
    pub investing: Money,
    /// Year-1 principal repayments (negative)
    pub financing: Money,
    pub net: Money,
    pub net_income: Money,
    pub depreciation: Money,
    pub taxes: IncomeTaxComponents,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonthlyCashFlow {
    pub month: u32,
    pub year: u32,
    /// Operating cash flow before interest
    pub operating: Money,
    pub investing: Money,
    pub financing: Money,
    pub net: Money,
    pub cumulative: Money,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InvestmentEvaluation {
    pub payback_months: Option<Decimal>,
    pub payback_years: Option<Decimal>,
    pub npv: Money,
    /// Annual rate actually used
    pub discount_rate: Rate,
    pub monthly_discount_rate: Option<Rate>,
    /// False when the monthly rate was unusable and NPV is the plain sum
    pub discounted: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CashFlowReport {
    pub annual: AnnualCashFlow,
    pub monthly: Vec<MonthlyCashFlow>,
    pub investment: InvestmentEvaluation,
    pub capex_schedule: Vec<CapexPayment>,
    pub loan_schedule: Vec<AmortizationEntry>,
}

// ---------------------------------------------------------------------------
// Annual statement
// ---------------------------------------------------------------------------

/// Annual operating, investing and financing cash flow of the plan year.
pub fn annual_cash_flow(
    snapshot: &ResultSnapshot,
    capex: &CapexPlan,
    loans: &LoanSchedule,
    tax: &TaxPolicy,
) -> AnnualCashFlow {
    let ord = snapshot.ordinary_income();
    let depreciation = snapshot.depreciation();
    let taxes = tax.income_tax_components(ord);
    let operating = ord + depreciation - taxes.total;

    let year_one: Vec<AmortizationEntry> = amortization_schedule(loans)
        .into_iter()
        .filter(|e| e.year == 1)
        .collect();
    let interest: Money = year_one.iter().map(|e| e.interest).sum();
    let principal: Money = year_one.iter().map(|e| e.principal).sum();

    let investing = -capex.total_investment();
    let financing = -principal;
    AnnualCashFlow {
        operating,
        operating_before_interest: operating + interest,
        investing,
        financing,
        net: operating + investing + financing,
        net_income: ord - taxes.total,
        depreciation,
        taxes,
    }
}

/// `OP - taxes(ORD) + depreciation - total capex`.
pub fn free_cash_flow(snapshot: &ResultSnapshot, capex: &CapexPlan, tax: &TaxPolicy) -> Money {
    snapshot.operating_profit() - tax.effective_tax(snapshot.ordinary_income())
        + snapshot.depreciation()
        - capex.total_investment()
}

// ---------------------------------------------------------------------------
// Monthly projection
// ---------------------------------------------------------------------------

/// Annual rate used for NPV: the explicit rate when given, else the
/// loans' weighted average when positive, else 5%.
pub fn resolve_discount_rate(explicit: Option<Rate>, loans: &LoanSchedule) -> Rate {
    if let Some(rate) = explicit {
        return rate;
    }
    let weighted = loans.weighted_average_rate();
    if weighted > Decimal::ZERO {
        weighted
    } else {
        FALLBACK_DISCOUNT_RATE
    }
}

/// Full cash-flow report: annual statement, monthly projection and
/// investment evaluation.
pub fn generate_cash_flow(
    snapshot: &ResultSnapshot,
    capex: &CapexPlan,
    loans: &LoanSchedule,
    tax: &TaxPolicy,
    discount_rate: Option<Rate>,
) -> CashFlowReport {
    let annual = annual_cash_flow(snapshot, capex, loans, tax);
    let capex_schedule = depreciation_schedule(capex);
    let loan_schedule = amortization_schedule(loans);

    let mut capex_by_month: BTreeMap<u32, Money> = BTreeMap::new();
    for p in &capex_schedule {
        *capex_by_month.entry(p.absolute_month).or_default() += p.amount;
    }
    let mut debt_by_month: BTreeMap<u32, (Money, Money)> = BTreeMap::new();
    for e in &loan_schedule {
        let slot = debt_by_month.entry(e.absolute_month).or_default();
        slot.0 += e.interest;
        slot.1 += e.principal;
    }

    let latest = capex_by_month
        .keys()
        .chain(debt_by_month.keys())
        .copied()
        .max()
        .unwrap_or(0);
    let horizon = MIN_HORIZON_MONTHS.max(latest).max(DEFAULT_HORIZON_MONTHS);

    let baseline = annual.operating / MONTHS;
    let mut monthly = Vec::with_capacity(horizon as usize);
    let mut cumulative = Decimal::ZERO;
    for month in 1..=horizon {
        let (interest, principal) = debt_by_month.get(&month).copied().unwrap_or_default();
        let operating = baseline + interest;
        let investing = -capex_by_month.get(&month).copied().unwrap_or_default();
        let financing = -(interest + principal);
        let net = operating + investing + financing;
        cumulative += net;
        monthly.push(MonthlyCashFlow {
            month,
            year: (month - 1) / 12 + 1,
            operating,
            investing,
            financing,
            net,
            cumulative,
        });
    }

    let investment = evaluate_investment(&monthly, resolve_discount_rate(discount_rate, loans));
    tracing::debug!(
        horizon,
        npv = %investment.npv,
        discounted = investment.discounted,
        "cash flow projected"
    );

    CashFlowReport {
        annual,
        monthly,
        investment,
        capex_schedule,
        loan_schedule,
    }
}

fn evaluate_investment(monthly: &[MonthlyCashFlow], annual_rate: Rate) -> InvestmentEvaluation {
    let flows: Vec<Money> = monthly.iter().map(|m| m.net).collect();
    let payback = payback_months(&flows);
    let plain_sum: Money = flows.iter().sum();

    let monthly_rate = monthly_rate(annual_rate).filter(|r| *r > dec!(-1));
    let discounted = monthly_rate.and_then(|r| npv(r, &flows).ok());
    if discounted.is_none() {
        tracing::warn!(
            annual_rate = %annual_rate,
            "monthly discount rate unusable, NPV is the undiscounted sum"
        );
    }

    InvestmentEvaluation {
        payback_months: payback,
        payback_years: payback.map(|m| m / MONTHS),
        npv: discounted.unwrap_or(plain_sum),
        discount_rate: annual_rate,
        monthly_discount_rate: monthly_rate,
        discounted: discounted.is_some(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{CapexItem, LoanItem, RepaymentType};
    use crate::pl::{compute_plan, LineCode, PlanModel, RateBase};
    use crate::types::Unit;

    fn snapshot() -> ResultSnapshot {
        let mut plan = PlanModel::new(dec!(1000000), dec!(10), Unit::Base);
        plan.set_rate(LineCode::CogsMat, dec!(0.30), RateBase::Sales);
        plan.set_amount(LineCode::OpexH, dec!(200000));
        plan.set_amount(LineCode::OpexDep, dec!(20000));
        compute_plan(&plan, None, None)
    }

    fn loans() -> LoanSchedule {
        LoanSchedule {
            loans: vec![LoanItem {
                name: "Bank".into(),
                principal: dec!(120000),
                interest_rate: dec!(0.06),
                term_months: 12,
                start_month: 1,
                repayment_type: RepaymentType::EqualPrincipal,
            }],
        }
    }

    fn capex() -> CapexPlan {
        CapexPlan {
            items: vec![CapexItem {
                name: "Van".into(),
                amount: dec!(100000),
                start_month: 1,
                useful_life_years: 5,
            }],
        }
    }

    #[test]
    fn test_annual_statement() {
        // ORD 480,000; tax 35% = 168,000
        let cf = annual_cash_flow(&snapshot(), &capex(), &loans(), &TaxPolicy::default());
        assert_eq!(cf.taxes.total, dec!(168000));
        assert_eq!(cf.operating, dec!(332000));
        assert_eq!(cf.operating_before_interest, dec!(335900));
        assert_eq!(cf.investing, dec!(-100000));
        assert_eq!(cf.financing, dec!(-120000));
        assert_eq!(cf.net, dec!(112000));
        assert_eq!(cf.net_income, dec!(312000));
    }

    #[test]
    fn test_monthly_projection_horizon_and_first_month() {
        let report = generate_cash_flow(
            &snapshot(),
            &capex(),
            &loans(),
            &TaxPolicy::default(),
            Some(Decimal::ZERO),
        );
        assert_eq!(report.monthly.len(), 120);
        let first = &report.monthly[0];
        // baseline 332,000 / 12 plus 600 interest added back
        assert_eq!(first.operating, dec!(332000) / dec!(12) + dec!(600));
        assert_eq!(first.investing, dec!(-100000));
        assert_eq!(first.financing, dec!(-10600));
        assert_eq!(report.monthly[119].year, 10);
    }

    #[test]
    fn test_zero_rate_npv_is_sum_of_flows() {
        let report = generate_cash_flow(
            &snapshot(),
            &capex(),
            &loans(),
            &TaxPolicy::default(),
            Some(Decimal::ZERO),
        );
        let sum: Money = report.monthly.iter().map(|m| m.net).sum();
        assert_eq!(report.investment.npv, sum);
        assert!(report.investment.discounted);
        assert_eq!(report.monthly.last().map(|m| m.cumulative), Some(sum));
    }

    #[test]
    fn test_long_loan_extends_horizon() {
        let mut long = loans();
        long.loans[0].term_months = 180;
        let report =
            generate_cash_flow(&snapshot(), &capex(), &long, &TaxPolicy::default(), None);
        assert_eq!(report.monthly.len(), 180);
        assert_eq!(report.investment.discount_rate, dec!(0.06));
    }

    #[test]
    fn test_discount_rate_fallbacks() {
        assert_eq!(resolve_discount_rate(None, &LoanSchedule::default()), dec!(0.05));
        assert_eq!(resolve_discount_rate(Some(dec!(0.08)), &loans()), dec!(0.08));
        assert_eq!(resolve_discount_rate(None, &loans()), dec!(0.06));
    }

    #[test]
    fn test_pathological_rate_skips_discounting() {
        let report = generate_cash_flow(
            &snapshot(),
            &capex(),
            &loans(),
            &TaxPolicy::default(),
            Some(dec!(-1.5)),
        );
        let sum: Money = report.monthly.iter().map(|m| m.net).sum();
        assert!(!report.investment.discounted);
        assert_eq!(report.investment.npv, sum);
    }

    #[test]
    fn test_payback_found() {
        let report =
            generate_cash_flow(&snapshot(), &capex(), &loans(), &TaxPolicy::default(), None);
        let months = report.investment.payback_months.unwrap();
        assert!(months > dec!(3) && months < dec!(12));
        assert_eq!(report.investment.payback_years, Some(months / dec!(12)));
    }

    #[test]
    fn test_free_cash_flow() {
        // 480,000 - 168,000 + 20,000 - 100,000
        let fcf = free_cash_flow(&snapshot(), &capex(), &TaxPolicy::default());
        assert_eq!(fcf, dec!(232000));
    }
}
