use rust_decimal::Decimal;
use rust_decimal::MathematicalOps;
use rust_decimal_macros::dec;

use crate::error::PlanError;
use crate::types::{Money, Rate};
use crate::PlanResult;

const MONTHS_PER_YEAR: Decimal = dec!(12);

/// Monthly rate equivalent to an annual rate: `(1 + annual)^(1/12) - 1`.
///
/// `None` when the conversion is undefined (`1 + annual <= 0`) or overflows.
pub fn monthly_rate(annual: Rate) -> Option<Rate> {
    if annual.is_zero() {
        return Some(Decimal::ZERO);
    }
    let base = Decimal::ONE + annual;
    if base <= Decimal::ZERO {
        return None;
    }
    base.checked_powd(Decimal::ONE / MONTHS_PER_YEAR)
        .map(|factor| factor - Decimal::ONE)
}

/// Net present value of cash flows for periods 1..=n, each discounted by
/// `(1 + rate)^period`.
pub fn npv(rate: Rate, cash_flows: &[Money]) -> PlanResult<Money> {
    if rate <= dec!(-1) {
        return Err(PlanError::InvalidInput {
            field: "rate".into(),
            reason: "Discount rate must be greater than -100%".into(),
        });
    }

    let mut result = Decimal::ZERO;
    let one_plus_r = Decimal::ONE + rate;
    let mut discount = Decimal::ONE;

    let out_of_range = || PlanError::InvalidInput {
        field: "rate".into(),
        reason: "Discounted cash flow is outside the representable range".into(),
    };
    for cf in cash_flows {
        discount = discount.checked_mul(one_plus_r).ok_or_else(out_of_range)?;
        let present = cf.checked_div(discount).ok_or_else(out_of_range)?;
        result = result.checked_add(present).ok_or_else(out_of_range)?;
    }

    Ok(result)
}

/// Payback in months, interpolated within the month the cumulative
/// balance first turns non-negative. `None` if it never does.
pub fn payback_months(cash_flows: &[Money]) -> Option<Decimal> {
    let mut cumulative = Decimal::ZERO;
    for (i, cf) in cash_flows.iter().enumerate() {
        let previous = cumulative;
        cumulative += cf;
        if cumulative >= Decimal::ZERO {
            let fraction = if *cf > Decimal::ZERO {
                (-previous / cf).clamp(Decimal::ZERO, Decimal::ONE)
            } else {
                Decimal::ONE
            };
            return Some(Decimal::from(i as u64) + fraction);
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_monthly_rate_round_trips_annual() {
        let m = monthly_rate(dec!(0.126825030131969720661201)).unwrap();
        assert!((m - dec!(0.01)).abs() < dec!(0.000001));
        assert_eq!(monthly_rate(Decimal::ZERO), Some(Decimal::ZERO));
        assert_eq!(monthly_rate(dec!(-1)), None);
    }

    #[test]
    fn test_npv_zero_rate_is_plain_sum() {
        let flows = [dec!(-100), dec!(30), dec!(40), dec!(50)];
        assert_eq!(npv(Decimal::ZERO, &flows).unwrap(), dec!(20));
    }

    #[test]
    fn test_npv_discounts_from_period_one() {
        let flows = [dec!(110), dec!(121)];
        assert_eq!(npv(dec!(0.1), &flows).unwrap(), dec!(200));
        assert!(npv(dec!(-1), &flows).is_err());
    }

    #[test]
    fn test_npv_steep_negative_rate_is_an_error() {
        // 0.56^240 leaves the discount factor far below Decimal precision
        let monthly = monthly_rate(dec!(-0.999)).unwrap();
        let flows = vec![dec!(-50000); 240];
        assert!(npv(monthly, &flows).is_err());
    }

    #[test]
    fn test_payback_interpolates() {
        // cumulative: -100, -60, 0
        let flows = [dec!(-100), dec!(40), dec!(60)];
        assert_eq!(payback_months(&flows), Some(dec!(3)));
        // cumulative: -100, -20, 60; a quarter of the third month covers the gap
        let flows = [dec!(-100), dec!(80), dec!(80)];
        assert_eq!(payback_months(&flows), Some(dec!(2.25)));
        assert_eq!(payback_months(&[dec!(-1), dec!(-1)]), None);
    }

    #[test]
    fn test_payback_immediate_positive_month() {
        assert_eq!(payback_months(&[dec!(10), dec!(10)]), Some(Decimal::ZERO));
    }
}
