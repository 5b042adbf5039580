use rust_decimal::{Decimal, RoundingStrategy};
use rust_decimal_macros::dec;

use crate::types::{Amount, Unit};

/// Rendered in place of an undefined amount or ratio.
pub const UNDEFINED: &str = "—";
const NO_CHANGE: &str = "±0";

/// Half-up rounding to `dp` places with exactly `dp` digits shown.
fn fixed(value: Decimal, dp: u32) -> String {
    let mut rounded = value.round_dp_with_strategy(dp, RoundingStrategy::MidpointAwayFromZero);
    rounded.rescale(dp);
    rounded.to_string()
}

fn group_thousands(text: &str) -> String {
    let (sign, digits) = match text.strip_prefix('-') {
        Some(rest) => ("-", rest),
        None => ("", text),
    };
    let (int_part, frac_part) = match digits.split_once('.') {
        Some((i, f)) => (i, Some(f)),
        None => (digits, None),
    };

    let mut grouped = String::with_capacity(int_part.len() + int_part.len() / 3);
    for (i, ch) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    match frac_part {
        Some(f) => format!("{sign}{grouped}.{f}"),
        None => format!("{sign}{grouped}"),
    }
}

/// Amount in display units: whole units with separators, two decimals
/// when the scaled magnitude is below one.
pub fn format_money(amount: Amount, unit: Unit) -> String {
    let Some(value) = amount.finite() else {
        return UNDEFINED.to_string();
    };
    let scaled = value / unit.factor();
    let dp = if scaled.abs() >= Decimal::ONE { 0 } else { 2 };
    let mut text = group_thousands(&fixed(scaled, dp));
    if text == "-0.00" {
        text = "0.00".to_string();
    }
    format!("{text}{}", unit.suffix())
}

/// Ratio as a one-decimal percentage (0.125 -> "12.5%").
pub fn format_ratio(ratio: Amount) -> String {
    match ratio.finite() {
        Some(r) => format!("{}%", fixed(r * dec!(100), 1)),
        None => UNDEFINED.to_string(),
    }
}

/// Signed amount change, `±0` for no change or an undefined delta.
pub fn format_delta(delta: Amount, unit: Unit) -> String {
    match delta.finite() {
        Some(d) if !d.is_zero() => {
            let sign = if d > Decimal::ZERO { '+' } else { '-' };
            format!("{sign}{}", format_money(Amount::Finite(d.abs()), unit))
        }
        _ => NO_CHANGE.to_string(),
    }
}

/// Signed ratio change in percentage points (0.015 -> "+1.5pt").
pub fn format_ratio_delta(delta: Amount) -> String {
    match delta.finite() {
        Some(d) if !d.is_zero() => {
            let sign = if d > Decimal::ZERO { "+" } else { "" };
            format!("{sign}{}pt", fixed(d * dec!(100), 1))
        }
        _ => NO_CHANGE.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_money_scaling_and_separators() {
        let amount = Amount::Finite(dec!(1234567890));
        assert_eq!(format_money(amount, Unit::Base), "1,234,567,890");
        assert_eq!(format_money(amount, Unit::Thousands), "1,234,568k");
        assert_eq!(format_money(amount, Unit::Millions), "1,235M");
        assert_eq!(format_money(Amount::Finite(dec!(-2500000)), Unit::Millions), "-3M");
    }

    #[test]
    fn test_money_below_one_unit() {
        assert_eq!(format_money(Amount::Finite(dec!(125000)), Unit::Millions), "0.13M");
        assert_eq!(format_money(Amount::ZERO, Unit::Base), "0.00");
    }

    #[test]
    fn test_sentinels_render_as_dash() {
        assert_eq!(format_money(Amount::Infinite, Unit::Millions), UNDEFINED);
        assert_eq!(format_ratio(Amount::NotANumber), UNDEFINED);
        assert_eq!(format_delta(Amount::NotANumber, Unit::Base), "±0");
        assert_eq!(format_ratio_delta(Amount::Infinite), "±0");
    }

    #[test]
    fn test_ratios_and_deltas() {
        assert_eq!(format_ratio(Amount::Finite(dec!(0.125))), "12.5%");
        assert_eq!(format_ratio(Amount::Finite(dec!(0.3))), "30.0%");
        assert_eq!(format_delta(Amount::Finite(dec!(-3000000)), Unit::Millions), "-3M");
        assert_eq!(format_delta(Amount::Finite(dec!(1500)), Unit::Thousands), "+2k");
        assert_eq!(format_delta(Amount::ZERO, Unit::Base), "±0");
        assert_eq!(format_ratio_delta(Amount::Finite(dec!(0.015))), "+1.5pt");
        assert_eq!(format_ratio_delta(Amount::Finite(dec!(-0.02))), "-2.0pt");
    }
}
