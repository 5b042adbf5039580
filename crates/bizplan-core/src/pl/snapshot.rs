use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::pl::codes::{LineCode, ALL_CODES};
use crate::types::Amount;

/// Immutable result of one P&L computation: every line code mapped to
/// an amount. Produced by the solver and only read afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ResultSnapshot {
    amounts: BTreeMap<LineCode, Amount>,
}

impl ResultSnapshot {
    pub(crate) fn from_amounts(mut amounts: BTreeMap<LineCode, Amount>) -> Self {
        for code in ALL_CODES {
            amounts.entry(code).or_insert(Amount::ZERO);
        }
        Self { amounts }
    }

    pub fn get(&self, code: LineCode) -> Amount {
        self.amounts.get(&code).copied().unwrap_or(Amount::ZERO)
    }

    /// Finite value of a line, zero for a sentinel.
    pub fn value(&self, code: LineCode) -> Decimal {
        self.get(code).or_zero()
    }

    pub fn sales(&self) -> Decimal {
        self.value(LineCode::Rev)
    }

    pub fn gross(&self) -> Decimal {
        self.value(LineCode::Gross)
    }

    pub fn operating_profit(&self) -> Decimal {
        self.value(LineCode::Op)
    }

    pub fn ordinary_income(&self) -> Decimal {
        self.value(LineCode::Ord)
    }

    pub fn depreciation(&self) -> Decimal {
        self.value(LineCode::OpexDep)
    }

    pub fn break_even_sales(&self) -> Amount {
        self.get(LineCode::BeSales)
    }

    pub fn iter(&self) -> impl Iterator<Item = (LineCode, Amount)> + '_ {
        self.amounts.iter().map(|(c, a)| (*c, *a))
    }

    /// Lines whose value is a sentinel.
    pub fn sentinel_lines(&self) -> Vec<LineCode> {
        self.iter()
            .filter(|(_, a)| a.is_sentinel())
            .map(|(c, _)| c)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_missing_lines_default_to_zero() {
        let mut amounts = BTreeMap::new();
        amounts.insert(LineCode::Rev, Amount::Finite(dec!(10)));
        amounts.insert(LineCode::BeSales, Amount::Infinite);
        let snap = ResultSnapshot::from_amounts(amounts);
        assert_eq!(snap.iter().count(), 26);
        assert_eq!(snap.sales(), dec!(10));
        assert_eq!(snap.get(LineCode::Ord), Amount::ZERO);
        assert_eq!(snap.sentinel_lines(), vec![LineCode::BeSales]);
    }

    #[test]
    fn test_snapshot_round_trips_through_json() {
        let mut amounts = BTreeMap::new();
        amounts.insert(LineCode::Rev, Amount::Finite(dec!(1000000.25)));
        amounts.insert(LineCode::Ldr, Amount::NotANumber);
        let snap = ResultSnapshot::from_amounts(amounts);
        let json = serde_json::to_string(&snap).unwrap();
        assert!(json.contains("\"REV\":\"1000000.25\""));
        assert!(json.contains("\"LDR\":\"NaN\""));
        let back: ResultSnapshot = serde_json::from_str(&json).unwrap();
        assert_eq!(back, snap);
    }
}
