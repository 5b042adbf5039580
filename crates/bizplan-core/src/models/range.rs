use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize};
use std::ops::Add;

/// Low / typical / high estimate. Always stored in ascending order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct EstimateRange {
    pub minimum: Decimal,
    pub typical: Decimal,
    pub maximum: Decimal,
}

impl EstimateRange {
    /// Builds a range from three values in any order.
    pub fn new(a: Decimal, b: Decimal, c: Decimal) -> Self {
        let mut values = [a, b, c];
        values.sort();
        Self {
            minimum: values[0],
            typical: values[1],
            maximum: values[2],
        }
    }

    pub fn point(value: Decimal) -> Self {
        Self::new(value, value, value)
    }

    /// Multiplies every bound by `factor`, treating negative factors as zero.
    pub fn scaled(&self, factor: Decimal) -> Self {
        let factor = factor.max(Decimal::ZERO);
        Self::new(
            self.minimum * factor,
            self.typical * factor,
            self.maximum * factor,
        )
    }

    pub fn zero() -> Self {
        Self::point(Decimal::ZERO)
    }
}

impl Add for EstimateRange {
    type Output = EstimateRange;

    fn add(self, rhs: EstimateRange) -> EstimateRange {
        EstimateRange::new(
            self.minimum + rhs.minimum,
            self.typical + rhs.typical,
            self.maximum + rhs.maximum,
        )
    }
}

#[derive(Deserialize)]
struct RawRange {
    minimum: Decimal,
    typical: Decimal,
    maximum: Decimal,
}

impl<'de> Deserialize<'de> for EstimateRange {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = RawRange::deserialize(deserializer)?;
        Ok(EstimateRange::new(raw.minimum, raw.typical, raw.maximum))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_range_orders_its_bounds() {
        let r = EstimateRange::new(dec!(300), dec!(100), dec!(200));
        assert_eq!(r.minimum, dec!(100));
        assert_eq!(r.typical, dec!(200));
        assert_eq!(r.maximum, dec!(300));
    }

    #[test]
    fn test_range_addition_and_scaling() {
        let base = EstimateRange::new(dec!(100), dec!(200), dec!(300));
        let other = EstimateRange::new(dec!(10), dec!(20), dec!(40));
        let combined = base + other;
        assert_eq!(combined, EstimateRange::new(dec!(110), dec!(220), dec!(340)));

        assert_eq!(
            other.scaled(dec!(2)),
            EstimateRange::new(dec!(20), dec!(40), dec!(80))
        );
        assert_eq!(other.scaled(dec!(-1)), EstimateRange::zero());
    }

    #[test]
    fn test_deserialized_range_is_sorted() {
        let r: EstimateRange =
            serde_json::from_str(r#"{"minimum":"300","typical":"100","maximum":"200"}"#).unwrap();
        assert_eq!(r.minimum, dec!(100));
        assert_eq!(r.maximum, dec!(300));
    }
}
