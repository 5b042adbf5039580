use rust_decimal::Decimal;
use serde::de::{self, Deserializer, Visitor};
use serde::{Deserialize, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// All monetary values. Wraps Decimal to prevent accidental f64 usage.
pub type Money = Decimal;

/// Rates expressed as decimals (0.05 = 5%). Never as percentages.
pub type Rate = Decimal;

/// An amount in a result snapshot.
///
/// Degenerate arithmetic (zero contribution ratio, non-positive gross
/// profit) is carried as an explicit sentinel instead of an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Amount {
    Finite(Decimal),
    Infinite,
    NotANumber,
}

impl Amount {
    pub const ZERO: Amount = Amount::Finite(Decimal::ZERO);

    pub fn finite(self) -> Option<Decimal> {
        match self {
            Amount::Finite(v) => Some(v),
            _ => None,
        }
    }

    /// Finite value, or zero for a sentinel.
    pub fn or_zero(self) -> Decimal {
        self.finite().unwrap_or(Decimal::ZERO)
    }

    pub fn is_sentinel(self) -> bool {
        !matches!(self, Amount::Finite(_))
    }

    /// `numerator / denominator`, NaN when the denominator is zero and
    /// infinite when the quotient leaves the representable range.
    pub fn ratio(numerator: Decimal, denominator: Decimal) -> Amount {
        if denominator.is_zero() {
            return Amount::NotANumber;
        }
        match numerator.checked_div(denominator) {
            Some(q) => Amount::Finite(q),
            None => Amount::Infinite,
        }
    }

    pub fn round_dp(self, dp: u32) -> Amount {
        match self {
            Amount::Finite(v) => Amount::Finite(v.round_dp(dp)),
            other => other,
        }
    }
}

impl From<Decimal> for Amount {
    fn from(value: Decimal) -> Self {
        Amount::Finite(value)
    }
}

impl Default for Amount {
    fn default() -> Self {
        Amount::ZERO
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Amount::Finite(v) => write!(f, "{v}"),
            Amount::Infinite => f.write_str("Infinity"),
            Amount::NotANumber => f.write_str("NaN"),
        }
    }
}

impl FromStr for Amount {
    type Err = rust_decimal::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "Infinity" | "inf" | "+Infinity" => Ok(Amount::Infinite),
            "NaN" | "nan" => Ok(Amount::NotANumber),
            other => Decimal::from_str(other).map(Amount::Finite),
        }
    }
}

impl Serialize for Amount {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

struct AmountVisitor;

impl Visitor<'_> for AmountVisitor {
    type Value = Amount;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a decimal string, \"Infinity\" or \"NaN\"")
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<Amount, E> {
        Amount::from_str(v).map_err(E::custom)
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<Amount, E> {
        Ok(Amount::Finite(Decimal::from(v)))
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<Amount, E> {
        Ok(Amount::Finite(Decimal::from(v)))
    }

    fn visit_f64<E: de::Error>(self, v: f64) -> Result<Amount, E> {
        if v.is_nan() {
            return Ok(Amount::NotANumber);
        }
        if v.is_infinite() {
            return Ok(Amount::Infinite);
        }
        Decimal::from_str(&v.to_string())
            .map(Amount::Finite)
            .map_err(E::custom)
    }
}

impl<'de> Deserialize<'de> for Amount {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(AmountVisitor)
    }
}

/// Display unit attached to a plan.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Unit {
    Base,
    Thousands,
    #[default]
    Millions,
}

impl Unit {
    pub fn factor(self) -> Decimal {
        match self {
            Unit::Base => Decimal::ONE,
            Unit::Thousands => Decimal::from(1_000),
            Unit::Millions => Decimal::from(1_000_000),
        }
    }

    pub fn suffix(self) -> &'static str {
        match self {
            Unit::Base => "",
            Unit::Thousands => "k",
            Unit::Millions => "M",
        }
    }
}

/// Standard computation output envelope
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComputationOutput<T: Serialize> {
    pub result: T,
    pub methodology: String,
    pub assumptions: serde_json::Value,
    pub warnings: Vec<String>,
    pub metadata: ComputationMetadata,
}

/// Metadata for every computation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComputationMetadata {
    pub version: String,
    pub computation_time_us: u64,
    pub precision: String,
}

/// Helper to wrap computation results with metadata
pub fn with_metadata<T: Serialize>(
    methodology: &str,
    assumptions: &impl Serialize,
    warnings: Vec<String>,
    elapsed_us: u64,
    result: T,
) -> ComputationOutput<T> {
    ComputationOutput {
        result,
        methodology: methodology.to_string(),
        assumptions: serde_json::to_value(assumptions).unwrap_or_default(),
        warnings,
        metadata: ComputationMetadata {
            version: env!("CARGO_PKG_VERSION").to_string(),
            computation_time_us: elapsed_us,
            precision: "rust_decimal_128bit".to_string(),
        },
    }
}
