use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Every line of the profit-and-loss snapshot.
///
/// Input codes carry a computation rule in the line-item plan; derived
/// codes are produced by the solver only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LineCode {
    Rev,
    CogsMat,
    CogsLbr,
    CogsOutSrc,
    CogsOutCon,
    CogsOth,
    CogsTtl,
    Gross,
    OpexH,
    OpexAd,
    OpexUtil,
    OpexOth,
    OpexDep,
    OpexTtl,
    Op,
    NoiMisc,
    NoiGrant,
    NoiOth,
    NoeInt,
    NoeOth,
    Ord,
    BeSales,
    PcSales,
    PcGross,
    PcOrd,
    Ldr,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LineGroup {
    Revenue,
    CostOfGoods,
    GrossProfit,
    OperatingExpense,
    Profit,
    NonOperating,
    Kpi,
}

pub const COGS_CODES: [LineCode; 5] = [
    LineCode::CogsMat,
    LineCode::CogsLbr,
    LineCode::CogsOutSrc,
    LineCode::CogsOutCon,
    LineCode::CogsOth,
];

pub const OPEX_CODES: [LineCode; 5] = [
    LineCode::OpexH,
    LineCode::OpexAd,
    LineCode::OpexUtil,
    LineCode::OpexOth,
    LineCode::OpexDep,
];

pub const NOI_CODES: [LineCode; 3] = [LineCode::NoiMisc, LineCode::NoiGrant, LineCode::NoiOth];

pub const NOE_CODES: [LineCode; 2] = [LineCode::NoeInt, LineCode::NoeOth];

/// Snapshot order.
pub const ALL_CODES: [LineCode; 26] = [
    LineCode::Rev,
    LineCode::CogsMat,
    LineCode::CogsLbr,
    LineCode::CogsOutSrc,
    LineCode::CogsOutCon,
    LineCode::CogsOth,
    LineCode::CogsTtl,
    LineCode::Gross,
    LineCode::OpexH,
    LineCode::OpexAd,
    LineCode::OpexUtil,
    LineCode::OpexOth,
    LineCode::OpexDep,
    LineCode::OpexTtl,
    LineCode::Op,
    LineCode::NoiMisc,
    LineCode::NoiGrant,
    LineCode::NoiOth,
    LineCode::NoeInt,
    LineCode::NoeOth,
    LineCode::Ord,
    LineCode::BeSales,
    LineCode::PcSales,
    LineCode::PcGross,
    LineCode::PcOrd,
    LineCode::Ldr,
];

impl LineCode {
    pub fn as_str(self) -> &'static str {
        match self {
            LineCode::Rev => "REV",
            LineCode::CogsMat => "COGS_MAT",
            LineCode::CogsLbr => "COGS_LBR",
            LineCode::CogsOutSrc => "COGS_OUT_SRC",
            LineCode::CogsOutCon => "COGS_OUT_CON",
            LineCode::CogsOth => "COGS_OTH",
            LineCode::CogsTtl => "COGS_TTL",
            LineCode::Gross => "GROSS",
            LineCode::OpexH => "OPEX_H",
            LineCode::OpexAd => "OPEX_AD",
            LineCode::OpexUtil => "OPEX_UTIL",
            LineCode::OpexOth => "OPEX_OTH",
            LineCode::OpexDep => "OPEX_DEP",
            LineCode::OpexTtl => "OPEX_TTL",
            LineCode::Op => "OP",
            LineCode::NoiMisc => "NOI_MISC",
            LineCode::NoiGrant => "NOI_GRANT",
            LineCode::NoiOth => "NOI_OTH",
            LineCode::NoeInt => "NOE_INT",
            LineCode::NoeOth => "NOE_OTH",
            LineCode::Ord => "ORD",
            LineCode::BeSales => "BE_SALES",
            LineCode::PcSales => "PC_SALES",
            LineCode::PcGross => "PC_GROSS",
            LineCode::PcOrd => "PC_ORD",
            LineCode::Ldr => "LDR",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            LineCode::Rev => "Revenue",
            LineCode::CogsMat => "Purchases | materials",
            LineCode::CogsLbr => "Purchases | external labour",
            LineCode::CogsOutSrc => "Purchases | dedicated subcontracting",
            LineCode::CogsOutCon => "Purchases | contracted outsourcing",
            LineCode::CogsOth => "Purchases | other",
            LineCode::CogsTtl => "Purchases | total",
            LineCode::Gross => "Gross profit (value added)",
            LineCode::OpexH => "Internal costs | personnel",
            LineCode::OpexAd => "Internal costs | advertising",
            LineCode::OpexUtil => "Internal costs | utilities",
            LineCode::OpexOth => "Internal costs | other SG&A",
            LineCode::OpexDep => "Internal costs | depreciation",
            LineCode::OpexTtl => "Internal costs | total",
            LineCode::Op => "Operating profit",
            LineCode::NoiMisc => "Non-operating income | miscellaneous",
            LineCode::NoiGrant => "Non-operating income | grants",
            LineCode::NoiOth => "Non-operating income | other",
            LineCode::NoeInt => "Non-operating expense | interest",
            LineCode::NoeOth => "Non-operating expense | other",
            LineCode::Ord => "Ordinary income",
            LineCode::BeSales => "Break-even sales",
            LineCode::PcSales => "Revenue per head",
            LineCode::PcGross => "Gross profit per head",
            LineCode::PcOrd => "Ordinary income per head",
            LineCode::Ldr => "Labour distribution ratio",
        }
    }

    pub fn group(self) -> LineGroup {
        match self {
            LineCode::Rev => LineGroup::Revenue,
            c if COGS_CODES.contains(&c) || c == LineCode::CogsTtl => LineGroup::CostOfGoods,
            LineCode::Gross => LineGroup::GrossProfit,
            c if OPEX_CODES.contains(&c) || c == LineCode::OpexTtl => LineGroup::OperatingExpense,
            LineCode::Op | LineCode::Ord => LineGroup::Profit,
            c if NOI_CODES.contains(&c) || NOE_CODES.contains(&c) => LineGroup::NonOperating,
            _ => LineGroup::Kpi,
        }
    }

    /// Codes that can carry a computation rule.
    pub fn is_input(self) -> bool {
        COGS_CODES.contains(&self)
            || OPEX_CODES.contains(&self)
            || NOI_CODES.contains(&self)
            || NOE_CODES.contains(&self)
    }
}

impl fmt::Display for LineCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownLineCode(pub String);

impl fmt::Display for UnknownLineCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown line code '{}'", self.0)
    }
}

impl std::error::Error for UnknownLineCode {}

impl FromStr for LineCode {
    type Err = UnknownLineCode;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ALL_CODES
            .iter()
            .copied()
            .find(|code| code.as_str() == s)
            .ok_or_else(|| UnknownLineCode(s.to_string()))
    }
}
