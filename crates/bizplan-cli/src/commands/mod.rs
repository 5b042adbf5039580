pub mod plan;
pub mod scenarios;
pub mod statements;
pub mod store;

use clap::{Args, ValueEnum};
use rust_decimal::Decimal;

use bizplan_core::{PlanInput, Unit};

use crate::input;

/// Plan document location plus settings overrides shared by every command.
#[derive(Args, Debug, Clone)]
#[command(allow_hyphen_values = true)]
pub struct PlanArgs {
    /// Path to a JSON or YAML plan document (stdin when omitted)
    #[arg(long)]
    pub input: Option<String>,

    /// Full-time-equivalent headcount
    #[arg(long)]
    pub fte: Option<Decimal>,

    /// Display unit for formatted amounts
    #[arg(long, value_enum)]
    pub unit: Option<UnitArg>,

    /// Annual discount rate for NPV (e.g. 0.05)
    #[arg(long)]
    pub discount_rate: Option<Decimal>,

    /// Target ordinary income for the sales search
    #[arg(long)]
    pub target: Option<Decimal>,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum UnitArg {
    Base,
    Thousands,
    Millions,
}

impl From<UnitArg> for Unit {
    fn from(arg: UnitArg) -> Self {
        match arg {
            UnitArg::Base => Unit::Base,
            UnitArg::Thousands => Unit::Thousands,
            UnitArg::Millions => Unit::Millions,
        }
    }
}

impl PlanArgs {
    /// Load the document and apply command-line overrides, without validating.
    pub fn load_unchecked(&self) -> Result<PlanInput, Box<dyn std::error::Error>> {
        let mut doc = input::load_plan_input(self.input.as_deref())?;
        let settings = &mut doc.settings;
        if let Some(fte) = self.fte {
            settings.fte = fte;
        }
        if let Some(unit) = self.unit {
            settings.unit = unit.into();
        }
        if let Some(rate) = self.discount_rate {
            settings.discount_rate = Some(rate);
        }
        if let Some(target) = self.target {
            settings.target_ordinary_income = target;
        }
        Ok(doc)
    }

    /// Load, override and validate; every issue is reported at once.
    pub fn load(&self) -> Result<PlanInput, Box<dyn std::error::Error>> {
        let doc = self.load_unchecked()?;
        doc.validate()?;
        Ok(doc)
    }
}
