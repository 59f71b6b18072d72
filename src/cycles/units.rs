use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Unit for accumulated charge
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ChargeUnit {
    /// Ampere-hour
    #[serde(rename = "Ah")]
    AmpereHour,
    /// Milliampere-hour
    #[default]
    #[serde(rename = "mAh")]
    MilliampereHour,
    /// Coulomb (A·s)
    #[serde(rename = "C")]
    Coulomb,
}

impl ChargeUnit {
    /// Convert a charge in coulombs to this unit
    pub fn from_coulombs(self, coulombs: f64) -> f64 {
        match self {
            Self::AmpereHour => coulombs / 3600.0,
            Self::MilliampereHour => coulombs / 3.6,
            Self::Coulomb => coulombs,
        }
    }

    /// Convert a charge in this unit back to coulombs
    pub fn to_coulombs(self, value: f64) -> f64 {
        match self {
            Self::AmpereHour => value * 3600.0,
            Self::MilliampereHour => value * 3.6,
            Self::Coulomb => value,
        }
    }

    /// Unit symbol
    pub fn symbol(self) -> &'static str {
        match self {
            Self::AmpereHour => "Ah",
            Self::MilliampereHour => "mAh",
            Self::Coulomb => "C",
        }
    }
}

/// Unit for accumulated energy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum EnergyUnit {
    /// Watt-hour
    #[serde(rename = "Wh")]
    WattHour,
    /// Milliwatt-hour
    #[default]
    #[serde(rename = "mWh")]
    MilliwattHour,
    /// Joule (W·s)
    #[serde(rename = "J")]
    Joule,
}

impl EnergyUnit {
    /// Convert an energy in joules to this unit
    pub fn from_joules(self, joules: f64) -> f64 {
        match self {
            Self::WattHour => joules / 3600.0,
            Self::MilliwattHour => joules / 3.6,
            Self::Joule => joules,
        }
    }

    /// Convert an energy in this unit back to joules
    pub fn to_joules(self, value: f64) -> f64 {
        match self {
            Self::WattHour => value * 3600.0,
            Self::MilliwattHour => value * 3.6,
            Self::Joule => value,
        }
    }

    /// Unit symbol
    pub fn symbol(self) -> &'static str {
        match self {
            Self::WattHour => "Wh",
            Self::MilliwattHour => "mWh",
            Self::Joule => "J",
        }
    }
}

impl fmt::Display for ChargeUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

impl fmt::Display for EnergyUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

impl FromStr for ChargeUnit {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "Ah" | "ah" | "AH" => Ok(Self::AmpereHour),
            "mAh" | "mah" | "MAH" => Ok(Self::MilliampereHour),
            "C" | "c" | "As" => Ok(Self::Coulomb),
            other => Err(format!("unknown charge unit '{}' (expected Ah, mAh or C)", other)),
        }
    }
}

impl FromStr for EnergyUnit {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "Wh" | "wh" | "WH" => Ok(Self::WattHour),
            "mWh" | "mwh" | "MWH" => Ok(Self::MilliwattHour),
            "J" | "j" | "Ws" => Ok(Self::Joule),
            other => Err(format!("unknown energy unit '{}' (expected Wh, mWh or J)", other)),
        }
    }
}

/// Units in which derived charge and energy are reported
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Units {
    /// Unit for cumulative charge and capacity
    pub charge: ChargeUnit,
    /// Unit for cumulative energy
    pub energy: EnergyUnit,
}

impl Units {
    /// Create a unit pair
    pub fn new(charge: ChargeUnit, energy: EnergyUnit) -> Self {
        Self { charge, energy }
    }

    /// Ah and Wh
    pub fn si_hours() -> Self {
        Self::new(ChargeUnit::AmpereHour, EnergyUnit::WattHour)
    }
}
