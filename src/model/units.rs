//! Measurement units and conversions.
//!
//! The design document stores every length in **centimetres**, matching the
//! internal unit of the modelling kernel the generator targets. Callers and
//! file formats speak whatever unit they like; conversion happens at the
//! boundary. Footprint XML is always millimetres, user parameters are
//! displayed in the document's default unit.

use std::fmt;

use serde::{Deserialize, Serialize};

/// A linear measurement unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Unit {
    /// Millimetres - the default presentation unit for electronics documents.
    #[default]
    Mm,
    /// Centimetres - the document's internal unit.
    Cm,
    /// Inches.
    In,
    /// Mils (thousandths of an inch).
    Mil,
}

impl Unit {
    /// Parses a unit from its document suffix.
    ///
    /// Accepts: "mm", "cm", "in", "inch", "mil" (case-insensitive).
    #[must_use]
    pub fn from_str_loose(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "mm" => Some(Self::Mm),
            "cm" => Some(Self::Cm),
            "in" | "inch" => Some(Self::In),
            "mil" => Some(Self::Mil),
            _ => None,
        }
    }

    /// Scale factor from this unit to centimetres.
    #[must_use]
    pub const fn factor_to_cm(self) -> f64 {
        match self {
            Self::Mm => 0.1,
            Self::Cm => 1.0,
            Self::In => 2.54,
            Self::Mil => 0.00254,
        }
    }

    /// Converts a value in this unit to the internal centimetre unit.
    #[must_use]
    pub fn to_internal(self, value: f64) -> f64 {
        value * self.factor_to_cm()
    }

    /// Converts an internal centimetre value into this unit.
    #[must_use]
    pub fn from_internal(self, value: f64) -> f64 {
        value / self.factor_to_cm()
    }

    /// The suffix used when formatting values in this unit.
    #[must_use]
    pub const fn suffix(self) -> &'static str {
        match self {
            Self::Mm => "mm",
            Self::Cm => "cm",
            Self::In => "in",
            Self::Mil => "mil",
        }
    }
}

impl fmt::Display for Unit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.suffix())
    }
}

/// Converts a value between two linear units.
#[must_use]
pub fn convert(value: f64, from: Unit, to: Unit) -> f64 {
    to.from_internal(from.to_internal(value))
}

/// Converts millimetres (the footprint XML unit) to internal centimetres.
#[must_use]
pub fn mm(value: f64) -> f64 {
    Unit::Mm.to_internal(value)
}
