//! Metric thread designations.
//!
//! Standoff families thread their barrels and screws from a designation
//! string such as `M2.5x0.45`. The designation quotes millimetres; parsed
//! values come back in internal centimetres. Designations without an
//! explicit pitch fall back to the ISO coarse pitch for that diameter.

use std::sync::OnceLock;

use regex::Regex;

use crate::error::{GenerateError, GenerateResult};
use crate::model::units::{convert, Unit};

/// ISO 261 coarse pitches, millimetres, for the sizes standoffs use.
const COARSE_PITCHES: &[(f64, f64)] = &[
    (1.0, 0.25),
    (1.2, 0.25),
    (1.6, 0.35),
    (2.0, 0.4),
    (2.5, 0.45),
    (3.0, 0.5),
    (3.5, 0.6),
    (4.0, 0.7),
    (5.0, 0.8),
    (6.0, 1.0),
    (8.0, 1.25),
    (10.0, 1.5),
    (12.0, 1.75),
];

/// A parsed thread designation.
#[derive(Debug, Clone, PartialEq)]
pub struct ThreadSpec {
    /// The designation as given, trimmed.
    pub designation: String,
    /// Major diameter, centimetres.
    pub major_diameter: f64,
    /// Pitch, centimetres.
    pub pitch: f64,
}

impl ThreadSpec {
    /// Minor diameter of the thread, centimetres. The standard basic
    /// profile cuts 1.0825 pitches off the major diameter.
    #[must_use]
    pub fn minor_diameter(&self) -> f64 {
        (-2.0 * 0.541_25f64).mul_add(self.pitch, self.major_diameter)
    }
}

fn designation_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^[Mm]\s*(\d+(?:\.\d+)?)\s*(?:[xX]\s*(\d+(?:\.\d+)?))?$")
            .unwrap_or_else(|_| unreachable!("designation pattern is valid"))
    })
}

/// Parses a metric designation such as `M3` or `M2.5x0.45`.
pub fn parse(designation: &str) -> GenerateResult<ThreadSpec> {
    let trimmed = designation.trim();
    let captures = designation_pattern()
        .captures(trimmed)
        .ok_or_else(|| GenerateError::unknown_thread(trimmed))?;

    let diameter_mm: f64 = captures[1]
        .parse()
        .map_err(|_| GenerateError::unknown_thread(trimmed))?;
    let pitch_mm = match captures.get(2) {
        Some(pitch) => pitch
            .as_str()
            .parse()
            .map_err(|_| GenerateError::unknown_thread(trimmed))?,
        None => coarse_pitch(diameter_mm).ok_or_else(|| GenerateError::unknown_thread(trimmed))?,
    };
    if diameter_mm <= 0.0 || pitch_mm <= 0.0 || pitch_mm >= diameter_mm {
        return Err(GenerateError::unknown_thread(trimmed));
    }

    Ok(ThreadSpec {
        designation: trimmed.to_owned(),
        major_diameter: convert(diameter_mm, Unit::Mm, Unit::Cm),
        pitch: convert(pitch_mm, Unit::Mm, Unit::Cm),
    })
}

fn coarse_pitch(diameter_mm: f64) -> Option<f64> {
    COARSE_PITCHES
        .iter()
        .find(|(diameter, _)| (diameter - diameter_mm).abs() < 1e-9)
        .map(|(_, pitch)| *pitch)
}
