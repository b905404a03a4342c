//! Call-input parameter sets.
//!
//! A generate request carries a flat map of named values: dimensions in
//! centimetres, pin counts, boolean switches and the occasional text field
//! such as a thread designation. Callers routinely omit parameters they do
//! not care about, so every accessor takes a fallback and the numeric ones
//! treat an explicit zero the same as an absent key. A zero-size dimension
//! is never meaningful for package geometry and the engineering default is
//! the safer interpretation.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::model::material::Rgb;

/// One value in a generate request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ParamValue {
    /// A switch such as `isPolarized` or `thermal`.
    Flag(bool),
    /// A dimension in centimetres, or a count.
    Number(f64),
    /// Free text, e.g. a thread designation like `M2.5x0.45`.
    Text(String),
}

impl ParamValue {
    /// Numeric view of the value. Flags coerce to 0 or 1 because requests
    /// hand-built from older tooling encode switches that way.
    #[must_use]
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Self::Number(value) => Some(*value),
            Self::Flag(flag) => Some(if *flag { 1.0 } else { 0.0 }),
            Self::Text(_) => None,
        }
    }

    /// Boolean view of the value. Numbers are truthy when non-zero.
    #[must_use]
    pub fn as_flag(&self) -> Option<bool> {
        match self {
            Self::Flag(flag) => Some(*flag),
            Self::Number(value) => Some(*value != 0.0),
            Self::Text(_) => None,
        }
    }

    /// Text view of the value.
    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(text) => Some(text),
            _ => None,
        }
    }
}

impl From<f64> for ParamValue {
    fn from(value: f64) -> Self {
        Self::Number(value)
    }
}

impl From<bool> for ParamValue {
    fn from(value: bool) -> Self {
        Self::Flag(value)
    }
}

impl From<&str> for ParamValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_owned())
    }
}

/// The flat parameter map of one generate request.
///
/// Insertion order is preserved so diagnostics list parameters the way the
/// caller sent them.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ParameterSet {
    values: IndexMap<String, ParamValue>,
}

impl ParameterSet {
    /// Creates an empty set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses a set from a JSON object payload.
    pub fn from_json(payload: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(payload)
    }

    /// Inserts or replaces a value.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<ParamValue>) {
        self.values.insert(key.into(), value.into());
    }

    /// Builder-style insert, convenient when assembling requests in tests.
    #[must_use]
    pub fn with(mut self, key: impl Into<String>, value: impl Into<ParamValue>) -> Self {
        self.set(key, value);
        self
    }

    /// Whether the caller supplied `key` at all.
    #[must_use]
    pub fn contains(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    /// A dimension in centimetres. Missing, non-numeric and zero values all
    /// fall back to `default`.
    #[must_use]
    pub fn length(&self, key: &str, default: f64) -> f64 {
        match self.values.get(key).and_then(ParamValue::as_number) {
            Some(value) if value != 0.0 => value,
            _ => default,
        }
    }

    /// A dimension the caller actually supplied, zero excluded.
    #[must_use]
    pub fn length_opt(&self, key: &str) -> Option<f64> {
        match self.values.get(key).and_then(ParamValue::as_number) {
            Some(value) if value != 0.0 => Some(value),
            _ => None,
        }
    }

    /// The raw numeric value with no zero fallback. Needed for the few
    /// parameters where zero and negative carry meaning, such as an
    /// explicit terminal thickness override.
    #[must_use]
    pub fn raw_number(&self, key: &str) -> Option<f64> {
        self.values.get(key).and_then(ParamValue::as_number)
    }

    /// The lead-frame thickness rule shared by the gull-wing families: a
    /// missing or negative `terminalThickness` falls back to the family
    /// nominal `cap`, anything else clamps to it.
    #[must_use]
    pub fn terminal_thickness(&self, cap: f64) -> f64 {
        match self.raw_number("terminalThickness") {
            Some(value) if value >= 0.0 => value.min(cap),
            _ => cap,
        }
    }

    /// A pin or row count. Missing and zero fall back to `default`; values
    /// are truncated towards zero.
    #[must_use]
    pub fn count(&self, key: &str, default: u32) -> u32 {
        match self.values.get(key).and_then(ParamValue::as_number) {
            Some(value) if value >= 1.0 => value as u32,
            _ => default,
        }
    }

    /// A boolean switch, `false` when absent.
    #[must_use]
    pub fn flag(&self, key: &str) -> bool {
        self.flag_or(key, false)
    }

    /// A boolean switch with an explicit fallback.
    #[must_use]
    pub fn flag_or(&self, key: &str, default: bool) -> bool {
        self.values
            .get(key)
            .and_then(ParamValue::as_flag)
            .unwrap_or(default)
    }

    /// A text value with a fallback.
    #[must_use]
    pub fn text(&self, key: &str, default: &str) -> String {
        self.values
            .get(key)
            .and_then(ParamValue::as_text)
            .unwrap_or(default)
            .to_owned()
    }

    /// The body colour channels, `color_r`/`color_g`/`color_b`.
    #[must_use]
    pub fn rgb(&self, default: Rgb) -> Rgb {
        let channel = |key: &str, fallback: u8| {
            self.values
                .get(key)
                .and_then(ParamValue::as_number)
                .map_or(fallback, |value| value.clamp(0.0, 255.0) as u8)
        };
        Rgb::new(
            channel("color_r", default.r),
            channel("color_g", default.g),
            channel("color_b", default.b),
        )
    }

    /// Number of values in the set.
    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether the set is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Iterates values in caller order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &ParamValue)> {
        self.values.iter().map(|(key, value)| (key.as_str(), value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_length_falls_back_to_default() {
        let params = ParameterSet::new().with("E", 0.0).with("D", 0.42);
        assert!((params.length("E", 0.18) - 0.18).abs() < 1e-12);
        assert!((params.length("D", 0.34) - 0.42).abs() < 1e-12);
        assert!((params.length("A", 0.07) - 0.07).abs() < 1e-12);
    }

    #[test]
    fn raw_number_keeps_zero_and_negative() {
        let params = ParameterSet::new().with("terminalThickness", -1.0);
        assert_eq!(params.raw_number("terminalThickness"), Some(-1.0));
        assert_eq!(params.raw_number("missing"), None);
    }

    #[test]
    fn terminal_thickness_clamps_to_cap() {
        let thick = ParameterSet::new().with("terminalThickness", 0.05);
        assert!((thick.terminal_thickness(0.013) - 0.013).abs() < 1e-12);
        let negative = ParameterSet::new().with("terminalThickness", -1.0);
        assert!((negative.terminal_thickness(0.013) - 0.013).abs() < 1e-12);
        let thin = ParameterSet::new().with("terminalThickness", 0.01);
        assert!((thin.terminal_thickness(0.013) - 0.01).abs() < 1e-12);
        assert!((ParameterSet::new().terminal_thickness(0.02) - 0.02).abs() < 1e-12);
    }

    #[test]
    fn flags_coerce_from_numbers() {
        let params = ParameterSet::new()
            .with("isPolarized", 1.0)
            .with("thermal", false);
        assert!(params.flag("isPolarized"));
        assert!(!params.flag("thermal"));
        assert!(!params.flag("absent"));
        assert!(params.flag_or("isParametric", true));
    }

    #[test]
    fn counts_truncate_and_default() {
        let params = ParameterSet::new().with("DPins", 14.0).with("EPins", 0.0);
        assert_eq!(params.count("DPins", 8), 14);
        assert_eq!(params.count("EPins", 4), 4);
    }

    #[test]
    fn colour_channels_clamp() {
        let params = ParameterSet::new()
            .with("color_r", 300.0)
            .with("color_g", 128.0);
        let rgb = params.rgb(Rgb::new(10, 10, 10));
        assert_eq!(rgb, Rgb::new(255, 128, 10));
    }

    #[test]
    fn json_payload_round_trips_mixed_values() {
        let payload = r#"{"A":0.07,"isFlatLead":true,"threadDesignation":"M2.5x0.45"}"#;
        let params = ParameterSet::from_json(payload).unwrap();
        assert!((params.length("A", 0.0) - 0.07).abs() < 1e-12);
        assert!(params.flag("isFlatLead"));
        assert_eq!(params.text("threadDesignation", ""), "M2.5x0.45");
    }
}
