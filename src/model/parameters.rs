//! User parameter table.
//!
//! A design owns one flat, ordered table of named parameters. Package
//! builders funnel every dimension through [`UserParameterTable::process`],
//! which either creates the parameter or refreshes an existing one - the
//! returned [`ParamStatus`] is what the build framework keys its
//! create-versus-update decision on. Names are unique per design, insertion
//! order is preserved, and re-processing a name never duplicates it.
//!
//! Parameters normally hold plain numbers in the internal centimetre unit,
//! but may instead carry an expression over other parameters; resolution
//! detects reference cycles rather than recursing forever.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use super::expr::{Expr, ExprError};
use super::units::Unit;

/// Tolerance below which two parameter values count as unchanged.
const VALUE_EPSILON: f64 = 1e-9;

/// The unit attached to a parameter for display purposes.
///
/// Values are always stored in the internal unit; this only controls how the
/// parameter is presented and which suffix its expression text carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParamUnit {
    /// A linear dimension displayed in the given unit.
    Length(Unit),
    /// A dimensionless count, such as a number of pins.
    Count,
    /// An angle in degrees.
    Degrees,
}

impl ParamUnit {
    /// The display suffix for expression text.
    #[must_use]
    pub const fn suffix(self) -> &'static str {
        match self {
            Self::Length(unit) => unit.suffix(),
            Self::Count => "",
            Self::Degrees => "deg",
        }
    }
}

/// Outcome of processing one parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamStatus {
    /// The parameter did not exist and was inserted.
    Created,
    /// The parameter existed and was refreshed.
    Updated {
        /// `true` when the refresh moved the stored value.
        changed: bool,
    },
}

impl ParamStatus {
    /// `true` for the update outcome regardless of whether the value moved.
    #[must_use]
    pub const fn is_update(self) -> bool {
        matches!(self, Self::Updated { .. })
    }

    /// `true` when an update actually moved the value.
    #[must_use]
    pub const fn value_changed(self) -> bool {
        matches!(self, Self::Updated { changed: true })
    }
}

/// A single named parameter.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DesignParameter {
    /// Unique name within the design.
    pub name: String,
    /// Cached value in the internal unit.
    pub value: f64,
    /// Display unit.
    pub unit: ParamUnit,
    /// Human-readable description, set at creation and kept thereafter.
    pub comment: String,
    /// Source text of the driving expression, if the parameter is driven.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expression: Option<String>,
    #[serde(skip)]
    parsed: Option<Expr>,
}

/// Equality covers the persisted state; the parse cache does not take part.
impl PartialEq for DesignParameter {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
            && self.value == other.value
            && self.unit == other.unit
            && self.comment == other.comment
            && self.expression == other.expression
    }
}

impl DesignParameter {
    /// Value converted into the parameter's display unit.
    #[must_use]
    pub fn display_value(&self) -> f64 {
        match self.unit {
            ParamUnit::Length(unit) => unit.from_internal(self.value),
            ParamUnit::Count | ParamUnit::Degrees => self.value,
        }
    }
}

/// The design's ordered table of user parameters.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UserParameterTable {
    entries: IndexMap<String, DesignParameter>,
}

impl UserParameterTable {
    /// Creates an empty table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates or refreshes a literal-valued parameter.
    ///
    /// `value` is in the internal unit. An existing parameter keeps its
    /// original comment; only its value (and any stale expression) is
    /// replaced. The returned status is what callers key path selection on -
    /// when a builder processes several parameters in a row, the **last**
    /// status is authoritative for the create/update decision.
    pub fn process(
        &mut self,
        name: &str,
        value: f64,
        unit: ParamUnit,
        comment: &str,
    ) -> ParamStatus {
        if let Some(existing) = self.entries.get_mut(name) {
            let changed = (existing.value - value).abs() > VALUE_EPSILON;
            existing.value = value;
            existing.unit = unit;
            existing.expression = None;
            existing.parsed = None;
            ParamStatus::Updated { changed }
        } else {
            self.entries.insert(
                name.to_string(),
                DesignParameter {
                    name: name.to_string(),
                    value,
                    unit,
                    comment: comment.to_string(),
                    expression: None,
                    parsed: None,
                },
            );
            ParamStatus::Created
        }
    }

    /// Creates or refreshes an expression-driven parameter.
    ///
    /// The expression is parsed eagerly and evaluated against the current
    /// table; the resulting value is cached and compared for the `changed`
    /// flag exactly as in [`Self::process`].
    pub fn process_expression(
        &mut self,
        name: &str,
        source: &str,
        unit: ParamUnit,
        comment: &str,
    ) -> Result<ParamStatus, ExprError> {
        let parsed = Expr::parse(source)?;
        let value = self.eval_guarded(&parsed, name)?;
        let status = if let Some(existing) = self.entries.get_mut(name) {
            let changed = (existing.value - value).abs() > VALUE_EPSILON;
            existing.value = value;
            existing.unit = unit;
            existing.expression = Some(source.to_string());
            existing.parsed = Some(parsed);
            ParamStatus::Updated { changed }
        } else {
            self.entries.insert(
                name.to_string(),
                DesignParameter {
                    name: name.to_string(),
                    value,
                    unit,
                    comment: comment.to_string(),
                    expression: Some(source.to_string()),
                    parsed: Some(parsed),
                },
            );
            ParamStatus::Created
        };
        Ok(status)
    }

    /// Looks up a parameter by name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&DesignParameter> {
        self.entries.get(name)
    }

    /// Current value of a parameter, if present.
    #[must_use]
    pub fn value_of(&self, name: &str) -> Option<f64> {
        self.entries.get(name).map(|p| p.value)
    }

    /// `true` if the table holds a parameter of this name.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    /// Number of parameters.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// `true` when no parameters exist.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Parameters in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &DesignParameter> {
        self.entries.values()
    }

    /// Parameter names in insertion order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    /// Removes one parameter. Returns `true` if it existed.
    pub fn remove(&mut self, name: &str) -> bool {
        self.entries.shift_remove(name).is_some()
    }

    /// Removes every parameter whose name starts with `prefix`.
    ///
    /// Used by the rebuild escape when a component switches package type and
    /// the old type's parameter range must not linger.
    pub fn remove_with_prefix(&mut self, prefix: &str) -> usize {
        let before = self.entries.len();
        self.entries.retain(|name, _| !name.starts_with(prefix));
        before - self.entries.len()
    }

    /// Evaluates an arbitrary expression against the table.
    pub fn eval(&self, expr: &Expr) -> Result<f64, ExprError> {
        let mut visiting = Vec::new();
        expr.eval(&mut |name| self.resolve_inner(name, &mut visiting))
    }

    /// Re-evaluates every expression-driven parameter and refreshes its
    /// cached value. Returns how many values moved.
    pub fn recompute(&mut self) -> Result<usize, ExprError> {
        let driven: Vec<String> = self
            .entries
            .iter()
            .filter(|(_, p)| p.parsed.is_some())
            .map(|(name, _)| name.clone())
            .collect();
        let mut moved = 0;
        for name in driven {
            let Some(expr) = self.entries.get(&name).and_then(|p| p.parsed.clone()) else {
                continue;
            };
            let value = self.eval_guarded(&expr, &name)?;
            if let Some(entry) = self.entries.get_mut(&name) {
                if (entry.value - value).abs() > VALUE_EPSILON {
                    entry.value = value;
                    moved += 1;
                }
            }
        }
        Ok(moved)
    }

    /// Restores parsed expressions after deserialisation.
    pub fn reparse(&mut self) -> Result<(), ExprError> {
        for param in self.entries.values_mut() {
            if let Some(source) = &param.expression {
                param.parsed = Some(Expr::parse(source)?);
            }
        }
        Ok(())
    }

    fn eval_guarded(&self, expr: &Expr, defining: &str) -> Result<f64, ExprError> {
        let mut visiting = vec![defining.to_string()];
        expr.eval(&mut |name| self.resolve_inner(name, &mut visiting))
    }

    fn resolve_inner(&self, name: &str, visiting: &mut Vec<String>) -> Result<f64, ExprError> {
        if visiting.iter().any(|seen| seen == name) {
            return Err(ExprError::Cycle {
                name: name.to_string(),
            });
        }
        let param = self
            .entries
            .get(name)
            .ok_or_else(|| ExprError::UnknownIdentifier {
                name: name.to_string(),
            })?;
        match &param.parsed {
            None => Ok(param.value),
            Some(expr) => {
                visiting.push(name.to_string());
                let value = expr.eval(&mut |ident| self.resolve_inner(ident, visiting))?;
                visiting.pop();
                Ok(value)
            }
        }
    }
}
