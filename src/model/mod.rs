//! In-memory modelling document.
//!
//! This module is the generator's view of a modelling session: a [`Design`]
//! holds the shared user parameter table, the components being built, and the
//! single-session slot that serialises access to the document. A
//! [`Component`] owns its sketches, its feature history and the key index the
//! update paths resolve through.
//!
//! # Structure
//!
//! - [`units`] — measurement units; everything is stored in centimetres
//! - [`expr`] — algebraic expressions for driven dimensions
//! - [`parameters`] — the named, ordered, expression-capable parameter table
//! - [`sketch`] — 2D curves, text and profiles
//! - [`feature`] — the generation-checked feature arena and body volumes
//! - [`material`] — material and appearance catalogues

pub mod expr;
pub mod feature;
pub mod material;
pub mod parameters;
pub mod sketch;
pub mod units;

pub use feature::{Body, BodyId, Dim, FeatureId, FeatureKind, FeatureRecord, History};
pub use parameters::{ParamStatus, ParamUnit, UserParameterTable};
pub use sketch::{BasePlane, Point2, Sketch, SketchPlane};
pub use units::Unit;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use self::expr::ExprError;

/// Handle to a sketch within a component.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SketchId(pub usize);

/// Handle to a component within a design.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ComponentId(pub usize);

/// A stable identifier a builder assigns to a feature at creation time.
///
/// Update paths resolve features through the component's key index instead
/// of searching the history by display name; display names remain free for
/// presentation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FeatureKey(pub &'static str);

impl std::fmt::Display for FeatureKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.0)
    }
}

/// Lifecycle of a component's generated geometry.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum BuildState {
    /// Nothing generated yet.
    #[default]
    Uninitialized,
    /// Geometry exists for the recorded package type.
    Created {
        /// The package type tag the geometry was built for.
        package_type: String,
        /// Values of the structural parameters at build time. A later call
        /// that changes any of these takes the rebuild escape.
        structural: IndexMap<String, f64>,
    },
}

impl BuildState {
    /// `true` once geometry has been generated.
    #[must_use]
    pub const fn is_created(&self) -> bool {
        matches!(self, Self::Created { .. })
    }
}

/// The document-level session slot.
///
/// The host serialises document access; this makes that single-writer rule
/// explicit. An interactive edit left open by the host is terminated by the
/// dispatcher before a build starts.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Session {
    /// No session active.
    #[default]
    Idle,
    /// An interactive host edit is in flight.
    Interactive {
        /// Who opened the edit.
        owner: String,
    },
    /// A generation request holds the document.
    Build {
        /// The component being built.
        component: ComponentId,
    },
}

/// One component: sketches, feature history, key index and build state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Component {
    /// Display name.
    pub name: String,
    /// The component's feature history.
    pub history: History,
    sketches: Vec<Option<Sketch>>,
    feature_index: IndexMap<String, FeatureId>,
    /// Build lifecycle state.
    pub build_state: BuildState,
    attributes: IndexMap<String, IndexMap<String, String>>,
}

impl Component {
    /// Creates an empty component.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            history: History::new(),
            sketches: Vec::new(),
            feature_index: IndexMap::new(),
            build_state: BuildState::default(),
            attributes: IndexMap::new(),
        }
    }

    /// Adds a sketch and returns its handle.
    pub fn add_sketch(&mut self, sketch: Sketch) -> SketchId {
        self.sketches.push(Some(sketch));
        SketchId(self.sketches.len() - 1)
    }

    /// Resolves a sketch handle.
    #[must_use]
    pub fn sketch(&self, id: SketchId) -> Option<&Sketch> {
        self.sketches.get(id.0).and_then(Option::as_ref)
    }

    /// Resolves a sketch handle mutably.
    pub fn sketch_mut(&mut self, id: SketchId) -> Option<&mut Sketch> {
        self.sketches.get_mut(id.0).and_then(Option::as_mut)
    }

    /// Finds a sketch by display name.
    #[must_use]
    pub fn sketch_named(&self, name: &str) -> Option<SketchId> {
        self.sketches
            .iter()
            .position(|s| s.as_ref().is_some_and(|s| s.name == name))
            .map(SketchId)
    }

    /// Deletes a sketch. Returns `true` if it existed.
    pub fn remove_sketch(&mut self, id: SketchId) -> bool {
        match self.sketches.get_mut(id.0) {
            Some(slot) => slot.take().is_some(),
            None => false,
        }
    }

    /// Number of live sketches.
    #[must_use]
    pub fn sketch_count(&self) -> usize {
        self.sketches.iter().filter(|s| s.is_some()).count()
    }

    /// Records a feature under its stable key.
    pub fn index_feature(&mut self, key: FeatureKey, id: FeatureId) {
        self.feature_index.insert(key.0.to_string(), id);
    }

    /// Resolves a feature key recorded at creation time.
    #[must_use]
    pub fn indexed(&self, key: FeatureKey) -> Option<FeatureId> {
        self.feature_index.get(key.0).copied()
    }

    /// Number of indexed features.
    #[must_use]
    pub fn indexed_count(&self) -> usize {
        self.feature_index.len()
    }

    /// Stores a metadata attribute under a group.
    pub fn set_attribute(&mut self, group: &str, name: &str, value: impl Into<String>) {
        self.attributes
            .entry(group.to_string())
            .or_default()
            .insert(name.to_string(), value.into());
    }

    /// Reads a metadata attribute.
    #[must_use]
    pub fn attribute(&self, group: &str, name: &str) -> Option<&str> {
        self.attributes
            .get(group)
            .and_then(|g| g.get(name))
            .map(String::as_str)
    }

    /// Discards everything the generator built: features, their sketches,
    /// the key index and the build state. Footprint sketches are not feature
    /// history and survive.
    pub fn clear_built(&mut self) {
        let feature_sketches: Vec<SketchId> = self
            .history
            .iter()
            .filter_map(|(_, record)| match record.kind {
                FeatureKind::Sketch { sketch } => Some(sketch),
                _ => None,
            })
            .collect();
        for id in feature_sketches {
            self.remove_sketch(id);
        }
        self.history.clear();
        self.feature_index.clear();
        self.build_state = BuildState::default();
    }
}

/// The design document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Design {
    /// Document display name.
    pub name: String,
    /// Default presentation unit for parameters.
    pub default_unit: Unit,
    /// The design-wide user parameter table.
    pub parameters: UserParameterTable,
    components: Vec<Component>,
    #[serde(skip)]
    session: Session,
}

impl Design {
    /// Creates a design with one root component.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            default_unit: Unit::default(),
            parameters: UserParameterTable::new(),
            components: vec![Component::new("Root")],
            session: Session::Idle,
        }
    }

    /// The root component's handle.
    #[must_use]
    pub const fn root(&self) -> ComponentId {
        ComponentId(0)
    }

    /// Adds a component and returns its handle.
    pub fn add_component(&mut self, name: impl Into<String>) -> ComponentId {
        self.components.push(Component::new(name));
        ComponentId(self.components.len() - 1)
    }

    /// Resolves a component handle.
    #[must_use]
    pub fn component(&self, id: ComponentId) -> Option<&Component> {
        self.components.get(id.0)
    }

    /// Resolves a component handle mutably.
    pub fn component_mut(&mut self, id: ComponentId) -> Option<&mut Component> {
        self.components.get_mut(id.0)
    }

    /// Borrows a component and the parameter table at the same time, which
    /// is what builders need while wiring driven dimensions.
    pub fn component_and_params_mut(
        &mut self,
        id: ComponentId,
    ) -> Option<(&mut Component, &mut UserParameterTable)> {
        let component = self.components.get_mut(id.0)?;
        Some((component, &mut self.parameters))
    }

    /// All components in creation order.
    pub fn components(&self) -> impl Iterator<Item = &Component> {
        self.components.iter()
    }

    /// Total active body count across components.
    #[must_use]
    pub fn total_body_count(&self) -> usize {
        self.components
            .iter()
            .map(|c| c.history.active_body_count())
            .sum()
    }

    /// Opens an interactive host edit. Any previous session is replaced.
    pub fn begin_interactive(&mut self, owner: impl Into<String>) {
        self.session = Session::Interactive {
            owner: owner.into(),
        };
    }

    /// The current session state.
    #[must_use]
    pub const fn session(&self) -> &Session {
        &self.session
    }

    /// Terminates whatever session is active. Returns the interactive
    /// owner's name when an interactive edit was cut short.
    pub fn terminate_session(&mut self) -> Option<String> {
        match std::mem::take(&mut self.session) {
            Session::Interactive { owner } => Some(owner),
            Session::Idle | Session::Build { .. } => None,
        }
    }

    /// Marks the document as held by a build for `component`.
    pub fn begin_build(&mut self, component: ComponentId) {
        self.session = Session::Build { component };
    }

    /// Releases the build hold.
    pub fn end_build(&mut self) {
        self.session = Session::Idle;
    }

    /// Re-evaluates driven parameters, then replays every component's
    /// history against the refreshed table.
    pub fn recompute(&mut self) -> Result<(), ExprError> {
        self.parameters.recompute()?;
        for component in &mut self.components {
            component.history.recompute(&self.parameters)?;
        }
        Ok(())
    }

    /// Restores parsed expressions after deserialisation.
    pub fn reparse(&mut self) -> Result<(), ExprError> {
        self.parameters.reparse()?;
        for component in &mut self.components {
            component.history.reparse()?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::sketch::SketchPlane;

    #[test]
    fn component_attributes() {
        let mut component = Component::new("Root");
        component.set_attribute("footprint", "name", "CHIP-0402");
        component.set_attribute("footprint", "xml", "<package/>");
        assert_eq!(component.attribute("footprint", "name"), Some("CHIP-0402"));
        assert_eq!(component.attribute("footprint", "xml"), Some("<package/>"));
        assert_eq!(component.attribute("footprint", "missing"), None);
        // Overwrite, not duplicate.
        component.set_attribute("footprint", "name", "CHIP-0603");
        assert_eq!(component.attribute("footprint", "name"), Some("CHIP-0603"));
    }

    #[test]
    fn sketch_lookup_by_name() {
        let mut component = Component::new("Root");
        let pad = component.add_sketch(Sketch::new("Pad", SketchPlane::default()));
        component.add_sketch(Sketch::new("Silkscreen", SketchPlane::default()));
        assert_eq!(component.sketch_named("Pad"), Some(pad));
        assert_eq!(component.sketch_named("Text"), None);
        assert!(component.remove_sketch(pad));
        assert_eq!(component.sketch_named("Pad"), None);
        assert_eq!(component.sketch_count(), 1);
    }

    #[test]
    fn session_termination() {
        let mut design = Design::new("Test");
        assert_eq!(design.session(), &Session::Idle);
        design.begin_interactive("sketch edit");
        let terminated = design.terminate_session();
        assert_eq!(terminated, Some("sketch edit".to_string()));
        assert_eq!(design.session(), &Session::Idle);

        design.begin_build(design.root());
        assert!(matches!(design.session(), Session::Build { .. }));
        design.end_build();
        assert_eq!(design.session(), &Session::Idle);
    }

    #[test]
    fn clear_built_spares_footprint_sketches() {
        let mut design = Design::new("Test");
        let root = design.root();
        let component = design.component_mut(root).unwrap();
        // A footprint sketch, not part of the feature history.
        component.add_sketch(Sketch::new("Silkscreen", SketchPlane::default()));
        // A builder sketch recorded in the history.
        let body_sketch = component.add_sketch(Sketch::new("BodySketch", SketchPlane::default()));
        let feature = component.history.add(FeatureRecord::new(
            "BodySketch".to_string(),
            FeatureKind::Sketch {
                sketch: body_sketch,
            },
        ));
        component.index_feature(FeatureKey("BodySketch"), feature);
        component.build_state = BuildState::Created {
            package_type: "chip".to_string(),
            structural: IndexMap::new(),
        };

        component.clear_built();
        assert!(component.history.is_empty());
        assert_eq!(component.indexed_count(), 0);
        assert_eq!(component.sketch_count(), 1);
        assert!(component.sketch_named("Silkscreen").is_some());
        assert!(!component.build_state.is_created());
    }
}
