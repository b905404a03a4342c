//! Feature history: the ordered, replayable record of construction
//! operations that defines a component's solid geometry.
//!
//! Features live in a generation-checked arena and are addressed by
//! [`FeatureId`] handles handed out at creation. A handle held across a
//! removal goes stale rather than aliasing a reused slot, which is what makes
//! it safe for builders to keep feature indices between invocations.
//!
//! Geometry is analytic: a feature's defining scalars are [`Dim`]s - either
//! literal numbers or expressions over the user parameter table - and body
//! volumes derive from them. [`History::recompute`] replays the history in
//! creation order, re-evaluating every driven dimension and rebuilding the
//! volume of every body, so a parameter edit propagates exactly as far as the
//! dimensions that reference it.

use serde::{Deserialize, Serialize};

use super::expr::{Expr, ExprError};
use super::material::Finish;
use super::parameters::UserParameterTable;
use super::sketch::BasePlane;
use super::SketchId;

/// Tolerance below which a recomputed dimension counts as unmoved.
const DIM_EPSILON: f64 = 1e-9;

/// A scalar quantity of a feature: a literal value, or a value driven by an
/// expression over the parameter table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Dim {
    value: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    expression: Option<String>,
    #[serde(skip)]
    parsed: Option<Expr>,
}

/// Equality covers the persisted state; the parse cache does not take part.
impl PartialEq for Dim {
    fn eq(&self, other: &Self) -> bool {
        self.value == other.value && self.expression == other.expression
    }
}

impl Dim {
    /// A fixed scalar.
    #[must_use]
    pub const fn literal(value: f64) -> Self {
        Self {
            value,
            expression: None,
            parsed: None,
        }
    }

    /// A scalar driven by an expression, evaluated eagerly.
    pub fn driven(source: &str, table: &UserParameterTable) -> Result<Self, ExprError> {
        let parsed = Expr::parse(source)?;
        let value = table.eval(&parsed)?;
        Ok(Self {
            value,
            expression: Some(source.to_string()),
            parsed: Some(parsed),
        })
    }

    /// Binds to `expression` when parametric mode is on and the expression is
    /// non-empty; otherwise keeps the literal. This is the binding rule every
    /// sketch and feature primitive applies to its numeric arguments.
    pub fn bound(
        value: f64,
        expression: &str,
        parametric: bool,
        table: &UserParameterTable,
    ) -> Result<Self, ExprError> {
        if parametric && !expression.is_empty() {
            Self::driven(expression, table)
        } else {
            Ok(Self::literal(value))
        }
    }

    /// Current value in internal units.
    #[must_use]
    pub const fn value(&self) -> f64 {
        self.value
    }

    /// `true` when an expression drives this scalar.
    #[must_use]
    pub const fn is_driven(&self) -> bool {
        self.expression.is_some()
    }

    /// The driving expression source, if any.
    #[must_use]
    pub fn expression(&self) -> Option<&str> {
        self.expression.as_deref()
    }

    /// Re-evaluates a driven scalar. Returns `true` if the value moved.
    pub fn recompute(&mut self, table: &UserParameterTable) -> Result<bool, ExprError> {
        let Some(parsed) = &self.parsed else {
            return Ok(false);
        };
        let value = table.eval(parsed)?;
        let moved = (value - self.value).abs() > DIM_EPSILON;
        self.value = value;
        Ok(moved)
    }

    /// Restores the parsed expression after deserialisation.
    pub fn reparse(&mut self) -> Result<(), ExprError> {
        if let Some(source) = &self.expression {
            self.parsed = Some(Expr::parse(source)?);
        }
        Ok(())
    }
}

/// Handle to a feature in the arena. Stale after the feature is removed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FeatureId {
    index: usize,
    generation: u32,
}

/// Handle to a body.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BodyId(usize);

/// How a profile-consuming feature combines with existing geometry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "lowercase")]
pub enum Operation {
    /// Produce a new body.
    NewBody,
    /// Add material to an existing body.
    Join {
        /// The body receiving material.
        target: BodyId,
    },
    /// Remove material from an existing body.
    Cut {
        /// The body losing material.
        target: BodyId,
    },
}

/// The closed region a solid feature consumes, in analytic form.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "shape", rename_all = "snake_case")]
pub enum ProfileSpec {
    /// An axis-aligned rectangle.
    Rectangle {
        /// Width.
        width: Dim,
        /// Height.
        height: Dim,
    },
    /// A rectangle with four rounded corners.
    RoundedRectangle {
        /// Width.
        width: Dim,
        /// Height.
        height: Dim,
        /// Corner radius.
        corner_radius: Dim,
    },
    /// A circle.
    Circle {
        /// Radius.
        radius: Dim,
    },
    /// An annulus.
    Ring {
        /// Outer radius.
        outer_radius: Dim,
        /// Inner radius.
        inner_radius: Dim,
    },
    /// An irregular closed region with a directly supplied area.
    Area {
        /// Enclosed area.
        area: Dim,
    },
}

impl ProfileSpec {
    /// Current enclosed area.
    #[must_use]
    pub fn area(&self) -> f64 {
        match self {
            Self::Rectangle { width, height } => (width.value() * height.value()).abs(),
            Self::RoundedRectangle {
                width,
                height,
                corner_radius,
            } => {
                let w = width.value().abs();
                let h = height.value().abs();
                let r = corner_radius.value().abs().min(w / 2.0).min(h / 2.0);
                (4.0 - std::f64::consts::PI).mul_add(-(r * r), w * h)
            }
            Self::Circle { radius } => std::f64::consts::PI * radius.value() * radius.value(),
            Self::Ring {
                outer_radius,
                inner_radius,
            } => {
                let ro = outer_radius.value();
                let ri = inner_radius.value();
                std::f64::consts::PI * ro.mul_add(ro, -(ri * ri))
            }
            Self::Area { area } => area.value().abs(),
        }
    }

    fn for_each_dim(&mut self, f: &mut impl FnMut(&mut Dim) -> Result<bool, ExprError>) -> Result<bool, ExprError> {
        let mut moved = false;
        match self {
            Self::Rectangle { width, height } => {
                moved |= f(width)?;
                moved |= f(height)?;
            }
            Self::RoundedRectangle {
                width,
                height,
                corner_radius,
            } => {
                moved |= f(width)?;
                moved |= f(height)?;
                moved |= f(corner_radius)?;
            }
            Self::Circle { radius } => moved |= f(radius)?,
            Self::Ring {
                outer_radius,
                inner_radius,
            } => {
                moved |= f(outer_radius)?;
                moved |= f(inner_radius)?;
            }
            Self::Area { area } => moved |= f(area)?,
        }
        Ok(moved)
    }
}

/// One construction operation in the history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "feature", rename_all = "snake_case")]
pub enum FeatureKind {
    /// A construction plane offset from a base plane.
    Plane {
        /// The base plane.
        base: BasePlane,
        /// Normal offset.
        offset: Dim,
    },
    /// A sketch placed in the history.
    Sketch {
        /// The component sketch this feature records.
        sketch: SketchId,
    },
    /// A linear extrusion of a profile.
    Extrude {
        /// The profile.
        profile: ProfileSpec,
        /// Extrusion distance (total, regardless of direction or symmetry).
        distance: Dim,
        /// Boolean operation.
        operation: Operation,
    },
    /// A revolution of a profile about an axis in its plane.
    Revolve {
        /// The profile.
        profile: ProfileSpec,
        /// Distance from the axis to the profile centroid.
        centroid_radius: Dim,
        /// Swept angle in degrees.
        angle_deg: f64,
        /// Boolean operation.
        operation: Operation,
    },
    /// A profile swept along a path.
    Sweep {
        /// The profile.
        profile: ProfileSpec,
        /// Path length.
        path_length: Dim,
        /// Boolean operation.
        operation: Operation,
    },
    /// A mirror of the bodies of other features across a plane.
    Mirror {
        /// Features whose bodies are mirrored.
        sources: Vec<FeatureId>,
        /// The mirror plane.
        plane: BasePlane,
    },
    /// A rectangular pattern of the bodies of other features.
    ///
    /// Quantities count the seed instance, so a one-direction pattern of
    /// quantity `n` leaves `n` instances in total.
    RectangularPattern {
        /// Features whose bodies are patterned.
        sources: Vec<FeatureId>,
        /// Instance count along the first direction.
        quantity_one: u32,
        /// Spacing along the first direction.
        distance_one: Dim,
        /// Instance count along the second direction (1 = one-direction).
        quantity_two: u32,
        /// Spacing along the second direction.
        distance_two: Dim,
    },
    /// A chamfer along edges of a body.
    Chamfer {
        /// The body losing material.
        target: BodyId,
        /// First chamfer distance.
        distance_one: Dim,
        /// Second chamfer distance (equal distances when not two-distance).
        distance_two: Dim,
        /// Total length of the chamfered edges.
        edge_length: Dim,
    },
    /// A constant-radius fillet along convex edges of a body.
    Fillet {
        /// The body losing material.
        target: BodyId,
        /// Fillet radius.
        radius: Dim,
        /// Total length of the filleted edges.
        edge_length: Dim,
    },
    /// A helical thread applied to a cylindrical face. Cosmetic for volume
    /// purposes.
    Thread {
        /// The threaded body.
        target: BodyId,
        /// Thread designation, e.g. `M2.5x0.45`.
        designation: String,
        /// Major diameter.
        major_diameter: f64,
        /// Thread pitch.
        pitch: f64,
        /// Threaded length along the face.
        length: Dim,
        /// `true` when the whole face is threaded.
        full_length: bool,
    },
}

impl FeatureKind {
    fn recompute_dims(&mut self, table: &UserParameterTable) -> Result<bool, ExprError> {
        let mut recompute = |dim: &mut Dim| dim.recompute(table);
        match self {
            Self::Plane { offset, .. } => recompute(offset),
            Self::Sketch { .. } => Ok(false),
            Self::Extrude {
                profile, distance, ..
            } => {
                let mut moved = profile.for_each_dim(&mut recompute)?;
                moved |= recompute(distance)?;
                Ok(moved)
            }
            Self::Revolve {
                profile,
                centroid_radius,
                ..
            } => {
                let mut moved = profile.for_each_dim(&mut recompute)?;
                moved |= recompute(centroid_radius)?;
                Ok(moved)
            }
            Self::Sweep {
                profile,
                path_length,
                ..
            } => {
                let mut moved = profile.for_each_dim(&mut recompute)?;
                moved |= recompute(path_length)?;
                Ok(moved)
            }
            Self::Mirror { .. } => Ok(false),
            Self::RectangularPattern {
                distance_one,
                distance_two,
                ..
            } => {
                let mut moved = recompute(distance_one)?;
                moved |= recompute(distance_two)?;
                Ok(moved)
            }
            Self::Chamfer {
                distance_one,
                distance_two,
                edge_length,
                ..
            } => {
                let mut moved = recompute(distance_one)?;
                moved |= recompute(distance_two)?;
                moved |= recompute(edge_length)?;
                Ok(moved)
            }
            Self::Fillet {
                radius,
                edge_length,
                ..
            } => {
                let mut moved = recompute(radius)?;
                moved |= recompute(edge_length)?;
                Ok(moved)
            }
            Self::Thread { length, .. } => recompute(length),
        }
    }

    fn reparse(&mut self) -> Result<(), ExprError> {
        let mut reparse = |dim: &mut Dim| -> Result<bool, ExprError> {
            dim.reparse()?;
            Ok(false)
        };
        match self {
            Self::Plane { offset, .. } => {
                offset.reparse()?;
            }
            Self::Sketch { .. } | Self::Mirror { .. } => {}
            Self::Extrude {
                profile, distance, ..
            } => {
                profile.for_each_dim(&mut reparse)?;
                distance.reparse()?;
            }
            Self::Revolve {
                profile,
                centroid_radius,
                ..
            } => {
                profile.for_each_dim(&mut reparse)?;
                centroid_radius.reparse()?;
            }
            Self::Sweep {
                profile,
                path_length,
                ..
            } => {
                profile.for_each_dim(&mut reparse)?;
                path_length.reparse()?;
            }
            Self::RectangularPattern {
                distance_one,
                distance_two,
                ..
            } => {
                distance_one.reparse()?;
                distance_two.reparse()?;
            }
            Self::Chamfer {
                distance_one,
                distance_two,
                edge_length,
                ..
            } => {
                distance_one.reparse()?;
                distance_two.reparse()?;
                edge_length.reparse()?;
            }
            Self::Fillet {
                radius,
                edge_length,
                ..
            } => {
                radius.reparse()?;
                edge_length.reparse()?;
            }
            Self::Thread { length, .. } => {
                length.reparse()?;
            }
        }
        Ok(())
    }
}

/// A solid result of one or more features.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Body {
    /// Display name.
    pub name: String,
    /// Material, appearance and colour.
    pub finish: Finish,
    /// Current volume, internal units cubed.
    pub volume: f64,
    /// The feature that created this body.
    pub created_by: FeatureId,
}

/// One named node of the history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureRecord {
    /// Display name assigned at creation.
    pub name: String,
    /// The operation.
    pub kind: FeatureKind,
    /// Suppressed features contribute no bodies and no volume effects.
    pub suppressed: bool,
    /// Bodies owned by this feature, in creation order.
    pub bodies: Vec<BodyId>,
}

impl FeatureRecord {
    /// Creates an unsuppressed record with no bodies yet.
    #[must_use]
    pub const fn new(name: String, kind: FeatureKind) -> Self {
        Self {
            name,
            kind,
            suppressed: false,
            bodies: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
struct Slot {
    generation: u32,
    record: Option<FeatureRecord>,
}

/// The feature history of one component.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct History {
    slots: Vec<Slot>,
    order: Vec<FeatureId>,
    bodies: Vec<Option<Body>>,
}

impl History {
    /// Creates an empty history.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a feature and returns its handle.
    pub fn add(&mut self, record: FeatureRecord) -> FeatureId {
        // Reuse the first free slot; the bumped generation keeps old handles
        // from resolving to the newcomer.
        let index = self.slots.iter().position(|s| s.record.is_none());
        let id = match index {
            Some(index) => {
                let slot = &mut self.slots[index];
                slot.record = Some(record);
                FeatureId {
                    index,
                    generation: slot.generation,
                }
            }
            None => {
                self.slots.push(Slot {
                    generation: 0,
                    record: Some(record),
                });
                FeatureId {
                    index: self.slots.len() - 1,
                    generation: 0,
                }
            }
        };
        self.order.push(id);
        id
    }

    /// Resolves a handle.
    #[must_use]
    pub fn get(&self, id: FeatureId) -> Option<&FeatureRecord> {
        let slot = self.slots.get(id.index)?;
        if slot.generation != id.generation {
            return None;
        }
        slot.record.as_ref()
    }

    /// Resolves a handle mutably.
    pub fn get_mut(&mut self, id: FeatureId) -> Option<&mut FeatureRecord> {
        let slot = self.slots.get_mut(id.index)?;
        if slot.generation != id.generation {
            return None;
        }
        slot.record.as_mut()
    }

    /// Removes a feature and its bodies. Outstanding handles go stale.
    pub fn remove(&mut self, id: FeatureId) -> Option<FeatureRecord> {
        let slot = self.slots.get_mut(id.index)?;
        if slot.generation != id.generation {
            return None;
        }
        let record = slot.record.take()?;
        slot.generation = slot.generation.wrapping_add(1);
        self.order.retain(|ordered| *ordered != id);
        for body in &record.bodies {
            if let Some(entry) = self.bodies.get_mut(body.0) {
                *entry = None;
            }
        }
        Some(record)
    }

    /// Removes every feature and body.
    pub fn clear(&mut self) {
        for slot in &mut self.slots {
            if slot.record.take().is_some() {
                slot.generation = slot.generation.wrapping_add(1);
            }
        }
        self.order.clear();
        self.bodies.clear();
    }

    /// Number of live features.
    #[must_use]
    pub fn len(&self) -> usize {
        self.order.len()
    }

    /// `true` when the history is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Features in creation order.
    pub fn iter(&self) -> impl Iterator<Item = (FeatureId, &FeatureRecord)> {
        self.order.iter().filter_map(|id| Some((*id, self.get(*id)?)))
    }

    /// Display names of all features, in creation order.
    #[must_use]
    pub fn feature_names(&self) -> Vec<String> {
        self.iter().map(|(_, record)| record.name.clone()).collect()
    }

    /// Flips a feature's suppression state. Returns the previous state, or
    /// `None` for a stale handle.
    pub fn set_suppressed(&mut self, id: FeatureId, suppressed: bool) -> Option<bool> {
        let record = self.get_mut(id)?;
        let previous = record.suppressed;
        record.suppressed = suppressed;
        Some(previous)
    }

    /// Registers a body for a feature and returns its handle.
    pub fn add_body(&mut self, feature: FeatureId, body: Body) -> BodyId {
        self.bodies.push(Some(body));
        let id = BodyId(self.bodies.len() - 1);
        if let Some(record) = self.get_mut(feature) {
            record.bodies.push(id);
        }
        id
    }

    /// Resolves a body handle.
    #[must_use]
    pub fn body(&self, id: BodyId) -> Option<&Body> {
        self.bodies.get(id.0).and_then(Option::as_ref)
    }

    /// Resolves a body handle mutably.
    pub fn body_mut(&mut self, id: BodyId) -> Option<&mut Body> {
        self.bodies.get_mut(id.0).and_then(Option::as_mut)
    }

    /// Bodies whose creating feature exists and is not suppressed.
    pub fn active_bodies(&self) -> impl Iterator<Item = (BodyId, &Body)> {
        self.bodies
            .iter()
            .enumerate()
            .filter_map(|(index, body)| Some((BodyId(index), body.as_ref()?)))
            .filter(|(_, body)| {
                self.get(body.created_by)
                    .is_some_and(|record| !record.suppressed)
            })
    }

    /// Number of active bodies.
    #[must_use]
    pub fn active_body_count(&self) -> usize {
        self.active_bodies().count()
    }

    /// Sum of active body volumes.
    #[must_use]
    pub fn total_volume(&self) -> f64 {
        self.active_bodies().map(|(_, body)| body.volume).sum()
    }

    /// Replays the history: re-evaluates every driven dimension, then
    /// rebuilds every body volume in creation order. Returns the number of
    /// dimensions whose value moved.
    pub fn recompute(&mut self, table: &UserParameterTable) -> Result<usize, ExprError> {
        let mut moved = 0;
        let order = self.order.clone();
        for id in &order {
            let Some(record) = self.get_mut(*id) else {
                continue;
            };
            if record.kind.recompute_dims(table)? {
                moved += 1;
            }
        }
        for id in &order {
            self.replay_feature(*id);
        }
        Ok(moved)
    }

    /// Restores parsed expressions after deserialisation.
    pub fn reparse(&mut self) -> Result<(), ExprError> {
        for slot in &mut self.slots {
            if let Some(record) = &mut slot.record {
                record.kind.reparse()?;
            }
        }
        Ok(())
    }

    fn replay_feature(&mut self, id: FeatureId) {
        enum Effect {
            None,
            Profile {
                operation: Operation,
                volume: f64,
                bodies: Vec<BodyId>,
            },
            Copies {
                bodies: Vec<BodyId>,
                volumes: Vec<f64>,
                copies: usize,
            },
            Shave {
                target: BodyId,
                removed: f64,
            },
        }

        let effect = {
            let Some(record) = self.get(id) else {
                return;
            };
            if record.suppressed {
                return;
            }
            match &record.kind {
                FeatureKind::Plane { .. }
                | FeatureKind::Sketch { .. }
                | FeatureKind::Thread { .. } => Effect::None,
                FeatureKind::Extrude {
                    profile,
                    distance,
                    operation,
                } => Effect::Profile {
                    operation: *operation,
                    volume: profile.area() * distance.value().abs(),
                    bodies: record.bodies.clone(),
                },
                FeatureKind::Revolve {
                    profile,
                    centroid_radius,
                    angle_deg,
                    operation,
                } => Effect::Profile {
                    operation: *operation,
                    // Pappus: V = 2π R̄ A, scaled by the swept fraction.
                    volume: std::f64::consts::TAU
                        * centroid_radius.value().abs()
                        * profile.area()
                        * (angle_deg / 360.0),
                    bodies: record.bodies.clone(),
                },
                FeatureKind::Sweep {
                    profile,
                    path_length,
                    operation,
                } => Effect::Profile {
                    operation: *operation,
                    volume: profile.area() * path_length.value().abs(),
                    bodies: record.bodies.clone(),
                },
                FeatureKind::Mirror { sources, .. } => Effect::Copies {
                    bodies: record.bodies.clone(),
                    volumes: self.source_volumes(sources),
                    copies: 1,
                },
                FeatureKind::RectangularPattern {
                    sources,
                    quantity_one,
                    quantity_two,
                    ..
                } => Effect::Copies {
                    bodies: record.bodies.clone(),
                    volumes: self.source_volumes(sources),
                    copies: (quantity_one * quantity_two).saturating_sub(1) as usize,
                },
                FeatureKind::Chamfer {
                    target,
                    distance_one,
                    distance_two,
                    edge_length,
                } => Effect::Shave {
                    target: *target,
                    removed: (distance_one.value() * distance_two.value() / 2.0
                        * edge_length.value())
                    .abs(),
                },
                FeatureKind::Fillet {
                    target,
                    radius,
                    edge_length,
                } => {
                    let r = radius.value();
                    Effect::Shave {
                        target: *target,
                        removed: ((1.0 - std::f64::consts::FRAC_PI_4) * r * r
                            * edge_length.value())
                        .abs(),
                    }
                }
            }
        };

        match effect {
            Effect::None => {}
            Effect::Profile {
                operation,
                volume,
                bodies,
            } => self.apply_volume(operation, volume, &bodies),
            Effect::Copies {
                bodies,
                volumes,
                copies,
            } => self.assign_copy_volumes(&bodies, &volumes, copies),
            Effect::Shave { target, removed } => {
                if let Some(body) = self.body_mut(target) {
                    body.volume = (body.volume - removed).max(0.0);
                }
            }
        }
    }

    fn apply_volume(&mut self, operation: Operation, volume: f64, bodies: &[BodyId]) {
        match operation {
            Operation::NewBody => {
                for id in bodies {
                    if let Some(body) = self.body_mut(*id) {
                        body.volume = volume;
                    }
                }
            }
            Operation::Join { target } => {
                if let Some(body) = self.body_mut(target) {
                    body.volume += volume;
                }
            }
            Operation::Cut { target } => {
                if let Some(body) = self.body_mut(target) {
                    body.volume = (body.volume - volume).max(0.0);
                }
            }
        }
    }

    /// Current volumes of the bodies of the given source features, in
    /// deterministic source-then-body order.
    fn source_volumes(&self, sources: &[FeatureId]) -> Vec<f64> {
        let mut volumes = Vec::new();
        for source in sources {
            if let Some(record) = self.get(*source) {
                for body in &record.bodies {
                    if let Some(body) = self.body(*body) {
                        volumes.push(body.volume);
                    }
                }
            }
        }
        volumes
    }

    /// Copies run grouped by source body: `copies` instances of source 0,
    /// then `copies` of source 1, and so on - the order copy bodies were
    /// allocated at creation.
    fn assign_copy_volumes(&mut self, bodies: &[BodyId], volumes: &[f64], copies: usize) {
        for (slot, id) in bodies.iter().enumerate() {
            let source = if copies == 0 { 0 } else { slot / copies };
            let Some(volume) = volumes.get(source).copied() else {
                continue;
            };
            if let Some(body) = self.body_mut(*id) {
                body.volume = volume;
            }
        }
    }
}
