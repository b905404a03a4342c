//! 3D feature primitives.
//!
//! [`Ops`] wraps a component during a create pass and turns builder
//! intent into history records: profile solids, copies, edge breaks and
//! threads. Every numeric argument goes through [`Arg`], which binds it
//! to a driving expression in parametric mode and leaves it literal
//! otherwise, so builders never special-case the mode themselves.
//!
//! The free functions at the bottom are the update-path patches: the few
//! dimension kinds no expression can carry (irregular lead areas, formed
//! path lengths, thread specs) are rewritten in place and picked up by
//! the replay that follows.

use crate::error::{GenerateError, GenerateResult};
use crate::generator::threads::ThreadSpec;
use crate::model::expr::ExprError;
use crate::model::feature::{Operation, ProfileSpec};
use crate::model::material::{Finish, Rgb};
use crate::model::{
    BasePlane, Body, BodyId, Component, Dim, FeatureId, FeatureKey, FeatureKind, FeatureRecord,
    Sketch, SketchId, SketchPlane, UserParameterTable,
};

/// A numeric argument: a value and the expression that drives it in
/// parametric mode. An empty expression always stays literal.
#[derive(Debug, Clone, Copy)]
pub struct Arg<'a> {
    value: f64,
    expression: &'a str,
}

impl<'a> Arg<'a> {
    /// A literal value.
    #[must_use]
    pub const fn lit(value: f64) -> Self {
        Self {
            value,
            expression: "",
        }
    }

    /// A value driven by `expression` when parametric mode is on.
    #[must_use]
    pub const fn expr(value: f64, expression: &'a str) -> Self {
        Self { value, expression }
    }

    /// The current value.
    #[must_use]
    pub const fn value(&self) -> f64 {
        self.value
    }

    fn dim(&self, parametric: bool, table: &UserParameterTable) -> Result<Dim, ExprError> {
        Dim::bound(self.value, self.expression, parametric, table)
    }
}

/// Handles to a feature and the body it created.
#[derive(Debug, Clone, Copy)]
pub struct BodyRef {
    /// The creating feature.
    pub feature: FeatureId,
    /// The created body.
    pub body: BodyId,
}

/// One builder's view of the component during a create pass.
pub struct Ops<'a> {
    component: &'a mut Component,
    table: &'a UserParameterTable,
    parametric: bool,
}

impl<'a> Ops<'a> {
    /// Wraps a component for geometry creation.
    pub fn new(
        component: &'a mut Component,
        table: &'a UserParameterTable,
        parametric: bool,
    ) -> Self {
        Self {
            component,
            table,
            parametric,
        }
    }

    /// Whether arguments bind to expressions.
    #[must_use]
    pub const fn parametric(&self) -> bool {
        self.parametric
    }

    /// The wrapped component, for attributes and indexing done inline.
    pub fn component(&mut self) -> &mut Component {
        self.component
    }

    /// Creates a named sketch on `plane` and records it in the history so
    /// teardown removes it with the rest of the build.
    pub fn sketch(&mut self, name: &str, plane: SketchPlane) -> SketchId {
        let id = self.component.add_sketch(Sketch::new(name, plane));
        self.component.history.add(FeatureRecord::new(
            name.to_owned(),
            FeatureKind::Sketch { sketch: id },
        ));
        id
    }

    /// The sketch behind a handle returned by [`Ops::sketch`].
    pub fn sketch_mut(&mut self, id: SketchId) -> &mut Sketch {
        self.component
            .sketch_mut(id)
            .unwrap_or_else(|| unreachable!("sketch created by this pass"))
    }

    /// A rectangle profile.
    pub fn rect(&self, width: Arg<'_>, height: Arg<'_>) -> GenerateResult<ProfileSpec> {
        Ok(ProfileSpec::Rectangle {
            width: width.dim(self.parametric, self.table)?,
            height: height.dim(self.parametric, self.table)?,
        })
    }

    /// A rounded-rectangle profile.
    pub fn rounded_rect(
        &self,
        width: Arg<'_>,
        height: Arg<'_>,
        corner_radius: Arg<'_>,
    ) -> GenerateResult<ProfileSpec> {
        Ok(ProfileSpec::RoundedRectangle {
            width: width.dim(self.parametric, self.table)?,
            height: height.dim(self.parametric, self.table)?,
            corner_radius: corner_radius.dim(self.parametric, self.table)?,
        })
    }

    /// A circle profile.
    pub fn circle(&self, radius: Arg<'_>) -> GenerateResult<ProfileSpec> {
        Ok(ProfileSpec::Circle {
            radius: radius.dim(self.parametric, self.table)?,
        })
    }

    /// An annulus profile.
    pub fn ring(&self, outer_radius: Arg<'_>, inner_radius: Arg<'_>) -> GenerateResult<ProfileSpec> {
        Ok(ProfileSpec::Ring {
            outer_radius: outer_radius.dim(self.parametric, self.table)?,
            inner_radius: inner_radius.dim(self.parametric, self.table)?,
        })
    }

    /// An irregular profile with an externally computed area.
    #[must_use]
    pub const fn area(&self, area: f64) -> ProfileSpec {
        ProfileSpec::Area {
            area: Dim::literal(area),
        }
    }

    /// A construction plane offset from a base plane.
    pub fn plane(&mut self, name: &str, base: BasePlane, offset: Arg<'_>) -> GenerateResult<FeatureId> {
        let offset = offset.dim(self.parametric, self.table)?;
        Ok(self.component.history.add(FeatureRecord::new(
            name.to_owned(),
            FeatureKind::Plane { base, offset },
        )))
    }

    /// Extrudes a profile into a new body.
    pub fn extrude(
        &mut self,
        name: &str,
        profile: ProfileSpec,
        distance: Arg<'_>,
        body_name: &str,
        finish: Finish,
    ) -> GenerateResult<BodyRef> {
        let distance = distance.dim(self.parametric, self.table)?;
        Ok(self.solid(
            name,
            FeatureKind::Extrude {
                profile,
                distance,
                operation: Operation::NewBody,
            },
            body_name,
            finish,
        ))
    }

    /// Extrudes a profile, cutting it out of `target`.
    pub fn extrude_cut(
        &mut self,
        name: &str,
        profile: ProfileSpec,
        distance: Arg<'_>,
        target: BodyId,
    ) -> GenerateResult<FeatureId> {
        let distance = distance.dim(self.parametric, self.table)?;
        Ok(self.component.history.add(FeatureRecord::new(
            name.to_owned(),
            FeatureKind::Extrude {
                profile,
                distance,
                operation: Operation::Cut { target },
            },
        )))
    }

    /// Extrudes a profile, joining it onto `target`.
    pub fn extrude_join(
        &mut self,
        name: &str,
        profile: ProfileSpec,
        distance: Arg<'_>,
        target: BodyId,
    ) -> GenerateResult<FeatureId> {
        let distance = distance.dim(self.parametric, self.table)?;
        Ok(self.component.history.add(FeatureRecord::new(
            name.to_owned(),
            FeatureKind::Extrude {
                profile,
                distance,
                operation: Operation::Join { target },
            },
        )))
    }

    /// Revolves a profile about an axis at `centroid_radius` from its
    /// centroid into a new body.
    pub fn revolve(
        &mut self,
        name: &str,
        profile: ProfileSpec,
        centroid_radius: Arg<'_>,
        angle_deg: f64,
        body_name: &str,
        finish: Finish,
    ) -> GenerateResult<BodyRef> {
        let centroid_radius = centroid_radius.dim(self.parametric, self.table)?;
        Ok(self.solid(
            name,
            FeatureKind::Revolve {
                profile,
                centroid_radius,
                angle_deg,
                operation: Operation::NewBody,
            },
            body_name,
            finish,
        ))
    }

    /// Revolves a profile, cutting it out of `target`.
    pub fn revolve_cut(
        &mut self,
        name: &str,
        profile: ProfileSpec,
        centroid_radius: Arg<'_>,
        angle_deg: f64,
        target: BodyId,
    ) -> GenerateResult<FeatureId> {
        let centroid_radius = centroid_radius.dim(self.parametric, self.table)?;
        Ok(self.component.history.add(FeatureRecord::new(
            name.to_owned(),
            FeatureKind::Revolve {
                profile,
                centroid_radius,
                angle_deg,
                operation: Operation::Cut { target },
            },
        )))
    }

    /// Revolves a profile, joining it onto `target`.
    pub fn revolve_join(
        &mut self,
        name: &str,
        profile: ProfileSpec,
        centroid_radius: Arg<'_>,
        angle_deg: f64,
        target: BodyId,
    ) -> GenerateResult<FeatureId> {
        let centroid_radius = centroid_radius.dim(self.parametric, self.table)?;
        Ok(self.component.history.add(FeatureRecord::new(
            name.to_owned(),
            FeatureKind::Revolve {
                profile,
                centroid_radius,
                angle_deg,
                operation: Operation::Join { target },
            },
        )))
    }

    /// Sweeps a profile along a path into a new body.
    pub fn sweep(
        &mut self,
        name: &str,
        profile: ProfileSpec,
        path_length: Arg<'_>,
        body_name: &str,
        finish: Finish,
    ) -> GenerateResult<BodyRef> {
        let path_length = path_length.dim(self.parametric, self.table)?;
        Ok(self.solid(
            name,
            FeatureKind::Sweep {
                profile,
                path_length,
                operation: Operation::NewBody,
            },
            body_name,
            finish,
        ))
    }

    /// Sweeps a profile along a path, cutting it out of `target`.
    pub fn sweep_cut(
        &mut self,
        name: &str,
        profile: ProfileSpec,
        path_length: Arg<'_>,
        target: BodyId,
    ) -> GenerateResult<FeatureId> {
        let path_length = path_length.dim(self.parametric, self.table)?;
        Ok(self.component.history.add(FeatureRecord::new(
            name.to_owned(),
            FeatureKind::Sweep {
                profile,
                path_length,
                operation: Operation::Cut { target },
            },
        )))
    }

    /// Mirrors the bodies of `sources` across a base plane. One copy body
    /// per source body, allocated in source order.
    pub fn mirror(&mut self, name: &str, sources: &[FeatureId], plane: BasePlane) -> FeatureId {
        let copies = self.copy_stubs(sources, 1);
        let feature = self.component.history.add(FeatureRecord::new(
            name.to_owned(),
            FeatureKind::Mirror {
                sources: sources.to_vec(),
                plane,
            },
        ));
        self.add_copies(feature, copies);
        feature
    }

    /// Patterns the bodies of `sources` along one or two directions.
    /// Quantities count the seed, so `quantity_one * quantity_two - 1`
    /// copies appear per source body.
    pub fn pattern(
        &mut self,
        name: &str,
        sources: &[FeatureId],
        quantity_one: u32,
        distance_one: Arg<'_>,
        quantity_two: u32,
        distance_two: Arg<'_>,
    ) -> GenerateResult<FeatureId> {
        let quantity_one = quantity_one.max(1);
        let quantity_two = quantity_two.max(1);
        let per_source = (quantity_one * quantity_two - 1) as usize;
        let distance_one = distance_one.dim(self.parametric, self.table)?;
        let distance_two = distance_two.dim(self.parametric, self.table)?;

        let copies = self.copy_stubs(sources, per_source);
        let feature = self.component.history.add(FeatureRecord::new(
            name.to_owned(),
            FeatureKind::RectangularPattern {
                sources: sources.to_vec(),
                quantity_one,
                distance_one,
                quantity_two,
                distance_two,
            },
        ));
        self.add_copies(feature, copies);
        Ok(feature)
    }

    /// Chamfers edges of `target`, removing `d1 * d2 / 2` per unit edge.
    pub fn chamfer(
        &mut self,
        name: &str,
        target: BodyId,
        distance_one: Arg<'_>,
        distance_two: Arg<'_>,
        edge_length: Arg<'_>,
    ) -> GenerateResult<FeatureId> {
        let distance_one = distance_one.dim(self.parametric, self.table)?;
        let distance_two = distance_two.dim(self.parametric, self.table)?;
        let edge_length = edge_length.dim(self.parametric, self.table)?;
        Ok(self.component.history.add(FeatureRecord::new(
            name.to_owned(),
            FeatureKind::Chamfer {
                target,
                distance_one,
                distance_two,
                edge_length,
            },
        )))
    }

    /// Fillets convex edges of `target` at a constant radius.
    pub fn fillet(
        &mut self,
        name: &str,
        target: BodyId,
        radius: Arg<'_>,
        edge_length: Arg<'_>,
    ) -> GenerateResult<FeatureId> {
        let radius = radius.dim(self.parametric, self.table)?;
        let edge_length = edge_length.dim(self.parametric, self.table)?;
        Ok(self.component.history.add(FeatureRecord::new(
            name.to_owned(),
            FeatureKind::Fillet {
                target,
                radius,
                edge_length,
            },
        )))
    }

    /// Applies a thread to a cylindrical face of `target`.
    pub fn thread(
        &mut self,
        name: &str,
        target: BodyId,
        spec: &ThreadSpec,
        length: Arg<'_>,
        full_length: bool,
    ) -> GenerateResult<FeatureId> {
        let length = length.dim(self.parametric, self.table)?;
        Ok(self.component.history.add(FeatureRecord::new(
            name.to_owned(),
            FeatureKind::Thread {
                target,
                designation: spec.designation.clone(),
                major_diameter: spec.major_diameter,
                pitch: spec.pitch,
                length,
                full_length,
            },
        )))
    }

    /// Mirrors `source` across a plane, then patterns seed and mirror copy
    /// together along one direction. The standard two-row lead layout:
    /// `2 * quantity` lead bodies in total.
    pub fn mirror_and_pattern(
        &mut self,
        name: &str,
        source: FeatureId,
        plane: BasePlane,
        quantity: u32,
        spacing: Arg<'_>,
    ) -> GenerateResult<(FeatureId, FeatureId)> {
        let mirror = self.mirror(&format!("{name}Mirror"), &[source], plane);
        let pattern = self.pattern(
            &format!("{name}Pattern"),
            &[source, mirror],
            quantity,
            spacing,
            1,
            Arg::lit(0.0),
        )?;
        Ok((mirror, pattern))
    }

    /// The standard pin-1 marker: a construction plane on the body top and
    /// a shallow circular cut near the first-pin corner. Radius is one
    /// twentieth of the body width, inset one tenth from both edges; the
    /// radius is literal, so width changes repatch it on update.
    pub fn pin_one_mark(
        &mut self,
        target: BodyId,
        height: Arg<'_>,
        depth: Arg<'_>,
        body_length: f64,
        body_width: f64,
    ) -> GenerateResult<FeatureId> {
        self.plane("PinOneMarkPlaneXy", BasePlane::Xy, height)?;
        let sketch = self.sketch(
            "PinOneMarkSketch",
            SketchPlane::offset_from(BasePlane::Xy, height.value()),
        );
        let radius = body_width / 20.0;
        let inset = body_width / 10.0;
        let center = crate::model::Point2::new(
            -body_width / 2.0 + inset + radius,
            body_length / 2.0 - inset - radius,
        );
        self.sketch_mut(sketch).add_circle(center, radius);
        let profile = ProfileSpec::Circle {
            radius: Dim::literal(radius),
        };
        self.extrude_cut("PinOneMark", profile, depth, target)
    }

    /// The standard exposed pad under the body: an aluminium slab kept in
    /// the history whether or not the thermal flag is set, so the flag can
    /// toggle it by suppression alone.
    pub fn thermal_pad(
        &mut self,
        width: Arg<'_>,
        length: Arg<'_>,
        thickness: Arg<'_>,
        plane_offset: Arg<'_>,
    ) -> GenerateResult<BodyRef> {
        self.plane("ThermalPlaneOffset", BasePlane::Xy, plane_offset)?;
        let sketch = self.sketch(
            "ThermalSketch",
            SketchPlane::offset_from(BasePlane::Xy, plane_offset.value()),
        );
        crate::generator::sketch_ops::center_rectangle(
            self.sketch_mut(sketch),
            crate::model::Point2::new(0.0, 0.0),
            width.value(),
            length.value(),
        );
        let profile = self.rect(width, length)?;
        self.extrude(
            "ThermalPad",
            profile,
            thickness,
            "ThermalPad",
            Finish::of(crate::model::material::Material::Aluminium),
        )
    }

    /// Indexes a feature under a stable key for later update passes.
    pub fn index(&mut self, key: FeatureKey, feature: FeatureId) {
        self.component.index_feature(key, feature);
    }

    /// Replays the history once, assigning every body volume.
    pub fn commit(&mut self) -> GenerateResult<()> {
        self.component.history.recompute(self.table)?;
        Ok(())
    }

    fn solid(&mut self, name: &str, kind: FeatureKind, body_name: &str, finish: Finish) -> BodyRef {
        let feature = self
            .component
            .history
            .add(FeatureRecord::new(name.to_owned(), kind));
        let body = self.component.history.add_body(
            feature,
            Body {
                name: body_name.to_owned(),
                finish,
                volume: 0.0,
                created_by: feature,
            },
        );
        BodyRef { feature, body }
    }

    /// Names and finishes for the copy bodies of a mirror or pattern,
    /// grouped by source body the way the replay expects.
    fn copy_stubs(&self, sources: &[FeatureId], per_source: usize) -> Vec<(String, Finish)> {
        let mut stubs = Vec::new();
        for source in sources {
            let Some(record) = self.component.history.get(*source) else {
                continue;
            };
            for body_id in &record.bodies {
                let Some(body) = self.component.history.body(*body_id) else {
                    continue;
                };
                for copy in 0..per_source {
                    stubs.push((format!("{} {}", body.name, copy + 2), body.finish));
                }
            }
        }
        stubs
    }

    fn add_copies(&mut self, feature: FeatureId, copies: Vec<(String, Finish)>) {
        for (name, finish) in copies {
            self.component.history.add_body(
                feature,
                Body {
                    name,
                    finish,
                    volume: 0.0,
                    created_by: feature,
                },
            );
        }
    }
}

fn indexed(component: &Component, key: FeatureKey) -> GenerateResult<FeatureId> {
    component
        .indexed(key)
        .ok_or_else(|| GenerateError::structural_mismatch(key.0, component.name.clone()))
}

/// Replaces the finish of an indexed feature's bodies outright. Families
/// whose update path swaps materials (glass against ceramic on MELF
/// bodies, say) come through here.
pub fn refinish_indexed(
    component: &mut Component,
    key: FeatureKey,
    finish: Finish,
) -> GenerateResult<()> {
    let feature = indexed(component, key)?;
    let bodies = component
        .history
        .get(feature)
        .map(|record| record.bodies.clone())
        .unwrap_or_default();
    for id in bodies {
        if let Some(body) = component.history.body_mut(id) {
            body.finish = finish;
        }
    }
    Ok(())
}

/// Repaints the bodies of an indexed feature. Colour-only refreshes come
/// through here without touching geometry.
pub fn recolour_indexed(component: &mut Component, key: FeatureKey, rgb: Rgb) -> GenerateResult<()> {
    let feature = indexed(component, key)?;
    let bodies = component
        .history
        .get(feature)
        .map(|record| record.bodies.clone())
        .unwrap_or_default();
    for id in bodies {
        if let Some(body) = component.history.body_mut(id) {
            body.finish.rgb = Some(rgb);
        }
    }
    Ok(())
}

/// Replaces the literal area of an indexed profile feature. Irregular
/// lead outlines re-derive their area on update and push it in here.
pub fn set_indexed_area(component: &mut Component, key: FeatureKey, area: f64) -> GenerateResult<()> {
    let feature = indexed(component, key)?;
    let name = component.name.clone();
    let record = component
        .history
        .get_mut(feature)
        .ok_or_else(|| GenerateError::structural_mismatch(key.0, name.clone()))?;
    match &mut record.kind {
        FeatureKind::Extrude { profile, .. }
        | FeatureKind::Revolve { profile, .. }
        | FeatureKind::Sweep { profile, .. } => {
            if let ProfileSpec::Area { area: dim } = profile {
                *dim = Dim::literal(area);
                return Ok(());
            }
            Err(GenerateError::structural_mismatch(key.0, name))
        }
        _ => Err(GenerateError::structural_mismatch(key.0, name)),
    }
}

/// Replaces the literal distance of an indexed extrude. Extents that
/// chase another face, like a no-lead body sitting on its own terminal
/// stock, are re-measured on update and pushed in here.
pub fn set_indexed_distance(
    component: &mut Component,
    key: FeatureKey,
    distance: f64,
) -> GenerateResult<()> {
    let feature = indexed(component, key)?;
    let name = component.name.clone();
    let record = component
        .history
        .get_mut(feature)
        .ok_or_else(|| GenerateError::structural_mismatch(key.0, name.clone()))?;
    if let FeatureKind::Extrude { distance: dim, .. } = &mut record.kind {
        *dim = Dim::literal(distance);
        return Ok(());
    }
    Err(GenerateError::structural_mismatch(key.0, name))
}

/// Replaces the literal radius of an indexed circular-profile feature.
/// The pin-1 mark resizes this way when the body width moves.
pub fn set_indexed_radius(
    component: &mut Component,
    key: FeatureKey,
    radius: f64,
) -> GenerateResult<()> {
    let feature = indexed(component, key)?;
    let name = component.name.clone();
    let record = component
        .history
        .get_mut(feature)
        .ok_or_else(|| GenerateError::structural_mismatch(key.0, name.clone()))?;
    match &mut record.kind {
        FeatureKind::Extrude { profile, .. }
        | FeatureKind::Revolve { profile, .. }
        | FeatureKind::Sweep { profile, .. } => {
            if let ProfileSpec::Circle { radius: dim } = profile {
                *dim = Dim::literal(radius);
                return Ok(());
            }
            Err(GenerateError::structural_mismatch(key.0, name))
        }
        _ => Err(GenerateError::structural_mismatch(key.0, name)),
    }
}

/// Replaces the literal path length of an indexed sweep.
pub fn set_indexed_path_length(
    component: &mut Component,
    key: FeatureKey,
    length: f64,
) -> GenerateResult<()> {
    let feature = indexed(component, key)?;
    let name = component.name.clone();
    let record = component
        .history
        .get_mut(feature)
        .ok_or_else(|| GenerateError::structural_mismatch(key.0, name.clone()))?;
    if let FeatureKind::Sweep { path_length, .. } = &mut record.kind {
        *path_length = Dim::literal(length);
        return Ok(());
    }
    Err(GenerateError::structural_mismatch(key.0, name))
}

/// Rewrites the designation, diameter and pitch of an indexed thread.
pub fn set_indexed_thread(
    component: &mut Component,
    key: FeatureKey,
    spec: &ThreadSpec,
) -> GenerateResult<()> {
    let feature = indexed(component, key)?;
    let name = component.name.clone();
    let record = component
        .history
        .get_mut(feature)
        .ok_or_else(|| GenerateError::structural_mismatch(key.0, name.clone()))?;
    if let FeatureKind::Thread {
        designation,
        major_diameter,
        pitch,
        ..
    } = &mut record.kind
    {
        designation.clone_from(&spec.designation);
        *major_diameter = spec.major_diameter;
        *pitch = spec.pitch;
        return Ok(());
    }
    Err(GenerateError::structural_mismatch(key.0, name))
}

/// Replaces the literal threaded length of an indexed thread, for families
/// whose thread extent switches with a suppression flag.
pub fn set_indexed_thread_length(
    component: &mut Component,
    key: FeatureKey,
    length: f64,
) -> GenerateResult<()> {
    let feature = indexed(component, key)?;
    let name = component.name.clone();
    let record = component
        .history
        .get_mut(feature)
        .ok_or_else(|| GenerateError::structural_mismatch(key.0, name.clone()))?;
    if let FeatureKind::Thread { length: dim, .. } = &mut record.kind {
        *dim = Dim::literal(length);
        return Ok(());
    }
    Err(GenerateError::structural_mismatch(key.0, name))
}

/// The first body of an indexed feature, for update paths that resize or
/// re-target geometry against it.
pub fn indexed_body(component: &Component, key: FeatureKey) -> GenerateResult<BodyId> {
    let feature = indexed(component, key)?;
    component
        .history
        .get(feature)
        .and_then(|record| record.bodies.first().copied())
        .ok_or_else(|| GenerateError::structural_mismatch(key.0, component.name.clone()))
}
