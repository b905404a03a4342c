//! Land-pattern (footprint) generation.
//!
//! An independent, stateless pipeline next to the solid generator: an
//! IPC-style XML package description comes in, pad, silkscreen and legend
//! sketches come out. Every run fully replaces the previous drawing;
//! nothing is patched incrementally.
//!
//! The pad sketch is deleted and recreated per run. Package documents
//! pre-create the silkscreen sketch and mark it non-modifiable, so it is
//! cleared in place and reused, as is the legend sketch; both are created
//! when a component arrives without them.

pub mod draw;
pub mod xml;

use crate::error::{GenerateError, GenerateResult};
use crate::model::sketch::{Sketch, SketchPlane};
use crate::model::{Component, ComponentId, Design, SketchId};

use self::xml::FootprintPackage;

/// Sketch receiving pad outlines.
pub const PAD_SKETCH: &str = "Pad";
/// Sketch receiving silkscreen wires and circles.
pub const SILKSCREEN_SKETCH: &str = "Silkscreen";
/// Sketch receiving legend text.
pub const TEXT_SKETCH: &str = "Text";

/// Attribute group the drawn package's metadata is stored under.
const ATTRIBUTE_GROUP: &str = "footprint";

/// Stateless generator for 2D land patterns.
pub struct FootprintGenerator;

impl FootprintGenerator {
    /// Draws the land pattern described by `payload` into `component`.
    ///
    /// The payload may hold any number of `<package>` elements (typically
    /// one); all are drawn, and the last one's name and verbatim source
    /// are stored as component attributes. Returns the stored name, or
    /// `None` when the payload holds no package. The payload is parsed
    /// before any sketch is touched, so a malformed payload leaves the
    /// previous drawing in place.
    pub fn generate(
        design: &mut Design,
        component: ComponentId,
        payload: &str,
    ) -> GenerateResult<Option<String>> {
        let packages = xml::parse_packages(payload)?;

        let Some(target) = design.component_mut(component) else {
            return Err(GenerateError::unsupported_state(
                format!("component #{}", component.0),
                "target component does not exist",
            ));
        };

        if let Some(pads) = target.sketch_named(PAD_SKETCH) {
            target.remove_sketch(pads);
        }
        let pad_sketch = target.add_sketch(Sketch::new(PAD_SKETCH, SketchPlane::default()));
        let silk_sketch = reuse_or_create(target, SILKSCREEN_SKETCH);
        let text_sketch = reuse_or_create(target, TEXT_SKETCH);
        sketch_on(target, silk_sketch).curves.clear();
        sketch_on(target, text_sketch).texts.clear();

        for package in &packages {
            draw_package(target, package, pad_sketch, silk_sketch, text_sketch);
        }

        let Some(last) = packages.last() else {
            return Ok(None);
        };
        target.set_attribute(ATTRIBUTE_GROUP, "xml", last.source.clone());
        target.set_attribute(ATTRIBUTE_GROUP, "name", last.name.clone());
        tracing::info!(
            name = %last.name,
            pads = last.smds.len() + last.pads.len(),
            "footprint drawn"
        );
        Ok(Some(last.name.clone()))
    }

    /// Whether the component already carries drawn footprint content in
    /// any of the three sketches.
    #[must_use]
    pub fn exists(design: &Design, component: ComponentId) -> bool {
        let Some(target) = design.component(component) else {
            return false;
        };
        has_curves(target, PAD_SKETCH)
            || has_curves(target, SILKSCREEN_SKETCH)
            || has_texts(target, TEXT_SKETCH)
    }
}

fn draw_package(
    component: &mut Component,
    package: &FootprintPackage,
    pad_sketch: SketchId,
    silk_sketch: SketchId,
    text_sketch: SketchId,
) {
    let pads = sketch_on(component, pad_sketch);
    for smd in &package.smds {
        draw::smd_pad(pads, smd);
    }
    for pad in &package.pads {
        draw::thru_hole_pad(pads, pad);
    }

    let silk = sketch_on(component, silk_sketch);
    for wire in &package.wires {
        draw::silk_wire(silk, wire);
    }
    for circle in &package.circles {
        draw::silk_circle(silk, circle);
    }

    let legend = sketch_on(component, text_sketch);
    for text in &package.texts {
        draw::legend_text(legend, text);
    }
}

fn reuse_or_create(component: &mut Component, name: &str) -> SketchId {
    component
        .sketch_named(name)
        .unwrap_or_else(|| component.add_sketch(Sketch::new(name, SketchPlane::default())))
}

fn sketch_on(component: &mut Component, id: SketchId) -> &mut Sketch {
    component
        .sketch_mut(id)
        .unwrap_or_else(|| unreachable!("sketch resolved by this run"))
}

fn has_curves(component: &Component, name: &str) -> bool {
    component
        .sketch_named(name)
        .and_then(|id| component.sketch(id))
        .is_some_and(|sketch| sketch.curve_count() > 0)
}

fn has_texts(component: &Component, name: &str) -> bool {
    component
        .sketch_named(name)
        .and_then(|id| component.sketch(id))
        .is_some_and(|sketch| !sketch.texts.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::sketch::Point2;

    const RESISTOR: &str = r#"<package name="RESC1005X40">
  <smd x="-0.485" y="0" dx="0.56" dy="0.62" layer="1"/>
  <smd x="0.485" y="0" dx="0.56" dy="0.62" layer="1"/>
  <wire x1="-0.27" y1="0.35" x2="0.27" y2="0.35" width="0.1" layer="21"/>
  <wire x1="-0.27" y1="-0.35" x2="0.27" y2="-0.35" width="0.1" layer="21"/>
  <wire x1="-0.8" y1="0.6" x2="0.8" y2="0.6" width="0.05" layer="39"/>
  <circle x="-1.2" y="0" radius="0.1" width="0.1" layer="21"/>
  <text x="0" y="1" size="0.5" layer="25" align="bottom-center">&gt;NAME</text>
  <text x="0" y="-1" size="0.5" layer="39" align="top-center">&gt;VALUE</text>
</package>"#;

    fn design_with_footprint() -> Design {
        let mut design = Design::new("footprints");
        let root = design.root();
        FootprintGenerator::generate(&mut design, root, RESISTOR).unwrap();
        design
    }

    fn sketch<'a>(design: &'a Design, name: &str) -> &'a Sketch {
        let component = design.component(design.root()).unwrap();
        let id = component.sketch_named(name).unwrap();
        component.sketch(id).unwrap()
    }

    #[test]
    fn draws_all_three_sketches() {
        let mut design = Design::new("footprints");
        let root = design.root();
        let name = FootprintGenerator::generate(&mut design, root, RESISTOR).unwrap();
        assert_eq!(name.as_deref(), Some("RESC1005X40"));

        // Two plain rectangles.
        assert_eq!(sketch(&design, PAD_SKETCH).line_count(), 8);
        // Two wires and a circle; the layer 39 wire is skipped.
        let silk = sketch(&design, SILKSCREEN_SKETCH);
        assert_eq!(silk.line_count(), 2);
        assert_eq!(silk.circle_count(), 1);
        // One legend entry; the layer 39 text is skipped.
        let legend = sketch(&design, TEXT_SKETCH);
        assert_eq!(legend.texts.len(), 1);
        assert_eq!(legend.texts[0].text, ">NAME");
        assert!(FootprintGenerator::exists(&design, root));
    }

    #[test]
    fn regeneration_is_idempotent() {
        let mut design = design_with_footprint();
        let root = design.root();
        let pads = sketch(&design, PAD_SKETCH).curves.clone();
        let silk = sketch(&design, SILKSCREEN_SKETCH).curves.clone();
        let texts = sketch(&design, TEXT_SKETCH).texts.clone();

        FootprintGenerator::generate(&mut design, root, RESISTOR).unwrap();
        assert_eq!(sketch(&design, PAD_SKETCH).curves, pads);
        assert_eq!(sketch(&design, SILKSCREEN_SKETCH).curves, silk);
        assert_eq!(sketch(&design, TEXT_SKETCH).texts, texts);
        assert_eq!(design.component(design.root()).unwrap().sketch_count(), 3);
    }

    #[test]
    fn attributes_store_name_and_fragment() {
        let design = design_with_footprint();
        let component = design.component(design.root()).unwrap();
        assert_eq!(
            component.attribute("footprint", "name"),
            Some("RESC1005X40")
        );
        let fragment = component.attribute("footprint", "xml").unwrap();
        assert!(fragment.starts_with("<package name=\"RESC1005X40\""));
        assert!(fragment.ends_with("</package>"));
    }

    #[test]
    fn silkscreen_sketch_is_reused_in_place() {
        let mut design = Design::new("footprints");
        let root = design.root();
        let silk_id = {
            let component = design.component_mut(root).unwrap();
            let id = component.add_sketch(Sketch::new(SILKSCREEN_SKETCH, SketchPlane::default()));
            // Stray content from the package document.
            component
                .sketch_mut(id)
                .unwrap()
                .add_line(Point2::new(0.0, 0.0), Point2::new(1.0, 1.0));
            id
        };

        FootprintGenerator::generate(&mut design, root, RESISTOR).unwrap();
        let component = design.component(design.root()).unwrap();
        assert_eq!(component.sketch_named(SILKSCREEN_SKETCH), Some(silk_id));
        let silk = component.sketch(silk_id).unwrap();
        // The stray line was cleared before redrawing.
        assert_eq!(silk.line_count(), 2);
        assert_eq!(silk.circle_count(), 1);
    }

    #[test]
    fn empty_payload_clears_and_reports_none() {
        let mut design = design_with_footprint();
        let root = design.root();
        let name = FootprintGenerator::generate(&mut design, root, "<library><packages/></library>")
            .unwrap();
        assert_eq!(name, None);
        assert_eq!(sketch(&design, PAD_SKETCH).curve_count(), 0);
        assert_eq!(sketch(&design, SILKSCREEN_SKETCH).curve_count(), 0);
        assert!(sketch(&design, TEXT_SKETCH).texts.is_empty());
        assert!(!FootprintGenerator::exists(&design, root));
        // The previous package's metadata stays.
        assert_eq!(
            design
                .component(design.root())
                .unwrap()
                .attribute("footprint", "name"),
            Some("RESC1005X40")
        );
    }

    #[test]
    fn malformed_payload_leaves_the_drawing_alone() {
        let mut design = design_with_footprint();
        let root = design.root();
        let err = FootprintGenerator::generate(&mut design, root, "<package name=\"X\"")
            .unwrap_err();
        assert!(matches!(err, GenerateError::FootprintXml { .. }));
        assert_eq!(sketch(&design, PAD_SKETCH).line_count(), 8);
    }

    #[test]
    fn missing_component_is_an_error() {
        let mut design = Design::new("footprints");
        let err = FootprintGenerator::generate(&mut design, ComponentId(42), RESISTOR)
            .unwrap_err();
        assert!(matches!(err, GenerateError::UnsupportedState { .. }));
    }

    #[test]
    fn last_package_wins_the_metadata() {
        let mut design = Design::new("footprints");
        let root = design.root();
        let payload = r#"<library><packages>
  <package name="FIRST"><smd x="0" y="0" dx="1" dy="1"/></package>
  <package name="SECOND"><smd x="0" y="0" dx="2" dy="1"/></package>
</packages></library>"#;
        let name = FootprintGenerator::generate(&mut design, root, payload).unwrap();
        assert_eq!(name.as_deref(), Some("SECOND"));
        // Both packages draw into the shared pad sketch.
        assert_eq!(sketch(&design, PAD_SKETCH).line_count(), 8);
        let component = design.component(design.root()).unwrap();
        assert_eq!(component.attribute("footprint", "name"), Some("SECOND"));
        assert!(component
            .attribute("footprint", "xml")
            .unwrap()
            .contains("SECOND"));
    }
}
