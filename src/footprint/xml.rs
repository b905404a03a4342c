//! Footprint package descriptions.
//!
//! Parses the IPC-style XML subset the land-pattern pipeline consumes: one
//! or more `<package>` elements carrying `smd`, `pad`, `wire`, `circle` and
//! `text` children. The payload may be a bare package or a whole library
//! document; every package found is returned in document order, together
//! with its verbatim source text for the metadata store.
//!
//! Coordinates and sizes stay in millimetres here, exactly as written in
//! the payload; [`super::draw`] converts to the document unit.

use bitflags::bitflags;
use roxmltree::{Document, Node};

use crate::error::{GenerateError, GenerateResult};

bitflags! {
    /// The layers silkscreen and legend primitives may draw on.
    ///
    /// Wires, circles and text carry a layer id and are skipped unless the
    /// id maps into this set. Pads are never layer-filtered.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct LayerSet: u8 {
        /// Layer 1, top copper.
        const TOP = 1 << 0;
        /// Layer 21, component-side placement print.
        const T_PLACE = 1 << 1;
        /// Layer 25, component names.
        const T_NAMES = 1 << 2;
        /// Layer 27, component values.
        const T_VALUES = 1 << 3;
    }
}

impl LayerSet {
    /// Maps a layer id onto the drawable set. Unknown ids map to nothing.
    #[must_use]
    pub const fn from_id(id: u32) -> Self {
        match id {
            1 => Self::TOP,
            21 => Self::T_PLACE,
            25 => Self::T_NAMES,
            27 => Self::T_VALUES,
            _ => Self::empty(),
        }
    }

    /// Whether primitives on this layer id are drawn.
    #[must_use]
    pub const fn is_drawn(id: u32) -> bool {
        !Self::from_id(id).is_empty()
    }
}

/// A surface-mount pad.
#[derive(Debug, Clone, PartialEq)]
pub struct SmdPad {
    /// Centre x, millimetres.
    pub x: f64,
    /// Centre y, millimetres.
    pub y: f64,
    /// Width, millimetres.
    pub dx: f64,
    /// Height, millimetres.
    pub dy: f64,
    /// Rotation about the pad centre, degrees counterclockwise.
    pub rotation: Option<f64>,
    /// Corner rounding percentage. `100` on a square pad means circular.
    pub roundness: Option<u32>,
}

/// Land shape of a through-hole pad.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PadShape {
    /// A round land of the pad diameter.
    Round,
    /// A square land with side equal to the pad diameter.
    Square,
}

/// A plated through-hole pad.
#[derive(Debug, Clone, PartialEq)]
pub struct ThruHolePad {
    /// Centre x, millimetres.
    pub x: f64,
    /// Centre y, millimetres.
    pub y: f64,
    /// Drill diameter, millimetres. Zero suppresses the drill outline.
    pub drill: f64,
    /// Land diameter, millimetres.
    pub diameter: f64,
    /// Land shape.
    pub shape: PadShape,
    /// Rotation about the pad centre, degrees counterclockwise.
    pub rotation: Option<f64>,
}

/// A silkscreen line, or an arc when `curve` is set.
#[derive(Debug, Clone, PartialEq)]
pub struct SilkWire {
    /// First endpoint x, millimetres.
    pub x1: f64,
    /// First endpoint y, millimetres.
    pub y1: f64,
    /// Second endpoint x, millimetres.
    pub x2: f64,
    /// Second endpoint y, millimetres.
    pub y2: f64,
    /// Layer id, checked against [`LayerSet`].
    pub layer: u32,
    /// Angle the arc subtends between the endpoints, degrees. Absent for a
    /// straight line; the sign picks the side the arc bows out on.
    pub curve: Option<f64>,
}

/// A silkscreen circle.
#[derive(Debug, Clone, PartialEq)]
pub struct SilkCircle {
    /// Centre x, millimetres.
    pub x: f64,
    /// Centre y, millimetres.
    pub y: f64,
    /// Radius, millimetres.
    pub radius: f64,
    /// Layer id, checked against [`LayerSet`].
    pub layer: u32,
}

/// Vertical anchoring of a legend text position.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextAlign {
    /// The position sits above the text; drawing drops it by one cap height.
    TopCenter,
    /// The position sits below the text and is used as given.
    BottomCenter,
}

/// A legend text entry.
#[derive(Debug, Clone, PartialEq)]
pub struct LegendText {
    /// Anchor x, millimetres.
    pub x: f64,
    /// Anchor y, millimetres.
    pub y: f64,
    /// Cap height, millimetres.
    pub size: f64,
    /// Layer id, checked against [`LayerSet`].
    pub layer: u32,
    /// Vertical anchoring.
    pub align: TextAlign,
    /// The literal text, usually a `>NAME` / `>VALUE` placeholder.
    pub value: String,
}

/// One parsed `<package>` element.
#[derive(Debug, Clone, PartialEq)]
pub struct FootprintPackage {
    /// Declared package name.
    pub name: String,
    /// Surface-mount pads, document order.
    pub smds: Vec<SmdPad>,
    /// Through-hole pads, document order.
    pub pads: Vec<ThruHolePad>,
    /// Silkscreen lines and arcs, document order.
    pub wires: Vec<SilkWire>,
    /// Silkscreen circles, document order.
    pub circles: Vec<SilkCircle>,
    /// Legend text entries, document order.
    pub texts: Vec<LegendText>,
    /// Verbatim element text, persisted as document metadata after a draw.
    pub source: String,
}

/// Parses every `<package>` element of a payload, in document order.
pub fn parse_packages(xml: &str) -> GenerateResult<Vec<FootprintPackage>> {
    let doc = Document::parse(xml)?;
    doc.root()
        .descendants()
        .filter(|n| n.has_tag_name("package"))
        .map(|node| parse_package(xml, &node))
        .collect()
}

fn parse_package(xml: &str, node: &Node<'_, '_>) -> GenerateResult<FootprintPackage> {
    let mut package = FootprintPackage {
        name: required_attr(node, "name", "package")?.to_string(),
        smds: Vec::new(),
        pads: Vec::new(),
        wires: Vec::new(),
        circles: Vec::new(),
        texts: Vec::new(),
        source: xml[node.range()].to_string(),
    };

    for child in node.descendants().filter(Node::is_element) {
        match child.tag_name().name() {
            "smd" => package.smds.push(parse_smd(&child)?),
            "pad" => package.pads.push(parse_pad(&child)?),
            "wire" => package.wires.push(parse_wire(&child)?),
            "circle" => package.circles.push(parse_circle(&child)?),
            "text" => package.texts.push(parse_text(&child)?),
            _ => {}
        }
    }
    Ok(package)
}

fn parse_smd(node: &Node<'_, '_>) -> GenerateResult<SmdPad> {
    Ok(SmdPad {
        x: f64_attr(node, "x", "smd")?,
        y: f64_attr(node, "y", "smd")?,
        dx: f64_attr(node, "dx", "smd")?,
        dy: f64_attr(node, "dy", "smd")?,
        rotation: rotation_attr(node, "smd")?,
        roundness: opt_u32_attr(node, "roundness", "smd")?,
    })
}

fn parse_pad(node: &Node<'_, '_>) -> GenerateResult<ThruHolePad> {
    let shape = match node.attribute("shape") {
        Some("square") => PadShape::Square,
        _ => PadShape::Round,
    };
    Ok(ThruHolePad {
        x: f64_attr(node, "x", "pad")?,
        y: f64_attr(node, "y", "pad")?,
        drill: f64_attr(node, "drill", "pad")?,
        diameter: f64_attr(node, "diameter", "pad")?,
        shape,
        rotation: rotation_attr(node, "pad")?,
    })
}

fn parse_wire(node: &Node<'_, '_>) -> GenerateResult<SilkWire> {
    Ok(SilkWire {
        x1: f64_attr(node, "x1", "wire")?,
        y1: f64_attr(node, "y1", "wire")?,
        x2: f64_attr(node, "x2", "wire")?,
        y2: f64_attr(node, "y2", "wire")?,
        layer: u32_attr(node, "layer", "wire")?,
        curve: opt_f64_attr(node, "curve", "wire")?,
    })
}

fn parse_circle(node: &Node<'_, '_>) -> GenerateResult<SilkCircle> {
    Ok(SilkCircle {
        x: f64_attr(node, "x", "circle")?,
        y: f64_attr(node, "y", "circle")?,
        radius: f64_attr(node, "radius", "circle")?,
        layer: u32_attr(node, "layer", "circle")?,
    })
}

fn parse_text(node: &Node<'_, '_>) -> GenerateResult<LegendText> {
    let align = match required_attr(node, "align", "text")? {
        "top-center" => TextAlign::TopCenter,
        _ => TextAlign::BottomCenter,
    };
    Ok(LegendText {
        x: f64_attr(node, "x", "text")?,
        y: f64_attr(node, "y", "text")?,
        size: f64_attr(node, "size", "text")?,
        layer: u32_attr(node, "layer", "text")?,
        align,
        value: node.text().unwrap_or_default().to_string(),
    })
}

fn required_attr<'a>(
    node: &Node<'a, '_>,
    attr: &'static str,
    element: &'static str,
) -> GenerateResult<&'a str> {
    node.attribute(attr).ok_or_else(|| {
        GenerateError::footprint_element(element, format!("missing attribute '{attr}'"))
    })
}

fn f64_attr(node: &Node<'_, '_>, attr: &'static str, element: &'static str) -> GenerateResult<f64> {
    let raw = required_attr(node, attr, element)?;
    raw.parse().map_err(|_| bad_number(element, attr, raw))
}

fn u32_attr(node: &Node<'_, '_>, attr: &'static str, element: &'static str) -> GenerateResult<u32> {
    let raw = required_attr(node, attr, element)?;
    raw.parse().map_err(|_| bad_number(element, attr, raw))
}

fn opt_f64_attr(
    node: &Node<'_, '_>,
    attr: &'static str,
    element: &'static str,
) -> GenerateResult<Option<f64>> {
    node.attribute(attr)
        .map(|raw| raw.parse().map_err(|_| bad_number(element, attr, raw)))
        .transpose()
}

fn opt_u32_attr(
    node: &Node<'_, '_>,
    attr: &'static str,
    element: &'static str,
) -> GenerateResult<Option<u32>> {
    node.attribute(attr)
        .map(|raw| raw.parse().map_err(|_| bad_number(element, attr, raw)))
        .transpose()
}

/// Reads a rotation attribute (`"R90"`, also `"MR45"` and similar; any
/// letter prefix is skipped, the angle is what counts).
fn rotation_attr(node: &Node<'_, '_>, element: &'static str) -> GenerateResult<Option<f64>> {
    let Some(raw) = node.attribute("rot") else {
        return Ok(None);
    };
    let angle = raw.trim_start_matches(|c: char| c.is_ascii_alphabetic());
    angle.parse().map(Some).map_err(|_| {
        GenerateError::footprint_element(element, format!("attribute 'rot' is not a rotation: {raw}"))
    })
}

fn bad_number(element: &'static str, attr: &'static str, raw: &str) -> GenerateError {
    GenerateError::footprint_element(element, format!("attribute '{attr}' is not a number: {raw}"))
}
