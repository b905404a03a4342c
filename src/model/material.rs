//! Material and appearance catalogues.
//!
//! Bodies are tagged with a physical material and a render appearance, both
//! resolved from the host's catalogues by stable identifier. The subset here
//! is exactly what the package families use: solder-plated terminals, ceramic
//! and plastic bodies, glass, brass standoff stock and the emissive die
//! appearance for LED families. A body may additionally carry an RGB colour
//! override and, for light sources, a luminance value.

use serde::{Deserialize, Serialize};

/// A physical material from the host catalogue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Material {
    /// Generic discrete-component body stock - the default.
    #[default]
    DiscreteComponent,
    /// Tin terminal plating.
    Tin,
    /// Copper alloy lead frames.
    CopperAlloy,
    /// Epoxy resin encapsulation.
    EpoxyResin,
    /// PBT plastic connector housings.
    PbtPlastic,
    /// Transparent plastic lenses.
    TransparentPlastic,
    /// Ceramic chip bodies.
    Ceramic,
    /// Aluminium (thermal pads, capacitor cans).
    Aluminium,
    /// Glass (MELF, crystal lids).
    Glass,
    /// Brass standoff stock.
    Brass,
    /// Nylon snap-lock stock.
    Nylon,
    /// Lead solder (BGA balls).
    LeadSolder,
}

impl Material {
    /// Stable catalogue identifier.
    #[must_use]
    pub const fn catalog_id(self) -> &'static str {
        match self {
            Self::DiscreteComponent => "PrismMaterial-402",
            Self::Tin => "PrismMaterial-403",
            Self::CopperAlloy => "PrismMaterial-090",
            Self::EpoxyResin => "PrismMaterial-220",
            Self::PbtPlastic => "PrismMaterial-277",
            Self::TransparentPlastic => "PrismMaterial-052",
            Self::Ceramic => "PrismMaterial-213",
            Self::Aluminium => "PrismMaterial-002",
            Self::Glass => "PrismMaterial-086",
            Self::Brass => "PrismMaterial-003",
            Self::Nylon => "PrismMaterial-223",
            Self::LeadSolder => "PrismMaterial-404",
        }
    }

    /// Human-readable catalogue label.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::DiscreteComponent => "Discrete Component",
            Self::Tin => "Tin",
            Self::CopperAlloy => "Copper, Alloy",
            Self::EpoxyResin => "Epoxy Resin",
            Self::PbtPlastic => "PBT Plastic",
            Self::TransparentPlastic => "Plastic, Transparent",
            Self::Ceramic => "Ceramic",
            Self::Aluminium => "Aluminium",
            Self::Glass => "Glass",
            Self::Brass => "Brass",
            Self::Nylon => "Nylon",
            Self::LeadSolder => "Lead Solder",
        }
    }
}

/// A render appearance from the host catalogue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Appearance {
    /// Matte black plastic - the default body appearance.
    #[default]
    MatteBlack,
    /// Polished nickel - the default terminal appearance.
    NickelPolished,
    /// Polished aluminium.
    AluminiumPolished,
    /// Polished gold (header pins, PLCC contacts).
    GoldPolished,
    /// Frosted glass.
    Glass,
    /// Clear glass (LED lenses).
    GlassClear,
    /// Light-transmitting glass.
    GlassLight,
    /// Self-illuminating LED die.
    EmissiveLed,
}

impl Appearance {
    /// Stable catalogue identifier.
    #[must_use]
    pub const fn catalog_id(self) -> &'static str {
        match self {
            Self::MatteBlack => "Prism-113",
            Self::NickelPolished => "Prism-053",
            Self::AluminiumPolished => "Prism-027",
            Self::GoldPolished => "Prism-052",
            Self::Glass => "Prism-155",
            Self::GlassClear => "Prism-152",
            Self::GlassLight => "Prism-163",
            Self::EmissiveLed => "Prism-417",
        }
    }
}

/// An RGB colour override, 8 bits per channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Rgb {
    /// Red channel.
    pub r: u8,
    /// Green channel.
    pub g: u8,
    /// Blue channel.
    pub b: u8,
}

impl Rgb {
    /// Creates a colour.
    #[must_use]
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }
}

/// How a body looks: material, appearance and optional overrides.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Finish {
    /// Physical material.
    pub material: Material,
    /// Render appearance.
    pub appearance: Appearance,
    /// Colour override on top of the appearance, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rgb: Option<Rgb>,
    /// Emitted luminance in candela per square metre, for light sources.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub luminance: Option<f64>,
}

impl Finish {
    /// The default terminal finish: tin over polished nickel.
    #[must_use]
    pub const fn terminal() -> Self {
        Self {
            material: Material::Tin,
            appearance: Appearance::NickelPolished,
            rgb: None,
            luminance: None,
        }
    }

    /// The default body finish: component stock in matte black.
    #[must_use]
    pub const fn body() -> Self {
        Self {
            material: Material::DiscreteComponent,
            appearance: Appearance::MatteBlack,
            rgb: None,
            luminance: None,
        }
    }

    /// A finish with the given material, default appearance rules applied.
    #[must_use]
    pub const fn of(material: Material) -> Self {
        Self {
            material,
            appearance: Appearance::MatteBlack,
            rgb: None,
            luminance: None,
        }
    }

    /// Returns this finish with an RGB override.
    #[must_use]
    pub const fn with_rgb(mut self, rgb: Rgb) -> Self {
        self.rgb = Some(rgb);
        self
    }

    /// Returns this finish with another appearance.
    #[must_use]
    pub const fn with_appearance(mut self, appearance: Appearance) -> Self {
        self.appearance = appearance;
        self
    }

    /// Returns this finish as an emissive light source.
    #[must_use]
    pub const fn emissive(mut self, luminance: f64) -> Self {
        self.appearance = Appearance::EmissiveLed;
        self.luminance = Some(luminance);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn catalog_ids_are_stable() {
        assert_eq!(Material::DiscreteComponent.catalog_id(), "PrismMaterial-402");
        assert_eq!(Material::Tin.catalog_id(), "PrismMaterial-403");
        assert_eq!(Appearance::MatteBlack.catalog_id(), "Prism-113");
        assert_eq!(Appearance::EmissiveLed.catalog_id(), "Prism-417");
    }

    #[test]
    fn finish_builders() {
        let f = Finish::terminal();
        assert_eq!(f.material, Material::Tin);
        assert_eq!(f.appearance, Appearance::NickelPolished);

        let led = Finish::of(Material::TransparentPlastic).emissive(50_000.0);
        assert_eq!(led.appearance, Appearance::EmissiveLed);
        assert_eq!(led.luminance, Some(50_000.0));

        let tinted = Finish::body().with_rgb(Rgb::new(10, 10, 10));
        assert_eq!(tinted.rgb, Some(Rgb::new(10, 10, 10)));
    }
}
