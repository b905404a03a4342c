//! Package family catalogue.
//!
//! [`PackageType`] is the tag a generate request carries on the wire; every
//! tag resolves to one stateless [`PackageBuilder`] through [`builder_for`].
//! Families that share geometry live together in a module: the four SOT
//! variants, the three DFN pillar layouts, the header grid family and so on.

pub mod axial;
pub mod bga;
pub mod chip;
pub mod chiparray;
pub mod cornerconcave;
pub mod crystal;
pub mod dfn;
pub mod dip;
pub mod dpak;
pub mod ecap;
pub mod headers;
pub mod led;
pub mod melf;
pub mod molded;
pub mod oscillator;
pub mod plcc;
pub mod qfn;
pub mod qfp;
pub mod radial;
pub mod snap_lock;
pub mod sod;
pub mod soic;
pub mod soj;
pub mod son;
pub mod sot;
pub mod standoff;

use crate::generator::framework::PackageBuilder;

/// Every package family the generator answers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PackageType {
    Soic,
    Bga,
    Qfp,
    Qfn,
    Sod,
    Sodfl,
    Sotfl,
    Sot23,
    Sot223,
    Sot143,
    Dpak,
    Dfn2,
    Dfn3,
    Dfn4,
    Crystal,
    Chip,
    Melf,
    MoldedBody,
    AxialResistor,
    AxialPolarizedCapacitor,
    AxialDiode,
    AxialFuse,
    Dip,
    HeaderStraight,
    HeaderRightAngle,
    HeaderStraightSocket,
    HeaderRightAngleSocket,
    Son,
    CrystalHc49,
    OscillatorL,
    OscillatorJ,
    ChipArray2SideConvex,
    ChipArray2SideFlat,
    ChipArray4SideFlat,
    RadialInductor,
    RadialRoundLed,
    Plcc,
    CornerConcave,
    Soj,
    RadialEcap,
    Ecap,
    FemaleStandoff,
    MaleFemaleStandoff,
    SnapLock,
    ChipLed,
}

impl PackageType {
    /// Every family, in catalogue order.
    pub const ALL: [Self; 45] = [
        Self::Soic,
        Self::Bga,
        Self::Qfp,
        Self::Qfn,
        Self::Sod,
        Self::Sodfl,
        Self::Sotfl,
        Self::Sot23,
        Self::Sot223,
        Self::Sot143,
        Self::Dpak,
        Self::Dfn2,
        Self::Dfn3,
        Self::Dfn4,
        Self::Crystal,
        Self::Chip,
        Self::Melf,
        Self::MoldedBody,
        Self::AxialResistor,
        Self::AxialPolarizedCapacitor,
        Self::AxialDiode,
        Self::AxialFuse,
        Self::Dip,
        Self::HeaderStraight,
        Self::HeaderRightAngle,
        Self::HeaderStraightSocket,
        Self::HeaderRightAngleSocket,
        Self::Son,
        Self::CrystalHc49,
        Self::OscillatorL,
        Self::OscillatorJ,
        Self::ChipArray2SideConvex,
        Self::ChipArray2SideFlat,
        Self::ChipArray4SideFlat,
        Self::RadialInductor,
        Self::RadialRoundLed,
        Self::Plcc,
        Self::CornerConcave,
        Self::Soj,
        Self::RadialEcap,
        Self::Ecap,
        Self::FemaleStandoff,
        Self::MaleFemaleStandoff,
        Self::SnapLock,
        Self::ChipLed,
    ];

    /// The tag used in requests and recorded build state.
    #[must_use]
    pub const fn tag(self) -> &'static str {
        match self {
            Self::Soic => "soic",
            Self::Bga => "bga",
            Self::Qfp => "qfp",
            Self::Qfn => "qfn",
            Self::Sod => "sod",
            Self::Sodfl => "sodfl",
            Self::Sotfl => "sotfl",
            Self::Sot23 => "sot23",
            Self::Sot223 => "sot223",
            Self::Sot143 => "sot143",
            Self::Dpak => "dpak",
            Self::Dfn2 => "dfn2",
            Self::Dfn3 => "dfn3",
            Self::Dfn4 => "dfn4",
            Self::Crystal => "crystal",
            Self::Chip => "chip",
            Self::Melf => "melf",
            Self::MoldedBody => "moldedbody",
            Self::AxialResistor => "axial_resistor",
            Self::AxialPolarizedCapacitor => "axial_polarized_capacitor",
            Self::AxialDiode => "axial_diode",
            Self::AxialFuse => "axial_fuse",
            Self::Dip => "dip",
            Self::HeaderStraight => "header_straight",
            Self::HeaderRightAngle => "header_right_angle",
            Self::HeaderStraightSocket => "header_straight_socket",
            Self::HeaderRightAngleSocket => "header_right_angle_socket",
            Self::Son => "son",
            Self::CrystalHc49 => "crystal_hc49",
            Self::OscillatorL => "oscillator_l",
            Self::OscillatorJ => "oscillator_j",
            Self::ChipArray2SideConvex => "chiparray2sideconvex",
            Self::ChipArray2SideFlat => "chiparray2sideflat",
            Self::ChipArray4SideFlat => "chiparray4sideflat",
            Self::RadialInductor => "radial_inductor",
            Self::RadialRoundLed => "radial_round_led",
            Self::Plcc => "plcc",
            Self::CornerConcave => "cornerconcave",
            Self::Soj => "soj",
            Self::RadialEcap => "radial_ecap",
            Self::Ecap => "ecap",
            Self::FemaleStandoff => "female_standoff",
            Self::MaleFemaleStandoff => "male_female_standoff",
            Self::SnapLock => "snap_lock",
            Self::ChipLed => "chip_led",
        }
    }

    /// Resolves a request tag, or `None` for a tag outside the catalogue.
    #[must_use]
    pub fn from_tag(tag: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|t| t.tag() == tag)
    }
}

impl std::fmt::Display for PackageType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.tag())
    }
}

/// The stateless builder behind a package type.
#[must_use]
pub fn builder_for(package_type: PackageType) -> &'static dyn PackageBuilder {
    match package_type {
        PackageType::Soic => &soic::Soic,
        PackageType::Bga => &bga::Bga,
        PackageType::Qfp => &qfp::Qfp,
        PackageType::Qfn => &qfn::Qfn,
        PackageType::Sod => &sod::Sod,
        PackageType::Sodfl => &sod::Sodfl,
        PackageType::Sotfl => &sot::Sotfl,
        PackageType::Sot23 => &sot::Sot23,
        PackageType::Sot223 => &sot::Sot223,
        PackageType::Sot143 => &sot::Sot143,
        PackageType::Dpak => &dpak::Dpak,
        PackageType::Dfn2 => &dfn::Dfn2,
        PackageType::Dfn3 => &dfn::Dfn3,
        PackageType::Dfn4 => &dfn::Dfn4,
        PackageType::Crystal => &crystal::Crystal,
        PackageType::Chip => &chip::Chip,
        PackageType::Melf => &melf::Melf,
        PackageType::MoldedBody => &molded::MoldedBody,
        PackageType::AxialResistor => &axial::AxialResistor,
        PackageType::AxialPolarizedCapacitor => &axial::AxialPolarizedCapacitor,
        PackageType::AxialDiode => &axial::AxialDiode,
        PackageType::AxialFuse => &axial::AxialFuse,
        PackageType::Dip => &dip::Dip,
        PackageType::HeaderStraight => &headers::HeaderStraight,
        PackageType::HeaderRightAngle => &headers::HeaderRightAngle,
        PackageType::HeaderStraightSocket => &headers::HeaderStraightSocket,
        PackageType::HeaderRightAngleSocket => &headers::HeaderRightAngleSocket,
        PackageType::Son => &son::Son,
        PackageType::CrystalHc49 => &crystal::CrystalHc49,
        PackageType::OscillatorL => &oscillator::OscillatorL,
        PackageType::OscillatorJ => &oscillator::OscillatorJ,
        PackageType::ChipArray2SideConvex => &chiparray::ChipArray2SideConvex,
        PackageType::ChipArray2SideFlat => &chiparray::ChipArray2SideFlat,
        PackageType::ChipArray4SideFlat => &chiparray::ChipArray4SideFlat,
        PackageType::RadialInductor => &radial::RadialInductor,
        PackageType::RadialRoundLed => &led::RadialRoundLed,
        PackageType::Plcc => &plcc::Plcc,
        PackageType::CornerConcave => &cornerconcave::CornerConcave,
        PackageType::Soj => &soj::Soj,
        PackageType::RadialEcap => &ecap::RadialEcap,
        PackageType::Ecap => &ecap::Ecap,
        PackageType::FemaleStandoff => &standoff::FemaleStandoff,
        PackageType::MaleFemaleStandoff => &standoff::MaleFemaleStandoff,
        PackageType::SnapLock => &snap_lock::SnapLock,
        PackageType::ChipLed => &led::ChipLed,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tags_round_trip() {
        for ty in PackageType::ALL {
            assert_eq!(PackageType::from_tag(ty.tag()), Some(ty));
        }
        assert_eq!(PackageType::from_tag("sot99"), None);
        assert_eq!(PackageType::from_tag(""), None);
    }

    #[test]
    fn every_builder_answers_to_its_tag() {
        for ty in PackageType::ALL {
            assert_eq!(builder_for(ty).package_type(), ty);
        }
    }

    #[test]
    fn catalogue_has_no_duplicate_tags() {
        for (i, a) in PackageType::ALL.iter().enumerate() {
            for b in &PackageType::ALL[i + 1..] {
                assert_ne!(a.tag(), b.tag());
            }
        }
    }
}
