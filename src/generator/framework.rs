//! Declarative package-builder framework.
//!
//! Every package family describes itself with static tables: the parameters
//! it registers, the boolean switches it honours and the optional features
//! it toggles by suppression. The [`drive`] function owns the lifecycle
//! decisions that used to be copied into every builder:
//!
//! - fresh component, or a package-type switch: tear down and create;
//! - re-issued call whose last registered parameter did not already exist:
//!   create;
//! - parameter refresh with unchanged structure: recompute driven
//!   dimensions, re-apply suppression, let the family patch cosmetics;
//! - structural change (pin counts, lead-style switches): clear the built
//!   geometry and fall through to the create path with the updated values.
//!
//! Builders therefore contain geometry only. State checks, parameter
//! registration and the rebuild escape live here, once.

use indexmap::IndexMap;

use crate::error::{GenerateError, GenerateResult};
use crate::generator::context::BuildContext;
use crate::generator::packages::PackageType;
use crate::generator::params::ParameterSet;
use crate::model::material::Rgb;
use crate::model::parameters::ParamUnit;
use crate::model::units::Unit;
use crate::model::{BuildState, FeatureKey};

/// Prefix of every parameter the generator owns in the user table.
pub const PARAM_PREFIX: &str = "param_";

/// What a registered parameter measures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamKind {
    /// A dimension, stored in centimetres.
    Length,
    /// A pin, row or ball count.
    Count,
    /// An angle in degrees.
    Degrees,
}

/// How a change to the parameter is applied to existing geometry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamRole {
    /// Drives dimensions through expressions; a recompute absorbs it.
    Dimension,
    /// Changes topology; the component is rebuilt when it moves.
    Structural,
}

/// One registered user parameter of a package family.
#[derive(Debug, Clone, Copy)]
pub struct ParamSpec {
    pub key: &'static str,
    pub kind: ParamKind,
    pub role: ParamRole,
    /// Engineering default in centimetres, or a count.
    pub default: f64,
    pub comment: &'static str,
}

impl ParamSpec {
    /// A dimension parameter.
    #[must_use]
    pub const fn length(key: &'static str, default: f64, comment: &'static str) -> Self {
        Self {
            key,
            kind: ParamKind::Length,
            role: ParamRole::Dimension,
            default,
            comment,
        }
    }

    /// A count parameter; counts always rebuild.
    #[must_use]
    pub const fn count(key: &'static str, default: u32, comment: &'static str) -> Self {
        Self {
            key,
            kind: ParamKind::Count,
            role: ParamRole::Structural,
            default: default as f64,
            comment,
        }
    }

    /// An angle parameter.
    #[must_use]
    pub const fn angle(key: &'static str, default: f64, comment: &'static str) -> Self {
        Self {
            key,
            kind: ParamKind::Degrees,
            role: ParamRole::Dimension,
            default,
            comment,
        }
    }
}

/// A boolean switch of a package family.
#[derive(Debug, Clone, Copy)]
pub struct FlagSpec {
    pub key: &'static str,
    pub default: bool,
    /// Structural flags pick between feature sets and force a rebuild.
    pub structural: bool,
}

impl FlagSpec {
    /// A cosmetic or suppression-toggled switch.
    #[must_use]
    pub const fn detail(key: &'static str) -> Self {
        Self {
            key,
            default: false,
            structural: false,
        }
    }

    /// A detail switch that defaults to on.
    #[must_use]
    pub const fn detail_on(key: &'static str) -> Self {
        Self {
            key,
            default: true,
            structural: false,
        }
    }

    /// A switch that selects between feature sets.
    #[must_use]
    pub const fn structural(key: &'static str) -> Self {
        Self {
            key,
            default: false,
            structural: true,
        }
    }
}

/// A free-text parameter such as a thread designation.
#[derive(Debug, Clone, Copy)]
pub struct TextSpec {
    pub key: &'static str,
    pub default: &'static str,
}

impl TextSpec {
    #[must_use]
    pub const fn new(key: &'static str, default: &'static str) -> Self {
        Self { key, default }
    }
}

/// An always-created feature whose visibility follows a flag.
#[derive(Debug, Clone, Copy)]
pub struct OptionalFeature {
    pub flag_key: &'static str,
    pub feature: FeatureKey,
    /// The feature is active when the flag equals this value.
    pub enabled_when: bool,
}

impl OptionalFeature {
    /// Feature shown while the flag is set.
    #[must_use]
    pub const fn when_set(flag_key: &'static str, feature: FeatureKey) -> Self {
        Self {
            flag_key,
            feature,
            enabled_when: true,
        }
    }

    /// Feature shown while the flag is clear.
    #[must_use]
    pub const fn when_clear(flag_key: &'static str, feature: FeatureKey) -> Self {
        Self {
            flag_key,
            feature,
            enabled_when: false,
        }
    }
}

/// Parameter values after defaulting, clamping and derivation.
///
/// Builders read from this instead of the raw [`ParameterSet`], so every
/// defaulting rule is applied exactly once.
#[derive(Debug, Clone, Default)]
pub struct Resolved {
    dims: IndexMap<&'static str, f64>,
    flags: IndexMap<&'static str, bool>,
    texts: IndexMap<&'static str, String>,
    rgb: Rgb,
}

impl Resolved {
    /// A resolved dimension or count in centimetres.
    #[must_use]
    pub fn dim(&self, key: &str) -> f64 {
        debug_assert!(self.dims.contains_key(key), "undeclared parameter `{key}`");
        self.dims.get(key).copied().unwrap_or_default()
    }

    /// A resolved count.
    #[must_use]
    pub fn count(&self, key: &str) -> u32 {
        self.dim(key).round().max(0.0) as u32
    }

    /// Overwrites a dimension; used by derivation hooks to clamp values.
    pub fn set_dim(&mut self, key: &'static str, value: f64) {
        self.dims.insert(key, value);
    }

    /// A resolved switch.
    #[must_use]
    pub fn flag(&self, key: &str) -> bool {
        debug_assert!(self.flags.contains_key(key), "undeclared flag `{key}`");
        self.flags.get(key).copied().unwrap_or_default()
    }

    /// Overwrites a switch.
    pub fn set_flag(&mut self, key: &'static str, value: bool) {
        self.flags.insert(key, value);
    }

    /// A resolved text value.
    #[must_use]
    pub fn text(&self, key: &str) -> &str {
        debug_assert!(self.texts.contains_key(key), "undeclared text `{key}`");
        self.texts.get(key).map_or("", String::as_str)
    }

    /// The effective body colour.
    #[must_use]
    pub const fn rgb(&self) -> Rgb {
        self.rgb
    }
}

/// One package family.
///
/// Implementations are stateless unit structs; all call state flows through
/// the [`BuildContext`] and the [`Resolved`] values.
pub trait PackageBuilder: Sync {
    /// The tag this builder answers to.
    fn package_type(&self) -> PackageType;

    /// Registered user parameters, in registration order. The status of the
    /// last entry decides between the create and update paths.
    fn params(&self) -> &'static [ParamSpec];

    /// Boolean switches.
    fn flags(&self) -> &'static [FlagSpec] {
        &[]
    }

    /// Free-text parameters.
    fn texts(&self) -> &'static [TextSpec] {
        &[]
    }

    /// Body colour when the caller sends none.
    fn default_rgb(&self) -> Rgb {
        Rgb::new(10, 10, 10)
    }

    /// Features toggled by suppression rather than deletion.
    fn optional_features(&self) -> &'static [OptionalFeature] {
        &[]
    }

    /// True for through-hole families whose lead reach follows the board.
    /// [`drive`] then registers the configured board thickness as an
    /// unprefixed parameter so family expressions can reference it.
    fn uses_board_thickness(&self) -> bool {
        false
    }

    /// Clamps and secondary values derived from the raw inputs.
    fn derive(&self, resolved: &mut Resolved, params: &ParameterSet) {
        let _ = (resolved, params);
    }

    /// Builds the geometry from scratch into an empty component.
    fn create(&self, ctx: &mut BuildContext<'_>, resolved: &Resolved) -> GenerateResult<()>;

    /// Patches whatever a dimension refresh cannot reach through expressions.
    /// Suppression toggles are already applied when this runs; one replay
    /// follows and picks up the patches together with the refreshed values.
    fn update(&self, ctx: &mut BuildContext<'_>, resolved: &Resolved) -> GenerateResult<()> {
        let _ = (ctx, resolved);
        Ok(())
    }
}

/// Applies the defaulting tables and the derivation hook.
#[must_use]
pub fn resolve(builder: &dyn PackageBuilder, params: &ParameterSet) -> Resolved {
    let mut resolved = Resolved {
        rgb: params.rgb(builder.default_rgb()),
        ..Resolved::default()
    };
    for spec in builder.params() {
        let value = match spec.kind {
            ParamKind::Count => f64::from(params.count(spec.key, spec.default as u32)),
            ParamKind::Length | ParamKind::Degrees => params.length(spec.key, spec.default),
        };
        resolved.dims.insert(spec.key, value);
    }
    for flag in builder.flags() {
        resolved
            .flags
            .insert(flag.key, params.flag_or(flag.key, flag.default));
    }
    for text in builder.texts() {
        resolved
            .texts
            .insert(text.key, params.text(text.key, text.default));
    }
    builder.derive(&mut resolved, params);
    resolved
}

/// Runs one generate call for `builder` against the context's component.
pub fn drive(
    ctx: &mut BuildContext<'_>,
    builder: &dyn PackageBuilder,
    params: &ParameterSet,
) -> GenerateResult<()> {
    let resolved = resolve(builder, params);
    let tag = builder.package_type().tag();

    if !ctx.parametric {
        // Direct modelling: each call replaces the built geometry outright.
        let (component, table) = ctx.split();
        table.remove_with_prefix(PARAM_PREFIX);
        component.clear_built();
        builder.create(ctx, &resolved)?;
        apply_optional_suppression(ctx, builder, &resolved)?;
        record_state(ctx, builder, &resolved);
        return Ok(());
    }

    let mut prior = validated_prior_type(ctx)?;

    if let Some(previous) = prior.as_deref() {
        if previous != tag {
            tracing::info!(previous, next = tag, "package type changed; rebuilding");
            let (component, table) = ctx.split();
            table.remove_with_prefix(PARAM_PREFIX);
            component.clear_built();
            prior = None;
        }
    }

    // Register the family's parameters; the last status picks the path.
    let display_unit = ctx.design().default_unit;
    let board_thickness = ctx.board_thickness;
    let mut last_existed = false;
    {
        let (_, table) = ctx.split();
        if builder.uses_board_thickness() {
            // Unprefixed: shared across families and spared by the
            // package-type teardown.
            table.process(
                "board_thickness",
                board_thickness,
                ParamUnit::Length(display_unit),
                "board thickness",
            );
        }
        for spec in builder.params() {
            let name = format!("{PARAM_PREFIX}{}", spec.key);
            let status = table.process(
                &name,
                resolved.dim(spec.key),
                unit_for(spec.kind, display_unit),
                spec.comment,
            );
            last_existed = status.is_update();
        }
    }

    if !last_existed {
        if prior.is_some() {
            // Build recorded but its parameters are gone from the table.
            let name = ctx.component().name.clone();
            return Err(GenerateError::unsupported_state(
                name,
                "recorded build lost its user parameters",
            ));
        }
        builder.create(ctx, &resolved)?;
        apply_optional_suppression(ctx, builder, &resolved)?;
        record_state(ctx, builder, &resolved);
        return Ok(());
    }

    if prior.is_none() {
        let name = ctx.component().name.clone();
        return Err(GenerateError::unsupported_state(
            name,
            "user parameters exist but no build is recorded",
        ));
    }

    let signature = structural_signature(builder, &resolved);
    let rebuild = match &ctx.component().build_state {
        BuildState::Created { structural, .. } => *structural != signature,
        BuildState::Uninitialized => false,
    };
    if rebuild {
        tracing::info!(package_type = tag, "structural parameters changed; rebuilding");
        ctx.component().clear_built();
        builder.create(ctx, &resolved)?;
        apply_optional_suppression(ctx, builder, &resolved)?;
        record_state(ctx, builder, &resolved);
        return Ok(());
    }

    // Dimension refresh: the family patches whatever expressions cannot
    // carry, then one replay applies both.
    apply_optional_suppression(ctx, builder, &resolved)?;
    builder.update(ctx, &resolved)?;
    ctx.recompute()?;
    record_state(ctx, builder, &resolved);
    Ok(())
}

/// Checks the recorded build state against the feature history and returns
/// the recorded package type, if any.
fn validated_prior_type(ctx: &mut BuildContext<'_>) -> GenerateResult<Option<String>> {
    let component = ctx.component();
    match &component.build_state {
        BuildState::Created { package_type, .. } => {
            if component.history.is_empty() {
                let name = component.name.clone();
                return Err(GenerateError::unsupported_state(
                    name,
                    "recorded build has an empty feature history",
                ));
            }
            Ok(Some(package_type.clone()))
        }
        BuildState::Uninitialized => {
            if component.history.is_empty() {
                Ok(None)
            } else {
                let name = component.name.clone();
                Err(GenerateError::unsupported_state(
                    name,
                    "component already contains features not created by this generator",
                ))
            }
        }
    }
}

fn apply_optional_suppression(
    ctx: &mut BuildContext<'_>,
    builder: &dyn PackageBuilder,
    resolved: &Resolved,
) -> GenerateResult<()> {
    for optional in builder.optional_features() {
        let active = resolved.flag(optional.flag_key) == optional.enabled_when;
        let component = ctx.component();
        let id = component.indexed(optional.feature);
        let toggled = id.and_then(|id| component.history.set_suppressed(id, !active));
        if toggled.is_none() {
            let name = component.name.clone();
            return Err(GenerateError::structural_mismatch(optional.feature.0, name));
        }
    }
    Ok(())
}

fn record_state(ctx: &mut BuildContext<'_>, builder: &dyn PackageBuilder, resolved: &Resolved) {
    let structural = structural_signature(builder, resolved);
    ctx.component().build_state = BuildState::Created {
        package_type: builder.package_type().tag().to_owned(),
        structural,
    };
}

/// The values whose movement forces a rebuild, keyed by parameter name.
fn structural_signature(builder: &dyn PackageBuilder, resolved: &Resolved) -> IndexMap<String, f64> {
    let mut signature = IndexMap::new();
    for spec in builder.params() {
        if spec.role == ParamRole::Structural {
            signature.insert(spec.key.to_owned(), resolved.dim(spec.key));
        }
    }
    for flag in builder.flags() {
        if flag.structural {
            let value = if resolved.flag(flag.key) { 1.0 } else { 0.0 };
            signature.insert(flag.key.to_owned(), value);
        }
    }
    signature
}

const fn unit_for(kind: ParamKind, display: Unit) -> ParamUnit {
    match kind {
        ParamKind::Length => ParamUnit::Length(display),
        ParamKind::Count => ParamUnit::Count,
        ParamKind::Degrees => ParamUnit::Degrees,
    }
}
