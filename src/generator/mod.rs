//! Package generation entry point.
//!
//! [`PackageGenerator`] resolves a request tag to its family builder and
//! handles the document bookkeeping around one build: any interactive edit
//! left open on the design is terminated, the document's session slot is
//! held for the duration, and a tag outside the catalogue comes back as a
//! soft `false` instead of an error. Everything else about a build lives
//! in [`framework::drive`] and the family builders.

pub mod context;
pub mod feature_ops;
pub mod framework;
pub mod packages;
pub mod params;
pub mod sketch_ops;
pub mod threads;

use crate::config::Config;
use crate::error::{GenerateError, GenerateResult};
use crate::model::{ComponentId, Design};

use self::context::BuildContext;
use self::packages::PackageType;
use self::params::ParameterSet;

/// Dispatcher over the package family catalogue.
///
/// Holds only configuration; all per-call state flows through the design
/// and the [`BuildContext`].
#[derive(Debug, Clone)]
pub struct PackageGenerator {
    config: Config,
}

impl PackageGenerator {
    #[must_use]
    pub const fn new(config: Config) -> Self {
        Self { config }
    }

    /// Generates or refreshes a package inside `component`.
    ///
    /// Returns `Ok(false)` for a tag outside the catalogue, leaving the
    /// design untouched. Every other failure propagates with context.
    pub fn generate(
        &self,
        design: &mut Design,
        package_type: &str,
        params: &ParameterSet,
        component: ComponentId,
    ) -> GenerateResult<bool> {
        match self.try_generate(design, package_type, params, component) {
            Ok(()) => Ok(true),
            Err(error) if error.is_unsupported_type() => {
                tracing::warn!(package_type, "unsupported package type; nothing generated");
                Ok(false)
            }
            Err(error) => Err(error),
        }
    }

    /// As [`Self::generate`], but an unknown tag is an error.
    pub fn try_generate(
        &self,
        design: &mut Design,
        package_type: &str,
        params: &ParameterSet,
        component: ComponentId,
    ) -> GenerateResult<()> {
        let Some(ty) = PackageType::from_tag(package_type) else {
            return Err(GenerateError::unsupported_type(package_type));
        };

        if let Some(owner) = design.terminate_session() {
            tracing::info!(owner, package_type, "terminated interactive edit before build");
        }
        design.begin_build(component);
        let result = self.build(design, ty, params, component);
        design.end_build();

        if let Err(error) = &result {
            tracing::error!(package_type, %error, "generate failed");
        }
        result
    }

    fn build(
        &self,
        design: &mut Design,
        ty: PackageType,
        params: &ParameterSet,
        component: ComponentId,
    ) -> GenerateResult<()> {
        let mut ctx = BuildContext::new(design, component, &self.config)?;
        framework::drive(&mut ctx, packages::builder_for(ty), params)
    }
}

impl Default for PackageGenerator {
    fn default() -> Self {
        Self::new(Config::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Session;

    fn generator() -> PackageGenerator {
        PackageGenerator::new(Config::default())
    }

    #[test]
    fn unknown_tag_reports_false_and_touches_nothing() {
        let mut design = Design::new("dispatch");
        let root = design.root();
        let built = generator()
            .generate(&mut design, "sot99", &ParameterSet::new(), root)
            .unwrap();

        assert!(!built);
        assert!(design.parameters.is_empty());
        assert_eq!(design.total_body_count(), 0);
        assert_eq!(design.session(), &Session::Idle);
    }

    #[test]
    fn known_tag_builds_and_releases_the_document() {
        let mut design = Design::new("dispatch");
        let root = design.root();
        let built = generator()
            .generate(&mut design, "chip", &ParameterSet::new(), root)
            .unwrap();

        assert!(built);
        assert!(design.total_body_count() > 0);
        assert_eq!(design.session(), &Session::Idle);
    }

    #[test]
    fn interactive_edit_is_cut_before_the_build() {
        let mut design = Design::new("dispatch");
        let root = design.root();
        design.begin_interactive("sketch editor");

        let built = generator()
            .generate(&mut design, "chip", &ParameterSet::new(), root)
            .unwrap();
        assert!(built);
        assert_eq!(design.session(), &Session::Idle);
    }

    #[test]
    fn repeated_generate_is_idempotent() {
        let mut design = Design::new("dispatch");
        let root = design.root();
        let gen = generator();
        gen.generate(&mut design, "chip", &ParameterSet::new(), root)
            .unwrap();
        let history = design.component(root).unwrap().history.len();
        let bodies = design.total_body_count();

        gen.generate(&mut design, "chip", &ParameterSet::new(), root)
            .unwrap();
        assert_eq!(design.component(root).unwrap().history.len(), history);
        assert_eq!(design.total_body_count(), bodies);
    }

    #[test]
    fn failures_release_the_session_slot() {
        let mut design = Design::new("dispatch");
        let missing = ComponentId(42);
        let err = generator()
            .try_generate(&mut design, "chip", &ParameterSet::new(), missing)
            .unwrap_err();

        assert!(matches!(err, GenerateError::UnsupportedState { .. }));
        assert_eq!(design.session(), &Session::Idle);
    }
}
