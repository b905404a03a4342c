//! Build context.
//!
//! Every builder works through a [`BuildContext`]: the design being edited,
//! the component the package lands in and the effective mode switches for
//! this one call. Builders never reach for globals; whatever they need is
//! either in the context or in their resolved parameter values.

use crate::config::Config;
use crate::error::{GenerateError, GenerateResult};
use crate::generator::feature_ops::Ops;
use crate::model::units::mm;
use crate::model::{Component, ComponentId, Design, UserParameterTable};

/// Mutable view of one generate call.
#[derive(Debug)]
pub struct BuildContext<'a> {
    design: &'a mut Design,
    component: ComponentId,
    /// Whether user parameters drive the geometry.
    pub parametric: bool,
    /// Board thickness in centimetres, used by through-hole pin lengths.
    pub board_thickness: f64,
}

impl<'a> BuildContext<'a> {
    /// Creates a context for `component`, taking mode switches from the
    /// configuration. Fails when the handle does not resolve.
    pub fn new(
        design: &'a mut Design,
        component: ComponentId,
        config: &Config,
    ) -> GenerateResult<Self> {
        if design.component(component).is_none() {
            return Err(GenerateError::unsupported_state(
                format!("component #{}", component.0),
                "target component does not exist",
            ));
        }
        Ok(Self {
            design,
            component,
            parametric: config.generator.parametric,
            board_thickness: mm(config.generator.board_thickness),
        })
    }

    /// The component handle this build targets.
    #[must_use]
    pub const fn component_id(&self) -> ComponentId {
        self.component
    }

    /// The whole design, for operations that span components.
    #[must_use]
    pub fn design(&mut self) -> &mut Design {
        self.design
    }

    /// The target component.
    #[must_use]
    pub fn component(&mut self) -> &mut Component {
        // Checked in `new`; components are never removed mid-call.
        self.design
            .component_mut(self.component)
            .unwrap_or_else(|| unreachable!("component validated at context construction"))
    }

    /// The user parameter table.
    #[must_use]
    pub fn params(&mut self) -> &mut UserParameterTable {
        &mut self.design.parameters
    }

    /// The target component and the parameter table together, which is the
    /// shape builders need while binding driven dimensions.
    #[must_use]
    pub fn split(&mut self) -> (&mut Component, &mut UserParameterTable) {
        self.design
            .component_and_params_mut(self.component)
            .unwrap_or_else(|| unreachable!("component validated at context construction"))
    }

    /// Opens the feature-ops wrapper over the target component.
    #[must_use]
    pub fn ops(&mut self) -> Ops<'_> {
        let parametric = self.parametric;
        let (component, table) = self.split();
        Ops::new(component, table, parametric)
    }

    /// Recomputes the parameter table and every feature history.
    pub fn recompute(&mut self) -> GenerateResult<()> {
        self.design.recompute()?;
        Ok(())
    }
}
