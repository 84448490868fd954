//! Gate Consumer contract: what a protected UI element should render.
//!
//! Rendering itself is the UI's job; this module only turns the evaluator's
//! result and the minimum-plan lookup into a render decision.

use std::sync::Arc;

use serde::Serialize;

use crate::catalog::PlanCatalog;
use crate::gate::{GateDescriptor, allow};
use crate::resolver::EffectiveEntitlement;
use crate::upgrade::{UpgradeHint, upgrade_hint};

/// What the call site wants shown when the gate denies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Fallback {
    /// Render nothing.
    #[default]
    Hide,
    /// Render the control disabled.
    Disable,
    /// Render the caller-supplied fallback element.
    Replace,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "render", rename_all = "snake_case")]
pub enum GateRender {
    Content,
    Hidden,
    Disabled { hint: Option<UpgradeHint> },
    Fallback { hint: Option<UpgradeHint> },
}

impl GateRender {
    pub fn is_content(&self) -> bool {
        matches!(self, GateRender::Content)
    }

    pub fn hint(&self) -> Option<&UpgradeHint> {
        match self {
            GateRender::Disabled { hint } | GateRender::Fallback { hint } => hint.as_ref(),
            GateRender::Content | GateRender::Hidden => None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct GateConsumer {
    plans: Arc<PlanCatalog>,
}

impl GateConsumer {
    pub fn new(plans: Arc<PlanCatalog>) -> Self {
        Self { plans }
    }

    pub fn decide(&self, entitlement: &EffectiveEntitlement, gate: &GateDescriptor, fallback: Fallback) -> GateRender {
        if allow(entitlement, gate) {
            return GateRender::Content;
        }

        match fallback {
            Fallback::Hide => GateRender::Hidden,
            Fallback::Disable => GateRender::Disabled {
                hint: upgrade_hint(&self.plans, entitlement, gate),
            },
            Fallback::Replace => GateRender::Fallback {
                hint: upgrade_hint(&self.plans, entitlement, gate),
            },
        }
    }
}
