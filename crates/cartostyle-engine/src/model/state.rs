use std::fmt;

use crate::error::{ModelError, Result};

/// Lifecycle states of a [`LayerModel`](super::LayerModel).
///
/// Construction walks `Constructed` through `Ready` in order. After that a
/// model alternates between `Ready` (no GPU models) and `Built`, and ends in
/// `Cleared`.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum ModelState {
    Constructed,
    ServicesBound,
    AttributesRegistered,
    AnimationArmed,
    LayoutInitialized,
    Ready,
    Built,
    Cleared,
}

impl ModelState {
    pub fn can_transition(self, to: ModelState) -> bool {
        use ModelState::*;
        matches!(
            (self, to),
            (Constructed, ServicesBound)
                | (ServicesBound, AttributesRegistered)
                | (AttributesRegistered, AnimationArmed)
                | (AnimationArmed, LayoutInitialized)
                | (LayoutInitialized, Ready)
                | (Ready, Built)
                | (Built, Built)
                | (Built, Ready)
                | (Ready, Cleared)
                | (Built, Cleared)
        )
    }

    /// Moves to `to`, or fails without changing state.
    pub(crate) fn advance(&mut self, to: ModelState) -> Result<()> {
        if !self.can_transition(to) {
            return Err(ModelError::contract(format!(
                "illegal model transition {} -> {}",
                self, to
            )));
        }
        log::debug!("layer model {} -> {}", self, to);
        *self = to;
        Ok(())
    }

    /// `true` once construction has finished and before teardown.
    pub fn is_live(self) -> bool {
        matches!(self, ModelState::Ready | ModelState::Built)
    }
}

impl fmt::Display for ModelState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ModelState::Constructed => "constructed",
            ModelState::ServicesBound => "services-bound",
            ModelState::AttributesRegistered => "attributes-registered",
            ModelState::AnimationArmed => "animation-armed",
            ModelState::LayoutInitialized => "layout-initialized",
            ModelState::Ready => "ready",
            ModelState::Built => "built",
            ModelState::Cleared => "cleared",
        };
        f.write_str(name)
    }
}
