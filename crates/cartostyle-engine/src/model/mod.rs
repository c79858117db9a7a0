//! Layer-model lifecycle.
//!
//! [`LayerModel`] is the composing wrapper every concrete model runs inside.
//! It owns services, layout, style textures and GPU models, and drives a
//! [`ModelVariant`] (point, line, polygon, ...) through a fixed sequence of
//! states. Variants supply geometry and shaders; the wrapper guarantees
//! ordering and resource hygiene.

mod lifecycle;
mod state;
mod variant;

pub use lifecycle::LayerModel;
pub use state::ModelState;
pub use variant::{AttributeSet, BuildCtx, DrawCtx, ModelVariant, UniformCtx};
