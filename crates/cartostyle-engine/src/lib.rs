//! cartostyle engine crate.
//!
//! Per-feature style data packed into GPU textures, and the lifecycle every
//! layer model goes through from service binding to teardown.

pub mod animate;
pub mod backend;
pub mod blend;
pub mod config;
pub mod layer;
pub mod layers;
pub mod layout;
pub mod logging;
pub mod model;
pub mod service;
pub mod texture;
pub mod uniform;

mod error;

#[cfg(test)]
mod test_support;

pub use blend::{BlendMode, BlendOptions};
pub use config::LayerConfig;
pub use error::{ModelError, Result};
pub use layer::{EncodedFeature, FeatureLayer, Layer};
pub use layout::{compute_layout, DataLayout, LayoutConfig};
pub use model::{LayerModel, ModelState, ModelVariant};
