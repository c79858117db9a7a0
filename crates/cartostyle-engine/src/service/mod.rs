//! Collaborator contracts consumed by layer models.
//!
//! A model never looks services up from a global registry. The owning layer
//! hands over a [`Services`] capability set, and the model binds every
//! required handle exactly once during construction.

mod attribute;
mod basic;
mod collab;
mod renderer;
mod services;

pub use attribute::{AttributeDescriptor, AttributeRegistry, AttributeScope, StyleAttributeService};
pub use basic::{EmptyAtlas, RenderRequests, StaticCamera, StaticMap};
pub use collab::{CameraService, FontService, IconService, LayerService, MapService};
pub use renderer::{
    ModelDescriptor, ModelHandle, RendererService, Texture2DOptions, TextureHandle,
    VertexBufferDescriptor,
};
pub use services::{BoundServices, Services};
