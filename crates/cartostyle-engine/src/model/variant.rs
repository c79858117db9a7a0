use crate::blend::BlendOptions;
use crate::error::Result;
use crate::layer::Layer;
use crate::layout::DataLayout;
use crate::service::{
    BoundServices, ModelHandle, RendererService, StyleAttributeService, VertexBufferDescriptor,
};
use crate::texture::StyleTextureBank;
use crate::uniform::UniformMap;

/// Geometry and attribute buffers produced by a variant's triangulation.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AttributeSet {
    pub buffers: Vec<VertexBufferDescriptor>,
    /// Index buffer; `None` for non-indexed draws.
    pub elements: Option<Vec<u32>>,
    pub vertex_count: u32,
    pub instance_count: u32,
}

/// Inputs for `init_models` / `build_models`.
pub struct BuildCtx<'a> {
    pub layer: &'a dyn Layer,
    pub services: &'a BoundServices,
    pub layout: &'a DataLayout,
    pub textures: &'a mut StyleTextureBank,
    pub blend: BlendOptions,
    /// Size of the encoded [`LayerModel::uniforms`](super::LayerModel::uniforms)
    /// block, in bytes.
    pub uniform_size: u64,
}

/// Inputs for uniform computation.
pub struct UniformCtx<'a> {
    pub layer: &'a dyn Layer,
    pub services: &'a BoundServices,
    pub layout: &'a DataLayout,
}

/// Inputs for issuing draws.
pub struct DrawCtx<'a> {
    pub renderer: &'a dyn RendererService,
    pub models: &'a [ModelHandle],
    pub uniforms: &'a UniformMap,
}

/// A concrete layer type (point, line, polygon, heatmap, ...).
///
/// Every capability without a default is mandatory; a variant that does not
/// provide one does not compile.
pub trait ModelVariant {
    /// Declares the style attributes this variant consumes.
    fn register_attributes(&mut self, registry: &dyn StyleAttributeService) -> Result<()>;

    /// First build after construction.
    fn init_models(&mut self, ctx: &mut BuildCtx<'_>) -> Result<Vec<ModelHandle>>;

    /// Rebuild after [`need_update`](Self::need_update) reported a change.
    fn build_models(&mut self, ctx: &mut BuildCtx<'_>) -> Result<Vec<ModelHandle>>;

    /// Variant-specific uniforms. Layout and animation uniforms are appended
    /// by the lifecycle.
    fn uniforms(&self, ctx: &UniformCtx<'_>) -> Result<UniformMap>;

    /// Triangulates the layer's features into attribute buffers.
    fn attribute(&self, layer: &dyn Layer, layout: &DataLayout) -> Result<AttributeSet>;

    fn render(&mut self, ctx: &DrawCtx<'_>) -> Result<()>;

    /// Whether data or config changed since the last build. Must not mutate.
    fn need_update(&self, layer: &dyn Layer) -> bool {
        let _ = layer;
        false
    }

    fn default_style(&self) -> UniformMap {
        UniformMap::new()
    }
}
