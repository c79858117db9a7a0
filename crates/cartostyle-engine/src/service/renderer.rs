use std::borrow::Cow;

use crate::blend::BlendOptions;
use crate::error::Result;
use crate::uniform::UniformMap;

/// Opaque handle to a backend-owned 2D texture.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub struct TextureHandle(pub u64);

/// Opaque handle to a backend-owned renderable model.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub struct ModelHandle(pub u64);

/// Parameters for a sampled 2D texture with initial contents.
#[derive(Debug, Clone, PartialEq)]
pub struct Texture2DOptions {
    pub label: &'static str,
    pub width: u32,
    pub height: u32,
    pub format: wgpu::TextureFormat,
    /// Tightly packed rows, `width * height` texels.
    pub data: Vec<u8>,
}

/// One vertex buffer with its layout and contents.
#[derive(Debug, Clone, PartialEq)]
pub struct VertexBufferDescriptor {
    pub stride: u64,
    pub step_mode: wgpu::VertexStepMode,
    pub attributes: Vec<wgpu::VertexAttribute>,
    pub data: Vec<u8>,
}

/// Everything a backend needs to build one draw-ready model.
///
/// Bind group 0 layout:
/// - binding 0: uniform buffer of `uniform_size` bytes
/// - binding 1: non-filtering sampler
/// - binding 2..: `textures`, in order
#[derive(Debug, Clone, PartialEq)]
pub struct ModelDescriptor {
    pub label: String,
    /// WGSL source with `vs_main` / `fs_main` entry points.
    pub shader: Cow<'static, str>,
    pub vertex_buffers: Vec<VertexBufferDescriptor>,
    pub indices: Option<Vec<u32>>,
    /// Vertices per instance when `indices` is `None`.
    pub vertex_count: u32,
    pub instance_count: u32,
    pub uniform_size: u64,
    pub textures: Vec<TextureHandle>,
    pub blend: BlendOptions,
}

/// GPU resource factory and draw sink.
///
/// Handles returned here are owned by the caller until passed back to the
/// matching `destroy_*` method.
pub trait RendererService {
    /// Creates a texture. Failure is a [`ModelError::Resource`](crate::ModelError::Resource).
    fn create_texture_2d(&self, options: &Texture2DOptions) -> Result<TextureHandle>;

    fn destroy_texture(&self, handle: TextureHandle);

    fn create_model(&self, descriptor: &ModelDescriptor) -> Result<ModelHandle>;

    fn destroy_model(&self, handle: ModelHandle);

    /// Queues a draw of `model` with the given uniform values.
    fn draw(&self, model: ModelHandle, uniforms: &UniformMap) -> Result<()>;
}
