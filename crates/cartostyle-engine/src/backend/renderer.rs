use std::cell::{Cell, RefCell};
use std::collections::HashMap;

use wgpu::util::DeviceExt;

use crate::error::{ModelError, Result};
use crate::service::{
    ModelDescriptor, ModelHandle, RendererService, Texture2DOptions, TextureHandle,
};
use crate::uniform::UniformMap;

use super::init::HeadlessInit;
use super::scope::ErrorScope;
use super::target::{OffscreenTarget, RenderTarget};

struct GpuTexture {
    texture: wgpu::Texture,
    view: wgpu::TextureView,
}

struct GpuModel {
    pipeline: wgpu::RenderPipeline,
    bind_group: wgpu::BindGroup,
    ubo: wgpu::Buffer,
    uniform_size: u64,
    vertex_buffers: Vec<wgpu::Buffer>,
    index_buffer: Option<(wgpu::Buffer, u32)>,
    vertex_count: u32,
    instance_count: u32,
}

impl GpuModel {
    fn destroy(&self) {
        self.ubo.destroy();
        for vbo in &self.vertex_buffers {
            vbo.destroy();
        }
        if let Some((ibo, _)) = &self.index_buffer {
            ibo.destroy();
        }
    }
}

/// Owns every texture and model created through [`RendererService`].
///
/// Draws are queued by [`RendererService::draw`] and recorded into a pass by
/// [`encode`](Self::encode). A model drawn twice before `encode` renders
/// twice with the uniforms of the last call.
pub struct WgpuRenderer {
    device: wgpu::Device,
    queue: wgpu::Queue,
    target_format: wgpu::TextureFormat,
    sampler: wgpu::Sampler,

    next_id: Cell<u64>,
    textures: RefCell<HashMap<TextureHandle, GpuTexture>>,
    models: RefCell<HashMap<ModelHandle, GpuModel>>,
    queued: RefCell<Vec<ModelHandle>>,
}

impl WgpuRenderer {
    pub fn new(device: wgpu::Device, queue: wgpu::Queue, target_format: wgpu::TextureFormat) -> Self {
        // Style textures hold exact per-feature values; never interpolate.
        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("cartostyle style sampler"),
            address_mode_u: wgpu::AddressMode::ClampToEdge,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            address_mode_w: wgpu::AddressMode::ClampToEdge,
            mag_filter: wgpu::FilterMode::Nearest,
            min_filter: wgpu::FilterMode::Nearest,
            mipmap_filter: wgpu::MipmapFilterMode::Nearest,
            ..Default::default()
        });

        Self {
            device,
            queue,
            target_format,
            sampler,
            next_id: Cell::new(0),
            textures: RefCell::new(HashMap::new()),
            models: RefCell::new(HashMap::new()),
            queued: RefCell::new(Vec::new()),
        }
    }

    /// Creates a renderer on a windowless device.
    pub fn new_headless(init: HeadlessInit) -> anyhow::Result<Self> {
        let (device, queue) = pollster::block_on(init.request())?;
        Ok(Self::new(device, queue, init.target_format))
    }

    pub fn device(&self) -> &wgpu::Device {
        &self.device
    }

    pub fn queue(&self) -> &wgpu::Queue {
        &self.queue
    }

    pub fn target_format(&self) -> wgpu::TextureFormat {
        self.target_format
    }

    pub fn texture_count(&self) -> usize {
        self.textures.borrow().len()
    }

    pub fn model_count(&self) -> usize {
        self.models.borrow().len()
    }

    pub fn queued_draws(&self) -> usize {
        self.queued.borrow().len()
    }

    /// Records every queued draw into `target` and empties the queue.
    ///
    /// `clear` selects the load op of the pass. Returns the number of draws
    /// recorded; draws of models destroyed after queueing are skipped.
    pub fn encode(&self, target: &mut RenderTarget<'_>, clear: Option<wgpu::Color>) -> usize {
        let queued = std::mem::take(&mut *self.queued.borrow_mut());
        let models = self.models.borrow();

        let load = match clear {
            Some(color) => wgpu::LoadOp::Clear(color),
            None => wgpu::LoadOp::Load,
        };

        let mut rpass = target.encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("cartostyle layer pass"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: target.color_view,
                resolve_target: None,
                ops: wgpu::Operations {
                    load,
                    store: wgpu::StoreOp::Store,
                },
                depth_slice: None,
            })],
            depth_stencil_attachment: None,
            timestamp_writes: None,
            occlusion_query_set: None,
            multiview_mask: None,
        });

        let mut recorded = 0;
        for handle in queued {
            let Some(model) = models.get(&handle) else {
                log::debug!("skipping draw of destroyed model {handle:?}");
                continue;
            };

            rpass.set_pipeline(&model.pipeline);
            rpass.set_bind_group(0, &model.bind_group, &[]);
            for (slot, vbo) in model.vertex_buffers.iter().enumerate() {
                rpass.set_vertex_buffer(slot as u32, vbo.slice(..));
            }
            match &model.index_buffer {
                Some((ibo, index_count)) => {
                    rpass.set_index_buffer(ibo.slice(..), wgpu::IndexFormat::Uint32);
                    rpass.draw_indexed(0..*index_count, 0, 0..model.instance_count);
                }
                None => rpass.draw(0..model.vertex_count, 0..model.instance_count),
            }
            recorded += 1;
        }
        recorded
    }

    /// Encodes queued draws into `target` and submits them.
    pub fn submit_to(&self, target: &OffscreenTarget, clear: Option<wgpu::Color>) -> usize {
        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("cartostyle frame encoder"),
            });
        let recorded = {
            let mut rt = RenderTarget::new(&mut encoder, target.view());
            self.encode(&mut rt, clear)
        };
        self.queue.submit(std::iter::once(encoder.finish()));
        recorded
    }

    fn next_id(&self) -> u64 {
        let id = self.next_id.get() + 1;
        self.next_id.set(id);
        id
    }

    fn build_model(&self, desc: &ModelDescriptor) -> Result<GpuModel> {
        let textures = self.textures.borrow();
        let views = desc
            .textures
            .iter()
            .map(|h| {
                textures.get(h).map(|t| &t.view).ok_or_else(|| {
                    ModelError::contract(format!("{}: unknown texture {h:?}", desc.label))
                })
            })
            .collect::<Result<Vec<_>>>()?;

        let scope = ErrorScope::push(&self.device, desc.label.as_str());
        let model = self.record_model(desc, &views);
        if let Err(err) = scope.check() {
            model.destroy();
            return Err(err);
        }
        Ok(model)
    }

    /// Creates every wgpu object of a model. Errors surface through the
    /// enclosing [`ErrorScope`], not here.
    fn record_model(&self, desc: &ModelDescriptor, views: &[&wgpu::TextureView]) -> GpuModel {
        let uniform_size = desc.uniform_size.max(16);

        let shader = self.device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some(desc.label.as_str()),
            source: wgpu::ShaderSource::Wgsl(desc.shader.clone()),
        });

        let mut layout_entries = vec![
            wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX_FRAGMENT,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: wgpu::BufferSize::new(uniform_size),
                },
                count: None,
            },
            wgpu::BindGroupLayoutEntry {
                binding: 1,
                visibility: wgpu::ShaderStages::VERTEX_FRAGMENT,
                ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::NonFiltering),
                count: None,
            },
        ];
        // R32Float is not filterable; every style texture binds as non-filterable.
        layout_entries.extend((0..views.len()).map(|i| wgpu::BindGroupLayoutEntry {
            binding: 2 + i as u32,
            visibility: wgpu::ShaderStages::VERTEX_FRAGMENT,
            ty: wgpu::BindingType::Texture {
                sample_type: wgpu::TextureSampleType::Float { filterable: false },
                view_dimension: wgpu::TextureViewDimension::D2,
                multisampled: false,
            },
            count: None,
        }));

        let bgl = self.device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("cartostyle model bgl"),
            entries: &layout_entries,
        });

        let ubo = self.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("cartostyle model ubo"),
            size: uniform_size,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let mut group_entries = vec![
            wgpu::BindGroupEntry {
                binding: 0,
                resource: ubo.as_entire_binding(),
            },
            wgpu::BindGroupEntry {
                binding: 1,
                resource: wgpu::BindingResource::Sampler(&self.sampler),
            },
        ];
        group_entries.extend(views.iter().enumerate().map(|(i, view)| wgpu::BindGroupEntry {
            binding: 2 + i as u32,
            resource: wgpu::BindingResource::TextureView(view),
        }));

        let bind_group = self.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("cartostyle model bind group"),
            layout: &bgl,
            entries: &group_entries,
        });

        let pipeline_layout = self
            .device
            .create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
                label: Some("cartostyle model pipeline layout"),
                bind_group_layouts: &[&bgl],
                immediate_size: 0,
            });

        let buffer_layouts: Vec<wgpu::VertexBufferLayout<'_>> = desc
            .vertex_buffers
            .iter()
            .map(|b| wgpu::VertexBufferLayout {
                array_stride: b.stride,
                step_mode: b.step_mode,
                attributes: &b.attributes,
            })
            .collect();

        let pipeline = self.device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some(desc.label.as_str()),
            layout: Some(&pipeline_layout),

            vertex: wgpu::VertexState {
                module: &shader,
                entry_point: Some("vs_main"),
                compilation_options: Default::default(),
                buffers: &buffer_layouts,
            },

            fragment: Some(wgpu::FragmentState {
                module: &shader,
                entry_point: Some("fs_main"),
                compilation_options: Default::default(),
                targets: &[Some(wgpu::ColorTargetState {
                    format: self.target_format,
                    blend: desc.blend.state,
                    write_mask: wgpu::ColorWrites::ALL,
                })],
            }),

            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                strip_index_format: None,
                front_face: wgpu::FrontFace::Ccw,
                cull_mode: None,
                polygon_mode: wgpu::PolygonMode::Fill,
                unclipped_depth: false,
                conservative: false,
            },

            depth_stencil: None,
            multisample: wgpu::MultisampleState::default(),
            multiview_mask: None,
            cache: None,
        });

        let vertex_buffers = desc
            .vertex_buffers
            .iter()
            .map(|b| {
                self.device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                    label: Some("cartostyle model vbo"),
                    contents: &b.data,
                    usage: wgpu::BufferUsages::VERTEX,
                })
            })
            .collect();

        let index_buffer = desc.indices.as_ref().map(|indices| {
            let ibo = self.device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("cartostyle model ibo"),
                contents: bytemuck::cast_slice(indices.as_slice()),
                usage: wgpu::BufferUsages::INDEX,
            });
            (ibo, indices.len() as u32)
        });

        GpuModel {
            pipeline,
            bind_group,
            ubo,
            uniform_size,
            vertex_buffers,
            index_buffer,
            vertex_count: desc.vertex_count,
            instance_count: desc.instance_count,
        }
    }
}

impl RendererService for WgpuRenderer {
    fn create_texture_2d(&self, options: &Texture2DOptions) -> Result<TextureHandle> {
        let texel_size =
            validate_texture(options, self.device.limits().max_texture_dimension_2d)?;

        let scope = ErrorScope::push(&self.device, options.label);
        let size = wgpu::Extent3d {
            width: options.width,
            height: options.height,
            depth_or_array_layers: 1,
        };
        let texture = self.device.create_texture(&wgpu::TextureDescriptor {
            label: Some(options.label),
            size,
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: options.format,
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        });

        self.queue.write_texture(
            wgpu::TexelCopyTextureInfo {
                texture: &texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            &options.data,
            wgpu::TexelCopyBufferLayout {
                offset: 0,
                bytes_per_row: Some(options.width * texel_size),
                rows_per_image: Some(options.height),
            },
            size,
        );

        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        if let Err(err) = scope.check() {
            texture.destroy();
            return Err(err);
        }

        let handle = TextureHandle(self.next_id());
        self.textures
            .borrow_mut()
            .insert(handle, GpuTexture { texture, view });
        Ok(handle)
    }

    fn destroy_texture(&self, handle: TextureHandle) {
        match self.textures.borrow_mut().remove(&handle) {
            Some(t) => t.texture.destroy(),
            None => log::warn!("destroy of unknown texture {handle:?}"),
        }
    }

    fn create_model(&self, descriptor: &ModelDescriptor) -> Result<ModelHandle> {
        let model = self.build_model(descriptor)?;
        let handle = ModelHandle(self.next_id());
        log::debug!(
            "{}: model {handle:?} created ({} instances)",
            descriptor.label,
            descriptor.instance_count
        );
        self.models.borrow_mut().insert(handle, model);
        Ok(handle)
    }

    fn destroy_model(&self, handle: ModelHandle) {
        match self.models.borrow_mut().remove(&handle) {
            Some(model) => model.destroy(),
            None => log::warn!("destroy of unknown model {handle:?}"),
        }
    }

    fn draw(&self, model: ModelHandle, uniforms: &UniformMap) -> Result<()> {
        let models = self.models.borrow();
        let Some(gpu) = models.get(&model) else {
            return Err(ModelError::contract(format!("draw of unknown model {model:?}")));
        };

        let bytes = uniforms.to_bytes();
        if bytes.len() as u64 > gpu.uniform_size {
            return Err(ModelError::contract(format!(
                "uniform block of {} bytes exceeds the {} bytes the model was built for",
                bytes.len(),
                gpu.uniform_size
            )));
        }
        self.queue.write_buffer(&gpu.ubo, 0, &bytes);
        self.queued.borrow_mut().push(model);
        Ok(())
    }
}

impl Drop for WgpuRenderer {
    fn drop(&mut self) {
        for (_, model) in self.models.get_mut().drain() {
            model.destroy();
        }
        for (_, t) in self.textures.get_mut().drain() {
            t.texture.destroy();
        }
    }
}

/// Checks dimensions against the device limit and the data length against
/// the format. Returns the texel size in bytes.
fn validate_texture(options: &Texture2DOptions, max_dimension: u32) -> Result<u32> {
    let (w, h) = (options.width, options.height);
    if w == 0 || h == 0 || w > max_dimension || h > max_dimension {
        return Err(ModelError::resource(format!(
            "{}: {w}x{h} outside supported range 1..={max_dimension}",
            options.label
        )));
    }

    let texel_size = texel_size(options.format)?;
    let expected = w as usize * h as usize * texel_size as usize;
    if options.data.len() != expected {
        return Err(ModelError::contract(format!(
            "{}: expected {expected} bytes of texel data, got {}",
            options.label,
            options.data.len()
        )));
    }
    Ok(texel_size)
}

/// Bytes per texel of an uncompressed, single-aspect format.
fn texel_size(format: wgpu::TextureFormat) -> Result<u32> {
    match (format.block_dimensions(), format.block_copy_size(None)) {
        ((1, 1), Some(size)) => Ok(size),
        _ => Err(ModelError::contract(format!(
            "texture format {format:?} is not supported for style data"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // ── texel_size ────────────────────────────────────────────────────────

    #[test]
    fn style_formats_have_fixed_texel_size() {
        assert_eq!(texel_size(wgpu::TextureFormat::R32Float).unwrap(), 4);
        assert_eq!(texel_size(wgpu::TextureFormat::Rgba8Unorm).unwrap(), 4);
        assert_eq!(texel_size(wgpu::TextureFormat::Rg32Float).unwrap(), 8);
    }

    #[test]
    fn block_compressed_and_depth_stencil_formats_are_rejected() {
        assert!(texel_size(wgpu::TextureFormat::Bc1RgbaUnorm).is_err());
        assert!(texel_size(wgpu::TextureFormat::Depth24PlusStencil8).is_err());
    }

    // ── validate_texture ──────────────────────────────────────────────────

    fn opacity(width: u32, height: u32, bytes: usize) -> Texture2DOptions {
        Texture2DOptions {
            label: "test opacity",
            width,
            height,
            format: wgpu::TextureFormat::R32Float,
            data: vec![0; bytes],
        }
    }

    #[test]
    fn well_formed_texture_passes() {
        assert_eq!(validate_texture(&opacity(3, 2, 24), 2048).unwrap(), 4);
        assert_eq!(validate_texture(&opacity(2048, 1, 2048 * 4), 2048).unwrap(), 4);
    }

    #[test]
    fn zero_sized_texture_is_a_resource_error() {
        let err = validate_texture(&opacity(0, 1, 0), 2048).unwrap_err();
        assert!(matches!(err, ModelError::Resource(_)));
        let err = validate_texture(&opacity(1, 0, 0), 2048).unwrap_err();
        assert!(matches!(err, ModelError::Resource(_)));
    }

    #[test]
    fn texture_over_device_limit_is_a_resource_error() {
        let err = validate_texture(&opacity(2049, 1, 2049 * 4), 2048).unwrap_err();
        assert!(matches!(err, ModelError::Resource(_)));
        let err = validate_texture(&opacity(1, 4096, 4096 * 4), 2048).unwrap_err();
        assert!(matches!(err, ModelError::Resource(_)));
    }

    #[test]
    fn wrong_byte_count_is_a_contract_violation() {
        assert!(validate_texture(&opacity(2, 2, 15), 2048)
            .unwrap_err()
            .is_contract_violation());
        assert!(validate_texture(&opacity(2, 2, 17), 2048)
            .unwrap_err()
            .is_contract_violation());
    }

    // ── HeadlessInit ──────────────────────────────────────────────────────

    #[test]
    fn headless_defaults_are_portable() {
        let init = HeadlessInit::default();
        assert!(init.required_features.is_empty());
        assert!(!init.force_fallback_adapter);
        assert_eq!(init.target_format, wgpu::TextureFormat::Rgba8UnormSrgb);
    }
}
