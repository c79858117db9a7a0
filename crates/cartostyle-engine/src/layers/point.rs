use bytemuck::{Pod, Zeroable};

use crate::error::Result;
use crate::layer::Layer;
use crate::layout::DataLayout;
use crate::model::{AttributeSet, BuildCtx, DrawCtx, ModelVariant, UniformCtx};
use crate::service::{
    AttributeDescriptor, AttributeScope, ModelDescriptor, ModelHandle, StyleAttributeService,
    VertexBufferDescriptor,
};
use crate::texture::{StyleChannel, StyleData};
use crate::uniform::UniformMap;

const SHADER: &str = include_str!("shaders/point.wgsl");

/// Style attributes a point model consumes.
const ATTRIBUTES: [AttributeDescriptor; 8] = [
    AttributeDescriptor::new("position", AttributeScope::Instance, 2),
    AttributeDescriptor::new("style_uv", AttributeScope::Instance, 2),
    AttributeDescriptor::new("color", AttributeScope::Instance, 4),
    AttributeDescriptor::new("size", AttributeScope::Instance, 1),
    AttributeDescriptor::new("opacity", AttributeScope::Texture, 1),
    AttributeDescriptor::new("stroke_opacity", AttributeScope::Texture, 1),
    AttributeDescriptor::new("stroke", AttributeScope::Texture, 4),
    AttributeDescriptor::new("stroke_width", AttributeScope::Texture, 1),
];

/// Config and data the current GPU models were built from.
#[derive(Debug, Clone, PartialEq)]
struct BuildStamp {
    data_version: u64,
    blend: Option<String>,
    max_width: u32,
    opacity: f32,
    stroke_opacity: f32,
    stroke_width: f32,
    stroke: [u8; 4],
}

impl BuildStamp {
    fn of(layer: &dyn Layer) -> Self {
        let cfg = layer.layer_config();
        Self {
            data_version: layer.data_version(),
            blend: cfg.blend.clone(),
            max_width: cfg.layout.max_width,
            opacity: cfg.opacity,
            stroke_opacity: cfg.stroke_opacity,
            stroke_width: cfg.stroke_width,
            stroke: cfg.stroke,
        }
    }
}

/// Point layer: one screen-aligned circle per feature.
///
/// Position, color and size travel as instance attributes; opacity and
/// stroke styling are sampled from style textures at the feature's UV.
#[derive(Debug, Default)]
pub struct PointModel {
    built: Option<BuildStamp>,
}

impl PointModel {
    pub fn new() -> Self {
        Self::default()
    }

    fn build(&mut self, ctx: &mut BuildCtx<'_>) -> Result<Vec<ModelHandle>> {
        let layer = ctx.layer;
        let cfg = layer.layer_config();
        let features = layer.encoded_data();

        // Texture bindings 2..=5, in shader order.
        let opacity = ctx.textures.ensure_texture(StyleChannel::Opacity, ctx.layout, |_| {
            StyleData::Scalars(features.iter().map(|f| f.opacity.unwrap_or(cfg.opacity)).collect())
        })?;
        let stroke_opacity =
            ctx.textures.ensure_texture(StyleChannel::StrokeOpacity, ctx.layout, |_| {
                StyleData::Scalars(
                    features
                        .iter()
                        .map(|f| f.stroke_opacity.unwrap_or(cfg.stroke_opacity))
                        .collect(),
                )
            })?;
        let stroke = ctx.textures.ensure_texture(StyleChannel::Stroke, ctx.layout, |_| {
            StyleData::Colors(features.iter().map(|f| f.stroke.unwrap_or(cfg.stroke)).collect())
        })?;
        let stroke_width = ctx.textures.ensure_texture(StyleChannel::StrokeWidth, ctx.layout, |_| {
            StyleData::Scalars(
                features
                    .iter()
                    .map(|f| f.stroke_width.unwrap_or(cfg.stroke_width))
                    .collect(),
            )
        })?;

        self.built = Some(BuildStamp::of(layer));

        let geometry = self.attribute(layer, ctx.layout)?;
        if geometry.instance_count == 0 {
            log::debug!("point model: no features, nothing to build");
            return Ok(Vec::new());
        }

        let model = ctx.services.renderer.create_model(&ModelDescriptor {
            label: "cartostyle point model".into(),
            shader: SHADER.into(),
            vertex_buffers: geometry.buffers,
            indices: geometry.elements,
            vertex_count: geometry.vertex_count,
            instance_count: geometry.instance_count,
            uniform_size: ctx.uniform_size,
            textures: vec![opacity, stroke_opacity, stroke, stroke_width],
            blend: ctx.blend,
        })?;
        Ok(vec![model])
    }
}

impl ModelVariant for PointModel {
    fn register_attributes(&mut self, registry: &dyn StyleAttributeService) -> Result<()> {
        for attr in ATTRIBUTES {
            registry.register_attribute(attr);
        }
        Ok(())
    }

    fn init_models(&mut self, ctx: &mut BuildCtx<'_>) -> Result<Vec<ModelHandle>> {
        self.build(ctx)
    }

    fn build_models(&mut self, ctx: &mut BuildCtx<'_>) -> Result<Vec<ModelHandle>> {
        self.build(ctx)
    }

    fn uniforms(&self, ctx: &UniformCtx<'_>) -> Result<UniformMap> {
        Ok(UniformMap::new()
            .with("u_view_proj", ctx.services.camera.view_projection())
            .with("u_viewport", ctx.services.map.viewport()))
    }

    fn attribute(&self, layer: &dyn Layer, layout: &DataLayout) -> Result<AttributeSet> {
        let instances: Vec<PointInstance> = layer
            .encoded_data()
            .iter()
            .enumerate()
            .map(|(i, f)| PointInstance {
                position: f.coordinates.first().copied().unwrap_or([0.0, 0.0]),
                style_uv: layout.uv(i),
                color: f.color,
                size: f.size,
            })
            .collect();

        Ok(AttributeSet {
            buffers: vec![
                VertexBufferDescriptor {
                    stride: std::mem::size_of::<CornerVertex>() as u64,
                    step_mode: wgpu::VertexStepMode::Vertex,
                    attributes: CornerVertex::ATTRS.to_vec(),
                    data: bytemuck::cast_slice(&CORNERS).to_vec(),
                },
                VertexBufferDescriptor {
                    stride: std::mem::size_of::<PointInstance>() as u64,
                    step_mode: wgpu::VertexStepMode::Instance,
                    attributes: PointInstance::ATTRS.to_vec(),
                    data: bytemuck::cast_slice(&instances).to_vec(),
                },
            ],
            elements: Some(CORNER_INDICES.to_vec()),
            vertex_count: CORNERS.len() as u32,
            instance_count: instances.len() as u32,
        })
    }

    fn render(&mut self, ctx: &DrawCtx<'_>) -> Result<()> {
        for &model in ctx.models {
            ctx.renderer.draw(model, ctx.uniforms)?;
        }
        Ok(())
    }

    fn need_update(&self, layer: &dyn Layer) -> bool {
        self.built.as_ref() != Some(&BuildStamp::of(layer))
    }

    fn default_style(&self) -> UniformMap {
        UniformMap::new()
            .with("opacity", 1.0f32)
            .with("stroke_opacity", 1.0f32)
            .with("stroke_width", 0.0f32)
    }
}

// ── quad corners ──────────────────────────────────────────────────────────

#[repr(C)]
#[derive(Debug, Copy, Clone, Pod, Zeroable)]
struct CornerVertex {
    corner: [f32; 2], // -1..1
}

impl CornerVertex {
    const ATTRS: [wgpu::VertexAttribute; 1] = wgpu::vertex_attr_array![0 => Float32x2];
}

const CORNERS: [CornerVertex; 4] = [
    CornerVertex { corner: [-1.0, -1.0] },
    CornerVertex { corner: [1.0, -1.0] },
    CornerVertex { corner: [1.0, 1.0] },
    CornerVertex { corner: [-1.0, 1.0] },
];

const CORNER_INDICES: [u32; 6] = [0, 1, 2, 0, 2, 3];

// ── per-feature instance ──────────────────────────────────────────────────

#[repr(C)]
#[derive(Debug, Copy, Clone, Pod, Zeroable)]
struct PointInstance {
    position: [f32; 2],
    style_uv: [f32; 2],
    color: [f32; 4],
    size: f32,
}

impl PointInstance {
    const ATTRS: [wgpu::VertexAttribute; 4] = wgpu::vertex_attr_array![
        1 => Float32x2, // position
        2 => Float32x2, // style_uv
        3 => Float32x4, // color
        4 => Float32    // size
    ];
}

#[cfg(test)]
mod tests {
    use std::rc::Rc;

    use super::*;
    use crate::layer::EncodedFeature;
    use crate::model::{LayerModel, ModelState};
    use crate::service::Texture2DOptions;
    use crate::test_support::{points, services, RecordingRenderer, TestLayer};
    use crate::uniform::UniformValue;

    fn setup(features: Vec<EncodedFeature>) -> (Rc<RecordingRenderer>, TestLayer) {
        let renderer = Rc::new(RecordingRenderer::default());
        let mut layer = TestLayer::with_services(0, services(renderer.clone()));
        layer.set_data(features);
        (renderer, layer)
    }

    fn read<T: Pod>(bytes: &[u8]) -> Vec<T> {
        bytes
            .chunks_exact(std::mem::size_of::<T>())
            .map(bytemuck::pod_read_unaligned::<T>)
            .collect()
    }

    fn texture_of(renderer: &RecordingRenderer, label: &str) -> Texture2DOptions {
        renderer
            .created_textures()
            .into_iter()
            .rev()
            .find(|t| t.label == label)
            .unwrap()
    }

    #[test]
    fn registers_position_and_texture_channels() {
        let (_r, mut layer) = setup(points(1));
        let model = LayerModel::initialize(&mut layer, PointModel::new()).unwrap();
        let attrs = model.services().style_attributes.attributes();
        assert_eq!(attrs.len(), ATTRIBUTES.len());
        assert_eq!(
            model.services().style_attributes.attribute("stroke").unwrap().scope,
            AttributeScope::Texture
        );
    }

    #[test]
    fn builds_one_instanced_model_with_four_style_textures() {
        let (renderer, mut layer) = setup(points(3));
        let mut model = LayerModel::initialize(&mut layer, PointModel::new()).unwrap();
        model.frame(&layer).unwrap();

        let desc = &renderer.created_models()[0];
        assert_eq!(desc.instance_count, 3);
        assert_eq!(desc.indices.as_deref(), Some(&CORNER_INDICES[..]));
        assert_eq!(desc.textures.len(), 4);
        assert_eq!(desc.vertex_buffers[1].data.len(), 3 * std::mem::size_of::<PointInstance>());
        assert_eq!(model.textures().live_count(), 4);
        assert_eq!(model.state(), ModelState::Built);
    }

    #[test]
    fn feature_styles_override_config_defaults() {
        let features = vec![
            EncodedFeature::point(0, [0.0, 0.0]).with_opacity(0.25),
            EncodedFeature::point(1, [1.0, 0.0]).with_stroke([255, 0, 0, 255], 2.0),
        ];
        let (renderer, mut layer) = setup(features);
        layer.config.opacity = 0.5;
        let mut model = LayerModel::initialize(&mut layer, PointModel::new()).unwrap();
        model.init_models(&layer).unwrap();

        let opacity = texture_of(&renderer, StyleChannel::Opacity.label());
        assert_eq!(read::<f32>(&opacity.data), vec![0.25, 0.5]);

        let stroke = texture_of(&renderer, StyleChannel::Stroke.label());
        assert_eq!(stroke.data, vec![0, 0, 0, 255, 255, 0, 0, 255]);

        let width = texture_of(&renderer, StyleChannel::StrokeWidth.label());
        assert_eq!(read::<f32>(&width.data), vec![0.0, 2.0]);
    }

    #[test]
    fn instances_carry_texel_center_uvs() {
        let (_r, mut layer) = setup(points(3));
        layer.config.layout.max_width = 2;
        let model = LayerModel::initialize(&mut layer, PointModel::new()).unwrap();
        let attrs = model.attribute(&layer).unwrap();

        let instances = read::<PointInstance>(&attrs.buffers[1].data);
        assert_eq!(instances[0].style_uv, [0.25, 0.25]);
        assert_eq!(instances[1].style_uv, [0.75, 0.25]);
        assert_eq!(instances[2].style_uv, [0.25, 0.75]);
    }

    #[test]
    fn uniforms_match_shader_block() {
        let (_r, mut layer) = setup(points(2));
        let model = LayerModel::initialize(&mut layer, PointModel::new()).unwrap();
        let u = model.uniforms(&layer).unwrap();
        assert_eq!(
            u.names().collect::<Vec<_>>(),
            vec!["u_view_proj", "u_viewport", "u_data_layout", "u_data_start", "u_animate", "u_time"]
        );
        assert_eq!(u.get("u_viewport"), Some(&UniformValue::Vec2([512.0, 512.0])));
        assert_eq!(u.to_bytes().len(), 144);
    }

    #[test]
    fn config_change_triggers_rebuild() {
        let (renderer, mut layer) = setup(points(2));
        let mut model = LayerModel::initialize(&mut layer, PointModel::new()).unwrap();
        model.frame(&layer).unwrap();
        assert!(!model.need_update(&layer));

        layer.config.blend = Some("additive".into());
        assert!(model.need_update(&layer));
        assert!(model.frame(&layer).unwrap());
        assert_eq!(renderer.live_models(), 1);
        assert_eq!(
            renderer.created_models().last().unwrap().blend.mode,
            crate::blend::BlendMode::Additive
        );
    }

    #[test]
    fn empty_layer_builds_no_models_but_renders() {
        let (renderer, mut layer) = setup(Vec::new());
        let mut model = LayerModel::initialize(&mut layer, PointModel::new()).unwrap();
        model.frame(&layer).unwrap();
        assert!(model.models().is_empty());
        assert!(renderer.draws().is_empty());
        let opacity = texture_of(&renderer, StyleChannel::Opacity.label());
        assert_eq!((opacity.width, opacity.height), (1, 1));
    }
}
