use std::rc::Rc;

use anyhow::Context;
use cartostyle_engine::backend::{HeadlessInit, OffscreenTarget, WgpuRenderer};
use cartostyle_engine::layers::PointModel;
use cartostyle_engine::logging::{init_logging, LoggingConfig};
use cartostyle_engine::service::{
    AttributeRegistry, EmptyAtlas, RenderRequests, Services, StaticCamera, StaticMap,
};
use cartostyle_engine::{EncodedFeature, FeatureLayer, LayerConfig, LayerModel};

const TARGET_SIZE: u32 = 512;
const FRAMES: u32 = 8;

const LAYER_CONFIG: &str = r#"{
    "blend": "additive",
    "animateOption": { "enable": true, "duration": 2.0 },
    "layout": { "maxWidth": 64 },
    "strokeWidth": 1.5
}"#;

/// Features on a ring, colored by angle.
fn ring(count: usize, radius: f32) -> Vec<EncodedFeature> {
    (0..count)
        .map(|i| {
            let t = i as f32 / count as f32;
            let angle = t * std::f32::consts::TAU;
            EncodedFeature::point(i as u64, [radius * angle.cos(), radius * angle.sin()])
                .with_color([t, 0.4, 1.0 - t, 1.0])
                .with_size(4.0 + 4.0 * t)
                .with_opacity(0.5 + 0.5 * t)
        })
        .collect()
}

fn main() -> anyhow::Result<()> {
    init_logging(LoggingConfig::default());

    let renderer = Rc::new(WgpuRenderer::new_headless(HeadlessInit::default())?);
    let target = OffscreenTarget::new(
        renderer.device(),
        renderer.target_format(),
        TARGET_SIZE,
        TARGET_SIZE,
    );

    let requests = Rc::new(RenderRequests::default());
    let services = Services::new()
        .with_camera(Rc::new(StaticCamera::default()))
        .with_map(Rc::new(StaticMap {
            viewport: [TARGET_SIZE as f32, TARGET_SIZE as f32],
        }))
        .with_style_attributes(Rc::new(AttributeRegistry::new()))
        .with_icons(Rc::new(EmptyAtlas))
        .with_fonts(Rc::new(EmptyAtlas))
        .with_renderer(renderer.clone())
        .with_layers(requests.clone());

    let config = LayerConfig::from_json(LAYER_CONFIG)?;
    let mut layer = FeatureLayer::new(config, services).with_data(ring(100, 0.6));

    let mut model = LayerModel::initialize(&mut layer, PointModel::new())
        .context("failed to initialize point model")?;
    log::info!(
        "point layer ready: {}x{} style texels",
        model.layout().width_count(),
        model.layout().height_count()
    );

    for frame in 0..FRAMES {
        // Halfway through, grow the data set past one texture row.
        if frame == FRAMES / 2 {
            layer.set_data(ring(300, 0.8));
        }

        let rebuilt = model.frame(&layer)?;
        let drawn = renderer.submit_to(&target, Some(wgpu::Color::BLACK));
        log::info!(
            "frame {frame}: {drawn} draws{}, layout {}x{}",
            if rebuilt { " (rebuilt)" } else { "" },
            model.layout().width_count(),
            model.layout().height_count()
        );
    }

    model.clear_models()?;
    log::info!(
        "cleared: {} models and {} textures left on the device, {} render requests",
        renderer.model_count(),
        renderer.texture_count(),
        requests.count()
    );
    Ok(())
}
