//! The layer side of the model contract.

use std::time::Instant;

use crate::config::LayerConfig;
use crate::service::Services;

/// One encoded feature record.
///
/// Colors are straight-alpha linear RGBA in `[0, 1]`. Optional style values
/// fall back to the layer config.
#[derive(Debug, Clone, PartialEq)]
pub struct EncodedFeature {
    pub id: u64,
    /// World-space coordinates; points use the first one.
    pub coordinates: Vec<[f32; 2]>,
    pub color: [f32; 4],
    pub size: f32,
    pub opacity: Option<f32>,
    pub stroke: Option<[u8; 4]>,
    pub stroke_opacity: Option<f32>,
    pub stroke_width: Option<f32>,
}

impl EncodedFeature {
    pub fn point(id: u64, at: [f32; 2]) -> Self {
        Self {
            id,
            coordinates: vec![at],
            color: [1.0, 1.0, 1.0, 1.0],
            size: 4.0,
            opacity: None,
            stroke: None,
            stroke_opacity: None,
            stroke_width: None,
        }
    }

    pub fn with_color(mut self, color: [f32; 4]) -> Self {
        self.color = color;
        self
    }

    pub fn with_size(mut self, size: f32) -> Self {
        self.size = size;
        self
    }

    pub fn with_opacity(mut self, opacity: f32) -> Self {
        self.opacity = Some(opacity);
        self
    }

    pub fn with_stroke(mut self, stroke: [u8; 4], width: f32) -> Self {
        self.stroke = Some(stroke);
        self.stroke_width = Some(width);
        self
    }
}

/// What a model needs from the layer that owns it.
pub trait Layer {
    fn layer_config(&self) -> &LayerConfig;

    fn encoded_data(&self) -> &[EncodedFeature];

    /// Feature count; drives the style texture layout.
    fn encoded_data_len(&self) -> usize {
        self.encoded_data().len()
    }

    /// Increments whenever the encoded data is replaced.
    fn data_version(&self) -> u64;

    /// Records "now" as the animation origin.
    fn set_animate_start_time(&mut self);

    /// Seconds since the animation origin, `0.0` if never started.
    fn animate_time(&self) -> f32;

    fn services(&self) -> &Services;
}

/// General-purpose [`Layer`] holding features in memory.
pub struct FeatureLayer {
    config: LayerConfig,
    features: Vec<EncodedFeature>,
    data_version: u64,
    services: Services,
    animate_start: Option<Instant>,
}

impl FeatureLayer {
    pub fn new(config: LayerConfig, services: Services) -> Self {
        Self {
            config,
            features: Vec::new(),
            data_version: 0,
            services,
            animate_start: None,
        }
    }

    pub fn with_data(mut self, features: Vec<EncodedFeature>) -> Self {
        self.set_data(features);
        self
    }

    /// Replaces the feature data and bumps the data version.
    pub fn set_data(&mut self, features: Vec<EncodedFeature>) {
        self.features = features;
        self.data_version = self.data_version.wrapping_add(1);
    }

    pub fn set_config(&mut self, config: LayerConfig) {
        self.config = config;
    }

    pub fn config_mut(&mut self) -> &mut LayerConfig {
        &mut self.config
    }

    pub fn animate_start(&self) -> Option<Instant> {
        self.animate_start
    }
}

impl Layer for FeatureLayer {
    fn layer_config(&self) -> &LayerConfig {
        &self.config
    }

    fn encoded_data(&self) -> &[EncodedFeature] {
        &self.features
    }

    fn data_version(&self) -> u64 {
        self.data_version
    }

    fn set_animate_start_time(&mut self) {
        self.animate_start = Some(Instant::now());
    }

    fn animate_time(&self) -> f32 {
        self.animate_start
            .map_or(0.0, |start| start.elapsed().as_secs_f32())
    }

    fn services(&self) -> &Services {
        &self.services
    }
}
