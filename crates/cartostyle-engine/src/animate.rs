//! Declarative animation options and the shader parameter vector.

use serde::Deserialize;

use crate::layer::Layer;
use crate::uniform::UniformMap;

pub const DEFAULT_DURATION: f32 = 4.0;
pub const DEFAULT_INTERVAL: f32 = 0.2;
pub const DEFAULT_TRAIL_LENGTH: f32 = 0.1;

/// Animation settings from a layer config.
///
/// Absent values are `None`. [`to_parameter_vector`] also treats an
/// explicit `0.0` as absent.
#[derive(Debug, Copy, Clone, Default, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct AnimateOption {
    pub enable: bool,
    pub duration: Option<f32>,
    pub interval: Option<f32>,
    pub trail_length: Option<f32>,
}

impl AnimateOption {
    pub fn enabled() -> Self {
        Self { enable: true, ..Self::default() }
    }
}

/// `[enable_flag, duration, interval, trail_length]` for shaders.
///
/// The flag is inverted: `0.0` means animate, `1.0` means static.
/// Zero, NaN and absent values fall back to their defaults.
pub fn to_parameter_vector(option: &AnimateOption) -> [f32; 4] {
    [
        if option.enable { 0.0 } else { 1.0 },
        or_default(option.duration, DEFAULT_DURATION),
        or_default(option.interval, DEFAULT_INTERVAL),
        or_default(option.trail_length, DEFAULT_TRAIL_LENGTH),
    ]
}

fn or_default(value: Option<f32>, default: f32) -> f32 {
    match value {
        Some(v) if v != 0.0 && !v.is_nan() => v,
        _ => default,
    }
}

/// Starts the layer's animation clock if animation is enabled.
///
/// Returns whether the clock was started.
pub fn arm(option: &AnimateOption, layer: &mut dyn Layer) -> bool {
    if !option.enable {
        return false;
    }
    layer.set_animate_start_time();
    true
}

/// `u_animate` and `u_time` when animation is enabled, empty otherwise.
pub fn animate_uniforms(option: &AnimateOption, time: f32) -> UniformMap {
    if !option.enable {
        return UniformMap::new();
    }
    UniformMap::new()
        .with("u_animate", to_parameter_vector(option))
        .with("u_time", time)
}
