use anyhow::{Context, Result};
use serde::Deserialize;

use crate::animate::AnimateOption;
use crate::layout::LayoutConfig;

/// Per-layer configuration.
///
/// Deserialized from camelCase JSON; every field is optional and falls back
/// to [`LayerConfig::default`]. The blend name is kept as written so that an
/// unknown name is reported by the model that resolves it.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct LayerConfig {
    pub blend: Option<String>,
    pub animate_option: AnimateOption,
    pub layout: LayoutConfig,

    /// Fill opacity for features without their own.
    pub opacity: f32,
    /// Stroke opacity for features without their own.
    pub stroke_opacity: f32,
    /// Stroke width in pixels for features without their own.
    pub stroke_width: f32,
    /// Straight-alpha sRGB stroke color for features without their own.
    pub stroke: [u8; 4],
}

impl Default for LayerConfig {
    fn default() -> Self {
        Self {
            blend: None,
            animate_option: AnimateOption::default(),
            layout: LayoutConfig::default(),
            opacity: 1.0,
            stroke_opacity: 1.0,
            stroke_width: 0.0,
            stroke: [0, 0, 0, 255],
        }
    }
}

impl LayerConfig {
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).context("invalid layer config")
    }

    pub fn with_blend(mut self, blend: &str) -> Self {
        self.blend = Some(blend.to_owned());
        self
    }

    pub fn with_animate(mut self, option: AnimateOption) -> Self {
        self.animate_option = option;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_json_gives_defaults() {
        assert_eq!(LayerConfig::from_json("{}").unwrap(), LayerConfig::default());
    }

    #[test]
    fn nested_sections_parse() {
        let cfg = LayerConfig::from_json(
            r#"{
                "blend": "additive",
                "animateOption": { "enable": true, "duration": 2 },
                "layout": { "maxWidth": 256 },
                "strokeWidth": 1.5
            }"#,
        )
        .unwrap();
        assert_eq!(cfg.blend.as_deref(), Some("additive"));
        assert!(cfg.animate_option.enable);
        assert_eq!(cfg.animate_option.duration, Some(2.0));
        assert_eq!(cfg.layout.max_width, 256);
        assert_eq!(cfg.stroke_width, 1.5);
        assert_eq!(cfg.opacity, 1.0);
    }

    #[test]
    fn malformed_json_is_reported() {
        let err = LayerConfig::from_json(r#"{"opacity": "high"}"#).unwrap_err();
        assert!(err.to_string().contains("invalid layer config"));
    }
}
