//! Named blend modes and their GPU blend states.

use std::fmt;
use std::str::FromStr;

use serde::Deserialize;

use crate::error::{ModelError, Result};

/// Closed set of blend modes a layer config may name.
#[derive(Debug, Copy, Clone, Default, Eq, PartialEq, Hash, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BlendMode {
    #[default]
    Normal,
    Additive,
    Subtractive,
    Min,
    Max,
    None,
}

impl BlendMode {
    pub const ALL: [BlendMode; 6] = [
        BlendMode::Normal,
        BlendMode::Additive,
        BlendMode::Subtractive,
        BlendMode::Min,
        BlendMode::Max,
        BlendMode::None,
    ];

    pub fn name(self) -> &'static str {
        match self {
            BlendMode::Normal => "normal",
            BlendMode::Additive => "additive",
            BlendMode::Subtractive => "subtractive",
            BlendMode::Min => "min",
            BlendMode::Max => "max",
            BlendMode::None => "none",
        }
    }

    /// GPU blend state for this mode. `None` disables blending.
    pub fn state(self) -> Option<wgpu::BlendState> {
        match self {
            BlendMode::Normal => Some(wgpu::BlendState {
                color: wgpu::BlendComponent {
                    src_factor: wgpu::BlendFactor::SrcAlpha,
                    dst_factor: wgpu::BlendFactor::OneMinusSrcAlpha,
                    operation: wgpu::BlendOperation::Add,
                },
                alpha: one_one(wgpu::BlendOperation::Add),
            }),
            BlendMode::Additive => Some(symmetric(wgpu::BlendOperation::Add)),
            BlendMode::Subtractive => Some(symmetric(wgpu::BlendOperation::Subtract)),
            BlendMode::Min => Some(symmetric(wgpu::BlendOperation::Min)),
            BlendMode::Max => Some(symmetric(wgpu::BlendOperation::Max)),
            BlendMode::None => None,
        }
    }
}

impl fmt::Display for BlendMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for BlendMode {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self> {
        BlendMode::ALL
            .into_iter()
            .find(|m| m.name() == s)
            .ok_or_else(|| ModelError::UnknownBlendMode(s.to_owned()))
    }
}

/// Resolved blend configuration handed to pipeline creation.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct BlendOptions {
    pub mode: BlendMode,
    pub state: Option<wgpu::BlendState>,
}

impl BlendOptions {
    #[inline]
    pub fn is_enabled(&self) -> bool {
        self.state.is_some()
    }
}

impl From<BlendMode> for BlendOptions {
    fn from(mode: BlendMode) -> Self {
        Self { mode, state: mode.state() }
    }
}

/// Resolves a configured blend name.
///
/// An absent name means `normal`. Any other unrecognized name is an error;
/// it is never silently replaced by the default.
pub fn resolve(name: Option<&str>) -> Result<BlendOptions> {
    let mode = match name {
        None => BlendMode::Normal,
        Some(name) => name.parse()?,
    };
    Ok(mode.into())
}

fn one_one(operation: wgpu::BlendOperation) -> wgpu::BlendComponent {
    wgpu::BlendComponent {
        src_factor: wgpu::BlendFactor::One,
        dst_factor: wgpu::BlendFactor::One,
        operation,
    }
}

fn symmetric(operation: wgpu::BlendOperation) -> wgpu::BlendState {
    wgpu::BlendState {
        color: one_one(operation),
        alpha: one_one(operation),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn absent_name_resolves_to_normal() {
        assert_eq!(resolve(None).unwrap(), resolve(Some("normal")).unwrap());
        assert_eq!(resolve(None).unwrap().mode, BlendMode::Normal);
    }

    #[test]
    fn unknown_name_is_a_config_error() {
        assert_eq!(
            resolve(Some("bogus")).unwrap_err(),
            ModelError::UnknownBlendMode("bogus".into())
        );
    }

    #[test]
    fn names_are_case_sensitive() {
        assert!(resolve(Some("Normal")).is_err());
    }

    #[test]
    fn every_mode_round_trips_through_its_name() {
        for mode in BlendMode::ALL {
            assert_eq!(resolve(Some(mode.name())).unwrap().mode, mode);
        }
    }

    #[test]
    fn none_disables_blending() {
        let opts = resolve(Some("none")).unwrap();
        assert!(!opts.is_enabled());
        assert!(resolve(Some("additive")).unwrap().is_enabled());
    }

    #[test]
    fn subtractive_uses_subtract_operation() {
        let state = BlendMode::Subtractive.state().unwrap();
        assert_eq!(state.color.operation, wgpu::BlendOperation::Subtract);
        assert_eq!(state.color.src_factor, wgpu::BlendFactor::One);
    }

    #[test]
    fn deserializes_from_lowercase_name() {
        let mode: BlendMode = serde_json::from_str("\"max\"").unwrap();
        assert_eq!(mode, BlendMode::Max);
    }
}
