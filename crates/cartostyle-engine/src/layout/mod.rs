//! Texture layout for per-feature style data.
//!
//! Style values that do not fit into vertex attributes are written one texel
//! per feature into a 2D texture. Shaders fetch them back by UV, so the
//! layout constants here must match the texture dimensions exactly.
//!
//! Convention:
//! - texels are filled row-major, feature `i` lives at `(i % w, i / w)`
//! - UVs address texel centers (`start + i * step`)

mod data_layout;

pub use data_layout::{compute_layout, DataLayout, LayoutConfig, DEFAULT_MAX_WIDTH};
