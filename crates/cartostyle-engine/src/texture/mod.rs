//! Style channel textures.
//!
//! Each channel stores one texel per feature, laid out by
//! [`DataLayout`](crate::layout::DataLayout). Textures are created lazily and
//! rebuilt whenever their layout dimensions or source data change.

mod bank;

pub use bank::{StyleChannel, StyleData, StyleTextureBank};
