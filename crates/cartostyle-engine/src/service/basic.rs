//! Minimal collaborator implementations for hosts without a full map stack.

use std::cell::Cell;

use super::{CameraService, FontService, IconService, LayerService, MapService, TextureHandle};

const IDENTITY: [[f32; 4]; 4] = [
    [1.0, 0.0, 0.0, 0.0],
    [0.0, 1.0, 0.0, 0.0],
    [0.0, 0.0, 1.0, 0.0],
    [0.0, 0.0, 0.0, 1.0],
];

/// Camera with a fixed view-projection matrix.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct StaticCamera {
    pub view_projection: [[f32; 4]; 4],
}

impl Default for StaticCamera {
    fn default() -> Self {
        Self { view_projection: IDENTITY }
    }
}

impl CameraService for StaticCamera {
    fn view_projection(&self) -> [[f32; 4]; 4] {
        self.view_projection
    }
}

/// Map with a fixed viewport.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct StaticMap {
    pub viewport: [f32; 2],
}

impl Default for StaticMap {
    fn default() -> Self {
        Self { viewport: [512.0, 512.0] }
    }
}

impl MapService for StaticMap {
    fn viewport(&self) -> [f32; 2] {
        self.viewport
    }
}

/// Icon and font provider with nothing rasterized.
#[derive(Debug, Copy, Clone, Default)]
pub struct EmptyAtlas;

impl IconService for EmptyAtlas {
    fn atlas(&self) -> Option<TextureHandle> {
        None
    }
}

impl FontService for EmptyAtlas {
    fn glyph_atlas(&self) -> Option<TextureHandle> {
        None
    }
}

/// Layer service that only counts render requests.
#[derive(Debug, Default)]
pub struct RenderRequests {
    count: Cell<u64>,
}

impl RenderRequests {
    pub fn count(&self) -> u64 {
        self.count.get()
    }
}

impl LayerService for RenderRequests {
    fn request_render(&self) {
        self.count.set(self.count.get() + 1);
    }
}
