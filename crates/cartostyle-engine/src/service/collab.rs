use super::TextureHandle;

/// Camera state needed to place features on screen.
pub trait CameraService {
    /// Column-major world-to-clip matrix for the current frame.
    fn view_projection(&self) -> [[f32; 4]; 4];
}

/// Map state owned by the host map.
pub trait MapService {
    /// Viewport size in physical pixels.
    fn viewport(&self) -> [f32; 2];
}

/// Icon atlas provider.
pub trait IconService {
    /// Atlas texture, if any icons have been rasterized.
    fn atlas(&self) -> Option<TextureHandle>;
}

/// Glyph atlas provider.
pub trait FontService {
    fn glyph_atlas(&self) -> Option<TextureHandle>;
}

/// Orchestrates layers; models use it to ask for another frame.
pub trait LayerService {
    fn request_render(&self);
}
