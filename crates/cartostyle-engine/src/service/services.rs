use std::rc::Rc;

use crate::error::{ModelError, Result};

use super::{
    CameraService, FontService, IconService, LayerService, MapService, RendererService,
    StyleAttributeService,
};

/// Capability set a layer offers to its models.
///
/// Every field is optional here; [`Services::bind`] turns the set into
/// [`BoundServices`] and reports the first missing one.
#[derive(Clone, Default)]
pub struct Services {
    pub camera: Option<Rc<dyn CameraService>>,
    pub map: Option<Rc<dyn MapService>>,
    pub style_attributes: Option<Rc<dyn StyleAttributeService>>,
    pub icons: Option<Rc<dyn IconService>>,
    pub fonts: Option<Rc<dyn FontService>>,
    pub renderer: Option<Rc<dyn RendererService>>,
    pub layers: Option<Rc<dyn LayerService>>,
}

impl Services {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_camera(mut self, camera: Rc<dyn CameraService>) -> Self {
        self.camera = Some(camera);
        self
    }

    pub fn with_map(mut self, map: Rc<dyn MapService>) -> Self {
        self.map = Some(map);
        self
    }

    pub fn with_style_attributes(mut self, attrs: Rc<dyn StyleAttributeService>) -> Self {
        self.style_attributes = Some(attrs);
        self
    }

    pub fn with_icons(mut self, icons: Rc<dyn IconService>) -> Self {
        self.icons = Some(icons);
        self
    }

    pub fn with_fonts(mut self, fonts: Rc<dyn FontService>) -> Self {
        self.fonts = Some(fonts);
        self
    }

    pub fn with_renderer(mut self, renderer: Rc<dyn RendererService>) -> Self {
        self.renderer = Some(renderer);
        self
    }

    pub fn with_layers(mut self, layers: Rc<dyn LayerService>) -> Self {
        self.layers = Some(layers);
        self
    }

    /// Resolves every required service, failing on the first absent one.
    pub fn bind(&self) -> Result<BoundServices> {
        Ok(BoundServices {
            camera: require(&self.camera, "camera")?,
            map: require(&self.map, "map")?,
            style_attributes: require(&self.style_attributes, "style attributes")?,
            icons: require(&self.icons, "icons")?,
            fonts: require(&self.fonts, "fonts")?,
            renderer: require(&self.renderer, "renderer")?,
            layers: require(&self.layers, "layers")?,
        })
    }
}

fn require<T: ?Sized>(slot: &Option<Rc<T>>, name: &'static str) -> Result<Rc<T>> {
    slot.clone().ok_or(ModelError::MissingService(name))
}

/// Services held by a model for its whole lifetime.
#[derive(Clone)]
pub struct BoundServices {
    pub camera: Rc<dyn CameraService>,
    pub map: Rc<dyn MapService>,
    pub style_attributes: Rc<dyn StyleAttributeService>,
    pub icons: Rc<dyn IconService>,
    pub fonts: Rc<dyn FontService>,
    pub renderer: Rc<dyn RendererService>,
    pub layers: Rc<dyn LayerService>,
}
