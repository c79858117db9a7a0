//! Doubles shared by unit tests.

use std::cell::{Cell, RefCell};
use std::collections::HashSet;
use std::rc::Rc;

use crate::config::LayerConfig;
use crate::error::{ModelError, Result};
use crate::layer::{EncodedFeature, Layer};
use crate::service::{
    AttributeRegistry, EmptyAtlas, ModelDescriptor, ModelHandle, RenderRequests, RendererService,
    Services, StaticCamera, StaticMap, Texture2DOptions, TextureHandle,
};
use crate::uniform::UniformMap;

/// Renderer that records every call instead of touching a GPU.
#[derive(Default)]
pub struct RecordingRenderer {
    next_id: Cell<u64>,
    fail_textures: Cell<bool>,
    fail_models: Cell<bool>,
    textures: RefCell<Vec<(TextureHandle, Texture2DOptions)>>,
    live_textures: RefCell<HashSet<TextureHandle>>,
    destroyed_textures: RefCell<Vec<TextureHandle>>,
    models: RefCell<Vec<(ModelHandle, ModelDescriptor)>>,
    live_models: RefCell<HashSet<ModelHandle>>,
    destroyed_models: RefCell<Vec<ModelHandle>>,
    draws: RefCell<Vec<(ModelHandle, UniformMap)>>,
}

impl RecordingRenderer {
    fn next(&self) -> u64 {
        let id = self.next_id.get() + 1;
        self.next_id.set(id);
        id
    }

    pub fn fail_textures(&self, fail: bool) {
        self.fail_textures.set(fail);
    }

    pub fn fail_models(&self, fail: bool) {
        self.fail_models.set(fail);
    }

    pub fn created_textures(&self) -> Vec<Texture2DOptions> {
        self.textures.borrow().iter().map(|(_, o)| o.clone()).collect()
    }

    pub fn texture_options(&self, handle: TextureHandle) -> Option<Texture2DOptions> {
        self.textures
            .borrow()
            .iter()
            .find(|(h, _)| *h == handle)
            .map(|(_, o)| o.clone())
    }

    pub fn live_textures(&self) -> usize {
        self.live_textures.borrow().len()
    }

    pub fn destroyed_textures(&self) -> Vec<TextureHandle> {
        self.destroyed_textures.borrow().clone()
    }

    pub fn created_models(&self) -> Vec<ModelDescriptor> {
        self.models.borrow().iter().map(|(_, d)| d.clone()).collect()
    }

    pub fn live_models(&self) -> usize {
        self.live_models.borrow().len()
    }

    pub fn destroyed_models(&self) -> Vec<ModelHandle> {
        self.destroyed_models.borrow().clone()
    }

    pub fn draws(&self) -> Vec<(ModelHandle, UniformMap)> {
        self.draws.borrow().clone()
    }
}

impl RendererService for RecordingRenderer {
    fn create_texture_2d(&self, options: &Texture2DOptions) -> Result<TextureHandle> {
        if self.fail_textures.get() {
            return Err(ModelError::resource("texture pool exhausted"));
        }
        let handle = TextureHandle(self.next());
        self.textures.borrow_mut().push((handle, options.clone()));
        self.live_textures.borrow_mut().insert(handle);
        Ok(handle)
    }

    fn destroy_texture(&self, handle: TextureHandle) {
        assert!(
            self.live_textures.borrow_mut().remove(&handle),
            "texture {handle:?} destroyed twice or never created"
        );
        self.destroyed_textures.borrow_mut().push(handle);
    }

    fn create_model(&self, descriptor: &ModelDescriptor) -> Result<ModelHandle> {
        if self.fail_models.get() {
            return Err(ModelError::resource("pipeline creation failed"));
        }
        let handle = ModelHandle(self.next());
        self.models.borrow_mut().push((handle, descriptor.clone()));
        self.live_models.borrow_mut().insert(handle);
        Ok(handle)
    }

    fn destroy_model(&self, handle: ModelHandle) {
        assert!(
            self.live_models.borrow_mut().remove(&handle),
            "model {handle:?} destroyed twice or never created"
        );
        self.destroyed_models.borrow_mut().push(handle);
    }

    fn draw(&self, model: ModelHandle, uniforms: &UniformMap) -> Result<()> {
        if !self.live_models.borrow().contains(&model) {
            return Err(ModelError::contract(format!("draw of dead model {model:?}")));
        }
        self.draws.borrow_mut().push((model, uniforms.clone()));
        Ok(())
    }
}

/// Full service set backed by `renderer`.
pub fn services(renderer: Rc<RecordingRenderer>) -> Services {
    Services::new()
        .with_camera(Rc::new(StaticCamera::default()))
        .with_map(Rc::new(StaticMap::default()))
        .with_style_attributes(Rc::new(AttributeRegistry::new()))
        .with_icons(Rc::new(EmptyAtlas))
        .with_fonts(Rc::new(EmptyAtlas))
        .with_renderer(renderer)
        .with_layers(Rc::new(RenderRequests::default()))
}

/// Layer with `n` white points along the x axis that counts clock starts.
pub struct TestLayer {
    pub config: LayerConfig,
    pub features: Vec<EncodedFeature>,
    pub data_version: u64,
    pub services: Services,
    pub animate_starts: u32,
}

impl TestLayer {
    pub fn new(n: usize) -> Self {
        Self::with_services(n, Services::new())
    }

    pub fn with_services(n: usize, services: Services) -> Self {
        Self {
            config: LayerConfig::default(),
            features: points(n),
            data_version: 1,
            services,
            animate_starts: 0,
        }
    }

    pub fn set_data(&mut self, features: Vec<EncodedFeature>) {
        self.features = features;
        self.data_version += 1;
    }
}

pub fn points(n: usize) -> Vec<EncodedFeature> {
    (0..n)
        .map(|i| EncodedFeature::point(i as u64, [i as f32, 0.0]))
        .collect()
}

impl Layer for TestLayer {
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
        self.animate_starts += 1;
    }

    fn animate_time(&self) -> f32 {
        if self.animate_starts > 0 { 1.0 } else { 0.0 }
    }

    fn services(&self) -> &Services {
        &self.services
    }
}
