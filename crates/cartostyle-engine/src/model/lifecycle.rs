use crate::animate;
use crate::blend::{self, BlendOptions};
use crate::config::LayerConfig;
use crate::error::{ModelError, Result};
use crate::layer::Layer;
use crate::layout::DataLayout;
use crate::service::{BoundServices, ModelHandle};
use crate::texture::StyleTextureBank;
use crate::uniform::UniformMap;

use super::{AttributeSet, BuildCtx, DrawCtx, ModelState, ModelVariant, UniformCtx};

/// Layer inputs the current layout and style textures were derived from.
#[derive(Debug, Clone, PartialEq)]
struct DataStamp {
    len: usize,
    version: u64,
    config: LayerConfig,
}

impl DataStamp {
    fn of(layer: &dyn Layer) -> Self {
        Self {
            len: layer.encoded_data_len(),
            version: layer.data_version(),
            config: layer.layer_config().clone(),
        }
    }
}

/// Lifecycle wrapper around a [`ModelVariant`].
///
/// Per frame, the owner calls [`frame`](Self::frame) (or `need_update`,
/// `build_models` and `render` by hand). GPU work is only redone when the
/// variant reports a change; `render` runs every frame.
pub struct LayerModel<V: ModelVariant> {
    variant: V,
    state: ModelState,
    services: BoundServices,
    layout: DataLayout,
    source: DataStamp,
    textures: StyleTextureBank,
    models: Vec<ModelHandle>,
}

impl<V: ModelVariant> LayerModel<V> {
    /// Constructs a model for `layer`, leaving it `Ready`.
    ///
    /// Order: bind services, register attributes, validate blend, arm
    /// animation, compute the initial layout. Any failure aborts
    /// construction; nothing is retried.
    pub fn initialize(layer: &mut dyn Layer, mut variant: V) -> Result<Self> {
        let mut state = ModelState::Constructed;

        let services = layer.services().bind()?;
        state.advance(ModelState::ServicesBound)?;

        variant.register_attributes(services.style_attributes.as_ref())?;
        state.advance(ModelState::AttributesRegistered)?;

        let config = layer.layer_config().clone();
        blend::resolve(config.blend.as_deref())?;
        animate::arm(&config.animate_option, layer);
        state.advance(ModelState::AnimationArmed)?;

        let layout = config.layout.compute(layer.encoded_data_len());
        let source = DataStamp::of(layer);
        state.advance(ModelState::LayoutInitialized)?;

        let textures = StyleTextureBank::new(services.renderer.clone());
        state.advance(ModelState::Ready)?;

        log::debug!(
            "layer model ready: {} features, layout {}x{}",
            layer.encoded_data_len(),
            layout.width_count(),
            layout.height_count()
        );

        Ok(Self {
            variant,
            state,
            services,
            layout,
            source,
            textures,
            models: Vec::new(),
        })
    }

    #[inline]
    pub fn state(&self) -> ModelState {
        self.state
    }

    #[inline]
    pub fn layout(&self) -> &DataLayout {
        &self.layout
    }

    #[inline]
    pub fn models(&self) -> &[ModelHandle] {
        &self.models
    }

    #[inline]
    pub fn textures(&self) -> &StyleTextureBank {
        &self.textures
    }

    #[inline]
    pub fn variant(&self) -> &V {
        &self.variant
    }

    #[inline]
    pub fn services(&self) -> &BoundServices {
        &self.services
    }

    /// Whether the variant wants a rebuild. Always `false` once cleared.
    pub fn need_update(&self, layer: &dyn Layer) -> bool {
        self.state.is_live() && self.variant.need_update(layer)
    }

    /// Blend state for the layer's current config.
    pub fn blend(&self, layer: &dyn Layer) -> Result<BlendOptions> {
        blend::resolve(layer.layer_config().blend.as_deref())
    }

    /// Variant uniforms followed by layout and animation constants.
    ///
    /// Appended, in order:
    /// - `u_data_layout`: `(width_count, height_count, width_step, height_step)`
    /// - `u_data_start`: `(width_start, height_start)`
    /// - `u_animate`: animation parameter vector
    /// - `u_time`: seconds since the animation clock started
    pub fn uniforms(&self, layer: &dyn Layer) -> Result<UniformMap> {
        let ctx = UniformCtx {
            layer,
            services: &self.services,
            layout: &self.layout,
        };
        let mut uniforms = self.variant.uniforms(&ctx)?;

        let l = &self.layout;
        uniforms.insert(
            "u_data_layout",
            [
                l.width_count() as f32,
                l.height_count() as f32,
                l.width_step(),
                l.height_step(),
            ],
        );
        uniforms.insert("u_data_start", [l.width_start(), l.height_start()]);
        uniforms.insert(
            "u_animate",
            animate::to_parameter_vector(&layer.layer_config().animate_option),
        );
        uniforms.insert("u_time", layer.animate_time());
        Ok(uniforms)
    }

    /// Animation uniforms only; empty when animation is disabled.
    pub fn animate_uniforms(&self, layer: &dyn Layer) -> UniformMap {
        animate::animate_uniforms(&layer.layer_config().animate_option, layer.animate_time())
    }

    pub fn attribute(&self, layer: &dyn Layer) -> Result<AttributeSet> {
        self.variant.attribute(layer, &self.layout)
    }

    pub fn default_style(&self) -> UniformMap {
        self.variant.default_style()
    }

    /// First build. Releases any previous models before creating new ones.
    pub fn init_models(&mut self, layer: &dyn Layer) -> Result<&[ModelHandle]> {
        self.rebuild(layer, true)
    }

    /// Rebuild. Releases any previous models before creating new ones.
    pub fn build_models(&mut self, layer: &dyn Layer) -> Result<&[ModelHandle]> {
        self.rebuild(layer, false)
    }

    /// Shared build path. The layout and style textures are refreshed first
    /// whenever the layer's data or config moved on since they were derived.
    fn rebuild(&mut self, layer: &dyn Layer, first: bool) -> Result<&[ModelHandle]> {
        if !self.state.is_live() {
            return Err(ModelError::contract(format!(
                "cannot build models in state {}",
                self.state
            )));
        }

        self.release_models()?;
        if self.source != DataStamp::of(layer) {
            self.update_layout(layer)?;
        }

        let blend = self.blend(layer)?;
        let uniform_size = self.uniforms(layer)?.to_bytes().len() as u64;

        let mut ctx = BuildCtx {
            layer,
            services: &self.services,
            layout: &self.layout,
            textures: &mut self.textures,
            blend,
            uniform_size,
        };
        let models = if first {
            self.variant.init_models(&mut ctx)?
        } else {
            self.variant.build_models(&mut ctx)?
        };

        log::debug!("layer model built {} GPU models", models.len());
        self.models = models;
        self.state.advance(ModelState::Built)?;
        self.services.layers.request_render();
        Ok(&self.models)
    }

    /// Recomputes the layout from the layer's current data and marks every
    /// style texture stale, so textures and UV constants change together.
    pub fn update_layout(&mut self, layer: &dyn Layer) -> Result<()> {
        if !self.state.is_live() {
            return Err(ModelError::contract(format!(
                "cannot update layout in state {}",
                self.state
            )));
        }
        let layout = layer.layer_config().layout.compute(layer.encoded_data_len());
        if !layout.same_dimensions(&self.layout) {
            log::debug!(
                "layout {}x{} -> {}x{}",
                self.layout.width_count(),
                self.layout.height_count(),
                layout.width_count(),
                layout.height_count()
            );
        }
        self.layout = layout;
        self.source = DataStamp::of(layer);
        self.textures.invalidate_all()
    }

    /// Issues draws for the built models. Requires `Built`.
    pub fn render(&mut self, layer: &dyn Layer) -> Result<()> {
        if self.state != ModelState::Built {
            return Err(ModelError::contract(format!(
                "render called in state {}; build models first",
                self.state
            )));
        }
        let uniforms = self.uniforms(layer)?;
        log::trace!("rendering {} models", self.models.len());
        self.variant.render(&DrawCtx {
            renderer: self.services.renderer.as_ref(),
            models: &self.models,
            uniforms: &uniforms,
        })
    }

    /// Per-frame driver: builds on first use, rebuilds when the variant
    /// reports a change, then renders. Returns whether models were (re)built.
    pub fn frame(&mut self, layer: &dyn Layer) -> Result<bool> {
        let rebuilt = match self.state {
            ModelState::Ready => {
                self.init_models(layer)?;
                true
            }
            ModelState::Built if self.variant.need_update(layer) => {
                self.build_models(layer)?;
                true
            }
            _ => false,
        };
        self.render(layer)?;
        Ok(rebuilt)
    }

    /// Releases models and style textures. Safe to call more than once.
    pub fn clear_models(&mut self) -> Result<()> {
        if self.state == ModelState::Cleared {
            return Ok(());
        }
        self.release_models()?;
        self.textures.release_all()?;
        self.state.advance(ModelState::Cleared)
    }

    fn release_models(&mut self) -> Result<()> {
        for model in self.models.drain(..) {
            self.services.renderer.destroy_model(model);
        }
        if self.state == ModelState::Built {
            self.state.advance(ModelState::Ready)?;
        }
        Ok(())
    }
}

impl<V: ModelVariant> Drop for LayerModel<V> {
    fn drop(&mut self) {
        if !self.models.is_empty() {
            log::warn!(
                "layer model dropped without clear_models; releasing {} models",
                self.models.len()
            );
            for model in self.models.drain(..) {
                self.services.renderer.destroy_model(model);
            }
        }
    }
}
