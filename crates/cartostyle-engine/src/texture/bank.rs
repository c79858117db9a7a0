use std::rc::Rc;

use crate::error::{ModelError, Result};
use crate::layout::DataLayout;
use crate::service::{RendererService, Texture2DOptions, TextureHandle};

/// Style values stored in textures rather than vertex attributes.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum StyleChannel {
    Opacity,
    StrokeOpacity,
    Stroke,
    StrokeWidth,
}

impl StyleChannel {
    pub const ALL: [StyleChannel; 4] = [
        StyleChannel::Opacity,
        StyleChannel::StrokeOpacity,
        StyleChannel::Stroke,
        StyleChannel::StrokeWidth,
    ];

    /// Stroke color is RGBA8; the scalar channels are single `f32`s.
    pub fn format(self) -> wgpu::TextureFormat {
        match self {
            StyleChannel::Stroke => wgpu::TextureFormat::Rgba8Unorm,
            _ => wgpu::TextureFormat::R32Float,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            StyleChannel::Opacity => "cartostyle opacity texture",
            StyleChannel::StrokeOpacity => "cartostyle stroke opacity texture",
            StyleChannel::Stroke => "cartostyle stroke texture",
            StyleChannel::StrokeWidth => "cartostyle stroke width texture",
        }
    }

    fn index(self) -> usize {
        self as usize
    }
}

/// Per-feature values produced by a texture initializer.
#[derive(Debug, Clone, PartialEq)]
pub enum StyleData {
    Scalars(Vec<f32>),
    Colors(Vec<[u8; 4]>),
}

#[derive(Debug, Copy, Clone)]
struct Slot {
    handle: TextureHandle,
    width: u32,
    height: u32,
    stale: bool,
}

impl Slot {
    fn is_current(&self, layout: &DataLayout) -> bool {
        !self.stale && self.width == layout.width_count() && self.height == layout.height_count()
    }
}

/// Owns the style channel textures of one model.
///
/// Handles are never shared with other models. After
/// [`release_all`](Self::release_all) the bank is spent: every further call
/// fails with a contract violation.
pub struct StyleTextureBank {
    renderer: Rc<dyn RendererService>,
    slots: [Option<Slot>; 4],
    released: bool,
}

impl StyleTextureBank {
    pub fn new(renderer: Rc<dyn RendererService>) -> Self {
        Self {
            renderer,
            slots: [None; 4],
            released: false,
        }
    }

    /// Returns the texture for `channel`, creating it if needed.
    ///
    /// `initializer` runs only when a texture is (re)created: on first use,
    /// after [`invalidate`](Self::invalidate), or when `layout` dimensions
    /// differ from the ones the current texture was built for. The superseded
    /// texture is destroyed before the new one is created.
    pub fn ensure_texture<F>(
        &mut self,
        channel: StyleChannel,
        layout: &DataLayout,
        initializer: F,
    ) -> Result<TextureHandle>
    where
        F: FnOnce(&DataLayout) -> StyleData,
    {
        self.check_live("ensure_texture")?;

        if let Some(slot) = self.slots[channel.index()] {
            if slot.is_current(layout) {
                return Ok(slot.handle);
            }
        }

        let data = encode(channel, layout, initializer(layout))?;

        if let Some(old) = self.slots[channel.index()].take() {
            self.renderer.destroy_texture(old.handle);
        }

        let handle = self.renderer.create_texture_2d(&Texture2DOptions {
            label: channel.label(),
            width: layout.width_count(),
            height: layout.height_count(),
            format: channel.format(),
            data,
        })?;

        log::debug!(
            "style texture {:?} created ({}x{})",
            channel,
            layout.width_count(),
            layout.height_count()
        );

        self.slots[channel.index()] = Some(Slot {
            handle,
            width: layout.width_count(),
            height: layout.height_count(),
            stale: false,
        });
        Ok(handle)
    }

    /// Marks `channel` for recreation on the next `ensure_texture`.
    pub fn invalidate(&mut self, channel: StyleChannel) -> Result<()> {
        self.check_live("invalidate")?;
        if let Some(slot) = self.slots[channel.index()].as_mut() {
            slot.stale = true;
        }
        Ok(())
    }

    pub fn invalidate_all(&mut self) -> Result<()> {
        for channel in StyleChannel::ALL {
            self.invalidate(channel)?;
        }
        Ok(())
    }

    /// Destroys every texture. Must be called exactly once.
    pub fn release_all(&mut self) -> Result<()> {
        self.check_live("release_all")?;
        self.destroy_slots();
        self.released = true;
        Ok(())
    }

    /// Current handle for `channel` without creating one.
    pub fn handle(&self, channel: StyleChannel) -> Option<TextureHandle> {
        self.slots[channel.index()].map(|s| s.handle)
    }

    pub fn is_stale(&self, channel: StyleChannel) -> bool {
        self.slots[channel.index()].is_some_and(|s| s.stale)
    }

    /// Number of textures currently alive.
    pub fn live_count(&self) -> usize {
        self.slots.iter().flatten().count()
    }

    #[inline]
    pub fn is_released(&self) -> bool {
        self.released
    }

    fn check_live(&self, op: &str) -> Result<()> {
        if self.released {
            return Err(ModelError::contract(format!(
                "StyleTextureBank::{op} called after release_all"
            )));
        }
        Ok(())
    }

    fn destroy_slots(&mut self) {
        for slot in self.slots.iter_mut() {
            if let Some(slot) = slot.take() {
                self.renderer.destroy_texture(slot.handle);
            }
        }
    }
}

impl Drop for StyleTextureBank {
    fn drop(&mut self) {
        if !self.released && self.live_count() > 0 {
            log::warn!(
                "StyleTextureBank dropped with {} live textures; releasing",
                self.live_count()
            );
            self.destroy_slots();
        }
    }
}

fn encode(channel: StyleChannel, layout: &DataLayout, data: StyleData) -> Result<Vec<u8>> {
    match (channel, data) {
        (StyleChannel::Stroke, StyleData::Colors(colors)) => {
            let texels = layout.pack(&colors)?;
            Ok(bytemuck::cast_slice::<_, u8>(texels.as_slice()).to_vec())
        }
        (StyleChannel::Stroke, StyleData::Scalars(_)) => Err(ModelError::contract(
            "stroke channel expects color data",
        )),
        (_, StyleData::Scalars(values)) => {
            let texels = layout.pack(&values)?;
            Ok(bytemuck::cast_slice::<_, u8>(texels.as_slice()).to_vec())
        }
        (channel, StyleData::Colors(_)) => Err(ModelError::contract(format!(
            "{channel:?} channel expects scalar data"
        ))),
    }
}
