//! wgpu implementation of [`RendererService`](crate::service::RendererService).
//!
//! This module is responsible for:
//! - acquiring an adapter/device/queue without a window
//! - turning texture and model descriptors into wgpu resources
//! - recording queued draws into a caller-provided render target

mod init;
mod renderer;
mod scope;
mod target;

pub use init::HeadlessInit;
pub use renderer::WgpuRenderer;
pub use target::{OffscreenTarget, RenderTarget};
