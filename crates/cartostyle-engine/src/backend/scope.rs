use crate::error::{ModelError, Result};

/// Captures validation and out-of-memory errors raised while creating GPU
/// resources, instead of leaving them to the device's uncaptured handler.
///
/// [`check`](Self::check) must be called before the scope is dropped; a
/// scope dropped unchecked still pops, and only logs what it caught.
pub(crate) struct ErrorScope<'d> {
    device: &'d wgpu::Device,
    oom: Option<wgpu::ErrorScopeGuard>,
    validation: Option<wgpu::ErrorScopeGuard>,
    label: String,
    checked: bool,
}

impl<'d> ErrorScope<'d> {
    pub(crate) fn push(device: &'d wgpu::Device, label: impl Into<String>) -> Self {
        let oom = device.push_error_scope(wgpu::ErrorFilter::OutOfMemory);
        let validation = device.push_error_scope(wgpu::ErrorFilter::Validation);
        Self {
            device,
            oom: Some(oom),
            validation: Some(validation),
            label: label.into(),
            checked: false,
        }
    }

    /// Pops both scopes. Any captured error becomes a [`ModelError::Resource`].
    pub(crate) fn check(mut self) -> Result<()> {
        self.checked = true;
        match self.pop() {
            Some(err) => {
                log::error!("{}: {err}", self.label);
                Err(ModelError::resource(format!("{}: {err}", self.label)))
            }
            None => Ok(()),
        }
    }

    /// Validation first, it was pushed last.
    fn pop(&mut self) -> Option<wgpu::Error> {
        let validation = self
            .validation
            .take()
            .and_then(|guard| pollster::block_on(guard.pop()));
        let oom = self
            .oom
            .take()
            .and_then(|guard| pollster::block_on(guard.pop()));
        validation.or(oom)
    }
}

impl Drop for ErrorScope<'_> {
    fn drop(&mut self) {
        if self.checked {
            return;
        }
        if let Some(err) = self.pop() {
            log::error!("{}: unchecked GPU error: {err}", self.label);
        }
    }
}
