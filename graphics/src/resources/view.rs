//! Texture views.

use parking_lot::Mutex;

use crate::device::ViewHandle;
use crate::types::{ViewDescriptor, ViewKey, ViewKind};
use redlilium_core::image::BufferFormat;

/// A view of a texture: the native view handle plus the parameters used to
/// create it.
///
/// Views are owned by the texture's [`ViewCache`](super::ViewCache). The
/// native handle is released and recreated when the texture is reinitialized,
/// while the view object itself keeps its identity.
#[derive(Debug)]
pub struct TextureView {
    descriptor: ViewDescriptor,
    handle: Mutex<Option<ViewHandle>>,
}

impl TextureView {
    pub(crate) fn new(descriptor: ViewDescriptor, handle: ViewHandle) -> Self {
        Self {
            descriptor,
            handle: Mutex::new(Some(handle)),
        }
    }

    /// Get the view parameters.
    pub fn descriptor(&self) -> &ViewDescriptor {
        &self.descriptor
    }

    pub fn kind(&self) -> ViewKind {
        self.descriptor.kind
    }

    pub fn format(&self) -> BufferFormat {
        self.descriptor.format
    }

    /// Get the cache key of the view.
    pub fn key(&self) -> ViewKey {
        self.descriptor.key()
    }

    /// Get the native view handle, or `None` while the view is released.
    pub fn handle(&self) -> Option<ViewHandle> {
        *self.handle.lock()
    }

    pub(crate) fn take_handle(&self) -> Option<ViewHandle> {
        self.handle.lock().take()
    }

    pub(crate) fn set_handle(&self, handle: ViewHandle) {
        *self.handle.lock() = Some(handle);
    }
}

static_assertions::assert_impl_all!(TextureView: Send, Sync);
