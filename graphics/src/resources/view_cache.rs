//! Per-texture view cache.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;

use crate::device::{GraphicsDevice, TextureHandle};
use crate::error::GraphicsResult;
use crate::types::{ViewDescriptor, ViewKey};

use super::view::TextureView;

/// Cache holding at most one view per set of view parameters.
#[derive(Debug)]
pub struct ViewCache {
    device: Arc<dyn GraphicsDevice>,
    views: Mutex<HashMap<ViewKey, Arc<TextureView>>>,
}

impl ViewCache {
    pub fn new(device: Arc<dyn GraphicsDevice>) -> Self {
        Self {
            device,
            views: Mutex::new(HashMap::new()),
        }
    }

    /// Get the cached view for `descriptor`, creating it on `texture` if needed.
    ///
    /// # Errors
    ///
    /// Returns an error if the device fails to create the view.
    pub fn get_or_create(
        &self,
        texture: TextureHandle,
        descriptor: &ViewDescriptor,
    ) -> GraphicsResult<Arc<TextureView>> {
        let key = descriptor.key();
        let mut views = self.views.lock();
        if let Some(view) = views.get(&key) {
            return Ok(Arc::clone(view));
        }

        let handle = self.device.create_view(texture, descriptor)?;
        let view = Arc::new(TextureView::new(*descriptor, handle));
        views.insert(key, Arc::clone(&view));
        log::debug!(
            "ViewCache: created {:?} view ({:?}), {} cached",
            descriptor.kind,
            descriptor.format,
            views.len()
        );
        Ok(view)
    }

    /// Get the cached view for `descriptor`, if any.
    pub fn get(&self, descriptor: &ViewDescriptor) -> Option<Arc<TextureView>> {
        self.views.lock().get(&descriptor.key()).cloned()
    }

    /// Release the native handle of every cached view, keeping the views.
    pub fn release_resources(&self) {
        for view in self.views.lock().values() {
            if let Some(handle) = view.take_handle() {
                self.device.destroy_view(handle);
            }
        }
    }

    /// Recreate the native handle of every cached view on `texture`.
    ///
    /// # Errors
    ///
    /// Returns the first device error. Views created before the failure keep
    /// their new handles.
    pub fn initialize_resources(&self, texture: TextureHandle) -> GraphicsResult<()> {
        for view in self.views.lock().values() {
            if let Some(old) = view.take_handle() {
                self.device.destroy_view(old);
            }
            let handle = self.device.create_view(texture, view.descriptor())?;
            view.set_handle(handle);
        }
        Ok(())
    }

    /// Destroy every cached view and empty the cache.
    pub fn clear(&self) {
        let views: Vec<_> = self.views.lock().drain().map(|(_, view)| view).collect();
        if !views.is_empty() {
            log::debug!("ViewCache: clearing {} views", views.len());
        }
        for view in views {
            if let Some(handle) = view.take_handle() {
                self.device.destroy_view(handle);
            }
        }
    }

    /// Number of cached views.
    pub fn len(&self) -> usize {
        self.views.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.views.lock().is_empty()
    }
}

impl Drop for ViewCache {
    fn drop(&mut self) {
        self.clear();
    }
}

#[cfg(all(test, feature = "dummy"))]
mod tests {
    use super::*;
    use crate::backend::DummyDevice;
    use crate::device::TextureDescriptor;
    use crate::types::{TextureSettings, ViewKind};
    use redlilium_core::image::BufferFormat;

    fn setup() -> (Arc<DummyDevice>, TextureHandle) {
        let device = Arc::new(DummyDevice::new());
        let texture = device
            .create_texture(
                &TextureDescriptor::new(
                    TextureSettings::new_2d(8, 8, BufferFormat::R8G8B8A8Unorm).with_mip_count(4),
                ),
                None,
            )
            .unwrap();
        (device, texture)
    }

    #[test]
    fn test_same_key_same_view() {
        let (device, texture) = setup();
        let cache = ViewCache::new(device.clone());
        let descriptor =
            ViewDescriptor::new(ViewKind::ShaderResource, BufferFormat::R8G8B8A8Unorm).with_mips(0, 4);

        let first = cache.get_or_create(texture, &descriptor).unwrap();
        let second = cache.get_or_create(texture, &descriptor).unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(device.view_count(), 1);

        let other = cache
            .get_or_create(texture, &descriptor.with_mips(1, 3))
            .unwrap();
        assert!(!Arc::ptr_eq(&first, &other));
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn test_release_and_initialize_keep_identity() {
        let (device, texture) = setup();
        let cache = ViewCache::new(device.clone());
        let descriptor = ViewDescriptor::new(ViewKind::ShaderResource, BufferFormat::R8G8B8A8Unorm);
        let view = cache.get_or_create(texture, &descriptor).unwrap();

        cache.release_resources();
        assert!(view.handle().is_none());
        assert_eq!(device.view_count(), 0);

        cache.initialize_resources(texture).unwrap();
        assert!(view.handle().is_some());
        assert!(Arc::ptr_eq(&view, &cache.get(&descriptor).unwrap()));
        assert_eq!(device.view_count(), 1);
    }

    #[test]
    fn test_drop_destroys_views() {
        let (device, texture) = setup();
        {
            let cache = ViewCache::new(device.clone());
            let descriptor =
                ViewDescriptor::new(ViewKind::ShaderResource, BufferFormat::R8G8B8A8Unorm);
            cache.get_or_create(texture, &descriptor).unwrap();
            assert_eq!(device.view_count(), 1);
        }
        assert_eq!(device.view_count(), 0);
    }
}
