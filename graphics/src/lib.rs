//! # RedLilium Graphics
//!
//! GPU texture resources for RedLilium, built on top of an abstract graphics device.
//!
//! ## Overview
//!
//! This crate provides:
//! - [`TextureFactory`] - Validates settings and creates textures from settings, images or files
//! - [`Texture`] - A texture with its cached views and open locks
//! - [`GraphicsDevice`] - Trait for native device implementations
//! - [`transfer`] - Uploading images into textures and reading them back
//! - A `dummy` in-memory device for testing
//!
//! ## Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use redlilium_graphics::{DeviceContext, DummyDevice, TextureFactory, TextureSettings};
//! use redlilium_core::image::BufferFormat;
//!
//! let factory = TextureFactory::new(Arc::new(DummyDevice::new()));
//! let settings = TextureSettings::new_2d(256, 256, BufferFormat::R8G8B8A8Unorm);
//! let texture = factory.create("albedo", &settings, None, DeviceContext::Immediate)?;
//! let view = texture.default_shader_view()?;
//! ```

pub mod accounting;
pub mod backend;
pub mod device;
pub mod error;
pub mod factory;
pub mod resources;
pub mod transfer;
pub mod types;

// Re-export main types for convenience
pub use accounting::{NoAccounting, ResourceAccounting, TextureStats};
#[cfg(feature = "dummy")]
pub use backend::DummyDevice;
pub use device::{
    DeviceCapabilities, FeatureTier, FormatSupport, GraphicsDevice, MapMode, MappedSubresource,
    SubresourceCopy, TextureDescriptor, TextureHandle, ViewHandle,
};
pub use error::{GraphicsError, GraphicsResult};
pub use factory::{TextureFactory, TextureLoadOptions};
pub use resources::{CopyRegion, LockCache, LockKey, Texture, TextureLock, TextureView, ViewCache};
pub use transfer::{copy_all_to_texture, copy_to_texture, image_from_subresource, image_from_texture};
pub use types::{
    DeviceContext, LockFlags, Multisampling, TextureBinding, TextureBox, TextureDimensions,
    TextureKind, TextureSettings, TextureUsage, ViewDescriptor, ViewKey, ViewKind,
};

/// Graphics library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Initialize the graphics subsystem.
///
/// This should be called before using any graphics functionality.
pub fn init() {
    log::info!("RedLilium Graphics v{} initialized", VERSION);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }

    #[cfg(feature = "dummy")]
    #[test]
    fn test_dummy_device() {
        let device = DummyDevice::new();
        assert_eq!(device.name(), "Dummy Device");
    }
}
