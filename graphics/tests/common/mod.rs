//! Common utilities for texture integration tests.
//!
//! This module provides a dummy device, an accounting sink and a factory
//! wired together, plus helpers for building test images.

#![allow(dead_code)]

use std::sync::Arc;

use redlilium_core::image::{ImageData, ImageSettings};
use redlilium_graphics::{
    DeviceCapabilities, DummyDevice, FeatureTier, TextureFactory, TextureStats,
};

// ============================================================================
// Test Context
// ============================================================================

/// A dummy device, the statistics of its textures and a factory creating them.
pub struct TestContext {
    pub device: Arc<DummyDevice>,
    pub stats: Arc<TextureStats>,
    pub factory: TextureFactory,
}

impl TestContext {
    /// Create a context on a shader model 5 device.
    pub fn new() -> Self {
        Self::with_device(DummyDevice::new())
    }

    /// Create a context on a device with the standard limits of `tier`.
    pub fn with_tier(tier: FeatureTier) -> Self {
        Self::with_device(DummyDevice::new().with_capabilities(DeviceCapabilities::for_tier(tier)))
    }

    pub fn with_device(device: DummyDevice) -> Self {
        let _ = env_logger::builder().is_test(true).try_init();
        let device = Arc::new(device);
        let stats = Arc::new(TextureStats::new());
        let factory = TextureFactory::with_accounting(device.clone(), stats.clone());
        Self {
            device,
            stats,
            factory,
        }
    }
}

// ============================================================================
// Test Images
// ============================================================================

/// Create an image whose bytes count up modulo 251.
///
/// The prime modulus keeps neighbouring rows, slices and sub-resources from
/// repeating the same bytes.
pub fn gradient_image(settings: ImageSettings) -> ImageData {
    let mut image = ImageData::new(settings).expect("valid image settings");
    for (i, byte) in image.as_bytes_mut().iter_mut().enumerate() {
        *byte = (i % 251) as u8;
    }
    image
}

/// Create a single-row `R8Unorm` image holding `0..width`.
pub fn ramp_image(width: u32) -> ImageData {
    let settings = ImageSettings::new_2d(width, 1, redlilium_core::image::BufferFormat::R8Unorm);
    ImageData::from_vec(settings, (0..width).map(|x| x as u8).collect()).expect("valid ramp")
}
