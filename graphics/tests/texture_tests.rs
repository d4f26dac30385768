//! Texture integration tests against the dummy device.
//!
//! # Test Categories
//!
//! - **Factory Tests**: settings validation and creation rules
//! - **Cache Tests**: view and lock identity
//! - **Copy Tests**: sub-resource copies and clipping
//! - **Transfer Tests**: image upload and readback
//! - **Lifetime Tests**: accounting and forced release on drop

mod common;

use std::sync::Arc;

use rstest::rstest;

use common::{TestContext, gradient_image, ramp_image};
use redlilium_core::image::{BufferFormat, ImageSettings, ImageType};
use redlilium_graphics::{
    CopyRegion, DeviceContext, FeatureTier, GraphicsError, LockFlags, Multisampling,
    TextureBinding, TextureBox, TextureLoadOptions, TextureSettings, TextureUsage,
    copy_all_to_texture, image_from_subresource, image_from_texture,
};

const IMMEDIATE: DeviceContext = DeviceContext::Immediate;

// ============================================================================
// Factory Tests
// ============================================================================

#[rstest]
#[case::uav_on_staging(
    FeatureTier::Sm5,
    TextureSettings::new_2d(64, 64, BufferFormat::R8G8B8A8Unorm)
        .with_usage(TextureUsage::Staging)
        .with_binding(TextureBinding::UNORDERED_ACCESS)
)]
#[case::uav_on_dynamic(
    FeatureTier::Sm5,
    TextureSettings::new_2d(64, 64, BufferFormat::R8G8B8A8Unorm)
        .with_usage(TextureUsage::Dynamic)
        .with_binding(TextureBinding::SHADER_RESOURCE | TextureBinding::UNORDERED_ACCESS)
)]
#[case::uav_below_sm5(
    FeatureTier::Sm41,
    TextureSettings::new_2d(64, 64, BufferFormat::R8G8B8A8Unorm)
        .with_binding(TextureBinding::UNORDERED_ACCESS)
)]
#[case::compressed_unaligned(
    FeatureTier::Sm5,
    TextureSettings::new_2d(30, 32, BufferFormat::Bc1Unorm)
)]
#[case::oversize_sm5(
    FeatureTier::Sm5,
    TextureSettings::new_2d(16385, 16, BufferFormat::R8G8B8A8Unorm)
)]
#[case::oversize_sm4(
    FeatureTier::Sm4,
    TextureSettings::new_2d(8193, 16, BufferFormat::R8G8B8A8Unorm)
)]
#[case::oversize_volume(
    FeatureTier::Sm5,
    TextureSettings::new_3d(16, 16, 2049, BufferFormat::R8Unorm)
)]
#[case::cube_array_sm4(
    FeatureTier::Sm4,
    TextureSettings::new_cube(64, BufferFormat::R8G8B8A8Unorm).with_array_count(12)
)]
#[case::multisampled_mips(
    FeatureTier::Sm5,
    TextureSettings::new_2d(64, 64, BufferFormat::R8G8B8A8Unorm)
        .with_mip_count(2)
        .with_multisampling(Multisampling::new(4, 0))
)]
#[case::unknown_format(
    FeatureTier::Sm5,
    TextureSettings::new_2d(64, 64, BufferFormat::Unknown)
)]
fn test_factory_rejects(#[case] tier: FeatureTier, #[case] settings: TextureSettings) {
    let ctx = TestContext::with_tier(tier);
    assert!(ctx.factory.validate(&settings).is_err());
    assert!(ctx.factory.create("rejected", &settings, None, IMMEDIATE).is_err());
    assert_eq!(ctx.device.texture_count(), 0);
    assert_eq!(ctx.stats.live_count(), 0);
}

#[rstest]
#[case::sm4_limit(FeatureTier::Sm4, 8192)]
#[case::sm5_limit(FeatureTier::Sm5, 16384)]
fn test_factory_accepts_tier_limit(#[case] tier: FeatureTier, #[case] size: u32) {
    let ctx = TestContext::with_tier(tier);
    let settings = TextureSettings::new_2d(size, 4, BufferFormat::R8Unorm);
    assert!(ctx.factory.validate(&settings).is_ok());
}

#[test]
fn test_factory_creation_rules() {
    let ctx = TestContext::new();
    let settings = TextureSettings::new_2d(16, 16, BufferFormat::R8G8B8A8Unorm).with_mip_count(0);

    assert!(matches!(
        ctx.factory.create("deferred", &settings, None, DeviceContext::Deferred(1)),
        Err(GraphicsError::InvalidState(_))
    ));
    assert!(matches!(
        ctx.factory.create("  ", &settings, None, IMMEDIATE),
        Err(GraphicsError::InvalidParameter(_))
    ));
    assert!(ctx
        .factory
        .create(
            "immutable",
            &settings.with_usage(TextureUsage::Immutable),
            None,
            IMMEDIATE
        )
        .is_err());

    let texture = ctx.factory.create("albedo", &settings, None, IMMEDIATE).unwrap();
    assert_eq!(texture.name(), "albedo");
    assert_eq!(texture.mip_count(), 5);
    assert_eq!(texture.views().len(), 1);
}

#[test]
fn test_factory_logo_survives_deferred_request() {
    let ctx = TestContext::new();
    let first = ctx.factory.logo(DeviceContext::Deferred(3)).unwrap();
    let second = ctx.factory.logo(IMMEDIATE).unwrap();
    assert!(Arc::ptr_eq(&first, &second));
    assert_eq!(first.usage(), TextureUsage::Immutable);
    assert_eq!(ctx.device.texture_count(), 1);
}

// ============================================================================
// Cache Tests
// ============================================================================

#[test]
fn test_view_cache_identity() {
    let ctx = TestContext::new();
    let texture = ctx
        .factory
        .create(
            "array",
            &TextureSettings::new_2d(32, 32, BufferFormat::R8G8B8A8Unorm)
                .with_mip_count(0)
                .with_array_count(4)
                .with_binding(TextureBinding::SHADER_RESOURCE | TextureBinding::RENDER_TARGET),
            None,
            IMMEDIATE,
        )
        .unwrap();

    let first = texture
        .shader_view(BufferFormat::R8G8B8A8UnormSrgb, 1, 2, 1, 2)
        .unwrap();
    let second = texture
        .shader_view(BufferFormat::R8G8B8A8UnormSrgb, 1, 2, 1, 2)
        .unwrap();
    assert!(Arc::ptr_eq(&first, &second));

    let other = texture
        .shader_view(BufferFormat::R8G8B8A8UnormSrgb, 0, 2, 1, 2)
        .unwrap();
    assert!(!Arc::ptr_eq(&first, &other));

    let target = texture
        .render_target_view(BufferFormat::Unknown, 0, 0, 1)
        .unwrap();
    assert!(Arc::ptr_eq(
        &target,
        &texture.render_target_view(BufferFormat::Unknown, 0, 0, 1).unwrap()
    ));

    // Default view, two shader views and one render target view.
    assert_eq!(texture.views().len(), 4);
    assert_eq!(ctx.device.view_count(), 4);
}

#[test]
fn test_lock_uniqueness() {
    let ctx = TestContext::new();
    let texture = ctx
        .factory
        .create(
            "dynamic",
            &TextureSettings::new_2d(16, 16, BufferFormat::R8G8B8A8Unorm)
                .with_usage(TextureUsage::Dynamic),
            None,
            IMMEDIATE,
        )
        .unwrap();

    let flags = LockFlags::WRITE | LockFlags::DISCARD;
    let first = texture.lock(flags, 0, 0, IMMEDIATE).unwrap();
    let second = texture.lock(flags, 0, 0, IMMEDIATE).unwrap();
    assert!(Arc::ptr_eq(&first, &second));
    assert_eq!(texture.locks().len(), 1);

    let deferred = texture.lock(flags, 0, 0, DeviceContext::Deferred(2)).unwrap();
    assert!(!Arc::ptr_eq(&first, &deferred));
    assert_eq!(texture.locks().len(), 2);

    first.unlock().unwrap();
    deferred.unlock().unwrap();
    assert!(texture.locks().is_empty());
    assert_eq!(ctx.device.mapped_count(), 0);
}

// ============================================================================
// Copy Tests
// ============================================================================

#[test]
fn test_copy_negative_offset_clips_source() {
    let ctx = TestContext::new();
    let options = TextureLoadOptions::default();
    let source = ctx
        .factory
        .from_image("source", &ramp_image(64), &options, IMMEDIATE)
        .unwrap();
    let dest = ctx
        .factory
        .create(
            "dest",
            &TextureSettings::new_2d(64, 1, BufferFormat::R8Unorm),
            None,
            IMMEDIATE,
        )
        .unwrap();

    let region = CopyRegion::new()
        .with_source_box(TextureBox::new_2d(0, 0, 20, 1))
        .with_dest_offset(-10, 0, 0);
    dest.copy_subresource(&source, &region, IMMEDIATE).unwrap();

    let back = image_from_texture(&dest, IMMEDIATE).unwrap();
    let expected: Vec<u8> = (10..20).chain(std::iter::repeat(0).take(54)).collect();
    assert_eq!(back.as_bytes(), &expected[..]);
}

#[test]
fn test_copy_from_whole_texture() {
    let ctx = TestContext::new();
    let image = gradient_image(
        ImageSettings::new_2d(16, 16, BufferFormat::R8G8B8A8Unorm).with_mip_count(3),
    );
    let source = ctx
        .factory
        .from_image("source", &image, &TextureLoadOptions::default(), IMMEDIATE)
        .unwrap();
    let dest = ctx
        .factory
        .create(
            "dest",
            &TextureSettings::new_2d(16, 16, BufferFormat::R8G8B8A8Unorm).with_mip_count(3),
            None,
            IMMEDIATE,
        )
        .unwrap();

    dest.copy_from(&source, IMMEDIATE).unwrap();
    let back = image_from_texture(&dest, IMMEDIATE).unwrap();
    assert_eq!(back.as_bytes(), image.as_bytes());
}

// ============================================================================
// Transfer Tests
// ============================================================================

#[rstest]
#[case::array_1d(ImageSettings::new_1d(32, BufferFormat::R16G16Float).with_array_count(3))]
#[case::mipped_2d(ImageSettings::new_2d(20, 12, BufferFormat::R8G8B8A8Unorm).with_mip_count(4))]
#[case::cube(ImageSettings::new_cube(8, BufferFormat::B8G8R8A8Unorm).with_mip_count(2))]
#[case::volume(ImageSettings::new_3d(8, 4, 4, BufferFormat::R8Unorm).with_mip_count(3))]
#[case::compressed(ImageSettings::new_2d(16, 8, BufferFormat::Bc1Unorm).with_mip_count(2))]
fn test_transfer_round_trip(
    #[case] settings: ImageSettings,
    #[values(TextureUsage::Default, TextureUsage::Staging)] usage: TextureUsage,
) {
    let ctx = TestContext::new();
    let image = gradient_image(settings);
    let texture = ctx
        .factory
        .create(
            "round_trip",
            &TextureSettings::from_image_settings(&settings).with_usage(usage),
            None,
            IMMEDIATE,
        )
        .unwrap();

    copy_all_to_texture(&image, &texture, IMMEDIATE).unwrap();
    let back = image_from_texture(&texture, IMMEDIATE).unwrap();
    assert_eq!(back.image_type(), image.image_type());
    assert_eq!(back.as_bytes(), image.as_bytes());

    // Readback staging copies are released.
    assert_eq!(ctx.device.texture_count(), 1);
    assert!(texture.locks().is_empty());
}

#[test]
fn test_transfer_dynamic_upload() {
    let ctx = TestContext::new();
    let image = gradient_image(ImageSettings::new_2d(8, 8, BufferFormat::R8G8B8A8Unorm));
    let texture = ctx
        .factory
        .create(
            "dynamic",
            &TextureSettings::new_2d(8, 8, BufferFormat::R8G8B8A8Unorm)
                .with_usage(TextureUsage::Dynamic),
            None,
            IMMEDIATE,
        )
        .unwrap();

    copy_all_to_texture(&image, &texture, IMMEDIATE).unwrap();
    let bytes = ctx
        .device
        .subresource_bytes(texture.handle().unwrap(), 0)
        .unwrap();
    assert_eq!(bytes, image.as_bytes());
}

#[test]
fn test_transfer_single_face() {
    let ctx = TestContext::new();
    let image = gradient_image(ImageSettings::new_cube(4, BufferFormat::R8G8B8A8Unorm));
    let texture = ctx
        .factory
        .from_image("cube", &image, &TextureLoadOptions::default(), IMMEDIATE)
        .unwrap();

    let face = image_from_subresource(&texture, 0, 5, IMMEDIATE).unwrap();
    assert_eq!(face.image_type(), ImageType::Image2D);
    assert_eq!((face.mip_count(), face.array_count()), (1, 1));
    assert_eq!(face.as_bytes(), image.buffer(0, 5).unwrap().data());
}

// ============================================================================
// Lifetime Tests
// ============================================================================

#[test]
fn test_accounting_returns_to_zero() {
    let ctx = TestContext::new();
    {
        let small = ctx
            .factory
            .create(
                "small",
                &TextureSettings::new_2d(4, 4, BufferFormat::R8G8B8A8Unorm),
                None,
                IMMEDIATE,
            )
            .unwrap();
        let _volume = ctx
            .factory
            .create(
                "volume",
                &TextureSettings::new_3d(4, 4, 4, BufferFormat::R8Unorm),
                None,
                IMMEDIATE,
            )
            .unwrap();
        let _copy = small.staging_copy(IMMEDIATE).unwrap();

        assert_eq!(ctx.stats.live_count(), 3);
        assert_eq!(ctx.stats.total_bytes(), 64 + 64 + 64);
    }
    assert_eq!(ctx.stats.live_count(), 0);
    assert_eq!(ctx.stats.total_bytes(), 0);
    assert_eq!(ctx.device.texture_count(), 0);
    assert_eq!(ctx.device.view_count(), 0);
}

#[test]
fn test_drop_force_unlocks() {
    let ctx = TestContext::new();
    let lock = {
        let texture = ctx
            .factory
            .create(
                "staging",
                &TextureSettings::new_2d(4, 4, BufferFormat::R8Unorm)
                    .with_usage(TextureUsage::Staging)
                    .with_binding(TextureBinding::empty()),
                None,
                IMMEDIATE,
            )
            .unwrap();
        let lock = texture.lock(LockFlags::WRITE, 0, 0, IMMEDIATE).unwrap();
        lock.data_mut().unwrap()[0] = 42;
        assert_eq!(ctx.device.mapped_count(), 1);
        lock
    };

    assert!(!lock.is_open());
    assert!(lock.unlock().is_err());
    assert_eq!(ctx.device.mapped_count(), 0);
    assert_eq!(ctx.device.texture_count(), 0);
}
