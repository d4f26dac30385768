//! Integration tests for image layouts, transforms and codecs.
//!
//! Tests are parameterized with `rstest` over image shapes and formats.

use rstest::rstest;

use redlilium_core::image::{
    BufferFormat, FormatInfo, ImageBufferList, ImageData, ImageSettings, ImageType, PitchFlags,
    Rect,
};
use redlilium_core::ImagingError;

// ============================================================================
// Layout
// ============================================================================

#[rstest]
#[case::single_2d(ImageSettings::new_2d(64, 64, BufferFormat::R8G8B8A8Unorm), 1)]
#[case::full_chain(ImageSettings::new_2d(64, 32, BufferFormat::R8G8B8A8Unorm).with_mip_count(0), 7)]
#[case::array(ImageSettings::new_2d(8, 8, BufferFormat::R16Float).with_array_count(3).with_mip_count(2), 6)]
#[case::cube(ImageSettings::new_cube(16, BufferFormat::Bc3Unorm).with_mip_count(3), 18)]
#[case::volume(ImageSettings::new_3d(8, 8, 8, BufferFormat::R8Unorm).with_mip_count(0), 8 + 4 + 2 + 1)]
#[case::line(ImageSettings::new_1d(256, BufferFormat::R32Float).with_array_count(2), 2)]
fn test_buffer_count_and_size(#[case] settings: ImageSettings, #[case] buffers: usize) {
    let image = ImageData::new(settings).unwrap();

    assert_eq!(image.buffers().len(), buffers);
    assert_eq!(
        image.size_in_bytes(),
        image.settings().size_in_bytes().unwrap()
    );
    assert_eq!(image.buffers().total_len(), image.size_in_bytes());

    // Offsets are contiguous.
    let mut expected = 0;
    for descriptor in image.buffers() {
        assert_eq!(descriptor.offset, expected);
        expected += descriptor.len();
    }
}

#[rstest]
#[case::rgba8(BufferFormat::R8G8B8A8Unorm, 1280, 256_000)]
#[case::bc1(BufferFormat::Bc1Unorm, 640, 32_000)]
#[case::bc7(BufferFormat::Bc7Unorm, 1280, 64_000)]
#[case::packed(BufferFormat::R8G8B8G8Unorm, 640, 128_000)]
#[case::float(BufferFormat::R32G32B32A32Float, 5120, 1_024_000)]
fn test_pitch(#[case] format: BufferFormat, #[case] row: u32, #[case] slice: u32) {
    let pitch = FormatInfo::new(format).pitch(320, 200, PitchFlags::empty());
    assert_eq!(pitch.row_pitch, row);
    assert_eq!(pitch.slice_pitch, slice);
}

#[test]
fn test_cube_sanitize_rounds_array_count() {
    let settings = ImageSettings::new_cube(32, BufferFormat::R8G8B8A8Unorm)
        .with_array_count(7)
        .with_mip_count(0)
        .sanitize();

    assert_eq!(settings.image_type, ImageType::ImageCube);
    assert_eq!(settings.array_count, 12);
    assert_eq!(settings.mip_count, 6);
}

#[test]
fn test_volume_mip_depth_halves() {
    let settings = ImageSettings::new_3d(16, 16, 16, BufferFormat::R8Unorm)
        .with_mip_count(3)
        .sanitize();
    let list = ImageBufferList::create_buffers(&settings);

    assert_eq!(list.len(), 16 + 8 + 4);
    assert_eq!(list.depth_count(2).unwrap(), 4);
    assert!(matches!(
        list.index(2, 4),
        Err(ImagingError::OutOfRange {
            name: "depth_slice",
            ..
        })
    ));
}

// ============================================================================
// Buffer copies
// ============================================================================

#[test]
fn test_copy_negative_destination_shifts_source() {
    let settings = ImageSettings::new_2d(64, 64, BufferFormat::R8G8B8A8Unorm);
    let mut source = ImageData::new(settings).unwrap();
    for (i, px) in source.as_bytes_mut().chunks_exact_mut(4).enumerate() {
        px.copy_from_slice(&(i as u32).to_le_bytes());
    }
    let mut dest = ImageData::new(settings).unwrap();

    let src = source.buffer(0, 0).unwrap();
    let mut dst = dest.buffer_mut(0, 0).unwrap();
    src.copy_to(&mut dst, Some(Rect::new(0, 0, 32, 32)), -10, -10)
        .unwrap();

    // Source (10, 10)..(32, 32) lands at (0, 0)..(22, 22).
    let read = |image: &ImageData, x: usize, y: usize| {
        let offset = (y * 64 + x) * 4;
        u32::from_le_bytes(image.as_bytes()[offset..offset + 4].try_into().unwrap())
    };
    assert_eq!(read(&dest, 0, 0), read(&source, 10, 10));
    assert_eq!(read(&dest, 21, 21), read(&source, 31, 31));
    assert_eq!(read(&dest, 22, 0), 0);
    assert_eq!(read(&dest, 0, 22), 0);
}

#[test]
fn test_copy_entirely_outside_is_noop() {
    let settings = ImageSettings::new_2d(16, 16, BufferFormat::R8Unorm);
    let mut source = ImageData::new(settings).unwrap();
    source.as_bytes_mut().fill(7);
    let mut dest = ImageData::new(settings).unwrap();

    let src = source.buffer(0, 0).unwrap();
    let mut dst = dest.buffer_mut(0, 0).unwrap();
    src.copy_to(&mut dst, None, 16, 0).unwrap();
    src.copy_to(&mut dst, None, -16, -16).unwrap();

    assert!(dest.as_bytes().iter().all(|&b| b == 0));
}

// ============================================================================
// Transforms
// ============================================================================

#[cfg(feature = "codecs")]
mod transforms {
    use super::*;
    use redlilium_core::image::{ImageCrateTransform, ImageDithering, ImageFilter};

    fn solid(settings: ImageSettings, pixel: [u8; 4]) -> ImageData {
        let mut image = ImageData::new(settings).unwrap();
        for px in image.as_bytes_mut().chunks_exact_mut(4) {
            px.copy_from_slice(&pixel);
        }
        image
    }

    #[rstest]
    #[case::point(ImageFilter::Point)]
    #[case::linear(ImageFilter::Linear)]
    #[case::cubic(ImageFilter::Cubic)]
    #[case::fant(ImageFilter::Fant)]
    fn test_generate_mips_keeps_solid_color(#[case] filter: ImageFilter) {
        let transform = ImageCrateTransform::new();
        let mut image = solid(
            ImageSettings::new_2d(32, 32, BufferFormat::R8G8B8A8Unorm),
            [200, 100, 50, 255],
        );

        let count = image.generate_mip_maps(0, filter, &transform).unwrap();

        assert_eq!(count, 6);
        let last = image.buffer(5, 0).unwrap();
        assert_eq!(last.data(), &[200, 100, 50, 255]);
    }

    #[test]
    fn test_resize_then_convert() {
        let transform = ImageCrateTransform::new();
        let mut image = solid(
            ImageSettings::new_2d(16, 16, BufferFormat::R8G8B8A8Unorm).with_array_count(2),
            [255, 0, 0, 255],
        );

        image
            .resize(8, 4, false, ImageFilter::Linear, &transform)
            .unwrap();
        image
            .convert_format(BufferFormat::B8G8R8A8Unorm, ImageDithering::None, &transform)
            .unwrap();

        assert_eq!((image.width(), image.height()), (8, 4));
        assert_eq!(image.array_count(), 2);
        assert_eq!(&image.buffer(0, 1).unwrap().data()[..4], &[0, 0, 255, 255]);
    }

    #[test]
    fn test_convert_compressed_not_supported() {
        let transform = ImageCrateTransform::new();
        let mut image =
            ImageData::new(ImageSettings::new_2d(8, 8, BufferFormat::R8G8B8A8Unorm)).unwrap();
        assert!(matches!(
            image.convert_format(BufferFormat::Bc1Unorm, ImageDithering::None, &transform),
            Err(ImagingError::FormatNotSupported(BufferFormat::Bc1Unorm))
        ));
    }

    #[test]
    fn test_can_convert_sets() {
        let transform = ImageCrateTransform::new();
        assert!(ImageData::can_convert_to_all(
            &transform,
            BufferFormat::R8G8B8A8Unorm,
            &[BufferFormat::R32G32B32A32Float, BufferFormat::B5G6R5Unorm]
        ));
        assert!(ImageData::can_convert_to_any(
            &transform,
            BufferFormat::R8G8B8A8Unorm,
            &[BufferFormat::Bc1Unorm, BufferFormat::R16Float]
        ));
        assert!(!ImageData::can_convert(
            &transform,
            BufferFormat::Bc1Unorm,
            BufferFormat::R8G8B8A8Unorm
        ));
    }
}

// ============================================================================
// Persistence
// ============================================================================

#[cfg(feature = "codecs")]
#[test]
fn test_png_file_round_trip() {
    use redlilium_core::image::ImageFormatCodec;

    let path = std::env::temp_dir().join(format!(
        "redlilium_core_png_round_trip_{}.png",
        std::process::id()
    ));
    let mut image =
        ImageData::new(ImageSettings::new_2d(5, 3, BufferFormat::R8G8B8A8Unorm)).unwrap();
    for (i, byte) in image.as_bytes_mut().iter_mut().enumerate() {
        *byte = i as u8;
    }

    image.save_to_file(&path, &ImageFormatCodec::png()).unwrap();
    let loaded = ImageData::from_file(&path, &ImageFormatCodec::png()).unwrap();
    let _ = std::fs::remove_file(&path);

    assert_eq!(loaded.settings(), image.settings());
    assert_eq!(loaded.as_bytes(), image.as_bytes());
}

#[cfg(feature = "codecs")]
#[test]
fn test_wrong_codec_not_readable() {
    use redlilium_core::image::ImageFormatCodec;

    let image = ImageData::new(ImageSettings::new_2d(4, 4, BufferFormat::R8G8B8A8Unorm)).unwrap();
    let mut bytes = Vec::new();
    image.save(&mut bytes, &ImageFormatCodec::bmp()).unwrap();

    let mut reader = bytes.as_slice();
    assert!(matches!(
        ImageData::from_reader(&mut reader, bytes.len(), &ImageFormatCodec::png()),
        Err(ImagingError::NotReadable { .. })
    ));
}
