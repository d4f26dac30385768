//! Image file codecs.
//!
//! An [`ImageCodec`] turns encoded bytes into [`ImageData`] and back.
//! [`RawCodec`] reads and writes the headerless layout produced by
//! [`ImageData::save_raw`]. With the `codecs` feature, [`ImageFormatCodec`]
//! handles PNG, BMP and TGA files through the `image` crate.

use std::io::Write;

use crate::error::{ImagingError, ImagingResult};

use super::data::ImageData;
use super::format::BufferFormat;
use super::settings::ImageSettings;
use super::transform::{ImageDithering, ImageFilter, ImageTransform};

/// Post-processing overrides a codec applies to every image it decodes.
///
/// `None` keeps the decoded value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CodecOptions {
    pub width: Option<u32>,
    pub height: Option<u32>,
    /// Mip levels to generate; `Some(0)` generates the full chain.
    pub mip_count: Option<u32>,
    pub format: Option<BufferFormat>,
    /// Resize by clipping instead of scaling.
    pub clip: bool,
    pub filter: ImageFilter,
    pub dithering: ImageDithering,
}

impl CodecOptions {
    /// Returns true if no override is set.
    pub fn is_identity(&self) -> bool {
        self.width.is_none()
            && self.height.is_none()
            && self.mip_count.is_none()
            && self.format.is_none()
    }

    /// Apply the overrides to `image`: resize, then convert, then build mips.
    ///
    /// # Errors
    ///
    /// Returns an error from the failing transform step.
    pub fn apply(&self, image: &mut ImageData, transform: &dyn ImageTransform) -> ImagingResult<()> {
        if self.is_identity() {
            return Ok(());
        }

        let width = self.width.unwrap_or(image.width());
        let height = self.height.unwrap_or(image.height());
        if width != image.width() || height != image.height() {
            image.resize(width, height, self.clip, self.filter, transform)?;
        }

        if let Some(format) = self.format {
            image.convert_format(format, self.dithering, transform)?;
        }

        if let Some(mip_count) = self.mip_count {
            image.generate_mip_maps(mip_count, self.filter, transform)?;
        }

        Ok(())
    }
}

/// Reads and writes one encoded image format.
pub trait ImageCodec: Send + Sync + std::fmt::Debug {
    /// Short name used in diagnostics.
    fn name(&self) -> &str;

    /// Returns true if `data` looks like something this codec can decode.
    fn is_readable(&self, data: &[u8]) -> bool;

    /// Decode `data` into a new image.
    ///
    /// # Errors
    ///
    /// Returns an error if the data is malformed or uses an unsupported layout.
    fn decode(&self, data: &[u8]) -> ImagingResult<ImageData>;

    /// Encode `image` into `writer`.
    ///
    /// # Errors
    ///
    /// Returns an error if the image format cannot be encoded or writing fails.
    fn encode(&self, image: &ImageData, writer: &mut dyn Write) -> ImagingResult<()>;

    /// Get the decode overrides of this codec.
    fn options(&self) -> CodecOptions {
        CodecOptions::default()
    }

    /// Hook run on every freshly decoded image. Applies [`options`](Self::options)
    /// by default.
    ///
    /// # Errors
    ///
    /// Returns an error if post-processing fails; the image is then dropped.
    fn post_process(&self, image: &mut ImageData) -> ImagingResult<()> {
        apply_default_options(&self.options(), image)
    }
}

#[cfg(feature = "codecs")]
fn apply_default_options(options: &CodecOptions, image: &mut ImageData) -> ImagingResult<()> {
    options.apply(image, &super::transform::ImageCrateTransform::new())
}

#[cfg(not(feature = "codecs"))]
fn apply_default_options(options: &CodecOptions, _image: &mut ImageData) -> ImagingResult<()> {
    if options.is_identity() {
        Ok(())
    } else {
        Err(ImagingError::InvalidArgument(
            "decode overrides need the `codecs` feature or a codec-specific post_process"
                .to_string(),
        ))
    }
}

/// Codec for headerless image dumps with known settings.
#[derive(Debug, Clone, Copy)]
pub struct RawCodec {
    settings: ImageSettings,
    options: CodecOptions,
}

impl RawCodec {
    pub fn new(settings: ImageSettings) -> Self {
        Self {
            settings: settings.sanitize(),
            options: CodecOptions::default(),
        }
    }

    /// Set the overrides applied after decoding.
    pub fn with_options(mut self, options: CodecOptions) -> Self {
        self.options = options;
        self
    }

    pub fn settings(&self) -> &ImageSettings {
        &self.settings
    }
}

impl ImageCodec for RawCodec {
    fn name(&self) -> &str {
        "raw"
    }

    fn is_readable(&self, data: &[u8]) -> bool {
        self.settings
            .size_in_bytes()
            .map(|size| data.len() >= size)
            .unwrap_or(false)
    }

    fn decode(&self, data: &[u8]) -> ImagingResult<ImageData> {
        ImageData::from_raw(self.settings, data)
    }

    fn encode(&self, image: &ImageData, writer: &mut dyn Write) -> ImagingResult<()> {
        if image.settings() != &self.settings {
            return Err(ImagingError::InvalidArgument(format!(
                "image settings {:?} do not match the raw codec settings {:?}",
                image.settings(),
                self.settings
            )));
        }
        image.save_raw(writer)
    }

    fn options(&self) -> CodecOptions {
        self.options
    }
}

#[cfg(feature = "codecs")]
pub use self::image_crate::{ImageFileFormat, ImageFormatCodec};

#[cfg(feature = "codecs")]
mod image_crate {
    use std::io::{Cursor, Write};

    use image::{DynamicImage, ImageFormat};

    use crate::error::{ImagingError, ImagingResult};
    use crate::image::data::ImageData;
    use crate::image::format::BufferFormat;
    use crate::image::settings::ImageSettings;

    use super::{CodecOptions, ImageCodec};

    /// File formats handled by [`ImageFormatCodec`].
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub enum ImageFileFormat {
        Png,
        Bmp,
        Tga,
    }

    impl ImageFileFormat {
        /// Guess the format from a file extension, ignoring case.
        pub fn from_extension(extension: &str) -> Option<Self> {
            match extension.to_ascii_lowercase().as_str() {
                "png" => Some(Self::Png),
                "bmp" | "dib" => Some(Self::Bmp),
                "tga" => Some(Self::Tga),
                _ => None,
            }
        }
    }

    impl From<ImageFileFormat> for ImageFormat {
        fn from(format: ImageFileFormat) -> Self {
            match format {
                ImageFileFormat::Png => ImageFormat::Png,
                ImageFileFormat::Bmp => ImageFormat::Bmp,
                ImageFileFormat::Tga => ImageFormat::Tga,
            }
        }
    }

    /// Codec backed by the `image` crate.
    ///
    /// Decoded images are 2D with one mip level. 8-bit sources become
    /// `R8G8B8A8Unorm` (or `R8Unorm` for grey), 16-bit sources become
    /// `R16G16B16A16Unorm` (or `R16Unorm`) and float sources
    /// `R32G32B32A32Float`.
    #[derive(Debug, Clone, Copy)]
    pub struct ImageFormatCodec {
        format: ImageFileFormat,
        options: CodecOptions,
    }

    impl ImageFormatCodec {
        pub fn new(format: ImageFileFormat) -> Self {
            Self {
                format,
                options: CodecOptions::default(),
            }
        }

        pub fn png() -> Self {
            Self::new(ImageFileFormat::Png)
        }

        pub fn bmp() -> Self {
            Self::new(ImageFileFormat::Bmp)
        }

        pub fn tga() -> Self {
            Self::new(ImageFileFormat::Tga)
        }

        /// Set post-processing overrides applied after decoding.
        pub fn with_options(mut self, options: CodecOptions) -> Self {
            self.options = options;
            self
        }

        pub fn format(&self) -> ImageFileFormat {
            self.format
        }
    }

    fn to_image_data(image: DynamicImage) -> ImagingResult<ImageData> {
        let (width, height) = (image.width(), image.height());
        let settings = |format| ImageSettings::new_2d(width, height, format);

        match image {
            DynamicImage::ImageLuma8(buffer) => {
                ImageData::from_vec(settings(BufferFormat::R8Unorm), buffer.into_raw())
            }
            DynamicImage::ImageLuma16(buffer) => ImageData::from_vec(
                settings(BufferFormat::R16Unorm),
                bytemuck::cast_slice(&buffer.into_raw()).to_vec(),
            ),
            image @ (DynamicImage::ImageLumaA16(_)
            | DynamicImage::ImageRgb16(_)
            | DynamicImage::ImageRgba16(_)) => ImageData::from_vec(
                settings(BufferFormat::R16G16B16A16Unorm),
                bytemuck::cast_slice(&image.into_rgba16().into_raw()).to_vec(),
            ),
            image @ (DynamicImage::ImageRgb32F(_) | DynamicImage::ImageRgba32F(_)) => {
                ImageData::from_vec(
                    settings(BufferFormat::R32G32B32A32Float),
                    bytemuck::cast_slice(&image.into_rgba32f().into_raw()).to_vec(),
                )
            }
            image => ImageData::from_vec(
                settings(BufferFormat::R8G8B8A8Unorm),
                image.into_rgba8().into_raw(),
            ),
        }
    }

    fn to_dynamic_image(image: &ImageData) -> ImagingResult<DynamicImage> {
        let buffer = image.buffer(0, 0)?;
        let (width, height) = (buffer.width(), buffer.height());
        let row_bytes = |bpp: u32| (width * bpp) as usize;

        let packed = |bpp: u32| -> Vec<u8> {
            let mut bytes = Vec::with_capacity(row_bytes(bpp) * height as usize);
            for y in 0..height {
                if let Some(row) = buffer.row(y) {
                    bytes.extend_from_slice(&row[..row_bytes(bpp)]);
                }
            }
            bytes
        };

        let invalid = || ImagingError::Codec(format!("pixel data does not match {width}x{height}"));

        let image = match buffer.format() {
            BufferFormat::R8Unorm => image::GrayImage::from_raw(width, height, packed(1))
                .map(DynamicImage::ImageLuma8),
            BufferFormat::R8G8B8A8Unorm | BufferFormat::R8G8B8A8UnormSrgb => {
                image::RgbaImage::from_raw(width, height, packed(4)).map(DynamicImage::ImageRgba8)
            }
            BufferFormat::B8G8R8A8Unorm | BufferFormat::B8G8R8A8UnormSrgb => {
                let mut bytes = packed(4);
                for px in bytes.chunks_exact_mut(4) {
                    px.swap(0, 2);
                }
                image::RgbaImage::from_raw(width, height, bytes).map(DynamicImage::ImageRgba8)
            }
            BufferFormat::R16Unorm => {
                let words: Vec<u16> = packed(2)
                    .chunks_exact(2)
                    .map(bytemuck::pod_read_unaligned)
                    .collect();
                image::ImageBuffer::from_raw(width, height, words).map(DynamicImage::ImageLuma16)
            }
            BufferFormat::R16G16B16A16Unorm => {
                let words: Vec<u16> = packed(8)
                    .chunks_exact(2)
                    .map(bytemuck::pod_read_unaligned)
                    .collect();
                image::ImageBuffer::from_raw(width, height, words).map(DynamicImage::ImageRgba16)
            }
            format => return Err(ImagingError::FormatNotSupported(format)),
        };

        image.ok_or_else(invalid)
    }

    impl ImageCodec for ImageFormatCodec {
        fn name(&self) -> &str {
            match self.format {
                ImageFileFormat::Png => "png",
                ImageFileFormat::Bmp => "bmp",
                ImageFileFormat::Tga => "tga",
            }
        }

        fn is_readable(&self, data: &[u8]) -> bool {
            let format = ImageFormat::from(self.format);
            match image::guess_format(data) {
                Ok(guessed) => guessed == format,
                // TGA has no magic number, so probe its header instead.
                Err(_) => image::io::Reader::with_format(Cursor::new(data), format)
                    .into_dimensions()
                    .is_ok(),
            }
        }

        fn decode(&self, data: &[u8]) -> ImagingResult<ImageData> {
            let image = image::load_from_memory_with_format(data, self.format.into())?;
            log::debug!(
                "ImageFormatCodec: decoded {} image {}x{} ({:?})",
                self.name(),
                image.width(),
                image.height(),
                image.color()
            );
            to_image_data(image)
        }

        fn encode(&self, image: &ImageData, writer: &mut dyn Write) -> ImagingResult<()> {
            let dynamic = to_dynamic_image(image)?;
            let mut bytes = Cursor::new(Vec::new());
            dynamic.write_to(&mut bytes, ImageFormat::from(self.format))?;
            writer.write_all(bytes.get_ref())?;
            Ok(())
        }

        fn options(&self) -> CodecOptions {
            self.options
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_raw_codec_readable() {
        let codec = RawCodec::new(ImageSettings::new_2d(4, 4, BufferFormat::R8G8B8A8Unorm));
        assert_eq!(codec.name(), "raw");
        assert!(codec.is_readable(&[0u8; 64]));
        assert!(!codec.is_readable(&[0u8; 63]));
    }

    #[test]
    fn test_raw_codec_rejects_other_settings() {
        let codec = RawCodec::new(ImageSettings::new_2d(4, 4, BufferFormat::R8Unorm));
        let image = ImageData::new(ImageSettings::new_2d(2, 2, BufferFormat::R8Unorm)).unwrap();
        let mut out = Vec::new();
        assert!(codec.encode(&image, &mut out).is_err());
        assert!(out.is_empty());
    }

    #[test]
    fn test_identity_options() {
        assert!(CodecOptions::default().is_identity());
        let options = CodecOptions {
            clip: true,
            ..Default::default()
        };
        assert!(options.is_identity());
        let options = CodecOptions {
            mip_count: Some(0),
            ..Default::default()
        };
        assert!(!options.is_identity());
    }

    #[cfg(not(feature = "codecs"))]
    #[test]
    fn test_options_need_codecs_feature() {
        let settings = ImageSettings::new_2d(4, 4, BufferFormat::R8Unorm);
        let codec = RawCodec::new(settings).with_options(CodecOptions {
            width: Some(2),
            ..Default::default()
        });
        assert!(ImageData::from_memory(&[0u8; 16], &codec).is_err());
        assert!(ImageData::from_memory(&[0u8; 16], &RawCodec::new(settings)).is_ok());
    }

    #[cfg(feature = "codecs")]
    mod image_crate {
        use super::*;

        fn gradient(width: u32, height: u32) -> ImageData {
            let mut image =
                ImageData::new(ImageSettings::new_2d(width, height, BufferFormat::R8G8B8A8Unorm))
                    .unwrap();
            for (i, px) in image.as_bytes_mut().chunks_exact_mut(4).enumerate() {
                px.copy_from_slice(&[(i * 7) as u8, (i * 3) as u8, 128, 255]);
            }
            image
        }

        #[test]
        fn test_raw_codec_applies_options() {
            let image = gradient(4, 4);
            let mut raw = Vec::new();
            image.save_raw(&mut raw).unwrap();

            let codec = RawCodec::new(*image.settings()).with_options(CodecOptions {
                width: Some(2),
                height: Some(2),
                mip_count: Some(0),
                format: Some(BufferFormat::B8G8R8A8Unorm),
                ..Default::default()
            });
            let decoded = ImageData::from_memory(&raw, &codec).unwrap();
            assert_eq!((decoded.width(), decoded.height()), (2, 2));
            assert_eq!(decoded.format(), BufferFormat::B8G8R8A8Unorm);
            assert_eq!(decoded.mip_count(), 2);
        }

        #[test]
        fn test_png_round_trip() {
            let image = gradient(8, 4);
            let codec = ImageFormatCodec::png();

            let mut encoded = Vec::new();
            image.save(&mut encoded, &codec).unwrap();
            assert!(codec.is_readable(&encoded));
            assert!(!ImageFormatCodec::bmp().is_readable(&encoded));

            let decoded = ImageData::from_memory(&encoded, &codec).unwrap();
            assert_eq!(decoded.format(), BufferFormat::R8G8B8A8Unorm);
            assert_eq!(decoded.as_bytes(), image.as_bytes());
        }

        #[test]
        fn test_bgra_is_swizzled() {
            let mut image =
                ImageData::new(ImageSettings::new_2d(1, 1, BufferFormat::B8G8R8A8Unorm)).unwrap();
            image.as_bytes_mut().copy_from_slice(&[10, 20, 30, 255]);

            let codec = ImageFormatCodec::tga();
            let mut encoded = Vec::new();
            image.save(&mut encoded, &codec).unwrap();

            let decoded = ImageData::from_memory(&encoded, &codec).unwrap();
            assert_eq!(decoded.as_bytes(), &[30, 20, 10, 255]);
        }

        #[test]
        fn test_unsupported_encode_format() {
            let image =
                ImageData::new(ImageSettings::new_2d(4, 4, BufferFormat::Bc1Unorm)).unwrap();
            let mut encoded = Vec::new();
            assert!(matches!(
                image.save(&mut encoded, &ImageFormatCodec::png()),
                Err(ImagingError::FormatNotSupported(BufferFormat::Bc1Unorm))
            ));
        }

        #[test]
        fn test_post_process_options() {
            let mut encoded = Vec::new();
            gradient(16, 16)
                .save(&mut encoded, &ImageFormatCodec::png())
                .unwrap();

            let codec = ImageFormatCodec::png().with_options(CodecOptions {
                width: Some(8),
                height: Some(8),
                mip_count: Some(0),
                format: Some(BufferFormat::R32G32B32A32Float),
                ..Default::default()
            });
            let decoded = ImageData::from_memory(&encoded, &codec).unwrap();

            assert_eq!(decoded.width(), 8);
            assert_eq!(decoded.mip_count(), 4);
            assert_eq!(decoded.format(), BufferFormat::R32G32B32A32Float);
        }

        #[test]
        fn test_from_extension() {
            assert_eq!(ImageFileFormat::from_extension("PNG"), Some(ImageFileFormat::Png));
            assert_eq!(ImageFileFormat::from_extension("dds"), None);
        }
    }
}
