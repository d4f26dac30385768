//! Image transform collaborator: format conversion, scaling and clipping.
//!
//! [`ImageData`](super::ImageData) drives its conversion, resize and mip
//! generation operations through the [`ImageTransform`] trait. With the
//! `codecs` feature enabled, [`ImageCrateTransform`] provides a default
//! implementation built on the `image` crate.

use crate::error::ImagingResult;

use super::buffer::{ImageBuffer, ImageBufferMut};
use super::format::BufferFormat;

/// Filter used when scaling an image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ImageFilter {
    /// Nearest neighbour.
    #[default]
    Point,
    /// Bilinear.
    Linear,
    /// Bicubic.
    Cubic,
    /// High quality windowed filter.
    Fant,
}

/// Dithering applied when converting to a lower precision format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ImageDithering {
    #[default]
    None,
    /// 4×4 ordered (Bayer) dithering.
    Ordered,
    /// Floyd-Steinberg error diffusion.
    ErrorDiffusion,
}

/// Options for [`ImageTransform::convert`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct ConvertOptions {
    /// Dithering to apply.
    pub dithering: ImageDithering,
    /// Treat the source as sRGB encoded.
    pub source_srgb: bool,
    /// Encode the destination as sRGB.
    pub dest_srgb: bool,
}

/// A bitmap transform service.
///
/// Implementations read from a source buffer and write into a caller provided
/// destination buffer, honouring the destination's row and slice pitch.
pub trait ImageTransform: Send + Sync + std::fmt::Debug {
    /// Returns true if pixels in `source` can be converted to `dest`.
    fn can_convert(&self, source: BufferFormat, dest: BufferFormat) -> bool;

    /// Returns true if both formats share a memory encoding, so that
    /// converting between them would not change any byte.
    fn same_encoding(&self, a: BufferFormat, b: BufferFormat) -> bool;

    /// Returns true if the transform can read and write `format`.
    fn is_supported(&self, format: BufferFormat) -> bool {
        self.can_convert(format, format)
    }

    /// Convert `source` into the format of `dest`. Both buffers have the same size.
    ///
    /// # Errors
    ///
    /// Returns an error if either format is not supported or the sizes differ.
    fn convert(
        &self,
        source: &ImageBuffer<'_>,
        dest: &mut ImageBufferMut<'_>,
        options: ConvertOptions,
    ) -> ImagingResult<()>;

    /// Scale `source` to the size of `dest`. Both buffers have the same format.
    ///
    /// # Errors
    ///
    /// Returns an error if the format is not supported or the formats differ.
    fn scale(
        &self,
        source: &ImageBuffer<'_>,
        dest: &mut ImageBufferMut<'_>,
        filter: ImageFilter,
    ) -> ImagingResult<()>;

    /// Copy the top-left part of `source` into `dest`, zero filling the rest.
    ///
    /// # Errors
    ///
    /// Returns an error if the formats differ.
    fn clip(&self, source: &ImageBuffer<'_>, dest: &mut ImageBufferMut<'_>) -> ImagingResult<()> {
        dest.fill(0);
        source.copy_to(dest, None, 0, 0)
    }
}

#[cfg(feature = "codecs")]
pub use self::image_crate::ImageCrateTransform;

#[cfg(feature = "codecs")]
mod image_crate {
    use image::imageops::{self, FilterType};
    use image::{Rgba, Rgba32FImage};

    use crate::error::{ImagingError, ImagingResult};
    use crate::image::buffer::{ImageBuffer, ImageBufferMut};
    use crate::image::format::BufferFormat;
    use crate::image::pixel::{linear_to_srgb, srgb_to_linear, PixelEncoding};

    use super::{ConvertOptions, ImageDithering, ImageFilter, ImageTransform};

    const BAYER_4X4: [[f32; 4]; 4] = [
        [0.0, 8.0, 2.0, 10.0],
        [12.0, 4.0, 14.0, 6.0],
        [3.0, 11.0, 1.0, 9.0],
        [15.0, 7.0, 13.0, 5.0],
    ];

    /// Default transform backed by the `image` crate.
    ///
    /// Pixels are widened to 32-bit float RGBA, processed, then narrowed to
    /// the destination format. Scaling uses `image::imageops::resize`.
    #[derive(Debug, Clone, Copy, Default)]
    pub struct ImageCrateTransform;

    impl ImageCrateTransform {
        pub fn new() -> Self {
            Self
        }
    }

    impl From<ImageFilter> for FilterType {
        fn from(filter: ImageFilter) -> Self {
            match filter {
                ImageFilter::Point => FilterType::Nearest,
                ImageFilter::Linear => FilterType::Triangle,
                ImageFilter::Cubic => FilterType::CatmullRom,
                ImageFilter::Fant => FilterType::Lanczos3,
            }
        }
    }

    fn encoding(format: BufferFormat) -> ImagingResult<PixelEncoding> {
        PixelEncoding::of(format).ok_or(ImagingError::FormatNotSupported(format))
    }

    fn decode(buffer: &ImageBuffer<'_>, encoding: PixelEncoding) -> Vec<[f32; 4]> {
        let width = buffer.width() as usize;
        let bpp = encoding.bytes();
        let mut pixels = Vec::with_capacity(width * buffer.height() as usize);

        for y in 0..buffer.height() {
            let Some(row) = buffer.row(y) else { break };
            pixels.extend(row.chunks_exact(bpp).take(width).map(|px| encoding.read(px)));
        }

        pixels
    }

    fn encode(pixels: &[[f32; 4]], dest: &mut ImageBufferMut<'_>, encoding: PixelEncoding) {
        let width = dest.width() as usize;
        let height = dest.height() as usize;
        let pitch = dest.pitch().row_pitch as usize;
        let bpp = encoding.bytes();
        let data = dest.data_mut();

        for y in 0..height {
            let row = &mut data[y * pitch..(y + 1) * pitch];
            for (x, px) in row.chunks_exact_mut(bpp).take(width).enumerate() {
                if let Some(value) = pixels.get(y * width + x) {
                    encoding.write(px, *value);
                }
            }
        }
    }

    fn quantize(value: f32, levels: f32) -> f32 {
        (value.clamp(0.0, 1.0) * levels).round() / levels
    }

    fn dither(pixels: &mut [[f32; 4]], width: usize, bits: [u32; 4], mode: ImageDithering) {
        let levels = bits.map(|b| ((1u32 << b) - 1) as f32);
        let height = if width > 0 { pixels.len() / width } else { 0 };

        match mode {
            ImageDithering::None => {}
            ImageDithering::Ordered => {
                for (i, px) in pixels.iter_mut().enumerate() {
                    let threshold = BAYER_4X4[(i / width.max(1)) % 4][(i % width.max(1)) % 4];
                    let offset = (threshold + 0.5) / 16.0 - 0.5;
                    for c in 0..4 {
                        px[c] = quantize(px[c] + offset / levels[c], levels[c]);
                    }
                }
            }
            ImageDithering::ErrorDiffusion => {
                for y in 0..height {
                    for x in 0..width {
                        let i = y * width + x;
                        let mut error = [0.0f32; 4];
                        for c in 0..4 {
                            let old = pixels[i][c];
                            let new = quantize(old, levels[c]);
                            pixels[i][c] = new;
                            error[c] = old - new;
                        }

                        let mut spread = |dx: isize, dy: usize, weight: f32| {
                            let nx = x as isize + dx;
                            let ny = y + dy;
                            if nx < 0 || nx as usize >= width || ny >= height {
                                return;
                            }
                            let target = &mut pixels[ny * width + nx as usize];
                            for c in 0..4 {
                                target[c] += error[c] * weight;
                            }
                        };
                        spread(1, 0, 7.0 / 16.0);
                        spread(-1, 1, 3.0 / 16.0);
                        spread(0, 1, 5.0 / 16.0);
                        spread(1, 1, 1.0 / 16.0);
                    }
                }
            }
        }
    }

    impl ImageTransform for ImageCrateTransform {
        fn can_convert(&self, source: BufferFormat, dest: BufferFormat) -> bool {
            PixelEncoding::of(source).is_some() && PixelEncoding::of(dest).is_some()
        }

        fn same_encoding(&self, a: BufferFormat, b: BufferFormat) -> bool {
            match (PixelEncoding::of(a), PixelEncoding::of(b)) {
                (Some(a), Some(b)) => a == b,
                _ => false,
            }
        }

        fn convert(
            &self,
            source: &ImageBuffer<'_>,
            dest: &mut ImageBufferMut<'_>,
            options: ConvertOptions,
        ) -> ImagingResult<()> {
            let src_encoding = encoding(source.format())?;
            let dst_encoding = encoding(dest.format())?;

            if source.width() != dest.width() || source.height() != dest.height() {
                return Err(ImagingError::InvalidArgument(format!(
                    "cannot convert a {}x{} buffer into a {}x{} buffer",
                    source.width(),
                    source.height(),
                    dest.width(),
                    dest.height()
                )));
            }

            let mut pixels = decode(source, src_encoding);

            if options.source_srgb != options.dest_srgb {
                let curve: fn(f32) -> f32 = if options.source_srgb {
                    srgb_to_linear
                } else {
                    linear_to_srgb
                };
                for px in &mut pixels {
                    for c in &mut px[..3] {
                        *c = curve(c.clamp(0.0, 1.0));
                    }
                }
            }

            if let Some(bits) = dst_encoding.quantization() {
                let source_is_finer = src_encoding.is_float()
                    || src_encoding
                        .quantization()
                        .map(|src_bits| src_bits.iter().zip(bits.iter()).any(|(s, d)| s > d))
                        .unwrap_or(true);
                if source_is_finer {
                    dither(&mut pixels, dest.width() as usize, bits, options.dithering);
                }
            }

            encode(&pixels, dest, dst_encoding);
            Ok(())
        }

        fn scale(
            &self,
            source: &ImageBuffer<'_>,
            dest: &mut ImageBufferMut<'_>,
            filter: ImageFilter,
        ) -> ImagingResult<()> {
            if source.format() != dest.format() {
                return Err(ImagingError::InvalidArgument(format!(
                    "cannot scale a {:?} buffer into a {:?} buffer",
                    source.format(),
                    dest.format()
                )));
            }

            let encoding = encoding(source.format())?;
            let pixels = decode(source, encoding);
            let width = source.width();

            let image = Rgba32FImage::from_fn(width, source.height(), |x, y| {
                Rgba(pixels[(y * width + x) as usize])
            });
            let resized = imageops::resize(&image, dest.width(), dest.height(), filter.into());

            let mut scaled: Vec<[f32; 4]> = resized.pixels().map(|p| p.0).collect();
            if !encoding.is_float() {
                for px in &mut scaled {
                    for c in px.iter_mut() {
                        *c = c.clamp(0.0, 1.0);
                    }
                }
            }

            encode(&scaled, dest, encoding);
            Ok(())
        }
    }

}
