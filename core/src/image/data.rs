//! Owned multi-dimensional image data.

use std::fs::File;
use std::io::{BufWriter, Read, Write};
use std::path::Path;

use crate::error::{ImagingError, ImagingResult};

use super::buffer::{BufferDescriptor, ImageBuffer, ImageBufferMut, Rect};
use super::buffer_list::ImageBufferList;
use super::codec::ImageCodec;
use super::format::{BufferFormat, FormatInfo};
use super::settings::{ImageSettings, ImageType};
use super::transform::{ConvertOptions, ImageDithering, ImageFilter, ImageTransform};

/// Bytes and pitches of one `(mip, array)` sub-resource, as uploaded to a device.
///
/// For volumes `data` spans every depth slice of the mip level.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SubresourceData<'a> {
    pub data: &'a [u8],
    pub row_pitch: u32,
    pub slice_pitch: u32,
}

/// An image: one contiguous allocation holding every array index, mip level
/// and depth slice, plus the layout of its sub-image buffers.
///
/// # Example
///
/// ```
/// use redlilium_core::image::{BufferFormat, ImageData, ImageSettings};
///
/// let image = ImageData::new(ImageSettings::new_2d(64, 64, BufferFormat::R8G8B8A8Unorm))?;
/// assert_eq!(image.size_in_bytes(), 64 * 64 * 4);
/// # Ok::<(), redlilium_core::ImagingError>(())
/// ```
#[derive(Clone, PartialEq, Eq, Default)]
pub struct ImageData {
    settings: ImageSettings,
    data: Vec<u8>,
    buffers: ImageBufferList,
}

impl ImageData {
    /// Create a zero filled image.
    ///
    /// The settings are sanitized before the image is laid out.
    ///
    /// # Errors
    ///
    /// Returns an error if the format is [`BufferFormat::Unknown`].
    pub fn new(settings: ImageSettings) -> ImagingResult<Self> {
        Self::build(settings, None)
    }

    /// Create an image that takes ownership of `data`.
    ///
    /// Extra bytes past the image size are discarded.
    ///
    /// # Errors
    ///
    /// Returns [`ImagingError::SizeMismatch`] if `data` is smaller than the image.
    pub fn from_vec(settings: ImageSettings, data: Vec<u8>) -> ImagingResult<Self> {
        Self::build(settings, Some(data))
    }

    /// Create an image holding a copy of `data`.
    ///
    /// # Errors
    ///
    /// Returns [`ImagingError::SizeMismatch`] if `data` is smaller than the image.
    pub fn from_bytes(settings: ImageSettings, data: &[u8]) -> ImagingResult<Self> {
        let settings = validate_settings(settings)?;
        let size = settings.size_in_bytes()?;
        if data.len() < size {
            return Err(ImagingError::SizeMismatch {
                expected: size,
                actual: data.len(),
            });
        }
        Self::build(settings, Some(data[..size].to_vec()))
    }

    /// Reconstruct an image from a raw dump written by [`ImageData::save_raw`].
    ///
    /// # Errors
    ///
    /// Returns [`ImagingError::SizeMismatch`] if `data` is smaller than the image.
    pub fn from_raw(settings: ImageSettings, data: &[u8]) -> ImagingResult<Self> {
        Self::from_bytes(settings, data)
    }

    fn build(settings: ImageSettings, data: Option<Vec<u8>>) -> ImagingResult<Self> {
        let settings = validate_settings(settings)?;
        let size = settings.size_in_bytes()?;

        let data = match data {
            Some(mut data) => {
                if data.len() < size {
                    return Err(ImagingError::SizeMismatch {
                        expected: size,
                        actual: data.len(),
                    });
                }
                data.truncate(size);
                data
            }
            None => vec![0u8; size],
        };

        let buffers = ImageBufferList::create_buffers(&settings);

        Ok(Self {
            settings,
            data,
            buffers,
        })
    }

    // ========================================================================
    // Layout
    // ========================================================================

    /// Get the sanitized settings of the image.
    pub fn settings(&self) -> &ImageSettings {
        &self.settings
    }

    pub fn image_type(&self) -> ImageType {
        self.settings.image_type
    }

    pub fn format(&self) -> BufferFormat {
        self.settings.format
    }

    pub fn width(&self) -> u32 {
        self.settings.width
    }

    pub fn height(&self) -> u32 {
        self.settings.height
    }

    pub fn depth(&self) -> u32 {
        self.settings.depth
    }

    pub fn array_count(&self) -> u32 {
        self.settings.array_count
    }

    pub fn mip_count(&self) -> u32 {
        self.settings.mip_count
    }

    /// Get the number of bytes in the backing allocation.
    pub fn size_in_bytes(&self) -> usize {
        self.data.len()
    }

    /// Returns true if the image holds no data, for example after its
    /// contents were moved out by [`ImageData::take_ownership`].
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Get the buffer layout.
    pub fn buffers(&self) -> &ImageBufferList {
        &self.buffers
    }

    /// Get the whole backing allocation.
    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    pub fn as_bytes_mut(&mut self) -> &mut [u8] {
        &mut self.data
    }

    /// Consume the image and return its backing allocation.
    pub fn into_vec(self) -> Vec<u8> {
        self.data
    }

    /// Get the buffer at `(mip, array_or_depth)`.
    ///
    /// For volumes the second index is the depth slice, otherwise the array index.
    ///
    /// # Errors
    ///
    /// Returns [`ImagingError::OutOfRange`] if either index is out of range.
    pub fn buffer(&self, mip: u32, array_or_depth: u32) -> ImagingResult<ImageBuffer<'_>> {
        let index = self.buffers.index(mip, array_or_depth)?;
        self.buffer_at(index)
    }

    /// Get the writable buffer at `(mip, array_or_depth)`.
    ///
    /// # Errors
    ///
    /// Returns [`ImagingError::OutOfRange`] if either index is out of range.
    pub fn buffer_mut(
        &mut self,
        mip: u32,
        array_or_depth: u32,
    ) -> ImagingResult<ImageBufferMut<'_>> {
        let index = self.buffers.index(mip, array_or_depth)?;
        self.buffer_at_mut(index)
    }

    fn descriptor_at(&self, index: usize) -> ImagingResult<BufferDescriptor> {
        self.buffers
            .descriptors()
            .get(index)
            .copied()
            .ok_or_else(|| ImagingError::OutOfRange {
                name: "buffer_index",
                value: index as i64,
                min: 0,
                max: self.buffers.len() as i64 - 1,
            })
    }

    /// Get the buffer at a linear index in layout order.
    ///
    /// # Errors
    ///
    /// Returns [`ImagingError::OutOfRange`] if `index` is out of range.
    pub fn buffer_at(&self, index: usize) -> ImagingResult<ImageBuffer<'_>> {
        let descriptor = self.descriptor_at(index)?;
        ImageBuffer::new(descriptor, &self.data[descriptor.range()])
    }

    /// Get the writable buffer at a linear index in layout order.
    ///
    /// # Errors
    ///
    /// Returns [`ImagingError::OutOfRange`] if `index` is out of range.
    pub fn buffer_at_mut(&mut self, index: usize) -> ImagingResult<ImageBufferMut<'_>> {
        let descriptor = self.descriptor_at(index)?;
        ImageBufferMut::new(descriptor, &mut self.data[descriptor.range()])
    }

    /// Iterate over every buffer in layout order.
    pub fn iter_buffers(&self) -> impl Iterator<Item = ImageBuffer<'_>> + '_ {
        self.buffers
            .iter()
            .filter_map(|descriptor| ImageBuffer::new(*descriptor, &self.data[descriptor.range()]).ok())
    }

    /// Borrow two distinct buffers of this image, one for reading and one for writing.
    fn buffer_pair(
        &mut self,
        source: usize,
        dest: usize,
    ) -> ImagingResult<(ImageBuffer<'_>, ImageBufferMut<'_>)> {
        if source == dest {
            return Err(ImagingError::InvalidArgument(
                "source and destination buffers are the same buffer".to_string(),
            ));
        }

        let src = self.descriptor_at(source)?;
        let dst = self.descriptor_at(dest)?;

        if src.offset < dst.offset {
            let (low, high) = self.data.split_at_mut(dst.offset);
            Ok((
                ImageBuffer::new(src, &low[src.range()])?,
                ImageBufferMut::new(dst, &mut high[..dst.len()])?,
            ))
        } else {
            let (low, high) = self.data.split_at_mut(src.offset);
            Ok((
                ImageBuffer::new(src, &high[..src.len()])?,
                ImageBufferMut::new(dst, &mut low[dst.range()])?,
            ))
        }
    }

    /// Copy a region between two buffers of this image.
    ///
    /// Clipping follows [`ImageBuffer::copy_to`].
    ///
    /// # Errors
    ///
    /// Returns [`ImagingError::InvalidArgument`] if both indices name the same
    /// buffer, or [`ImagingError::OutOfRange`] for an invalid index.
    pub fn copy_buffer(
        &mut self,
        source: (u32, u32),
        dest: (u32, u32),
        region: Option<Rect>,
        dest_x: i32,
        dest_y: i32,
    ) -> ImagingResult<()> {
        let source = self.buffers.index(source.0, source.1)?;
        let dest = self.buffers.index(dest.0, dest.1)?;
        let (src, mut dst) = self.buffer_pair(source, dest)?;
        src.copy_to(&mut dst, region, dest_x, dest_y)
    }

    /// Get the data and pitches of sub-resource `(mip, array)`.
    ///
    /// Volumes ignore `array` and return every depth slice of the mip level.
    ///
    /// # Errors
    ///
    /// Returns [`ImagingError::OutOfRange`] if either index is out of range.
    pub fn subresource(&self, mip: u32, array: u32) -> ImagingResult<SubresourceData<'_>> {
        let (start, len, pitch) = self.subresource_range(mip, array)?;
        Ok(SubresourceData {
            data: &self.data[start..start + len],
            row_pitch: pitch.row_pitch,
            slice_pitch: pitch.slice_pitch,
        })
    }

    /// Get the writable bytes of sub-resource `(mip, array)`.
    ///
    /// # Errors
    ///
    /// Returns [`ImagingError::OutOfRange`] if either index is out of range.
    pub fn subresource_mut(&mut self, mip: u32, array: u32) -> ImagingResult<&mut [u8]> {
        let (start, len, _) = self.subresource_range(mip, array)?;
        Ok(&mut self.data[start..start + len])
    }

    fn subresource_range(
        &self,
        mip: u32,
        array: u32,
    ) -> ImagingResult<(usize, usize, super::format::PitchLayout)> {
        let array = if self.settings.image_type == ImageType::Image3D {
            0
        } else {
            array
        };
        let first = self.buffers.get(mip, array)?;
        let depth = self.buffers.depth_count(mip)?;
        Ok((first.offset, first.len() * depth as usize, first.pitch))
    }

    /// Iterate over the sub-resources in device order (`mip + array * mip_count`).
    pub fn subresources(&self) -> impl Iterator<Item = SubresourceData<'_>> + '_ {
        let arrays = if self.settings.image_type == ImageType::Image3D {
            1
        } else {
            self.settings.array_count
        };
        let mips = self.settings.mip_count;
        (0..arrays)
            .flat_map(move |array| (0..mips).map(move |mip| (mip, array)))
            .filter_map(|(mip, array)| self.subresource(mip, array).ok())
    }

    // ========================================================================
    // Ownership
    // ========================================================================

    /// Move the contents of `other` into this image.
    ///
    /// This image's previous allocation is released. `other` is left empty:
    /// no data, no buffers, default settings.
    pub fn take_ownership(&mut self, other: &mut ImageData) {
        *self = std::mem::take(other);
    }

    /// Copy the overlapping array indices, mip levels and depth slices into `dest`.
    ///
    /// # Errors
    ///
    /// Returns [`ImagingError::InvalidArgument`] if format, width or height differ.
    pub fn copy_to(&self, dest: &mut ImageData) -> ImagingResult<()> {
        if self.format() != dest.format()
            || self.width() != dest.width()
            || self.height() != dest.height()
        {
            return Err(ImagingError::InvalidArgument(format!(
                "cannot copy a {:?} {}x{} image into a {:?} {}x{} image",
                self.format(),
                self.width(),
                self.height(),
                dest.format(),
                dest.width(),
                dest.height()
            )));
        }

        let src_volume = self.image_type() == ImageType::Image3D;
        let dst_volume = dest.image_type() == ImageType::Image3D;
        let arrays = self.array_count().min(dest.array_count());
        let mips = self.mip_count().min(dest.mip_count());

        for array in 0..arrays {
            for mip in 0..mips {
                let depth = self
                    .buffers
                    .depth_count(mip)?
                    .min(dest.buffers.depth_count(mip)?);
                for slice in 0..depth {
                    let src = self.buffer(mip, if src_volume { slice } else { array })?;
                    let mut dst = dest.buffer_mut(mip, if dst_volume { slice } else { array })?;
                    src.copy_to(&mut dst, None, 0, 0)?;
                }
            }
        }

        Ok(())
    }

    // ========================================================================
    // Transforms
    // ========================================================================

    /// Returns true if `transform` can convert `source` pixels to `dest`.
    pub fn can_convert(transform: &dyn ImageTransform, source: BufferFormat, dest: BufferFormat) -> bool {
        if source == BufferFormat::Unknown || dest == BufferFormat::Unknown {
            return false;
        }
        source == dest || transform.can_convert(source, dest)
    }

    /// Returns true if `source` can be converted to at least one of `dests`.
    pub fn can_convert_to_any(
        transform: &dyn ImageTransform,
        source: BufferFormat,
        dests: &[BufferFormat],
    ) -> bool {
        dests
            .iter()
            .any(|&dest| Self::can_convert(transform, source, dest))
    }

    /// Returns true if `source` can be converted to every one of `dests`.
    pub fn can_convert_to_all(
        transform: &dyn ImageTransform,
        source: BufferFormat,
        dests: &[BufferFormat],
    ) -> bool {
        !dests.is_empty()
            && dests
                .iter()
                .all(|&dest| Self::can_convert(transform, source, dest))
    }

    /// Rebuild the mip chain from mip 0.
    ///
    /// A `mip_count` of 0, or one above the maximum the dimensions allow,
    /// generates the full chain. Each level is downsampled from the previous
    /// one. Returns the number of mip levels in the image afterwards.
    ///
    /// # Errors
    ///
    /// Returns an error if the transform cannot scale the format.
    pub fn generate_mip_maps(
        &mut self,
        mip_count: u32,
        filter: ImageFilter,
        transform: &dyn ImageTransform,
    ) -> ImagingResult<u32> {
        let max = self.settings.max_mip_count();
        let mip_count = if mip_count == 0 || mip_count > max {
            max
        } else {
            mip_count
        };

        let settings = ImageSettings {
            mip_count,
            ..self.settings
        };
        let mut dest = ImageData::new(settings)?;

        let is_volume = self.image_type() == ImageType::Image3D;
        let arrays = if is_volume { 1 } else { self.array_count() };

        for array in 0..arrays {
            let source = self.subresource(0, array)?;
            dest.subresource_mut(0, array)?.copy_from_slice(source.data);

            for mip in 1..mip_count {
                let depth = dest.buffers.depth_count(mip)?;
                let previous_depth = dest.buffers.depth_count(mip - 1)?;

                for slice in 0..depth {
                    let (src_index, dst_index) = if is_volume {
                        let src_slice = (slice * 2).min(previous_depth - 1);
                        (
                            dest.buffers.index(mip - 1, src_slice)?,
                            dest.buffers.index(mip, slice)?,
                        )
                    } else {
                        (
                            dest.buffers.index(mip - 1, array)?,
                            dest.buffers.index(mip, array)?,
                        )
                    };

                    let (src, mut dst) = dest.buffer_pair(src_index, dst_index)?;
                    transform.scale(&src, &mut dst, filter)?;
                }
            }
        }

        log::debug!(
            "ImageData: generated {} mip levels for {}x{}x{} {:?}",
            mip_count,
            self.width(),
            self.height(),
            self.depth(),
            self.format()
        );

        *self = dest;
        Ok(mip_count)
    }

    /// Resize every buffer of the image.
    ///
    /// With `clip` the top-left part of each buffer is kept (new area is
    /// zero filled), otherwise buffers are scaled with `filter`. The mip
    /// count is reduced if the new size cannot hold it. Resizing to the
    /// current size does nothing.
    ///
    /// # Errors
    ///
    /// Returns [`ImagingError::OutOfRange`] for a zero width or height,
    /// [`ImagingError::InvalidArgument`] when changing the height of a 1D
    /// image, or an error from the transform.
    pub fn resize(
        &mut self,
        width: u32,
        height: u32,
        clip: bool,
        filter: ImageFilter,
        transform: &dyn ImageTransform,
    ) -> ImagingResult<()> {
        if width == 0 {
            return Err(ImagingError::OutOfRange {
                name: "width",
                value: 0,
                min: 1,
                max: i64::from(u32::MAX),
            });
        }
        if height == 0 {
            return Err(ImagingError::OutOfRange {
                name: "height",
                value: 0,
                min: 1,
                max: i64::from(u32::MAX),
            });
        }
        if self.image_type() == ImageType::Image1D && height != 1 {
            return Err(ImagingError::InvalidArgument(
                "a 1D image cannot change its height".to_string(),
            ));
        }

        if width == self.width() && height == self.height() {
            return Ok(());
        }

        let mut settings = ImageSettings {
            width,
            height,
            ..self.settings
        };
        let max = settings.max_mip_count();
        if settings.mip_count > max {
            log::warn!(
                "ImageData: resizing to {}x{} reduces mip count from {} to {}",
                width,
                height,
                settings.mip_count,
                max
            );
            settings.mip_count = max;
        }

        let mut dest = ImageData::new(settings)?;

        for index in 0..dest.buffers.len() {
            let descriptor = dest.descriptor_at(index)?;
            let src_index = if self.image_type() == ImageType::Image3D {
                descriptor.depth_slice
            } else {
                descriptor.array_index
            };
            let src = self.buffer(descriptor.mip_level, src_index)?;
            let mut dst = dest.buffer_at_mut(index)?;

            if clip {
                transform.clip(&src, &mut dst)?;
            } else {
                transform.scale(&src, &mut dst, filter)?;
            }
        }

        *self = dest;
        Ok(())
    }

    /// Convert the image to another pixel format.
    ///
    /// Converting to the current format does nothing. Formats sharing one
    /// memory encoding and sRGB-ness are relabelled without touching the data.
    ///
    /// # Errors
    ///
    /// Returns [`ImagingError::InvalidArgument`] for [`BufferFormat::Unknown`]
    /// and [`ImagingError::FormatNotSupported`] if the transform cannot handle
    /// either format.
    pub fn convert_format(
        &mut self,
        format: BufferFormat,
        dithering: ImageDithering,
        transform: &dyn ImageTransform,
    ) -> ImagingResult<()> {
        if format == BufferFormat::Unknown {
            return Err(ImagingError::InvalidArgument(
                "cannot convert to the Unknown format".to_string(),
            ));
        }

        if format == self.format() {
            return Ok(());
        }

        if !transform.is_supported(self.format()) {
            return Err(ImagingError::FormatNotSupported(self.format()));
        }
        if !transform.is_supported(format) {
            return Err(ImagingError::FormatNotSupported(format));
        }

        let source_info = FormatInfo::new(self.format());
        let dest_info = FormatInfo::new(format);
        let settings = ImageSettings {
            format,
            ..self.settings
        };

        if transform.same_encoding(self.format(), format)
            && source_info.is_srgb() == dest_info.is_srgb()
        {
            self.buffers = ImageBufferList::create_buffers(&settings);
            self.settings = settings;
            return Ok(());
        }

        let mut dest = ImageData::new(settings)?;
        let options = ConvertOptions {
            dithering,
            source_srgb: source_info.is_srgb(),
            dest_srgb: dest_info.is_srgb(),
        };

        for index in 0..self.buffers.len() {
            let src = self.buffer_at(index)?;
            let mut dst = dest.buffer_at_mut(index)?;
            transform.convert(&src, &mut dst, options)?;
        }

        *self = dest;
        Ok(())
    }

    // ========================================================================
    // Persistence
    // ========================================================================

    /// Encode the image with `codec` into `writer`.
    ///
    /// # Errors
    ///
    /// Returns an error if the codec cannot encode the image or writing fails.
    pub fn save(&self, writer: &mut dyn Write, codec: &dyn ImageCodec) -> ImagingResult<()> {
        codec.encode(self, writer)
    }

    /// Encode the image with `codec` into a file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be created or encoding fails.
    pub fn save_to_file(&self, path: impl AsRef<Path>, codec: &dyn ImageCodec) -> ImagingResult<()> {
        let mut writer = BufWriter::new(File::create(path)?);
        self.save(&mut writer, codec)?;
        writer.flush()?;
        Ok(())
    }

    /// Write the backing allocation byte for byte, without a header.
    ///
    /// # Errors
    ///
    /// Returns an error if writing fails.
    pub fn save_raw(&self, writer: &mut dyn Write) -> ImagingResult<()> {
        writer.write_all(&self.data)?;
        Ok(())
    }

    /// Decode `size` bytes read from `reader` with `codec`.
    ///
    /// # Errors
    ///
    /// Returns [`ImagingError::OutOfRange`] for a zero size,
    /// [`ImagingError::SizeMismatch`] if the reader ends early,
    /// [`ImagingError::NotReadable`] if the codec rejects the data, or a
    /// decoding error.
    pub fn from_reader(
        reader: &mut dyn Read,
        size: usize,
        codec: &dyn ImageCodec,
    ) -> ImagingResult<Self> {
        if size == 0 {
            return Err(ImagingError::OutOfRange {
                name: "size",
                value: 0,
                min: 1,
                max: i64::MAX,
            });
        }

        let mut bytes = Vec::with_capacity(size);
        reader.take(size as u64).read_to_end(&mut bytes)?;
        if bytes.len() < size {
            return Err(ImagingError::SizeMismatch {
                expected: size,
                actual: bytes.len(),
            });
        }

        Self::from_memory(&bytes, codec)
    }

    /// Decode an image held in memory with `codec`, then apply the codec's
    /// post-processing overrides.
    ///
    /// # Errors
    ///
    /// Returns [`ImagingError::NotReadable`] if the codec rejects the data, or
    /// a decoding error.
    pub fn from_memory(bytes: &[u8], codec: &dyn ImageCodec) -> ImagingResult<Self> {
        if bytes.is_empty() {
            return Err(ImagingError::OutOfRange {
                name: "size",
                value: 0,
                min: 1,
                max: i64::MAX,
            });
        }

        if !codec.is_readable(bytes) {
            return Err(ImagingError::NotReadable {
                codec: codec.name().to_string(),
            });
        }

        let mut image = codec.decode(bytes)?;
        codec.post_process(&mut image)?;
        Ok(image)
    }

    /// Decode an image file with `codec`.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or decoded.
    pub fn from_file(path: impl AsRef<Path>, codec: &dyn ImageCodec) -> ImagingResult<Self> {
        let bytes = std::fs::read(path)?;
        Self::from_memory(&bytes, codec)
    }
}

impl std::fmt::Debug for ImageData {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ImageData")
            .field("settings", &self.settings)
            .field("size_in_bytes", &self.data.len())
            .field("buffers", &self.buffers.len())
            .finish()
    }
}

fn validate_settings(settings: ImageSettings) -> ImagingResult<ImageSettings> {
    if settings.format == BufferFormat::Unknown {
        return Err(ImagingError::InvalidArgument(
            "image format cannot be Unknown".to_string(),
        ));
    }
    Ok(settings.sanitize())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::image::codec::RawCodec;

    /// Transform that only copies, for exercising layout logic without pixel math.
    #[derive(Debug)]
    struct CopyTransform;

    impl ImageTransform for CopyTransform {
        fn can_convert(&self, source: BufferFormat, dest: BufferFormat) -> bool {
            source == dest
                || (source.info().size_in_bytes() == dest.info().size_in_bytes()
                    && !source.info().is_compressed())
        }

        fn same_encoding(&self, a: BufferFormat, b: BufferFormat) -> bool {
            a.info().group() == b.info().group() && a.info().group() != BufferFormat::Unknown
        }

        fn is_supported(&self, format: BufferFormat) -> bool {
            !format.info().is_compressed() && format != BufferFormat::Unknown
        }

        fn convert(
            &self,
            source: &ImageBuffer<'_>,
            dest: &mut ImageBufferMut<'_>,
            _options: ConvertOptions,
        ) -> ImagingResult<()> {
            dest.data_mut().copy_from_slice(source.data());
            Ok(())
        }

        fn scale(
            &self,
            source: &ImageBuffer<'_>,
            dest: &mut ImageBufferMut<'_>,
            _filter: ImageFilter,
        ) -> ImagingResult<()> {
            // Top-left sample of each 2x2 block, enough to see data flow.
            let bpp = source.format().info().size_in_bytes() as usize;
            let src_pitch = source.pitch().row_pitch as usize;
            let dst_pitch = dest.pitch().row_pitch as usize;
            let (width, height) = (dest.width() as usize, dest.height() as usize);
            let sx = (source.width() as usize / width).max(1);
            let sy = (source.height() as usize / height).max(1);
            for y in 0..height {
                for x in 0..width {
                    let s = (y * sy) * src_pitch + (x * sx) * bpp;
                    let d = y * dst_pitch + x * bpp;
                    dest.data_mut()[d..d + bpp].copy_from_slice(&source.data()[s..s + bpp]);
                }
            }
            Ok(())
        }
    }

    fn patterned(settings: ImageSettings) -> ImageData {
        let mut image = ImageData::new(settings).unwrap();
        for (i, byte) in image.as_bytes_mut().iter_mut().enumerate() {
            *byte = (i % 251) as u8;
        }
        image
    }

    #[test]
    fn test_scenario_single_buffer() {
        let image =
            ImageData::new(ImageSettings::new_2d(64, 64, BufferFormat::R8G8B8A8Unorm)).unwrap();
        assert_eq!(image.size_in_bytes(), 16384);
        let buffer = image.buffer(0, 0).unwrap();
        assert_eq!(buffer.descriptor().offset, 0);
        assert_eq!(buffer.pitch().row_pitch, 256);
        assert_eq!(buffer.pitch().slice_pitch, 16384);
    }

    #[test]
    fn test_unknown_format_rejected() {
        assert!(matches!(
            ImageData::new(ImageSettings::new_2d(4, 4, BufferFormat::Unknown)),
            Err(ImagingError::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_from_vec_too_small() {
        let settings = ImageSettings::new_2d(4, 4, BufferFormat::R8G8B8A8Unorm);
        assert!(matches!(
            ImageData::from_vec(settings, vec![0; 10]),
            Err(ImagingError::SizeMismatch {
                expected: 64,
                actual: 10
            })
        ));
    }

    #[test]
    fn test_from_bytes_copies() {
        let settings = ImageSettings::new_2d(2, 2, BufferFormat::R8Unorm);
        let bytes = [1u8, 2, 3, 4, 5];
        let image = ImageData::from_bytes(settings, &bytes).unwrap();
        assert_eq!(image.as_bytes(), &[1, 2, 3, 4]);
    }

    #[test]
    fn test_take_ownership_empties_source() {
        let mut target =
            ImageData::new(ImageSettings::new_2d(2, 2, BufferFormat::R8Unorm)).unwrap();
        let mut source = patterned(ImageSettings::new_2d(8, 8, BufferFormat::R8G8Unorm));
        let expected = source.as_bytes().to_vec();

        target.take_ownership(&mut source);

        assert_eq!(target.width(), 8);
        assert_eq!(target.format(), BufferFormat::R8G8Unorm);
        assert_eq!(target.as_bytes(), expected.as_slice());
        assert!(source.is_empty());
        assert_eq!(source.size_in_bytes(), 0);
        assert!(source.buffers().is_empty());
    }

    #[test]
    fn test_copy_buffer_alias_rejected() {
        let mut image = ImageData::new(
            ImageSettings::new_2d(4, 4, BufferFormat::R8Unorm).with_array_count(2),
        )
        .unwrap();
        assert!(matches!(
            image.copy_buffer((0, 1), (0, 1), None, 0, 0),
            Err(ImagingError::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_copy_buffer_between_arrays() {
        let mut image = ImageData::new(
            ImageSettings::new_2d(4, 4, BufferFormat::R8Unorm).with_array_count(2),
        )
        .unwrap();
        image.buffer_mut(0, 1).unwrap().fill(9);
        image.copy_buffer((0, 1), (0, 0), None, 0, 0).unwrap();
        assert!(image.buffer(0, 0).unwrap().data().iter().all(|&b| b == 9));
    }

    #[test]
    fn test_subresource_volume_spans_slices() {
        let image = ImageData::new(
            ImageSettings::new_3d(4, 4, 4, BufferFormat::R8Unorm).with_mip_count(2),
        )
        .unwrap();
        let mip0 = image.subresource(0, 3).unwrap();
        assert_eq!(mip0.data.len(), 64);
        assert_eq!(mip0.row_pitch, 4);
        assert_eq!(mip0.slice_pitch, 16);
        let mip1 = image.subresource(1, 0).unwrap();
        assert_eq!(mip1.data.len(), 8);
        assert_eq!(image.subresources().count(), 2);
    }

    #[test]
    fn test_generate_mip_maps_full_chain() {
        let mut image = patterned(ImageSettings::new_2d(16, 8, BufferFormat::R8Unorm));
        let mip0 = image.as_bytes().to_vec();

        let count = image.generate_mip_maps(0, ImageFilter::Point, &CopyTransform).unwrap();

        assert_eq!(count, 5);
        assert_eq!(image.mip_count(), 5);
        assert_eq!(image.buffer(0, 0).unwrap().data(), mip0.as_slice());
        let mip1 = image.buffer(1, 0).unwrap();
        assert_eq!((mip1.width(), mip1.height()), (8, 4));
        assert_eq!(mip1.data()[1], mip0[2]);
        let last = image.buffer(4, 0).unwrap();
        assert_eq!((last.width(), last.height()), (1, 1));
    }

    #[test]
    fn test_generate_mip_maps_volume() {
        let mut image = patterned(ImageSettings::new_3d(4, 4, 4, BufferFormat::R8Unorm));
        let count = image.generate_mip_maps(2, ImageFilter::Point, &CopyTransform).unwrap();
        assert_eq!(count, 2);
        assert_eq!(image.buffers().len(), 4 + 2);
        // Slice 1 of mip 1 is scaled from slice 2 of mip 0.
        let expected = image.buffer(0, 2).unwrap().data()[0];
        assert_eq!(image.buffer(1, 1).unwrap().data()[0], expected);
    }

    #[test]
    fn test_resize_same_size_is_noop() {
        let mut image = patterned(ImageSettings::new_2d(8, 8, BufferFormat::R8Unorm));
        let before = image.clone();
        image
            .resize(8, 8, false, ImageFilter::Linear, &CopyTransform)
            .unwrap();
        assert_eq!(image, before);
    }

    #[test]
    fn test_resize_clamps_mips() {
        let mut image = ImageData::new(
            ImageSettings::new_2d(16, 16, BufferFormat::R8Unorm).with_mip_count(5),
        )
        .unwrap();
        image
            .resize(4, 4, true, ImageFilter::Point, &CopyTransform)
            .unwrap();
        assert_eq!(image.mip_count(), 3);
        assert_eq!(image.size_in_bytes(), 16 + 4 + 1);
    }

    #[test]
    fn test_resize_rejects_invalid() {
        let mut image = ImageData::new(ImageSettings::new_1d(16, BufferFormat::R8Unorm)).unwrap();
        assert!(matches!(
            image.resize(0, 1, false, ImageFilter::Point, &CopyTransform),
            Err(ImagingError::OutOfRange { name: "width", .. })
        ));
        assert!(matches!(
            image.resize(8, 4, false, ImageFilter::Point, &CopyTransform),
            Err(ImagingError::InvalidArgument(_))
        ));
        image
            .resize(8, 1, false, ImageFilter::Point, &CopyTransform)
            .unwrap();
        assert_eq!(image.width(), 8);
    }

    #[test]
    fn test_convert_same_format_is_noop() {
        let mut image = patterned(ImageSettings::new_2d(4, 4, BufferFormat::R8G8B8A8Unorm));
        let before = image.as_bytes().as_ptr();
        image
            .convert_format(BufferFormat::R8G8B8A8Unorm, ImageDithering::None, &CopyTransform)
            .unwrap();
        assert_eq!(image.as_bytes().as_ptr(), before);
    }

    #[test]
    fn test_convert_relabels_shared_encoding() {
        let mut image = patterned(ImageSettings::new_2d(4, 4, BufferFormat::R8G8B8A8Unorm));
        let bytes = image.as_bytes().to_vec();
        image
            .convert_format(BufferFormat::R8G8B8A8Uint, ImageDithering::None, &CopyTransform)
            .unwrap();
        assert_eq!(image.format(), BufferFormat::R8G8B8A8Uint);
        assert_eq!(image.buffer(0, 0).unwrap().format(), BufferFormat::R8G8B8A8Uint);
        assert_eq!(image.as_bytes(), bytes.as_slice());
    }

    #[test]
    fn test_convert_errors() {
        let mut image = patterned(ImageSettings::new_2d(4, 4, BufferFormat::R8G8B8A8Unorm));
        assert!(matches!(
            image.convert_format(BufferFormat::Unknown, ImageDithering::None, &CopyTransform),
            Err(ImagingError::InvalidArgument(_))
        ));
        assert!(matches!(
            image.convert_format(BufferFormat::Bc1Unorm, ImageDithering::None, &CopyTransform),
            Err(ImagingError::FormatNotSupported(BufferFormat::Bc1Unorm))
        ));
    }

    #[test]
    fn test_can_convert() {
        assert!(ImageData::can_convert(
            &CopyTransform,
            BufferFormat::Bc1Unorm,
            BufferFormat::Bc1Unorm
        ));
        assert!(!ImageData::can_convert(
            &CopyTransform,
            BufferFormat::Unknown,
            BufferFormat::R8Unorm
        ));
        assert!(ImageData::can_convert_to_any(
            &CopyTransform,
            BufferFormat::R8G8B8A8Unorm,
            &[BufferFormat::Bc1Unorm, BufferFormat::R32Float]
        ));
        assert!(!ImageData::can_convert_to_all(
            &CopyTransform,
            BufferFormat::R8G8B8A8Unorm,
            &[BufferFormat::Bc1Unorm, BufferFormat::R32Float]
        ));
    }

    #[test]
    fn test_copy_to_overlap() {
        let source = patterned(
            ImageSettings::new_2d(4, 4, BufferFormat::R8Unorm)
                .with_array_count(3)
                .with_mip_count(3),
        );
        let mut dest = ImageData::new(
            ImageSettings::new_2d(4, 4, BufferFormat::R8Unorm)
                .with_array_count(2)
                .with_mip_count(2),
        )
        .unwrap();

        source.copy_to(&mut dest).unwrap();

        assert_eq!(
            dest.buffer(1, 1).unwrap().data(),
            source.buffer(1, 1).unwrap().data()
        );

        let mut wrong = ImageData::new(ImageSettings::new_2d(4, 2, BufferFormat::R8Unorm)).unwrap();
        assert!(source.copy_to(&mut wrong).is_err());
    }

    #[test]
    fn test_raw_round_trip() {
        let settings = ImageSettings::new_cube(8, BufferFormat::R8G8B8A8Unorm).with_mip_count(0);
        let image = patterned(settings);

        let mut raw = Vec::new();
        image.save_raw(&mut raw).unwrap();
        let restored = ImageData::from_raw(settings, &raw).unwrap();
        assert_eq!(restored.as_bytes(), image.as_bytes());

        let codec = RawCodec::new(settings);
        let mut reader = raw.as_slice();
        let decoded = ImageData::from_reader(&mut reader, raw.len(), &codec).unwrap();
        assert_eq!(decoded, image);
    }

    #[test]
    fn test_from_reader_errors() {
        let settings = ImageSettings::new_2d(4, 4, BufferFormat::R8Unorm);
        let codec = RawCodec::new(settings);

        let mut short: &[u8] = &[0u8; 8];
        assert!(matches!(
            ImageData::from_reader(&mut short, 16, &codec),
            Err(ImagingError::SizeMismatch {
                expected: 16,
                actual: 8
            })
        ));

        let mut empty: &[u8] = &[];
        assert!(matches!(
            ImageData::from_reader(&mut empty, 0, &codec),
            Err(ImagingError::OutOfRange { name: "size", .. })
        ));

        let mut too_small: &[u8] = &[0u8; 8];
        assert!(matches!(
            ImageData::from_reader(&mut too_small, 8, &codec),
            Err(ImagingError::NotReadable { .. })
        ));
    }
}
