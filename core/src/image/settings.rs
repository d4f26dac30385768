//! Image settings and layout sizing.

use crate::error::{ImagingError, ImagingResult};

use super::format::{BufferFormat, FormatInfo, PitchFlags};

/// The shape of an image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ImageType {
    /// A row of pixels, optionally arrayed.
    Image1D,
    /// A 2D image, optionally arrayed.
    #[default]
    Image2D,
    /// A cube map: a 2D array whose array count is a multiple of 6.
    ImageCube,
    /// A volume with depth slices. Volumes are never arrayed.
    Image3D,
}

/// Settings describing the layout of an image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ImageSettings {
    /// Shape of the image.
    pub image_type: ImageType,
    /// Width of mip 0, in pixels.
    pub width: u32,
    /// Height of mip 0, in pixels. Always 1 for 1D images.
    pub height: u32,
    /// Depth of mip 0, in slices. Always 1 except for 3D images.
    pub depth: u32,
    /// Number of array indices. Always 1 for 3D images.
    pub array_count: u32,
    /// Number of mip levels. 0 requests a full mip chain.
    pub mip_count: u32,
    /// Pixel format.
    pub format: BufferFormat,
}

impl Default for ImageSettings {
    fn default() -> Self {
        Self {
            image_type: ImageType::Image2D,
            width: 1,
            height: 1,
            depth: 1,
            array_count: 1,
            mip_count: 1,
            format: BufferFormat::Unknown,
        }
    }
}

impl ImageSettings {
    /// Create settings for a 1D image.
    pub fn new_1d(width: u32, format: BufferFormat) -> Self {
        Self {
            image_type: ImageType::Image1D,
            width,
            format,
            ..Default::default()
        }
    }

    /// Create settings for a 2D image.
    pub fn new_2d(width: u32, height: u32, format: BufferFormat) -> Self {
        Self {
            image_type: ImageType::Image2D,
            width,
            height,
            format,
            ..Default::default()
        }
    }

    /// Create settings for a cube map with square faces.
    pub fn new_cube(size: u32, format: BufferFormat) -> Self {
        Self {
            image_type: ImageType::ImageCube,
            width: size,
            height: size,
            array_count: 6,
            format,
            ..Default::default()
        }
    }

    /// Create settings for a 3D image.
    pub fn new_3d(width: u32, height: u32, depth: u32, format: BufferFormat) -> Self {
        Self {
            image_type: ImageType::Image3D,
            width,
            height,
            depth,
            format,
            ..Default::default()
        }
    }

    /// Set the mip count. 0 requests a full mip chain.
    pub fn with_mip_count(mut self, mip_count: u32) -> Self {
        self.mip_count = mip_count;
        self
    }

    /// Set the array count.
    pub fn with_array_count(mut self, array_count: u32) -> Self {
        self.array_count = array_count;
        self
    }

    /// Set the pixel format.
    pub fn with_format(mut self, format: BufferFormat) -> Self {
        self.format = format;
        self
    }

    /// Return a copy of these settings with every field forced into its valid range.
    ///
    /// Axes a type does not use are forced to 1, array count is at least 1
    /// (rounded up to a multiple of 6 for cube maps) and the mip count is
    /// clamped to the maximum supported by the dimensions, with 0 meaning
    /// the full chain.
    pub fn sanitize(&self) -> Self {
        let mut settings = *self;

        settings.width = settings.width.max(1);

        match settings.image_type {
            ImageType::Image1D => {
                settings.height = 1;
                settings.depth = 1;
                settings.array_count = settings.array_count.max(1);
            }
            ImageType::Image2D => {
                settings.height = settings.height.max(1);
                settings.depth = 1;
                settings.array_count = settings.array_count.max(1);
            }
            ImageType::ImageCube => {
                settings.height = settings.height.max(1);
                settings.depth = 1;
                let count = settings.array_count.max(1);
                settings.array_count = count.div_ceil(6) * 6;
            }
            ImageType::Image3D => {
                settings.height = settings.height.max(1);
                settings.depth = settings.depth.max(1);
                settings.array_count = 1;
            }
        }

        let max_mips = settings.max_mip_count();
        if settings.mip_count == 0 || settings.mip_count > max_mips {
            settings.mip_count = max_mips;
        }

        settings
    }

    /// Get the maximum number of mip levels these dimensions support.
    pub fn max_mip_count(&self) -> u32 {
        let depth = if self.image_type == ImageType::Image3D {
            self.depth
        } else {
            1
        };
        max_mip_count(self.width, self.height, depth)
    }

    /// Get the number of bytes required to store an image with these settings.
    ///
    /// The settings are used as given; call [`ImageSettings::sanitize`] first
    /// to size an image the way [`ImageData`](super::ImageData) will.
    ///
    /// # Errors
    ///
    /// Returns [`ImagingError::FormatNotSupported`] for [`BufferFormat::Unknown`]
    /// or when the computed size is 0.
    pub fn size_in_bytes(&self) -> ImagingResult<usize> {
        size_in_bytes(self, PitchFlags::empty())
    }

    /// Get the mip level dimensions `(width, height, depth)` for `mip`.
    pub fn mip_dimensions(&self, mip: u32) -> (u32, u32, u32) {
        let depth = if self.image_type == ImageType::Image3D {
            self.depth
        } else {
            1
        };
        (
            mip_extent(self.width, mip),
            mip_extent(self.height, mip),
            mip_extent(depth, mip),
        )
    }
}

/// Extent of an axis at a mip level: `max(1, extent >> mip)`.
pub fn mip_extent(extent: u32, mip: u32) -> u32 {
    extent.checked_shr(mip).unwrap_or(0).max(1)
}

/// Get the maximum number of mip levels for the given dimensions.
///
/// Counts levels while halving every axis above 1, so a 256×256 image
/// supports 9 levels (256 down to 1).
pub fn max_mip_count(width: u32, height: u32, depth: u32) -> u32 {
    let (mut width, mut height, mut depth) = (width.max(1), height.max(1), depth.max(1));
    let mut count = 1;

    while width > 1 || height > 1 || depth > 1 {
        width = (width >> 1).max(1);
        height = (height >> 1).max(1);
        depth = (depth >> 1).max(1);
        count += 1;
    }

    count
}

/// Get the total number of depth slices across `mip_count` mip levels of a volume.
pub fn depth_slice_count(depth: u32, mip_count: u32) -> u32 {
    (0..mip_count.max(1)).map(|mip| mip_extent(depth, mip)).sum()
}

/// Size an image laid out with the given pitch flags.
pub(crate) fn size_in_bytes(settings: &ImageSettings, flags: PitchFlags) -> ImagingResult<usize> {
    if settings.format == BufferFormat::Unknown {
        return Err(ImagingError::FormatNotSupported(settings.format));
    }

    let info = FormatInfo::new(settings.format);
    let mip_count = settings.mip_count.max(1);

    let mut chain = 0usize;
    for mip in 0..mip_count {
        let (width, height, depth) = settings.mip_dimensions(mip);
        let pitch = info.pitch(width, height, flags);
        chain += pitch.slice_pitch as usize * depth as usize;
    }

    let total = if settings.image_type == ImageType::Image3D {
        chain
    } else {
        chain * settings.array_count.max(1) as usize
    };

    if total == 0 {
        return Err(ImagingError::FormatNotSupported(settings.format));
    }

    Ok(total)
}
