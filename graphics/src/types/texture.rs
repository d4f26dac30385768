//! Texture types and settings.

use bitflags::bitflags;
use redlilium_core::image::{BufferFormat, ImageSettings, ImageType};

/// How the CPU and GPU access a texture.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum TextureUsage {
    /// GPU read/write, updated from the CPU with `update_subresource`.
    #[default]
    Default,
    /// GPU read only, contents fixed at creation.
    Immutable,
    /// GPU read, CPU write through locks.
    Dynamic,
    /// CPU read/write through locks, no GPU binding.
    Staging,
}

bitflags! {
    /// Pipeline stages a texture can be bound to.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct TextureBinding: u32 {
        /// Texture can be sampled in a shader.
        const SHADER_RESOURCE = 1 << 0;
        /// Texture can be used as a render target.
        const RENDER_TARGET = 1 << 1;
        /// Texture can be used as a depth/stencil buffer.
        const DEPTH_STENCIL = 1 << 2;
        /// Texture can be used as an unordered access (storage) texture.
        const UNORDERED_ACCESS = 1 << 3;
    }
}

bitflags! {
    /// Access requested when locking a sub-resource.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct LockFlags: u32 {
        /// Read the current contents (staging textures only).
        const READ = 1 << 0;
        /// Write new contents.
        const WRITE = 1 << 1;
        /// Discard the previous contents (dynamic textures only).
        const DISCARD = 1 << 2;
        /// Promise not to overwrite data the GPU is using (dynamic textures only).
        const NO_OVERWRITE = 1 << 3;
    }
}

/// Multisample count and quality of a 2D texture.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Multisampling {
    pub count: u32,
    pub quality: u32,
}

impl Multisampling {
    /// No multisampling.
    pub const NONE: Self = Self {
        count: 1,
        quality: 0,
    };

    pub fn new(count: u32, quality: u32) -> Self {
        Self { count, quality }
    }

    /// Returns true if more than one sample is taken per pixel.
    pub fn is_multisampled(&self) -> bool {
        self.count > 1
    }
}

impl Default for Multisampling {
    fn default() -> Self {
        Self::NONE
    }
}

/// Dimensionality of a texture.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TextureKind {
    Texture1D,
    Texture2D,
    Texture3D,
}

/// Shape of a texture, with the fields that apply to each dimensionality.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TextureDimensions {
    D1 {
        width: u32,
        array_count: u32,
    },
    D2 {
        width: u32,
        height: u32,
        array_count: u32,
        is_cube: bool,
        multisampling: Multisampling,
    },
    D3 {
        width: u32,
        height: u32,
        depth: u32,
    },
}

/// Settings of a texture.
///
/// Accessors for fields that do not apply to the texture's dimensionality
/// return neutral values: height and depth 1, array count 1, no multisampling.
///
/// # Example
///
/// ```
/// use redlilium_core::image::BufferFormat;
/// use redlilium_graphics::{TextureBinding, TextureSettings, TextureUsage};
///
/// let settings = TextureSettings::new_2d(1024, 1024, BufferFormat::R8G8B8A8Unorm)
///     .with_mip_count(0)
///     .with_usage(TextureUsage::Default)
///     .with_binding(TextureBinding::SHADER_RESOURCE | TextureBinding::RENDER_TARGET);
/// assert_eq!(settings.depth(), 1);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TextureSettings {
    pub dimensions: TextureDimensions,
    pub format: BufferFormat,
    /// Mip level count, 0 for the full chain.
    pub mip_count: u32,
    pub usage: TextureUsage,
    pub binding: TextureBinding,
    /// Format of the default shader view, `Unknown` to use `format`.
    pub shader_view_format: BufferFormat,
}

impl TextureSettings {
    fn with_dimensions(dimensions: TextureDimensions, format: BufferFormat) -> Self {
        Self {
            dimensions,
            format,
            mip_count: 1,
            usage: TextureUsage::Default,
            binding: TextureBinding::SHADER_RESOURCE,
            shader_view_format: BufferFormat::Unknown,
        }
    }

    pub fn new_1d(width: u32, format: BufferFormat) -> Self {
        Self::with_dimensions(
            TextureDimensions::D1 {
                width,
                array_count: 1,
            },
            format,
        )
    }

    pub fn new_2d(width: u32, height: u32, format: BufferFormat) -> Self {
        Self::with_dimensions(
            TextureDimensions::D2 {
                width,
                height,
                array_count: 1,
                is_cube: false,
                multisampling: Multisampling::NONE,
            },
            format,
        )
    }

    /// Create settings for a cube map with six faces.
    pub fn new_cube(size: u32, format: BufferFormat) -> Self {
        Self::with_dimensions(
            TextureDimensions::D2 {
                width: size,
                height: size,
                array_count: 6,
                is_cube: true,
                multisampling: Multisampling::NONE,
            },
            format,
        )
    }

    pub fn new_3d(width: u32, height: u32, depth: u32, format: BufferFormat) -> Self {
        Self::with_dimensions(
            TextureDimensions::D3 {
                width,
                height,
                depth,
            },
            format,
        )
    }

    /// Derive texture settings from image settings.
    pub fn from_image_settings(settings: &ImageSettings) -> Self {
        let texture = match settings.image_type {
            ImageType::Image1D => Self::new_1d(settings.width, settings.format)
                .with_array_count(settings.array_count),
            ImageType::Image2D => Self::new_2d(settings.width, settings.height, settings.format)
                .with_array_count(settings.array_count),
            ImageType::ImageCube => Self::new_cube(settings.width, settings.format)
                .with_array_count(settings.array_count),
            ImageType::Image3D => {
                Self::new_3d(settings.width, settings.height, settings.depth, settings.format)
            }
        };
        texture.with_mip_count(settings.mip_count)
    }

    pub fn with_mip_count(mut self, mip_count: u32) -> Self {
        self.mip_count = mip_count;
        self
    }

    pub fn with_usage(mut self, usage: TextureUsage) -> Self {
        self.usage = usage;
        self
    }

    pub fn with_binding(mut self, binding: TextureBinding) -> Self {
        self.binding = binding;
        self
    }

    pub fn with_shader_view_format(mut self, format: BufferFormat) -> Self {
        self.shader_view_format = format;
        self
    }

    pub fn with_format(mut self, format: BufferFormat) -> Self {
        self.format = format;
        self
    }

    /// Set the array count. Ignored for 3D textures.
    pub fn with_array_count(mut self, count: u32) -> Self {
        match &mut self.dimensions {
            TextureDimensions::D1 { array_count, .. }
            | TextureDimensions::D2 { array_count, .. } => *array_count = count,
            TextureDimensions::D3 { .. } => {
                log::warn!("TextureSettings: array count {} ignored for a 3D texture", count);
            }
        }
        self
    }

    /// Set the multisampling. Ignored for 1D and 3D textures.
    pub fn with_multisampling(mut self, value: Multisampling) -> Self {
        match &mut self.dimensions {
            TextureDimensions::D2 { multisampling, .. } => *multisampling = value,
            _ => {
                log::warn!(
                    "TextureSettings: multisampling {:?} ignored for a {:?} texture",
                    value,
                    self.kind()
                );
            }
        }
        self
    }

    pub fn kind(&self) -> TextureKind {
        match self.dimensions {
            TextureDimensions::D1 { .. } => TextureKind::Texture1D,
            TextureDimensions::D2 { .. } => TextureKind::Texture2D,
            TextureDimensions::D3 { .. } => TextureKind::Texture3D,
        }
    }

    pub fn width(&self) -> u32 {
        match self.dimensions {
            TextureDimensions::D1 { width, .. }
            | TextureDimensions::D2 { width, .. }
            | TextureDimensions::D3 { width, .. } => width,
        }
    }

    pub fn height(&self) -> u32 {
        match self.dimensions {
            TextureDimensions::D1 { .. } => 1,
            TextureDimensions::D2 { height, .. } | TextureDimensions::D3 { height, .. } => height,
        }
    }

    pub fn depth(&self) -> u32 {
        match self.dimensions {
            TextureDimensions::D3 { depth, .. } => depth,
            _ => 1,
        }
    }

    pub fn array_count(&self) -> u32 {
        match self.dimensions {
            TextureDimensions::D1 { array_count, .. }
            | TextureDimensions::D2 { array_count, .. } => array_count,
            TextureDimensions::D3 { .. } => 1,
        }
    }

    pub fn is_cube(&self) -> bool {
        matches!(self.dimensions, TextureDimensions::D2 { is_cube: true, .. })
    }

    pub fn multisampling(&self) -> Multisampling {
        match self.dimensions {
            TextureDimensions::D2 { multisampling, .. } => multisampling,
            _ => Multisampling::NONE,
        }
    }

    pub fn is_multisampled(&self) -> bool {
        self.multisampling().is_multisampled()
    }

    /// Get the format used by default shader views.
    pub fn view_format(&self) -> BufferFormat {
        if self.shader_view_format == BufferFormat::Unknown {
            self.format
        } else {
            self.shader_view_format
        }
    }

    /// Get the image type matching this texture's shape.
    pub fn image_type(&self) -> ImageType {
        match self.dimensions {
            TextureDimensions::D1 { .. } => ImageType::Image1D,
            TextureDimensions::D2 { is_cube: true, .. } => ImageType::ImageCube,
            TextureDimensions::D2 { .. } => ImageType::Image2D,
            TextureDimensions::D3 { .. } => ImageType::Image3D,
        }
    }

    /// Get image settings describing one CPU copy of the whole texture.
    pub fn image_settings(&self) -> ImageSettings {
        ImageSettings {
            image_type: self.image_type(),
            width: self.width(),
            height: self.height(),
            depth: self.depth(),
            array_count: self.array_count(),
            mip_count: self.mip_count,
            format: self.format,
        }
    }

    pub(crate) fn set_array_count(&mut self, count: u32) {
        if let TextureDimensions::D1 { array_count, .. } | TextureDimensions::D2 { array_count, .. } =
            &mut self.dimensions
        {
            *array_count = count;
        }
    }

    pub(crate) fn set_multisampling(&mut self, value: Multisampling) {
        if let TextureDimensions::D2 { multisampling, .. } = &mut self.dimensions {
            *multisampling = value;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_inapplicable_fields_are_neutral() {
        let settings = TextureSettings::new_1d(256, BufferFormat::R8Unorm);
        assert_eq!(settings.height(), 1);
        assert_eq!(settings.depth(), 1);
        assert_eq!(settings.multisampling(), Multisampling::NONE);

        let settings = TextureSettings::new_3d(16, 8, 4, BufferFormat::R8Unorm);
        assert_eq!(settings.array_count(), 1);
        assert_eq!(settings.depth(), 4);
        assert!(!settings.is_cube());
    }

    #[test]
    fn test_ignored_setters() {
        let settings = TextureSettings::new_3d(16, 16, 16, BufferFormat::R8Unorm)
            .with_array_count(4)
            .with_multisampling(Multisampling::new(4, 0));
        assert_eq!(settings.array_count(), 1);
        assert!(!settings.is_multisampled());
    }

    #[test]
    fn test_view_format_defaults_to_format() {
        let settings = TextureSettings::new_2d(4, 4, BufferFormat::R8G8B8A8Typeless);
        assert_eq!(settings.view_format(), BufferFormat::R8G8B8A8Typeless);
        let settings = settings.with_shader_view_format(BufferFormat::R8G8B8A8UnormSrgb);
        assert_eq!(settings.view_format(), BufferFormat::R8G8B8A8UnormSrgb);
    }

    #[test]
    fn test_image_settings_round_trip() {
        let image = ImageSettings::new_cube(64, BufferFormat::Bc1Unorm)
            .with_array_count(12)
            .with_mip_count(3);
        let settings = TextureSettings::from_image_settings(&image);

        assert!(settings.is_cube());
        assert_eq!(settings.array_count(), 12);
        assert_eq!(settings.mip_count, 3);
        assert_eq!(settings.image_settings(), image);
    }
}
