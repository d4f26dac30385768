//! Texture creation and validation.
//!
//! The [`TextureFactory`] is the only way to create a [`Texture`]. It checks
//! texture settings against the device's capabilities and format support,
//! resolves defaults (full mip chain, array count limits, multisampling) and
//! then creates and initializes the texture.

use std::io::Read;
use std::path::Path;
use std::sync::Arc;

use parking_lot::Mutex;
use redlilium_core::image::{max_mip_count, BufferFormat, ImageCodec, ImageData, ImageSettings};

use crate::accounting::{NoAccounting, ResourceAccounting};
use crate::device::{FeatureTier, FormatSupport, GraphicsDevice};
use crate::error::{GraphicsError, GraphicsResult};
use crate::resources::{validate_initial_data, Texture};
use crate::types::{
    DeviceContext, Multisampling, TextureBinding, TextureKind, TextureSettings, TextureUsage,
};

/// Name of the built-in logo texture.
pub const LOGO_NAME: &str = "RedLilium.Logo";

const LOGO_SIZE: u32 = 64;

/// How a texture created from an image is used and bound.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TextureLoadOptions {
    pub usage: TextureUsage,
    pub binding: TextureBinding,
    /// Format of the default shader view, `Unknown` for the image format.
    pub view_format: BufferFormat,
    /// Multisampling of 2D textures. Ignored for other kinds.
    pub multisampling: Multisampling,
}

impl Default for TextureLoadOptions {
    fn default() -> Self {
        Self {
            usage: TextureUsage::Default,
            binding: TextureBinding::SHADER_RESOURCE,
            view_format: BufferFormat::Unknown,
            multisampling: Multisampling::NONE,
        }
    }
}

impl TextureLoadOptions {
    pub fn with_usage(mut self, usage: TextureUsage) -> Self {
        self.usage = usage;
        self
    }

    pub fn with_binding(mut self, binding: TextureBinding) -> Self {
        self.binding = binding;
        self
    }

    pub fn with_view_format(mut self, format: BufferFormat) -> Self {
        self.view_format = format;
        self
    }

    pub fn with_multisampling(mut self, multisampling: Multisampling) -> Self {
        self.multisampling = multisampling;
        self
    }
}

/// Creates textures on a graphics device.
///
/// # Example
///
/// ```
/// use std::sync::Arc;
/// use redlilium_core::image::BufferFormat;
/// use redlilium_graphics::{DeviceContext, DummyDevice, TextureFactory, TextureSettings};
///
/// let factory = TextureFactory::new(Arc::new(DummyDevice::new()));
/// let texture = factory.create(
///     "diffuse",
///     &TextureSettings::new_2d(256, 256, BufferFormat::R8G8B8A8Unorm).with_mip_count(0),
///     None,
///     DeviceContext::Immediate,
/// )?;
/// assert_eq!(texture.mip_count(), 9);
/// # Ok::<(), redlilium_graphics::GraphicsError>(())
/// ```
pub struct TextureFactory {
    device: Arc<dyn GraphicsDevice>,
    accounting: Arc<dyn ResourceAccounting>,
    logo: Mutex<Option<Arc<Texture>>>,
}

impl std::fmt::Debug for TextureFactory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TextureFactory")
            .field("device", &self.device.name())
            .field("accounting", &self.accounting)
            .field("has_logo", &self.logo.lock().is_some())
            .finish()
    }
}

impl TextureFactory {
    /// Create a factory that does not account for its textures.
    pub fn new(device: Arc<dyn GraphicsDevice>) -> Self {
        Self::with_accounting(device, Arc::new(NoAccounting))
    }

    /// Create a factory reporting texture lifetimes to `accounting`.
    pub fn with_accounting(
        device: Arc<dyn GraphicsDevice>,
        accounting: Arc<dyn ResourceAccounting>,
    ) -> Self {
        Self {
            device,
            accounting,
            logo: Mutex::new(None),
        }
    }

    /// Get the device textures are created on.
    pub fn device(&self) -> &Arc<dyn GraphicsDevice> {
        &self.device
    }

    /// Get the accounting sink.
    pub fn accounting(&self) -> &Arc<dyn ResourceAccounting> {
        &self.accounting
    }

    // ========================================================================
    // Validation
    // ========================================================================

    /// Validate `settings` against the device and resolve their defaults.
    ///
    /// The returned settings have a resolved mip count (0 and counts above
    /// the maximum become the full chain), an array count within the device
    /// limit and a multisample count of at least 1.
    ///
    /// # Errors
    ///
    /// Returns an error if the settings describe a texture the device cannot
    /// create.
    pub fn validate(&self, settings: &TextureSettings) -> GraphicsResult<TextureSettings> {
        let caps = self.device.capabilities();
        let mut settings = *settings;
        let kind = settings.kind();
        let unordered = settings.binding.contains(TextureBinding::UNORDERED_ACCESS);

        if unordered && matches!(settings.usage, TextureUsage::Dynamic | TextureUsage::Staging) {
            return Err(GraphicsError::InvalidParameter(format!(
                "{:?} textures cannot be bound for unordered access",
                settings.usage
            )));
        }
        if settings.format == BufferFormat::Unknown {
            return Err(GraphicsError::InvalidParameter(
                "texture format cannot be unknown".to_string(),
            ));
        }
        for (name, value) in [
            ("width", settings.width()),
            ("height", settings.height()),
            ("depth", settings.depth()),
        ] {
            if value == 0 {
                return Err(GraphicsError::OutOfRange {
                    name,
                    value: 0,
                    min: 1,
                    max: i64::from(u32::MAX),
                });
            }
        }

        if kind != TextureKind::Texture3D {
            let count = settings.array_count().clamp(1, caps.max_array_count);
            if count != settings.array_count() {
                log::warn!(
                    "TextureFactory: array count {} clamped to {}",
                    settings.array_count(),
                    count
                );
                settings.set_array_count(count);
            }
        }

        if settings.is_cube() {
            if settings.array_count() % 6 != 0 {
                return Err(GraphicsError::InvalidParameter(format!(
                    "cube texture array count {} is not a multiple of 6",
                    settings.array_count()
                )));
            }
            if caps.tier < FeatureTier::Sm41 && settings.array_count() != 6 {
                return Err(GraphicsError::FeatureNotSupported(
                    "cube texture arrays require shader model 4.1".to_string(),
                ));
            }
        }

        let max_mips = max_mip_count(settings.width(), settings.height(), settings.depth());
        if settings.mip_count == 0 || settings.mip_count > max_mips {
            settings.mip_count = max_mips;
        }
        let support = self.device.format_support(settings.format);
        if settings.mip_count > 1 && !support.contains(FormatSupport::MIP) {
            return Err(GraphicsError::FeatureNotSupported(format!(
                "{:?} does not support mip maps",
                settings.format
            )));
        }

        let mut multisampling = settings.multisampling();
        if multisampling.count == 0 {
            multisampling = Multisampling::NONE;
            settings.set_multisampling(multisampling);
        }
        if multisampling.is_multisampled() {
            if settings.mip_count > 1 {
                return Err(GraphicsError::InvalidParameter(
                    "multisampled textures cannot have mip maps".to_string(),
                ));
            }
            if settings.is_cube() {
                return Err(GraphicsError::InvalidParameter(
                    "cube textures cannot be multisampled".to_string(),
                ));
            }
            if !support.contains(FormatSupport::MULTISAMPLE_RENDER_TARGET) {
                return Err(GraphicsError::FeatureNotSupported(format!(
                    "{:?} does not support multisampling",
                    settings.format
                )));
            }
        }

        let info = settings.format.info();
        if info.is_compressed() {
            let unaligned = settings.width() % 4 != 0
                || (kind != TextureKind::Texture1D && settings.height() % 4 != 0);
            if unaligned {
                return Err(GraphicsError::InvalidParameter(format!(
                    "compressed texture size {}x{} is not a multiple of 4",
                    settings.width(),
                    settings.height()
                )));
            }
        }

        if unordered && caps.tier < FeatureTier::Sm5 {
            return Err(GraphicsError::FeatureNotSupported(
                "unordered access requires shader model 5".to_string(),
            ));
        }

        let (max_size, axes) = match kind {
            TextureKind::Texture1D => {
                (caps.max_texture_dimension, vec![("width", settings.width())])
            }
            TextureKind::Texture2D => (
                caps.max_texture_dimension,
                vec![("width", settings.width()), ("height", settings.height())],
            ),
            TextureKind::Texture3D => (
                caps.max_texture_dimension_3d,
                vec![
                    ("width", settings.width()),
                    ("height", settings.height()),
                    ("depth", settings.depth()),
                ],
            ),
        };
        for (name, value) in axes {
            if value > max_size {
                return Err(GraphicsError::OutOfRange {
                    name,
                    value: i64::from(value),
                    min: 1,
                    max: i64::from(max_size),
                });
            }
        }

        let required = match kind {
            TextureKind::Texture1D => FormatSupport::TEXTURE1D,
            TextureKind::Texture2D if settings.is_cube() => FormatSupport::TEXTURE_CUBE,
            TextureKind::Texture2D => FormatSupport::TEXTURE2D,
            TextureKind::Texture3D => FormatSupport::TEXTURE3D,
        };
        if !support.contains(required) {
            return Err(GraphicsError::FeatureNotSupported(format!(
                "{:?} is not supported for {:?} textures",
                settings.format, kind
            )));
        }

        Ok(settings)
    }

    // ========================================================================
    // Creation
    // ========================================================================

    fn check_creation(name: &str, context: DeviceContext) -> GraphicsResult<()> {
        if context.is_deferred() {
            return Err(GraphicsError::InvalidState(format!(
                "textures cannot be created on {:?}",
                context
            )));
        }
        if name.trim().is_empty() {
            return Err(GraphicsError::InvalidParameter(
                "texture name cannot be empty".to_string(),
            ));
        }
        Ok(())
    }

    /// Create a texture, optionally filled with `initial`.
    ///
    /// # Errors
    ///
    /// Returns an error if `context` is deferred, `name` is blank, the
    /// settings are invalid, an immutable texture has no initial data, the
    /// initial data does not match the texture, or the device fails.
    pub fn create(
        &self,
        name: &str,
        settings: &TextureSettings,
        initial: Option<&ImageData>,
        context: DeviceContext,
    ) -> GraphicsResult<Arc<Texture>> {
        Self::check_creation(name, context)?;
        let settings = self.validate(settings)?;
        match initial {
            Some(image) => validate_initial_data(&settings, image)?,
            None if settings.usage == TextureUsage::Immutable => {
                return Err(GraphicsError::InvalidParameter(
                    "immutable textures require initial data".to_string(),
                ));
            }
            None => {}
        }

        let texture = Arc::new(Texture::new(
            Arc::clone(&self.device),
            Arc::clone(&self.accounting),
            name,
            settings,
        )?);
        texture.initialize(initial)?;
        Ok(texture)
    }

    /// Create a texture holding `image`.
    ///
    /// When the options bind the texture for unordered access, the texture
    /// takes the typeless group of the image format and its shader views
    /// default to the image format.
    ///
    /// # Errors
    ///
    /// See [`create`](Self::create).
    pub fn from_image(
        &self,
        name: &str,
        image: &ImageData,
        options: &TextureLoadOptions,
        context: DeviceContext,
    ) -> GraphicsResult<Arc<Texture>> {
        let mut settings = TextureSettings::from_image_settings(image.settings())
            .with_usage(options.usage)
            .with_binding(options.binding)
            .with_shader_view_format(options.view_format);
        if settings.kind() == TextureKind::Texture2D && options.multisampling.is_multisampled() {
            settings.set_multisampling(options.multisampling);
        }

        let group = image.format().info().group();
        if options.binding.contains(TextureBinding::UNORDERED_ACCESS)
            && group != BufferFormat::Unknown
        {
            if settings.shader_view_format == BufferFormat::Unknown {
                settings.shader_view_format = settings.format;
            }
            settings.format = group;
        }

        self.create(name, &settings, Some(image), context)
    }

    /// Decode `size` bytes from `reader` with `codec` and create a texture.
    ///
    /// # Errors
    ///
    /// Returns an error if the context is deferred, decoding fails or the
    /// texture cannot be created.
    pub fn from_reader(
        &self,
        name: &str,
        reader: &mut dyn Read,
        size: usize,
        codec: &dyn ImageCodec,
        options: &TextureLoadOptions,
        context: DeviceContext,
    ) -> GraphicsResult<Arc<Texture>> {
        Self::check_creation(name, context)?;
        let image = ImageData::from_reader(reader, size, codec)?;
        self.from_image(name, &image, options, context)
    }

    /// Load an image file with `codec` and create a texture named after it.
    ///
    /// # Errors
    ///
    /// Returns an error if the context is deferred, the file cannot be read
    /// or decoded, or the texture cannot be created.
    pub fn from_file(
        &self,
        path: impl AsRef<Path>,
        codec: &dyn ImageCodec,
        options: &TextureLoadOptions,
        context: DeviceContext,
    ) -> GraphicsResult<Arc<Texture>> {
        let path = path.as_ref();
        let name = path.to_string_lossy();
        Self::check_creation(&name, context)?;
        let image = ImageData::from_file(path, codec)?;
        self.from_image(&name, &image, options, context)
    }

    /// Get the built-in logo texture, creating it on first use.
    ///
    /// The logo is always created on the immediate context; deferred contexts
    /// receive the same texture.
    ///
    /// # Errors
    ///
    /// Returns an error if the logo cannot be created.
    pub fn logo(&self, context: DeviceContext) -> GraphicsResult<Arc<Texture>> {
        let mut logo = self.logo.lock();
        if let Some(texture) = logo.as_ref() {
            return Ok(Arc::clone(texture));
        }
        if context.is_deferred() {
            log::debug!(
                "TextureFactory: creating the logo for {:?} on the immediate context",
                context
            );
        }

        let texture = self.from_image(
            LOGO_NAME,
            &logo_image()?,
            &TextureLoadOptions::default().with_usage(TextureUsage::Immutable),
            DeviceContext::Immediate,
        )?;
        *logo = Some(Arc::clone(&texture));
        Ok(texture)
    }
}

static_assertions::assert_impl_all!(TextureFactory: Send, Sync);

/// Draw the logo: a red disc with a lighter rim on a transparent background.
fn logo_image() -> GraphicsResult<ImageData> {
    let mut image = ImageData::new(ImageSettings::new_2d(
        LOGO_SIZE,
        LOGO_SIZE,
        BufferFormat::R8G8B8A8Unorm,
    ))?;

    let center = (LOGO_SIZE as f32 - 1.0) / 2.0;
    for (index, pixel) in image.as_bytes_mut().chunks_exact_mut(4).enumerate() {
        let x = (index as u32 % LOGO_SIZE) as f32 - center;
        let y = (index as u32 / LOGO_SIZE) as f32 - center;
        let radius = (x * x + y * y).sqrt() / center;
        if radius > 1.0 {
            continue;
        }
        let shade = 0.6 + 0.4 * radius;
        pixel.copy_from_slice(&[
            (200.0 * shade) as u8,
            (30.0 * shade) as u8,
            (60.0 * shade) as u8,
            255,
        ]);
    }

    Ok(image)
}
