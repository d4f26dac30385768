//! Texture resources.
//!
//! A [`Texture`] owns one native texture object plus the caches of its views
//! and open locks. Textures are created through the
//! [`TextureFactory`](crate::TextureFactory), which validates their settings
//! against the device first.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use parking_lot::RwLock;
use redlilium_core::image::{
    mip_extent, BufferFormat, FormatInfo, ImageBuffer, ImageData, SubresourceData,
};

use crate::accounting::ResourceAccounting;
use crate::device::{
    FeatureTier, GraphicsDevice, SubresourceCopy, TextureDescriptor, TextureHandle,
};
use crate::error::{GraphicsError, GraphicsResult};
use crate::types::{
    DeviceContext, LockFlags, TextureBinding, TextureBox, TextureKind, TextureSettings,
    TextureUsage, ViewDescriptor, ViewKind,
};

use super::lock::{LockCache, LockKey, LockTarget, TextureLock};
use super::view::TextureView;
use super::view_cache::ViewCache;

/// Source and destination of [`Texture::copy_subresource`].
///
/// # Example
///
/// ```
/// use redlilium_graphics::{CopyRegion, TextureBox};
///
/// let region = CopyRegion::new()
///     .with_source_box(TextureBox::new_2d(0, 0, 20, 20))
///     .with_dest_offset(-10, 0, 0);
/// assert_eq!(region.dest_x, -10);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct CopyRegion {
    /// Region of the source mip level, `None` for the whole level.
    pub source_box: Option<TextureBox>,
    pub source_array: u32,
    pub source_mip: u32,
    pub dest_array: u32,
    pub dest_mip: u32,
    pub dest_x: i32,
    pub dest_y: i32,
    pub dest_z: i32,
    /// Skip clipping. The caller guarantees that the region fits both
    /// sub-resources.
    pub unsafe_copy: bool,
}

impl CopyRegion {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_source_box(mut self, source_box: TextureBox) -> Self {
        self.source_box = Some(source_box);
        self
    }

    pub fn with_source(mut self, array: u32, mip: u32) -> Self {
        self.source_array = array;
        self.source_mip = mip;
        self
    }

    pub fn with_dest(mut self, array: u32, mip: u32) -> Self {
        self.dest_array = array;
        self.dest_mip = mip;
        self
    }

    pub fn with_dest_offset(mut self, x: i32, y: i32, z: i32) -> Self {
        self.dest_x = x;
        self.dest_y = y;
        self.dest_z = z;
        self
    }

    pub fn with_unsafe_copy(mut self, unsafe_copy: bool) -> Self {
        self.unsafe_copy = unsafe_copy;
        self
    }
}

/// A texture resource on a graphics device.
///
/// Textures are shared through [`Arc`] and are safe to use from several
/// threads. Dropping the last reference force-releases every open lock,
/// destroys every cached view and then the native texture, in that order.
pub struct Texture {
    device: Arc<dyn GraphicsDevice>,
    accounting: Arc<dyn ResourceAccounting>,
    name: String,
    settings: TextureSettings,
    info: FormatInfo,
    size_in_bytes: u64,
    handle: RwLock<Option<TextureHandle>>,
    views: ViewCache,
    locks: LockCache,
    registered: AtomicBool,
}

impl std::fmt::Debug for Texture {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Texture")
            .field("name", &self.name)
            .field("settings", &self.settings)
            .field("size_in_bytes", &self.size_in_bytes)
            .field("handle", &self.handle())
            .field("views", &self.views.len())
            .field("locks", &self.locks.len())
            .finish()
    }
}

impl Texture {
    /// Create an uninitialized texture from validated settings.
    pub(crate) fn new(
        device: Arc<dyn GraphicsDevice>,
        accounting: Arc<dyn ResourceAccounting>,
        name: impl Into<String>,
        settings: TextureSettings,
    ) -> GraphicsResult<Self> {
        let samples = u64::from(settings.multisampling().count.max(1));
        let size_in_bytes = settings.image_settings().size_in_bytes()? as u64 * samples;

        Ok(Self {
            views: ViewCache::new(Arc::clone(&device)),
            locks: LockCache::new(Arc::clone(&device)),
            device,
            accounting,
            name: name.into(),
            info: FormatInfo::new(settings.format),
            settings,
            size_in_bytes,
            handle: RwLock::new(None),
            registered: AtomicBool::new(false),
        })
    }

    /// Create the native texture, filled from `initial` when provided.
    ///
    /// Creates the default shader view when the texture is bound as a shader
    /// resource, then reports the texture to the accounting sink. If a step
    /// fails after the native texture exists, it is destroyed again before
    /// the error is returned.
    ///
    /// # Errors
    ///
    /// Returns an error if `initial` does not match the texture, or if the
    /// native texture or its default view cannot be created.
    pub(crate) fn initialize(&self, initial: Option<&ImageData>) -> GraphicsResult<()> {
        let handle = self.create_native(initial)?;
        *self.handle.write() = Some(handle);

        if self.has_default_view() {
            if let Err(err) = self.default_shader_view() {
                self.views.clear();
                if let Some(handle) = self.handle.write().take() {
                    self.device.destroy_texture(handle);
                }
                return Err(err);
            }
        }

        self.accounting.resource_created(self.size_in_bytes);
        self.registered.store(true, Ordering::Release);
        log::debug!(
            "Texture '{}': created {:?} {}x{}x{} ({} mips, {} arrays, {:?}, {} bytes)",
            self.name,
            self.settings.kind(),
            self.width(),
            self.height(),
            self.depth(),
            self.mip_count(),
            self.array_count(),
            self.format(),
            self.size_in_bytes
        );
        Ok(())
    }

    fn create_native(&self, initial: Option<&ImageData>) -> GraphicsResult<TextureHandle> {
        if let Some(image) = initial {
            validate_initial_data(&self.settings, image)?;
        }
        let subresources: Option<Vec<SubresourceData<'_>>> =
            initial.map(|image| image.subresources().collect());
        let descriptor = TextureDescriptor::new(self.settings).with_label(self.name.as_str());
        self.device
            .create_texture(&descriptor, subresources.as_deref())
    }

    fn has_default_view(&self) -> bool {
        self.binding().contains(TextureBinding::SHADER_RESOURCE)
            && self.usage() != TextureUsage::Staging
    }

    /// Replace the native texture, keeping the texture's views.
    ///
    /// Open locks are force-released, view handles are released, the native
    /// texture is recreated from `initial` and every cached view is recreated
    /// on it.
    ///
    /// # Errors
    ///
    /// Returns an error if `initial` does not match the texture or the device
    /// fails to create the texture or a view.
    pub fn reinitialize(&self, initial: Option<&ImageData>) -> GraphicsResult<()> {
        if let Some(image) = initial {
            validate_initial_data(&self.settings, image)?;
        }

        self.locks.unlock_all();
        self.views.release_resources();
        if let Some(old) = self.handle.write().take() {
            self.device.destroy_texture(old);
        }

        let handle = self.create_native(initial)?;
        *self.handle.write() = Some(handle);
        self.views.initialize_resources(handle)?;
        log::debug!("Texture '{}': reinitialized", self.name);
        Ok(())
    }

    // ========================================================================
    // Accessors
    // ========================================================================

    /// Get the texture name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Get the device that owns the texture.
    pub fn device(&self) -> &Arc<dyn GraphicsDevice> {
        &self.device
    }

    /// Get the validated texture settings.
    pub fn settings(&self) -> &TextureSettings {
        &self.settings
    }

    pub fn kind(&self) -> TextureKind {
        self.settings.kind()
    }

    pub fn format(&self) -> BufferFormat {
        self.settings.format
    }

    /// Get information about the texture format.
    pub fn format_info(&self) -> &FormatInfo {
        &self.info
    }

    pub fn width(&self) -> u32 {
        self.settings.width()
    }

    pub fn height(&self) -> u32 {
        self.settings.height()
    }

    pub fn depth(&self) -> u32 {
        self.settings.depth()
    }

    pub fn array_count(&self) -> u32 {
        self.settings.array_count()
    }

    pub fn mip_count(&self) -> u32 {
        self.settings.mip_count
    }

    pub fn usage(&self) -> TextureUsage {
        self.settings.usage
    }

    pub fn binding(&self) -> TextureBinding {
        self.settings.binding
    }

    pub fn is_multisampled(&self) -> bool {
        self.settings.is_multisampled()
    }

    /// Get the number of bytes the texture occupies.
    pub fn size_in_bytes(&self) -> u64 {
        self.size_in_bytes
    }

    /// Get the native texture handle, `None` before initialization.
    pub fn handle(&self) -> Option<TextureHandle> {
        *self.handle.read()
    }

    /// Get the view cache.
    pub fn views(&self) -> &ViewCache {
        &self.views
    }

    /// Get the lock cache.
    pub fn locks(&self) -> &LockCache {
        &self.locks
    }

    /// Get the size of mip level `mip` as `(width, height, depth)`.
    pub fn mip_size(&self, mip: u32) -> (u32, u32, u32) {
        let depth = if self.kind() == TextureKind::Texture3D {
            mip_extent(self.depth(), mip)
        } else {
            1
        };
        (
            mip_extent(self.width(), mip),
            mip_extent(self.height(), mip),
            depth,
        )
    }

    /// Get the device index of sub-resource `(mip, array)`.
    pub fn subresource_index(&self, mip: u32, array: u32) -> u32 {
        mip + array * self.mip_count()
    }

    fn require_handle(&self) -> GraphicsResult<TextureHandle> {
        self.handle().ok_or_else(|| {
            GraphicsError::InvalidState(format!("texture '{}' has no device object", self.name))
        })
    }

    fn check_indices(&self, mip: u32, array: u32) -> GraphicsResult<()> {
        if mip >= self.mip_count() {
            return Err(GraphicsError::index("mip_level", mip, self.mip_count()));
        }
        if array >= self.array_count() {
            return Err(GraphicsError::index("array_index", array, self.array_count()));
        }
        Ok(())
    }

    // ========================================================================
    // Locking
    // ========================================================================

    /// Lock sub-resource `(mip, array)` for CPU access.
    ///
    /// Locking an already locked sub-resource on the same context returns the
    /// open lock. Out of range indices are clamped to the last mip level and
    /// array index; volumes always lock array index 0.
    ///
    /// # Errors
    ///
    /// Returns an error if the texture is not dynamic or staging, is bound as
    /// a depth/stencil buffer, or the flags do not suit its usage:
    /// `READ` needs a staging texture, `DISCARD` a dynamic one and excludes
    /// `READ`. `NO_OVERWRITE` on a staging texture is treated as `WRITE`.
    pub fn lock(
        &self,
        flags: LockFlags,
        array: u32,
        mip: u32,
        context: DeviceContext,
    ) -> GraphicsResult<Arc<TextureLock>> {
        let usage = self.usage();
        if !matches!(usage, TextureUsage::Dynamic | TextureUsage::Staging) {
            return Err(GraphicsError::InvalidState(format!(
                "texture '{}' has {:?} usage, only dynamic and staging textures can be locked",
                self.name, usage
            )));
        }
        if self.binding().contains(TextureBinding::DEPTH_STENCIL) {
            return Err(GraphicsError::FeatureNotSupported(
                "depth/stencil textures cannot be locked".to_string(),
            ));
        }
        if flags.contains(LockFlags::READ) && usage != TextureUsage::Staging {
            return Err(GraphicsError::InvalidState(
                "only staging textures can be locked for reading".to_string(),
            ));
        }

        let mut flags = flags;
        if flags.contains(LockFlags::DISCARD) {
            if usage != TextureUsage::Dynamic {
                return Err(GraphicsError::InvalidState(
                    "only dynamic textures can be locked with discard".to_string(),
                ));
            }
            if flags.contains(LockFlags::READ) {
                return Err(GraphicsError::InvalidParameter(
                    "discard cannot be combined with read".to_string(),
                ));
            }
        }
        if flags.contains(LockFlags::NO_OVERWRITE) && usage != TextureUsage::Dynamic {
            flags.remove(LockFlags::NO_OVERWRITE);
            flags.insert(LockFlags::WRITE);
        }
        if flags.is_empty() {
            return Err(GraphicsError::InvalidParameter(
                "lock flags must request read or write access".to_string(),
            ));
        }

        let last_mip = self.mip_count() - 1;
        let last_array = self.array_count() - 1;
        if mip > last_mip || (self.kind() != TextureKind::Texture3D && array > last_array) {
            log::warn!(
                "Texture '{}': lock of mip {} array {} clamped to mip {} array {}",
                self.name,
                mip,
                array,
                mip.min(last_mip),
                array.min(last_array)
            );
        }
        let mip = mip.min(last_mip);
        let array = if self.kind() == TextureKind::Texture3D {
            0
        } else {
            array.min(last_array)
        };

        let (width, height, depth) = self.mip_size(mip);
        let target = LockTarget {
            texture: self.require_handle()?,
            subresource: self.subresource_index(mip, array),
            width,
            height,
            depth,
            format: self.format(),
        };
        self.locks.lock(
            target,
            LockKey {
                context,
                mip,
                array,
            },
            flags,
        )
    }

    // ========================================================================
    // Copies and updates
    // ========================================================================

    fn check_copy_formats(&self, source: &Texture) -> GraphicsResult<()> {
        if source.format() == self.format() || source.info.is_same_group(&self.info) {
            return Ok(());
        }
        if self.device.capabilities().copy_across_groups
            && source.info.bit_depth() == self.info.bit_depth()
            && source.info.is_compressed() == self.info.is_compressed()
        {
            return Ok(());
        }
        Err(GraphicsError::FeatureNotSupported(format!(
            "cannot copy {:?} data into a {:?} texture",
            source.format(),
            self.format()
        )))
    }

    fn check_writable(&self) -> GraphicsResult<()> {
        if self.usage() == TextureUsage::Immutable {
            return Err(GraphicsError::InvalidState(format!(
                "texture '{}' is immutable",
                self.name
            )));
        }
        Ok(())
    }

    fn check_copy_source(source: &Texture) -> GraphicsResult<()> {
        if source.usage() == TextureUsage::Immutable {
            return Err(GraphicsError::InvalidState(format!(
                "texture '{}' is immutable and cannot be copied from",
                source.name
            )));
        }
        Ok(())
    }

    /// Copy a region of a `source` sub-resource into this texture.
    ///
    /// Unless `region.unsafe_copy` is set, the source box is clipped to the
    /// source mip level and to the destination. A negative destination offset
    /// moves the start of the source box by the same amount. When nothing is
    /// left to copy the call does nothing.
    ///
    /// With `region.unsafe_copy` the source box is passed to the device as
    /// given. Negative destination offsets are still clamped to 0, since the
    /// device addresses destinations with unsigned offsets.
    ///
    /// # Errors
    ///
    /// Returns an error if either texture is immutable, an index is out of
    /// range, the formats are in different groups and the device cannot copy
    /// across groups, or source and destination are the same sub-resource.
    pub fn copy_subresource(
        &self,
        source: &Texture,
        region: &CopyRegion,
        context: DeviceContext,
    ) -> GraphicsResult<()> {
        self.check_writable()?;
        Self::check_copy_source(source)?;
        self.check_copy_formats(source)?;
        source.check_indices(region.source_mip, region.source_array)?;
        self.check_indices(region.dest_mip, region.dest_array)?;

        let source_index = source.subresource_index(region.source_mip, region.source_array);
        let dest_index = self.subresource_index(region.dest_mip, region.dest_array);
        if std::ptr::eq(self, source) && source_index == dest_index {
            return Err(GraphicsError::InvalidParameter(
                "source and destination sub-resources are the same".to_string(),
            ));
        }

        let (sw, sh, sd) = source.mip_size(region.source_mip);
        let source_box = region
            .source_box
            .unwrap_or_else(|| TextureBox::from_size(sw, sh, sd));

        let copy = if region.unsafe_copy {
            SubresourceCopy {
                source: source.require_handle()?,
                source_subresource: source_index,
                source_box,
                dest: self.require_handle()?,
                dest_subresource: dest_index,
                dest_x: region.dest_x.max(0) as u32,
                dest_y: region.dest_y.max(0) as u32,
                dest_z: region.dest_z.max(0) as u32,
            }
        } else {
            let (dw, dh, dd) = self.mip_size(region.dest_mip);
            let clipped = source_box.clamp_to(sw, sh, sd);
            let Some((x, width, dest_x)) = clip_axis(clipped.x, clipped.width, region.dest_x, dw)
            else {
                return Ok(());
            };
            let Some((y, height, dest_y)) =
                clip_axis(clipped.y, clipped.height, region.dest_y, dh)
            else {
                return Ok(());
            };
            let Some((z, depth, dest_z)) = clip_axis(clipped.z, clipped.depth, region.dest_z, dd)
            else {
                return Ok(());
            };

            SubresourceCopy {
                source: source.require_handle()?,
                source_subresource: source_index,
                source_box: TextureBox::new(x, y, z, width, height, depth),
                dest: self.require_handle()?,
                dest_subresource: dest_index,
                dest_x,
                dest_y,
                dest_z,
            }
        };

        self.device.copy_subresource_region(context, &copy)
    }

    /// Copy every sub-resource of `source` into this texture.
    ///
    /// # Errors
    ///
    /// Returns an error if either texture is immutable, `source` is this
    /// texture, the shapes differ, or the formats cannot be copied.
    pub fn copy_from(&self, source: &Texture, context: DeviceContext) -> GraphicsResult<()> {
        self.check_writable()?;
        Self::check_copy_source(source)?;
        if std::ptr::eq(self, source) {
            return Err(GraphicsError::InvalidParameter(
                "cannot copy a texture onto itself".to_string(),
            ));
        }
        let same_shape = source.kind() == self.kind()
            && source.width() == self.width()
            && source.height() == self.height()
            && source.depth() == self.depth()
            && source.array_count() == self.array_count()
            && source.mip_count() == self.mip_count()
            && source.settings.multisampling() == self.settings.multisampling();
        if !same_shape {
            return Err(GraphicsError::InvalidParameter(format!(
                "texture '{}' does not have the shape of texture '{}'",
                source.name, self.name
            )));
        }
        self.check_copy_formats(source)?;

        let source_handle = source.require_handle()?;
        let dest_handle = self.require_handle()?;
        for array in 0..self.array_count() {
            for mip in 0..self.mip_count() {
                let (width, height, depth) = self.mip_size(mip);
                let index = self.subresource_index(mip, array);
                self.device.copy_subresource_region(
                    context,
                    &SubresourceCopy {
                        source: source_handle,
                        source_subresource: index,
                        source_box: TextureBox::from_size(width, height, depth),
                        dest: dest_handle,
                        dest_subresource: index,
                        dest_x: 0,
                        dest_y: 0,
                        dest_z: 0,
                    },
                )?;
            }
        }
        Ok(())
    }

    /// Write `buffer` into a region of sub-resource `(mip, array)`.
    ///
    /// `dest_box` defaults to the size of the buffer at the origin. The box
    /// is clamped to the mip level and to the buffer, and covers one depth
    /// slice.
    ///
    /// # Errors
    ///
    /// Returns an error if the texture is bound as a depth/stencil buffer,
    /// has dynamic or immutable usage, is multisampled, an index is out of
    /// range, or the buffer format is not in the texture's group.
    pub fn update_subresource(
        &self,
        buffer: &ImageBuffer<'_>,
        dest_box: Option<TextureBox>,
        array: u32,
        mip: u32,
        context: DeviceContext,
    ) -> GraphicsResult<()> {
        if self.binding().contains(TextureBinding::DEPTH_STENCIL) {
            return Err(GraphicsError::FeatureNotSupported(
                "depth/stencil textures cannot be updated from the CPU".to_string(),
            ));
        }
        match self.usage() {
            TextureUsage::Dynamic | TextureUsage::Immutable => {
                return Err(GraphicsError::InvalidState(format!(
                    "texture '{}' has {:?} usage and cannot be updated, use a lock instead",
                    self.name,
                    self.usage()
                )));
            }
            TextureUsage::Default | TextureUsage::Staging => {}
        }
        if self.is_multisampled() {
            return Err(GraphicsError::FeatureNotSupported(
                "multisampled textures cannot be updated from the CPU".to_string(),
            ));
        }
        if buffer.format() != self.format() && !buffer.format().info().is_same_group(&self.info) {
            return Err(GraphicsError::InvalidParameter(format!(
                "cannot update a {:?} texture from a {:?} buffer",
                self.format(),
                buffer.format()
            )));
        }
        self.check_indices(mip, array)?;

        let (width, height, depth) = self.mip_size(mip);
        let mut region = dest_box
            .unwrap_or_else(|| TextureBox::new_2d(0, 0, buffer.width(), buffer.height()))
            .clamp_to(width, height, depth);
        region.width = region.width.min(buffer.width());
        region.height = region.height.min(buffer.height());
        region.depth = region.depth.min(1);
        if region.is_empty() {
            return Ok(());
        }

        let pitch = buffer.pitch();
        self.device.update_subresource(
            context,
            self.require_handle()?,
            self.subresource_index(mip, array),
            &region,
            SubresourceData {
                data: buffer.data(),
                row_pitch: pitch.row_pitch,
                slice_pitch: pitch.slice_pitch,
            },
        )
    }

    /// Create a staging copy of this texture.
    ///
    /// # Errors
    ///
    /// Returns an error if the texture is immutable or multisampled, or the
    /// copy cannot be created.
    pub fn staging_copy(&self, context: DeviceContext) -> GraphicsResult<Arc<Texture>> {
        self.check_writable()?;
        if self.is_multisampled() {
            return Err(GraphicsError::FeatureNotSupported(
                "multisampled textures must be resolved before a staging copy".to_string(),
            ));
        }

        let settings = self
            .settings
            .with_usage(TextureUsage::Staging)
            .with_binding(TextureBinding::empty())
            .with_shader_view_format(BufferFormat::Unknown);
        let staging = Arc::new(Texture::new(
            Arc::clone(&self.device),
            Arc::clone(&self.accounting),
            format!("{}_staging", self.name),
            settings,
        )?);
        staging.initialize(None)?;
        staging.copy_from(self, context)?;
        Ok(staging)
    }

    // ========================================================================
    // Views
    // ========================================================================

    fn check_view_format(&self, kind: ViewKind, format: BufferFormat) -> GraphicsResult<()> {
        let info = FormatInfo::new(format);
        if format == BufferFormat::Unknown || info.is_typeless() {
            return Err(GraphicsError::FeatureNotSupported(format!(
                "{:?} views need a typed format, got {:?}",
                kind, format
            )));
        }
        if format != self.format() && !info.is_same_group(&self.info) {
            return Err(GraphicsError::FeatureNotSupported(format!(
                "view format {:?} is not in the group of texture format {:?}",
                format,
                self.format()
            )));
        }
        Ok(())
    }

    /// Resolve a mip and array range. Counts of 0 mean "to the end".
    fn view_range(
        &self,
        descriptor: ViewDescriptor,
        first_mip: u32,
        mip_count: u32,
        first_array: u32,
        array_count: u32,
    ) -> GraphicsResult<ViewDescriptor> {
        if first_mip >= self.mip_count() {
            return Err(GraphicsError::index("first_mip", first_mip, self.mip_count()));
        }
        let mip_count = if mip_count == 0 {
            self.mip_count() - first_mip
        } else {
            mip_count
        };
        if first_mip + mip_count > self.mip_count() {
            return Err(GraphicsError::OutOfRange {
                name: "mip_count",
                value: i64::from(mip_count),
                min: 1,
                max: i64::from(self.mip_count() - first_mip),
            });
        }

        let descriptor = descriptor.with_mips(first_mip, mip_count);
        if self.kind() == TextureKind::Texture3D {
            return Ok(descriptor.for_volume());
        }

        if first_array >= self.array_count() {
            return Err(GraphicsError::index("first_array", first_array, self.array_count()));
        }
        let array_count = if array_count == 0 {
            self.array_count() - first_array
        } else {
            array_count
        };
        if first_array + array_count > self.array_count() {
            return Err(GraphicsError::OutOfRange {
                name: "array_count",
                value: i64::from(array_count),
                min: 1,
                max: i64::from(self.array_count() - first_array),
            });
        }
        Ok(descriptor.with_arrays(first_array, array_count))
    }

    fn view_format_or_default(&self, format: BufferFormat, default: BufferFormat) -> BufferFormat {
        if format == BufferFormat::Unknown {
            default
        } else {
            format
        }
    }

    fn cached_view(&self, descriptor: &ViewDescriptor) -> GraphicsResult<Arc<TextureView>> {
        self.views.get_or_create(self.require_handle()?, descriptor)
    }

    /// Get a shader view of a mip and array range.
    ///
    /// `Unknown` selects the texture's shader view format. A count of 0
    /// selects every level or index from the first one.
    ///
    /// # Errors
    ///
    /// Returns an error if the texture is staging or not bound as a shader
    /// resource, the format is typeless or outside the texture's group, or
    /// a range is out of bounds.
    pub fn shader_view(
        &self,
        format: BufferFormat,
        first_mip: u32,
        mip_count: u32,
        first_array: u32,
        array_count: u32,
    ) -> GraphicsResult<Arc<TextureView>> {
        if self.usage() == TextureUsage::Staging {
            return Err(GraphicsError::FeatureNotSupported(
                "staging textures cannot have shader views".to_string(),
            ));
        }
        if !self.binding().contains(TextureBinding::SHADER_RESOURCE) {
            return Err(GraphicsError::InvalidState(format!(
                "texture '{}' is not bound as a shader resource",
                self.name
            )));
        }
        let format = self.view_format_or_default(format, self.settings.view_format());
        self.check_view_format(ViewKind::ShaderResource, format)?;
        let descriptor = self.view_range(
            ViewDescriptor::new(ViewKind::ShaderResource, format),
            first_mip,
            mip_count,
            first_array,
            array_count,
        )?;
        self.cached_view(&descriptor)
    }

    /// Get the shader view over every mip level and array index.
    ///
    /// # Errors
    ///
    /// See [`shader_view`](Self::shader_view).
    pub fn default_shader_view(&self) -> GraphicsResult<Arc<TextureView>> {
        self.shader_view(BufferFormat::Unknown, 0, 0, 0, 0)
    }

    /// Get a render target view of mip level `mip`.
    ///
    /// # Errors
    ///
    /// Returns an error if the texture is not bound as a render target, the
    /// format is unsuitable or a range is out of bounds.
    pub fn render_target_view(
        &self,
        format: BufferFormat,
        mip: u32,
        first_array: u32,
        array_count: u32,
    ) -> GraphicsResult<Arc<TextureView>> {
        if !self.binding().contains(TextureBinding::RENDER_TARGET) {
            return Err(GraphicsError::InvalidState(format!(
                "texture '{}' is not bound as a render target",
                self.name
            )));
        }
        let format = self.view_format_or_default(format, self.settings.view_format());
        self.check_view_format(ViewKind::RenderTarget, format)?;
        let descriptor = self.view_range(
            ViewDescriptor::new(ViewKind::RenderTarget, format),
            mip,
            1,
            first_array,
            array_count,
        )?;
        self.cached_view(&descriptor)
    }

    /// Get a depth/stencil view of mip level `mip`.
    ///
    /// # Errors
    ///
    /// Returns an error if the texture is not bound as a depth/stencil
    /// buffer, the format has no depth, or a range is out of bounds.
    pub fn depth_stencil_view(
        &self,
        format: BufferFormat,
        mip: u32,
        first_array: u32,
        array_count: u32,
    ) -> GraphicsResult<Arc<TextureView>> {
        if !self.binding().contains(TextureBinding::DEPTH_STENCIL) {
            return Err(GraphicsError::InvalidState(format!(
                "texture '{}' is not bound as a depth/stencil buffer",
                self.name
            )));
        }
        let format = self.view_format_or_default(format, self.format());
        self.check_view_format(ViewKind::DepthStencil, format)?;
        if !FormatInfo::new(format).has_depth() {
            return Err(GraphicsError::FeatureNotSupported(format!(
                "{:?} is not a depth format",
                format
            )));
        }
        let descriptor = self.view_range(
            ViewDescriptor::new(ViewKind::DepthStencil, format),
            mip,
            1,
            first_array,
            array_count,
        )?;
        self.cached_view(&descriptor)
    }

    /// Get an unordered access view of mip level `mip`.
    ///
    /// The view format may also reinterpret the texture through the `R32`
    /// family, as long as the bit depth is unchanged.
    ///
    /// # Errors
    ///
    /// Returns an error if the device is below shader model 5, the texture is
    /// multisampled or not bound for unordered access, the format is
    /// unsuitable, or a range is out of bounds.
    pub fn unordered_access_view(
        &self,
        format: BufferFormat,
        mip: u32,
        first_array: u32,
        array_count: u32,
    ) -> GraphicsResult<Arc<TextureView>> {
        if self.device.capabilities().tier < FeatureTier::Sm5 {
            return Err(GraphicsError::FeatureNotSupported(
                "unordered access views require shader model 5".to_string(),
            ));
        }
        if !self.binding().contains(TextureBinding::UNORDERED_ACCESS) {
            return Err(GraphicsError::InvalidState(format!(
                "texture '{}' is not bound for unordered access",
                self.name
            )));
        }
        if self.is_multisampled() {
            return Err(GraphicsError::FeatureNotSupported(
                "multisampled textures cannot have unordered access views".to_string(),
            ));
        }

        let format = self.view_format_or_default(format, self.settings.view_format());
        let info = FormatInfo::new(format);
        if format == BufferFormat::Unknown || info.is_typeless() {
            return Err(GraphicsError::FeatureNotSupported(format!(
                "unordered access views need a typed format, got {:?}",
                format
            )));
        }
        let compatible = format == self.format()
            || ((info.is_same_group(&self.info) || info.group() == BufferFormat::R32Typeless)
                && info.bit_depth() == self.info.bit_depth());
        if !compatible {
            return Err(GraphicsError::FeatureNotSupported(format!(
                "unordered access format {:?} is not compatible with {:?}",
                format,
                self.format()
            )));
        }

        let descriptor = self.view_range(
            ViewDescriptor::new(ViewKind::UnorderedAccess, format),
            mip,
            1,
            first_array,
            array_count,
        )?;
        self.cached_view(&descriptor)
    }

    // ========================================================================
    // Multisampling
    // ========================================================================

    /// Resolve sub-resource `(source_mip, source_array)` of this multisampled
    /// texture into `(dest_mip, dest_array)` of `dest`.
    ///
    /// `Unknown` resolves with this texture's format. When both textures are
    /// typed their formats and the resolve format must be equal. When both
    /// are typeless they must be equal and the resolve format must be a typed
    /// member of their group. When one is typed and the other typeless the
    /// resolve format must be a typed member of the group they share.
    ///
    /// # Errors
    ///
    /// Returns an error if either texture is not 2D, this texture is not
    /// multisampled, `dest` is multisampled or not of default usage, an index
    /// is out of range, or the formats do not follow the rules above.
    #[allow(clippy::too_many_arguments)]
    pub fn resolve_to(
        &self,
        dest: &Texture,
        resolve_format: BufferFormat,
        source_array: u32,
        source_mip: u32,
        dest_array: u32,
        dest_mip: u32,
        context: DeviceContext,
    ) -> GraphicsResult<()> {
        if self.kind() != TextureKind::Texture2D || dest.kind() != TextureKind::Texture2D {
            return Err(GraphicsError::FeatureNotSupported(
                "only 2D textures can be resolved".to_string(),
            ));
        }
        if !self.is_multisampled() {
            return Err(GraphicsError::InvalidState(format!(
                "texture '{}' is not multisampled",
                self.name
            )));
        }
        if dest.is_multisampled() {
            return Err(GraphicsError::InvalidParameter(format!(
                "resolve destination '{}' is multisampled",
                dest.name
            )));
        }
        if dest.usage() != TextureUsage::Default {
            return Err(GraphicsError::InvalidState(format!(
                "resolve destination '{}' must have default usage",
                dest.name
            )));
        }
        self.check_indices(source_mip, source_array)?;
        dest.check_indices(dest_mip, dest_array)?;

        let resolve_format = if resolve_format == BufferFormat::Unknown {
            self.format()
        } else {
            resolve_format
        };
        check_resolve_formats(&self.info, &dest.info, &FormatInfo::new(resolve_format))?;

        self.device.resolve_subresource(
            context,
            dest.require_handle()?,
            dest.subresource_index(dest_mip, dest_array),
            self.require_handle()?,
            self.subresource_index(source_mip, source_array),
            resolve_format,
        )
    }
}

impl Drop for Texture {
    fn drop(&mut self) {
        self.locks.unlock_all();
        self.views.clear();
        if let Some(handle) = self.handle.get_mut().take() {
            self.device.destroy_texture(handle);
        }
        if self.registered.swap(false, Ordering::AcqRel) {
            self.accounting.resource_destroyed(self.size_in_bytes);
        }
        log::debug!("Texture '{}': destroyed", self.name);
    }
}

static_assertions::assert_impl_all!(Texture: Send, Sync);

/// Clip one axis of a copy. Returns the source start, size and destination
/// offset, or `None` when nothing lands inside the destination.
fn clip_axis(start: i32, size: u32, dest: i32, dest_limit: u32) -> Option<(i32, u32, u32)> {
    let mut start = i64::from(start);
    let mut size = i64::from(size);
    let mut dest = i64::from(dest);
    if dest < 0 {
        start -= dest;
        size += dest;
        dest = 0;
    }
    let limit = i64::from(dest_limit);
    if dest >= limit {
        return None;
    }
    let size = size.min(limit - dest);
    if size <= 0 {
        return None;
    }
    Some((start as i32, size as u32, dest as u32))
}

fn check_resolve_formats(
    source: &FormatInfo,
    dest: &FormatInfo,
    resolve: &FormatInfo,
) -> GraphicsResult<()> {
    let compatible = match (source.is_typeless(), dest.is_typeless()) {
        (false, false) => {
            source.format() == dest.format() && resolve.format() == source.format()
        }
        (true, true) => {
            source.format() == dest.format()
                && !resolve.is_typeless()
                && resolve.is_same_group(source)
        }
        _ => {
            source.is_same_group(dest) && !resolve.is_typeless() && resolve.is_same_group(source)
        }
    };
    if compatible {
        Ok(())
    } else {
        Err(GraphicsError::FeatureNotSupported(format!(
            "cannot resolve {:?} into {:?} as {:?}",
            source.format(),
            dest.format(),
            resolve.format()
        )))
    }
}

/// Check that `image` can fill a texture created with `settings`.
///
/// The image format may be any member of the texture format's group.
pub(crate) fn validate_initial_data(
    settings: &TextureSettings,
    image: &ImageData,
) -> GraphicsResult<()> {
    let format_matches = image.format() == settings.format
        || image.format().info().is_same_group(&settings.format.info());
    if !format_matches {
        return Err(GraphicsError::InvalidParameter(format!(
            "image format {:?} does not match texture format {:?}",
            image.format(),
            settings.format
        )));
    }
    if image.image_type() != settings.image_type() {
        return Err(GraphicsError::InvalidParameter(format!(
            "{:?} image cannot fill a {:?} texture",
            image.image_type(),
            settings.image_type()
        )));
    }
    let same_layout = image.width() == settings.width()
        && image.height() == settings.height()
        && image.depth() == settings.depth()
        && image.array_count() == settings.array_count()
        && image.mip_count() == settings.mip_count;
    if !same_layout {
        return Err(GraphicsError::InvalidParameter(format!(
            "image layout {}x{}x{} ({} arrays, {} mips) does not match the texture",
            image.width(),
            image.height(),
            image.depth(),
            image.array_count(),
            image.mip_count()
        )));
    }
    Ok(())
}
