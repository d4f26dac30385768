//! Graphics device abstraction.
//!
//! A [`GraphicsDevice`] owns native texture objects and views and executes
//! copy, update, map and resolve commands on a [`DeviceContext`]. Texture
//! resources talk to the device only through this trait, so tests can run
//! against the in-memory [`DummyDevice`](crate::DummyDevice).

use bitflags::bitflags;
use redlilium_core::image::{BufferFormat, SubresourceData};

use crate::error::GraphicsResult;
use crate::types::{DeviceContext, LockFlags, TextureBox, TextureSettings, ViewDescriptor};

/// Shader model tier of a device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub enum FeatureTier {
    /// Shader model 4.0.
    Sm4,
    /// Shader model 4.1: cube map arrays.
    Sm41,
    /// Shader model 5.0: unordered access views.
    #[default]
    Sm5,
}

/// Capabilities of a graphics device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DeviceCapabilities {
    /// Shader model tier.
    pub tier: FeatureTier,
    /// Maximum width and height of 1D and 2D textures.
    pub max_texture_dimension: u32,
    /// Maximum width, height and depth of 3D textures.
    pub max_texture_dimension_3d: u32,
    /// Maximum array count of 1D and 2D textures.
    pub max_array_count: u32,
    /// Whether sub-resources can be copied between different format groups.
    pub copy_across_groups: bool,
}

impl DeviceCapabilities {
    /// Get the standard limits for `tier`.
    pub fn for_tier(tier: FeatureTier) -> Self {
        Self {
            tier,
            max_texture_dimension: match tier {
                FeatureTier::Sm4 | FeatureTier::Sm41 => 8192,
                FeatureTier::Sm5 => 16384,
            },
            max_texture_dimension_3d: 2048,
            max_array_count: 2048,
            copy_across_groups: tier >= FeatureTier::Sm41,
        }
    }
}

impl Default for DeviceCapabilities {
    fn default() -> Self {
        Self::for_tier(FeatureTier::default())
    }
}

bitflags! {
    /// What a device supports for one format.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct FormatSupport: u32 {
        const TEXTURE1D = 1 << 0;
        const TEXTURE2D = 1 << 1;
        const TEXTURE3D = 1 << 2;
        const TEXTURE_CUBE = 1 << 3;
        const MIP = 1 << 4;
        const SHADER_SAMPLE = 1 << 5;
        const RENDER_TARGET = 1 << 6;
        const DEPTH_STENCIL = 1 << 7;
        const MULTISAMPLE_RENDER_TARGET = 1 << 8;
        const MULTISAMPLE_RESOLVE = 1 << 9;
        const UNORDERED_ACCESS = 1 << 10;
    }
}

/// Handle to a native texture object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TextureHandle(u64);

impl TextureHandle {
    pub fn new(raw: u64) -> Self {
        Self(raw)
    }

    pub fn raw(&self) -> u64 {
        self.0
    }
}

/// Handle to a native texture view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ViewHandle(u64);

impl ViewHandle {
    pub fn new(raw: u64) -> Self {
        Self(raw)
    }

    pub fn raw(&self) -> u64 {
        self.0
    }
}

/// Descriptor for creating a native texture.
///
/// The settings are validated: mip count resolved, array count clamped.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TextureDescriptor {
    /// Debug label for the texture.
    pub label: Option<String>,
    pub settings: TextureSettings,
}

impl TextureDescriptor {
    pub fn new(settings: TextureSettings) -> Self {
        Self {
            label: None,
            settings,
        }
    }

    /// Set the debug label.
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    /// Number of sub-resources: mip count × array count.
    pub fn subresource_count(&self) -> u32 {
        self.settings.mip_count * self.settings.array_count()
    }
}

/// CPU access mode of a mapped sub-resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MapMode {
    Read,
    Write,
    ReadWrite,
    WriteDiscard,
    WriteNoOverwrite,
}

impl MapMode {
    /// Translate validated lock flags into a map mode.
    pub fn from_lock_flags(flags: LockFlags) -> Self {
        if flags.contains(LockFlags::DISCARD) {
            Self::WriteDiscard
        } else if flags.contains(LockFlags::NO_OVERWRITE) {
            Self::WriteNoOverwrite
        } else if flags.contains(LockFlags::READ | LockFlags::WRITE) {
            Self::ReadWrite
        } else if flags.contains(LockFlags::READ) {
            Self::Read
        } else {
            Self::Write
        }
    }

    /// Returns true if the mapped data must be written back on unmap.
    pub fn is_write(&self) -> bool {
        !matches!(self, Self::Read)
    }
}

/// A mapped sub-resource: a CPU copy of its data and its pitches.
///
/// Write modes hand the (possibly modified) data back on unmap.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MappedSubresource {
    pub data: Vec<u8>,
    pub row_pitch: u32,
    pub slice_pitch: u32,
}

/// A region copy between two sub-resources.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SubresourceCopy {
    pub source: TextureHandle,
    pub source_subresource: u32,
    /// Region of the source, already clipped to both resources.
    pub source_box: TextureBox,
    pub dest: TextureHandle,
    pub dest_subresource: u32,
    pub dest_x: u32,
    pub dest_y: u32,
    pub dest_z: u32,
}

/// A graphics device: creates native textures and views and executes
/// commands against them.
pub trait GraphicsDevice: Send + Sync + std::fmt::Debug {
    /// Get the device name.
    fn name(&self) -> &str;

    /// Get the device capabilities.
    fn capabilities(&self) -> &DeviceCapabilities;

    /// Get what the device supports for `format`.
    fn format_support(&self, format: BufferFormat) -> FormatSupport;

    /// Create a texture, optionally filled with one entry per sub-resource
    /// in `mip + array * mip_count` order.
    ///
    /// # Errors
    ///
    /// Returns an error if the device cannot create the texture.
    fn create_texture(
        &self,
        descriptor: &TextureDescriptor,
        initial: Option<&[SubresourceData<'_>]>,
    ) -> GraphicsResult<TextureHandle>;

    /// Destroy a texture. Unknown handles are ignored.
    fn destroy_texture(&self, texture: TextureHandle);

    /// Create a view of a texture.
    ///
    /// # Errors
    ///
    /// Returns an error if the texture does not exist or the view is invalid.
    fn create_view(
        &self,
        texture: TextureHandle,
        descriptor: &ViewDescriptor,
    ) -> GraphicsResult<ViewHandle>;

    /// Destroy a view. Unknown handles are ignored.
    fn destroy_view(&self, view: ViewHandle);

    /// Map a sub-resource for CPU access.
    ///
    /// # Errors
    ///
    /// Returns an error if the sub-resource does not exist or is already mapped.
    fn map(
        &self,
        context: DeviceContext,
        texture: TextureHandle,
        subresource: u32,
        mode: MapMode,
    ) -> GraphicsResult<MappedSubresource>;

    /// Unmap a sub-resource, storing `written` when the map mode allowed writes.
    ///
    /// # Errors
    ///
    /// Returns an error if the sub-resource is not mapped.
    fn unmap(
        &self,
        context: DeviceContext,
        texture: TextureHandle,
        subresource: u32,
        written: Option<&[u8]>,
    ) -> GraphicsResult<()>;

    /// Copy a region between two sub-resources.
    ///
    /// # Errors
    ///
    /// Returns an error if either sub-resource does not exist.
    fn copy_subresource_region(
        &self,
        context: DeviceContext,
        copy: &SubresourceCopy,
    ) -> GraphicsResult<()>;

    /// Write CPU data into a region of a sub-resource.
    ///
    /// # Errors
    ///
    /// Returns an error if the sub-resource does not exist or `data` is too short.
    fn update_subresource(
        &self,
        context: DeviceContext,
        texture: TextureHandle,
        subresource: u32,
        dest_box: &TextureBox,
        data: SubresourceData<'_>,
    ) -> GraphicsResult<()>;

    /// Resolve a multisampled sub-resource into a single sampled one.
    ///
    /// # Errors
    ///
    /// Returns an error if either sub-resource does not exist.
    #[allow(clippy::too_many_arguments)]
    fn resolve_subresource(
        &self,
        context: DeviceContext,
        dest: TextureHandle,
        dest_subresource: u32,
        source: TextureHandle,
        source_subresource: u32,
        format: BufferFormat,
    ) -> GraphicsResult<()>;
}
