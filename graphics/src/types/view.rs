//! Texture view descriptors.

use redlilium_core::image::BufferFormat;

/// Pipeline binding a view is created for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ViewKind {
    ShaderResource,
    RenderTarget,
    UnorderedAccess,
    DepthStencil,
}

/// Parameters of a texture view: format, mip range and array range.
///
/// For 3D textures the array range is unused and stored as `u16::MAX`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ViewDescriptor {
    pub kind: ViewKind,
    pub format: BufferFormat,
    pub first_mip: u32,
    pub mip_count: u32,
    pub first_array: u32,
    pub array_count: u32,
}

/// Key identifying a cached view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ViewKey {
    pub kind: ViewKind,
    /// Format, mip range and array range packed into 64 bits.
    pub packed: u64,
}

impl ViewDescriptor {
    /// Array field value stored for volume textures.
    pub const VOLUME_ARRAY: u32 = u16::MAX as u32;

    pub fn new(kind: ViewKind, format: BufferFormat) -> Self {
        Self {
            kind,
            format,
            first_mip: 0,
            mip_count: 1,
            first_array: 0,
            array_count: 1,
        }
    }

    pub fn with_mips(mut self, first_mip: u32, mip_count: u32) -> Self {
        self.first_mip = first_mip;
        self.mip_count = mip_count;
        self
    }

    pub fn with_arrays(mut self, first_array: u32, array_count: u32) -> Self {
        self.first_array = first_array;
        self.array_count = array_count;
        self
    }

    /// Mark the view as belonging to a volume texture.
    pub fn for_volume(self) -> Self {
        self.with_arrays(Self::VOLUME_ARRAY, Self::VOLUME_ARRAY)
    }

    /// Get the cache key of the view.
    ///
    /// Layout, high to low: format (16 bits), first mip (8), mip count (8),
    /// first array (16), array count (16).
    pub fn key(&self) -> ViewKey {
        let packed = (u64::from(self.format.to_raw()) & 0xFFFF) << 48
            | (u64::from(self.first_mip) & 0xFF) << 40
            | (u64::from(self.mip_count) & 0xFF) << 32
            | (u64::from(self.first_array) & 0xFFFF) << 16
            | (u64::from(self.array_count) & 0xFFFF);
        ViewKey {
            kind: self.kind,
            packed,
        }
    }
}
