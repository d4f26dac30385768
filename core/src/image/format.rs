//! Pixel formats and their layout information.
//!
//! [`BufferFormat`] enumerates the Direct3D 11 resource formats (using their
//! DXGI numeric values) and [`FormatInfo`] describes the memory layout of a
//! format: element size, typeless family, compression, sRGB, depth and
//! stencil attributes, plus row/slice pitch computation.

use bitflags::bitflags;

/// Resource data formats, including fully-typed and typeless formats.
///
/// Discriminants match the DXGI format values so that the enum can be passed
/// through to native device layers unchanged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
#[repr(u32)]
#[non_exhaustive]
pub enum BufferFormat {
    /// No format.
    #[default]
    Unknown = 0,

    // 128-bit formats
    R32G32B32A32Typeless = 1,
    R32G32B32A32Float = 2,
    R32G32B32A32Uint = 3,
    R32G32B32A32Sint = 4,

    // 96-bit formats
    R32G32B32Typeless = 5,
    R32G32B32Float = 6,
    R32G32B32Uint = 7,
    R32G32B32Sint = 8,

    // 64-bit formats
    R16G16B16A16Typeless = 9,
    R16G16B16A16Float = 10,
    R16G16B16A16Unorm = 11,
    R16G16B16A16Uint = 12,
    R16G16B16A16Snorm = 13,
    R16G16B16A16Sint = 14,
    R32G32Typeless = 15,
    R32G32Float = 16,
    R32G32Uint = 17,
    R32G32Sint = 18,
    R32G8X24Typeless = 19,
    D32FloatS8X24Uint = 20,
    R32FloatX8X24Typeless = 21,
    X32TypelessG8X24Uint = 22,

    // 32-bit formats
    R10G10B10A2Typeless = 23,
    R10G10B10A2Unorm = 24,
    R10G10B10A2Uint = 25,
    R11G11B10Float = 26,
    R8G8B8A8Typeless = 27,
    R8G8B8A8Unorm = 28,
    R8G8B8A8UnormSrgb = 29,
    R8G8B8A8Uint = 30,
    R8G8B8A8Snorm = 31,
    R8G8B8A8Sint = 32,
    R16G16Typeless = 33,
    R16G16Float = 34,
    R16G16Unorm = 35,
    R16G16Uint = 36,
    R16G16Snorm = 37,
    R16G16Sint = 38,
    R32Typeless = 39,
    D32Float = 40,
    R32Float = 41,
    R32Uint = 42,
    R32Sint = 43,
    R24G8Typeless = 44,
    D24UnormS8Uint = 45,
    R24UnormX8Typeless = 46,
    X24TypelessG8Uint = 47,

    // 16-bit formats
    R8G8Typeless = 48,
    R8G8Unorm = 49,
    R8G8Uint = 50,
    R8G8Snorm = 51,
    R8G8Sint = 52,
    R16Typeless = 53,
    R16Float = 54,
    D16Unorm = 55,
    R16Unorm = 56,
    R16Uint = 57,
    R16Snorm = 58,
    R16Sint = 59,

    // 8-bit formats
    R8Typeless = 60,
    R8Unorm = 61,
    R8Uint = 62,
    R8Snorm = 63,
    R8Sint = 64,
    A8Unorm = 65,

    // Shared exponent and packed formats
    R9G9B9E5SharedExp = 67,
    R8G8B8G8Unorm = 68,
    G8R8G8B8Unorm = 69,

    // Block compressed formats
    Bc1Typeless = 70,
    Bc1Unorm = 71,
    Bc1UnormSrgb = 72,
    Bc2Typeless = 73,
    Bc2Unorm = 74,
    Bc2UnormSrgb = 75,
    Bc3Typeless = 76,
    Bc3Unorm = 77,
    Bc3UnormSrgb = 78,
    Bc4Typeless = 79,
    Bc4Unorm = 80,
    Bc4Snorm = 81,
    Bc5Typeless = 82,
    Bc5Unorm = 83,
    Bc5Snorm = 84,

    // BGR formats
    B5G6R5Unorm = 85,
    B5G5R5A1Unorm = 86,
    B8G8R8A8Unorm = 87,
    B8G8R8X8Unorm = 88,
    R10G10B10XrBiasA2Unorm = 89,
    B8G8R8A8Typeless = 90,
    B8G8R8A8UnormSrgb = 91,
    B8G8R8X8Typeless = 92,
    B8G8R8X8UnormSrgb = 93,

    // Block compressed formats (SM5)
    Bc6hTypeless = 94,
    Bc6hUf16 = 95,
    Bc6hSf16 = 96,
    Bc7Typeless = 97,
    Bc7Unorm = 98,
    Bc7UnormSrgb = 99,

    B4G4R4A4Unorm = 115,
}

impl BufferFormat {
    /// Get the layout information for this format.
    pub fn info(self) -> FormatInfo {
        FormatInfo::new(self)
    }

    /// Returns true if this is [`BufferFormat::Unknown`].
    pub fn is_unknown(self) -> bool {
        self == Self::Unknown
    }

    /// Get the DXGI numeric value of the format.
    pub fn to_raw(self) -> u32 {
        self as u32
    }
}

bitflags! {
    /// Flags that alter how [`FormatInfo::pitch`] computes the row pitch.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct PitchFlags: u32 {
        /// Assume pitch is DWORD aligned instead of byte aligned (legacy DDS files).
        const LEGACY_DWORD = 0x1;
        /// Align the row pitch to 16 bytes.
        const ALIGN_16 = 0x2;
        /// Align the row pitch to 32 bytes.
        const ALIGN_32 = 0x4;
        /// Align the row pitch to 64 bytes.
        const ALIGN_64 = 0x8;
        /// Align the row pitch to 4096 bytes.
        const ALIGN_4K = 0x200;
        /// Override the bit depth with 24 bits per pixel.
        const BPP24 = 0x10000;
        /// Override the bit depth with 16 bits per pixel.
        const BPP16 = 0x20000;
        /// Override the bit depth with 8 bits per pixel.
        const BPP8 = 0x40000;
    }
}

/// Row and slice pitch of one 2D image at a given size.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct PitchLayout {
    /// Number of bytes in one row (or one row of blocks for compressed formats).
    pub row_pitch: u32,
    /// Number of bytes in one 2D slice.
    pub slice_pitch: u32,
    /// Horizontal and vertical block counts for compressed formats.
    pub block_count: Option<(u32, u32)>,
}

impl PitchLayout {
    /// Number of rows stored in the slice: block rows for compressed formats, otherwise `height`.
    pub fn rows(&self, height: u32) -> u32 {
        match self.block_count {
            Some((_, blocks_high)) => blocks_high,
            None => height,
        }
    }
}

/// Layout information about a [`BufferFormat`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FormatInfo {
    format: BufferFormat,
    group: BufferFormat,
    bit_depth: u32,
    size_in_bytes: u32,
    component_count: u32,
    is_typeless: bool,
    is_compressed: bool,
    is_srgb: bool,
    is_packed: bool,
    has_depth: bool,
    has_stencil: bool,
    has_alpha: bool,
}

impl FormatInfo {
    /// Compute the information for `format`.
    ///
    /// For [`BufferFormat::Unknown`] every attribute is zero or false.
    pub fn new(format: BufferFormat) -> Self {
        let bit_depth = bit_depth(format);
        let size_in_bytes = match (format, bit_depth) {
            (BufferFormat::Unknown, _) => 0,
            (_, bits) if bits >= 8 => bits >> 3,
            _ => 1,
        };
        let (has_depth, has_stencil) = depth_state(format);

        Self {
            format,
            group: group(format),
            bit_depth,
            size_in_bytes,
            component_count: component_count(format),
            is_typeless: is_typeless(format),
            is_compressed: is_compressed(format),
            is_srgb: is_srgb(format),
            is_packed: matches!(
                format,
                BufferFormat::R8G8B8G8Unorm | BufferFormat::G8R8G8B8Unorm
            ),
            has_depth,
            has_stencil,
            has_alpha: has_alpha(format),
        }
    }

    /// Get the format described by this information.
    pub fn format(&self) -> BufferFormat {
        self.format
    }

    /// Get the typeless family of the format.
    ///
    /// Two formats with the same group share a bit layout and can be
    /// reinterpreted as one another. [`BufferFormat::Unknown`] means the format
    /// has no family.
    pub fn group(&self) -> BufferFormat {
        self.group
    }

    /// Get the number of bits per element (per block for compressed formats).
    pub fn bit_depth(&self) -> u32 {
        self.bit_depth
    }

    /// Get the number of bytes per element, at least 1 for known formats.
    pub fn size_in_bytes(&self) -> u32 {
        self.size_in_bytes
    }

    /// Get the number of components in the format.
    pub fn component_count(&self) -> u32 {
        self.component_count
    }

    pub fn is_typeless(&self) -> bool {
        self.is_typeless
    }

    pub fn is_compressed(&self) -> bool {
        self.is_compressed
    }

    pub fn is_srgb(&self) -> bool {
        self.is_srgb
    }

    pub fn is_packed(&self) -> bool {
        self.is_packed
    }

    pub fn has_depth(&self) -> bool {
        self.has_depth
    }

    pub fn has_stencil(&self) -> bool {
        self.has_stencil
    }

    pub fn has_alpha(&self) -> bool {
        self.has_alpha
    }

    /// Returns true if both formats share a non-unknown group.
    pub fn is_same_group(&self, other: &FormatInfo) -> bool {
        self.group != BufferFormat::Unknown && self.group == other.group
    }

    /// Compute the row and slice pitch for an image of `width` × `height`.
    ///
    /// Block compressed formats round the size up to whole 4×4 blocks and
    /// report the block counts. Callers are responsible for rejecting
    /// compressed sizes that are not multiples of 4 where that matters.
    pub fn pitch(&self, width: u32, height: u32, flags: PitchFlags) -> PitchLayout {
        if self.is_compressed {
            let bytes_per_block: u64 = match self.format {
                BufferFormat::Bc1Typeless
                | BufferFormat::Bc1Unorm
                | BufferFormat::Bc1UnormSrgb
                | BufferFormat::Bc4Typeless
                | BufferFormat::Bc4Unorm
                | BufferFormat::Bc4Snorm => 8,
                _ => 16,
            };
            let blocks_wide = if width > 0 { (width + 3) / 4 } else { 0 };
            let blocks_high = if height > 0 { (height + 3) / 4 } else { 0 };
            let row_pitch = u64::from(blocks_wide) * bytes_per_block;
            let slice_pitch = row_pitch * u64::from(blocks_high);

            return PitchLayout {
                row_pitch: row_pitch as u32,
                slice_pitch: slice_pitch as u32,
                block_count: Some((blocks_wide, blocks_high)),
            };
        }

        if self.is_packed {
            let row_pitch = ((width + 1) >> 1) << 2;
            return PitchLayout {
                row_pitch,
                slice_pitch: row_pitch * height,
                block_count: None,
            };
        }

        let bits_per_pixel = if flags.contains(PitchFlags::BPP24) {
            24
        } else if flags.contains(PitchFlags::BPP16) {
            16
        } else if flags.contains(PitchFlags::BPP8) {
            8
        } else {
            u64::from(self.bit_depth)
        };

        let bits = u64::from(width) * bits_per_pixel;
        let row_pitch = if flags.contains(PitchFlags::LEGACY_DWORD) {
            ((bits + 31) / 32) * 4
        } else if flags.contains(PitchFlags::ALIGN_4K) {
            ((bits + 32767) / 32768) * 4096
        } else if flags.contains(PitchFlags::ALIGN_64) {
            ((bits + 511) / 512) * 64
        } else if flags.contains(PitchFlags::ALIGN_32) {
            ((bits + 255) / 256) * 32
        } else if flags.contains(PitchFlags::ALIGN_16) {
            ((bits + 127) / 128) * 16
        } else {
            (bits + 7) / 8
        };

        PitchLayout {
            row_pitch: row_pitch as u32,
            slice_pitch: (row_pitch * u64::from(height)) as u32,
            block_count: None,
        }
    }

    /// Compute the number of scan lines stored for an image of `height` pixels.
    pub fn scanlines(&self, height: u32) -> u32 {
        if self.is_compressed {
            ((height + 3) >> 2).max(1)
        } else {
            height
        }
    }
}

impl From<BufferFormat> for FormatInfo {
    fn from(format: BufferFormat) -> Self {
        Self::new(format)
    }
}

// ============================================================================
// Format tables
// ============================================================================

fn bit_depth(format: BufferFormat) -> u32 {
    use BufferFormat as F;

    match format {
        F::Unknown => 0,
        F::R32G32B32A32Typeless
        | F::R32G32B32A32Float
        | F::R32G32B32A32Uint
        | F::R32G32B32A32Sint
        | F::Bc2Typeless
        | F::Bc2Unorm
        | F::Bc2UnormSrgb
        | F::Bc3Typeless
        | F::Bc3Unorm
        | F::Bc3UnormSrgb
        | F::Bc5Typeless
        | F::Bc5Unorm
        | F::Bc5Snorm
        | F::Bc6hTypeless
        | F::Bc6hUf16
        | F::Bc6hSf16
        | F::Bc7Typeless
        | F::Bc7Unorm
        | F::Bc7UnormSrgb => 128,
        F::R32G32B32Typeless | F::R32G32B32Float | F::R32G32B32Uint | F::R32G32B32Sint => 96,
        F::Bc1Typeless
        | F::Bc1Unorm
        | F::Bc1UnormSrgb
        | F::Bc4Typeless
        | F::Bc4Unorm
        | F::Bc4Snorm
        | F::R32G32Typeless
        | F::R32G32Float
        | F::R32G32Uint
        | F::R32G32Sint
        | F::R32G8X24Typeless
        | F::D32FloatS8X24Uint
        | F::R32FloatX8X24Typeless
        | F::X32TypelessG8X24Uint
        | F::R16G16B16A16Typeless
        | F::R16G16B16A16Float
        | F::R16G16B16A16Unorm
        | F::R16G16B16A16Uint
        | F::R16G16B16A16Snorm
        | F::R16G16B16A16Sint => 64,
        F::R32Typeless
        | F::R32Float
        | F::R32Uint
        | F::R32Sint
        | F::D32Float
        | F::R24G8Typeless
        | F::D24UnormS8Uint
        | F::R24UnormX8Typeless
        | F::X24TypelessG8Uint
        | F::R16G16Typeless
        | F::R16G16Float
        | F::R16G16Unorm
        | F::R16G16Uint
        | F::R16G16Snorm
        | F::R16G16Sint
        | F::R10G10B10A2Typeless
        | F::R10G10B10A2Unorm
        | F::R10G10B10A2Uint
        | F::R10G10B10XrBiasA2Unorm
        | F::R11G11B10Float
        | F::R8G8B8A8Typeless
        | F::R8G8B8A8Unorm
        | F::R8G8B8A8UnormSrgb
        | F::R8G8B8A8Uint
        | F::R8G8B8A8Snorm
        | F::R8G8B8A8Sint
        | F::B8G8R8A8Unorm
        | F::B8G8R8X8Unorm
        | F::B8G8R8A8Typeless
        | F::B8G8R8A8UnormSrgb
        | F::B8G8R8X8Typeless
        | F::B8G8R8X8UnormSrgb
        | F::R8G8B8G8Unorm
        | F::G8R8G8B8Unorm
        | F::R9G9B9E5SharedExp => 32,
        F::R16Typeless
        | F::R16Float
        | F::D16Unorm
        | F::R16Unorm
        | F::R16Uint
        | F::R16Snorm
        | F::R16Sint
        | F::R8G8Typeless
        | F::R8G8Unorm
        | F::R8G8Uint
        | F::R8G8Snorm
        | F::R8G8Sint
        | F::B5G5R5A1Unorm
        | F::B5G6R5Unorm
        | F::B4G4R4A4Unorm => 16,
        F::R8Typeless | F::R8Unorm | F::R8Uint | F::R8Snorm | F::R8Sint | F::A8Unorm => 8,
    }
}

fn group(format: BufferFormat) -> BufferFormat {
    use BufferFormat as F;

    match format {
        F::R32G32B32A32Typeless
        | F::R32G32B32A32Float
        | F::R32G32B32A32Uint
        | F::R32G32B32A32Sint => F::R32G32B32A32Typeless,
        F::R32G32B32Typeless | F::R32G32B32Float | F::R32G32B32Uint | F::R32G32B32Sint => {
            F::R32G32B32Typeless
        }
        F::R16G16B16A16Typeless
        | F::R16G16B16A16Float
        | F::R16G16B16A16Unorm
        | F::R16G16B16A16Uint
        | F::R16G16B16A16Snorm
        | F::R16G16B16A16Sint => F::R16G16B16A16Typeless,
        F::R32G32Typeless | F::R32G32Float | F::R32G32Uint | F::R32G32Sint => F::R32G32Typeless,
        F::R32G8X24Typeless
        | F::D32FloatS8X24Uint
        | F::R32FloatX8X24Typeless
        | F::X32TypelessG8X24Uint => F::R32G8X24Typeless,
        F::R10G10B10A2Typeless | F::R10G10B10A2Unorm | F::R10G10B10A2Uint => {
            F::R10G10B10A2Typeless
        }
        F::R8G8B8A8Typeless
        | F::R8G8B8A8Unorm
        | F::R8G8B8A8UnormSrgb
        | F::R8G8B8A8Uint
        | F::R8G8B8A8Snorm
        | F::R8G8B8A8Sint => F::R8G8B8A8Typeless,
        F::R16G16Typeless
        | F::R16G16Float
        | F::R16G16Unorm
        | F::R16G16Uint
        | F::R16G16Snorm
        | F::R16G16Sint => F::R16G16Typeless,
        F::R32Typeless | F::D32Float | F::R32Float | F::R32Uint | F::R32Sint => F::R32Typeless,
        F::R24G8Typeless | F::D24UnormS8Uint | F::R24UnormX8Typeless | F::X24TypelessG8Uint => {
            F::R24G8Typeless
        }
        F::R8G8Typeless | F::R8G8Unorm | F::R8G8Uint | F::R8G8Snorm | F::R8G8Sint => {
            F::R8G8Typeless
        }
        F::R16Typeless
        | F::R16Float
        | F::D16Unorm
        | F::R16Unorm
        | F::R16Uint
        | F::R16Snorm
        | F::R16Sint => F::R16Typeless,
        F::R8Typeless | F::R8Unorm | F::R8Uint | F::R8Snorm | F::R8Sint => F::R8Typeless,
        F::Bc1Typeless | F::Bc1Unorm | F::Bc1UnormSrgb => F::Bc1Typeless,
        F::Bc2Typeless | F::Bc2Unorm | F::Bc2UnormSrgb => F::Bc2Typeless,
        F::Bc3Typeless | F::Bc3Unorm | F::Bc3UnormSrgb => F::Bc3Typeless,
        F::Bc4Typeless | F::Bc4Unorm | F::Bc4Snorm => F::Bc4Typeless,
        F::Bc5Typeless | F::Bc5Unorm | F::Bc5Snorm => F::Bc5Typeless,
        F::Bc6hTypeless | F::Bc6hUf16 | F::Bc6hSf16 => F::Bc6hTypeless,
        F::Bc7Typeless | F::Bc7Unorm | F::Bc7UnormSrgb => F::Bc7Typeless,
        F::B8G8R8A8Typeless | F::B8G8R8A8Unorm | F::B8G8R8A8UnormSrgb => F::B8G8R8A8Typeless,
        F::B8G8R8X8Typeless | F::B8G8R8X8Unorm | F::B8G8R8X8UnormSrgb => F::B8G8R8X8Typeless,
        _ => F::Unknown,
    }
}

fn is_typeless(format: BufferFormat) -> bool {
    use BufferFormat as F;

    matches!(
        format,
        F::R32G32B32A32Typeless
            | F::R32G32B32Typeless
            | F::R16G16B16A16Typeless
            | F::R32G32Typeless
            | F::R32G8X24Typeless
            | F::R10G10B10A2Typeless
            | F::R8G8B8A8Typeless
            | F::R16G16Typeless
            | F::R32Typeless
            | F::R24G8Typeless
            | F::R8G8Typeless
            | F::R16Typeless
            | F::R8Typeless
            | F::Bc1Typeless
            | F::Bc2Typeless
            | F::Bc3Typeless
            | F::Bc4Typeless
            | F::Bc5Typeless
            | F::Bc6hTypeless
            | F::Bc7Typeless
            | F::B8G8R8A8Typeless
            | F::B8G8R8X8Typeless
    )
}

fn is_compressed(format: BufferFormat) -> bool {
    use BufferFormat as F;

    matches!(
        format,
        F::Bc1Typeless
            | F::Bc1Unorm
            | F::Bc1UnormSrgb
            | F::Bc2Typeless
            | F::Bc2Unorm
            | F::Bc2UnormSrgb
            | F::Bc3Typeless
            | F::Bc3Unorm
            | F::Bc3UnormSrgb
            | F::Bc4Typeless
            | F::Bc4Unorm
            | F::Bc4Snorm
            | F::Bc5Typeless
            | F::Bc5Unorm
            | F::Bc5Snorm
            | F::Bc6hTypeless
            | F::Bc6hUf16
            | F::Bc6hSf16
            | F::Bc7Typeless
            | F::Bc7Unorm
            | F::Bc7UnormSrgb
    )
}

fn is_srgb(format: BufferFormat) -> bool {
    use BufferFormat as F;

    matches!(
        format,
        F::R8G8B8A8UnormSrgb
            | F::B8G8R8A8UnormSrgb
            | F::B8G8R8X8UnormSrgb
            | F::Bc1UnormSrgb
            | F::Bc2UnormSrgb
            | F::Bc3UnormSrgb
            | F::Bc7UnormSrgb
    )
}

fn depth_state(format: BufferFormat) -> (bool, bool) {
    match format {
        BufferFormat::D24UnormS8Uint | BufferFormat::D32FloatS8X24Uint => (true, true),
        BufferFormat::D32Float | BufferFormat::D16Unorm => (true, false),
        _ => (false, false),
    }
}

fn has_alpha(format: BufferFormat) -> bool {
    use BufferFormat as F;

    matches!(
        format,
        F::R32G32B32A32Typeless
            | F::R32G32B32A32Float
            | F::R32G32B32A32Uint
            | F::R32G32B32A32Sint
            | F::Bc1Typeless
            | F::Bc1Unorm
            | F::Bc1UnormSrgb
            | F::Bc2Typeless
            | F::Bc2Unorm
            | F::Bc2UnormSrgb
            | F::Bc3Typeless
            | F::Bc3Unorm
            | F::Bc3UnormSrgb
            | F::Bc7Typeless
            | F::Bc7Unorm
            | F::Bc7UnormSrgb
            | F::R16G16B16A16Typeless
            | F::R16G16B16A16Float
            | F::R16G16B16A16Unorm
            | F::R16G16B16A16Uint
            | F::R16G16B16A16Snorm
            | F::R16G16B16A16Sint
            | F::R10G10B10A2Typeless
            | F::R10G10B10A2Unorm
            | F::R10G10B10A2Uint
            | F::R10G10B10XrBiasA2Unorm
            | F::R8G8B8A8Typeless
            | F::R8G8B8A8Unorm
            | F::R8G8B8A8UnormSrgb
            | F::R8G8B8A8Uint
            | F::R8G8B8A8Snorm
            | F::R8G8B8A8Sint
            | F::B8G8R8A8Unorm
            | F::B8G8R8A8Typeless
            | F::B8G8R8A8UnormSrgb
            | F::B5G5R5A1Unorm
            | F::B4G4R4A4Unorm
            | F::A8Unorm
    )
}

fn component_count(format: BufferFormat) -> u32 {
    use BufferFormat as F;

    match format {
        F::Unknown => 0,
        F::R32G32B32A32Typeless
        | F::R32G32B32A32Float
        | F::R32G32B32A32Uint
        | F::R32G32B32A32Sint
        | F::R16G16B16A16Typeless
        | F::R16G16B16A16Float
        | F::R16G16B16A16Unorm
        | F::R16G16B16A16Uint
        | F::R16G16B16A16Snorm
        | F::R16G16B16A16Sint
        | F::R10G10B10A2Typeless
        | F::R10G10B10A2Unorm
        | F::R10G10B10A2Uint
        | F::R10G10B10XrBiasA2Unorm
        | F::R8G8B8G8Unorm
        | F::G8R8G8B8Unorm
        | F::R8G8B8A8Typeless
        | F::R8G8B8A8Unorm
        | F::R8G8B8A8UnormSrgb
        | F::R8G8B8A8Uint
        | F::R8G8B8A8Snorm
        | F::R8G8B8A8Sint
        | F::B8G8R8A8Unorm
        | F::B8G8R8A8Typeless
        | F::B8G8R8A8UnormSrgb
        | F::B5G5R5A1Unorm
        | F::B4G4R4A4Unorm
        | F::Bc1Typeless
        | F::Bc1Unorm
        | F::Bc1UnormSrgb
        | F::Bc2Typeless
        | F::Bc2Unorm
        | F::Bc2UnormSrgb
        | F::Bc3Typeless
        | F::Bc3Unorm
        | F::Bc3UnormSrgb
        | F::Bc7Typeless
        | F::Bc7Unorm
        | F::Bc7UnormSrgb => 4,
        F::B8G8R8X8Unorm
        | F::B8G8R8X8Typeless
        | F::B8G8R8X8UnormSrgb
        | F::B5G6R5Unorm
        | F::R32G32B32Typeless
        | F::R32G32B32Float
        | F::R32G32B32Uint
        | F::R32G32B32Sint
        | F::R11G11B10Float
        | F::R9G9B9E5SharedExp
        | F::Bc6hTypeless
        | F::Bc6hUf16
        | F::Bc6hSf16 => 3,
        F::R32G32Typeless
        | F::R32G32Float
        | F::R32G32Uint
        | F::R32G32Sint
        | F::R32G8X24Typeless
        | F::D32FloatS8X24Uint
        | F::R16G16Typeless
        | F::R16G16Float
        | F::R16G16Unorm
        | F::R16G16Uint
        | F::R16G16Snorm
        | F::R16G16Sint
        | F::R24G8Typeless
        | F::D24UnormS8Uint
        | F::R8G8Typeless
        | F::R8G8Unorm
        | F::R8G8Uint
        | F::R8G8Snorm
        | F::R8G8Sint
        | F::Bc5Typeless
        | F::Bc5Unorm
        | F::Bc5Snorm => 2,
        _ => 1,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_format() {
        let info = FormatInfo::new(BufferFormat::Unknown);
        assert_eq!(info.bit_depth(), 0);
        assert_eq!(info.size_in_bytes(), 0);
        assert_eq!(info.group(), BufferFormat::Unknown);
        assert!(!info.is_typeless());
    }

    #[test]
    fn test_size_in_bytes() {
        assert_eq!(BufferFormat::R8G8B8A8Unorm.info().size_in_bytes(), 4);
        assert_eq!(BufferFormat::R32G32B32A32Float.info().size_in_bytes(), 16);
        assert_eq!(BufferFormat::R32G32B32Float.info().size_in_bytes(), 12);
        assert_eq!(BufferFormat::R8Unorm.info().size_in_bytes(), 1);
        assert_eq!(BufferFormat::B5G6R5Unorm.info().size_in_bytes(), 2);
    }

    #[test]
    fn test_groups() {
        assert_eq!(
            BufferFormat::R8G8B8A8UnormSrgb.info().group(),
            BufferFormat::R8G8B8A8Typeless
        );
        assert_eq!(
            BufferFormat::Bc1UnormSrgb.info().group(),
            BufferFormat::Bc1Typeless
        );
        assert_eq!(BufferFormat::D32Float.info().group(), BufferFormat::R32Typeless);
        assert_eq!(
            BufferFormat::D24UnormS8Uint.info().group(),
            BufferFormat::R24G8Typeless
        );
        assert_eq!(BufferFormat::R11G11B10Float.info().group(), BufferFormat::Unknown);

        let a = BufferFormat::R32Float.info();
        let b = BufferFormat::R32Uint.info();
        let c = BufferFormat::R16G16Float.info();
        assert!(a.is_same_group(&b));
        assert!(!a.is_same_group(&c));
        assert!(!BufferFormat::R11G11B10Float
            .info()
            .is_same_group(&BufferFormat::R11G11B10Float.info()));
    }

    #[test]
    fn test_attributes() {
        let info = BufferFormat::R8G8B8A8UnormSrgb.info();
        assert!(info.is_srgb());
        assert!(info.has_alpha());
        assert_eq!(info.component_count(), 4);
        assert!(!info.is_typeless());

        let info = BufferFormat::D24UnormS8Uint.info();
        assert!(info.has_depth());
        assert!(info.has_stencil());

        let info = BufferFormat::D32Float.info();
        assert!(info.has_depth());
        assert!(!info.has_stencil());

        assert!(BufferFormat::Bc7Unorm.info().is_compressed());
        assert!(BufferFormat::R8G8B8G8Unorm.info().is_packed());
        assert!(BufferFormat::B8G8R8X8Typeless.info().is_typeless());
        assert_eq!(BufferFormat::B8G8R8X8Unorm.info().component_count(), 3);
    }

    #[test]
    fn test_pitch_uncompressed() {
        let layout = BufferFormat::R8G8B8A8Unorm
            .info()
            .pitch(320, 200, PitchFlags::empty());
        assert_eq!(layout.row_pitch, 1280);
        assert_eq!(layout.slice_pitch, 256_000);
        assert_eq!(layout.block_count, None);
        assert_eq!(layout.rows(200), 200);
    }

    #[test]
    fn test_pitch_compressed() {
        let layout = BufferFormat::Bc1Unorm
            .info()
            .pitch(320, 200, PitchFlags::empty());
        assert_eq!(layout.row_pitch, 640);
        assert_eq!(layout.slice_pitch, 32_000);
        assert_eq!(layout.block_count, Some((80, 50)));
        assert_eq!(layout.rows(200), 50);

        let layout = BufferFormat::Bc7Unorm
            .info()
            .pitch(320, 200, PitchFlags::empty());
        assert_eq!(layout.row_pitch, 1280);
        assert_eq!(layout.slice_pitch, 64_000);

        // A 1x1 mip still occupies a whole block.
        let layout = BufferFormat::Bc3Unorm.info().pitch(1, 1, PitchFlags::empty());
        assert_eq!(layout.row_pitch, 16);
        assert_eq!(layout.slice_pitch, 16);
    }

    #[test]
    fn test_pitch_packed() {
        let layout = BufferFormat::R8G8B8G8Unorm
            .info()
            .pitch(320, 200, PitchFlags::empty());
        assert_eq!(layout.row_pitch, 640);
        assert_eq!(layout.slice_pitch, 128_000);
    }

    #[test]
    fn test_pitch_flags() {
        let info = BufferFormat::R8G8B8A8Unorm.info();
        assert_eq!(info.pitch(3, 1, PitchFlags::BPP24).row_pitch, 9);
        assert_eq!(info.pitch(3, 1, PitchFlags::BPP24 | PitchFlags::LEGACY_DWORD).row_pitch, 12);
        assert_eq!(info.pitch(5, 1, PitchFlags::ALIGN_16).row_pitch, 32);
        assert_eq!(info.pitch(5, 1, PitchFlags::ALIGN_64).row_pitch, 64);
        assert_eq!(info.pitch(5, 2, PitchFlags::ALIGN_4K).slice_pitch, 8192);
    }

    #[test]
    fn test_scanlines() {
        assert_eq!(BufferFormat::R8G8B8A8Unorm.info().scanlines(200), 200);
        assert_eq!(BufferFormat::Bc1Unorm.info().scanlines(200), 50);
        assert_eq!(BufferFormat::Bc1Unorm.info().scanlines(1), 1);
    }
}
