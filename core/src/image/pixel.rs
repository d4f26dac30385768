//! Per-pixel read/write for the uncompressed formats the default transform handles.

use half::f16;

use super::format::BufferFormat;

/// Memory encoding of a pixel, shared by formats that differ only in interpretation
/// (for example `R8G8B8A8Unorm` and `R8G8B8A8UnormSrgb`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) enum PixelEncoding {
    R8,
    A8,
    Rg8,
    Rgba8,
    Bgra8,
    Bgrx8,
    R16,
    Rg16,
    Rgba16,
    R16F,
    Rg16F,
    Rgba16F,
    R32F,
    Rg32F,
    Rgb32F,
    Rgba32F,
    B5G6R5,
    B5G5R5A1,
    B4G4R4A4,
    Rgb10A2,
}

impl PixelEncoding {
    /// Get the encoding used by `format`, if it is one the transform can read.
    pub(crate) fn of(format: BufferFormat) -> Option<Self> {
        use BufferFormat as F;

        let encoding = match format {
            F::R8Unorm => Self::R8,
            F::A8Unorm => Self::A8,
            F::R8G8Unorm => Self::Rg8,
            F::R8G8B8A8Unorm | F::R8G8B8A8UnormSrgb => Self::Rgba8,
            F::B8G8R8A8Unorm | F::B8G8R8A8UnormSrgb => Self::Bgra8,
            F::B8G8R8X8Unorm | F::B8G8R8X8UnormSrgb => Self::Bgrx8,
            F::R16Unorm => Self::R16,
            F::R16G16Unorm => Self::Rg16,
            F::R16G16B16A16Unorm => Self::Rgba16,
            F::R16Float => Self::R16F,
            F::R16G16Float => Self::Rg16F,
            F::R16G16B16A16Float => Self::Rgba16F,
            F::R32Float => Self::R32F,
            F::R32G32Float => Self::Rg32F,
            F::R32G32B32Float => Self::Rgb32F,
            F::R32G32B32A32Float => Self::Rgba32F,
            F::B5G6R5Unorm => Self::B5G6R5,
            F::B5G5R5A1Unorm => Self::B5G5R5A1,
            F::B4G4R4A4Unorm => Self::B4G4R4A4,
            F::R10G10B10A2Unorm => Self::Rgb10A2,
            _ => return None,
        };
        Some(encoding)
    }

    /// Bytes per pixel.
    pub(crate) fn bytes(self) -> usize {
        match self {
            Self::R8 | Self::A8 => 1,
            Self::Rg8 | Self::R16 | Self::R16F | Self::B5G6R5 | Self::B5G5R5A1 | Self::B4G4R4A4 => 2,
            Self::Rgba8
            | Self::Bgra8
            | Self::Bgrx8
            | Self::Rg16
            | Self::Rg16F
            | Self::R32F
            | Self::Rgb10A2 => 4,
            Self::Rgba16 | Self::Rgba16F | Self::Rg32F => 8,
            Self::Rgb32F => 12,
            Self::Rgba32F => 16,
        }
    }

    /// Bits per channel for low precision unorm encodings, used for dithering.
    pub(crate) fn quantization(self) -> Option<[u32; 4]> {
        match self {
            Self::R8 | Self::A8 | Self::Rg8 | Self::Rgba8 | Self::Bgra8 | Self::Bgrx8 => {
                Some([8, 8, 8, 8])
            }
            Self::B5G6R5 => Some([5, 6, 5, 1]),
            Self::B5G5R5A1 => Some([5, 5, 5, 1]),
            Self::B4G4R4A4 => Some([4, 4, 4, 4]),
            _ => None,
        }
    }

    /// Returns true if channels are stored as floats and are not clamped to `[0, 1]`.
    pub(crate) fn is_float(self) -> bool {
        matches!(
            self,
            Self::R16F
                | Self::Rg16F
                | Self::Rgba16F
                | Self::R32F
                | Self::Rg32F
                | Self::Rgb32F
                | Self::Rgba32F
        )
    }

    /// Read one pixel as RGBA.
    pub(crate) fn read(self, px: &[u8]) -> [f32; 4] {
        match self {
            Self::R8 => [unorm8(px[0]), 0.0, 0.0, 1.0],
            Self::A8 => [0.0, 0.0, 0.0, unorm8(px[0])],
            Self::Rg8 => [unorm8(px[0]), unorm8(px[1]), 0.0, 1.0],
            Self::Rgba8 => [unorm8(px[0]), unorm8(px[1]), unorm8(px[2]), unorm8(px[3])],
            Self::Bgra8 => [unorm8(px[2]), unorm8(px[1]), unorm8(px[0]), unorm8(px[3])],
            Self::Bgrx8 => [unorm8(px[2]), unorm8(px[1]), unorm8(px[0]), 1.0],
            Self::R16 => [unorm16(read_u16(px, 0)), 0.0, 0.0, 1.0],
            Self::Rg16 => [unorm16(read_u16(px, 0)), unorm16(read_u16(px, 1)), 0.0, 1.0],
            Self::Rgba16 => [
                unorm16(read_u16(px, 0)),
                unorm16(read_u16(px, 1)),
                unorm16(read_u16(px, 2)),
                unorm16(read_u16(px, 3)),
            ],
            Self::R16F => [read_f16(px, 0), 0.0, 0.0, 1.0],
            Self::Rg16F => [read_f16(px, 0), read_f16(px, 1), 0.0, 1.0],
            Self::Rgba16F => [
                read_f16(px, 0),
                read_f16(px, 1),
                read_f16(px, 2),
                read_f16(px, 3),
            ],
            Self::R32F => [read_f32(px, 0), 0.0, 0.0, 1.0],
            Self::Rg32F => [read_f32(px, 0), read_f32(px, 1), 0.0, 1.0],
            Self::Rgb32F => [read_f32(px, 0), read_f32(px, 1), read_f32(px, 2), 1.0],
            Self::Rgba32F => [
                read_f32(px, 0),
                read_f32(px, 1),
                read_f32(px, 2),
                read_f32(px, 3),
            ],
            Self::B5G6R5 => {
                let bits = read_u16(px, 0);
                [
                    unorm_bits(u32::from(bits >> 11), 5),
                    unorm_bits(u32::from((bits >> 5) & 0x3F), 6),
                    unorm_bits(u32::from(bits & 0x1F), 5),
                    1.0,
                ]
            }
            Self::B5G5R5A1 => {
                let bits = read_u16(px, 0);
                [
                    unorm_bits(u32::from((bits >> 10) & 0x1F), 5),
                    unorm_bits(u32::from((bits >> 5) & 0x1F), 5),
                    unorm_bits(u32::from(bits & 0x1F), 5),
                    unorm_bits(u32::from(bits >> 15), 1),
                ]
            }
            Self::B4G4R4A4 => {
                let bits = read_u16(px, 0);
                [
                    unorm_bits(u32::from((bits >> 8) & 0xF), 4),
                    unorm_bits(u32::from((bits >> 4) & 0xF), 4),
                    unorm_bits(u32::from(bits & 0xF), 4),
                    unorm_bits(u32::from(bits >> 12), 4),
                ]
            }
            Self::Rgb10A2 => {
                let bits: u32 = bytemuck::pod_read_unaligned(&px[..4]);
                [
                    unorm_bits(bits & 0x3FF, 10),
                    unorm_bits((bits >> 10) & 0x3FF, 10),
                    unorm_bits((bits >> 20) & 0x3FF, 10),
                    unorm_bits(bits >> 30, 2),
                ]
            }
        }
    }

    /// Write one RGBA pixel.
    pub(crate) fn write(self, px: &mut [u8], rgba: [f32; 4]) {
        let [r, g, b, a] = rgba;
        match self {
            Self::R8 => px[0] = to_unorm8(r),
            Self::A8 => px[0] = to_unorm8(a),
            Self::Rg8 => {
                px[0] = to_unorm8(r);
                px[1] = to_unorm8(g);
            }
            Self::Rgba8 => px[..4].copy_from_slice(&[
                to_unorm8(r),
                to_unorm8(g),
                to_unorm8(b),
                to_unorm8(a),
            ]),
            Self::Bgra8 => px[..4].copy_from_slice(&[
                to_unorm8(b),
                to_unorm8(g),
                to_unorm8(r),
                to_unorm8(a),
            ]),
            Self::Bgrx8 => {
                px[..4].copy_from_slice(&[to_unorm8(b), to_unorm8(g), to_unorm8(r), 0xFF])
            }
            Self::R16 => write_u16(px, 0, to_unorm16(r)),
            Self::Rg16 => {
                write_u16(px, 0, to_unorm16(r));
                write_u16(px, 1, to_unorm16(g));
            }
            Self::Rgba16 => {
                for (i, v) in rgba.iter().enumerate() {
                    write_u16(px, i, to_unorm16(*v));
                }
            }
            Self::R16F => write_u16(px, 0, f16::from_f32(r).to_bits()),
            Self::Rg16F => {
                write_u16(px, 0, f16::from_f32(r).to_bits());
                write_u16(px, 1, f16::from_f32(g).to_bits());
            }
            Self::Rgba16F => {
                for (i, v) in rgba.iter().enumerate() {
                    write_u16(px, i, f16::from_f32(*v).to_bits());
                }
            }
            Self::R32F => write_f32(px, 0, r),
            Self::Rg32F => {
                write_f32(px, 0, r);
                write_f32(px, 1, g);
            }
            Self::Rgb32F => {
                for (i, v) in rgba[..3].iter().enumerate() {
                    write_f32(px, i, *v);
                }
            }
            Self::Rgba32F => {
                for (i, v) in rgba.iter().enumerate() {
                    write_f32(px, i, *v);
                }
            }
            Self::B5G6R5 => {
                let bits = (to_bits(r, 5) << 11) | (to_bits(g, 6) << 5) | to_bits(b, 5);
                write_u16(px, 0, bits as u16);
            }
            Self::B5G5R5A1 => {
                let bits = (to_bits(a, 1) << 15)
                    | (to_bits(r, 5) << 10)
                    | (to_bits(g, 5) << 5)
                    | to_bits(b, 5);
                write_u16(px, 0, bits as u16);
            }
            Self::B4G4R4A4 => {
                let bits = (to_bits(a, 4) << 12)
                    | (to_bits(r, 4) << 8)
                    | (to_bits(g, 4) << 4)
                    | to_bits(b, 4);
                write_u16(px, 0, bits as u16);
            }
            Self::Rgb10A2 => {
                let bits = (to_bits(a, 2) << 30)
                    | (to_bits(b, 10) << 20)
                    | (to_bits(g, 10) << 10)
                    | to_bits(r, 10);
                px[..4].copy_from_slice(bytemuck::bytes_of(&bits));
            }
        }
    }
}

/// Convert an sRGB encoded channel to linear.
pub(crate) fn srgb_to_linear(value: f32) -> f32 {
    if value <= 0.04045 {
        value / 12.92
    } else {
        ((value + 0.055) / 1.055).powf(2.4)
    }
}

/// Convert a linear channel to sRGB encoding.
pub(crate) fn linear_to_srgb(value: f32) -> f32 {
    if value <= 0.003_130_8 {
        value * 12.92
    } else {
        1.055 * value.powf(1.0 / 2.4) - 0.055
    }
}

fn unorm8(value: u8) -> f32 {
    f32::from(value) / 255.0
}

fn unorm16(value: u16) -> f32 {
    f32::from(value) / 65535.0
}

fn unorm_bits(value: u32, bits: u32) -> f32 {
    value as f32 / ((1u32 << bits) - 1) as f32
}

fn to_unorm8(value: f32) -> u8 {
    (value.clamp(0.0, 1.0) * 255.0).round() as u8
}

fn to_unorm16(value: f32) -> u16 {
    (value.clamp(0.0, 1.0) * 65535.0).round() as u16
}

fn to_bits(value: f32, bits: u32) -> u32 {
    let max = ((1u32 << bits) - 1) as f32;
    (value.clamp(0.0, 1.0) * max).round() as u32
}

fn read_u16(px: &[u8], index: usize) -> u16 {
    bytemuck::pod_read_unaligned(&px[index * 2..index * 2 + 2])
}

fn write_u16(px: &mut [u8], index: usize, value: u16) {
    px[index * 2..index * 2 + 2].copy_from_slice(bytemuck::bytes_of(&value));
}

fn read_f16(px: &[u8], index: usize) -> f32 {
    f16::from_bits(read_u16(px, index)).to_f32()
}

fn read_f32(px: &[u8], index: usize) -> f32 {
    bytemuck::pod_read_unaligned(&px[index * 4..index * 4 + 4])
}

fn write_f32(px: &mut [u8], index: usize, value: f32) {
    px[index * 4..index * 4 + 4].copy_from_slice(bytemuck::bytes_of(&value));
}
