//! Views of single sub-images inside an image allocation.
//!
//! An image buffer is one mip level of one array index (or one depth slice of
//! one mip level for volumes). Buffers never own memory: [`ImageBuffer`] and
//! [`ImageBufferMut`] borrow their bytes from the [`ImageData`](super::ImageData)
//! that allocated them.

use crate::error::{ImagingError, ImagingResult};

use super::format::{BufferFormat, FormatInfo, PitchLayout};

/// Location and layout of one sub-image within an image allocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BufferDescriptor {
    /// Mip level of the buffer.
    pub mip_level: u32,
    /// Array index of the buffer (0 for volumes).
    pub array_index: u32,
    /// Depth slice of the buffer (0 for non-volumes).
    pub depth_slice: u32,
    /// Width of the buffer, in pixels.
    pub width: u32,
    /// Height of the buffer, in pixels.
    pub height: u32,
    /// Number of depth slices at this mip level.
    pub depth: u32,
    /// Pixel format.
    pub format: BufferFormat,
    /// Row and slice pitch.
    pub pitch: PitchLayout,
    /// Byte offset of the buffer within the allocation.
    pub offset: usize,
}

impl BufferDescriptor {
    /// Describe a standalone, tightly pitched 2D slice at offset 0.
    pub fn slice(width: u32, height: u32, format: BufferFormat) -> Self {
        Self::with_pitch(
            width,
            height,
            format,
            FormatInfo::new(format).pitch(width, height, Default::default()),
        )
    }

    /// Describe a standalone 2D slice at offset 0 with an explicit pitch.
    pub fn with_pitch(width: u32, height: u32, format: BufferFormat, pitch: PitchLayout) -> Self {
        Self {
            mip_level: 0,
            array_index: 0,
            depth_slice: 0,
            width,
            height,
            depth: 1,
            format,
            pitch,
            offset: 0,
        }
    }

    /// Number of bytes covered by the buffer (one slice).
    pub fn len(&self) -> usize {
        self.pitch.slice_pitch as usize
    }

    /// Returns true if the buffer covers no bytes.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Byte range of the buffer within the allocation.
    pub fn range(&self) -> std::ops::Range<usize> {
        self.offset..self.offset + self.len()
    }

    /// Number of stored rows (block rows for compressed formats).
    pub fn rows(&self) -> u32 {
        self.pitch.rows(self.height)
    }
}

/// A rectangular region of an image buffer, in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Rect {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
}

impl Rect {
    /// Create a new rectangle.
    pub fn new(x: i32, y: i32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }
}

/// A read-only view of one sub-image.
#[derive(Debug, Clone, Copy)]
pub struct ImageBuffer<'a> {
    descriptor: BufferDescriptor,
    data: &'a [u8],
}

/// A writable view of one sub-image.
#[derive(Debug)]
pub struct ImageBufferMut<'a> {
    descriptor: BufferDescriptor,
    data: &'a mut [u8],
}

impl<'a> ImageBuffer<'a> {
    /// Create a view over `data`, which must hold at least one slice of `descriptor`.
    ///
    /// # Errors
    ///
    /// Returns [`ImagingError::SizeMismatch`] if `data` is too short.
    pub fn new(descriptor: BufferDescriptor, data: &'a [u8]) -> ImagingResult<Self> {
        if data.len() < descriptor.len() {
            return Err(ImagingError::SizeMismatch {
                expected: descriptor.len(),
                actual: data.len(),
            });
        }
        Ok(Self {
            descriptor,
            data: &data[..descriptor.len()],
        })
    }

    pub fn descriptor(&self) -> &BufferDescriptor {
        &self.descriptor
    }

    pub fn width(&self) -> u32 {
        self.descriptor.width
    }

    pub fn height(&self) -> u32 {
        self.descriptor.height
    }

    pub fn format(&self) -> BufferFormat {
        self.descriptor.format
    }

    pub fn pitch(&self) -> PitchLayout {
        self.descriptor.pitch
    }

    /// Get the bytes of the buffer.
    pub fn data(&self) -> &'a [u8] {
        self.data
    }

    /// Get one stored row (one row of blocks for compressed formats).
    pub fn row(&self, row: u32) -> Option<&'a [u8]> {
        let pitch = self.descriptor.pitch.row_pitch as usize;
        let start = row as usize * pitch;
        self.data.get(start..start + pitch)
    }

    /// Copy a region of this buffer into `dest`.
    ///
    /// `region` defaults to the whole buffer and is clipped to it. Negative
    /// destination offsets shrink the region from its top/left edge. When
    /// the region ends up outside `dest` nothing is written. Each row copies
    /// the smaller of the two line lengths, for the smaller of the two row
    /// counts.
    ///
    /// # Errors
    ///
    /// Returns [`ImagingError::InvalidArgument`] if the formats differ.
    pub fn copy_to(
        &self,
        dest: &mut ImageBufferMut<'_>,
        region: Option<Rect>,
        dest_x: i32,
        dest_y: i32,
    ) -> ImagingResult<()> {
        if self.format() != dest.format() {
            return Err(ImagingError::InvalidArgument(format!(
                "cannot copy a {:?} buffer into a {:?} buffer",
                self.format(),
                dest.format()
            )));
        }

        let Some(copy) = clip_copy(
            (self.width(), self.height()),
            (dest.width(), dest.height()),
            region,
            dest_x,
            dest_y,
        ) else {
            return Ok(());
        };

        let element = ElementLayout::new(&FormatInfo::new(self.format()), &self.descriptor.pitch);
        let src_pitch = self.descriptor.pitch.row_pitch as usize;
        let dst_pitch = dest.descriptor.pitch.row_pitch as usize;

        let src_x = element.bytes_for(copy.src_x);
        let dst_x = element.bytes_for(copy.dst_x);
        let line = element
            .bytes_for(copy.width)
            .min(src_pitch.saturating_sub(src_x))
            .min(dst_pitch.saturating_sub(dst_x));

        let src_row0 = element.rows_for(copy.src_y);
        let dst_row0 = element.rows_for(copy.dst_y);
        let src_rows = self.descriptor.rows().saturating_sub(src_row0);
        let dst_rows = dest.descriptor.rows().saturating_sub(dst_row0);
        let rows = element.rows_for(copy.height).max(1).min(src_rows).min(dst_rows);

        for row in 0..rows {
            let src_start = (src_row0 + row) as usize * src_pitch + src_x;
            let dst_start = (dst_row0 + row) as usize * dst_pitch + dst_x;
            dest.data[dst_start..dst_start + line]
                .copy_from_slice(&self.data[src_start..src_start + line]);
        }

        Ok(())
    }
}

impl<'a> ImageBufferMut<'a> {
    /// Create a writable view over `data`, which must hold at least one slice of `descriptor`.
    ///
    /// # Errors
    ///
    /// Returns [`ImagingError::SizeMismatch`] if `data` is too short.
    pub fn new(descriptor: BufferDescriptor, data: &'a mut [u8]) -> ImagingResult<Self> {
        if data.len() < descriptor.len() {
            return Err(ImagingError::SizeMismatch {
                expected: descriptor.len(),
                actual: data.len(),
            });
        }
        let len = descriptor.len();
        Ok(Self {
            descriptor,
            data: &mut data[..len],
        })
    }

    pub fn descriptor(&self) -> &BufferDescriptor {
        &self.descriptor
    }

    pub fn width(&self) -> u32 {
        self.descriptor.width
    }

    pub fn height(&self) -> u32 {
        self.descriptor.height
    }

    pub fn format(&self) -> BufferFormat {
        self.descriptor.format
    }

    pub fn pitch(&self) -> PitchLayout {
        self.descriptor.pitch
    }

    pub fn data(&self) -> &[u8] {
        &*self.data
    }

    pub fn data_mut(&mut self) -> &mut [u8] {
        &mut *self.data
    }

    /// Reborrow as a read-only buffer.
    pub fn as_buffer(&self) -> ImageBuffer<'_> {
        ImageBuffer {
            descriptor: self.descriptor,
            data: &*self.data,
        }
    }

    /// Set every byte of the buffer to `value`.
    pub fn fill(&mut self, value: u8) {
        self.data.fill(value);
    }
}

/// Copy `rows` rows between two pitched byte layouts.
///
/// Each row copies `min(src_pitch, dst_pitch)` bytes. When both pitches are
/// equal the rows are copied in one block.
pub fn copy_pitched(src: &[u8], src_pitch: usize, dst: &mut [u8], dst_pitch: usize, rows: usize) {
    if src_pitch == dst_pitch {
        let len = (src_pitch * rows).min(src.len()).min(dst.len());
        dst[..len].copy_from_slice(&src[..len]);
        return;
    }

    let line = src_pitch.min(dst_pitch);
    for row in 0..rows {
        let src_start = row * src_pitch;
        let dst_start = row * dst_pitch;
        if src_start + line > src.len() || dst_start + line > dst.len() {
            break;
        }
        dst[dst_start..dst_start + line].copy_from_slice(&src[src_start..src_start + line]);
    }
}

/// Result of clipping a copy region.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct ClippedCopy {
    pub src_x: u32,
    pub src_y: u32,
    pub dst_x: u32,
    pub dst_y: u32,
    pub width: u32,
    pub height: u32,
}

/// Clip a source region against the source and destination sizes.
///
/// Returns `None` when nothing would be copied.
pub(crate) fn clip_copy(
    src_size: (u32, u32),
    dst_size: (u32, u32),
    region: Option<Rect>,
    dest_x: i32,
    dest_y: i32,
) -> Option<ClippedCopy> {
    let region = region.unwrap_or(Rect::new(0, 0, src_size.0, src_size.1));

    // Signed arithmetic so that no intermediate size can go negative.
    let mut left = i64::from(region.x).max(0);
    let mut top = i64::from(region.y).max(0);
    let right = (i64::from(region.x) + i64::from(region.width)).min(i64::from(src_size.0));
    let bottom = (i64::from(region.y) + i64::from(region.height)).min(i64::from(src_size.1));

    let mut dst_x = i64::from(dest_x);
    let mut dst_y = i64::from(dest_y);
    if dst_x < 0 {
        left -= dst_x;
        dst_x = 0;
    }
    if dst_y < 0 {
        top -= dst_y;
        dst_y = 0;
    }

    if dst_x >= i64::from(dst_size.0) || dst_y >= i64::from(dst_size.1) {
        return None;
    }

    let width = (right - left).min(i64::from(dst_size.0) - dst_x);
    let height = (bottom - top).min(i64::from(dst_size.1) - dst_y);
    if width <= 0 || height <= 0 {
        return None;
    }

    Some(ClippedCopy {
        src_x: left as u32,
        src_y: top as u32,
        dst_x: dst_x as u32,
        dst_y: dst_y as u32,
        width: width as u32,
        height: height as u32,
    })
}

/// Pixel-to-byte mapping for a format: elements are pixels, pixel pairs or blocks.
#[derive(Debug, Clone, Copy)]
struct ElementLayout {
    width: u32,
    height: u32,
    bytes: usize,
}

impl ElementLayout {
    fn new(info: &FormatInfo, pitch: &PitchLayout) -> Self {
        if let Some((blocks_wide, _)) = pitch.block_count {
            let bytes = if blocks_wide > 0 {
                (pitch.row_pitch / blocks_wide) as usize
            } else {
                0
            };
            Self {
                width: 4,
                height: 4,
                bytes,
            }
        } else if info.is_packed() {
            Self {
                width: 2,
                height: 1,
                bytes: 4,
            }
        } else {
            Self {
                width: 1,
                height: 1,
                bytes: info.size_in_bytes() as usize,
            }
        }
    }

    fn bytes_for(&self, pixels: u32) -> usize {
        pixels.div_ceil(self.width) as usize * self.bytes
    }

    fn rows_for(&self, pixels: u32) -> u32 {
        pixels.div_ceil(self.height)
    }
}
