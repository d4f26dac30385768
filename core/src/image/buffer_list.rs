//! Layout of every sub-image in an image allocation.

use crate::error::{ImagingError, ImagingResult};

use super::buffer::BufferDescriptor;
use super::format::{FormatInfo, PitchFlags};
use super::settings::{ImageSettings, ImageType};

/// Ordered list of the sub-image buffers of an image.
///
/// Buffers are laid out array-major, mip-minor, with depth slices innermost
/// for volumes: every slice of mip 0 for array 0, then mip 1, and so on,
/// followed by the mips of array 1.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImageBufferList {
    image_type: ImageType,
    mip_count: u32,
    array_count: u32,
    buffers: Vec<BufferDescriptor>,
    /// Per mip level: index of its first buffer and its depth slice count.
    mip_offsets: Vec<(usize, u32)>,
}

impl ImageBufferList {
    /// Compute the buffer layout for sanitized `settings`.
    pub fn create_buffers(settings: &ImageSettings) -> Self {
        Self::create_buffers_with_flags(settings, PitchFlags::empty())
    }

    /// Compute the buffer layout using custom pitch flags.
    pub fn create_buffers_with_flags(settings: &ImageSettings, flags: PitchFlags) -> Self {
        let info = FormatInfo::new(settings.format);
        let is_volume = settings.image_type == ImageType::Image3D;
        let mip_count = settings.mip_count.max(1);
        let array_count = if is_volume {
            1
        } else {
            settings.array_count.max(1)
        };
        let base_depth = if is_volume { settings.depth.max(1) } else { 1 };

        let mut buffers = Vec::new();
        let mut mip_offsets = Vec::with_capacity(mip_count as usize);
        let mut offset = 0usize;

        for array in 0..array_count {
            let mut width = settings.width.max(1);
            let mut height = settings.height.max(1);
            let mut depth = base_depth;

            for mip in 0..mip_count {
                let pitch = info.pitch(width, height, flags);

                if array == 0 {
                    mip_offsets.push((buffers.len(), depth));
                }

                for slice in 0..depth {
                    buffers.push(BufferDescriptor {
                        mip_level: mip,
                        array_index: array,
                        depth_slice: slice,
                        width,
                        height,
                        depth,
                        format: settings.format,
                        pitch,
                        offset,
                    });
                    offset += pitch.slice_pitch as usize;
                }

                width = (width >> 1).max(1);
                height = (height >> 1).max(1);
                depth = (depth >> 1).max(1);
            }
        }

        Self {
            image_type: settings.image_type,
            mip_count,
            array_count,
            buffers,
            mip_offsets,
        }
    }

    /// Get the linear buffer index for `(mip, array_or_depth)`.
    ///
    /// For volumes the second index is the depth slice at that mip level,
    /// otherwise it is the array index.
    ///
    /// # Errors
    ///
    /// Returns [`ImagingError::OutOfRange`] if either index is out of range.
    pub fn index(&self, mip: u32, array_or_depth: u32) -> ImagingResult<usize> {
        if mip >= self.mip_count {
            return Err(ImagingError::index("mip_level", mip, self.mip_count));
        }

        if self.image_type == ImageType::Image3D {
            let (first, depth) = self.mip_offsets[mip as usize];
            if array_or_depth >= depth {
                return Err(ImagingError::index("depth_slice", array_or_depth, depth));
            }
            return Ok(first + array_or_depth as usize);
        }

        if array_or_depth >= self.array_count {
            return Err(ImagingError::index(
                "array_index",
                array_or_depth,
                self.array_count,
            ));
        }

        Ok((array_or_depth * self.mip_count + mip) as usize)
    }

    /// Get the descriptor for `(mip, array_or_depth)`.
    ///
    /// # Errors
    ///
    /// Returns [`ImagingError::OutOfRange`] if either index is out of range.
    pub fn get(&self, mip: u32, array_or_depth: u32) -> ImagingResult<&BufferDescriptor> {
        let index = self.index(mip, array_or_depth)?;
        Ok(&self.buffers[index])
    }

    /// Get the depth slice count at `mip`: 1 for non-volumes.
    ///
    /// # Errors
    ///
    /// Returns [`ImagingError::OutOfRange`] if `mip` is out of range.
    pub fn depth_count(&self, mip: u32) -> ImagingResult<u32> {
        if mip >= self.mip_count {
            return Err(ImagingError::index("mip_level", mip, self.mip_count));
        }
        Ok(self.mip_offsets[mip as usize].1)
    }

    /// Get every buffer descriptor in layout order.
    pub fn descriptors(&self) -> &[BufferDescriptor] {
        &self.buffers
    }

    /// Iterate over buffer descriptors in layout order.
    pub fn iter(&self) -> std::slice::Iter<'_, BufferDescriptor> {
        self.buffers.iter()
    }

    /// Number of buffers.
    pub fn len(&self) -> usize {
        self.buffers.len()
    }

    /// Returns true if the list holds no buffers.
    pub fn is_empty(&self) -> bool {
        self.buffers.is_empty()
    }

    pub fn mip_count(&self) -> u32 {
        self.mip_count
    }

    pub fn array_count(&self) -> u32 {
        self.array_count
    }

    /// Total number of bytes covered by the buffers.
    pub fn total_len(&self) -> usize {
        self.buffers.last().map(|last| last.offset + last.len()).unwrap_or(0)
    }
}

impl<'a> IntoIterator for &'a ImageBufferList {
    type Item = &'a BufferDescriptor;
    type IntoIter = std::slice::Iter<'a, BufferDescriptor>;

    fn into_iter(self) -> Self::IntoIter {
        self.buffers.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::image::format::BufferFormat;

    #[test]
    fn test_single_buffer_layout() {
        let settings = ImageSettings::new_2d(64, 64, BufferFormat::R8G8B8A8Unorm).sanitize();
        let list = ImageBufferList::create_buffers(&settings);

        assert_eq!(list.len(), 1);
        let buffer = list.get(0, 0).unwrap();
        assert_eq!(buffer.offset, 0);
        assert_eq!(buffer.pitch.row_pitch, 256);
        assert_eq!(buffer.pitch.slice_pitch, 16384);
    }

    #[test]
    fn test_array_major_layout() {
        let settings = ImageSettings::new_2d(8, 8, BufferFormat::R8Unorm)
            .with_mip_count(4)
            .with_array_count(2)
            .sanitize();
        let list = ImageBufferList::create_buffers(&settings);

        assert_eq!(list.len(), 8);
        assert_eq!(list.index(0, 1).unwrap(), 4);
        assert_eq!(list.index(3, 1).unwrap(), 7);

        let second_array = list.get(0, 1).unwrap();
        assert_eq!(second_array.array_index, 1);
        assert_eq!(second_array.offset, 64 + 16 + 4 + 1);
    }

    #[test]
    fn test_volume_layout() {
        let settings = ImageSettings::new_3d(4, 4, 4, BufferFormat::R8Unorm)
            .with_mip_count(3)
            .sanitize();
        let list = ImageBufferList::create_buffers(&settings);

        // 4 + 2 + 1 depth slices.
        assert_eq!(list.len(), 7);
        assert_eq!(list.depth_count(0).unwrap(), 4);
        assert_eq!(list.depth_count(1).unwrap(), 2);
        assert_eq!(list.depth_count(2).unwrap(), 1);
        assert_eq!(list.index(1, 1).unwrap(), 5);

        let buffer = list.get(1, 1).unwrap();
        assert_eq!(buffer.depth_slice, 1);
        assert_eq!((buffer.width, buffer.height, buffer.depth), (2, 2, 2));
        assert_eq!(buffer.offset, 64 + 4);
    }

    #[test]
    fn test_index_out_of_range() {
        let settings = ImageSettings::new_2d(8, 8, BufferFormat::R8Unorm)
            .with_mip_count(2)
            .sanitize();
        let list = ImageBufferList::create_buffers(&settings);

        assert!(matches!(
            list.index(2, 0),
            Err(ImagingError::OutOfRange { name: "mip_level", .. })
        ));
        assert!(matches!(
            list.index(0, 1),
            Err(ImagingError::OutOfRange { name: "array_index", .. })
        ));

        let volume = ImageSettings::new_3d(4, 4, 4, BufferFormat::R8Unorm)
            .with_mip_count(2)
            .sanitize();
        let list = ImageBufferList::create_buffers(&volume);
        assert!(matches!(
            list.index(1, 2),
            Err(ImagingError::OutOfRange { name: "depth_slice", .. })
        ));
    }

    #[test]
    fn test_offsets_cover_size() {
        let settings = ImageSettings::new_cube(16, BufferFormat::Bc1Unorm)
            .with_mip_count(0)
            .sanitize();
        let list = ImageBufferList::create_buffers(&settings);

        assert_eq!(list.total_len(), settings.size_in_bytes().unwrap());
        for pair in list.descriptors().windows(2) {
            assert_eq!(pair[0].offset + pair[0].len(), pair[1].offset);
        }
    }
}
