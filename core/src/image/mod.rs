//! CPU-side image data.
//!
//! [`ImageData`] owns one contiguous allocation holding every array index,
//! mip level and depth slice of an image. [`ImageBufferList`] describes where
//! each sub-image lives in that allocation, and [`FormatInfo`] answers layout
//! questions about a [`BufferFormat`].

mod buffer;
mod buffer_list;
mod codec;
mod data;
mod format;
mod pixel;
mod settings;
mod transform;

pub use buffer::{copy_pitched, BufferDescriptor, ImageBuffer, ImageBufferMut, Rect};
pub use buffer_list::ImageBufferList;
pub use codec::{CodecOptions, ImageCodec, RawCodec};
#[cfg(feature = "codecs")]
pub use codec::{ImageFileFormat, ImageFormatCodec};
pub use data::{ImageData, SubresourceData};
pub use format::{BufferFormat, FormatInfo, PitchFlags, PitchLayout};
pub use settings::{depth_slice_count, max_mip_count, mip_extent, ImageSettings, ImageType};
#[cfg(feature = "codecs")]
pub use transform::ImageCrateTransform;
pub use transform::{ConvertOptions, ImageDithering, ImageFilter, ImageTransform};
