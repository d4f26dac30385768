//! Imaging error types.

use crate::image::BufferFormat;

/// Result type for imaging operations.
pub type ImagingResult<T> = Result<T, ImagingError>;

/// Errors that can occur while building, transforming or persisting image data.
#[derive(Debug, thiserror::Error)]
pub enum ImagingError {
    /// An argument was invalid for the requested operation.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// A numeric argument was outside of its valid range.
    #[error("{name} value {value} is out of range [{min}, {max}]")]
    OutOfRange {
        name: &'static str,
        value: i64,
        min: i64,
        max: i64,
    },

    /// The pixel format cannot be used for the requested operation.
    #[error("format {0:?} is not supported for this operation")]
    FormatNotSupported(BufferFormat),

    /// Supplied data does not match the size required by the image settings.
    #[error("size mismatch: expected at least {expected} bytes, got {actual}")]
    SizeMismatch { expected: usize, actual: usize },

    /// A codec reported that the data cannot be decoded by it.
    #[error("the data cannot be decoded by the {codec} codec")]
    NotReadable { codec: String },

    /// A codec failed while encoding or decoding.
    #[error("codec error: {0}")]
    Codec(String),

    /// An I/O error occurred.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The image library reported an error.
    #[cfg(feature = "codecs")]
    #[error("image error: {0}")]
    Image(#[from] image::ImageError),
}

impl ImagingError {
    /// Build an [`ImagingError::OutOfRange`] for an index with an exclusive upper bound.
    pub(crate) fn index(name: &'static str, value: u32, count: u32) -> Self {
        Self::OutOfRange {
            name,
            value: i64::from(value),
            min: 0,
            max: i64::from(count) - 1,
        }
    }
}
