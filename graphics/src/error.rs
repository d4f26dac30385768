//! Graphics error types.

use redlilium_core::ImagingError;

/// Result type for graphics operations.
pub type GraphicsResult<T> = Result<T, GraphicsError>;

/// Errors that can occur in the graphics system.
#[derive(Debug, thiserror::Error)]
pub enum GraphicsError {
    /// An invalid parameter was provided.
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    /// An index or size was outside of its valid range.
    #[error("{name} value {value} is out of range [{min}, {max}]")]
    OutOfRange {
        name: &'static str,
        value: i64,
        min: i64,
        max: i64,
    },

    /// A requested feature is not supported by the resource or device.
    #[error("feature not supported: {0}")]
    FeatureNotSupported(String),

    /// The operation is not allowed in the current state of the resource.
    #[error("invalid state: {0}")]
    InvalidState(String),

    /// Failed to create a resource.
    #[error("resource creation failed: {0}")]
    ResourceCreationFailed(String),

    /// The GPU device was lost.
    #[error("GPU device lost")]
    DeviceLost,

    /// An image operation failed.
    #[error(transparent)]
    Imaging(#[from] ImagingError),
}

impl GraphicsError {
    /// Build an [`GraphicsError::OutOfRange`] for an index with an exclusive upper bound.
    pub(crate) fn index(name: &'static str, value: u32, count: u32) -> Self {
        Self::OutOfRange {
            name,
            value: i64::from(value),
            min: 0,
            max: i64::from(count) - 1,
        }
    }
}
