//! # RedLilium Core
//!
//! CPU-side image data for the RedLilium texture subsystem: pixel format
//! metadata, image layouts, transforms and codecs.

pub mod error;
pub mod image;

pub use error::{ImagingError, ImagingResult};

/// Core library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub fn init() {
    log::info!("RedLilium Core v{} initialized", VERSION);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }
}
