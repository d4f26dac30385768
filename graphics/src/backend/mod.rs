//! Graphics device backends.
//!
//! # Available Backends
//!
//! - `dummy` (default): in-memory device for testing and development
//!
//! Native backends implement [`GraphicsDevice`](crate::GraphicsDevice) in
//! their own crates.

#[cfg(feature = "dummy")]
pub mod dummy;

#[cfg(feature = "dummy")]
pub use dummy::DummyDevice;
