//! Common types and descriptors for texture resources.
//!
//! This module contains texture settings, usage and binding flags, view
//! descriptors and the regions used by copy operations.

mod common;
mod texture;
mod view;

pub use common::{DeviceContext, TextureBox};
pub use texture::{
    LockFlags, Multisampling, TextureBinding, TextureDimensions, TextureKind, TextureSettings,
    TextureUsage,
};
pub use view::{ViewDescriptor, ViewKey, ViewKind};
