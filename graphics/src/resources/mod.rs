//! Texture resources.
//!
//! This module contains the resource types created by the
//! [`TextureFactory`](crate::TextureFactory):
//! - [`Texture`] - a texture and its native device object
//! - [`TextureView`] - a cached view of a texture
//! - [`TextureLock`] - CPU access to one mapped sub-resource
//!
//! Textures are reference-counted with [`Arc`] and can be shared across
//! threads. Views and locks are owned by per-texture caches that hold at most
//! one live object per set of parameters.
//!
//! [`Arc`]: std::sync::Arc

mod lock;
mod texture;
mod view;
mod view_cache;

pub use lock::{LockCache, LockKey, TextureLock};
pub use texture::{CopyRegion, Texture};
pub use view::TextureView;
pub use view_cache::ViewCache;

pub(crate) use texture::validate_initial_data;
