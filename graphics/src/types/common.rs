//! Common types shared across the graphics system.

/// Device context a command is recorded on.
///
/// Every device-touching call takes the context explicitly. Multi-step
/// creation and upload sequences are only allowed on the immediate context.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub enum DeviceContext {
    /// The immediate (primary) context.
    #[default]
    Immediate,
    /// A deferred (secondary) context, identified by index.
    Deferred(u32),
}

impl DeviceContext {
    /// Returns true for deferred contexts.
    pub fn is_deferred(&self) -> bool {
        matches!(self, Self::Deferred(_))
    }
}

/// A 3D region of a texture sub-resource, in pixels.
///
/// The position is signed so that callers can describe regions that start
/// outside the resource; operations clip them before use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct TextureBox {
    pub x: i32,
    pub y: i32,
    pub z: i32,
    pub width: u32,
    pub height: u32,
    pub depth: u32,
}

impl TextureBox {
    pub fn new(x: i32, y: i32, z: i32, width: u32, height: u32, depth: u32) -> Self {
        Self {
            x,
            y,
            z,
            width,
            height,
            depth,
        }
    }

    /// Create a region covering `width` × `height` × `depth` from the origin.
    pub fn from_size(width: u32, height: u32, depth: u32) -> Self {
        Self::new(0, 0, 0, width, height, depth)
    }

    /// Create a 2D region one slice deep.
    pub fn new_2d(x: i32, y: i32, width: u32, height: u32) -> Self {
        Self::new(x, y, 0, width, height, 1)
    }

    /// Returns true if the region covers no pixels.
    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0 || self.depth == 0
    }

    /// Clip the region to `0..width`, `0..height`, `0..depth`.
    ///
    /// The result never has a negative origin, and its size never grows.
    pub fn clamp_to(&self, width: u32, height: u32, depth: u32) -> Self {
        fn axis(start: i32, size: u32, limit: u32) -> (i32, u32) {
            let start = i64::from(start);
            let end = (start + i64::from(size)).min(i64::from(limit));
            let start = start.clamp(0, i64::from(limit));
            (start as i32, (end - start).max(0) as u32)
        }

        let (x, width) = axis(self.x, self.width, width);
        let (y, height) = axis(self.y, self.height, height);
        let (z, depth) = axis(self.z, self.depth, depth);
        Self::new(x, y, z, width, height, depth)
    }
}
