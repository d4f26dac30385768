//! Resource accounting.
//!
//! Textures report their creation and destruction to a [`ResourceAccounting`]
//! sink injected through the [`TextureFactory`](crate::TextureFactory).

use std::sync::atomic::{AtomicI64, AtomicU64, Ordering};

/// Receives texture lifetime events.
pub trait ResourceAccounting: Send + Sync + std::fmt::Debug {
    /// A resource of `bytes` bytes was created.
    fn resource_created(&self, bytes: u64);

    /// A resource of `bytes` bytes was destroyed.
    fn resource_destroyed(&self, bytes: u64);
}

/// Accounting sink that ignores every event.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoAccounting;

impl ResourceAccounting for NoAccounting {
    fn resource_created(&self, _bytes: u64) {}

    fn resource_destroyed(&self, _bytes: u64) {}
}

/// Live texture count and byte total.
#[derive(Debug, Default)]
pub struct TextureStats {
    live_count: AtomicI64,
    total_bytes: AtomicU64,
}

impl TextureStats {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the number of live textures.
    pub fn live_count(&self) -> i64 {
        self.live_count.load(Ordering::Acquire)
    }

    /// Get the number of bytes held by live textures.
    pub fn total_bytes(&self) -> u64 {
        self.total_bytes.load(Ordering::Acquire)
    }
}

impl ResourceAccounting for TextureStats {
    fn resource_created(&self, bytes: u64) {
        self.live_count.fetch_add(1, Ordering::AcqRel);
        self.total_bytes.fetch_add(bytes, Ordering::AcqRel);
    }

    fn resource_destroyed(&self, bytes: u64) {
        self.live_count.fetch_sub(1, Ordering::AcqRel);
        // Saturate so a mismatched event cannot wrap the total.
        let _ = self
            .total_bytes
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |total| {
                Some(total.saturating_sub(bytes))
            });
    }
}

static_assertions::assert_impl_all!(TextureStats: Send, Sync);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stats_track_events() {
        let stats = TextureStats::new();
        stats.resource_created(1024);
        stats.resource_created(256);
        assert_eq!(stats.live_count(), 2);
        assert_eq!(stats.total_bytes(), 1280);

        stats.resource_destroyed(1024);
        assert_eq!(stats.live_count(), 1);
        assert_eq!(stats.total_bytes(), 256);
    }

    #[test]
    fn test_destroy_saturates() {
        let stats = TextureStats::new();
        stats.resource_destroyed(10);
        assert_eq!(stats.total_bytes(), 0);
    }
}
