//! Sub-resource locks and the per-texture lock cache.
//!
//! A [`TextureLock`] holds a CPU mirror of one mapped sub-resource. The
//! mirror is handed back to the device when the lock is released, so writes
//! made through [`TextureLock::data_mut`] reach the texture on unlock.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};

use parking_lot::{Mutex, MutexGuard};
use redlilium_core::image::{BufferDescriptor, BufferFormat, FormatInfo, PitchFlags};

use crate::device::{GraphicsDevice, MapMode, TextureHandle};
use crate::error::{GraphicsError, GraphicsResult};
use crate::types::{DeviceContext, LockFlags};

/// Identifies an open lock: at most one per context, mip level and array index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct LockKey {
    pub context: DeviceContext,
    pub mip: u32,
    pub array: u32,
}

/// The sub-resource a lock maps, with its dimensions at that mip level.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct LockTarget {
    pub texture: TextureHandle,
    pub subresource: u32,
    pub width: u32,
    pub height: u32,
    pub depth: u32,
    pub format: BufferFormat,
}

/// An open lock on one texture sub-resource.
pub struct TextureLock {
    cache: Weak<LockTable>,
    key: LockKey,
    target: LockTarget,
    flags: LockFlags,
    mode: MapMode,
    row_pitch: u32,
    slice_pitch: u32,
    data: Mutex<Vec<u8>>,
    open: AtomicBool,
}

impl std::fmt::Debug for TextureLock {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TextureLock")
            .field("key", &self.key)
            .field("flags", &self.flags)
            .field("mode", &self.mode)
            .field("row_pitch", &self.row_pitch)
            .field("slice_pitch", &self.slice_pitch)
            .field("open", &self.is_open())
            .finish()
    }
}

impl TextureLock {
    /// Get the cache key of the lock.
    pub fn key(&self) -> LockKey {
        self.key
    }

    /// Get the device context the sub-resource is mapped on.
    pub fn context(&self) -> DeviceContext {
        self.key.context
    }

    /// Get the locked mip level.
    pub fn mip(&self) -> u32 {
        self.key.mip
    }

    /// Get the locked array index (0 for volumes).
    pub fn array(&self) -> u32 {
        self.key.array
    }

    /// Get the flags the lock was opened with, after validation.
    pub fn flags(&self) -> LockFlags {
        self.flags
    }

    /// Get the device map mode derived from the flags.
    pub fn mode(&self) -> MapMode {
        self.mode
    }

    /// Get the width of the locked mip level.
    pub fn width(&self) -> u32 {
        self.target.width
    }

    /// Get the height of the locked mip level.
    pub fn height(&self) -> u32 {
        self.target.height
    }

    /// Get the number of depth slices in the mapped data.
    pub fn depth(&self) -> u32 {
        self.target.depth
    }

    /// Get the texture format.
    pub fn format(&self) -> BufferFormat {
        self.target.format
    }

    /// Get the bytes between rows (block rows for compressed formats).
    pub fn row_pitch(&self) -> u32 {
        self.row_pitch
    }

    /// Get the bytes between depth slices.
    pub fn slice_pitch(&self) -> u32 {
        self.slice_pitch
    }

    /// Get the layout of depth slice `slice` within [`data`](Self::data).
    pub fn slice_descriptor(&self, slice: u32) -> BufferDescriptor {
        let mut pitch = FormatInfo::new(self.target.format).pitch(
            self.target.width,
            self.target.height,
            PitchFlags::empty(),
        );
        pitch.row_pitch = self.row_pitch;
        pitch.slice_pitch = self.slice_pitch;
        let mut descriptor = BufferDescriptor::with_pitch(
            self.target.width,
            self.target.height,
            self.target.format,
            pitch,
        );
        descriptor.depth_slice = slice;
        descriptor.offset = slice as usize * self.slice_pitch as usize;
        descriptor
    }

    /// Returns true until the lock is released.
    pub fn is_open(&self) -> bool {
        self.open.load(Ordering::Acquire)
    }

    /// Access the mapped data.
    pub fn data(&self) -> MutexGuard<'_, Vec<u8>> {
        self.data.lock()
    }

    /// Access the mapped data for writing.
    ///
    /// # Errors
    ///
    /// Returns an error if the lock is read-only or already released.
    pub fn data_mut(&self) -> GraphicsResult<MutexGuard<'_, Vec<u8>>> {
        if !self.mode.is_write() {
            return Err(GraphicsError::InvalidState(
                "lock was opened for reading only".to_string(),
            ));
        }
        if !self.is_open() {
            return Err(GraphicsError::InvalidState("lock is released".to_string()));
        }
        Ok(self.data.lock())
    }

    /// Release the lock, writing the data back for write modes.
    ///
    /// # Errors
    ///
    /// Returns an error if the lock is already released or the device unmap fails.
    pub fn unlock(&self) -> GraphicsResult<()> {
        match self.cache.upgrade() {
            Some(table) => table.unlock(self),
            None => Err(GraphicsError::InvalidState(
                "lock outlived its texture".to_string(),
            )),
        }
    }

    /// Mark the lock closed and unmap it. Returns false if it was already closed.
    fn close(&self, device: &dyn GraphicsDevice) -> GraphicsResult<bool> {
        if !self.open.swap(false, Ordering::AcqRel) {
            return Ok(false);
        }
        let data = self.data.lock();
        let written = self.mode.is_write().then_some(data.as_slice());
        device.unmap(
            self.key.context,
            self.target.texture,
            self.target.subresource,
            written,
        )?;
        Ok(true)
    }
}

#[derive(Debug)]
struct LockTable {
    device: Arc<dyn GraphicsDevice>,
    locks: Mutex<HashMap<LockKey, Arc<TextureLock>>>,
}

impl LockTable {
    fn unlock(&self, lock: &TextureLock) -> GraphicsResult<()> {
        {
            let mut locks = self.locks.lock();
            if let Some(current) = locks.get(&lock.key) {
                if std::ptr::eq(Arc::as_ptr(current), lock) {
                    locks.remove(&lock.key);
                }
            }
        }

        if lock.close(self.device.as_ref())? {
            log::trace!("LockCache: released {:?}", lock.key);
            Ok(())
        } else {
            Err(GraphicsError::InvalidState("lock is already released".to_string()))
        }
    }
}

/// Cache of open locks of one texture.
#[derive(Debug)]
pub struct LockCache {
    table: Arc<LockTable>,
}

impl LockCache {
    pub fn new(device: Arc<dyn GraphicsDevice>) -> Self {
        Self {
            table: Arc::new(LockTable {
                device,
                locks: Mutex::new(HashMap::new()),
            }),
        }
    }

    /// Get the open lock for `key`, or map the sub-resource and open one.
    ///
    /// # Errors
    ///
    /// Returns an error if the device cannot map the sub-resource.
    pub(crate) fn lock(
        &self,
        target: LockTarget,
        key: LockKey,
        flags: LockFlags,
    ) -> GraphicsResult<Arc<TextureLock>> {
        let mut locks = self.table.locks.lock();
        if let Some(existing) = locks.get(&key) {
            return Ok(Arc::clone(existing));
        }

        let mode = MapMode::from_lock_flags(flags);
        let mapped = self
            .table
            .device
            .map(key.context, target.texture, target.subresource, mode)?;
        let lock = Arc::new(TextureLock {
            cache: Arc::downgrade(&self.table),
            key,
            target,
            flags,
            mode,
            row_pitch: mapped.row_pitch,
            slice_pitch: mapped.slice_pitch,
            data: Mutex::new(mapped.data),
            open: AtomicBool::new(true),
        });
        locks.insert(key, Arc::clone(&lock));
        log::trace!("LockCache: opened {:?} as {:?}", key, mode);
        Ok(lock)
    }

    /// Get the open lock for `key`, if any.
    pub fn get(&self, key: &LockKey) -> Option<Arc<TextureLock>> {
        self.table.locks.lock().get(key).cloned()
    }

    /// Release every open lock.
    pub fn unlock_all(&self) {
        let locks: Vec<_> = self.table.locks.lock().drain().map(|(_, lock)| lock).collect();
        if !locks.is_empty() {
            log::debug!("LockCache: force-releasing {} locks", locks.len());
        }
        for lock in locks {
            if let Err(err) = lock.close(self.table.device.as_ref()) {
                log::warn!("LockCache: failed to release {:?}: {}", lock.key, err);
            }
        }
    }

    /// Number of open locks.
    pub fn len(&self) -> usize {
        self.table.locks.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.table.locks.lock().is_empty()
    }
}

impl Drop for LockCache {
    fn drop(&mut self) {
        self.unlock_all();
    }
}

static_assertions::assert_impl_all!(TextureLock: Send, Sync);
static_assertions::assert_impl_all!(LockCache: Send, Sync);
