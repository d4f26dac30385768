//! Dummy graphics device for testing and development.
//!
//! This device doesn't talk to a GPU. Every sub-resource is kept in memory
//! with tightly packed pitches, so uploads, copies, maps and resolves can be
//! observed by tests without requiring GPU hardware.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::Mutex;
use redlilium_core::image::{
    copy_pitched, mip_extent, BufferDescriptor, BufferFormat, FormatInfo, ImageBuffer,
    ImageBufferMut, PitchFlags, PitchLayout, Rect, SubresourceData,
};

use crate::device::{
    DeviceCapabilities, FormatSupport, GraphicsDevice, MapMode, MappedSubresource,
    SubresourceCopy, TextureDescriptor, TextureHandle, ViewHandle,
};
use crate::error::{GraphicsError, GraphicsResult};
use crate::types::{DeviceContext, TextureBox, TextureKind, ViewDescriptor};

/// One sub-resource: every depth slice of one `(mip, array)` pair.
#[derive(Debug)]
struct DummySubresource {
    width: u32,
    height: u32,
    depth: u32,
    pitch: PitchLayout,
    data: Vec<u8>,
}

impl DummySubresource {
    fn slice_mut(&mut self, z: u32) -> &mut [u8] {
        let len = self.pitch.slice_pitch as usize;
        let start = z as usize * len;
        &mut self.data[start..start + len]
    }
}

#[derive(Debug)]
struct DummyTexture {
    descriptor: TextureDescriptor,
    subresources: Vec<DummySubresource>,
}

impl DummyTexture {
    fn subresource(&self, index: u32) -> GraphicsResult<&DummySubresource> {
        self.subresources.get(index as usize).ok_or_else(|| {
            GraphicsError::index("subresource", index, self.subresources.len() as u32)
        })
    }

    fn subresource_mut(&mut self, index: u32) -> GraphicsResult<&mut DummySubresource> {
        let count = self.subresources.len() as u32;
        self.subresources
            .get_mut(index as usize)
            .ok_or_else(|| GraphicsError::index("subresource", index, count))
    }
}

#[derive(Debug, Default)]
struct DummyState {
    textures: HashMap<TextureHandle, DummyTexture>,
    views: HashMap<ViewHandle, (TextureHandle, ViewDescriptor)>,
    mapped: HashMap<(DeviceContext, TextureHandle, u32), MapMode>,
}

impl DummyState {
    fn texture(&self, handle: TextureHandle) -> GraphicsResult<&DummyTexture> {
        self.textures.get(&handle).ok_or_else(|| {
            GraphicsError::InvalidParameter(format!("unknown texture handle {}", handle.raw()))
        })
    }

    fn texture_mut(&mut self, handle: TextureHandle) -> GraphicsResult<&mut DummyTexture> {
        self.textures.get_mut(&handle).ok_or_else(|| {
            GraphicsError::InvalidParameter(format!("unknown texture handle {}", handle.raw()))
        })
    }
}

/// In-memory graphics device.
#[derive(Debug)]
pub struct DummyDevice {
    name: String,
    capabilities: DeviceCapabilities,
    format_overrides: HashMap<BufferFormat, FormatSupport>,
    state: Mutex<DummyState>,
    next_handle: AtomicU64,
}

impl DummyDevice {
    /// Create a new dummy device with SM5 capabilities.
    pub fn new() -> Self {
        Self {
            name: "Dummy Device".to_string(),
            capabilities: DeviceCapabilities::default(),
            format_overrides: HashMap::new(),
            state: Mutex::new(DummyState::default()),
            next_handle: AtomicU64::new(1),
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn with_capabilities(mut self, capabilities: DeviceCapabilities) -> Self {
        self.capabilities = capabilities;
        self
    }

    /// Override the support reported for one format.
    pub fn with_format_support(mut self, format: BufferFormat, support: FormatSupport) -> Self {
        self.format_overrides.insert(format, support);
        self
    }

    /// Get the number of live textures.
    pub fn texture_count(&self) -> usize {
        self.state.lock().textures.len()
    }

    /// Get the number of live views.
    pub fn view_count(&self) -> usize {
        self.state.lock().views.len()
    }

    /// Get the number of mapped sub-resources.
    pub fn mapped_count(&self) -> usize {
        self.state.lock().mapped.len()
    }

    /// Get a copy of the bytes of a sub-resource (all depth slices, tight pitches).
    pub fn subresource_bytes(&self, texture: TextureHandle, subresource: u32) -> Option<Vec<u8>> {
        let state = self.state.lock();
        state
            .textures
            .get(&texture)?
            .subresources
            .get(subresource as usize)
            .map(|sub| sub.data.clone())
    }

    /// Get the descriptor a texture was created with.
    pub fn texture_descriptor(&self, texture: TextureHandle) -> Option<TextureDescriptor> {
        let state = self.state.lock();
        state.textures.get(&texture).map(|t| t.descriptor.clone())
    }

    fn allocate_handle(&self) -> u64 {
        self.next_handle.fetch_add(1, Ordering::Relaxed)
    }
}

impl Default for DummyDevice {
    fn default() -> Self {
        Self::new()
    }
}

/// Support reported for a format unless overridden.
fn default_format_support(format: BufferFormat) -> FormatSupport {
    let info = FormatInfo::new(format);
    if format == BufferFormat::Unknown {
        FormatSupport::empty()
    } else if info.has_depth() || info.has_stencil() {
        FormatSupport::TEXTURE1D
            | FormatSupport::TEXTURE2D
            | FormatSupport::TEXTURE_CUBE
            | FormatSupport::MIP
            | FormatSupport::DEPTH_STENCIL
            | FormatSupport::MULTISAMPLE_RENDER_TARGET
    } else if info.is_compressed() {
        FormatSupport::TEXTURE2D
            | FormatSupport::TEXTURE3D
            | FormatSupport::TEXTURE_CUBE
            | FormatSupport::MIP
            | FormatSupport::SHADER_SAMPLE
    } else if info.is_typeless() {
        FormatSupport::TEXTURE1D
            | FormatSupport::TEXTURE2D
            | FormatSupport::TEXTURE3D
            | FormatSupport::TEXTURE_CUBE
            | FormatSupport::MIP
            | FormatSupport::MULTISAMPLE_RENDER_TARGET
    } else {
        FormatSupport::all() - FormatSupport::DEPTH_STENCIL
    }
}

/// Copy `region` of `source` (tight pitches) into `dest` at `(dest_x, dest_y)`.
#[allow(clippy::too_many_arguments)]
fn copy_slice(
    source: &[u8],
    source_size: (u32, u32),
    dest: &mut [u8],
    dest_size: (u32, u32),
    format: BufferFormat,
    region: Rect,
    dest_x: u32,
    dest_y: u32,
) -> GraphicsResult<()> {
    let src = ImageBuffer::new(
        BufferDescriptor::slice(source_size.0, source_size.1, format),
        source,
    )?;
    let mut dst = ImageBufferMut::new(BufferDescriptor::slice(dest_size.0, dest_size.1, format), dest)?;
    src.copy_to(&mut dst, Some(region), dest_x as i32, dest_y as i32)?;
    Ok(())
}

impl GraphicsDevice for DummyDevice {
    fn name(&self) -> &str {
        &self.name
    }

    fn capabilities(&self) -> &DeviceCapabilities {
        &self.capabilities
    }

    fn format_support(&self, format: BufferFormat) -> FormatSupport {
        self.format_overrides
            .get(&format)
            .copied()
            .unwrap_or_else(|| default_format_support(format))
    }

    fn create_texture(
        &self,
        descriptor: &TextureDescriptor,
        initial: Option<&[SubresourceData<'_>]>,
    ) -> GraphicsResult<TextureHandle> {
        let settings = &descriptor.settings;
        log::trace!(
            "DummyDevice: creating texture {:?} ({}x{}x{}, {} mips, {} arrays, {:?})",
            descriptor.label,
            settings.width(),
            settings.height(),
            settings.depth(),
            settings.mip_count,
            settings.array_count(),
            settings.format
        );

        if settings.width() == 0 || settings.height() == 0 || settings.depth() == 0 {
            return Err(GraphicsError::ResourceCreationFailed(
                "texture dimensions cannot be zero".to_string(),
            ));
        }
        if settings.mip_count == 0 || settings.format == BufferFormat::Unknown {
            return Err(GraphicsError::ResourceCreationFailed(
                "texture descriptor is not resolved".to_string(),
            ));
        }

        let count = descriptor.subresource_count() as usize;
        if let Some(initial) = initial {
            if initial.len() < count {
                return Err(GraphicsError::InvalidParameter(format!(
                    "{} initial sub-resources provided, {} required",
                    initial.len(),
                    count
                )));
            }
        }

        let info = FormatInfo::new(settings.format);
        let is_volume = settings.kind() == TextureKind::Texture3D;
        let mut subresources = Vec::with_capacity(count);

        for _array in 0..settings.array_count() {
            for mip in 0..settings.mip_count {
                let width = mip_extent(settings.width(), mip);
                let height = mip_extent(settings.height(), mip);
                let depth = if is_volume {
                    mip_extent(settings.depth(), mip)
                } else {
                    1
                };
                let pitch = info.pitch(width, height, PitchFlags::empty());
                let mut data = vec![0u8; pitch.slice_pitch as usize * depth as usize];

                if let Some(initial) = initial {
                    let source = &initial[subresources.len()];
                    let rows = pitch.rows(height) as usize;
                    for z in 0..depth as usize {
                        let src_start = z * source.slice_pitch as usize;
                        let dst_start = z * pitch.slice_pitch as usize;
                        let Some(src) = source.data.get(src_start..) else {
                            break;
                        };
                        copy_pitched(
                            src,
                            source.row_pitch as usize,
                            &mut data[dst_start..dst_start + pitch.slice_pitch as usize],
                            pitch.row_pitch as usize,
                            rows,
                        );
                    }
                }

                subresources.push(DummySubresource {
                    width,
                    height,
                    depth,
                    pitch,
                    data,
                });
            }
        }

        let handle = TextureHandle::new(self.allocate_handle());
        self.state.lock().textures.insert(
            handle,
            DummyTexture {
                descriptor: descriptor.clone(),
                subresources,
            },
        );
        Ok(handle)
    }

    fn destroy_texture(&self, texture: TextureHandle) {
        log::trace!("DummyDevice: destroying texture {}", texture.raw());
        let mut state = self.state.lock();
        state.textures.remove(&texture);
        state.mapped.retain(|(_, handle, _), _| *handle != texture);
    }

    fn create_view(
        &self,
        texture: TextureHandle,
        descriptor: &ViewDescriptor,
    ) -> GraphicsResult<ViewHandle> {
        log::trace!(
            "DummyDevice: creating {:?} view of texture {} ({:?})",
            descriptor.kind,
            texture.raw(),
            descriptor.format
        );
        let mut state = self.state.lock();
        state.texture(texture)?;
        let handle = ViewHandle::new(self.allocate_handle());
        state.views.insert(handle, (texture, *descriptor));
        Ok(handle)
    }

    fn destroy_view(&self, view: ViewHandle) {
        log::trace!("DummyDevice: destroying view {}", view.raw());
        self.state.lock().views.remove(&view);
    }

    fn map(
        &self,
        context: DeviceContext,
        texture: TextureHandle,
        subresource: u32,
        mode: MapMode,
    ) -> GraphicsResult<MappedSubresource> {
        log::trace!(
            "DummyDevice: map texture {} sub-resource {} ({:?}, {:?})",
            texture.raw(),
            subresource,
            mode,
            context
        );
        let mut state = self.state.lock();
        let key = (context, texture, subresource);
        if state.mapped.contains_key(&key) {
            return Err(GraphicsError::InvalidState(format!(
                "sub-resource {} of texture {} is already mapped",
                subresource,
                texture.raw()
            )));
        }

        let sub = state.texture(texture)?.subresource(subresource)?;
        let data = if mode == MapMode::WriteDiscard {
            vec![0u8; sub.data.len()]
        } else {
            sub.data.clone()
        };
        let mapped = MappedSubresource {
            data,
            row_pitch: sub.pitch.row_pitch,
            slice_pitch: sub.pitch.slice_pitch,
        };

        state.mapped.insert(key, mode);
        Ok(mapped)
    }

    fn unmap(
        &self,
        context: DeviceContext,
        texture: TextureHandle,
        subresource: u32,
        written: Option<&[u8]>,
    ) -> GraphicsResult<()> {
        log::trace!(
            "DummyDevice: unmap texture {} sub-resource {}",
            texture.raw(),
            subresource
        );
        let mut state = self.state.lock();
        let Some(mode) = state.mapped.remove(&(context, texture, subresource)) else {
            return Err(GraphicsError::InvalidState(format!(
                "sub-resource {} of texture {} is not mapped",
                subresource,
                texture.raw()
            )));
        };

        if let (true, Some(written)) = (mode.is_write(), written) {
            let sub = state.texture_mut(texture)?.subresource_mut(subresource)?;
            let len = sub.data.len().min(written.len());
            sub.data[..len].copy_from_slice(&written[..len]);
        }

        Ok(())
    }

    fn copy_subresource_region(
        &self,
        context: DeviceContext,
        copy: &SubresourceCopy,
    ) -> GraphicsResult<()> {
        log::trace!(
            "DummyDevice: copy texture {}[{}] {:?} -> texture {}[{}] at ({}, {}, {}) on {:?}",
            copy.source.raw(),
            copy.source_subresource,
            copy.source_box,
            copy.dest.raw(),
            copy.dest_subresource,
            copy.dest_x,
            copy.dest_y,
            copy.dest_z,
            context
        );
        let mut state = self.state.lock();

        let (source, source_size, source_depth) = {
            let sub = state.texture(copy.source)?.subresource(copy.source_subresource)?;
            (sub.data.clone(), (sub.width, sub.height), sub.depth)
        };
        let slice_len = source.len() / source_depth.max(1) as usize;

        let dest_texture = state.texture_mut(copy.dest)?;
        let format = dest_texture.descriptor.settings.format;
        let dest = dest_texture.subresource_mut(copy.dest_subresource)?;
        let region = Rect::new(
            copy.source_box.x,
            copy.source_box.y,
            copy.source_box.width,
            copy.source_box.height,
        );

        for slice in 0..copy.source_box.depth {
            let src_z = copy.source_box.z.max(0) as u32 + slice;
            let dst_z = copy.dest_z + slice;
            if src_z >= source_depth || dst_z >= dest.depth {
                break;
            }
            let src = &source[src_z as usize * slice_len..(src_z as usize + 1) * slice_len];
            let dest_size = (dest.width, dest.height);
            copy_slice(
                src,
                source_size,
                dest.slice_mut(dst_z),
                dest_size,
                format,
                region,
                copy.dest_x,
                copy.dest_y,
            )?;
        }

        Ok(())
    }

    fn update_subresource(
        &self,
        context: DeviceContext,
        texture: TextureHandle,
        subresource: u32,
        dest_box: &TextureBox,
        data: SubresourceData<'_>,
    ) -> GraphicsResult<()> {
        log::trace!(
            "DummyDevice: update texture {} sub-resource {} {:?} ({} bytes) on {:?}",
            texture.raw(),
            subresource,
            dest_box,
            data.data.len(),
            context
        );
        let mut state = self.state.lock();
        let dest_texture = state.texture_mut(texture)?;
        let format = dest_texture.descriptor.settings.format;
        let dest = dest_texture.subresource_mut(subresource)?;

        let info = FormatInfo::new(format);
        let tight = info.pitch(dest_box.width, dest_box.height, PitchFlags::empty());
        let rows = tight.rows(dest_box.height) as usize;

        for slice in 0..dest_box.depth {
            let dst_z = dest_box.z.max(0) as u32 + slice;
            if dst_z >= dest.depth {
                break;
            }
            let start = slice as usize * data.slice_pitch as usize;
            let source = data.data.get(start..).unwrap_or(&[]);
            let mut packed = vec![0u8; tight.slice_pitch as usize];
            copy_pitched(
                source,
                data.row_pitch as usize,
                &mut packed,
                tight.row_pitch as usize,
                rows,
            );

            let dest_size = (dest.width, dest.height);
            copy_slice(
                &packed,
                (dest_box.width, dest_box.height),
                dest.slice_mut(dst_z),
                dest_size,
                format,
                Rect::new(0, 0, dest_box.width, dest_box.height),
                dest_box.x.max(0) as u32,
                dest_box.y.max(0) as u32,
            )?;
        }

        Ok(())
    }

    fn resolve_subresource(
        &self,
        context: DeviceContext,
        dest: TextureHandle,
        dest_subresource: u32,
        source: TextureHandle,
        source_subresource: u32,
        format: BufferFormat,
    ) -> GraphicsResult<()> {
        log::trace!(
            "DummyDevice: resolve texture {}[{}] -> texture {}[{}] as {:?} on {:?}",
            source.raw(),
            source_subresource,
            dest.raw(),
            dest_subresource,
            format,
            context
        );
        let mut state = self.state.lock();
        let data = state
            .texture(source)?
            .subresource(source_subresource)?
            .data
            .clone();
        let dest = state.texture_mut(dest)?.subresource_mut(dest_subresource)?;
        let len = dest.data.len().min(data.len());
        dest.data[..len].copy_from_slice(&data[..len]);
        Ok(())
    }
}
