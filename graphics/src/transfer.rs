//! Moving pixel data between images and textures.
//!
//! Uploads go through locks for dynamic and staging textures and through
//! sub-resource updates for default textures. Readback copies the texture to
//! a temporary staging texture unless it is already a staging texture.

use redlilium_core::image::{copy_pitched, ImageData, ImageSettings, ImageType};

use crate::error::{GraphicsError, GraphicsResult};
use crate::resources::{Texture, TextureLock};
use crate::types::{DeviceContext, LockFlags, TextureBox, TextureKind, TextureUsage};

fn check_upload(image: &ImageData, texture: &Texture) -> GraphicsResult<()> {
    let format_matches = image.format() == texture.format()
        || image.format().info().is_same_group(texture.format_info());
    if !format_matches {
        return Err(GraphicsError::InvalidParameter(format!(
            "cannot copy a {:?} image into a {:?} texture",
            image.format(),
            texture.format()
        )));
    }
    if image.image_type() != texture.settings().image_type() {
        return Err(GraphicsError::InvalidParameter(format!(
            "cannot copy a {:?} image into a {:?} texture",
            image.image_type(),
            texture.settings().image_type()
        )));
    }
    if texture.usage() == TextureUsage::Immutable {
        return Err(GraphicsError::InvalidState(format!(
            "texture '{}' is immutable",
            texture.name()
        )));
    }
    Ok(())
}

/// Copy sub-resource `(mip, array)` of `image` into the same sub-resource of
/// `texture`.
///
/// Indices are clamped to the last mip level and array index both share.
/// Dynamic textures are locked with discard, staging textures are locked for
/// writing and default textures are updated slice by slice.
///
/// # Errors
///
/// Returns an error if the formats or image types differ, the texture is
/// immutable, or the device fails.
pub fn copy_to_texture(
    image: &ImageData,
    texture: &Texture,
    array: u32,
    mip: u32,
    context: DeviceContext,
) -> GraphicsResult<()> {
    check_upload(image, texture)?;

    let mip = mip.min(image.mip_count().min(texture.mip_count()) - 1);
    let array = if texture.kind() == TextureKind::Texture3D {
        0
    } else {
        array.min(image.array_count().min(texture.array_count()) - 1)
    };

    match texture.usage() {
        TextureUsage::Dynamic | TextureUsage::Staging => {
            let flags = if texture.usage() == TextureUsage::Dynamic {
                LockFlags::WRITE | LockFlags::DISCARD
            } else {
                LockFlags::WRITE
            };
            let lock = texture.lock(flags, array, mip, context)?;
            let written = write_locked(image, &lock, mip, array);
            let unlocked = lock.unlock();
            written.and(unlocked)
        }
        TextureUsage::Default => {
            let (width, height, depth) = texture.mip_size(mip);
            let slices = depth.min(image.settings().mip_dimensions(mip).2);
            for slice in 0..slices {
                let index = if texture.kind() == TextureKind::Texture3D {
                    slice
                } else {
                    array
                };
                let buffer = image.buffer(mip, index)?;
                let region = TextureBox::new(0, 0, slice as i32, width, height, 1);
                texture.update_subresource(&buffer, Some(region), array, mip, context)?;
            }
            Ok(())
        }
        TextureUsage::Immutable => Err(GraphicsError::InvalidState(format!(
            "texture '{}' is immutable",
            texture.name()
        ))),
    }
}

fn write_locked(image: &ImageData, lock: &TextureLock, mip: u32, array: u32) -> GraphicsResult<()> {
    let source = image.subresource(mip, array)?;
    let layout = image.buffer(mip, if lock.depth() > 1 { 0 } else { array })?;
    let rows = layout.descriptor().rows().min(lock.slice_descriptor(0).rows()) as usize;
    let slices = image.buffers().depth_count(mip)?.min(lock.depth()) as usize;
    let mut data = lock.data_mut()?;

    if source.row_pitch == lock.row_pitch() && source.slice_pitch == lock.slice_pitch() {
        let len = data.len().min(source.data.len());
        data[..len].copy_from_slice(&source.data[..len]);
        return Ok(());
    }

    let source_slice = source.slice_pitch as usize;
    let dest_slice = lock.slice_pitch() as usize;
    for slice in 0..slices {
        copy_pitched(
            &source.data[slice * source_slice..],
            source.row_pitch as usize,
            &mut data[slice * dest_slice..],
            lock.row_pitch() as usize,
            rows,
        );
    }
    Ok(())
}

/// Copy every sub-resource both `image` and `texture` have.
///
/// # Errors
///
/// See [`copy_to_texture`].
pub fn copy_all_to_texture(
    image: &ImageData,
    texture: &Texture,
    context: DeviceContext,
) -> GraphicsResult<()> {
    check_upload(image, texture)?;
    let arrays = image.array_count().min(texture.array_count());
    let mips = image.mip_count().min(texture.mip_count());
    for array in 0..arrays {
        for mip in 0..mips {
            copy_to_texture(image, texture, array, mip, context)?;
        }
    }
    Ok(())
}

fn check_readback(texture: &Texture) -> GraphicsResult<()> {
    if texture.usage() == TextureUsage::Immutable {
        return Err(GraphicsError::InvalidState(format!(
            "texture '{}' is immutable and cannot be read back",
            texture.name()
        )));
    }
    Ok(())
}

/// Run `read` against `texture`, or against a staging copy of it.
fn with_readable<T>(
    texture: &Texture,
    context: DeviceContext,
    read: impl FnOnce(&Texture) -> GraphicsResult<T>,
) -> GraphicsResult<T> {
    if texture.usage() == TextureUsage::Staging {
        read(texture)
    } else {
        let staging = texture.staging_copy(context)?;
        read(&staging)
    }
}

/// Copy sub-resource `(mip, array)` of a staging texture into `(image_mip,
/// image_array)` of `image`.
fn read_subresource(
    source: &Texture,
    mip: u32,
    array: u32,
    image: &mut ImageData,
    image_mip: u32,
    image_array: u32,
    context: DeviceContext,
) -> GraphicsResult<()> {
    let lock = source.lock(LockFlags::READ, array, mip, context)?;
    let read = read_locked(&lock, image, image_mip, image_array);
    let unlocked = lock.unlock();
    read.and(unlocked)
}

fn read_locked(
    lock: &TextureLock,
    image: &mut ImageData,
    mip: u32,
    array: u32,
) -> GraphicsResult<()> {
    let is_volume = image.image_type() == ImageType::Image3D;
    let layout = *image.buffer(mip, if is_volume { 0 } else { array })?.descriptor();
    let rows = layout.rows().min(lock.slice_descriptor(0).rows()) as usize;
    let slices = image.buffers().depth_count(mip)?.min(lock.depth()) as usize;
    let data = lock.data();
    let dest = image.subresource_mut(mip, array)?;

    if layout.pitch.row_pitch == lock.row_pitch() && layout.pitch.slice_pitch == lock.slice_pitch()
    {
        let len = dest.len().min(data.len());
        dest[..len].copy_from_slice(&data[..len]);
        return Ok(());
    }

    let source_slice = lock.slice_pitch() as usize;
    let dest_slice = layout.pitch.slice_pitch as usize;
    for slice in 0..slices {
        copy_pitched(
            &data[slice * source_slice..],
            lock.row_pitch() as usize,
            &mut dest[slice * dest_slice..],
            layout.pitch.row_pitch as usize,
            rows,
        );
    }
    Ok(())
}

/// Read the whole texture back into a new image.
///
/// # Errors
///
/// Returns an error if the texture is immutable or multisampled, or the
/// device fails.
pub fn image_from_texture(texture: &Texture, context: DeviceContext) -> GraphicsResult<ImageData> {
    check_readback(texture)?;
    let mut image = ImageData::new(texture.settings().image_settings())?;

    with_readable(texture, context, |source| {
        for array in 0..source.array_count() {
            for mip in 0..source.mip_count() {
                read_subresource(source, mip, array, &mut image, mip, array, context)?;
            }
        }
        Ok(())
    })?;

    log::debug!(
        "Read back texture '{}' into a {} byte image",
        texture.name(),
        image.size_in_bytes()
    );
    Ok(image)
}

/// Read one sub-resource back into a new single-level image.
///
/// Cube faces come back as 2D images. Volumes ignore `array`.
///
/// # Errors
///
/// Returns an error if the texture is immutable or multisampled, an index is
/// out of range, or the device fails.
pub fn image_from_subresource(
    texture: &Texture,
    mip: u32,
    array: u32,
    context: DeviceContext,
) -> GraphicsResult<ImageData> {
    check_readback(texture)?;
    let array = if texture.kind() == TextureKind::Texture3D {
        0
    } else {
        array
    };
    if mip >= texture.mip_count() {
        return Err(GraphicsError::OutOfRange {
            name: "mip_level",
            value: i64::from(mip),
            min: 0,
            max: i64::from(texture.mip_count()) - 1,
        });
    }
    if array >= texture.array_count() {
        return Err(GraphicsError::OutOfRange {
            name: "array_index",
            value: i64::from(array),
            min: 0,
            max: i64::from(texture.array_count()) - 1,
        });
    }

    let (width, height, depth) = texture.mip_size(mip);
    let settings = match texture.kind() {
        TextureKind::Texture1D => ImageSettings::new_1d(width, texture.format()),
        TextureKind::Texture2D => ImageSettings::new_2d(width, height, texture.format()),
        TextureKind::Texture3D => ImageSettings::new_3d(width, height, depth, texture.format()),
    };
    let mut image = ImageData::new(settings)?;

    with_readable(texture, context, |source| {
        read_subresource(source, mip, array, &mut image, 0, 0, context)
    })?;
    Ok(image)
}
