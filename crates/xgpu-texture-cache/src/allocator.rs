//! Host image allocation for cached textures.

use std::sync::Arc;

use tracing::debug;
use xgpu_xenos::{TextureDescription, IDENTITY_SWIZZLE};

use crate::device::{
    component_mapping, host_format, HostDevice, HostFormat, ImageDesc, ImageLayout, ImageUsage,
    ViewDesc,
};
use crate::error::DeviceError;
use crate::guest_memory::GuestMemory;
use crate::invalidation::cancel_watch;
use crate::texture::{Texture, TextureLocation, TextureView, WatchState};

/// Creates the host image for `description` plus a default identity view.
pub(crate) fn allocate_texture<D: HostDevice + ?Sized>(
    device: &mut D,
    description: &TextureDescription,
    location: TextureLocation,
) -> Result<Texture, DeviceError> {
    let format = host_format(description.format).unwrap_or_else(|| {
        debug!(format = ?description.format, "no host format; falling back to RGBA8");
        HostFormat::R8G8B8A8Unorm
    });

    let image = device.create_image(&ImageDesc {
        dimension: description.dimension,
        format,
        width: description.width + 1,
        height: description.height + 1,
        depth: description.depth + 1,
        usage: ImageUsage::SAMPLED | ImageUsage::TRANSFER_SRC | ImageUsage::TRANSFER_DST,
    })?;

    let view = device.create_view(
        image,
        &ViewDesc {
            dimension: description.dimension,
            format,
            components: component_mapping(IDENTITY_SWIZZLE),
        },
    );
    let view = match view {
        Ok(view) => view,
        Err(err) => {
            device.destroy_image(image);
            return Err(err);
        }
    };

    Ok(Texture {
        description: *description,
        image,
        format,
        layout: ImageLayout::Undefined,
        views: vec![TextureView {
            swizzle: IDENTITY_SWIZZLE,
            view,
        }],
        is_full_texture: true,
        in_flight: None,
        location,
        watch: Arc::new(WatchState::default()),
    })
}

/// Whether the device has finished every submission that reads `texture`.
pub(crate) fn is_idle<D: HostDevice + ?Sized>(device: &D, texture: &Texture) -> bool {
    texture
        .in_flight
        .map_or(true, |signal| device.signal_fired(signal))
}

/// Destroys `texture`'s views and image and cancels its watch.
///
/// Callers check [`is_idle`] first unless the device is known to be idle.
pub(crate) fn release_texture<D: HostDevice + ?Sized>(
    device: &mut D,
    memory: &dyn GuestMemory,
    texture: Texture,
) {
    cancel_watch(memory, &texture.watch);
    for view in texture.views {
        device.destroy_view(view.view);
    }
    device.destroy_image(texture.image);
}
