//! Per-draw texture binding tables.

use tracing::{trace, warn};
use xgpu_xenos::{
    FetchConstantType, SamplerDescription, TextureDescription, TextureFetch,
    TextureFetchInstruction,
};

use crate::cache::{TextureCache, UploadContext};
use crate::device::{
    binding_for_dimension, BindingTableHandle, DescriptorWrite, HostDevice, ImageBinding,
};
use crate::error::{BindingError, CacheError, DeviceError};

/// One texture reference made by a shader stage.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TextureBinding {
    /// Fetch constant slot.
    pub fetch_constant: u32,
    pub fetch_instr: TextureFetchInstruction,
}

/// A single bound slot before batching.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ImageWrite {
    pub binding: u32,
    pub slot: u32,
    pub image: ImageBinding,
}

/// Merges runs of writes to the same binding with consecutive slots.
pub fn batch_image_writes(writes: &[ImageWrite]) -> Vec<DescriptorWrite> {
    let mut batches: Vec<DescriptorWrite> = Vec::new();
    for write in writes {
        if let Some(last) = batches.last_mut() {
            let next_slot = last.first_array_element as usize + last.images.len();
            if last.binding == write.binding && next_slot == write.slot as usize {
                last.images.push(write.image);
                continue;
            }
        }
        batches.push(DescriptorWrite {
            binding: write.binding,
            first_array_element: write.slot,
            images: vec![write.image],
        });
    }
    batches
}

impl<D: HostDevice> TextureCache<D> {
    /// Builds the binding table for one draw.
    ///
    /// `fetch_constants` is the guest fetch constant register bank. Each slot
    /// referenced by either stage is bound once. Slots that fail to resolve
    /// are logged and left unbound; only table allocation or update failure
    /// fails the build.
    pub fn build_binding_table(
        &mut self,
        fetch_constants: &[u32],
        vertex_bindings: &[TextureBinding],
        pixel_bindings: &[TextureBinding],
        upload: &UploadContext,
    ) -> Result<BindingTableHandle, CacheError> {
        let mut seen: u32 = 0;
        let mut writes = Vec::new();
        for binding in vertex_bindings.iter().chain(pixel_bindings) {
            let slot = binding.fetch_constant;
            if slot >= self.config.max_fetch_slots.min(u32::BITS) {
                warn!(slot, "texture binding references an out-of-range fetch slot");
                continue;
            }
            if seen & (1 << slot) != 0 {
                continue;
            }
            seen |= 1 << slot;

            match self.bind_slot(fetch_constants, binding, upload) {
                Ok(Some(write)) => writes.push(write),
                Ok(None) => {}
                Err(err) => warn!(slot, %err, "texture slot left unbound"),
            }
        }

        if self.in_flight_tables.len() >= self.config.binding_table_pool_size as usize {
            self.reclaim_binding_tables();
            if self.in_flight_tables.len() >= self.config.binding_table_pool_size as usize {
                return Err(DeviceError::PoolExhausted.into());
            }
        }

        let batches = batch_image_writes(&writes);
        let table = self.device.allocate_binding_table()?;
        if let Err(err) = self.device.update_binding_table(table, &batches) {
            self.device.free_binding_table(table);
            return Err(err.into());
        }
        self.in_flight_tables.push_back((table, upload.signal));
        self.stats.inc_binding_tables_built();
        trace!(?table, slots = writes.len(), batches = batches.len(), "binding table built");
        Ok(table)
    }

    fn bind_slot(
        &mut self,
        fetch_constants: &[u32],
        binding: &TextureBinding,
        upload: &UploadContext,
    ) -> Result<Option<ImageWrite>, CacheError> {
        let slot = binding.fetch_constant;
        let fetch = TextureFetch::from_registers(fetch_constants, slot)
            .ok_or(BindingError::SlotOutOfRange(slot))?;
        if fetch.fetch_type() == FetchConstantType::Invalid {
            return Ok(None);
        }

        let description = TextureDescription::from_fetch(&fetch)
            .map_err(|source| BindingError::Description { slot, source })?;
        let sampler_description = SamplerDescription::from_fetch(&fetch, &binding.fetch_instr);

        let key = self
            .demand_texture(&description, Some(upload))?
            .ok_or(BindingError::TextureUnavailable {
                slot,
                address: description.guest_address,
            })?;
        let sampler = self.demand_sampler(&sampler_description)?;
        let sampler = self
            .sampler(sampler)
            .map(|sampler| sampler.handle)
            .ok_or(CacheError::UnknownSampler)?;
        let view = self.demand_view(key, fetch.swizzle())?;

        let texture = self.textures.get_mut(key).ok_or(CacheError::UnknownTexture)?;
        texture.in_flight = Some(upload.signal);
        Ok(Some(ImageWrite {
            binding: binding_for_dimension(description.dimension),
            slot,
            image: ImageBinding {
                view,
                layout: texture.layout,
                sampler,
            },
        }))
    }
}
