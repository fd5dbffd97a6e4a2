//! The texture cache table: identity-keyed textures, their views, and the
//! upload path that populates them.

use std::collections::VecDeque;
use std::sync::Arc;

use hashbrown::HashMap;
use slotmap::SlotMap;
use tracing::{debug, error, trace, warn};
use xgpu_xenos::convert::{convert_texture_2d, source_extent};
use xgpu_xenos::{Dimension, TextureDescription, TextureFormat};

use crate::allocator::{self, allocate_texture};
use crate::config::TextureCacheConfig;
use crate::device::{
    component_mapping, BindingTableHandle, BufferImageCopy, CommandBufferHandle, HostDevice,
    ImageLayout, SignalId, ViewDesc, ViewHandle,
};
use crate::error::{CacheError, StagingError};
use crate::guest_memory::GuestMemory;
use crate::invalidation::{register_watch, PendingInvalidations};
use crate::sampler::Sampler;
use crate::staging::StagingBuffer;
use crate::stats::TextureCacheStats;
use crate::texture::{Offset2d, SamplerKey, Texture, TextureKey, TextureLocation, TextureView};

/// Device command stream and completion signal for work recorded by a
/// demand.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct UploadContext {
    pub commands: CommandBufferHandle,
    pub signal: SignalId,
}

/// Multimap from a 64-bit identity hash to the entries sharing it.
#[derive(Debug)]
pub(crate) struct Buckets<K> {
    map: HashMap<u64, Vec<K>>,
}

impl<K: Copy + PartialEq> Buckets<K> {
    pub(crate) fn new() -> Self {
        Self {
            map: HashMap::new(),
        }
    }

    pub(crate) fn insert(&mut self, hash: u64, key: K) {
        self.map.entry(hash).or_default().push(key);
    }

    pub(crate) fn remove(&mut self, hash: u64, key: K) -> bool {
        let Some(bucket) = self.map.get_mut(&hash) else {
            return false;
        };
        let Some(index) = bucket.iter().position(|&k| k == key) else {
            return false;
        };
        bucket.swap_remove(index);
        if bucket.is_empty() {
            self.map.remove(&hash);
        }
        true
    }

    pub(crate) fn find(&self, hash: u64, mut pred: impl FnMut(K) -> bool) -> Option<K> {
        self.map.get(&hash)?.iter().copied().find(|&k| pred(k))
    }

    pub(crate) fn keys(&self) -> impl Iterator<Item = K> + '_ {
        self.map.values().flatten().copied()
    }

    pub(crate) fn len(&self) -> usize {
        self.map.values().map(Vec::len).sum()
    }
}

/// Translation cache from guest texture/sampler descriptions to host
/// resources.
///
/// All methods run on the owning render thread. Guest write-watches may fire
/// on any thread; their effects are applied by [`TextureCache::scavenge`].
pub struct TextureCache<D: HostDevice> {
    pub(crate) device: D,
    pub(crate) memory: Arc<dyn GuestMemory>,
    pub(crate) config: TextureCacheConfig,
    pub(crate) staging: StagingBuffer,

    pub(crate) textures: SlotMap<TextureKey, Texture>,
    pub(crate) table: Buckets<TextureKey>,
    pub(crate) resolve_textures: Vec<TextureKey>,
    pub(crate) pending_delete: VecDeque<TextureKey>,
    pub(crate) invalidated: Arc<PendingInvalidations>,
    pub(crate) invalidated_resolve: Arc<PendingInvalidations>,
    pub(crate) invalidated_spare: Vec<TextureKey>,

    pub(crate) samplers: SlotMap<SamplerKey, Sampler>,
    pub(crate) sampler_table: Buckets<SamplerKey>,

    pub(crate) in_flight_tables: VecDeque<(BindingTableHandle, SignalId)>,
    pub(crate) stats: Arc<TextureCacheStats>,
}

impl<D: HostDevice> TextureCache<D> {
    pub fn new(
        mut device: D,
        memory: Arc<dyn GuestMemory>,
        config: TextureCacheConfig,
    ) -> Result<Self, CacheError> {
        let staging = StagingBuffer::new(
            &mut device,
            config.staging_buffer_size,
            config.staging_alignment,
        )?;
        Ok(Self {
            device,
            memory,
            config,
            staging,
            textures: SlotMap::with_key(),
            table: Buckets::new(),
            resolve_textures: Vec::new(),
            pending_delete: VecDeque::new(),
            invalidated: Arc::new(PendingInvalidations::new()),
            invalidated_resolve: Arc::new(PendingInvalidations::new()),
            invalidated_spare: Vec::new(),
            samplers: SlotMap::with_key(),
            sampler_table: Buckets::new(),
            in_flight_tables: VecDeque::new(),
            stats: Arc::new(TextureCacheStats::new()),
        })
    }

    pub fn device(&self) -> &D {
        &self.device
    }

    pub fn device_mut(&mut self) -> &mut D {
        &mut self.device
    }

    pub fn config(&self) -> &TextureCacheConfig {
        &self.config
    }

    pub fn stats(&self) -> Arc<TextureCacheStats> {
        Arc::clone(&self.stats)
    }

    pub fn texture(&self, key: TextureKey) -> Option<&Texture> {
        self.textures.get(key)
    }

    /// Number of textures in the main table.
    pub fn texture_count(&self) -> usize {
        self.table.len()
    }

    pub fn resolve_texture_count(&self) -> usize {
        self.resolve_textures.len()
    }

    pub fn pending_delete_count(&self) -> usize {
        self.pending_delete.len()
    }

    pub fn in_flight_binding_tables(&self) -> usize {
        self.in_flight_tables.len()
    }

    /// Extends `key`'s in-flight lifetime to `signal`.
    pub fn mark_in_flight(&mut self, key: TextureKey, signal: SignalId) -> Result<(), CacheError> {
        let texture = self.textures.get_mut(key).ok_or(CacheError::UnknownTexture)?;
        texture.in_flight = Some(signal);
        Ok(())
    }

    /// Records a layout change made by work outside the cache (e.g. a resolve
    /// copy into the texture).
    pub fn set_image_layout(&mut self, key: TextureKey, layout: ImageLayout) -> Result<(), CacheError> {
        let texture = self.textures.get_mut(key).ok_or(CacheError::UnknownTexture)?;
        texture.layout = layout;
        Ok(())
    }

    fn find_texture(&self, hash: u64, description: &TextureDescription) -> Option<TextureKey> {
        self.table.find(hash, |key| {
            self.textures
                .get(key)
                .is_some_and(|texture| texture.description == *description)
        })
    }

    /// Returns the cached texture for `description`, creating and uploading
    /// it when an upload context is given.
    ///
    /// `Ok(None)` is a miss: no upload context was supplied, or the
    /// description is not 2D.
    pub fn demand_texture(
        &mut self,
        description: &TextureDescription,
        upload: Option<&UploadContext>,
    ) -> Result<Option<TextureKey>, CacheError> {
        let hash = description.key_hash();
        if let Some(key) = self.find_texture(hash, description) {
            let stale = self
                .textures
                .get(key)
                .is_some_and(|texture| texture.watch.is_pending_invalidation());
            if !stale {
                self.stats.inc_texture_hits();
                return Ok(Some(key));
            }

            debug!(address = description.guest_address, "cached texture invalidated; scavenging");
            self.scavenge();
            // The watch can fire before its key reaches the queue.
            if self.find_texture(hash, description) == Some(key) && self.retire_texture(key) {
                self.stats.inc_texture_invalidations();
            }
        }

        if let Some(key) = self.promote_resolve_texture(description, hash) {
            return Ok(Some(key));
        }

        self.stats.inc_texture_misses();
        let Some(upload) = upload else {
            return Ok(None);
        };
        if description.dimension != Dimension::D2 {
            debug!(dimension = ?description.dimension, "only 2D textures are uploaded");
            return Ok(None);
        }

        let mut texture = allocate_texture(&mut self.device, description, TextureLocation::Main)?;
        if let Err(err) = self.upload_texture_2d(&mut texture, upload) {
            warn!(address = description.guest_address, %err, "texture upload failed");
            // Commands may already reference the image.
            texture.in_flight = Some(upload.signal);
            texture.location = TextureLocation::PendingDelete;
            let key = self.textures.insert(texture);
            self.pending_delete.push_back(key);
            return Err(err);
        }

        let key = self.textures.insert(texture);
        if let Some(texture) = self.textures.get(key) {
            register_watch(
                &*self.memory,
                key,
                &texture.description,
                &texture.watch,
                &self.invalidated,
            );
        }
        self.table.insert(hash, key);
        self.stats.inc_texture_uploads();
        trace!(?key, address = description.guest_address, "texture uploaded");
        Ok(Some(key))
    }

    /// Returns a view of `key` with the given guest swizzle, creating it on
    /// first use.
    pub fn demand_view(&mut self, key: TextureKey, swizzle: u16) -> Result<ViewHandle, CacheError> {
        let texture = self.textures.get_mut(key).ok_or(CacheError::UnknownTexture)?;
        if let Some(existing) = texture.views.iter().find(|v| v.swizzle == swizzle) {
            return Ok(existing.view);
        }

        let view = self.device.create_view(
            texture.image,
            &ViewDesc {
                dimension: texture.description.dimension,
                format: texture.format,
                components: component_mapping(swizzle),
            },
        )?;
        texture.views.push(TextureView { swizzle, view });
        Ok(view)
    }

    /// Finds a live texture covering `address`.
    ///
    /// The main table matches by containment (with at least `width × height`
    /// texels of input) or by exact address and size; resolve targets match
    /// only exactly. `format` is informational.
    pub fn lookup_address(
        &self,
        address: u32,
        width: u32,
        height: u32,
        format: TextureFormat,
    ) -> Option<(TextureKey, Offset2d)> {
        trace!(address, width, height, ?format, "lookup by address");

        let live = |key: TextureKey| {
            self.textures
                .get(key)
                .filter(|texture| !texture.watch.is_pending_invalidation())
        };
        let exact = |desc: &TextureDescription| {
            desc.guest_address == address
                && desc.dimension == Dimension::D2
                && desc.size_2d.input_width == width
                && desc.size_2d.input_height == height
        };

        for key in self.table.keys() {
            let Some(texture) = live(key) else {
                continue;
            };
            let desc = &texture.description;
            if desc.contains_address(address)
                && desc.size_2d.input_width >= width
                && desc.size_2d.input_height >= height
            {
                let mut offset = Offset2d::default();
                if desc.dimension == Dimension::D2 {
                    let pitch = desc.size_2d.input_pitch.max(1);
                    offset.y = (address - desc.guest_address) / pitch;
                }
                return Some((key, offset));
            }
            if exact(desc) {
                return Some((key, Offset2d::default()));
            }
        }

        self.resolve_textures
            .iter()
            .copied()
            .find(|&key| live(key).is_some_and(|texture| exact(&texture.description)))
            .map(|key| (key, Offset2d::default()))
    }

    fn upload_texture_2d(
        &mut self,
        texture: &mut Texture,
        upload: &UploadContext,
    ) -> Result<(), CacheError> {
        let description = texture.description;
        let size = description.size_2d;
        let length = description.output_length as u64;

        let region = match self.staging.acquire(length, upload.signal) {
            Ok(region) => region,
            Err(StagingError::Exhausted { .. }) => {
                warn!(length, "staging buffer exhausted; reclaiming and retrying");
                self.stats.inc_staging_retries();
                self.staging.scavenge(&self.device);
                self.staging.acquire(length, upload.signal).map_err(|err| {
                    error!(length, %err, "staging buffer exhausted after reclaim");
                    err
                })?
            }
            Err(err) => return Err(err.into()),
        };

        let mut guest = vec![0u8; source_extent(&description)?];
        self.memory.read(description.guest_address, &mut guest)?;
        convert_texture_2d(&description, &guest, self.staging.host_mut(&region))?;
        self.staging.flush(&mut self.device, &region)?;

        self.device.cmd_image_barrier(
            upload.commands,
            texture.image,
            texture.layout,
            ImageLayout::TransferDst,
        )?;
        self.device.cmd_copy_buffer_to_image(
            upload.commands,
            self.staging.buffer(),
            texture.image,
            &BufferImageCopy {
                buffer_offset: region.offset,
                buffer_row_length: size.output_width,
                buffer_image_height: size.output_height,
                image_width: size.logical_width,
                image_height: size.logical_height,
                size: region.size,
            },
        )?;
        self.device.cmd_image_barrier(
            upload.commands,
            texture.image,
            ImageLayout::TransferDst,
            ImageLayout::ShaderReadOnly,
        )?;

        texture.layout = ImageLayout::ShaderReadOnly;
        texture.in_flight = Some(upload.signal);
        Ok(())
    }

    /// Moves `key` out of whichever table holds it into the pending-delete
    /// list. Stale keys and textures already pending deletion are ignored.
    pub(crate) fn retire_texture(&mut self, key: TextureKey) -> bool {
        let Some(texture) = self.textures.get_mut(key) else {
            return false;
        };
        match texture.location {
            TextureLocation::Main => {
                self.table.remove(texture.description.key_hash(), key);
            }
            TextureLocation::Resolve => self.resolve_textures.retain(|&k| k != key),
            TextureLocation::PendingDelete => return false,
        }
        texture.location = TextureLocation::PendingDelete;
        crate::invalidation::cancel_watch(&*self.memory, &texture.watch);
        self.pending_delete.push_back(key);
        true
    }

    /// Drops every cached texture. Textures still in flight are freed by later
    /// scavenges; samplers are kept.
    pub fn clear_cache(&mut self) {
        let keys: Vec<TextureKey> = self
            .table
            .keys()
            .chain(self.resolve_textures.iter().copied())
            .collect();
        debug!(count = keys.len(), "clearing texture cache");
        for key in keys {
            self.retire_texture(key);
        }
        self.scavenge();
    }

    /// Releases every host object owned by the cache and returns the device.
    ///
    /// The caller guarantees the device is idle.
    pub fn shutdown(mut self) -> D {
        for (table, _) in self.in_flight_tables.drain(..) {
            self.device.free_binding_table(table);
        }
        for (_, texture) in self.textures.drain() {
            allocator::release_texture(&mut self.device, &*self.memory, texture);
        }
        for (_, sampler) in self.samplers.drain() {
            self.device.destroy_sampler(sampler.handle);
        }
        self.staging.destroy(&mut self.device);
        self.device
    }
}
