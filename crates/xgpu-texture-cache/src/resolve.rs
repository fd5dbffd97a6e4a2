//! Provisional render-target textures and their promotion into the main
//! table.

use tracing::debug;
use xgpu_xenos::{TextureDescription, TextureFormat};

use crate::allocator::allocate_texture;
use crate::cache::TextureCache;
use crate::device::HostDevice;
use crate::error::CacheError;
use crate::invalidation::register_watch;
use crate::texture::{Offset2d, TextureKey, TextureLocation};

impl<D: HostDevice> TextureCache<D> {
    /// Returns a texture covering `description`'s guest range for use as a
    /// resolve destination, plus the offset of the range inside it.
    ///
    /// Reuses any live texture found by [`TextureCache::lookup_address`];
    /// otherwise allocates a provisional texture in the resolve registry.
    pub fn demand_resolve_texture(
        &mut self,
        description: &TextureDescription,
        format: TextureFormat,
    ) -> Result<(TextureKey, Offset2d), CacheError> {
        let size = description.size_2d;
        if let Some(found) =
            self.lookup_address(description.guest_address, size.block_width, size.block_height, format)
        {
            return Ok(found);
        }

        let mut texture = allocate_texture(&mut self.device, description, TextureLocation::Resolve)?;
        texture.is_full_texture = false;
        let key = self.textures.insert(texture);
        if let Some(texture) = self.textures.get(key) {
            register_watch(
                &*self.memory,
                key,
                &texture.description,
                &texture.watch,
                &self.invalidated_resolve,
            );
        }
        self.resolve_textures.push(key);
        debug!(?key, address = description.guest_address, "resolve texture created");
        Ok((key, Offset2d::default()))
    }

    /// Moves a registry entry at the same address and logical size as
    /// `description` into the main table under `hash`.
    pub(crate) fn promote_resolve_texture(
        &mut self,
        description: &TextureDescription,
        hash: u64,
    ) -> Option<TextureKey> {
        let textures = &self.textures;
        let index = self.resolve_textures.iter().position(|&key| {
            textures.get(key).is_some_and(|texture| {
                let existing = &texture.description;
                !texture.watch.is_pending_invalidation()
                    && existing.guest_address == description.guest_address
                    && existing.size_2d.logical_width == description.size_2d.logical_width
                    && existing.size_2d.logical_height == description.size_2d.logical_height
            })
        })?;
        let key = self.resolve_textures.remove(index);
        let texture = self.textures.get_mut(key)?;

        texture.is_full_texture = true;
        texture.description = *description;
        texture.location = TextureLocation::Main;
        register_watch(
            &*self.memory,
            key,
            &texture.description,
            &texture.watch,
            &self.invalidated,
        );
        self.table.insert(hash, key);
        self.stats.inc_texture_promotions();
        debug!(?key, address = description.guest_address, "resolve texture promoted");
        Some(key)
    }
}
