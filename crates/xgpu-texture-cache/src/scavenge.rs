//! Deferred reclamation of host resources.
//!
//! Nothing is destroyed while a device submission may still read it. Each
//! pass polls completion signals without blocking and frees whatever has
//! retired, oldest first.

use tracing::{debug, trace};

use crate::allocator::{is_idle, release_texture};
use crate::cache::TextureCache;
use crate::device::HostDevice;
use crate::invalidation::PendingInvalidations;

impl<D: HostDevice> TextureCache<D> {
    /// Runs one reclamation pass. Called once per frame by the owner, and by
    /// `demand_texture` when it finds an invalidated entry.
    pub fn scavenge(&mut self) {
        let tables = self.reclaim_binding_tables();
        let staging = self.staging.scavenge(&self.device);
        let freed = self.free_pending_textures();

        let queue = self.invalidated.clone();
        let invalidated = self.drain_invalidations(&queue);
        let queue = self.invalidated_resolve.clone();
        let invalidated_resolve = self.drain_invalidations(&queue);

        if tables + staging + freed + invalidated + invalidated_resolve > 0 {
            debug!(
                tables,
                staging, freed, invalidated, invalidated_resolve, "scavenge pass"
            );
        }
    }

    /// Frees binding tables from the front of the in-flight list while their
    /// signal has fired. Submission order is completion order, so the walk
    /// stops at the first pending table.
    pub(crate) fn reclaim_binding_tables(&mut self) -> usize {
        let mut reclaimed = 0;
        while let Some(&(table, signal)) = self.in_flight_tables.front() {
            if !self.device.signal_fired(signal) {
                break;
            }
            self.in_flight_tables.pop_front();
            self.device.free_binding_table(table);
            reclaimed += 1;
        }
        self.stats.add_binding_tables_reclaimed(reclaimed as u64);
        reclaimed
    }

    fn free_pending_textures(&mut self) -> usize {
        let mut freed = 0;
        while let Some(&key) = self.pending_delete.front() {
            match self.textures.get(key) {
                Some(texture) if !is_idle(&self.device, texture) => break,
                Some(_) => {
                    if let Some(texture) = self.textures.remove(key) {
                        release_texture(&mut self.device, &*self.memory, texture);
                        self.stats.inc_textures_freed();
                        freed += 1;
                    }
                }
                None => {}
            }
            self.pending_delete.pop_front();
        }
        freed
    }

    fn drain_invalidations(&mut self, queue: &PendingInvalidations) -> usize {
        let mut touched = std::mem::take(&mut self.invalidated_spare);
        queue.swap(&mut touched);
        let mut retired = 0;
        for key in touched.drain(..) {
            if self.retire_texture(key) {
                self.stats.inc_texture_invalidations();
                trace!(?key, "texture invalidated");
                retired += 1;
            }
        }
        self.invalidated_spare = touched;
        retired
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use pretty_assertions::assert_eq;
    use xgpu_xenos::{Endian, TextureDescription, TextureFormat};

    use crate::backend::SoftDevice;
    use crate::cache::UploadContext;
    use crate::config::TextureCacheConfig;
    use crate::device::{BindingTableHandle, CommandBufferHandle};
    use crate::guest_memory::VecGuestMemory;

    use super::*;

    fn cache() -> (TextureCache<SoftDevice>, Arc<VecGuestMemory>) {
        let memory = Arc::new(VecGuestMemory::new(0x10_0000));
        let config = TextureCacheConfig {
            staging_buffer_size: 1024 * 1024,
            ..Default::default()
        };
        let cache = TextureCache::new(SoftDevice::new(), memory.clone(), config).unwrap();
        (cache, memory)
    }

    fn table(cache: &mut TextureCache<SoftDevice>) -> BindingTableHandle {
        cache.device_mut().allocate_binding_table().unwrap()
    }

    #[test]
    fn binding_tables_reclaim_stops_at_first_pending() {
        let (mut cache, _memory) = cache();
        let s1 = cache.device_mut().new_signal();
        let s2 = cache.device_mut().new_signal();
        let s3 = cache.device_mut().new_signal();
        let t1 = table(&mut cache);
        let t2 = table(&mut cache);
        let t3 = table(&mut cache);
        cache.in_flight_tables.extend([(t1, s1), (t2, s2), (t3, s3)]);

        cache.device_mut().fire(s1);
        cache.device_mut().fire(s3);
        cache.scavenge();
        assert_eq!(cache.in_flight_tables.len(), 2);
        assert!(cache.device().binding_table(t1).is_none());
        assert!(cache.device().binding_table(t3).is_some());

        cache.device_mut().fire(s2);
        cache.scavenge();
        assert_eq!(cache.in_flight_binding_tables(), 0);
        assert_eq!(cache.stats().snapshot().binding_tables_reclaimed, 3);
    }

    #[test]
    fn touched_texture_is_freed_once_idle() {
        let (mut cache, memory) = cache();
        let signal = cache.device_mut().new_signal();
        let upload = UploadContext {
            commands: CommandBufferHandle(1),
            signal,
        };
        let desc =
            TextureDescription::new_2d(0x2000, 32, 32, TextureFormat::K8_8_8_8, Endian::None, false)
                .unwrap();
        let key = cache.demand_texture(&desc, Some(&upload)).unwrap().unwrap();

        memory.write(0x2010, &[0xaa]).unwrap();
        cache.scavenge();
        assert_eq!(cache.texture_count(), 0);
        assert_eq!(cache.pending_delete_count(), 1);
        assert_eq!(cache.stats().snapshot().texture_invalidations, 1);

        // Still read by the upload submission.
        cache.scavenge();
        assert!(cache.texture(key).is_some());

        cache.device_mut().fire(signal);
        cache.scavenge();
        assert!(cache.texture(key).is_none());
        assert_eq!(cache.pending_delete_count(), 0);
        assert_eq!(cache.device().live_images(), 0);
        assert_eq!(memory.active_watches(), 0);
        assert_eq!(cache.stats().snapshot().textures_freed, 1);
    }

    #[test]
    fn clearing_the_cache_is_not_an_invalidation() {
        let (mut cache, memory) = cache();
        let signal = cache.device_mut().new_signal();
        let upload = UploadContext {
            commands: CommandBufferHandle(1),
            signal,
        };
        for address in [0x1000, 0x4000, 0x8000] {
            let desc =
                TextureDescription::new_2d(address, 16, 16, TextureFormat::K8, Endian::None, false)
                    .unwrap();
            cache.demand_texture(&desc, Some(&upload)).unwrap().unwrap();
        }

        cache.clear_cache();
        assert_eq!(cache.pending_delete_count(), 3);
        assert_eq!(cache.stats().snapshot().texture_invalidations, 0);

        // Writes after the clear find no watches left to fire.
        memory.write(0x1000, &[0x55]).unwrap();
        cache.device_mut().fire(signal);
        cache.scavenge();
        assert_eq!(cache.pending_delete_count(), 0);
        assert_eq!(cache.stats().snapshot().texture_invalidations, 0);
        assert_eq!(cache.stats().snapshot().textures_freed, 3);
    }

    #[test]
    fn pending_delete_is_drained_in_order() {
        let (mut cache, _memory) = cache();
        let early = cache.device_mut().new_signal();
        let late = cache.device_mut().new_signal();
        let ctx = |signal| UploadContext {
            commands: CommandBufferHandle(1),
            signal,
        };
        let a = TextureDescription::new_2d(0x1000, 16, 16, TextureFormat::K8, Endian::None, false)
            .unwrap();
        let b = TextureDescription::new_2d(0x8000, 16, 16, TextureFormat::K8, Endian::None, false)
            .unwrap();
        let ka = cache.demand_texture(&a, Some(&ctx(late))).unwrap().unwrap();
        let kb = cache.demand_texture(&b, Some(&ctx(early))).unwrap().unwrap();

        cache.retire_texture(ka);
        cache.retire_texture(kb);
        cache.device_mut().fire(early);
        cache.scavenge();
        // `ka` heads the list and is still pending, so `kb` waits behind it.
        assert!(cache.texture(ka).is_some());
        assert!(cache.texture(kb).is_some());

        cache.device_mut().fire(late);
        cache.scavenge();
        assert_eq!(cache.device().live_images(), 0);
    }
}
