//! Host samplers keyed by guest sampler state.

use tracing::trace;
use xgpu_xenos::SamplerDescription;

use crate::cache::TextureCache;
use crate::device::{HostDevice, HostSamplerDesc, SamplerHandle};
use crate::error::CacheError;
use crate::texture::SamplerKey;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Sampler {
    pub handle: SamplerHandle,
    pub description: SamplerDescription,
}

impl<D: HostDevice> TextureCache<D> {
    /// Returns the host sampler for `description`, creating it on first use.
    ///
    /// Samplers live until [`TextureCache::shutdown`].
    pub fn demand_sampler(&mut self, description: &SamplerDescription) -> Result<SamplerKey, CacheError> {
        let hash = description.key_hash();
        let samplers = &self.samplers;
        if let Some(key) = self.sampler_table.find(hash, |key| {
            samplers
                .get(key)
                .is_some_and(|sampler| sampler.description == *description)
        }) {
            self.stats.inc_sampler_hits();
            return Ok(key);
        }

        self.stats.inc_sampler_misses();
        let host = HostSamplerDesc::from_guest(description)?;
        let handle = self.device.create_sampler(&host)?;
        let key = self.samplers.insert(Sampler {
            handle,
            description: *description,
        });
        self.sampler_table.insert(hash, key);
        trace!(?key, ?description, "sampler created");
        Ok(key)
    }

    pub fn sampler(&self, key: SamplerKey) -> Option<&Sampler> {
        self.samplers.get(key)
    }

    pub fn sampler_count(&self) -> usize {
        self.samplers.len()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use pretty_assertions::assert_eq;
    use xgpu_xenos::{AnisoFilter, ClampMode, TextureFilter};

    use crate::backend::SoftDevice;
    use crate::config::TextureCacheConfig;
    use crate::device::{AddressMode, HostFilter};
    use crate::error::SamplerError;
    use crate::guest_memory::VecGuestMemory;

    use super::*;

    fn cache() -> TextureCache<SoftDevice> {
        let config = TextureCacheConfig {
            staging_buffer_size: 64 * 1024,
            ..Default::default()
        };
        TextureCache::new(SoftDevice::new(), Arc::new(VecGuestMemory::new(0x1000)), config).unwrap()
    }

    #[test]
    fn equal_descriptions_share_one_sampler() {
        let mut cache = cache();
        let desc = SamplerDescription {
            min_filter: TextureFilter::Linear,
            mag_filter: TextureFilter::Linear,
            clamp_u: ClampMode::ClampToEdge,
            ..Default::default()
        };
        let a = cache.demand_sampler(&desc).unwrap();
        let b = cache.demand_sampler(&desc).unwrap();
        assert_eq!(a, b);
        assert_eq!(cache.device().live_samplers(), 1);

        let host = cache.device().sampler(cache.sampler(a).unwrap().handle).unwrap();
        assert_eq!(host.min_filter, HostFilter::Linear);
        assert_eq!(host.address_u, AddressMode::ClampToEdge);

        let stats = cache.stats().snapshot();
        assert_eq!((stats.sampler_hits, stats.sampler_misses), (1, 1));
    }

    #[test]
    fn distinct_descriptions_get_distinct_samplers() {
        let mut cache = cache();
        let a = cache.demand_sampler(&SamplerDescription::default()).unwrap();
        let b = cache
            .demand_sampler(&SamplerDescription {
                aniso_filter: AnisoFilter::Max4To1,
                ..Default::default()
            })
            .unwrap();
        assert_ne!(a, b);
        assert_eq!(cache.sampler_count(), 2);
    }

    #[test]
    fn untranslatable_description_creates_nothing() {
        let mut cache = cache();
        let desc = SamplerDescription {
            aniso_filter: AnisoFilter::Reserved,
            ..Default::default()
        };
        assert_eq!(
            cache.demand_sampler(&desc),
            Err(CacheError::Sampler(SamplerError::Aniso(AnisoFilter::Reserved)))
        );
        assert_eq!(cache.device().live_samplers(), 0);
    }
}
