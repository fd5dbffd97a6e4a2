//! Relaxed atomic counters describing cache activity.

use std::sync::atomic::{AtomicU64, Ordering};

/// Snapshot of [`TextureCacheStats`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TextureCacheStatsSnapshot {
    pub texture_hits: u64,
    pub texture_misses: u64,
    pub texture_uploads: u64,
    pub texture_promotions: u64,
    pub texture_invalidations: u64,
    pub textures_freed: u64,
    pub sampler_hits: u64,
    pub sampler_misses: u64,
    pub binding_tables_built: u64,
    pub binding_tables_reclaimed: u64,
    pub staging_retries: u64,
}

/// Cache counters.
///
/// Updated on the render thread; safe to read from any thread.
#[derive(Debug, Default)]
pub struct TextureCacheStats {
    texture_hits: AtomicU64,
    texture_misses: AtomicU64,
    texture_uploads: AtomicU64,
    texture_promotions: AtomicU64,
    texture_invalidations: AtomicU64,
    textures_freed: AtomicU64,
    sampler_hits: AtomicU64,
    sampler_misses: AtomicU64,
    binding_tables_built: AtomicU64,
    binding_tables_reclaimed: AtomicU64,
    staging_retries: AtomicU64,
}

macro_rules! counters {
    ($($inc:ident => $field:ident),* $(,)?) => {
        $(
            pub fn $inc(&self) {
                self.$field.fetch_add(1, Ordering::Relaxed);
            }
        )*
    };
}

impl TextureCacheStats {
    pub fn new() -> Self {
        Self::default()
    }

    counters! {
        inc_texture_hits => texture_hits,
        inc_texture_misses => texture_misses,
        inc_texture_uploads => texture_uploads,
        inc_texture_promotions => texture_promotions,
        inc_texture_invalidations => texture_invalidations,
        inc_textures_freed => textures_freed,
        inc_sampler_hits => sampler_hits,
        inc_sampler_misses => sampler_misses,
        inc_binding_tables_built => binding_tables_built,
        inc_staging_retries => staging_retries,
    }

    pub fn add_binding_tables_reclaimed(&self, count: u64) {
        self.binding_tables_reclaimed
            .fetch_add(count, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> TextureCacheStatsSnapshot {
        TextureCacheStatsSnapshot {
            texture_hits: self.texture_hits.load(Ordering::Relaxed),
            texture_misses: self.texture_misses.load(Ordering::Relaxed),
            texture_uploads: self.texture_uploads.load(Ordering::Relaxed),
            texture_promotions: self.texture_promotions.load(Ordering::Relaxed),
            texture_invalidations: self.texture_invalidations.load(Ordering::Relaxed),
            textures_freed: self.textures_freed.load(Ordering::Relaxed),
            sampler_hits: self.sampler_hits.load(Ordering::Relaxed),
            sampler_misses: self.sampler_misses.load(Ordering::Relaxed),
            binding_tables_built: self.binding_tables_built.load(Ordering::Relaxed),
            binding_tables_reclaimed: self.binding_tables_reclaimed.load(Ordering::Relaxed),
            staging_retries: self.staging_retries.load(Ordering::Relaxed),
        }
    }
}
