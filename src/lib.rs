//! Guest texture translation cache.
//!
//! - [`xenos`]: guest texture/sampler descriptions and the layout converter.
//! - [`texture_cache`]: the host-side cache, invalidation, and binding tables.

pub use xgpu_texture_cache as texture_cache;
pub use xgpu_xenos as xenos;

pub use xgpu_texture_cache::{
    CacheError, HostDevice, TextureCache, TextureCacheConfig, TextureKey, UploadContext,
};
pub use xgpu_xenos::{SamplerDescription, TextureDescription, TextureFetch};
