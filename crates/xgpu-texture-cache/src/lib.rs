//! Host-side translation cache for guest textures and samplers.
//!
//! Currently this crate provides:
//! - The texture cache table, resolve-target registry, and sampler cache
//!   (see [`TextureCache`]).
//! - Write-watch driven invalidation of cached textures and deferred,
//!   signal-aware reclamation of host resources ([`TextureCache::scavenge`]).
//! - Per-draw binding-table construction
//!   ([`TextureCache::build_binding_table`]).
//! - The host device and guest memory seams ([`HostDevice`], [`GuestMemory`])
//!   plus in-memory implementations for tests.

#![deny(unsafe_code)]

mod allocator;
mod binding_table;
mod cache;
mod config;
mod error;
mod invalidation;
mod resolve;
mod sampler;
mod scavenge;
mod staging;
mod texture;

pub mod backend;
pub mod device;
pub mod guest_memory;
pub mod stats;

pub use binding_table::{batch_image_writes, ImageWrite, TextureBinding};
pub use cache::{TextureCache, UploadContext};
pub use config::TextureCacheConfig;
pub use device::HostDevice;
pub use error::{
    BindingError, CacheError, DeviceError, GuestMemoryError, SamplerError, StagingError,
};
pub use guest_memory::{GuestMemory, VecGuestMemory, WatchCallback, WatchHandle};
pub use invalidation::PendingInvalidations;
pub use sampler::Sampler;
pub use staging::{StagingBuffer, StagingRegion};
pub use stats::{TextureCacheStats, TextureCacheStatsSnapshot};
pub use texture::{
    Offset2d, SamplerKey, Texture, TextureKey, TextureLocation, TextureView, WatchState,
};
