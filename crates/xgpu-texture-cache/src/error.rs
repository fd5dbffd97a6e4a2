//! Error types for the texture cache and its host device seam.

use xgpu_xenos::{DescriptionError, LayoutError};

/// Failure reported by a [`crate::HostDevice`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DeviceError {
    #[error("host device out of memory")]
    OutOfMemory,
    #[error("invalid {kind} handle {id}")]
    InvalidHandle { kind: &'static str, id: u64 },
    #[error("binding table pool exhausted")]
    PoolExhausted,
    #[error("{0} out of bounds")]
    OutOfBounds(&'static str),
    #[error("image {0} is not in the transfer-destination layout")]
    WrongLayout(u64),
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("guest memory access out of bounds: address=0x{address:08x}, len=0x{len:x}")]
pub struct GuestMemoryError {
    pub address: u32,
    pub len: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StagingError {
    #[error("staging buffer exhausted: {requested} bytes requested")]
    Exhausted { requested: u64 },
    #[error("staging request of {requested} bytes exceeds capacity {capacity}")]
    TooLarge { requested: u64, capacity: u64 },
}

/// A guest sampler enumerant with no host equivalent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum SamplerError {
    #[error("unsupported {stage} filter {filter:?}")]
    Filter {
        stage: &'static str,
        filter: xgpu_xenos::TextureFilter,
    },
    #[error("unsupported anisotropic filter {0:?}")]
    Aniso(xgpu_xenos::AnisoFilter),
}

/// Why a single fetch slot could not be bound.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BindingError {
    #[error("fetch slot {0} out of range")]
    SlotOutOfRange(u32),
    #[error("fetch slot {slot}: {source}")]
    Description {
        slot: u32,
        #[source]
        source: DescriptionError,
    },
    #[error("fetch slot {slot}: no texture available for {address:#x}")]
    TextureUnavailable { slot: u32, address: u32 },
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CacheError {
    #[error(transparent)]
    Device(#[from] DeviceError),
    #[error(transparent)]
    GuestMemory(#[from] GuestMemoryError),
    #[error(transparent)]
    Staging(#[from] StagingError),
    #[error(transparent)]
    Sampler(#[from] SamplerError),
    #[error(transparent)]
    Layout(#[from] LayoutError),
    #[error(transparent)]
    Binding(#[from] BindingError),
    #[error("unknown texture key")]
    UnknownTexture,
    #[error("unknown sampler key")]
    UnknownSampler,
}
