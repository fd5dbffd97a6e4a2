use crate::format::TextureFormat;
use crate::types::FetchConstantType;

/// A fetch constant that cannot be turned into a [`crate::TextureDescription`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum DescriptionError {
    #[error("fetch constant type {0:?} is not a texture fetch")]
    NotTextureFetch(FetchConstantType),
    #[error("unknown guest texture format {0}")]
    UnknownFormat(u32),
    #[error("guest texture format {0:?} packs several texels per byte")]
    SubByteBlock(TextureFormat),
    #[error("guest texture {width}x{height} of {format:?} is too large to address")]
    TooLarge {
        width: u32,
        height: u32,
        format: TextureFormat,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum LayoutError {
    #[error("guest source too small: need {needed} bytes, have {available}")]
    SourceTooSmall { needed: usize, available: usize },
    #[error("host destination too small: need {needed} bytes, have {available}")]
    DestinationTooSmall { needed: usize, available: usize },
    #[error("tiled layout needs a power-of-two block size up to 16 bytes, got {0}")]
    UnsupportedTiledBlockSize(u32),
}
