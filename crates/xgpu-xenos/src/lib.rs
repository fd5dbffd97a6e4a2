//! Guest-side (Xenos) texture definitions and layout conversion.
//!
//! This crate is pure data: it never touches a host device. It provides:
//! - Decoding of the six-dword texture fetch constant (see [`TextureFetch`]).
//! - Immutable cache-key descriptions for textures and samplers (see
//!   [`TextureDescription`] and [`SamplerDescription`]).
//! - The guest→host layout converter used on upload: de-tiling plus endian
//!   normalization (see [`convert_texture_2d`]).

#![deny(unsafe_code)]

mod error;
mod types;

pub mod convert;
pub mod endian;
pub mod fetch;
pub mod format;
pub mod sampler_info;
pub mod texture_info;
pub mod tiling;

pub use convert::{convert_texture_2d, tile_texture_2d, LayoutKind};
pub use error::{DescriptionError, LayoutError};
pub use fetch::{TextureFetch, IDENTITY_SWIZZLE, MAX_TEXTURE_FETCH_SLOTS, TEXTURE_FETCH_DWORDS};
pub use format::{FormatInfo, TextureFormat};
pub use sampler_info::{SamplerDescription, TextureFetchInstruction};
pub use texture_info::{Size2d, TextureDescription};
pub use types::{AnisoFilter, ClampMode, Dimension, Endian, FetchConstantType, TextureFilter};
