//! Sampler descriptions: the identity key of a cached host sampler.

use std::hash::{Hash, Hasher};

use crate::fetch::TextureFetch;
use crate::types::{AnisoFilter, ClampMode, TextureFilter};

/// Filter overrides carried by a shader's texture fetch instruction.
///
/// Any field left at `UseFetchConst` defers to the fetch constant.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct TextureFetchInstruction {
    pub mag_filter: TextureFilter,
    pub min_filter: TextureFilter,
    pub mip_filter: TextureFilter,
    pub aniso_filter: AnisoFilter,
}

impl Default for TextureFetchInstruction {
    fn default() -> Self {
        Self {
            mag_filter: TextureFilter::UseFetchConst,
            min_filter: TextureFilter::UseFetchConst,
            mip_filter: TextureFilter::UseFetchConst,
            aniso_filter: AnisoFilter::UseFetchConst,
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct SamplerDescription {
    pub min_filter: TextureFilter,
    pub mag_filter: TextureFilter,
    pub mip_filter: TextureFilter,
    pub clamp_u: ClampMode,
    pub clamp_v: ClampMode,
    pub clamp_w: ClampMode,
    pub aniso_filter: AnisoFilter,
}

fn pick_filter(instr: TextureFilter, fetch: TextureFilter) -> TextureFilter {
    match instr {
        TextureFilter::UseFetchConst => fetch,
        other => other,
    }
}

impl SamplerDescription {
    pub fn from_fetch(fetch: &TextureFetch, instr: &TextureFetchInstruction) -> Self {
        let aniso_filter = match instr.aniso_filter {
            AnisoFilter::UseFetchConst => fetch.aniso_filter(),
            other => other,
        };
        Self {
            min_filter: pick_filter(instr.min_filter, fetch.min_filter()),
            mag_filter: pick_filter(instr.mag_filter, fetch.mag_filter()),
            mip_filter: pick_filter(instr.mip_filter, fetch.mip_filter()),
            clamp_u: fetch.clamp_x(),
            clamp_v: fetch.clamp_y(),
            clamp_w: fetch.clamp_z(),
            aniso_filter,
        }
    }

    pub fn key_hash(&self) -> u64 {
        let mut hasher = xxhash_rust::xxh3::Xxh3::new();
        self.hash(&mut hasher);
        hasher.finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::format::TextureFormat;
    use crate::types::Endian;

    fn fetch() -> TextureFetch {
        let mut fetch = TextureFetch::texture_2d(0, 16, 16, TextureFormat::K8_8_8_8, Endian::None, false);
        fetch.set_filters(TextureFilter::Linear, TextureFilter::Point, TextureFilter::Linear);
        fetch.set_clamp(ClampMode::ClampToEdge, ClampMode::MirroredRepeat, ClampMode::Repeat);
        fetch.set_aniso_filter(AnisoFilter::Max4To1);
        fetch
    }

    #[test]
    fn instruction_defers_to_fetch_constant() {
        let desc = SamplerDescription::from_fetch(&fetch(), &TextureFetchInstruction::default());
        assert_eq!(desc.min_filter, TextureFilter::Linear);
        assert_eq!(desc.mag_filter, TextureFilter::Point);
        assert_eq!(desc.mip_filter, TextureFilter::Linear);
        assert_eq!(desc.clamp_u, ClampMode::ClampToEdge);
        assert_eq!(desc.clamp_v, ClampMode::MirroredRepeat);
        assert_eq!(desc.aniso_filter, AnisoFilter::Max4To1);
    }

    #[test]
    fn instruction_overrides_win() {
        let instr = TextureFetchInstruction {
            mag_filter: TextureFilter::Linear,
            aniso_filter: AnisoFilter::Disabled,
            ..Default::default()
        };
        let desc = SamplerDescription::from_fetch(&fetch(), &instr);
        assert_eq!(desc.mag_filter, TextureFilter::Linear);
        assert_eq!(desc.min_filter, TextureFilter::Linear);
        assert_eq!(desc.aniso_filter, AnisoFilter::Disabled);
    }

    #[test]
    fn equal_descriptions_hash_equal() {
        let a = SamplerDescription::from_fetch(&fetch(), &TextureFetchInstruction::default());
        let b = SamplerDescription::from_fetch(&fetch(), &TextureFetchInstruction::default());
        assert_eq!(a.key_hash(), b.key_hash());
        let c = SamplerDescription { clamp_w: ClampMode::ClampToBorder, ..a };
        assert_ne!(a.key_hash(), c.key_hash());
    }
}
