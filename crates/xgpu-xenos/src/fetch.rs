//! Texture fetch constant decoding.
//!
//! A texture fetch constant is six consecutive dwords in the guest register
//! file. Field layout (bit offsets are LSB-first within each dword):
//!
//! | dword | fields |
//! |---|---|
//! | 0 | type:2, sign_x..w:2×4, clamp_x:3, clamp_y:3, clamp_z:3, _:3, pitch:9, tiled:1 |
//! | 1 | format:6, endianness:2, request_size:2, stacked:1, clamp_policy:1, base_address:20 |
//! | 2 | size (layout depends on dimension) |
//! | 3 | num_format:1, swizzle:12, exp_adjust:6, mag:2, min:2, mip:2, aniso:3, _:3, border_size:1 |
//! | 4 | vol_mag:1, vol_min:1, mip_min:4, mip_max:4, aniso walk:2, lod_bias:10, grad exp:10 |
//! | 5 | border_color:2, force_bcw:1, tri_clamp:2, aniso_bias:4, dimension:2, packed_mips:1, mip_address:20 |

use crate::format::TextureFormat;
use crate::types::{AnisoFilter, ClampMode, Dimension, Endian, FetchConstantType, TextureFilter};

pub const TEXTURE_FETCH_DWORDS: usize = 6;

/// Number of texture fetch constants a shader can address.
pub const MAX_TEXTURE_FETCH_SLOTS: u32 = 32;

/// Swizzle selecting `x, y, z, w` from `r, g, b, a`.
pub const IDENTITY_SWIZZLE: u16 = (1 << 3) | (2 << 6) | (3 << 9);

fn bits(value: u32, shift: u32, width: u32) -> u32 {
    (value >> shift) & ((1u32 << width) - 1)
}

fn set_bits(value: &mut u32, shift: u32, width: u32, field: u32) {
    let mask = ((1u32 << width) - 1) << shift;
    *value = (*value & !mask) | ((field << shift) & mask);
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct TextureFetch {
    pub dwords: [u32; TEXTURE_FETCH_DWORDS],
}

impl TextureFetch {
    pub fn from_dwords(dwords: [u32; TEXTURE_FETCH_DWORDS]) -> Self {
        Self { dwords }
    }

    /// Reads fetch constant `slot` out of a flat register bank holding
    /// consecutive fetch constants.
    pub fn from_registers(registers: &[u32], slot: u32) -> Option<Self> {
        let start = (slot as usize).checked_mul(TEXTURE_FETCH_DWORDS)?;
        let end = start.checked_add(TEXTURE_FETCH_DWORDS)?;
        let dwords: [u32; TEXTURE_FETCH_DWORDS] = registers.get(start..end)?.try_into().ok()?;
        Some(Self { dwords })
    }

    /// Encodes a tiled or linear 2D texture fetch. `width`/`height` are the
    /// logical texel dimensions; `address` is rounded down to 4 KiB.
    pub fn texture_2d(
        address: u32,
        width: u32,
        height: u32,
        format: TextureFormat,
        endianness: Endian,
        tiled: bool,
    ) -> Self {
        let mut fetch = Self::default();
        let d = &mut fetch.dwords;
        set_bits(&mut d[0], 0, 2, 2);
        set_bits(&mut d[0], 31, 1, tiled as u32);
        set_bits(&mut d[1], 0, 6, format.to_bits());
        set_bits(&mut d[1], 6, 2, endianness.to_bits());
        set_bits(&mut d[1], 12, 20, address >> 12);
        set_bits(&mut d[2], 0, 13, width.saturating_sub(1));
        set_bits(&mut d[2], 13, 13, height.saturating_sub(1));
        set_bits(&mut d[3], 1, 12, IDENTITY_SWIZZLE as u32);
        set_bits(&mut d[5], 9, 2, Dimension::D2.to_bits());
        fetch
    }

    pub fn fetch_type(&self) -> FetchConstantType {
        FetchConstantType::from_bits(bits(self.dwords[0], 0, 2))
    }

    pub fn clamp_x(&self) -> ClampMode {
        ClampMode::from_bits(bits(self.dwords[0], 10, 3))
    }

    pub fn clamp_y(&self) -> ClampMode {
        ClampMode::from_bits(bits(self.dwords[0], 13, 3))
    }

    pub fn clamp_z(&self) -> ClampMode {
        ClampMode::from_bits(bits(self.dwords[0], 16, 3))
    }

    /// Row pitch in units of 32 texels.
    pub fn pitch(&self) -> u32 {
        bits(self.dwords[0], 22, 9)
    }

    pub fn is_tiled(&self) -> bool {
        bits(self.dwords[0], 31, 1) != 0
    }

    pub fn format_bits(&self) -> u32 {
        bits(self.dwords[1], 0, 6)
    }

    pub fn endianness(&self) -> Endian {
        Endian::from_bits(bits(self.dwords[1], 6, 2))
    }

    /// Guest physical base address (stored in 4 KiB units).
    pub fn base_address(&self) -> u32 {
        bits(self.dwords[1], 12, 20) << 12
    }

    /// `(width - 1)` for 1D textures.
    pub fn size_1d(&self) -> u32 {
        bits(self.dwords[2], 0, 24)
    }

    /// `(width - 1, height - 1)` for 2D textures.
    pub fn size_2d(&self) -> (u32, u32) {
        (bits(self.dwords[2], 0, 13), bits(self.dwords[2], 13, 13))
    }

    /// `(width - 1, height - 1, depth - 1)` for stacked (cube) textures.
    pub fn size_stack(&self) -> (u32, u32, u32) {
        (
            bits(self.dwords[2], 0, 13),
            bits(self.dwords[2], 13, 13),
            bits(self.dwords[2], 26, 6),
        )
    }

    /// `(width - 1, height - 1, depth - 1)` for 3D textures.
    pub fn size_3d(&self) -> (u32, u32, u32) {
        (
            bits(self.dwords[2], 0, 11),
            bits(self.dwords[2], 11, 11),
            bits(self.dwords[2], 22, 10),
        )
    }

    /// Four 3-bit component selectors, `x` in the low bits.
    pub fn swizzle(&self) -> u16 {
        bits(self.dwords[3], 1, 12) as u16
    }

    pub fn mag_filter(&self) -> TextureFilter {
        TextureFilter::from_bits(bits(self.dwords[3], 19, 2))
    }

    pub fn min_filter(&self) -> TextureFilter {
        TextureFilter::from_bits(bits(self.dwords[3], 21, 2))
    }

    pub fn mip_filter(&self) -> TextureFilter {
        TextureFilter::from_bits(bits(self.dwords[3], 23, 2))
    }

    pub fn aniso_filter(&self) -> AnisoFilter {
        AnisoFilter::from_bits(bits(self.dwords[3], 25, 3))
    }

    pub fn dimension(&self) -> Dimension {
        Dimension::from_bits(bits(self.dwords[5], 9, 2))
    }

    pub fn has_packed_mips(&self) -> bool {
        bits(self.dwords[5], 11, 1) != 0
    }

    pub fn set_fetch_type(&mut self, ty: FetchConstantType) {
        let raw = match ty {
            FetchConstantType::Invalid => 0,
            FetchConstantType::Reserved => 1,
            FetchConstantType::Texture => 2,
            FetchConstantType::Vertex => 3,
        };
        set_bits(&mut self.dwords[0], 0, 2, raw);
    }

    pub fn set_format_bits(&mut self, format: u32) {
        set_bits(&mut self.dwords[1], 0, 6, format);
    }

    pub fn set_swizzle(&mut self, swizzle: u16) {
        set_bits(&mut self.dwords[3], 1, 12, swizzle as u32);
    }

    pub fn set_clamp(&mut self, u: ClampMode, v: ClampMode, w: ClampMode) {
        set_bits(&mut self.dwords[0], 10, 3, u.to_bits());
        set_bits(&mut self.dwords[0], 13, 3, v.to_bits());
        set_bits(&mut self.dwords[0], 16, 3, w.to_bits());
    }

    pub fn set_filters(&mut self, min: TextureFilter, mag: TextureFilter, mip: TextureFilter) {
        set_bits(&mut self.dwords[3], 19, 2, mag.to_bits());
        set_bits(&mut self.dwords[3], 21, 2, min.to_bits());
        set_bits(&mut self.dwords[3], 23, 2, mip.to_bits());
    }

    pub fn set_aniso_filter(&mut self, aniso: AnisoFilter) {
        set_bits(&mut self.dwords[3], 25, 3, aniso.to_bits());
    }

    pub fn set_dimension(&mut self, dimension: Dimension) {
        set_bits(&mut self.dwords[5], 9, 2, dimension.to_bits());
    }

    pub fn set_packed_mips(&mut self, packed: bool) {
        set_bits(&mut self.dwords[5], 11, 1, packed as u32);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_hand_packed_dwords() {
        let fetch = TextureFetch::from_dwords([
            // type=2, clamp_x=2, clamp_y=6, pitch=8, tiled
            0x2 | (2 << 10) | (6 << 13) | (8 << 22) | (1 << 31),
            // format=6 (8_8_8_8), endian=2, address=0x12345 pages
            6 | (2 << 6) | (0x12345 << 12),
            // 2D: width-1=255, height-1=127
            255 | (127 << 13),
            // swizzle=identity, mag=linear, min=point, mip=linear, aniso=3
            ((IDENTITY_SWIZZLE as u32) << 1) | (1 << 19) | (1 << 23) | (3 << 25),
            0,
            // dimension=2D, packed mips
            (1 << 9) | (1 << 11),
        ]);

        assert_eq!(fetch.fetch_type(), FetchConstantType::Texture);
        assert_eq!(fetch.clamp_x(), ClampMode::ClampToEdge);
        assert_eq!(fetch.clamp_y(), ClampMode::ClampToBorder);
        assert_eq!(fetch.clamp_z(), ClampMode::Repeat);
        assert_eq!(fetch.pitch(), 8);
        assert!(fetch.is_tiled());
        assert_eq!(fetch.format_bits(), 6);
        assert_eq!(fetch.endianness(), Endian::Swap8In32);
        assert_eq!(fetch.base_address(), 0x1234_5000);
        assert_eq!(fetch.size_2d(), (255, 127));
        assert_eq!(fetch.swizzle(), IDENTITY_SWIZZLE);
        assert_eq!(fetch.mag_filter(), TextureFilter::Linear);
        assert_eq!(fetch.min_filter(), TextureFilter::Point);
        assert_eq!(fetch.mip_filter(), TextureFilter::Linear);
        assert_eq!(fetch.aniso_filter(), AnisoFilter::Max4To1);
        assert_eq!(fetch.dimension(), Dimension::D2);
        assert!(fetch.has_packed_mips());
    }

    #[test]
    fn encoder_matches_decoder() {
        let mut fetch = TextureFetch::texture_2d(
            0x0010_0fff,
            640,
            480,
            TextureFormat::Dxt1,
            Endian::Swap8In16,
            true,
        );
        fetch.set_filters(TextureFilter::Linear, TextureFilter::Point, TextureFilter::BaseMap);
        fetch.set_clamp(ClampMode::MirroredRepeat, ClampMode::Repeat, ClampMode::ClampToHalfway);

        assert_eq!(fetch.base_address(), 0x0010_0000);
        assert_eq!(fetch.size_2d(), (639, 479));
        assert_eq!(TextureFormat::from_bits(fetch.format_bits()), Some(TextureFormat::Dxt1));
        assert_eq!(fetch.endianness(), Endian::Swap8In16);
        assert_eq!(fetch.min_filter(), TextureFilter::Linear);
        assert_eq!(fetch.mag_filter(), TextureFilter::Point);
        assert_eq!(fetch.mip_filter(), TextureFilter::BaseMap);
        assert_eq!(fetch.clamp_z(), ClampMode::ClampToHalfway);
    }

    #[test]
    fn register_bank_slots() {
        let mut regs = vec![0u32; TEXTURE_FETCH_DWORDS * 3];
        regs[TEXTURE_FETCH_DWORDS * 2] = 2;
        assert_eq!(
            TextureFetch::from_registers(&regs, 2).map(|f| f.fetch_type()),
            Some(FetchConstantType::Texture)
        );
        assert!(TextureFetch::from_registers(&regs, 3).is_none());
    }
}
