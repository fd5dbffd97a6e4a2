//! Texture descriptions: the identity key of a cached texture.

use std::hash::{Hash, Hasher};

use crate::error::DescriptionError;
use crate::fetch::TextureFetch;
use crate::format::{FormatInfo, TextureFormat};
use crate::types::{Dimension, Endian, FetchConstantType};

/// Tiles are 32×32 blocks; every guest pitch is a whole number of tiles.
pub const TILE_BLOCKS: u32 = 32;

/// Linear guest rows are padded to this many bytes.
pub const LINEAR_ROW_ALIGNMENT: u32 = 256;

fn align_up(value: u32, alignment: u32) -> Option<u32> {
    debug_assert!(alignment > 0);
    value.div_ceil(alignment).checked_mul(alignment)
}

/// Guest (input) and host (output) 2D layout of a texture.
///
/// `block_width`/`block_height` count format blocks, not texels. Widths and
/// heights named `input_*`/`output_*` are in texels; pitches are in bytes.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct Size2d {
    pub logical_width: u32,
    pub logical_height: u32,
    /// Block columns, padded to a whole tile.
    pub block_width: u32,
    /// Block rows (unpadded).
    pub block_height: u32,
    pub input_width: u32,
    pub input_height: u32,
    pub input_pitch: u32,
    pub output_width: u32,
    pub output_height: u32,
    pub output_pitch: u32,
}

impl Size2d {
    /// Returns the layout and the guest byte length, or `None` when either
    /// does not fit in 32 bits.
    fn calculate(
        logical_width: u32,
        logical_height: u32,
        info: &FormatInfo,
        is_tiled: bool,
    ) -> Option<(Self, u32)> {
        let bytes_per_block = info.bytes_per_block();
        let blocks_wide = logical_width.div_ceil(info.block_width);
        let blocks_high = logical_height.div_ceil(info.block_height);
        let padded_blocks_wide = align_up(blocks_wide, TILE_BLOCKS)?;

        let mut pitch = padded_blocks_wide.checked_mul(bytes_per_block)?;
        let input_width = if is_tiled {
            padded_blocks_wide.checked_mul(info.block_width)?
        } else {
            pitch = align_up(pitch, LINEAR_ROW_ALIGNMENT)?;
            (pitch / bytes_per_block).checked_mul(info.block_width)?
        };
        let input_height = blocks_high.checked_mul(info.block_height)?;

        // Tiled surfaces occupy whole tiles vertically too.
        let rows = if is_tiled {
            align_up(blocks_high, TILE_BLOCKS)?
        } else {
            blocks_high
        };
        let length = pitch.checked_mul(rows)?;

        let size = Self {
            logical_width,
            logical_height,
            block_width: padded_blocks_wide,
            block_height: blocks_high,
            input_width,
            input_height,
            input_pitch: pitch,
            output_width: input_width,
            output_height: input_height,
            output_pitch: pitch,
        };
        Some((size, length))
    }
}

/// Immutable description of a guest texture.
///
/// Two descriptions are the same texture iff every field matches; see
/// [`TextureDescription::key_hash`] for the bucket hash.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct TextureDescription {
    pub guest_address: u32,
    pub dimension: Dimension,
    /// Stored sizes (`extent - 1`), as encoded in the fetch constant.
    pub width: u32,
    pub height: u32,
    pub depth: u32,
    pub format: TextureFormat,
    pub format_info: FormatInfo,
    pub endianness: Endian,
    pub is_tiled: bool,
    pub has_packed_mips: bool,
    /// Bytes of guest memory covered by the texture.
    pub input_length: u32,
    /// Bytes of host-linear data produced by the layout converter.
    pub output_length: u32,
    pub size_2d: Size2d,
}

impl TextureDescription {
    pub fn from_fetch(fetch: &TextureFetch) -> Result<Self, DescriptionError> {
        match fetch.fetch_type() {
            FetchConstantType::Texture => {}
            other => return Err(DescriptionError::NotTextureFetch(other)),
        }

        let format_bits = fetch.format_bits();
        let format = TextureFormat::from_bits(format_bits)
            .ok_or(DescriptionError::UnknownFormat(format_bits))?;
        let dimension = fetch.dimension();
        let (width, height, depth) = match dimension {
            Dimension::D1 => (fetch.size_1d(), 0, 0),
            Dimension::D2 => {
                let (w, h) = fetch.size_2d();
                (w, h, 0)
            }
            Dimension::D3 => fetch.size_3d(),
            Dimension::Cube => fetch.size_stack(),
        };

        Self::build(
            fetch.base_address(),
            dimension,
            (width, height, depth),
            format,
            fetch.endianness(),
            fetch.is_tiled(),
            fetch.has_packed_mips(),
        )
    }

    /// Describes a single-level 2D texture of `width × height` texels.
    pub fn new_2d(
        guest_address: u32,
        width: u32,
        height: u32,
        format: TextureFormat,
        endianness: Endian,
        is_tiled: bool,
    ) -> Result<Self, DescriptionError> {
        Self::build(
            guest_address,
            Dimension::D2,
            (width.saturating_sub(1), height.saturating_sub(1), 0),
            format,
            endianness,
            is_tiled,
            false,
        )
    }

    fn build(
        guest_address: u32,
        dimension: Dimension,
        (width, height, depth): (u32, u32, u32),
        format: TextureFormat,
        endianness: Endian,
        is_tiled: bool,
        has_packed_mips: bool,
    ) -> Result<Self, DescriptionError> {
        let format_info = format.info();
        if format_info.bytes_per_block() == 0 {
            return Err(DescriptionError::SubByteBlock(format));
        }

        let logical_height = if dimension == Dimension::D1 { 1 } else { height + 1 };
        let (size_2d, input_length) =
            Size2d::calculate(width + 1, logical_height, &format_info, is_tiled).ok_or(
                DescriptionError::TooLarge { width: width + 1, height: logical_height, format },
            )?;

        Ok(Self {
            guest_address,
            dimension,
            width,
            height,
            depth,
            format,
            format_info,
            endianness,
            is_tiled,
            has_packed_mips,
            input_length,
            output_length: input_length,
            size_2d,
        })
    }

    pub fn with_packed_mips(mut self, has_packed_mips: bool) -> Self {
        self.has_packed_mips = has_packed_mips;
        self
    }

    /// Overrides the host row pitch, keeping the guest layout untouched.
    pub fn with_output_pitch(mut self, output_pitch: u32) -> Result<Self, DescriptionError> {
        let too_large = DescriptionError::TooLarge {
            width: self.size_2d.logical_width,
            height: self.size_2d.logical_height,
            format: self.format,
        };
        let rows = self.input_length / self.size_2d.input_pitch.max(1);
        self.size_2d.output_width = (output_pitch / self.bytes_per_block())
            .checked_mul(self.format_info.block_width)
            .ok_or(too_large)?;
        self.size_2d.output_pitch = output_pitch;
        self.output_length = output_pitch.checked_mul(rows).ok_or(too_large)?;
        Ok(self)
    }

    pub fn bytes_per_block(&self) -> u32 {
        self.format_info.bytes_per_block()
    }

    /// One past the last guest byte covered by this texture.
    pub fn guest_end(&self) -> u64 {
        self.guest_address as u64 + self.input_length as u64
    }

    pub fn contains_address(&self, address: u32) -> bool {
        address >= self.guest_address && (address as u64) < self.guest_end()
    }

    /// Stable 64-bit hash over every field, used to bucket cache entries.
    pub fn key_hash(&self) -> u64 {
        let mut hasher = xxhash_rust::xxh3::Xxh3::new();
        self.hash(&mut hasher);
        hasher.finish()
    }
}
