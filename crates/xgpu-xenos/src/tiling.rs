//! Address arithmetic for the guest's 32×32-block tiled surface layout.
//!
//! All coordinates are in blocks. `log2_bpb` is the base-2 log of the block
//! size in bytes (0..=4).

use crate::texture_info::TextureDescription;

/// Base-2 log of a power-of-two block size of 1, 2, 4, 8 or 16 bytes.
pub fn log2_bytes_per_block(bytes_per_block: u32) -> u32 {
    (bytes_per_block >> 2) + ((bytes_per_block >> 1) >> (bytes_per_block >> 2))
}

/// Row-dependent part of a tiled offset. `width` is the row length in blocks.
pub fn tiled_offset_2d_outer(y: u32, width: u32, log2_bpb: u32) -> u32 {
    let macro_ = ((y >> 5) * (width >> 5)) << (log2_bpb + 7);
    let micro = ((y & 6) << 2) << log2_bpb;
    macro_
        + ((micro & !15) << 1)
        + (micro & 15)
        + ((y & 8) << (3 + log2_bpb))
        + ((y & 1) << 4)
}

/// Full tiled byte offset of block `(x, y)` given its row's outer offset.
///
/// Shift the result right by `log2_bpb` to get a block index.
pub fn tiled_offset_2d_inner(x: u32, y: u32, log2_bpb: u32, base_offset: u32) -> u32 {
    let macro_ = (x >> 5) << (log2_bpb + 7);
    let micro = (x & 7) << log2_bpb;
    let offset = base_offset + macro_ + ((micro & !15) << 1) + (micro & 15);
    ((offset & !511) << 3)
        + ((offset & 448) << 2)
        + (offset & 63)
        + ((y & 16) << 7)
        + (((((y & 8) >> 2) + (x >> 3)) & 3) << 6)
}

/// Block index of `(x, y)` in a tiled surface `width` blocks wide.
pub fn tiled_block_index(x: u32, y: u32, width: u32, log2_bpb: u32) -> u32 {
    let outer = tiled_offset_2d_outer(y, width, log2_bpb);
    tiled_offset_2d_inner(x, y, log2_bpb, outer) >> log2_bpb
}

fn log2_ceil(value: u32) -> u32 {
    if value <= 1 {
        0
    } else {
        32 - (value - 1).leading_zeros()
    }
}

/// Block offset of the base level inside a packed mip tail.
///
/// Textures of at most 16×16 texels with packed mips share a single tile with
/// their mip chain; the base level sits along the longer axis.
pub fn packed_tile_offset(desc: &TextureDescription) -> (u32, u32) {
    let size = &desc.size_2d;
    if !desc.has_packed_mips || size.logical_width > 16 || size.logical_height > 16 {
        return (0, 0);
    }

    let log2_width = log2_ceil(size.logical_width);
    let log2_height = log2_ceil(size.logical_height);
    let (x, y) = if log2_width < log2_height {
        (0, 16 >> log2_width)
    } else {
        (16 >> log2_height, 0)
    };
    (
        x / desc.format_info.block_width,
        y / desc.format_info.block_height,
    )
}
