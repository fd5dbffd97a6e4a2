//! Guest→host texture layout conversion.
//!
//! The guest stores 2D surfaces either linearly (rows padded to 256 bytes) or
//! tiled in 32×32-block tiles. Host uploads are always linear with
//! `output_pitch` bytes per row. Every copied block is endian-normalized.

use crate::endian::copy_swapped;
use crate::error::LayoutError;
use crate::texture_info::TextureDescription;
use crate::tiling::{
    log2_bytes_per_block, packed_tile_offset, tiled_offset_2d_inner, tiled_offset_2d_outer,
};

/// Which copy strategy a description takes.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LayoutKind {
    /// Linear, guest and host pitches equal: one straight copy.
    LinearPacked,
    /// Linear, pitches differ: row-by-row copy.
    LinearPitched,
    Tiled,
}

pub fn layout_kind(desc: &TextureDescription) -> LayoutKind {
    if desc.is_tiled {
        LayoutKind::Tiled
    } else if desc.size_2d.input_pitch == desc.size_2d.output_pitch {
        LayoutKind::LinearPacked
    } else {
        LayoutKind::LinearPitched
    }
}

fn copied_rows(desc: &TextureDescription) -> u32 {
    desc.size_2d.block_height.min(desc.size_2d.logical_height)
}

fn tiled_log2_bpb(desc: &TextureDescription) -> Result<u32, LayoutError> {
    let bytes_per_block = desc.bytes_per_block();
    if !bytes_per_block.is_power_of_two() || bytes_per_block > 16 {
        return Err(LayoutError::UnsupportedTiledBlockSize(bytes_per_block));
    }
    Ok(log2_bytes_per_block(bytes_per_block))
}

/// Calls `f(host_offset, guest_offset)` for every block of a tiled surface.
fn for_each_tiled_block(
    desc: &TextureDescription,
    mut f: impl FnMut(usize, usize),
) -> Result<(), LayoutError> {
    let log2_bpb = tiled_log2_bpb(desc)?;
    let bytes_per_block = desc.bytes_per_block() as usize;
    let size = &desc.size_2d;
    let (offset_x, offset_y) = packed_tile_offset(desc);
    let row_blocks = size.input_width / desc.format_info.block_width;

    for y in 0..copied_rows(desc) {
        let outer = tiled_offset_2d_outer(offset_y + y, row_blocks, log2_bpb);
        let host_row = y as usize * size.output_pitch as usize;
        for x in 0..size.block_width {
            let block =
                tiled_offset_2d_inner(offset_x + x, offset_y + y, log2_bpb, outer) >> log2_bpb;
            f(
                host_row + x as usize * bytes_per_block,
                block as usize * bytes_per_block,
            );
        }
    }
    Ok(())
}

/// Number of guest bytes, starting at `guest_address`, the converter reads.
///
/// For tiled 8- and 16-bit formats this can exceed `input_length`.
pub fn source_extent(desc: &TextureDescription) -> Result<usize, LayoutError> {
    let size = &desc.size_2d;
    Ok(match layout_kind(desc) {
        LayoutKind::LinearPacked => desc.output_length as usize,
        LayoutKind::LinearPitched => match copied_rows(desc) {
            0 => 0,
            rows => {
                (rows as usize - 1) * size.input_pitch as usize
                    + size.input_pitch.min(size.output_pitch) as usize
            }
        },
        LayoutKind::Tiled => {
            let bytes_per_block = desc.bytes_per_block() as usize;
            let mut end = 0;
            for_each_tiled_block(desc, |_, guest| end = end.max(guest + bytes_per_block))?;
            end
        }
    })
}

fn check(needed: usize, available: usize, source: bool) -> Result<(), LayoutError> {
    if available >= needed {
        Ok(())
    } else if source {
        Err(LayoutError::SourceTooSmall { needed, available })
    } else {
        Err(LayoutError::DestinationTooSmall { needed, available })
    }
}

/// Converts guest texel data `src` into host-linear `dst`.
///
/// `src` must start at the texture's guest address and cover
/// [`source_extent`] bytes; `dst` must hold `output_length` bytes.
pub fn convert_texture_2d(
    desc: &TextureDescription,
    src: &[u8],
    dst: &mut [u8],
) -> Result<LayoutKind, LayoutError> {
    let kind = layout_kind(desc);
    check(source_extent(desc)?, src.len(), true)?;
    check(desc.output_length as usize, dst.len(), false)?;

    let size = &desc.size_2d;
    match kind {
        LayoutKind::LinearPacked => {
            let len = desc.output_length as usize;
            copy_swapped(desc.endianness, &mut dst[..len], &src[..len]);
        }
        LayoutKind::LinearPitched => {
            let row_bytes = size.input_pitch.min(size.output_pitch) as usize;
            for y in 0..copied_rows(desc) as usize {
                let s = y * size.input_pitch as usize;
                let d = y * size.output_pitch as usize;
                copy_swapped(
                    desc.endianness,
                    &mut dst[d..d + row_bytes],
                    &src[s..s + row_bytes],
                );
            }
        }
        LayoutKind::Tiled => {
            let bpb = desc.bytes_per_block() as usize;
            for_each_tiled_block(desc, |host, guest| {
                copy_swapped(
                    desc.endianness,
                    &mut dst[host..host + bpb],
                    &src[guest..guest + bpb],
                );
            })?;
        }
    }
    Ok(kind)
}

/// Inverse of [`convert_texture_2d`]: writes host-linear `src` into the
/// guest layout `dst`.
///
/// Used to author guest memory for resolves and tests.
pub fn tile_texture_2d(
    desc: &TextureDescription,
    src: &[u8],
    dst: &mut [u8],
) -> Result<LayoutKind, LayoutError> {
    let kind = layout_kind(desc);
    check(desc.output_length as usize, src.len(), true)?;
    check(source_extent(desc)?, dst.len(), false)?;

    let size = &desc.size_2d;
    match kind {
        LayoutKind::LinearPacked => {
            let len = desc.output_length as usize;
            copy_swapped(desc.endianness, &mut dst[..len], &src[..len]);
        }
        LayoutKind::LinearPitched => {
            let row_bytes = size.input_pitch.min(size.output_pitch) as usize;
            for y in 0..copied_rows(desc) as usize {
                let s = y * size.output_pitch as usize;
                let d = y * size.input_pitch as usize;
                copy_swapped(
                    desc.endianness,
                    &mut dst[d..d + row_bytes],
                    &src[s..s + row_bytes],
                );
            }
        }
        LayoutKind::Tiled => {
            let bpb = desc.bytes_per_block() as usize;
            for_each_tiled_block(desc, |host, guest| {
                copy_swapped(
                    desc.endianness,
                    &mut dst[guest..guest + bpb],
                    &src[host..host + bpb],
                );
            })?;
        }
    }
    Ok(kind)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::format::TextureFormat;
    use crate::types::Endian;
    use pretty_assertions::assert_eq;

    fn pattern(len: usize) -> Vec<u8> {
        (0..len).map(|i| (i * 7 + i / 251) as u8).collect()
    }

    #[test]
    fn linear_packed_is_a_swapped_copy() {
        let desc = TextureDescription::new_2d(0, 64, 2, TextureFormat::K8_8_8_8, Endian::Swap8In32, false)
            .unwrap();
        let src = pattern(desc.input_length as usize);
        let mut dst = vec![0; desc.output_length as usize];
        assert_eq!(convert_texture_2d(&desc, &src, &mut dst), Ok(LayoutKind::LinearPacked));
        assert_eq!(&dst[..4], &[src[3], src[2], src[1], src[0]]);
        assert_eq!(&dst[dst.len() - 4..], &[src[src.len() - 1], src[src.len() - 2], src[src.len() - 3], src[src.len() - 4]]);
    }

    #[test]
    fn linear_pitched_copies_row_by_row() {
        let desc = TextureDescription::new_2d(0, 64, 3, TextureFormat::K8_8_8_8, Endian::None, false)
            .unwrap()
            .with_output_pitch(384)
            .unwrap();
        assert_eq!(layout_kind(&desc), LayoutKind::LinearPitched);
        let src = pattern(desc.input_length as usize);
        let mut dst = vec![0xee; desc.output_length as usize];
        convert_texture_2d(&desc, &src, &mut dst).unwrap();
        for y in 0..3 {
            assert_eq!(&dst[y * 384..y * 384 + 256], &src[y * 256..y * 256 + 256]);
            assert!(dst[y * 384 + 256..(y + 1) * 384].iter().all(|&b| b == 0xee));
        }
    }

    #[test]
    fn tiled_first_blocks_follow_the_tile_pattern() {
        let desc = TextureDescription::new_2d(0, 32, 32, TextureFormat::K8_8_8_8, Endian::None, true)
            .unwrap();
        let src = pattern(source_extent(&desc).unwrap());
        let mut dst = vec![0; desc.output_length as usize];
        assert_eq!(convert_texture_2d(&desc, &src, &mut dst), Ok(LayoutKind::Tiled));
        // Host (8, 0) is guest block 16; host (0, 1) is guest block 4.
        assert_eq!(&dst[8 * 4..9 * 4], &src[16 * 4..17 * 4]);
        assert_eq!(&dst[128..132], &src[4 * 4..5 * 4]);
    }

    #[test]
    fn small_block_tiled_reads_past_input_length() {
        let desc = TextureDescription::new_2d(0, 32, 32, TextureFormat::K8, Endian::None, true)
            .unwrap();
        assert_eq!(desc.input_length, 1024);
        assert_eq!(source_extent(&desc), Ok(2560));
    }

    #[test]
    fn short_buffers_are_rejected() {
        let desc = TextureDescription::new_2d(0, 32, 32, TextureFormat::K8_8_8_8, Endian::None, true)
            .unwrap();
        let mut dst = vec![0; desc.output_length as usize];
        assert_eq!(
            convert_texture_2d(&desc, &[0; 16], &mut dst),
            Err(LayoutError::SourceTooSmall { needed: 4096, available: 16 })
        );
        let src = vec![0; 4096];
        assert_eq!(
            convert_texture_2d(&desc, &src, &mut [0; 8]),
            Err(LayoutError::DestinationTooSmall { needed: 4096, available: 8 })
        );
    }

    #[test]
    fn twelve_byte_blocks_cannot_be_tiled() {
        let desc =
            TextureDescription::new_2d(0, 8, 8, TextureFormat::K32_32_32Float, Endian::None, true)
                .unwrap();
        assert_eq!(source_extent(&desc), Err(LayoutError::UnsupportedTiledBlockSize(12)));
    }

    #[cfg(not(target_arch = "wasm32"))]
    mod props {
        use super::*;
        use proptest::prelude::*;

        fn format() -> impl Strategy<Value = TextureFormat> {
            prop_oneof![
                Just(TextureFormat::K8),
                Just(TextureFormat::K5_6_5),
                Just(TextureFormat::K8_8_8_8),
                Just(TextureFormat::Dxt1),
                Just(TextureFormat::Dxt4_5),
            ]
        }

        fn endian() -> impl Strategy<Value = Endian> {
            prop_oneof![
                Just(Endian::None),
                Just(Endian::Swap8In16),
                Just(Endian::Swap8In32),
                Just(Endian::Swap16In32),
            ]
        }

        proptest! {
            #[test]
            fn tile_then_convert_restores_host_data(
                width in 1u32..80,
                height in 1u32..80,
                format in format(),
                endian in endian(),
                tiled in any::<bool>(),
                packed in any::<bool>(),
                seed in any::<u8>(),
            ) {
                let desc = TextureDescription::new_2d(0x4000, width, height, format, endian, tiled)
                    .unwrap()
                    .with_packed_mips(packed);
                let host: Vec<u8> = (0..desc.output_length as usize)
                    .map(|i| (i as u8).wrapping_mul(31).wrapping_add(seed))
                    .collect();

                let mut guest = vec![0; source_extent(&desc).unwrap()];
                tile_texture_2d(&desc, &host, &mut guest).unwrap();
                let mut restored = vec![0; desc.output_length as usize];
                convert_texture_2d(&desc, &guest, &mut restored).unwrap();

                let covered = (desc.size_2d.block_height.min(desc.size_2d.logical_height)
                    * desc.size_2d.output_pitch) as usize;
                prop_assert_eq!(&restored[..covered], &host[..covered]);
            }
        }
    }
}
