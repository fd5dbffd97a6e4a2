//! Byte-order normalization of guest texel data.

use crate::types::Endian;

/// Copies `src` into `dst`, swapping bytes per `endian`.
///
/// Both slices must have the same length. Trailing bytes that do not fill a
/// whole lane are copied as-is.
pub fn copy_swapped(endian: Endian, dst: &mut [u8], src: &[u8]) {
    debug_assert_eq!(dst.len(), src.len());
    let len = dst.len().min(src.len());
    let (dst, src) = (&mut dst[..len], &src[..len]);

    let lane = match endian {
        Endian::None => {
            dst.copy_from_slice(src);
            return;
        }
        Endian::Swap8In16 => 2,
        Endian::Swap8In32 | Endian::Swap16In32 => 4,
    };

    let whole = len - len % lane;
    for (d, s) in dst[..whole]
        .chunks_exact_mut(lane)
        .zip(src[..whole].chunks_exact(lane))
    {
        match endian {
            Endian::Swap8In16 => {
                d[0] = s[1];
                d[1] = s[0];
            }
            Endian::Swap8In32 => {
                d[0] = s[3];
                d[1] = s[2];
                d[2] = s[1];
                d[3] = s[0];
            }
            Endian::Swap16In32 => {
                d[0] = s[2];
                d[1] = s[3];
                d[2] = s[0];
                d[3] = s[1];
            }
            Endian::None => d.copy_from_slice(s),
        }
    }
    dst[whole..].copy_from_slice(&src[whole..]);
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const SRC: [u8; 8] = [0, 1, 2, 3, 4, 5, 6, 7];

    fn swapped(endian: Endian, src: &[u8]) -> Vec<u8> {
        let mut dst = vec![0; src.len()];
        copy_swapped(endian, &mut dst, src);
        dst
    }

    #[test]
    fn lane_swaps() {
        assert_eq!(swapped(Endian::None, &SRC), SRC.to_vec());
        assert_eq!(swapped(Endian::Swap8In16, &SRC), vec![1, 0, 3, 2, 5, 4, 7, 6]);
        assert_eq!(swapped(Endian::Swap8In32, &SRC), vec![3, 2, 1, 0, 7, 6, 5, 4]);
        assert_eq!(swapped(Endian::Swap16In32, &SRC), vec![2, 3, 0, 1, 6, 7, 4, 5]);
    }

    #[test]
    fn partial_lane_is_copied_verbatim() {
        assert_eq!(swapped(Endian::Swap8In32, &SRC[..6]), vec![3, 2, 1, 0, 4, 5]);
        assert_eq!(swapped(Endian::Swap8In16, &SRC[..3]), vec![1, 0, 2]);
    }

    #[test]
    fn swaps_are_involutions() {
        for endian in [Endian::Swap8In16, Endian::Swap8In32, Endian::Swap16In32] {
            assert_eq!(swapped(endian, &swapped(endian, &SRC)), SRC.to_vec());
        }
    }
}
