//! Morton encoding (Z-order curve) for chunk-local addressing
//!
//! Chunk-local coordinates are small, so 10 bits per axis packed into a
//! `u32` is enough for any supported chunk size.

/// Largest coordinate accepted by [`encode_morton_3d_u32`]
pub const MORTON_U32_MAX_COORD: u32 = (1 << 10) - 1;

/// Spread the low 10 bits of `x` into every third bit of a `u32`
#[inline]
fn spread_bits_10(x: u32) -> u32 {
    let mut x = x & 0x3ff;
    x = (x | (x << 16)) & 0x0300_00ff;
    x = (x | (x << 8)) & 0x0300_f00f;
    x = (x | (x << 4)) & 0x030c_30c3;
    x = (x | (x << 2)) & 0x0924_9249;
    x
}

/// Interleave three coordinates of up to 10 bits each (x in the lowest bit)
#[inline]
pub fn encode_morton_3d_u32(x: u32, y: u32, z: u32) -> u32 {
    debug_assert!(x <= MORTON_U32_MAX_COORD && y <= MORTON_U32_MAX_COORD && z <= MORTON_U32_MAX_COORD);
    spread_bits_10(x) | (spread_bits_10(y) << 1) | (spread_bits_10(z) << 2)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_max_coord_fills_all_bits() {
        let max = MORTON_U32_MAX_COORD;
        assert_eq!(encode_morton_3d_u32(max, max, max), (1 << 30) - 1);
        assert_eq!(encode_morton_3d_u32(max, 0, 0), 0x0924_9249);
    }

    #[test]
    fn test_ordering() {
        assert_eq!(encode_morton_3d_u32(0, 0, 0), 0);
        assert_eq!(encode_morton_3d_u32(1, 0, 0), 1);
        assert_eq!(encode_morton_3d_u32(0, 1, 0), 2);
        assert_eq!(encode_morton_3d_u32(0, 0, 1), 4);
        assert_eq!(encode_morton_3d_u32(1, 1, 1), 7);
        assert_eq!(encode_morton_3d_u32(2, 0, 0), 8);
    }

    #[test]
    fn test_monotone_per_axis() {
        // Growing any single coordinate never lowers the code
        for a in 0..31u32 {
            assert!(encode_morton_3d_u32(a + 1, 3, 5) > encode_morton_3d_u32(a, 3, 5));
            assert!(encode_morton_3d_u32(3, a + 1, 5) > encode_morton_3d_u32(3, a, 5));
            assert!(encode_morton_3d_u32(3, 5, a + 1) > encode_morton_3d_u32(3, 5, a));
        }
    }
}
