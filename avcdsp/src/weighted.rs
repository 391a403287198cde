//! Weighted sample prediction: default averaging and explicit weights.

use crate::clip_pixel;
use crate::deblock::ChromaPair;

#[inline]
fn uni(x: u8, log_wd: u32, weight: i32, offset: i32) -> u8 {
    let scaled = x as i32 * weight;
    let v = if log_wd >= 1 {
        (scaled + (1 << (log_wd - 1))) >> log_wd
    } else {
        scaled
    };
    clip_pixel(v + offset)
}

#[inline]
fn bi(a: u8, b: u8, log_wd: u32, w1: i32, w2: i32, offset: i32) -> u8 {
    let v = (a as i32 * w1 + b as i32 * w2 + (1 << log_wd)) >> (log_wd + 1);
    clip_pixel(v + offset)
}

#[allow(clippy::too_many_arguments)]
pub fn default_weighted_pred_luma(
    src1: &[u8],
    src1_stride: usize,
    src2: &[u8],
    src2_stride: usize,
    dst: &mut [u8],
    dst_stride: usize,
    width: usize,
    height: usize,
) {
    for y in 0..height {
        for x in 0..width {
            let a = src1[y * src1_stride + x] as u16;
            let b = src2[y * src2_stride + x] as u16;
            dst[y * dst_stride + x] = ((a + b + 1) >> 1) as u8;
        }
    }
}

/// Interleaved UV; `width` counts pairs.
#[allow(clippy::too_many_arguments)]
pub fn default_weighted_pred_chroma(
    src1: &[u8],
    src1_stride: usize,
    src2: &[u8],
    src2_stride: usize,
    dst: &mut [u8],
    dst_stride: usize,
    width: usize,
    height: usize,
) {
    default_weighted_pred_luma(
        src1,
        src1_stride,
        src2,
        src2_stride,
        dst,
        dst_stride,
        2 * width,
        height,
    );
}

#[allow(clippy::too_many_arguments)]
pub fn weighted_pred_luma(
    src: &[u8],
    src_stride: usize,
    dst: &mut [u8],
    dst_stride: usize,
    log_wd: u32,
    weight: i16,
    offset: i8,
    width: usize,
    height: usize,
) {
    for y in 0..height {
        for x in 0..width {
            dst[y * dst_stride + x] = uni(src[y * src_stride + x], log_wd, weight as i32, offset as i32);
        }
    }
}

#[allow(clippy::too_many_arguments)]
pub fn weighted_pred_chroma(
    src: &[u8],
    src_stride: usize,
    dst: &mut [u8],
    dst_stride: usize,
    log_wd: u32,
    weight: ChromaPair<i16>,
    offset: ChromaPair<i8>,
    width: usize,
    height: usize,
) {
    let w = [weight.u as i32, weight.v as i32];
    let o = [offset.u as i32, offset.v as i32];
    for y in 0..height {
        for x in 0..2 * width {
            let p = x & 1;
            dst[y * dst_stride + x] = uni(src[y * src_stride + x], log_wd, w[p], o[p]);
        }
    }
}

#[allow(clippy::too_many_arguments)]
pub fn weighted_bi_pred_luma(
    src1: &[u8],
    src1_stride: usize,
    src2: &[u8],
    src2_stride: usize,
    dst: &mut [u8],
    dst_stride: usize,
    log_wd: u32,
    weights: (i16, i16),
    offsets: (i8, i8),
    width: usize,
    height: usize,
) {
    let offset = (offsets.0 as i32 + offsets.1 as i32 + 1) >> 1;
    for y in 0..height {
        for x in 0..width {
            dst[y * dst_stride + x] = bi(
                src1[y * src1_stride + x],
                src2[y * src2_stride + x],
                log_wd,
                weights.0 as i32,
                weights.1 as i32,
                offset,
            );
        }
    }
}

#[allow(clippy::too_many_arguments)]
pub fn weighted_bi_pred_chroma(
    src1: &[u8],
    src1_stride: usize,
    src2: &[u8],
    src2_stride: usize,
    dst: &mut [u8],
    dst_stride: usize,
    log_wd: u32,
    weights: (ChromaPair<i16>, ChromaPair<i16>),
    offsets: (ChromaPair<i8>, ChromaPair<i8>),
    width: usize,
    height: usize,
) {
    let w1 = [weights.0.u as i32, weights.0.v as i32];
    let w2 = [weights.1.u as i32, weights.1.v as i32];
    let o = [
        (offsets.0.u as i32 + offsets.1.u as i32 + 1) >> 1,
        (offsets.0.v as i32 + offsets.1.v as i32 + 1) >> 1,
    ];
    for y in 0..height {
        for x in 0..2 * width {
            let p = x & 1;
            dst[y * dst_stride + x] = bi(
                src1[y * src1_stride + x],
                src2[y * src2_stride + x],
                log_wd,
                w1[p],
                w2[p],
                o[p],
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_average_rounds_up() {
        let a = [0u8, 1, 254, 255];
        let b = [1u8, 1, 255, 255];
        let mut dst = [0u8; 4];
        default_weighted_pred_luma(&a, 4, &b, 4, &mut dst, 4, 4, 1);
        assert_eq!(dst, [1, 1, 255, 255]);
    }

    #[test]
    fn unit_weight_is_identity() {
        let src: Vec<u8> = (0..64).map(|i| (i * 4) as u8).collect();
        let mut dst = vec![0u8; 64];
        weighted_pred_luma(&src, 8, &mut dst, 8, 5, 32, 0, 8, 8);
        assert_eq!(dst, src);
        weighted_pred_luma(&src, 8, &mut dst, 8, 0, 1, 0, 8, 8);
        assert_eq!(dst, src);
    }

    #[test]
    fn explicit_weight_and_offset() {
        let src = [100u8, 200, 3, 0];
        let mut dst = [0u8; 4];
        // half weight plus 10, rounding half up
        weighted_pred_luma(&src, 4, &mut dst, 4, 1, 1, 10, 4, 1);
        assert_eq!(dst, [60, 110, 12, 10]);
        weighted_pred_luma(&src, 4, &mut dst, 4, 0, 2, -10, 4, 1);
        assert_eq!(dst, [190, 255, 0, 0]);
    }

    #[test]
    fn chroma_uses_plane_parameters() {
        let src = [100u8; 8];
        let mut dst = [0u8; 8];
        let w = ChromaPair { u: 1, v: 2 };
        let o = ChromaPair { u: 5, v: -5 };
        weighted_pred_chroma(&src, 8, &mut dst, 8, 0, w, o, 4, 1);
        assert_eq!(dst, [105, 195, 105, 195, 105, 195, 105, 195]);
    }

    #[test]
    fn bi_pred_with_equal_weights_is_average() {
        let a = [10u8, 11, 250];
        let b = [20u8, 20, 255];
        let mut dst = [0u8; 3];
        weighted_bi_pred_luma(&a, 3, &b, 3, &mut dst, 3, 5, (32, 32), (0, 0), 3, 1);
        let mut avg = [0u8; 3];
        default_weighted_pred_luma(&a, 3, &b, 3, &mut avg, 3, 3, 1);
        assert_eq!(dst, avg);

        weighted_bi_pred_luma(&a, 3, &b, 3, &mut dst, 3, 0, (1, 0), (4, 5), 3, 1);
        // ((a + 1) >> 1) + 5
        assert_eq!(dst, [10, 11, 130]);
    }

    #[test]
    fn bi_pred_chroma_matches_luma_per_plane() {
        let a: Vec<u8> = (0..16).map(|i| (i * 13) as u8).collect();
        let b: Vec<u8> = (0..16).map(|i| (200 - i * 7) as u8).collect();
        let wu = (ChromaPair { u: 20, v: 40 }, ChromaPair { u: 44, v: 24 });
        let ou = (ChromaPair { u: 3, v: -8 }, ChromaPair { u: 0, v: -3 });
        let mut dst = [0u8; 16];
        weighted_bi_pred_chroma(&a, 16, &b, 16, &mut dst, 16, 5, wu, ou, 8, 1);
        for x in 0..16 {
            let mut one = [0u8; 1];
            let (w, o) = if x % 2 == 0 {
                ((wu.0.u, wu.1.u), (ou.0.u, ou.1.u))
            } else {
                ((wu.0.v, wu.1.v), (ou.0.v, ou.1.v))
            };
            weighted_bi_pred_luma(&a[x..], 1, &b[x..], 1, &mut one, 1, 5, w, o, 1, 1);
            assert_eq!(dst[x], one[0], "byte {}", x);
        }
    }
}
