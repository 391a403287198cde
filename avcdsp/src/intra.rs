//! Intra prediction from reconstructed neighbours.
//!
//! Neighbours are packed into one array: the left column bottom-up (so
//! `ngbr[0]` is left of the last row), then the top-left sample at `ngbr[n]`,
//! then the top row and, for 4x4/8x8, the top-right row from `ngbr[n + 1]`.
//! Chroma uses the same layout with every entry a UV pair.

use crate::clip_pixel;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct NeighbourAvail {
    pub left: bool,
    pub top: bool,
}

impl NeighbourAvail {
    pub const ALL: Self = Self {
        left: true,
        top: true,
    };
    pub const NONE: Self = Self {
        left: false,
        top: false,
    };
}

/// `(ngbr, dst, dst_stride, avail)`
pub type IntraPredFn = fn(&[u8], &mut [u8], usize, NeighbourAvail);

fn fill_vert(ngbr: &[u8], dst: &mut [u8], dst_stride: usize, n: usize) {
    let top = &ngbr[n + 1..2 * n + 1];
    for y in 0..n {
        dst[y * dst_stride..y * dst_stride + n].copy_from_slice(top);
    }
}

fn fill_horz(ngbr: &[u8], dst: &mut [u8], dst_stride: usize, n: usize) {
    for y in 0..n {
        dst[y * dst_stride..y * dst_stride + n].fill(ngbr[n - 1 - y]);
    }
}

/// DC of an `n`x`n` block, `n = 1 << log2n`.
fn dc_value(ngbr: &[u8], n: usize, log2n: u32, avail: NeighbourAvail) -> u8 {
    let left: u32 = ngbr[..n].iter().map(|&p| u32::from(p)).sum();
    let top: u32 = ngbr[n + 1..2 * n + 1].iter().map(|&p| u32::from(p)).sum();
    let half = 1u32 << (log2n - 1);
    match (avail.left, avail.top) {
        (true, true) => ((left + top + n as u32) >> (log2n + 1)) as u8,
        (true, false) => ((left + half) >> log2n) as u8,
        (false, true) => ((top + half) >> log2n) as u8,
        (false, false) => 128,
    }
}

fn fill_dc(dst: &mut [u8], dst_stride: usize, n: usize, value: u8) {
    for y in 0..n {
        dst[y * dst_stride..y * dst_stride + n].fill(value);
    }
}

/// Diagonal down-left over `2n` top and top-right samples.
fn fill_diag_dl(ngbr: &[u8], dst: &mut [u8], dst_stride: usize, n: usize) {
    let t = |i: usize| ngbr[n + 1 + i] as u32;
    let last = 2 * n - 2;
    for y in 0..n {
        for x in 0..n {
            let k = x + y;
            let v = if k == last {
                t(k) + 3 * t(k + 1) + 2
            } else {
                t(k) + 2 * t(k + 1) + t(k + 2) + 2
            };
            dst[y * dst_stride + x] = (v >> 2) as u8;
        }
    }
}

pub fn intra_pred_luma_4x4_vert(ngbr: &[u8], dst: &mut [u8], dst_stride: usize, _avail: NeighbourAvail) {
    fill_vert(ngbr, dst, dst_stride, 4);
}

pub fn intra_pred_luma_4x4_horz(ngbr: &[u8], dst: &mut [u8], dst_stride: usize, _avail: NeighbourAvail) {
    fill_horz(ngbr, dst, dst_stride, 4);
}

pub fn intra_pred_luma_4x4_dc(ngbr: &[u8], dst: &mut [u8], dst_stride: usize, avail: NeighbourAvail) {
    fill_dc(dst, dst_stride, 4, dc_value(ngbr, 4, 2, avail));
}

pub fn intra_pred_luma_4x4_diag_dl(
    ngbr: &[u8],
    dst: &mut [u8],
    dst_stride: usize,
    _avail: NeighbourAvail,
) {
    fill_diag_dl(ngbr, dst, dst_stride, 4);
}

pub fn intra_pred_luma_8x8_vert(ngbr: &[u8], dst: &mut [u8], dst_stride: usize, _avail: NeighbourAvail) {
    fill_vert(ngbr, dst, dst_stride, 8);
}

pub fn intra_pred_luma_8x8_horz(ngbr: &[u8], dst: &mut [u8], dst_stride: usize, _avail: NeighbourAvail) {
    fill_horz(ngbr, dst, dst_stride, 8);
}

pub fn intra_pred_luma_8x8_dc(ngbr: &[u8], dst: &mut [u8], dst_stride: usize, avail: NeighbourAvail) {
    fill_dc(dst, dst_stride, 8, dc_value(ngbr, 8, 3, avail));
}

pub fn intra_pred_luma_8x8_diag_dl(
    ngbr: &[u8],
    dst: &mut [u8],
    dst_stride: usize,
    _avail: NeighbourAvail,
) {
    fill_diag_dl(ngbr, dst, dst_stride, 8);
}

pub fn intra_pred_luma_16x16_vert(
    ngbr: &[u8],
    dst: &mut [u8],
    dst_stride: usize,
    _avail: NeighbourAvail,
) {
    fill_vert(ngbr, dst, dst_stride, 16);
}

pub fn intra_pred_luma_16x16_horz(
    ngbr: &[u8],
    dst: &mut [u8],
    dst_stride: usize,
    _avail: NeighbourAvail,
) {
    fill_horz(ngbr, dst, dst_stride, 16);
}

pub fn intra_pred_luma_16x16_dc(ngbr: &[u8], dst: &mut [u8], dst_stride: usize, avail: NeighbourAvail) {
    fill_dc(dst, dst_stride, 16, dc_value(ngbr, 16, 4, avail));
}

/// Plane prediction; needs both neighbours and the top-left sample.
pub fn intra_pred_luma_16x16_plane(
    ngbr: &[u8],
    dst: &mut [u8],
    dst_stride: usize,
    _avail: NeighbourAvail,
) {
    // index -1 of either edge is the top-left sample
    let top = |i: isize| ngbr[(17 + i) as usize] as i32;
    let left = |j: isize| ngbr[(15 - j) as usize] as i32;

    let mut h = 0;
    let mut v = 0;
    for k in 0..8isize {
        h += (k as i32 + 1) * (top(8 + k) - top(6 - k));
        v += (k as i32 + 1) * (left(8 + k) - left(6 - k));
    }
    let a = 16 * (left(15) + top(15));
    let b = (5 * h + 32) >> 6;
    let c = (5 * v + 32) >> 6;

    for y in 0..16 {
        for x in 0..16 {
            let p = (a + b * (x as i32 - 7) + c * (y as i32 - 7) + 16) >> 5;
            dst[y * dst_stride + x] = clip_pixel(p);
        }
    }
}

pub fn intra_pred_chroma_8x8_horz(
    ngbr: &[u8],
    dst: &mut [u8],
    dst_stride: usize,
    _avail: NeighbourAvail,
) {
    for y in 0..8 {
        let pair = 2 * (7 - y);
        let (u, v) = (ngbr[pair], ngbr[pair + 1]);
        for x in 0..8 {
            dst[y * dst_stride + 2 * x] = u;
            dst[y * dst_stride + 2 * x + 1] = v;
        }
    }
}

pub fn intra_pred_chroma_8x8_vert(
    ngbr: &[u8],
    dst: &mut [u8],
    dst_stride: usize,
    _avail: NeighbourAvail,
) {
    let top = &ngbr[2 * 8 + 2..2 * 8 + 2 + 16];
    for y in 0..8 {
        dst[y * dst_stride..y * dst_stride + 16].copy_from_slice(top);
    }
}

/// Chroma DC, computed per plane for each 4x4 quadrant. The top-right
/// quadrant prefers the top samples and the bottom-left the left samples.
pub fn intra_pred_chroma_8x8_dc(ngbr: &[u8], dst: &mut [u8], dst_stride: usize, avail: NeighbourAvail) {
    for plane in 0..2 {
        // left pair k sits at row 7 - k
        let left_sum = |qy: usize| -> u32 {
            (0..4)
                .map(|r| u32::from(ngbr[2 * (7 - (qy * 4 + r)) + plane]))
                .sum()
        };
        let top_sum = |qx: usize| -> u32 {
            (0..4)
                .map(|c| u32::from(ngbr[18 + 2 * (qx * 4 + c) + plane]))
                .sum()
        };
        for qy in 0..2 {
            for qx in 0..2 {
                let (use_left, use_top) = match (qx, qy, avail.left, avail.top) {
                    (1, 0, _, true) => (false, true),
                    (0, 1, true, _) => (true, false),
                    (_, _, l, t) => (l, t),
                };
                let value = match (use_left, use_top) {
                    (true, true) => (left_sum(qy) + top_sum(qx) + 4) >> 3,
                    (true, false) => (left_sum(qy) + 2) >> 2,
                    (false, true) => (top_sum(qx) + 2) >> 2,
                    (false, false) => 128,
                } as u8;
                for y in qy * 4..qy * 4 + 4 {
                    for x in qx * 4..qx * 4 + 4 {
                        dst[y * dst_stride + 2 * x + plane] = value;
                    }
                }
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::needless_range_loop)]
mod tests {
    use super::*;

    /// Neighbour array for an `n`x`n` luma block from pixel functions.
    fn ngbr_from(n: usize, left: impl Fn(usize) -> u8, top_left: u8, top: impl Fn(usize) -> u8) -> Vec<u8> {
        let mut out = vec![0u8; 4 * n + 1];
        for j in 0..n {
            out[n - 1 - j] = left(j);
        }
        out[n] = top_left;
        for i in 0..2 * n {
            out[n + 1 + i] = top(i);
        }
        out
    }

    #[test]
    fn vert_and_horz_copy_neighbours() {
        let ngbr = ngbr_from(4, |j| 10 + j as u8, 0, |i| 50 + i as u8);
        let mut v = [0u8; 16];
        let mut h = [0u8; 16];
        intra_pred_luma_4x4_vert(&ngbr, &mut v, 4, NeighbourAvail::ALL);
        intra_pred_luma_4x4_horz(&ngbr, &mut h, 4, NeighbourAvail::ALL);
        for y in 0..4 {
            for x in 0..4 {
                assert_eq!(v[y * 4 + x], 50 + x as u8);
                assert_eq!(h[y * 4 + x], 10 + y as u8);
            }
        }

        let ngbr = ngbr_from(16, |j| 3 * j as u8, 0, |i| 200 - i as u8);
        let mut v = [0u8; 256];
        let mut h = [0u8; 256];
        intra_pred_luma_16x16_vert(&ngbr, &mut v, 16, NeighbourAvail::ALL);
        intra_pred_luma_16x16_horz(&ngbr, &mut h, 16, NeighbourAvail::ALL);
        assert_eq!(v[15 * 16 + 15], 185);
        assert_eq!(h[15 * 16], 45);
    }

    #[test]
    fn dc_follows_availability() {
        let ngbr = ngbr_from(4, |_| 20, 0, |_| 61);
        let cases = [
            (NeighbourAvail::ALL, (80 + 244 + 4) >> 3),
            (NeighbourAvail { left: true, top: false }, 20),
            (NeighbourAvail { left: false, top: true }, 61),
            (NeighbourAvail::NONE, 128),
        ];
        for (avail, want) in cases {
            let mut dst = [0u8; 16];
            intra_pred_luma_4x4_dc(&ngbr, &mut dst, 4, avail);
            assert!(dst.iter().all(|&p| p as u32 == want), "{:?}", avail);
        }

        let ngbr = ngbr_from(16, |j| j as u8, 0, |_| 0);
        let mut dst = [0u8; 256];
        intra_pred_luma_16x16_dc(&ngbr, &mut dst, 16, NeighbourAvail { left: true, top: false });
        // (0 + 1 + ... + 15 + 8) >> 4
        assert!(dst.iter().all(|&p| p == 8));
        intra_pred_luma_8x8_dc(&ngbr_from(8, |_| 9, 0, |_| 9), &mut dst, 16, NeighbourAvail::ALL);
        assert_eq!(dst[7 * 16 + 7], 9);
    }

    #[test]
    fn diag_down_left_on_ramp() {
        let ngbr = ngbr_from(4, |_| 0, 0, |i| 10 * i as u8);
        let mut dst = [0u8; 16];
        intra_pred_luma_4x4_diag_dl(&ngbr, &mut dst, 4, NeighbourAvail::ALL);
        for y in 0..4 {
            for x in 0..4 {
                let want = if x + y == 6 { 68 } else { 10 * (x + y + 1) as u8 };
                assert_eq!(dst[y * 4 + x], want, "pixel ({}, {})", x, y);
            }
        }

        let ngbr = ngbr_from(8, |_| 0, 0, |i| 4 * i as u8);
        let mut dst = [0u8; 64];
        intra_pred_luma_8x8_diag_dl(&ngbr, &mut dst, 8, NeighbourAvail::ALL);
        assert_eq!(dst[0], 4);
        // (56 + 3 * 60 + 2) >> 2
        assert_eq!(dst[63], 59);
    }

    #[test]
    fn plane_reproduces_linear_gradient() {
        let f = |x: i32, y: i32| (100 + 2 * x + 3 * y) as u8;
        let ngbr = ngbr_from(16, |j| f(-1, j as i32), f(-1, -1), |i| f(i as i32, -1));
        let mut dst = [0u8; 256];
        intra_pred_luma_16x16_plane(&ngbr, &mut dst, 16, NeighbourAvail::ALL);
        for y in 0..16 {
            for x in 0..16 {
                assert_eq!(dst[y * 16 + x], f(x as i32, y as i32), "pixel ({}, {})", x, y);
            }
        }
    }

    fn chroma_ngbr(left: impl Fn(usize, usize) -> u8, top: impl Fn(usize, usize) -> u8) -> Vec<u8> {
        let mut out = vec![0u8; 34];
        for row in 0..8 {
            for p in 0..2 {
                out[2 * (7 - row) + p] = left(row, p);
            }
        }
        for col in 0..8 {
            for p in 0..2 {
                out[18 + 2 * col + p] = top(col, p);
            }
        }
        out
    }

    #[test]
    fn chroma_horz_and_vert_keep_planes() {
        let ngbr = chroma_ngbr(|row, p| (row * 10 + p) as u8, |col, p| (100 + col * 5 + p) as u8);
        let mut h = [0u8; 16 * 8];
        let mut v = [0u8; 16 * 8];
        intra_pred_chroma_8x8_horz(&ngbr, &mut h, 16, NeighbourAvail::ALL);
        intra_pred_chroma_8x8_vert(&ngbr, &mut v, 16, NeighbourAvail::ALL);
        for y in 0..8 {
            for x in 0..8 {
                assert_eq!(h[y * 16 + 2 * x], (y * 10) as u8);
                assert_eq!(h[y * 16 + 2 * x + 1], (y * 10 + 1) as u8);
                assert_eq!(v[y * 16 + 2 * x], (100 + x * 5) as u8);
                assert_eq!(v[y * 16 + 2 * x + 1], (101 + x * 5) as u8);
            }
        }
    }

    #[test]
    fn chroma_dc_quadrants() {
        let ngbr = chroma_ngbr(|row, p| if row < 4 { 40 + p as u8 } else { 80 }, |_, p| 120 + p as u8);
        let mut dst = [0u8; 16 * 8];
        intra_pred_chroma_8x8_dc(&ngbr, &mut dst, 16, NeighbourAvail::ALL);
        // top-left averages both, top-right takes top, bottom-left takes left
        assert_eq!(dst[0], 80);
        assert_eq!(dst[1], 81);
        assert_eq!(dst[2 * 4], 120);
        assert_eq!(dst[4 * 16], 80);
        assert_eq!(dst[4 * 16 + 2 * 4], 100);

        intra_pred_chroma_8x8_dc(&ngbr, &mut dst, 16, NeighbourAvail { left: false, top: true });
        assert_eq!(dst[4 * 16], 120);
        intra_pred_chroma_8x8_dc(&ngbr, &mut dst, 16, NeighbourAvail::NONE);
        assert!(dst.iter().all(|&p| p == 128));
    }
}
