//! Motion-compensated sub-pixel interpolation.
//!
//! Luma uses the six-tap `{1, -5, 20, 20, -5, 1}` half-pel filter with
//! quarter-pel positions formed by rounding averages; chroma uses the
//! eighth-pel bilinear filter on interleaved UV rows. Every source slice is
//! addressed by an offset of the block's full-pel origin so the filter taps
//! can reach two samples above/left and three below/right of the block.

use crate::clip_pixel;

/// `(src, src_off, src_stride, dst, dst_stride, width, height, dydx)`
pub type LumaPredFn = fn(&[u8], usize, usize, &mut [u8], usize, usize, usize, u8);

const MAX_BLK: usize = 16;

#[inline]
fn tap6(a: i32, b: i32, c: i32, d: i32, e: i32, f: i32) -> i32 {
    a - 5 * b + 20 * c + 20 * d - 5 * e + f
}

#[inline]
fn avg(a: u8, b: u8) -> u8 {
    ((a as u16 + b as u16 + 1) >> 1) as u8
}

#[inline]
fn tap_at(src: &[u8], pos: usize, step: usize) -> i32 {
    tap6(
        src[pos - 2 * step] as i32,
        src[pos - step] as i32,
        src[pos] as i32,
        src[pos + step] as i32,
        src[pos + 2 * step] as i32,
        src[pos + 3 * step] as i32,
    )
}

type Block = [u8; MAX_BLK * MAX_BLK];

fn check_block(width: usize, height: usize) {
    debug_assert!(matches!(width, 4 | 8 | 16), "luma width {}", width);
    debug_assert!(height > 0 && height <= MAX_BLK, "luma height {}", height);
}

/// Horizontal half-pel samples of the block whose full-pel origin is `origin`.
fn half_h(src: &[u8], origin: usize, stride: usize, width: usize, height: usize) -> Block {
    let mut out = [0u8; MAX_BLK * MAX_BLK];
    for y in 0..height {
        for x in 0..width {
            let v = tap_at(src, origin + y * stride + x, 1);
            out[y * MAX_BLK + x] = clip_pixel((v + 16) >> 5);
        }
    }
    out
}

fn half_v(src: &[u8], origin: usize, stride: usize, width: usize, height: usize) -> Block {
    let mut out = [0u8; MAX_BLK * MAX_BLK];
    for y in 0..height {
        for x in 0..width {
            let v = tap_at(src, origin + y * stride + x, stride);
            out[y * MAX_BLK + x] = clip_pixel((v + 16) >> 5);
        }
    }
    out
}

/// Centre half-pel samples: unrounded horizontal taps over the rows two
/// above to three below, then the vertical taps with a single final rounding.
fn half_hv(src: &[u8], origin: usize, stride: usize, width: usize, height: usize) -> Block {
    let mut tmp = [0i32; (MAX_BLK + 5) * MAX_BLK];
    let top = origin - 2 * stride;
    for y in 0..height + 5 {
        for x in 0..width {
            tmp[y * MAX_BLK + x] = tap_at(src, top + y * stride + x, 1);
        }
    }
    let mut out = [0u8; MAX_BLK * MAX_BLK];
    for y in 0..height {
        for x in 0..width {
            let t = |k: usize| tmp[(y + k) * MAX_BLK + x];
            let v = tap6(t(0), t(1), t(2), t(3), t(4), t(5));
            out[y * MAX_BLK + x] = clip_pixel((v + 512) >> 10);
        }
    }
    out
}

fn full(src: &[u8], origin: usize, stride: usize, width: usize, height: usize) -> Block {
    let mut out = [0u8; MAX_BLK * MAX_BLK];
    for y in 0..height {
        let row = origin + y * stride;
        out[y * MAX_BLK..y * MAX_BLK + width].copy_from_slice(&src[row..row + width]);
    }
    out
}

fn store(block: &Block, dst: &mut [u8], dst_stride: usize, width: usize, height: usize) {
    for y in 0..height {
        dst[y * dst_stride..y * dst_stride + width]
            .copy_from_slice(&block[y * MAX_BLK..y * MAX_BLK + width]);
    }
}

fn store_avg(a: &Block, b: &Block, dst: &mut [u8], dst_stride: usize, width: usize, height: usize) {
    for y in 0..height {
        for x in 0..width {
            dst[y * dst_stride + x] = avg(a[y * MAX_BLK + x], b[y * MAX_BLK + x]);
        }
    }
}

#[allow(clippy::too_many_arguments)]
pub fn inter_pred_luma_copy(
    src: &[u8],
    src_off: usize,
    src_stride: usize,
    dst: &mut [u8],
    dst_stride: usize,
    width: usize,
    height: usize,
    _dydx: u8,
) {
    check_block(width, height);
    for y in 0..height {
        let s = src_off + y * src_stride;
        dst[y * dst_stride..y * dst_stride + width].copy_from_slice(&src[s..s + width]);
    }
}

#[allow(clippy::too_many_arguments)]
pub fn inter_pred_luma_horz(
    src: &[u8],
    src_off: usize,
    src_stride: usize,
    dst: &mut [u8],
    dst_stride: usize,
    width: usize,
    height: usize,
    _dydx: u8,
) {
    check_block(width, height);
    let b = half_h(src, src_off, src_stride, width, height);
    store(&b, dst, dst_stride, width, height);
}

#[allow(clippy::too_many_arguments)]
pub fn inter_pred_luma_vert(
    src: &[u8],
    src_off: usize,
    src_stride: usize,
    dst: &mut [u8],
    dst_stride: usize,
    width: usize,
    height: usize,
    _dydx: u8,
) {
    check_block(width, height);
    let h = half_v(src, src_off, src_stride, width, height);
    store(&h, dst, dst_stride, width, height);
}

#[allow(clippy::too_many_arguments)]
pub fn inter_pred_luma_horz_hpel_vert_hpel(
    src: &[u8],
    src_off: usize,
    src_stride: usize,
    dst: &mut [u8],
    dst_stride: usize,
    width: usize,
    height: usize,
    _dydx: u8,
) {
    check_block(width, height);
    let j = half_hv(src, src_off, src_stride, width, height);
    store(&j, dst, dst_stride, width, height);
}

/// Horizontal quarter-pel: half-pel averaged with the full-pel sample to its
/// left (dx = 1) or right (dx = 3).
#[allow(clippy::too_many_arguments)]
pub fn inter_pred_luma_horz_qpel(
    src: &[u8],
    src_off: usize,
    src_stride: usize,
    dst: &mut [u8],
    dst_stride: usize,
    width: usize,
    height: usize,
    dydx: u8,
) {
    check_block(width, height);
    let x_off = usize::from((dydx & 3) >> 1);
    let b = half_h(src, src_off, src_stride, width, height);
    let g = full(src, src_off + x_off, src_stride, width, height);
    store_avg(&b, &g, dst, dst_stride, width, height);
}

#[allow(clippy::too_many_arguments)]
pub fn inter_pred_luma_vert_qpel(
    src: &[u8],
    src_off: usize,
    src_stride: usize,
    dst: &mut [u8],
    dst_stride: usize,
    width: usize,
    height: usize,
    dydx: u8,
) {
    check_block(width, height);
    let y_off = usize::from(((dydx >> 2) & 3) >> 1);
    let h = half_v(src, src_off, src_stride, width, height);
    let g = full(src, src_off + y_off * src_stride, src_stride, width, height);
    store_avg(&h, &g, dst, dst_stride, width, height);
}

/// Both axes at a quarter position: the horizontal half-pel row nearest the
/// target averaged with the vertical half-pel column nearest the target.
/// No full-pel sample takes part.
#[allow(clippy::too_many_arguments)]
pub fn inter_pred_luma_horz_qpel_vert_qpel(
    src: &[u8],
    src_off: usize,
    src_stride: usize,
    dst: &mut [u8],
    dst_stride: usize,
    width: usize,
    height: usize,
    dydx: u8,
) {
    check_block(width, height);
    let x_off = usize::from((dydx & 3) >> 1);
    let y_off = usize::from(((dydx >> 2) & 3) >> 1);
    let b = half_h(src, src_off + y_off * src_stride, src_stride, width, height);
    let h = half_v(src, src_off + x_off, src_stride, width, height);
    store_avg(&b, &h, dst, dst_stride, width, height);
}

/// Quarter-pel horizontally, half-pel vertically: centre sample averaged with
/// the vertical half-pel column on the near side.
#[allow(clippy::too_many_arguments)]
pub fn inter_pred_luma_horz_qpel_vert_hpel(
    src: &[u8],
    src_off: usize,
    src_stride: usize,
    dst: &mut [u8],
    dst_stride: usize,
    width: usize,
    height: usize,
    dydx: u8,
) {
    check_block(width, height);
    let x_off = usize::from((dydx & 3) >> 1);
    let j = half_hv(src, src_off, src_stride, width, height);
    let h = half_v(src, src_off + x_off, src_stride, width, height);
    store_avg(&j, &h, dst, dst_stride, width, height);
}

#[allow(clippy::too_many_arguments)]
pub fn inter_pred_luma_horz_hpel_vert_qpel(
    src: &[u8],
    src_off: usize,
    src_stride: usize,
    dst: &mut [u8],
    dst_stride: usize,
    width: usize,
    height: usize,
    dydx: u8,
) {
    check_block(width, height);
    let y_off = usize::from(((dydx >> 2) & 3) >> 1);
    let j = half_hv(src, src_off, src_stride, width, height);
    let b = half_h(src, src_off + y_off * src_stride, src_stride, width, height);
    store_avg(&j, &b, dst, dst_stride, width, height);
}

/// Kernel per `dydx = dy * 4 + dx`.
pub const LUMA_PHASES: [LumaPredFn; 16] = [
    inter_pred_luma_copy,
    inter_pred_luma_horz_qpel,
    inter_pred_luma_horz,
    inter_pred_luma_horz_qpel,
    inter_pred_luma_vert_qpel,
    inter_pred_luma_horz_qpel_vert_qpel,
    inter_pred_luma_horz_hpel_vert_qpel,
    inter_pred_luma_horz_qpel_vert_qpel,
    inter_pred_luma_vert,
    inter_pred_luma_horz_qpel_vert_hpel,
    inter_pred_luma_horz_hpel_vert_hpel,
    inter_pred_luma_horz_qpel_vert_hpel,
    inter_pred_luma_vert_qpel,
    inter_pred_luma_horz_qpel_vert_qpel,
    inter_pred_luma_horz_hpel_vert_qpel,
    inter_pred_luma_horz_qpel_vert_qpel,
];

#[allow(clippy::too_many_arguments)]
pub fn inter_pred_luma(
    src: &[u8],
    src_off: usize,
    src_stride: usize,
    dst: &mut [u8],
    dst_stride: usize,
    width: usize,
    height: usize,
    dydx: u8,
) {
    let dydx = dydx & 15;
    LUMA_PHASES[usize::from(dydx)](src, src_off, src_stride, dst, dst_stride, width, height, dydx);
}

/// Eighth-pel bilinear chroma prediction on interleaved UV. `width` counts
/// UV pairs (2, 4 or 8); horizontal neighbours of one plane sit two bytes
/// apart.
#[allow(clippy::too_many_arguments)]
pub fn inter_pred_chroma(
    src: &[u8],
    src_off: usize,
    src_stride: usize,
    dst: &mut [u8],
    dst_stride: usize,
    dx: u8,
    dy: u8,
    width: usize,
    height: usize,
) {
    debug_assert!(dx < 8 && dy < 8);
    debug_assert!(matches!(width, 2 | 4 | 8), "chroma width {}", width);
    let bytes = 2 * width;

    if dx == 0 && dy == 0 {
        for y in 0..height {
            let s = src_off + y * src_stride;
            dst[y * dst_stride..y * dst_stride + bytes].copy_from_slice(&src[s..s + bytes]);
        }
        return;
    }

    let (dx, dy) = (dx as i32, dy as i32);
    let wa = (8 - dx) * (8 - dy);
    let wb = dx * (8 - dy);
    let wc = (8 - dx) * dy;
    let wd = dx * dy;
    for y in 0..height {
        for x in 0..bytes {
            let p = src_off + y * src_stride + x;
            let mut acc = wa * src[p] as i32;
            if dx != 0 {
                acc += wb * src[p + 2] as i32;
            }
            if dy != 0 {
                acc += wc * src[p + src_stride] as i32;
            }
            if dx != 0 && dy != 0 {
                acc += wd * src[p + src_stride + 2] as i32;
            }
            dst[y * dst_stride + x] = ((acc + 32) >> 6) as u8;
        }
    }
}

/// Rounding average of two prediction blocks.
#[allow(clippy::too_many_arguments)]
pub fn inter_pred_luma_bilinear(
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
            dst[y * dst_stride + x] = avg(src1[y * src1_stride + x], src2[y * src2_stride + x]);
        }
    }
}
