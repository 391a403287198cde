use crate::clip_pixel;
use crate::tables::DequantParams;

#[inline]
pub fn dequant_4x4_coeff(coeff: i16, scale: u16, weight: u16, qp_div_6: u32) -> i32 {
    let rnd = if qp_div_6 < 4 { 1 << (3 - qp_div_6) } else { 0 };
    ((coeff as i32 * scale as i32 * weight as i32 + rnd) << qp_div_6) >> 4
}

#[inline]
pub fn dequant_8x8_coeff(coeff: i16, scale: u16, weight: u16, qp_div_6: u32) -> i32 {
    let rnd = if qp_div_6 < 6 { 1 << (5 - qp_div_6) } else { 0 };
    ((coeff as i32 * scale as i32 * weight as i32 + rnd) << qp_div_6) >> 6
}

fn inv4_1d(data: &mut [i32], offset: usize, stride: usize) {
    let in0 = data[offset];
    let in1 = data[offset + stride];
    let in2 = data[offset + 2 * stride];
    let in3 = data[offset + 3 * stride];

    let t0 = in0 + in2;
    let t1 = in0 - in2;
    let t2 = (in1 >> 1) - in3;
    let t3 = (in3 >> 1) + in1;

    data[offset] = (t0 + t3) as i16 as i32;
    data[offset + stride] = (t1 + t2) as i16 as i32;
    data[offset + 2 * stride] = (t1 - t2) as i16 as i32;
    data[offset + 3 * stride] = (t0 - t3) as i16 as i32;
}

fn inv8_1d(data: &mut [i32], offset: usize, stride: usize) {
    let s = |k: usize| data[offset + k * stride];

    let v0 = s(0) + s(4);
    let v1 = s(0) - s(4);
    let v2 = (s(2) >> 1) - s(6);
    let v3 = s(2) + (s(6) >> 1);

    let t0 = v0 + v3;
    let t1 = v1 + v2;
    let t2 = v1 - v2;
    let t3 = v0 - v3;

    let a1 = s(5) - s(3) - s(7) - (s(7) >> 1);
    let a3 = s(1) + s(7) - s(3) - (s(3) >> 1);
    let a5 = -s(1) + s(7) + s(5) + (s(5) >> 1);
    let a7 = s(3) + s(5) + s(1) + (s(1) >> 1);

    let t4 = a1 + (a7 >> 2);
    let t5 = a3 + (a5 >> 2);
    let t6 = (a3 >> 2) - a5;
    let t7 = a7 - (a1 >> 2);

    data[offset] = t0 + t7;
    data[offset + stride] = t1 + t6;
    data[offset + 2 * stride] = t2 + t5;
    data[offset + 3 * stride] = t3 + t4;
    data[offset + 4 * stride] = t3 - t4;
    data[offset + 5 * stride] = t2 - t5;
    data[offset + 6 * stride] = t1 - t6;
    data[offset + 7 * stride] = t0 - t7;
}

/// Inverse 4x4 core transform, rows first, each pass wrapped to 16 bits.
/// Returns the residual before the final `(x + 32) >> 6` normalization.
pub fn inverse_4x4(coeffs: &[i32; 16]) -> [i32; 16] {
    let mut data = *coeffs;
    for row in 0..4 {
        inv4_1d(&mut data, row * 4, 1);
    }
    for col in 0..4 {
        inv4_1d(&mut data, col, 4);
    }
    data
}

/// Inverse 8x8 core transform. The row pass wraps to 16 bits, the column
/// pass stays in 32 bits.
pub fn inverse_8x8(coeffs: &[i32; 64]) -> [i32; 64] {
    let mut data = *coeffs;
    for row in 0..8 {
        inv8_1d(&mut data, row * 8, 1);
        for v in &mut data[row * 8..row * 8 + 8] {
            *v = *v as i16 as i32;
        }
    }
    for col in 0..8 {
        inv8_1d(&mut data, col, 8);
    }
    data
}

fn add_residual(
    residual: &[i32],
    size: usize,
    pred: &[u8],
    pred_stride: usize,
    out: &mut [u8],
    out_stride: usize,
    step: usize,
) {
    for y in 0..size {
        for x in 0..size {
            let r = (residual[y * size + x] + 32) >> 6;
            out[y * out_stride + x * step] = clip_pixel(pred[y * pred_stride + x * step] as i32 + r);
        }
    }
}

fn add_dc(
    dc: i32,
    size: usize,
    pred: &[u8],
    pred_stride: usize,
    out: &mut [u8],
    out_stride: usize,
    step: usize,
) {
    let r = (dc + 32) >> 6;
    for y in 0..size {
        for x in 0..size {
            out[y * out_stride + x * step] = clip_pixel(pred[y * pred_stride + x * step] as i32 + r);
        }
    }
}

fn dequant_block_4x4(src: &[i16; 16], dequant: &DequantParams<'_>) -> [i32; 16] {
    debug_assert!(dequant.scale.len() >= 16 && dequant.weight.len() >= 16);
    let mut data = [0i32; 16];
    for (i, d) in data.iter_mut().enumerate() {
        *d = dequant_4x4_coeff(src[i], dequant.scale[i], dequant.weight[i], dequant.qp_div_6);
    }
    data
}

/// Dequantizes, inverse transforms and adds a 4x4 residual to `pred`.
/// With `start_idx == 1` the DC position takes `dc` (already scaled by the
/// inverse Hadamard stage) instead of the dequantized `src[0]`.
#[allow(clippy::too_many_arguments)]
pub fn iquant_itrans_recon_4x4(
    src: &[i16; 16],
    pred: &[u8],
    pred_stride: usize,
    out: &mut [u8],
    out_stride: usize,
    dequant: &DequantParams<'_>,
    start_idx: usize,
    dc: i16,
) {
    debug_assert!(start_idx <= 1);
    let mut data = dequant_block_4x4(src, dequant);
    if start_idx == 1 {
        data[0] = dc as i32;
    }
    let residual = inverse_4x4(&data);
    add_residual(&residual, 4, pred, pred_stride, out, out_stride, 1);
}

#[allow(clippy::too_many_arguments)]
pub fn iquant_itrans_recon_4x4_dc(
    src: &[i16; 16],
    pred: &[u8],
    pred_stride: usize,
    out: &mut [u8],
    out_stride: usize,
    dequant: &DequantParams<'_>,
    start_idx: usize,
    dc: i16,
) {
    let dc = if start_idx == 0 {
        dequant_4x4_coeff(src[0], dequant.scale[0], dequant.weight[0], dequant.qp_div_6)
    } else {
        dc as i32
    };
    add_dc(dc as i16 as i32, 4, pred, pred_stride, out, out_stride, 1);
}

pub fn iquant_itrans_recon_8x8(
    src: &[i16; 64],
    pred: &[u8],
    pred_stride: usize,
    out: &mut [u8],
    out_stride: usize,
    dequant: &DequantParams<'_>,
) {
    debug_assert!(dequant.scale.len() >= 64 && dequant.weight.len() >= 64);
    let mut data = [0i32; 64];
    for (i, d) in data.iter_mut().enumerate() {
        *d = dequant_8x8_coeff(src[i], dequant.scale[i], dequant.weight[i], dequant.qp_div_6)
            as i16 as i32;
    }
    let residual = inverse_8x8(&data);
    add_residual(&residual, 8, pred, pred_stride, out, out_stride, 1);
}

pub fn iquant_itrans_recon_8x8_dc(
    src: &[i16; 64],
    pred: &[u8],
    pred_stride: usize,
    out: &mut [u8],
    out_stride: usize,
    dequant: &DequantParams<'_>,
) {
    let dc = dequant_8x8_coeff(src[0], dequant.scale[0], dequant.weight[0], dequant.qp_div_6);
    add_dc(dc as i16 as i32, 8, pred, pred_stride, out, out_stride, 1);
}

/// Chroma counterpart of [`iquant_itrans_recon_4x4`] on one plane of
/// interleaved UV. The DC always comes from `dc`; only bytes `2 * j` of each
/// destination row are written.
pub fn iquant_itrans_recon_chroma_4x4(
    src: &[i16; 16],
    pred: &[u8],
    pred_stride: usize,
    out: &mut [u8],
    out_stride: usize,
    dequant: &DequantParams<'_>,
    dc: i16,
) {
    let mut data = dequant_block_4x4(src, dequant);
    data[0] = dc as i32;
    let residual = inverse_4x4(&data);
    add_residual(&residual, 4, pred, pred_stride, out, out_stride, 2);
}

pub fn iquant_itrans_recon_chroma_4x4_dc(
    _src: &[i16; 16],
    pred: &[u8],
    pred_stride: usize,
    out: &mut [u8],
    out_stride: usize,
    _dequant: &DequantParams<'_>,
    dc: i16,
) {
    add_dc(dc as i32, 4, pred, pred_stride, out, out_stride, 2);
}
