//! `wide`-accelerated kernels for the `simd` feature.
//!
//! Uses i32x4 lanes for the 4x4 inverse transform, the luma DC Hadamard pair
//! and the single-axis luma half-pel filters. Every override is bit-exact with
//! the scalar kernel it replaces; everything else falls through to the
//! [`Dsp`] defaults.

use wide::i32x4;

use crate::clip_pixel;
use crate::interp;
use crate::kernels::Dsp;
use crate::recon::dequant_4x4_coeff;
use crate::tables::{DequantParams, QuantParams};
use crate::transform::quantize;

#[derive(Debug, Clone, Copy, Default)]
pub struct WideDsp;

pub static WIDE: WideDsp = WideDsp;

#[inline]
fn trunc16(v: i32x4) -> i32x4 {
    (v << 16) >> 16
}

fn transpose(rows: [i32x4; 4]) -> [i32x4; 4] {
    let r = rows.map(|v| v.to_array());
    [
        i32x4::new([r[0][0], r[1][0], r[2][0], r[3][0]]),
        i32x4::new([r[0][1], r[1][1], r[2][1], r[3][1]]),
        i32x4::new([r[0][2], r[1][2], r[2][2], r[3][2]]),
        i32x4::new([r[0][3], r[1][3], r[2][3], r[3][3]]),
    ]
}

/// One inverse 4x4 butterfly with lane `i` carrying the `i`th 1-D transform.
#[inline]
fn inv4_lanes(x: [i32x4; 4]) -> [i32x4; 4] {
    let t0 = x[0] + x[2];
    let t1 = x[0] - x[2];
    let t2 = (x[1] >> 1) - x[3];
    let t3 = (x[3] >> 1) + x[1];
    [
        trunc16(t0 + t3),
        trunc16(t1 + t2),
        trunc16(t1 - t2),
        trunc16(t0 - t3),
    ]
}

/// Returns the residual rows.
fn inverse_4x4_wide(coeffs: &[i32; 16]) -> [i32x4; 4] {
    // columns as vectors: lane r is row r, so the row pass runs lane-wise
    let cols = [0, 1, 2, 3].map(|c| {
        i32x4::new([coeffs[c], coeffs[4 + c], coeffs[8 + c], coeffs[12 + c]])
    });
    let rows_done = inv4_lanes(cols);
    let rows = transpose(rows_done);
    let out = inv4_lanes(rows);
    let rnd = i32x4::splat(32);
    [
        (out[0] + rnd) >> 6,
        (out[1] + rnd) >> 6,
        (out[2] + rnd) >> 6,
        (out[3] + rnd) >> 6,
    ]
}

fn dequant_4x4_wide(src: &[i16; 16], dequant: &DequantParams<'_>) -> [i32; 16] {
    let mut data = [0i32; 16];
    for (i, d) in data.iter_mut().enumerate() {
        *d = dequant_4x4_coeff(src[i], dequant.scale[i], dequant.weight[i], dequant.qp_div_6);
    }
    data
}

fn store_rows(rows: [i32x4; 4], pred: &[u8], pred_stride: usize, out: &mut [u8], out_stride: usize, step: usize) {
    for (y, row) in rows.iter().enumerate() {
        let res = row.to_array();
        for x in 0..4 {
            let p = pred[y * pred_stride + x * step] as i32;
            out[y * out_stride + x * step] = clip_pixel(p + res[x]);
        }
    }
}

fn hadamard_4x4_wide(src: &[i16; 16]) -> [i32; 16] {
    let cols = [0, 1, 2, 3].map(|c| {
        i32x4::new([
            src[c] as i32,
            src[4 + c] as i32,
            src[8 + c] as i32,
            src[12 + c] as i32,
        ])
    });
    let wht = |s: [i32x4; 4]| {
        let t0 = s[0] + s[1];
        let t1 = s[0] - s[1];
        let t2 = s[2] + s[3];
        let t3 = s[2] - s[3];
        [t0 + t2, t0 - t2, t1 - t3, t1 + t3]
    };
    let rows = transpose(wht(cols));
    // after the second pass vector k holds output row k
    let out = wht(rows);
    let mut data = [0i32; 16];
    for (r, v) in out.iter().enumerate() {
        data[r * 4..r * 4 + 4].copy_from_slice(&v.to_array().map(|x| x as i16 as i32));
    }
    data
}

#[inline]
fn load4(src: &[u8], pos: usize, step: usize) -> i32x4 {
    i32x4::new([
        src[pos] as i32,
        src[pos + step] as i32,
        src[pos + 2 * step] as i32,
        src[pos + 3 * step] as i32,
    ])
}

/// Six-tap half-pel filter, four outputs at a time. `tap` is the distance
/// between filter taps and `lane` the distance between outputs.
#[allow(clippy::too_many_arguments)]
fn half_pel_wide(
    src: &[u8],
    src_off: usize,
    src_stride: usize,
    dst: &mut [u8],
    dst_stride: usize,
    width: usize,
    height: usize,
    tap: usize,
) {
    let five = i32x4::splat(5);
    let twenty = i32x4::splat(20);
    let rnd = i32x4::splat(16);
    let zero = i32x4::splat(0);
    let max = i32x4::splat(255);
    for y in 0..height {
        for x in (0..width).step_by(4) {
            let pos = src_off + y * src_stride + x;
            let v = |k: usize| load4(src, pos + k * tap - 2 * tap, 1);
            let acc = v(0) - five * v(1) + twenty * v(2) + twenty * v(3) - five * v(4) + v(5);
            let px = ((acc + rnd) >> 5).max(zero).min(max).to_array();
            for (i, &p) in px.iter().enumerate() {
                dst[y * dst_stride + x + i] = p as u8;
            }
        }
    }
}

#[allow(clippy::too_many_arguments)]
impl Dsp for WideDsp {
    fn name(&self) -> &'static str {
        "wide"
    }

    fn iquant_itrans_recon_4x4(
        &self,
        src: &[i16; 16],
        pred: &[u8],
        pred_stride: usize,
        out: &mut [u8],
        out_stride: usize,
        dequant: &DequantParams<'_>,
        start_idx: usize,
        dc: i16,
    ) {
        let mut data = dequant_4x4_wide(src, dequant);
        if start_idx == 1 {
            data[0] = dc as i32;
        }
        store_rows(inverse_4x4_wide(&data), pred, pred_stride, out, out_stride, 1);
    }

    fn iquant_itrans_recon_chroma_4x4(
        &self,
        src: &[i16; 16],
        pred: &[u8],
        pred_stride: usize,
        out: &mut [u8],
        out_stride: usize,
        dequant: &DequantParams<'_>,
        dc: i16,
    ) {
        let mut data = dequant_4x4_wide(src, dequant);
        data[0] = dc as i32;
        store_rows(inverse_4x4_wide(&data), pred, pred_stride, out, out_stride, 2);
    }

    fn hadamard_quant_4x4(&self, src: &[i16; 16], out: &mut [i16; 16], quant: &QuantParams<'_>) -> u8 {
        let data = hadamard_4x4_wide(src);
        let (scale, threshold) = (quant.scale[0], quant.threshold[0]);
        let mut nnz = 0u8;
        for (o, &d) in out.iter_mut().zip(data.iter()) {
            *o = quantize(d >> 1, scale, threshold, quant.qbits, quant.round);
            if *o != 0 {
                nnz += 1;
            }
        }
        nnz
    }

    fn ihadamard_scaling_4x4(&self, src: &[i16; 16], out: &mut [i16; 16], dequant: &DequantParams<'_>) {
        let data = hadamard_4x4_wide(src);
        let mult = dequant.scale[0] as i32 * dequant.weight[0] as i32;
        let qp = dequant.qp_div_6;
        let rnd = if qp < 6 { 1 << (5 - qp) } else { 0 };
        for (o, &d) in out.iter_mut().zip(data.iter()) {
            *o = (((d * mult + rnd) << qp) >> 6) as i16;
        }
    }

    fn inter_pred_luma(
        &self,
        src: &[u8],
        src_off: usize,
        src_stride: usize,
        dst: &mut [u8],
        dst_stride: usize,
        width: usize,
        height: usize,
        dydx: u8,
    ) {
        match dydx & 15 {
            2 => half_pel_wide(src, src_off, src_stride, dst, dst_stride, width, height, 1),
            8 => half_pel_wide(src, src_off, src_stride, dst, dst_stride, width, height, src_stride),
            _ => interp::inter_pred_luma(src, src_off, src_stride, dst, dst_stride, width, height, dydx),
        }
    }
}

#[cfg(test)]
#[allow(clippy::needless_range_loop)]
mod tests {
    use super::*;
    use crate::kernels::SCALAR;
    use crate::tables::{dequant_4x4, quant_dc};

    fn noise(len: usize, seed: u32) -> Vec<u8> {
        let mut state = seed.max(1);
        (0..len)
            .map(|_| {
                state ^= state << 13;
                state ^= state >> 17;
                state ^= state << 5;
                (state >> 24) as u8
            })
            .collect()
    }

    #[test]
    fn inverse_4x4_matches_scalar() {
        let pred = noise(16, 11);
        for qp in [0u8, 12, 28, 40, 51] {
            let dq = dequant_4x4(qp).unwrap();
            let raw = noise(16, 100 + qp as u32);
            let mut coeffs = [0i16; 16];
            for i in 0..16 {
                coeffs[i] = raw[i] as i16 - 128;
            }
            for start_idx in 0..2 {
                let mut a = [0u8; 16];
                let mut b = [0u8; 16];
                SCALAR.iquant_itrans_recon_4x4(&coeffs, &pred, 4, &mut a, 4, &dq, start_idx, -300);
                WIDE.iquant_itrans_recon_4x4(&coeffs, &pred, 4, &mut b, 4, &dq, start_idx, -300);
                for i in 0..16 {
                    assert_eq!(a[i], b[i], "pixel {} differs at qp {}", i, qp);
                }
            }
        }
    }

    #[test]
    fn chroma_inverse_matches_scalar() {
        let dq = dequant_4x4(30).unwrap();
        let pred = noise(32, 5);
        let mut coeffs = [0i16; 16];
        for i in 0..16 {
            coeffs[i] = (i as i16 % 5) - 2;
        }
        let mut a = [7u8; 32];
        let mut b = [7u8; 32];
        SCALAR.iquant_itrans_recon_chroma_4x4(&coeffs, &pred, 8, &mut a, 8, &dq, 640);
        WIDE.iquant_itrans_recon_chroma_4x4(&coeffs, &pred, 8, &mut b, 8, &dq, 640);
        assert_eq!(a, b);
    }

    #[test]
    fn hadamard_pair_matches_scalar() {
        let q = quant_dc(22, true).unwrap();
        let dq = dequant_4x4(22).unwrap();
        let raw = noise(16, 77);
        let mut src = [0i16; 16];
        for i in 0..16 {
            src[i] = (raw[i] as i16 - 128) * 9;
        }
        let mut la = [0i16; 16];
        let mut lb = [0i16; 16];
        let na = SCALAR.hadamard_quant_4x4(&src, &mut la, &q.params());
        let nb = WIDE.hadamard_quant_4x4(&src, &mut lb, &q.params());
        assert_eq!(na, nb);
        assert_eq!(la, lb);

        let mut da = [0i16; 16];
        let mut db = [0i16; 16];
        SCALAR.ihadamard_scaling_4x4(&la, &mut da, &dq);
        WIDE.ihadamard_scaling_4x4(&lb, &mut db, &dq);
        assert_eq!(da, db);

        let q0 = quant_dc(0, true).unwrap();
        let na = SCALAR.hadamard_quant_4x4(&[4080; 16], &mut la, &q0.params());
        let nb = WIDE.hadamard_quant_4x4(&[4080; 16], &mut lb, &q0.params());
        assert_eq!(na, nb);
        assert_eq!(la, lb);
    }

    #[test]
    fn half_pel_matches_scalar() {
        let stride = 32;
        let src = noise(stride * 28, 9);
        let off = 4 * stride + 4;
        for dydx in 0..16u8 {
            for &(w, h) in &[(4usize, 4usize), (8, 8), (16, 16), (16, 8)] {
                let mut a = [0u8; 256];
                let mut b = [0u8; 256];
                SCALAR.inter_pred_luma(&src, off, stride, &mut a, 16, w, h, dydx);
                WIDE.inter_pred_luma(&src, off, stride, &mut b, 16, w, h, dydx);
                for i in 0..256 {
                    assert_eq!(a[i], b[i], "pixel {} differs for phase {} at {}x{}", i, dydx, w, h);
                }
            }
        }
    }
}
