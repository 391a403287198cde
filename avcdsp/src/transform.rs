use crate::tables::QuantParams;

/// Result of a 4x4 forward transform + quantization.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Quantized {
    pub nnz: u8,
    /// Transformed DC before quantization, fed to the DC Hadamard stage.
    pub alt_dc: i16,
}

fn fwd4_1d(data: &mut [i32], offset: usize, stride: usize) {
    let x0 = data[offset];
    let x1 = data[offset + stride];
    let x2 = data[offset + 2 * stride];
    let x3 = data[offset + 3 * stride];

    let a0 = x0 + x3;
    let a1 = x1 + x2;
    let a2 = x1 - x2;
    let a3 = x0 - x3;

    data[offset] = a0 + a1;
    data[offset + stride] = 2 * a3 + a2;
    data[offset + 2 * stride] = a0 - a1;
    data[offset + 3 * stride] = a3 - 2 * a2;
}

fn fwd8_1d(data: &mut [i32], offset: usize, stride: usize) {
    let s = |k: usize| data[offset + k * stride];
    let s07 = s(0) + s(7);
    let s16 = s(1) + s(6);
    let s25 = s(2) + s(5);
    let s34 = s(3) + s(4);
    let d07 = s(0) - s(7);
    let d16 = s(1) - s(6);
    let d25 = s(2) - s(5);
    let d34 = s(3) - s(4);

    let a0 = s07 + s34;
    let a1 = s16 + s25;
    let a2 = s07 - s34;
    let a3 = s16 - s25;

    let a4 = d16 + d25 + (d07 + (d07 >> 1));
    let a5 = d07 - d34 - (d25 + (d25 >> 1));
    let a6 = d07 + d34 - (d16 + (d16 >> 1));
    let a7 = d16 - d25 + (d34 + (d34 >> 1));

    data[offset] = a0 + a1;
    data[offset + stride] = a4 + (a7 >> 2);
    data[offset + 2 * stride] = a2 + (a3 >> 1);
    data[offset + 3 * stride] = a5 + (a6 >> 2);
    data[offset + 4 * stride] = a0 - a1;
    data[offset + 5 * stride] = a6 - (a5 >> 2);
    data[offset + 6 * stride] = (a2 >> 1) - a3;
    data[offset + 7 * stride] = (a4 >> 2) - a7;
}

pub fn forward_4x4(residual: &[i32; 16]) -> [i32; 16] {
    let mut data = *residual;
    for row in 0..4 {
        fwd4_1d(&mut data, row * 4, 1);
    }
    for col in 0..4 {
        fwd4_1d(&mut data, col, 4);
    }
    data
}

pub fn forward_8x8(residual: &[i32; 64]) -> [i32; 64] {
    let mut data = *residual;
    for row in 0..8 {
        fwd8_1d(&mut data, row * 8, 1);
    }
    for col in 0..8 {
        fwd8_1d(&mut data, col, 8);
    }
    data
}

/// Dead-zone scalar quantizer. The magnitude is truncated to 16 bits before
/// the sign is restored.
#[inline]
pub fn quantize(coeff: i32, scale: u16, threshold: u16, qbits: u32, round: u32) -> i16 {
    let abs = coeff.unsigned_abs();
    if abs < u32::from(threshold) {
        return 0;
    }
    let q = ((u64::from(abs) * u64::from(scale) + u64::from(round)) >> qbits) as i16;
    if coeff < 0 { q.wrapping_neg() } else { q }
}

fn quantize_block(coeffs: &[i32], quant: &QuantParams<'_>, out: &mut [i16]) -> u8 {
    debug_assert!(quant.scale.len() >= coeffs.len());
    debug_assert!(quant.threshold.len() >= coeffs.len());
    let mut nnz = 0u8;
    for (i, (&c, o)) in coeffs.iter().zip(out.iter_mut()).enumerate() {
        *o = quantize(c, quant.scale[i], quant.threshold[i], quant.qbits, quant.round);
        if *o != 0 {
            nnz += 1;
        }
    }
    nnz
}

fn load_residual<const N: usize>(
    src: &[u8],
    src_stride: usize,
    pred: &[u8],
    pred_stride: usize,
    size: usize,
    step: usize,
) -> [i32; N] {
    debug_assert_eq!(size * size, N);
    let mut residual = [0i32; N];
    for y in 0..size {
        for x in 0..size {
            residual[y * size + x] =
                src[y * src_stride + x * step] as i32 - pred[y * pred_stride + x * step] as i32;
        }
    }
    residual
}

pub fn resi_trans_quant_4x4(
    src: &[u8],
    src_stride: usize,
    pred: &[u8],
    pred_stride: usize,
    quant: &QuantParams<'_>,
    out: &mut [i16; 16],
) -> Quantized {
    let residual = load_residual::<16>(src, src_stride, pred, pred_stride, 4, 1);
    let coeffs = forward_4x4(&residual);
    let nnz = quantize_block(&coeffs, quant, out);
    Quantized {
        nnz,
        alt_dc: coeffs[0] as i16,
    }
}

/// Same as [`resi_trans_quant_4x4`] over one plane of interleaved UV: sample
/// `j` of a row lives at byte `2 * j` of both `src` and `pred`.
pub fn resi_trans_quant_chroma_4x4(
    src: &[u8],
    src_stride: usize,
    pred: &[u8],
    pred_stride: usize,
    quant: &QuantParams<'_>,
    out: &mut [i16; 16],
) -> Quantized {
    let residual = load_residual::<16>(src, src_stride, pred, pred_stride, 4, 2);
    let coeffs = forward_4x4(&residual);
    let nnz = quantize_block(&coeffs, quant, out);
    Quantized {
        nnz,
        alt_dc: coeffs[0] as i16,
    }
}

pub fn resi_trans_quant_8x8(
    src: &[u8],
    src_stride: usize,
    pred: &[u8],
    pred_stride: usize,
    quant: &QuantParams<'_>,
    out: &mut [i16; 64],
) -> u8 {
    let residual = load_residual::<64>(src, src_stride, pred, pred_stride, 8, 1);
    let coeffs = forward_8x8(&residual);
    quantize_block(&coeffs, quant, out)
}

#[cfg(test)]
#[allow(clippy::needless_range_loop)]
mod tests {
    use super::*;
    use crate::tables::{quant_4x4, quant_8x8};

    #[test]
    fn all_zero_residual_quantizes_to_zero() {
        let q = quant_4x4(20, true).unwrap();
        let src = [77u8; 16];
        let mut out = [1i16; 16];
        let r = resi_trans_quant_4x4(&src, 4, &src, 4, &q.params(), &mut out);
        assert_eq!(r, Quantized { nnz: 0, alt_dc: 0 });
        assert_eq!(out, [0i16; 16]);
    }

    #[test]
    fn constant_residual_is_dc_only() {
        let q = quant_4x4(28, true).unwrap();
        let src = [128u8; 16];
        let pred = [100u8; 16];
        let mut out = [0i16; 16];
        let r = resi_trans_quant_4x4(&src, 4, &pred, 4, &q.params(), &mut out);
        assert_eq!(r.nnz, 1);
        assert_eq!(r.alt_dc, 448);
        assert_eq!(out[0], 7);
        for i in 1..16 {
            assert_eq!(out[i], 0, "AC coefficient at {} should be zero", i);
        }
    }

    #[test]
    fn forward_4x4_basis() {
        // single impulse at (0,0) hits every basis function with weight 1 or 2
        let mut residual = [0i32; 16];
        residual[0] = 1;
        let c = forward_4x4(&residual);
        assert_eq!(c, [1, 2, 1, 1, 2, 4, 2, 2, 1, 2, 1, 1, 1, 2, 1, 1]);
    }

    #[test]
    fn negative_residual_mirrors_sign() {
        let q = quant_4x4(12, false).unwrap();
        let mut src = [0u8; 16];
        let mut pred = [0u8; 16];
        for i in 0..16 {
            src[i] = (60 + i * 7) as u8;
            pred[i] = 100;
        }
        let mut pos = [0i16; 16];
        let mut neg = [0i16; 16];
        resi_trans_quant_4x4(&src, 4, &pred, 4, &q.params(), &mut pos);
        resi_trans_quant_4x4(&pred, 4, &src, 4, &q.params(), &mut neg);
        for i in 0..16 {
            assert_eq!(pos[i], -neg[i], "coefficient {} not mirrored", i);
        }
    }

    #[test]
    fn dead_zone_drops_small_residual() {
        let q = quant_4x4(40, false).unwrap();
        let src = [101u8; 16];
        let pred = [100u8; 16];
        let mut out = [0i16; 16];
        let r = resi_trans_quant_4x4(&src, 4, &pred, 4, &q.params(), &mut out);
        assert_eq!(r.nnz, 0);
        assert_eq!(r.alt_dc, 16);
    }

    #[test]
    fn chroma_reads_one_plane_of_interleaved_rows() {
        let q = quant_4x4(18, true).unwrap();
        let mut planar_src = [0u8; 16];
        let mut planar_pred = [0u8; 16];
        let mut uv_src = [0u8; 8 * 4];
        let mut uv_pred = [0u8; 8 * 4];
        for y in 0..4 {
            for x in 0..4 {
                let s = (30 + 11 * x + 17 * y) as u8;
                let p = (90 - 3 * x + 5 * y) as u8;
                planar_src[y * 4 + x] = s;
                planar_pred[y * 4 + x] = p;
                uv_src[y * 8 + 2 * x + 1] = s;
                uv_pred[y * 8 + 2 * x + 1] = p;
                uv_src[y * 8 + 2 * x] = 255;
                uv_pred[y * 8 + 2 * x] = 0;
            }
        }
        let mut planar = [0i16; 16];
        let mut chroma = [0i16; 16];
        let a = resi_trans_quant_4x4(&planar_src, 4, &planar_pred, 4, &q.params(), &mut planar);
        let b =
            resi_trans_quant_chroma_4x4(&uv_src[1..], 8, &uv_pred[1..], 8, &q.params(), &mut chroma);
        assert_eq!(a, b);
        assert_eq!(planar, chroma);
    }

    #[test]
    fn forward_8x8_constant_is_dc_only() {
        let residual = [10i32; 64];
        let c = forward_8x8(&residual);
        assert_eq!(c[0], 640);
        for i in 1..64 {
            assert_eq!(c[i], 0, "AC coefficient at {} should be zero", i);
        }
    }

    #[test]
    fn forward_8x8_impulse_response() {
        // an impulse at (0,0) reproduces the first column of the basis in both directions
        let mut residual = [0i32; 64];
        residual[0] = 8;
        let c = forward_8x8(&residual);
        #[rustfmt::skip]
        let expected = [
             8, 12,  8, 10,  8,  6,  4,  3,
            12, 18, 12, 15, 12,  9,  6,  4,
             8, 12,  8, 10,  8,  6,  4,  3,
            10, 15, 10, 12, 10,  7,  5,  3,
             8, 12,  8, 10,  8,  6,  4,  3,
             6,  9,  6,  8,  6,  5,  3,  3,
             4,  6,  4,  5,  4,  3,  2,  1,
             3,  4,  3,  3,  3,  2,  1,  1,
        ];
        assert_eq!(c, expected);

        // column 3 exercises the odd rows with mixed signs
        let mut residual = [0i32; 64];
        residual[3] = 8;
        let c = forward_8x8(&residual);
        assert_eq!(&c[..8], &[8, 3, -8, -6, 8, 10, -4, -12]);
        assert_eq!(&c[8..16], &[12, 4, -12, -9, 12, 15, -6, -18]);
        assert_eq!(&c[56..], &[3, 1, -3, -3, 3, 3, -2, -5]);
    }

    #[test]
    fn quant_8x8_counts_nonzero() {
        let q = quant_8x8(22, true).unwrap();
        let mut src = [0u8; 64];
        for y in 0..8 {
            for x in 0..8 {
                src[y * 8 + x] = (40 + x * 20) as u8;
            }
        }
        let pred = [100u8; 64];
        let mut out = [0i16; 64];
        let nnz = resi_trans_quant_8x8(&src, 8, &pred, 8, &q.params(), &mut out);
        assert_eq!(nnz as usize, out.iter().filter(|&&c| c != 0).count());
        assert!(nnz > 1);
        // horizontal ramp: only the first row carries energy
        for i in 8..64 {
            assert_eq!(out[i], 0, "coefficient {} should be zero for a horizontal ramp", i);
        }
    }

    #[test]
    fn quantize_truncates_and_restores_sign() {
        assert_eq!(quantize(-100, 8192, 0, 13, 0), -100);
        assert_eq!(quantize(100, 8192, 101, 13, 0), 0);
        assert_eq!(quantize(3, 1, 0, 1, 1), 2);
    }
}
