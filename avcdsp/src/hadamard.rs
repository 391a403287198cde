use crate::tables::{DequantParams, QuantParams};
use crate::transform::quantize;

/// Four-point Walsh-Hadamard butterfly over `data[offset + k * stride]`.
#[inline]
fn wht4_1d(data: &mut [i32], offset: usize, stride: usize) {
    let s0 = data[offset];
    let s1 = data[offset + stride];
    let s2 = data[offset + 2 * stride];
    let s3 = data[offset + 3 * stride];

    let t0 = s0 + s1;
    let t1 = s0 - s1;
    let t2 = s2 + s3;
    let t3 = s2 - s3;

    data[offset] = t0 + t2;
    data[offset + stride] = t0 - t2;
    data[offset + 2 * stride] = t1 - t3;
    data[offset + 3 * stride] = t1 + t3;
}

/// Unscaled 4x4 Hadamard, rows then columns. Outputs wrap to 16 bits, so a
/// DC sum past `i16::MAX` comes back negative.
pub fn hadamard_4x4(src: &[i16; 16]) -> [i32; 16] {
    let mut data = [0i32; 16];
    for (d, &s) in data.iter_mut().zip(src.iter()) {
        *d = s as i32;
    }
    for row in 0..4 {
        wht4_1d(&mut data, row * 4, 1);
    }
    for col in 0..4 {
        wht4_1d(&mut data, col, 4);
    }
    for d in data.iter_mut() {
        *d = *d as i16 as i32;
    }
    data
}

/// Forward Hadamard of the sixteen luma DC terms, halved, then quantized
/// with the first entry of the scale and threshold matrices.
pub fn hadamard_quant_4x4(src: &[i16; 16], out: &mut [i16; 16], quant: &QuantParams<'_>) -> u8 {
    let data = hadamard_4x4(src);
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

/// Inverse Hadamard of the luma DC block followed by DC dequantization.
/// The output is the per-4x4 DC override, not pixels, so nothing is clipped.
pub fn ihadamard_scaling_4x4(src: &[i16; 16], out: &mut [i16; 16], dequant: &DequantParams<'_>) {
    let data = hadamard_4x4(src);
    let mult = dequant.scale[0] as i32 * dequant.weight[0] as i32;
    let qp = dequant.qp_div_6;
    let rnd = if qp < 6 { 1 << (5 - qp) } else { 0 };
    for (o, &d) in out.iter_mut().zip(data.iter()) {
        *o = (((d * mult + rnd) << qp) >> 6) as i16;
    }
}

fn wht2x2(s: &[i16]) -> [i32; 4] {
    let (s0, s1, s2, s3) = (s[0] as i32, s[1] as i32, s[2] as i32, s[3] as i32);
    let a = s0 + s1;
    let b = s0 - s1;
    let c = s2 + s3;
    let d = s2 - s3;
    [a + c, b + d, a - c, b - d]
}

/// 2x2 chroma DC Hadamard + quantization. `src` holds the four U DC terms
/// followed by the four V DC terms; the result is nnz per plane.
pub fn hadamard_quant_2x2_uv(src: &[i16; 8], out: &mut [i16; 8], quant: &QuantParams<'_>) -> [u8; 2] {
    let (scale, threshold) = (quant.scale[0], quant.threshold[0]);
    let mut nnz = [0u8; 2];
    for plane in 0..2 {
        let f = wht2x2(&src[plane * 4..plane * 4 + 4]);
        for (k, &v) in f.iter().enumerate() {
            let q = quantize(v, scale, threshold, quant.qbits, quant.round);
            out[plane * 4 + k] = q;
            if q != 0 {
                nnz[plane] += 1;
            }
        }
    }
    nnz
}

pub fn ihadamard_scaling_2x2_uv(src: &[i16; 8], out: &mut [i16; 8], dequant: &DequantParams<'_>) {
    let mult = dequant.scale[0] as i32 * dequant.weight[0] as i32;
    for plane in 0..2 {
        let f = wht2x2(&src[plane * 4..plane * 4 + 4]);
        for (k, &v) in f.iter().enumerate() {
            out[plane * 4 + k] = (((v * mult) << dequant.qp_div_6) >> 5) as i16;
        }
    }
}

#[cfg(test)]
#[allow(clippy::needless_range_loop)]
mod tests {
    use super::*;
    use crate::tables::{dequant_4x4, quant_dc};

    #[test]
    fn hadamard_constant_is_dc_only() {
        let data = hadamard_4x4(&[100; 16]);
        assert_eq!(data[0], 1600);
        for i in 1..16 {
            assert_eq!(data[i], 0, "coefficient {} should be zero", i);
        }
    }

    #[test]
    fn hadamard_is_self_inverse_up_to_scale() {
        let mut src = [0i16; 16];
        for i in 0..16 {
            src[i] = (i as i16 * 37) % 23 - 11;
        }
        let once = hadamard_4x4(&src);
        let mut as_i16 = [0i16; 16];
        for i in 0..16 {
            as_i16[i] = once[i] as i16;
        }
        let twice = hadamard_4x4(&as_i16);
        for i in 0..16 {
            assert_eq!(twice[i], 16 * src[i] as i32, "position {}", i);
        }
    }

    #[test]
    fn hadamard_sums_wrap_to_sixteen_bits() {
        let data = hadamard_4x4(&[4080; 16]);
        assert_eq!(data[0], 65280 - 65536);
        assert!(data[1..].iter().all(|&d| d == 0));

        let q = quant_dc(0, true).unwrap();
        let mut levels = [0i16; 16];
        hadamard_quant_4x4(&[4080; 16], &mut levels, &q.params());
        assert!(levels[0] < 0, "dc level {}", levels[0]);

        let dq = dequant_4x4(0).unwrap();
        let mut src = [0i16; 16];
        src[0] = 20000;
        src[1] = 20000;
        let mut dc = [0i16; 16];
        ihadamard_scaling_4x4(&src, &mut dc, &dq);
        // columns 0 and 1 sum to 40000, wrapping to -25536 before scaling
        let mult = dq.scale[0] as i32 * dq.weight[0] as i32;
        let expected = ((-25536 * mult + 32) >> 6) as i16;
        for row in 0..4 {
            assert_eq!(dc[row * 4], expected, "row {}", row);
            assert_eq!(dc[row * 4 + 1], expected, "row {}", row);
            assert_eq!(dc[row * 4 + 2], 0, "row {}", row);
        }
    }

    #[test]
    fn luma_dc_round_trip_flat_macroblock() {
        // sixteen 4x4 blocks with a constant residual of 28 each
        let q = quant_dc(28, true).unwrap();
        let dq = dequant_4x4(28).unwrap();
        let mut levels = [0i16; 16];
        let nnz = hadamard_quant_4x4(&[448; 16], &mut levels, &q.params());
        assert_eq!(nnz, 1);
        assert_eq!(levels[0], 28);

        let mut dc = [0i16; 16];
        ihadamard_scaling_4x4(&levels, &mut dc, &dq);
        assert!(dc.iter().all(|&d| d == 1792), "{:?}", dc);
    }

    #[test]
    fn ihadamard_zero_stays_zero() {
        let dq = dequant_4x4(51).unwrap();
        let mut out = [5i16; 16];
        ihadamard_scaling_4x4(&[0; 16], &mut out, &dq);
        assert_eq!(out, [0; 16]);
    }

    #[test]
    fn chroma_dc_round_trip() {
        let q = quant_dc(28, true).unwrap();
        let dq = dequant_4x4(28).unwrap();
        let src = [448, 448, 448, 448, -448, -448, -448, -448];
        let mut levels = [0i16; 8];
        let nnz = hadamard_quant_2x2_uv(&src, &mut levels, &q.params());
        assert_eq!(nnz, [1, 1]);
        assert_eq!(levels[0], 14);
        assert_eq!(levels[4], -14);

        let mut dc = [0i16; 8];
        ihadamard_scaling_2x2_uv(&levels, &mut dc, &dq);
        assert_eq!(dc, [1792, 1792, 1792, 1792, -1792, -1792, -1792, -1792]);
    }

    #[test]
    fn chroma_dc_planes_are_independent() {
        let q = quant_dc(20, false).unwrap();
        let mut levels = [0i16; 8];
        let nnz = hadamard_quant_2x2_uv(&[0, 0, 0, 0, 900, -900, 900, -900], &mut levels, &q.params());
        assert_eq!(nnz[0], 0);
        assert_eq!(&levels[..4], &[0, 0, 0, 0]);
        assert_eq!(levels[4], 0);
        assert!(levels[5] > 0);
    }
}
