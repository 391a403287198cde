//! Scale matrices, deblocking thresholds and the parameter bundles the
//! kernels consume. Kernels only borrow these; a codec context owns them.

use crate::error::DspError;

pub const MAX_QP: u8 = 51;

/// Forward quantizer inputs. `scale` already carries any weighting.
#[derive(Debug, Clone, Copy)]
pub struct QuantParams<'a> {
    pub scale: &'a [u16],
    pub threshold: &'a [u16],
    pub qbits: u32,
    pub round: u32,
}

/// Inverse quantizer inputs.
#[derive(Debug, Clone, Copy)]
pub struct DequantParams<'a> {
    pub scale: &'a [u16],
    pub weight: &'a [u16],
    pub qp_div_6: u32,
}

const fn class_4x4(i: usize) -> usize {
    let (r, c) = (i / 4, i % 4);
    if r % 2 == 0 && c % 2 == 0 {
        0
    } else if r % 2 == 1 && c % 2 == 1 {
        1
    } else {
        2
    }
}

const fn class_8x8(i: usize) -> usize {
    let (r, c) = (i / 8, i % 8);
    if r % 4 == 0 && c % 4 == 0 {
        0
    } else if r % 2 == 1 && c % 2 == 1 {
        1
    } else if r % 4 == 2 && c % 4 == 2 {
        2
    } else if (r % 4 == 0 && c % 2 == 1) || (r % 2 == 1 && c % 4 == 0) {
        3
    } else if (r % 4 == 0 && c % 4 == 2) || (r % 4 == 2 && c % 4 == 0) {
        4
    } else {
        5
    }
}

const fn expand_4x4(classes: [[u16; 3]; 6]) -> [[u16; 16]; 6] {
    let mut out = [[0u16; 16]; 6];
    let mut q = 0;
    while q < 6 {
        let mut i = 0;
        while i < 16 {
            out[q][i] = classes[q][class_4x4(i)];
            i += 1;
        }
        q += 1;
    }
    out
}

const fn expand_8x8(classes: [[u16; 6]; 6]) -> [[u16; 64]; 6] {
    let mut out = [[0u16; 64]; 6];
    let mut q = 0;
    while q < 6 {
        let mut i = 0;
        while i < 64 {
            out[q][i] = classes[q][class_8x8(i)];
            i += 1;
        }
        q += 1;
    }
    out
}

pub static FWD_SCALE_4X4: [[u16; 16]; 6] = expand_4x4([
    [13107, 5243, 8066],
    [11916, 4660, 7490],
    [10082, 4194, 6554],
    [9362, 3647, 5825],
    [8192, 3355, 5243],
    [7282, 2893, 4559],
]);

pub static INV_SCALE_4X4: [[u16; 16]; 6] = expand_4x4([
    [10, 16, 13],
    [11, 18, 14],
    [13, 20, 16],
    [14, 23, 18],
    [16, 25, 20],
    [18, 29, 23],
]);

pub static FWD_SCALE_8X8: [[u16; 64]; 6] = expand_8x8([
    [13107, 11428, 20972, 12222, 16777, 15481],
    [11916, 10826, 19174, 11058, 14980, 14290],
    [10082, 8943, 15978, 9675, 12710, 11985],
    [9362, 8228, 14913, 8931, 11984, 11259],
    [8192, 7346, 13159, 7740, 10486, 9777],
    [7282, 6428, 11570, 6830, 9118, 8640],
]);

pub static INV_SCALE_8X8: [[u16; 64]; 6] = expand_8x8([
    [20, 18, 32, 19, 25, 24],
    [22, 19, 35, 21, 28, 26],
    [26, 23, 42, 24, 33, 31],
    [28, 25, 45, 26, 35, 33],
    [32, 28, 51, 30, 40, 38],
    [36, 32, 58, 34, 46, 43],
]);

pub static FLAT_4X4: [u16; 16] = [16; 16];
pub static FLAT_8X8: [u16; 64] = [16; 64];

pub const ALPHA: [u8; 52] = [
    0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 4, 4, 5, 6, 7, 8, 9, 10, 12, 13, 15, 17, 20,
    22, 25, 28, 32, 36, 40, 45, 50, 56, 63, 71, 80, 90, 100, 113, 127, 144, 162, 182, 203, 226,
    255, 255,
];

pub const BETA: [u8; 52] = [
    0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 2, 2, 2, 3, 3, 3, 3, 4, 4, 4, 6, 6, 7, 7, 8, 8,
    9, 9, 10, 10, 11, 11, 12, 12, 13, 13, 14, 14, 15, 15, 16, 16, 17, 17, 18, 18,
];

pub const TC0: [[u8; 3]; 52] = [
    [0, 0, 0], [0, 0, 0], [0, 0, 0], [0, 0, 0], [0, 0, 0], [0, 0, 0], [0, 0, 0], [0, 0, 0],
    [0, 0, 0], [0, 0, 0], [0, 0, 0], [0, 0, 0], [0, 0, 0], [0, 0, 0], [0, 0, 0], [0, 0, 0],
    [0, 0, 0], [0, 0, 1], [0, 0, 1], [0, 0, 1], [0, 0, 1], [0, 1, 1], [0, 1, 1], [1, 1, 1],
    [1, 1, 1], [1, 1, 1], [1, 1, 1], [1, 1, 2], [1, 1, 2], [1, 1, 2], [1, 1, 2], [1, 2, 3],
    [1, 2, 3], [2, 2, 3], [2, 2, 4], [2, 3, 4], [2, 3, 4], [3, 3, 5], [3, 4, 6], [3, 4, 6],
    [4, 5, 7], [4, 5, 8], [4, 6, 9], [5, 7, 10], [6, 8, 11], [6, 8, 13], [7, 10, 14], [8, 11, 16],
    [9, 12, 18], [10, 13, 20], [11, 15, 23], [13, 17, 25],
];

pub const CHROMA_QP: [u8; 52] = [
    0, 1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11, 12, 13, 14, 15, 16, 17, 18, 19, 20, 21, 22, 23, 24, 25,
    26, 27, 28, 29, 29, 30, 31, 32, 32, 33, 34, 34, 35, 35, 36, 36, 37, 37, 37, 38, 38, 38, 39,
    39, 39, 39,
];

/// Owned forward quantizer for one block size at one QP.
#[derive(Debug, Clone)]
pub struct QuantMatrix<const N: usize> {
    pub scale: [u16; N],
    pub threshold: [u16; N],
    pub qbits: u32,
    pub round: u32,
}

impl<const N: usize> QuantMatrix<N> {
    fn build(scale: [u16; N], qbits: u32, round: u32) -> Self {
        let mut threshold = [0u16; N];
        for (t, &s) in threshold.iter_mut().zip(scale.iter()) {
            *t = (((1u32 << qbits) - round) / u32::from(s)).min(u32::from(u16::MAX)) as u16;
        }
        Self {
            scale,
            threshold,
            qbits,
            round,
        }
    }

    pub fn params(&self) -> QuantParams<'_> {
        QuantParams {
            scale: &self.scale,
            threshold: &self.threshold,
            qbits: self.qbits,
            round: self.round,
        }
    }
}

pub fn check_qp(qp: u8) -> Result<(), DspError> {
    if qp > MAX_QP {
        return Err(DspError::InvalidQp(qp));
    }
    Ok(())
}

fn rounding(qbits: u32, intra: bool) -> u32 {
    if intra {
        (1 << qbits) / 3
    } else {
        (1 << qbits) / 6
    }
}

pub fn quant_4x4(qp: u8, intra: bool) -> Result<QuantMatrix<16>, DspError> {
    check_qp(qp)?;
    let qbits = 15 + u32::from(qp / 6);
    Ok(QuantMatrix::build(
        FWD_SCALE_4X4[usize::from(qp % 6)],
        qbits,
        rounding(qbits, intra),
    ))
}

pub fn quant_8x8(qp: u8, intra: bool) -> Result<QuantMatrix<64>, DspError> {
    check_qp(qp)?;
    let qbits = 16 + u32::from(qp / 6);
    Ok(QuantMatrix::build(
        FWD_SCALE_8X8[usize::from(qp % 6)],
        qbits,
        rounding(qbits, intra),
    ))
}

/// Quantizer for Hadamard-transformed DC blocks: one extra bit of shift.
pub fn quant_dc(qp: u8, intra: bool) -> Result<QuantMatrix<16>, DspError> {
    check_qp(qp)?;
    let qbits = 16 + u32::from(qp / 6);
    let scale = [FWD_SCALE_4X4[usize::from(qp % 6)][0]; 16];
    Ok(QuantMatrix::build(scale, qbits, rounding(qbits, intra)))
}

pub fn dequant_4x4(qp: u8) -> Result<DequantParams<'static>, DspError> {
    check_qp(qp)?;
    Ok(DequantParams {
        scale: &INV_SCALE_4X4[usize::from(qp % 6)],
        weight: &FLAT_4X4,
        qp_div_6: u32::from(qp / 6),
    })
}

pub fn dequant_8x8(qp: u8) -> Result<DequantParams<'static>, DspError> {
    check_qp(qp)?;
    Ok(DequantParams {
        scale: &INV_SCALE_8X8[usize::from(qp % 6)],
        weight: &FLAT_8X8,
        qp_div_6: u32::from(qp / 6),
    })
}

/// Clip values for the weak filter, indexed by boundary strength.
pub type Cliptab = [u8; 5];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeblockParams {
    pub alpha: u8,
    pub beta: u8,
    pub cliptab: Cliptab,
}

impl DeblockParams {
    pub fn for_qp(qp: u8, alpha_offset: i8, beta_offset: i8) -> Self {
        let index = |off: i8| (i16::from(qp) + i16::from(off)).clamp(0, 51) as usize;
        let index_a = index(alpha_offset);
        let tc0 = TC0[index_a];
        Self {
            alpha: ALPHA[index_a],
            beta: BETA[index(beta_offset)],
            cliptab: [0, tc0[0], tc0[1], tc0[2], 0],
        }
    }
}

#[cfg(test)]
#[allow(clippy::needless_range_loop)]
mod tests {
    use super::*;

    #[test]
    fn scale_4x4_layout() {
        assert_eq!(FWD_SCALE_4X4[0][0], 13107);
        assert_eq!(FWD_SCALE_4X4[0][5], 5243);
        assert_eq!(FWD_SCALE_4X4[0][1], 8066);
        assert_eq!(INV_SCALE_4X4[5][15], 29);
        assert_eq!(INV_SCALE_4X4[5][10], 18);
    }

    #[test]
    fn scale_8x8_layout() {
        assert_eq!(FWD_SCALE_8X8[0][0], 13107);
        assert_eq!(FWD_SCALE_8X8[0][9], 11428);
        assert_eq!(FWD_SCALE_8X8[0][18], 20972);
        assert_eq!(FWD_SCALE_8X8[0][1], 12222);
        assert_eq!(FWD_SCALE_8X8[0][2], 16777);
        assert_eq!(FWD_SCALE_8X8[0][10], 15481);
        assert_eq!(INV_SCALE_8X8[4][0], 32);
    }

    #[test]
    fn forward_times_inverse_is_near_unity() {
        // class-a products sit at 2^17
        for q in 0..6 {
            let p = u32::from(FWD_SCALE_4X4[q][0]) * u32::from(INV_SCALE_4X4[q][0]);
            assert!((p as i64 - (1 << 17)).abs() < 200, "row {} product {}", q, p);
        }
    }

    #[test]
    fn threshold_matches_dead_zone() {
        let q = quant_4x4(28, true).unwrap();
        for i in 0..16 {
            let t = u32::from(q.threshold[i]);
            let s = u32::from(q.scale[i]);
            if t > 0 {
                assert_eq!(((t - 1) * s + q.round) >> q.qbits, 0);
            }
        }
    }

    #[test]
    fn qp_out_of_range() {
        assert!(matches!(quant_4x4(52, true), Err(DspError::InvalidQp(52))));
        assert!(dequant_8x8(60).is_err());
    }

    #[test]
    fn deblock_params_clamp_index() {
        let p = DeblockParams::for_qp(51, 12, 12);
        assert_eq!(p.alpha, 255);
        assert_eq!(p.beta, 18);
        assert_eq!(p.cliptab, [0, 13, 17, 25, 0]);

        let p = DeblockParams::for_qp(10, -6, -6);
        assert_eq!(p.alpha, 0);
        assert_eq!(p.beta, 0);
    }
}
