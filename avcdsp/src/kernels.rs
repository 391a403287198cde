//! Kernel strategy: one trait method per transform, interpolation and
//! deblocking kernel. Implementations are chosen once from [`Backend`] and
//! handed down as `&dyn Dsp`.

use std::fmt;
use std::str::FromStr;

use crate::deblock::{self, BoundaryStrength, ChromaPair};
use crate::error::DspError;
use crate::tables::{Cliptab, DequantParams, QuantParams};
use crate::transform::Quantized;
use crate::{hadamard, interp, recon, transform};

#[allow(clippy::too_many_arguments)]
pub trait Dsp: Sync {
    fn name(&self) -> &'static str;

    fn resi_trans_quant_4x4(
        &self,
        src: &[u8],
        src_stride: usize,
        pred: &[u8],
        pred_stride: usize,
        quant: &QuantParams<'_>,
        out: &mut [i16; 16],
    ) -> Quantized {
        transform::resi_trans_quant_4x4(src, src_stride, pred, pred_stride, quant, out)
    }

    fn resi_trans_quant_chroma_4x4(
        &self,
        src: &[u8],
        src_stride: usize,
        pred: &[u8],
        pred_stride: usize,
        quant: &QuantParams<'_>,
        out: &mut [i16; 16],
    ) -> Quantized {
        transform::resi_trans_quant_chroma_4x4(src, src_stride, pred, pred_stride, quant, out)
    }

    fn resi_trans_quant_8x8(
        &self,
        src: &[u8],
        src_stride: usize,
        pred: &[u8],
        pred_stride: usize,
        quant: &QuantParams<'_>,
        out: &mut [i16; 64],
    ) -> u8 {
        transform::resi_trans_quant_8x8(src, src_stride, pred, pred_stride, quant, out)
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
        recon::iquant_itrans_recon_4x4(src, pred, pred_stride, out, out_stride, dequant, start_idx, dc)
    }

    fn iquant_itrans_recon_4x4_dc(
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
        recon::iquant_itrans_recon_4x4_dc(src, pred, pred_stride, out, out_stride, dequant, start_idx, dc)
    }

    fn iquant_itrans_recon_8x8(
        &self,
        src: &[i16; 64],
        pred: &[u8],
        pred_stride: usize,
        out: &mut [u8],
        out_stride: usize,
        dequant: &DequantParams<'_>,
    ) {
        recon::iquant_itrans_recon_8x8(src, pred, pred_stride, out, out_stride, dequant)
    }

    fn iquant_itrans_recon_8x8_dc(
        &self,
        src: &[i16; 64],
        pred: &[u8],
        pred_stride: usize,
        out: &mut [u8],
        out_stride: usize,
        dequant: &DequantParams<'_>,
    ) {
        recon::iquant_itrans_recon_8x8_dc(src, pred, pred_stride, out, out_stride, dequant)
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
        recon::iquant_itrans_recon_chroma_4x4(src, pred, pred_stride, out, out_stride, dequant, dc)
    }

    fn iquant_itrans_recon_chroma_4x4_dc(
        &self,
        src: &[i16; 16],
        pred: &[u8],
        pred_stride: usize,
        out: &mut [u8],
        out_stride: usize,
        dequant: &DequantParams<'_>,
        dc: i16,
    ) {
        recon::iquant_itrans_recon_chroma_4x4_dc(src, pred, pred_stride, out, out_stride, dequant, dc)
    }

    fn hadamard_quant_4x4(&self, src: &[i16; 16], out: &mut [i16; 16], quant: &QuantParams<'_>) -> u8 {
        hadamard::hadamard_quant_4x4(src, out, quant)
    }

    fn ihadamard_scaling_4x4(&self, src: &[i16; 16], out: &mut [i16; 16], dequant: &DequantParams<'_>) {
        hadamard::ihadamard_scaling_4x4(src, out, dequant)
    }

    fn hadamard_quant_2x2_uv(&self, src: &[i16; 8], out: &mut [i16; 8], quant: &QuantParams<'_>) -> [u8; 2] {
        hadamard::hadamard_quant_2x2_uv(src, out, quant)
    }

    fn ihadamard_scaling_2x2_uv(&self, src: &[i16; 8], out: &mut [i16; 8], dequant: &DequantParams<'_>) {
        hadamard::ihadamard_scaling_2x2_uv(src, out, dequant)
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
        interp::inter_pred_luma(src, src_off, src_stride, dst, dst_stride, width, height, dydx)
    }

    fn inter_pred_chroma(
        &self,
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
        interp::inter_pred_chroma(src, src_off, src_stride, dst, dst_stride, dx, dy, width, height)
    }

    fn inter_pred_luma_bilinear(
        &self,
        src1: &[u8],
        src1_stride: usize,
        src2: &[u8],
        src2_stride: usize,
        dst: &mut [u8],
        dst_stride: usize,
        width: usize,
        height: usize,
    ) {
        interp::inter_pred_luma_bilinear(src1, src1_stride, src2, src2_stride, dst, dst_stride, width, height)
    }

    fn deblk_luma_vert_bs4(&self, buf: &mut [u8], off: usize, stride: usize, alpha: u8, beta: u8) {
        deblock::deblk_luma_vert_bs4(buf, off, stride, alpha, beta)
    }

    fn deblk_luma_horz_bs4(&self, buf: &mut [u8], off: usize, stride: usize, alpha: u8, beta: u8) {
        deblock::deblk_luma_horz_bs4(buf, off, stride, alpha, beta)
    }

    fn deblk_luma_vert_bslt4(
        &self,
        buf: &mut [u8],
        off: usize,
        stride: usize,
        alpha: u8,
        beta: u8,
        bs: BoundaryStrength,
        cliptab: &Cliptab,
    ) {
        deblock::deblk_luma_vert_bslt4(buf, off, stride, alpha, beta, bs, cliptab)
    }

    fn deblk_luma_horz_bslt4(
        &self,
        buf: &mut [u8],
        off: usize,
        stride: usize,
        alpha: u8,
        beta: u8,
        bs: BoundaryStrength,
        cliptab: &Cliptab,
    ) {
        deblock::deblk_luma_horz_bslt4(buf, off, stride, alpha, beta, bs, cliptab)
    }

    fn deblk_luma_vert_bs4_mbaff(&self, buf: &mut [u8], off: usize, stride: usize, alpha: u8, beta: u8) {
        deblock::deblk_luma_vert_bs4_mbaff(buf, off, stride, alpha, beta)
    }

    fn deblk_luma_vert_bslt4_mbaff(
        &self,
        buf: &mut [u8],
        off: usize,
        stride: usize,
        alpha: u8,
        beta: u8,
        bs: BoundaryStrength,
        cliptab: &Cliptab,
    ) {
        deblock::deblk_luma_vert_bslt4_mbaff(buf, off, stride, alpha, beta, bs, cliptab)
    }

    fn deblk_chroma_vert_bs4(
        &self,
        buf: &mut [u8],
        off: usize,
        stride: usize,
        alpha: ChromaPair<u8>,
        beta: ChromaPair<u8>,
    ) {
        deblock::deblk_chroma_vert_bs4(buf, off, stride, alpha, beta)
    }

    fn deblk_chroma_horz_bs4(
        &self,
        buf: &mut [u8],
        off: usize,
        stride: usize,
        alpha: ChromaPair<u8>,
        beta: ChromaPair<u8>,
    ) {
        deblock::deblk_chroma_horz_bs4(buf, off, stride, alpha, beta)
    }

    fn deblk_chroma_vert_bs4_mbaff(
        &self,
        buf: &mut [u8],
        off: usize,
        stride: usize,
        alpha: ChromaPair<u8>,
        beta: ChromaPair<u8>,
    ) {
        deblock::deblk_chroma_vert_bs4_mbaff(buf, off, stride, alpha, beta)
    }

    fn deblk_chroma_vert_bslt4(
        &self,
        buf: &mut [u8],
        off: usize,
        stride: usize,
        alpha: ChromaPair<u8>,
        beta: ChromaPair<u8>,
        bs: BoundaryStrength,
        cliptab: ChromaPair<&Cliptab>,
    ) {
        deblock::deblk_chroma_vert_bslt4(buf, off, stride, alpha, beta, bs, cliptab)
    }

    fn deblk_chroma_horz_bslt4(
        &self,
        buf: &mut [u8],
        off: usize,
        stride: usize,
        alpha: ChromaPair<u8>,
        beta: ChromaPair<u8>,
        bs: BoundaryStrength,
        cliptab: ChromaPair<&Cliptab>,
    ) {
        deblock::deblk_chroma_horz_bslt4(buf, off, stride, alpha, beta, bs, cliptab)
    }

    fn deblk_chroma_vert_bslt4_mbaff(
        &self,
        buf: &mut [u8],
        off: usize,
        stride: usize,
        alpha: ChromaPair<u8>,
        beta: ChromaPair<u8>,
        bs: BoundaryStrength,
        cliptab: ChromaPair<&Cliptab>,
    ) {
        deblock::deblk_chroma_vert_bslt4_mbaff(buf, off, stride, alpha, beta, bs, cliptab)
    }
}

/// Portable implementation; every kernel uses the trait defaults.
#[derive(Debug, Clone, Copy, Default)]
pub struct ScalarDsp;

impl Dsp for ScalarDsp {
    fn name(&self) -> &'static str {
        "scalar"
    }
}

pub static SCALAR: ScalarDsp = ScalarDsp;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Backend {
    #[default]
    Scalar,
    Wide,
}

impl fmt::Display for Backend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Backend::Scalar => f.write_str("scalar"),
            Backend::Wide => f.write_str("wide"),
        }
    }
}

impl FromStr for Backend {
    type Err = DspError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "scalar" => Ok(Backend::Scalar),
            "wide" | "simd" => Ok(Backend::Wide),
            other => Err(DspError::UnsupportedBackend(other.to_string())),
        }
    }
}

pub fn select(backend: Backend) -> Result<&'static dyn Dsp, DspError> {
    match backend {
        Backend::Scalar => Ok(&SCALAR),
        #[cfg(feature = "simd")]
        Backend::Wide => Ok(&crate::simd::WIDE),
        #[cfg(not(feature = "simd"))]
        Backend::Wide => Err(DspError::UnsupportedBackend(
            "wide (built without the simd feature)".to_string(),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backend_parses_case_insensitively() {
        assert_eq!("Scalar".parse::<Backend>().unwrap(), Backend::Scalar);
        assert_eq!("wide".parse::<Backend>().unwrap(), Backend::Wide);
        assert_eq!("SIMD".parse::<Backend>().unwrap(), Backend::Wide);
        assert!("neon".parse::<Backend>().is_err());
    }

    #[test]
    fn scalar_is_always_available() {
        let dsp = select(Backend::Scalar).unwrap();
        assert_eq!(dsp.name(), "scalar");
    }

    #[cfg(not(feature = "simd"))]
    #[test]
    fn wide_requires_feature() {
        assert!(matches!(select(Backend::Wide), Err(DspError::UnsupportedBackend(_))));
    }

    #[test]
    fn trait_object_dispatches_to_kernels() {
        let dsp: &dyn Dsp = select(Backend::Scalar).unwrap();
        let src = [90u8; 16];
        let mut out = [0u8; 16];
        dsp.inter_pred_luma(&src, 0, 4, &mut out, 4, 4, 4, 0);
        assert_eq!(out, src);
    }
}
