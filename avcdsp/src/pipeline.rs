//! Frame reconstruction: runs each macroblock through prediction, forward
//! transform and quantization, then the inverse path, and finally the
//! in-loop deblocking filter, producing what a decoder would display.

use log::{debug, trace};

use crate::deblock::{BoundaryStrength, ChromaPair};
use crate::error::DspError;
use crate::intra::{self, NeighbourAvail};
use crate::kernels::Dsp;
use crate::padding::{self, PaddedPlane};
use crate::tables::{
    CHROMA_QP, DeblockParams, DequantParams, QuantMatrix, check_qp, dequant_4x4, dequant_8x8,
    quant_4x4, quant_8x8, quant_dc,
};
use crate::y4m::FramePixels;
use crate::DspConfig;

pub const MB_SIZE: usize = 16;
/// Reference border in luma samples (and interleaved chroma bytes).
const BORDER: usize = 16;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameType {
    Intra,
    Inter,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FrameStats {
    pub frame_type: FrameType,
    pub psnr_y: f64,
    pub psnr_u: f64,
    pub psnr_v: f64,
    pub intra_plane_mbs: usize,
    /// Luma blocks (4x4 or 8x8) with any nonzero level.
    pub coded_blocks: usize,
    /// Blocks reconstructed through a DC-only fast path.
    pub dc_only_blocks: usize,
    /// Count of chosen luma phases, indexed by `dy * 4 + dx`.
    pub phase_histogram: [usize; 16],
}

impl FrameStats {
    fn new(frame_type: FrameType) -> Self {
        Self {
            frame_type,
            psnr_y: 0.0,
            psnr_u: 0.0,
            psnr_v: 0.0,
            intra_plane_mbs: 0,
            coded_blocks: 0,
            dc_only_blocks: 0,
            phase_histogram: [0; 16],
        }
    }
}

#[derive(Debug, Clone)]
pub struct Reconstructed {
    pub frame: FramePixels,
    pub stats: FrameStats,
}

/// Side information the deblocking pass needs per macroblock.
#[derive(Debug, Clone, Copy, Default)]
struct MbInfo {
    intra: bool,
    transform_8x8: bool,
    /// Bit `i` set when 4x4 block `i` (raster order) carries coefficients.
    coded: u16,
}

impl MbInfo {
    fn is_coded(&self, blk: usize) -> bool {
        self.coded & (1 << blk) != 0
    }
}

struct Quantizers {
    luma: QuantMatrix<16>,
    luma_8x8: QuantMatrix<64>,
    luma_dc: QuantMatrix<16>,
    chroma: QuantMatrix<16>,
    chroma_dc: QuantMatrix<16>,
    dq_luma: DequantParams<'static>,
    dq_luma_8x8: DequantParams<'static>,
    dq_chroma: DequantParams<'static>,
}

impl Quantizers {
    fn new(qp: u8, intra: bool) -> Result<Self, DspError> {
        let cqp = CHROMA_QP[usize::from(qp)];
        Ok(Self {
            luma: quant_4x4(qp, intra)?,
            luma_8x8: quant_8x8(qp, intra)?,
            luma_dc: quant_dc(qp, intra)?,
            chroma: quant_4x4(cqp, intra)?,
            chroma_dc: quant_dc(cqp, intra)?,
            dq_luma: dequant_4x4(qp)?,
            dq_luma_8x8: dequant_8x8(qp)?,
            dq_chroma: dequant_4x4(cqp)?,
        })
    }
}

pub fn check_dimensions(width: u32, height: u32) -> Result<(), DspError> {
    if width == 0 || height == 0 || width % 16 != 0 || height % 16 != 0 {
        return Err(DspError::InvalidDimensions { width, height });
    }
    Ok(())
}

/// PSNR in dB of two equally sized 8-bit planes; identical planes give
/// infinity.
pub fn psnr(a: &[u8], b: &[u8]) -> f64 {
    debug_assert_eq!(a.len(), b.len());
    if a.is_empty() {
        return f64::INFINITY;
    }
    let sse: u64 = a
        .iter()
        .zip(b)
        .map(|(&x, &y)| {
            let d = x as i64 - y as i64;
            (d * d) as u64
        })
        .sum();
    if sse == 0 {
        return f64::INFINITY;
    }
    let mse = sse as f64 / a.len() as f64;
    10.0 * (255.0 * 255.0 / mse).log10()
}

fn sad(a: &[u8], a_stride: usize, b: &[u8], b_stride: usize, width: usize, height: usize) -> u32 {
    let mut total = 0u32;
    for y in 0..height {
        for x in 0..width {
            total += (a[y * a_stride + x] as i32 - b[y * b_stride + x] as i32).unsigned_abs();
        }
    }
    total
}

fn copy_block(src: &[u8], src_stride: usize, dst: &mut [u8], dst_stride: usize, width: usize, height: usize) {
    for y in 0..height {
        dst[y * dst_stride..y * dst_stride + width]
            .copy_from_slice(&src[y * src_stride..y * src_stride + width]);
    }
}

/// Working planes of the picture being reconstructed. Chroma is kept
/// interleaved with a stride equal to the luma width.
struct Planes {
    luma: Vec<u8>,
    uv: Vec<u8>,
    width: usize,
    height: usize,
}

impl Planes {
    fn new(width: usize, height: usize) -> Self {
        Self {
            luma: vec![0; width * height],
            uv: vec![0; width * height / 2],
            width,
            height,
        }
    }
}

fn luma_neighbours(rec: &[u8], stride: usize, mb_x: usize, mb_y: usize) -> ([u8; 33], NeighbourAvail) {
    let avail = NeighbourAvail {
        left: mb_x > 0,
        top: mb_y > 0,
    };
    let (x0, y0) = (mb_x * MB_SIZE, mb_y * MB_SIZE);
    let mut ngbr = [128u8; 33];
    if avail.left {
        for j in 0..16 {
            ngbr[15 - j] = rec[(y0 + j) * stride + x0 - 1];
        }
    }
    if avail.top {
        let top = (y0 - 1) * stride + x0;
        ngbr[17..33].copy_from_slice(&rec[top..top + 16]);
        if avail.left {
            ngbr[16] = rec[top - 1];
        }
    }
    (ngbr, avail)
}

fn chroma_neighbours(rec: &[u8], stride: usize, mb_x: usize, mb_y: usize) -> ([u8; 34], NeighbourAvail) {
    let avail = NeighbourAvail {
        left: mb_x > 0,
        top: mb_y > 0,
    };
    let (x0, y0) = (mb_x * MB_SIZE, mb_y * 8);
    let mut ngbr = [128u8; 34];
    if avail.left {
        for row in 0..8 {
            let at = (y0 + row) * stride + x0 - 2;
            ngbr[2 * (7 - row)..2 * (7 - row) + 2].copy_from_slice(&rec[at..at + 2]);
        }
    }
    if avail.top {
        let top = (y0 - 1) * stride + x0;
        ngbr[18..34].copy_from_slice(&rec[top..top + 16]);
        if avail.left {
            ngbr[16..18].copy_from_slice(&rec[top - 2..top]);
        }
    }
    (ngbr, avail)
}

/// Intra 16x16 luma residual: sixteen 4x4 transforms whose DC terms go
/// through the Hadamard stage and come back as per-block DC overrides.
#[allow(clippy::too_many_arguments)]
fn code_luma_intra(
    dsp: &dyn Dsp,
    q: &Quantizers,
    src: &[u8],
    pred: &[u8; 256],
    rec: &mut [u8],
    off: usize,
    stride: usize,
    stats: &mut FrameStats,
) -> u16 {
    let mut levels = [[0i16; 16]; 16];
    let mut dc_in = [0i16; 16];
    for (blk, lv) in levels.iter_mut().enumerate() {
        let (bx, by) = (blk % 4, blk / 4);
        let s = off + by * 4 * stride + bx * 4;
        let p = by * 4 * 16 + bx * 4;
        let r = dsp.resi_trans_quant_4x4(&src[s..], stride, &pred[p..], 16, &q.luma.params(), lv);
        dc_in[blk] = r.alt_dc;
    }

    let mut dc_levels = [0i16; 16];
    dsp.hadamard_quant_4x4(&dc_in, &mut dc_levels, &q.luma_dc.params());
    let mut dc = [0i16; 16];
    dsp.ihadamard_scaling_4x4(&dc_levels, &mut dc, &q.dq_luma);

    let mut coded = 0u16;
    for (blk, lv) in levels.iter().enumerate() {
        let (bx, by) = (blk % 4, blk / 4);
        let o = off + by * 4 * stride + bx * 4;
        let p = by * 4 * 16 + bx * 4;
        let has_ac = lv[1..].iter().any(|&c| c != 0);
        if has_ac {
            dsp.iquant_itrans_recon_4x4(lv, &pred[p..], 16, &mut rec[o..], stride, &q.dq_luma, 1, dc[blk]);
        } else {
            dsp.iquant_itrans_recon_4x4_dc(lv, &pred[p..], 16, &mut rec[o..], stride, &q.dq_luma, 1, dc[blk]);
            stats.dc_only_blocks += 1;
        }
        if has_ac || dc[blk] != 0 {
            coded |= 1 << blk;
            stats.coded_blocks += 1;
        }
    }
    coded
}

#[allow(clippy::too_many_arguments)]
fn code_luma_inter(
    dsp: &dyn Dsp,
    q: &Quantizers,
    src: &[u8],
    pred: &[u8; 256],
    rec: &mut [u8],
    off: usize,
    stride: usize,
    transform_8x8: bool,
    stats: &mut FrameStats,
) -> u16 {
    let mut coded = 0u16;
    if transform_8x8 {
        for b8 in 0..4 {
            let (bx, by) = (b8 % 2, b8 / 2);
            let s = off + by * 8 * stride + bx * 8;
            let p = by * 8 * 16 + bx * 8;
            let mut lv = [0i16; 64];
            let nnz = dsp.resi_trans_quant_8x8(&src[s..], stride, &pred[p..], 16, &q.luma_8x8.params(), &mut lv);
            if nnz == 0 {
                copy_block(&pred[p..], 16, &mut rec[s..], stride, 8, 8);
                continue;
            }
            if lv[1..].iter().all(|&c| c == 0) {
                dsp.iquant_itrans_recon_8x8_dc(&lv, &pred[p..], 16, &mut rec[s..], stride, &q.dq_luma_8x8);
                stats.dc_only_blocks += 1;
            } else {
                dsp.iquant_itrans_recon_8x8(&lv, &pred[p..], 16, &mut rec[s..], stride, &q.dq_luma_8x8);
            }
            stats.coded_blocks += 1;
            for sub in [0, 1, 4, 5] {
                coded |= 1 << (by * 8 + bx * 2 + sub);
            }
        }
        return coded;
    }

    for blk in 0..16 {
        let (bx, by) = (blk % 4, blk / 4);
        let s = off + by * 4 * stride + bx * 4;
        let p = by * 4 * 16 + bx * 4;
        let mut lv = [0i16; 16];
        let r = dsp.resi_trans_quant_4x4(&src[s..], stride, &pred[p..], 16, &q.luma.params(), &mut lv);
        if r.nnz == 0 {
            copy_block(&pred[p..], 16, &mut rec[s..], stride, 4, 4);
            continue;
        }
        if lv[1..].iter().all(|&c| c == 0) {
            dsp.iquant_itrans_recon_4x4_dc(&lv, &pred[p..], 16, &mut rec[s..], stride, &q.dq_luma, 0, 0);
            stats.dc_only_blocks += 1;
        } else {
            dsp.iquant_itrans_recon_4x4(&lv, &pred[p..], 16, &mut rec[s..], stride, &q.dq_luma, 0, 0);
        }
        stats.coded_blocks += 1;
        coded |= 1 << blk;
    }
    coded
}

/// Interleaved 8x8 chroma of one macroblock through the 2x2 DC path.
#[allow(clippy::too_many_arguments)]
fn code_chroma(
    dsp: &dyn Dsp,
    q: &Quantizers,
    src: &[u8],
    pred: &[u8; 128],
    rec: &mut [u8],
    off: usize,
    stride: usize,
    stats: &mut FrameStats,
) {
    // index plane * 4 + block, blocks in raster order
    let mut levels = [[0i16; 16]; 8];
    let mut dc_in = [0i16; 8];
    for (i, lv) in levels.iter_mut().enumerate() {
        let (plane, blk) = (i / 4, i % 4);
        let (bx, by) = (blk % 2, blk / 2);
        let s = off + by * 4 * stride + bx * 8 + plane;
        let p = by * 4 * 16 + bx * 8 + plane;
        let r = dsp.resi_trans_quant_chroma_4x4(&src[s..], stride, &pred[p..], 16, &q.chroma.params(), lv);
        dc_in[i] = r.alt_dc;
    }

    let mut dc_levels = [0i16; 8];
    dsp.hadamard_quant_2x2_uv(&dc_in, &mut dc_levels, &q.chroma_dc.params());
    let mut dc = [0i16; 8];
    dsp.ihadamard_scaling_2x2_uv(&dc_levels, &mut dc, &q.dq_chroma);

    for (i, lv) in levels.iter().enumerate() {
        let (plane, blk) = (i / 4, i % 4);
        let (bx, by) = (blk % 2, blk / 2);
        let o = off + by * 4 * stride + bx * 8 + plane;
        let p = by * 4 * 16 + bx * 8 + plane;
        if lv[1..].iter().any(|&c| c != 0) {
            dsp.iquant_itrans_recon_chroma_4x4(lv, &pred[p..], 16, &mut rec[o..], stride, &q.dq_chroma, dc[i]);
        } else {
            dsp.iquant_itrans_recon_chroma_4x4_dc(lv, &pred[p..], 16, &mut rec[o..], stride, &q.dq_chroma, dc[i]);
            stats.dc_only_blocks += 1;
        }
    }
}

fn predict_intra_luma(ngbr: &[u8; 33], avail: NeighbourAvail, src: &[u8], off: usize, stride: usize) -> ([u8; 256], bool) {
    let mut dc = [0u8; 256];
    intra::intra_pred_luma_16x16_dc(ngbr, &mut dc, 16, avail);
    if !(avail.left && avail.top) {
        return (dc, false);
    }
    let mut plane = [0u8; 256];
    intra::intra_pred_luma_16x16_plane(ngbr, &mut plane, 16, avail);
    let target = &src[off..];
    if sad(&plane, 16, target, stride, 16, 16) < sad(&dc, 16, target, stride, 16, 16) {
        (plane, true)
    } else {
        (dc, false)
    }
}

/// Reconstructs one frame. Without a reference every macroblock is intra;
/// with one every macroblock is predicted from it.
pub fn reconstruct_frame(
    dsp: &dyn Dsp,
    cur: &FramePixels,
    reference: Option<&FramePixels>,
    config: &DspConfig,
) -> Result<Reconstructed, DspError> {
    check_dimensions(cur.width, cur.height)?;
    check_qp(config.qp)?;
    if let Some(r) = reference
        && (r.width != cur.width || r.height != cur.height)
    {
        return Err(DspError::DimensionMismatch {
            expected_w: cur.width,
            expected_h: cur.height,
            got_w: r.width,
            got_h: r.height,
        });
    }

    let (width, height) = (cur.width as usize, cur.height as usize);
    let (mbw, mbh) = (width / MB_SIZE, height / MB_SIZE);
    let frame_type = if reference.is_some() {
        FrameType::Inter
    } else {
        FrameType::Intra
    };
    let q = Quantizers::new(config.qp, frame_type == FrameType::Intra)?;
    let src_uv = cur.interleaved_uv();
    let mut planes = Planes::new(width, height);
    let mut infos = vec![MbInfo::default(); mbw * mbh];
    let mut stats = FrameStats::new(frame_type);

    debug!(
        "reconstructing {:?} frame {}x{} qp={} backend={}",
        frame_type,
        width,
        height,
        config.qp,
        dsp.name()
    );

    let padded = reference.map(|r| {
        let mut y = PaddedPlane::new(width, height, BORDER);
        y.load(&r.y);
        padding::pad_frame(&mut y);
        let mut uv = PaddedPlane::new(width, height / 2, BORDER);
        uv.load(&r.interleaved_uv());
        padding::pad_frame_chroma(&mut uv);
        (y, uv)
    });

    for mb_y in 0..mbh {
        for mb_x in 0..mbw {
            let off = mb_y * MB_SIZE * width + mb_x * MB_SIZE;
            let c_off = mb_y * 8 * width + mb_x * MB_SIZE;
            let mut cpred = [0u8; 128];

            let info = match &padded {
                None => {
                    let (ngbr, avail) = luma_neighbours(&planes.luma, width, mb_x, mb_y);
                    let (pred, used_plane) = predict_intra_luma(&ngbr, avail, &cur.y, off, width);
                    if used_plane {
                        stats.intra_plane_mbs += 1;
                    }
                    let (cngbr, cavail) = chroma_neighbours(&planes.uv, width, mb_x, mb_y);
                    intra::intra_pred_chroma_8x8_dc(&cngbr, &mut cpred, 16, cavail);
                    trace!("mb ({}, {}) intra plane={}", mb_x, mb_y, used_plane);

                    let coded = code_luma_intra(dsp, &q, &cur.y, &pred, &mut planes.luma, off, width, &mut stats);
                    MbInfo {
                        intra: true,
                        transform_8x8: false,
                        coded,
                    }
                }
                Some((ref_y, ref_uv)) => {
                    let base = ref_y.origin() + mb_y * MB_SIZE * ref_y.stride + mb_x * MB_SIZE;
                    let mut pred = [0u8; 256];
                    let mut best = (u32::MAX, 0u8);
                    let mut cand = [0u8; 256];
                    for dydx in 0..16u8 {
                        dsp.inter_pred_luma(&ref_y.data, base, ref_y.stride, &mut cand, 16, 16, 16, dydx);
                        let cost = sad(&cand, 16, &cur.y[off..], width, 16, 16);
                        if cost < best.0 {
                            best = (cost, dydx);
                            pred = cand;
                        }
                    }
                    let dydx = best.1;
                    stats.phase_histogram[usize::from(dydx)] += 1;

                    // quarter-pel luma is eighth-pel chroma
                    let cbase = ref_uv.origin() + mb_y * 8 * ref_uv.stride + mb_x * MB_SIZE;
                    dsp.inter_pred_chroma(&ref_uv.data, cbase, ref_uv.stride, &mut cpred, 16, dydx & 3, dydx >> 2, 8, 8);
                    trace!("mb ({}, {}) inter dydx={} sad={}", mb_x, mb_y, dydx, best.0);

                    let coded = code_luma_inter(
                        dsp,
                        &q,
                        &cur.y,
                        &pred,
                        &mut planes.luma,
                        off,
                        width,
                        config.transform_8x8,
                        &mut stats,
                    );
                    MbInfo {
                        intra: false,
                        transform_8x8: config.transform_8x8,
                        coded,
                    }
                }
            };

            code_chroma(dsp, &q, &src_uv, &cpred, &mut planes.uv, c_off, width, &mut stats);
            infos[mb_y * mbw + mb_x] = info;
        }
    }

    if config.deblock {
        deblock_frame(dsp, &mut planes, &infos, config);
    }

    let mut frame = FramePixels {
        y: planes.luma,
        u: Vec::new(),
        v: Vec::new(),
        width: cur.width,
        height: cur.height,
    };
    frame.set_interleaved_uv(&planes.uv);
    stats.psnr_y = psnr(&cur.y, &frame.y);
    stats.psnr_u = psnr(&cur.u, &frame.u);
    stats.psnr_v = psnr(&cur.v, &frame.v);

    Ok(Reconstructed { frame, stats })
}

/// Strength of the four groups along luma edge `edge` (0..4) of macroblock
/// `cur`; `neighbour` is the macroblock across edge 0.
fn edge_strength(cur: &MbInfo, neighbour: &MbInfo, edge: usize, vertical: bool) -> BoundaryStrength {
    let mut bs = [0u8; 4];
    for (g, s) in bs.iter_mut().enumerate() {
        let (q_blk, p_blk, p_mb) = match (vertical, edge) {
            (true, 0) => (g * 4, g * 4 + 3, neighbour),
            (true, e) => (g * 4 + e, g * 4 + e - 1, cur),
            (false, 0) => (g, 12 + g, neighbour),
            (false, e) => (e * 4 + g, (e - 1) * 4 + g, cur),
        };
        *s = if cur.intra || p_mb.intra {
            if edge == 0 { 4 } else { 3 }
        } else if cur.is_coded(q_blk) || p_mb.is_coded(p_blk) {
            2
        } else {
            0
        };
    }
    BoundaryStrength(bs)
}

fn deblock_frame(dsp: &dyn Dsp, planes: &mut Planes, infos: &[MbInfo], config: &DspConfig) {
    let luma = DeblockParams::for_qp(config.qp, config.alpha_offset, config.beta_offset);
    let chroma = DeblockParams::for_qp(
        CHROMA_QP[usize::from(config.qp)],
        config.alpha_offset,
        config.beta_offset,
    );
    let c_alpha = ChromaPair::splat(chroma.alpha);
    let c_beta = ChromaPair::splat(chroma.beta);
    let c_clip = ChromaPair::splat(&chroma.cliptab);
    let stride = planes.width;
    let mbw = planes.width / MB_SIZE;
    let mbh = planes.height / MB_SIZE;
    let mut filtered_edges = 0usize;

    for mb_y in 0..mbh {
        for mb_x in 0..mbw {
            let cur = &infos[mb_y * mbw + mb_x];
            let luma_base = mb_y * MB_SIZE * stride + mb_x * MB_SIZE;
            let chroma_base = mb_y * 8 * stride + mb_x * MB_SIZE;

            for vertical in [true, false] {
                let first_available = if vertical { mb_x > 0 } else { mb_y > 0 };
                let neighbour = match (vertical, first_available) {
                    (_, false) => cur,
                    (true, true) => &infos[mb_y * mbw + mb_x - 1],
                    (false, true) => &infos[(mb_y - 1) * mbw + mb_x],
                };
                for edge in 0..4 {
                    if edge == 0 && !first_available {
                        continue;
                    }
                    if cur.transform_8x8 && edge % 2 == 1 {
                        continue;
                    }
                    let bs = edge_strength(cur, neighbour, edge, vertical);
                    if bs.0 == [0; 4] {
                        continue;
                    }
                    filtered_edges += 1;
                    let strong = bs.0 == [4; 4];

                    let off = if vertical {
                        luma_base + edge * 4
                    } else {
                        luma_base + edge * 4 * stride
                    };
                    match (vertical, strong) {
                        (true, true) => dsp.deblk_luma_vert_bs4(&mut planes.luma, off, stride, luma.alpha, luma.beta),
                        (true, false) => dsp.deblk_luma_vert_bslt4(
                            &mut planes.luma,
                            off,
                            stride,
                            luma.alpha,
                            luma.beta,
                            bs,
                            &luma.cliptab,
                        ),
                        (false, true) => dsp.deblk_luma_horz_bs4(&mut planes.luma, off, stride, luma.alpha, luma.beta),
                        (false, false) => dsp.deblk_luma_horz_bslt4(
                            &mut planes.luma,
                            off,
                            stride,
                            luma.alpha,
                            luma.beta,
                            bs,
                            &luma.cliptab,
                        ),
                    }

                    // chroma edges sit on luma edges 0 and 2
                    if edge % 2 == 1 {
                        continue;
                    }
                    let c_off = if vertical {
                        chroma_base + edge * 4
                    } else {
                        chroma_base + (edge / 2) * 4 * stride
                    };
                    match (vertical, strong) {
                        (true, true) => dsp.deblk_chroma_vert_bs4(&mut planes.uv, c_off, stride, c_alpha, c_beta),
                        (true, false) => dsp.deblk_chroma_vert_bslt4(
                            &mut planes.uv,
                            c_off,
                            stride,
                            c_alpha,
                            c_beta,
                            bs,
                            c_clip,
                        ),
                        (false, true) => dsp.deblk_chroma_horz_bs4(&mut planes.uv, c_off, stride, c_alpha, c_beta),
                        (false, false) => dsp.deblk_chroma_horz_bslt4(
                            &mut planes.uv,
                            c_off,
                            stride,
                            c_alpha,
                            c_beta,
                            bs,
                            c_clip,
                        ),
                    }
                }
            }
        }
    }
    debug!(
        "deblocked {} luma edges (alpha={} beta={})",
        filtered_edges, luma.alpha, luma.beta
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kernels::SCALAR;

    fn config(qp: u8) -> DspConfig {
        DspConfig {
            qp,
            ..Default::default()
        }
    }

    #[test]
    fn rejects_bad_dimensions() {
        let frame = FramePixels::solid(24, 16, 128, 128, 128);
        let err = reconstruct_frame(&SCALAR, &frame, None, &config(26)).unwrap_err();
        assert!(matches!(err, DspError::InvalidDimensions { width: 24, height: 16 }));
    }

    #[test]
    fn rejects_reference_mismatch() {
        let a = FramePixels::solid(32, 32, 128, 128, 128);
        let b = FramePixels::solid(16, 32, 128, 128, 128);
        let err = reconstruct_frame(&SCALAR, &a, Some(&b), &config(26)).unwrap_err();
        assert!(matches!(err, DspError::DimensionMismatch { .. }));
    }

    #[test]
    fn rejects_bad_qp() {
        let a = FramePixels::solid(16, 16, 128, 128, 128);
        assert!(matches!(
            reconstruct_frame(&SCALAR, &a, None, &config(52)),
            Err(DspError::InvalidQp(52))
        ));
    }

    #[test]
    fn mid_grey_is_lossless() {
        let frame = FramePixels::solid(48, 32, 128, 128, 128);
        let out = reconstruct_frame(&SCALAR, &frame, None, &config(30)).unwrap();
        assert_eq!(out.frame, frame);
        assert!(out.stats.psnr_y.is_infinite());
        assert_eq!(out.stats.coded_blocks, 0);

        let inter = reconstruct_frame(&SCALAR, &frame, Some(&out.frame), &config(30)).unwrap();
        assert_eq!(inter.frame, frame);
        assert_eq!(inter.stats.frame_type, FrameType::Inter);
        assert_eq!(inter.stats.phase_histogram[0], 6);
    }

    #[test]
    fn flat_frame_survives_dc_path() {
        let frame = FramePixels::solid(32, 32, 100, 90, 160);
        let out = reconstruct_frame(&SCALAR, &frame, None, &config(26)).unwrap();
        assert!(out.stats.psnr_y > 40.0, "psnr {}", out.stats.psnr_y);
        assert!(out.stats.psnr_u > 40.0, "psnr {}", out.stats.psnr_u);
        assert!(out.stats.psnr_v > 40.0, "psnr {}", out.stats.psnr_v);
        assert!(out.stats.dc_only_blocks > 0);
    }

    #[test]
    fn inter_frame_picks_one_phase_per_macroblock() {
        let frame = FramePixels::grid(32, 32, 4, 0);
        let intra = reconstruct_frame(&SCALAR, &frame, None, &config(20)).unwrap();
        let inter = reconstruct_frame(&SCALAR, &frame, Some(&intra.frame), &config(20)).unwrap();
        assert_eq!(inter.stats.phase_histogram.iter().sum::<usize>(), 4);
        assert!(inter.stats.psnr_y >= intra.stats.psnr_y - 1.0);
    }

    #[test]
    fn lower_qp_is_more_faithful() {
        let frame = FramePixels::grid(64, 32, 8, 0);
        let fine = reconstruct_frame(&SCALAR, &frame, None, &config(12)).unwrap();
        let coarse = reconstruct_frame(&SCALAR, &frame, None, &config(40)).unwrap();
        assert!(fine.stats.psnr_y > coarse.stats.psnr_y);
        assert!(fine.stats.psnr_y > 35.0, "psnr {}", fine.stats.psnr_y);
    }

    #[test]
    fn transform_8x8_path_reconstructs() {
        let a = FramePixels::grid(32, 32, 4, 0);
        let b = FramePixels::grid(32, 32, 4, 1);
        let cfg = DspConfig {
            qp: 18,
            transform_8x8: true,
            ..Default::default()
        };
        let intra = reconstruct_frame(&SCALAR, &a, None, &cfg).unwrap();
        let inter = reconstruct_frame(&SCALAR, &b, Some(&intra.frame), &cfg).unwrap();
        assert!(inter.stats.psnr_y > 30.0, "psnr {}", inter.stats.psnr_y);
    }

    #[test]
    fn deblocking_toggle_only_changes_filtered_output() {
        let frame = FramePixels::grid(48, 48, 6, 0);
        let on = reconstruct_frame(&SCALAR, &frame, None, &config(36)).unwrap();
        let off = reconstruct_frame(
            &SCALAR,
            &frame,
            None,
            &DspConfig {
                qp: 36,
                deblock: false,
                ..Default::default()
            },
        )
        .unwrap();
        assert_eq!(on.stats.coded_blocks, off.stats.coded_blocks);
        assert_ne!(on.frame.y, off.frame.y);
    }

    #[test]
    fn edge_strength_rules() {
        let intra = MbInfo {
            intra: true,
            ..Default::default()
        };
        let inter = MbInfo {
            intra: false,
            transform_8x8: false,
            coded: 1 << 5,
        };
        let empty = MbInfo::default();
        assert_eq!(edge_strength(&inter, &intra, 0, true), BoundaryStrength::uniform(4));
        assert_eq!(edge_strength(&intra, &intra, 2, false), BoundaryStrength::uniform(3));
        // block 5 is row 1, column 1
        assert_eq!(edge_strength(&inter, &empty, 1, true), BoundaryStrength([0, 2, 0, 0]));
        assert_eq!(edge_strength(&inter, &empty, 2, true), BoundaryStrength([0, 2, 0, 0]));
        assert_eq!(edge_strength(&inter, &empty, 1, false), BoundaryStrength([0, 2, 0, 0]));
        assert_eq!(edge_strength(&empty, &empty, 0, false), BoundaryStrength::default());
    }

    #[test]
    fn psnr_values() {
        assert!(psnr(&[1, 2, 3], &[1, 2, 3]).is_infinite());
        let p = psnr(&[0; 4], &[255; 4]);
        assert!(p.abs() < 1e-9);
    }
}
