use std::ptr;
use std::slice;

use avcdsp::deblock::{BoundaryStrength, ChromaPair};
use avcdsp::tables::{self, Cliptab, DeblockParams};
use avcdsp::y4m::FramePixels;
use avcdsp::{Backend, Dsp, DspConfig, FrameType, Reconstructor};

pub const AVCDSP_BACKEND_SCALAR: i32 = 0;
pub const AVCDSP_BACKEND_WIDE: i32 = 1;

fn backend_from_i32(backend: i32) -> Option<Backend> {
    match backend {
        AVCDSP_BACKEND_SCALAR => Some(Backend::Scalar),
        AVCDSP_BACKEND_WIDE => Some(Backend::Wide),
        _ => None,
    }
}

/// Compile-time kernel source for one table.
trait Source {
    fn dsp() -> &'static dyn Dsp;
}

struct ScalarSource;

impl Source for ScalarSource {
    fn dsp() -> &'static dyn Dsp {
        &avcdsp::SCALAR
    }
}

#[cfg(feature = "simd")]
struct WideSource;

#[cfg(feature = "simd")]
impl Source for WideSource {
    fn dsp() -> &'static dyn Dsp {
        &avcdsp::simd::WIDE
    }
}

/// C view of the kernel set. Pointers address the block origin or the first
/// `q0` sample of an edge; the caller guarantees the neighbourhood each
/// kernel reads is addressable. Quantizing kernels take a QP and return -1
/// when it is out of range. The 4x4 forward kernels store the unquantized DC
/// through `alt_dc` when it is not null.
#[repr(C)]
pub struct AvcDspKernels {
    pub resi_trans_quant_4x4:
        unsafe extern "C" fn(*const u8, usize, *const u8, usize, u8, i32, *mut i16, *mut i16) -> i32,
    pub resi_trans_quant_chroma_4x4:
        unsafe extern "C" fn(*const u8, usize, *const u8, usize, u8, i32, *mut i16, *mut i16) -> i32,
    pub resi_trans_quant_8x8: unsafe extern "C" fn(*const u8, usize, *const u8, usize, u8, i32, *mut i16) -> i32,
    pub iquant_itrans_recon_4x4:
        unsafe extern "C" fn(*const i16, *const u8, usize, *mut u8, usize, u8, u32, i16) -> i32,
    pub iquant_itrans_recon_4x4_dc:
        unsafe extern "C" fn(*const i16, *const u8, usize, *mut u8, usize, u8, u32, i16) -> i32,
    pub iquant_itrans_recon_8x8: unsafe extern "C" fn(*const i16, *const u8, usize, *mut u8, usize, u8) -> i32,
    pub iquant_itrans_recon_8x8_dc: unsafe extern "C" fn(*const i16, *const u8, usize, *mut u8, usize, u8) -> i32,
    pub iquant_itrans_recon_chroma_4x4:
        unsafe extern "C" fn(*const i16, *const u8, usize, *mut u8, usize, u8, i16) -> i32,
    pub iquant_itrans_recon_chroma_4x4_dc:
        unsafe extern "C" fn(*const i16, *const u8, usize, *mut u8, usize, u8, i16) -> i32,
    pub hadamard_quant_4x4: unsafe extern "C" fn(*const i16, *mut i16, u8, i32) -> i32,
    pub ihadamard_scaling_4x4: unsafe extern "C" fn(*const i16, *mut i16, u8) -> i32,
    pub hadamard_quant_2x2_uv: unsafe extern "C" fn(*const i16, *mut i16, u8, i32) -> i32,
    pub ihadamard_scaling_2x2_uv: unsafe extern "C" fn(*const i16, *mut i16, u8) -> i32,
    pub inter_pred_luma: unsafe extern "C" fn(*const u8, usize, *mut u8, usize, usize, usize, u8),
    pub inter_pred_chroma: unsafe extern "C" fn(*const u8, usize, *mut u8, usize, u8, u8, usize, usize),
    pub inter_pred_luma_bilinear:
        unsafe extern "C" fn(*const u8, usize, *const u8, usize, *mut u8, usize, usize, usize),
    pub deblk_luma_vert: unsafe extern "C" fn(*mut u8, usize, u8, u8, u32, *const u8),
    pub deblk_luma_horz: unsafe extern "C" fn(*mut u8, usize, u8, u8, u32, *const u8),
    pub deblk_luma_vert_mbaff: unsafe extern "C" fn(*mut u8, usize, u8, u8, u32, *const u8),
    pub deblk_chroma_vert: unsafe extern "C" fn(*mut u8, usize, u32, u32, u32, *const u8, *const u8),
    pub deblk_chroma_horz: unsafe extern "C" fn(*mut u8, usize, u32, u32, u32, *const u8, *const u8),
    pub deblk_chroma_vert_mbaff: unsafe extern "C" fn(*mut u8, usize, u32, u32, u32, *const u8, *const u8),
}

const fn table<S: Source>() -> AvcDspKernels {
    AvcDspKernels {
        resi_trans_quant_4x4: resi_trans_quant_4x4::<S>,
        resi_trans_quant_chroma_4x4: resi_trans_quant_chroma_4x4::<S>,
        resi_trans_quant_8x8: resi_trans_quant_8x8::<S>,
        iquant_itrans_recon_4x4: iquant_itrans_recon_4x4::<S>,
        iquant_itrans_recon_4x4_dc: iquant_itrans_recon_4x4_dc::<S>,
        iquant_itrans_recon_8x8: iquant_itrans_recon_8x8::<S>,
        iquant_itrans_recon_8x8_dc: iquant_itrans_recon_8x8_dc::<S>,
        iquant_itrans_recon_chroma_4x4: iquant_itrans_recon_chroma_4x4::<S>,
        iquant_itrans_recon_chroma_4x4_dc: iquant_itrans_recon_chroma_4x4_dc::<S>,
        hadamard_quant_4x4: hadamard_quant_4x4::<S>,
        ihadamard_scaling_4x4: ihadamard_scaling_4x4::<S>,
        hadamard_quant_2x2_uv: hadamard_quant_2x2_uv::<S>,
        ihadamard_scaling_2x2_uv: ihadamard_scaling_2x2_uv::<S>,
        inter_pred_luma: inter_pred_luma::<S>,
        inter_pred_chroma: inter_pred_chroma::<S>,
        inter_pred_luma_bilinear: inter_pred_luma_bilinear::<S>,
        deblk_luma_vert: deblk_luma_vert::<S>,
        deblk_luma_horz: deblk_luma_horz::<S>,
        deblk_luma_vert_mbaff: deblk_luma_vert_mbaff::<S>,
        deblk_chroma_vert: deblk_chroma_vert::<S>,
        deblk_chroma_horz: deblk_chroma_horz::<S>,
        deblk_chroma_vert_mbaff: deblk_chroma_vert_mbaff::<S>,
    }
}

static SCALAR_KERNELS: AvcDspKernels = table::<ScalarSource>();
#[cfg(feature = "simd")]
static WIDE_KERNELS: AvcDspKernels = table::<WideSource>();

/// Returns the kernel table for `backend`, or null when that backend is
/// unknown or not compiled in.
#[unsafe(no_mangle)]
pub extern "C" fn avcdsp_kernels(backend: i32) -> *const AvcDspKernels {
    match backend_from_i32(backend) {
        Some(Backend::Scalar) => &SCALAR_KERNELS,
        #[cfg(feature = "simd")]
        Some(Backend::Wide) => &WIDE_KERNELS,
        _ => ptr::null(),
    }
}

/// Bytes one interleaved chroma plane of a 4x4 block reaches per row.
const CHROMA_COLS: usize = 7;

/// Bytes spanned by `rows` rows of `cols` samples.
fn span(rows: usize, stride: usize, cols: usize) -> usize {
    (rows - 1) * stride + cols
}

unsafe fn block<'a>(ptr: *const u8, stride: usize, rows: usize, cols: usize) -> &'a [u8] {
    unsafe { slice::from_raw_parts(ptr, span(rows, stride, cols)) }
}

unsafe fn block_mut<'a>(ptr: *mut u8, stride: usize, rows: usize, cols: usize) -> &'a mut [u8] {
    unsafe { slice::from_raw_parts_mut(ptr, span(rows, stride, cols)) }
}

/// Mutable window starting `back` bytes before `ptr`.
unsafe fn window_mut<'a>(ptr: *mut u8, back: usize, len: usize) -> &'a mut [u8] {
    unsafe { slice::from_raw_parts_mut(ptr.sub(back), len) }
}

#[allow(clippy::too_many_arguments)]
unsafe extern "C" fn resi_trans_quant_4x4<S: Source>(
    src: *const u8,
    src_stride: usize,
    pred: *const u8,
    pred_stride: usize,
    qp: u8,
    intra: i32,
    out: *mut i16,
    alt_dc: *mut i16,
) -> i32 {
    if src.is_null() || pred.is_null() || out.is_null() {
        return -1;
    }
    let Ok(quant) = tables::quant_4x4(qp, intra != 0) else {
        return -1;
    };
    let (src, pred, out) = unsafe {
        (
            block(src, src_stride, 4, 4),
            block(pred, pred_stride, 4, 4),
            &mut *(out as *mut [i16; 16]),
        )
    };
    let q = S::dsp().resi_trans_quant_4x4(src, src_stride, pred, pred_stride, &quant.params(), out);
    if !alt_dc.is_null() {
        unsafe { *alt_dc = q.alt_dc };
    }
    i32::from(q.nnz)
}

/// One plane of interleaved UV; `src` and `pred` address its first sample.
#[allow(clippy::too_many_arguments)]
unsafe extern "C" fn resi_trans_quant_chroma_4x4<S: Source>(
    src: *const u8,
    src_stride: usize,
    pred: *const u8,
    pred_stride: usize,
    qp: u8,
    intra: i32,
    out: *mut i16,
    alt_dc: *mut i16,
) -> i32 {
    if src.is_null() || pred.is_null() || out.is_null() {
        return -1;
    }
    let Ok(quant) = tables::quant_4x4(qp, intra != 0) else {
        return -1;
    };
    let (src, pred, out) = unsafe {
        (
            block(src, src_stride, 4, CHROMA_COLS),
            block(pred, pred_stride, 4, CHROMA_COLS),
            &mut *(out as *mut [i16; 16]),
        )
    };
    let q = S::dsp().resi_trans_quant_chroma_4x4(src, src_stride, pred, pred_stride, &quant.params(), out);
    if !alt_dc.is_null() {
        unsafe { *alt_dc = q.alt_dc };
    }
    i32::from(q.nnz)
}

unsafe extern "C" fn resi_trans_quant_8x8<S: Source>(
    src: *const u8,
    src_stride: usize,
    pred: *const u8,
    pred_stride: usize,
    qp: u8,
    intra: i32,
    out: *mut i16,
) -> i32 {
    if src.is_null() || pred.is_null() || out.is_null() {
        return -1;
    }
    let Ok(quant) = tables::quant_8x8(qp, intra != 0) else {
        return -1;
    };
    let (src, pred, out) = unsafe {
        (
            block(src, src_stride, 8, 8),
            block(pred, pred_stride, 8, 8),
            &mut *(out as *mut [i16; 64]),
        )
    };
    i32::from(S::dsp().resi_trans_quant_8x8(src, src_stride, pred, pred_stride, &quant.params(), out))
}

#[allow(clippy::too_many_arguments)]
unsafe extern "C" fn iquant_itrans_recon_4x4<S: Source>(
    src: *const i16,
    pred: *const u8,
    pred_stride: usize,
    out: *mut u8,
    out_stride: usize,
    qp: u8,
    start_idx: u32,
    dc: i16,
) -> i32 {
    if src.is_null() || pred.is_null() || out.is_null() || start_idx > 1 {
        return -1;
    }
    let Ok(dequant) = tables::dequant_4x4(qp) else {
        return -1;
    };
    let (src, pred, out) = unsafe {
        (
            &*(src as *const [i16; 16]),
            block(pred, pred_stride, 4, 4),
            block_mut(out, out_stride, 4, 4),
        )
    };
    S::dsp().iquant_itrans_recon_4x4(src, pred, pred_stride, out, out_stride, &dequant, start_idx as usize, dc);
    0
}

#[allow(clippy::too_many_arguments)]
unsafe extern "C" fn iquant_itrans_recon_4x4_dc<S: Source>(
    src: *const i16,
    pred: *const u8,
    pred_stride: usize,
    out: *mut u8,
    out_stride: usize,
    qp: u8,
    start_idx: u32,
    dc: i16,
) -> i32 {
    if src.is_null() || pred.is_null() || out.is_null() || start_idx > 1 {
        return -1;
    }
    let Ok(dequant) = tables::dequant_4x4(qp) else {
        return -1;
    };
    let (src, pred, out) = unsafe {
        (
            &*(src as *const [i16; 16]),
            block(pred, pred_stride, 4, 4),
            block_mut(out, out_stride, 4, 4),
        )
    };
    S::dsp().iquant_itrans_recon_4x4_dc(src, pred, pred_stride, out, out_stride, &dequant, start_idx as usize, dc);
    0
}

unsafe extern "C" fn iquant_itrans_recon_8x8<S: Source>(
    src: *const i16,
    pred: *const u8,
    pred_stride: usize,
    out: *mut u8,
    out_stride: usize,
    qp: u8,
) -> i32 {
    if src.is_null() || pred.is_null() || out.is_null() {
        return -1;
    }
    let Ok(dequant) = tables::dequant_8x8(qp) else {
        return -1;
    };
    let (src, pred, out) = unsafe {
        (
            &*(src as *const [i16; 64]),
            block(pred, pred_stride, 8, 8),
            block_mut(out, out_stride, 8, 8),
        )
    };
    S::dsp().iquant_itrans_recon_8x8(src, pred, pred_stride, out, out_stride, &dequant);
    0
}

unsafe extern "C" fn iquant_itrans_recon_8x8_dc<S: Source>(
    src: *const i16,
    pred: *const u8,
    pred_stride: usize,
    out: *mut u8,
    out_stride: usize,
    qp: u8,
) -> i32 {
    if src.is_null() || pred.is_null() || out.is_null() {
        return -1;
    }
    let Ok(dequant) = tables::dequant_8x8(qp) else {
        return -1;
    };
    let (src, pred, out) = unsafe {
        (
            &*(src as *const [i16; 64]),
            block(pred, pred_stride, 8, 8),
            block_mut(out, out_stride, 8, 8),
        )
    };
    S::dsp().iquant_itrans_recon_8x8_dc(src, pred, pred_stride, out, out_stride, &dequant);
    0
}

/// One plane of interleaved UV. `dc` replaces the dequantized `src[0]`;
/// the other plane's bytes in `out` are left as they are.
unsafe extern "C" fn iquant_itrans_recon_chroma_4x4<S: Source>(
    src: *const i16,
    pred: *const u8,
    pred_stride: usize,
    out: *mut u8,
    out_stride: usize,
    qp: u8,
    dc: i16,
) -> i32 {
    if src.is_null() || pred.is_null() || out.is_null() {
        return -1;
    }
    let Ok(dequant) = tables::dequant_4x4(qp) else {
        return -1;
    };
    let (src, pred, out) = unsafe {
        (
            &*(src as *const [i16; 16]),
            block(pred, pred_stride, 4, CHROMA_COLS),
            block_mut(out, out_stride, 4, CHROMA_COLS),
        )
    };
    S::dsp().iquant_itrans_recon_chroma_4x4(src, pred, pred_stride, out, out_stride, &dequant, dc);
    0
}

unsafe extern "C" fn iquant_itrans_recon_chroma_4x4_dc<S: Source>(
    src: *const i16,
    pred: *const u8,
    pred_stride: usize,
    out: *mut u8,
    out_stride: usize,
    qp: u8,
    dc: i16,
) -> i32 {
    if src.is_null() || pred.is_null() || out.is_null() {
        return -1;
    }
    let Ok(dequant) = tables::dequant_4x4(qp) else {
        return -1;
    };
    let (src, pred, out) = unsafe {
        (
            &*(src as *const [i16; 16]),
            block(pred, pred_stride, 4, CHROMA_COLS),
            block_mut(out, out_stride, 4, CHROMA_COLS),
        )
    };
    S::dsp().iquant_itrans_recon_chroma_4x4_dc(src, pred, pred_stride, out, out_stride, &dequant, dc);
    0
}

unsafe extern "C" fn hadamard_quant_4x4<S: Source>(src: *const i16, out: *mut i16, qp: u8, intra: i32) -> i32 {
    if src.is_null() || out.is_null() {
        return -1;
    }
    let Ok(quant) = tables::quant_dc(qp, intra != 0) else {
        return -1;
    };
    let (src, out) = unsafe { (&*(src as *const [i16; 16]), &mut *(out as *mut [i16; 16])) };
    i32::from(S::dsp().hadamard_quant_4x4(src, out, &quant.params()))
}

unsafe extern "C" fn ihadamard_scaling_4x4<S: Source>(src: *const i16, out: *mut i16, qp: u8) -> i32 {
    if src.is_null() || out.is_null() {
        return -1;
    }
    let Ok(dequant) = tables::dequant_4x4(qp) else {
        return -1;
    };
    let (src, out) = unsafe { (&*(src as *const [i16; 16]), &mut *(out as *mut [i16; 16])) };
    S::dsp().ihadamard_scaling_4x4(src, out, &dequant);
    0
}

/// Eight DC terms, U then V. Returns `nnz_v << 8 | nnz_u`.
unsafe extern "C" fn hadamard_quant_2x2_uv<S: Source>(src: *const i16, out: *mut i16, qp: u8, intra: i32) -> i32 {
    if src.is_null() || out.is_null() {
        return -1;
    }
    let Ok(quant) = tables::quant_dc(qp, intra != 0) else {
        return -1;
    };
    let (src, out) = unsafe { (&*(src as *const [i16; 8]), &mut *(out as *mut [i16; 8])) };
    let [u, v] = S::dsp().hadamard_quant_2x2_uv(src, out, &quant.params());
    (i32::from(v) << 8) | i32::from(u)
}

unsafe extern "C" fn ihadamard_scaling_2x2_uv<S: Source>(src: *const i16, out: *mut i16, qp: u8) -> i32 {
    if src.is_null() || out.is_null() {
        return -1;
    }
    let Ok(dequant) = tables::dequant_4x4(qp) else {
        return -1;
    };
    let (src, out) = unsafe { (&*(src as *const [i16; 8]), &mut *(out as *mut [i16; 8])) };
    S::dsp().ihadamard_scaling_2x2_uv(src, out, &dequant);
    0
}

/// Reads two rows/columns before the block and three after.
unsafe extern "C" fn inter_pred_luma<S: Source>(
    src: *const u8,
    src_stride: usize,
    dst: *mut u8,
    dst_stride: usize,
    width: usize,
    height: usize,
    dydx: u8,
) {
    if src.is_null() || dst.is_null() || width == 0 || height == 0 {
        return;
    }
    let back = 2 * src_stride + 2;
    let (src, dst) = unsafe {
        (
            slice::from_raw_parts(src.sub(back), span(height + 5, src_stride, width + 5)),
            block_mut(dst, dst_stride, height, width),
        )
    };
    S::dsp().inter_pred_luma(src, back, src_stride, dst, dst_stride, width, height, dydx);
}

/// Interleaved chroma; `width` counts sample pairs.
#[allow(clippy::too_many_arguments)]
unsafe extern "C" fn inter_pred_chroma<S: Source>(
    src: *const u8,
    src_stride: usize,
    dst: *mut u8,
    dst_stride: usize,
    dx: u8,
    dy: u8,
    width: usize,
    height: usize,
) {
    if src.is_null() || dst.is_null() || width == 0 || height == 0 || dx > 7 || dy > 7 {
        return;
    }
    let rows = height + usize::from(dy != 0);
    let cols = 2 * width + if dx != 0 { 2 } else { 0 };
    let (src, dst) = unsafe { (block(src, src_stride, rows, cols), block_mut(dst, dst_stride, height, 2 * width)) };
    S::dsp().inter_pred_chroma(src, 0, src_stride, dst, dst_stride, dx, dy, width, height);
}

#[allow(clippy::too_many_arguments)]
unsafe extern "C" fn inter_pred_luma_bilinear<S: Source>(
    src1: *const u8,
    src1_stride: usize,
    src2: *const u8,
    src2_stride: usize,
    dst: *mut u8,
    dst_stride: usize,
    width: usize,
    height: usize,
) {
    if src1.is_null() || src2.is_null() || dst.is_null() || width == 0 || height == 0 {
        return;
    }
    let (src1, src2, dst) = unsafe {
        (
            block(src1, src1_stride, height, width),
            block(src2, src2_stride, height, width),
            block_mut(dst, dst_stride, height, width),
        )
    };
    S::dsp().inter_pred_luma_bilinear(src1, src1_stride, src2, src2_stride, dst, dst_stride, width, height);
}

unsafe fn cliptab<'a>(ptr: *const u8) -> Option<&'a Cliptab> {
    if ptr.is_null() {
        None
    } else {
        Some(unsafe { &*(ptr as *const Cliptab) })
    }
}

fn is_strong(bs: BoundaryStrength) -> bool {
    bs == BoundaryStrength::uniform(4)
}

/// `bs` packs the four group strengths with group 0 in the top byte. A
/// uniform strength of 4 selects the strong filter; otherwise `cliptab`
/// (five bytes) is required.
unsafe extern "C" fn deblk_luma_vert<S: Source>(
    buf: *mut u8,
    stride: usize,
    alpha: u8,
    beta: u8,
    bs: u32,
    cliptab_ptr: *const u8,
) {
    if buf.is_null() {
        return;
    }
    let bs = BoundaryStrength::from_packed(bs);
    let buf = unsafe { window_mut(buf, 4, span(16, stride, 8)) };
    if is_strong(bs) {
        S::dsp().deblk_luma_vert_bs4(buf, 4, stride, alpha, beta);
    } else if let Some(ct) = unsafe { cliptab(cliptab_ptr) } {
        S::dsp().deblk_luma_vert_bslt4(buf, 4, stride, alpha, beta, bs, ct);
    }
}

unsafe extern "C" fn deblk_luma_horz<S: Source>(
    buf: *mut u8,
    stride: usize,
    alpha: u8,
    beta: u8,
    bs: u32,
    cliptab_ptr: *const u8,
) {
    if buf.is_null() {
        return;
    }
    let bs = BoundaryStrength::from_packed(bs);
    let back = 4 * stride;
    let buf = unsafe { window_mut(buf, back, span(8, stride, 16)) };
    if is_strong(bs) {
        S::dsp().deblk_luma_horz_bs4(buf, back, stride, alpha, beta);
    } else if let Some(ct) = unsafe { cliptab(cliptab_ptr) } {
        S::dsp().deblk_luma_horz_bslt4(buf, back, stride, alpha, beta, bs, ct);
    }
}

/// Field macroblock edge: 8 rows, two per strength group.
unsafe extern "C" fn deblk_luma_vert_mbaff<S: Source>(
    buf: *mut u8,
    stride: usize,
    alpha: u8,
    beta: u8,
    bs: u32,
    cliptab_ptr: *const u8,
) {
    if buf.is_null() {
        return;
    }
    let bs = BoundaryStrength::from_packed(bs);
    let buf = unsafe { window_mut(buf, 4, span(8, stride, 8)) };
    if is_strong(bs) {
        S::dsp().deblk_luma_vert_bs4_mbaff(buf, 4, stride, alpha, beta);
    } else if let Some(ct) = unsafe { cliptab(cliptab_ptr) } {
        S::dsp().deblk_luma_vert_bslt4_mbaff(buf, 4, stride, alpha, beta, bs, ct);
    }
}

/// Interleaved chroma edge. `alpha` and `beta` pack `v << 8 | u`.
#[allow(clippy::too_many_arguments)]
unsafe extern "C" fn deblk_chroma_vert<S: Source>(
    buf: *mut u8,
    stride: usize,
    alpha: u32,
    beta: u32,
    bs: u32,
    cliptab_u: *const u8,
    cliptab_v: *const u8,
) {
    if buf.is_null() {
        return;
    }
    let (alpha, beta) = (ChromaPair::from_packed(alpha), ChromaPair::from_packed(beta));
    let bs = BoundaryStrength::from_packed(bs);
    let buf = unsafe { window_mut(buf, 4, span(8, stride, 8)) };
    if is_strong(bs) {
        S::dsp().deblk_chroma_vert_bs4(buf, 4, stride, alpha, beta);
    } else if let (Some(u), Some(v)) = unsafe { (cliptab(cliptab_u), cliptab(cliptab_v)) } {
        S::dsp().deblk_chroma_vert_bslt4(buf, 4, stride, alpha, beta, bs, ChromaPair { u, v });
    }
}

#[allow(clippy::too_many_arguments)]
unsafe extern "C" fn deblk_chroma_horz<S: Source>(
    buf: *mut u8,
    stride: usize,
    alpha: u32,
    beta: u32,
    bs: u32,
    cliptab_u: *const u8,
    cliptab_v: *const u8,
) {
    if buf.is_null() {
        return;
    }
    let (alpha, beta) = (ChromaPair::from_packed(alpha), ChromaPair::from_packed(beta));
    let bs = BoundaryStrength::from_packed(bs);
    let back = 2 * stride;
    let buf = unsafe { window_mut(buf, back, span(4, stride, 16)) };
    if is_strong(bs) {
        S::dsp().deblk_chroma_horz_bs4(buf, back, stride, alpha, beta);
    } else if let (Some(u), Some(v)) = unsafe { (cliptab(cliptab_u), cliptab(cliptab_v)) } {
        S::dsp().deblk_chroma_horz_bslt4(buf, back, stride, alpha, beta, bs, ChromaPair { u, v });
    }
}

/// Field macroblock chroma edge: 4 rows, one per strength group.
#[allow(clippy::too_many_arguments)]
unsafe extern "C" fn deblk_chroma_vert_mbaff<S: Source>(
    buf: *mut u8,
    stride: usize,
    alpha: u32,
    beta: u32,
    bs: u32,
    cliptab_u: *const u8,
    cliptab_v: *const u8,
) {
    if buf.is_null() {
        return;
    }
    let (alpha, beta) = (ChromaPair::from_packed(alpha), ChromaPair::from_packed(beta));
    let bs = BoundaryStrength::from_packed(bs);
    let buf = unsafe { window_mut(buf, 4, span(4, stride, 8)) };
    if is_strong(bs) {
        S::dsp().deblk_chroma_vert_bs4_mbaff(buf, 4, stride, alpha, beta);
    } else if let (Some(u), Some(v)) = unsafe { (cliptab(cliptab_u), cliptab(cliptab_v)) } {
        S::dsp().deblk_chroma_vert_bslt4_mbaff(buf, 4, stride, alpha, beta, bs, ChromaPair { u, v });
    }
}

#[repr(C)]
pub struct AvcDspDeblockParams {
    pub alpha: u8,
    pub beta: u8,
    pub cliptab: [u8; 5],
}

/// Fills `out` with the thresholds for `qp` and the slice offsets.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn avcdsp_deblock_params(
    qp: u8,
    alpha_offset: i8,
    beta_offset: i8,
    out: *mut AvcDspDeblockParams,
) -> i32 {
    if out.is_null() || qp > tables::MAX_QP {
        return -1;
    }
    let p = DeblockParams::for_qp(qp, alpha_offset, beta_offset);
    unsafe {
        *out = AvcDspDeblockParams {
            alpha: p.alpha,
            beta: p.beta,
            cliptab: p.cliptab,
        };
    }
    0
}

pub struct AvcDspReconstructor {
    inner: Reconstructor,
}

#[repr(C)]
pub struct AvcDspConfig {
    pub qp: u8,
    pub keyint: usize,
    pub deblock: i32,
    pub transform_8x8: i32,
    pub alpha_offset: i8,
    pub beta_offset: i8,
    pub backend: i32,
}

#[repr(C)]
pub struct AvcDspFrame {
    pub y: *const u8,
    pub y_len: usize,
    pub u: *const u8,
    pub u_len: usize,
    pub v: *const u8,
    pub v_len: usize,
    pub frame_number: u64,
    pub is_intra: i32,
    pub psnr_y: f64,
    pub psnr_u: f64,
    pub psnr_v: f64,
}

fn into_raw_plane(plane: Vec<u8>) -> (*const u8, usize) {
    let boxed = plane.into_boxed_slice();
    let len = boxed.len();
    (Box::into_raw(boxed) as *const u8, len)
}

unsafe fn free_plane(data: *const u8, len: usize) {
    if !data.is_null() {
        unsafe {
            let slice_ptr = slice::from_raw_parts_mut(data as *mut u8, len);
            drop(Box::from_raw(slice_ptr as *mut [u8]));
        }
    }
}

#[unsafe(no_mangle)]
pub unsafe extern "C" fn avcdsp_reconstructor_new(
    width: u32,
    height: u32,
    cfg: *const AvcDspConfig,
) -> *mut AvcDspReconstructor {
    if cfg.is_null() {
        return ptr::null_mut();
    }

    let cfg = unsafe { &*cfg };
    let Some(backend) = backend_from_i32(cfg.backend) else {
        return ptr::null_mut();
    };

    let config = DspConfig {
        qp: cfg.qp,
        backend,
        deblock: cfg.deblock != 0,
        alpha_offset: cfg.alpha_offset,
        beta_offset: cfg.beta_offset,
        transform_8x8: cfg.transform_8x8 != 0,
        keyint: cfg.keyint,
    };

    match Reconstructor::new(width, height, config) {
        Ok(inner) => Box::into_raw(Box::new(AvcDspReconstructor { inner })),
        Err(_) => ptr::null_mut(),
    }
}

#[unsafe(no_mangle)]
pub unsafe extern "C" fn avcdsp_reconstructor_free(rec: *mut AvcDspReconstructor) {
    if !rec.is_null() {
        drop(unsafe { Box::from_raw(rec) });
    }
}

#[unsafe(no_mangle)]
pub unsafe extern "C" fn avcdsp_reconstructor_send_frame(
    rec: *mut AvcDspReconstructor,
    y: *const u8,
    y_len: usize,
    u: *const u8,
    u_len: usize,
    v: *const u8,
    v_len: usize,
) -> i32 {
    if rec.is_null() || y.is_null() || u.is_null() || v.is_null() {
        return -1;
    }

    let rec = unsafe { &mut *rec };
    let (width, height) = (rec.inner.width(), rec.inner.height());
    let chroma = (width as usize / 2) * (height as usize / 2);
    if y_len != width as usize * height as usize || u_len != chroma || v_len != chroma {
        return -1;
    }

    let frame = unsafe {
        FramePixels {
            y: slice::from_raw_parts(y, y_len).to_vec(),
            u: slice::from_raw_parts(u, u_len).to_vec(),
            v: slice::from_raw_parts(v, v_len).to_vec(),
            width,
            height,
        }
    };

    match rec.inner.send_frame(&frame) {
        Ok(()) => 0,
        Err(_) => -1,
    }
}

#[unsafe(no_mangle)]
pub unsafe extern "C" fn avcdsp_reconstructor_receive_frame(rec: *mut AvcDspReconstructor) -> *mut AvcDspFrame {
    if rec.is_null() {
        return ptr::null_mut();
    }

    let rec = unsafe { &mut *rec };
    let frame_number = rec.inner.frames_sent().saturating_sub(1);

    match rec.inner.receive_frame() {
        Some(out) => {
            let (y, y_len) = into_raw_plane(out.frame.y);
            let (u, u_len) = into_raw_plane(out.frame.u);
            let (v, v_len) = into_raw_plane(out.frame.v);
            Box::into_raw(Box::new(AvcDspFrame {
                y,
                y_len,
                u,
                u_len,
                v,
                v_len,
                frame_number,
                is_intra: i32::from(out.stats.frame_type == FrameType::Intra),
                psnr_y: out.stats.psnr_y,
                psnr_u: out.stats.psnr_u,
                psnr_v: out.stats.psnr_v,
            }))
        }
        None => ptr::null_mut(),
    }
}

#[unsafe(no_mangle)]
pub unsafe extern "C" fn avcdsp_frame_free(frame: *mut AvcDspFrame) {
    if frame.is_null() {
        return;
    }

    let frame = unsafe { Box::from_raw(frame) };
    unsafe {
        free_plane(frame.y, frame.y_len);
        free_plane(frame.u, frame.u_len);
        free_plane(frame.v, frame.v_len);
    }
}
