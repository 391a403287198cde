//! In-loop deblocking filters.
//!
//! Every function takes the frame slice plus `off`, the position of the first
//! q0 sample on the edge. Vertical edges walk down rows with p samples to the
//! left; horizontal edges walk along a row with p samples above. Chroma is
//! interleaved UV, filtered per plane with that plane's thresholds.

use crate::clip_pixel;
use crate::tables::Cliptab;

/// Boundary strength of the four sample groups along an edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BoundaryStrength(pub [u8; 4]);

impl BoundaryStrength {
    pub fn uniform(bs: u8) -> Self {
        Self([bs; 4])
    }

    /// From `bs0 << 24 | bs1 << 16 | bs2 << 8 | bs3`.
    pub fn from_packed(packed: u32) -> Self {
        Self(packed.to_be_bytes())
    }

    pub fn packed(self) -> u32 {
        u32::from_be_bytes(self.0)
    }
}

/// A parameter that differs between the U and V planes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ChromaPair<T> {
    pub u: T,
    pub v: T,
}

impl<T: Copy> ChromaPair<T> {
    pub fn splat(value: T) -> Self {
        Self { u: value, v: value }
    }

    fn plane(&self, plane: usize) -> T {
        if plane == 0 { self.u } else { self.v }
    }
}

impl ChromaPair<u8> {
    /// From `v << 8 | u`.
    pub fn from_packed(packed: u32) -> Self {
        Self {
            u: packed as u8,
            v: (packed >> 8) as u8,
        }
    }

    pub fn packed(self) -> u32 {
        (u32::from(self.v) << 8) | u32::from(self.u)
    }
}

#[inline]
fn gate(p1: i32, p0: i32, q0: i32, q1: i32, alpha: i32, beta: i32) -> bool {
    (p0 - q0).abs() < alpha && (p1 - p0).abs() < beta && (q1 - q0).abs() < beta
}

/// Strong filter across one line of samples. `step` is the distance
/// between successive samples perpendicular to the edge.
fn luma_bs4_line(buf: &mut [u8], pos: usize, step: usize, alpha: u8, beta: u8) {
    let p0 = buf[pos - step] as i32;
    let p1 = buf[pos - 2 * step] as i32;
    let q0 = buf[pos] as i32;
    let q1 = buf[pos + step] as i32;
    let (alpha, beta) = (alpha as i32, beta as i32);
    if !gate(p1, p0, q0, q1, alpha, beta) {
        return;
    }
    let p2 = buf[pos - 3 * step] as i32;
    let p3 = buf[pos - 4 * step] as i32;
    let q2 = buf[pos + 2 * step] as i32;
    let q3 = buf[pos + 3 * step] as i32;
    let small_gap = (p0 - q0).abs() < (alpha >> 2) + 2;

    if small_gap && (p2 - p0).abs() < beta {
        buf[pos - step] = ((p2 + (p1 << 1) + (p0 << 1) + (q0 << 1) + q1 + 4) >> 3) as u8;
        buf[pos - 2 * step] = ((p2 + p1 + p0 + q0 + 2) >> 2) as u8;
        buf[pos - 3 * step] = (((p3 << 1) + p2 + (p2 << 1) + p1 + p0 + q0 + 4) >> 3) as u8;
    } else {
        buf[pos - step] = (((p1 << 1) + p0 + q1 + 2) >> 2) as u8;
    }

    if small_gap && (q2 - q0).abs() < beta {
        buf[pos] = ((p1 + (p0 << 1) + (q0 << 1) + (q1 << 1) + q2 + 4) >> 3) as u8;
        buf[pos + step] = ((p0 + q0 + q1 + q2 + 2) >> 2) as u8;
        buf[pos + 2 * step] = (((q3 << 1) + q2 + (q2 << 1) + q1 + q0 + p0 + 4) >> 3) as u8;
    } else {
        buf[pos] = (((q1 << 1) + q0 + p1 + 2) >> 2) as u8;
    }
}

fn luma_bslt4_line(buf: &mut [u8], pos: usize, step: usize, alpha: u8, beta: u8, tc0: i32) {
    let p0 = buf[pos - step] as i32;
    let p1 = buf[pos - 2 * step] as i32;
    let q0 = buf[pos] as i32;
    let q1 = buf[pos + step] as i32;
    let beta = beta as i32;
    if !gate(p1, p0, q0, q1, alpha as i32, beta) {
        return;
    }
    let p2 = buf[pos - 3 * step] as i32;
    let q2 = buf[pos + 2 * step] as i32;
    let ap = (p2 - p0).abs() < beta;
    let aq = (q2 - q0).abs() < beta;
    let tc = tc0 + ap as i32 + aq as i32;

    let delta = ((((q0 - p0) << 2) + (p1 - q1) + 4) >> 3).clamp(-tc, tc);
    buf[pos - step] = clip_pixel(p0 + delta);
    buf[pos] = clip_pixel(q0 - delta);

    let avg0 = (p0 + q0 + 1) >> 1;
    if ap {
        buf[pos - 2 * step] = (p1 + ((p2 + avg0 - (p1 << 1)) >> 1).clamp(-tc0, tc0)) as u8;
    }
    if aq {
        buf[pos + step] = (q1 + ((q2 + avg0 - (q1 << 1)) >> 1).clamp(-tc0, tc0)) as u8;
    }
}

fn chroma_bs4_line(buf: &mut [u8], pos: usize, step: usize, alpha: u8, beta: u8) {
    let p0 = buf[pos - step] as i32;
    let p1 = buf[pos - 2 * step] as i32;
    let q0 = buf[pos] as i32;
    let q1 = buf[pos + step] as i32;
    if !gate(p1, p0, q0, q1, alpha as i32, beta as i32) {
        return;
    }
    buf[pos - step] = (((p1 << 1) + p0 + q1 + 2) >> 2) as u8;
    buf[pos] = (((q1 << 1) + q0 + p1 + 2) >> 2) as u8;
}

fn chroma_bslt4_line(buf: &mut [u8], pos: usize, step: usize, alpha: u8, beta: u8, tc: i32) {
    let p0 = buf[pos - step] as i32;
    let p1 = buf[pos - 2 * step] as i32;
    let q0 = buf[pos] as i32;
    let q1 = buf[pos + step] as i32;
    if !gate(p1, p0, q0, q1, alpha as i32, beta as i32) {
        return;
    }
    let delta = ((((q0 - p0) << 2) + (p1 - q1) + 4) >> 3).clamp(-tc, tc);
    buf[pos - step] = clip_pixel(p0 + delta);
    buf[pos] = clip_pixel(q0 - delta);
}

pub fn deblk_luma_vert_bs4(buf: &mut [u8], off: usize, stride: usize, alpha: u8, beta: u8) {
    for row in 0..16 {
        luma_bs4_line(buf, off + row * stride, 1, alpha, beta);
    }
}

pub fn deblk_luma_horz_bs4(buf: &mut [u8], off: usize, stride: usize, alpha: u8, beta: u8) {
    for col in 0..16 {
        luma_bs4_line(buf, off + col, stride, alpha, beta);
    }
}

#[allow(clippy::too_many_arguments)]
pub fn deblk_luma_vert_bslt4(
    buf: &mut [u8],
    off: usize,
    stride: usize,
    alpha: u8,
    beta: u8,
    bs: BoundaryStrength,
    cliptab: &Cliptab,
) {
    for (group, &s) in bs.0.iter().enumerate() {
        if s == 0 {
            continue;
        }
        let tc0 = cliptab[usize::from(s.min(4))] as i32;
        for row in group * 4..group * 4 + 4 {
            luma_bslt4_line(buf, off + row * stride, 1, alpha, beta, tc0);
        }
    }
}

#[allow(clippy::too_many_arguments)]
pub fn deblk_luma_horz_bslt4(
    buf: &mut [u8],
    off: usize,
    stride: usize,
    alpha: u8,
    beta: u8,
    bs: BoundaryStrength,
    cliptab: &Cliptab,
) {
    for (group, &s) in bs.0.iter().enumerate() {
        if s == 0 {
            continue;
        }
        let tc0 = cliptab[usize::from(s.min(4))] as i32;
        for col in group * 4..group * 4 + 4 {
            luma_bslt4_line(buf, off + col, stride, alpha, beta, tc0);
        }
    }
}

/// Vertical luma edge of one field macroblock in an MBAFF pair: 8 rows.
pub fn deblk_luma_vert_bs4_mbaff(buf: &mut [u8], off: usize, stride: usize, alpha: u8, beta: u8) {
    for row in 0..8 {
        luma_bs4_line(buf, off + row * stride, 1, alpha, beta);
    }
}

/// 8 rows, two per strength group. A group whose clip value reads as a
/// negative `i8` is skipped along with `bs == 0` groups.
#[allow(clippy::too_many_arguments)]
pub fn deblk_luma_vert_bslt4_mbaff(
    buf: &mut [u8],
    off: usize,
    stride: usize,
    alpha: u8,
    beta: u8,
    bs: BoundaryStrength,
    cliptab: &Cliptab,
) {
    for (group, &s) in bs.0.iter().enumerate() {
        if s == 0 {
            continue;
        }
        let clip = cliptab[usize::from(s.min(4))];
        if (clip as i8) < 0 {
            continue;
        }
        for row in group * 2..group * 2 + 2 {
            luma_bslt4_line(buf, off + row * stride, 1, alpha, beta, clip as i32);
        }
    }
}

pub fn deblk_chroma_vert_bs4(
    buf: &mut [u8],
    off: usize,
    stride: usize,
    alpha: ChromaPair<u8>,
    beta: ChromaPair<u8>,
) {
    for row in 0..8 {
        for plane in 0..2 {
            let pos = off + row * stride + plane;
            chroma_bs4_line(buf, pos, 2, alpha.plane(plane), beta.plane(plane));
        }
    }
}

pub fn deblk_chroma_horz_bs4(
    buf: &mut [u8],
    off: usize,
    stride: usize,
    alpha: ChromaPair<u8>,
    beta: ChromaPair<u8>,
) {
    for col in 0..16 {
        let plane = col & 1;
        chroma_bs4_line(buf, off + col, stride, alpha.plane(plane), beta.plane(plane));
    }
}

pub fn deblk_chroma_vert_bs4_mbaff(
    buf: &mut [u8],
    off: usize,
    stride: usize,
    alpha: ChromaPair<u8>,
    beta: ChromaPair<u8>,
) {
    for row in 0..4 {
        for plane in 0..2 {
            let pos = off + row * stride + plane;
            chroma_bs4_line(buf, pos, 2, alpha.plane(plane), beta.plane(plane));
        }
    }
}

#[allow(clippy::too_many_arguments)]
fn chroma_bslt4_edge(
    buf: &mut [u8],
    off: usize,
    stride: usize,
    alpha: ChromaPair<u8>,
    beta: ChromaPair<u8>,
    bs: BoundaryStrength,
    cliptab: ChromaPair<&Cliptab>,
    vertical: bool,
    per_group: usize,
) {
    for (group, &s) in bs.0.iter().enumerate() {
        if s == 0 {
            continue;
        }
        let idx = usize::from(s.min(4));
        for n in group * per_group..(group + 1) * per_group {
            for plane in 0..2 {
                let tc = cliptab.plane(plane)[idx] as i32 + 1;
                let (pos, step) = if vertical {
                    (off + n * stride + plane, 2)
                } else {
                    (off + 2 * n + plane, stride)
                };
                chroma_bslt4_line(buf, pos, step, alpha.plane(plane), beta.plane(plane), tc);
            }
        }
    }
}

#[allow(clippy::too_many_arguments)]
pub fn deblk_chroma_vert_bslt4(
    buf: &mut [u8],
    off: usize,
    stride: usize,
    alpha: ChromaPair<u8>,
    beta: ChromaPair<u8>,
    bs: BoundaryStrength,
    cliptab: ChromaPair<&Cliptab>,
) {
    chroma_bslt4_edge(buf, off, stride, alpha, beta, bs, cliptab, true, 2);
}

#[allow(clippy::too_many_arguments)]
pub fn deblk_chroma_horz_bslt4(
    buf: &mut [u8],
    off: usize,
    stride: usize,
    alpha: ChromaPair<u8>,
    beta: ChromaPair<u8>,
    bs: BoundaryStrength,
    cliptab: ChromaPair<&Cliptab>,
) {
    chroma_bslt4_edge(buf, off, stride, alpha, beta, bs, cliptab, false, 2);
}

#[allow(clippy::too_many_arguments)]
pub fn deblk_chroma_vert_bslt4_mbaff(
    buf: &mut [u8],
    off: usize,
    stride: usize,
    alpha: ChromaPair<u8>,
    beta: ChromaPair<u8>,
    bs: BoundaryStrength,
    cliptab: ChromaPair<&Cliptab>,
) {
    chroma_bslt4_edge(buf, off, stride, alpha, beta, bs, cliptab, true, 1);
}
