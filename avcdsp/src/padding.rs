//! Border extension for reference planes so motion compensation may read
//! past the picture edge.
//!
//! `off` is the first sample of the edge row or column being replicated.

/// Copies the row at `off` into the `pad` rows above it.
pub fn pad_top(buf: &mut [u8], off: usize, stride: usize, width: usize, pad: usize) {
    for r in 1..=pad {
        buf.copy_within(off..off + width, off - r * stride);
    }
}

/// Copies the row at `off` into the `pad` rows below it.
pub fn pad_bottom(buf: &mut [u8], off: usize, stride: usize, width: usize, pad: usize) {
    for r in 1..=pad {
        buf.copy_within(off..off + width, off + r * stride);
    }
}

pub fn pad_left_luma(buf: &mut [u8], off: usize, stride: usize, height: usize, pad: usize) {
    for y in 0..height {
        let row = off + y * stride;
        let v = buf[row];
        buf[row - pad..row].fill(v);
    }
}

pub fn pad_right_luma(buf: &mut [u8], off: usize, stride: usize, height: usize, pad: usize) {
    for y in 0..height {
        let row = off + y * stride;
        let v = buf[row];
        buf[row + 1..row + 1 + pad].fill(v);
    }
}

/// `off` is the U byte of the leftmost pair; `pad` counts pairs.
pub fn pad_left_chroma(buf: &mut [u8], off: usize, stride: usize, height: usize, pad: usize) {
    for y in 0..height {
        let row = off + y * stride;
        let (u, v) = (buf[row], buf[row + 1]);
        for pair in buf[row - 2 * pad..row].chunks_exact_mut(2) {
            pair[0] = u;
            pair[1] = v;
        }
    }
}

/// `off` is the U byte of the rightmost pair; `pad` counts pairs.
pub fn pad_right_chroma(buf: &mut [u8], off: usize, stride: usize, height: usize, pad: usize) {
    for y in 0..height {
        let row = off + y * stride;
        let (u, v) = (buf[row], buf[row + 1]);
        for pair in buf[row + 2..row + 2 + 2 * pad].chunks_exact_mut(2) {
            pair[0] = u;
            pair[1] = v;
        }
    }
}

/// A plane stored with `border` samples on every side.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaddedPlane {
    pub data: Vec<u8>,
    pub width: usize,
    pub height: usize,
    pub border: usize,
    pub stride: usize,
}

impl PaddedPlane {
    pub fn new(width: usize, height: usize, border: usize) -> Self {
        let stride = width + 2 * border;
        Self {
            data: vec![0; stride * (height + 2 * border)],
            width,
            height,
            border,
            stride,
        }
    }

    /// Offset of picture sample (0, 0).
    pub fn origin(&self) -> usize {
        self.border * self.stride + self.border
    }

    pub fn load(&mut self, plane: &[u8]) {
        let origin = self.origin();
        for y in 0..self.height {
            let dst = origin + y * self.stride;
            self.data[dst..dst + self.width]
                .copy_from_slice(&plane[y * self.width..(y + 1) * self.width]);
        }
    }
}

/// Pads all four sides of a luma plane: left and right first, then whole
/// rows so the corners take the corner sample.
pub fn pad_frame(plane: &mut PaddedPlane) {
    let (w, h, b, stride) = (plane.width, plane.height, plane.border, plane.stride);
    let origin = plane.origin();
    pad_left_luma(&mut plane.data, origin, stride, h, b);
    pad_right_luma(&mut plane.data, origin + w - 1, stride, h, b);
    let first = origin - b;
    let last = first + (h - 1) * stride;
    pad_top(&mut plane.data, first, stride, stride, b);
    pad_bottom(&mut plane.data, last, stride, stride, b);
}

/// Same as [`pad_frame`] for interleaved UV; `width` and `border` count
/// bytes and must be even.
pub fn pad_frame_chroma(plane: &mut PaddedPlane) {
    let (w, h, b, stride) = (plane.width, plane.height, plane.border, plane.stride);
    debug_assert!(w % 2 == 0 && b % 2 == 0);
    let origin = plane.origin();
    pad_left_chroma(&mut plane.data, origin, stride, h, b / 2);
    pad_right_chroma(&mut plane.data, origin + w - 2, stride, h, b / 2);
    let first = origin - b;
    let last = first + (h - 1) * stride;
    pad_top(&mut plane.data, first, stride, stride, b);
    pad_bottom(&mut plane.data, last, stride, stride, b);
}

#[cfg(test)]
#[allow(clippy::needless_range_loop)]
mod tests {
    use super::*;

    #[test]
    fn rows_replicate_up_and_down() {
        let stride = 6;
        let mut buf = vec![0u8; stride * 7];
        for x in 0..4 {
            buf[3 * stride + 1 + x] = 10 + x as u8;
        }
        pad_top(&mut buf, 3 * stride + 1, stride, 4, 2);
        pad_bottom(&mut buf, 3 * stride + 1, stride, 4, 3);
        for y in 1..7 {
            for x in 0..4 {
                assert_eq!(buf[y * stride + 1 + x], 10 + x as u8, "pixel ({}, {})", x, y);
            }
        }
        assert_eq!(buf[1], 0);
        assert_eq!(buf[3 * stride + 5], 0);
    }

    #[test]
    fn columns_replicate_sideways() {
        let stride = 10;
        let mut buf = vec![0u8; stride * 2];
        buf[3] = 7;
        buf[6] = 9;
        buf[stride + 3] = 1;
        buf[stride + 6] = 2;
        pad_left_luma(&mut buf, 3, stride, 2, 3);
        pad_right_luma(&mut buf, 6, stride, 2, 3);
        assert_eq!(&buf[..stride], &[7, 7, 7, 7, 0, 0, 9, 9, 9, 9]);
        assert_eq!(&buf[stride..], &[1, 1, 1, 1, 0, 0, 2, 2, 2, 2]);
    }

    #[test]
    fn chroma_replicates_pairs() {
        let stride = 12;
        let mut buf = vec![0u8; stride];
        buf[4] = 1;
        buf[5] = 2;
        buf[6] = 3;
        buf[7] = 4;
        pad_left_chroma(&mut buf, 4, stride, 1, 2);
        pad_right_chroma(&mut buf, 6, stride, 1, 2);
        assert_eq!(buf, vec![1, 2, 1, 2, 1, 2, 3, 4, 3, 4, 3, 4]);
    }

    #[test]
    fn frame_corners_take_corner_samples() {
        let mut plane = PaddedPlane::new(4, 3, 2);
        let src: Vec<u8> = (0..12).map(|i| i as u8 * 10).collect();
        plane.load(&src);
        pad_frame(&mut plane);
        let s = plane.stride;
        assert_eq!(plane.data[0], 0);
        assert_eq!(plane.data[s - 1], 30);
        assert_eq!(plane.data[(plane.height + 3) * s], 80);
        assert_eq!(plane.data[(plane.height + 4) * s - 1], 110);
        // left border of the middle row
        assert_eq!(plane.data[3 * s], 40);
        assert_eq!(plane.data[3 * s + 1], 40);
    }

    #[test]
    fn chroma_frame_padding_keeps_planes() {
        let mut plane = PaddedPlane::new(4, 2, 4);
        plane.load(&[1, 101, 2, 102, 3, 103, 4, 104]);
        pad_frame_chroma(&mut plane);
        for (i, &p) in plane.data.iter().enumerate() {
            let x = i % plane.stride;
            let y = i / plane.stride;
            let row_base = if y < plane.border + 1 { 1 } else { 3 };
            let want = match (x < plane.border + 2, x & 1) {
                (true, 0) => row_base,
                (true, _) => row_base + 100,
                (false, 0) => row_base + 1,
                (false, _) => row_base + 101,
            };
            assert_eq!(p, want as u8, "byte ({}, {})", x, y);
        }
    }
}
