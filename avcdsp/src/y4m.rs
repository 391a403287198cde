use std::io::Write;
use std::path::Path;

use crate::error::DspError;

/// One planar 4:2:0 picture.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FramePixels {
    pub y: Vec<u8>,
    pub u: Vec<u8>,
    pub v: Vec<u8>,
    pub width: u32,
    pub height: u32,
}

/// Stream parameters from the `YUV4MPEG2` header line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Y4mHeader {
    pub width: u32,
    pub height: u32,
    pub fps_num: u32,
    pub fps_den: u32,
}

impl Default for Y4mHeader {
    fn default() -> Self {
        Self {
            width: 0,
            height: 0,
            fps_num: 25,
            fps_den: 1,
        }
    }
}

fn bad(msg: impl Into<String>) -> DspError {
    DspError::InvalidY4m(msg.into())
}

impl Y4mHeader {
    pub fn parse(line: &str) -> Result<Self, DspError> {
        let mut tokens = line.split_whitespace();
        if tokens.next() != Some("YUV4MPEG2") {
            return Err(bad("missing YUV4MPEG2 signature"));
        }
        let mut header = Self::default();
        for token in tokens {
            let (key, val) = token.split_at(1);
            match key {
                "W" => header.width = val.parse().map_err(|_| bad(format!("width {val:?}")))?,
                "H" => header.height = val.parse().map_err(|_| bad(format!("height {val:?}")))?,
                "F" => {
                    let (num, den) = val
                        .split_once(':')
                        .ok_or_else(|| bad(format!("frame rate {val:?}")))?;
                    header.fps_num = num.parse().map_err(|_| bad(format!("frame rate {val:?}")))?;
                    header.fps_den = den.parse().map_err(|_| bad(format!("frame rate {val:?}")))?;
                }
                "C" if !val.starts_with("420") => {
                    return Err(bad(format!("colorspace {val} (only 4:2:0 is supported)")));
                }
                _ => {}
            }
        }
        if header.width == 0 || header.height == 0 {
            return Err(bad("missing W/H"));
        }
        Ok(header)
    }

    fn chroma_size(&self) -> usize {
        self.width.div_ceil(2) as usize * self.height.div_ceil(2) as usize
    }

    fn frame_size(&self) -> usize {
        (self.width * self.height) as usize + 2 * self.chroma_size()
    }
}

impl FramePixels {
    /// Reads every frame of a Y4M stream.
    pub fn all_from_y4m(data: &[u8]) -> Result<(Y4mHeader, Vec<Self>), DspError> {
        let header_end = data
            .iter()
            .position(|&b| b == b'\n')
            .ok_or_else(|| bad("no header line"))?;
        let line = std::str::from_utf8(&data[..header_end]).map_err(|_| bad("header is not UTF-8"))?;
        let header = Y4mHeader::parse(line)?;

        let luma = (header.width * header.height) as usize;
        let chroma = header.chroma_size();
        let mut frames = Vec::new();
        let mut pos = header_end + 1;

        while pos < data.len() {
            if !data[pos..].starts_with(b"FRAME") {
                return Err(bad(format!("expected FRAME at byte {pos}")));
            }
            // frame headers may carry their own parameters
            let line_end = data[pos..]
                .iter()
                .position(|&b| b == b'\n')
                .ok_or_else(|| bad("unterminated FRAME header"))?;
            let start = pos + line_end + 1;
            let end = start + header.frame_size();
            if end > data.len() {
                return Err(bad(format!("truncated frame {}", frames.len())));
            }
            let body = &data[start..end];
            frames.push(Self {
                y: body[..luma].to_vec(),
                u: body[luma..luma + chroma].to_vec(),
                v: body[luma + chroma..].to_vec(),
                width: header.width,
                height: header.height,
            });
            pos = end;
        }

        Ok((header, frames))
    }

    pub fn all_from_y4m_file(path: &Path) -> Result<(Y4mHeader, Vec<Self>), DspError> {
        let data = std::fs::read(path)?;
        Self::all_from_y4m(&data)
    }

    pub fn from_y4m(data: &[u8]) -> Result<Self, DspError> {
        let (_, mut frames) = Self::all_from_y4m(data)?;
        if frames.is_empty() {
            return Err(bad("no frames"));
        }
        Ok(frames.swap_remove(0))
    }

    pub fn solid(width: u32, height: u32, y: u8, u: u8, v: u8) -> Self {
        let chroma = width.div_ceil(2) as usize * height.div_ceil(2) as usize;
        Self {
            y: vec![y; (width * height) as usize],
            u: vec![u; chroma],
            v: vec![v; chroma],
            width,
            height,
        }
    }

    /// Synthetic test picture: diagonal luma gradient with a checker of
    /// `cell`-sized squares, and horizontal/vertical chroma ramps. `phase`
    /// shifts the pattern right by that many luma samples.
    pub fn grid(width: u32, height: u32, cell: u32, phase: u32) -> Self {
        let cell = cell.max(1);
        let mut y = Vec::with_capacity((width * height) as usize);
        for row in 0..height {
            for col in 0..width {
                let x = col + width - phase % width.max(1);
                let base = (x + row) * 160 / (width + height).max(1);
                let check = ((x / cell) + (row / cell)) % 2 * 48;
                y.push((base + check + 24).min(255) as u8);
            }
        }
        let (cw, ch) = (width.div_ceil(2), height.div_ceil(2));
        let mut u = Vec::with_capacity((cw * ch) as usize);
        let mut v = Vec::with_capacity((cw * ch) as usize);
        for row in 0..ch {
            for col in 0..cw {
                u.push((64 + col * 128 / cw.max(1)) as u8);
                v.push((64 + row * 128 / ch.max(1)) as u8);
            }
        }
        Self {
            y,
            u,
            v,
            width,
            height,
        }
    }

    pub fn chroma_width(&self) -> usize {
        self.width.div_ceil(2) as usize
    }

    pub fn chroma_height(&self) -> usize {
        self.height.div_ceil(2) as usize
    }

    /// U and V as one interleaved plane (`u0 v0 u1 v1 ...`).
    pub fn interleaved_uv(&self) -> Vec<u8> {
        interleave_uv(&self.u, &self.v)
    }

    pub fn set_interleaved_uv(&mut self, uv: &[u8]) {
        let (u, v) = deinterleave_uv(uv);
        self.u = u;
        self.v = v;
    }
}

pub fn interleave_uv(u: &[u8], v: &[u8]) -> Vec<u8> {
    debug_assert_eq!(u.len(), v.len());
    u.iter().zip(v).flat_map(|(&a, &b)| [a, b]).collect()
}

pub fn deinterleave_uv(uv: &[u8]) -> (Vec<u8>, Vec<u8>) {
    uv.chunks_exact(2).map(|p| (p[0], p[1])).unzip()
}

pub fn write_y4m<W: Write>(out: &mut W, header: &Y4mHeader, frames: &[FramePixels]) -> Result<(), DspError> {
    writeln!(
        out,
        "YUV4MPEG2 W{} H{} F{}:{} Ip A1:1 C420jpeg",
        header.width, header.height, header.fps_num, header.fps_den
    )?;
    for frame in frames {
        if frame.width != header.width || frame.height != header.height {
            return Err(DspError::DimensionMismatch {
                expected_w: header.width,
                expected_h: header.height,
                got_w: frame.width,
                got_h: frame.height,
            });
        }
        out.write_all(b"FRAME\n")?;
        out.write_all(&frame.y)?;
        out.write_all(&frame.u)?;
        out.write_all(&frame.v)?;
    }
    Ok(())
}
