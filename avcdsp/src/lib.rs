#![forbid(unsafe_code)]

pub mod deblock;
pub mod error;
pub mod hadamard;
pub mod interp;
pub mod intra;
pub mod kernels;
pub mod padding;
pub mod pipeline;
pub mod recon;
pub mod reconstructor;
#[cfg(feature = "simd")]
pub mod simd;
pub mod tables;
pub mod transform;
pub mod weighted;
pub mod y4m;

pub use error::DspError;
pub use kernels::{Backend, Dsp, SCALAR};
pub use pipeline::{FrameStats, FrameType, Reconstructed};
pub use reconstructor::{Reconstructor, average_psnr, reconstruct_sequence};

pub const DEFAULT_QP: u8 = 26;
pub const DEFAULT_KEYINT: usize = 25;

#[derive(Debug, Clone)]
pub struct DspConfig {
    pub qp: u8,
    pub backend: Backend,
    pub deblock: bool,
    pub alpha_offset: i8,
    pub beta_offset: i8,
    pub transform_8x8: bool,
    /// Intra frame interval; 0 codes only the first frame as intra.
    pub keyint: usize,
}

impl Default for DspConfig {
    fn default() -> Self {
        Self {
            qp: DEFAULT_QP,
            backend: Backend::Scalar,
            deblock: true,
            alpha_offset: 0,
            beta_offset: 0,
            transform_8x8: false,
            keyint: DEFAULT_KEYINT,
        }
    }
}

#[inline]
pub(crate) fn clip_pixel(v: i32) -> u8 {
    v.clamp(0, 255) as u8
}

pub fn reconstruct_y4m(data: &[u8], config: &DspConfig) -> Result<(y4m::Y4mHeader, Vec<Reconstructed>), DspError> {
    let (header, frames) = y4m::FramePixels::all_from_y4m(data)?;
    let out = reconstruct_sequence(&frames, config)?;
    Ok((header, out))
}

/// Reconstructs a Y4M stream and serializes the decoded frames back to Y4M.
pub fn reconstruct_y4m_to_y4m(data: &[u8], config: &DspConfig) -> Result<Vec<u8>, DspError> {
    let (header, out) = reconstruct_y4m(data, config)?;
    let frames: Vec<_> = out.into_iter().map(|r| r.frame).collect();
    let mut buf = Vec::new();
    y4m::write_y4m(&mut buf, &header, &frames)?;
    Ok(buf)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::y4m::{FramePixels, Y4mHeader};

    fn stream(frames: &[FramePixels]) -> Vec<u8> {
        let header = Y4mHeader {
            width: frames[0].width,
            height: frames[0].height,
            ..Default::default()
        };
        let mut out = Vec::new();
        y4m::write_y4m(&mut out, &header, frames).unwrap();
        out
    }

    #[test]
    fn clip_pixel_saturates() {
        assert_eq!(clip_pixel(-5), 0);
        assert_eq!(clip_pixel(77), 77);
        assert_eq!(clip_pixel(300), 255);
    }

    #[test]
    fn default_config() {
        let config = DspConfig::default();
        assert_eq!(config.qp, DEFAULT_QP);
        assert_eq!(config.keyint, DEFAULT_KEYINT);
        assert!(config.deblock);
        assert!(!config.transform_8x8);
        assert_eq!(config.backend, Backend::Scalar);
    }

    #[test]
    fn y4m_round_trip_keeps_header_and_frame_count() {
        let frames = vec![FramePixels::grid(32, 32, 8, 0), FramePixels::grid(32, 32, 8, 1)];
        let out = reconstruct_y4m_to_y4m(&stream(&frames), &DspConfig::default()).unwrap();
        let (header, decoded) = FramePixels::all_from_y4m(&out).unwrap();
        assert_eq!((header.width, header.height), (32, 32));
        assert_eq!(decoded.len(), 2);
    }

    #[test]
    fn y4m_with_bad_dimensions_is_rejected() {
        let frames = vec![FramePixels::solid(24, 16, 128, 128, 128)];
        let err = reconstruct_y4m(&stream(&frames), &DspConfig::default()).unwrap_err();
        assert!(matches!(err, DspError::InvalidDimensions { width: 24, height: 16 }));
    }

    #[test]
    fn wide_backend_requires_feature() {
        let config = DspConfig {
            backend: Backend::Wide,
            ..Default::default()
        };
        let result = Reconstructor::new(16, 16, config);
        if cfg!(feature = "simd") {
            assert!(result.is_ok());
        } else {
            assert!(matches!(result, Err(DspError::UnsupportedBackend(_))));
        }
    }
}
