use log::info;

use crate::error::DspError;
use crate::kernels::{self, Dsp};
use crate::pipeline::{self, FrameType, Reconstructed};
use crate::tables::check_qp;
use crate::y4m::FramePixels;
use crate::DspConfig;

/// Feeds a sequence of frames through the reconstruction pipeline, keeping
/// the previous reconstruction as the inter reference.
pub struct Reconstructor {
    config: DspConfig,
    dsp: &'static dyn Dsp,
    width: u32,
    height: u32,
    frame_index: u64,
    reference: Option<FramePixels>,
    pending: Option<Reconstructed>,
}

impl Reconstructor {
    pub fn new(width: u32, height: u32, config: DspConfig) -> Result<Self, DspError> {
        pipeline::check_dimensions(width, height)?;
        check_qp(config.qp)?;
        let dsp = kernels::select(config.backend)?;
        Ok(Self {
            config,
            dsp,
            width,
            height,
            frame_index: 0,
            reference: None,
            pending: None,
        })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn config(&self) -> &DspConfig {
        &self.config
    }

    fn is_intra(&self) -> bool {
        self.reference.is_none()
            || (self.config.keyint > 0 && self.frame_index % self.config.keyint as u64 == 0)
    }

    pub fn send_frame(&mut self, pixels: &FramePixels) -> Result<(), DspError> {
        if pixels.width != self.width || pixels.height != self.height {
            return Err(DspError::DimensionMismatch {
                expected_w: self.width,
                expected_h: self.height,
                got_w: pixels.width,
                got_h: pixels.height,
            });
        }

        let reference = if self.is_intra() {
            None
        } else {
            self.reference.as_ref()
        };
        let out = pipeline::reconstruct_frame(self.dsp, pixels, reference, &self.config)?;

        info!(
            "frame {} {:?}: psnr y={:.2} u={:.2} v={:.2} coded={} dc_only={}",
            self.frame_index,
            out.stats.frame_type,
            out.stats.psnr_y,
            out.stats.psnr_u,
            out.stats.psnr_v,
            out.stats.coded_blocks,
            out.stats.dc_only_blocks
        );

        self.reference = Some(out.frame.clone());
        self.pending = Some(out);
        self.frame_index += 1;
        Ok(())
    }

    pub fn receive_frame(&mut self) -> Option<Reconstructed> {
        self.pending.take()
    }

    pub fn frames_sent(&self) -> u64 {
        self.frame_index
    }
}

/// Mean PSNR over a sequence, per plane. Lossless frames count as 100 dB.
pub fn average_psnr(results: &[Reconstructed]) -> (f64, f64, f64) {
    if results.is_empty() {
        return (0.0, 0.0, 0.0);
    }
    let cap = |p: f64| if p.is_finite() { p } else { 100.0 };
    let n = results.len() as f64;
    let (y, u, v) = results.iter().fold((0.0, 0.0, 0.0), |acc, r| {
        (
            acc.0 + cap(r.stats.psnr_y),
            acc.1 + cap(r.stats.psnr_u),
            acc.2 + cap(r.stats.psnr_v),
        )
    });
    (y / n, u / n, v / n)
}

pub fn reconstruct_sequence(frames: &[FramePixels], config: &DspConfig) -> Result<Vec<Reconstructed>, DspError> {
    let first = frames
        .first()
        .ok_or_else(|| DspError::InvalidY4m("no frames to reconstruct".to_string()))?;
    let mut rec = Reconstructor::new(first.width, first.height, config.clone())?;
    let mut out = Vec::with_capacity(frames.len());
    for frame in frames {
        rec.send_frame(frame)?;
        if let Some(r) = rec.receive_frame() {
            out.push(r);
        }
    }
    let intra = out.iter().filter(|r| r.stats.frame_type == FrameType::Intra).count();
    info!("reconstructed {} frames ({} intra)", out.len(), intra);
    Ok(out)
}
