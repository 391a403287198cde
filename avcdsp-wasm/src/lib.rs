#![forbid(unsafe_code)]

use avcdsp::y4m::FramePixels;
use avcdsp::{DspConfig, FrameType, Reconstructor};
use wasm_bindgen::prelude::*;

#[wasm_bindgen]
pub struct WasmReconstructor {
    inner: Reconstructor,
    last_intra: bool,
    last_frame_number: u64,
    last_psnr: [f64; 3],
}

#[wasm_bindgen]
impl WasmReconstructor {
    #[wasm_bindgen(constructor)]
    pub fn new(
        width: u32,
        height: u32,
        qp: u8,
        keyint: usize,
        deblock: bool,
        transform_8x8: bool,
    ) -> Result<WasmReconstructor, JsError> {
        let config = DspConfig {
            qp,
            keyint,
            deblock,
            transform_8x8,
            ..Default::default()
        };
        let inner = Reconstructor::new(width, height, config).map_err(|e| JsError::new(&e.to_string()))?;
        Ok(WasmReconstructor {
            inner,
            last_intra: false,
            last_frame_number: 0,
            last_psnr: [0.0; 3],
        })
    }

    /// Reconstructs one frame and returns its planes concatenated as Y, U, V.
    pub fn reconstruct_frame(&mut self, y: &[u8], u: &[u8], v: &[u8]) -> Result<Vec<u8>, JsError> {
        let frame = FramePixels {
            y: y.to_vec(),
            u: u.to_vec(),
            v: v.to_vec(),
            width: self.inner.width(),
            height: self.inner.height(),
        };
        let chroma = frame.chroma_width() * frame.chroma_height();
        if y.len() != (frame.width * frame.height) as usize || u.len() != chroma || v.len() != chroma {
            return Err(JsError::new("plane sizes do not match the frame dimensions"));
        }
        self.inner
            .send_frame(&frame)
            .map_err(|e| JsError::new(&e.to_string()))?;
        let out = self
            .inner
            .receive_frame()
            .ok_or_else(|| JsError::new("no reconstructed frame"))?;
        self.last_intra = out.stats.frame_type == FrameType::Intra;
        self.last_frame_number = self.inner.frames_sent() - 1;
        self.last_psnr = [out.stats.psnr_y, out.stats.psnr_u, out.stats.psnr_v];

        let mut planes = out.frame.y;
        planes.extend_from_slice(&out.frame.u);
        planes.extend_from_slice(&out.frame.v);
        Ok(planes)
    }

    pub fn is_intra(&self) -> bool {
        self.last_intra
    }

    pub fn frame_number(&self) -> u64 {
        self.last_frame_number
    }

    pub fn psnr_y(&self) -> f64 {
        self.last_psnr[0]
    }

    pub fn psnr_u(&self) -> f64 {
        self.last_psnr[1]
    }

    pub fn psnr_v(&self) -> f64 {
        self.last_psnr[2]
    }

    pub fn width(&self) -> u32 {
        self.inner.width()
    }

    pub fn height(&self) -> u32 {
        self.inner.height()
    }
}

/// Reconstructs a whole Y4M stream with default settings at `qp`.
#[wasm_bindgen]
pub fn reconstruct_y4m(data: &[u8], qp: u8) -> Result<Vec<u8>, JsError> {
    let config = DspConfig {
        qp,
        ..Default::default()
    };
    avcdsp::reconstruct_y4m_to_y4m(data, &config).map_err(|e| JsError::new(&e.to_string()))
}
