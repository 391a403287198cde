use avcdsp::y4m::FramePixels;
use avcdsp::{DspConfig, reconstruct_sequence};

fn create_test_frame(width: u32, height: u32, pixel_fn: impl Fn(u32, u32) -> (u8, u8, u8)) -> FramePixels {
    let mut frame = FramePixels::solid(width, height, 0, 0, 0);
    let cw = frame.chroma_width();
    for row in 0..height {
        for col in 0..width {
            let (y, u, v) = pixel_fn(col, row);
            frame.y[(row * width + col) as usize] = y;
            if row % 2 == 0 && col % 2 == 0 {
                let c = (row / 2) as usize * cw + (col / 2) as usize;
                frame.u[c] = u;
                frame.v[c] = v;
            }
        }
    }
    frame
}

fn main() {
    test_pattern("only_u_gradient", 320, 240, |col, _row| {
        let u = (col * 256 / 320) as u8;
        (128, u, 128)
    });

    test_pattern("failing_pattern", 320, 240, |col, row| {
        let y = ((row % 256) as u8).wrapping_add((col % 64) as u8).wrapping_mul(3);
        (y, 128, 128)
    });

    test_pattern("all_varying", 320, 240, |col, row| {
        let y = (row * 256 / 240) as u8;
        let u = (col * 256 / 320) as u8;
        let v = ((row + col) * 128 / 320) as u8;
        (y, u, v)
    });

    test_pattern("complex_640x480", 640, 480, |col, row| {
        let y = ((row % 256) as u8).wrapping_add((col % 64) as u8).wrapping_mul(3);
        let u = (col * 256 / 640) as u8;
        let v = (row * 256 / 480) as u8;
        (y, u, v)
    });
}

fn test_pattern(name: &str, w: u32, h: u32, f: impl Fn(u32, u32) -> (u8, u8, u8)) {
    let frame = create_test_frame(w, h, f);
    for qp in [12u8, 26, 40] {
        let config = DspConfig {
            qp,
            ..Default::default()
        };
        match reconstruct_sequence(std::slice::from_ref(&frame), &config) {
            Ok(out) => {
                let s = &out[0].stats;
                eprintln!(
                    "[qp {:>2}] {} ({}x{}): Y {:.2} U {:.2} V {:.2} dB, {} coded blocks, {} plane MBs",
                    qp, name, w, h, s.psnr_y, s.psnr_u, s.psnr_v, s.coded_blocks, s.intra_plane_mbs
                );
            }
            Err(e) => eprintln!("[FAIL] {} ({}x{}): {}", name, w, h, e),
        }
    }
}
