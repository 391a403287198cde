use std::env;
use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

use avcdsp::y4m::{FramePixels, write_y4m};
use avcdsp::{DspConfig, average_psnr, reconstruct_sequence};

fn print_usage() {
    eprintln!("Usage: reconstruct_y4m <input.y4m> <output.y4m> [options]");
    eprintln!();
    eprintln!("Options:");
    eprintln!("  --qp N           Quantization parameter (0-51, default: 26)");
    eprintln!("  --keyint N       Intra frame interval (default: 25)");
    eprintln!("  --8x8            Use the 8x8 transform for inter macroblocks");
    eprintln!("  --no-deblock     Skip the deblocking filter");
}

fn main() {
    let args: Vec<String> = env::args().collect();
    if args.len() < 3 {
        print_usage();
        return;
    }

    let input_path = &args[1];
    let output_path = &args[2];

    let mut config = DspConfig::default();
    let mut i = 3;
    while i < args.len() {
        match args[i].as_str() {
            "--qp" => {
                i += 1;
                config.qp = args[i].parse().expect("invalid qp value");
            }
            "--keyint" => {
                i += 1;
                config.keyint = args[i].parse().expect("invalid keyint value");
            }
            "--8x8" => config.transform_8x8 = true,
            "--no-deblock" => config.deblock = false,
            other => {
                eprintln!("Unknown option: {}", other);
                print_usage();
                return;
            }
        }
        i += 1;
    }

    println!("Loading frames from {}...", input_path);
    let (header, frames) = FramePixels::all_from_y4m_file(Path::new(input_path)).expect("Failed to load y4m");
    println!("Loaded {} frames ({}x{})", frames.len(), header.width, header.height);

    println!(
        "Reconstructing (qp={}, keyint={}, 8x8={}, deblock={})...",
        config.qp, config.keyint, config.transform_8x8, config.deblock
    );
    let results = reconstruct_sequence(&frames, &config).expect("reconstruction failed");

    for (n, r) in results.iter().enumerate() {
        println!(
            "frame {:>4} {:?}: Y {:.2} U {:.2} V {:.2}",
            n, r.stats.frame_type, r.stats.psnr_y, r.stats.psnr_u, r.stats.psnr_v
        );
    }

    println!("Writing to {}...", output_path);
    let decoded: Vec<_> = results.iter().map(|r| r.frame.clone()).collect();
    let mut out = BufWriter::new(File::create(output_path).expect("Failed to create output"));
    write_y4m(&mut out, &header, &decoded).expect("Failed to write y4m");

    let (y, u, v) = average_psnr(&results);
    println!("Done! average PSNR Y {:.2} U {:.2} V {:.2}", y, u, v);
}
