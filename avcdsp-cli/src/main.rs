#![forbid(unsafe_code)]

use std::env;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use std::process;

use avcdsp::y4m::{FramePixels, Y4mHeader, write_y4m};
use avcdsp::{Backend, DspConfig, FrameType, Reconstructor, average_psnr};
use log::{LevelFilter, Log, Metadata, Record};

struct StderrLogger;

impl Log for StderrLogger {
    fn enabled(&self, metadata: &Metadata<'_>) -> bool {
        metadata.level() <= log::max_level()
    }

    fn log(&self, record: &Record<'_>) {
        if self.enabled(record.metadata()) {
            eprintln!("[{:<5} {}] {}", record.level(), record.target(), record.args());
        }
    }

    fn flush(&self) {}
}

static LOGGER: StderrLogger = StderrLogger;

struct CliArgs {
    input: InputMode,
    output_path: Option<String>,
    config: DspConfig,
    frames: usize,
    verbosity: u8,
}

enum InputMode {
    Y4m(String),
    Solid { width: u32, height: u32, y: u8, u: u8, v: u8 },
    Grid { width: u32, height: u32 },
}

fn fail(msg: impl std::fmt::Display) -> ! {
    eprintln!("Error: {msg}");
    process::exit(1);
}

fn parse_value<T: std::str::FromStr>(flag: &str, value: Option<String>) -> T {
    let value = value.unwrap_or_default();
    value
        .parse()
        .unwrap_or_else(|_| fail(format!("invalid {flag} value: {value}")))
}

fn parse_cli() -> CliArgs {
    let mut positional = Vec::new();
    let mut output_path = None;
    let mut config = DspConfig::default();
    let mut frames = 1usize;
    let mut verbosity = 0u8;
    let mut pattern: Option<String> = None;

    let mut args = env::args().skip(1);
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "-o" => output_path = Some(args.next().unwrap_or_default()),
            "-q" => config.qp = parse_value("-q", args.next()),
            "--keyint" => config.keyint = parse_value("--keyint", args.next()),
            "--frames" => frames = parse_value("--frames", args.next()),
            "--8x8" => config.transform_8x8 = true,
            "--no-deblock" => config.deblock = false,
            "--alpha-offset" => config.alpha_offset = parse_value("--alpha-offset", args.next()),
            "--beta-offset" => config.beta_offset = parse_value("--beta-offset", args.next()),
            "--backend" => {
                let value = args.next().unwrap_or_default();
                config.backend = value.parse::<Backend>().unwrap_or_else(|e| fail(e));
            }
            "--pattern" => pattern = Some(args.next().unwrap_or_default()),
            "-v" => verbosity += 1,
            "-vv" => verbosity += 2,
            "-h" | "--help" => {
                print_usage();
                process::exit(0);
            }
            _ => positional.push(arg),
        }
    }

    let input = if positional.len() == 1 && positional[0].ends_with(".y4m") {
        InputMode::Y4m(positional[0].clone())
    } else if positional.len() == 2 && pattern.is_some() {
        let width = parse_value("width", Some(positional[0].clone()));
        let height = parse_value("height", Some(positional[1].clone()));
        match pattern.as_deref() {
            Some("grid") => InputMode::Grid { width, height },
            Some(p) => {
                eprintln!("Available patterns: grid");
                fail(format!("unknown pattern: {p}"));
            }
            None => unreachable!(),
        }
    } else if positional.len() == 5 {
        InputMode::Solid {
            width: parse_value("width", Some(positional[0].clone())),
            height: parse_value("height", Some(positional[1].clone())),
            y: parse_value("Y", Some(positional[2].clone())),
            u: parse_value("U", Some(positional[3].clone())),
            v: parse_value("V", Some(positional[4].clone())),
        }
    } else {
        print_usage();
        process::exit(1);
    };

    CliArgs {
        input,
        output_path: output_path.filter(|p| !p.is_empty()),
        config,
        frames: frames.max(1),
        verbosity,
    }
}

fn print_usage() {
    eprintln!("Usage: avcdsp <input.y4m> [-o <output.y4m>] [options]");
    eprintln!("       avcdsp <width> <height> <Y> <U> <V> [-o <output.y4m>] [options]");
    eprintln!("       avcdsp <width> <height> --pattern <name> [-o <output.y4m>] [options]");
    eprintln!();
    eprintln!("Options:");
    eprintln!("  -q <0-51>               Quantization parameter (default={})", avcdsp::DEFAULT_QP);
    eprintln!("  --keyint <N>            Intra frame interval, 0 for first only (default={})", avcdsp::DEFAULT_KEYINT);
    eprintln!("  --frames <N>            Frames to synthesize for generated input (default=1)");
    eprintln!("  --8x8                   Use the 8x8 transform for inter macroblocks");
    eprintln!("  --no-deblock            Disable the in-loop deblocking filter");
    eprintln!("  --alpha-offset <-12..12>  Deblocking alpha offset");
    eprintln!("  --beta-offset <-12..12>   Deblocking beta offset");
    eprintln!("  --backend <scalar|wide> Kernel implementation (default=scalar)");
    eprintln!("  --pattern <name>        Test pattern (grid)");
    eprintln!("  -v                      Log per-frame progress (-vv for debug)");
}

fn load_frames(cli: &CliArgs) -> (Y4mHeader, Vec<FramePixels>) {
    match &cli.input {
        InputMode::Y4m(path) => FramePixels::all_from_y4m_file(Path::new(path))
            .unwrap_or_else(|e| fail(format!("reading {path}: {e}"))),
        InputMode::Solid {
            width,
            height,
            y,
            u,
            v,
        } => {
            let header = Y4mHeader {
                width: *width,
                height: *height,
                ..Default::default()
            };
            (header, vec![FramePixels::solid(*width, *height, *y, *u, *v); cli.frames])
        }
        InputMode::Grid { width, height } => {
            let header = Y4mHeader {
                width: *width,
                height: *height,
                ..Default::default()
            };
            let frames = (0..cli.frames as u32)
                .map(|i| FramePixels::grid(*width, *height, 16, i))
                .collect();
            (header, frames)
        }
    }
}

fn main() {
    let cli = parse_cli();

    log::set_logger(&LOGGER).unwrap_or_else(|e| fail(e));
    log::set_max_level(match cli.verbosity {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        2 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    });

    let (header, frames) = load_frames(&cli);
    if frames.is_empty() {
        fail("no input frames");
    }

    let mut rec = Reconstructor::new(header.width, header.height, cli.config.clone())
        .unwrap_or_else(|e| fail(format!("creating reconstructor: {e}")));

    let mut results = Vec::with_capacity(frames.len());
    for (i, frame) in frames.iter().enumerate() {
        rec.send_frame(frame)
            .unwrap_or_else(|e| fail(format!("frame {i}: {e}")));
        while let Some(out) = rec.receive_frame() {
            let frame_type_str = match out.stats.frame_type {
                FrameType::Intra => "INTRA",
                FrameType::Inter => "INTER",
            };
            eprintln!(
                "frame {:>4}  {:>5}  Y {:>6.2} dB  U {:>6.2} dB  V {:>6.2} dB",
                i, frame_type_str, out.stats.psnr_y, out.stats.psnr_u, out.stats.psnr_v
            );
            results.push(out);
        }
    }

    if let Some(path) = &cli.output_path {
        let file = File::create(path).unwrap_or_else(|e| fail(format!("creating {path}: {e}")));
        let mut writer = BufWriter::new(file);
        let decoded: Vec<_> = results.iter().map(|r| r.frame.clone()).collect();
        write_y4m(&mut writer, &header, &decoded)
            .and_then(|()| writer.flush().map_err(Into::into))
            .unwrap_or_else(|e| fail(format!("writing {path}: {e}")));
    }

    let (y, u, v) = average_psnr(&results);
    eprintln!();
    eprintln!(
        "{} frames {}x{} (qp={}, keyint={}, 8x8={}, deblock={}, backend={}) avg PSNR Y {:.2} U {:.2} V {:.2}",
        results.len(),
        header.width,
        header.height,
        cli.config.qp,
        cli.config.keyint,
        cli.config.transform_8x8,
        cli.config.deblock,
        cli.config.backend,
        y,
        u,
        v
    );
}
