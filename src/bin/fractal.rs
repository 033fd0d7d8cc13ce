extern crate clap;
extern crate env_logger;
extern crate fractalzoom;
extern crate num_cpus;

use clap::{App, Arg, ArgMatches};
use fractalzoom::partition::MIN_FRAME_WIDTH;
use fractalzoom::{run_job, sink, FractalJob, ImageKind, RenderSettings};
use std::path::Path;
use std::str::FromStr;

fn validate_range<T: FromStr + Ord>(
    s: &str,
    low: T,
    high: T,
    isnotanumber_err: &str,
    isnotinrange_err: &str,
) -> Result<(), String> {
    match T::from_str(s) {
        Ok(i) => {
            if i >= low && i <= high {
                Ok(())
            } else {
                Err(isnotinrange_err.to_string())
            }
        }
        Err(_) => Err(isnotanumber_err.to_string()),
    }
}

const FRAME_WIDTH: &str = "frame_width";
const NUM_FRAMES: &str = "num_frames";
const WORKERS: &str = "workers";
const THREADS: &str = "threads";
const OUTPUT: &str = "output";
const FORMAT: &str = "format";

fn args<'a>() -> ArgMatches<'a> {
    let max_threads = num_cpus::get();

    App::new("fractal")
        .version(env!("CARGO_PKG_VERSION"))
        .author("Elf M. Sternberg <elf.sternberg@gmail.com>")
        .about("Renders a zoom into the Mandelbrot set, split across a group of workers")
        .arg(
            Arg::with_name(FRAME_WIDTH)
                .required(true)
                .index(1)
                .validator(|s| {
                    validate_range(
                        &s,
                        MIN_FRAME_WIDTH,
                        usize::max_value(),
                        "frame_width must be an integer",
                        &format!("frame_width must be at least {}", MIN_FRAME_WIDTH),
                    )
                })
                .help("Pixels per side of each frame"),
        )
        .arg(
            Arg::with_name(NUM_FRAMES)
                .required(true)
                .index(2)
                .validator(|s| {
                    validate_range(
                        &s,
                        1,
                        usize::max_value(),
                        "num_frames must be an integer",
                        "num_frames must be at least 1",
                    )
                })
                .help("Number of frames to render"),
        )
        .arg(
            Arg::with_name(WORKERS)
                .required(false)
                .long(WORKERS)
                .short("w")
                .takes_value(true)
                .default_value("1")
                .validator(|s| {
                    validate_range(
                        &s,
                        1,
                        usize::max_value(),
                        "Could not parse worker count",
                        "Worker count must be at least 1",
                    )
                })
                .help("Number of workers; must divide num_frames"),
        )
        .arg(
            Arg::with_name(THREADS)
                .required(false)
                .long(THREADS)
                .short("t")
                .takes_value(true)
                .default_value("1")
                .validator(move |s| {
                    validate_range(
                        &s,
                        1,
                        max_threads,
                        "Could not parse thread count",
                        &format!("Thread count must be between 1 and {}", max_threads),
                    )
                })
                .help("Threads per worker for rendering rows"),
        )
        .arg(
            Arg::with_name(OUTPUT)
                .required(false)
                .long(OUTPUT)
                .short("o")
                .takes_value(true)
                .default_value(".")
                .help("Directory the frames are written to"),
        )
        .arg(
            Arg::with_name(FORMAT)
                .required(false)
                .long(FORMAT)
                .short("f")
                .takes_value(true)
                .possible_values(&["bmp", "pgm"])
                .default_value("bmp")
                .help("Image format of the frames"),
        )
        .get_matches()
}

fn value<T: FromStr>(matches: &ArgMatches, name: &str) -> T {
    // Every argument read here has a default or is required, and has
    // already been through its validator.
    match matches.value_of(name).map(T::from_str) {
        Some(Ok(v)) => v,
        _ => {
            eprintln!("error: could not read {}", name);
            std::process::exit(1);
        }
    }
}

fn main() {
    env_logger::init();
    let matches = args();

    let width: usize = value(&matches, FRAME_WIDTH);
    let frames: usize = value(&matches, NUM_FRAMES);
    let workers: usize = value(&matches, WORKERS);
    let threads: usize = value(&matches, THREADS);
    let output = Path::new(matches.value_of(OUTPUT).unwrap_or("."));
    let kind = matches
        .value_of(FORMAT)
        .and_then(ImageKind::from_name)
        .unwrap_or(ImageKind::Bmp);

    println!("Fractal v{}", env!("CARGO_PKG_VERSION"));

    let job = match FractalJob::new(width, frames, workers) {
        Ok(job) => job,
        Err(e) => {
            eprintln!("error: {}", e);
            std::process::exit(1);
        }
    };
    println!("computing {} frames of {} by {} fractal", frames, width, width);

    let settings = RenderSettings {
        threads,
        ..RenderSettings::default()
    };

    match run_job(&job, &settings) {
        Err(ref e) if e.is_clean_abort() => {
            println!("Error: {}", e);
        }
        Err(e) => {
            eprintln!("Render failure: {}", e);
            std::process::exit(1);
        }
        Ok(done) => {
            println!("compute time: {:.4} s", done.compute_time.as_secs_f64());
            if sink::within_output_limits(&job) {
                if let Err(e) = sink::write_frames(output, &done.frames, kind) {
                    eprintln!("Output failure: {}", e);
                    std::process::exit(1);
                }
            }
        }
    }
}
