use std::path::{Path, PathBuf};

use clap::{Parser, ValueEnum};
use dome_buffer::aggregate::{self, BufferRequest};
use dome_buffer::color::{ColorScheme, Gradient, Palette};
use dome_buffer::config::BufferConfig;
use dome_buffer::extract::InputKind;
use dome_buffer::{Error, buffer};
use walkdir::WalkDir;

#[derive(Clone, Copy, ValueEnum)]
enum Colors {
    Gradient,
    Palette,
}

/// Stepped half-dome buffers around KML/KMZ/GeoJSON polygons.
#[derive(Parser)]
struct Cli {
    /// Input file, or a directory searched recursively
    path: PathBuf,
    /// Buffer size such as 10m, 0.5km, 2nm or 100ft (repeatable)
    #[arg(short, long = "size", default_values_t = ["10m".to_string(), "50m".to_string(), "0.1km".to_string()])]
    sizes: Vec<String>,
    /// Number of altitude levels
    #[arg(short, long, default_value_t = 10)]
    altitudes: usize,
    /// Maximum altitude in meters
    #[arg(long)]
    max_altitude: Option<f64>,
    /// Keep the buffers of each source polygon separate
    #[arg(long)]
    no_merge: bool,
    #[arg(long, value_enum, default_value_t = Colors::Gradient)]
    colors: Colors,
    #[arg(long, default_value_t = buffer::DEFAULT_QUADRANT_SEGMENTS)]
    quadrant_segments: u32,
    /// Output file (single input only)
    #[arg(short, long)]
    output: Option<PathBuf>,
    /// Process buffer sizes in parallel
    #[arg(long)]
    parallel: bool,
}

fn inputs(path: &Path) -> Vec<PathBuf> {
    if !path.is_dir() {
        return vec![path.to_path_buf()];
    }
    WalkDir::new(path)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|e| match e {
            Ok(e) => Some(e),
            Err(err) => {
                log::warn!("{}", err);
                None
            }
        })
        .filter(|e| e.file_type().is_file() && InputKind::from_path(e.path()).is_some())
        .filter(|e| !e.file_name().to_string_lossy().ends_with("_dome_buffers.kml"))
        .map(|e| e.into_path())
        .collect()
}

fn main() {
    env_logger::init();
    let args = Cli::parse();

    let scheme: Box<dyn ColorScheme> = match args.colors {
        Colors::Gradient => Box::new(Gradient),
        Colors::Palette => Box::new(Palette::default()),
    };
    let requests: Vec<BufferRequest> = aggregate::requests(&args.sizes, scheme.as_ref());
    if requests.is_empty() {
        log::error!("{}", Error::NoBufferSizes);
        std::process::exit(1);
    }
    let config = BufferConfig {
        altitude_count: args.altitudes,
        merge: !args.no_merge,
        quadrant_segments: args.quadrant_segments,
        parallel: args.parallel,
        ..BufferConfig::default()
    }
    .with_max_altitude(args.max_altitude);
    log::info!(
        "sizes: {}, levels: {}, merge: {}",
        requests.iter().map(|r| r.label.as_str()).collect::<Vec<_>>().join(", "),
        config.altitude_count,
        config.merge
    );

    let files = inputs(&args.path);
    if files.is_empty() {
        log::error!("no input found in {}", args.path.display());
        std::process::exit(1);
    }
    let output = if files.len() == 1 { args.output.as_deref() } else { None };
    let mut failures = 0;
    for file in &files {
        match aggregate::process_path(file, output, &requests, &config) {
            Ok(written) => println!("{}", written.display()),
            Err(e) => {
                log::error!("{}: {}", file.display(), e);
                failures += 1;
            }
        }
    }
    if failures > 0 {
        std::process::exit(1);
    }
}
