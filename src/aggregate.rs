use std::path::{Path, PathBuf};

use rayon::prelude::*;

use crate::altitude;
use crate::buffer::{BufferEngine, BufferResult};
use crate::color::{Color, ColorScheme};
use crate::config::BufferConfig;
use crate::error::{Error, Result};
use crate::extract;
use crate::kml_writer;
use crate::polygon::{self, SourcePolygon};
use crate::projection::latitude_correction;
use crate::units::parse_buffer_sizes;

#[derive(Clone, Debug, PartialEq)]
pub struct BufferRequest {
    pub label: String,
    pub distance_km: f64,
    pub color: Color,
}

/// Parses user sizes, dropping invalid and repeated labels, and colors them.
pub fn requests<S: AsRef<str>>(inputs: &[S], scheme: &dyn ColorScheme) -> Vec<BufferRequest> {
    let mut parsed: Vec<(String, f64)> = Vec::new();
    for (label, km) in parse_buffer_sizes(inputs) {
        if parsed.iter().any(|(l, _)| *l == label) {
            log::warn!("ignoring repeated buffer size {}", label);
            continue;
        }
        parsed.push((label, km));
    }
    let max_distance = parsed.iter().map(|(_, km)| *km).fold(0f64, f64::max);
    parsed
        .into_iter()
        .enumerate()
        .map(|(i, (label, distance_km))| BufferRequest {
            color: scheme.color(i, distance_km, max_distance),
            label,
            distance_km,
        })
        .collect()
}

#[derive(Clone, Debug)]
pub struct LabeledBuffer {
    pub label: String,
    pub color: Color,
    pub radius_m: f64,
    pub altitudes: Vec<f64>,
    pub result: BufferResult,
}

/// Everything the document writer needs for one run.
#[derive(Clone, Debug)]
pub struct BufferPayload {
    pub sources: Vec<SourcePolygon>,
    pub buffers: Vec<LabeledBuffer>,
}

pub fn run(
    polygons: &[SourcePolygon],
    requests: &[BufferRequest],
    config: &BufferConfig,
) -> Result<BufferPayload> {
    let sources: Vec<SourcePolygon> = polygons.iter().filter(|p| p.is_valid()).cloned().collect();
    if sources.is_empty() {
        return Err(Error::NoPolygons);
    }
    if requests.is_empty() {
        return Err(Error::NoBufferSizes);
    }
    log::info!("{} valid polygon(s) of {}", sources.len(), polygons.len());
    for p in &sources {
        p.info();
    }

    let mean_latitude = polygon::mean_latitude(&sources);
    let correction = latitude_correction(mean_latitude);
    log::info!("mean latitude {:.4}, correction {:.4}", mean_latitude, correction);

    let one = |request: &BufferRequest| -> Result<LabeledBuffer> {
        let radius_m = (request.distance_km * correction * 1000.0).max(0.0);
        let altitudes = altitude::sample(radius_m, config.max_altitude_m, config.altitude_count);
        let engine = BufferEngine::new(config.quadrant_segments)?;
        let result = engine.run(&sources, radius_m, &altitudes, config.merge);
        log::info!(
            "buffer {}: radius {:.1}m, {} level(s), {} ring(s)",
            request.label,
            radius_m,
            altitudes.len(),
            result.ring_count()
        );
        Ok(LabeledBuffer {
            label: request.label.clone(),
            color: request.color,
            radius_m,
            altitudes,
            result,
        })
    };

    let buffers = if config.parallel {
        requests.par_iter().map(one).collect::<Result<Vec<_>>>()?
    } else {
        requests.iter().map(one).collect::<Result<Vec<_>>>()?
    };
    Ok(BufferPayload { sources, buffers })
}

pub fn default_output(input: &Path) -> PathBuf {
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_else(|| "output".to_string());
    input.with_file_name(format!("{}_dome_buffers.kml", stem))
}

/// Reads `input`, buffers it and writes the KML document. Returns the written path.
pub fn process_path(
    input: &Path,
    output: Option<&Path>,
    requests: &[BufferRequest],
    config: &BufferConfig,
) -> Result<PathBuf> {
    log::info!("processing {}", input.display());
    let polygons = extract::read_path(input);
    let payload = run(&polygons, requests, config)?;
    let name = input
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_default();
    let document = kml_writer::render(&name, &payload)?;
    let output = output.map(Path::to_path_buf).unwrap_or_else(|| default_output(input));
    std::fs::write(&output, document)?;
    log::info!("wrote {}", output.display());
    Ok(output)
}
