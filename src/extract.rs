use std::collections::HashSet;
use std::io::{Cursor, Read};
use std::path::Path;

use crate::error::{Error, Result};
use crate::point::WGS84Point;
use crate::polygon::SourcePolygon;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum InputKind {
    Kml,
    Kmz,
    GeoJson,
}

impl InputKind {
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_lowercase();
        match ext.as_str() {
            "kml" => Some(InputKind::Kml),
            "kmz" => Some(InputKind::Kmz),
            "geojson" => Some(InputKind::GeoJson),
            _ => None,
        }
    }
}

/// One outer boundary and the text it is deduplicated by.
struct Boundary {
    key: String,
    points: Vec<WGS84Point>,
}

mod lockml {
    use super::*;
    use kml::Kml;
    use kml::types::{Geometry, Polygon};

    fn outer(polygon: &Polygon) -> Boundary {
        let coords = &polygon.outer.coords;
        let key = coords
            .iter()
            .map(|c| match c.z {
                Some(z) => format!("{},{},{}", c.x, c.y, z),
                None => format!("{},{}", c.x, c.y),
            })
            .collect::<Vec<String>>()
            .join(" ");
        let points = coords.iter().map(|c| WGS84Point::new(c.x, c.y)).collect();
        Boundary { key, points }
    }

    fn collect(kml: &Kml, out: &mut Vec<Boundary>) {
        match kml {
            Kml::KmlDocument(doc) => doc.elements.iter().for_each(|e| collect(e, out)),
            Kml::Document { elements, .. } => elements.iter().for_each(|e| collect(e, out)),
            Kml::Folder(z) => z.elements.iter().for_each(|e| collect(e, out)),
            Kml::Placemark(p) => match &p.geometry {
                Some(Geometry::Polygon(polygon)) => out.push(outer(polygon)),
                Some(Geometry::MultiGeometry(multi)) => {
                    for g in &multi.geometries {
                        if let Geometry::Polygon(polygon) = g {
                            out.push(outer(polygon));
                        }
                    }
                }
                _ => {}
            },
            _ => {}
        }
    }

    pub(super) fn read(content: &str) -> Result<Vec<Boundary>> {
        match content.parse::<Kml>() {
            Ok(kml) => {
                let mut boundaries = Vec::new();
                collect(&kml, &mut boundaries);
                Ok(boundaries)
            }
            Err(e) => {
                log::warn!("strict KML parse failed ({}), scanning coordinates", e);
                super::lenient::read(content)
            }
        }
    }
}

/// Tolerant scan of Placemark outer boundaries, used when the document does
/// not parse as a whole. A bad number drops only its own boundary.
mod lenient {
    use super::*;
    use quick_xml::Reader;
    use quick_xml::events::Event;

    const OUTER: [&str; 4] = ["Polygon", "outerBoundaryIs", "LinearRing", "coordinates"];

    fn is_outer_coordinates(stack: &[String]) -> bool {
        if stack.len() < OUTER.len() + 1 || !stack.ends_with(&OUTER.map(String::from)) {
            return false;
        }
        let parents = &stack[..stack.len() - OUTER.len()];
        match parents {
            [.., p] if p == "Placemark" => true,
            [.., p, m] if p == "Placemark" && m == "MultiGeometry" => true,
            _ => false,
        }
    }

    /// Tokens with fewer than two fields are ignored; `None` when a field is not a number.
    pub(super) fn parse_coordinates(text: &str) -> Option<Vec<WGS84Point>> {
        let mut points = Vec::new();
        for token in text.split_whitespace() {
            let fields: Vec<&str> = token.split(',').collect();
            if fields.len() < 2 {
                continue;
            }
            let lon: f64 = fields[0].parse().ok()?;
            let lat: f64 = fields[1].parse().ok()?;
            points.push(WGS84Point::new(lon, lat));
        }
        Some(points)
    }

    pub(super) fn read(content: &str) -> Result<Vec<Boundary>> {
        let mut reader = Reader::from_str(content);
        let mut stack: Vec<String> = Vec::new();
        let mut text: Option<String> = None;
        let mut out = Vec::new();
        loop {
            match reader.read_event() {
                Ok(Event::Start(e)) => {
                    let name = String::from_utf8_lossy(e.local_name().as_ref()).to_string();
                    stack.push(name);
                    if is_outer_coordinates(&stack) {
                        text = Some(String::new());
                    }
                }
                Ok(Event::Text(t)) => {
                    if let Some(buf) = text.as_mut() {
                        let s = t
                            .unescape()
                            .map_err(|e| Error::Extraction(e.to_string()))?;
                        buf.push_str(&s);
                    }
                }
                Ok(Event::End(_)) => {
                    if let Some(raw) = text.take() {
                        let key = raw.trim().to_string();
                        match parse_coordinates(&key) {
                            Some(points) => out.push(Boundary { key, points }),
                            None => log::warn!("skipping boundary with malformed coordinates"),
                        }
                    }
                    stack.pop();
                }
                Ok(Event::Eof) => break,
                Ok(_) => {}
                Err(e) => {
                    return Err(Error::Extraction(format!(
                        "XML error at {}: {}",
                        reader.buffer_position(),
                        e
                    )));
                }
            }
        }
        Ok(out)
    }
}

mod locjson {
    use super::*;
    use geojson::{GeoJson, Geometry, Value};

    fn ring(coords: &[Vec<f64>]) -> Boundary {
        let positions: Vec<&Vec<f64>> = coords.iter().filter(|p| p.len() >= 2).collect();
        let key = positions
            .iter()
            .map(|p| p.iter().map(|v| v.to_string()).collect::<Vec<_>>().join(","))
            .collect::<Vec<_>>()
            .join(" ");
        let points = positions.iter().map(|p| WGS84Point::new(p[0], p[1])).collect();
        Boundary { key, points }
    }

    fn geometry_boundaries(geometry: &Geometry, out: &mut Vec<Boundary>) {
        match &geometry.value {
            Value::Polygon(rings) => {
                if let Some(exterior) = rings.first() {
                    out.push(ring(exterior));
                }
            }
            Value::MultiPolygon(polygons) => {
                for rings in polygons {
                    if let Some(exterior) = rings.first() {
                        out.push(ring(exterior));
                    }
                }
            }
            _ => {}
        }
    }

    pub(super) fn read(content: &str) -> Result<Vec<Boundary>> {
        let geojson: GeoJson = content
            .parse()
            .map_err(|e: geojson::Error| Error::Extraction(e.to_string()))?;
        let mut boundaries = Vec::new();
        match geojson {
            GeoJson::FeatureCollection(collection) => {
                for feature in &collection.features {
                    if let Some(geometry) = &feature.geometry {
                        geometry_boundaries(geometry, &mut boundaries);
                    }
                }
            }
            GeoJson::Feature(feature) => {
                if let Some(geometry) = &feature.geometry {
                    geometry_boundaries(geometry, &mut boundaries);
                }
            }
            GeoJson::Geometry(geometry) => geometry_boundaries(&geometry, &mut boundaries),
        }
        Ok(boundaries)
    }
}

/// UTF-8 when possible, otherwise every byte as its Latin-1 code point.
pub fn decode(bytes: &[u8]) -> String {
    match std::str::from_utf8(bytes) {
        Ok(s) => s.to_string(),
        Err(_) => {
            log::debug!("input is not UTF-8, decoding as Latin-1");
            bytes.iter().map(|&b| b as char).collect()
        }
    }
}

/// The KML document inside a KMZ: `doc.kml` if present, else the first `.kml` entry.
pub fn kmz_document(bytes: &[u8]) -> Result<Vec<u8>> {
    let mut archive = zip::ZipArchive::new(Cursor::new(bytes))
        .map_err(|e| Error::Extraction(format!("not a KMZ archive: {}", e)))?;
    let names: Vec<String> = archive.file_names().map(|s| s.to_string()).collect();
    let name = names
        .iter()
        .find(|n| n.to_lowercase() == "doc.kml")
        .or_else(|| names.iter().find(|n| n.to_lowercase().ends_with(".kml")))
        .ok_or_else(|| Error::Extraction("no .kml entry in KMZ".to_string()))?
        .clone();
    log::debug!("kmz: reading {}", name);
    let mut entry = archive
        .by_name(&name)
        .map_err(|e| Error::Extraction(format!("{}: {}", name, e)))?;
    let mut content = Vec::new();
    entry.read_to_end(&mut content)?;
    Ok(content)
}

/// Drops boundaries with fewer than 3 points and repeated coordinate text.
fn dedup(boundaries: Vec<Boundary>) -> Vec<SourcePolygon> {
    let mut seen: HashSet<String> = HashSet::new();
    boundaries
        .into_iter()
        .filter(|b| b.points.len() >= 3)
        .filter(|b| seen.insert(b.key.clone()))
        .map(|b| SourcePolygon { wgs: b.points })
        .collect()
}

pub fn read_bytes(bytes: &[u8], kind: InputKind) -> Result<Vec<SourcePolygon>> {
    let boundaries = match kind {
        InputKind::Kml => lockml::read(&decode(bytes))?,
        InputKind::Kmz => lockml::read(&decode(&kmz_document(bytes)?))?,
        InputKind::GeoJson => locjson::read(&decode(bytes))?,
    };
    Ok(dedup(boundaries))
}

/// Best effort: any failure is logged and yields no polygons.
pub fn extract(bytes: &[u8], kind: InputKind) -> Vec<SourcePolygon> {
    match read_bytes(bytes, kind) {
        Ok(polygons) => polygons,
        Err(e) => {
            log::warn!("{}", e);
            Vec::new()
        }
    }
}

pub fn read_path(path: &Path) -> Vec<SourcePolygon> {
    let Some(kind) = InputKind::from_path(path) else {
        log::warn!("unsupported file type: {}", path.display());
        return Vec::new();
    };
    match std::fs::read(path) {
        Ok(bytes) => extract(&bytes, kind),
        Err(e) => {
            log::warn!("{}: {}", path.display(), e);
            Vec::new()
        }
    }
}
