use std::collections::HashMap;

use kml::types::{
    AltitudeMode, Coord, Element, Folder, Geometry, LineString, LineStyle, LinearRing, Placemark,
    PolyStyle, Polygon, Style,
};
use kml::{Kml, KmlDocument, KmlWriter};

use crate::aggregate::{BufferPayload, LabeledBuffer};
use crate::buffer::{BufferResult, group_by_altitude};
use crate::error::Result;
use crate::point::{Ring, WGS84Point};

const SOURCE_STYLE: &str = "source";

fn style_id(index: usize) -> String {
    format!("buffer{}", index)
}

fn name(s: &str) -> Kml {
    Kml::Element(Element {
        name: "name".to_string(),
        attrs: HashMap::new(),
        content: Some(s.to_string()),
        children: Vec::new(),
    })
}

fn folder(title: &str, mut elements: Vec<Kml>) -> Kml {
    elements.insert(0, name(title));
    Kml::Folder(Folder {
        elements,
        ..Default::default()
    })
}

fn coords(points: &[WGS84Point]) -> Vec<Coord> {
    points
        .iter()
        .map(|p| Coord {
            x: p.lon,
            y: p.lat,
            z: p.ele,
        })
        .collect()
}

fn styles(buffers: &[LabeledBuffer]) -> Vec<Kml> {
    let mut ret = vec![Kml::Style(Style {
        id: Some(SOURCE_STYLE.to_string()),
        line: Some(LineStyle {
            color: "ff000000".to_string(),
            width: 1.0,
            ..Default::default()
        }),
        poly: Some(PolyStyle {
            color: "64808080".to_string(),
            fill: true,
            outline: true,
            ..Default::default()
        }),
        ..Default::default()
    })];
    for (i, b) in buffers.iter().enumerate() {
        ret.push(Kml::Style(Style {
            id: Some(style_id(i)),
            line: Some(LineStyle {
                color: b.color.to_kml(),
                width: 2.0,
                ..Default::default()
            }),
            ..Default::default()
        }));
    }
    ret
}

fn source(index: usize, wgs: &[WGS84Point]) -> Kml {
    let mut points = wgs.to_vec();
    if let (Some(first), Some(last)) = (points.first(), points.last()) {
        if first != last {
            points.push(first.clone());
        }
    }
    Kml::Placemark(Placemark {
        name: Some(format!("Source polygon {}", index + 1)),
        style_url: Some(format!("#{}", SOURCE_STYLE)),
        geometry: Some(Geometry::Polygon(Polygon {
            outer: LinearRing {
                coords: coords(&points),
                ..Default::default()
            },
            inner: Vec::new(),
            ..Default::default()
        })),
        ..Default::default()
    })
}

fn contour(title: String, style: &str, ring: &Ring) -> Kml {
    Kml::Placemark(Placemark {
        name: Some(title),
        style_url: Some(format!("#{}", style)),
        geometry: Some(Geometry::LineString(LineString {
            coords: coords(&ring.points),
            altitude_mode: AltitudeMode::RelativeToGround,
            ..Default::default()
        })),
        ..Default::default()
    })
}

fn levels<'a>(rings: impl IntoIterator<Item = &'a Ring>, prefix: &str, style: &str) -> Vec<Kml> {
    group_by_altitude(rings)
        .into_iter()
        .map(|(altitude, group)| {
            let placemarks = group
                .iter()
                .enumerate()
                .map(|(i, ring)| contour(format!("{} {}", prefix, i + 1), style, ring))
                .collect();
            folder(&format!("Altitude {:.1}m", altitude), placemarks)
        })
        .collect()
}

fn buffer(index: usize, buffer: &LabeledBuffer) -> Kml {
    let style = style_id(index);
    let elements = match &buffer.result {
        BufferResult::Merged(rings) => levels(rings, "Merged contour", &style),
        BufferResult::PerSource(pairs) => pairs
            .iter()
            .enumerate()
            .filter(|(_, (_, rings))| !rings.is_empty())
            .map(|(i, (_, rings))| {
                folder(
                    &format!("Source polygon {}", i + 1),
                    levels(rings, "Contour", &style),
                )
            })
            .collect(),
    };
    folder(&format!("Buffer {}", buffer.label), elements)
}

/// KML 2.2 document: source polygons, then one folder per buffer size.
pub fn document(title: &str, payload: &BufferPayload) -> Kml {
    let mut elements = vec![name(title)];
    elements.extend(styles(&payload.buffers));
    elements.push(folder(
        "Source polygons",
        payload
            .sources
            .iter()
            .enumerate()
            .map(|(i, p)| source(i, &p.wgs))
            .collect(),
    ));
    for (i, b) in payload.buffers.iter().enumerate() {
        if b.result.is_empty() {
            log::warn!("buffer {}: no ring generated", b.label);
            continue;
        }
        elements.push(buffer(i, b));
    }

    let mut attrs = HashMap::new();
    attrs.insert(
        "xmlns".to_string(),
        "http://www.opengis.net/kml/2.2".to_string(),
    );
    Kml::KmlDocument(KmlDocument {
        attrs,
        elements: vec![Kml::Document {
            attrs: HashMap::new(),
            elements,
        }],
        ..Default::default()
    })
}

pub fn render(title: &str, payload: &BufferPayload) -> Result<String> {
    let mut buf = Vec::new();
    KmlWriter::from_writer(&mut buf).write(&document(title, payload))?;
    Ok(String::from_utf8_lossy(&buf).into_owned())
}
