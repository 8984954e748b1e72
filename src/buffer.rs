use std::f64::consts::FRAC_PI_2;

use geo::algorithm::bool_ops::unary_union;
use geo::algorithm::buffer::{Buffer, BufferStyle, LineJoin};
use geo::{HasDimensions, MultiPolygon, Validation};

use crate::altitude::horizontal_offset;
use crate::error::{Error, Result};
use crate::point::Ring;
use crate::polygon::SourcePolygon;
use crate::projection::WebMercatorProjection;

/// Segments per quarter circle used to approximate rounded corners.
pub const DEFAULT_QUADRANT_SEGMENTS: u32 = 16;

#[derive(Clone, Debug)]
pub enum BufferResult {
    /// Union of every source's offset, ascending by altitude.
    Merged(Vec<Ring>),
    /// Offsets kept per source polygon, in source order.
    PerSource(Vec<(SourcePolygon, Vec<Ring>)>),
}

impl BufferResult {
    pub fn ring_count(&self) -> usize {
        match self {
            BufferResult::Merged(rings) => rings.len(),
            BufferResult::PerSource(pairs) => pairs.iter().map(|(_, r)| r.len()).sum(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.ring_count() == 0
    }

    /// Every ring regardless of source, in output order.
    pub fn rings(&self) -> Vec<&Ring> {
        match self {
            BufferResult::Merged(rings) => rings.iter().collect(),
            BufferResult::PerSource(pairs) => pairs.iter().flat_map(|(_, r)| r.iter()).collect(),
        }
    }
}

/// Groups rings by altitude, ascending, keeping ring order inside a level.
pub fn group_by_altitude<'a>(rings: impl IntoIterator<Item = &'a Ring>) -> Vec<(f64, Vec<&'a Ring>)> {
    let mut groups: Vec<(f64, Vec<&Ring>)> = Vec::new();
    for ring in rings {
        match groups.iter_mut().find(|(alt, _)| *alt == ring.altitude) {
            Some((_, group)) => group.push(ring),
            None => groups.push((ring.altitude, vec![ring])),
        }
    }
    groups.sort_by(|a, b| a.0.total_cmp(&b.0));
    groups
}

pub struct BufferEngine {
    projection: WebMercatorProjection,
    quadrant_segments: u32,
}

impl BufferEngine {
    pub fn new(quadrant_segments: u32) -> Result<Self> {
        Ok(BufferEngine {
            projection: WebMercatorProjection::make()?,
            quadrant_segments: quadrant_segments.max(1),
        })
    }

    /// Stacked dome rings for `polygons`. `radius_m` is the corrected radius in
    /// projected meters. Failures are logged and the affected ring is dropped.
    pub fn run(
        &self,
        polygons: &[SourcePolygon],
        radius_m: f64,
        altitudes: &[f64],
        merge: bool,
    ) -> BufferResult {
        let radius_m = radius_m.max(0.0);
        let valid: Vec<&SourcePolygon> = polygons
            .iter()
            .filter(|p| {
                let ok = p.is_valid();
                if !ok {
                    log::warn!("skipping invalid polygon ({} points)", p.wgs.len());
                }
                ok
            })
            .collect();
        if merge {
            BufferResult::Merged(self.merged(&valid, radius_m, altitudes))
        } else {
            BufferResult::PerSource(self.per_source(&valid, radius_m, altitudes))
        }
    }

    fn merged(&self, polygons: &[&SourcePolygon], radius_m: f64, altitudes: &[f64]) -> Vec<Ring> {
        let projected: Vec<geo::Polygon> = polygons
            .iter()
            .filter_map(|p| match self.projection.project_polygon(p) {
                Ok(g) => Some(g),
                Err(e) => {
                    log::warn!("skipping polygon: {}", e);
                    None
                }
            })
            .collect();

        let mut ret = Vec::new();
        for &alt in altitudes {
            let h = horizontal_offset(radius_m, alt);
            let offsets: Vec<MultiPolygon> = projected
                .iter()
                .filter_map(|p| match self.offset(p, h) {
                    Ok(m) if !m.is_empty() => Some(m),
                    Ok(_) => None,
                    Err(e) => {
                        log::warn!("offset failed (alt={:.1}m): {}", alt, e);
                        None
                    }
                })
                .collect();
            if offsets.is_empty() {
                continue;
            }
            let merged = if offsets.len() == 1 {
                offsets.into_iter().next().unwrap_or_else(|| MultiPolygon::new(vec![]))
            } else {
                unary_union(offsets.iter())
            };
            log::trace!("alt {:.1}m: offset {:.1}m, {} part(s)", alt, h, merged.0.len());
            ret.extend(self.rings(&merged, alt));
        }
        ret
    }

    fn per_source(
        &self,
        polygons: &[&SourcePolygon],
        radius_m: f64,
        altitudes: &[f64],
    ) -> Vec<(SourcePolygon, Vec<Ring>)> {
        let mut ret = Vec::new();
        for (i, polygon) in polygons.iter().enumerate() {
            let mut rings = Vec::new();
            match self.projection.project_polygon(polygon) {
                Ok(projected) => {
                    for &alt in altitudes {
                        let h = horizontal_offset(radius_m, alt);
                        match self.offset(&projected, h) {
                            Ok(m) => rings.extend(self.rings(&m, alt)),
                            Err(e) => {
                                log::warn!("polygon {}: offset failed (alt={:.1}m): {}", i + 1, alt, e)
                            }
                        }
                    }
                }
                Err(e) => log::warn!("polygon {}: {}", i + 1, e),
            }
            ret.push(((*polygon).clone(), rings));
        }
        ret
    }

    /// Outward offset of a projected polygon. A zero distance returns it as is.
    pub fn offset(&self, polygon: &geo::Polygon, distance: f64) -> Result<MultiPolygon> {
        if !distance.is_finite() {
            return Err(Error::Geometry(format!("offset distance {} is not finite", distance)));
        }
        if distance <= 0.0 {
            return Ok(MultiPolygon::new(vec![polygon.clone()]));
        }
        let angle = FRAC_PI_2 / self.quadrant_segments as f64;
        let style = BufferStyle::new(distance).line_join(LineJoin::Round(angle));
        Ok(polygon.buffer_with_style(style))
    }

    fn rings(&self, parts: &MultiPolygon, altitude: f64) -> Vec<Ring> {
        parts
            .iter()
            .filter(|part| {
                let ok = !part.is_empty() && part.is_valid();
                if !ok {
                    log::debug!("dropping invalid part at {:.1}m", altitude);
                }
                ok
            })
            .filter_map(|part| match self.projection.unproject_ring(part, altitude) {
                Ok(ring) if !ring.points.is_empty() => Some(ring),
                Ok(_) => None,
                Err(e) => {
                    log::warn!("reprojection failed (alt={:.1}m): {}", altitude, e);
                    None
                }
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::altitude;
    use geo::Area;

    fn square(lon: f64, lat: f64, size: f64) -> SourcePolygon {
        SourcePolygon::from_lonlat(&[
            (lon, lat),
            (lon + size, lat),
            (lon + size, lat + size),
            (lon, lat + size),
            (lon, lat),
        ])
    }

    fn engine() -> BufferEngine {
        BufferEngine::new(DEFAULT_QUADRANT_SEGMENTS).unwrap()
    }

    #[test]
    fn test_offset_area() {
        let e = engine();
        let p = geo::Polygon::new(
            vec![(0.0, 0.0), (100.0, 0.0), (100.0, 100.0), (0.0, 100.0), (0.0, 0.0)].into(),
            vec![],
        );
        let m = e.offset(&p, 10.0).unwrap();
        assert_eq!(m.0.len(), 1);
        let expected = 100.0 * 100.0 + 4.0 * 100.0 * 10.0 + std::f64::consts::PI * 100.0;
        let area = m.unsigned_area();
        assert!((area - expected).abs() / expected < 0.01, "area {}", area);
    }

    #[test]
    fn test_zero_offset_is_identity() {
        let e = engine();
        let p = geo::Polygon::new(
            vec![(0.0, 0.0), (10.0, 0.0), (10.0, 10.0), (0.0, 0.0)].into(),
            vec![],
        );
        let m = e.offset(&p, 0.0).unwrap();
        assert_eq!(m.0, vec![p]);
    }

    #[test]
    fn test_non_finite_offset_is_rejected() {
        let p = geo::Polygon::new(
            vec![(0.0, 0.0), (10.0, 0.0), (10.0, 10.0), (0.0, 0.0)].into(),
            vec![],
        );
        assert!(matches!(engine().offset(&p, f64::NAN), Err(Error::Geometry(_))));
        assert!(matches!(engine().offset(&p, f64::INFINITY), Err(Error::Geometry(_))));
    }

    #[test]
    fn test_zero_radius_returns_input() {
        let source = square(2.35, 48.85, 0.001);
        for merge in [true, false] {
            let result = engine().run(&[source.clone()], 0.0, &altitude::sample(0.0, None, 5), merge);
            let rings = result.rings();
            assert_eq!(rings.len(), 1);
            let ring = rings[0];
            assert_eq!(ring.altitude, 0.0);
            for p in &source.wgs {
                assert!(ring.points.iter().any(|q| {
                    (q.lon - p.lon).abs() < 1e-9 && (q.lat - p.lat).abs() < 1e-9
                }));
            }
            for q in &ring.points {
                assert!(source.wgs.iter().any(|p| {
                    (q.lon - p.lon).abs() < 1e-9 && (q.lat - p.lat).abs() < 1e-9
                }));
            }
        }
    }

    #[test]
    fn test_rings_grow_outward() {
        let source = square(2.35, 48.85, 0.001);
        let result = engine().run(&[source.clone()], 50.0, &[0.0], true);
        let rings = result.rings();
        assert_eq!(rings.len(), 1);
        let outer = SourcePolygon { wgs: rings[0].points.clone() }.wgsbbox().unwrap();
        let inner = source.wgsbbox().unwrap();
        assert!(outer.min.lon < inner.min.lon && outer.max.lon > inner.max.lon);
        assert!(outer.min.lat < inner.min.lat && outer.max.lat > inner.max.lat);
    }

    #[test]
    fn test_altitude_above_radius_does_not_fail() {
        let source = square(2.35, 48.85, 0.001);
        let result = engine().run(&[source], 10.0, &[10.0, 25.0], false);
        match result {
            BufferResult::PerSource(pairs) => {
                assert_eq!(pairs.len(), 1);
                assert_eq!(pairs[0].1.len(), 2);
            }
            BufferResult::Merged(_) => panic!("expected per-source result"),
        }
    }

    #[test]
    fn test_invalid_polygons_are_skipped() {
        let bowtie = SourcePolygon::from_lonlat(&[(0.0, 0.0), (0.01, 0.01), (0.01, 0.0), (0.0, 0.01)]);
        let result = engine().run(&[bowtie, square(2.35, 48.85, 0.001)], 20.0, &[0.0, 10.0], false);
        match result {
            BufferResult::PerSource(pairs) => assert_eq!(pairs.len(), 1),
            BufferResult::Merged(_) => panic!("expected per-source result"),
        }
    }

    #[test]
    fn test_merge_never_adds_parts() {
        let a = square(2.35, 48.85, 0.001);
        let b = square(2.3512, 48.85, 0.001);
        let altitudes = altitude::sample(150.0, None, 4);
        let merged = engine().run(&[a.clone(), b.clone()], 150.0, &altitudes, true);
        let separate = engine().run(&[a, b], 150.0, &altitudes, false);
        let merged = group_by_altitude(merged.rings());
        let separate = group_by_altitude(separate.rings());
        assert_eq!(merged.len(), separate.len());
        for ((alt_m, m), (alt_s, s)) in merged.iter().zip(separate.iter()) {
            assert_eq!(alt_m, alt_s);
            assert!(m.len() <= s.len());
        }
        // wide enough to overlap at the ground level
        assert_eq!(merged[0].1.len(), 1);
        assert_eq!(separate[0].1.len(), 2);
    }

    #[test]
    fn test_group_by_altitude() {
        let r = |alt: f64| Ring::new(alt, vec![]);
        let rings = vec![r(5.0), r(0.0), r(5.0), r(10.0)];
        let groups = group_by_altitude(&rings);
        let summary: Vec<(f64, usize)> = groups.iter().map(|(a, g)| (*a, g.len())).collect();
        assert_eq!(summary, vec![(0.0, 1), (5.0, 2), (10.0, 1)]);
    }
}
