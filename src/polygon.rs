use geo::{Coord, HasDimensions, LineString, Validation};

use crate::point::{WGS84BoundingBox, WGS84Point};

/// Exterior boundary of a source polygon, in WGS84. Holes are not read.
#[derive(Clone, Debug, PartialEq)]
pub struct SourcePolygon {
    pub wgs: Vec<WGS84Point>,
}

impl SourcePolygon {
    pub fn from_lonlat(coords: &[(f64, f64)]) -> Self {
        SourcePolygon {
            wgs: coords
                .iter()
                .map(|(lon, lat)| WGS84Point::new(*lon, *lat))
                .collect(),
        }
    }

    pub fn info(&self) {
        log::debug!("polygon: len: {}", self.wgs.len());
        if let Some(b) = self.wgsbbox() {
            log::debug!("polygon: wgs bbox: {}", b);
        }
    }

    pub fn wgsbbox(&self) -> Option<WGS84BoundingBox> {
        let first = self.wgs.first()?;
        let init = WGS84BoundingBox::from(first, first);
        Some(self.wgs.iter().fold(init, |b, p| b.extend(p)))
    }

    /// Closed geo polygon in lon/lat degrees.
    pub fn to_geo(&self) -> geo::Polygon {
        let mut coords: Vec<Coord<f64>> = self
            .wgs
            .iter()
            .map(|p| Coord { x: p.lon, y: p.lat })
            .collect();
        if let (Some(first), Some(last)) = (coords.first(), coords.last()) {
            if first != last {
                coords.push(*first);
            }
        }
        geo::Polygon::new(LineString::new(coords), vec![])
    }

    /// Non-empty and not self-intersecting.
    pub fn is_valid(&self) -> bool {
        if self.wgs.len() < 3 {
            return false;
        }
        let geo = self.to_geo();
        !geo.is_empty() && geo.is_valid()
    }
}

/// Arithmetic mean latitude over every vertex of the closed boundaries.
pub fn mean_latitude(polygons: &[SourcePolygon]) -> f64 {
    let (sum, n) = polygons
        .iter()
        .flat_map(|p| p.to_geo().exterior().0.clone())
        .fold((0f64, 0usize), |(sum, n), c| (sum + c.y, n + 1));
    if n == 0 { 0.0 } else { sum / n as f64 }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn square(lon: f64, lat: f64, size: f64) -> SourcePolygon {
        SourcePolygon::from_lonlat(&[
            (lon, lat),
            (lon + size, lat),
            (lon + size, lat + size),
            (lon, lat + size),
            (lon, lat),
        ])
    }

    #[test]
    fn test_valid_square() {
        assert!(square(2.0, 48.0, 0.01).is_valid());
    }

    #[test]
    fn test_bowtie_is_invalid() {
        let p = SourcePolygon::from_lonlat(&[(0.0, 0.0), (1.0, 1.0), (1.0, 0.0), (0.0, 1.0)]);
        assert!(!p.is_valid());
    }

    #[test]
    fn test_too_short_is_invalid() {
        let p = SourcePolygon::from_lonlat(&[(0.0, 0.0), (1.0, 1.0)]);
        assert!(!p.is_valid());
    }

    #[test]
    fn test_to_geo_closes_ring() {
        let p = SourcePolygon::from_lonlat(&[(0.0, 0.0), (1.0, 0.0), (1.0, 1.0)]);
        let g = p.to_geo();
        assert_eq!(g.exterior().0.len(), 4);
        assert_eq!(g.exterior().0.first(), g.exterior().0.last());
    }

    #[test]
    fn test_mean_latitude() {
        // closed ring: 0, 0, 2, 2, 0 -> mean 0.8
        let p = square(10.0, 0.0, 2.0);
        assert!((mean_latitude(&[p]) - 0.8).abs() < 1e-12);
        assert_eq!(mean_latitude(&[]), 0.0);
    }
}
