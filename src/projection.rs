use geo::{Coord, LineString};
use proj4rs::proj::Proj;

use crate::error::{Error, Result};
use crate::point::{MercatorPoint, Ring, WGS84Point};
use crate::polygon::SourcePolygon;

/// Spherical (pseudo) Web Mercator, EPSG:3857.
pub struct WebMercatorProjection {
    wgs84_spec: Proj,
    dst_spec: Proj,
}

impl WebMercatorProjection {
    pub fn make() -> Result<WebMercatorProjection> {
        // Both ends share the 6378137 m sphere so no datum shift is applied,
        // which is how EPSG:3857 treats WGS84 latitudes.
        let spec = "+proj=merc +a=6378137 +b=6378137 +lon_0=0 +x_0=0 +y_0=0 +units=m +no_defs";
        let dst_spec = Proj::from_proj_string(spec).map_err(projection_error)?;

        let spec = "+proj=longlat +a=6378137 +b=6378137 +no_defs";
        let wgs84_spec = Proj::from_proj_string(spec).map_err(projection_error)?;
        Ok(WebMercatorProjection {
            wgs84_spec,
            dst_spec,
        })
    }

    pub fn project(&self, wgs: &WGS84Point) -> Result<MercatorPoint> {
        let mut p = (wgs.lon.to_radians(), wgs.lat.to_radians());
        proj4rs::transform::transform(&self.wgs84_spec, &self.dst_spec, &mut p)
            .map_err(projection_error)?;
        if !p.0.is_finite() || !p.1.is_finite() {
            return Err(Error::Projection(format!("{} is not projectable", wgs)));
        }
        Ok(MercatorPoint { x: p.0, y: p.1 })
    }

    pub fn unproject(&self, m: &MercatorPoint) -> Result<WGS84Point> {
        let mut p = (m.x, m.y);
        proj4rs::transform::transform(&self.dst_spec, &self.wgs84_spec, &mut p)
            .map_err(projection_error)?;
        Ok(WGS84Point::new(p.0.to_degrees(), p.1.to_degrees()))
    }

    pub fn project_polygon(&self, polygon: &SourcePolygon) -> Result<geo::Polygon> {
        let coords = polygon
            .to_geo()
            .exterior()
            .coords()
            .map(|c| {
                let m = self.project(&WGS84Point::new(c.x, c.y))?;
                Ok(Coord { x: m.x, y: m.y })
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(geo::Polygon::new(LineString::new(coords), vec![]))
    }

    /// Exterior boundary of a projected polygon, back in WGS84 and lifted to `altitude`.
    pub fn unproject_ring(&self, polygon: &geo::Polygon, altitude: f64) -> Result<Ring> {
        let points = polygon
            .exterior()
            .coords()
            .map(|c| self.unproject(&MercatorPoint { x: c.x, y: c.y }))
            .collect::<Result<Vec<_>>>()?;
        Ok(Ring::new(altitude, points))
    }
}

fn projection_error(e: proj4rs::errors::Error) -> Error {
    Error::Projection(format!("{:?}", e))
}

/// East-west stretch of the projection at `mean_latitude` (degrees).
/// Applied once per run; inputs spanning many degrees of latitude get the
/// error of a single mean correction.
pub fn latitude_correction(mean_latitude: f64) -> f64 {
    let c = mean_latitude.to_radians().cos();
    if c == 0.0 { 1.0 } else { 1.0 / c }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_origin() {
        let proj = WebMercatorProjection::make().unwrap();
        let m = proj.project(&WGS84Point::new(0.0, 0.0)).unwrap();
        assert!(m.x.abs() < 1e-6);
        assert!(m.y.abs() < 1e-6);
    }

    #[test]
    fn test_known_point() {
        // one degree of longitude on the equator of the 6378137 m sphere
        let proj = WebMercatorProjection::make().unwrap();
        let m = proj.project(&WGS84Point::new(1.0, 0.0)).unwrap();
        assert!((m.x - 111319.49079327357).abs() < 1e-3);
    }

    #[test]
    fn test_round_trip() {
        let proj = WebMercatorProjection::make().unwrap();
        for (lon, lat) in [(2.35, 48.85), (-69.14, 18.88), (151.2, -33.86)] {
            let w = WGS84Point::new(lon, lat);
            let back = proj.unproject(&proj.project(&w).unwrap()).unwrap();
            assert!((back.lon - lon).abs() < 1e-9);
            assert!((back.lat - lat).abs() < 1e-9);
        }
    }

    #[test]
    fn test_latitude_correction() {
        assert!((latitude_correction(0.0) - 1.0).abs() < 1e-12);
        assert!((latitude_correction(60.0) - 2.0).abs() < 1e-9);
        assert!(latitude_correction(90.0).is_finite());
    }
}
