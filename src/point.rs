use core::fmt;

#[derive(Clone, Debug, PartialEq)]
pub struct WGS84Point {
    pub lon: f64,
    pub lat: f64,
    pub ele: Option<f64>,
}

impl WGS84Point {
    pub fn new(lon: f64, lat: f64) -> Self {
        WGS84Point {
            lon,
            lat,
            ele: None,
        }
    }
    pub fn lifted(&self, ele: f64) -> Self {
        let mut ret = self.clone();
        ret.ele = Some(ele);
        ret
    }
}

impl fmt::Display for WGS84Point {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let e = match self.ele {
            Some(z) => format!("{:.1}", z),
            None => "None".to_string(),
        };
        write!(
            f,
            "wgs(lat: {:.5}, lon: {:.5}, ele: {})",
            self.lat, self.lon, e
        )
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct MercatorPoint {
    pub x: f64,
    pub y: f64,
}

#[derive(Clone, Debug)]
pub struct WGS84BoundingBox {
    pub min: WGS84Point,
    pub max: WGS84Point,
}

impl WGS84BoundingBox {
    pub fn from(p1: &WGS84Point, p2: &WGS84Point) -> Self {
        let min = WGS84Point::new(p1.lon.min(p2.lon), p1.lat.min(p2.lat));
        let max = WGS84Point::new(p1.lon.max(p2.lon), p1.lat.max(p2.lat));
        Self { min, max }
    }
    pub fn extend(&self, w: &WGS84Point) -> Self {
        Self::from(
            &WGS84Point::new(self.min.lon.min(w.lon), self.min.lat.min(w.lat)),
            &WGS84Point::new(self.max.lon.max(w.lon), self.max.lat.max(w.lat)),
        )
    }
}

impl fmt::Display for WGS84BoundingBox {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "wgsbbox(min: {}, max: {})", self.min, self.max)
    }
}

/// One closed contour lifted to a fixed altitude.
#[derive(Clone, Debug, PartialEq)]
pub struct Ring {
    pub altitude: f64,
    pub points: Vec<WGS84Point>,
}

impl Ring {
    pub fn new(altitude: f64, points: Vec<WGS84Point>) -> Self {
        let points = points.iter().map(|p| p.lifted(altitude)).collect();
        Ring { altitude, points }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ring_lifts_points() {
        let ring = Ring::new(
            12.5,
            vec![
                WGS84Point::new(1.0, 2.0),
                WGS84Point::new(3.0, 2.0),
                WGS84Point::new(3.0, 4.0),
            ],
        );
        assert!(ring.points.iter().all(|p| p.ele == Some(12.5)));
        assert_eq!(ring.points[1].lon, 3.0);
    }

    #[test]
    fn test_bbox_extend() {
        let p = WGS84Point::new(1.0, 2.0);
        let b = WGS84BoundingBox::from(&p, &p).extend(&WGS84Point::new(3.0, -4.0));
        assert_eq!(b.min, WGS84Point::new(1.0, -4.0));
        assert_eq!(b.max, WGS84Point::new(3.0, 2.0));
    }
}
