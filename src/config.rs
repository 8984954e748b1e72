use crate::buffer::DEFAULT_QUADRANT_SEGMENTS;

#[derive(Clone, Debug)]
pub struct BufferConfig {
    /// Number of horizontal slices of the dome; below 2 only the top slice.
    pub altitude_count: usize,
    /// Height cap in meters, `None` for unbounded.
    pub max_altitude_m: Option<f64>,
    pub merge: bool,
    pub quadrant_segments: u32,
    /// Process buffer sizes on the rayon pool.
    pub parallel: bool,
}

impl Default for BufferConfig {
    fn default() -> Self {
        BufferConfig {
            altitude_count: 10,
            max_altitude_m: None,
            merge: true,
            quadrant_segments: DEFAULT_QUADRANT_SEGMENTS,
            parallel: false,
        }
    }
}

impl BufferConfig {
    /// Accepts a cap only when finite and non-negative.
    pub fn with_max_altitude(mut self, max_altitude_m: Option<f64>) -> Self {
        self.max_altitude_m = match max_altitude_m {
            Some(m) if m.is_finite() && m >= 0.0 => Some(m),
            Some(m) => {
                log::warn!("ignoring invalid maximum altitude {}", m);
                None
            }
            None => None,
        };
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_max_altitude() {
        assert_eq!(BufferConfig::default().with_max_altitude(Some(30.0)).max_altitude_m, Some(30.0));
        assert_eq!(BufferConfig::default().with_max_altitude(Some(-1.0)).max_altitude_m, None);
        assert_eq!(BufferConfig::default().with_max_altitude(Some(f64::NAN)).max_altitude_m, None);
        assert_eq!(BufferConfig::default().with_max_altitude(None).max_altitude_m, None);
    }
}
