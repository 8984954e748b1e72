/// Heights (meters) at which the half dome is sliced, ascending.
///
/// The top level is `min(radius, cap)`. A count below 2 yields only that top
/// level. A dome of zero height yields the single level 0.
pub fn sample(buffer_radius_m: f64, max_altitude_m: Option<f64>, count: usize) -> Vec<f64> {
    let effective_max = match max_altitude_m {
        Some(cap) => buffer_radius_m.min(cap),
        None => buffer_radius_m,
    }
    .max(0.0);

    if count <= 1 || effective_max == 0.0 {
        return vec![effective_max];
    }

    let last = count - 1;
    (0..count)
        .map(|i| {
            if i == last {
                effective_max
            } else {
                effective_max * i as f64 / last as f64
            }
        })
        .collect()
}

/// Radius of the dome's horizontal cross-section at `altitude`.
pub fn horizontal_offset(buffer_radius_m: f64, altitude: f64) -> f64 {
    (buffer_radius_m * buffer_radius_m - altitude * altitude)
        .max(0.0)
        .sqrt()
}
