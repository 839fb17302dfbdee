//! Frame interpolation
//!
//! Pure functions blending two neighbouring frames. Position is linear,
//! heading follows the shorter way around the circle, and sensor readings
//! are never blended: the nearer frame's readings are used as-is.

use crate::timeline::{Frame, Pose, SensorValues};

/// Wrap an angle in degrees into `[0, 360)`
pub fn normalize_heading(degrees: f64) -> f64 {
    let wrapped = degrees.rem_euclid(360.0);
    // rem_euclid rounds tiny negatives up to exactly 360.0
    if wrapped >= 360.0 {
        0.0
    } else {
        wrapped
    }
}

/// Blend two headings along the shorter arc. Result is in `[0, 360)`.
pub fn interpolate_heading(a: f64, b: f64, factor: f64) -> f64 {
    let factor = clamp_factor(factor);
    let a = normalize_heading(a);
    let b = normalize_heading(b);
    if factor == 0.0 {
        return a;
    }
    if factor == 1.0 {
        return b;
    }

    let mut diff = b - a;
    if diff > 180.0 {
        diff -= 360.0;
    } else if diff < -180.0 {
        diff += 360.0;
    }
    normalize_heading(a + diff * factor)
}

/// Blend the poses of two frames
pub fn interpolate_pose(a: &Frame, b: &Frame, factor: f64) -> Pose {
    let t = clamp_factor(factor);
    Pose {
        x: lerp(a.pose.x, b.pose.x, t),
        y: lerp(a.pose.y, b.pose.y, t),
        heading: interpolate_heading(a.pose.heading, b.pose.heading, t),
    }
}

/// Timestamp at `factor` between two frames, rounded to the nearest ms
pub fn interpolate_time(a: &Frame, b: &Frame, factor: f64) -> u64 {
    let t = clamp_factor(factor);
    let span = b.time_ms as f64 - a.time_ms as f64;
    let offset = (span * t).round();
    (a.time_ms as f64 + offset).max(0.0) as u64
}

/// Sensor readings of whichever frame is nearer to `factor`
pub fn nearest_sensors<'a>(a: &'a Frame, b: &'a Frame, factor: f64) -> &'a SensorValues {
    if clamp_factor(factor) < 0.5 {
        &a.sensors
    } else {
        &b.sensors
    }
}

/// Result of blending two frames
#[derive(Debug, Clone, PartialEq)]
pub struct Interpolated<'a> {
    /// Blended position and shortest-arc heading
    pub pose: Pose,
    /// Blended timeline time, truncated to whole milliseconds
    pub time_ms: u64,
    /// Readings of whichever frame the factor is closer to
    pub sensors: &'a SensorValues,
}

/// Blend two frames. `factor` is clamped to `[0, 1]`; NaN counts as 0.
pub fn interpolate<'a>(a: &'a Frame, b: &'a Frame, factor: f64) -> Interpolated<'a> {
    Interpolated {
        pose: interpolate_pose(a, b, factor),
        time_ms: interpolate_time(a, b, factor),
        sensors: nearest_sensors(a, b, factor),
    }
}

fn clamp_factor(factor: f64) -> f64 {
    if factor.is_nan() {
        0.0
    } else {
        factor.clamp(0.0, 1.0)
    }
}

// Exact at both ends, unlike a + (b - a) * t
fn lerp(a: f64, b: f64, t: f64) -> f64 {
    a * (1.0 - t) + b * t
}
