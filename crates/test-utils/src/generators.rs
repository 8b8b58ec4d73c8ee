//! Generators for synthetic coordinate axes.
//!
//! These produce predictable axes so index expectations can be computed by
//! hand in tests.

use chrono::{DateTime, Duration, Utc};

/// Evenly spaced ascending axis: `start, start + step, ...` with `count`
/// points.
///
/// # Example
///
/// ```
/// use test_utils::regular_axis;
///
/// let lon = regular_axis(0.0, 10.0, 5);
/// assert_eq!(lon, vec![0.0, 10.0, 20.0, 30.0, 40.0]);
/// ```
pub fn regular_axis(start: f32, step: f32, count: usize) -> Vec<f32> {
    (0..count).map(|i| start + step * i as f32).collect()
}

/// Evenly spaced descending axis, as latitude is often stored north to south.
///
/// ```
/// use test_utils::descending_axis;
///
/// assert_eq!(descending_axis(90.0, 45.0, 5), vec![90.0, 45.0, 0.0, -45.0, -90.0]);
/// ```
pub fn descending_axis(start: f32, step: f32, count: usize) -> Vec<f32> {
    (0..count).map(|i| start - step * i as f32).collect()
}

/// Global 1-degree longitude axis, 0 to 359.
pub fn global_longitudes() -> Vec<f32> {
    regular_axis(0.0, 1.0, 360)
}

/// Global 1-degree latitude axis, north to south.
pub fn global_latitudes() -> Vec<f32> {
    descending_axis(90.0, 1.0, 181)
}

/// Instants spaced `step_hours` apart starting at `start`.
pub fn hourly_instants(start: DateTime<Utc>, step_hours: i64, count: usize) -> Vec<DateTime<Utc>> {
    (0..count)
        .map(|i| start + Duration::hours(step_hours * i as i64))
        .collect()
}
