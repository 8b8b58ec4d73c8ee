//! Index range resolution over coordinate arrays.
//!
//! These functions are pure and hold no shared state; the cache calls them
//! with a borrowed coordinate slice.

use geo_query::IndexRange;
use num_traits::ToPrimitive;

#[inline]
fn value_at<T: ToPrimitive>(coords: &[T], i: usize) -> f64 {
    coords[i].to_f64().unwrap_or(f64::NAN)
}

/// True when the axis values grow with the index. Plateaus count as ascending.
fn is_ascending<T: ToPrimitive>(coords: &[T]) -> bool {
    let first = value_at(coords, 0);
    let last = value_at(coords, coords.len() - 1);
    first.is_nan() || last.is_nan() || first <= last
}

/// Resolve a value range to the minimal inclusive index span whose boundary
/// coordinates enclose it.
///
/// - Ascending and descending axes are both handled; direction is taken
///   from the first and last element.
/// - `start > end` is treated as the same range with the bounds swapped.
/// - Bounds past the axis extent clamp to the first/last index.
/// - A degenerate request (`start == end`) resolves to the single nearest
///   coordinate.
///
/// Returns `None` only for an empty axis. Runs in O(n).
pub fn resolve_index_range<T: ToPrimitive>(coords: &[T], start: f64, end: f64) -> Option<IndexRange> {
    let n = coords.len();
    if n == 0 {
        return None;
    }

    let (lo, hi) = if start <= end { (start, end) } else { (end, start) };

    if lo == hi {
        return nearest_index(coords, lo).map(IndexRange::point);
    }

    let (first, last) = if is_ascending(coords) {
        // Last coordinate at or below the lower bound, then the first one at
        // or above the upper bound.
        let first = (0..n).rev().find(|&i| value_at(coords, i) <= lo).unwrap_or(0);
        let last = (first..n).find(|&i| value_at(coords, i) >= hi).unwrap_or(n - 1);
        (first, last)
    } else {
        let first = (0..n).rev().find(|&i| value_at(coords, i) >= hi).unwrap_or(0);
        let last = (first..n).find(|&i| value_at(coords, i) <= lo).unwrap_or(n - 1);
        (first, last)
    };

    Some(IndexRange::new(first, last))
}

/// Index of the coordinate closest to `target`. Ties resolve to the lower
/// index; NaN coordinates are skipped. `None` for an empty axis.
pub fn nearest_index<T: ToPrimitive>(coords: &[T], target: f64) -> Option<usize> {
    if coords.is_empty() {
        return None;
    }

    let mut best: Option<(usize, f64)> = None;
    for i in 0..coords.len() {
        let distance = (value_at(coords, i) - target).abs();
        if distance.is_nan() {
            continue;
        }
        match best {
            Some((_, d)) if d <= distance => {}
            _ => best = Some((i, distance)),
        }
    }

    Some(best.map_or(0, |(i, _)| i))
}

/// True iff `[start, end]` encloses the whole axis extent, boundaries
/// inclusive. `None` for an empty axis.
pub fn is_full_range<T: ToPrimitive>(coords: &[T], start: f64, end: f64) -> Option<bool> {
    let n = coords.len();
    if n == 0 {
        return None;
    }

    let (lo, hi) = if start <= end { (start, end) } else { (end, start) };
    let first = value_at(coords, 0);
    let last = value_at(coords, n - 1);

    Some(lo <= first.min(last) && hi >= first.max(last))
}
