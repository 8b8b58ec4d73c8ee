//! Mutex-guarded cache of dataset dimension arrays.
//!
//! Every public operation takes one cache-wide lock for the part that
//! touches the map. Range resolution itself runs on a shared copy of the
//! axis after the lock is released.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

use geo_query::{IndexRange, NumericRange, Query, SpatialRange, TimeRange};
use metrics::counter;
use tracing::{debug, info, warn};

use crate::error::{CloseFailure, DimensionError, Result};
use crate::types::{Axis, Dimension, DimensionArray};

/// Registered datasets in registration order, plus a key index.
#[derive(Default)]
struct CacheInner {
    entries: Vec<(String, DimensionArray)>,
    index: HashMap<String, usize>,
}

impl CacheInner {
    fn get(&self, key: &str) -> Option<&DimensionArray> {
        self.index.get(key).map(|&i| &self.entries[i].1)
    }
}

/// Statistics for the dimension cache.
#[derive(Debug, Default)]
pub struct DimensionCacheStats {
    /// Successful registrations.
    pub registrations: AtomicU64,
    /// Registrations refused (duplicate key, bad key, empty axis).
    pub rejected: AtomicU64,
    /// Range lookups served.
    pub lookups: AtomicU64,
    /// Lookups refused by a precondition check.
    pub failed_lookups: AtomicU64,
}

/// Index ranges for every axis a query constrains.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct QueryIndexRanges {
    pub longitude: Option<IndexRange>,
    pub latitude: Option<IndexRange>,
    pub time: Option<IndexRange>,
    pub altitude: Option<IndexRange>,
}

/// Cache of coordinate axes keyed by dataset base URL.
///
/// Construct one per process (or per test) and share it behind an `Arc`.
#[derive(Default)]
pub struct DimensionCache {
    inner: Mutex<CacheInner>,
    stats: DimensionCacheStats,
}

fn check_key(key: &str) -> Result<()> {
    if key.contains('?') {
        return Err(DimensionError::InvalidDatasetKey(key.to_string()));
    }
    Ok(())
}

impl DimensionCache {
    pub fn new() -> Self {
        Self::default()
    }

    // A panic while holding the lock cannot leave a half-applied update:
    // every mutation is a single push/insert or a full take.
    fn lock(&self) -> MutexGuard<'_, CacheInner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn stats(&self) -> &DimensionCacheStats {
        &self.stats
    }

    pub fn has_dataset(&self, key: &str) -> bool {
        self.lock().index.contains_key(key)
    }

    /// Number of registered datasets.
    pub fn len(&self) -> usize {
        self.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Keys in registration order.
    pub fn dataset_keys(&self) -> Vec<String> {
        self.lock().entries.iter().map(|(k, _)| k.clone()).collect()
    }

    /// Axes present for a registered dataset.
    pub fn dimensions_of(&self, key: &str) -> Result<Vec<Dimension>> {
        check_key(key)?;
        let inner = self.lock();
        inner
            .get(key)
            .map(DimensionArray::dimensions)
            .ok_or_else(|| DimensionError::DatasetNotRegistered(key.to_string()))
    }

    /// Register the axes for a dataset.
    ///
    /// Fails if the key carries a query component, if any present axis is
    /// empty, or if the key is already registered. A failed call leaves the
    /// cache untouched; the rejected array is dropped without closing its
    /// handle.
    pub fn add_dataset(&self, key: &str, dims: DimensionArray) -> Result<()> {
        if let Err(e) = self.validate_new(key, &dims) {
            self.stats.rejected.fetch_add(1, Ordering::Relaxed);
            return Err(e);
        }

        let mut inner = self.lock();
        if inner.index.contains_key(key) {
            drop(inner);
            self.stats.rejected.fetch_add(1, Ordering::Relaxed);
            return Err(DimensionError::AlreadyRegistered(key.to_string()));
        }

        debug!(dataset = %key, dims = ?dims, "Registering dimension data");
        let position = inner.entries.len();
        inner.entries.push((key.to_string(), dims));
        inner.index.insert(key.to_string(), position);
        drop(inner);

        self.stats.registrations.fetch_add(1, Ordering::Relaxed);
        counter!("dimension_cache_registrations_total").increment(1);
        Ok(())
    }

    fn validate_new(&self, key: &str, dims: &DimensionArray) -> Result<()> {
        check_key(key)?;
        for dimension in Dimension::ALL {
            if dims.len_of(dimension) == Some(0) {
                return Err(DimensionError::EmptyDimension {
                    dataset: key.to_string(),
                    dimension,
                });
            }
        }
        Ok(())
    }

    /// Copy out the shared axis under the lock, failing fast on a bad key,
    /// unknown dataset or missing axis.
    fn axis(&self, key: &str, dimension: Dimension) -> Result<Axis> {
        let result = check_key(key).and_then(|_| {
            let inner = self.lock();
            let dims = inner
                .get(key)
                .ok_or_else(|| DimensionError::DatasetNotRegistered(key.to_string()))?;
            dims.axis(dimension)
                .ok_or_else(|| DimensionError::missing_dimension(key, dimension))
        });

        match &result {
            Ok(_) => self.stats.lookups.fetch_add(1, Ordering::Relaxed),
            Err(_) => self.stats.failed_lookups.fetch_add(1, Ordering::Relaxed),
        };
        result
    }

    fn resolve(&self, key: &str, dimension: Dimension, start: f64, end: f64) -> Result<IndexRange> {
        let axis = self.axis(key, dimension)?;
        let range = axis.resolve(start, end).ok_or_else(|| DimensionError::EmptyDimension {
            dataset: key.to_string(),
            dimension,
        })?;
        debug!(dataset = %key, %dimension, start, end, %range, "Resolved index range");
        Ok(range)
    }

    fn full(&self, key: &str, dimension: Dimension, start: f64, end: f64) -> Result<bool> {
        let axis = self.axis(key, dimension)?;
        axis.is_full(start, end).ok_or_else(|| DimensionError::EmptyDimension {
            dataset: key.to_string(),
            dimension,
        })
    }

    pub fn longitude_index_range(&self, key: &str, range: &SpatialRange) -> Result<IndexRange> {
        self.resolve(key, Dimension::Longitude, range.start, range.end)
    }

    pub fn latitude_index_range(&self, key: &str, range: &SpatialRange) -> Result<IndexRange> {
        self.resolve(key, Dimension::Latitude, range.start, range.end)
    }

    pub fn time_index_range(&self, key: &str, range: &TimeRange) -> Result<IndexRange> {
        let (start, end) = range.to_epoch_seconds();
        self.resolve(key, Dimension::Time, start, end)
    }

    pub fn altitude_index_range(&self, key: &str, range: &NumericRange) -> Result<IndexRange> {
        self.resolve(key, Dimension::Altitude, range.start, range.end)
    }

    /// True iff the range encloses the dataset's whole longitude extent.
    pub fn is_full_longitude_range(&self, key: &str, range: &SpatialRange) -> Result<bool> {
        self.full(key, Dimension::Longitude, range.start, range.end)
    }

    pub fn is_full_latitude_range(&self, key: &str, range: &SpatialRange) -> Result<bool> {
        self.full(key, Dimension::Latitude, range.start, range.end)
    }

    pub fn is_full_time_range(&self, key: &str, range: &TimeRange) -> Result<bool> {
        let (start, end) = range.to_epoch_seconds();
        self.full(key, Dimension::Time, start, end)
    }

    pub fn is_full_altitude_range(&self, key: &str, range: &NumericRange) -> Result<bool> {
        self.full(key, Dimension::Altitude, range.start, range.end)
    }

    /// True iff the altitude range resolves to exactly one level.
    pub fn is_single_altitude_level(&self, key: &str, range: &NumericRange) -> Result<bool> {
        Ok(self.altitude_index_range(key, range)?.is_point())
    }

    /// Resolve every axis the query constrains against the query's dataset.
    ///
    /// Axes the query leaves open are `None` in the result. A constrained
    /// axis the dataset lacks is an error.
    pub fn index_ranges_for(&self, query: &Query) -> Result<QueryIndexRanges> {
        let key = query.dataset_key();
        let mut ranges = QueryIndexRanges::default();

        if let Some(bbox) = query.bbox() {
            if bbox.crosses_antimeridian() {
                return Err(DimensionError::WrappedLongitude {
                    dataset: key,
                    west: bbox.west,
                    east: bbox.east,
                });
            }
            ranges.longitude = Some(self.longitude_index_range(&key, &bbox.longitude_range())?);
            ranges.latitude = Some(self.latitude_index_range(&key, &bbox.latitude_range())?);
        }
        if let Some(time) = query.time() {
            ranges.time = Some(self.time_index_range(&key, time)?);
        }
        if let Some(altitude) = query.altitude() {
            ranges.altitude = Some(self.altitude_index_range(&key, altitude)?);
        }

        Ok(ranges)
    }

    /// Drop every dataset without releasing handles.
    pub fn clear(&self) {
        let mut inner = self.lock();
        let dropped = inner.entries.len();
        inner.entries.clear();
        inner.index.clear();
        info!(datasets = dropped, "Cleared dimension cache");
    }

    /// Release every dataset's handle and empty the cache.
    ///
    /// All handles are closed in registration order even if some fail. The
    /// first failure is returned as [`DimensionError::Close`] with the others
    /// attached as `suppressed`.
    pub fn close(&self) -> Result<()> {
        let mut inner = self.lock();
        let entries = std::mem::take(&mut inner.entries);
        inner.index.clear();
        drop(inner);

        let total = entries.len();
        let mut failures = Vec::new();
        for (key, mut dims) in entries {
            if let Err(error) = dims.close() {
                warn!(dataset = %key, error = %error, "Failed to close dataset handle");
                failures.push(CloseFailure {
                    dataset: key,
                    error,
                });
            }
        }

        info!(datasets = total, failures = failures.len(), "Closed dimension cache");
        match DimensionError::from_close_failures(failures) {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

impl std::fmt::Debug for DimensionCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DimensionCache")
            .field("datasets", &self.len())
            .field("stats", &self.stats)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const KEY: &str = "https://host/thredds/gfs";

    fn lon_only() -> DimensionArray {
        DimensionArray::builder()
            .longitude(vec![0.0, 10.0, 20.0, 30.0, 40.0])
            .build()
    }

    #[test]
    fn test_add_and_lookup() {
        let cache = DimensionCache::new();
        assert!(!cache.has_dataset(KEY));
        cache.add_dataset(KEY, lon_only()).unwrap();
        assert!(cache.has_dataset(KEY));
        assert_eq!(
            cache.longitude_index_range(KEY, &SpatialRange::new(5.0, 25.0)).unwrap(),
            IndexRange::new(0, 3)
        );
        assert_eq!(cache.stats().lookups.load(Ordering::Relaxed), 1);
    }

    #[test]
    fn test_duplicate_rejected() {
        let cache = DimensionCache::new();
        cache.add_dataset(KEY, lon_only()).unwrap();
        let err = cache
            .add_dataset(KEY, DimensionArray::builder().longitude(vec![99.0]).build())
            .unwrap_err();
        assert!(matches!(err, DimensionError::AlreadyRegistered(_)));
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.stats().rejected.load(Ordering::Relaxed), 1);
    }

    #[test]
    fn test_query_key_rejected() {
        let cache = DimensionCache::new();
        let err = cache.add_dataset("https://host/ds?x=1", lon_only()).unwrap_err();
        assert!(matches!(err, DimensionError::InvalidDatasetKey(_)));
        let err = cache
            .longitude_index_range("https://host/ds?x=1", &SpatialRange::new(0.0, 1.0))
            .unwrap_err();
        assert!(err.is_precondition_violation());
    }

    #[test]
    fn test_empty_axis_rejected() {
        let cache = DimensionCache::new();
        let dims = DimensionArray::builder().altitude(Vec::new()).build();
        let err = cache.add_dataset(KEY, dims).unwrap_err();
        assert!(matches!(
            err,
            DimensionError::EmptyDimension {
                dimension: Dimension::Altitude,
                ..
            }
        ));
        assert!(!cache.has_dataset(KEY));
    }

    #[test]
    fn test_missing_dimension() {
        let cache = DimensionCache::new();
        cache.add_dataset(KEY, lon_only()).unwrap();
        let err = cache
            .latitude_index_range(KEY, &SpatialRange::new(0.0, 1.0))
            .unwrap_err();
        assert!(matches!(
            err,
            DimensionError::MissingDimension {
                dimension: Dimension::Latitude,
                ..
            }
        ));
        assert_eq!(cache.stats().failed_lookups.load(Ordering::Relaxed), 1);
    }

    #[test]
    fn test_clear() {
        let cache = DimensionCache::new();
        cache.add_dataset(KEY, lon_only()).unwrap();
        cache.clear();
        assert!(cache.is_empty());
        cache.add_dataset(KEY, lon_only()).unwrap();
    }
}
