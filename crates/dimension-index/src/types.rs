//! Core types for dimension data.

use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Utc};

use geo_query::IndexRange;

use crate::error::ReaderError;
use crate::resolver::{is_full_range, resolve_index_range};

/// One coordinate axis of a gridded dataset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Dimension {
    Longitude,
    Latitude,
    Time,
    Altitude,
}

impl Dimension {
    pub const ALL: [Dimension; 4] = [
        Dimension::Longitude,
        Dimension::Latitude,
        Dimension::Time,
        Dimension::Altitude,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Dimension::Longitude => "longitude",
            Dimension::Latitude => "latitude",
            Dimension::Time => "time",
            Dimension::Altitude => "altitude",
        }
    }
}

impl fmt::Display for Dimension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An open resource backing a dataset (e.g. a remote file handle the
/// coordinate arrays were read from).
///
/// Handles are owned by the [`DimensionCache`](crate::DimensionCache) once
/// registered and released by its `close()`.
pub trait DatasetHandle: Send {
    /// Release the underlying resource.
    fn close(&mut self) -> Result<(), ReaderError>;
}

/// Coordinate axes for one dataset.
///
/// Longitude, latitude and altitude are stored as `f32`, time as `f64`
/// seconds since the Unix epoch. Every axis is optional. Axes are shared
/// slices so lookups can resolve ranges without holding the cache lock.
#[derive(Default)]
pub struct DimensionArray {
    longitude: Option<Arc<[f32]>>,
    latitude: Option<Arc<[f32]>>,
    time: Option<Arc<[f64]>>,
    altitude: Option<Arc<[f32]>>,
    handle: Option<Box<dyn DatasetHandle>>,
}

impl DimensionArray {
    pub fn builder() -> DimensionArrayBuilder {
        DimensionArrayBuilder::default()
    }

    pub fn longitude(&self) -> Option<&[f32]> {
        self.longitude.as_deref()
    }

    pub fn latitude(&self) -> Option<&[f32]> {
        self.latitude.as_deref()
    }

    pub fn time(&self) -> Option<&[f64]> {
        self.time.as_deref()
    }

    pub fn altitude(&self) -> Option<&[f32]> {
        self.altitude.as_deref()
    }

    pub fn has(&self, dimension: Dimension) -> bool {
        self.len_of(dimension).is_some()
    }

    /// Length of an axis, `None` if the dataset lacks it.
    pub fn len_of(&self, dimension: Dimension) -> Option<usize> {
        match dimension {
            Dimension::Longitude => self.longitude.as_ref().map(|v| v.len()),
            Dimension::Latitude => self.latitude.as_ref().map(|v| v.len()),
            Dimension::Time => self.time.as_ref().map(|v| v.len()),
            Dimension::Altitude => self.altitude.as_ref().map(|v| v.len()),
        }
    }

    /// Axes present on this dataset.
    pub fn dimensions(&self) -> Vec<Dimension> {
        Dimension::ALL
            .into_iter()
            .filter(|d| self.has(*d))
            .collect()
    }

    /// Shared reference to one axis.
    pub(crate) fn axis(&self, dimension: Dimension) -> Option<Axis> {
        match dimension {
            Dimension::Longitude => self.longitude.clone().map(Axis::Single),
            Dimension::Latitude => self.latitude.clone().map(Axis::Single),
            Dimension::Time => self.time.clone().map(Axis::Double),
            Dimension::Altitude => self.altitude.clone().map(Axis::Single),
        }
    }

    pub fn has_handle(&self) -> bool {
        self.handle.is_some()
    }

    /// Release the owned handle, if any. The handle is taken, so a second
    /// call is a no-op.
    pub fn close(&mut self) -> Result<(), ReaderError> {
        match self.handle.take() {
            Some(mut handle) => handle.close(),
            None => Ok(()),
        }
    }
}

impl fmt::Debug for DimensionArray {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DimensionArray")
            .field("longitude", &self.len_of(Dimension::Longitude))
            .field("latitude", &self.len_of(Dimension::Latitude))
            .field("time", &self.len_of(Dimension::Time))
            .field("altitude", &self.len_of(Dimension::Altitude))
            .field("has_handle", &self.handle.is_some())
            .finish()
    }
}

/// A cheaply cloned view of one axis.
#[derive(Debug, Clone)]
pub(crate) enum Axis {
    Single(Arc<[f32]>),
    Double(Arc<[f64]>),
}

impl Axis {
    pub(crate) fn resolve(&self, start: f64, end: f64) -> Option<IndexRange> {
        match self {
            Axis::Single(v) => resolve_index_range(&v[..], start, end),
            Axis::Double(v) => resolve_index_range(&v[..], start, end),
        }
    }

    pub(crate) fn is_full(&self, start: f64, end: f64) -> Option<bool> {
        match self {
            Axis::Single(v) => is_full_range(&v[..], start, end),
            Axis::Double(v) => is_full_range(&v[..], start, end),
        }
    }
}

/// Builder for [`DimensionArray`].
#[derive(Default)]
pub struct DimensionArrayBuilder {
    inner: DimensionArray,
}

impl DimensionArrayBuilder {
    pub fn longitude(mut self, values: Vec<f32>) -> Self {
        self.inner.longitude = Some(values.into());
        self
    }

    pub fn latitude(mut self, values: Vec<f32>) -> Self {
        self.inner.latitude = Some(values.into());
        self
    }

    /// Time coordinates in seconds since the Unix epoch.
    pub fn time(mut self, values: Vec<f64>) -> Self {
        self.inner.time = Some(values.into());
        self
    }

    /// Time coordinates as instants.
    pub fn time_instants(self, instants: &[DateTime<Utc>]) -> Self {
        let values = instants.iter().map(geo_query::time::epoch_seconds).collect();
        self.time(values)
    }

    pub fn altitude(mut self, values: Vec<f32>) -> Self {
        self.inner.altitude = Some(values.into());
        self
    }

    /// Attach the resource the axes were read from.
    pub fn handle(mut self, handle: Box<dyn DatasetHandle>) -> Self {
        self.inner.handle = Some(handle);
        self
    }

    pub fn build(self) -> DimensionArray {
        self.inner
    }
}
