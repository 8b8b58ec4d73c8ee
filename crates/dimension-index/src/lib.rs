//! Dimension index: coordinate ranges to array-index ranges.
//!
//! Remote gridded datasets are subset by index, while clients ask for
//! coordinate values. This crate keeps each dataset's coordinate axes
//! (longitude, latitude, time, altitude) in a shared [`DimensionCache`] so
//! the axes are fetched once per dataset, and resolves requested value
//! ranges into inclusive [`IndexRange`]s against them.
//!
//! # Architecture
//!
//! ```text
//! Query (bbox, time, altitude)
//!      │
//!      ▼
//! DimensionCache::longitude_index_range(key, range)
//!      │
//!      ├─► lock cache, look up DimensionArray for key
//!      │         │
//!      │         ├─► missing dataset / axis: precondition error
//!      │         │
//!      │         └─► found: borrow coordinate slice
//!      │
//!      └─► resolve_index_range(coords, start, end)   (pure)
//!               │
//!               ▼
//!          IndexRange [start, end]
//! ```
//!
//! # Example
//!
//! ```
//! use dimension_index::{DimensionArray, DimensionCache};
//! use geo_query::{IndexRange, SpatialRange};
//!
//! let cache = DimensionCache::new();
//! let dims = DimensionArray::builder()
//!     .longitude(vec![0.0, 10.0, 20.0, 30.0, 40.0])
//!     .build();
//! cache.add_dataset("https://host/thredds/gfs", dims).unwrap();
//!
//! let range = cache
//!     .longitude_index_range("https://host/thredds/gfs", &SpatialRange::new(5.0, 25.0))
//!     .unwrap();
//! assert_eq!(range, IndexRange::new(0, 3));
//! ```

pub mod cache;
pub mod error;
pub mod resolver;
pub mod types;

pub use cache::{DimensionCache, DimensionCacheStats, QueryIndexRanges};
pub use error::{CloseFailure, DimensionError, ReaderError, Result};
pub use geo_query::IndexRange;
pub use resolver::{is_full_range, nearest_index, resolve_index_range};
pub use types::{DatasetHandle, Dimension, DimensionArray, DimensionArrayBuilder};
