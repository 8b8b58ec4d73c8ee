//! Shared cache of per-dataset coordinate axes.

mod dimension_cache;

pub use dimension_cache::{DimensionCache, DimensionCacheStats, QueryIndexRanges};
