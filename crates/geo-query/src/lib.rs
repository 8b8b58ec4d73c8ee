//! Query types shared across the protocol broker.
//!
//! A [`Query`] names a dataset and the spatial, temporal and vertical
//! extent a client wants from it. The protocol picker decides which
//! remote-access protocol serves the query; the dimension index turns the
//! same ranges into array indices.

pub mod bbox;
pub mod error;
pub mod query;
pub mod range;
pub mod time;

pub use bbox::{BboxParseError, BoundingBox};
pub use error::{QueryError, QueryResult};
pub use query::{Query, QueryBuilder};
pub use range::{IndexRange, NumericRange, SpatialRange};
pub use time::{TimeParseError, TimeRange};
