//! Adaptive selection of remote data-access protocols.
//!
//! A geospatial [`Query`](geo_query::Query) can usually be served by more
//! than one protocol (OPeNDAP, NetCDF subset, WCS, ...). The picker filters
//! the registered [`ProtocolCandidate`]s down to those able to express the
//! query and then runs an ε-greedy choice: with probability ε a random
//! capable protocol is explored, otherwise the one with the best observed
//! performance is exploited.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use geo_query::Query;
//! use protocol_picker::{
//!     DecisionEngine, FnProtocol, Outcome, PerformanceTracker, PickerConfig,
//!     ProtocolCandidate, SeededRandom,
//! };
//!
//! let opendap: Arc<dyn ProtocolCandidate> =
//!     Arc::new(FnProtocol::new("opendap", "dodsC", |_| true, |_| Ok("TMP".into())));
//! let wcs: Arc<dyn ProtocolCandidate> =
//!     Arc::new(FnProtocol::new("wcs", "wcs", |q| q.bbox().is_some(), |_| Ok(String::new())));
//!
//! let engine = DecisionEngine::with_random(
//!     Arc::new(PerformanceTracker::new()),
//!     Arc::new(SeededRandom::new(7)),
//!     &PickerConfig::default(),
//! )
//! .unwrap();
//!
//! let query = Query::builder("https://data.example.org/thredds", "gfs/best")
//!     .build()
//!     .unwrap();
//! let outcome = engine.select(&[opendap, wcs], &query);
//! assert_eq!(outcome.chosen_id(), Some("opendap"));
//! ```

pub mod config;
pub mod decision;
pub mod error;
pub mod metrics;
pub mod performance;
pub mod protocol;
pub mod random;
pub mod reader;
pub mod registry;
pub mod service;
pub mod translation;

pub use config::{load_protocols_config, PickerConfig, ProtocolEntry, ProtocolsConfig, UrlAbbreviations};
pub use decision::{Decision, DecisionEngine, Outcome, Selection};
pub use error::{PickerError, Result};
pub use metrics::{PickerMetrics, PickerMetricsSnapshot};
pub use performance::{
    Ewma, MeanScore, PerformanceSample, PerformanceTracker, ProtocolScore, ScoringPolicy,
};
pub use protocol::{FnProtocol, ProtocolCandidate};
pub use random::{RandomSource, SeededRandom, ThreadRandom};
pub use reader::DatasetReader;
pub use registry::ProtocolRegistry;
pub use service::{OpenedDataset, ProtocolPicker};
pub use translation::compose_url;
