//! The picker facade: selection, URL composition, timed opens and the
//! shared dimension cache.

use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};

use dimension_index::{DatasetHandle, DimensionArray, DimensionCache, QueryIndexRanges};
use geo_query::Query;
use reqwest::Url;
use tracing::{debug, info, warn};

use crate::config::PickerConfig;
use crate::decision::{DecisionEngine, Outcome, Selection};
use crate::error::{PickerError, Result};
use crate::metrics::PickerMetrics;
use crate::performance::PerformanceTracker;
use crate::protocol::ProtocolCandidate;
use crate::random::RandomSource;
use crate::reader::DatasetReader;
use crate::registry::ProtocolRegistry;
use crate::translation::endpoint_of;

/// A dataset opened through the chosen protocol.
pub struct OpenedDataset {
    pub protocol: String,
    pub url: Url,
    pub elapsed: Duration,
    pub handle: Box<dyn DatasetHandle>,
}

impl fmt::Debug for OpenedDataset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OpenedDataset")
            .field("protocol", &self.protocol)
            .field("url", &self.url.as_str())
            .field("elapsed", &self.elapsed)
            .finish()
    }
}

pub struct ProtocolPicker<R: DatasetReader> {
    registry: ProtocolRegistry,
    engine: DecisionEngine,
    tracker: Arc<PerformanceTracker>,
    cache: Arc<DimensionCache>,
    reader: R,
    metrics: Arc<PickerMetrics>,
}

impl<R: DatasetReader> ProtocolPicker<R> {
    pub fn new(registry: ProtocolRegistry, reader: R, config: &PickerConfig) -> Result<Self> {
        let tracker = Arc::new(PerformanceTracker::from_config(config)?);
        let engine = DecisionEngine::new(Arc::clone(&tracker), config)?;
        Ok(Self::from_parts(registry, engine, reader, Arc::new(DimensionCache::new())))
    }

    /// Build a picker with an injected random source, e.g. a seeded one.
    pub fn with_random(
        registry: ProtocolRegistry,
        reader: R,
        random: Arc<dyn RandomSource>,
        config: &PickerConfig,
    ) -> Result<Self> {
        let tracker = Arc::new(PerformanceTracker::from_config(config)?);
        let engine = DecisionEngine::with_random(Arc::clone(&tracker), random, config)?;
        Ok(Self::from_parts(registry, engine, reader, Arc::new(DimensionCache::new())))
    }

    /// Build from an existing engine and a shared dimension cache.
    pub fn from_parts(
        registry: ProtocolRegistry,
        engine: DecisionEngine,
        reader: R,
        cache: Arc<DimensionCache>,
    ) -> Self {
        info!(
            protocols = registry.len(),
            exploration_probability = engine.exploration_probability(),
            "Protocol picker initialized"
        );
        Self {
            registry,
            tracker: Arc::clone(engine.tracker()),
            engine,
            cache,
            reader,
            metrics: Arc::new(PickerMetrics::new()),
        }
    }

    pub fn registry(&self) -> &ProtocolRegistry {
        &self.registry
    }

    pub fn tracker(&self) -> &Arc<PerformanceTracker> {
        &self.tracker
    }

    pub fn cache(&self) -> &Arc<DimensionCache> {
        &self.cache
    }

    pub fn metrics(&self) -> &Arc<PickerMetrics> {
        &self.metrics
    }

    /// Run the decision engine and record which branch it took.
    pub fn select(&self, query: &Query) -> Selection {
        let selection = self
            .engine
            .select_with_trace(&self.registry.candidates(), query);
        self.metrics.record_selection(selection.decision);
        selection
    }

    /// Choose a protocol, failing when none can express the query.
    pub fn pick(&self, query: &Query) -> Result<Arc<dyn ProtocolCandidate>> {
        match self.select(query).outcome {
            Outcome::Chosen(protocol) => Ok(protocol),
            Outcome::NoSuitableProtocol => {
                Err(PickerError::UnsupportedQuery(query.dataset_key()))
            }
        }
    }

    /// Choose a protocol and compose its request URL.
    pub fn translated_url(&self, query: &Query) -> Result<Url> {
        self.pick(query)?.translated_url(query)
    }

    /// Open the dataset through the chosen protocol.
    ///
    /// The elapsed time is recorded against the protocol on success and
    /// the failure penalty on error. Reader errors are returned unchanged.
    pub async fn open(&self, query: &Query) -> Result<OpenedDataset> {
        let protocol = self.pick(query)?;
        let url = protocol.translated_url(query)?;
        let base_uri = endpoint_of(&url);
        let translated = url.query().unwrap_or_default().to_string();

        debug!(protocol = protocol.id(), url = %url, "Opening dataset");

        let start = Instant::now();
        match self.reader.open(&base_uri, &translated, query.dataset()).await {
            Ok(handle) => {
                let elapsed = start.elapsed();
                self.tracker.record_duration(protocol.id(), elapsed);
                self.metrics.record_request(protocol.id(), elapsed);
                Ok(OpenedDataset {
                    protocol: protocol.id().to_string(),
                    url,
                    elapsed,
                    handle,
                })
            }
            Err(e) => {
                warn!(protocol = protocol.id(), url = %url, error = %e, "Dataset open failed");
                self.tracker.record_failure(protocol.id());
                self.metrics.record_request_failure(protocol.id());
                Err(e.into())
            }
        }
    }

    /// Record an externally timed request.
    pub fn report(&self, protocol_id: &str, elapsed: Duration) -> Result<()> {
        if self.registry.get(protocol_id).is_none() {
            return Err(PickerError::UnknownProtocol(protocol_id.to_string()));
        }
        self.tracker.record_duration(protocol_id, elapsed);
        self.metrics.record_request(protocol_id, elapsed);
        Ok(())
    }

    /// Register the coordinate axes of the query's dataset.
    pub fn register_dimensions(&self, query: &Query, dims: DimensionArray) -> Result<()> {
        self.cache.add_dataset(&query.dataset_key(), dims)?;
        Ok(())
    }

    /// Index ranges for every axis the query constrains.
    pub fn index_ranges(&self, query: &Query) -> Result<QueryIndexRanges> {
        Ok(self.cache.index_ranges_for(query)?)
    }
}

impl<R: DatasetReader> fmt::Debug for ProtocolPicker<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProtocolPicker")
            .field("registry", &self.registry)
            .field("engine", &self.engine)
            .field("cache", &self.cache)
            .finish()
    }
}
