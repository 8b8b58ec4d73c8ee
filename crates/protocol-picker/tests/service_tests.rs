//! Integration tests for the picker facade.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use dimension_index::{DatasetHandle, DimensionArray, DimensionError, IndexRange, ReaderError};
use geo_query::{BoundingBox, NumericRange, Query};
use protocol_picker::{
    DatasetReader, PickerConfig, PickerError, ProtocolPicker, ProtocolRegistry, SeededRandom,
};
use test_utils::{bbox, datasets, global_latitudes, global_longitudes, init_test_tracing, PRESSURE_LEVELS};

struct NoopHandle;

impl DatasetHandle for NoopHandle {
    fn close(&mut self) -> Result<(), ReaderError> {
        Ok(())
    }
}

/// Records every open call; fails for configured endpoints.
#[derive(Clone, Default)]
struct MockReader {
    calls: Arc<Mutex<Vec<(String, String, String)>>>,
    failing_endpoints: Arc<Mutex<Vec<String>>>,
}

impl MockReader {
    fn fail_on(&self, endpoint_fragment: &str) {
        self.failing_endpoints
            .lock()
            .unwrap()
            .push(endpoint_fragment.to_string());
    }

    fn calls(&self) -> Vec<(String, String, String)> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl DatasetReader for MockReader {
    async fn open(
        &self,
        base_uri: &str,
        translated_query: &str,
        dataset_id: &str,
    ) -> Result<Box<dyn DatasetHandle>, ReaderError> {
        self.calls.lock().unwrap().push((
            base_uri.to_string(),
            translated_query.to_string(),
            dataset_id.to_string(),
        ));
        let failing = self
            .failing_endpoints
            .lock()
            .unwrap()
            .iter()
            .any(|f| base_uri.contains(f.as_str()));
        if failing {
            Err(ReaderError::open_failed(dataset_id, "connection refused"))
        } else {
            Ok(Box::new(NoopHandle))
        }
    }
}

fn abbreviations() -> HashMap<String, String> {
    [("opendap", "dodsC"), ("ncss", "ncss")]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

/// opendap serves everything; ncss only surface queries.
fn registry() -> ProtocolRegistry {
    let abbrev = abbreviations();
    let mut registry = ProtocolRegistry::new();
    registry
        .register_fn(&abbrev, "opendap", |_| true, |q| {
            Ok(format!("{}[0:1:0]", q.parameters().join(",")))
        })
        .unwrap();
    registry
        .register_fn(
            &abbrev,
            "ncss",
            |q| q.altitude().is_none(),
            |q| Ok(format!("var={}", q.parameters().join(","))),
        )
        .unwrap();
    registry
}

fn greedy_config() -> PickerConfig {
    PickerConfig {
        exploration_probability: 0.0,
        failure_penalty_secs: 120.0,
        ..Default::default()
    }
}

fn picker(reader: MockReader) -> ProtocolPicker<MockReader> {
    ProtocolPicker::with_random(
        registry(),
        reader,
        Arc::new(SeededRandom::new(11)),
        &greedy_config(),
    )
    .unwrap()
}

fn aloft_query() -> Query {
    Query::builder(datasets::BASE_URL, datasets::GFS)
        .parameter("TMP")
        .altitude(NumericRange::point(500.0))
        .build()
        .unwrap()
}

fn surface_query() -> Query {
    let (west, south, east, north) = bbox::EUROPE;
    Query::builder(datasets::BASE_URL, datasets::GFS)
        .parameter("TMP")
        .bbox(BoundingBox::new(west, south, east, north))
        .build()
        .unwrap()
}

#[test]
fn test_pick_unsupported_query() {
    let mut registry = ProtocolRegistry::new();
    registry
        .register_fn(&abbreviations(), "ncss", |_| false, |_| Ok(String::new()))
        .unwrap();
    let picker =
        ProtocolPicker::new(registry, MockReader::default(), &PickerConfig::default()).unwrap();

    let err = picker.pick(&surface_query()).unwrap_err();
    assert!(matches!(err, PickerError::UnsupportedQuery(ref key) if *key == datasets::gfs_key()));
    assert_eq!(err.status_code(), 400);
    assert_eq!(picker.metrics().snapshot().no_suitable, 1);
}

#[test]
fn test_invalid_config_rejected_at_construction() {
    let config = PickerConfig {
        ewma_alpha: 2.0,
        ..Default::default()
    };
    let result = ProtocolPicker::new(registry(), MockReader::default(), &config);
    assert!(matches!(result, Err(PickerError::Config(_))));

    let config = PickerConfig {
        exploration_probability: 1.5,
        ..Default::default()
    };
    let result = ProtocolPicker::with_random(
        registry(),
        MockReader::default(),
        Arc::new(SeededRandom::new(3)),
        &config,
    );
    assert!(matches!(result, Err(PickerError::Config(_))));
}

#[test]
fn test_translated_url_of_only_capable_protocol() {
    let picker = picker(MockReader::default());
    let url = picker.translated_url(&aloft_query()).unwrap();
    assert_eq!(
        url.as_str(),
        "https://data.example.org/thredds/dodsC/gfs/best?TMP[0:1:0]"
    );
    assert_eq!(picker.metrics().snapshot().only_candidate, 1);
}

#[tokio::test]
async fn test_open_records_elapsed_time() {
    init_test_tracing();
    let reader = MockReader::default();
    let picker = picker(reader.clone());

    let opened = picker.open(&aloft_query()).await.unwrap();
    assert_eq!(opened.protocol, "opendap");
    assert_eq!(
        reader.calls(),
        vec![(
            "https://data.example.org/thredds/dodsC/gfs/best".to_string(),
            "TMP[0:1:0]".to_string(),
            "gfs/best".to_string(),
        )]
    );

    assert_eq!(picker.tracker().sample_count("opendap"), 1);
    let score = picker.tracker().score_of("opendap").unwrap();
    assert!(score < 1.0, "mock open should be fast, got {}", score);
    assert_eq!(picker.metrics().snapshot().requests, 1);
}

#[tokio::test]
async fn test_open_failure_propagates_and_penalizes() {
    let reader = MockReader::default();
    reader.fail_on("/dodsC/");
    let picker = picker(reader.clone());

    let err = picker.open(&aloft_query()).await.unwrap_err();
    assert!(matches!(err, PickerError::Reader(ReaderError::OpenFailed { .. })));
    assert_eq!(err.status_code(), 502);

    // Exactly one attempt, no retry through another protocol
    assert_eq!(reader.calls().len(), 1);
    assert_eq!(picker.tracker().score_of("opendap"), Some(120.0));
    assert_eq!(picker.metrics().snapshot().request_failures, 1);
}

#[tokio::test]
async fn test_failures_steer_exploitation() {
    let reader = MockReader::default();
    reader.fail_on("/ncss/");
    let picker = picker(reader.clone());
    let query = surface_query();

    // No scores yet: lowest id wins
    let first = picker.open(&query).await;
    assert!(first.is_err());
    assert_eq!(reader.calls()[0].0, "https://data.example.org/thredds/ncss/gfs/best");

    // ncss now carries the failure penalty; opendap is unscored and ranks last,
    // so give it a real sample to compete with
    picker.report("opendap", Duration::from_millis(300)).unwrap();
    let second = picker.open(&query).await.unwrap();
    assert_eq!(second.protocol, "opendap");
}

#[test]
fn test_open_without_runtime_attribute() {
    let picker = picker(MockReader::default());
    let opened = tokio_test::block_on(picker.open(&surface_query())).unwrap();
    assert_eq!(opened.protocol, "ncss");
    assert_eq!(
        opened.url.as_str(),
        "https://data.example.org/thredds/ncss/gfs/best?var=TMP"
    );
}

#[test]
fn test_report_unknown_protocol() {
    let picker = picker(MockReader::default());
    let err = picker.report("wcs", Duration::from_secs(1)).unwrap_err();
    assert!(matches!(err, PickerError::UnknownProtocol(_)));
}

#[test]
fn test_dimension_registration_and_index_ranges() {
    let picker = picker(MockReader::default());
    let query = Query::builder(datasets::BASE_URL, datasets::GFS)
        .bbox(BoundingBox::new(10.0, 40.0, 20.0, 50.0))
        .altitude(NumericRange::point(500.0))
        .build()
        .unwrap();

    let err = picker.index_ranges(&query).unwrap_err();
    assert!(matches!(
        err,
        PickerError::Dimension(DimensionError::DatasetNotRegistered(_))
    ));
    assert_eq!(err.status_code(), 409);

    let dims = DimensionArray::builder()
        .longitude(global_longitudes())
        .latitude(global_latitudes())
        .altitude(PRESSURE_LEVELS.to_vec())
        .build();
    picker.register_dimensions(&query, dims).unwrap();

    let ranges = picker.index_ranges(&query).unwrap();
    assert_eq!(ranges.longitude, Some(IndexRange::new(10, 20)));
    assert_eq!(ranges.latitude, Some(IndexRange::new(40, 50)));
    assert_eq!(ranges.altitude, Some(IndexRange::point(4)));
    assert_eq!(ranges.time, None);

    let again = DimensionArray::builder().longitude(vec![0.0]).build();
    assert!(matches!(
        picker.register_dimensions(&query, again),
        Err(PickerError::Dimension(DimensionError::AlreadyRegistered(_)))
    ));
}
