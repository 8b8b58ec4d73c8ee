//! The dataset query handed to protocol selection and index resolution.

use serde::{Deserialize, Serialize};

use crate::bbox::BoundingBox;
use crate::error::{QueryError, QueryResult};
use crate::range::NumericRange;
use crate::time::TimeRange;

/// A request for a subset of one remote dataset.
///
/// Built once per request through [`QueryBuilder`] and not mutated
/// afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Query {
    base_url: String,
    dataset: String,
    bbox: Option<BoundingBox>,
    time: Option<TimeRange>,
    altitude: Option<NumericRange>,
    parameters: Vec<String>,
}

impl Query {
    pub fn builder(base_url: impl Into<String>, dataset: impl Into<String>) -> QueryBuilder {
        QueryBuilder::new(base_url, dataset)
    }

    /// Server root, without trailing slash.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Dataset identifier relative to the server root.
    pub fn dataset(&self) -> &str {
        &self.dataset
    }

    pub fn bbox(&self) -> Option<&BoundingBox> {
        self.bbox.as_ref()
    }

    pub fn time(&self) -> Option<&TimeRange> {
        self.time.as_ref()
    }

    pub fn altitude(&self) -> Option<&NumericRange> {
        self.altitude.as_ref()
    }

    pub fn parameters(&self) -> &[String] {
        &self.parameters
    }

    /// Key identifying the dataset in the dimension cache:
    /// `<base_url>/<dataset>`, never carrying a query component.
    pub fn dataset_key(&self) -> String {
        format!("{}/{}", self.base_url, self.dataset)
    }

    /// True if the query constrains any axis at all.
    pub fn is_subset(&self) -> bool {
        self.bbox.is_some() || self.time.is_some() || self.altitude.is_some()
    }
}

/// Builder for [`Query`].
#[derive(Debug, Clone)]
pub struct QueryBuilder {
    base_url: String,
    dataset: String,
    bbox: Option<BoundingBox>,
    time: Option<TimeRange>,
    altitude: Option<NumericRange>,
    parameters: Vec<String>,
}

impl QueryBuilder {
    pub fn new(base_url: impl Into<String>, dataset: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            dataset: dataset.into(),
            bbox: None,
            time: None,
            altitude: None,
            parameters: Vec::new(),
        }
    }

    pub fn bbox(mut self, bbox: BoundingBox) -> Self {
        self.bbox = Some(bbox);
        self
    }

    pub fn time(mut self, time: TimeRange) -> Self {
        self.time = Some(time);
        self
    }

    pub fn altitude(mut self, altitude: NumericRange) -> Self {
        self.altitude = Some(altitude);
        self
    }

    pub fn parameter(mut self, name: impl Into<String>) -> Self {
        self.parameters.push(name.into());
        self
    }

    pub fn parameters<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.parameters.extend(names.into_iter().map(Into::into));
        self
    }

    /// Validate and freeze the query.
    pub fn build(self) -> QueryResult<Query> {
        let base_url = self.base_url.trim_end_matches('/').to_string();
        if base_url.is_empty() {
            return Err(QueryError::MissingField("base_url"));
        }
        if self.dataset.is_empty() {
            return Err(QueryError::MissingField("dataset"));
        }
        if base_url.contains('?') {
            return Err(QueryError::InvalidDatasetKey(base_url));
        }
        if self.dataset.contains('?') {
            return Err(QueryError::InvalidDatasetKey(self.dataset));
        }

        if let Some(bbox) = &self.bbox {
            if bbox.crosses_antimeridian() {
                return Err(QueryError::invalid_range(
                    "bbox",
                    format!(
                        "west {} is east of east {}; split boxes crossing the antimeridian",
                        bbox.west, bbox.east
                    ),
                ));
            }
            if !bbox.is_valid_geographic() {
                return Err(QueryError::invalid_range(
                    "bbox",
                    format!("{:?} is not a valid geographic box", bbox),
                ));
            }
        }
        if let Some(time) = &self.time {
            if time.start > time.end {
                return Err(QueryError::invalid_range("time", "start is after end"));
            }
        }
        if let Some(alt) = &self.altitude {
            if !alt.start.is_finite() || !alt.end.is_finite() {
                return Err(QueryError::invalid_range("altitude", "bounds must be finite"));
            }
        }

        Ok(Query {
            base_url,
            dataset: self.dataset.trim_start_matches('/').to_string(),
            bbox: self.bbox,
            time: self.time,
            altitude: self.altitude,
            parameters: self.parameters,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dataset_key() {
        let q = Query::builder("http://data.example.org/thredds/", "/gfs/best")
            .build()
            .unwrap();
        assert_eq!(q.dataset_key(), "http://data.example.org/thredds/gfs/best");
        assert!(!q.is_subset());
    }

    #[test]
    fn test_reject_query_component() {
        let err = Query::builder("http://host", "ds?var=1").build().unwrap_err();
        assert!(matches!(err, QueryError::InvalidDatasetKey(_)));
    }

    #[test]
    fn test_reject_missing_dataset() {
        let err = Query::builder("http://host", "").build().unwrap_err();
        assert!(matches!(err, QueryError::MissingField("dataset")));
    }
}
