//! Common test fixtures.

use std::sync::{Arc, Mutex};

/// Common bounding box definitions for testing, as (west, south, east, north).
pub mod bbox {
    /// Global bounding box (-180 to 180, -90 to 90)
    pub const GLOBAL: (f64, f64, f64, f64) = (-180.0, -90.0, 180.0, 90.0);

    /// Continental United States bounding box
    pub const CONUS: (f64, f64, f64, f64) = (-130.0, 20.0, -60.0, 55.0);

    /// Europe bounding box
    pub const EUROPE: (f64, f64, f64, f64) = (-15.0, 35.0, 45.0, 72.0);
}

/// Dataset locations used across tests.
pub mod datasets {
    /// Server root
    pub const BASE_URL: &str = "https://data.example.org/thredds";

    /// GFS best time series
    pub const GFS: &str = "gfs/best";

    /// Ocean reanalysis
    pub const OCEAN: &str = "ocean/reanalysis";

    /// Dataset key for [`GFS`]
    pub fn gfs_key() -> String {
        format!("{}/{}", BASE_URL, GFS)
    }

    /// Dataset key for [`OCEAN`]
    pub fn ocean_key() -> String {
        format!("{}/{}", BASE_URL, OCEAN)
    }
}

/// Isobaric levels in hPa, surface first.
pub const PRESSURE_LEVELS: [f32; 6] = [1000.0, 925.0, 850.0, 700.0, 500.0, 250.0];

/// Records the order in which named resources were released.
///
/// Clones share the same log, so a handle can hold one clone while the test
/// inspects another.
#[derive(Debug, Clone, Default)]
pub struct CloseLog {
    entries: Arc<Mutex<Vec<String>>>,
}

impl CloseLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&self, name: impl Into<String>) {
        self.entries.lock().unwrap().push(name.into());
    }

    pub fn entries(&self) -> Vec<String> {
        self.entries.lock().unwrap().clone()
    }
}
