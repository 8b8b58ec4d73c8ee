//! Per-protocol performance history and scoring.
//!
//! Every completed request reports a metric (elapsed seconds, or the
//! failure penalty). Scores are lower-is-better; a protocol with no samples
//! has no score and ranks after every scored protocol.

use std::cmp::Ordering;
use std::collections::{HashMap, VecDeque};
use std::fmt;
use std::sync::{Mutex, PoisonError, RwLock};
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{debug, warn};

use crate::config::PickerConfig;
use crate::error::{PickerError, Result};

/// One observation of a protocol's cost.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PerformanceSample {
    pub protocol: String,
    pub metric: f64,
    pub recorded_at: DateTime<Utc>,
}

impl PerformanceSample {
    pub fn new(protocol: impl Into<String>, metric: f64) -> Self {
        Self {
            protocol: protocol.into(),
            metric,
            recorded_at: Utc::now(),
        }
    }
}

/// Folds a new metric into a protocol's aggregate score.
pub trait ScoringPolicy: Send + Sync + fmt::Debug {
    /// `count` is the number of samples including this one.
    fn update(&self, previous: Option<f64>, metric: f64, count: u64) -> f64;
}

/// Exponentially weighted moving average. The first sample seeds the score.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ewma {
    alpha: f64,
}

impl Ewma {
    /// `alpha` must lie in (0, 1].
    pub fn new(alpha: f64) -> Result<Self> {
        if !(alpha > 0.0 && alpha <= 1.0) {
            return Err(PickerError::Config(format!(
                "ewma_alpha must be within (0, 1], got {}",
                alpha
            )));
        }
        Ok(Self { alpha })
    }

    pub fn alpha(&self) -> f64 {
        self.alpha
    }
}

impl Default for Ewma {
    fn default() -> Self {
        Self { alpha: 0.3 }
    }
}

impl ScoringPolicy for Ewma {
    fn update(&self, previous: Option<f64>, metric: f64, _count: u64) -> f64 {
        match previous {
            Some(score) => self.alpha * metric + (1.0 - self.alpha) * score,
            None => metric,
        }
    }
}

/// Plain running mean over every sample ever recorded.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct MeanScore;

impl ScoringPolicy for MeanScore {
    fn update(&self, previous: Option<f64>, metric: f64, count: u64) -> f64 {
        match previous {
            Some(mean) => mean + (metric - mean) / count.max(1) as f64,
            None => metric,
        }
    }
}

#[derive(Debug, Default)]
struct ProtocolStats {
    score: Option<f64>,
    count: u64,
    history: VecDeque<PerformanceSample>,
}

/// Score summary for one protocol.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProtocolScore {
    pub protocol: String,
    pub score: Option<f64>,
    pub samples: u64,
}

/// Thread-safe store of protocol performance.
pub struct PerformanceTracker {
    stats: RwLock<HashMap<String, Mutex<ProtocolStats>>>,
    policy: Box<dyn ScoringPolicy>,
    max_history: usize,
    failure_penalty: f64,
}

impl PerformanceTracker {
    /// Tracker with the default EWMA policy and defaults from
    /// [`PickerConfig`].
    pub fn new() -> Self {
        let defaults = PickerConfig::default();
        Self::with_policy(
            Box::new(Ewma::default()),
            defaults.max_history,
            defaults.failure_penalty_secs,
        )
    }

    /// Tracker tuned by `config`, which must pass
    /// [`PickerConfig::validate`].
    pub fn from_config(config: &PickerConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self::with_policy(
            Box::new(Ewma::new(config.ewma_alpha)?),
            config.max_history,
            config.failure_penalty_secs,
        ))
    }

    pub fn with_policy(
        policy: Box<dyn ScoringPolicy>,
        max_history: usize,
        failure_penalty: f64,
    ) -> Self {
        Self {
            stats: RwLock::new(HashMap::new()),
            policy,
            max_history: max_history.max(1),
            failure_penalty,
        }
    }

    /// Record a metric for a protocol, timestamped now. Returns the updated
    /// score, or `None` if the metric was rejected.
    pub fn record(&self, protocol: &str, metric: f64) -> Option<f64> {
        self.record_sample(PerformanceSample::new(protocol, metric))
    }

    /// Record a request duration in seconds.
    pub fn record_duration(&self, protocol: &str, elapsed: Duration) -> Option<f64> {
        self.record(protocol, elapsed.as_secs_f64())
    }

    /// Record the configured failure penalty for a protocol.
    pub fn record_failure(&self, protocol: &str) -> Option<f64> {
        self.record(protocol, self.failure_penalty)
    }

    /// Fold `sample` into its protocol's stats. A valid sample is always
    /// applied, even when a concurrent [`reset`](Self::reset) removed the
    /// entry.
    pub fn record_sample(&self, sample: PerformanceSample) -> Option<f64> {
        if !sample.metric.is_finite() || sample.metric < 0.0 {
            warn!(
                protocol = %sample.protocol,
                metric = sample.metric,
                "Ignoring invalid performance metric"
            );
            return None;
        }

        {
            let map = self.stats.read().unwrap_or_else(PoisonError::into_inner);
            if let Some(entry) = map.get(&sample.protocol) {
                let mut stats = entry.lock().unwrap_or_else(PoisonError::into_inner);
                return Some(self.apply(&mut stats, sample));
            }
        }

        // First sample for this protocol: insert and update under one write lock
        let mut map = self.stats.write().unwrap_or_else(PoisonError::into_inner);
        let stats = map
            .entry(sample.protocol.clone())
            .or_default()
            .get_mut()
            .unwrap_or_else(PoisonError::into_inner);
        Some(self.apply(stats, sample))
    }

    fn apply(&self, stats: &mut ProtocolStats, sample: PerformanceSample) -> f64 {
        stats.count += 1;
        let score = self.policy.update(stats.score, sample.metric, stats.count);
        stats.score = Some(score);
        if stats.history.len() == self.max_history {
            stats.history.pop_front();
        }

        debug!(
            protocol = %sample.protocol,
            metric = sample.metric,
            score,
            samples = stats.count,
            "Recorded protocol performance"
        );
        stats.history.push_back(sample);
        score
    }

    fn with_stats<T>(&self, protocol: &str, f: impl FnOnce(&ProtocolStats) -> T) -> Option<T> {
        let map = self.stats.read().unwrap_or_else(PoisonError::into_inner);
        let entry = map.get(protocol)?;
        let stats = entry.lock().unwrap_or_else(PoisonError::into_inner);
        Some(f(&stats))
    }

    /// Aggregate score, `None` if nothing was recorded.
    pub fn score_of(&self, protocol: &str) -> Option<f64> {
        self.with_stats(protocol, |s| s.score).flatten()
    }

    /// Total samples ever recorded, including evicted ones.
    pub fn sample_count(&self, protocol: &str) -> u64 {
        self.with_stats(protocol, |s| s.count).unwrap_or(0)
    }

    /// Retained samples, oldest first.
    pub fn samples(&self, protocol: &str) -> Vec<PerformanceSample> {
        self.with_stats(protocol, |s| s.history.iter().cloned().collect())
            .unwrap_or_default()
    }

    /// The best-ranked id among `ids`: lowest score first, unscored ids
    /// last, ties broken by id.
    pub fn best_among<'a, I>(&self, ids: I) -> Option<String>
    where
        I: IntoIterator<Item = &'a str>,
    {
        ids.into_iter()
            .map(|id| (id, self.score_of(id)))
            .min_by(|(a_id, a), (b_id, b)| compare_scores(*a, *b).then_with(|| a_id.cmp(b_id)))
            .map(|(id, _)| id.to_string())
    }

    /// Scores for every protocol with recorded history, ordered by id.
    pub fn summary(&self) -> Vec<ProtocolScore> {
        let map = self.stats.read().unwrap_or_else(PoisonError::into_inner);
        let mut out: Vec<ProtocolScore> = map
            .iter()
            .map(|(id, entry)| {
                let stats = entry.lock().unwrap_or_else(PoisonError::into_inner);
                ProtocolScore {
                    protocol: id.clone(),
                    score: stats.score,
                    samples: stats.count,
                }
            })
            .collect();
        out.sort_by(|a, b| a.protocol.cmp(&b.protocol));
        out
    }

    /// Forget everything recorded for a protocol.
    pub fn reset(&self, protocol: &str) {
        self.stats
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(protocol);
    }
}

fn compare_scores(a: Option<f64>, b: Option<f64>) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) => a.total_cmp(&b),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

impl Default for PerformanceTracker {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for PerformanceTracker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PerformanceTracker")
            .field("policy", &self.policy)
            .field("max_history", &self.max_history)
            .field("failure_penalty", &self.failure_penalty)
            .field("protocols", &self.summary().len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ewma_first_sample_seeds() {
        let ewma = Ewma::new(0.3).unwrap();
        assert_eq!(ewma.update(None, 2.0, 1), 2.0);
        let next = ewma.update(Some(2.0), 1.0, 2);
        assert!((next - 1.7).abs() < 1e-12);
    }

    #[test]
    fn test_ewma_alpha_out_of_range() {
        assert!(matches!(Ewma::new(1.5), Err(PickerError::Config(_))));
        assert!(Ewma::new(0.0).is_err());
        assert!(Ewma::new(f64::NAN).is_err());
        assert_eq!(Ewma::new(1.0).unwrap().alpha(), 1.0);
    }

    #[test]
    fn test_mean_score() {
        let mean = MeanScore;
        let s1 = mean.update(None, 1.0, 1);
        let s2 = mean.update(Some(s1), 3.0, 2);
        let s3 = mean.update(Some(s2), 5.0, 3);
        assert!((s3 - 3.0).abs() < 1e-12);
    }

    #[test]
    fn test_invalid_metric_ignored() {
        let tracker = PerformanceTracker::new();
        assert_eq!(tracker.record("opendap", f64::NAN), None);
        assert_eq!(tracker.record("opendap", -1.0), None);
        assert_eq!(tracker.sample_count("opendap"), 0);
        assert_eq!(tracker.score_of("opendap"), None);
    }

    #[test]
    fn test_compare_scores_unknown_last() {
        assert_eq!(compare_scores(Some(100.0), None), Ordering::Less);
        assert_eq!(compare_scores(None, Some(0.0)), Ordering::Greater);
        assert_eq!(compare_scores(Some(1.0), Some(2.0)), Ordering::Less);
    }

    #[test]
    fn test_reset() {
        let tracker = PerformanceTracker::new();
        tracker.record("wcs", 1.0);
        tracker.reset("wcs");
        assert_eq!(tracker.score_of("wcs"), None);
        assert!(tracker.summary().is_empty());
    }
}
