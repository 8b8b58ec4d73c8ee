//! ε-greedy protocol selection.
//!
//! ```text
//! candidates ──► capability filter ──► 0 left ──► NoSuitable
//!                                 ├─► 1 left ──► OnlyCandidate
//!                                 └─► 2+ left ──► u < ε ? Explore : Exploit
//! ```

use std::fmt;
use std::sync::Arc;

use geo_query::Query;
use tracing::debug;

use crate::config::PickerConfig;
use crate::error::Result;
use crate::performance::PerformanceTracker;
use crate::protocol::ProtocolCandidate;
use crate::random::{RandomSource, ThreadRandom};

/// Result of a selection.
#[derive(Clone)]
pub enum Outcome {
    NoSuitableProtocol,
    Chosen(Arc<dyn ProtocolCandidate>),
}

impl Outcome {
    pub fn chosen(&self) -> Option<&Arc<dyn ProtocolCandidate>> {
        match self {
            Outcome::Chosen(p) => Some(p),
            Outcome::NoSuitableProtocol => None,
        }
    }

    pub fn chosen_id(&self) -> Option<&str> {
        self.chosen().map(|p| p.id())
    }
}

impl fmt::Debug for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Outcome::NoSuitableProtocol => f.write_str("NoSuitableProtocol"),
            Outcome::Chosen(p) => f.debug_tuple("Chosen").field(&p.id()).finish(),
        }
    }
}

/// Which branch of the selection produced the outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Decision {
    NoSuitable,
    OnlyCandidate,
    Explore,
    Exploit,
}

impl Decision {
    pub fn as_str(&self) -> &'static str {
        match self {
            Decision::NoSuitable => "no_suitable",
            Decision::OnlyCandidate => "only_candidate",
            Decision::Explore => "explore",
            Decision::Exploit => "exploit",
        }
    }
}

impl fmt::Display for Decision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An outcome together with the branch that produced it.
#[derive(Debug, Clone)]
pub struct Selection {
    pub outcome: Outcome,
    pub decision: Decision,
    /// Number of candidates that passed the capability filter.
    pub capable: usize,
}

/// Stateless chooser over a shared tracker and random source.
pub struct DecisionEngine {
    tracker: Arc<PerformanceTracker>,
    random: Arc<dyn RandomSource>,
    exploration_probability: f64,
}

impl DecisionEngine {
    pub fn new(tracker: Arc<PerformanceTracker>, config: &PickerConfig) -> Result<Self> {
        Self::with_random(tracker, Arc::new(ThreadRandom), config)
    }

    /// Engine drawing from `random`. Fails if `config` does not validate.
    pub fn with_random(
        tracker: Arc<PerformanceTracker>,
        random: Arc<dyn RandomSource>,
        config: &PickerConfig,
    ) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            tracker,
            random,
            exploration_probability: config.exploration_probability,
        })
    }

    pub fn exploration_probability(&self) -> f64 {
        self.exploration_probability
    }

    pub fn tracker(&self) -> &Arc<PerformanceTracker> {
        &self.tracker
    }

    pub fn select(&self, candidates: &[Arc<dyn ProtocolCandidate>], query: &Query) -> Outcome {
        self.select_with_trace(candidates, query).outcome
    }

    pub fn select_with_trace(
        &self,
        candidates: &[Arc<dyn ProtocolCandidate>],
        query: &Query,
    ) -> Selection {
        let mut capable: Vec<&Arc<dyn ProtocolCandidate>> = candidates
            .iter()
            .filter(|p| p.can_translate(query))
            .collect();
        capable.sort_by(|a, b| a.id().cmp(b.id()));

        let (outcome, decision) = match capable.as_slice() {
            [] => (Outcome::NoSuitableProtocol, Decision::NoSuitable),
            [only] => (Outcome::Chosen(Arc::clone(only)), Decision::OnlyCandidate),
            many => {
                if self.random.next_f64() < self.exploration_probability {
                    let pick = many[self.random.next_index(many.len())];
                    (Outcome::Chosen(Arc::clone(pick)), Decision::Explore)
                } else {
                    let best = self.tracker.best_among(many.iter().map(|p| p.id()));
                    // best_among returns one of the given ids when non-empty
                    let pick = best
                        .and_then(|id| many.iter().find(|p| p.id() == id))
                        .unwrap_or(&many[0]);
                    (Outcome::Chosen(Arc::clone(pick)), Decision::Exploit)
                }
            }
        };

        debug!(
            dataset = %query.dataset_key(),
            capable = capable.len(),
            decision = decision.as_str(),
            protocol = outcome.chosen_id().unwrap_or("-"),
            "Protocol selection"
        );

        Selection {
            outcome,
            decision,
            capable: capable.len(),
        }
    }
}

impl fmt::Debug for DecisionEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DecisionEngine")
            .field("exploration_probability", &self.exploration_probability)
            .field("tracker", &self.tracker)
            .finish()
    }
}
