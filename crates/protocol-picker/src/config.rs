//! Picker configuration.
//!
//! Tuning values come from [`PickerConfig`] (defaults, environment, or the
//! `picker:` section of a protocols file). The protocols file maps each
//! protocol id to the path segment the server exposes it under:
//!
//! ```yaml
//! protocols:
//!   opendap:
//!     url_abbreviation: dodsC
//!   ncss:
//!     url_abbreviation: ${NCSS_PATH:-ncss}
//!   wcs:
//!     url_abbreviation: wcs
//!     enabled: false
//! picker:
//!   exploration_probability: 0.1
//!   ewma_alpha: 0.3
//! ```

use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::{PickerError, Result as PickerResult};

// ============================================================================
// Tuning
// ============================================================================

/// Tuning for the decision engine and performance tracker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PickerConfig {
    /// Probability of exploring a random capable protocol instead of the
    /// best-scoring one.
    pub exploration_probability: f64,

    /// Weight of the newest sample in the EWMA score.
    pub ewma_alpha: f64,

    /// Metric recorded for a failed request, in seconds.
    pub failure_penalty_secs: f64,

    /// Samples retained per protocol.
    pub max_history: usize,
}

impl Default for PickerConfig {
    fn default() -> Self {
        Self {
            exploration_probability: 0.1,
            ewma_alpha: 0.3,
            failure_penalty_secs: 60.0,
            max_history: 256,
        }
    }
}

impl PickerConfig {
    /// Load configuration from environment variables, falling back to
    /// defaults for unset or unparsable values. The merged result must pass
    /// [`validate`](Self::validate).
    pub fn from_env() -> PickerResult<Self> {
        let mut config = Self::default();

        if let Ok(val) = std::env::var("PICKER_EXPLORATION_PROBABILITY") {
            if let Ok(p) = val.parse() {
                config.exploration_probability = p;
            }
        }

        if let Ok(val) = std::env::var("PICKER_EWMA_ALPHA") {
            if let Ok(alpha) = val.parse() {
                config.ewma_alpha = alpha;
            }
        }

        if let Ok(val) = std::env::var("PICKER_FAILURE_PENALTY_SECS") {
            if let Ok(secs) = val.parse() {
                config.failure_penalty_secs = secs;
            }
        }

        if let Ok(val) = std::env::var("PICKER_MAX_HISTORY") {
            if let Ok(n) = val.parse() {
                config.max_history = n;
            }
        }

        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration.
    pub fn validate(&self) -> PickerResult<()> {
        if !(0.0..=1.0).contains(&self.exploration_probability) {
            return Err(PickerError::Config(format!(
                "exploration_probability must be within [0, 1], got {}",
                self.exploration_probability
            )));
        }
        if !(self.ewma_alpha > 0.0 && self.ewma_alpha <= 1.0) {
            return Err(PickerError::Config(format!(
                "ewma_alpha must be within (0, 1], got {}",
                self.ewma_alpha
            )));
        }
        if !self.failure_penalty_secs.is_finite() || self.failure_penalty_secs < 0.0 {
            return Err(PickerError::Config(format!(
                "failure_penalty_secs must be a non-negative number, got {}",
                self.failure_penalty_secs
            )));
        }
        if self.max_history == 0 {
            return Err(PickerError::Config(
                "max_history must be greater than 0".to_string(),
            ));
        }
        Ok(())
    }
}

// ============================================================================
// Protocol abbreviations
// ============================================================================

/// Lookup of the server path segment for a protocol id.
pub trait UrlAbbreviations {
    fn url_abbreviation_for(&self, protocol_id: &str) -> Option<String>;
}

impl UrlAbbreviations for HashMap<String, String> {
    fn url_abbreviation_for(&self, protocol_id: &str) -> Option<String> {
        self.get(protocol_id).cloned()
    }
}

/// Contents of a protocols YAML file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProtocolsConfig {
    pub protocols: BTreeMap<String, ProtocolEntry>,

    #[serde(default)]
    pub picker: PickerConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProtocolEntry {
    pub url_abbreviation: String,

    #[serde(default = "default_true")]
    pub enabled: bool,
}

fn default_true() -> bool {
    true
}

impl ProtocolsConfig {
    /// Parse YAML content, expanding `${VAR}` references first.
    pub fn from_yaml_str(content: &str) -> Result<Self> {
        let expanded = expand_env_vars(content)?;

        let config: ProtocolsConfig =
            serde_yaml::from_str(&expanded).context("Failed to parse protocols config YAML")?;

        validate_protocols_config(&config)?;

        Ok(config)
    }

    /// Ids of enabled protocols, in id order.
    pub fn enabled_ids(&self) -> Vec<&str> {
        self.protocols
            .iter()
            .filter(|(_, entry)| entry.enabled)
            .map(|(id, _)| id.as_str())
            .collect()
    }
}

impl UrlAbbreviations for ProtocolsConfig {
    fn url_abbreviation_for(&self, protocol_id: &str) -> Option<String> {
        self.protocols
            .get(protocol_id)
            .filter(|entry| entry.enabled)
            .map(|entry| entry.url_abbreviation.clone())
    }
}

/// Load and validate a protocols YAML file with environment variable
/// substitution.
pub fn load_protocols_config<P: AsRef<Path>>(path: P) -> Result<ProtocolsConfig> {
    let content = fs::read_to_string(path.as_ref())
        .with_context(|| format!("Failed to read protocols config from {:?}", path.as_ref()))?;

    let config = ProtocolsConfig::from_yaml_str(&content)
        .with_context(|| format!("Invalid protocols config {:?}", path.as_ref()))?;

    info!(
        path = %path.as_ref().display(),
        protocols = config.protocols.len(),
        enabled = config.enabled_ids().len(),
        "Loaded protocols config"
    );

    Ok(config)
}

// ============================================================================
// Environment Variable Expansion
// ============================================================================

/// Substitute `${NAME}` and `${NAME:-fallback}` references.
///
/// A fallback is used when the variable is unset or empty. Without a
/// fallback the variable must be set. References do not nest.
fn expand_env_vars(content: &str) -> Result<String> {
    let mut out = String::with_capacity(content.len());
    let mut rest = content;

    while let Some(start) = rest.find("${") {
        out.push_str(&rest[..start]);
        let body = &rest[start + 2..];
        let end = body.find('}').with_context(|| {
            let head: String = body.chars().take(32).collect();
            format!("Unterminated reference in protocols config: ${{{}", head)
        })?;
        out.push_str(&lookup_env(&body[..end])?);
        rest = &body[end + 1..];
    }

    out.push_str(rest);
    Ok(out)
}

fn lookup_env(reference: &str) -> Result<String> {
    let (name, fallback) = match reference.split_once(":-") {
        Some((name, fallback)) => (name.trim(), Some(fallback)),
        None => (reference.trim(), None),
    };
    anyhow::ensure!(!name.is_empty(), "Empty variable name in ${{{}}}", reference);

    match std::env::var(name) {
        Ok(value) if fallback.is_none() || !value.is_empty() => Ok(value),
        _ => fallback
            .map(str::to_string)
            .with_context(|| format!("Environment variable {} is not set", name)),
    }
}

// ============================================================================
// Validation
// ============================================================================

fn validate_protocols_config(config: &ProtocolsConfig) -> Result<()> {
    anyhow::ensure!(
        !config.protocols.is_empty(),
        "At least one protocol must be configured"
    );

    for (id, entry) in &config.protocols {
        anyhow::ensure!(!id.trim().is_empty(), "Protocol id cannot be empty");

        let abbrev = entry.url_abbreviation.trim_matches('/');
        anyhow::ensure!(
            !abbrev.is_empty(),
            "Protocol {} has an empty url_abbreviation",
            id
        );
        anyhow::ensure!(
            abbrev
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.' | '/')),
            "Protocol {} has a url_abbreviation that is not URL-safe: {:?}",
            id,
            entry.url_abbreviation
        );
    }

    config
        .picker
        .validate()
        .map_err(|e| anyhow::anyhow!("Invalid picker section: {}", e))?;

    Ok(())
}
