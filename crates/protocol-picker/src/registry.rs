//! Registered protocol candidates, keyed by id.

use std::collections::BTreeMap;
use std::sync::Arc;

use geo_query::Query;
use tracing::{debug, info};

use crate::config::UrlAbbreviations;
use crate::error::{PickerError, Result};
use crate::protocol::{FnProtocol, ProtocolCandidate};

#[derive(Debug, Default, Clone)]
pub struct ProtocolRegistry {
    protocols: BTreeMap<String, Arc<dyn ProtocolCandidate>>,
}

impl ProtocolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a candidate. Fails if its id is already taken.
    pub fn register(&mut self, protocol: Arc<dyn ProtocolCandidate>) -> Result<()> {
        let id = protocol.id().to_string();
        if self.protocols.contains_key(&id) {
            return Err(PickerError::DuplicateProtocol(id));
        }
        debug!(protocol = %id, abbreviation = protocol.url_abbreviation(), "Registered protocol");
        self.protocols.insert(id, protocol);
        Ok(())
    }

    /// Add a closure-backed protocol whose URL abbreviation comes from
    /// configuration.
    pub fn register_fn<A, C, T>(
        &mut self,
        abbreviations: &A,
        id: &str,
        capability: C,
        translation: T,
    ) -> Result<()>
    where
        A: UrlAbbreviations + ?Sized,
        C: Fn(&Query) -> bool + Send + Sync + 'static,
        T: Fn(&Query) -> Result<String> + Send + Sync + 'static,
    {
        let abbreviation = abbreviations
            .url_abbreviation_for(id)
            .ok_or_else(|| PickerError::UnknownProtocol(id.to_string()))?;
        self.register(Arc::new(FnProtocol::new(
            id,
            abbreviation,
            capability,
            translation,
        )))
    }

    pub fn get(&self, id: &str) -> Option<Arc<dyn ProtocolCandidate>> {
        self.protocols.get(id).cloned()
    }

    /// All candidates in id order.
    pub fn candidates(&self) -> Vec<Arc<dyn ProtocolCandidate>> {
        self.protocols.values().cloned().collect()
    }

    pub fn ids(&self) -> Vec<&str> {
        self.protocols.keys().map(String::as_str).collect()
    }

    pub fn len(&self) -> usize {
        self.protocols.len()
    }

    pub fn is_empty(&self) -> bool {
        self.protocols.is_empty()
    }

    /// Log the registered set once at startup.
    pub fn log_summary(&self) {
        info!(protocols = ?self.ids(), "Protocol registry ready");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn always(id: &str) -> Arc<dyn ProtocolCandidate> {
        Arc::new(FnProtocol::new(id, id, |_| true, |_| Ok(String::new())))
    }

    #[test]
    fn test_duplicate_rejected() {
        let mut registry = ProtocolRegistry::new();
        registry.register(always("opendap")).unwrap();
        let err = registry.register(always("opendap")).unwrap_err();
        assert!(matches!(err, PickerError::DuplicateProtocol(id) if id == "opendap"));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_candidates_in_id_order() {
        let mut registry = ProtocolRegistry::new();
        registry.register(always("wcs")).unwrap();
        registry.register(always("ncss")).unwrap();
        registry.register(always("opendap")).unwrap();
        assert_eq!(registry.ids(), vec!["ncss", "opendap", "wcs"]);
    }

    #[test]
    fn test_register_fn_resolves_abbreviation() {
        let mut abbreviations = HashMap::new();
        abbreviations.insert("opendap".to_string(), "dodsC".to_string());

        let mut registry = ProtocolRegistry::new();
        registry
            .register_fn(&abbreviations, "opendap", |_| true, |_| Ok(String::new()))
            .unwrap();
        assert_eq!(registry.get("opendap").unwrap().url_abbreviation(), "dodsC");

        let err = registry
            .register_fn(&abbreviations, "wcs", |_| true, |_| Ok(String::new()))
            .unwrap_err();
        assert!(matches!(err, PickerError::UnknownProtocol(_)));
    }
}
