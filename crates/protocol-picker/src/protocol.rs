//! Protocol candidates.
//!
//! A candidate is anything that can say whether it expresses a query and,
//! if so, translate it into its own query syntax. New protocols are added
//! by implementing [`ProtocolCandidate`] or by wrapping closures in
//! [`FnProtocol`].

use std::fmt;

use geo_query::Query;
use reqwest::Url;

use crate::error::Result;
use crate::translation::compose_url;

/// A remote-access protocol able to serve some subset of queries.
pub trait ProtocolCandidate: Send + Sync {
    /// Stable identifier, also used to order candidates deterministically.
    fn id(&self) -> &str;

    /// Short path segment for this protocol on the server (e.g. `dodsC`).
    fn url_abbreviation(&self) -> &str;

    /// Whether this protocol can express the whole query. Must depend only
    /// on the query content.
    fn can_translate(&self, query: &Query) -> bool;

    /// The protocol-specific query string (the part after `?`).
    fn translate(&self, query: &Query) -> Result<String>;

    /// Full request URL for the query.
    fn translated_url(&self, query: &Query) -> Result<Url> {
        let translated = self.translate(query)?;
        compose_url(
            query.base_url(),
            self.url_abbreviation(),
            query.dataset(),
            &translated,
        )
    }
}

impl fmt::Debug for dyn ProtocolCandidate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProtocolCandidate")
            .field("id", &self.id())
            .field("url_abbreviation", &self.url_abbreviation())
            .finish()
    }
}

type CapabilityFn = Box<dyn Fn(&Query) -> bool + Send + Sync>;
type TranslateFn = Box<dyn Fn(&Query) -> Result<String> + Send + Sync>;

/// A protocol assembled from a capability predicate and a translation
/// function.
///
/// # Example
///
/// ```
/// use protocol_picker::FnProtocol;
///
/// let ncss = FnProtocol::new(
///     "ncss",
///     "ncss",
///     |q| q.altitude().is_none(),
///     |q| Ok(format!("var={}", q.parameters().join(","))),
/// );
/// ```
pub struct FnProtocol {
    id: String,
    abbreviation: String,
    capability: CapabilityFn,
    translation: TranslateFn,
}

impl FnProtocol {
    pub fn new<C, T>(
        id: impl Into<String>,
        abbreviation: impl Into<String>,
        capability: C,
        translation: T,
    ) -> Self
    where
        C: Fn(&Query) -> bool + Send + Sync + 'static,
        T: Fn(&Query) -> Result<String> + Send + Sync + 'static,
    {
        Self {
            id: id.into(),
            abbreviation: abbreviation.into(),
            capability: Box::new(capability),
            translation: Box::new(translation),
        }
    }
}

impl ProtocolCandidate for FnProtocol {
    fn id(&self) -> &str {
        &self.id
    }

    fn url_abbreviation(&self) -> &str {
        &self.abbreviation
    }

    fn can_translate(&self, query: &Query) -> bool {
        (self.capability)(query)
    }

    fn translate(&self, query: &Query) -> Result<String> {
        (self.translation)(query)
    }
}

impl fmt::Debug for FnProtocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnProtocol")
            .field("id", &self.id)
            .field("abbreviation", &self.abbreviation)
            .finish()
    }
}
