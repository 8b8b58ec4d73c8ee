//! Composition of the outbound request URL.
//!
//! Every protocol shares one wire template:
//!
//! ```text
//! <base_url>/<url_abbreviation>/<dataset>?<protocol_specific_query>
//! ```
//!
//! Only the protocol-specific query differs between protocols.

use reqwest::Url;

use crate::error::{PickerError, Result};

/// Build and validate the request URL for a translated query.
///
/// Whitespace and control characters anywhere in the composed string are
/// rejected rather than silently percent-encoded.
pub fn compose_url(
    base_url: &str,
    abbreviation: &str,
    dataset: &str,
    translated_query: &str,
) -> Result<Url> {
    let abbreviation = abbreviation.trim_matches('/');
    let dataset = dataset.trim_start_matches('/');

    let raw = format!(
        "{}/{}/{}?{}",
        base_url.trim_end_matches('/'),
        abbreviation,
        dataset,
        translated_query
    );

    if abbreviation.is_empty() {
        return Err(PickerError::translation(raw, "empty protocol URL abbreviation"));
    }
    if dataset.is_empty() {
        return Err(PickerError::translation(raw, "empty dataset identifier"));
    }
    if dataset.contains('?') {
        return Err(PickerError::translation(
            raw,
            "dataset identifier must not contain a query component",
        ));
    }
    if let Some(c) = raw.chars().find(|c| c.is_whitespace() || c.is_control()) {
        return Err(PickerError::translation(
            raw.clone(),
            format!("illegal character {:?}", c),
        ));
    }

    let url = Url::parse(&raw).map_err(|e| PickerError::translation(raw.clone(), e.to_string()))?;
    if url.cannot_be_a_base() {
        return Err(PickerError::translation(raw, "not a hierarchical URL"));
    }
    Ok(url)
}

/// The URL without its query, i.e. the address of the dataset endpoint.
pub fn endpoint_of(url: &Url) -> String {
    let mut endpoint = url.clone();
    endpoint.set_query(None);
    endpoint.to_string()
}
