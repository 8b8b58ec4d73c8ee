//! The dataset reader collaborator.
//!
//! The picker never talks to the network itself; it hands the composed
//! request to a [`DatasetReader`] and keeps the returned handle open until
//! the caller closes it.

use async_trait::async_trait;
use dimension_index::{DatasetHandle, ReaderError};

#[async_trait]
pub trait DatasetReader: Send + Sync {
    /// Open `dataset_id` at `base_uri` using the protocol-specific query.
    ///
    /// `base_uri` is the request URL without its query component.
    async fn open(
        &self,
        base_uri: &str,
        translated_query: &str,
        dataset_id: &str,
    ) -> Result<Box<dyn DatasetHandle>, ReaderError>;
}
