use crate::context::{ContextError, ScanContext};
use std::collections::BTreeMap;
use thiserror::Error as ThisError;

///
/// StoreError
///
/// Failure reported by a checkpoint-store backend.
///

#[derive(Debug, ThisError)]
pub enum StoreError {
    #[error("checkpoint store: {0}")]
    Context(#[from] ContextError),

    #[error("checkpoint store backend failure: {0}")]
    Backend(String),
}

impl StoreError {
    pub fn backend(reason: impl Into<String>) -> Self {
        Self::Backend(reason.into())
    }
}

///
/// CheckpointStore
///
/// Key/value persistence for checkpoint payloads.
///
/// Contract shared by every backend:
/// - a missing key and an empty payload both mean "no checkpoint"
/// - storing an empty payload resets the checkpoint
/// - `load_prefix` returns every key starting with `prefix`
///

pub trait CheckpointStore: Send + Sync {
    fn load(&self, ctx: &ScanContext, key: &str) -> Result<Option<Vec<u8>>, StoreError>;

    fn load_prefix(
        &self,
        ctx: &ScanContext,
        prefix: &str,
    ) -> Result<BTreeMap<String, Vec<u8>>, StoreError>;

    fn store(&self, ctx: &ScanContext, key: &str, value: &[u8]) -> Result<(), StoreError>;
}
