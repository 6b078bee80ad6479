//! Checkpoint persistence.
//!
//! [`CheckpointStore`] is the pluggable byte-level backend contract;
//! [`ScanStateRepository`] layers the [`ScanCursorState`] record encoding
//! on top of it.

mod codec;
mod memory;
mod state;
mod store;

use crate::{context::ScanContext, error::InternalError};
use codec::{decode_state, encode_state};
use std::{collections::BTreeMap, fmt, sync::Arc};

pub use memory::MemoryStore;
pub use state::ScanCursorState;
pub use store::{CheckpointStore, StoreError};

/// Upper bound for one encoded checkpoint record.
pub const MAX_CHECKPOINT_BYTES: usize = 4 * 1024;

/// Key of the `index`-th sub-scan of a split scan.
#[must_use]
pub fn split_scan_id(scan_id: &str, index: usize) -> String {
    format!("{scan_id}_{index}")
}

///
/// ScanStateRepository
///
/// Encodes and decodes [`ScanCursorState`] records through a
/// [`CheckpointStore`]. Decode failures are data-integrity errors and are
/// always surfaced.
///

#[derive(Clone)]
pub struct ScanStateRepository {
    store: Arc<dyn CheckpointStore>,
}

impl ScanStateRepository {
    #[must_use]
    pub fn new(store: Arc<dyn CheckpointStore>) -> Self {
        Self { store }
    }

    /// Load the checkpoint for `id`; `None` when none was ever stored or it
    /// was reset.
    pub fn load(
        &self,
        ctx: &ScanContext,
        id: &str,
    ) -> Result<Option<ScanCursorState>, InternalError> {
        match self.store.load(ctx, id)? {
            Some(bytes) if !bytes.is_empty() => decode_state(id, &bytes).map(Some),
            _ => Ok(None),
        }
    }

    /// Persist `state` under `id`; `None` resets the checkpoint.
    pub fn store(
        &self,
        ctx: &ScanContext,
        id: &str,
        state: Option<&ScanCursorState>,
    ) -> Result<(), InternalError> {
        let encoded = match state {
            Some(state) => encode_state(id, state)?,
            None => Vec::new(),
        };

        self.store.store(ctx, id, &encoded)?;

        Ok(())
    }

    /// Load every checkpoint whose id starts with `prefix`.
    ///
    /// Reset entries (empty payloads) are omitted.
    pub fn load_prefix(
        &self,
        ctx: &ScanContext,
        prefix: &str,
    ) -> Result<BTreeMap<String, ScanCursorState>, InternalError> {
        self.store
            .load_prefix(ctx, prefix)?
            .into_iter()
            .filter(|(_, bytes)| !bytes.is_empty())
            .map(|(id, bytes)| {
                let state = decode_state(&id, &bytes)?;
                Ok((id, state))
            })
            .collect()
    }
}

impl fmt::Debug for ScanStateRepository {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScanStateRepository").finish_non_exhaustive()
    }
}
