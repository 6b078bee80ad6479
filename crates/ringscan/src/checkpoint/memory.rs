use crate::{
    checkpoint::{CheckpointStore, StoreError},
    context::ScanContext,
};
use std::{
    collections::BTreeMap,
    sync::{PoisonError, RwLock},
};

///
/// MemoryStore
///
/// Process-local checkpoint store. Survives iterator rebuilds and scanner
/// re-creation within one process, not process restarts.
///

#[derive(Debug, Default)]
pub struct MemoryStore {
    data: RwLock<BTreeMap<String, Vec<u8>>>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of keys currently holding a checkpoint.
    #[must_use]
    pub fn len(&self) -> usize {
        self.data.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn poisoned<T>(_: PoisonError<T>) -> StoreError {
    StoreError::backend("memory store lock poisoned")
}

impl CheckpointStore for MemoryStore {
    fn load(&self, ctx: &ScanContext, key: &str) -> Result<Option<Vec<u8>>, StoreError> {
        ctx.check()?;
        let data = self.data.read().map_err(poisoned)?;

        Ok(data.get(key).cloned())
    }

    fn load_prefix(
        &self,
        ctx: &ScanContext,
        prefix: &str,
    ) -> Result<BTreeMap<String, Vec<u8>>, StoreError> {
        ctx.check()?;
        let data = self.data.read().map_err(poisoned)?;

        Ok(data
            .range(prefix.to_string()..)
            .take_while(|(key, _)| key.starts_with(prefix))
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect())
    }

    fn store(&self, ctx: &ScanContext, key: &str, value: &[u8]) -> Result<(), StoreError> {
        ctx.check()?;
        let mut data = self.data.write().map_err(poisoned)?;

        if value.is_empty() {
            data.remove(key);
        } else {
            data.insert(key.to_string(), value.to_vec());
        }

        Ok(())
    }
}
