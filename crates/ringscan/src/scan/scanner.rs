use crate::{
    checkpoint::{CheckpointStore, ScanCursorState, ScanStateRepository, split_scan_id},
    context::ScanContext,
    error::InternalError,
    obs::sink::{GLOBAL_METRICS_SINK, MetricsEvent, MetricsSink},
    ring::{TokenRange, split_token_ring},
    scan::{
        ScanIterator, ScanIteratorGroup, ScannerConfig,
        query::{ResumeMode, ScanQuery, apply_scan_predicates},
    },
    session::{RowSource, Session},
    statement::ParsedQuery,
    value::Value,
};
use std::{collections::BTreeMap, fmt, num::NonZeroUsize, sync::Arc};
use tracing::debug;

///
/// Scanner
///
/// Binds a database session and a checkpoint store, and builds single or
/// split scan iterators over them. Cheap to clone; every iterator keeps its
/// own clone.
///

#[derive(Clone)]
pub struct Scanner {
    session: Arc<dyn Session>,
    repository: ScanStateRepository,
    config: ScannerConfig,
    metrics: Option<&'static dyn MetricsSink>,
}

impl Scanner {
    #[must_use]
    pub fn new(
        store: Arc<dyn CheckpointStore>,
        session: Arc<dyn Session>,
        config: ScannerConfig,
    ) -> Self {
        Self {
            session,
            repository: ScanStateRepository::new(store),
            config,
            metrics: None,
        }
    }

    #[must_use]
    pub fn with_default_config(
        store: Arc<dyn CheckpointStore>,
        session: Arc<dyn Session>,
    ) -> Self {
        Self::new(store, session, ScannerConfig::default())
    }

    /// Route metrics events of this scanner (and its iterators) to `sink`
    /// instead of the global counters.
    #[must_use]
    pub const fn metrics_sink(mut self, sink: &'static dyn MetricsSink) -> Self {
        self.metrics = Some(sink);
        self
    }

    #[must_use]
    pub const fn config(&self) -> &ScannerConfig {
        &self.config
    }

    #[must_use]
    pub const fn repository(&self) -> &ScanStateRepository {
        &self.repository
    }

    /// Build one iterator over the whole ring.
    pub fn iterator(
        &self,
        ctx: &ScanContext,
        scan_id: &str,
        statement: &str,
        values: &[Value],
    ) -> Result<ScanIterator, InternalError> {
        let query = ScanQuery::new(statement, values.to_vec(), TokenRange::full());

        self.build_iterator(ctx, scan_id.to_string(), query)
    }

    /// Build `splits` iterators, one per ring split, keyed `<scan_id>_<i>`.
    ///
    /// Each iterator owns a disjoint range and checkpoint, so they can be
    /// driven from separate threads.
    pub fn split_iterators(
        &self,
        ctx: &ScanContext,
        scan_id: &str,
        splits: usize,
        statement: &str,
        values: &[Value],
    ) -> Result<ScanIteratorGroup, InternalError> {
        let splits = NonZeroUsize::new(splits)
            .ok_or_else(|| InternalError::scan_unsupported("split count must be positive"))?;

        split_token_ring(splits)
            .into_iter()
            .enumerate()
            .map(|(i, range)| {
                let query = ScanQuery::new(statement, values.to_vec(), range);
                self.build_iterator(ctx, split_scan_id(scan_id, i), query)
            })
            .collect::<Result<Vec<_>, _>>()
            .map(ScanIteratorGroup::new)
    }

    /// Persisted checkpoints of every sub-scan of the split scan `scan_id`.
    pub fn checkpoints(
        &self,
        ctx: &ScanContext,
        scan_id: &str,
    ) -> Result<BTreeMap<String, ScanCursorState>, InternalError> {
        let prefix = format!("{scan_id}_");
        let mut states = self.repository.load_prefix(ctx, &prefix)?;

        // Sibling scans such as `<scan_id>_extra_0` share the prefix.
        states.retain(|id, _| {
            id.strip_prefix(&prefix)
                .and_then(|index| index.parse::<usize>().ok())
                .is_some_and(|i| split_scan_id(scan_id, i) == *id)
        });

        Ok(states)
    }

    pub(crate) fn build_iterator(
        &self,
        ctx: &ScanContext,
        scan_id: String,
        query: ScanQuery,
    ) -> Result<ScanIterator, InternalError> {
        let state = self.repository.load(ctx, &scan_id)?;
        let (statement, source) = self.open(ctx, &query, state.as_ref())?;

        debug!(
            scan_id = %scan_id,
            range = %query.range(),
            resumed = state.is_some(),
            statement = %statement,
            "scan iterator built"
        );
        self.record(MetricsEvent::IteratorBuilt {
            scan_id: &scan_id,
            resumed: state.is_some(),
        });

        Ok(ScanIterator::new(
            self.clone(),
            ctx.clone(),
            scan_id,
            query,
            statement,
            source,
            state.unwrap_or_default(),
        ))
    }

    // Rewrite the caller statement for this range/checkpoint and execute it.
    fn open(
        &self,
        ctx: &ScanContext,
        query: &ScanQuery,
        state: Option<&ScanCursorState>,
    ) -> Result<(String, Box<dyn RowSource>), InternalError> {
        let mut parsed = ParsedQuery::parse(query.statement())?;

        let metadata = self
            .session
            .table_metadata(ctx, parsed.keyspace(), parsed.table())?
            .ok_or_else(|| InternalError::table_not_found(parsed.keyspace(), parsed.table()))?;
        if metadata.partition_key.is_empty() {
            return Err(InternalError::metadata_invariant(format!(
                "table {}.{} has no partition key columns",
                parsed.keyspace(),
                parsed.table()
            )));
        }

        let last_token = state.and_then(ScanCursorState::last_token);
        if let Some(last_token) = last_token {
            debug!(
                last_token,
                mode = ?ResumeMode::for_table(&metadata),
                "resuming scan from checkpoint"
            );
        }
        apply_scan_predicates(&mut parsed, &metadata, query.range(), last_token);

        let statement = parsed.to_string();
        let source = self.session.execute(ctx, &statement, query.values())?;

        Ok((statement, source))
    }

    pub(crate) fn record(&self, event: MetricsEvent<'_>) {
        self.metrics.unwrap_or(&GLOBAL_METRICS_SINK).record(event);
    }
}

impl fmt::Debug for Scanner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Scanner")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
