//! In-memory collaborators for unit tests.
//!
//! `FakeCluster` behaves like a ring-partitioned database for the subset of
//! CQL the scanner emits: rows come back in token order and `token(...)`
//! predicates are honored.

use crate::{
    checkpoint::{CheckpointStore, MemoryStore, StoreError},
    context::ScanContext,
    obs::{MetricsEvent, MetricsSink},
    session::{RowSource, Session, SessionError, TableMetadata},
    statement::ParsedQuery,
    value::Value,
};
use std::{
    collections::{BTreeMap, VecDeque},
    sync::{
        Mutex,
        atomic::{AtomicBool, Ordering},
    },
};
use xxhash_rust::xxh3::xxh3_64;

///
/// FakeRow
///

#[derive(Clone, Debug)]
struct FakeRow {
    token: i64,
    cells: BTreeMap<String, Value>,
}

///
/// FakeTable
///

#[derive(Clone, Debug)]
struct FakeTable {
    metadata: TableMetadata,
    columns: Vec<String>,
    rows: Vec<FakeRow>,
}

///
/// FakeCluster
///

#[derive(Debug, Default)]
pub(crate) struct FakeCluster {
    tables: Mutex<BTreeMap<(String, String), FakeTable>>,
    executed: Mutex<Vec<String>>,
    fetch_failure_after: Mutex<Option<usize>>,
}

impl FakeCluster {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn create_table(
        &self,
        keyspace: &str,
        table: &str,
        metadata: TableMetadata,
        columns: &[&str],
    ) {
        self.tables.lock().expect("tables lock").insert(
            (keyspace.to_string(), table.to_string()),
            FakeTable {
                metadata,
                columns: columns.iter().map(ToString::to_string).collect(),
                rows: Vec::new(),
            },
        );
    }

    /// Insert a row; its token is derived from the partition key columns.
    pub(crate) fn insert(&self, keyspace: &str, table: &str, cells: &[(&str, Value)]) {
        let mut tables = self.tables.lock().expect("tables lock");
        let table = tables
            .get_mut(&(keyspace.to_string(), table.to_string()))
            .expect("table must exist");
        let cells: BTreeMap<_, _> = cells
            .iter()
            .map(|(name, value)| ((*name).to_string(), value.clone()))
            .collect();
        let token = token_of(&table.metadata, &cells);

        push_row(table, FakeRow { token, cells });
    }

    /// Insert a row at an explicit token.
    pub(crate) fn insert_at(
        &self,
        keyspace: &str,
        table: &str,
        token: i64,
        cells: &[(&str, Value)],
    ) {
        let mut tables = self.tables.lock().expect("tables lock");
        let table = tables
            .get_mut(&(keyspace.to_string(), table.to_string()))
            .expect("table must exist");
        let cells = cells
            .iter()
            .map(|(name, value)| ((*name).to_string(), value.clone()))
            .collect();

        push_row(table, FakeRow { token, cells });
    }

    /// Make the next executed statement stop after `rows` rows with a fetch error.
    pub(crate) fn fail_next_fetch_after(&self, rows: usize) {
        *self.fetch_failure_after.lock().expect("failure lock") = Some(rows);
    }

    pub(crate) fn executed(&self) -> Vec<String> {
        self.executed.lock().expect("executed lock").clone()
    }

    pub(crate) fn last_executed(&self) -> String {
        self.executed().last().cloned().expect("a statement was executed")
    }
}

// Keep rows in token order; rows sharing a token keep insertion order.
fn push_row(table: &mut FakeTable, row: FakeRow) {
    let at = table.rows.partition_point(|r| r.token <= row.token);
    table.rows.insert(at, row);
}

fn token_of(metadata: &TableMetadata, cells: &BTreeMap<String, Value>) -> i64 {
    let key = metadata
        .partition_key
        .iter()
        .map(|column| cells.get(column).map(ToString::to_string).unwrap_or_default())
        .collect::<Vec<_>>()
        .join("\0");

    i64::from_ne_bytes(xxh3_64(key.as_bytes()).to_ne_bytes())
}

///
/// TokenPredicate
///

#[derive(Clone, Copy, Debug)]
enum TokenPredicate {
    Ge(i64),
    Gt(i64),
    Lt(i64),
    Le(i64),
}

impl TokenPredicate {
    fn parse(predicate: &str) -> Result<Self, SessionError> {
        let unsupported = || SessionError::Execute(format!("unsupported predicate: {predicate}"));

        let rest = predicate
            .strip_prefix("token(")
            .and_then(|rest| rest.split_once(')'))
            .map(|(_, rest)| rest.trim())
            .ok_or_else(unsupported)?;

        let (ctor, value): (fn(i64) -> Self, &str) = if let Some(v) = rest.strip_prefix(">=") {
            (Self::Ge, v)
        } else if let Some(v) = rest.strip_prefix("<=") {
            (Self::Le, v)
        } else if let Some(v) = rest.strip_prefix('>') {
            (Self::Gt, v)
        } else if let Some(v) = rest.strip_prefix('<') {
            (Self::Lt, v)
        } else {
            return Err(unsupported());
        };

        value
            .trim()
            .parse::<i64>()
            .map(ctor)
            .map_err(|_| unsupported())
    }

    const fn matches(self, token: i64) -> bool {
        match self {
            Self::Ge(v) => token >= v,
            Self::Gt(v) => token > v,
            Self::Lt(v) => token < v,
            Self::Le(v) => token <= v,
        }
    }
}

impl Session for FakeCluster {
    fn table_metadata(
        &self,
        ctx: &ScanContext,
        keyspace: &str,
        table: &str,
    ) -> Result<Option<TableMetadata>, SessionError> {
        ctx.check()?;
        let tables = self.tables.lock().expect("tables lock");

        Ok(tables
            .get(&(keyspace.to_string(), table.to_string()))
            .map(|t| t.metadata.clone()))
    }

    fn execute(
        &self,
        ctx: &ScanContext,
        statement: &str,
        _values: &[Value],
    ) -> Result<Box<dyn RowSource>, SessionError> {
        ctx.check()?;
        self.executed
            .lock()
            .expect("executed lock")
            .push(statement.to_string());

        let parsed = ParsedQuery::parse(statement)
            .map_err(|err| SessionError::Execute(err.to_string()))?;
        let tables = self.tables.lock().expect("tables lock");
        let table = tables
            .get(&(parsed.keyspace().to_string(), parsed.table().to_string()))
            .ok_or_else(|| SessionError::Execute("unknown table".to_string()))?;

        let predicates = if parsed.has_where() {
            parsed
                .remainder()
                .split(" AND ")
                .map(TokenPredicate::parse)
                .collect::<Result<Vec<_>, _>>()?
        } else {
            Vec::new()
        };

        let token_expr = table.metadata.token_expr();
        let (columns, with_token) = match parsed.projection().strip_suffix(&token_expr) {
            Some(rest) => (rest.trim_end().trim_end_matches(','), true),
            None => (parsed.projection(), false),
        };

        let mut projection = Vec::new();
        for column in columns.split(',').map(str::trim) {
            if column == "*" {
                projection.extend(table.columns.iter().cloned());
            } else {
                projection.push(column.to_string());
            }
        }

        let rows = table
            .rows
            .iter()
            .filter(|row| predicates.iter().all(|p| p.matches(row.token)))
            .map(|row| {
                let mut values: Vec<Value> = projection
                    .iter()
                    .map(|column| row.cells.get(column).cloned().unwrap_or(Value::Null))
                    .collect();
                if with_token {
                    values.push(Value::Int(row.token));
                }
                values
            })
            .collect();

        let fail_after = self.fetch_failure_after.lock().expect("failure lock").take();

        Ok(Box::new(FakeRows {
            rows,
            fail_after,
            failed: false,
        }))
    }
}

///
/// FakeRows
///

struct FakeRows {
    rows: VecDeque<Vec<Value>>,
    fail_after: Option<usize>,
    failed: bool,
}

impl RowSource for FakeRows {
    fn next_row(&mut self) -> Option<Vec<Value>> {
        if let Some(remaining) = self.fail_after.as_mut() {
            if *remaining == 0 {
                self.failed = true;
                return None;
            }
            *remaining -= 1;
        }

        self.rows.pop_front()
    }

    fn close(&mut self) -> Result<(), SessionError> {
        if self.failed {
            return Err(SessionError::Fetch("connection reset".to_string()));
        }

        Ok(())
    }
}

///
/// FlakyStore
///
/// MemoryStore whose writes can be switched to fail.
///

#[derive(Debug, Default)]
pub(crate) struct FlakyStore {
    inner: MemoryStore,
    fail_stores: AtomicBool,
    store_calls: Mutex<Vec<String>>,
}

impl FlakyStore {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn set_failing(&self, failing: bool) {
        self.fail_stores.store(failing, Ordering::SeqCst);
    }

    pub(crate) fn store_calls(&self) -> Vec<String> {
        self.store_calls.lock().expect("calls lock").clone()
    }
}

impl CheckpointStore for FlakyStore {
    fn load(&self, ctx: &ScanContext, key: &str) -> Result<Option<Vec<u8>>, StoreError> {
        self.inner.load(ctx, key)
    }

    fn load_prefix(
        &self,
        ctx: &ScanContext,
        prefix: &str,
    ) -> Result<BTreeMap<String, Vec<u8>>, StoreError> {
        self.inner.load_prefix(ctx, prefix)
    }

    fn store(&self, ctx: &ScanContext, key: &str, value: &[u8]) -> Result<(), StoreError> {
        self.store_calls
            .lock()
            .expect("calls lock")
            .push(key.to_string());
        if self.fail_stores.load(Ordering::SeqCst) {
            return Err(StoreError::backend("disk full"));
        }

        self.inner.store(ctx, key, value)
    }
}

///
/// RecordingSink
///

#[derive(Debug, Default)]
pub(crate) struct RecordingSink {
    events: Mutex<Vec<(&'static str, String)>>,
}

impl RecordingSink {
    /// Leak a sink so it can be installed on a scanner.
    pub(crate) fn leaked() -> &'static Self {
        Box::leak(Box::new(Self::default()))
    }

    pub(crate) fn count(&self, kind: &str) -> usize {
        self.events
            .lock()
            .expect("events lock")
            .iter()
            .filter(|(k, _)| *k == kind)
            .count()
    }
}

impl MetricsSink for RecordingSink {
    fn record(&self, event: MetricsEvent<'_>) {
        let entry = match event {
            MetricsEvent::IteratorBuilt { scan_id, resumed } => {
                (if resumed { "resumed" } else { "built" }, scan_id)
            }
            MetricsEvent::RowScanned { scan_id } => ("row", scan_id),
            MetricsEvent::ScanFinished { scan_id } => ("finished", scan_id),
            MetricsEvent::CheckpointSaved { scan_id, auto } => {
                (if auto { "auto_saved" } else { "saved" }, scan_id)
            }
            MetricsEvent::CheckpointSaveFailed { scan_id, .. } => ("save_failed", scan_id),
            MetricsEvent::Reset { scan_id } => ("reset", scan_id),
        };

        self.events
            .lock()
            .expect("events lock")
            .push((entry.0, entry.1.to_string()));
    }
}
