//! Database session collaborator.
//!
//! The scanner never talks to a driver directly. A driver adapter implements
//! [`Session`] (metadata lookup and query execution) and hands back a
//! [`RowSource`] cursor per executed statement.

use crate::{
    context::{ContextError, ScanContext},
    value::Value,
};
use thiserror::Error as ThisError;

///
/// SessionError
///

#[derive(Clone, Debug, Eq, PartialEq, ThisError)]
pub enum SessionError {
    #[error("session: {0}")]
    Context(#[from] ContextError),

    #[error("could not load table metadata: {0}")]
    Metadata(String),

    #[error("could not execute statement: {0}")]
    Execute(String),

    #[error("row fetch failed: {0}")]
    Fetch(String),
}

///
/// TableMetadata
///
/// Key layout of one table, in declaration order.
///

#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct TableMetadata {
    pub partition_key: Vec<String>,
    pub clustering_columns: Vec<String>,
}

impl TableMetadata {
    #[must_use]
    pub fn new<P, C>(partition_key: P, clustering_columns: C) -> Self
    where
        P: IntoIterator,
        P::Item: Into<String>,
        C: IntoIterator,
        C::Item: Into<String>,
    {
        Self {
            partition_key: partition_key.into_iter().map(Into::into).collect(),
            clustering_columns: clustering_columns.into_iter().map(Into::into).collect(),
        }
    }

    /// True when a partition may hold more than one row.
    #[must_use]
    pub const fn has_clustering_columns(&self) -> bool {
        !self.clustering_columns.is_empty()
    }

    /// Ring-position expression for this table, e.g. `token(a, b)`.
    #[must_use]
    pub fn token_expr(&self) -> String {
        format!("token({})", self.partition_key.join(", "))
    }
}

///
/// RowSource
///
/// Forward-only cursor over the rows of one executed statement.
///

pub trait RowSource: Send {
    /// Next row, or `None` once the cursor is exhausted or a fetch failed.
    fn next_row(&mut self) -> Option<Vec<Value>>;

    /// Release the cursor, reporting any fetch failure seen so far.
    /// Safe to call more than once.
    fn close(&mut self) -> Result<(), SessionError>;
}

///
/// Session
///
/// Externally synchronized database handle shared by every iterator of a
/// scanner. Implementations must be safe to call from several threads.
///

pub trait Session: Send + Sync {
    /// Key layout for `keyspace.table`; `Ok(None)` when the table is unknown.
    fn table_metadata(
        &self,
        ctx: &ScanContext,
        keyspace: &str,
        table: &str,
    ) -> Result<Option<TableMetadata>, SessionError>;

    /// Execute `statement` with positional bind `values`.
    fn execute(
        &self,
        ctx: &ScanContext,
        statement: &str,
        values: &[Value],
    ) -> Result<Box<dyn RowSource>, SessionError>;
}
