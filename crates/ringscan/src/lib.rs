//! Ringscan: resumable, parallel, checkpointed full-table scans over a
//! token-partitioned keyspace.
//!
//! A caller's `SELECT` is confined to ranges of the signed 64-bit token ring,
//! rewritten to carry each row's token, and driven through iterators whose
//! cursor can be persisted and resumed without rescanning completed ranges.
#![warn(unreachable_pub)]

// public exports are one module level down
pub mod checkpoint;
pub mod context;
pub mod error;
pub mod obs;
pub mod ring;
pub mod scan;
pub mod session;
pub mod statement;
pub mod value;

// test
#[cfg(test)]
pub(crate) mod test_support;

///
/// Prelude
///
/// Everything needed to build and drive a scan.
/// No error internals or metrics state are re-exported here.
///

pub mod prelude {
    pub use crate::{
        checkpoint::{CheckpointStore, MemoryStore, ScanCursorState},
        context::{CancellationToken, ScanContext},
        error::InternalError,
        ring::TokenRange,
        scan::{Row, ScanIterator, ScanIteratorGroup, Scanner, ScannerConfig},
        session::{RowSource, Session, TableMetadata},
        value::Value,
    };
}
