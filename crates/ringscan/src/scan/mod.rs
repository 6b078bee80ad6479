//! Checkpointed range scans.
//!
//! [`Scanner`] builds iterators; [`ScanIterator`] drives one ring range and
//! persists its cursor; [`ScanIteratorGroup`] fans out over the ranges of a
//! split scan.
//!
//! Resume is at-least-once: rows consumed after the last saved checkpoint are
//! delivered again, and on tables with clustering columns the whole partition
//! of the checkpointed token is read again.

mod config;
mod group;
mod iterator;
mod query;
mod row;
mod scanner;

pub use config::ScannerConfig;
pub use group::ScanIteratorGroup;
pub use iterator::ScanIterator;
pub use query::ScanQuery;
pub use row::Row;
pub use scanner::Scanner;
