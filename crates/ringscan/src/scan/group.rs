use crate::{
    error::InternalError,
    scan::{Row, ScanIterator},
};
use derive_more::{Deref, DerefMut, IntoIterator};
use tracing::warn;

///
/// ScanIteratorGroup
///
/// The iterators of one split scan behind the single-iterator contract.
///
/// Members stay independently drivable: borrow them through `Deref`, or take
/// them out with [`Self::into_iterators`] to drive each from its own thread.
///

#[derive(Debug, Deref, DerefMut, IntoIterator)]
#[into_iterator(owned, ref, ref_mut)]
pub struct ScanIteratorGroup(Vec<ScanIterator>);

impl ScanIteratorGroup {
    #[must_use]
    pub const fn new(iterators: Vec<ScanIterator>) -> Self {
        Self(iterators)
    }

    #[must_use]
    pub fn into_iterators(self) -> Vec<ScanIterator> {
        self.0
    }

    /// Next row from the first member that still has one.
    ///
    /// Members are tried in split order, so earlier ranges drain first; this
    /// is not a fair schedule.
    pub fn scan(&mut self) -> Result<Option<Row>, InternalError> {
        for iterator in &mut self.0 {
            if let Some(row) = iterator.scan()? {
                return Ok(Some(row));
            }
        }

        Ok(None)
    }

    /// Close every member; the last failure wins.
    pub fn close(&mut self) -> Result<(), InternalError> {
        self.for_each_member("close", ScanIterator::close)
    }

    /// Save every member; the last failure wins.
    pub fn save(&mut self) -> Result<(), InternalError> {
        self.for_each_member("save", ScanIterator::save)
    }

    /// Reset every member independently; a failing member does not stop the
    /// others. The last failure wins.
    pub fn reset(&mut self) -> Result<(), InternalError> {
        self.for_each_member("reset", ScanIterator::reset)
    }

    /// Unweighted mean of member progress.
    #[must_use]
    #[expect(clippy::cast_precision_loss)]
    pub fn progress(&self) -> f64 {
        if self.0.is_empty() {
            return 1.0;
        }

        self.0.iter().map(ScanIterator::progress).sum::<f64>() / self.0.len() as f64
    }

    #[must_use]
    pub fn estimated_count(&self) -> f64 {
        self.0.iter().map(ScanIterator::estimated_count).sum()
    }

    #[must_use]
    pub fn read_count(&self) -> u64 {
        self.0.iter().map(ScanIterator::read_count).sum()
    }

    /// True once every member is finished.
    #[must_use]
    pub fn finished(&self) -> bool {
        self.0.iter().all(ScanIterator::finished)
    }

    fn for_each_member(
        &mut self,
        op: &'static str,
        mut f: impl FnMut(&mut ScanIterator) -> Result<(), InternalError>,
    ) -> Result<(), InternalError> {
        let mut last_err = None;

        for iterator in &mut self.0 {
            if let Err(err) = f(iterator) {
                warn!(
                    scan_id = %iterator.scan_id(),
                    op,
                    error = %err.display_with_class(),
                    "scan group member failed"
                );
                last_err = Some(err);
            }
        }

        last_err.map_or(Ok(()), Err)
    }
}
