use crate::{
    checkpoint::ScanCursorState,
    context::ScanContext,
    error::InternalError,
    obs::sink::MetricsEvent,
    ring::TokenRange,
    scan::{Row, ScanQuery, Scanner},
    session::{RowSource, SessionError},
};
use std::fmt;
use tracing::{debug, info, warn};

///
/// ScanIterator
///
/// Drives the scan of one ring range.
///
/// States: active (initial) and finished (terminal). The iterator becomes
/// finished when its row source is exhausted, and only `reset` makes it
/// active again. Not safe for concurrent use; one caller drives it at a time.
///

pub struct ScanIterator {
    scanner: Scanner,
    ctx: ScanContext,
    scan_id: String,
    query: ScanQuery,
    statement: String,
    source: Box<dyn RowSource>,
    state: ScanCursorState,
    saved: ScanCursorState,
    close_error: Option<SessionError>,
}

impl ScanIterator {
    pub(crate) fn new(
        scanner: Scanner,
        ctx: ScanContext,
        scan_id: String,
        query: ScanQuery,
        statement: String,
        source: Box<dyn RowSource>,
        state: ScanCursorState,
    ) -> Self {
        Self {
            scanner,
            ctx,
            scan_id,
            query,
            statement,
            source,
            state,
            saved: state,
            close_error: None,
        }
    }

    /// Pull the next row.
    ///
    /// Returns `Ok(None)` once the range is exhausted, and on every call
    /// after that without touching the row source. A fetch failure ends the
    /// scan like exhaustion does; it is reported by [`Self::close`]. Rows
    /// whose hidden token column cannot be decoded are returned as errors.
    pub fn scan(&mut self) -> Result<Option<Row>, InternalError> {
        let result = if self.state.finished() {
            Ok(None)
        } else {
            self.fetch()
        };
        self.auto_save();

        result
    }

    /// Borrowing iterator over the remaining rows.
    pub fn rows(&mut self) -> impl Iterator<Item = Result<Row, InternalError>> + '_ {
        std::iter::from_fn(move || self.scan().transpose())
    }

    fn fetch(&mut self) -> Result<Option<Row>, InternalError> {
        let Some(values) = self.source.next_row() else {
            self.finish();
            return Ok(None);
        };

        let (row, token) = Row::from_raw(values)?;
        self.state.record_row(token);
        self.scanner.record(MetricsEvent::RowScanned {
            scan_id: &self.scan_id,
        });

        Ok(Some(row))
    }

    // Exhaustion: release the cursor and enter the terminal state. A close
    // failure still finishes the scan; it is kept for `close`.
    fn finish(&mut self) {
        if let Err(err) = self.source.close() {
            warn!(scan_id = %self.scan_id, error = %err, "row source closed with error");
            self.close_error = Some(err);
        }
        self.state.mark_finished();

        debug!(
            scan_id = %self.scan_id,
            rows_read = self.state.rows_read(),
            "scan finished"
        );
        self.scanner.record(MetricsEvent::ScanFinished {
            scan_id: &self.scan_id,
        });
    }

    // Best-effort periodic checkpoint: every `interval` rows, plus one flush
    // when the scan finishes. Failures are logged and retried at the next
    // trigger; they never reach the caller of `scan`.
    fn auto_save(&mut self) {
        let interval = self.scanner.config().auto_save_interval();
        if interval == 0 || self.state == self.saved {
            return;
        }

        let unsaved = self
            .state
            .rows_read()
            .saturating_sub(self.saved.rows_read());
        let finishing = self.state.finished() && !self.saved.finished();
        if unsaved < interval && !finishing {
            return;
        }

        if let Err(err) = self.persist(true) {
            warn!(
                scan_id = %self.scan_id,
                error = %err.display_with_class(),
                "auto-save failed"
            );
        }
    }

    /// Persist the current cursor state.
    pub fn save(&mut self) -> Result<(), InternalError> {
        self.persist(false)
    }

    fn persist(&mut self, auto: bool) -> Result<(), InternalError> {
        let result = self
            .scanner
            .repository()
            .store(&self.ctx, &self.scan_id, Some(&self.state));

        match &result {
            Ok(()) => {
                self.saved = self.state;
                self.scanner.record(MetricsEvent::CheckpointSaved {
                    scan_id: &self.scan_id,
                    auto,
                });
            }
            Err(_) => {
                self.scanner.record(MetricsEvent::CheckpointSaveFailed {
                    scan_id: &self.scan_id,
                    auto,
                });
            }
        }

        result
    }

    /// Erase the persisted checkpoint and restart from the original range.
    ///
    /// On success `self` is replaced by a freshly built iterator; on failure
    /// it is left as it was (the checkpoint may already be erased).
    pub fn reset(&mut self) -> Result<(), InternalError> {
        self.scanner
            .repository()
            .store(&self.ctx, &self.scan_id, None)?;

        let fresh =
            self.scanner
                .build_iterator(&self.ctx, self.scan_id.clone(), self.query.clone())?;
        let mut previous = std::mem::replace(self, fresh);
        if let Err(err) = previous.source.close() {
            debug!(scan_id = %self.scan_id, error = %err, "previous row source closed with error");
        }

        info!(scan_id = %self.scan_id, "scan reset");
        self.scanner.record(MetricsEvent::Reset {
            scan_id: &self.scan_id,
        });

        Ok(())
    }

    /// Release the row source.
    ///
    /// Reports the fetch failure that ended the scan, if any; otherwise the
    /// result of closing the source. Safe to call after the scan finished.
    pub fn close(&mut self) -> Result<(), InternalError> {
        if let Some(err) = &self.close_error {
            return Err(err.clone().into());
        }

        self.source.close().map_err(InternalError::from)
    }

    /// Rows consumed so far, including those of resumed runs.
    #[must_use]
    pub const fn read_count(&self) -> u64 {
        self.state.rows_read()
    }

    #[must_use]
    pub const fn finished(&self) -> bool {
        self.state.finished()
    }

    /// Fraction of the range scanned, in `[0, 1]`.
    ///
    /// Derived from the position of the last consumed token within the range,
    /// so it assumes rows are spread evenly over the ring.
    #[must_use]
    pub fn progress(&self) -> f64 {
        if self.state.finished() {
            return 1.0;
        }
        if self.state.rows_read() == 0 {
            return 0.0;
        }

        self.state
            .last_token()
            .map_or(0.0, |token| self.query.range().fraction_at(token))
    }

    /// Linear extrapolation of the total row count: `read_count / progress`.
    ///
    /// Infinite or NaN while progress is still 0.
    #[must_use]
    #[expect(clippy::cast_precision_loss)]
    pub fn estimated_count(&self) -> f64 {
        self.state.rows_read() as f64 / self.progress()
    }

    #[must_use]
    pub fn scan_id(&self) -> &str {
        &self.scan_id
    }

    #[must_use]
    pub const fn range(&self) -> TokenRange {
        self.query.range()
    }

    #[must_use]
    pub const fn query(&self) -> &ScanQuery {
        &self.query
    }

    /// The rewritten statement that was executed.
    #[must_use]
    pub fn statement(&self) -> &str {
        &self.statement
    }

    #[must_use]
    pub const fn state(&self) -> &ScanCursorState {
        &self.state
    }
}

impl fmt::Debug for ScanIterator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScanIterator")
            .field("scan_id", &self.scan_id)
            .field("range", &self.query.range())
            .field("state", &self.state)
            .finish_non_exhaustive()
    }
}
