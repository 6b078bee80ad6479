use serde::{Deserialize, Serialize};

///
/// ScanCursorState
///
/// Persisted cursor of one scan: the token of the last consumed row, how
/// many rows were consumed, and whether the range was exhausted.
///
/// Missing fields decode as zero values; `last_token` decodes as absent.
///

#[derive(Clone, Copy, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
pub struct ScanCursorState {
    #[serde(default)]
    last_token: Option<i64>,

    #[serde(default)]
    rows_read: u64,

    #[serde(default)]
    finished: bool,
}

impl ScanCursorState {
    #[must_use]
    pub const fn new(last_token: Option<i64>, rows_read: u64, finished: bool) -> Self {
        Self {
            last_token,
            rows_read,
            finished,
        }
    }

    #[must_use]
    pub const fn last_token(&self) -> Option<i64> {
        self.last_token
    }

    #[must_use]
    pub const fn rows_read(&self) -> u64 {
        self.rows_read
    }

    #[must_use]
    pub const fn finished(&self) -> bool {
        self.finished
    }

    // Record one consumed row at `token`.
    pub(crate) const fn record_row(&mut self, token: i64) {
        self.last_token = Some(token);
        self.rows_read = self.rows_read.saturating_add(1);
    }

    // Finished is terminal; only a reset (fresh state) clears it.
    pub(crate) const fn mark_finished(&mut self) {
        self.finished = true;
    }
}
