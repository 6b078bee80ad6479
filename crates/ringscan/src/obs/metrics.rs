use serde::{Deserialize, Serialize};
use std::{
    collections::BTreeMap,
    sync::{LazyLock, Mutex, PoisonError},
    time::{SystemTime, UNIX_EPOCH},
};

/// Distinct scan ids with per-scan counters. Events for further ids only
/// reach the aggregate [`EventOps`] counters (and `untracked_scan_events`)
/// until `metrics_reset_all` clears the map; every split scan adds one id
/// per member.
pub const MAX_TRACKED_SCANS: usize = 1024;

static STATE: LazyLock<Mutex<EventState>> = LazyLock::new(|| Mutex::new(EventState::default()));

///
/// EventState
/// Ephemeral, in-memory counters for scan operations.
///

#[derive(Clone, Debug)]
pub(crate) struct EventState {
    pub(crate) ops: EventOps,
    pub(crate) scans: BTreeMap<String, ScanCounters>,
    pub(crate) since_ms: u64,
}

impl EventState {
    // Per-scan counters for `scan_id`; None once the tracking cap is reached.
    pub(crate) fn scan_mut(&mut self, scan_id: &str) -> Option<&mut ScanCounters> {
        if !self.scans.contains_key(scan_id) && self.scans.len() >= MAX_TRACKED_SCANS {
            self.ops.untracked_scan_events = self.ops.untracked_scan_events.saturating_add(1);
            return None;
        }

        Some(self.scans.entry(scan_id.to_string()).or_default())
    }
}

impl Default for EventState {
    fn default() -> Self {
        Self {
            ops: EventOps::default(),
            scans: BTreeMap::new(),
            since_ms: now_millis(),
        }
    }
}

///
/// EventOps
///

#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
pub struct EventOps {
    // Construction
    pub iterators_built: u64,
    pub iterators_resumed: u64,

    // Rows
    pub rows_scanned: u64,
    pub scans_finished: u64,

    // Checkpoints
    pub checkpoints_saved: u64,
    pub auto_saves: u64,
    pub checkpoint_save_failures: u64,
    pub resets: u64,

    // Per-scan events dropped past MAX_TRACKED_SCANS
    pub untracked_scan_events: u64,
}

///
/// ScanCounters
/// Per-scan-id breakdown.
///

#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
pub struct ScanCounters {
    pub rows_scanned: u64,
    pub checkpoints_saved: u64,
    pub checkpoint_save_failures: u64,
}

///
/// EventReport
/// Point-in-time snapshot of the global counters.
///

#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
pub struct EventReport {
    pub ops: EventOps,
    pub scans: Vec<(String, ScanCounters)>,
    pub since_ms: u64,
}

pub(crate) fn with_state_mut<R>(f: impl FnOnce(&mut EventState) -> R) -> R {
    let mut state = STATE.lock().unwrap_or_else(PoisonError::into_inner);
    f(&mut state)
}

pub(crate) fn report() -> EventReport {
    with_state_mut(|state| EventReport {
        ops: state.ops.clone(),
        scans: state
            .scans
            .iter()
            .map(|(id, counters)| (id.clone(), counters.clone()))
            .collect(),
        since_ms: state.since_ms,
    })
}

pub(crate) fn reset_all() {
    with_state_mut(|state| *state = EventState::default());
}

fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |elapsed| {
            u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX)
        })
}
