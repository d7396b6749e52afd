//! Append-only checkpoint history.
//!
//! A [`CheckpointSeries`] records `(timepoint, value)` pairs with
//! non-decreasing timepoints and answers "what was the value as of T".
//! The ledger keeps one series per position, one per delegate account, and
//! one for total voting power.
//!
//! # Invariants
//!
//! * Timepoints are non-decreasing across the series.
//! * At most one entry per timepoint: pushing at the latest timepoint again
//!   overwrites its value, so history never exposes an intermediate value
//!   from within a single timepoint.
//!
//! Lookups are `O(log n)`. Long series first probe `sqrt(n)` entries from the
//! tail, since governance queries cluster around recent history.

use serde::{Deserialize, Serialize};

use crate::error::CheckpointError;

/// Series shorter than this skip the recent-tail probe.
const RECENT_PROBE_THRESHOLD: usize = 5;

/// A single `(timepoint, value)` snapshot.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
pub struct Checkpoint {
    pub timepoint: u64,
    pub value: u128,
}

/// Ordered, append-only checkpoint history.
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, Eq)]
pub struct CheckpointSeries {
    checkpoints: Vec<Checkpoint>,
}

impl CheckpointSeries {
    /// Create an empty series.
    pub fn new() -> Self {
        Self {
            checkpoints: Vec::new(),
        }
    }

    /// Record `value` at `timepoint`.
    ///
    /// Returns `(previous_latest, value)`. If `timepoint` equals the latest
    /// recorded timepoint the entry is overwritten instead of appended.
    ///
    /// # Errors
    ///
    /// [`CheckpointError::DecreasingTimepoint`] if `timepoint` is older than
    /// the latest entry.
    pub fn push(&mut self, timepoint: u64, value: u128) -> Result<(u128, u128), CheckpointError> {
        match self.checkpoints.last_mut() {
            Some(last) if last.timepoint > timepoint => Err(CheckpointError::DecreasingTimepoint {
                last: last.timepoint,
                got: timepoint,
            }),
            Some(last) if last.timepoint == timepoint => {
                let previous = last.value;
                last.value = value;
                Ok((previous, value))
            }
            Some(last) => {
                let previous = last.value;
                self.checkpoints.push(Checkpoint { timepoint, value });
                Ok((previous, value))
            }
            None => {
                self.checkpoints.push(Checkpoint { timepoint, value });
                Ok((0, value))
            }
        }
    }

    /// Most recently recorded value, or zero for an empty series.
    pub fn latest(&self) -> u128 {
        self.checkpoints.last().map_or(0, |c| c.value)
    }

    /// Most recent checkpoint, if any.
    pub fn latest_checkpoint(&self) -> Option<Checkpoint> {
        self.checkpoints.last().copied()
    }

    /// Value in effect at `timepoint`: the latest entry recorded at or
    /// before it, or zero if the series starts later.
    ///
    /// No range check; use [`lookup`](Self::lookup) for caller-facing queries.
    pub fn upper_lookup(&self, timepoint: u64) -> u128 {
        let cps = &self.checkpoints;
        let len = cps.len();

        let mut low = 0;
        let mut high = len;
        if len > RECENT_PROBE_THRESHOLD {
            let mid = len - len.isqrt();
            if timepoint < cps[mid].timepoint {
                high = mid;
            } else {
                low = mid + 1;
            }
        }

        let idx = low + cps[low..high].partition_point(|c| c.timepoint <= timepoint);
        if idx == 0 { 0 } else { cps[idx - 1].value }
    }

    /// Historical value at a strictly past `timepoint`.
    ///
    /// # Errors
    ///
    /// [`CheckpointError::OutOfRange`] unless `timepoint < now`. The present
    /// and the future are never answered with possibly stale data.
    pub fn lookup(&self, timepoint: u64, now: u64) -> Result<u128, CheckpointError> {
        if timepoint >= now {
            return Err(CheckpointError::OutOfRange { timepoint, now });
        }
        Ok(self.upper_lookup(timepoint))
    }

    /// Number of recorded checkpoints.
    pub fn len(&self) -> usize {
        self.checkpoints.len()
    }

    /// Whether nothing has been recorded.
    pub fn is_empty(&self) -> bool {
        self.checkpoints.is_empty()
    }

    /// Checkpoint at insertion index `pos`.
    pub fn at(&self, pos: usize) -> Option<&Checkpoint> {
        self.checkpoints.get(pos)
    }

    /// Iterate checkpoints oldest first.
    pub fn iter(&self) -> impl Iterator<Item = &Checkpoint> {
        self.checkpoints.iter()
    }
}
