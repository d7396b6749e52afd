//! Vesting coordinator.
//!
//! Parking a position hands it to the coordinator, forces its commitment to
//! zero, and records a schedule `[now, now + remaining]`. The custodian who
//! parked it can later:
//!
//! - **withdraw** it to a receiver, restoring whatever is left of the
//!   schedule as the new commitment (zero once the schedule has ended), or
//! - **claim** it once the schedule has ended, burning the position and
//!   paying its locked amount to a receiver.
//!
//! Each call holds a per-position [`PositionGuard`] for its whole duration;
//! a second call on the same position while one is in flight is rejected.

use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;

use parking_lot::Mutex;
use tracing::info;

use lockstep_core::error::{LedgerError, PositionError, VestingError};
use lockstep_core::types::{AccountId, PositionId, VestingRecord};

use crate::ledger::PositionLedger;

/// Held while a vesting call on `id` is in progress. Releases on drop.
#[derive(Debug)]
pub struct PositionGuard {
    in_flight: Arc<Mutex<HashSet<PositionId>>>,
    id: PositionId,
}

impl Drop for PositionGuard {
    fn drop(&mut self) {
        self.in_flight.lock().remove(&self.id);
    }
}

/// Sole writer of vesting records; a privileged caller of the ledger.
#[derive(Debug)]
pub struct VestingCoordinator {
    /// The coordinator's own account. Parked positions are owned by it.
    account: AccountId,
    records: BTreeMap<PositionId, VestingRecord>,
    in_flight: Arc<Mutex<HashSet<PositionId>>>,
}

impl VestingCoordinator {
    pub fn new(account: AccountId) -> Self {
        Self::from_records(account, BTreeMap::new())
    }

    /// Restore with previously persisted records.
    pub fn from_records(account: AccountId, records: BTreeMap<PositionId, VestingRecord>) -> Self {
        Self {
            account,
            records,
            in_flight: Arc::new(Mutex::new(HashSet::new())),
        }
    }

    /// Replace the records with persisted ones.
    pub fn restore(&mut self, records: BTreeMap<PositionId, VestingRecord>) {
        self.records = records;
    }

    pub fn account(&self) -> &AccountId {
        &self.account
    }

    pub fn records(&self) -> &BTreeMap<PositionId, VestingRecord> {
        &self.records
    }

    pub fn vesting_record(&self, id: PositionId) -> Option<&VestingRecord> {
        self.records.get(&id)
    }

    pub fn is_parked(&self, id: PositionId) -> bool {
        self.records.contains_key(&id)
    }

    /// Mark `id` as in flight, or fail if it already is.
    pub fn enter(&self, id: PositionId) -> Result<PositionGuard, VestingError> {
        let mut in_flight = self.in_flight.lock();
        if !in_flight.insert(id) {
            return Err(VestingError::Reentrant(id));
        }
        Ok(PositionGuard {
            in_flight: Arc::clone(&self.in_flight),
            id,
        })
    }

    /// Park position `id`. `caller` must control it and becomes its custodian.
    pub fn deposit(
        &mut self,
        ledger: &mut PositionLedger,
        caller: &AccountId,
        id: PositionId,
    ) -> Result<VestingRecord, LedgerError> {
        let _guard = self.enter(id)?;
        if self.records.contains_key(&id) {
            return Err(VestingError::AlreadyParked(id).into());
        }
        let position = ledger.position(id).cloned().ok_or(PositionError::NotFound(id))?;
        if !ledger.is_authorized(caller, id) {
            return Err(PositionError::NotAuthorized { caller: *caller, position: id }.into());
        }
        if self.account.is_zero() {
            return Err(PositionError::ZeroReceiver.into());
        }
        let now = ledger.begin()?;
        let end = now
            .checked_add(position.remaining_duration)
            .ok_or(PositionError::ArithmeticOverflow)?;
        let record = VestingRecord {
            start: now,
            end,
            amount: position.locked_amount,
            custodian: *caller,
        };

        // Zero the power while the holder still owns it, then take custody:
        // the coordinator never carries voting units.
        ledger.update_commitment_duration_at(&self.account, id, 0, now)?;
        ledger.transfer_position_at(id, &self.account, now)?;
        self.records.insert(id, record.clone());

        info!(position = %id, custodian = %caller, start = now, end, amount = record.amount, "position parked");
        Ok(record)
    }

    /// Return parked position `id` to `receiver` with the unelapsed part of
    /// its schedule as commitment. Returns the restored duration.
    pub fn withdraw(
        &mut self,
        ledger: &mut PositionLedger,
        caller: &AccountId,
        receiver: &AccountId,
        id: PositionId,
    ) -> Result<u64, LedgerError> {
        let _guard = self.enter(id)?;
        let record = self.custodied(caller, id)?.clone();
        ledger.require_receiver(receiver)?;
        let now = ledger.begin()?;
        let remaining = record.remaining_at(now);

        ledger.transfer_position_at(id, receiver, now)?;
        ledger.update_commitment_duration_at(&self.account, id, remaining, now)?;
        self.records.remove(&id);

        info!(position = %id, %receiver, remaining, "position withdrawn from vesting");
        Ok(remaining)
    }

    /// Close parked position `id` after its schedule ended, paying the
    /// locked amount to `receiver`. Returns the amount paid.
    pub fn claim(
        &mut self,
        ledger: &mut PositionLedger,
        caller: &AccountId,
        receiver: &AccountId,
        id: PositionId,
    ) -> Result<u128, LedgerError> {
        let _guard = self.enter(id)?;
        let record = self.custodied(caller, id)?.clone();
        let now = ledger.begin()?;
        if !record.is_finished(now) {
            return Err(VestingError::VestingNotFinished { position: id, end: record.end, now }.into());
        }

        let paid = ledger.burn_at(&self.account, receiver, id, now)?;
        self.records.remove(&id);

        info!(position = %id, %receiver, amount = paid, "vesting claimed");
        Ok(paid)
    }

    /// The record for `id`, provided `caller` is its custodian.
    fn custodied(&self, caller: &AccountId, id: PositionId) -> Result<&VestingRecord, VestingError> {
        let record = self.records.get(&id).ok_or(VestingError::NotParked(id))?;
        if record.custodian != *caller {
            return Err(VestingError::NotAuthorized { caller: *caller, position: id });
        }
        Ok(record)
    }
}
