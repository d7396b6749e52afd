//! The position ledger and vesting coordinator composed behind one API.
//!
//! [`Escrow`] is what embedders drive. It forwards holder operations to the
//! ledger and vesting operations to the coordinator, and refuses to let an
//! outside caller act as the coordinator's account.

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use lockstep_core::clock::Clock;
use lockstep_core::error::{LedgerError, PositionError};
use lockstep_core::traits::{AssetLedger, PowerModel, PowerObserver};
use lockstep_core::types::{AccountId, PositionId, VestingRecord};

use crate::ledger::{LedgerSnapshot, PositionLedger};
use crate::vesting::VestingCoordinator;

/// Persisted state of an [`Escrow`].
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, Eq)]
pub struct EscrowSnapshot {
    pub ledger: LedgerSnapshot,
    pub vesting: BTreeMap<PositionId, VestingRecord>,
}

pub struct Escrow {
    ledger: PositionLedger,
    vesting: VestingCoordinator,
}

impl Escrow {
    /// Create an empty escrow. `coordinator` is the vesting coordinator's
    /// account and must be non-zero.
    pub fn new(
        coordinator: AccountId,
        model: Arc<dyn PowerModel>,
        assets: Arc<dyn AssetLedger>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self::from_snapshot(EscrowSnapshot::default(), coordinator, model, assets, clock)
    }

    pub fn from_snapshot(
        snapshot: EscrowSnapshot,
        coordinator: AccountId,
        model: Arc<dyn PowerModel>,
        assets: Arc<dyn AssetLedger>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            ledger: PositionLedger::from_snapshot(snapshot.ledger, coordinator, model, assets, clock),
            vesting: VestingCoordinator::from_records(coordinator, snapshot.vesting),
        }
    }

    pub fn with_observer(mut self, observer: Arc<dyn PowerObserver>) -> Self {
        self.ledger = self.ledger.with_observer(observer);
        self
    }

    pub fn snapshot(&self) -> EscrowSnapshot {
        EscrowSnapshot {
            ledger: self.ledger.snapshot(),
            vesting: self.vesting.records().clone(),
        }
    }

    /// Roll all state back to `snapshot`.
    pub fn restore(&mut self, snapshot: EscrowSnapshot) {
        self.ledger.restore(snapshot.ledger);
        self.vesting.restore(snapshot.vesting);
    }

    /// Read access to positions, votes, and history.
    pub fn ledger(&self) -> &PositionLedger {
        &self.ledger
    }

    pub fn vesting(&self) -> &VestingCoordinator {
        &self.vesting
    }

    pub fn vesting_record(&self, id: PositionId) -> Option<&VestingRecord> {
        self.vesting.vesting_record(id)
    }

    pub fn is_parked(&self, id: PositionId) -> bool {
        self.vesting.is_parked(id)
    }

    // --- holder operations ---

    pub fn mint(
        &mut self,
        caller: &AccountId,
        owner: &AccountId,
        amount: u128,
        duration: u64,
    ) -> Result<PositionId, LedgerError> {
        self.ledger.mint(caller, owner, amount, duration)
    }

    pub fn top_up(&mut self, caller: &AccountId, id: PositionId, amount: u128) -> Result<(), LedgerError> {
        self.ledger.top_up(caller, id, amount)
    }

    pub fn burn(&mut self, caller: &AccountId, receiver: &AccountId, id: PositionId) -> Result<u128, LedgerError> {
        self.not_coordinator(caller, id)?;
        self.ledger.burn(caller, receiver, id)
    }

    pub fn merge(&mut self, caller: &AccountId, source: PositionId, target: PositionId) -> Result<(), LedgerError> {
        self.not_coordinator(caller, source)?;
        self.ledger.merge(caller, source, target)
    }

    pub fn split(
        &mut self,
        caller: &AccountId,
        id: PositionId,
        shares: &[u128],
    ) -> Result<Vec<PositionId>, LedgerError> {
        self.not_coordinator(caller, id)?;
        self.ledger.split(caller, id, shares)
    }

    pub fn update_commitment_duration(
        &mut self,
        caller: &AccountId,
        id: PositionId,
        duration: u64,
    ) -> Result<(), LedgerError> {
        self.not_coordinator(caller, id)?;
        self.ledger.update_commitment_duration(caller, id, duration)
    }

    pub fn transfer_position(&mut self, caller: &AccountId, to: &AccountId, id: PositionId) -> Result<(), LedgerError> {
        self.not_coordinator(caller, id)?;
        self.ledger.transfer_position(caller, to, id)
    }

    pub fn approve(
        &mut self,
        caller: &AccountId,
        id: PositionId,
        controller: Option<AccountId>,
    ) -> Result<(), LedgerError> {
        self.not_coordinator(caller, id)?;
        self.ledger.approve(caller, id, controller)
    }

    pub fn set_operator(&mut self, caller: &AccountId, operator: &AccountId, approved: bool) {
        self.ledger.set_operator(caller, operator, approved);
    }

    pub fn delegate(&mut self, account: &AccountId, delegatee: &AccountId) -> Result<(), LedgerError> {
        self.ledger.delegate(account, delegatee)
    }

    // --- vesting operations ---

    pub fn deposit(&mut self, caller: &AccountId, id: PositionId) -> Result<VestingRecord, LedgerError> {
        self.vesting.deposit(&mut self.ledger, caller, id)
    }

    pub fn withdraw(&mut self, caller: &AccountId, receiver: &AccountId, id: PositionId) -> Result<u64, LedgerError> {
        self.vesting.withdraw(&mut self.ledger, caller, receiver, id)
    }

    pub fn claim(&mut self, caller: &AccountId, receiver: &AccountId, id: PositionId) -> Result<u128, LedgerError> {
        self.vesting.claim(&mut self.ledger, caller, receiver, id)
    }

    /// Only the coordinator itself acts with its account's authority.
    fn not_coordinator(&self, caller: &AccountId, id: PositionId) -> Result<(), PositionError> {
        if caller == self.vesting.account() {
            return Err(PositionError::NotAuthorized { caller: *caller, position: id });
        }
        Ok(())
    }
}
