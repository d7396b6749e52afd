//! Delegation layer.
//!
//! Every account holds *voting units*: the summed power of the positions it
//! owns. Units are attributed to the account's delegatee, whose vote
//! checkpoints this module maintains. An account that has never delegated
//! is attributed to itself, and the first time it receives units that
//! self-delegation is recorded explicitly.
//!
//! The global total is not written here; the position ledger owns it and
//! applies the same deltas in the same step.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use tracing::debug;

use lockstep_core::checkpoint::CheckpointSeries;
use lockstep_core::error::{CheckpointError, DelegationError, LedgerError};
use lockstep_core::types::AccountId;

/// Which way a voting-unit change goes.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Direction {
    Increase,
    Decrease,
}

/// A delegate's vote total moved from `previous` to `current`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct VotesChange {
    pub delegatee: AccountId,
    pub previous: u128,
    pub current: u128,
}

/// Delegatee records, per-account voting units, and delegate vote history.
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, Eq)]
pub struct Delegation {
    delegatees: HashMap<AccountId, AccountId>,
    units: HashMap<AccountId, u128>,
    votes: HashMap<AccountId, CheckpointSeries>,
}

impl Delegation {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current delegatee of `account`, defaulting to the account itself.
    pub fn delegates(&self, account: &AccountId) -> AccountId {
        self.delegatees.get(account).copied().unwrap_or(*account)
    }

    /// Whether `account` has a recorded delegatee (explicit or auto-assigned).
    pub fn has_delegatee(&self, account: &AccountId) -> bool {
        self.delegatees.contains_key(account)
    }

    /// Voting units held by `account` through the positions it owns.
    pub fn voting_units(&self, account: &AccountId) -> u128 {
        self.units.get(account).copied().unwrap_or(0)
    }

    /// Votes currently attributed to `account` as a delegate.
    pub fn votes(&self, account: &AccountId) -> u128 {
        self.votes.get(account).map_or(0, CheckpointSeries::latest)
    }

    /// Votes attributed to `account` at a strictly past `timepoint`.
    pub fn past_votes(
        &self,
        account: &AccountId,
        timepoint: u64,
        now: u64,
    ) -> Result<u128, CheckpointError> {
        match self.votes.get(account) {
            Some(series) => series.lookup(timepoint, now),
            None if timepoint >= now => Err(CheckpointError::OutOfRange { timepoint, now }),
            None => Ok(0),
        }
    }

    /// Sum of current votes over every delegate.
    pub fn total_votes(&self) -> u128 {
        self.votes.values().map(CheckpointSeries::latest).sum()
    }

    /// Sum of voting units over every account.
    pub fn total_units(&self) -> u128 {
        self.units.values().sum()
    }

    /// Vote history of `account`, if it ever held votes.
    pub fn vote_history(&self, account: &AccountId) -> Option<&CheckpointSeries> {
        self.votes.get(account)
    }

    /// Re-attribute `account`'s voting units to `delegatee`.
    ///
    /// Moves the account's whole unit balance from the old delegatee's vote
    /// total to the new one. Returns the affected delegates.
    pub fn delegate(
        &mut self,
        account: &AccountId,
        delegatee: &AccountId,
        now: u64,
    ) -> Result<Vec<VotesChange>, LedgerError> {
        if delegatee.is_zero() {
            return Err(DelegationError::ZeroDelegatee.into());
        }
        let previous = self.delegates(account);
        self.delegatees.insert(*account, *delegatee);
        debug!(%account, from = %previous, to = %delegatee, "delegate changed");

        let units = self.voting_units(account);
        self.move_delegate_votes(Some(&previous), Some(delegatee), units, now)
    }

    /// Apply a change of `amount` voting units held by `account`.
    ///
    /// Resolves the account's delegatee and moves its vote total in the same
    /// direction. A zero amount is a no-op.
    pub fn voting_units_changed(
        &mut self,
        account: &AccountId,
        amount: u128,
        direction: Direction,
        now: u64,
    ) -> Result<Vec<VotesChange>, LedgerError> {
        if amount == 0 {
            return Ok(Vec::new());
        }
        let have = self.voting_units(account);
        let updated = match direction {
            Direction::Increase => have
                .checked_add(amount)
                .ok_or_else(|| LedgerError::InvariantViolation(format!("voting units overflow for {account}")))?,
            Direction::Decrease => have.checked_sub(amount).ok_or(DelegationError::UnitsUnderflow {
                account: *account,
                have,
                removing: amount,
            })?,
        };
        self.units.insert(*account, updated);

        // First voting-relevant interaction: pin the self-delegation.
        if !self.delegatees.contains_key(account) {
            self.delegatees.insert(*account, *account);
        }
        let delegatee = self.delegates(account);
        match direction {
            Direction::Increase => self.move_delegate_votes(None, Some(&delegatee), amount, now),
            Direction::Decrease => self.move_delegate_votes(Some(&delegatee), None, amount, now),
        }
    }

    /// Apply a before/after change of `account`'s units as a single signed delta.
    pub fn adjust_units(
        &mut self,
        account: &AccountId,
        before: u128,
        after: u128,
        now: u64,
    ) -> Result<Vec<VotesChange>, LedgerError> {
        if after >= before {
            self.voting_units_changed(account, after - before, Direction::Increase, now)
        } else {
            self.voting_units_changed(account, before - after, Direction::Decrease, now)
        }
    }

    /// Move `amount` votes between two delegates. `None` on either side
    /// means units entering or leaving circulation.
    fn move_delegate_votes(
        &mut self,
        from: Option<&AccountId>,
        to: Option<&AccountId>,
        amount: u128,
        now: u64,
    ) -> Result<Vec<VotesChange>, LedgerError> {
        let mut changes = Vec::new();
        if amount == 0 || from == to {
            return Ok(changes);
        }
        if let Some(from) = from {
            let series = self.votes.entry(*from).or_default();
            let current = series.latest().checked_sub(amount).ok_or_else(|| {
                LedgerError::InvariantViolation(format!("delegate {from} votes below zero"))
            })?;
            let (previous, current) = series.push(now, current)?;
            changes.push(VotesChange { delegatee: *from, previous, current });
        }
        if let Some(to) = to {
            let series = self.votes.entry(*to).or_default();
            let current = series.latest().checked_add(amount).ok_or_else(|| {
                LedgerError::InvariantViolation(format!("delegate {to} votes overflow"))
            })?;
            let (previous, current) = series.push(now, current)?;
            changes.push(VotesChange { delegatee: *to, previous, current });
        }
        Ok(changes)
    }
}
