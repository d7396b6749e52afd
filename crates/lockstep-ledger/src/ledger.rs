//! Position ledger.
//!
//! The [`PositionLedger`] is the sole writer of positions, per-position power
//! checkpoints, and the global total-power checkpoint. Every mutation:
//!
//! 1. validates its inputs and authorization, touching nothing;
//! 2. precomputes every new value with checked arithmetic;
//! 3. performs the one fallible external call (asset transfer), if any;
//! 4. commits: writes the records, pushes checkpoints, applies one signed
//!    delta to the global total, and reports the unit change to the
//!    delegation layer.
//!
//! A rejected call therefore leaves no trace. The clock is read once per
//! operation and the same `now` is used for every push.
//!
//! Positions that are burned or merged away keep their power history so
//! past queries about them stay answerable.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use lockstep_core::checkpoint::CheckpointSeries;
use lockstep_core::clock::Clock;
use lockstep_core::constants::{
    FIRST_POSITION_ID, MAX_COMMITMENT_DURATION, MIN_COMMITMENT_DURATION, MIN_SPLIT_SHARES,
};
use lockstep_core::error::{CheckpointError, DelegationError, LedgerError, PositionError};
use lockstep_core::traits::{AssetLedger, PowerModel, PowerObserver};
use lockstep_core::types::{AccountId, Position, PositionId};

use crate::delegation::{Delegation, VotesChange};

/// Who is changing a position's commitment duration.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum DurationAuthority {
    /// The vesting coordinator: any value in `[0, MAX]`.
    Coordinator,
    /// An authorized controller: may only extend, up to `MAX`.
    Holder,
}

/// Serializable state of a [`PositionLedger`], without its collaborators.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct LedgerSnapshot {
    pub positions: BTreeMap<PositionId, Position>,
    pub position_power: HashMap<PositionId, CheckpointSeries>,
    pub total_power: CheckpointSeries,
    pub delegation: Delegation,
    pub approvals: HashMap<PositionId, AccountId>,
    pub operators: HashMap<AccountId, BTreeSet<AccountId>>,
    pub next_id: PositionId,
    pub total_locked: u128,
    pub last_timepoint: u64,
}

impl Default for LedgerSnapshot {
    fn default() -> Self {
        Self {
            positions: BTreeMap::new(),
            position_power: HashMap::new(),
            total_power: CheckpointSeries::new(),
            delegation: Delegation::new(),
            approvals: HashMap::new(),
            operators: HashMap::new(),
            next_id: PositionId(FIRST_POSITION_ID),
            total_locked: 0,
            last_timepoint: 0,
        }
    }
}

/// Authoritative record of every locked position and its voting power.
///
/// Not thread-safe; callers serialize access (the node wraps it in a
/// `RwLock`).
pub struct PositionLedger {
    /// Live positions by id.
    positions: BTreeMap<PositionId, Position>,
    /// Power history per position, including destroyed ones.
    position_power: HashMap<PositionId, CheckpointSeries>,
    /// Global voting-power history.
    total_power: CheckpointSeries,
    delegation: Delegation,
    /// Single-position controllers. Cleared on transfer and burn.
    approvals: HashMap<PositionId, AccountId>,
    /// Owner → accounts allowed to control all of the owner's positions.
    operators: HashMap<AccountId, BTreeSet<AccountId>>,
    next_id: PositionId,
    /// Sum of `locked_amount` over live positions.
    total_locked: u128,
    /// Latest clock reading seen; the clock may not go back past it.
    last_timepoint: u64,
    /// Account of the vesting coordinator, the privileged duration caller.
    coordinator: AccountId,
    model: Arc<dyn PowerModel>,
    assets: Arc<dyn AssetLedger>,
    clock: Arc<dyn Clock>,
    observer: Option<Arc<dyn PowerObserver>>,
}

impl PositionLedger {
    /// Create an empty ledger.
    pub fn new(
        coordinator: AccountId,
        model: Arc<dyn PowerModel>,
        assets: Arc<dyn AssetLedger>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self::from_snapshot(LedgerSnapshot::default(), coordinator, model, assets, clock)
    }

    /// Restore a ledger from persisted state.
    pub fn from_snapshot(
        snapshot: LedgerSnapshot,
        coordinator: AccountId,
        model: Arc<dyn PowerModel>,
        assets: Arc<dyn AssetLedger>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            positions: snapshot.positions,
            position_power: snapshot.position_power,
            total_power: snapshot.total_power,
            delegation: snapshot.delegation,
            approvals: snapshot.approvals,
            operators: snapshot.operators,
            next_id: snapshot.next_id,
            total_locked: snapshot.total_locked,
            last_timepoint: snapshot.last_timepoint,
            coordinator,
            model,
            assets,
            clock,
            observer: None,
        }
    }

    /// Attach a governance observer to be poked on every vote change.
    pub fn with_observer(mut self, observer: Arc<dyn PowerObserver>) -> Self {
        self.observer = Some(observer);
        self
    }

    /// Replace all state with `snapshot`, keeping the collaborators.
    pub fn restore(&mut self, snapshot: LedgerSnapshot) {
        self.positions = snapshot.positions;
        self.position_power = snapshot.position_power;
        self.total_power = snapshot.total_power;
        self.delegation = snapshot.delegation;
        self.approvals = snapshot.approvals;
        self.operators = snapshot.operators;
        self.next_id = snapshot.next_id;
        self.total_locked = snapshot.total_locked;
        self.last_timepoint = snapshot.last_timepoint;
    }

    /// Copy out the persisted state.
    pub fn snapshot(&self) -> LedgerSnapshot {
        LedgerSnapshot {
            positions: self.positions.clone(),
            position_power: self.position_power.clone(),
            total_power: self.total_power.clone(),
            delegation: self.delegation.clone(),
            approvals: self.approvals.clone(),
            operators: self.operators.clone(),
            next_id: self.next_id,
            total_locked: self.total_locked,
            last_timepoint: self.last_timepoint,
        }
    }

    // ------------------------------------------------------------------
    // Queries
    // ------------------------------------------------------------------

    /// The vesting coordinator's account.
    pub fn coordinator(&self) -> &AccountId {
        &self.coordinator
    }

    pub fn position(&self, id: PositionId) -> Option<&Position> {
        self.positions.get(&id)
    }

    pub fn owner_of(&self, id: PositionId) -> Option<AccountId> {
        self.positions.get(&id).map(|p| p.owner)
    }

    /// Locked amount of a live position, zero otherwise.
    pub fn locked_amount(&self, id: PositionId) -> u128 {
        self.positions.get(&id).map_or(0, |p| p.locked_amount)
    }

    /// Remaining commitment of a live position, zero otherwise.
    pub fn remaining_duration(&self, id: PositionId) -> u64 {
        self.positions.get(&id).map_or(0, |p| p.remaining_duration)
    }

    /// Current voting power of a position, derived from its record.
    pub fn voting_power(&self, id: PositionId) -> Result<u128, LedgerError> {
        match self.positions.get(&id) {
            Some(p) => self.power_of(p.locked_amount, p.remaining_duration),
            None => Ok(0),
        }
    }

    /// Power of position `id` at a strictly past `timepoint`.
    pub fn past_position_power(&self, id: PositionId, timepoint: u64) -> Result<u128, LedgerError> {
        let now = self.clock.now();
        match self.position_power.get(&id) {
            Some(series) => Ok(series.lookup(timepoint, now)?),
            None if timepoint >= now => Err(CheckpointError::OutOfRange { timepoint, now }.into()),
            None => Ok(0),
        }
    }

    /// Power history of position `id`, if it ever existed.
    pub fn position_history(&self, id: PositionId) -> Option<&CheckpointSeries> {
        self.position_power.get(&id)
    }

    /// Current total voting power.
    pub fn total_voting_power(&self) -> u128 {
        self.total_power.latest()
    }

    /// Total voting power at a strictly past `timepoint`.
    pub fn past_total_voting_power(&self, timepoint: u64) -> Result<u128, LedgerError> {
        Ok(self.total_power.lookup(timepoint, self.clock.now())?)
    }

    /// Votes currently attributed to `account` as a delegate.
    pub fn votes(&self, account: &AccountId) -> u128 {
        self.delegation.votes(account)
    }

    /// Votes attributed to `account` at a strictly past `timepoint`.
    pub fn past_votes(&self, account: &AccountId, timepoint: u64) -> Result<u128, LedgerError> {
        Ok(self.delegation.past_votes(account, timepoint, self.clock.now())?)
    }

    pub fn delegates(&self, account: &AccountId) -> AccountId {
        self.delegation.delegates(account)
    }

    pub fn delegation(&self) -> &Delegation {
        &self.delegation
    }

    /// Sum of locked amounts over all live positions.
    pub fn total_locked(&self) -> u128 {
        self.total_locked
    }

    /// Live positions owned by `owner`, ascending by id.
    pub fn positions_of(&self, owner: &AccountId) -> Vec<PositionId> {
        self.positions
            .values()
            .filter(|p| p.owner == *owner)
            .map(|p| p.id)
            .collect()
    }

    /// Live positions, ascending by id.
    pub fn positions(&self) -> impl Iterator<Item = &Position> {
        self.positions.values()
    }

    /// Number of live positions.
    pub fn position_count(&self) -> usize {
        self.positions.len()
    }

    /// Single-position controller of `id`, if any.
    pub fn approved(&self, id: PositionId) -> Option<AccountId> {
        self.approvals.get(&id).copied()
    }

    pub fn is_operator(&self, owner: &AccountId, operator: &AccountId) -> bool {
        self.operators
            .get(owner)
            .is_some_and(|set| set.contains(operator))
    }

    /// Whether `caller` controls position `id`: owner, approved controller,
    /// or operator for all of the owner's positions.
    pub fn is_authorized(&self, caller: &AccountId, id: PositionId) -> bool {
        let Some(position) = self.positions.get(&id) else {
            return false;
        };
        position.owner == *caller
            || self.approvals.get(&id) == Some(caller)
            || self.is_operator(&position.owner, caller)
    }

    // ------------------------------------------------------------------
    // Lifecycle
    // ------------------------------------------------------------------

    /// Lock `amount` pulled from `caller` for `duration` seconds, owned by `owner`.
    ///
    /// # Errors
    ///
    /// - [`PositionError::ZeroLockBalance`] if `amount` is zero
    /// - [`PositionError::InvalidCommitmentDuration`] unless
    ///   `MIN_COMMITMENT_DURATION <= duration <= MAX_COMMITMENT_DURATION`
    /// - [`AssetError`](lockstep_core::error::AssetError) if the pull fails
    pub fn mint(
        &mut self,
        caller: &AccountId,
        owner: &AccountId,
        amount: u128,
        duration: u64,
    ) -> Result<PositionId, LedgerError> {
        if amount == 0 {
            return Err(PositionError::ZeroLockBalance.into());
        }
        if !(MIN_COMMITMENT_DURATION..=MAX_COMMITMENT_DURATION).contains(&duration) {
            return Err(PositionError::InvalidCommitmentDuration {
                duration,
                min: MIN_COMMITMENT_DURATION,
                max: MAX_COMMITMENT_DURATION,
            }
            .into());
        }
        self.require_receiver(owner)?;
        let now = self.begin()?;
        let power = self.power_of(amount, duration)?;
        let total_locked = self.checked_locked_add(amount)?;

        self.assets.transfer_in(caller, amount)?;

        let id = self.next_id;
        self.next_id = id.next();
        self.total_locked = total_locked;
        self.positions.insert(
            id,
            Position {
                id,
                owner: *owner,
                locked_amount: amount,
                remaining_duration: duration,
                created_at: now,
            },
        );
        self.push_position_power(id, power, now)?;
        self.apply_total_delta(power, 0, now)?;
        let changes = self.delegation.adjust_units(owner, 0, power, now)?;
        self.notify(&changes);

        info!(position = %id, %owner, amount, duration, power, "position minted");
        Ok(id)
    }

    /// Add `amount` pulled from `caller` to an existing position.
    ///
    /// Anyone may top up any position; the duration is unchanged.
    pub fn top_up(
        &mut self,
        caller: &AccountId,
        id: PositionId,
        amount: u128,
    ) -> Result<(), LedgerError> {
        if amount == 0 {
            return Err(PositionError::ZeroLockBalance.into());
        }
        let position = self.get(id)?.clone();
        let now = self.begin()?;
        let new_amount = position
            .locked_amount
            .checked_add(amount)
            .ok_or(PositionError::ArithmeticOverflow)?;
        let before = self.power_of(position.locked_amount, position.remaining_duration)?;
        let after = self.power_of(new_amount, position.remaining_duration)?;
        let total_locked = self.checked_locked_add(amount)?;

        self.assets.transfer_in(caller, amount)?;

        self.total_locked = total_locked;
        if let Some(p) = self.positions.get_mut(&id) {
            p.locked_amount = new_amount;
        }
        self.commit_power_change(id, &position.owner, before, after, now)?;

        info!(position = %id, %caller, amount, locked = new_amount, power = after, "position topped up");
        Ok(())
    }

    /// Destroy an expired position and pay its locked amount to `receiver`.
    ///
    /// # Errors
    ///
    /// - [`PositionError::NotAuthorized`] unless `caller` controls the position
    /// - [`PositionError::VestingNotFinished`] while any commitment remains
    pub fn burn(
        &mut self,
        caller: &AccountId,
        receiver: &AccountId,
        id: PositionId,
    ) -> Result<u128, LedgerError> {
        let now = self.begin()?;
        self.burn_at(caller, receiver, id, now)
    }

    /// Fold `source` into `target`: amounts add, the longer duration wins,
    /// and `source` is destroyed without payout.
    ///
    /// The global total moves by one net delta, so it never shows the two
    /// positions double-counted or missing.
    pub fn merge(
        &mut self,
        caller: &AccountId,
        source: PositionId,
        target: PositionId,
    ) -> Result<(), LedgerError> {
        if source == target {
            return Err(PositionError::SelfMerge(source).into());
        }
        let src = self.get(source)?.clone();
        let tgt = self.get(target)?.clone();
        self.require_authorized(caller, source)?;
        self.require_authorized(caller, target)?;
        let now = self.begin()?;

        let amount = src
            .locked_amount
            .checked_add(tgt.locked_amount)
            .ok_or(PositionError::ArithmeticOverflow)?;
        let duration = src.remaining_duration.max(tgt.remaining_duration);
        let src_before = self.power_of(src.locked_amount, src.remaining_duration)?;
        let tgt_before = self.power_of(tgt.locked_amount, tgt.remaining_duration)?;
        let tgt_after = self.power_of(amount, duration)?;

        self.positions.remove(&source);
        self.approvals.remove(&source);
        if let Some(p) = self.positions.get_mut(&target) {
            p.locked_amount = amount;
            p.remaining_duration = duration;
        }

        self.push_position_power(source, 0, now)?;
        self.push_position_power(target, tgt_after, now)?;
        self.apply_total_delta(tgt_after, src_before + tgt_before, now)?;

        let mut changes = self.delegation.adjust_units(&src.owner, src_before, 0, now)?;
        changes.extend(self.delegation.adjust_units(&tgt.owner, tgt_before, tgt_after, now)?);
        self.notify(&changes);

        info!(
            %source, %target, locked = amount, duration,
            power_before = src_before + tgt_before, power_after = tgt_after,
            "positions merged"
        );
        Ok(())
    }

    /// Split a position by `shares`. The first share keeps the original id
    /// and any rounding remainder; the rest become new positions with the
    /// same owner, duration, and creation time.
    ///
    /// Returns the resulting ids in share order.
    ///
    /// # Errors
    ///
    /// - [`PositionError::InvalidSharesLength`] for fewer than two shares
    /// - [`PositionError::ZeroLockBalance`] if any resulting amount is zero
    pub fn split(
        &mut self,
        caller: &AccountId,
        id: PositionId,
        shares: &[u128],
    ) -> Result<Vec<PositionId>, LedgerError> {
        if shares.len() < MIN_SPLIT_SHARES {
            return Err(PositionError::InvalidSharesLength(shares.len()).into());
        }
        let original = self.get(id)?.clone();
        self.require_authorized(caller, id)?;
        let now = self.begin()?;

        let amounts = split_amounts(original.locked_amount, shares)?;
        let powers = amounts
            .iter()
            .map(|&a| self.power_of(a, original.remaining_duration))
            .collect::<Result<Vec<_>, _>>()?;
        let before = self.power_of(original.locked_amount, original.remaining_duration)?;
        let after: u128 = powers.iter().sum();

        let mut ids = Vec::with_capacity(amounts.len());
        ids.push(id);
        if let Some(p) = self.positions.get_mut(&id) {
            p.locked_amount = amounts[0];
        }
        self.push_position_power(id, powers[0], now)?;
        for (&amount, &power) in amounts.iter().zip(&powers).skip(1) {
            let child = self.next_id;
            self.next_id = child.next();
            self.positions.insert(
                child,
                Position {
                    id: child,
                    owner: original.owner,
                    locked_amount: amount,
                    remaining_duration: original.remaining_duration,
                    created_at: original.created_at,
                },
            );
            self.push_position_power(child, power, now)?;
            ids.push(child);
        }

        self.apply_total_delta(after, before, now)?;
        let changes = self.delegation.adjust_units(&original.owner, before, after, now)?;
        self.notify(&changes);

        info!(position = %id, parts = ids.len(), power_before = before, power_after = after, "position split");
        Ok(ids)
    }

    /// Change a position's remaining commitment.
    ///
    /// The vesting coordinator may set any value in `[0, MAX]`. Any other
    /// authorized caller may only extend, up to `MAX`. Setting the current
    /// value is a no-op.
    pub fn update_commitment_duration(
        &mut self,
        caller: &AccountId,
        id: PositionId,
        duration: u64,
    ) -> Result<(), LedgerError> {
        let now = self.begin()?;
        self.update_commitment_duration_at(caller, id, duration, now)
    }

    /// Move ownership of a position to `to`, carrying its voting power to
    /// the new owner's delegatee.
    pub fn transfer_position(
        &mut self,
        caller: &AccountId,
        to: &AccountId,
        id: PositionId,
    ) -> Result<(), LedgerError> {
        self.get(id)?;
        self.require_authorized(caller, id)?;
        self.require_receiver(to)?;
        let now = self.begin()?;
        self.transfer_position_at(id, to, now)
    }

    /// Set or clear the single-position controller of `id`.
    pub fn approve(
        &mut self,
        caller: &AccountId,
        id: PositionId,
        controller: Option<AccountId>,
    ) -> Result<(), LedgerError> {
        let owner = self.get(id)?.owner;
        if *caller != owner && !self.is_operator(&owner, caller) {
            return Err(PositionError::NotAuthorized { caller: *caller, position: id }.into());
        }
        match controller {
            Some(c) => {
                self.approvals.insert(id, c);
            }
            None => {
                self.approvals.remove(&id);
            }
        }
        debug!(position = %id, ?controller, "approval set");
        Ok(())
    }

    /// Grant or revoke `operator` control over all of `caller`'s positions.
    pub fn set_operator(&mut self, caller: &AccountId, operator: &AccountId, approved: bool) {
        if approved {
            self.operators.entry(*caller).or_default().insert(*operator);
        } else if let Some(set) = self.operators.get_mut(caller) {
            set.remove(operator);
            if set.is_empty() {
                self.operators.remove(caller);
            }
        }
        debug!(owner = %caller, %operator, approved, "operator set");
    }

    /// Attribute `account`'s voting power to `delegatee`.
    pub fn delegate(&mut self, account: &AccountId, delegatee: &AccountId) -> Result<(), LedgerError> {
        if *delegatee == self.coordinator {
            return Err(DelegationError::CoordinatorDelegatee(*delegatee).into());
        }
        let now = self.begin()?;
        let changes = self.delegation.delegate(account, delegatee, now)?;
        self.notify(&changes);
        info!(%account, %delegatee, "delegated");
        Ok(())
    }

    // ------------------------------------------------------------------
    // Coordinator entry points (single clock read owned by the caller)
    // ------------------------------------------------------------------

    /// Read the clock once for an operation, rejecting regressions.
    pub(crate) fn begin(&mut self) -> Result<u64, LedgerError> {
        let now = self.clock.now();
        if now < self.last_timepoint {
            return Err(LedgerError::ClockRegression { last: self.last_timepoint, now });
        }
        self.last_timepoint = now;
        Ok(now)
    }

    pub(crate) fn burn_at(
        &mut self,
        caller: &AccountId,
        receiver: &AccountId,
        id: PositionId,
        now: u64,
    ) -> Result<u128, LedgerError> {
        let position = self.get(id)?.clone();
        self.require_authorized(caller, id)?;
        self.require_receiver(receiver)?;
        if !position.is_expired() {
            return Err(PositionError::VestingNotFinished {
                position: id,
                remaining: position.remaining_duration,
            }
            .into());
        }
        let power = self.power_of(position.locked_amount, position.remaining_duration)?;
        let total_locked = self
            .total_locked
            .checked_sub(position.locked_amount)
            .ok_or_else(|| LedgerError::InvariantViolation(format!("total locked below {id}'s amount")))?;

        self.assets.transfer_out(receiver, position.locked_amount)?;

        self.positions.remove(&id);
        self.approvals.remove(&id);
        self.total_locked = total_locked;
        self.push_position_power(id, 0, now)?;
        self.apply_total_delta(0, power, now)?;
        let changes = self.delegation.adjust_units(&position.owner, power, 0, now)?;
        self.notify(&changes);

        info!(position = %id, %receiver, amount = position.locked_amount, "position burned");
        Ok(position.locked_amount)
    }

    pub(crate) fn update_commitment_duration_at(
        &mut self,
        caller: &AccountId,
        id: PositionId,
        duration: u64,
        now: u64,
    ) -> Result<(), LedgerError> {
        let position = self.get(id)?.clone();
        let authority = if *caller == self.coordinator {
            DurationAuthority::Coordinator
        } else if self.is_authorized(caller, id) {
            DurationAuthority::Holder
        } else {
            return Err(PositionError::NotAuthorized { caller: *caller, position: id }.into());
        };

        let current = position.remaining_duration;
        let min = match authority {
            DurationAuthority::Coordinator => 0,
            DurationAuthority::Holder => current,
        };
        if duration < min || duration > MAX_COMMITMENT_DURATION {
            return Err(PositionError::InvalidCommitmentDuration {
                duration,
                min,
                max: MAX_COMMITMENT_DURATION,
            }
            .into());
        }
        if duration == current {
            return Ok(());
        }

        let before = self.power_of(position.locked_amount, current)?;
        let after = self.power_of(position.locked_amount, duration)?;
        if let Some(p) = self.positions.get_mut(&id) {
            p.remaining_duration = duration;
        }
        self.commit_power_change(id, &position.owner, before, after, now)?;

        info!(position = %id, ?authority, from = current, to = duration, power = after, "commitment updated");
        Ok(())
    }

    /// Reassign ownership without an authorization check.
    pub(crate) fn transfer_position_at(
        &mut self,
        id: PositionId,
        to: &AccountId,
        now: u64,
    ) -> Result<(), LedgerError> {
        if to.is_zero() {
            return Err(PositionError::ZeroReceiver.into());
        }
        let position = self.get(id)?.clone();
        if position.owner == *to {
            return Ok(());
        }
        let power = self.power_of(position.locked_amount, position.remaining_duration)?;

        if let Some(p) = self.positions.get_mut(&id) {
            p.owner = *to;
        }
        self.approvals.remove(&id);
        let mut changes = self.delegation.adjust_units(&position.owner, power, 0, now)?;
        changes.extend(self.delegation.adjust_units(to, 0, power, now)?);
        self.notify(&changes);

        info!(position = %id, from = %position.owner, %to, power, "position transferred");
        Ok(())
    }

    // ------------------------------------------------------------------
    // Internals
    // ------------------------------------------------------------------

    fn get(&self, id: PositionId) -> Result<&Position, PositionError> {
        self.positions.get(&id).ok_or(PositionError::NotFound(id))
    }

    fn require_authorized(&self, caller: &AccountId, id: PositionId) -> Result<(), PositionError> {
        if self.is_authorized(caller, id) {
            Ok(())
        } else {
            Err(PositionError::NotAuthorized { caller: *caller, position: id })
        }
    }

    /// Outside accounts only: the zero account and the coordinator may
    /// not own or be paid by a position.
    pub(crate) fn require_receiver(&self, account: &AccountId) -> Result<(), PositionError> {
        if account.is_zero() {
            return Err(PositionError::ZeroReceiver);
        }
        if *account == self.coordinator {
            return Err(PositionError::CoordinatorReceiver(*account));
        }
        Ok(())
    }

        fn power_of(&self, amount: u128, duration: u64) -> Result<u128, LedgerError> {
        Ok(self.model.clamped_voting_power(amount, duration)?)
    }

    fn checked_locked_add(&self, amount: u128) -> Result<u128, PositionError> {
        self.total_locked
            .checked_add(amount)
            .ok_or(PositionError::ArithmeticOverflow)
    }

    /// Push a changed power for one position and propagate the delta.
    fn commit_power_change(
        &mut self,
        id: PositionId,
        owner: &AccountId,
        before: u128,
        after: u128,
        now: u64,
    ) -> Result<(), LedgerError> {
        self.push_position_power(id, after, now)?;
        self.apply_total_delta(after, before, now)?;
        let changes = self.delegation.adjust_units(owner, before, after, now)?;
        self.notify(&changes);
        Ok(())
    }

    fn push_position_power(&mut self, id: PositionId, power: u128, now: u64) -> Result<(), LedgerError> {
        let (previous, current) = self.position_power.entry(id).or_default().push(now, power)?;
        debug!(position = %id, previous, current, timepoint = now, "position checkpoint");
        Ok(())
    }

    /// Apply `+increase - decrease` to the global total in one push.
    fn apply_total_delta(&mut self, increase: u128, decrease: u128, now: u64) -> Result<(), LedgerError> {
        if increase == decrease {
            return Ok(());
        }
        let total = self
            .total_power
            .latest()
            .checked_add(increase)
            .and_then(|t| t.checked_sub(decrease))
            .ok_or_else(|| {
                LedgerError::InvariantViolation(format!(
                    "total power out of range: {} + {increase} - {decrease}",
                    self.total_power.latest()
                ))
            })?;
        let (previous, current) = self.total_power.push(now, total)?;
        debug!(previous, current, timepoint = now, "total checkpoint");
        Ok(())
    }

    /// Poke the observer for each changed delegate. Failures are logged,
    /// never propagated.
    fn notify(&self, changes: &[VotesChange]) {
        let Some(observer) = &self.observer else {
            return;
        };
        for change in changes {
            if let Err(e) = observer.voting_power_changed(&change.delegatee, change.current) {
                warn!(delegatee = %change.delegatee, votes = change.current, "observer notification failed: {e}");
            }
        }
    }
}

/// Divide `locked` by `shares`: share `i >= 1` gets
/// `floor(shares[i] * locked / total)`, share 0 keeps the remainder.
fn split_amounts(locked: u128, shares: &[u128]) -> Result<Vec<u128>, PositionError> {
    let total = shares
        .iter()
        .try_fold(0u128, |acc, &s| acc.checked_add(s))
        .ok_or(PositionError::ArithmeticOverflow)?;
    if total == 0 {
        return Err(PositionError::ZeroLockBalance);
    }

    let mut amounts = Vec::with_capacity(shares.len());
    amounts.push(0);
    let mut assigned = 0u128;
    for &share in &shares[1..] {
        let amount = share
            .checked_mul(locked)
            .ok_or(PositionError::ArithmeticOverflow)?
            / total;
        if amount == 0 {
            return Err(PositionError::ZeroLockBalance);
        }
        assigned += amount;
        amounts.push(amount);
    }
    // Each floor is at most its exact share, so `assigned <= locked`.
    amounts[0] = locked - assigned;
    if amounts[0] == 0 {
        return Err(PositionError::ZeroLockBalance);
    }
    Ok(amounts)
}

#[cfg(test)]
mod tests {
    use super::*;
    use lockstep_core::assets::MemoryAssetLedger;
    use lockstep_core::clock::ManualClock;
    use lockstep_core::constants::{UNIT, WEEK, YEAR};
    use lockstep_core::error::{AssetError, ObserverError};
    use lockstep_decay::LinearDecay;
    use parking_lot::Mutex;
    use proptest::prelude::*;

    const START: u64 = 1_700_000_000;

    fn acct(seed: u8) -> AccountId {
        AccountId([seed; 32])
    }

    fn coordinator() -> AccountId {
        acct(0xC0)
    }

    struct Harness {
        ledger: PositionLedger,
        assets: Arc<MemoryAssetLedger>,
        clock: Arc<ManualClock>,
    }

    fn harness() -> Harness {
        let assets = Arc::new(MemoryAssetLedger::new());
        let clock = Arc::new(ManualClock::new(START));
        for seed in 1..=4 {
            assets.mint(&acct(seed), 1_000 * UNIT).unwrap();
        }
        let ledger = PositionLedger::new(
            coordinator(),
            Arc::new(LinearDecay::new()),
            assets.clone(),
            clock.clone(),
        );
        Harness { ledger, assets, clock }
    }

    /// Records every poke it receives.
    #[derive(Default)]
    struct RecordingObserver {
        seen: Mutex<Vec<(AccountId, u128)>>,
    }

    impl PowerObserver for RecordingObserver {
        fn voting_power_changed(&self, account: &AccountId, votes: u128) -> Result<(), ObserverError> {
            self.seen.lock().push((*account, votes));
            Ok(())
        }
    }

    struct FailingObserver;

    impl PowerObserver for FailingObserver {
        fn voting_power_changed(&self, account: &AccountId, _votes: u128) -> Result<(), ObserverError> {
            Err(ObserverError::Rejected { account: *account, reason: "offline".into() })
        }
    }

    fn assert_consistent(ledger: &PositionLedger) {
        let sum: u128 = ledger
            .positions
            .keys()
            .map(|&id| ledger.voting_power(id).unwrap())
            .sum();
        assert_eq!(ledger.total_voting_power(), sum, "total != sum of positions");
        let locked: u128 = ledger.positions.values().map(|p| p.locked_amount).sum();
        assert_eq!(ledger.total_locked(), locked, "total_locked drifted");
    }

    // --- mint ---

    #[test]
    fn mint_full_duration_votes_full_amount() {
        let mut h = harness();
        let id = h.ledger.mint(&acct(1), &acct(1), UNIT, MAX_COMMITMENT_DURATION).unwrap();
        assert_eq!(id, PositionId(FIRST_POSITION_ID));
        assert_eq!(h.ledger.voting_power(id).unwrap(), UNIT);
        assert_eq!(h.ledger.votes(&acct(1)), UNIT);
        assert_eq!(h.ledger.total_voting_power(), UNIT);
        assert_eq!(h.ledger.position(id).unwrap().created_at, START);
        assert_eq!(h.assets.custody(), UNIT);
        assert_eq!(h.ledger.delegates(&acct(1)), acct(1));
        assert!(h.ledger.delegation().has_delegatee(&acct(1)));
    }

    #[test]
    fn mint_ids_increase() {
        let mut h = harness();
        let a = h.ledger.mint(&acct(1), &acct(1), UNIT, YEAR).unwrap();
        let b = h.ledger.mint(&acct(1), &acct(2), UNIT, YEAR).unwrap();
        assert!(b > a);
        assert_eq!(h.ledger.positions_of(&acct(2)), vec![b]);
    }

    #[test]
    fn mint_rejects_zero_amount() {
        let mut h = harness();
        let err = h.ledger.mint(&acct(1), &acct(1), 0, YEAR).unwrap_err();
        assert!(matches!(err, LedgerError::Position(PositionError::ZeroLockBalance)));
    }

    #[test]
    fn mint_rejects_out_of_range_duration() {
        let mut h = harness();
        for duration in [0, WEEK - 1, MAX_COMMITMENT_DURATION + 1] {
            let err = h.ledger.mint(&acct(1), &acct(1), UNIT, duration).unwrap_err();
            assert!(
                matches!(err, LedgerError::Position(PositionError::InvalidCommitmentDuration { .. })),
                "duration {duration}"
            );
        }
        assert_eq!(h.ledger.position_count(), 0);
    }

    #[test]
    fn mint_failed_pull_leaves_no_trace() {
        let mut h = harness();
        let err = h.ledger.mint(&acct(9), &acct(9), UNIT, YEAR).unwrap_err();
        assert!(matches!(err, LedgerError::Asset(AssetError::InsufficientBalance { .. })));
        assert_eq!(h.ledger.position_count(), 0);
        assert_eq!(h.ledger.total_voting_power(), 0);
        assert!(h.ledger.position_history(PositionId(FIRST_POSITION_ID)).is_none());
        // The id was not consumed.
        let id = h.ledger.mint(&acct(1), &acct(1), UNIT, YEAR).unwrap();
        assert_eq!(id, PositionId(FIRST_POSITION_ID));
    }

    // --- top_up ---

    #[test]
    fn top_up_by_anyone_keeps_duration() {
        let mut h = harness();
        let id = h.ledger.mint(&acct(1), &acct(1), UNIT, YEAR).unwrap();
        h.clock.advance(10);
        h.ledger.top_up(&acct(2), id, UNIT).unwrap();
        let p = h.ledger.position(id).unwrap();
        assert_eq!(p.locked_amount, 2 * UNIT);
        assert_eq!(p.remaining_duration, YEAR);
        assert_eq!(h.ledger.votes(&acct(1)), UNIT);
        assert_eq!(h.assets.balance_of(&acct(2)), 999 * UNIT);
        assert_consistent(&h.ledger);
    }

    #[test]
    fn top_up_unknown_position_fails() {
        let mut h = harness();
        let err = h.ledger.top_up(&acct(1), PositionId(42), UNIT).unwrap_err();
        assert!(matches!(err, LedgerError::Position(PositionError::NotFound(PositionId(42)))));
    }

    #[test]
    fn top_up_zero_rejected() {
        let mut h = harness();
        let id = h.ledger.mint(&acct(1), &acct(1), UNIT, YEAR).unwrap();
        let err = h.ledger.top_up(&acct(1), id, 0).unwrap_err();
        assert!(matches!(err, LedgerError::Position(PositionError::ZeroLockBalance)));
    }

    // --- update_commitment_duration ---

    #[test]
    fn holder_may_only_extend() {
        let mut h = harness();
        let id = h.ledger.mint(&acct(1), &acct(1), UNIT, YEAR).unwrap();
        let err = h.ledger.update_commitment_duration(&acct(1), id, YEAR - 1).unwrap_err();
        assert!(matches!(
            err,
            LedgerError::Position(PositionError::InvalidCommitmentDuration { min, .. }) if min == YEAR
        ));
        let err = h
            .ledger
            .update_commitment_duration(&acct(1), id, MAX_COMMITMENT_DURATION + 1)
            .unwrap_err();
        assert!(matches!(err, LedgerError::Position(PositionError::InvalidCommitmentDuration { .. })));

        h.ledger.update_commitment_duration(&acct(1), id, MAX_COMMITMENT_DURATION).unwrap();
        assert_eq!(h.ledger.voting_power(id).unwrap(), UNIT);
        assert_consistent(&h.ledger);
    }

    #[test]
    fn coordinator_may_shorten() {
        let mut h = harness();
        let id = h.ledger.mint(&acct(1), &acct(1), UNIT, YEAR).unwrap();
        h.ledger.update_commitment_duration(&coordinator(), id, 0).unwrap();
        assert_eq!(h.ledger.voting_power(id).unwrap(), 0);
        assert_eq!(h.ledger.votes(&acct(1)), 0);
        h.ledger.update_commitment_duration(&coordinator(), id, YEAR / 2).unwrap();
        assert_eq!(h.ledger.voting_power(id).unwrap(), UNIT / 4);
        assert_consistent(&h.ledger);
    }

    #[test]
    fn stranger_cannot_update_duration() {
        let mut h = harness();
        let id = h.ledger.mint(&acct(1), &acct(1), UNIT, YEAR).unwrap();
        let err = h.ledger.update_commitment_duration(&acct(2), id, 2 * YEAR).unwrap_err();
        assert!(matches!(err, LedgerError::Position(PositionError::NotAuthorized { .. })));
    }

    #[test]
    fn same_duration_is_noop() {
        let mut h = harness();
        let id = h.ledger.mint(&acct(1), &acct(1), UNIT, YEAR).unwrap();
        h.clock.advance(5);
        h.ledger.update_commitment_duration(&acct(1), id, YEAR).unwrap();
        assert_eq!(h.ledger.position_history(id).unwrap().len(), 1);
    }

    // --- burn ---

    #[test]
    fn burn_requires_expired_commitment() {
        let mut h = harness();
        let id = h.ledger.mint(&acct(1), &acct(1), UNIT, YEAR).unwrap();
        let err = h.ledger.burn(&acct(1), &acct(1), id).unwrap_err();
        assert!(matches!(
            err,
            LedgerError::Position(PositionError::VestingNotFinished { remaining: YEAR, .. })
        ));
    }

    #[test]
    fn burn_pays_receiver_and_keeps_history() {
        let mut h = harness();
        let id = h.ledger.mint(&acct(1), &acct(1), UNIT, YEAR).unwrap();
        h.clock.advance(10);
        h.ledger.update_commitment_duration(&coordinator(), id, 0).unwrap();
        h.clock.advance(10);
        let paid = h.ledger.burn(&acct(1), &acct(3), id).unwrap();
        assert_eq!(paid, UNIT);
        assert_eq!(h.assets.balance_of(&acct(3)), 1_001 * UNIT);
        assert!(h.ledger.position(id).is_none());
        assert_eq!(h.ledger.total_locked(), 0);

        h.clock.advance(1);
        assert_eq!(h.ledger.past_position_power(id, START).unwrap(), UNIT / 2);
        assert_eq!(h.ledger.past_position_power(id, START + 20).unwrap(), 0);
    }

    #[test]
    fn burn_by_stranger_rejected() {
        let mut h = harness();
        let id = h.ledger.mint(&acct(1), &acct(1), UNIT, YEAR).unwrap();
        h.ledger.update_commitment_duration(&coordinator(), id, 0).unwrap();
        let err = h.ledger.burn(&acct(2), &acct(2), id).unwrap_err();
        assert!(matches!(err, LedgerError::Position(PositionError::NotAuthorized { .. })));
    }

    // --- merge ---

    #[test]
    fn merge_takes_longer_duration() {
        let mut h = harness();
        let a = h.ledger.mint(&acct(1), &acct(1), UNIT, MAX_COMMITMENT_DURATION).unwrap();
        let b = h.ledger.mint(&acct(1), &acct(1), UNIT, YEAR).unwrap();
        assert_eq!(h.ledger.total_voting_power(), UNIT + UNIT / 2);

        h.clock.advance(1);
        h.ledger.merge(&acct(1), a, b).unwrap();
        let target = h.ledger.position(b).unwrap();
        assert_eq!(target.locked_amount, 2 * UNIT);
        assert_eq!(target.remaining_duration, MAX_COMMITMENT_DURATION);
        assert!(h.ledger.position(a).is_none());
        assert_eq!(h.ledger.total_voting_power(), 2 * UNIT);
        assert_eq!(h.ledger.votes(&acct(1)), 2 * UNIT);
        assert_consistent(&h.ledger);
    }

    #[test]
    fn merge_pushes_total_once() {
        let mut h = harness();
        let a = h.ledger.mint(&acct(1), &acct(1), UNIT, YEAR).unwrap();
        let b = h.ledger.mint(&acct(1), &acct(1), UNIT, YEAR).unwrap();
        h.clock.advance(1);
        let before = h.ledger.total_power.len();
        h.ledger.merge(&acct(1), a, b).unwrap();
        // Equal durations: merge is power-neutral, so no new total entry.
        assert_eq!(h.ledger.total_power.len(), before);
    }

    #[test]
    fn self_merge_rejected() {
        let mut h = harness();
        let a = h.ledger.mint(&acct(1), &acct(1), UNIT, YEAR).unwrap();
        let err = h.ledger.merge(&acct(1), a, a).unwrap_err();
        assert!(matches!(err, LedgerError::Position(PositionError::SelfMerge(_))));
    }

    #[test]
    fn merge_needs_authority_over_both() {
        let mut h = harness();
        let a = h.ledger.mint(&acct(1), &acct(1), UNIT, YEAR).unwrap();
        let b = h.ledger.mint(&acct(2), &acct(2), UNIT, YEAR).unwrap();
        let err = h.ledger.merge(&acct(1), a, b).unwrap_err();
        assert!(matches!(err, LedgerError::Position(PositionError::NotAuthorized { .. })));
        assert!(h.ledger.position(a).is_some());

        // With approval over b, acct(1) can fold a into b; votes move to b's owner.
        h.ledger.approve(&acct(2), b, Some(acct(1))).unwrap();
        h.ledger.merge(&acct(1), a, b).unwrap();
        assert_eq!(h.ledger.votes(&acct(1)), 0);
        assert_eq!(h.ledger.votes(&acct(2)), UNIT);
        assert_consistent(&h.ledger);
    }

    // --- split ---

    #[test]
    fn split_by_shares() {
        let mut h = harness();
        let id = h.ledger.mint(&acct(1), &acct(1), UNIT, MAX_COMMITMENT_DURATION).unwrap();
        h.clock.advance(3);
        let ids = h.ledger.split(&acct(1), id, &[5, 3, 2]).unwrap();
        assert_eq!(ids[0], id);
        let amounts: Vec<u128> = ids.iter().map(|&i| h.ledger.locked_amount(i)).collect();
        assert_eq!(amounts, vec![UNIT / 2, 3 * UNIT / 10, UNIT / 5]);
        for &i in &ids {
            let p = h.ledger.position(i).unwrap();
            assert_eq!(p.remaining_duration, MAX_COMMITMENT_DURATION);
            assert_eq!(p.created_at, START);
            assert_eq!(p.owner, acct(1));
        }
        assert_eq!(h.ledger.total_voting_power(), UNIT);
        assert_consistent(&h.ledger);
    }

    #[test]
    fn split_remainder_stays_with_first() {
        let mut h = harness();
        let id = h.ledger.mint(&acct(1), &acct(1), 10, YEAR).unwrap();
        let ids = h.ledger.split(&acct(1), id, &[1, 1, 1]).unwrap();
        let amounts: Vec<u128> = ids.iter().map(|&i| h.ledger.locked_amount(i)).collect();
        assert_eq!(amounts, vec![4, 3, 3]);
        assert_consistent(&h.ledger);
    }

    #[test]
    fn split_rejects_short_shares() {
        let mut h = harness();
        let id = h.ledger.mint(&acct(1), &acct(1), UNIT, YEAR).unwrap();
        let err = h.ledger.split(&acct(1), id, &[1]).unwrap_err();
        assert!(matches!(err, LedgerError::Position(PositionError::InvalidSharesLength(1))));
    }

    #[test]
    fn split_rejects_zero_result() {
        let mut h = harness();
        let id = h.ledger.mint(&acct(1), &acct(1), 10, YEAR).unwrap();
        // 1 * 10 / 100 floors to zero.
        let err = h.ledger.split(&acct(1), id, &[99, 1]).unwrap_err();
        assert!(matches!(err, LedgerError::Position(PositionError::ZeroLockBalance)));
        // First share zero.
        let err = h.ledger.split(&acct(1), id, &[0, 1]).unwrap_err();
        assert!(matches!(err, LedgerError::Position(PositionError::ZeroLockBalance)));
        assert_eq!(h.ledger.position_count(), 1);
    }

    // --- ownership ---

    #[test]
    fn transfer_moves_votes() {
        let mut h = harness();
        let id = h.ledger.mint(&acct(1), &acct(1), UNIT, MAX_COMMITMENT_DURATION).unwrap();
        h.ledger.approve(&acct(1), id, Some(acct(3))).unwrap();
        h.ledger.transfer_position(&acct(1), &acct(2), id).unwrap();
        assert_eq!(h.ledger.owner_of(id), Some(acct(2)));
        assert_eq!(h.ledger.votes(&acct(1)), 0);
        assert_eq!(h.ledger.votes(&acct(2)), UNIT);
        assert_eq!(h.ledger.approved(id), None, "approval cleared on transfer");
    }

    #[test]
    fn coordinator_account_cannot_receive_positions() {
        let mut h = harness();
        let err = h.ledger.mint(&acct(1), &coordinator(), UNIT, YEAR).unwrap_err();
        assert!(matches!(err, LedgerError::Position(PositionError::CoordinatorReceiver(_))));
        assert_eq!(h.ledger.position_count(), 0);
        assert_eq!(h.assets.balance_of(&acct(1)), 1_000 * UNIT);

        let id = h.ledger.mint(&acct(1), &acct(1), UNIT, MAX_COMMITMENT_DURATION).unwrap();
        let err = h.ledger.transfer_position(&acct(1), &coordinator(), id).unwrap_err();
        assert!(matches!(err, LedgerError::Position(PositionError::CoordinatorReceiver(_))));
        assert_eq!(h.ledger.owner_of(id), Some(acct(1)));
        assert_eq!(h.ledger.votes(&coordinator()), 0);
        assert_eq!(h.ledger.votes(&acct(1)), UNIT);

        h.ledger.update_commitment_duration(&coordinator(), id, 0).unwrap();
        let err = h.ledger.burn(&acct(1), &coordinator(), id).unwrap_err();
        assert!(matches!(err, LedgerError::Position(PositionError::CoordinatorReceiver(_))));
        assert_eq!(h.ledger.locked_amount(id), UNIT);
        assert_consistent(&h.ledger);
    }

    #[test]
    fn delegating_to_coordinator_rejected() {
        let mut h = harness();
        h.ledger.mint(&acct(1), &acct(1), UNIT, MAX_COMMITMENT_DURATION).unwrap();
        let err = h.ledger.delegate(&acct(1), &coordinator()).unwrap_err();
        assert!(matches!(err, LedgerError::Delegation(DelegationError::CoordinatorDelegatee(_))));
        assert_eq!(h.ledger.delegates(&acct(1)), acct(1));
        assert_eq!(h.ledger.votes(&coordinator()), 0);
    }

    #[test]
    fn operator_controls_all_positions() {
        let mut h = harness();
        let a = h.ledger.mint(&acct(1), &acct(1), UNIT, YEAR).unwrap();
        let b = h.ledger.mint(&acct(1), &acct(1), UNIT, YEAR).unwrap();
        assert!(!h.ledger.is_authorized(&acct(4), a));
        h.ledger.set_operator(&acct(1), &acct(4), true);
        assert!(h.ledger.is_authorized(&acct(4), a));
        assert!(h.ledger.is_authorized(&acct(4), b));
        h.ledger.set_operator(&acct(1), &acct(4), false);
        assert!(!h.ledger.is_authorized(&acct(4), b));
    }

    #[test]
    fn delegate_moves_position_votes() {
        let mut h = harness();
        h.ledger.mint(&acct(1), &acct(1), UNIT, MAX_COMMITMENT_DURATION).unwrap();
        h.ledger.delegate(&acct(1), &acct(2)).unwrap();
        assert_eq!(h.ledger.votes(&acct(2)), UNIT);
        h.ledger.mint(&acct(1), &acct(1), UNIT, YEAR).unwrap();
        assert_eq!(h.ledger.votes(&acct(2)), UNIT + UNIT / 2);
        assert_eq!(h.ledger.votes(&acct(1)), 0);
    }

    // --- history ---

    #[test]
    fn past_queries_reject_now() {
        let mut h = harness();
        h.ledger.mint(&acct(1), &acct(1), UNIT, MAX_COMMITMENT_DURATION).unwrap();
        assert!(matches!(
            h.ledger.past_total_voting_power(START),
            Err(LedgerError::Checkpoint(CheckpointError::OutOfRange { .. }))
        ));
        assert!(h.ledger.past_votes(&acct(1), START + 1).is_err());
        h.clock.advance(1);
        assert_eq!(h.ledger.past_total_voting_power(START).unwrap(), UNIT);
        assert_eq!(h.ledger.past_votes(&acct(1), START).unwrap(), UNIT);
        assert_eq!(h.ledger.past_total_voting_power(START - 1).unwrap(), 0);
    }

    #[test]
    fn clock_regression_rejected() {
        let mut h = harness();
        h.ledger.mint(&acct(1), &acct(1), UNIT, YEAR).unwrap();
        h.clock.set(START - 1);
        let err = h.ledger.mint(&acct(1), &acct(1), UNIT, YEAR).unwrap_err();
        assert!(matches!(err, LedgerError::ClockRegression { last: START, now } if now == START - 1));
    }

    // --- observer ---

    #[test]
    fn observer_sees_vote_changes() {
        let h = harness();
        let observer = Arc::new(RecordingObserver::default());
        let mut ledger = h.ledger.with_observer(observer.clone());
        let id = ledger.mint(&acct(1), &acct(1), UNIT, MAX_COMMITMENT_DURATION).unwrap();
        ledger.transfer_position(&acct(1), &acct(2), id).unwrap();
        let seen = observer.seen.lock().clone();
        assert_eq!(seen, vec![(acct(1), UNIT), (acct(1), 0), (acct(2), UNIT)]);
    }

    #[test]
    fn observer_failure_does_not_roll_back() {
        let h = harness();
        let mut ledger = h.ledger.with_observer(Arc::new(FailingObserver));
        let id = ledger.mint(&acct(1), &acct(1), UNIT, YEAR).unwrap();
        assert!(ledger.position(id).is_some());
        assert_eq!(ledger.votes(&acct(1)), UNIT / 2);
    }

    // --- snapshot ---

    #[test]
    fn snapshot_restores_state() {
        let mut h = harness();
        let id = h.ledger.mint(&acct(1), &acct(1), UNIT, YEAR).unwrap();
        let snap = h.ledger.snapshot();
        let json = serde_json::to_string(&snap).unwrap();
        let back: LedgerSnapshot = serde_json::from_str(&json).unwrap();
        assert_eq!(back, snap);

        let restored = PositionLedger::from_snapshot(
            back,
            coordinator(),
            Arc::new(LinearDecay::new()),
            h.assets.clone(),
            h.clock.clone(),
        );
        assert_eq!(restored.position(id), h.ledger.position(id));
        assert_eq!(restored.votes(&acct(1)), UNIT / 2);
    }

    // --- split_amounts ---

    #[test]
    fn split_amounts_zero_total_rejected() {
        assert_eq!(split_amounts(10, &[0, 0]), Err(PositionError::ZeroLockBalance));
    }

    proptest! {
        #[test]
        fn split_amounts_conserve_total(
            locked in 1u128..=(1_000_000 * UNIT),
            shares in proptest::collection::vec(1u128..1_000, 2..8),
        ) {
            if let Ok(amounts) = split_amounts(locked, &shares) {
                prop_assert_eq!(amounts.len(), shares.len());
                prop_assert_eq!(amounts.iter().sum::<u128>(), locked);
                prop_assert!(amounts.iter().all(|&a| a > 0));
            }
        }
    }
}
