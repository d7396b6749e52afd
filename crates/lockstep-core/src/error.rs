//! Error types for the Lockstep ledger.
use thiserror::Error;

use crate::types::{AccountId, PositionId};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DecayError {
    #[error("arithmetic overflow")] ArithmeticOverflow,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CheckpointError {
    #[error("decreasing timepoint: last {last}, got {got}")] DecreasingTimepoint { last: u64, got: u64 },
    #[error("lookup out of range: timepoint {timepoint} is not before now {now}")] OutOfRange { timepoint: u64, now: u64 },
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PositionError {
    #[error("position not found: {0}")] NotFound(PositionId),
    #[error("zero lock balance")] ZeroLockBalance,
    #[error("invalid commitment duration: {duration} (allowed {min}..={max})")] InvalidCommitmentDuration { duration: u64, min: u64, max: u64 },
    #[error("{caller} is not authorized for position {position}")] NotAuthorized { caller: AccountId, position: PositionId },
    #[error("cannot merge position {0} into itself")] SelfMerge(PositionId),
    #[error("invalid shares length: {0} (need at least 2)")] InvalidSharesLength(usize),
    #[error("position {position} still committed for {remaining}s")] VestingNotFinished { position: PositionId, remaining: u64 },
    #[error("invalid receiver: zero account")] ZeroReceiver,
    #[error("invalid receiver: {0} is the vesting coordinator")] CoordinatorReceiver(AccountId),
    #[error("arithmetic overflow")] ArithmeticOverflow,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DelegationError {
    #[error("cannot delegate to the zero account")] ZeroDelegatee,
    #[error("cannot delegate to the vesting coordinator {0}")] CoordinatorDelegatee(AccountId),
    #[error("voting units underflow for {account}: have {have}, removing {removing}")] UnitsUnderflow { account: AccountId, have: u128, removing: u128 },
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum VestingError {
    #[error("{caller} is not the custodian of position {position}")] NotAuthorized { caller: AccountId, position: PositionId },
    #[error("position {0} is not parked")] NotParked(PositionId),
    #[error("position {0} is already parked")] AlreadyParked(PositionId),
    #[error("vesting of position {position} ends at {end}, now {now}")] VestingNotFinished { position: PositionId, end: u64, now: u64 },
    #[error("re-entrant call on position {0}")] Reentrant(PositionId),
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AssetError {
    #[error("insufficient balance for {account}: have {have}, need {need}")] InsufficientBalance { account: AccountId, have: u128, need: u128 },
    #[error("insufficient custody: have {have}, need {need}")] InsufficientCustody { have: u128, need: u128 },
    #[error("balance overflow")] Overflow,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ObserverError {
    #[error("observer rejected update for {account}: {reason}")] Rejected { account: AccountId, reason: String },
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StorageError {
    #[error("i/o error at {path}: {reason}")] Io { path: String, reason: String },
    #[error("snapshot encode failed: {0}")] Encode(String),
    #[error("snapshot decode failed: {0}")] Decode(String),
}

#[derive(Error, Debug)]
pub enum LedgerError {
    #[error(transparent)] Decay(#[from] DecayError),
    #[error(transparent)] Checkpoint(#[from] CheckpointError),
    #[error(transparent)] Position(#[from] PositionError),
    #[error(transparent)] Delegation(#[from] DelegationError),
    #[error(transparent)] Vesting(#[from] VestingError),
    #[error(transparent)] Asset(#[from] AssetError),
    #[error(transparent)] Storage(#[from] StorageError),
    #[error("clock moved backwards: last {last}, now {now}")] ClockRegression { last: u64, now: u64 },
    #[error("ledger invariant violated: {0}")] InvariantViolation(String),
}
