//! # lockstep-ledger — Locked positions and their voting power.
//!
//! - [`ledger::PositionLedger`] — authoritative position records, per-position
//!   and global power checkpoints
//! - [`delegation::Delegation`] — delegatee mapping and per-account vote checkpoints
//! - [`vesting::VestingCoordinator`] — parks positions while a schedule runs
//! - [`escrow::Escrow`] — the ledger and coordinator composed behind one API

pub mod delegation;
pub mod escrow;
pub mod ledger;
pub mod vesting;

pub use delegation::{Delegation, Direction, VotesChange};
pub use escrow::{Escrow, EscrowSnapshot};
pub use ledger::{LedgerSnapshot, PositionLedger};
pub use vesting::VestingCoordinator;
