//! Trait interfaces for the Lockstep ledger.
//!
//! These traits define the contracts between crates and with the outside:
//! - [`PowerModel`] — voting-power decay math (lockstep-decay implements)
//! - [`AssetLedger`] — fungible-asset custody (external; [`MemoryAssetLedger`](crate::assets::MemoryAssetLedger) for tests)
//! - [`PowerObserver`] — governance "poke" on voting-power changes (external)
//! - [`Clock`](crate::clock::Clock) — the single time source (see [`clock`](crate::clock))

use crate::constants::MAX_COMMITMENT_DURATION;
use crate::error::{AssetError, DecayError, ObserverError};
use crate::types::AccountId;

/// Pure mapping from a locked position to its voting power.
///
/// Implementations perform no bounds checking on `remaining_duration`;
/// callers clamp it into `[0, MAX_COMMITMENT_DURATION]` first.
pub trait PowerModel: Send + Sync {
    /// Voting power of `locked_amount` committed for `remaining_duration` seconds.
    fn voting_power(&self, locked_amount: u128, remaining_duration: u64) -> Result<u128, DecayError>;

    /// The longest duration the model recognises.
    ///
    /// Default implementation: [`MAX_COMMITMENT_DURATION`].
    fn max_duration(&self) -> u64 {
        MAX_COMMITMENT_DURATION
    }

    /// Voting power with `remaining_duration` clamped to [`max_duration`](Self::max_duration).
    fn clamped_voting_power(
        &self,
        locked_amount: u128,
        remaining_duration: u64,
    ) -> Result<u128, DecayError> {
        self.voting_power(locked_amount, remaining_duration.min(self.max_duration()))
    }
}

/// External fungible-asset ledger holding the locked funds.
///
/// The escrow holds pulled funds in its own custody; the ledger only needs
/// to pull from a payer and push to a receiver. Methods take `&self` so the
/// same ledger can be shared between the escrow and the embedding node.
pub trait AssetLedger: Send + Sync {
    /// Pull `amount` from `from` into escrow custody.
    fn transfer_in(&self, from: &AccountId, amount: u128) -> Result<(), AssetError>;

    /// Push `amount` from escrow custody to `to`.
    fn transfer_out(&self, to: &AccountId, amount: u128) -> Result<(), AssetError>;

    /// Spendable balance of `account`.
    fn balance_of(&self, account: &AccountId) -> u128;

    /// Funds currently held in escrow custody.
    fn custody(&self) -> u128;
}

/// Governance component refreshed whenever a delegate's voting power moves.
///
/// Failures are reported back but never roll back the mutation that
/// triggered them.
pub trait PowerObserver: Send + Sync {
    /// `account` now carries `votes` voting power.
    fn voting_power_changed(&self, account: &AccountId, votes: u128) -> Result<(), ObserverError>;
}
