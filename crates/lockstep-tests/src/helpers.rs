//! Shared test helpers for scenario and adversarial tests.

use std::sync::Arc;

use lockstep_core::assets::MemoryAssetLedger;
use lockstep_core::clock::ManualClock;
use lockstep_core::constants::UNIT;
use lockstep_core::traits::AssetLedger;
use lockstep_core::types::AccountId;
use lockstep_decay::LinearDecay;
use lockstep_ledger::Escrow;

/// Start time for every test clock.
pub const GENESIS: u64 = 1_700_000_000;

/// Funds credited to each account by [`TestEscrow::funded`].
pub const STARTING_BALANCE: u128 = 1_000_000 * UNIT;

/// Seed of the vesting coordinator's account.
pub const COORDINATOR_SEED: u8 = 0xC0;

/// Simple account from a seed byte.
pub fn acct(seed: u8) -> AccountId {
    AccountId([seed; 32])
}

/// The vesting coordinator's account in tests.
pub fn coordinator() -> AccountId {
    acct(COORDINATOR_SEED)
}

/// An escrow wired to an in-memory asset ledger and a manual clock.
pub struct TestEscrow {
    pub escrow: Escrow,
    pub assets: Arc<MemoryAssetLedger>,
    pub clock: Arc<ManualClock>,
}

impl TestEscrow {
    /// Escrow whose accounts `acct(s)` for each seed start with
    /// [`STARTING_BALANCE`].
    pub fn funded(seeds: &[u8]) -> Self {
        let assets = Arc::new(MemoryAssetLedger::new());
        for &seed in seeds {
            assets
                .mint(&acct(seed), STARTING_BALANCE)
                .unwrap_or_else(|e| panic!("funding {seed}: {e}"));
        }
        let clock = Arc::new(ManualClock::new(GENESIS));
        let escrow = Escrow::new(
            coordinator(),
            Arc::new(LinearDecay::new()),
            assets.clone(),
            clock.clone(),
        );
        Self { escrow, assets, clock }
    }

    pub fn advance(&self, secs: u64) {
        self.clock.advance(secs);
    }

    /// Check the cross-entity invariants of the escrow:
    ///
    /// - global total == sum of live position powers
    /// - global total == sum of delegate votes == sum of voting units
    /// - total locked == sum of live locked amounts == asset custody
    /// - every parked position is owned by the coordinator with zero commitment
    pub fn assert_consistent(&self) {
        let ledger = self.escrow.ledger();

        let mut power_sum = 0u128;
        let mut locked_sum = 0u128;
        for p in ledger.positions() {
            assert!(p.locked_amount > 0, "live position {} has zero lock", p.id);
            power_sum += ledger
                .voting_power(p.id)
                .unwrap_or_else(|e| panic!("power of {}: {e}", p.id));
            locked_sum += p.locked_amount;
        }

        let total = ledger.total_voting_power();
        assert_eq!(total, power_sum, "total power != sum of position powers");
        assert_eq!(
            ledger.delegation().total_votes(),
            total,
            "sum of delegate votes != total power"
        );
        assert_eq!(
            ledger.delegation().total_units(),
            total,
            "sum of voting units != total power"
        );
        assert_eq!(ledger.total_locked(), locked_sum, "total locked drifted");
        assert_eq!(self.assets.custody(), locked_sum, "custody != locked");

        for (&id, record) in self.escrow.vesting().records() {
            let p = ledger
                .position(id)
                .unwrap_or_else(|| panic!("parked position {id} missing"));
            assert_eq!(p.owner, coordinator(), "parked {id} not in custody");
            assert_eq!(p.remaining_duration, 0, "parked {id} still committed");
            assert!(record.end >= record.start);
        }
    }
}
