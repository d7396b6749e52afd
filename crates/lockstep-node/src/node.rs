//! Node composition.
//!
//! [`EscrowNode`] wires the escrow to the linear decay model, an in-memory
//! asset ledger, a logging observer, and the snapshot store. Every mutation
//! runs under the write lock and persists before the lock is released, so
//! operations are serialized and readers never see a half-applied one. If
//! the save fails, memory is rolled back to the last saved state.

use std::sync::Arc;

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use lockstep_core::assets::{AssetBalances, MemoryAssetLedger};
use lockstep_core::clock::Clock;
use lockstep_core::error::{LedgerError, ObserverError, StorageError};
use lockstep_core::traits::{AssetLedger, PowerObserver};
use lockstep_core::types::AccountId;
use lockstep_decay::LinearDecay;
use lockstep_ledger::{Escrow, EscrowSnapshot};

use crate::config::NodeConfig;
use crate::storage::SnapshotStore;

/// Everything a node persists.
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, Eq)]
pub struct NodeSnapshot {
    pub escrow: EscrowSnapshot,
    pub assets: AssetBalances,
}

/// Observer that records delegate power changes in the log.
#[derive(Debug, Default)]
pub struct LoggingObserver;

impl PowerObserver for LoggingObserver {
    fn voting_power_changed(&self, account: &AccountId, votes: u128) -> Result<(), ObserverError> {
        info!(%account, votes, "voting power changed");
        Ok(())
    }
}

pub struct EscrowNode {
    escrow: RwLock<Escrow>,
    assets: Arc<MemoryAssetLedger>,
    store: SnapshotStore,
}

impl EscrowNode {
    /// Open the node described by `config`, loading its snapshot if one exists.
    pub fn open(config: &NodeConfig, clock: Arc<dyn Clock>) -> Result<Self, StorageError> {
        let store = SnapshotStore::new(config.snapshot_path());
        let snapshot: NodeSnapshot = store.load()?.unwrap_or_default();
        info!(
            path = %store.path().display(),
            positions = snapshot.escrow.ledger.positions.len(),
            "escrow node opened"
        );
        Ok(Self::from_snapshot(snapshot, config.coordinator, clock, store))
    }

    pub fn from_snapshot(
        snapshot: NodeSnapshot,
        coordinator: AccountId,
        clock: Arc<dyn Clock>,
        store: SnapshotStore,
    ) -> Self {
        let assets = Arc::new(MemoryAssetLedger::from_balances(snapshot.assets));
        let escrow = Escrow::from_snapshot(
            snapshot.escrow,
            coordinator,
            Arc::new(LinearDecay::new()),
            assets.clone(),
            clock,
        )
        .with_observer(Arc::new(LoggingObserver));

        Self {
            escrow: RwLock::new(escrow),
            assets,
            store,
        }
    }

    /// Run one mutation under the write lock and persist on success.
    ///
    /// A failed save undoes the mutation and returns the storage error.
    pub fn execute<T>(
        &self,
        op: impl FnOnce(&mut Escrow) -> Result<T, LedgerError>,
    ) -> Result<T, LedgerError> {
        let mut escrow = self.escrow.write();
        let saved = self.snapshot_locked(&escrow);
        let out = op(&mut *escrow)?;
        self.persist_or_rollback(&mut escrow, saved)?;
        Ok(out)
    }

    /// Run a read-only query under the read lock.
    pub fn read<T>(&self, query: impl FnOnce(&Escrow) -> T) -> T {
        query(&*self.escrow.read())
    }

    /// Credit `amount` of the asset to `account` (development faucet).
    pub fn fund(&self, account: &AccountId, amount: u128) -> Result<(), LedgerError> {
        let mut escrow = self.escrow.write();
        let saved = self.snapshot_locked(&escrow);
        self.assets.mint(account, amount)?;
        self.persist_or_rollback(&mut escrow, saved)?;
        info!(%account, amount, "account funded");
        Ok(())
    }

    pub fn balance_of(&self, account: &AccountId) -> u128 {
        self.assets.balance_of(account)
    }

    pub fn custody(&self) -> u128 {
        self.assets.custody()
    }

    pub fn snapshot(&self) -> NodeSnapshot {
        let escrow = self.escrow.read();
        self.snapshot_locked(&escrow)
    }

    fn snapshot_locked(&self, escrow: &Escrow) -> NodeSnapshot {
        NodeSnapshot {
            escrow: escrow.snapshot(),
            assets: self.assets.balances(),
        }
    }

    fn persist_or_rollback(&self, escrow: &mut Escrow, saved: NodeSnapshot) -> Result<(), StorageError> {
        let Err(e) = self.store.save(&self.snapshot_locked(escrow)) else {
            return Ok(());
        };
        warn!(path = %self.store.path().display(), "snapshot save failed, rolling back: {e}");
        escrow.restore(saved.escrow);
        self.assets.restore(saved.assets);
        Err(e)
    }
}
