//! In-memory asset ledger.
//!
//! [`MemoryAssetLedger`] implements [`AssetLedger`] with a balance map and a
//! custody counter behind a `parking_lot` mutex. Suitable for tests and the
//! single-process node; a production deployment plugs in the real token.

use std::collections::HashMap;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

use crate::error::AssetError;
use crate::traits::AssetLedger;
use crate::types::AccountId;

/// Serializable balances of a [`MemoryAssetLedger`].
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, Eq)]
pub struct AssetBalances {
    pub balances: HashMap<AccountId, u128>,
    pub custody: u128,
}

/// Balance map with escrow custody.
#[derive(Debug, Default)]
pub struct MemoryAssetLedger {
    inner: Mutex<AssetBalances>,
}

impl MemoryAssetLedger {
    /// Create an empty ledger.
    pub fn new() -> Self {
        Self::default()
    }

    /// Restore from persisted balances.
    pub fn from_balances(balances: AssetBalances) -> Self {
        Self {
            inner: Mutex::new(balances),
        }
    }

    /// Copy out the current balances.
    pub fn balances(&self) -> AssetBalances {
        self.inner.lock().clone()
    }

    /// Replace all balances.
    pub fn restore(&self, balances: AssetBalances) {
        *self.inner.lock() = balances;
    }

    /// Credit `amount` to `account` out of thin air (faucet).
    pub fn mint(&self, account: &AccountId, amount: u128) -> Result<(), AssetError> {
        let mut inner = self.inner.lock();
        let balance = inner.balances.entry(*account).or_insert(0);
        *balance = balance.checked_add(amount).ok_or(AssetError::Overflow)?;
        Ok(())
    }
}

impl AssetLedger for MemoryAssetLedger {
    fn transfer_in(&self, from: &AccountId, amount: u128) -> Result<(), AssetError> {
        let mut inner = self.inner.lock();
        let have = inner.balances.get(from).copied().unwrap_or(0);
        if have < amount {
            return Err(AssetError::InsufficientBalance {
                account: *from,
                have,
                need: amount,
            });
        }
        let custody = inner.custody.checked_add(amount).ok_or(AssetError::Overflow)?;
        inner.balances.insert(*from, have - amount);
        inner.custody = custody;
        Ok(())
    }

    fn transfer_out(&self, to: &AccountId, amount: u128) -> Result<(), AssetError> {
        let mut inner = self.inner.lock();
        if inner.custody < amount {
            return Err(AssetError::InsufficientCustody {
                have: inner.custody,
                need: amount,
            });
        }
        let have = inner.balances.get(to).copied().unwrap_or(0);
        let balance = have.checked_add(amount).ok_or(AssetError::Overflow)?;
        inner.custody -= amount;
        inner.balances.insert(*to, balance);
        Ok(())
    }

    fn balance_of(&self, account: &AccountId) -> u128 {
        self.inner.lock().balances.get(account).copied().unwrap_or(0)
    }

    fn custody(&self) -> u128 {
        self.inner.lock().custody
    }
}
