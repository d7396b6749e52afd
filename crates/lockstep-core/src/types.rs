//! Core ledger types: accounts, positions, vesting records.
//!
//! Amounts are `u128` base units, durations and timepoints `u64` seconds.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// A 32-byte account reference.
///
/// Serialises as a lowercase hex string so it can key JSON maps.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct AccountId(pub [u8; 32]);

impl AccountId {
    /// The zero account. Never owns a position.
    pub const ZERO: Self = Self([0u8; 32]);

    /// Create an account id from raw bytes.
    pub fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// Return the underlying bytes.
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Check if this is the zero account.
    pub fn is_zero(&self) -> bool {
        self.0 == [0u8; 32]
    }
}

impl fmt::Display for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&hex::encode(self.0))
    }
}

impl From<[u8; 32]> for AccountId {
    fn from(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }
}

/// Error returned when parsing an [`AccountId`] from hex.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseAccountError {
    #[error("invalid hex: {0}")]
    InvalidHex(String),
    #[error("invalid length: expected 32 bytes, got {0}")]
    InvalidLength(usize),
}

impl FromStr for AccountId {
    type Err = ParseAccountError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let raw = s.strip_prefix("0x").unwrap_or(s);
        let bytes = hex::decode(raw).map_err(|e| ParseAccountError::InvalidHex(e.to_string()))?;
        let array: [u8; 32] = bytes
            .as_slice()
            .try_into()
            .map_err(|_| ParseAccountError::InvalidLength(bytes.len()))?;
        Ok(Self(array))
    }
}

impl Serialize for AccountId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for AccountId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// Identifier of a locked position. Monotonically increasing, never reused.
#[derive(
    Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Default,
)]
#[serde(transparent)]
pub struct PositionId(pub u64);

impl PositionId {
    /// The id following this one.
    pub fn next(self) -> Self {
        Self(self.0 + 1)
    }
}

impl fmt::Display for PositionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

impl From<u64> for PositionId {
    fn from(id: u64) -> Self {
        Self(id)
    }
}

/// The authoritative record of one locked position.
///
/// Voting power is not stored; it is always derived from `locked_amount`
/// and `remaining_duration` through the power model.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct Position {
    pub id: PositionId,
    pub owner: AccountId,
    /// Locked asset in base units. Zero only transiently while a position is
    /// being destroyed.
    pub locked_amount: u128,
    /// Remaining commitment in seconds, in `[0, MAX_COMMITMENT_DURATION]`.
    pub remaining_duration: u64,
    /// Timepoint of the original mint. Inherited by split children.
    pub created_at: u64,
}

impl Position {
    /// Whether the commitment has run out and the position can be burned.
    pub fn is_expired(&self) -> bool {
        self.remaining_duration == 0
    }
}

/// A parked position's completion schedule.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct VestingRecord {
    pub start: u64,
    pub end: u64,
    /// Locked amount at the moment of parking.
    pub amount: u128,
    /// Account that parked the position and alone may withdraw or claim it.
    pub custodian: AccountId,
}

impl VestingRecord {
    /// Seconds left until the schedule completes, zero once it has ended.
    pub fn remaining_at(&self, now: u64) -> u64 {
        self.end.saturating_sub(now)
    }

    /// Whether the schedule has completed at `now`.
    pub fn is_finished(&self, now: u64) -> bool {
        self.end <= now
    }
}
