//! Protocol constants. Amounts are in base units (1 token = 10^18 units);
//! durations and timepoints are in seconds.

/// Base units per whole token.
pub const UNIT: u128 = 1_000_000_000_000_000_000;

/// One day in seconds.
pub const DAY: u64 = 86_400;

/// One week in seconds.
pub const WEEK: u64 = 7 * DAY;

/// One (non-leap) year in seconds.
pub const YEAR: u64 = 365 * DAY;

/// Longest commitment a position can carry.
///
/// A position committed for exactly this long votes with its full locked
/// amount; power falls linearly to zero as the remaining duration shrinks.
///
/// # Examples
///
/// ```
/// use lockstep_core::constants::{MAX_COMMITMENT_DURATION, YEAR};
/// assert_eq!(MAX_COMMITMENT_DURATION, 2 * YEAR);
/// ```
pub const MAX_COMMITMENT_DURATION: u64 = 2 * YEAR;

/// Shortest commitment accepted when minting a new position.
///
/// Only mint enforces the floor. Durations shrink below it through vesting,
/// and a holder extending a short position only has to move upwards.
pub const MIN_COMMITMENT_DURATION: u64 = WEEK;

/// Minimum number of shares accepted by a split.
pub const MIN_SPLIT_SHARES: usize = 2;

/// Identifier assigned to the first minted position.
///
/// Zero is never handed out so a default `PositionId` cannot alias a live one.
pub const FIRST_POSITION_ID: u64 = 1;

/// Default data directory name under the platform data dir.
pub const DEFAULT_DATA_DIR_NAME: &str = "lockstep";

/// File name of the persisted ledger snapshot inside the data directory.
pub const SNAPSHOT_FILE_NAME: &str = "escrow.json";
