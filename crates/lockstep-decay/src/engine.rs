//! Linear decay model implementing the [`PowerModel`] trait.
//!
//! Pure and stateless. All arithmetic is integer-only with checked u128
//! products; an overflowing product is reported, never wrapped.

use lockstep_core::constants::MAX_COMMITMENT_DURATION;
use lockstep_core::error::DecayError;
use lockstep_core::traits::PowerModel;

/// The production power model: `amount * remaining / max_duration`.
#[derive(Debug, Clone, Copy)]
pub struct LinearDecay {
    max_duration: u64,
}

impl LinearDecay {
    /// Create a model over [`MAX_COMMITMENT_DURATION`].
    pub fn new() -> Self {
        Self {
            max_duration: MAX_COMMITMENT_DURATION,
        }
    }

    /// Create a model with a custom full-power duration. `max_duration` must
    /// be non-zero.
    pub fn with_max_duration(max_duration: u64) -> Self {
        debug_assert!(max_duration > 0, "max duration must be non-zero");
        Self { max_duration }
    }
}

impl Default for LinearDecay {
    fn default() -> Self {
        Self::new()
    }
}

impl PowerModel for LinearDecay {
    fn voting_power(&self, locked_amount: u128, remaining_duration: u64) -> Result<u128, DecayError> {
        if locked_amount == 0 || remaining_duration == 0 {
            return Ok(0);
        }
        let weighted = locked_amount
            .checked_mul(remaining_duration as u128)
            .ok_or(DecayError::ArithmeticOverflow)?;
        Ok(weighted / self.max_duration as u128)
    }

    fn max_duration(&self) -> u64 {
        self.max_duration
    }
}
