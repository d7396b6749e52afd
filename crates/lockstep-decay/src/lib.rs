//! # lockstep-decay — Voting-power decay model.
//!
//! All calculations use integer arithmetic only for determinism.
//!
//! Voting power decays linearly with the remaining commitment:
//! `power = locked_amount * remaining_duration / MAX_COMMITMENT_DURATION`,
//! floored. A position committed for the full maximum votes with its whole
//! locked amount; one with nothing left votes with zero.

pub mod engine;

pub use engine::LinearDecay;
