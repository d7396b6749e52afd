//! # lockstep-core
//! Foundation types, collaborator traits, and the checkpoint index for the
//! Lockstep voting-power ledger.

pub mod assets;
pub mod checkpoint;
pub mod clock;
pub mod constants;
pub mod error;
pub mod traits;
pub mod types;
