//! Cross-crate test suite for Lockstep.
//!
//! Scenario tests walk the documented lifecycle examples end to end;
//! adversarial tests drive random operation sequences and check the
//! ledger's consistency invariants after every step.

pub mod helpers;
