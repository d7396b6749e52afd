//! # lockstep-node — Configuration, persistence, and composition.
//!
//! - [`config::NodeConfig`] — layered configuration (defaults, TOML, `LOCKSTEP_*`)
//! - [`storage::SnapshotStore`] — atomic JSON snapshots
//! - [`node::EscrowNode`] — the escrow behind a lock, persisted after every mutation

pub mod config;
pub mod node;
pub mod storage;

pub use config::NodeConfig;
pub use node::{EscrowNode, LoggingObserver, NodeSnapshot};
pub use storage::SnapshotStore;
