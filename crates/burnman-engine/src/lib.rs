//! # burnman-engine — Burningman accounting and receiver selection.
//!
//! Everything is derived from ledger state as of one height:
//! - [`aggregator`]: groups compensation issuances, genesis outputs and
//!   proof-of-burn txs into per-contributor candidates
//! - [`candidate`]: frozen record sets and the shares derived from them
//! - [`burn_target`]: network-wide outstanding fee revenue and per-candidate
//!   burn suggestions
//! - [`lottery`]: weighted random pick of the BTC fee receiver
//! - [`receivers`]: deterministic delayed payout receiver list
//! - [`snapshot`]: immutable per-height result and its cache
//! - [`service`]: [`BurningManService`](service::BurningManService), the
//!   entry point driven by block notifications
//!
//! The delayed payout receiver list is embedded in a transaction both trade
//! peers sign, so every step on that path is deterministic: ordered maps,
//! sorted records, fixed rounding and a snapshot height both peers agree on.

pub mod aggregator;
pub mod burn_target;
pub mod candidate;
pub mod config;
pub mod lottery;
pub mod receivers;
pub mod service;
pub mod snapshot;

pub use config::{EngineConfig, ReceiverFlag};
pub use receivers::Receiver;
pub use service::BurningManService;
pub use snapshot::Snapshot;
