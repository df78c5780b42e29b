//! # burnman-core
//! Foundation types and traits for burningman fee accounting.
//!
//! - [`constants`]: consensus constants and per-network presets
//! - [`error`]: error taxonomy shared by all crates
//! - [`types`]: ledger data model (issuances, proof-of-burn txs, cycles)
//! - [`traits`]: the read-only [`LedgerView`](traits::LedgerView) and
//!   [`DecayCalculator`](traits::DecayCalculator) seams
//! - [`proof_of_burn`]: pre-image hash commitment binding burns to names
//! - [`cycle`]: governance cycle window helpers
//! - [`ledger`]: in-memory ledger used by tests and the CLI

pub mod constants;
pub mod cycle;
pub mod error;
pub mod ledger;
pub mod proof_of_burn;
pub mod traits;
pub mod types;
