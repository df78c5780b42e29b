//! # burnman-decay — Linear age decay for burningman accounting.
//!
//! Older contributions and burns count less than recent ones:
//! - **Linear decay**: an amount keeps 100% weight at the current height and
//!   falls linearly to a floor ratio at the start of a trailing window, staying
//!   there for anything older.
//! - **Two windows**: compensation issuance decays over two years of blocks,
//!   burns over one year.
//! - **Genesis outputs** have no meaningful age and get a flat weighting.
//!
//! Every rounding step uses [`round_half_up`] so results agree bit for bit
//! with peers running the reference implementation.

pub mod engine;
pub mod linear;
pub mod rounding;

pub use engine::DecayEngine;
pub use linear::decayed_amount;
pub use rounding::round_half_up;
