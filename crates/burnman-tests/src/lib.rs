//! Integration test suite for the burningman engine.
//!
//! Tests drive [`BurningManService`](burnman_engine::BurningManService) over
//! in-memory ledgers and check the agreed results both trade peers must
//! reproduce independently.

pub mod helpers;
