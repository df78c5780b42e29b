//! Decay engine implementing the [`DecayCalculator`] trait.
//!
//! Applies [`decayed_amount`] with a zero floor ratio over the two protocol
//! windows, and the flat factor for genesis outputs.

use burnman_core::constants::{GENESIS_OUTPUT_AMOUNT_FACTOR, MAX_BURN_AMOUNT_AGE, MAX_COMP_REQUEST_AGE};
use burnman_core::error::DecayError;
use burnman_core::traits::DecayCalculator;

use crate::linear::decayed_amount;
use crate::rounding::round_half_up;

/// The production decay calculator.
///
/// - Compensation: linear over [`MAX_COMP_REQUEST_AGE`] blocks
/// - Burns: linear over [`MAX_BURN_AMOUNT_AGE`] blocks
/// - Genesis outputs: flat [`GENESIS_OUTPUT_AMOUNT_FACTOR`]
#[derive(Debug, Clone, Copy, Default)]
pub struct DecayEngine;

impl DecayEngine {
    /// Create a new DecayEngine.
    pub fn new() -> Self {
        Self
    }

    fn decay_over_window(&self, amount: i64, event_height: u64, chain_height: u64, window: u64) -> Result<i64, DecayError> {
        let current = chain_height as i64;
        // Negative floor when the window reaches back before block 0.
        let floor = current - window as i64;
        decayed_amount(amount, event_height as i64, current, floor, 0.0)
    }
}

impl DecayCalculator for DecayEngine {
    fn decayed_compensation_amount(
        &self,
        amount: i64,
        issuance_height: u64,
        chain_height: u64,
    ) -> Result<i64, DecayError> {
        self.decay_over_window(amount, issuance_height, chain_height, MAX_COMP_REQUEST_AGE)
    }

    fn decayed_burned_amount(&self, amount: i64, burn_height: u64, chain_height: u64) -> Result<i64, DecayError> {
        self.decay_over_window(amount, burn_height, chain_height, MAX_BURN_AMOUNT_AGE)
    }

    fn decayed_genesis_output_amount(&self, amount: i64) -> i64 {
        round_half_up(amount as f64 * GENESIS_OUTPUT_AMOUNT_FACTOR)
    }
}
