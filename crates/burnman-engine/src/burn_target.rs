//! Burn target: fee revenue not yet matched by burns.
//!
//! `burn_target = reimbursements + estimated BTC trade fees
//!              - legacy DPT burns - legacy BTC fee burns - candidate burns`
//!
//! over the trailing [`NUM_CYCLES_BURN_TARGET`] governance cycles. The same
//! inputs over [`NUM_CYCLES_AVERAGE_DISTRIBUTION`] cycles give the average
//! distribution per cycle used to project a candidate's revenue.

use serde::{Deserialize, Serialize};

use burnman_core::constants::{
    DEFAULT_ESTIMATED_BTC_FEES, DUST_LIMIT, ESTIMATED_FEES_PARAM_SENTINEL, MAX_BURN_SHARE,
    NUM_CYCLES_AVERAGE_DISTRIBUTION, NUM_CYCLES_BURN_TARGET, NetworkType,
};
use burnman_core::cycle::{first_block_of_past_cycle, trailing_cycles};
use burnman_core::error::LedgerError;
use burnman_core::traits::LedgerView;
use burnman_core::types::{Cycle, ProofOfBurnTx};
use burnman_decay::round_half_up;

use crate::candidate::{BurningManCandidate, ReimbursementModel};

/// The terms of a burn target, all summed over the same window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct BurnTargetBreakdown {
    /// First block of the window.
    pub from_block: u64,
    pub accumulated_reimbursements: i64,
    pub accumulated_estimated_btc_trade_fees: i64,
    pub burned_by_legacy_dpt: i64,
    pub burned_by_legacy_btc_fees: i64,
    pub burned_by_candidates: i64,
}

impl BurnTargetBreakdown {
    /// May be negative if more was burned than accrued.
    pub fn burn_target(&self) -> i64 {
        self.accumulated_reimbursements + self.accumulated_estimated_btc_trade_fees
            - self.burned_by_legacy_dpt
            - self.burned_by_legacy_btc_fees
            - self.burned_by_candidates
    }
}

/// Estimated BTC fee revenue for one cycle from the raw parameter value.
///
/// The parameter was repurposed from an unused lock time; its original
/// default means no estimate was voted yet.
pub fn estimated_btc_trade_fees(param_value: i64) -> i64 {
    if param_value == ESTIMATED_FEES_PARAM_SENTINEL {
        DEFAULT_ESTIMATED_BTC_FEES
    } else {
        param_value
    }
}

/// Estimated fees of the cycle containing `height` and up to
/// `num_cycles - 1` predecessors. Each cycle uses the parameter value in
/// force at its first block. Zero if no cycle contains `height`.
pub fn accumulated_estimated_btc_trade_fees(
    ledger: &dyn LedgerView,
    cycles: &[Cycle],
    height: u64,
    num_cycles: usize,
) -> Result<i64, LedgerError> {
    trailing_cycles(cycles, height, num_cycles)
        .iter()
        .map(|cycle| ledger.estimated_btc_fees_param(cycle.first_block).map(estimated_btc_trade_fees))
        .sum()
}

pub fn accumulated_reimbursements(reimbursements: &[ReimbursementModel], from_block: u64) -> i64 {
    reimbursements
        .iter()
        .filter(|r| r.height >= from_block)
        .map(|r| r.amount)
        .sum()
}

/// Burned amount of txs in `[from_block, height]` whose OP_RETURN data is one
/// of `markers` (lowercase hex).
pub fn burned_amount_with_markers(burns: &[ProofOfBurnTx], markers: &[&str], from_block: u64, height: u64) -> i64 {
    burns
        .iter()
        .filter(|tx| (from_block..=height).contains(&tx.height))
        .filter(|tx| markers.contains(&tx.op_return_hex().as_str()))
        .map(|tx| tx.burned_amount)
        .sum()
}

/// Raw burned amount of all candidates at or after `from_block`.
pub fn burned_amount_from_candidates<'a>(
    candidates: impl IntoIterator<Item = &'a BurningManCandidate>,
    from_block: u64,
) -> i64 {
    candidates
        .into_iter()
        .flat_map(|c| c.burn_outputs())
        .filter(|b| b.height >= from_block)
        .map(|b| b.amount)
        .sum()
}

/// Decayed burned amount of all candidates at or after `from_block`.
pub fn accumulated_decayed_burned_amount<'a>(
    candidates: impl IntoIterator<Item = &'a BurningManCandidate>,
    from_block: u64,
) -> i64 {
    candidates
        .into_iter()
        .flat_map(|c| c.burn_outputs())
        .filter(|b| b.height >= from_block)
        .map(|b| b.decayed_amount)
        .sum()
}

/// Ledger data a burn target is computed from, already filtered to `height`.
pub struct BurnTargetInputs<'a> {
    pub ledger: &'a dyn LedgerView,
    pub network: NetworkType,
    pub height: u64,
    pub genesis_height: u64,
    pub cycles: &'a [Cycle],
    pub reimbursements: &'a [ReimbursementModel],
    pub proof_of_burn_txs: &'a [ProofOfBurnTx],
}

impl BurnTargetInputs<'_> {
    /// First block of the window reaching `num_cycles` back.
    pub fn window_start(&self, num_cycles: usize) -> u64 {
        first_block_of_past_cycle(self.cycles, self.height, num_cycles, self.genesis_height)
    }

    /// Burn target terms over [`NUM_CYCLES_BURN_TARGET`] cycles.
    pub fn breakdown<'c>(
        &self,
        candidates: impl IntoIterator<Item = &'c BurningManCandidate>,
    ) -> Result<BurnTargetBreakdown, LedgerError> {
        let from_block = self.window_start(NUM_CYCLES_BURN_TARGET);
        Ok(BurnTargetBreakdown {
            from_block,
            accumulated_reimbursements: accumulated_reimbursements(self.reimbursements, from_block),
            accumulated_estimated_btc_trade_fees: accumulated_estimated_btc_trade_fees(
                self.ledger,
                self.cycles,
                self.height,
                NUM_CYCLES_BURN_TARGET,
            )?,
            burned_by_legacy_dpt: burned_amount_with_markers(
                self.proof_of_burn_txs,
                self.network.legacy_dpt_burn_markers(),
                from_block,
                self.height,
            ),
            burned_by_legacy_btc_fees: burned_amount_with_markers(
                self.proof_of_burn_txs,
                self.network.legacy_fee_burn_markers(),
                from_block,
                self.height,
            ),
            burned_by_candidates: burned_amount_from_candidates(candidates, from_block),
        })
    }

    /// `round((reimbursements + estimated fees) / 3)` over the last
    /// [`NUM_CYCLES_AVERAGE_DISTRIBUTION`] cycles.
    pub fn average_distribution_per_cycle(&self) -> Result<i64, LedgerError> {
        let from_block = self.window_start(NUM_CYCLES_AVERAGE_DISTRIBUTION);
        let reimbursements = accumulated_reimbursements(self.reimbursements, from_block);
        let fees = accumulated_estimated_btc_trade_fees(
            self.ledger,
            self.cycles,
            self.height,
            NUM_CYCLES_AVERAGE_DISTRIBUTION,
        )?;
        Ok(round_half_up(
            (reimbursements + fees) as f64 / NUM_CYCLES_AVERAGE_DISTRIBUTION as f64,
        ))
    }
}

/// Amount `my_burn_amount` must grow by so that it makes up `target_share`
/// of the total.
pub fn missing_amount_to_reach_target_share(total_burned_amount: i64, my_burn_amount: i64, target_share: f64) -> i64 {
    let others = total_burned_amount - my_burn_amount;
    let share_target_others = 1.0 - target_share;
    let target_amount = if share_target_others > 0.0 {
        target_share / share_target_others * others as f64
    } else {
        0.0
    };
    round_half_up(target_amount) - my_burn_amount
}

/// Suggested burn amounts `(lower, upper)` for `candidate`.
///
/// `upper` reaches the boosted issuance share against the boosted burn
/// target and may over-burn. `lower` is what is missing to reach the boosted
/// share against what everybody burned in the window. While nothing was
/// burned yet, `lower` is the plain issuance share (capped at
/// [`MAX_BURN_SHARE`]) of the burn target.
pub fn candidate_burn_target_range(
    candidate: &BurningManCandidate,
    burn_target: i64,
    burn_target_boost_amount: i64,
    accumulated_decayed_burned_amount: i64,
) -> (i64, i64) {
    let boosted_burn_target = burn_target + burn_target_boost_amount;
    let issuance_share = candidate.issuance_share();
    if boosted_burn_target <= 0 || issuance_share == 0.0 {
        return (0, 0);
    }

    let lower_base_target = round_half_up(burn_target as f64 * MAX_BURN_SHARE.min(issuance_share));
    let boosted_issuance_share = candidate.boosted_issuance_share();
    let upper_base_target = round_half_up(boosted_burn_target as f64 * boosted_issuance_share);

    if accumulated_decayed_burned_amount == 0 {
        return (lower_base_target, upper_base_target);
    }

    if candidate.effective_burn_output_share() < boosted_issuance_share {
        let missing = missing_amount_to_reach_target_share(
            accumulated_decayed_burned_amount,
            candidate.accumulated_decayed_burn_amount(),
            boosted_issuance_share,
        );
        let missing = if missing < DUST_LIMIT { 0 } else { missing };
        (missing.min(upper_base_target), upper_base_target)
    } else {
        (0, upper_base_target)
    }
}
