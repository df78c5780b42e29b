//! Delayed payout transaction receivers.
//!
//! Both trade peers build the receiver list independently and sign a tx
//! containing it, so every input is agreed beforehand:
//! - the selection height, a grid-rounded height both peers reach from
//!   slightly different chain tips
//! - the input amount and the trade tx fee of the deposit tx
//! - the date-activated [`ReceiverFlag`]s
//!
//! The fee rate is derived from the trade tx fee, never from live fee
//! estimation.

use serde::{Deserialize, Serialize};
use tracing::debug;

use burnman_core::constants::{
    DPT_BASE_TX_WEIGHT, DPT_MIN_REMAINDER_TO_LEGACY_BM, DPT_MIN_TX_FEE_RATE, DPT_OUTPUT_VSIZE, DPT_OUTPUT_WEIGHT,
    DPT_TRADE_TX_VSIZE, DUST_LIMIT, MAX_BURN_SHARE, MAX_BURN_SHARE_TOLERANCE, MIN_DELAYED_PAYOUT_TX_FEE,
};
use burnman_core::error::ReceiverError;
use burnman_decay::rounding::{ceil_div, round_half_up};

use crate::candidate::BurningManCandidate;
use crate::config::ReceiverFlag;

/// One output of the delayed payout tx.
///
/// Field order gives the list order: amount, then address.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Receiver {
    pub amount: i64,
    pub address: String,
}

impl Receiver {
    pub fn new(amount: i64, address: impl Into<String>) -> Self {
        Self {
            amount,
            address: address.into(),
        }
    }
}

/// Round `height` to the selection height grid.
///
/// Above `genesis_height + 3 * grid` the height is floored to the grid and
/// one grid step is subtracted, so tips up to one grid step apart map to the
/// same height. Never below `minimum`.
///
/// ```
/// use burnman_engine::receivers::selection_height;
/// assert_eq!(selection_height(1000, 1050, 10, 0), 1040);
/// assert_eq!(selection_height(1000, 1055, 10, 0), 1040);
/// assert_eq!(selection_height(1000, 1020, 10, 0), 1000);
/// ```
pub fn selection_height(genesis_height: u64, height: u64, grid: u64, minimum: u64) -> u64 {
    let grid = grid.max(1);
    if height > genesis_height + 3 * grid {
        (height / grid * grid - grid).max(minimum)
    } else {
        genesis_height.max(minimum)
    }
}

/// Fee rate (sat/vbyte) for the delayed payout tx, from the agreed trade tx fee.
pub fn tx_fee_per_vbyte(trade_tx_fee: i64) -> i64 {
    round_half_up(trade_tx_fee as f64 / DPT_TRADE_TX_VSIZE).max(DPT_MIN_TX_FEE_RATE)
}

/// Weight units of a delayed payout tx with `num_outputs` receiver outputs.
pub fn tx_weight(num_outputs: usize) -> i64 {
    DPT_BASE_TX_WEIGHT + num_outputs as i64 * DPT_OUTPUT_WEIGHT
}

/// Miner fee for `num_outputs` outputs at `fee_per_vbyte`.
///
/// The trade tx fee comes from the peer; an absurd rate saturates and leaves
/// nothing spendable.
pub fn miner_fee(num_outputs: usize, fee_per_vbyte: i64) -> i64 {
    ceil_div(fee_per_vbyte.saturating_mul(tx_weight(num_outputs)), 4).max(MIN_DELAYED_PAYOUT_TX_FEE)
}

/// What is left of `input_amount` for receivers.
pub fn spendable_amount(num_outputs: usize, input_amount: i64, fee_per_vbyte: i64) -> i64 {
    (input_amount - miner_fee(num_outputs, fee_per_vbyte)).max(0)
}

/// Smallest output worth including: twice its own fee, at least dust.
pub fn min_output_amount(fee_per_vbyte: i64) -> i64 {
    fee_per_vbyte.saturating_mul(DPT_OUTPUT_VSIZE * 2).max(DUST_LIMIT)
}

/// Sanity cap of a single candidate output.
pub fn max_output_amount(spendable_amount: i64) -> i64 {
    round_half_up(spendable_amount as f64 * (MAX_BURN_SHARE * MAX_BURN_SHARE_TOLERANCE))
}

/// Build the receiver list.
///
/// `candidates` must come from the snapshot at the agreed selection height,
/// in name order.
///
/// Dropped dust outputs hand their share to the survivors by dividing by
/// `1 - dropped share`. The smaller tx fee of the shorter tx is not
/// re-derived; that is part of the agreed algorithm.
///
/// # Errors
///
/// [`ReceiverError::NegativeInputAmount`] for a negative `input_amount`.
pub fn delayed_payout_receivers(
    candidates: &[&BurningManCandidate],
    legacy_address: &str,
    input_amount: i64,
    trade_tx_fee: i64,
    flags: &[ReceiverFlag],
) -> Result<Vec<Receiver>, ReceiverError> {
    if input_amount < 0 {
        return Err(ReceiverError::NegativeInputAmount(input_amount));
    }

    let candidates: Vec<&BurningManCandidate> = if flags.contains(&ReceiverFlag::ExcludeDormantCandidates) {
        candidates
            .iter()
            .copied()
            .filter(|c| c.effective_burn_output_share() > 0.0 && c.most_recent_address().is_some())
            .collect()
    } else {
        candidates.to_vec()
    };

    let fee_per_vbyte = tx_fee_per_vbyte(trade_tx_fee);

    if candidates.is_empty() {
        let spendable = spendable_amount(1, input_amount, fee_per_vbyte);
        debug!(spendable, "receivers: no candidates");
        return Ok(if spendable > DPT_MIN_REMAINDER_TO_LEGACY_BM {
            vec![Receiver::new(spendable, legacy_address)]
        } else {
            Vec::new()
        });
    }

    let spendable = spendable_amount(candidates.len(), input_amount, fee_per_vbyte);
    let min_output = min_output_amount(fee_per_vbyte);
    let max_output = max_output_amount(spendable);

    let eligible: Vec<(f64, &str)> = candidates
        .iter()
        .filter(|c| c.effective_burn_output_share() > 0.0)
        .filter_map(|c| c.most_recent_address().map(|a| (c.effective_burn_output_share(), a)))
        .collect();

    let is_dust = |share: f64| round_half_up(share * spendable as f64) < min_output;
    let dropped_share: f64 = eligible.iter().map(|(share, _)| *share).filter(|s| is_dust(*s)).sum();
    let adjustment = 1.0 - dropped_share;

    let mut receivers: Vec<Receiver> = if adjustment > 0.0 {
        eligible
            .iter()
            .filter(|(share, _)| !is_dust(*share))
            .map(|(share, address)| Receiver::new(round_half_up(share / adjustment * spendable as f64), *address))
            .filter(|r| (min_output..=max_output).contains(&r.amount))
            .collect()
    } else {
        Vec::new()
    };
    receivers.sort();
    trim_to_spendable(&mut receivers, spendable, min_output);

    let total: i64 = receivers.iter().map(|r| r.amount).sum();
    let remainder = spendable - total;
    debug!(
        spendable,
        fee_per_vbyte,
        outputs = receivers.len(),
        dropped = eligible.len() - receivers.len(),
        remainder,
        "receivers: built delayed payout receivers"
    );
    if remainder > DPT_MIN_REMAINDER_TO_LEGACY_BM {
        receivers.push(Receiver::new(remainder, legacy_address));
    }
    Ok(receivers)
}

/// Rounding each output half up can overshoot `spendable` by a few sat.
/// Take the excess from the largest output, dropping it if that pushes it
/// below `min_output`.
fn trim_to_spendable(receivers: &mut Vec<Receiver>, spendable: i64, min_output: i64) {
    let total: i64 = receivers.iter().map(|r| r.amount).sum();
    let excess = total - spendable;
    if excess <= 0 {
        return;
    }
    let Some(largest) = receivers.pop() else {
        return;
    };
    let amount = largest.amount - excess;
    if amount >= min_output {
        receivers.push(Receiver::new(amount, largest.address));
        receivers.sort();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    use crate::candidate::{BurnOutputModel, CompensationModel, ContributionKind, ShareInputs};

    /// Candidates with equal issuance and the given decayed burns.
    fn candidates(burns: &[i64]) -> Vec<BurningManCandidate> {
        let built: Vec<BurningManCandidate> = burns
            .iter()
            .enumerate()
            .map(|(i, burned)| {
                BurningManCandidate::new(
                    format!("c{i:02}"),
                    vec![CompensationModel {
                        address: format!("addr{i:02}"),
                        amount: 1_000,
                        decayed_amount: 1_000,
                        height: 1,
                        txid: format!("t{i}"),
                        date: 0,
                        cycle_index: 0,
                        kind: ContributionKind::CompensationRequest,
                    }],
                    vec![BurnOutputModel {
                        amount: *burned,
                        decayed_amount: *burned,
                        height: 1,
                        txid: format!("b{i}"),
                        date: 0,
                        cycle_index: 0,
                    }],
                )
            })
            .collect();
        let inputs = ShareInputs {
            total_decayed_compensation_amount: built.iter().map(|c| c.accumulated_decayed_compensation_amount()).sum(),
            total_decayed_burn_amount: built.iter().map(|c| c.accumulated_decayed_burn_amount()).sum(),
            ..ShareInputs::default()
        };
        built.into_iter().map(|c| c.with_shares(&inputs)).collect()
    }

    #[test]
    fn selection_height_grid() {
        assert_eq!(selection_height(1000, 1050, 10, 0), 1040);
        assert_eq!(selection_height(1000, 1055, 10, 0), 1040);
        assert_eq!(selection_height(1000, 1059, 10, 0), 1040);
        assert_eq!(selection_height(1000, 1060, 10, 0), 1050);
        assert_eq!(selection_height(1000, 1031, 10, 0), 1020);
        assert_eq!(selection_height(1000, 1030, 10, 0), 1000);
        assert_eq!(selection_height(1000, 900, 10, 0), 1000);
    }

    #[test]
    fn selection_height_respects_minimum() {
        assert_eq!(selection_height(1000, 1050, 10, 1045), 1045);
        assert_eq!(selection_height(1000, 1010, 10, 2000), 2000);
    }

    #[test]
    fn fee_rate_from_trade_fee() {
        assert_eq!(tx_fee_per_vbyte(0), 10);
        assert_eq!(tx_fee_per_vbyte(2_780), 10);
        assert_eq!(tx_fee_per_vbyte(5_560), 20);
        // 5_699 / 278 = 20.5
        assert_eq!(tx_fee_per_vbyte(5_699), 21);
    }

    #[test]
    fn miner_fee_floor_and_weight() {
        assert_eq!(tx_weight(1), 332);
        assert_eq!(miner_fee(1, 10), 830);
        assert_eq!(miner_fee(0, 1), 800);
        assert_eq!(miner_fee(10, 10), 3_710);
        assert_eq!(spendable_amount(1, 500, 10), 0);
    }

    #[test]
    fn absurd_trade_fee_leaves_nothing_spendable() {
        assert_eq!(miner_fee(30, i64::MAX), i64::MAX / 4 + 1);
        assert_eq!(min_output_amount(i64::MAX), i64::MAX);
        assert_eq!(spendable_amount(30, 100_000_000, tx_fee_per_vbyte(i64::MAX)), 0);

        let cs = candidates(&[100; 25]);
        let refs: Vec<&BurningManCandidate> = cs.iter().collect();
        for trade_tx_fee in [1_000_000_000_000_000_000, i64::MAX] {
            let r = delayed_payout_receivers(&refs, "legacy", 100_000_000, trade_tx_fee, &[]).unwrap();
            assert!(r.is_empty(), "{r:?}");
        }
        assert!(delayed_payout_receivers(&[], "legacy", 100_000_000, i64::MAX, &[]).unwrap().is_empty());
    }

    #[test]
    fn output_bounds() {
        assert_eq!(min_output_amount(10), 640);
        assert_eq!(min_output_amount(1), DUST_LIMIT);
        assert_eq!(max_output_amount(1_000_000), 132_000);
    }

    #[test]
    fn no_candidates_pays_legacy() {
        let r = delayed_payout_receivers(&[], "legacy", 100_000, 0, &[]).unwrap();
        assert_eq!(r, vec![Receiver::new(99_170, "legacy")]);
    }

    #[test]
    fn no_candidates_small_amount_is_miner_fee() {
        let r = delayed_payout_receivers(&[], "legacy", 25_830, 0, &[]).unwrap();
        assert!(r.is_empty());
        let r = delayed_payout_receivers(&[], "legacy", 25_831, 0, &[]).unwrap();
        assert_eq!(r, vec![Receiver::new(25_001, "legacy")]);
    }

    #[test]
    fn negative_input_rejected() {
        assert_eq!(
            delayed_payout_receivers(&[], "legacy", -1, 0, &[]),
            Err(ReceiverError::NegativeInputAmount(-1))
        );
    }

    #[test]
    fn ten_equal_candidates_share_evenly() {
        let cs = candidates(&[100; 10]);
        let refs: Vec<&BurningManCandidate> = cs.iter().collect();
        let r = delayed_payout_receivers(&refs, "legacy", 1_003_710, 0, &[]).unwrap();
        // spendable 1_000_000, 10% each
        assert_eq!(r.len(), 10);
        assert!(r.iter().all(|r| r.amount == 100_000));
        assert_eq!(r[0].address, "addr00");
        assert_eq!(r[9].address, "addr09");
    }

    #[test]
    fn dust_share_goes_to_survivors() {
        // one candidate with a tiny burn, nine with equal larger burns
        let mut burns = vec![1_000_000; 9];
        burns.push(1);
        let cs = candidates(&burns);
        let refs: Vec<&BurningManCandidate> = cs.iter().collect();
        let r = delayed_payout_receivers(&refs, "legacy", 1_003_710, 0, &[]).unwrap();
        assert_eq!(r.len(), 9);
        assert!(r.iter().all(|x| x.address != "addr09"));
        let total: i64 = r.iter().map(|x| x.amount).sum();
        assert!(total <= 1_000_000 && total >= 999_990, "total {total}");
    }

    #[test]
    fn capped_outputs_leave_remainder_for_legacy() {
        // two candidates, each capped at 2 * 0.5 = 1.0, but max output is 13.2%
        let cs = candidates(&[100, 100]);
        let refs: Vec<&BurningManCandidate> = cs.iter().collect();
        let r = delayed_payout_receivers(&refs, "legacy", 1_000_000, 0, &[]).unwrap();
        assert_eq!(r, vec![Receiver::new(spendable_amount(2, 1_000_000, 10), "legacy")]);
    }

    #[test]
    fn exclude_dormant_changes_output_count() {
        let mut cs = candidates(&[100; 10]);
        cs.push(BurningManCandidate::new("dormant", vec![], vec![]));
        let refs: Vec<&BurningManCandidate> = cs.iter().collect();
        let with = delayed_payout_receivers(&refs, "legacy", 1_003_710, 0, &[ReceiverFlag::ExcludeDormantCandidates]).unwrap();
        let without = delayed_payout_receivers(&refs, "legacy", 1_003_710, 0, &[]).unwrap();
        assert!(with.iter().all(|r| r.amount == 100_000));
        // the dormant candidate still costs an output's fee without the flag
        assert!(without.iter().all(|r| r.amount == 99_968));
    }

    #[test]
    fn rounding_overshoot_trimmed() {
        let mut r = vec![Receiver::new(10_001, "a"), Receiver::new(10_001, "b")];
        trim_to_spendable(&mut r, 20_000, 546);
        assert_eq!(r, vec![Receiver::new(9_999, "b"), Receiver::new(10_001, "a")]);
    }

    proptest! {
        #[test]
        fn list_within_bounds(
            burns in prop::collection::vec(0i64..10_000_000, 1..30),
            input_amount in 0i64..100_000_000,
            trade_tx_fee in 0i64..50_000,
        ) {
            let cs = candidates(&burns);
            let refs: Vec<&BurningManCandidate> = cs.iter().collect();
            let r = delayed_payout_receivers(&refs, "legacy", input_amount, trade_tx_fee, &[]).unwrap();
            let fee_rate = tx_fee_per_vbyte(trade_tx_fee);
            let spendable = spendable_amount(cs.len(), input_amount, fee_rate);
            let total: i64 = r.iter().map(|x| x.amount).sum();
            prop_assert!(total <= spendable, "total {} > spendable {}", total, spendable);
            for x in r.iter().filter(|x| x.address != "legacy") {
                prop_assert!(x.amount >= min_output_amount(fee_rate));
                prop_assert!(x.amount <= max_output_amount(spendable));
            }
        }

        #[test]
        fn list_is_deterministic(
            burns in prop::collection::vec(0i64..10_000_000, 1..30),
            input_amount in 0i64..100_000_000,
        ) {
            let cs = candidates(&burns);
            let refs: Vec<&BurningManCandidate> = cs.iter().collect();
            let a = delayed_payout_receivers(&refs, "legacy", input_amount, 10_000, &[]).unwrap();
            let b = delayed_payout_receivers(&refs, "legacy", input_amount, 10_000, &[]).unwrap();
            prop_assert_eq!(a, b);
        }
    }
}
