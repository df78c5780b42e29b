//! BTC fee receiver lottery.
//!
//! Trade fees are not split but sent to one candidate picked at random,
//! weighted by effective burn share. The pick need not match between peers.

use rand::Rng;
use tracing::debug;

use burnman_core::constants::LOTTERY_SHARE_PRECISION;

use crate::candidate::BurningManCandidate;

/// Lottery weight of an effective share, truncated to 0.01% steps.
pub fn lottery_weight(effective_burn_output_share: f64) -> u64 {
    (effective_burn_output_share * LOTTERY_SHARE_PRECISION).floor().max(0.0) as u64
}

/// Index of the first weight whose cumulative sum reaches `target`.
///
/// Falls back to 0 if `target` exceeds the sum of all weights.
///
/// ```
/// use burnman_engine::lottery::find_cumulative_index;
/// assert_eq!(find_cumulative_index(&[10, 20, 30], 25), 1);
/// assert_eq!(find_cumulative_index(&[10, 20, 30], 60), 2);
/// assert_eq!(find_cumulative_index(&[10, 20, 30], 61), 0);
/// ```
pub fn find_cumulative_index(weights: &[u64], target: u64) -> usize {
    let mut cumulative = 0u64;
    for (index, weight) in weights.iter().enumerate() {
        cumulative = cumulative.saturating_add(*weight);
        if cumulative >= target {
            return index;
        }
    }
    0
}

/// Draw an index with probability proportional to its weight.
///
/// `None` if all weights are zero.
pub fn random_index<R: Rng + ?Sized>(weights: &[u64], rng: &mut R) -> Option<usize> {
    let sum: u64 = weights.iter().sum();
    if sum == 0 {
        return None;
    }
    let target = rng.gen_range(1..=sum);
    Some(find_cumulative_index(weights, target))
}

/// Pick the fee receiver address among `candidates`.
///
/// The winner's most recent address is returned; `legacy_address` if there
/// are no candidates, all weights are zero, or the winner has no address.
pub fn fee_receiver_address<'a, R: Rng + ?Sized>(
    candidates: &[&'a BurningManCandidate],
    legacy_address: &'a str,
    rng: &mut R,
) -> &'a str {
    let weights: Vec<u64> = candidates
        .iter()
        .map(|c| lottery_weight(c.effective_burn_output_share()))
        .collect();
    let Some(winner) = random_index(&weights, rng) else {
        debug!(candidates = candidates.len(), "lottery: no weight, using legacy address");
        return legacy_address;
    };
    match candidates[winner].most_recent_address() {
        Some(address) => address,
        None => {
            debug!(name = candidates[winner].name(), "lottery: winner without address, using legacy address");
            legacy_address
        }
    }
}
