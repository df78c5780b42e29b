//! Burningman candidates and the records they are built from.
//!
//! A candidate is built once from its full, unsorted record sets. The records
//! are sorted by txid and deduplicated on construction and never change
//! afterwards. Shares depend on network-wide totals and are applied in a
//! second, consuming step ([`BurningManCandidate::with_shares`]).

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use burnman_core::constants::{DUST_LIMIT, ISSUANCE_BOOST_FACTOR};
use burnman_decay::round_half_up;

/// Origin of a contribution record.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum ContributionKind {
    CompensationRequest,
    GenesisOutput,
}

/// One issuance counted as contribution of a candidate.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct CompensationModel {
    /// BTC address fee revenue for this contribution is paid to.
    pub address: String,
    pub amount: i64,
    pub decayed_amount: i64,
    pub height: u64,
    pub txid: String,
    /// Block time of the issuance (Unix seconds).
    pub date: u64,
    pub cycle_index: u32,
    pub kind: ContributionKind,
}

/// One proof-of-burn tx attributed to a candidate.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct BurnOutputModel {
    pub amount: i64,
    pub decayed_amount: i64,
    pub height: u64,
    pub txid: String,
    pub date: u64,
    pub cycle_index: u32,
}

/// A reimbursement issuance. Feeds the burn target, not the shares.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct ReimbursementModel {
    pub amount: i64,
    pub height: u64,
    pub date: u64,
    pub cycle_index: u32,
}

/// Network-wide values a candidate's shares are derived from.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ShareInputs {
    pub total_decayed_compensation_amount: i64,
    pub total_decayed_burn_amount: i64,
    pub burn_target: i64,
    pub burn_target_boost_amount: i64,
    pub average_distribution_per_cycle: i64,
}

impl ShareInputs {
    /// Burn target plus boost: the most all candidates together may burn.
    pub fn max_burn_amount(&self) -> i64 {
        self.burn_target + self.burn_target_boost_amount
    }
}

/// A contributor eligible for a share of the fee revenue.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct BurningManCandidate {
    name: String,
    compensations: Vec<CompensationModel>,
    burn_outputs: Vec<BurnOutputModel>,

    accumulated_compensation_amount: i64,
    accumulated_decayed_compensation_amount: i64,
    accumulated_burn_amount: i64,
    accumulated_decayed_burn_amount: i64,

    issuance_share: f64,
    boosted_issuance_share: f64,
    burn_output_share: f64,
    effective_burn_output_share: f64,
    allowed_burn_amount: i64,
    expected_revenue: i64,
}

/// Sort by txid and keep the first record per txid.
fn freeze<T>(mut records: Vec<T>, txid: impl Fn(&T) -> &str) -> Vec<T> {
    records.sort_by(|a, b| txid(a).cmp(txid(b)));
    records.dedup_by(|a, b| txid(a) == txid(b));
    records
}

impl BurningManCandidate {
    /// Freeze the record sets of `name` and accumulate their amounts.
    ///
    /// All shares are zero until [`with_shares`](Self::with_shares) is applied.
    pub fn new(name: impl Into<String>, compensations: Vec<CompensationModel>, burn_outputs: Vec<BurnOutputModel>) -> Self {
        let compensations = freeze(compensations, |c| c.txid.as_str());
        let burn_outputs = freeze(burn_outputs, |b| b.txid.as_str());
        Self {
            name: name.into(),
            accumulated_compensation_amount: compensations.iter().map(|c| c.amount).sum(),
            accumulated_decayed_compensation_amount: compensations.iter().map(|c| c.decayed_amount).sum(),
            accumulated_burn_amount: burn_outputs.iter().map(|b| b.amount).sum(),
            accumulated_decayed_burn_amount: burn_outputs.iter().map(|b| b.decayed_amount).sum(),
            compensations,
            burn_outputs,
            issuance_share: 0.0,
            boosted_issuance_share: 0.0,
            burn_output_share: 0.0,
            effective_burn_output_share: 0.0,
            allowed_burn_amount: 0,
            expected_revenue: 0,
        }
    }

    /// Derive all shares from the network-wide `inputs`.
    ///
    /// - `issuance_share = decayed compensation / total` (0 on empty total)
    /// - `boosted = issuance_share * ISSUANCE_BOOST_FACTOR`
    /// - `burn_output_share = decayed burn / total` (0 on empty total)
    /// - `effective = min(boosted, burn_output_share)`
    pub fn with_shares(self, inputs: &ShareInputs) -> Self {
        let issuance_share = share_of(self.accumulated_decayed_compensation_amount, inputs.total_decayed_compensation_amount);
        let boosted_issuance_share = issuance_share * ISSUANCE_BOOST_FACTOR;
        let burn_output_share = share_of(self.accumulated_decayed_burn_amount, inputs.total_decayed_burn_amount);
        let effective_burn_output_share = boosted_issuance_share.min(burn_output_share);

        let max_burn_amount = inputs.max_burn_amount();
        let allowed_burn_amount = if issuance_share > 0.0
            && max_burn_amount > 0
            && effective_burn_output_share < boosted_issuance_share
        {
            let amount = round_half_up(boosted_issuance_share * max_burn_amount as f64);
            if amount < DUST_LIMIT { 0 } else { amount }
        } else {
            0
        };
        let expected_revenue = round_half_up(effective_burn_output_share * inputs.average_distribution_per_cycle as f64);

        Self {
            issuance_share,
            boosted_issuance_share,
            burn_output_share,
            effective_burn_output_share,
            allowed_burn_amount,
            expected_revenue,
            ..self
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Contribution records, sorted by txid.
    pub fn compensations(&self) -> &[CompensationModel] {
        &self.compensations
    }

    /// Burn records, sorted by txid.
    pub fn burn_outputs(&self) -> &[BurnOutputModel] {
        &self.burn_outputs
    }

    /// Address of the most recent contribution (highest height, then
    /// highest txid).
    pub fn most_recent_address(&self) -> Option<&str> {
        self.compensations
            .iter()
            .max_by(|a, b| a.height.cmp(&b.height).then_with(|| a.txid.cmp(&b.txid)))
            .map(|c| c.address.as_str())
    }

    /// Every receiver address the candidate has used.
    pub fn all_addresses(&self) -> BTreeSet<&str> {
        self.compensations.iter().map(|c| c.address.as_str()).collect()
    }

    pub fn accumulated_compensation_amount(&self) -> i64 {
        self.accumulated_compensation_amount
    }

    pub fn accumulated_decayed_compensation_amount(&self) -> i64 {
        self.accumulated_decayed_compensation_amount
    }

    pub fn accumulated_burn_amount(&self) -> i64 {
        self.accumulated_burn_amount
    }

    pub fn accumulated_decayed_burn_amount(&self) -> i64 {
        self.accumulated_decayed_burn_amount
    }

    pub fn issuance_share(&self) -> f64 {
        self.issuance_share
    }

    pub fn boosted_issuance_share(&self) -> f64 {
        self.boosted_issuance_share
    }

    pub fn burn_output_share(&self) -> f64 {
        self.burn_output_share
    }

    /// Share of fee revenue this candidate receives, capped at the boosted
    /// issuance share.
    pub fn effective_burn_output_share(&self) -> f64 {
        self.effective_burn_output_share
    }

    /// How much more the candidate may burn before getting capped.
    pub fn allowed_burn_amount(&self) -> i64 {
        self.allowed_burn_amount
    }

    /// Projected revenue per cycle at the current effective share.
    pub fn expected_revenue(&self) -> i64 {
        self.expected_revenue
    }

    /// Whether burns beyond this point would not raise the revenue share.
    pub fn is_capped(&self) -> bool {
        self.effective_burn_output_share >= self.boosted_issuance_share && self.boosted_issuance_share > 0.0
    }
}

fn share_of(amount: i64, total: i64) -> f64 {
    if total > 0 { amount as f64 / total as f64 } else { 0.0 }
}

/// The legacy burningman as a pseudo-candidate.
///
/// Its burns are identified by fixed OP_RETURN markers instead of a name
/// hash and do not decay. It receives whatever share the candidates leave.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct LegacyBurningMan {
    name: String,
    address: String,
    burn_outputs: Vec<BurnOutputModel>,
    accumulated_burn_amount: i64,
    burn_amount_share: f64,
}

impl LegacyBurningMan {
    /// `share_of_others` is the sum of all candidates' effective shares.
    pub fn new(
        name: impl Into<String>,
        address: impl Into<String>,
        burn_outputs: Vec<BurnOutputModel>,
        share_of_others: f64,
    ) -> Self {
        let burn_outputs = freeze(burn_outputs, |b| b.txid.as_str());
        Self {
            name: name.into(),
            address: address.into(),
            accumulated_burn_amount: burn_outputs.iter().map(|b| b.amount).sum(),
            burn_outputs,
            burn_amount_share: 1.0 - share_of_others,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn address(&self) -> &str {
        &self.address
    }

    pub fn burn_outputs(&self) -> &[BurnOutputModel] {
        &self.burn_outputs
    }

    pub fn accumulated_burn_amount(&self) -> i64 {
        self.accumulated_burn_amount
    }

    /// Remaining share not taken by any candidate.
    pub fn burn_amount_share(&self) -> f64 {
        self.burn_amount_share
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn comp(txid: &str, height: u64, amount: i64, decayed: i64, address: &str) -> CompensationModel {
        CompensationModel {
            address: address.into(),
            amount,
            decayed_amount: decayed,
            height,
            txid: txid.into(),
            date: 0,
            cycle_index: 0,
            kind: ContributionKind::CompensationRequest,
        }
    }

    fn burn(txid: &str, height: u64, amount: i64, decayed: i64) -> BurnOutputModel {
        BurnOutputModel {
            amount,
            decayed_amount: decayed,
            height,
            txid: txid.into(),
            date: 0,
            cycle_index: 0,
        }
    }

    #[test]
    fn records_sorted_and_deduplicated() {
        let c = BurningManCandidate::new(
            "alice",
            vec![comp("cc", 3, 10, 5, "a3"), comp("aa", 1, 20, 10, "a1"), comp("cc", 3, 10, 5, "a3")],
            vec![burn("b2", 5, 7, 7), burn("b1", 4, 3, 2), burn("b2", 5, 7, 7)],
        );
        let txids: Vec<&str> = c.compensations().iter().map(|c| c.txid.as_str()).collect();
        assert_eq!(txids, vec!["aa", "cc"]);
        assert_eq!(c.burn_outputs().len(), 2);
        assert_eq!(c.accumulated_compensation_amount(), 30);
        assert_eq!(c.accumulated_decayed_compensation_amount(), 15);
        assert_eq!(c.accumulated_burn_amount(), 10);
        assert_eq!(c.accumulated_decayed_burn_amount(), 9);
    }

    #[test]
    fn most_recent_address_by_height_then_txid() {
        let c = BurningManCandidate::new(
            "alice",
            vec![comp("zz", 1, 1, 1, "old"), comp("aa", 9, 1, 1, "new"), comp("ab", 9, 1, 1, "newest")],
            vec![],
        );
        assert_eq!(c.most_recent_address(), Some("newest"));
        assert_eq!(c.all_addresses().len(), 3);
        assert_eq!(BurningManCandidate::new("x", vec![], vec![]).most_recent_address(), None);
    }

    #[test]
    fn shares_with_empty_totals_are_zero() {
        let c = BurningManCandidate::new("alice", vec![], vec![]).with_shares(&ShareInputs::default());
        assert_eq!(c.issuance_share(), 0.0);
        assert_eq!(c.burn_output_share(), 0.0);
        assert_eq!(c.effective_burn_output_share(), 0.0);
        assert_eq!(c.allowed_burn_amount(), 0);
    }

    #[test]
    fn allowed_burn_amount_uses_boosted_target() {
        // issuance share 0.1, nothing burned yet
        let c = BurningManCandidate::new("alice", vec![comp("aa", 1, 100, 100, "a")], vec![]);
        let inputs = ShareInputs {
            total_decayed_compensation_amount: 1_000,
            total_decayed_burn_amount: 0,
            burn_target: 10_200_000,
            burn_target_boost_amount: 10_000_000,
            average_distribution_per_cycle: 0,
        };
        let c = c.with_shares(&inputs);
        assert_eq!(c.issuance_share(), 0.1);
        assert_eq!(c.boosted_issuance_share(), 0.2);
        assert_eq!(c.allowed_burn_amount(), 4_040_000);
    }

    #[test]
    fn capped_candidate_may_not_burn_more() {
        let c = BurningManCandidate::new("alice", vec![comp("aa", 1, 100, 100, "a")], vec![burn("b", 1, 500, 500)]);
        let inputs = ShareInputs {
            total_decayed_compensation_amount: 1_000,
            total_decayed_burn_amount: 1_000,
            burn_target: 1_000_000,
            burn_target_boost_amount: 10_000_000,
            average_distribution_per_cycle: 300_000,
        };
        let c = c.with_shares(&inputs);
        assert_eq!(c.burn_output_share(), 0.5);
        assert_eq!(c.effective_burn_output_share(), 0.2);
        assert!(c.is_capped());
        assert_eq!(c.allowed_burn_amount(), 0);
        assert_eq!(c.expected_revenue(), 60_000);
    }

    #[test]
    fn dust_allowance_is_zero() {
        let c = BurningManCandidate::new("alice", vec![comp("aa", 1, 1, 1, "a")], vec![]);
        let inputs = ShareInputs {
            total_decayed_compensation_amount: 1_000_000,
            burn_target: 100_000,
            burn_target_boost_amount: 0,
            ..ShareInputs::default()
        };
        // 2e-6 * 100_000 = 0.2
        assert_eq!(c.with_shares(&inputs).allowed_burn_amount(), 0);
    }

    #[test]
    fn legacy_takes_remaining_share() {
        let l = LegacyBurningMan::new("legacy", "addr", vec![burn("x", 1, 10, 10), burn("y", 2, 5, 5)], 0.75);
        assert_eq!(l.burn_amount_share(), 0.25);
        assert_eq!(l.accumulated_burn_amount(), 15);
        assert_eq!(l.address(), "addr");
    }

    proptest! {
        #[test]
        fn effective_share_never_exceeds_boosted(
            comp_amounts in prop::collection::vec(0i64..1_000_000, 1..12),
            burn_amounts in prop::collection::vec(0i64..1_000_000, 1..12),
        ) {
            let n = comp_amounts.len().min(burn_amounts.len());
            let candidates: Vec<BurningManCandidate> = (0..n)
                .map(|i| {
                    BurningManCandidate::new(
                        format!("c{i}"),
                        vec![comp(&format!("t{i}"), 1, comp_amounts[i], comp_amounts[i], "a")],
                        vec![burn(&format!("b{i}"), 1, burn_amounts[i], burn_amounts[i])],
                    )
                })
                .collect();
            let inputs = ShareInputs {
                total_decayed_compensation_amount: candidates.iter().map(|c| c.accumulated_decayed_compensation_amount()).sum(),
                total_decayed_burn_amount: candidates.iter().map(|c| c.accumulated_decayed_burn_amount()).sum(),
                burn_target: 5_000_000,
                burn_target_boost_amount: 10_000_000,
                average_distribution_per_cycle: 1_000_000,
            };
            let mut effective_sum = 0.0;
            for c in candidates {
                let c = c.with_shares(&inputs);
                prop_assert!(c.effective_burn_output_share() <= c.boosted_issuance_share());
                effective_sum += c.effective_burn_output_share();
            }
            prop_assert!(effective_sum <= 1.0 + 1e-9);
        }
    }
}
