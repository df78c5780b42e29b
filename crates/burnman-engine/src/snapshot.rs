//! Immutable per-height results and their cache.
//!
//! A [`Snapshot`] is computed from scratch for one height and never changed.
//! The [`SnapshotCache`] holds snapshots for the current chain height only;
//! seeing a new height drops all of them.

use std::collections::BTreeMap;
use std::sync::Arc;

use parking_lot::RwLock;
use tracing::{debug, info};

use burnman_core::constants::{
    LEGACY_BURNING_MAN_BTC_FEES_ADDRESS, LEGACY_BURNING_MAN_BTC_FEES_NAME, LEGACY_BURNING_MAN_DPT_NAME,
    NUM_CYCLES_BURN_TARGET, NetworkType,
};
use burnman_core::error::BurnmanError;
use burnman_core::traits::{DecayCalculator, LedgerView};

use crate::aggregator::{aggregate, apply_shares, legacy_burn_outputs};
use crate::burn_target::{BurnTargetBreakdown, BurnTargetInputs, accumulated_decayed_burned_amount, candidate_burn_target_range};
use crate::candidate::{BurningManCandidate, LegacyBurningMan, ReimbursementModel, ShareInputs};

/// Everything derived from the ledger as of one height.
#[derive(Debug, Clone)]
pub struct Snapshot {
    height: u64,
    network: NetworkType,
    candidates: BTreeMap<String, BurningManCandidate>,
    reimbursements: Vec<ReimbursementModel>,
    burn_target: BurnTargetBreakdown,
    burn_target_boost_amount: i64,
    average_distribution_per_cycle: i64,
    accumulated_decayed_burned_amount: i64,
    legacy_address: String,
    legacy_dpt: LegacyBurningMan,
    legacy_btc_fees: LegacyBurningMan,
    name_by_address: BTreeMap<String, String>,
}

impl Snapshot {
    /// Compute the snapshot for `height`.
    ///
    /// # Errors
    ///
    /// Ledger failures and decay precondition violations.
    pub fn compute(
        ledger: &dyn LedgerView,
        decay: &dyn DecayCalculator,
        network: NetworkType,
        height: u64,
    ) -> Result<Self, BurnmanError> {
        let state = aggregate(ledger, decay, network, height)?;
        let legacy_address = ledger.legacy_burning_man_address(height)?;

        let inputs = BurnTargetInputs {
            ledger,
            network,
            height,
            genesis_height: state.genesis_height,
            cycles: &state.cycles,
            reimbursements: &state.reimbursements,
            proof_of_burn_txs: &state.proof_of_burn_txs,
        };
        let burn_target = inputs.breakdown(state.candidates.values())?;
        let average_distribution_per_cycle = inputs.average_distribution_per_cycle()?;
        let from_block = inputs.window_start(NUM_CYCLES_BURN_TARGET);

        let share_inputs = ShareInputs {
            total_decayed_compensation_amount: state.total_decayed_compensation_amount(),
            total_decayed_burn_amount: state.total_decayed_burn_amount(),
            burn_target: burn_target.burn_target(),
            burn_target_boost_amount: network.burn_target_boost_amount(),
            average_distribution_per_cycle,
        };
        let candidates = apply_shares(state.candidates, &share_inputs);
        let accumulated_decayed_burned_amount = accumulated_decayed_burned_amount(candidates.values(), from_block);

        let share_of_candidates: f64 = candidates.values().map(|c| c.effective_burn_output_share()).sum();
        let legacy_dpt = LegacyBurningMan::new(
            LEGACY_BURNING_MAN_DPT_NAME,
            legacy_address.clone(),
            legacy_burn_outputs(&state.proof_of_burn_txs, network.legacy_dpt_burn_markers(), &state.cycles),
            share_of_candidates,
        );
        let legacy_btc_fees = LegacyBurningMan::new(
            LEGACY_BURNING_MAN_BTC_FEES_NAME,
            LEGACY_BURNING_MAN_BTC_FEES_ADDRESS,
            legacy_burn_outputs(&state.proof_of_burn_txs, network.legacy_fee_burn_markers(), &state.cycles),
            share_of_candidates,
        );
        let name_by_address = name_by_address(&candidates, [&legacy_dpt, &legacy_btc_fees]);

        info!(
            height,
            candidates = candidates.len(),
            burn_target = burn_target.burn_target(),
            average_distribution_per_cycle,
            "snapshot: computed"
        );

        Ok(Self {
            height,
            network,
            candidates,
            reimbursements: state.reimbursements,
            burn_target,
            burn_target_boost_amount: network.burn_target_boost_amount(),
            average_distribution_per_cycle,
            accumulated_decayed_burned_amount,
            legacy_address,
            legacy_dpt,
            legacy_btc_fees,
            name_by_address,
        })
    }

    pub fn height(&self) -> u64 {
        self.height
    }

    pub fn network(&self) -> NetworkType {
        self.network
    }

    /// Candidates by name.
    pub fn candidates(&self) -> &BTreeMap<String, BurningManCandidate> {
        &self.candidates
    }

    /// Candidates in name order.
    pub fn candidate_list(&self) -> Vec<&BurningManCandidate> {
        self.candidates.values().collect()
    }

    pub fn candidate(&self, name: &str) -> Option<&BurningManCandidate> {
        self.candidates.get(name)
    }

    pub fn reimbursements(&self) -> &[ReimbursementModel] {
        &self.reimbursements
    }

    pub fn burn_target(&self) -> i64 {
        self.burn_target.burn_target()
    }

    pub fn burn_target_breakdown(&self) -> &BurnTargetBreakdown {
        &self.burn_target
    }

    pub fn boosted_burn_target(&self) -> i64 {
        self.burn_target() + self.burn_target_boost_amount
    }

    pub fn average_distribution_per_cycle(&self) -> i64 {
        self.average_distribution_per_cycle
    }

    /// Decayed amount all candidates burned within the burn target window.
    pub fn accumulated_decayed_burned_amount(&self) -> i64 {
        self.accumulated_decayed_burned_amount
    }

    /// Raw amount all candidates ever burned.
    pub fn total_burned_amount(&self) -> i64 {
        self.candidates.values().map(|c| c.accumulated_burn_amount()).sum()
    }

    /// Legacy burningman address in force at this height.
    pub fn legacy_address(&self) -> &str {
        &self.legacy_address
    }

    pub fn legacy_burning_man_dpt(&self) -> &LegacyBurningMan {
        &self.legacy_dpt
    }

    pub fn legacy_burning_man_btc_fees(&self) -> &LegacyBurningMan {
        &self.legacy_btc_fees
    }

    /// Owner name of every known receiver address, legacy burningmen included.
    pub fn name_by_address(&self) -> &BTreeMap<String, String> {
        &self.name_by_address
    }

    /// `(lower, upper)` suggested burn amounts for the candidate `name`.
    pub fn candidate_burn_target_range(&self, name: &str) -> Option<(i64, i64)> {
        self.candidate(name).map(|candidate| {
            candidate_burn_target_range(
                candidate,
                self.burn_target(),
                self.burn_target_boost_amount,
                self.accumulated_decayed_burned_amount,
            )
        })
    }
}

/// First name in name order wins an address used by several candidates.
fn name_by_address<'a>(
    candidates: &BTreeMap<String, BurningManCandidate>,
    legacy: impl IntoIterator<Item = &'a LegacyBurningMan>,
) -> BTreeMap<String, String> {
    let mut map = BTreeMap::new();
    let owners = candidates
        .values()
        .flat_map(|c| c.all_addresses().into_iter().map(move |a| (a, c.name())))
        .chain(legacy.into_iter().map(|l| (l.address(), l.name())));
    for (address, name) in owners {
        map.entry(address.to_string()).or_insert_with(|| name.to_string());
    }
    map
}

#[derive(Debug, Default)]
struct CacheState {
    chain_height: u64,
    snapshots: BTreeMap<u64, Arc<Snapshot>>,
}

/// Snapshots valid for the current chain height.
///
/// Written by the block notification, read by any number of callers. A
/// reader sees either the old or the new height's complete snapshots.
#[derive(Debug, Default)]
pub struct SnapshotCache {
    state: RwLock<CacheState>,
}

impl SnapshotCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Chain height the cached snapshots belong to.
    pub fn chain_height(&self) -> u64 {
        self.state.read().chain_height
    }

    /// Record a new chain height, dropping every snapshot if it changed.
    pub fn advance(&self, chain_height: u64) {
        let mut state = self.state.write();
        if state.chain_height != chain_height {
            debug!(
                old = state.chain_height,
                new = chain_height,
                dropped = state.snapshots.len(),
                "snapshot cache: new chain height"
            );
            state.chain_height = chain_height;
            state.snapshots.clear();
        }
    }

    pub fn get(&self, height: u64) -> Option<Arc<Snapshot>> {
        self.state.read().snapshots.get(&height).cloned()
    }

    /// Cached snapshot for `height`, computed with `compute` on a miss.
    ///
    /// The lock is not held while computing. Concurrent misses compute
    /// twice; the last insert wins and both results are equal. A result
    /// computed for a chain height that has since passed is returned but not
    /// cached.
    pub fn get_or_compute<E>(
        &self,
        height: u64,
        compute: impl FnOnce() -> Result<Snapshot, E>,
    ) -> Result<Arc<Snapshot>, E> {
        let chain_height = {
            let state = self.state.read();
            if let Some(snapshot) = state.snapshots.get(&height) {
                return Ok(Arc::clone(snapshot));
            }
            state.chain_height
        };
        let snapshot = Arc::new(compute()?);
        let mut state = self.state.write();
        if state.chain_height == chain_height {
            state.snapshots.insert(height, Arc::clone(&snapshot));
        }
        Ok(snapshot)
    }

    pub fn len(&self) -> usize {
        self.state.read().snapshots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
