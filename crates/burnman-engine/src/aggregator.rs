//! Candidate aggregation.
//!
//! Groups the ledger's issuances and proof-of-burn txs into one
//! [`BurningManCandidate`] per contributor name:
//! 1. every compensation issuance adds a contribution record under the
//!    proposal's name (decayed over two years)
//! 2. every genesis output adds a contribution record under
//!    `"Bisq co-founder <index>"` (flat weighting)
//! 3. every proof-of-burn tx whose committed hash equals the hash of a
//!    candidate name adds a burn record to that candidate (decayed over one
//!    year). Txs carrying a legacy burningman marker of the network are never
//!    attributed to a candidate, whatever the candidate is called.
//!
//! Shares need network-wide totals and the burn target, so they are applied
//! afterwards with [`apply_shares`].

use std::collections::BTreeMap;

use tracing::debug;

use burnman_core::constants::{
    GENESIS_OUTPUT_PREFIX, NetworkType, REFUND_AGENT_LAST_MISFILED_CYCLE, REFUND_AGENT_MAX_COMPENSATION, REFUND_AGENT_NAME,
    compensation_amount_override,
};
use burnman_core::cycle::cycle_index;
use burnman_core::error::BurnmanError;
use burnman_core::proof_of_burn;
use burnman_core::traits::{DecayCalculator, LedgerView};
use burnman_core::types::{CompensationIssuance, Cycle, GenesisOutput, Issuance, ProofOfBurnTx};

use crate::candidate::{BurnOutputModel, BurningManCandidate, CompensationModel, ContributionKind, ReimbursementModel, ShareInputs};

/// Ledger data as of one height, with candidates grouped but no shares yet.
#[derive(Debug, Clone)]
pub struct AggregatedState {
    pub height: u64,
    pub genesis_height: u64,
    pub cycles: Vec<Cycle>,
    pub proof_of_burn_txs: Vec<ProofOfBurnTx>,
    pub reimbursements: Vec<ReimbursementModel>,
    /// By name. Shares are all zero.
    pub candidates: BTreeMap<String, BurningManCandidate>,
}

impl AggregatedState {
    /// Sum of all candidates' decayed compensation amounts.
    pub fn total_decayed_compensation_amount(&self) -> i64 {
        self.candidates.values().map(|c| c.accumulated_decayed_compensation_amount()).sum()
    }

    /// Sum of all candidates' decayed burn amounts.
    pub fn total_decayed_burn_amount(&self) -> i64 {
        self.candidates.values().map(|c| c.accumulated_decayed_burn_amount()).sum()
    }
}

/// Name of the synthetic candidate owning genesis output `index`.
pub fn genesis_output_name(index: u32) -> String {
    format!("{GENESIS_OUTPUT_PREFIX}{index}")
}

/// Until cycle 15 the refund agent filed reimbursements as compensation
/// requests; those are not contributions.
pub fn is_misfiled_reimbursement(name: &str, cycle_index: u32, amount: i64) -> bool {
    name == REFUND_AGENT_NAME
        && cycle_index <= REFUND_AGENT_LAST_MISFILED_CYCLE
        && amount > REFUND_AGENT_MAX_COMPENSATION
}

/// Issued amount counted as contribution, after historical corrections.
pub fn compensation_amount(issuance: &CompensationIssuance) -> i64 {
    compensation_amount_override(&issuance.txid).unwrap_or(issuance.amount)
}

/// Collect all candidates and reimbursements as of `height`.
///
/// # Errors
///
/// Ledger failures and decay precondition violations (a record above
/// `height` handed out by the ledger) are propagated.
pub fn aggregate(
    ledger: &dyn LedgerView,
    decay: &dyn DecayCalculator,
    network: NetworkType,
    height: u64,
) -> Result<AggregatedState, BurnmanError> {
    let genesis_height = ledger.genesis_height()?;
    let cycles = ledger.cycles()?;
    let proof_of_burn_txs = ledger.proof_of_burn_txs(height)?;

    let mut compensations: BTreeMap<String, Vec<CompensationModel>> = BTreeMap::new();
    let mut reimbursements = Vec::new();

    for issuance in ledger.issuances(height)? {
        match issuance {
            Issuance::Compensation(c) => {
                let records = compensations.entry(c.name.clone()).or_default();
                if let Some(record) = compensation_record(ledger, decay, &cycles, &c, height)? {
                    records.push(record);
                }
            }
            Issuance::GenesisOutput(g) => {
                let record = genesis_output_record(ledger, decay, &g)?;
                compensations.entry(genesis_output_name(g.index)).or_default().push(record);
            }
            Issuance::Reimbursement(r) => reimbursements.push(ReimbursementModel {
                amount: r.amount,
                height: r.height,
                date: ledger.block_time(r.height)?,
                cycle_index: cycle_index(&cycles, r.height),
            }),
        }
    }
    reimbursements.sort_by_key(|r| r.height);

    // legacy burns are booked to the legacy burningmen only
    let candidate_burns: Vec<&ProofOfBurnTx> = proof_of_burn_txs
        .iter()
        .filter(|tx| !network.is_legacy_burn_marker(&tx.op_return_hex()))
        .collect();
    let mut burns_by_hash: BTreeMap<[u8; 20], Vec<&ProofOfBurnTx>> = BTreeMap::new();
    for &tx in &candidate_burns {
        if let Some(hash) = tx.pre_image_hash() {
            burns_by_hash.entry(hash).or_default().push(tx);
        }
    }

    let mut attributed = 0usize;
    let mut candidates = BTreeMap::new();
    for (name, records) in compensations {
        let burns = burns_by_hash
            .get(&proof_of_burn::name_hash(&name))
            .map(Vec::as_slice)
            .unwrap_or_default();
        attributed += burns.len();
        let burn_outputs = burns
            .iter()
            .map(|tx| burn_output_record(decay, &cycles, tx, height))
            .collect::<Result<Vec<_>, _>>()?;
        candidates.insert(name.clone(), BurningManCandidate::new(name, records, burn_outputs));
    }

    let unattributed = candidate_burns.len() - attributed;
    if unattributed > 0 {
        debug!(height, unattributed, "aggregator: proof-of-burn txs without candidate");
    }

    Ok(AggregatedState {
        height,
        genesis_height,
        cycles,
        proof_of_burn_txs,
        reimbursements,
        candidates,
    })
}

fn compensation_record(
    ledger: &dyn LedgerView,
    decay: &dyn DecayCalculator,
    cycles: &[Cycle],
    issuance: &CompensationIssuance,
    height: u64,
) -> Result<Option<CompensationModel>, BurnmanError> {
    let Some(address) = issuance.receiver_address() else {
        debug!(txid = %issuance.txid, name = %issuance.name, "aggregator: compensation without receiver address");
        return Ok(None);
    };
    let amount = compensation_amount(issuance);
    let cycle_index = cycle_index(cycles, issuance.height);
    if is_misfiled_reimbursement(&issuance.name, cycle_index, amount) {
        return Ok(None);
    }
    Ok(Some(CompensationModel {
        address: address.to_string(),
        amount,
        decayed_amount: decay.decayed_compensation_amount(amount, issuance.height, height)?,
        height: issuance.height,
        txid: issuance.txid.clone(),
        date: ledger.block_time(issuance.height)?,
        cycle_index,
        kind: ContributionKind::CompensationRequest,
    }))
}

fn genesis_output_record(
    ledger: &dyn LedgerView,
    decay: &dyn DecayCalculator,
    output: &GenesisOutput,
) -> Result<CompensationModel, BurnmanError> {
    Ok(CompensationModel {
        address: output.address.clone(),
        amount: output.amount,
        decayed_amount: decay.decayed_genesis_output_amount(output.amount),
        height: output.height,
        txid: output.txid.clone(),
        date: ledger.block_time(output.height)?,
        cycle_index: 0,
        kind: ContributionKind::GenesisOutput,
    })
}

fn burn_output_record(
    decay: &dyn DecayCalculator,
    cycles: &[Cycle],
    tx: &ProofOfBurnTx,
    height: u64,
) -> Result<BurnOutputModel, BurnmanError> {
    Ok(BurnOutputModel {
        amount: tx.burned_amount,
        decayed_amount: decay.decayed_burned_amount(tx.burned_amount, tx.height, height)?,
        height: tx.height,
        txid: tx.txid.clone(),
        date: tx.time,
        cycle_index: cycle_index(cycles, tx.height),
    })
}

/// Burn records of txs carrying one of the legacy `markers`. Legacy burns do
/// not decay.
pub fn legacy_burn_outputs(burns: &[ProofOfBurnTx], markers: &[&str], cycles: &[Cycle]) -> Vec<BurnOutputModel> {
    burns
        .iter()
        .filter(|tx| markers.contains(&tx.op_return_hex().as_str()))
        .map(|tx| BurnOutputModel {
            amount: tx.burned_amount,
            decayed_amount: tx.burned_amount,
            height: tx.height,
            txid: tx.txid.clone(),
            date: tx.time,
            cycle_index: cycle_index(cycles, tx.height),
        })
        .collect()
}

/// Apply `inputs` to every candidate.
pub fn apply_shares(
    candidates: BTreeMap<String, BurningManCandidate>,
    inputs: &ShareInputs,
) -> BTreeMap<String, BurningManCandidate> {
    candidates
        .into_iter()
        .map(|(name, candidate)| (name, candidate.with_shares(inputs)))
        .collect()
}
