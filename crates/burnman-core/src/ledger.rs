//! In-memory ledger implementing [`LedgerView`].
//!
//! Holds already-parsed DAO state. Suitable for tests and for the CLI, which
//! loads it from a JSON dump; a full node backs [`LedgerView`] with its own
//! parsed chain state instead.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::constants::ESTIMATED_FEES_PARAM_SENTINEL;
use crate::cycle;
use crate::error::LedgerError;
use crate::traits::LedgerView;
use crate::types::{
    CompensationIssuance, Cycle, GenesisOutput, Issuance, ProofOfBurnTx, ReimbursementIssuance,
};

/// Seconds between blocks assumed when a block time was not recorded.
const ASSUMED_BLOCK_SPACING_SECS: u64 = 600;

/// Parsed DAO state kept in memory.
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
pub struct MemoryLedger {
    pub genesis_height: u64,
    /// Block time of the genesis block (Unix seconds).
    #[serde(default)]
    pub genesis_time: u64,
    #[serde(default)]
    pub issuances: Vec<Issuance>,
    #[serde(default)]
    pub proof_of_burn_txs: Vec<ProofOfBurnTx>,
    #[serde(default)]
    pub cycles: Vec<Cycle>,
    /// Explicitly recorded block times by height.
    #[serde(default)]
    pub block_times: BTreeMap<u64, u64>,
    /// Estimated BTC fee parameter changes: activation height to value.
    #[serde(default)]
    pub estimated_btc_fees_param: BTreeMap<u64, i64>,
    /// Legacy burningman address changes: activation height to address.
    #[serde(default)]
    pub legacy_burning_man_address: BTreeMap<u64, String>,
}

impl MemoryLedger {
    /// Empty ledger starting at `genesis_height`.
    pub fn new(genesis_height: u64) -> Self {
        Self {
            genesis_height,
            ..Self::default()
        }
    }

    /// Parse a ledger dump from JSON.
    pub fn from_json(json: &str) -> Result<Self, LedgerError> {
        serde_json::from_str(json).map_err(|e| LedgerError::Unavailable(e.to_string()))
    }

    /// Serialize the ledger to pretty JSON.
    pub fn to_json(&self) -> Result<String, LedgerError> {
        serde_json::to_string_pretty(self).map_err(|e| LedgerError::Unavailable(e.to_string()))
    }

    pub fn add_compensation(&mut self, issuance: CompensationIssuance) -> &mut Self {
        self.issuances.push(Issuance::Compensation(issuance));
        self
    }

    pub fn add_reimbursement(&mut self, issuance: ReimbursementIssuance) -> &mut Self {
        self.issuances.push(Issuance::Reimbursement(issuance));
        self
    }

    pub fn add_genesis_output(&mut self, output: GenesisOutput) -> &mut Self {
        self.issuances.push(Issuance::GenesisOutput(output));
        self
    }

    pub fn add_proof_of_burn(&mut self, tx: ProofOfBurnTx) -> &mut Self {
        self.proof_of_burn_txs.push(tx);
        self
    }

    /// Replace the cycle list with uniform cycles of `length` blocks from
    /// genesis up to at least `tip`.
    pub fn with_uniform_cycles(&mut self, length: u64, tip: u64) -> &mut Self {
        self.cycles = cycle::uniform_cycles(self.genesis_height, length, tip);
        self
    }

    pub fn set_estimated_btc_fees_param(&mut self, from_height: u64, value: i64) -> &mut Self {
        self.estimated_btc_fees_param.insert(from_height, value);
        self
    }

    pub fn set_legacy_burning_man_address(&mut self, from_height: u64, address: impl Into<String>) -> &mut Self {
        self.legacy_burning_man_address.insert(from_height, address.into());
        self
    }
}

/// Value in force at `height` for a parameter changed at the map's keys.
fn value_at<T: Clone>(changes: &BTreeMap<u64, T>, height: u64) -> Option<T> {
    changes.range(..=height).next_back().map(|(_, v)| v.clone())
}

impl LedgerView for MemoryLedger {
    fn genesis_height(&self) -> Result<u64, LedgerError> {
        Ok(self.genesis_height)
    }

    fn issuances(&self, height: u64) -> Result<Vec<Issuance>, LedgerError> {
        Ok(self
            .issuances
            .iter()
            .filter(|i| i.height() <= height)
            .cloned()
            .collect())
    }

    fn proof_of_burn_txs(&self, height: u64) -> Result<Vec<ProofOfBurnTx>, LedgerError> {
        Ok(self
            .proof_of_burn_txs
            .iter()
            .filter(|tx| tx.height <= height)
            .cloned()
            .collect())
    }

    fn cycles(&self) -> Result<Vec<Cycle>, LedgerError> {
        let mut cycles = self.cycles.clone();
        cycles.sort_by_key(|c| c.first_block);
        Ok(cycles)
    }

    fn block_time(&self, height: u64) -> Result<u64, LedgerError> {
        if let Some(time) = self.block_times.get(&height) {
            return Ok(*time);
        }
        if height < self.genesis_height {
            return Err(LedgerError::MissingBlock(height));
        }
        Ok(self.genesis_time + (height - self.genesis_height) * ASSUMED_BLOCK_SPACING_SECS)
    }

    fn estimated_btc_fees_param(&self, height: u64) -> Result<i64, LedgerError> {
        Ok(value_at(&self.estimated_btc_fees_param, height).unwrap_or(ESTIMATED_FEES_PARAM_SENTINEL))
    }

    fn legacy_burning_man_address(&self, height: u64) -> Result<String, LedgerError> {
        value_at(&self.legacy_burning_man_address, height)
            .ok_or_else(|| LedgerError::Unavailable(format!("no legacy burningman address at height {height}")))
    }
}
