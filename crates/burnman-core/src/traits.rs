//! Trait interfaces between the ledger layer and the accounting engine.
//!
//! - [`LedgerView`]: read-only, height-filtered access to parsed DAO state
//!   (implemented by the ledger layer; [`MemoryLedger`](crate::ledger::MemoryLedger)
//!   for tests and offline use)
//! - [`DecayCalculator`]: age weighting of amounts (burnman-decay implements)

use crate::cycle;
use crate::error::{DecayError, LedgerError};
use crate::types::{Cycle, Issuance, ProofOfBurnTx};

/// Read-only view of the parsed ledger.
///
/// The ledger is append-only, so any answer for a height at or below the
/// parsed tip never changes. The engine only ever asks for data as of a
/// given height and never caches across heights itself.
pub trait LedgerView: Send + Sync {
    /// Height of the genesis block.
    fn genesis_height(&self) -> Result<u64, LedgerError>;

    /// All issuances (compensation, reimbursement, genesis outputs) at or
    /// below `height`.
    fn issuances(&self, height: u64) -> Result<Vec<Issuance>, LedgerError>;

    /// All proof-of-burn transactions at or below `height`.
    fn proof_of_burn_txs(&self, height: u64) -> Result<Vec<ProofOfBurnTx>, LedgerError>;

    /// All governance cycles known to the ledger, ascending.
    fn cycles(&self) -> Result<Vec<Cycle>, LedgerError>;

    /// Block time (Unix seconds) of the block at `height`.
    fn block_time(&self, height: u64) -> Result<u64, LedgerError>;

    /// Raw value of the governance parameter carrying the estimated BTC trade
    /// fee revenue per cycle, as in force at `height`.
    fn estimated_btc_fees_param(&self, height: u64) -> Result<i64, LedgerError>;

    /// Address of the legacy burningman, as in force at `height`.
    fn legacy_burning_man_address(&self, height: u64) -> Result<String, LedgerError>;

    /// Cycle containing `height`, if any.
    ///
    /// Default implementation searches [`cycles`](Self::cycles).
    fn cycle_at(&self, height: u64) -> Result<Option<Cycle>, LedgerError> {
        Ok(cycle::cycle_at(&self.cycles()?, height).copied())
    }
}

/// Age weighting of contribution and burn amounts.
///
/// Implementations must be pure: the same inputs give the same output on
/// every peer.
pub trait DecayCalculator: Send + Sync {
    /// Compensation `amount` issued at `issuance_height`, as seen from
    /// `chain_height`.
    fn decayed_compensation_amount(
        &self,
        amount: i64,
        issuance_height: u64,
        chain_height: u64,
    ) -> Result<i64, DecayError>;

    /// `amount` burned at `burn_height`, as seen from `chain_height`.
    fn decayed_burned_amount(&self, amount: i64, burn_height: u64, chain_height: u64) -> Result<i64, DecayError>;

    /// Weighted value of a genesis output. Independent of height.
    fn decayed_genesis_output_amount(&self, amount: i64) -> i64;
}
