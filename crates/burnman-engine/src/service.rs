//! Burningman service: the entry point driven by block notifications.

use std::sync::Arc;

use rand::Rng;
use tracing::{debug, info};

use burnman_core::error::{BurnmanError, ReceiverError};
use burnman_core::traits::{DecayCalculator, LedgerView};
use burnman_decay::DecayEngine;

use crate::config::{EngineConfig, ReceiverFlag};
use crate::lottery;
use crate::receivers::{self, Receiver};
use crate::snapshot::{Snapshot, SnapshotCache};

/// Answers burningman queries against a ledger.
///
/// Snapshots are computed lazily. Those of the current and the selection
/// height are cached until the next block notification. Safe to share across
/// threads.
pub struct BurningManService {
    ledger: Arc<dyn LedgerView>,
    decay: Arc<dyn DecayCalculator>,
    config: EngineConfig,
    cache: SnapshotCache,
}

impl BurningManService {
    /// Service using the standard [`DecayEngine`].
    pub fn new(ledger: Arc<dyn LedgerView>, config: EngineConfig) -> Self {
        Self::with_decay(ledger, Arc::new(DecayEngine::new()), config)
    }

    pub fn with_decay(ledger: Arc<dyn LedgerView>, decay: Arc<dyn DecayCalculator>, config: EngineConfig) -> Self {
        Self {
            ledger,
            decay,
            config,
            cache: SnapshotCache::new(),
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// The ledger finished parsing the block at `height`.
    pub fn on_parse_block_complete(&self, height: u64) {
        info!(height, "burningman: block parsed");
        self.cache.advance(height);
    }

    /// Height of the last parsed block.
    pub fn current_height(&self) -> u64 {
        self.cache.chain_height()
    }

    /// Snapshot as of `height`.
    ///
    /// Only the current and the selection height are cached; any other
    /// height is computed on every call.
    ///
    /// # Errors
    ///
    /// Ledger failures and decay precondition violations.
    pub fn snapshot(&self, height: u64) -> Result<Arc<Snapshot>, BurnmanError> {
        let compute = || {
            debug!(height, "burningman: computing snapshot");
            Snapshot::compute(self.ledger.as_ref(), self.decay.as_ref(), self.config.network, height)
        };
        if self.is_cached_height(height)? {
            self.cache.get_or_compute(height, compute)
        } else {
            compute().map(Arc::new)
        }
    }

    fn is_cached_height(&self, height: u64) -> Result<bool, BurnmanError> {
        Ok(height == self.current_height() || height == self.burning_man_selection_height()?)
    }

    pub fn current_snapshot(&self) -> Result<Arc<Snapshot>, BurnmanError> {
        self.snapshot(self.current_height())
    }

    /// Height both trade peers build the receiver list for.
    pub fn burning_man_selection_height(&self) -> Result<u64, BurnmanError> {
        Ok(receivers::selection_height(
            self.ledger.genesis_height()?,
            self.current_height(),
            self.config.snapshot_grid,
            self.config.min_snapshot_height(),
        ))
    }

    /// Receiver list of the delayed payout tx.
    ///
    /// # Errors
    ///
    /// [`ReceiverError::SelectionHeightBelowMinimum`] if the peer proposed a
    /// height below the network minimum, plus the errors of
    /// [`snapshot`](Self::snapshot) and
    /// [`receivers::delayed_payout_receivers`].
    pub fn delayed_payout_receivers(
        &self,
        selection_height: u64,
        input_amount: i64,
        trade_tx_fee: i64,
        flags: &[ReceiverFlag],
    ) -> Result<Vec<Receiver>, BurnmanError> {
        let minimum = self.config.min_snapshot_height();
        if selection_height < minimum {
            return Err(ReceiverError::SelectionHeightBelowMinimum {
                height: selection_height,
                minimum,
            }
            .into());
        }
        let snapshot = self.snapshot(selection_height)?;
        Ok(receivers::delayed_payout_receivers(
            &snapshot.candidate_list(),
            snapshot.legacy_address(),
            input_amount,
            trade_tx_fee,
            flags,
        )?)
    }

    /// Address the BTC trade fee of a new offer goes to.
    pub fn fee_receiver_address(&self) -> Result<String, BurnmanError> {
        self.fee_receiver_address_with(&mut rand::thread_rng())
    }

    /// [`fee_receiver_address`](Self::fee_receiver_address) drawing from `rng`.
    pub fn fee_receiver_address_with<R: Rng + ?Sized>(&self, rng: &mut R) -> Result<String, BurnmanError> {
        let snapshot = self.current_snapshot()?;
        let address = lottery::fee_receiver_address(&snapshot.candidate_list(), snapshot.legacy_address(), rng);
        Ok(address.to_string())
    }

    pub fn burn_target(&self, height: u64) -> Result<i64, BurnmanError> {
        Ok(self.snapshot(height)?.burn_target())
    }

    /// Suggested `(lower, upper)` burn amount for `name` at the current height.
    pub fn candidate_burn_target_range(&self, name: &str) -> Result<Option<(i64, i64)>, BurnmanError> {
        Ok(self.current_snapshot()?.candidate_burn_target_range(name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    use rand::SeedableRng;
    use rand::rngs::StdRng;

    use burnman_core::ledger::MemoryLedger;
    use burnman_core::proof_of_burn;
    use burnman_core::types::{CompensationIssuance, ProofOfBurnTx};

    fn ledger() -> MemoryLedger {
        let mut l = MemoryLedger::new(100);
        l.with_uniform_cycles(100, 2_000).set_legacy_burning_man_address(0, "legacy");
        // ten equal contributors keep every output below the 13.2% cap
        for i in 0..10 {
            let name = format!("bm{i}");
            l.add_compensation(CompensationIssuance {
                txid: format!("c{i}"),
                height: 110,
                amount: 100_000,
                name: name.clone(),
                burning_man_receiver_address: Some(format!("addr-{name}")),
                tx_output_addresses: vec![],
            })
            .add_proof_of_burn(ProofOfBurnTx {
                txid: format!("b{i}"),
                height: 120,
                burned_amount: 1_000_000,
                op_return_data: proof_of_burn::op_return_data(name.as_bytes()),
                time: 0,
            });
        }
        l
    }

    fn service() -> BurningManService {
        let service = BurningManService::new(Arc::new(ledger()), EngineConfig::regtest());
        service.on_parse_block_complete(1_000);
        service
    }

    #[test]
    fn selection_height_on_grid() {
        let s = service();
        assert_eq!(s.current_height(), 1_000);
        assert_eq!(s.burning_man_selection_height().unwrap(), 990);
        s.on_parse_block_complete(1_009);
        assert_eq!(s.burning_man_selection_height().unwrap(), 990);
        s.on_parse_block_complete(1_010);
        assert_eq!(s.burning_man_selection_height().unwrap(), 1_000);
    }

    #[test]
    fn receivers_split_between_candidates() {
        let s = service();
        let height = s.burning_man_selection_height().unwrap();
        let receivers = s.delayed_payout_receivers(height, 1_000_000, 5_000, &[]).unwrap();
        // fee rate 18 sat/vB, 10 outputs: 6_678 sat fee
        let spendable = 1_000_000 - 6_678;
        assert_eq!(receivers.len(), 10);
        assert!(receivers.iter().all(|r| r.amount == receivers[0].amount));
        assert!(receivers.iter().map(|r| r.amount).sum::<i64>() <= spendable);
        assert_eq!(receivers[0].address, "addr-bm0");
        assert_eq!(receivers[9].address, "addr-bm9");
    }

    #[test]
    fn selection_height_below_minimum_rejected() {
        let s = BurningManService::new(Arc::new(ledger()), EngineConfig::mainnet());
        let err = s.delayed_payout_receivers(990, 1_000_000, 5_000, &[]).unwrap_err();
        assert!(matches!(
            err,
            BurnmanError::Receiver(ReceiverError::SelectionHeightBelowMinimum { height: 990, .. })
        ));
    }

    #[test]
    fn fee_receiver_is_a_candidate() {
        let s = service();
        let mut rng = StdRng::seed_from_u64(3);
        for _ in 0..20 {
            let address = s.fee_receiver_address_with(&mut rng).unwrap();
            assert!(address.starts_with("addr-bm"), "{address}");
        }
    }

    #[test]
    fn snapshots_cached_until_next_block() {
        let s = service();
        let a = s.current_snapshot().unwrap();
        let b = s.snapshot(1_000).unwrap();
        assert!(Arc::ptr_eq(&a, &b));
        s.on_parse_block_complete(1_001);
        let c = s.snapshot(1_000).unwrap();
        assert!(!Arc::ptr_eq(&a, &c));
        assert_eq!(a.burn_target(), c.burn_target());
    }

    #[test]
    fn historical_heights_not_cached() {
        let s = service();
        s.current_snapshot().unwrap();
        s.snapshot(990).unwrap();
        assert_eq!(s.cache.len(), 2);

        for height in 900..950 {
            s.burn_target(height).unwrap();
        }
        assert_eq!(s.cache.len(), 2);

        let a = s.snapshot(950).unwrap();
        let b = s.snapshot(950).unwrap();
        assert!(!Arc::ptr_eq(&a, &b));
        assert_eq!(a.burn_target(), b.burn_target());
    }

    #[test]
    fn burn_target_and_range() {
        let s = service();
        assert_eq!(s.burn_target(1_000).unwrap(), s.current_snapshot().unwrap().burn_target());
        assert!(s.candidate_burn_target_range("bm0").unwrap().is_some());
        assert!(s.candidate_burn_target_range("carol").unwrap().is_none());
    }

    #[test]
    fn concurrent_readers_agree() {
        let s = Arc::new(service());
        let height = s.burning_man_selection_height().unwrap();
        let expected = s.delayed_payout_receivers(height, 2_000_000, 5_000, &[]).unwrap();
        let handles: Vec<_> = (0..4)
            .map(|_| {
                let s = Arc::clone(&s);
                thread::spawn(move || s.delayed_payout_receivers(height, 2_000_000, 5_000, &[]).unwrap())
            })
            .collect();
        for handle in handles {
            assert_eq!(handle.join().unwrap(), expected);
        }
    }
}
