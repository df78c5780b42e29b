//! Shared ledger fixtures for E2E and determinism tests.

use burnman_core::ledger::MemoryLedger;
use burnman_core::proof_of_burn;
use burnman_core::types::{CompensationIssuance, GenesisOutput, ProofOfBurnTx, ReimbursementIssuance};

/// Genesis height of the fixture ledgers, above the mainnet snapshot minimum.
pub const GENESIS_HEIGHT: u64 = 800_000;

/// Cycle length of the fixture ledgers. The first cycle alone covers every
/// height the tests use, so one cycle of estimated fees applies.
pub const CYCLE_LENGTH: u64 = 20_000;

pub const LEGACY_ADDRESS: &str = "legacy-burningman";

/// Empty ledger with uniform cycles and the legacy address set.
pub fn empty_ledger() -> MemoryLedger {
    let mut ledger = MemoryLedger::new(GENESIS_HEIGHT);
    ledger
        .with_uniform_cycles(CYCLE_LENGTH, GENESIS_HEIGHT + 10 * CYCLE_LENGTH)
        .set_legacy_burning_man_address(0, LEGACY_ADDRESS);
    ledger
}

/// Compensation issuance paying `name` at its explicit receiver address.
pub fn compensation(txid: &str, name: &str, height: u64, amount: i64, address: &str) -> CompensationIssuance {
    CompensationIssuance {
        txid: txid.into(),
        height,
        amount,
        name: name.into(),
        burning_man_receiver_address: Some(address.into()),
        tx_output_addresses: vec![],
    }
}

/// Proof-of-burn tx committing to `name`.
pub fn burn(txid: &str, name: &str, height: u64, amount: i64) -> ProofOfBurnTx {
    ProofOfBurnTx {
        txid: txid.into(),
        height,
        burned_amount: amount,
        op_return_data: proof_of_burn::op_return_data(name.as_bytes()),
        time: 0,
    }
}

pub fn reimbursement(txid: &str, height: u64, amount: i64) -> ReimbursementIssuance {
    ReimbursementIssuance {
        txid: txid.into(),
        height,
        amount,
    }
}

pub fn genesis_output(index: u32, amount: i64, address: &str) -> GenesisOutput {
    GenesisOutput {
        txid: "genesis".into(),
        index,
        height: GENESIS_HEIGHT,
        amount,
        address: address.into(),
    }
}

/// Name of the `i`-th contributor; names sort in index order.
pub fn contributor(i: usize) -> String {
    format!("contributor-{i:02}")
}

pub fn contributor_address(i: usize) -> String {
    format!("addr-{i:02}")
}

/// `n` contributors with equal compensation issued at `GENESIS_HEIGHT + 1_000`.
pub fn equal_contributors(n: usize, amount: i64) -> MemoryLedger {
    let mut ledger = empty_ledger();
    for i in 0..n {
        ledger.add_compensation(compensation(
            &format!("comp-{i:02}"),
            &contributor(i),
            GENESIS_HEIGHT + 1_000,
            amount,
            &contributor_address(i),
        ));
    }
    ledger
}
