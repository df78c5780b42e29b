//! Ledger data model consumed by the accounting engine.
//!
//! All monetary values are signed satoshi amounts (`i64`) so that derived
//! figures such as the burn target can go negative. Heights are `u64`.
//! Transaction ids are lowercase hex strings, which also gives the total
//! order used to sort records.

use serde::{Deserialize, Serialize};

use crate::proof_of_burn;

/// A governance-approved compensation request issuance.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct CompensationIssuance {
    /// Txid of the compensation request (also the issuance txid).
    pub txid: String,
    /// Height at which the issuance happened.
    pub height: u64,
    /// Issued BSQ amount.
    pub amount: i64,
    /// Contributor name from the proposal. Doubles as burn pre-image.
    pub name: String,
    /// Explicit BTC receiver address set in the proposal, if any.
    #[serde(default)]
    pub burning_man_receiver_address: Option<String>,
    /// Addresses of the request tx outputs, by output index.
    #[serde(default)]
    pub tx_output_addresses: Vec<String>,
}

impl CompensationIssuance {
    /// The BTC address fee revenue is paid to.
    ///
    /// Uses the explicit receiver address if set. Otherwise the address is
    /// taken positionally: a request tx has 4 outputs if it has BTC change
    /// (change at index 2), else 3 outputs and the contributor's output at
    /// index 1 is used.
    pub fn receiver_address(&self) -> Option<&str> {
        if let Some(address) = &self.burning_man_receiver_address {
            return Some(address.as_str());
        }
        let index = if self.tx_output_addresses.len() == 4 { 2 } else { 1 };
        self.tx_output_addresses.get(index).map(String::as_str)
    }
}

/// A reimbursement issuance. Counts towards the burn target only.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct ReimbursementIssuance {
    pub txid: String,
    pub height: u64,
    pub amount: i64,
}

/// One output of the genesis transaction.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct GenesisOutput {
    pub txid: String,
    pub index: u32,
    pub height: u64,
    pub amount: i64,
    pub address: String,
}

/// Issued BSQ, by kind.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Issuance {
    Compensation(CompensationIssuance),
    Reimbursement(ReimbursementIssuance),
    GenesisOutput(GenesisOutput),
}

impl Issuance {
    pub fn height(&self) -> u64 {
        match self {
            Self::Compensation(c) => c.height,
            Self::Reimbursement(r) => r.height,
            Self::GenesisOutput(g) => g.height,
        }
    }

    pub fn txid(&self) -> &str {
        match self {
            Self::Compensation(c) => &c.txid,
            Self::Reimbursement(r) => &r.txid,
            Self::GenesisOutput(g) => &g.txid,
        }
    }

    pub fn amount(&self) -> i64 {
        match self {
            Self::Compensation(c) => c.amount,
            Self::Reimbursement(r) => r.amount,
            Self::GenesisOutput(g) => g.amount,
        }
    }
}

/// A proof-of-burn transaction.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct ProofOfBurnTx {
    pub txid: String,
    pub height: u64,
    /// BSQ destroyed by this transaction.
    pub burned_amount: i64,
    /// Data of the OP_RETURN output (last output of the tx).
    #[serde(with = "hex")]
    pub op_return_data: Vec<u8>,
    /// Block time in Unix seconds.
    pub time: u64,
}

impl ProofOfBurnTx {
    /// OP_RETURN data as lowercase hex, as compared against legacy markers.
    pub fn op_return_hex(&self) -> String {
        hex::encode(&self.op_return_data)
    }

    /// The pre-image hash committed to by this burn, if well formed.
    pub fn pre_image_hash(&self) -> Option<[u8; 20]> {
        proof_of_burn::hash_from_op_return_data(&self.op_return_data)
    }
}

/// A governance cycle spanning `[first_block, last_block]`.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Cycle {
    /// Zero-based position of the cycle since genesis.
    pub index: u32,
    pub first_block: u64,
    pub last_block: u64,
}

impl Cycle {
    pub fn contains(&self, height: u64) -> bool {
        (self.first_block..=self.last_block).contains(&height)
    }
}
