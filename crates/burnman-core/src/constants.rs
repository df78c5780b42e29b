//! Protocol constants. All monetary values in satoshi (BSQ amounts in BSQ satoshi,
//! 100 sat = 1 BSQ; BTC amounts in BTC satoshi).
//!
//! Every value here feeds into the delayed payout receiver list, which both
//! trade peers compute independently. Changing any of them after release
//! breaks trade protocol verification against peers that did not change them.

/// Blocks per day at the 10 minute target spacing.
pub const DAY_AS_BLOCKS: u64 = 144;
/// Blocks per month. 31 day months are ignored as block time is inexact anyway.
pub const MONTH_AS_BLOCKS: u64 = 30 * DAY_AS_BLOCKS;
pub const YEAR_AS_BLOCKS: u64 = 12 * MONTH_AS_BLOCKS;

/// Decay window for compensation issuance amounts.
pub const MAX_COMP_REQUEST_AGE: u64 = 2 * YEAR_AS_BLOCKS;
/// Decay window for burned amounts.
pub const MAX_BURN_AMOUNT_AGE: u64 = YEAR_AS_BLOCKS;

/// Prefix for the synthetic names of genesis outputs, appended with the
/// output index. The resulting name is the burn pre-image of that output.
pub const GENESIS_OUTPUT_PREFIX: &str = "Bisq co-founder ";
/// Flat weighting applied to genesis output amounts instead of decay.
pub const GENESIS_OUTPUT_AMOUNT_FACTOR: f64 = 0.05;

/// Factor for boosting the issuance share. A contributor with 10% issuance
/// share can receive at most 20% of the fee revenue, however much they burned.
pub const ISSUANCE_BOOST_FACTOR: f64 = 2.0;

/// Upper bound of a single non-legacy receiver's share of a delayed payout.
pub const MAX_BURN_SHARE: f64 = 0.11;
/// Tolerance on [`MAX_BURN_SHARE`] for the dust renormalization in the
/// delayed payout receiver list.
pub const MAX_BURN_SHARE_TOLERANCE: f64 = 1.2;

/// Number of governance cycles accumulated for the burn target.
pub const NUM_CYCLES_BURN_TARGET: usize = 12;
/// Number of governance cycles averaged for the expected distribution.
pub const NUM_CYCLES_AVERAGE_DISTRIBUTION: usize = 3;

/// Fallback estimate of BTC trade fee revenue per cycle, as BSQ satoshi.
/// Roughly the average of the 12 months before Nov 2022.
pub const DEFAULT_ESTIMATED_BTC_FEES: i64 = 6_200_000;
/// The repurposed governance parameter still holding its original, unrelated
/// default (a lock time in blocks) means nobody has voted a fee estimate yet.
pub const ESTIMATED_FEES_PARAM_SENTINEL: i64 = 4320;

/// Outputs below this are not relayed by Bitcoin nodes.
pub const DUST_LIMIT: i64 = 546;

/// Minimum fee rate (sat/vbyte) for the delayed payout transaction.
pub const DPT_MIN_TX_FEE_RATE: i64 = 10;
/// Largest expected deposit tx size (vbytes) the agreed trade fee was paid for.
pub const DPT_TRADE_TX_VSIZE: f64 = 278.0;
/// Delayed payout tx weight without outputs (51 vbytes).
pub const DPT_BASE_TX_WEIGHT: i64 = 204;
/// Weight of one receiver output (32 vbytes).
pub const DPT_OUTPUT_WEIGHT: i64 = 128;
/// Size of one receiver output in vbytes. An output must be worth at least
/// twice what it costs to include.
pub const DPT_OUTPUT_VSIZE: i64 = 32;
/// Absolute floor for the delayed payout miner fee.
pub const MIN_DELAYED_PAYOUT_TX_FEE: i64 = 800;
/// Leftover above this goes to the legacy burningman, anything less is
/// spent as miner fee.
pub const DPT_MIN_REMAINDER_TO_LEGACY_BM: i64 = 25_000;

/// Grid used to round a chain height to the burningman selection height.
pub const SNAPSHOT_GRID: u64 = 10;

/// Effective shares are truncated to 0.01% steps for the fee receiver lottery.
pub const LOTTERY_SHARE_PRECISION: f64 = 10_000.0;

/// Prefix of proof-of-burn OP_RETURN data (type byte, version byte).
pub const PROOF_OF_BURN_OP_RETURN_PREFIX: [u8; 2] = [0x17, 0x01];
/// Length of the pre-image hash carried in proof-of-burn OP_RETURN data.
pub const PROOF_OF_BURN_HASH_LEN: usize = 20;

/// Historical compensation amount corrections, by issuance txid.
///
/// A conference sponsorship of 44776 BSQ was reimbursed inside a compensation
/// request; only the compensation part counts.
pub const COMPENSATION_AMOUNT_OVERRIDES: &[(&str, i64)] = &[(
    "01455fc4c88fca0665a5f56a90ff03fb9e3e88c3430ffc5217246e32d180aa64",
    119_400,
)];

/// Up to cycle 15 the refund agent filed reimbursements as compensation
/// requests. Those above 3500 BSQ are not counted as contributions.
pub const REFUND_AGENT_NAME: &str = "RefundAgent";
pub const REFUND_AGENT_LAST_MISFILED_CYCLE: u32 = 15;
pub const REFUND_AGENT_MAX_COMPENSATION: i64 = 350_000;

/// Display name of the legacy burningman receiving delayed payouts.
pub const LEGACY_BURNING_MAN_DPT_NAME: &str = "Legacy Burningman (DPT)";
/// Display name of the legacy burningman receiving BTC trade fees.
pub const LEGACY_BURNING_MAN_BTC_FEES_NAME: &str = "Legacy Burningman (BTC fees)";
pub const LEGACY_BURNING_MAN_BTC_FEES_ADDRESS: &str = "38bZBj5peYS3Husdz7AH3gEUiUbYRD951t";

/// Network type: Mainnet, Testnet, or Regtest.
///
/// Controls the burn target boost, the minimum selection height and the
/// OP_RETURN markers the legacy burningman used for its burns.
///
/// # Examples
///
/// ```
/// use burnman_core::constants::NetworkType;
/// let net = NetworkType::default();
/// assert_eq!(net, NetworkType::Mainnet);
/// assert_eq!(net.burn_target_boost_amount(), 10_000_000);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NetworkType {
    /// Production network.
    #[default]
    Mainnet,
    /// Public test network. Uses production accounting values.
    Testnet,
    /// Local regression-test network with small boosts and no height floor.
    Regtest,
}

impl NetworkType {
    /// Amount added to the burn target to give contributors room to burn.
    ///
    /// # Examples
    ///
    /// ```
    /// use burnman_core::constants::NetworkType;
    /// assert_eq!(NetworkType::Regtest.burn_target_boost_amount(), 1_000_000);
    /// ```
    pub fn burn_target_boost_amount(&self) -> i64 {
        match self {
            Self::Regtest => 1_000_000,
            _ => 10_000_000,
        }
    }

    /// Lowest chain height a burningman selection may refer to
    /// (block of Dec. 18th 2022 on mainnet).
    ///
    /// # Examples
    ///
    /// ```
    /// use burnman_core::constants::NetworkType;
    /// assert_eq!(NetworkType::Mainnet.min_snapshot_height(), 767_950);
    /// assert_eq!(NetworkType::Regtest.min_snapshot_height(), 0);
    /// ```
    pub fn min_snapshot_height(&self) -> u64 {
        match self {
            Self::Regtest => 0,
            _ => 767_950,
        }
    }

    /// Hex OP_RETURN data the legacy burningman used when burning BTC
    /// received from delayed payout transactions.
    ///
    /// On regtest the pre-image `dpt` is used.
    pub fn legacy_dpt_burn_markers(&self) -> &'static [&'static str] {
        match self {
            Self::Regtest => &["170114af04ea7e34bd7378b034ddf90da53b7c27a277"],
            _ => &[
                "1701e47e5d8030f444c182b5e243871ebbaeadb5e82f",
                "1701293c488822f98e70e047012f46f5f1647f37deb7",
            ],
        }
    }

    /// Hex OP_RETURN data the legacy burningman used when burning BTC
    /// received from trade fees.
    ///
    /// On regtest the pre-image `fee` is used.
    pub fn legacy_fee_burn_markers(&self) -> &'static [&'static str] {
        match self {
            Self::Regtest => &["1701b3253b7b92bb7f0916b05f10d4fa92be8e48f5e6"],
            _ => &["1701721206fe6b40777763de1c741f4fd2706d94775d"],
        }
    }

    /// Whether `op_return_hex` marks any legacy burningman burn.
    pub fn is_legacy_burn_marker(&self, op_return_hex: &str) -> bool {
        self.legacy_dpt_burn_markers().contains(&op_return_hex)
            || self.legacy_fee_burn_markers().contains(&op_return_hex)
    }
}

/// Look up a historical compensation amount correction for `txid`.
pub fn compensation_amount_override(txid: &str) -> Option<i64> {
    COMPENSATION_AMOUNT_OVERRIDES
        .iter()
        .find(|(id, _)| *id == txid)
        .map(|(_, amount)| *amount)
}
