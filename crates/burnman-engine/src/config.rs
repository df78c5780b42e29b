//! Engine configuration and receiver list agreement flags.
//!
//! Provides [`EngineConfig`] with presets per network, and [`ReceiverFlag`],
//! the date-activated behaviour switches both trade peers must apply alike.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use burnman_core::constants::{NetworkType, SNAPSHOT_GRID};

/// Configuration for a [`BurningManService`](crate::service::BurningManService).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Network whose accounting values apply.
    pub network: NetworkType,
    /// Grid the selection height is rounded to.
    pub snapshot_grid: u64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self::mainnet()
    }
}

impl EngineConfig {
    pub fn mainnet() -> Self {
        Self::for_network(NetworkType::Mainnet)
    }

    pub fn testnet() -> Self {
        Self::for_network(NetworkType::Testnet)
    }

    pub fn regtest() -> Self {
        Self::for_network(NetworkType::Regtest)
    }

    pub fn for_network(network: NetworkType) -> Self {
        Self {
            network,
            snapshot_grid: SNAPSHOT_GRID,
        }
    }

    /// Amount added to the burn target before deriving burn allowances.
    pub fn burn_target_boost_amount(&self) -> i64 {
        self.network.burn_target_boost_amount()
    }

    /// Lowest selection height a receiver list may be built for.
    pub fn min_snapshot_height(&self) -> u64 {
        self.network.min_snapshot_height()
    }
}

/// Behaviour switches for the delayed payout receiver list.
///
/// A flag changes the list, so both peers must agree on it. Flags are
/// activated by date: once the activation time has passed, every updated
/// peer applies it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ReceiverFlag {
    /// Drop candidates with zero effective burn share or without a receiver
    /// address before the number of outputs for the miner fee is fixed.
    ExcludeDormantCandidates,
}

impl ReceiverFlag {
    /// Every known flag.
    pub const ALL: [ReceiverFlag; 1] = [ReceiverFlag::ExcludeDormantCandidates];

    /// Activation time as Unix seconds (UTC).
    ///
    /// These dates are deployment parameters, not derived from ledger
    /// history. Both trade peers must run releases carrying the same
    /// activation date, or their receiver lists differ once it passes.
    pub const fn activation_timestamp(&self) -> i64 {
        match self {
            // 2024-01-01T00:00:00Z
            Self::ExcludeDormantCandidates => 1_704_067_200,
        }
    }

    /// Activation time as a UTC date time.
    pub fn activation_time(&self) -> DateTime<Utc> {
        DateTime::from_timestamp(self.activation_timestamp(), 0).unwrap_or_default()
    }

    pub fn is_activated_at(&self, now: DateTime<Utc>) -> bool {
        now >= self.activation_time()
    }

    /// Flags in force at `now`, in a stable order.
    pub fn activated_at(now: DateTime<Utc>) -> Vec<ReceiverFlag> {
        Self::ALL
            .into_iter()
            .filter(|flag| flag.is_activated_at(now))
            .collect()
    }

    /// Flags in force at the current wall clock time.
    pub fn activated_now() -> Vec<ReceiverFlag> {
        Self::activated_at(Utc::now())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn default_is_mainnet() {
        let cfg = EngineConfig::default();
        assert_eq!(cfg.network, NetworkType::Mainnet);
        assert_eq!(cfg.snapshot_grid, 10);
        assert_eq!(cfg.burn_target_boost_amount(), 10_000_000);
        assert_eq!(cfg.min_snapshot_height(), 767_950);
    }

    #[test]
    fn regtest_preset() {
        let cfg = EngineConfig::regtest();
        assert_eq!(cfg.burn_target_boost_amount(), 1_000_000);
        assert_eq!(cfg.min_snapshot_height(), 0);
    }

    #[test]
    fn testnet_uses_production_values() {
        let cfg = EngineConfig::testnet();
        assert_eq!(cfg.burn_target_boost_amount(), EngineConfig::mainnet().burn_target_boost_amount());
    }

    #[test]
    fn flag_activation_by_date() {
        let before = Utc.with_ymd_and_hms(2023, 12, 31, 23, 59, 59).unwrap();
        let at = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        assert!(ReceiverFlag::activated_at(before).is_empty());
        assert_eq!(ReceiverFlag::activated_at(at), vec![ReceiverFlag::ExcludeDormantCandidates]);
    }

    #[test]
    fn flag_serde_kebab_case() {
        let json = serde_json::to_string(&ReceiverFlag::ExcludeDormantCandidates).unwrap();
        assert_eq!(json, "\"exclude-dormant-candidates\"");
    }
}
