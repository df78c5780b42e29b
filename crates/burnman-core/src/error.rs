//! Error types for burningman accounting.
use thiserror::Error;

/// Violated preconditions of the decay function. These indicate a caller
/// bug and must not be retried or clamped.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DecayError {
    #[error("amount must not be negative: {0}")] NegativeAmount(i64),
    #[error("{name} must not be negative: {height}")] NegativeHeight { name: &'static str, height: i64 },
    #[error("event height {event} must not be larger than current height {current}")] EventAfterCurrent { event: i64, current: i64 },
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LedgerError {
    #[error("no block at height {0}")] MissingBlock(u64),
    #[error("ledger unavailable: {0}")] Unavailable(String),
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ReceiverError {
    #[error("selection height {height} is below the minimum {minimum}")] SelectionHeightBelowMinimum { height: u64, minimum: u64 },
    #[error("negative input amount: {0}")] NegativeInputAmount(i64),
}

#[derive(Error, Debug)]
pub enum BurnmanError {
    #[error(transparent)] Decay(#[from] DecayError),
    #[error(transparent)] Ledger(#[from] LedgerError),
    #[error(transparent)] Receiver(#[from] ReceiverError),
}
