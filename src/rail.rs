//! Value-transfer boundary.
//!
//! The vault never moves value itself; it decides whether and how much to
//! move, and hands the movement to a [`FundingRail`]. Both directions are
//! fallible. The vault commits its own state change only when the rail call
//! succeeds, so a rail that fails must not have moved anything either.

use thiserror::Error;

use crate::vault::{AccountId, Amount};

/// Reasons the external value-transfer step can refuse to move funds.
#[derive(Debug, Error)]
pub enum RailError {
    /// The counterpart rejected the transfer (insufficient external balance,
    /// closed account, policy refusal).
    #[error("transfer rejected: {0}")]
    Rejected(String),

    /// The rail itself could not be reached.
    #[error("rail unavailable: {0}")]
    Unavailable(String),
}

/// Mechanism that moves value into and out of custody.
pub trait FundingRail {
    /// Pull `amount` from `account` into custody.
    fn collect(&mut self, account: &AccountId, amount: Amount) -> Result<(), RailError>;

    /// Push `amount` out of custody back to `account`.
    fn release(&mut self, account: &AccountId, amount: Amount) -> Result<(), RailError>;
}
