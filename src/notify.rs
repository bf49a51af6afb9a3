//! Event delivery.
//!
//! Every successful state change produces exactly one [`VaultEvent`], handed
//! to the configured [`Notifier`] after the change has been committed.
//! Delivery is fire-and-forget: the vault does not look at what the notifier
//! does with the event.

use serde::{Deserialize, Serialize};

use crate::vault::{AccountId, Amount};

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum VaultEvent {
    Deposit {
        account: AccountId,
        amount: Amount,
        new_maturity: u64,
    },
    Withdraw {
        account: AccountId,
        amount_released: Amount,
    },
}

pub trait Notifier {
    fn notify(&mut self, event: &VaultEvent);
}

/// Drops every event.
#[derive(Clone, Copy, Debug, Default)]
pub struct NullNotifier;

impl Notifier for NullNotifier {
    fn notify(&mut self, _event: &VaultEvent) {}
}

/// Buffers events in memory, in delivery order.
#[derive(Debug, Default)]
pub struct RecordingNotifier {
    pub events: Vec<VaultEvent>,
}

impl Notifier for RecordingNotifier {
    fn notify(&mut self, event: &VaultEvent) {
        self.events.push(event.clone());
    }
}
