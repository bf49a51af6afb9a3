//! The vault state machine.
//!
//! [`Vault`] owns the account table and implements the two state-changing
//! operations, `deposit` and `withdraw`. Each operation is a single atomic
//! unit per account: it either commits fully (table updated, funds moved,
//! event emitted) or fails with no visible change.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tracing::debug;

use crate::clock::Clock;
use crate::notify::{Notifier, VaultEvent};
use crate::rail::{FundingRail, RailError};

pub type AccountId = String;
pub type Amount = u64;

/// Lock applied to an account on every deposit: two years, at 365.25 days
/// per year, in seconds.
pub const LOCK_DURATION: u64 = 63_072_000;

#[derive(Debug, thiserror::Error)]
pub enum VaultError {
    /// Deposits of zero are meaningless and rejected up front.
    #[error("you can only deposit non-zero amounts")]
    InvalidAmount,

    /// Withdrawal attempted before the account's lock matured.
    #[error("account {account} is locked until {maturity}, now is {now}")]
    Locked {
        account: AccountId,
        maturity: u64,
        now: u64,
    },

    /// Withdrawal attempted with no active deposit: the account was never
    /// funded, or was already withdrawn.
    #[error("no funds were ever deposited for account {account}")]
    NoFunds { account: AccountId },

    /// The value-transfer step refused to move funds. No vault state was
    /// committed.
    #[error("funding rail failure: {0}")]
    Rail(#[from] RailError),
}

/// Per-account custody state.
///
/// `maturity` is the timestamp before which withdrawal is forbidden; zero
/// means "no active deposit". Outside a call, `balance == 0` exactly when
/// `maturity == 0`; the canonical empty state is an absent table entry.
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct AccountRecord {
    pub balance: Amount,
    pub maturity: u64,
}

/// Point-in-time copy of the account table with a content digest.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct VaultSnapshot {
    pub accounts: BTreeMap<AccountId, AccountRecord>,
    pub digest: [u8; 32],
}

/// The custody ledger: account table plus the deposit/withdraw rules.
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Vault {
    accounts: BTreeMap<AccountId, AccountRecord>,
}

impl Vault {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current balance in custody for `account`; zero when absent.
    pub fn balance_of(&self, account: &AccountId) -> Amount {
        self.accounts
            .get(account)
            .map(|record| record.balance)
            .unwrap_or(0)
    }

    /// Current maturity timestamp for `account`; zero when there is no
    /// active deposit.
    pub fn maturity_of(&self, account: &AccountId) -> u64 {
        self.accounts
            .get(account)
            .map(|record| record.maturity)
            .unwrap_or(0)
    }

    /// Credit `amount` to `account` and re-arm its lock.
    ///
    /// The maturity is always overwritten with `now + LOCK_DURATION`: every
    /// new deposit commits the whole balance to a fresh full lock, even when
    /// the previous lock had nearly expired. Returns the new maturity.
    pub fn deposit(
        &mut self,
        account: &AccountId,
        amount: Amount,
        clock: &dyn Clock,
        rail: &mut dyn FundingRail,
        notifier: &mut dyn Notifier,
    ) -> Result<u64, VaultError> {
        if amount == 0 {
            return Err(VaultError::InvalidAmount);
        }

        rail.collect(account, amount)?;

        let now = clock.now();
        let record = self.accounts.entry(account.clone()).or_default();
        record.balance += amount;
        record.maturity = now + LOCK_DURATION;
        let new_maturity = record.maturity;

        debug!(%account, amount, new_maturity, "deposit credited");
        notifier.notify(&VaultEvent::Deposit {
            account: account.clone(),
            amount,
            new_maturity,
        });
        Ok(new_maturity)
    }

    /// Release the entire balance of `account` and clear its record.
    ///
    /// Fails with [`VaultError::Locked`] strictly before maturity and with
    /// [`VaultError::NoFunds`] when there is no active deposit; both leave
    /// the table untouched.
    pub fn withdraw(
        &mut self,
        account: &AccountId,
        clock: &dyn Clock,
        rail: &mut dyn FundingRail,
        notifier: &mut dyn Notifier,
    ) -> Result<Amount, VaultError> {
        let now = clock.now();
        let record = self.accounts.get(account).cloned().unwrap_or_default();

        // Lock check first: a funded account in its lock window reports
        // Locked, and only a maturity of zero means "nothing to withdraw".
        if record.maturity != 0 && now < record.maturity {
            return Err(VaultError::Locked {
                account: account.clone(),
                maturity: record.maturity,
                now,
            });
        }
        if record.maturity == 0 {
            return Err(VaultError::NoFunds {
                account: account.clone(),
            });
        }

        let amount = record.balance;

        // Clear the record before handing funds to the rail so no re-entrant
        // caller can observe a stale balance and withdraw twice.
        self.accounts.remove(account);
        if let Err(err) = rail.release(account, amount) {
            // The rail moved nothing; reinstate the record verbatim.
            self.accounts.insert(account.clone(), record);
            return Err(err.into());
        }

        debug!(%account, amount, "withdrawal released");
        notifier.notify(&VaultEvent::Withdraw {
            account: account.clone(),
            amount_released: amount,
        });
        Ok(amount)
    }

    /// Copy the account table and fingerprint its contents.
    pub fn snapshot(&self) -> VaultSnapshot {
        VaultSnapshot {
            accounts: self.accounts.clone(),
            digest: account_table_digest(&self.accounts),
        }
    }
}

/// SHA-256 pairwise fold over the sorted account entries. Deterministic for
/// equal tables, sensitive to any record change.
fn account_table_digest(accounts: &BTreeMap<AccountId, AccountRecord>) -> [u8; 32] {
    let mut layer: Vec<[u8; 32]> = accounts
        .iter()
        .map(|(account, record)| {
            let mut hasher = Sha256::new();
            hasher.update(b"vault-acct");
            hasher.update(account.as_bytes());
            hasher.update(record.balance.to_le_bytes());
            hasher.update(record.maturity.to_le_bytes());
            hasher.finalize().into()
        })
        .collect();

    if layer.is_empty() {
        return Sha256::digest(b"vault-empty").into();
    }
    while layer.len() > 1 {
        layer = layer
            .chunks(2)
            .map(|pair| {
                let mut hasher = Sha256::new();
                hasher.update(b"vault-node");
                hasher.update(pair[0]);
                // Odd tail pairs with itself.
                hasher.update(pair.get(1).unwrap_or(&pair[0]));
                hasher.finalize().into()
            })
            .collect();
    }
    layer[0]
}
