//! Custodial two-year time-lock vault.
//!
//! Deposits credit an account inside the vault and arm a lock that restarts
//! in full with every deposit. Withdrawal is all-or-nothing: once the lock
//! has matured the vault releases the account's entire balance and clears the
//! record. Funds never leave custody before maturity.
//!
//! The crate exposes three collaborator seams so the state machine can be
//! driven deterministically and embedded in different environments:
//!
//! * [`clock`] — read-only time oracle; the vault consults it but never
//!   advances time itself.
//! * [`rail`] — the value-transfer mechanism that actually moves funds into
//!   and out of custody. Both directions are fallible, and a failed transfer
//!   commits no vault state.
//! * [`notify`] — fire-and-forget delivery of deposit and withdrawal events,
//!   always after the state change they describe.
//!
//! The modules are intentionally small and focused so that embedders (the
//! bundled CLI, services, test harnesses) can combine them without bespoke
//! plumbing in each consumer.

pub mod clock;
pub mod notify;
pub mod rail;
pub mod vault;

pub use clock::{Clock, ManualClock, SystemClock};
pub use notify::{Notifier, NullNotifier, RecordingNotifier, VaultEvent};
pub use rail::{FundingRail, RailError};
pub use vault::{AccountId, AccountRecord, Amount, Vault, VaultError, VaultSnapshot, LOCK_DURATION};
