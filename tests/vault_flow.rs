//! End-to-end vault flows through the public API, with a simulated external
//! balance store on the other side of the funding rail so value conservation
//! can be checked across the custody boundary.

use std::collections::BTreeMap;

use hodl_vault::{
    AccountId, Amount, Clock, FundingRail, ManualClock, RailError, RecordingNotifier, Vault,
    VaultError, VaultEvent, LOCK_DURATION,
};

/// External balances the rail debits on collect and credits on release.
#[derive(Default)]
struct ExternalBank {
    balances: BTreeMap<AccountId, Amount>,
}

impl ExternalBank {
    fn fund(&mut self, account: &str, amount: Amount) {
        *self.balances.entry(account.to_string()).or_default() += amount;
    }

    fn balance(&self, account: &str) -> Amount {
        self.balances.get(account).copied().unwrap_or(0)
    }

    fn total(&self) -> Amount {
        self.balances.values().sum()
    }
}

impl FundingRail for ExternalBank {
    fn collect(&mut self, account: &AccountId, amount: Amount) -> Result<(), RailError> {
        let balance = self.balances.entry(account.clone()).or_default();
        if *balance < amount {
            return Err(RailError::Rejected(format!(
                "{account} holds {balance}, needs {amount}"
            )));
        }
        *balance -= amount;
        Ok(())
    }

    fn release(&mut self, account: &AccountId, amount: Amount) -> Result<(), RailError> {
        *self.balances.entry(account.clone()).or_default() += amount;
        Ok(())
    }
}

#[test]
fn full_cycle_conserves_value_across_the_custody_boundary() {
    let mut vault = Vault::new();
    let clock = ManualClock::at(1_000_000);
    let mut bank = ExternalBank::default();
    let mut notifier = RecordingNotifier::default();

    bank.fund("alice", 5_000);
    let external_total = bank.total();
    let alice = "alice".to_string();

    vault
        .deposit(&alice, 3_000, &clock, &mut bank, &mut notifier)
        .unwrap();
    assert_eq!(bank.balance("alice"), 2_000);
    assert_eq!(vault.balance_of(&alice), 3_000);
    assert_eq!(bank.total() + vault.balance_of(&alice), external_total);

    clock.advance(LOCK_DURATION);
    let released = vault
        .withdraw(&alice, &clock, &mut bank, &mut notifier)
        .unwrap();
    assert_eq!(released, 3_000);
    assert_eq!(bank.balance("alice"), 5_000);
    assert_eq!(vault.balance_of(&alice), 0);
    assert_eq!(bank.total(), external_total);

    assert_eq!(
        notifier.events,
        vec![
            VaultEvent::Deposit {
                account: alice.clone(),
                amount: 3_000,
                new_maturity: 1_000_000 + LOCK_DURATION,
            },
            VaultEvent::Withdraw {
                account: alice,
                amount_released: 3_000,
            },
        ]
    );
}

#[test]
fn rejected_collect_leaves_both_sides_untouched() {
    let mut vault = Vault::new();
    let clock = ManualClock::at(1_000_000);
    let mut bank = ExternalBank::default();
    let mut notifier = RecordingNotifier::default();

    bank.fund("bob", 100);
    let bob = "bob".to_string();

    let err = vault
        .deposit(&bob, 500, &clock, &mut bank, &mut notifier)
        .unwrap_err();
    assert!(matches!(err, VaultError::Rail(RailError::Rejected(_))));
    assert_eq!(bank.balance("bob"), 100);
    assert_eq!(vault.balance_of(&bob), 0);
    assert_eq!(vault.maturity_of(&bob), 0);
    assert!(notifier.events.is_empty());
}

#[test]
fn later_deposit_rearms_the_lock_for_the_whole_balance() {
    let mut vault = Vault::new();
    let clock = ManualClock::at(50_000);
    let mut bank = ExternalBank::default();
    let mut notifier = RecordingNotifier::default();

    bank.fund("carol", 10_000);
    let carol = "carol".to_string();

    vault
        .deposit(&carol, 1_000, &clock, &mut bank, &mut notifier)
        .unwrap();
    let first_maturity = vault.maturity_of(&carol);

    // Nearly through the first lock, a second deposit restarts it in full.
    clock.advance(LOCK_DURATION - 10);
    vault
        .deposit(&carol, 1_000, &clock, &mut bank, &mut notifier)
        .unwrap();
    assert_eq!(vault.balance_of(&carol), 2_000);
    assert_eq!(vault.maturity_of(&carol), clock.now() + LOCK_DURATION);

    // The original maturity no longer gates anything; the new one does, for
    // the entire balance.
    clock.set(first_maturity);
    let err = vault
        .withdraw(&carol, &clock, &mut bank, &mut notifier)
        .unwrap_err();
    assert!(matches!(err, VaultError::Locked { .. }));

    clock.set(vault.maturity_of(&carol));
    assert_eq!(
        vault
            .withdraw(&carol, &clock, &mut bank, &mut notifier)
            .unwrap(),
        2_000
    );
    assert_eq!(bank.balance("carol"), 10_000);
}
