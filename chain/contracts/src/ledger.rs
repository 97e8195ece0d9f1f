//! Balance ledger: custody of pooled native value and per-account claims
//!
//! The ledger is the custody account: `custody` is the value it physically
//! holds and `claims` records what each account may withdraw. Between calls
//! the two always agree (custody == sum of claims).
//!
//! Every mutating call:
//! 1. Rejects principals that cannot hold a claim
//! 2. Acquires the reentrancy guard
//! 3. Validates and writes state with checked arithmetic
//! 4. Only then performs the outbound transfer (withdraw only)

use std::collections::HashMap;

use tracing::{debug, warn};
use types::ids::AccountId;
use types::numeric::Wei;

use crate::errors::LedgerError;
use crate::events::{ContractEvent, Deposited, Withdrawn};
use crate::security::ReentrancyGuard;
use crate::transfer::ValueTransfer;

/// Authenticated call metadata supplied by the host.
///
/// `value` is what the caller actually attached to the call, already moved
/// into custody by the host. It is never a separately declared amount.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CallContext {
    pub caller: AccountId,
    pub value: Wei,
}

impl CallContext {
    pub fn new(caller: AccountId, value: Wei) -> Self {
        Self { caller, value }
    }
}

/// Single-asset custodial ledger.
#[derive(Debug)]
pub struct BalanceLedger {
    /// Custody address recorded at deployment
    address: AccountId,
    /// Claims: account -> withdrawable amount (zero claims are not stored)
    claims: HashMap<AccountId, Wei>,
    /// Value physically held by the ledger
    custody: Wei,
    /// Security: reentrancy guard
    reentrancy_guard: ReentrancyGuard,
    /// Emitted events log (append-only)
    events: Vec<ContractEvent>,
}

impl BalanceLedger {
    /// Create an empty ledger whose custody account is `address`.
    pub fn new(address: AccountId) -> Self {
        Self {
            address,
            claims: HashMap::new(),
            custody: Wei::ZERO,
            reentrancy_guard: ReentrancyGuard::new(),
            events: Vec::new(),
        }
    }

    pub fn address(&self) -> AccountId {
        self.address
    }

    // ───────────────────────── Deposit ─────────────────────────

    /// Credit the caller with the value attached to the call.
    ///
    /// A zero-value deposit succeeds and leaves balances unchanged.
    /// Emits `Deposited`.
    pub fn deposit(&mut self, ctx: CallContext) -> Result<ContractEvent, LedgerError> {
        self.check_principal(ctx.caller)?;
        self.check_reentrancy()?;

        let result = self.credit(ctx.caller, ctx.value);

        self.reentrancy_guard.release();
        result
    }

    fn credit(&mut self, account: AccountId, amount: Wei) -> Result<ContractEvent, LedgerError> {
        let new_balance = self
            .balance_of(&account)
            .checked_add(amount)
            .ok_or(LedgerError::ArithmeticOverflow)?;
        let custody = self
            .custody
            .checked_add(amount)
            .ok_or(LedgerError::ArithmeticOverflow)?;

        self.set_claim(account, new_balance);
        self.custody = custody;

        debug!(%account, %amount, %new_balance, "deposit credited");

        let event = ContractEvent::Deposited(Deposited {
            account,
            amount,
            new_balance,
        });
        self.events.push(event.clone());
        Ok(event)
    }

    // ───────────────────────── Withdraw ─────────────────────────

    /// Debit `amount` from the caller's claim and pay it out to the caller.
    ///
    /// The claim is decremented before `transfer` runs and the reentrancy
    /// guard is held throughout, so recipient code cannot withdraw against
    /// a stale balance. If the transfer fails the claim and custody are
    /// restored exactly and no event is emitted.
    pub fn withdraw(
        &mut self,
        caller: AccountId,
        amount: Wei,
        transfer: &mut dyn ValueTransfer,
    ) -> Result<ContractEvent, LedgerError> {
        self.check_principal(caller)?;
        self.check_reentrancy()?;

        let result = self.debit_and_pay(caller, amount, transfer);

        self.reentrancy_guard.release();
        result
    }

    fn debit_and_pay(
        &mut self,
        caller: AccountId,
        amount: Wei,
        transfer: &mut dyn ValueTransfer,
    ) -> Result<ContractEvent, LedgerError> {
        // Checks
        let available = self.balance_of(&caller);
        let new_balance = available
            .checked_sub(amount)
            .ok_or(LedgerError::InsufficientBalance {
                required: amount,
                available,
            })?;

        let previous_custody = self.custody;
        let custody = match previous_custody.checked_sub(amount) {
            Some(custody) => custody,
            None => {
                return Err(LedgerError::SolvencyViolation {
                    custody: previous_custody,
                    claims: self.total_claims()?,
                })
            }
        };

        // Effects
        self.set_claim(caller, new_balance);
        self.custody = custody;

        // Interaction
        if let Err(err) = transfer.send(self, caller, amount) {
            self.set_claim(caller, available);
            self.custody = previous_custody;
            warn!(account = %caller, %amount, error = %err, "payout failed, withdrawal rolled back");
            return Err(LedgerError::TransferFailure {
                recipient: caller,
                reason: err.to_string(),
            });
        }

        debug!(account = %caller, %amount, %new_balance, "withdrawal paid out");

        let event = ContractEvent::Withdrawn(Withdrawn {
            account: caller,
            amount,
            new_balance,
        });
        self.events.push(event.clone());
        Ok(event)
    }

    // ───────────────────────── Queries ─────────────────────────

    /// Recorded claim of `account` (zero if it never deposited).
    pub fn balance_of(&self, account: &AccountId) -> Wei {
        self.claims.get(account).copied().unwrap_or(Wei::ZERO)
    }

    /// Aggregate value held in custody.
    pub fn total_held(&self) -> Wei {
        self.custody
    }

    /// Checked sum of every recorded claim.
    pub fn total_claims(&self) -> Result<Wei, LedgerError> {
        self.claims
            .values()
            .try_fold(Wei::ZERO, |acc, claim| acc.checked_add(*claim))
            .ok_or(LedgerError::ArithmeticOverflow)
    }

    /// Verify custody equals the sum of claims.
    pub fn check_solvency(&self) -> Result<(), LedgerError> {
        let claims = self.total_claims()?;
        if claims != self.custody {
            return Err(LedgerError::SolvencyViolation {
                custody: self.custody,
                claims,
            });
        }
        Ok(())
    }

    /// Number of accounts holding a non-zero claim.
    pub fn account_count(&self) -> usize {
        self.claims.len()
    }

    /// Whether a mutating call is currently in flight.
    pub fn is_locked(&self) -> bool {
        self.reentrancy_guard.is_locked()
    }

    // ───────────────────────── Events ─────────────────────────

    /// Get all emitted events.
    pub fn events(&self) -> &[ContractEvent] {
        &self.events
    }

    /// Drain all events (consume and clear).
    pub fn drain_events(&mut self) -> Vec<ContractEvent> {
        std::mem::take(&mut self.events)
    }

    // ───────────────────────── Internal ─────────────────────────

    fn set_claim(&mut self, account: AccountId, amount: Wei) {
        if amount.is_zero() {
            self.claims.remove(&account);
        } else {
            self.claims.insert(account, amount);
        }
    }

    fn check_principal(&self, caller: AccountId) -> Result<(), LedgerError> {
        if caller.is_zero() || caller == self.address {
            return Err(LedgerError::Unauthorized { caller });
        }
        Ok(())
    }

    fn check_reentrancy(&mut self) -> Result<(), LedgerError> {
        if !self.reentrancy_guard.acquire() {
            warn!("nested ledger call refused");
            return Err(LedgerError::Reentrancy);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::TransferError;

    /// Pays out into an in-memory wallet map.
    #[derive(Default)]
    struct Wallets {
        received: HashMap<AccountId, Wei>,
    }

    impl ValueTransfer for Wallets {
        fn send(
            &mut self,
            _ledger: &mut BalanceLedger,
            to: AccountId,
            amount: Wei,
        ) -> Result<(), TransferError> {
            let entry = self.received.entry(to).or_default();
            *entry = entry.checked_add(amount).ok_or(TransferError::Overflow)?;
            Ok(())
        }
    }

    struct Refusing;

    impl ValueTransfer for Refusing {
        fn send(
            &mut self,
            _ledger: &mut BalanceLedger,
            _to: AccountId,
            _amount: Wei,
        ) -> Result<(), TransferError> {
            Err(TransferError::Rejected {
                reason: "no receive hook".to_string(),
            })
        }
    }

    /// Re-enters `withdraw` once from inside the payout.
    #[derive(Default)]
    struct Reentrant {
        nested: Vec<Result<ContractEvent, LedgerError>>,
        seen_claim: Option<Wei>,
    }

    impl ValueTransfer for Reentrant {
        fn send(
            &mut self,
            ledger: &mut BalanceLedger,
            to: AccountId,
            amount: Wei,
        ) -> Result<(), TransferError> {
            self.seen_claim = Some(ledger.balance_of(&to));
            if self.nested.is_empty() {
                let outcome = ledger.withdraw(to, amount, &mut Wallets::default());
                self.nested.push(outcome);
            }
            Ok(())
        }
    }

    fn units(n: u128) -> Wei {
        Wei::new(n)
    }

    fn setup() -> (BalanceLedger, AccountId) {
        (BalanceLedger::new(AccountId::new()), AccountId::new())
    }

    // ─── Deposit tests ───

    #[test]
    fn test_new_ledger_is_empty() {
        let (ledger, acc) = setup();
        assert_eq!(ledger.total_held(), Wei::ZERO);
        assert_eq!(ledger.balance_of(&acc), Wei::ZERO);
        assert_eq!(ledger.account_count(), 0);
        assert!(!ledger.is_locked());
    }

    #[test]
    fn test_deposit_credits_caller() {
        let (mut ledger, acc) = setup();
        let event = ledger.deposit(CallContext::new(acc, units(100))).unwrap();

        assert_eq!(
            event,
            ContractEvent::Deposited(Deposited {
                account: acc,
                amount: units(100),
                new_balance: units(100),
            })
        );
        assert_eq!(ledger.balance_of(&acc), units(100));
        assert_eq!(ledger.total_held(), units(100));
    }

    #[test]
    fn test_deposit_accumulates() {
        let (mut ledger, acc) = setup();
        ledger.deposit(CallContext::new(acc, units(40))).unwrap();
        ledger.deposit(CallContext::new(acc, units(2))).unwrap();
        assert_eq!(ledger.balance_of(&acc), units(42));
    }

    #[test]
    fn test_zero_deposit_is_noop() {
        let (mut ledger, acc) = setup();
        let event = ledger.deposit(CallContext::new(acc, Wei::ZERO)).unwrap();
        assert_eq!(event.new_balance(), Wei::ZERO);
        assert_eq!(ledger.total_held(), Wei::ZERO);
        assert_eq!(ledger.account_count(), 0);
        ledger.check_solvency().unwrap();
    }

    #[test]
    fn test_deposit_overflow_leaves_state() {
        let (mut ledger, acc) = setup();
        ledger.deposit(CallContext::new(acc, Wei::MAX)).unwrap();

        let result = ledger.deposit(CallContext::new(acc, units(1)));
        assert_eq!(result, Err(LedgerError::ArithmeticOverflow));
        assert_eq!(ledger.balance_of(&acc), Wei::MAX);
        assert_eq!(ledger.events().len(), 1);
        assert!(!ledger.is_locked(), "Guard released after failure");
    }

    #[test]
    fn test_custody_overflow_across_accounts() {
        let (mut ledger, whale) = setup();
        let other = AccountId::new();
        ledger.deposit(CallContext::new(whale, Wei::MAX)).unwrap();

        let result = ledger.deposit(CallContext::new(other, units(1)));
        assert_eq!(result, Err(LedgerError::ArithmeticOverflow));
        assert_eq!(ledger.balance_of(&other), Wei::ZERO);
        assert_eq!(ledger.total_held(), Wei::MAX);
    }

    #[test]
    fn test_deposit_does_not_touch_other_accounts() {
        let (mut ledger, acc) = setup();
        let bystander = AccountId::new();
        ledger.deposit(CallContext::new(bystander, units(9))).unwrap();
        ledger.deposit(CallContext::new(acc, units(5))).unwrap();
        assert_eq!(ledger.balance_of(&bystander), units(9));
    }

    // ─── Principal tests ───

    #[test]
    fn test_zero_address_unauthorized() {
        let (mut ledger, _) = setup();
        let result = ledger.deposit(CallContext::new(AccountId::ZERO, units(1)));
        assert_eq!(
            result,
            Err(LedgerError::Unauthorized {
                caller: AccountId::ZERO
            })
        );
        assert_eq!(ledger.total_held(), Wei::ZERO);
    }

    #[test]
    fn test_custody_address_cannot_withdraw() {
        let (mut ledger, _) = setup();
        let custody = ledger.address();
        let result = ledger.withdraw(custody, Wei::ZERO, &mut Wallets::default());
        assert_eq!(result, Err(LedgerError::Unauthorized { caller: custody }));
    }

    // ─── Withdraw tests ───

    #[test]
    fn test_withdraw_pays_caller() {
        let (mut ledger, acc) = setup();
        let mut wallets = Wallets::default();
        ledger.deposit(CallContext::new(acc, units(10))).unwrap();

        let event = ledger.withdraw(acc, units(4), &mut wallets).unwrap();

        assert!(matches!(event, ContractEvent::Withdrawn(_)));
        assert_eq!(event.new_balance(), units(6));
        assert_eq!(ledger.balance_of(&acc), units(6));
        assert_eq!(ledger.total_held(), units(6));
        assert_eq!(wallets.received[&acc], units(4));
    }

    #[test]
    fn test_withdraw_full_balance_removes_claim() {
        let (mut ledger, acc) = setup();
        ledger.deposit(CallContext::new(acc, units(10))).unwrap();
        ledger.withdraw(acc, units(10), &mut Wallets::default()).unwrap();
        assert_eq!(ledger.account_count(), 0);
        assert_eq!(ledger.total_held(), Wei::ZERO);
    }

    #[test]
    fn test_withdraw_insufficient_balance() {
        let (mut ledger, acc) = setup();
        ledger.deposit(CallContext::new(acc, units(3))).unwrap();

        let result = ledger.withdraw(acc, units(5), &mut Wallets::default());
        assert_eq!(
            result,
            Err(LedgerError::InsufficientBalance {
                required: units(5),
                available: units(3),
            })
        );
        assert_eq!(ledger.balance_of(&acc), units(3));
        assert!(!ledger.is_locked());
    }

    #[test]
    fn test_withdraw_from_empty_account() {
        let (mut ledger, acc) = setup();
        let result = ledger.withdraw(acc, units(1), &mut Wallets::default());
        assert!(matches!(result, Err(LedgerError::InsufficientBalance { .. })));
        assert_eq!(ledger.total_held(), Wei::ZERO);
    }

    #[test]
    fn test_withdraw_cannot_take_other_accounts_funds() {
        let (mut ledger, acc) = setup();
        let victim = AccountId::new();
        ledger.deposit(CallContext::new(victim, units(100))).unwrap();

        let result = ledger.withdraw(acc, units(1), &mut Wallets::default());
        assert!(matches!(result, Err(LedgerError::InsufficientBalance { .. })));
        assert_eq!(ledger.balance_of(&victim), units(100));
    }

    #[test]
    fn test_failed_transfer_rolls_back() {
        let (mut ledger, acc) = setup();
        ledger.deposit(CallContext::new(acc, units(10))).unwrap();
        let events_before = ledger.events().len();

        let result = ledger.withdraw(acc, units(7), &mut Refusing);

        assert!(matches!(
            result,
            Err(LedgerError::TransferFailure { recipient, .. }) if recipient == acc
        ));
        assert_eq!(ledger.balance_of(&acc), units(10));
        assert_eq!(ledger.total_held(), units(10));
        assert_eq!(ledger.events().len(), events_before, "No event on rollback");
        assert!(!ledger.is_locked());
        ledger.check_solvency().unwrap();
    }

    #[test]
    fn test_claim_decremented_before_payout() {
        let (mut ledger, acc) = setup();
        let mut reentrant = Reentrant::default();
        ledger.deposit(CallContext::new(acc, units(10))).unwrap();

        ledger.withdraw(acc, units(10), &mut reentrant).unwrap();

        assert_eq!(reentrant.seen_claim, Some(Wei::ZERO));
    }

    #[test]
    fn test_nested_withdraw_refused() {
        let (mut ledger, acc) = setup();
        let mut reentrant = Reentrant::default();
        ledger.deposit(CallContext::new(acc, units(10))).unwrap();

        ledger.withdraw(acc, units(5), &mut reentrant).unwrap();

        assert_eq!(reentrant.nested, vec![Err(LedgerError::Reentrancy)]);
        assert_eq!(ledger.balance_of(&acc), units(5));
        assert_eq!(ledger.total_held(), units(5));
        assert!(!ledger.is_locked());
    }

    // ─── Solvency tests ───

    #[test]
    fn test_solvency_holds_across_operations() {
        let (mut ledger, a) = setup();
        let b = AccountId::new();
        let mut wallets = Wallets::default();

        ledger.deposit(CallContext::new(a, units(30))).unwrap();
        ledger.deposit(CallContext::new(b, units(12))).unwrap();
        ledger.withdraw(a, units(11), &mut wallets).unwrap();

        ledger.check_solvency().unwrap();
        assert_eq!(ledger.total_claims().unwrap(), units(31));
        assert_eq!(ledger.total_held(), units(31));
    }

    // ─── Events tests ───

    #[test]
    fn test_drain_events() {
        let (mut ledger, acc) = setup();
        ledger.deposit(CallContext::new(acc, units(1))).unwrap();
        ledger.withdraw(acc, units(1), &mut Wallets::default()).unwrap();

        let events = ledger.drain_events();
        assert_eq!(events.len(), 2);
        assert!(matches!(events[1], ContractEvent::Withdrawn(_)));
        assert!(ledger.events().is_empty());
    }
}
