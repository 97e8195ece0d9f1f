//! Recipient code attached to accounts
//!
//! An account with a registered `Recipient` runs it whenever it receives
//! value from the ledger. The code sees the ledger mid-withdrawal through a
//! `ReceiveContext` bound to its own address: it may refuse the value, read
//! ledger state, or try to call back in as itself.

use std::sync::{Arc, Mutex, PoisonError};

use contracts::errors::{LedgerError, TransferError};
use contracts::events::ContractEvent;
use contracts::{BalanceLedger, CallContext};
use serde::{Deserialize, Serialize};
use tracing::debug;
use types::ids::AccountId;
use types::numeric::Wei;

use crate::chain::NativeTransfer;

/// What recipient code can reach while it runs.
///
/// Every call is made with the recipient's own address as the caller. Value
/// can only reach the recipient through a ledger withdrawal, and a deposit
/// is paid from its external holdings.
pub struct ReceiveContext<'a, 'h> {
    ledger: &'a mut BalanceLedger,
    host: &'a mut NativeTransfer<'h>,
    address: AccountId,
}

impl<'a, 'h> ReceiveContext<'a, 'h> {
    pub(crate) fn new(
        ledger: &'a mut BalanceLedger,
        host: &'a mut NativeTransfer<'h>,
        address: AccountId,
    ) -> Self {
        Self {
            ledger,
            host,
            address,
        }
    }

    /// Address the code is attached to.
    pub fn address(&self) -> AccountId {
        self.address
    }

    /// The recipient's current claim on the ledger.
    pub fn claim(&self) -> Wei {
        self.ledger.balance_of(&self.address)
    }

    pub fn total_held(&self) -> Wei {
        self.ledger.total_held()
    }

    /// The recipient's external holdings, including the value being received.
    pub fn external_balance(&self) -> Wei {
        self.host.external_balance(&self.address)
    }

    /// Whether the paying ledger call is still in flight.
    pub fn ledger_locked(&self) -> bool {
        self.ledger.is_locked()
    }

    /// Call `withdraw(amount)` on the ledger as the recipient.
    pub fn withdraw(&mut self, amount: Wei) -> Result<ContractEvent, LedgerError> {
        self.ledger.withdraw(self.address, amount, &mut *self.host)
    }

    /// Call `deposit` on the ledger as the recipient, attaching `value` from
    /// its external holdings. The value is returned if the call fails.
    pub fn deposit(&mut self, value: Wei) -> Result<ContractEvent, LedgerError> {
        let previous = self.host.take_value(self.address, value)?;
        let outcome = self.ledger.deposit(CallContext::new(self.address, value));
        if outcome.is_err() {
            self.host.restore_balance(self.address, previous);
        }
        outcome
    }
}

/// Code run on receipt of native value.
pub trait Recipient: Send {
    /// Returning an error refuses the value and reverts the payout.
    fn on_receive(&mut self, ctx: ReceiveContext<'_, '_>, amount: Wei) -> Result<(), TransferError>;
}

/// Refuses every incoming payment.
#[derive(Debug, Clone)]
pub struct RejectingRecipient {
    reason: String,
}

impl RejectingRecipient {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

impl Recipient for RejectingRecipient {
    fn on_receive(&mut self, ctx: ReceiveContext<'_, '_>, amount: Wei) -> Result<(), TransferError> {
        debug!(address = %ctx.address(), %amount, "recipient refusing value");
        Err(TransferError::Rejected {
            reason: self.reason.clone(),
        })
    }
}

/// Counters recorded by a `ReentrantRecipient`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReentryLog {
    /// Total value received across all payouts
    pub received: Wei,
    /// Nested withdraw calls attempted
    pub attempts: usize,
    /// Nested calls the ledger refused as reentrant
    pub refused: usize,
    /// Nested calls that succeeded
    pub succeeded: usize,
    /// Nested calls that failed for any other reason
    pub failed: usize,
}

/// Read handle on a `ReentrantRecipient`'s log after it has been boxed.
#[derive(Debug, Clone)]
pub struct ReentryProbe(Arc<Mutex<ReentryLog>>);

impl ReentryProbe {
    pub fn snapshot(&self) -> ReentryLog {
        self.0.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }
}

/// Tries to withdraw the same amount again from inside each payout.
#[derive(Debug)]
pub struct ReentrantRecipient {
    max_attempts: usize,
    log: Arc<Mutex<ReentryLog>>,
}

impl ReentrantRecipient {
    pub fn new(max_attempts: usize) -> (Self, ReentryProbe) {
        let log = Arc::new(Mutex::new(ReentryLog::default()));
        let probe = ReentryProbe(Arc::clone(&log));
        (Self { max_attempts, log }, probe)
    }

    fn update<T>(&self, f: impl FnOnce(&mut ReentryLog) -> T) -> T {
        let mut log = self.log.lock().unwrap_or_else(PoisonError::into_inner);
        f(&mut log)
    }
}

impl Recipient for ReentrantRecipient {
    fn on_receive(&mut self, mut ctx: ReceiveContext<'_, '_>, amount: Wei) -> Result<(), TransferError> {
        let max_attempts = self.max_attempts;
        let attempt_again = self.update(|log| -> Result<bool, TransferError> {
            log.received = log.received.checked_add(amount).ok_or(TransferError::Overflow)?;
            if log.attempts < max_attempts {
                log.attempts += 1;
                return Ok(true);
            }
            Ok(false)
        })?;

        if attempt_again {
            let outcome = ctx.withdraw(amount);
            debug!(address = %ctx.address(), ?outcome, "nested withdraw attempted");
            self.update(|log| match outcome {
                Ok(_) => log.succeeded += 1,
                Err(LedgerError::Reentrancy) => log.refused += 1,
                Err(_) => log.failed += 1,
            });
        }
        Ok(())
    }
}
