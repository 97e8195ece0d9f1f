//! Host chain: external balances, gas, receipts, and ledger deployment
//!
//! Stands in for the network the ledger runs on. It holds the value of every
//! externally owned account, deploys the ledger once, turns transactions into
//! ledger calls, and charges gas for each one. Gas is consumed even when the
//! ledger call reverts; everything else a reverted call did is undone.
//!
//! Conservation: funded supply == external balances + ledger custody + burned
//! gas, after every transaction.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use contracts::errors::{LedgerError, TransferError};
use contracts::transfer::ValueTransfer;
use contracts::{BalanceLedger, CallContext};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info, warn};
use types::ids::{AccountId, TxId};
use types::numeric::Wei;

use crate::config::ChainConfig;
use crate::recipients::{ReceiveContext, Recipient};

/// Host chain errors
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ChainError {
    #[error("Ledger not deployed")]
    NotDeployed,

    #[error("Ledger already deployed at {address}")]
    AlreadyDeployed { address: AccountId },

    #[error("Insufficient funds in {account}: required {required}, available {available}")]
    InsufficientFunds {
        account: AccountId,
        required: Wei,
        available: Wei,
    },

    #[error("Arithmetic overflow in chain accounting")]
    ArithmeticOverflow,

    #[error("Transaction {tx_id} reverted: {source}")]
    Reverted { tx_id: TxId, source: LedgerError },

    #[error("Ledger audit failed: {0}")]
    Audit(LedgerError),

    #[error("Supply not conserved: funded {funded}, accounted {accounted}")]
    SupplyMismatch { funded: Wei, accounted: Wei },
}

/// Transaction type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TxKind {
    Deploy,
    Deposit,
    Withdraw,
}

/// Transaction outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TxStatus {
    Success,
    Reverted,
}

/// Record of an executed transaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Receipt {
    pub tx_id: TxId,
    pub from: AccountId,
    pub kind: TxKind,
    /// Value attached (deposit) or requested (withdraw)
    pub value: Wei,
    pub gas_used: u64,
    pub gas_price: Wei,
    /// Burned gas paid by the sender (`gas_used * gas_price`)
    pub fee: Wei,
    pub status: TxStatus,
    pub timestamp: DateTime<Utc>,
}

/// Where and when the ledger was deployed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Deployment {
    pub ledger: AccountId,
    pub deployer: AccountId,
    pub tx_id: TxId,
    pub deployed_at: DateTime<Utc>,
}

/// Simulated host for a single ledger deployment.
pub struct Chain {
    config: ChainConfig,
    /// External holdings per account
    balances: HashMap<AccountId, Wei>,
    /// Code attached to accounts, run on receipt of value
    recipients: HashMap<AccountId, Box<dyn Recipient>>,
    ledger: Option<BalanceLedger>,
    deployment: Option<Deployment>,
    receipts: Vec<Receipt>,
    fees_burned: Wei,
    /// Total value ever created by `fund`
    funded: Wei,
}

impl Chain {
    pub fn new(config: ChainConfig) -> Self {
        Self {
            config,
            balances: HashMap::new(),
            recipients: HashMap::new(),
            ledger: None,
            deployment: None,
            receipts: Vec::new(),
            fees_burned: Wei::ZERO,
            funded: Wei::ZERO,
        }
    }

    pub fn config(&self) -> &ChainConfig {
        &self.config
    }

    // ───────────────────────── Accounts ─────────────────────────

    /// Create value out of thin air for `account` (genesis allocation).
    pub fn fund(&mut self, account: AccountId, amount: Wei) -> Result<(), ChainError> {
        let funded = self
            .funded
            .checked_add(amount)
            .ok_or(ChainError::ArithmeticOverflow)?;
        self.credit(account, amount)?;
        self.funded = funded;
        Ok(())
    }

    /// Create a new account holding the configured genesis balance.
    pub fn new_funded_account(&mut self) -> Result<AccountId, ChainError> {
        let account = AccountId::new();
        self.fund(account, self.config.genesis_balance)?;
        Ok(account)
    }

    /// Attach code that runs whenever `account` receives value.
    pub fn register_recipient(&mut self, account: AccountId, recipient: Box<dyn Recipient>) {
        self.recipients.insert(account, recipient);
    }

    /// External holdings of `account`.
    pub fn balance(&self, account: &AccountId) -> Wei {
        self.balances.get(account).copied().unwrap_or(Wei::ZERO)
    }

    // ───────────────────────── Deployment ─────────────────────────

    /// Instantiate the ledger. Allowed exactly once per chain.
    pub fn deploy_ledger(&mut self, deployer: AccountId) -> Result<Deployment, ChainError> {
        if let Some(deployment) = &self.deployment {
            return Err(ChainError::AlreadyDeployed {
                address: deployment.ledger,
            });
        }

        let gas_used = self.config.deploy_gas;
        let fee = self.charge_gas(deployer, gas_used, Wei::ZERO)?;

        let address = AccountId::new();
        let receipt = self.record(deployer, TxKind::Deploy, Wei::ZERO, gas_used, fee, TxStatus::Success);
        let deployment = Deployment {
            ledger: address,
            deployer,
            tx_id: receipt.tx_id,
            deployed_at: receipt.timestamp,
        };

        self.ledger = Some(BalanceLedger::new(address));
        self.deployment = Some(deployment.clone());

        info!(ledger = %address, %deployer, "ledger deployed");
        Ok(deployment)
    }

    pub fn deployment(&self) -> Option<&Deployment> {
        self.deployment.as_ref()
    }

    pub fn ledger(&self) -> Option<&BalanceLedger> {
        self.ledger.as_ref()
    }

    // ───────────────────────── Transactions ─────────────────────────

    /// Send `value` to the ledger's deposit entry point.
    pub fn deposit(&mut self, from: AccountId, value: Wei) -> Result<Receipt, ChainError> {
        self.ensure_deployed()?;
        let gas_used = self.config.deposit_gas;
        let fee = self.charge_gas(from, gas_used, value)?;
        self.debit(from, value)?;

        let outcome = self
            .ledger
            .as_mut()
            .ok_or(ChainError::NotDeployed)?
            .deposit(CallContext::new(from, value));

        match outcome {
            Ok(_) => Ok(self.record(from, TxKind::Deposit, value, gas_used, fee, TxStatus::Success)),
            Err(source) => {
                // Revert: the attached value goes back to the sender.
                self.credit(from, value)?;
                let receipt = self.record(from, TxKind::Deposit, value, gas_used, fee, TxStatus::Reverted);
                warn!(tx_id = %receipt.tx_id, %from, error = %source, "deposit reverted");
                Err(ChainError::Reverted {
                    tx_id: receipt.tx_id,
                    source,
                })
            }
        }
    }

    /// Call the ledger's withdraw entry point for `amount`.
    pub fn withdraw(&mut self, from: AccountId, amount: Wei) -> Result<Receipt, ChainError> {
        self.ensure_deployed()?;
        let gas_used = self.config.withdraw_gas;
        let fee = self.charge_gas(from, gas_used, Wei::ZERO)?;

        let Chain {
            ledger,
            balances,
            recipients,
            ..
        } = self;
        let ledger = ledger.as_mut().ok_or(ChainError::NotDeployed)?;
        let mut transfer = NativeTransfer::new(balances, recipients);
        let outcome = ledger.withdraw(from, amount, &mut transfer);

        match outcome {
            Ok(_) => Ok(self.record(from, TxKind::Withdraw, amount, gas_used, fee, TxStatus::Success)),
            Err(source) => {
                let receipt = self.record(from, TxKind::Withdraw, amount, gas_used, fee, TxStatus::Reverted);
                warn!(tx_id = %receipt.tx_id, %from, error = %source, "withdraw reverted");
                Err(ChainError::Reverted {
                    tx_id: receipt.tx_id,
                    source,
                })
            }
        }
    }

    // ───────────────────────── Queries ─────────────────────────

    /// Ledger claim of `account`.
    pub fn claim_of(&self, account: &AccountId) -> Result<Wei, ChainError> {
        self.ledger
            .as_ref()
            .map(|ledger| ledger.balance_of(account))
            .ok_or(ChainError::NotDeployed)
    }

    /// Value held in the ledger's custody.
    pub fn total_held(&self) -> Result<Wei, ChainError> {
        self.ledger
            .as_ref()
            .map(BalanceLedger::total_held)
            .ok_or(ChainError::NotDeployed)
    }

    pub fn receipts(&self) -> &[Receipt] {
        &self.receipts
    }

    pub fn fees_burned(&self) -> Wei {
        self.fees_burned
    }

    /// External balances + ledger custody + burned gas.
    pub fn total_supply(&self) -> Result<Wei, ChainError> {
        let external = self
            .balances
            .values()
            .try_fold(Wei::ZERO, |acc, b| acc.checked_add(*b))
            .ok_or(ChainError::ArithmeticOverflow)?;
        let custody = self
            .ledger
            .as_ref()
            .map(BalanceLedger::total_held)
            .unwrap_or(Wei::ZERO);

        external
            .checked_add(custody)
            .and_then(|sum| sum.checked_add(self.fees_burned))
            .ok_or(ChainError::ArithmeticOverflow)
    }

    /// Check ledger solvency and supply conservation.
    pub fn audit(&self) -> Result<(), ChainError> {
        if let Some(ledger) = &self.ledger {
            ledger.check_solvency().map_err(ChainError::Audit)?;
        }
        let accounted = self.total_supply()?;
        if accounted != self.funded {
            return Err(ChainError::SupplyMismatch {
                funded: self.funded,
                accounted,
            });
        }
        Ok(())
    }

    // ───────────────────────── Internal ─────────────────────────

    fn ensure_deployed(&self) -> Result<(), ChainError> {
        if self.ledger.is_none() {
            return Err(ChainError::NotDeployed);
        }
        Ok(())
    }

    /// Burn the gas fee, provided `from` can also cover `value`. Returns the fee.
    fn charge_gas(&mut self, from: AccountId, gas_used: u64, value: Wei) -> Result<Wei, ChainError> {
        let fee = self
            .config
            .gas_price
            .checked_mul(u128::from(gas_used))
            .ok_or(ChainError::ArithmeticOverflow)?;
        let required = fee.checked_add(value).ok_or(ChainError::ArithmeticOverflow)?;
        let available = self.balance(&from);
        if available < required {
            return Err(ChainError::InsufficientFunds {
                account: from,
                required,
                available,
            });
        }

        let fees_burned = self
            .fees_burned
            .checked_add(fee)
            .ok_or(ChainError::ArithmeticOverflow)?;
        self.debit(from, fee)?;
        self.fees_burned = fees_burned;
        Ok(fee)
    }

    fn credit(&mut self, account: AccountId, amount: Wei) -> Result<(), ChainError> {
        let balance = self.balances.entry(account).or_default();
        *balance = balance
            .checked_add(amount)
            .ok_or(ChainError::ArithmeticOverflow)?;
        Ok(())
    }

    fn debit(&mut self, account: AccountId, amount: Wei) -> Result<(), ChainError> {
        let available = self.balance(&account);
        let remaining = available
            .checked_sub(amount)
            .ok_or(ChainError::InsufficientFunds {
                account,
                required: amount,
                available,
            })?;
        self.balances.insert(account, remaining);
        Ok(())
    }

    fn record(
        &mut self,
        from: AccountId,
        kind: TxKind,
        value: Wei,
        gas_used: u64,
        fee: Wei,
        status: TxStatus,
    ) -> Receipt {
        let receipt = Receipt {
            tx_id: TxId::new(),
            from,
            kind,
            value,
            gas_used,
            gas_price: self.config.gas_price,
            fee,
            status,
            timestamp: Utc::now(),
        };
        debug!(tx_id = %receipt.tx_id, ?kind, ?status, "transaction recorded");
        self.receipts.push(receipt.clone());
        receipt
    }
}

/// Pays value out of custody into external balances, running recipient code.
///
/// Never handed to recipient code directly; `ReceiveContext` only reaches it
/// through a ledger call made on the recipient's own behalf.
pub(crate) struct NativeTransfer<'a> {
    balances: &'a mut HashMap<AccountId, Wei>,
    recipients: &'a mut HashMap<AccountId, Box<dyn Recipient>>,
}

impl<'a> NativeTransfer<'a> {
    pub(crate) fn new(
        balances: &'a mut HashMap<AccountId, Wei>,
        recipients: &'a mut HashMap<AccountId, Box<dyn Recipient>>,
    ) -> Self {
        Self {
            balances,
            recipients,
        }
    }

    pub(crate) fn external_balance(&self, account: &AccountId) -> Wei {
        self.balances.get(account).copied().unwrap_or(Wei::ZERO)
    }

    /// Move `amount` out of `from`'s external holdings. Returns the balance
    /// held before, for `restore_balance`.
    pub(crate) fn take_value(&mut self, from: AccountId, amount: Wei) -> Result<Wei, LedgerError> {
        let available = self.external_balance(&from);
        let remaining = available
            .checked_sub(amount)
            .ok_or(LedgerError::InsufficientBalance {
                required: amount,
                available,
            })?;
        self.balances.insert(from, remaining);
        Ok(available)
    }

    pub(crate) fn restore_balance(&mut self, account: AccountId, previous: Wei) {
        self.balances.insert(account, previous);
    }
}

impl ValueTransfer for NativeTransfer<'_> {
    fn send(
        &mut self,
        ledger: &mut BalanceLedger,
        to: AccountId,
        amount: Wei,
    ) -> Result<(), TransferError> {
        let previous = self.external_balance(&to);
        let credited = previous.checked_add(amount).ok_or(TransferError::Overflow)?;
        self.balances.insert(to, credited);

        // Take the code out while it runs so a nested payout to the same
        // address cannot run it recursively.
        if let Some(mut recipient) = self.recipients.remove(&to) {
            let ctx = ReceiveContext::new(ledger, &mut *self, to);
            let outcome = recipient.on_receive(ctx, amount);
            self.recipients.insert(to, recipient);

            if let Err(err) = outcome {
                self.restore_balance(to, previous);
                return Err(err);
            }
        }
        Ok(())
    }
}
