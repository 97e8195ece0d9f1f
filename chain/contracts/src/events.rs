//! Contract events
//!
//! Immutable records emitted by successful ledger operations. A call that
//! fails or is rolled back emits nothing.

use serde::{Deserialize, Serialize};
use types::ids::AccountId;
use types::numeric::Wei;

/// Value credited to an account's claim.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Deposited {
    pub account: AccountId,
    pub amount: Wei,
    pub new_balance: Wei,
}

/// Value debited from an account's claim and paid out to it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Withdrawn {
    pub account: AccountId,
    pub amount: Wei,
    pub new_balance: Wei,
}

/// Enum wrapper for all contract events, enabling uniform handling.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ContractEvent {
    Deposited(Deposited),
    Withdrawn(Withdrawn),
}

impl ContractEvent {
    /// Account whose claim changed.
    pub fn account(&self) -> AccountId {
        match self {
            ContractEvent::Deposited(e) => e.account,
            ContractEvent::Withdrawn(e) => e.account,
        }
    }

    /// Claim of that account after the operation.
    pub fn new_balance(&self) -> Wei {
        match self {
            ContractEvent::Deposited(e) => e.new_balance,
            ContractEvent::Withdrawn(e) => e.new_balance,
        }
    }
}
