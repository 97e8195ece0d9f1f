//! Contract-specific error types
//!
//! Error taxonomy for ledger operations and the outbound value transfer.
//! Every variant is returned from a call that left ledger state untouched.

use thiserror::Error;
use types::ids::AccountId;
use types::numeric::Wei;

/// Ledger errors
#[derive(Error, Debug, Clone, PartialEq)]
pub enum LedgerError {
    #[error("Insufficient balance: required {required}, available {available}")]
    InsufficientBalance { required: Wei, available: Wei },

    #[error("Arithmetic overflow in balance calculation")]
    ArithmeticOverflow,

    #[error("Transfer to {recipient} failed: {reason}")]
    TransferFailure { recipient: AccountId, reason: String },

    #[error("Unauthorized: {caller} cannot hold a claim")]
    Unauthorized { caller: AccountId },

    #[error("Reentrancy detected")]
    Reentrancy,

    #[error("Solvency invariant violated: custody {custody}, claims {claims}")]
    SolvencyViolation { custody: Wei, claims: Wei },
}

/// Outbound value transfer errors
#[derive(Error, Debug, Clone, PartialEq)]
pub enum TransferError {
    #[error("Recipient rejected value: {reason}")]
    Rejected { reason: String },

    #[error("Recipient balance overflow")]
    Overflow,
}
