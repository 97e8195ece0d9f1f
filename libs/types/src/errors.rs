//! Error types for the shared primitives
//!
//! Parsing and unit-conversion failures using thiserror. Ledger and host
//! errors live in their own crates.

use thiserror::Error;

/// Amount conversion errors (display units ⇄ base units)
#[derive(Error, Debug, Clone, PartialEq)]
pub enum AmountError {
    #[error("Invalid amount: {input}")]
    Invalid { input: String },

    #[error("Amount must be non-negative: {value}")]
    Negative { value: String },

    #[error("Amount {value} has more than {max_decimals} fractional digits")]
    TooPrecise { value: String, max_decimals: u32 },

    #[error("Amount out of range: {value}")]
    OutOfRange { value: String },
}

/// Account address errors
#[derive(Error, Debug, Clone, PartialEq)]
pub enum AddressError {
    #[error("Address must start with 0x: {input}")]
    MissingPrefix { input: String },

    #[error("Address must be {expected} hex digits, got {actual}")]
    InvalidLength { expected: usize, actual: usize },

    #[error("Address contains non-hex characters: {input}")]
    InvalidHex { input: String },
}
