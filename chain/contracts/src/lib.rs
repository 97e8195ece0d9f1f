//! Smart Contract Logic for Native-Value Custody
//!
//! This crate implements the custodial exchange contract: a single-asset
//! ledger that accepts deposits of native value, records each account's claim,
//! and pays claims back out on withdrawal.
//!
//! # Modules
//! - `events`: Contract events emitted by successful operations
//! - `errors`: Ledger and transfer error types
//! - `security`: Reentrancy guard
//! - `transfer`: Outbound value transfer seam (the ledger's only suspension point)
//! - `ledger`: Claims, custody, deposit/withdraw, solvency audit
//!
//! # Version
//! v0.1.0: initial implementation

pub mod errors;
pub mod events;
pub mod security;
pub mod transfer;
pub mod ledger;

pub use ledger::{BalanceLedger, CallContext};

/// Contract ABI version, frozen after release
pub const CONTRACT_ABI_VERSION: &str = "1.0.0";
