//! Custody Ledger Simulation Framework
//!
//! Hosts the balance ledger on a simulated chain with external balances and
//! gas, and drives it through end-to-end scenarios.
//!
//! # Modules
//! - `config`: JSON-loadable chain and workload parameters
//! - `chain`: Host chain with deployment, transactions, gas, receipts
//! - `recipients`: Code attached to receiving accounts (refusing, re-entering)
//! - `scenarios`: Custody, reentrancy, and seeded stress scenarios
//! - `export`: JSON report export

pub mod config;
pub mod chain;
pub mod recipients;
pub mod scenarios;
pub mod export;

/// Crate version constant
pub const VERSION: &str = "1.0.0";
