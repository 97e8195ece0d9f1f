//! Scenario simulation modules
//!
//! Each scenario deploys a fresh ledger on its own chain and checks one
//! behavior end to end, including gas and external balances.

pub mod custody;
pub mod reentrancy;
pub mod stress;

use crate::chain::{Chain, ChainError};
use crate::config::SimConfig;
use serde::{Deserialize, Serialize};
use tracing::info;
use types::ids::AccountId;
use types::numeric::Wei;

/// Result of a scenario run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScenarioResult {
    pub name: String,
    /// Transactions submitted, reverted ones included
    pub transactions: usize,
    pub gas_spent: Wei,
    /// Ledger custody when the scenario finished
    pub total_held: Wei,
    pub passed: bool,
    pub details: String,
}

impl ScenarioResult {
    pub(crate) fn from_chain(
        name: &str,
        chain: &Chain,
        passed: bool,
        details: String,
    ) -> Result<Self, ChainError> {
        Ok(Self {
            name: name.to_string(),
            transactions: chain.receipts().len(),
            gas_spent: chain.fees_burned(),
            total_held: chain.total_held()?,
            passed,
            details,
        })
    }
}

/// Fresh chain with a deployed ledger and one funded user.
pub(crate) fn bootstrap(config: &SimConfig) -> Result<(Chain, AccountId), ChainError> {
    let mut chain = Chain::new(config.chain.clone());
    let deployer = chain.new_funded_account()?;
    chain.deploy_ledger(deployer)?;
    let user = chain.new_funded_account()?;
    Ok((chain, user))
}

/// Run every scenario in order.
pub fn run_all(config: &SimConfig) -> Result<Vec<ScenarioResult>, ChainError> {
    let results = vec![
        custody::deposit_only(config)?,
        custody::deposit_then_withdraw(config)?,
        custody::withdraw_without_balance(config)?,
        reentrancy::run(config)?,
        stress::run(config)?,
    ];

    for result in &results {
        info!(
            scenario = %result.name,
            passed = result.passed,
            transactions = result.transactions,
            "scenario finished"
        );
    }
    Ok(results)
}
