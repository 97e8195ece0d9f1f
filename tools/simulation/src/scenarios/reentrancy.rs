//! Reentrancy scenario
//!
//! An attacker account whose receive hook calls `withdraw` again deposits
//! next to an honest user and then withdraws. The nested call must be
//! refused, so the attacker ends up with exactly its own claim and the honest
//! user's claim stays fully backed.

use crate::chain::ChainError;
use crate::config::SimConfig;
use crate::recipients::ReentrantRecipient;
use crate::scenarios::custody::SCENARIO_DEPOSIT;
use crate::scenarios::{bootstrap, ScenarioResult};
use types::numeric::Wei;

/// Nested withdraw attempts the attacker is allowed per payout.
const MAX_REENTRY_ATTEMPTS: usize = 8;

pub fn run(config: &SimConfig) -> Result<ScenarioResult, ChainError> {
    let (mut chain, honest) = bootstrap(config)?;
    let attacker = chain.new_funded_account()?;

    let (hook, probe) = ReentrantRecipient::new(MAX_REENTRY_ATTEMPTS);
    chain.register_recipient(attacker, Box::new(hook));

    let honest_stake = SCENARIO_DEPOSIT
        .checked_mul(10)
        .ok_or(ChainError::ArithmeticOverflow)?;
    chain.deposit(honest, honest_stake)?;
    chain.deposit(attacker, SCENARIO_DEPOSIT)?;

    let claim_at_start = chain.claim_of(&attacker)?;
    chain.withdraw(attacker, claim_at_start)?;

    let log = probe.snapshot();
    let held = chain.total_held()?;
    let passed = log.received <= claim_at_start
        && log.succeeded == 0
        && chain.claim_of(&attacker)? == Wei::ZERO
        && chain.claim_of(&honest)? == honest_stake
        && held == honest_stake
        && chain.audit().is_ok();

    ScenarioResult::from_chain(
        "reentrancy",
        &chain,
        passed,
        format!(
            "Attacker claim {claim_at_start}, received {}; {} nested attempts, {} refused. Custody {held}.",
            log.received, log.attempts, log.refused,
        ),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reentrancy_scenario_passes() {
        let result = run(&SimConfig::default()).unwrap();
        assert!(result.passed, "{}", result.details);
        assert!(result.details.contains("1 nested attempts, 1 refused"));
    }
}
