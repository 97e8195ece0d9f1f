//! Custody scenarios
//!
//! Plain deposit and withdraw flows for a single user, checked against both
//! the ledger and the user's external balance:
//! - deposit only
//! - deposit then withdraw the same amount
//! - withdraw with nothing deposited

use crate::chain::{ChainError, Receipt};
use crate::config::SimConfig;
use crate::scenarios::{bootstrap, ScenarioResult};
use contracts::errors::LedgerError;
use types::numeric::{Wei, WEI_PER_UNIT};

/// 0.01 display units.
pub const SCENARIO_DEPOSIT: Wei = Wei::new(WEI_PER_UNIT / 100);

fn fees(receipts: &[&Receipt]) -> Result<Wei, ChainError> {
    receipts
        .iter()
        .try_fold(Wei::ZERO, |acc, r| acc.checked_add(r.fee))
        .ok_or(ChainError::ArithmeticOverflow)
}

/// Deposit 0.01; custody must hold exactly that and the sender must have
/// paid at least the deposit plus gas.
pub fn deposit_only(config: &SimConfig) -> Result<ScenarioResult, ChainError> {
    let (mut chain, user) = bootstrap(config)?;
    let start = chain.balance(&user);

    let receipt = chain.deposit(user, SCENARIO_DEPOSIT)?;
    let spent = start
        .checked_sub(chain.balance(&user))
        .ok_or(ChainError::ArithmeticOverflow)?;
    let minimum = SCENARIO_DEPOSIT
        .checked_add(receipt.fee)
        .ok_or(ChainError::ArithmeticOverflow)?;

    let held = chain.total_held()?;
    let passed = held == SCENARIO_DEPOSIT
        && chain.claim_of(&user)? == SCENARIO_DEPOSIT
        && spent >= minimum
        && chain.audit().is_ok();

    ScenarioResult::from_chain(
        "deposit_only",
        &chain,
        passed,
        format!("Deposited {SCENARIO_DEPOSIT}; custody {held}, sender spent {spent} (minimum {minimum})."),
    )
}

/// Deposit 0.01 then withdraw it; custody returns to zero and the sender is
/// down only the gas of both calls.
pub fn deposit_then_withdraw(config: &SimConfig) -> Result<ScenarioResult, ChainError> {
    let (mut chain, user) = bootstrap(config)?;
    let start = chain.balance(&user);

    let deposit = chain.deposit(user, SCENARIO_DEPOSIT)?;
    let withdraw = chain.withdraw(user, SCENARIO_DEPOSIT)?;
    let gas = fees(&[&deposit, &withdraw])?;
    let expected = start.checked_sub(gas).ok_or(ChainError::ArithmeticOverflow)?;

    let held = chain.total_held()?;
    let end = chain.balance(&user);
    let passed = held == Wei::ZERO
        && chain.claim_of(&user)? == Wei::ZERO
        && end == expected
        && chain.audit().is_ok();

    ScenarioResult::from_chain(
        "deposit_then_withdraw",
        &chain,
        passed,
        format!("Round trip of {SCENARIO_DEPOSIT}; custody {held}, sender {end} (expected {expected})."),
    )
}

/// Withdraw 0.01 with no claim; the call must revert with insufficient
/// balance and custody must stay empty.
pub fn withdraw_without_balance(config: &SimConfig) -> Result<ScenarioResult, ChainError> {
    let (mut chain, user) = bootstrap(config)?;

    let outcome = chain.withdraw(user, SCENARIO_DEPOSIT);
    let rejected = matches!(
        outcome,
        Err(ChainError::Reverted {
            source: LedgerError::InsufficientBalance { .. },
            ..
        })
    );

    let held = chain.total_held()?;
    let passed = rejected && held == Wei::ZERO && chain.audit().is_ok();

    let details = match &outcome {
        Ok(_) => "Withdraw unexpectedly succeeded.".to_string(),
        Err(err) => format!("Withdraw rejected: {err}; custody {held}."),
    };
    ScenarioResult::from_chain("withdraw_without_balance", &chain, passed, details)
}
