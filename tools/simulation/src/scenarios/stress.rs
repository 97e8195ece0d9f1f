//! Seeded stress scenario
//!
//! Random deposits and withdrawals across several accounts, driven by a
//! seeded `ChaCha8Rng` so a run can be replayed from its seed. After every
//! transaction the chain is audited (custody equals the sum of claims and
//! supply is conserved) and each account's claim is compared with a shadow
//! model kept alongside.

use std::collections::HashMap;

use contracts::errors::LedgerError;
use rand::Rng;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use tracing::debug;
use types::ids::AccountId;
use types::numeric::Wei;

use crate::chain::ChainError;
use crate::config::SimConfig;
use crate::scenarios::{bootstrap, ScenarioResult};

#[derive(Debug, Default)]
struct Tally {
    deposits: usize,
    withdrawals: usize,
    /// Withdrawals beyond the caller's claim, correctly refused
    rejected: usize,
    /// Transactions the sender could not afford
    unaffordable: usize,
    violations: Vec<String>,
}

pub fn run(config: &SimConfig) -> Result<ScenarioResult, ChainError> {
    let stress = &config.stress;
    let (mut chain, first) = bootstrap(config)?;
    let mut accounts = vec![first];
    for _ in 1..stress.accounts {
        accounts.push(chain.new_funded_account()?);
    }

    let mut rng = ChaCha8Rng::seed_from_u64(stress.seed);
    let mut model: HashMap<AccountId, Wei> = HashMap::new();
    let mut tally = Tally::default();

    for step in 0..stress.operations {
        let who = accounts[rng.gen_range(0..accounts.len())];
        let amount = Wei::new(rng.gen_range(1..=stress.max_amount.get()));
        let claim = model.get(&who).copied().unwrap_or(Wei::ZERO);

        if rng.gen_bool(0.5) {
            match chain.deposit(who, amount) {
                Ok(_) => {
                    tally.deposits += 1;
                    let updated = claim
                        .checked_add(amount)
                        .ok_or(ChainError::ArithmeticOverflow)?;
                    model.insert(who, updated);
                }
                Err(ChainError::InsufficientFunds { .. }) => tally.unaffordable += 1,
                Err(err) => tally.violations.push(format!("step {step}: deposit failed: {err}")),
            }
        } else {
            match chain.withdraw(who, amount) {
                Ok(_) => {
                    tally.withdrawals += 1;
                    match claim.checked_sub(amount) {
                        Some(updated) => {
                            model.insert(who, updated);
                        }
                        None => tally
                            .violations
                            .push(format!("step {step}: withdrew {amount} against claim {claim}")),
                    }
                }
                Err(ChainError::Reverted {
                    source: LedgerError::InsufficientBalance { .. },
                    ..
                }) if amount > claim => tally.rejected += 1,
                Err(ChainError::InsufficientFunds { .. }) => tally.unaffordable += 1,
                Err(err) => tally.violations.push(format!("step {step}: withdraw failed: {err}")),
            }
        }

        if let Err(err) = chain.audit() {
            tally.violations.push(format!("step {step}: {err}"));
        }
        let actual = chain.claim_of(&who)?;
        let expected = model.get(&who).copied().unwrap_or(Wei::ZERO);
        if actual != expected {
            tally
                .violations
                .push(format!("step {step}: claim of {who} is {actual}, expected {expected}"));
        }
    }

    debug!(?tally, "stress run complete");

    let passed = tally.violations.is_empty();
    let details = if passed {
        format!(
            "Seed {}: {} deposits, {} withdrawals, {} over-claim withdrawals refused, {} unaffordable across {} accounts.",
            stress.seed,
            tally.deposits,
            tally.withdrawals,
            tally.rejected,
            tally.unaffordable,
            accounts.len(),
        )
    } else {
        format!(
            "Seed {}: {} violations, first: {}",
            stress.seed,
            tally.violations.len(),
            tally.violations[0],
        )
    };
    ScenarioResult::from_chain("stress", &chain, passed, details)
}
