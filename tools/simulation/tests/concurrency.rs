//! Concurrency test
//!
//! Verifies that independent chains, each with its own ledger, can run in
//! parallel (no shared state) and reach identical results.

use simulation::chain::Chain;
use simulation::config::ChainConfig;
use std::thread;
use types::numeric::Wei;

#[test]
fn test_concurrent_chains() {
    let handles: Vec<_> = (0..4)
        .map(|_| {
            thread::spawn(move || {
                let mut chain = Chain::new(ChainConfig::default());
                let deployer = chain.new_funded_account().unwrap();
                chain.deploy_ledger(deployer).unwrap();
                let acc1 = chain.new_funded_account().unwrap();
                let acc2 = chain.new_funded_account().unwrap();

                for i in 1..=250u128 {
                    chain.deposit(acc1, Wei::new(i * 1_000)).unwrap();
                    chain.deposit(acc2, Wei::new(i * 2_000)).unwrap();
                    chain.withdraw(acc1, Wei::new(i * 500)).unwrap();
                }

                chain.audit().unwrap();
                chain.total_held().unwrap()
            })
        })
        .collect();

    let held: Vec<Wei> = handles.into_iter().map(|h| h.join().unwrap()).collect();

    // sum(1..=250) = 31_375; each round nets 500 + 2_000 per unit of i
    let expected = Wei::new(31_375 * 2_500);
    assert!(held.iter().all(|h| *h == expected));
}

#[test]
fn test_chain_moves_between_threads() {
    let mut chain = Chain::new(ChainConfig::default());
    let deployer = chain.new_funded_account().unwrap();
    chain.deploy_ledger(deployer).unwrap();

    let chain = thread::spawn(move || {
        let user = chain.new_funded_account().unwrap();
        chain.deposit(user, Wei::new(7)).unwrap();
        chain
    })
    .join()
    .unwrap();

    assert_eq!(chain.total_held().unwrap(), Wei::new(7));
    chain.audit().unwrap();
}
